use serde::Deserialize;

use crate::encoding::FieldSource;

/// One row of the healthcare stroke dataset. Every column is kept as raw
/// text so it goes through the same coercion as a submitted form.
#[derive(Debug, Clone, Deserialize)]
pub struct StrokeRecord {
    pub id: String,
    pub gender: String,
    pub age: String,
    pub hypertension: String,
    pub heart_disease: String,
    pub ever_married: String,
    pub work_type: String,
    #[serde(rename = "Residence_type")]
    pub residence_type: String,
    pub avg_glucose_level: String,
    pub bmi: String,
    pub smoking_status: String,
    #[serde(default)]
    pub stroke: Option<String>,
}

impl FieldSource for StrokeRecord {
    fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "gender" => &self.gender,
            "age" => &self.age,
            "hypertension" => &self.hypertension,
            "heart_disease" => &self.heart_disease,
            "ever_married" => &self.ever_married,
            "work_type" => &self.work_type,
            "residence_type" => &self.residence_type,
            "avg_glucose_level" => &self.avg_glucose_level,
            "bmi" => &self.bmi,
            "smoking_status" => &self.smoking_status,
            _ => return None,
        };
        Some(value.as_str())
    }
}
