//! Translation of submitted patient attributes into the numeric feature
//! vector the classifier consumes.
//!
//! Categorical values are never rejected: the binary columns fall back to 0
//! and the lookup columns fall back to [`SENTINEL`]. Numeric columns are the
//! only ones that can fail.

use std::collections::HashMap;
use std::str::FromStr;

use lazy_static::lazy_static;

use crate::error::PredictorError;

/// Number of values assembled per request.
pub const FEATURE_COUNT: usize = 10;

/// Code for a categorical value missing from its lookup table.
pub const SENTINEL: i64 = -1;

/// Field names in the order their encoded values appear in the vector.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "gender",
    "age",
    "hypertension",
    "heart_disease",
    "ever_married",
    "work_type",
    "residence_type",
    "avg_glucose_level",
    "bmi",
    "smoking_status",
];

lazy_static! {
    static ref WORK_TYPE_CODES: HashMap<&'static str, i64> = HashMap::from([
        ("Private", 0),
        ("Self-employed", 1),
        ("Govt_job", 2),
        ("children", 3),
        ("Never_worked", 4),
    ]);
    static ref SMOKING_STATUS_CODES: HashMap<&'static str, i64> = HashMap::from([
        ("never smoked", 0),
        ("smokes", 1),
        ("formerly smoked", 2),
    ]);
}

pub fn encode_gender(value: &str) -> i64 {
    i64::from(value == "Male")
}

pub fn encode_ever_married(value: &str) -> i64 {
    i64::from(value == "Yes")
}

pub fn encode_residence_type(value: &str) -> i64 {
    i64::from(value == "Urban")
}

pub fn encode_work_type(value: &str) -> i64 {
    WORK_TYPE_CODES.get(value).copied().unwrap_or(SENTINEL)
}

pub fn encode_smoking_status(value: &str) -> i64 {
    SMOKING_STATUS_CODES.get(value).copied().unwrap_or(SENTINEL)
}

/// Anything that can answer "what was submitted for this field".
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<&str>;
}

impl FieldSource for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// One submission, coerced but not yet encoded. Lives for a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub gender: String,
    pub age: f64,
    pub hypertension: i64,
    pub heart_disease: i64,
    pub ever_married: String,
    pub work_type: String,
    pub residence_type: String,
    pub avg_glucose_level: f64,
    pub bmi: f64,
    pub smoking_status: String,
}

impl PredictionRequest {
    /// Reads every field in vector order; the first missing or unparseable
    /// one aborts.
    pub fn from_fields<S: FieldSource + ?Sized>(source: &S) -> Result<Self, PredictorError> {
        Ok(Self {
            gender: text(source, "gender")?,
            age: finite(source, "age")?,
            hypertension: number(source, "hypertension", "integer")?,
            heart_disease: number(source, "heart_disease", "integer")?,
            ever_married: text(source, "ever_married")?,
            work_type: text(source, "work_type")?,
            residence_type: text(source, "residence_type")?,
            avg_glucose_level: finite(source, "avg_glucose_level")?,
            bmi: finite(source, "bmi")?,
            smoking_status: text(source, "smoking_status")?,
        })
    }

    pub fn feature_vector(&self) -> FeatureVector {
        FeatureVector([
            encode_gender(&self.gender) as f64,
            self.age,
            self.hypertension as f64,
            self.heart_disease as f64,
            encode_ever_married(&self.ever_married) as f64,
            encode_work_type(&self.work_type) as f64,
            encode_residence_type(&self.residence_type) as f64,
            self.avg_glucose_level,
            self.bmi,
            encode_smoking_status(&self.smoking_status) as f64,
        ])
    }
}

fn text<S: FieldSource + ?Sized>(source: &S, field: &'static str) -> Result<String, PredictorError> {
    source
        .field(field)
        .map(str::to_string)
        .ok_or(PredictorError::MissingField { field })
}

// Surrounding whitespace is tolerated, nothing else is.
fn number<S, T>(source: &S, field: &'static str, expected: &'static str) -> Result<T, PredictorError>
where
    S: FieldSource + ?Sized,
    T: FromStr,
{
    let raw = source
        .field(field)
        .ok_or(PredictorError::MissingField { field })?;

    raw.trim()
        .parse::<T>()
        .map_err(|_| PredictorError::InvalidNumber { field, expected })
}

// `parse::<f64>` takes "nan" and "inf"; neither can reach the scaler.
fn finite<S: FieldSource + ?Sized>(source: &S, field: &'static str) -> Result<f64, PredictorError> {
    let expected = "finite floating point number";
    let value: f64 = number(source, field, expected)?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictorError::InvalidNumber { field, expected })
    }
}

/// The ordered, unscaled feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        FeatureVector(values)
    }
}
