//! Offline scoring of a dataset file with the same encoder and artifacts the
//! web front end uses.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::encoding::PredictionRequest;
use crate::error::PredictorError;
use crate::model::Predictor;
use crate::records::StrokeRecord;

#[derive(Debug, Serialize)]
struct ScoredRecord<'a> {
    id: &'a str,
    prediction: &'static str,
}

/// Scores every row of `input` and writes `id,prediction` rows to `output`.
/// Returns the number of rows scored. Stops at the first bad row.
pub fn score_records<R: Read, W: Write>(
    predictor: &Predictor,
    input: R,
    output: W,
) -> Result<usize, PredictorError> {
    let mut reader = csv::Reader::from_reader(input);
    let mut writer = csv::Writer::from_writer(output);
    let mut scored = 0;

    for (index, record) in reader.deserialize::<StrokeRecord>().enumerate() {
        // header is line 1
        let row = index + 2;
        let record = record.map_err(|e| at_row(row, e.into()))?;

        let risk = PredictionRequest::from_fields(&record)
            .and_then(|request| predictor.predict(&request.feature_vector()))
            .map_err(|e| at_row(row, e))?;

        writer.serialize(ScoredRecord {
            id: &record.id,
            prediction: risk.as_str(),
        })?;
        scored += 1;
    }

    writer.flush()?;
    Ok(scored)
}

fn at_row(row: usize, source: PredictorError) -> PredictorError {
    PredictorError::Row {
        row,
        source: Box::new(source),
    }
}

pub fn score_file<P: AsRef<Path>>(
    predictor: &Predictor,
    input: P,
    output: Option<&Path>,
) -> Result<usize, PredictorError> {
    let input_file = File::open(input.as_ref())?;

    let scored = match output {
        Some(path) => {
            let result = score_records(predictor, input_file, File::create(path)?);
            // a failed run leaves no partial output behind
            if result.is_err() {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Failed to remove partial output {}: {}", path.display(), e);
                }
            }
            result?
        }
        None => score_records(predictor, input_file, io::stdout().lock())?,
    };

    info!(
        input = %input.as_ref().display(),
        rows = scored,
        "Scored dataset"
    );
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinaryClassifier, FeatureScaler};

    struct Identity;

    impl FeatureScaler for Identity {
        fn n_features(&self) -> usize {
            10
        }

        fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictorError> {
            Ok(features.to_vec())
        }
    }

    /// Predicts a stroke for anyone with heart disease.
    struct HeartDisease;

    impl BinaryClassifier for HeartDisease {
        fn n_features(&self) -> usize {
            10
        }

        fn predict(&self, features: &[f64]) -> Result<i32, PredictorError> {
            Ok(features[3] as i32)
        }
    }

    fn predictor() -> Predictor {
        Predictor::new(Box::new(Identity), Box::new(HeartDisease))
    }

    const HEADER: &str = "id,gender,age,hypertension,heart_disease,ever_married,work_type,Residence_type,avg_glucose_level,bmi,smoking_status\n";

    #[test]
    fn writes_one_prediction_per_row() {
        let input = format!(
            "{HEADER}1,Male,67,0,1,Yes,Private,Urban,228.69,36.6,formerly smoked\n\
             2,Female,49,0,0,Yes,retired,Rural,171.23,34.4,smokes\n"
        );
        let mut output = Vec::new();

        let scored = score_records(&predictor(), input.as_bytes(), &mut output).unwrap();

        assert_eq!(scored, 2);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,prediction\n1,Yes\n2,No\n"
        );
    }

    #[test]
    fn failed_run_removes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("stroke.csv");
        let output = dir.path().join("scored.csv");
        fs::write(
            &input,
            format!(
                "{HEADER}1,Male,67,0,1,Yes,Private,Urban,228.69,36.6,formerly smoked\n\
                 2,Female,80,0,0,Yes,Private,Rural,105.92,N/A,never smoked\n"
            ),
        )
        .unwrap();

        let result = score_file(&predictor(), &input, Some(output.as_path()));

        assert!(matches!(result, Err(PredictorError::Row { row: 3, .. })));
        assert!(!output.exists());
    }

    #[test]
    fn successful_run_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("stroke.csv");
        let output = dir.path().join("scored.csv");
        fs::write(
            &input,
            format!("{HEADER}1,Male,67,0,1,Yes,Private,Urban,228.69,36.6,formerly smoked\n"),
        )
        .unwrap();

        assert_eq!(score_file(&predictor(), &input, Some(output.as_path())).unwrap(), 1);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "id,prediction\n1,Yes\n"
        );
    }

    #[test]
    fn bad_row_is_located() {
        let input = format!(
            "{HEADER}1,Male,67,0,1,Yes,Private,Urban,228.69,36.6,formerly smoked\n\
             2,Female,80,0,0,Yes,Private,Rural,105.92,N/A,never smoked\n"
        );

        let err = score_records(&predictor(), input.as_bytes(), Vec::new()).unwrap_err();

        match err {
            PredictorError::Row { row, source } => {
                assert_eq!(row, 3);
                assert!(matches!(
                    *source,
                    PredictorError::InvalidNumber { field: "bmi", .. }
                ));
            }
            other => panic!("expected row error, got {other:?}"),
        }
    }
}
