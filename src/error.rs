use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use smartcore::error::Failed;
use thiserror::Error;
use tracing::error;

/// Everything that can go wrong between a submitted form and a rendered
/// prediction. None of these are recovered from.
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("missing form field `{field}`")]
    MissingField { field: &'static str },
    #[error("form field `{field}` is not a valid {expected}")]
    InvalidNumber {
        field: &'static str,
        expected: &'static str,
    },
    #[error("prediction artifacts are not loaded; configure a scaler and a model")]
    ArtifactsNotLoaded,
    #[error("{artifact} expects {expected} features but the request assembled {actual}")]
    FeatureCountMismatch {
        artifact: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{artifact} artifact declares {declared} features but its estimator was fitted on a different width")]
    InconsistentArtifact {
        artifact: &'static str,
        declared: usize,
    },
    #[error("model error: {0}")]
    Model(#[from] Failed),
    #[error("template error")]
    Render(#[from] tera::Error),
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("artifact json error")]
    Json(#[from] serde_json::Error),
    #[error("csv error")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<PredictorError>,
    },
}

impl PredictorError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictorError::MissingField { .. } => StatusCode::BAD_REQUEST,
            PredictorError::InvalidNumber { .. }
            | PredictorError::ArtifactsNotLoaded
            | PredictorError::FeatureCountMismatch { .. }
            | PredictorError::InconsistentArtifact { .. }
            | PredictorError::Model(_)
            | PredictorError::Render(_)
            | PredictorError::Io(_)
            | PredictorError::Json(_)
            | PredictorError::Csv(_)
            | PredictorError::Row { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PredictorError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = %status, "request failed: {}", self);

        (status, self.to_string()).into_response()
    }
}
