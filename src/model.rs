//! The two pre-fitted collaborators behind a prediction: a feature scaler and
//! a binary classifier. Both are loaded from JSON artifacts exported ahead of
//! time and never mutated afterwards.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use smartcore::api::Transformer;
use smartcore::error::Failed;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::LogisticRegression;
use smartcore::metrics::distance::euclidian::Euclidian;
use smartcore::neighbors::knn_classifier::KNNClassifier;
use smartcore::preprocessing::numerical::StandardScaler;
use tracing::{info, warn};

use crate::encoding::{FeatureVector, FEATURE_COUNT};
use crate::error::PredictorError;

pub trait FeatureScaler: Send + Sync {
    /// Width of the vectors this scaler was fitted on.
    fn n_features(&self) -> usize;

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictorError>;
}

pub trait BinaryClassifier: Send + Sync {
    /// Width of the vectors this classifier was fitted on.
    fn n_features(&self) -> usize;

    fn predict(&self, features: &[f64]) -> Result<i32, PredictorError>;
}

/// On-disk envelope: the estimator plus the feature width it was fitted on.
#[derive(Debug, Serialize, Deserialize)]
pub struct Artifact<E> {
    pub n_features: usize,
    pub estimator: E,
}

impl<E: DeserializeOwned> Artifact<E> {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PredictorError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

pub type ScalerArtifact = Artifact<StandardScaler<f64>>;

pub type LogisticModel = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;
pub type KnnModel = KNNClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>, Euclidian<f64>>;

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression(LogisticModel),
    Knn(KnnModel),
}

pub type ClassifierArtifact = Artifact<Classifier>;

fn single_row(features: &[f64]) -> DenseMatrix<f64> {
    DenseMatrix::new(1, features.len(), features.to_vec(), true)
}

impl FeatureScaler for ScalerArtifact {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictorError> {
        let scaled = self.estimator.transform(&single_row(features))?;
        let (_, ncols) = scaled.shape();

        Ok((0..ncols).map(|col| *scaled.get((0, col))).collect())
    }
}

impl ScalerArtifact {
    /// Fails unless the scaler accepts, and returns, vectors of the declared
    /// width.
    pub fn check_fitted_width(&self) -> Result<(), PredictorError> {
        accepts_declared_width("scaler", self.n_features, |row| {
            let scaled = FeatureScaler::transform(self, row)?;
            check_width("scaler", self.n_features, scaled.len())
        })
    }
}

impl ClassifierArtifact {
    pub fn check_fitted_width(&self) -> Result<(), PredictorError> {
        match &self.estimator {
            Classifier::LogisticRegression(model)
                if model.coefficients().shape().1 != self.n_features =>
            {
                Err(PredictorError::InconsistentArtifact {
                    artifact: "classifier",
                    declared: self.n_features,
                })
            }
            _ => accepts_declared_width("classifier", self.n_features, |row| {
                BinaryClassifier::predict(self, row).map(|_| ())
            }),
        }
    }
}

/// Runs `attempt` on a zero row of the declared width. smartcore either
/// errors or panics on a width the estimator was not fitted on.
fn accepts_declared_width<F>(
    artifact: &'static str,
    declared: usize,
    attempt: F,
) -> Result<(), PredictorError>
where
    F: FnOnce(&[f64]) -> Result<(), PredictorError>,
{
    let zeros = vec![0.0; declared];

    match panic::catch_unwind(AssertUnwindSafe(|| attempt(&zeros))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) | Err(_) => Err(PredictorError::InconsistentArtifact { artifact, declared }),
    }
}

impl BinaryClassifier for ClassifierArtifact {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<i32, PredictorError> {
        let x = single_row(features);
        let labels = match &self.estimator {
            Classifier::LogisticRegression(model) => model.predict(&x)?,
            Classifier::Knn(model) => model.predict(&x)?,
        };

        labels
            .first()
            .copied()
            .ok_or_else(|| PredictorError::Model(Failed::predict("classifier returned no label")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeRisk {
    Yes,
    No,
}

impl StrokeRisk {
    pub fn from_label(label: i32) -> Self {
        if label == 1 {
            StrokeRisk::Yes
        } else {
            StrokeRisk::No
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrokeRisk::Yes => "Yes",
            StrokeRisk::No => "No",
        }
    }
}

impl fmt::Display for StrokeRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scaler and classifier, applied in that order.
pub struct Predictor {
    scaler: Box<dyn FeatureScaler>,
    classifier: Box<dyn BinaryClassifier>,
}

impl Predictor {
    pub fn new(scaler: Box<dyn FeatureScaler>, classifier: Box<dyn BinaryClassifier>) -> Self {
        Self { scaler, classifier }
    }

    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        scaler_path: P,
        model_path: Q,
    ) -> Result<Self, PredictorError> {
        let scaler = ScalerArtifact::load(scaler_path.as_ref())?;
        let classifier = ClassifierArtifact::load(model_path.as_ref())?;
        scaler.check_fitted_width()?;
        classifier.check_fitted_width()?;

        info!(
            scaler = %scaler_path.as_ref().display(),
            model = %model_path.as_ref().display(),
            "Loaded prediction artifacts"
        );

        for (artifact, width) in [
            ("scaler", scaler.n_features),
            ("classifier", classifier.n_features),
        ] {
            if width != FEATURE_COUNT {
                warn!(
                    "{} was fitted on {} features but requests assemble {}; every prediction will fail",
                    artifact, width, FEATURE_COUNT
                );
            }
        }

        Ok(Self::new(Box::new(scaler), Box::new(classifier)))
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<StrokeRisk, PredictorError> {
        check_width("scaler", self.scaler.n_features(), features.as_slice().len())?;
        let scaled = self.scaler.transform(features.as_slice())?;

        check_width("classifier", self.classifier.n_features(), scaled.len())?;
        let label = self.classifier.predict(&scaled)?;

        Ok(StrokeRisk::from_label(label))
    }
}

fn check_width(artifact: &'static str, expected: usize, actual: usize) -> Result<(), PredictorError> {
    if expected == actual {
        Ok(())
    } else {
        Err(PredictorError::FeatureCountMismatch {
            artifact,
            expected,
            actual,
        })
    }
}
