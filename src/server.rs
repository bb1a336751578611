use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;
use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Form, Router,
};
use tera::{Context, Tera};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::{ArtifactArgs, ServeArgs};
use crate::encoding::PredictionRequest;
use crate::error::PredictorError;
use crate::model::{Predictor, StrokeRisk};

const HOME_TEMPLATE: &str = "index.html";

/// Shared, read-only after startup.
pub struct AppState {
    templates: Tera,
    predictor: Option<Predictor>,
}

impl AppState {
    pub fn new(predictor: Option<Predictor>) -> Result<Self, PredictorError> {
        let mut templates = Tera::default();
        templates.add_raw_template(HOME_TEMPLATE, include_str!("../templates/index.html"))?;

        Ok(Self {
            templates,
            predictor,
        })
    }

    fn render_home(&self, prediction_text: Option<&str>) -> Result<Html<String>, PredictorError> {
        let mut context = Context::new();
        context.insert("prediction_text", &prediction_text);

        Ok(Html(self.templates.render(HOME_TEMPLATE, &context)?))
    }
}

pub fn prediction_text(risk: StrokeRisk) -> String {
    format!("Prediction: {} (Stroke Likelihood)", risk)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(route_home))
        .route("/predict", post(route_predict))
        .with_state(state)
}

async fn route_home(State(state): State<Arc<AppState>>) -> Result<Html<String>, PredictorError> {
    state.render_home(None)
}

async fn route_predict(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Html<String>, PredictorError> {
    let request = PredictionRequest::from_fields(&fields)?;
    let predictor = state
        .predictor
        .as_ref()
        .ok_or(PredictorError::ArtifactsNotLoaded)?;

    let risk = predictor.predict(&request.feature_vector())?;
    debug!(prediction = %risk, "Served prediction");

    state.render_home(Some(&prediction_text(risk)))
}

/// Loads the artifacts if both paths are configured. Half a configuration is
/// an error; none at all leaves the server up with predictions disabled.
pub fn load_predictor(artifacts: &ArtifactArgs) -> anyhow::Result<Option<Predictor>> {
    match (&artifacts.scaler_path, &artifacts.model_path) {
        (Some(scaler), Some(model)) => Ok(Some(Predictor::load(scaler, model)?)),
        (None, None) => {
            warn!("No prediction artifacts configured; every prediction request will fail");
            Ok(None)
        }
        _ => bail!("--scaler-path and --model-path must be configured together"),
    }
}

pub async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(load_predictor(&args.artifacts)?)?);

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down, waiting for in-flight requests to complete...");
}
