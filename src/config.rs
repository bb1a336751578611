use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(author, version, about = "Stroke risk prediction front end", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// `serve` with its defaults when no subcommand is given.
    pub fn command(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Serve(ServeArgs::parse_from(["serve"])))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the prediction form over HTTP
    Serve(ServeArgs),
    /// Score every row of a dataset CSV file
    Score(ScoreArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "STROKE_HOST", default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, env = "STROKE_PORT", default_value_t = 5000)]
    pub port: u16,
    #[command(flatten)]
    pub artifacts: ArtifactArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ArtifactArgs {
    /// Fitted scaler artifact (JSON)
    #[arg(long, env = "STROKE_SCALER_PATH")]
    pub scaler_path: Option<PathBuf>,
    /// Fitted classifier artifact (JSON)
    #[arg(long, env = "STROKE_MODEL_PATH")]
    pub model_path: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ScoreArgs {
    /// Dataset CSV in the healthcare stroke layout
    #[arg(short, long)]
    pub input: PathBuf,
    /// Where to write `id,prediction` rows; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long, env = "STROKE_SCALER_PATH")]
    pub scaler_path: PathBuf,
    #[arg(long, env = "STROKE_MODEL_PATH")]
    pub model_path: PathBuf,
}

/// Loads `.env` from the working directory when present.
pub fn configure_env() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment variables from: {}", path.display()),
        Err(_) => debug!("No .env file found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::parse_from(["stroke-predictor"]);

        match cli.command() {
            Command::Serve(args) => assert!(args.port > 0),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn serve_reads_artifact_paths() {
        let cli = Cli::parse_from([
            "stroke-predictor",
            "serve",
            "--port",
            "8080",
            "--scaler-path",
            "scaler.json",
            "--model-path",
            "model.json",
        ]);
        let Some(Command::Serve(args)) = cli.command else {
            panic!("expected serve");
        };

        assert_eq!(args.port, 8080);
        assert_eq!(args.artifacts.scaler_path, Some(PathBuf::from("scaler.json")));
        assert_eq!(args.artifacts.model_path, Some(PathBuf::from("model.json")));
    }

    #[test]
    fn score_takes_input_and_artifacts() {
        let cli = Cli::parse_from([
            "stroke-predictor",
            "score",
            "--input",
            "stroke.csv",
            "--scaler-path",
            "scaler.json",
            "--model-path",
            "model.json",
        ]);

        match cli.command() {
            Command::Score(args) => {
                assert_eq!(args.input, PathBuf::from("stroke.csv"));
                assert_eq!(args.model_path, PathBuf::from("model.json"));
                assert!(args.output.is_none());
            }
            other => panic!("expected score, got {other:?}"),
        }
    }
}
