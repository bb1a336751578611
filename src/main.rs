use clap::Parser;
use tracing::debug;

use stroke_predictor::config::{configure_env, Cli, Command};
use stroke_predictor::model::Predictor;
use stroke_predictor::{logging, score, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    configure_env();
    logging::configure_logging()?;

    let command = Cli::parse().command();
    debug!("Arguments {:#?}", command);

    match command {
        Command::Serve(args) => server::serve(args).await,
        Command::Score(args) => {
            let predictor = Predictor::load(&args.scaler_path, &args.model_path)?;
            score::score_file(&predictor, &args.input, args.output.as_deref())?;
            Ok(())
        }
    }
}
