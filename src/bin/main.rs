use std::sync::Arc;

use clap::Parser;
use tokio::select;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use portfolio_view::{
    api::PortfolioApi,
    tui::app::{App, LOAD_FAILED_MESSAGE},
    ApiCommand, AppEvent,
};

#[derive(Parser, Debug)]
struct Args {
    /// host:port of the portfolio backend
    #[arg(long, env = "PORTFOLIO_ADDRESS", default_value = "127.0.0.1:5000")]
    address: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("{}=info,reqwest=warn", env!("CARGO_CRATE_NAME")).into()
        }))
        .with(fmt::layer())
        .init();

    let (event_tx, event_rx) = tokio::sync::mpsc::channel::<AppEvent>(100);
    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::channel::<ApiCommand>(100);
    let mut app = App::new(event_rx, cmd_tx);

    let api = Arc::new(PortfolioApi::new(&args.address));

    // Each command runs in its own task so a slow request never blocks the
    // next one. Overlapping responses resolve as last-write-wins.
    let worker_task = tokio::task::spawn(async move {
        while let Some(command) = cmd_rx.recv().await {
            let api = api.clone();
            let tx = event_tx.clone();
            tokio::spawn(async move {
                let event = match command {
                    ApiCommand::LoadAssets => match api.list_assets().await {
                        Ok(response) => AppEvent::Assets(response),
                        Err(err) => {
                            error!("Loading assets failed: {err}");
                            AppEvent::LoadFailed(LOAD_FAILED_MESSAGE.to_string())
                        }
                    },
                    ApiCommand::CreateAsset(asset) => match api.create_asset(&asset).await {
                        Ok(message) => AppEvent::AssetCreated { message },
                        Err(err) => {
                            error!("Adding asset failed: {err}");
                            AppEvent::CreateFailed {
                                message: err.mutation_message("add"),
                            }
                        }
                    },
                    ApiCommand::DeleteAsset(id) => match api.delete_asset(id).await {
                        Ok(message) => AppEvent::AssetDeleted { message },
                        Err(err) => {
                            error!("Deleting asset {id} failed: {err}");
                            AppEvent::DeleteFailed {
                                message: err.mutation_message("delete"),
                            }
                        }
                    },
                };
                let _ = tx.send(event).await;
            });
        }
    });

    let app_task = tokio::task::spawn(async move {
        let _ = app.run().await;
    });

    select! {
        _ = app_task => {},
        _ = worker_task => {}
    }

    ratatui::restore();
}
