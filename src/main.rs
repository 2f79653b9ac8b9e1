use anyhow::Result;
use chicensemble_api::ai::GeminiChatClient;
use chicensemble_api::dispatch::Dispatcher;
use chicensemble_api::models::Config;
use chicensemble_api::server::{router, AppState};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "chicensemble-api")]
#[command(about = "ChicEnsemble style assistant backend")]
struct CliArgs {
    /// Port to listen on (overrides the PORT environment variable).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chicensemble_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env()?;
    let port = args.port.unwrap_or(config.port);

    let dispatcher = match &config.gemini_api_key {
        Some(api_key) => {
            let mut builder = reqwest::Client::builder();
            if config.insecure_tls {
                warn!("GEMINI_INSECURE_TLS is set; TLS certificate verification is DISABLED for Gemini requests");
                builder = builder.danger_accept_invalid_certs(true);
            }
            let http_client = builder.build()?;

            info!("Chat provider: Gemini (model: {})", config.gemini_model);
            Dispatcher::new(Box::new(GeminiChatClient::new_with_client(
                api_key.clone(),
                config.gemini_model.clone(),
                http_client,
            )))
        }
        None => {
            warn!("GEMINI_API_KEY is not set; chat requests will report a configuration error");
            Dispatcher::unconfigured()
        }
    };

    let state = AppState::new(dispatcher, config.gemini_model.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on http://0.0.0.0:{}", port);
    info!("API endpoint: http://0.0.0.0:{}/api/chat", port);

    axum::serve(listener, app).await?;

    Ok(())
}
