mod config;
mod handlers;
mod models;
mod services;
#[cfg(feature = "server")]
mod server; // HTTP API (POST /api/create/image)

use anyhow::Result;
use dotenv::dotenv;
use std::env;

use config::Config;

const USAGE: &str = "usage: ingredient-vision [<image-path> | -]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables first so RUST_LOG from .env applies
    dotenv().ok();

    // Initialize logger (stderr, so CLI stdout stays pure JSON)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => run_server().await,
        [arg] => {
            let code = handlers::run_cli(Config::from_env(), arg).await;
            std::process::exit(code);
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

#[cfg(feature = "server")]
async fn run_server() -> Result<()> {
    use handlers::IngredientPipeline;
    use services::GeminiClient;
    use std::sync::Arc;

    log::info!("🚀 Starting ingredient extraction service...");

    let config = Config::from_env()?;
    let gemini = Arc::new(GeminiClient::new(&config)?);
    log::info!("✅ Gemini client initialized with model: {}", gemini.model());

    let pipeline = IngredientPipeline::new(gemini);
    server::serve(&config, pipeline).await
}

#[cfg(not(feature = "server"))]
async fn run_server() -> Result<()> {
    eprintln!("{}", USAGE);
    anyhow::bail!("built without the `server` feature; pass an image path or `-`")
}
