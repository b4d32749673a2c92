use anyhow::{Context, Result};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use super::pipeline::IngredientPipeline;
use crate::config::Config;
use crate::models::CliResponse;
use crate::services::GeminiClient;

/// Where the command line reads the image from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Stdin,
    File(PathBuf),
}

impl ImageSource {
    /// `-` means standard input, anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            ImageSource::Stdin
        } else {
            ImageSource::File(PathBuf::from(arg))
        }
    }
}

pub fn read_image<R: Read>(source: &ImageSource, mut stdin: R) -> Result<Vec<u8>> {
    match source {
        ImageSource::Stdin => {
            let mut buffer = Vec::new();
            stdin
                .read_to_end(&mut buffer)
                .context("failed to read image from stdin")?;
            Ok(buffer)
        }
        ImageSource::File(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
    }
}

/// Read the image, run the pipeline and fold every failure into the JSON envelope.
pub async fn run<R: Read>(
    pipeline: &IngredientPipeline,
    source: &ImageSource,
    stdin: R,
) -> CliResponse {
    let content = match read_image(source, stdin) {
        Ok(content) => content,
        Err(e) => {
            log::error!("❌ {:#}", e);
            return CliResponse::error(format!("{:#}", e));
        }
    };

    match pipeline.process(&content).await {
        Ok(ingredients) => CliResponse::Ingredients { ingredients },
        Err(e) => {
            log::error!("❌ Error processing image: {}", e);
            CliResponse::error(e.to_string())
        }
    }
}

/// Command line entry point: prints exactly one JSON object and returns the exit code.
///
/// Errors travel in the JSON envelope, so the exit code is 0 whenever JSON was printed.
pub async fn run_cli(config: Result<Config>, arg: &str) -> i32 {
    let source = ImageSource::from_arg(arg);

    let response = match config.and_then(|config| GeminiClient::new(&config)) {
        Ok(client) => {
            let pipeline = IngredientPipeline::new(Arc::new(client));
            run(&pipeline, &source, std::io::stdin()).await
        }
        Err(e) => {
            log::error!("❌ Startup failed: {:#}", e);
            CliResponse::error(format!("{:#}", e))
        }
    };

    match serde_json::to_string(&response) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            log::error!("❌ Failed to serialize result: {}", e);
            1
        }
    }
}
