use image::ImageFormat;
use std::sync::Arc;

use crate::services::{normalize, ExtractionError, IngredientExtractor};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to process image")]
    ImageProcessing,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Raw upload bytes -> normalized image -> ingredient list.
///
/// Shared by the HTTP route and the command line so both behave identically.
#[derive(Clone)]
pub struct IngredientPipeline {
    extractor: Arc<dyn IngredientExtractor>,
    format: ImageFormat,
}

impl IngredientPipeline {
    pub fn new(extractor: Arc<dyn IngredientExtractor>) -> Self {
        Self {
            extractor,
            format: ImageFormat::Jpeg,
        }
    }

    #[cfg(test)]
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub async fn process(&self, content: &[u8]) -> Result<Vec<String>, PipelineError> {
        log::info!("📸 Processing image: {} bytes", content.len());

        let image =
            normalize(Some(content), self.format).ok_or(PipelineError::ImageProcessing)?;
        let ingredients = self.extractor.extract_ingredients(&image).await?;

        Ok(ingredients)
    }
}
