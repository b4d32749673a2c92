use super::normalizer::EncodedImage;

/// Errors returned by an ingredient extractor.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no valid image data")]
    InvalidArgument,

    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid response from model: {0}")]
    InvalidResponse(String),

    #[error("model blocked the request: {0}")]
    Blocked(String),

    #[error("model returned no text")]
    EmptyResponse,
}

/// Trait for vision models that read ingredient lists (Gemini, test doubles, etc.)
#[async_trait::async_trait]
pub trait IngredientExtractor: Send + Sync {
    async fn extract_ingredients(
        &self,
        image: &EncodedImage,
    ) -> Result<Vec<String>, ExtractionError>;
}
