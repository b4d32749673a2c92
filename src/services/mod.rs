pub mod ai_service;
pub mod gemini; // Google Gemini vision client
pub mod normalizer;

pub use ai_service::{ExtractionError, IngredientExtractor};
pub use gemini::GeminiClient;
pub use normalizer::normalize;
