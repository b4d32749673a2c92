use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::ai_service::{ExtractionError, IngredientExtractor};
use super::normalizer::EncodedImage;
use crate::config::Config;

pub const IMAGE_EXTRACT_PROMPT: &str = "Extract and transcribe ALL ingredients listed or visible in the provided image with 100% accuracy.
Analyze the image thoroughly and capture every ingredient mentioned, including those in small or partially visible text.

Important Requirements:
- List all ingredients in the image in Vietnamese
- Extract ONLY ingredient names
- Maintain the original order and grouping as shown in the image
- Preserve diacritical marks for Vietnamese or other accented text
- If any part of an ingredient is unclear or unreadable, indicate with [unreadable]
- Do not include any commentary, explanations, or formatting that is not part of the image
- Output ONLY the list of ingredients, nothing else
";

const TOP_K: u32 = 32;
const TOP_P: f32 = 0.95;
const TEMPERATURE: f32 = 0.2;
const MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    top_k: u32,
    top_p: f32,
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts joined.
    fn into_text(self) -> Result<String, ExtractionError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return match self.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => Err(ExtractionError::Blocked(reason)),
                None => Err(ExtractionError::EmptyResponse),
            };
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            log::warn!(
                "⚠️ Gemini candidate had no text (finish reason: {:?})",
                candidate.finish_reason
            );
            return Err(ExtractionError::EmptyResponse);
        }

        Ok(text)
    }
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        if config.gemini_api_key.trim().is_empty() {
            anyhow::bail!("Gemini API key is empty");
        }
        if config.gemini_model.trim().is_empty() {
            anyhow::bail!("Gemini model identifier is empty");
        }

        Ok(Self {
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.gemini_api_base.trim_end_matches('/'),
                config.gemini_model
            ),
            client: reqwest::Client::new(),
        })
    }

    #[cfg(any(feature = "server", test))]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_image_to_model(
        &self,
        prompt: &str,
        image: &EncodedImage,
    ) -> Result<String, ExtractionError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: image.mime_type().to_string(),
                            data: image.base64.clone(),
                        },
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                top_k: TOP_K,
                top_p: TOP_P,
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        log::info!("🤖 Sending image to Gemini with model: {}", self.model);
        log::debug!(
            "📤 Image payload: {} base64 chars ({})",
            image.base64.len(),
            image.mime_type()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 Gemini response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;

        parsed.into_text()
    }
}

#[async_trait::async_trait]
impl IngredientExtractor for GeminiClient {
    async fn extract_ingredients(
        &self,
        image: &EncodedImage,
    ) -> Result<Vec<String>, ExtractionError> {
        if image.is_empty() {
            return Err(ExtractionError::InvalidArgument);
        }

        let text = match self.send_image_to_model(IMAGE_EXTRACT_PROMPT, image).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("❌ Error sending image to model: {}", e);
                return Err(e);
            }
        };
        log::debug!("💬 Gemini response text: {}", text);

        let ingredients = parse_ingredient_list(&text);
        log::info!("✅ Extracted {} ingredients", ingredients.len());
        Ok(ingredients)
    }
}

/// Turn the model's free-text reply into one ingredient per non-empty line,
/// with leading `- ` bullets removed. Order is preserved, duplicates are kept.
pub fn parse_ingredient_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', ' ']).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
