use serde::{Deserialize, Serialize};

/// JSON body returned by the HTTP routes. Failures are reported in-band with status 200.
#[cfg(feature = "server")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Text { text: Vec<String> },
    Message { message: String },
    Error { error: String },
}

#[cfg(feature = "server")]
impl ApiResponse {
    pub fn error(message: impl Into<String>) -> Self {
        ApiResponse::Error {
            error: message.into(),
        }
    }
}

/// JSON object printed by the command line entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CliResponse {
    Ingredients { ingredients: Vec<String> },
    Error { error: String },
}

impl CliResponse {
    pub fn error(message: impl Into<String>) -> Self {
        CliResponse::Error {
            error: message.into(),
        }
    }
}
