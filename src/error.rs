//! Startup errors. Everything that can go wrong at runtime is absorbed by the
//! state machine as a no-op; only loading data and settings can fail.

use std::fmt;

use wasm_bindgen::JsValue;

#[derive(Debug)]
pub enum ConfigError {
    /// Dataset or configuration JSON could not be parsed at all.
    Json(serde_json::Error),
    /// No record survived validation.
    EmptyDataset,
    /// Fewer valid records than cards in a hand.
    TooFewPoems { found: usize, required: usize },
    InvalidSetting { name: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(err) => write!(f, "malformed JSON: {err}"),
            ConfigError::EmptyDataset => write!(f, "no valid poems in dataset"),
            ConfigError::TooFewPoems { found, required } => write!(
                f,
                "dataset has {found} valid poems, at least {required} are required"
            ),
            ConfigError::InvalidSetting { name, reason } => {
                write!(f, "invalid setting `{name}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

impl From<ConfigError> for JsValue {
    fn from(err: ConfigError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
