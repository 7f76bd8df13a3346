use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{ success, error?, ...fields }`
///
/// On success `error` is absent and the action's fields are flattened next to
/// `success`. On failure only `error` is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResultEnvelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            fields: Map::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            fields: Map::new(),
        }
    }

    /// Add a result field. Builder style, so handlers read as one expression.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The error message, or `""` for a successful envelope.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "success": false, "error": e.to_string() })
        })
    }

    /// Interpret an arbitrary JSON reply as an envelope. Anything that does not
    /// carry a boolean `success` is reported as a failure.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value)
            .unwrap_or_else(|e| Self::error(format!("Malformed result envelope: {e}")))
    }
}
