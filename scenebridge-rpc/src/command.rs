use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A command crossing the boundary: `"<prefix>.<action>"` plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            command: command.into(),
            parameters,
        }
    }

    /// Split on the first `.`. `None` when there is no separator.
    pub fn split(&self) -> Option<(&str, &str)> {
        split_command(&self.command)
    }
}

pub fn split_command(command: &str) -> Option<(&str, &str)> {
    command.split_once('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_first_dot() {
        assert_eq!(split_command("scene.Find"), Some(("scene", "Find")));
        assert_eq!(split_command("asset.search.v2"), Some(("asset", "search.v2")));
        assert_eq!(split_command("scene."), Some(("scene", "")));
        assert_eq!(split_command("scene"), None);
    }

    #[test]
    fn test_parameters_default_to_empty() {
        let request: CommandRequest =
            serde_json::from_str(r#"{"command":"scene.SaveScene"}"#).unwrap();
        assert!(request.parameters.is_empty());
        assert_eq!(request.split(), Some(("scene", "SaveScene")));
    }
}
