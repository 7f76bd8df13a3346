use std::str::FromStr;

use scenebridge_rpc::ResultEnvelope;
use serde_json::{Map, Value, json};
use strum_macros::{Display, EnumString};

use crate::editor::Editor;
use crate::handler::{CommandError, CommandHandler, CommandResult, finish};
use crate::params::Params;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 200;

/// Actions of the `asset` family, matched ignoring ASCII case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AssetAction {
    Search,
}

pub struct AssetCommandHandler;

impl CommandHandler for AssetCommandHandler {
    fn prefix(&self) -> &'static str {
        "asset"
    }

    fn description(&self) -> &'static str {
        "Search assets in the project by name or type"
    }

    fn execute(
        &self,
        editor: &mut Editor,
        action: &str,
        parameters: &Map<String, Value>,
    ) -> ResultEnvelope {
        let result = match AssetAction::from_str(action) {
            Ok(AssetAction::Search) => search(editor, Params::new(parameters)),
            Err(_) => {
                return ResultEnvelope::error(format!(
                    "Unknown action: {action}. Use '{}'.",
                    AssetAction::Search
                ));
            }
        };
        finish(self.prefix(), action, result)
    }
}

/// Fractional limits are truncated, then clamped to `1..=200`.
fn clamp_limit(raw: f64) -> usize {
    raw.trunc().clamp(1.0, MAX_LIMIT as f64) as usize
}

fn search(editor: &mut Editor, params: Params) -> CommandResult {
    let query = params
        .string("query")
        .filter(|q| !q.trim().is_empty())
        .ok_or(CommandError::Invalid("query is required"))?;
    let limit = params.number("limit").map_or(DEFAULT_LIMIT, clamp_limit);
    let query = match params.string("type").filter(|t| !t.trim().is_empty()) {
        Some(ty) => format!("t:{ty} {query}"),
        None => query,
    };

    let entries = editor.assets.search(&query)?;
    let total = entries.len();
    let results: Vec<Value> = entries
        .into_iter()
        .take(limit)
        .map(|entry| {
            json!({
                "path": entry.path,
                "name": entry.name,
                "type": entry.type_name,
                "guid": entry.guid,
            })
        })
        .collect();

    Ok(ResultEnvelope::ok()
        .with("count", results.len())
        .with("total", total)
        .with("results", results))
}
