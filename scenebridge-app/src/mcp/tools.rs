//! MCP Tool Definitions
//!
//! Scene and asset tools exposed via MCP. Every tool maps onto one host
//! command: `scene_SetParent` is sent as `scene.SetParent`.

use serde_json::{Map, Value, json};

use super::types::{McpTool, ToolAnnotations};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
        description,
    }
}

const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
        description,
    }
}

const fn mutating(title: &'static str) -> ToolAnnotations {
    ToolAnnotations {
        title,
        read_only_hint: false,
        destructive_hint: false,
        idempotent_hint: false,
        open_world_hint: false,
    }
}

const fn read_only(title: &'static str) -> ToolAnnotations {
    ToolAnnotations {
        title,
        read_only_hint: true,
        destructive_hint: false,
        idempotent_hint: true,
        open_world_hint: false,
    }
}

const fn destructive(title: &'static str) -> ToolAnnotations {
    ToolAnnotations {
        destructive_hint: true,
        ..mutating(title)
    }
}

/// One action of a family.
#[derive(Debug, Clone, Copy)]
pub struct ToolDefinition {
    pub action: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub annotations: ToolAnnotations,
}

impl ToolDefinition {
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in self.params {
            properties.insert(
                param.name.to_string(),
                json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// All tools sharing a command prefix.
#[derive(Debug, Clone, Copy)]
pub struct ToolFamily {
    pub prefix: &'static str,
    pub description: &'static str,
    pub tools: &'static [ToolDefinition],
}

impl ToolFamily {
    pub fn tool_name(&self, tool: &ToolDefinition) -> String {
        format!("{}_{}", self.prefix, tool.action)
    }
}

use ParamKind::{Number, String as Str};

const SCENE_TOOLS: &[ToolDefinition] = &[
    ToolDefinition {
        action: "CreateGameObject",
        description: "Create an empty GameObject in the active scene",
        params: &[
            optional("name", Str, "Object name (default: GameObject)"),
            optional("parentPath", Str, "Parent path e.g. Canvas/Panel"),
        ],
        annotations: mutating("Create GameObject"),
    },
    ToolDefinition {
        action: "AddComponent",
        description: "Add a component to a GameObject by path",
        params: &[
            required("path", Str, "GameObject path e.g. CitizenManager"),
            required("componentType", Str, "Component class name e.g. CitizenManager"),
        ],
        annotations: mutating("Add Component"),
    },
    ToolDefinition {
        action: "SetPosition",
        description: "Set GameObject position",
        params: &[
            required("path", Str, "GameObject path"),
            optional("x", Number, "X"),
            optional("y", Number, "Y"),
            optional("z", Number, "Z"),
        ],
        annotations: mutating("Set Position"),
    },
    ToolDefinition {
        action: "SetParent",
        description: "Set parent of a GameObject",
        params: &[
            required("path", Str, "GameObject path"),
            optional("parentPath", Str, "New parent path, empty to unparent"),
        ],
        annotations: mutating("Set Parent"),
    },
    ToolDefinition {
        action: "Find",
        description: "Find a GameObject by path",
        params: &[required("path", Str, "GameObject path e.g. Canvas/Button")],
        annotations: read_only("Find GameObject"),
    },
    ToolDefinition {
        action: "SaveScene",
        description: "Save the currently active scene to disk",
        params: &[],
        annotations: mutating("Save Scene"),
    },
    ToolDefinition {
        action: "OpenScene",
        description: "Open a scene by path (e.g. Assets/Scenes/BaseScene.scene)",
        params: &[required(
            "path",
            Str,
            "Scene path relative to project e.g. Assets/Scenes/BaseScene.scene",
        )],
        annotations: destructive("Open Scene"),
    },
    ToolDefinition {
        action: "GetActiveSceneName",
        description: "Get the name and path of the currently active scene",
        params: &[],
        annotations: read_only("Get Active Scene Name"),
    },
    ToolDefinition {
        action: "InstantiatePrefab",
        description: "Instantiate a prefab from Assets into the active scene (optionally under a parent)",
        params: &[
            required("prefabPath", Str, "Asset path e.g. Assets/Prefabs/MyPrefab.prefab"),
            optional("parentPath", Str, "Parent hierarchy path e.g. Canvas/Panel"),
        ],
        annotations: mutating("Instantiate Prefab"),
    },
    ToolDefinition {
        action: "ListRootObjects",
        description: "List root GameObject names in the active scene hierarchy",
        params: &[],
        annotations: read_only("List Root Objects"),
    },
];

const ASSET_TOOLS: &[ToolDefinition] = &[ToolDefinition {
    action: "Search",
    description: "Search project assets by query. Optionally filter by type (e.g. Prefab, Scene, Script).",
    params: &[
        required("query", Str, "Search text (name or keyword)"),
        optional("type", Str, "Filter by type: Prefab, Scene, Script, Texture2D, etc."),
        optional("limit", Number, "Max results (1-200, default 50)"),
    ],
    annotations: read_only("Search Assets"),
}];

/// Static tool list, queried once per agent session.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    families: Vec<ToolFamily>,
}

impl ToolCatalog {
    pub fn new(families: Vec<ToolFamily>) -> Self {
        Self { families }
    }

    /// The `scene` and `asset` families.
    pub fn builtin() -> Self {
        Self::new(vec![
            ToolFamily {
                prefix: "scene",
                description: "Create and modify GameObjects in the active scene",
                tools: SCENE_TOOLS,
            },
            ToolFamily {
                prefix: "asset",
                description: "Search assets in the project by name or type",
                tools: ASSET_TOOLS,
            },
        ])
    }

    pub fn families(&self) -> &[ToolFamily] {
        &self.families
    }

    /// Get all available MCP tools
    pub fn all_tools(&self) -> Vec<McpTool> {
        self.families
            .iter()
            .flat_map(|family| {
                family.tools.iter().map(move |tool| McpTool {
                    name: family.tool_name(tool),
                    description: tool.description.to_string(),
                    input_schema: tool.input_schema(),
                    annotations: tool.annotations,
                })
            })
            .collect()
    }

    /// Look a tool up by its MCP name.
    pub fn find(&self, name: &str) -> Option<(&ToolFamily, &ToolDefinition)> {
        let (prefix, action) = name.split_once('_')?;
        let family = self.families.iter().find(|f| f.prefix == prefix)?;
        let tool = family.tools.iter().find(|t| t.action == action)?;
        Some((family, tool))
    }
}

/// `scene_SetParent` → `scene.SetParent`. The action is everything after the
/// first underscore.
pub fn tool_command(name: &str) -> Option<String> {
    let (prefix, action) = name.split_once('_')?;
    Some(format!("{prefix}.{action}"))
}
