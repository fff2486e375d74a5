use serde::{Deserialize, Serialize};

/// Response of `GET /v1/models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    /// Always `list`
    #[serde(default = "default_list_object")]
    pub object: String,
    pub data: Vec<Model>,
}

/// One model served by a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default = "default_model_object")]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub owned_by: String,
}

fn default_list_object() -> String {
    "list".to_string()
}

fn default_model_object() -> String {
    "model".to_string()
}
