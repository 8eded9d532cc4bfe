use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Consumer {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

impl Consumer {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            custom_id: None,
        }
    }
}

/// A credential for one consumer. `name` is the credential type (e.g.
/// `key-auth`, `basic-auth`); only `config` is sent as the payload.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Credential {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl Credential {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            config: Map::new(),
        }
    }
}
