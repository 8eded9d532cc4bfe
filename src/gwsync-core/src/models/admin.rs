// Records returned by the admin API. Only the fields the tool needs are
// decoded; everything else in the response is ignored.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// One page of a list endpoint: `{"data": [...], "next": "/services?offset=..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default = "Vec::new", deserialize_with = "lenient_list")]
    pub data: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

// Some gateway versions encode an empty list as `{}`.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Data<T> {
        List(Vec<T>),
        Object(serde_json::Map<String, serde_json::Value>),
    }

    match Data::<T>::deserialize(deserializer)? {
        Data::List(items) => Ok(items),
        Data::Object(map) if map.is_empty() => Ok(Vec::new()),
        Data::Object(_) => Err(D::Error::custom("expected a list in `data`")),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ServiceRecord {
    /// Path key for the service: its name, or its id for unnamed services.
    pub fn key(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumerRecord {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
}

impl ConsumerRecord {
    pub fn key(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialRecord {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
}
