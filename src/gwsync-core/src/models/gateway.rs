use crate::{Consumer, Credential, Plugin, Route, Service};
use serde::Deserialize;

// ---------- declaration file ----------
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Declaration {
    /// Admin API host, optionally with port and path prefix.
    pub host: String,
    #[serde(default)]
    pub https: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub plugins: Vec<Plugin>,
    #[serde(default)]
    pub consumers: Vec<Consumer>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl Declaration {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn admin_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }

    /// True when nothing is declared; such a declaration is never applied.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
            && self.routes.is_empty()
            && self.plugins.is_empty()
            && self.consumers.is_empty()
            && self.credentials.is_empty()
    }
}
