use gwsync_errors::{GatewayError, Result};
use std::collections::BTreeMap;

/// Declared route name to server-assigned route id, for one apply run.
///
/// Routes only get an id once created, so route-scoped plugins look their
/// targets up here. A fresh registry is built by every run and handed back
/// in its report; nothing is shared between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRegistry {
    ids: BTreeMap<String, String>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a created route. Each name is registered once per run.
    pub fn register(&mut self, route: &str, id: &str) -> Result<()> {
        if self.ids.contains_key(route) {
            return Err(GatewayError::DuplicateRoute {
                route: route.to_string(),
            });
        }
        self.ids.insert(route.to_string(), id.to_string());
        Ok(())
    }

    /// Id of `route`, or `UnresolvedRoute` naming the `plugin` that asked.
    pub fn resolve(&self, plugin: &str, route: &str) -> Result<&str> {
        self.ids.get(route).map(String::as_str).ok_or_else(|| GatewayError::UnresolvedRoute {
            plugin: plugin.to_string(),
            route: route.to_string(),
        })
    }

    pub fn get(&self, route: &str) -> Option<&str> {
        self.ids.get(route).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ids.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
