use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const GLOBAL_TARGET: &str = "global";

fn def_enabled() -> bool {
    true
}

/// Where a plugin is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginTarget {
    Global,
    Scoped {
        services: Vec<String>,
        routes: Vec<String>,
    },
}

impl PluginTarget {
    pub fn is_global(&self) -> bool {
        matches!(self, PluginTarget::Global)
    }
}

// ---------- plugins ----------
// Declared as `target: global`, or with `services` / `routes` lists. The
// shorthands `target: service:<name>` and `target: route:<name>` add to the
// matching list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "PluginDecl")]
pub struct Plugin {
    pub name: String,
    pub enabled: bool,
    #[serde(skip_serializing)]
    pub target: PluginTarget,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
}

impl Plugin {
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            target: PluginTarget::Global,
            config: Map::new(),
        }
    }

    pub fn scoped(name: impl Into<String>, services: Vec<String>, routes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            target: PluginTarget::Scoped { services, routes },
            config: Map::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PluginDecl {
    name: String,
    #[serde(default = "def_enabled")]
    enabled: bool,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    services: Vec<String>,
    #[serde(default)]
    routes: Vec<String>,
    #[serde(default)]
    config: Map<String, Value>,
}

fn shorthand_name(plugin: &str, target: &str, prefix: &str) -> Result<String, String> {
    let name = target[prefix.len()..].trim();
    if name.is_empty() {
        let kind = prefix.trim_end_matches(':');
        return Err(format!("plugin `{plugin}`: target `{target}` does not name a {kind}"));
    }
    Ok(name.to_string())
}

impl TryFrom<PluginDecl> for Plugin {
    type Error = String;

    fn try_from(decl: PluginDecl) -> Result<Self, Self::Error> {
        let PluginDecl {
            name,
            enabled,
            target,
            mut services,
            mut routes,
            config,
        } = decl;

        let target = match target.as_deref().map(str::trim) {
            Some(GLOBAL_TARGET) => {
                if !services.is_empty() || !routes.is_empty() {
                    return Err(format!(
                        "plugin `{name}`: a global plugin cannot also list services or routes"
                    ));
                }
                PluginTarget::Global
            }
            Some(t) if t.starts_with("service:") => {
                services.push(shorthand_name(&name, t, "service:")?);
                PluginTarget::Scoped { services, routes }
            }
            Some(t) if t.starts_with("route:") => {
                routes.push(shorthand_name(&name, t, "route:")?);
                PluginTarget::Scoped { services, routes }
            }
            None | Some("") => {
                if services.is_empty() && routes.is_empty() {
                    return Err(format!(
                        "plugin `{name}` has no target: \
                         use `target: global` or list services/routes"
                    ));
                }
                PluginTarget::Scoped { services, routes }
            }
            Some(other) => {
                return Err(format!("plugin `{name}`: unknown target `{other}`"));
            }
        };

        Ok(Self {
            name,
            enabled,
            target,
            config,
        })
    }
}
