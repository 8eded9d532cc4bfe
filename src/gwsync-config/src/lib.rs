use anyhow::{anyhow, bail, Context, Result};
use gwsync_core::Declaration;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("env var pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(anyhow!("Unknown declaration extension: {}", path.display())),
        }
    }
}

/// Read, expand, parse, normalize and validate a declaration file.
pub fn load_declaration(path: impl AsRef<Path>) -> Result<Declaration> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("read declaration {}", path.display()))?;
    let expanded = expand_env(&content);
    parse_declaration(&expanded, format)
        .with_context(|| format!("invalid declaration {}", path.display()))
}

pub fn parse_declaration(content: &str, format: Format) -> Result<Declaration> {
    let mut decl: Declaration = match format {
        Format::Yaml => serde_yml::from_str(content)?,
        Format::Json => serde_json::from_str(content)?,
        Format::Toml => toml::from_str(content)?,
    };
    normalize(&mut decl)?;
    validate(&decl)?;
    debug!(
        services = decl.services.len(),
        routes = decl.routes.len(),
        plugins = decl.plugins.len(),
        consumers = decl.consumers.len(),
        credentials = decl.credentials.len(),
        "declaration parsed"
    );
    Ok(decl)
}

/// Replace `$VAR` and `${VAR}` with values from the process environment.
/// Unset variables expand to the empty string.
pub fn expand_env(raw: &str) -> String {
    expand_with(raw, |name| std::env::var(name).ok())
}

pub fn expand_with<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_VAR
        .replace_all(raw, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}

/// Move routes declared inline under services into the top-level route list.
/// Top-level routes keep their order and come first.
pub fn normalize(decl: &mut Declaration) -> Result<()> {
    let mut nested = Vec::new();
    for svc in decl.services.iter_mut() {
        for mut route in svc.routes.drain(..) {
            if route.service.is_empty() {
                route.service = svc.name.clone();
            } else if route.service != svc.name {
                bail!(
                    "route `{}` is nested under service `{}` but applies to `{}`",
                    route.name,
                    svc.name,
                    route.service
                );
            }
            nested.push(route);
        }
    }
    decl.routes.extend(nested);
    Ok(())
}

/// Structural checks only. References between entities are resolved while
/// applying, so unknown services or routes surface as apply errors.
pub fn validate(decl: &Declaration) -> Result<()> {
    if decl.host.trim().is_empty() {
        bail!("`host` must name the admin API endpoint");
    }

    let mut seen = HashSet::new();
    for svc in &decl.services {
        if svc.name.is_empty() {
            bail!("every service needs a `name`");
        }
        if !seen.insert(svc.name.as_str()) {
            bail!("service `{}` is declared twice", svc.name);
        }
    }

    let mut seen = HashSet::new();
    for (idx, route) in decl.routes.iter().enumerate() {
        if route.name.is_empty() {
            bail!("route #{} needs a `name`", idx + 1);
        }
        if route.service.is_empty() {
            bail!("route `{}` needs `apply_to` naming its service", route.name);
        }
        if !seen.insert(route.name.as_str()) {
            bail!("route `{}` is declared twice", route.name);
        }
    }

    let mut seen = HashSet::new();
    for consumer in &decl.consumers {
        if consumer.username.is_empty() {
            bail!("every consumer needs a `username`");
        }
        if !seen.insert(consumer.username.as_str()) {
            bail!("consumer `{}` is declared twice", consumer.username);
        }
    }

    for cred in &decl.credentials {
        if cred.name.is_empty() || cred.target.is_empty() {
            bail!("every credential needs a `name` (credential type) and a `target` consumer");
        }
    }

    Ok(())
}
