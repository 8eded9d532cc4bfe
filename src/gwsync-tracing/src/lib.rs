use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::{trace as sdktrace, Resource};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as layer_fmt;
use tracing_subscriber::{prelude::*, Layer, Registry};

/// Console output style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected text, pretty or json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        })
    }
}

/// Keeps the span exporter alive; flushes pending spans when dropped.
#[must_use = "dropping the guard shuts span export down"]
pub struct TracingGuard {
    provider: Option<sdktrace::SdkTracerProvider>,
}

impl TracingGuard {
    pub fn exports_spans(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("failed to flush spans: {err}");
            }
        }
    }
}

fn filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn tracer_provider(service_name: &str, endpoint: &str) -> Result<sdktrace::SdkTracerProvider> {
    let resource = Resource::builder()
        .with_service_name(Cow::Owned(service_name.to_string()))
        .with_attributes(vec![KeyValue::new("service.version", env!("CARGO_PKG_VERSION"))])
        .build();

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .build()
        .with_context(|| format!("Failed to build OTLP exporter for {endpoint}"))?;

    Ok(sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Install the global subscriber: console logs filtered by `log_level`
/// (an `EnvFilter` directive such as `info` or `gwsync_engine=debug`), plus
/// OTLP span export when `otlp_endpoint` is set.
///
/// Call before starting an async runtime; the OTLP exporter uses a blocking
/// HTTP client.
pub fn init(
    service_name: &str,
    otlp_endpoint: Option<&str>,
    log_level: &str,
    log_format: LogFormat,
) -> Result<TracingGuard> {
    let provider = otlp_endpoint
        .map(|endpoint| tracer_provider(service_name, endpoint))
        .transpose()?;
    let otel_layer = provider
        .as_ref()
        .map(|p| OpenTelemetryLayer::new(p.tracer(Cow::Owned(service_name.to_string()))));

    // boxed so the three styles unify
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match log_format {
        LogFormat::Json => Box::new(
            layer_fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(filter(log_level)),
        ),
        LogFormat::Pretty => Box::new(
            layer_fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_filter(filter(log_level)),
        ),
        LogFormat::Text => Box::new(
            layer_fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter(log_level)),
        ),
    };

    let subscriber = Registry::default().with(fmt_layer).with(otel_layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("a global tracing subscriber is already installed")?;

    Ok(TracingGuard { provider })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn init_installs_the_subscriber_once() {
        let guard = init("gwsync-test", None, "debug", LogFormat::Json).unwrap();
        assert!(!guard.exports_spans());
        tracing::info!("subscriber installed");
        assert!(init("gwsync-test", None, "info", LogFormat::Text).is_err());
    }
}
