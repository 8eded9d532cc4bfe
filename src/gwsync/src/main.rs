use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gwsync_client::{AdminClient, ClientConfig, DryRunClient, GatewayClient};
use gwsync_config::load_declaration;
use gwsync_core::Declaration;
use gwsync_engine::{ApplyReport, Reconciler};
use gwsync_tracing::LogFormat;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(version, about = "gwsync - apply a declarative configuration to an API gateway")]
struct Cli {
    /// Log filter directive, e.g. `info` or `gwsync_engine=debug`
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Console log style: text, pretty or json
    #[arg(long, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    /// Export spans to this OTLP/HTTP endpoint
    #[arg(long, global = true)]
    otlp_endpoint: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the gateway's configuration with the declared one
    Apply(ApplyArgs),
    /// Print the gwsync version
    Version,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Declaration file (yaml/json/toml)
    #[arg(short, long, default_value = "./gwsync.yaml")]
    file: PathBuf,
    /// Read the gateway and log the writes without performing them
    #[arg(long)]
    dry_run: bool,
    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = gwsync_tracing::init(
        "gwsync",
        cli.otlp_endpoint.as_deref(),
        &cli.log_level,
        cli.log_format,
    )?;

    match cli.command {
        Command::Version => {
            println!("gwsync {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Apply(args) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to start the async runtime")?;
            runtime.block_on(apply(&args)).map(|_| ())
        }
    }
}

fn gateway_client(decl: &Declaration, args: &ApplyArgs) -> Result<Box<dyn GatewayClient>> {
    let config =
        ClientConfig::from_declaration(decl).with_timeout(Duration::from_secs(args.timeout));
    let admin = AdminClient::new(config)?;
    info!(admin = %admin.base_url(), dry_run = args.dry_run, "connecting to admin API");

    if args.dry_run {
        Ok(Box::new(DryRunClient::new(admin)))
    } else {
        Ok(Box::new(admin))
    }
}

async fn apply(args: &ApplyArgs) -> Result<ApplyReport> {
    let decl = load_declaration(&args.file)?;
    if let Some(version) = &decl.version {
        info!(%version, "declaration version");
    }

    let started = Instant::now();
    let reconciler = Reconciler::new(gateway_client(&decl, args)?);
    let report = reconciler
        .apply(&decl)
        .await
        .with_context(|| format!("apply {} failed", args.file.display()))?;

    summarize(&report, started.elapsed());
    Ok(report)
}

fn summarize(report: &ApplyReport, elapsed: Duration) {
    if report.skipped {
        return;
    }
    let (d, c) = (&report.deleted, &report.created);
    info!(
        services = d.services,
        routes = d.routes,
        plugins = d.plugins,
        consumers = d.consumers,
        "deleted"
    );
    info!(
        services = c.services,
        routes = c.routes,
        plugins = c.plugins,
        consumers = c.consumers,
        credentials = c.credentials,
        "created"
    );
    for (route, id) in report.routes.iter() {
        debug!(%route, %id, "route id");
    }
    info!("apply finished in {}ms", elapsed.as_millis());
}
