//! OpenRemote tools MCP server - main entry point.
//!
//! Registers with the OpenRemote manager, compiles one create tool per asset
//! type, then serves MCP over stdio until EOF or Ctrl-C. Deregisters on the
//! way out, even if heartbeats were failing.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use openremote_tools::mcp::{McpRouter, McpServer};
use openremote_tools::observability::init_tracing;
use openremote_tools::service::ServiceManager;
use openremote_tools::tools::init_tools;
use openremote_tools::tools::registration::summarize_failures;
use openremote_tools::types::{ObservabilityConfig, OpenRemoteConfig, ServiceConfig};
use openremote_tools::Config;

#[derive(Parser, Debug)]
#[command(name = "openremote-tools", version, about)]
struct Args {
    /// Base URL of the OpenRemote manager.
    #[arg(long, env = "OPENREMOTE_URL")]
    url: String,

    #[arg(long, env = "OPENREMOTE_REALM", default_value = "master")]
    realm: String,

    #[arg(long, env = "OPENREMOTE_CLIENT_ID")]
    client_id: String,

    #[arg(long, env = "OPENREMOTE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Verify the manager's TLS certificate.
    #[arg(long, env = "OPENREMOTE_VERIFY_SSL", default_value_t = true, action = clap::ArgAction::Set)]
    verify_ssl: bool,

    /// Heartbeat interval, e.g. "30s" or "1m".
    #[arg(long, env = "OPENREMOTE_HEARTBEAT_INTERVAL", default_value = "30s", value_parser = humantime::parse_duration)]
    heartbeat_interval: Duration,

    /// Bounded wait for an in-flight heartbeat on shutdown.
    #[arg(long, env = "OPENREMOTE_SHUTDOWN_GRACE", default_value = "5s", value_parser = humantime::parse_duration)]
    shutdown_grace: Duration,

    #[arg(long, env = "OPENREMOTE_SERVICE_ID", default_value = "MCP-Server")]
    service_id: String,

    #[arg(long, env = "OPENREMOTE_SERVICE_LABEL", default_value = "MCP Server")]
    service_label: String,

    #[arg(long, env = "OPENREMOTE_HOMEPAGE_URL", default_value = "http://localhost:8420")]
    homepage_url: String,

    #[arg(long, env = "OPENREMOTE_TOOLS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON.
    #[arg(long, env = "OPENREMOTE_TOOLS_JSON_LOGS")]
    json_logs: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            openremote: OpenRemoteConfig {
                url: args.url,
                realm: args.realm,
                client_id: args.client_id,
                client_secret: args.client_secret,
                verify_ssl: args.verify_ssl,
                heartbeat_interval: args.heartbeat_interval,
                shutdown_grace: args.shutdown_grace,
            },
            service: ServiceConfig {
                service_id: args.service_id,
                label: args.service_label,
                homepage_url: args.homepage_url,
            },
            observability: ObservabilityConfig {
                log_level: args.log_level,
                json_logs: args.json_logs,
            },
        }
    }
}

/// Bounded wait for blocked tasks once `run` returns. The stdin reader sits
/// in a blocking read that cannot be cancelled while the host keeps the pipe open.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    block_on_with_bounded_shutdown(run(), RUNTIME_SHUTDOWN_TIMEOUT)?
}

/// Drive `future` to completion, then give leftover tasks at most `timeout`.
fn block_on_with_bounded_shutdown<F: std::future::Future>(
    future: F,
    timeout: Duration,
) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(timeout);
    Ok(output)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config: Config = Args::parse().into();
    init_tracing(&config.observability);
    config.validate()?;

    let service = Arc::new(ServiceManager::with_shutdown_grace(
        config.openremote.shutdown_grace,
    ));
    service.register_with_config(&config).await?;

    let (tools, report) = match init_tools(service.platform().await?.as_ref()).await {
        Ok(built) => built,
        Err(e) => {
            tracing::error!("tool_init_failed: error={}", e);
            if let Err(e) = service.deregister().await {
                tracing::warn!("shutdown_deregister_failed: error={}", e);
            }
            return Err(e.into());
        }
    };
    if let Some(summary) = summarize_failures(&report.failures) {
        tracing::warn!("asset_types_unavailable: {}", summary);
    }

    let router = McpRouter::new(tools, Arc::clone(&service), config.service.service_id.clone());
    let server = McpServer::new(Arc::new(router));

    tokio::select! {
        result = server.serve_stdio() => {
            if let Err(e) = result {
                tracing::error!("mcp_server_failed: error={}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown_requested");
        }
    }

    if let Err(e) = service.deregister().await {
        tracing::warn!("shutdown_deregister_failed: error={}", e);
    }

    Ok(())
}
