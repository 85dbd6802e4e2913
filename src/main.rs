// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # WHOOP MCP Server Binary
//!
//! Starts the MCP server with one WHOOP client constructed from
//! configuration and shared across tool calls.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use whoop_mcp_server::{config::Config, logging, mcp::McpServer, whoop::WhoopClient};

#[derive(Parser, Debug)]
#[command(name = "whoop-mcp-server")]
#[command(about = "MCP server exposing WHOOP recovery, sleep, and strain data", version)]
struct Args {
    /// Port to listen on (overrides config and the PORT variable)
    #[arg(short, long)]
    port: Option<u16>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let args = Args::parse();
    let config = Config::load(args.config)?;
    let port = args.port.unwrap_or(config.port);

    let email = config.whoop_email.clone().unwrap_or_default();
    let password = config.whoop_password.clone().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        // The server still starts; data tools report the credential error
        info!("WHOOP credentials not configured, data tools will fail until they are");
    }

    let client = match &config.base_url {
        Some(base) => WhoopClient::with_base_url(base, email, password)?,
        None => WhoopClient::new(email, password)?,
    };

    let server = McpServer::new(Arc::new(client));

    info!("🚀 WHOOP MCP server starting on port {}", port);
    info!("📊 Ready to serve recovery, sleep, and strain data!");

    if let Err(e) = server.run(port).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
