// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # WHOOP MCP Server
//!
//! A Model Context Protocol (MCP) server exposing WHOOP recovery, sleep,
//! strain, and healthspan data to Claude and other AI assistants.
//!
//! WHOOP has no public API for its daily reports, so the core of this crate
//! is an authenticated client for the vendor's mobile backend: it logs in
//! with account credentials through AWS Cognito, tracks the bearer token's
//! expiry, refreshes it proactively five minutes before expiry, and retries
//! a rejected request exactly once after a forced re-authentication.
//!
//! ## Architecture
//!
//! - **whoop**: the authenticated API client and its token lifecycle
//! - **mcp**: Model Context Protocol server and tool dispatch
//! - **config**: configuration loading from TOML or environment
//! - **constants**: the vendor's observed API contract
//! - **logging**: production logging and structured output
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use whoop_mcp_server::whoop::WhoopClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = WhoopClient::new("athlete@example.com", "password")?;
//!
//!     // Fetch the recovery deep dive for a date (today when None)
//!     let recovery = client.get_recovery(Some("2024-01-15")).await?;
//!     println!("{}", serde_json::to_string_pretty(&recovery)?);
//!
//!     Ok(())
//! }
//! ```

/// Authenticated WHOOP API client and token-lifecycle management
pub mod whoop;

/// Model Context Protocol server implementation
pub mod mcp;

/// Configuration management
pub mod config;

/// Application constants and the vendor API contract
pub mod constants;

/// Production logging and structured output
pub mod logging;
