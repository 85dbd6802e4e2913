// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Application constants and environment-based configuration values.
//! The `whoop_api` module captures the vendor's observed API contract;
//! those values are not configurable.

/// WHOOP API contract: host, endpoint paths, and the fixed header values
/// the vendor expects on every request.
pub mod whoop_api {
    /// Production API host
    pub const BASE_URL: &str = "https://api.prod.whoop.com";

    /// Value of the `Host` header sent on every request
    pub const API_HOST: &str = "api.prod.whoop.com";

    /// Login exchange (AWS Cognito USER_PASSWORD_AUTH behind the vendor's gateway)
    pub const AUTH_ENDPOINT: &str = "/auth-service/v3/whoop";

    /// Basic profile, used for the best-effort user id lookup
    pub const PROFILE_ENDPOINT: &str = "/user/profile/basic";

    /// Daily home aggregate
    pub const OVERVIEW_ENDPOINT: &str = "/home-service/v1/home";

    /// Per-metric deep-dive reports, differentiated only by path suffix
    pub const SLEEP_ENDPOINT: &str = "/home-service/v1/deep-dive/sleep";
    pub const RECOVERY_ENDPOINT: &str = "/home-service/v1/deep-dive/recovery";
    pub const STRAIN_ENDPOINT: &str = "/home-service/v1/deep-dive/strain";

    /// Biological age / pace of aging, served by a separate backend service
    pub const HEALTHSPAN_ENDPOINT: &str = "/healthspan-service/v1/healthspan/bff";

    /// Cognito request framing for the login exchange
    pub const COGNITO_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
    pub const COGNITO_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
    pub const AUTH_FLOW: &str = "USER_PASSWORD_AUTH";

    /// Fixed header values the vendor's mobile backend expects on data requests
    pub const DEVICE_PLATFORM: &str = "iOS";
    pub const LOCALE: &str = "en_US";
    pub const CURRENCY: &str = "USD";

    /// Safety margin before the recorded token expiry at which the client
    /// re-authenticates proactively
    pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 300;

    /// Token lifetime assumed when the login response omits `ExpiresIn`
    pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 86_400;

    /// Blanket timeout applied to every outbound call, login included
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Protocol-related constants
pub mod protocol {
    /// MCP protocol version implemented by this server
    pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

    /// JSON-RPC version (standard, not configurable)
    pub const JSONRPC_VERSION: &str = "2.0";

    /// Server name reported in the initialize response
    pub const SERVER_NAME: &str = "whoop-mcp-server";

    /// Server version from Cargo.toml
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Environment-based configuration
pub mod env_config {
    use std::env;

    /// Default listen port when neither `PORT` nor the config file sets one
    pub const DEFAULT_PORT: u16 = 8000;

    /// Get the MCP server port from the environment or default
    pub fn mcp_port() -> u16 {
        env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .unwrap_or(DEFAULT_PORT)
    }
}
