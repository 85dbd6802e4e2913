// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

pub mod schema;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::constants::protocol;
use crate::logging::AppLogger;
use crate::mcp::schema::InitializeResponse;
use crate::whoop::WhoopClient;

// JSON-RPC Error Codes (as defined in the JSON-RPC 2.0 specification)
const ERROR_METHOD_NOT_FOUND: i32 = -32601;

pub struct McpServer {
    client: Arc<WhoopClient>,
}

impl McpServer {
    /// Create a server around one shared WHOOP client.
    pub fn new(client: Arc<WhoopClient>) -> Self {
        Self { client }
    }

    pub async fn run(self, port: u16) -> Result<()> {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
        info!("MCP server listening on port {}", port);

        loop {
            let (socket, addr) = listener.accept().await?;
            info!("New connection from {}", addr);

            let client = self.client.clone();

            tokio::spawn(async move {
                let (reader, mut writer) = socket.into_split();
                let mut reader = BufReader::new(reader);
                let mut line = String::new();

                while reader.read_line(&mut line).await.unwrap_or(0) > 0 {
                    if let Ok(request) = serde_json::from_str::<McpRequest>(&line) {
                        let response = handle_request(request, &client).await;
                        let response_str = serde_json::to_string(&response).unwrap();
                        writer.write_all(response_str.as_bytes()).await.ok();
                        writer.write_all(b"\n").await.ok();
                    }
                    line.clear();
                }
            });
        }
    }
}

#[derive(Debug, Deserialize)]
struct McpRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    params: Option<Value>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: String,
    result: Option<Value>,
    error: Option<McpError>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct McpError {
    code: i32,
    message: String,
    data: Option<Value>,
}

/// Tool result content block, rendered as text for the calling agent
#[derive(Debug, Serialize)]
struct ToolContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct ToolResponse {
    content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    is_error: bool,
}

impl ToolResponse {
    fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: text.into(),
            }],
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: text.into(),
            }],
            is_error: true,
        }
    }
}

async fn handle_request(request: McpRequest, client: &Arc<WhoopClient>) -> McpResponse {
    match request.method.as_str() {
        "initialize" => {
            let init_response = InitializeResponse::new(
                protocol::MCP_PROTOCOL_VERSION.to_string(),
                protocol::SERVER_NAME.to_string(),
                protocol::SERVER_VERSION.to_string(),
            );

            McpResponse {
                jsonrpc: protocol::JSONRPC_VERSION.to_string(),
                result: serde_json::to_value(&init_response).ok(),
                error: None,
                id: request.id,
            }
        }
        "tools/call" => {
            let params = request.params.unwrap_or_default();
            let tool_name = params["name"].as_str().unwrap_or("");
            let args = &params["arguments"];

            handle_tool_call(tool_name, args, client, request.id).await
        }
        _ => McpResponse {
            jsonrpc: protocol::JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(McpError {
                code: ERROR_METHOD_NOT_FOUND,
                message: "Method not found".to_string(),
                data: None,
            }),
            id: request.id,
        },
    }
}

async fn handle_tool_call(
    tool_name: &str,
    args: &Value,
    client: &Arc<WhoopClient>,
    id: Value,
) -> McpResponse {
    if tool_name == "test_connection" {
        return tool_result(
            ToolResponse::text("✅ MCP Server is working! Connection successful."),
            id,
        );
    }

    let date = args["date"].as_str();
    let started = Instant::now();

    // (metric name for error messages, display title, fetch result)
    let outcome = match tool_name {
        "whoop_get_overview" => Some((
            "overview",
            "📊 WHOOP OVERVIEW",
            client.get_overview(date).await,
        )),
        "whoop_get_sleep" => Some(("sleep", "😴 SLEEP ANALYSIS", client.get_sleep(date).await)),
        "whoop_get_recovery" => Some((
            "recovery",
            "💚 RECOVERY ANALYSIS",
            client.get_recovery(date).await,
        )),
        "whoop_get_strain" => Some(("strain", "🔥 STRAIN ANALYSIS", client.get_strain(date).await)),
        "whoop_get_healthspan" => Some((
            "healthspan",
            "⏳ HEALTHSPAN ANALYSIS",
            client.get_healthspan(date).await,
        )),
        _ => None,
    };

    match outcome {
        Some((_, title, Ok(data))) => {
            AppLogger::log_mcp_tool_call(tool_name, true, started.elapsed().as_millis() as u64);
            tool_result(ToolResponse::text(format_tool_text(title, &data)), id)
        }
        Some((metric, _, Err(e))) => {
            AppLogger::log_mcp_tool_call(tool_name, false, started.elapsed().as_millis() as u64);
            tool_result(
                ToolResponse::error(format!("Error fetching Whoop {} data: {}", metric, e)),
                id,
            )
        }
        None => McpResponse {
            jsonrpc: protocol::JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(McpError {
                code: ERROR_METHOD_NOT_FOUND,
                message: "Unknown tool".to_string(),
                data: None,
            }),
            id,
        },
    }
}

fn tool_result(response: ToolResponse, id: Value) -> McpResponse {
    McpResponse {
        jsonrpc: protocol::JSONRPC_VERSION.to_string(),
        result: serde_json::to_value(&response).ok(),
        error: None,
        id,
    }
}

/// Titled, pretty-printed rendering of an opaque vendor payload
fn format_tool_text(title: &str, data: &Value) -> String {
    let rendered = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    format!("{}\n═══════════════════\n\n{}", title, rendered)
}
