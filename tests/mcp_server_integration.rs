// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Integration tests for MCP server functionality
//!
//! These tests verify that the MCP server correctly handles client
//! connections, processes requests, and returns appropriate responses.

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use whoop_mcp_server::mcp::McpServer;
use whoop_mcp_server::whoop::WhoopClient;

/// Spawn a server on `port` around a client that talks to `base_url`.
fn spawn_server(port: u16, base_url: &str) -> tokio::task::JoinHandle<Result<()>> {
    let client = WhoopClient::with_base_url(base_url, "athlete@example.com", "hunter2")
        .expect("client construction");
    let server = McpServer::new(Arc::new(client));
    tokio::spawn(async move { server.run(port).await })
}

/// Send one JSON-RPC request over a fresh connection and read the response.
async fn send_request(port: u16, request: Value) -> Result<Value> {
    let mut stream = timeout(
        Duration::from_secs(5),
        TcpStream::connect(("127.0.0.1", port)),
    )
    .await??;
    let (read_half, mut write_half) = stream.split();
    let mut reader = BufReader::new(read_half);

    let request_str = serde_json::to_string(&request)?;
    write_half.write_all(request_str.as_bytes()).await?;
    write_half.write_all(b"\n").await?;

    let mut response_line = String::new();
    timeout(Duration::from_secs(5), reader.read_line(&mut response_line)).await??;

    let response: Value = serde_json::from_str(&response_line)?;
    Ok(response)
}

#[tokio::test]
async fn test_mcp_initialize_request() -> Result<()> {
    let server_task = spawn_server(18181, "http://127.0.0.1:1");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = send_request(
        18181,
        json!({
            "jsonrpc": "2.0",
            "method": "initialize",
            "params": {},
            "id": 1
        }),
    )
    .await?;

    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], 1);
    assert!(response["result"].is_object());

    let result = &response["result"];
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "whoop-mcp-server");
    assert!(result["capabilities"]["tools"].is_array());

    let tools = result["capabilities"]["tools"].as_array().unwrap();
    let tool_names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();

    assert!(tool_names.contains(&"test_connection"));
    assert!(tool_names.contains(&"whoop_get_overview"));
    assert!(tool_names.contains(&"whoop_get_sleep"));
    assert!(tool_names.contains(&"whoop_get_recovery"));
    assert!(tool_names.contains(&"whoop_get_strain"));
    assert!(tool_names.contains(&"whoop_get_healthspan"));

    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn test_mcp_unknown_method() -> Result<()> {
    let server_task = spawn_server(18182, "http://127.0.0.1:1");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = send_request(
        18182,
        json!({
            "jsonrpc": "2.0",
            "method": "unknown_method",
            "params": {},
            "id": 2
        }),
    )
    .await?;

    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], 2);
    assert!(response["error"].is_object());
    assert_eq!(response["error"]["code"], -32601);
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Method not found"));

    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn test_mcp_unknown_tool() -> Result<()> {
    let server_task = spawn_server(18183, "http://127.0.0.1:1");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = send_request(
        18183,
        json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {
                "name": "get_activities",
                "arguments": {}
            },
            "id": 3
        }),
    )
    .await?;

    assert_eq!(response["id"], 3);
    assert!(response["error"].is_object());
    assert_eq!(response["error"]["code"], -32601);
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Unknown tool"));

    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn test_mcp_test_connection_tool() -> Result<()> {
    let server_task = spawn_server(18184, "http://127.0.0.1:1");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = send_request(
        18184,
        json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {
                "name": "test_connection",
                "arguments": {}
            },
            "id": 4
        }),
    )
    .await?;

    let result = &response["result"];
    assert!(result["isError"].is_null());
    assert_eq!(result["content"][0]["type"], "text");
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Connection successful"));

    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn test_whoop_tool_call_end_to_end() -> Result<()> {
    let mut whoop_api = mockito::Server::new_async().await;

    let _login = whoop_api
        .mock("POST", "/auth-service/v3/whoop")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "AuthenticationResult": { "AccessToken": "tok1", "ExpiresIn": 3600 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let _overview = whoop_api
        .mock("GET", "/home-service/v1/home")
        .match_query(mockito::Matcher::UrlEncoded(
            "date".into(),
            "2024-01-15".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"recovery_score": 85, "day_strain": 11.4}).to_string())
        .create_async()
        .await;

    let server_task = spawn_server(18185, &whoop_api.url());
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = send_request(
        18185,
        json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {
                "name": "whoop_get_overview",
                "arguments": { "date": "2024-01-15" }
            },
            "id": 5
        }),
    )
    .await?;

    let result = &response["result"];
    assert!(result["isError"].is_null());

    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("WHOOP OVERVIEW"));
    assert!(text.contains("recovery_score"));
    assert!(text.contains("85"));

    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn test_whoop_tool_failure_returns_error_content() -> Result<()> {
    // Nothing is listening at the base URL, so the login exchange fails and
    // the tool reports it as error content rather than a protocol error.
    let server_task = spawn_server(18186, "http://127.0.0.1:1");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = send_request(
        18186,
        json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {
                "name": "whoop_get_sleep",
                "arguments": { "date": "2024-01-15" }
            },
            "id": 6
        }),
    )
    .await?;

    let result = &response["result"];
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("Error fetching Whoop sleep data"));

    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn test_mcp_multiple_connections() -> Result<()> {
    let server_task = spawn_server(18187, "http://127.0.0.1:1");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut tasks = Vec::new();

    for i in 0..3 {
        let task = tokio::spawn(async move {
            send_request(
                18187,
                json!({
                    "jsonrpc": "2.0",
                    "method": "initialize",
                    "params": {},
                    "id": i
                }),
            )
            .await
        });

        tasks.push(task);
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let response = task.await??;
        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], i);
        assert!(response["result"].is_object());
    }

    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn test_mcp_json_rpc_id_passthrough() -> Result<()> {
    let server_task = spawn_server(18188, "http://127.0.0.1:1");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = send_request(
        18188,
        json!({
            "jsonrpc": "2.0",
            "method": "initialize",
            "params": {},
            "id": "string-id"
        }),
    )
    .await?;

    assert_eq!(response["id"], "string-id");

    let response = send_request(
        18188,
        json!({
            "jsonrpc": "2.0",
            "method": "initialize",
            "params": {},
            "id": null
        }),
    )
    .await?;

    assert_eq!(response["id"], Value::Null);

    server_task.abort();
    Ok(())
}
