// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! MCP Protocol Schema Definitions
//!
//! Type-safe definitions for the MCP protocol messages and the WHOOP tool
//! schemas, so the schema can change without hardcoding JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Server Information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// MCP Tool Schema Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonSchema,
}

/// JSON Schema Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, PropertySchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

/// JSON Schema Property Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// MCP Server Capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: Vec<ToolSchema>,
}

/// Complete MCP Initialize Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResponse {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    pub capabilities: ServerCapabilities,
}

impl InitializeResponse {
    /// Create a new initialize response with current server configuration
    pub fn new(protocol_version: String, server_name: String, server_version: String) -> Self {
        Self {
            protocol_version,
            server_info: ServerInfo {
                name: server_name,
                version: server_version,
            },
            capabilities: ServerCapabilities {
                tools: create_whoop_tools(),
            },
        }
    }
}

/// All tool schemas advertised by this server
pub fn create_whoop_tools() -> Vec<ToolSchema> {
    vec![
        create_test_connection_tool(),
        date_scoped_tool(
            "whoop_get_overview",
            "Get comprehensive WHOOP overview data for a specific date",
        ),
        date_scoped_tool(
            "whoop_get_sleep",
            "Get detailed sleep analysis and performance metrics",
        ),
        date_scoped_tool(
            "whoop_get_recovery",
            "Get recovery analysis with HRV, RHR, and trends",
        ),
        date_scoped_tool(
            "whoop_get_strain",
            "Get strain analysis with heart rate zones and activities",
        ),
        date_scoped_tool(
            "whoop_get_healthspan",
            "Get biological age and pace of aging metrics",
        ),
    ]
}

/// The connectivity smoke-test tool; takes no arguments
fn create_test_connection_tool() -> ToolSchema {
    ToolSchema {
        name: "test_connection".to_string(),
        description: "Verify that the MCP server is reachable".to_string(),
        input_schema: JsonSchema {
            schema_type: "object".to_string(),
            properties: None,
            required: None,
        },
    }
}

/// Every data tool takes the same single optional `date` argument
fn date_scoped_tool(name: &str, description: &str) -> ToolSchema {
    let mut properties = HashMap::new();

    properties.insert(
        "date".to_string(),
        PropertySchema {
            property_type: "string".to_string(),
            description: Some("Date in YYYY-MM-DD format (defaults to today)".to_string()),
        },
    );

    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: JsonSchema {
            schema_type: "object".to_string(),
            properties: Some(properties),
            required: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_initialize_response_serialization() {
        let response = InitializeResponse::new(
            "2024-11-05".to_string(),
            "test-server".to_string(),
            "1.0.0".to_string(),
        );

        let json = serde_json::to_value(&response).expect("Should serialize");

        assert_eq!(json["protocolVersion"], "2024-11-05");
        assert_eq!(json["serverInfo"]["name"], "test-server");
        assert_eq!(json["serverInfo"]["version"], "1.0.0");
        assert!(json["capabilities"]["tools"].is_array());

        let tools = json["capabilities"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 6);

        let tool_names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();

        assert!(tool_names.contains(&"test_connection"));
        assert!(tool_names.contains(&"whoop_get_overview"));
        assert!(tool_names.contains(&"whoop_get_sleep"));
        assert!(tool_names.contains(&"whoop_get_recovery"));
        assert!(tool_names.contains(&"whoop_get_strain"));
        assert!(tool_names.contains(&"whoop_get_healthspan"));
    }

    #[test]
    fn test_date_scoped_tool_structure() {
        let tool = date_scoped_tool("whoop_get_sleep", "sleep data");

        assert_eq!(tool.name, "whoop_get_sleep");
        assert_eq!(tool.input_schema.schema_type, "object");

        let properties = tool.input_schema.properties.unwrap();
        assert!(properties.contains_key("date"));
        assert_eq!(properties["date"].property_type, "string");

        // The date argument is optional
        assert!(tool.input_schema.required.is_none());
    }

    #[test]
    fn test_test_connection_tool_takes_no_arguments() {
        let tool = create_test_connection_tool();

        assert_eq!(tool.name, "test_connection");
        assert!(tool.input_schema.properties.is_none());
        assert!(tool.input_schema.required.is_none());
    }

    #[test]
    fn test_round_trip_serialization() {
        let original = InitializeResponse::new(
            "2024-11-05".to_string(),
            "whoop-mcp-server".to_string(),
            "0.1.0".to_string(),
        );

        let json_str = serde_json::to_string(&original).expect("Should serialize");
        let deserialized: InitializeResponse =
            serde_json::from_str(&json_str).expect("Should deserialize");

        assert_eq!(original.protocol_version, deserialized.protocol_version);
        assert_eq!(original.server_info.name, deserialized.server_info.name);
        assert_eq!(
            original.capabilities.tools.len(),
            deserialized.capabilities.tools.len()
        );
    }
}
