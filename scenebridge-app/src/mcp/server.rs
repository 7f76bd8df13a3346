//! MCP HTTP Server
//!
//! Minimal HTTP/1.1 server for the MCP protocol: `POST /mcp` carries
//! JSON-RPC, `GET /health` answers `{"status":"ok"}`. One request per
//! connection.

use std::sync::Arc;
use std::time::Duration;

use scenebridge_rpc::ResultEnvelope;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use super::executor::execute_tool;
use super::tools::ToolCatalog;
use super::transport::CommandTransport;
use super::types::*;

/// Largest request body accepted; anything bigger is refused unread.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Everything a request handler needs; cheap to clone.
#[derive(Clone)]
pub struct McpServer {
    catalog: Arc<ToolCatalog>,
    transport: Arc<dyn CommandTransport>,
    tool_timeout: Duration,
}

impl McpServer {
    pub fn new(
        catalog: ToolCatalog,
        transport: Arc<dyn CommandTransport>,
        tool_timeout: Duration,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            transport,
            tool_timeout,
        }
    }

    /// Handle one JSON-RPC body. Returns the HTTP status and the JSON to send.
    pub async fn handle_body(&self, body: &str) -> (u16, Value) {
        let request: JsonRpcRequest = match serde_json::from_str(body) {
            Ok(req) => req,
            Err(e) => {
                let response =
                    JsonRpcResponse::error(JsonRpcId::Null, PARSE_ERROR, format!("Parse error: {e}"));
                return (200, to_json(&response));
            }
        };

        tracing::debug!("[MCP] Method: {}", request.method);

        // Notifications have no id - acknowledge silently
        let Some(id) = request.id else {
            return (202, json!({}));
        };

        if request.jsonrpc != "2.0" {
            let response = JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            );
            return (200, to_json(&response));
        }

        let response = match request.method.as_str() {
            "initialize" => handle_initialize(id, request.params),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "ping" => JsonRpcResponse::success(id, json!({})),
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        (200, to_json(&response))
    }

    fn handle_tools_list(&self, id: JsonRpcId) -> JsonRpcResponse {
        let tools = self.catalog.all_tools();
        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: JsonRpcId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"));
                }
            },
            None => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params");
            }
        };

        let args = params.arguments.unwrap_or(Value::Null);

        tracing::info!("[MCP] Calling tool: {}", params.name);
        let result = tokio::time::timeout(
            self.tool_timeout,
            execute_tool(&self.catalog, self.transport.as_ref(), &params.name, args),
        )
        .await;

        let envelope = result.unwrap_or_else(|_| {
            tracing::error!(
                "[MCP] Tool {} timed out after {}s",
                params.name,
                self.tool_timeout.as_secs_f32()
            );
            ResultEnvelope::error(format!(
                "Tool execution timed out after {}s",
                self.tool_timeout.as_secs_f32()
            ))
        });

        if !envelope.success {
            tracing::info!("[MCP] Tool {} failed: {}", params.name, envelope.error_message());
        }

        let text = serde_json::to_string_pretty(&envelope.to_value()).unwrap_or_default();
        let call_result = ToolCallResult::text(text, !envelope.success);
        JsonRpcResponse::success(id, to_json(&call_result))
    }
}

fn handle_initialize(id: JsonRpcId, params: Option<Value>) -> JsonRpcResponse {
    if let Some(params) = params.and_then(|p| serde_json::from_value::<InitializeParams>(p).ok()) {
        tracing::info!(
            "[MCP] Initialize from {} (protocol {})",
            params.client_info,
            params.protocol_version
        );
    }

    let result = json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
    });
    JsonRpcResponse::success(id, result)
}

fn to_json(value: &impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": INTERNAL_ERROR, "message": e.to_string() },
        })
    })
}

/// Bind the first free port in range and serve until the runtime stops.
pub async fn start_mcp_server(
    server: McpServer,
    base_port: u16,
    attempts: u16,
) -> Result<u16, String> {
    // Find an available port
    let mut bound: Option<(TcpListener, u16)> = None;

    for offset in 0..attempts {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{port}")).await {
            Ok(l) => {
                let actual = l.local_addr().map(|a| a.port()).unwrap_or(port);
                bound = Some((l, actual));
                break;
            }
            Err(e) => {
                tracing::debug!("[MCP] Port {} unavailable: {}", port, e);
            }
        }
    }

    let (listener, bound_port) = bound.ok_or_else(|| {
        format!(
            "Failed to bind MCP server to any port in range {}-{}",
            base_port,
            base_port.saturating_add(attempts.saturating_sub(1))
        )
    })?;

    tracing::info!("[MCP] Server starting on port {}", bound_port);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    tracing::debug!("[MCP] Connection from {}", addr);
                    let server = server.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, server).await {
                            tracing::debug!("[MCP] Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("[MCP] Accept error: {}", e);
                }
            }
        }
    });

    Ok(bound_port)
}

/// Handle an HTTP connection
async fn handle_connection(mut stream: TcpStream, server: McpServer) -> Result<(), String> {
    let (reader, mut writer) = stream.split();
    let mut buf_reader = BufReader::new(reader);

    // Read HTTP request line
    let mut request_line = String::new();
    buf_reader
        .read_line(&mut request_line)
        .await
        .map_err(|e| e.to_string())?;

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return send_text_response(&mut writer, 400, "Bad Request").await;
    };

    // Read headers
    let mut content_length: usize = 0;
    loop {
        let mut header_line = String::new();
        let read = buf_reader
            .read_line(&mut header_line)
            .await
            .map_err(|e| e.to_string())?;
        if read == 0 || header_line.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = header_line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    if content_length > MAX_BODY_BYTES {
        tracing::warn!("[MCP] Refusing {} byte request body", content_length);
        return send_text_response(&mut writer, 413, "Payload Too Large").await;
    }

    // Read body if present
    let body = if content_length > 0 {
        let mut body_buf = vec![0u8; content_length];
        buf_reader
            .read_exact(&mut body_buf)
            .await
            .map_err(|e| e.to_string())?;
        String::from_utf8(body_buf).map_err(|e| e.to_string())?
    } else {
        String::new()
    };

    // Route request
    match (method, path) {
        ("POST", "/mcp") | ("POST", "/mcp/") => {
            let (status, response) = server.handle_body(&body).await;
            send_json_response(&mut writer, status, &response).await
        }
        ("GET", "/health") | ("GET", "/health/") => {
            send_json_response(&mut writer, 200, &json!({ "status": "ok" })).await
        }
        _ => send_text_response(&mut writer, 404, "Not Found").await,
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        202 => "Accepted",
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

async fn send_response(
    writer: &mut (impl AsyncWrite + Unpin),
    status: u16,
    content_type: &str,
    body: &str,
) -> Result<(), String> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text(status),
        content_type,
        body.len(),
        body
    );

    writer
        .write_all(response.as_bytes())
        .await
        .map_err(|e| e.to_string())?;
    writer.flush().await.map_err(|e| e.to_string())?;
    Ok(())
}

/// Send a plain text HTTP response
async fn send_text_response(
    writer: &mut (impl AsyncWrite + Unpin),
    status: u16,
    body: &str,
) -> Result<(), String> {
    send_response(writer, status, "text/plain", body).await
}

/// Send a JSON HTTP response
async fn send_json_response(
    writer: &mut (impl AsyncWrite + Unpin),
    status: u16,
    body: &Value,
) -> Result<(), String> {
    let body_str = serde_json::to_string(body).unwrap_or_default();
    send_response(writer, status, "application/json", &body_str).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Map;

    /// Answers every command with its own name, except `scene.Find`, which
    /// fails, and `scene.SaveScene`, which never answers.
    struct FakeHost;

    #[async_trait]
    impl CommandTransport for FakeHost {
        async fn send(&self, command: &str, parameters: Map<String, Value>) -> ResultEnvelope {
            match command {
                "scene.Find" => ResultEnvelope::error("GameObject not found: Nope"),
                "scene.SaveScene" => std::future::pending().await,
                _ => ResultEnvelope::ok()
                    .with("command", command)
                    .with("parameters", Value::Object(parameters)),
            }
        }
    }

    fn server() -> McpServer {
        McpServer::new(
            ToolCatalog::builtin(),
            Arc::new(FakeHost),
            Duration::from_millis(200),
        )
    }

    async fn call(server: &McpServer, request: Value) -> Value {
        let (status, response) = server.handle_body(&request.to_string()).await;
        assert_eq!(status, 200);
        response
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let server = server();
        let init = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "test" },
            }}),
        )
        .await;
        assert_eq!(init["result"]["serverInfo"]["name"], "scenebridge");
        assert_eq!(init["result"]["protocolVersion"], MCP_PROTOCOL_VERSION);

        let list = call(&server, json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" })).await;
        let tools = list["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 11);
        let search = tools.iter().find(|t| t["name"] == "asset_Search").unwrap();
        assert_eq!(search["annotations"]["readOnlyHint"], true);
        assert_eq!(search["inputSchema"]["required"], json!(["query"]));
    }

    #[tokio::test]
    async fn test_tools_call_wraps_envelope() {
        let server = server();
        let response = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": "a", "method": "tools/call", "params": {
                "name": "scene_CreateGameObject",
                "arguments": { "name": "Root" },
            }}),
        )
        .await;
        assert_eq!(response["id"], "a");
        let result = &response["result"];
        assert_eq!(result["isError"], false);
        let text = result["content"][0]["text"].as_str().unwrap();
        let envelope: Value = serde_json::from_str(text).unwrap();
        assert_eq!(
            envelope,
            json!({
                "success": true,
                "command": "scene.CreateGameObject",
                "parameters": { "name": "Root" },
            })
        );
    }

    #[tokio::test]
    async fn test_tools_call_failures() {
        let server = server();
        for (name, message) in [
            ("scene_Find", "GameObject not found: Nope"),
            ("scene_Bogus", "Tool not found: scene_Bogus"),
            ("scene_SaveScene", "Tool execution timed out after 0.2s"),
        ] {
            let response = call(
                &server,
                json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": { "name": name }}),
            )
            .await;
            let result = &response["result"];
            assert_eq!(result["isError"], true, "{name}");
            let envelope: Value =
                serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
            assert_eq!(envelope["success"], false);
            assert_eq!(envelope["error"], message);
        }
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server();

        let (status, parse) = server.handle_body("{not json").await;
        assert_eq!(status, 200);
        assert_eq!(parse["error"]["code"], PARSE_ERROR);

        let (status, _) = server
            .handle_body(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string())
            .await;
        assert_eq!(status, 202);

        let unknown = call(&server, json!({ "jsonrpc": "2.0", "id": 4, "method": "resources/list" })).await;
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let missing = call(&server, json!({ "jsonrpc": "2.0", "id": 5, "method": "tools/call" })).await;
        assert_eq!(missing["error"]["code"], INVALID_PARAMS);

        let version = call(&server, json!({ "jsonrpc": "1.0", "id": 6, "method": "ping" })).await;
        assert_eq!(version["error"]["code"], INVALID_REQUEST);
    }

    async fn http(port: u16, request: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_http_routes() {
        let port = start_mcp_server(server(), 0, 1).await.unwrap();

        let health = http(port, "GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(health.starts_with("HTTP/1.1 200 OK"));
        assert!(health.ends_with(r#"{"status":"ok"}"#));

        let missing = http(port, "GET /nope HTTP/1.1\r\n\r\n").await;
        assert!(missing.starts_with("HTTP/1.1 404"));

        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }).to_string();
        let ping = http(
            port,
            &format!(
                "POST /mcp HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                body.len(),
                body
            ),
        )
        .await;
        assert!(ping.starts_with("HTTP/1.1 200 OK"));
        assert!(ping.contains(r#""id":1"#));
    }

    #[tokio::test]
    async fn test_oversized_body_refused() {
        let port = start_mcp_server(server(), 0, 1).await.unwrap();

        let huge = http(
            port,
            "POST /mcp HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 999999999999\r\n\r\n",
        )
        .await;
        assert!(huge.starts_with("HTTP/1.1 413 Payload Too Large"), "{huge}");

        // The server is still serving afterwards
        let health = http(port, "GET /health HTTP/1.1\r\n\r\n").await;
        assert!(health.starts_with("HTTP/1.1 200 OK"));
    }
}
