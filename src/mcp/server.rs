//! Line-oriented JSON-RPC server loop.

use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use super::router::{error_response, McpRouter, PARSE_ERROR};

/// MCP server reading requests line by line and answering in order.
#[derive(Debug)]
pub struct McpServer {
    router: Arc<McpRouter>,
    cancel: CancellationToken,
}

impl McpServer {
    pub fn new(router: Arc<McpRouter>) -> Self {
        Self {
            router,
            cancel: CancellationToken::new(),
        }
    }

    /// Serve on the process's stdin/stdout.
    pub async fn serve_stdio(&self) -> std::io::Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve until EOF on `reader` or shutdown.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        tracing::info!("mcp_server_started: tools={}", self.router.tools().len());

        loop {
            let line = tokio::select! {
                _ = self.cancel.cancelled() => break,
                line = lines.next_line() => match line? {
                    Some(line) => line,
                    None => break, // clean EOF
                },
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Value>(line) {
                Ok(request) => self.router.handle(request).await,
                Err(e) => {
                    tracing::warn!("mcp_parse_error: error={}", e);
                    Some(error_response(
                        Value::Null,
                        PARSE_ERROR,
                        &format!("Parse error: {}", e),
                    ))
                }
            };

            if let Some(response) = response {
                let mut bytes = serde_json::to_vec(&response).map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
                })?;
                bytes.push(b'\n');
                writer.write_all(&bytes).await?;
                writer.flush().await?;
            }
        }

        tracing::info!("mcp_server_stopped");
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceManager;
    use crate::tools::{realms, ToolRegistry};
    use serde_json::json;
    use tokio::io::AsyncReadExt;

    fn server() -> McpServer {
        let mut tools = ToolRegistry::new();
        tools.import_tools(realms::operations(), "realm").unwrap();
        let router = McpRouter::new(tools, Arc::new(ServiceManager::new()), "MCP-Server");
        McpServer::new(Arc::new(router))
    }

    #[tokio::test]
    async fn test_round_trip_over_duplex() {
        let (mut client, server_io) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_io);

        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "not json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n",
        );
        client.write_all(input.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        server().serve(server_read, server_write).await.unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        let responses: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0], json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
        assert_eq!(responses[1]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[2]["id"], 2);
        assert_eq!(responses[2]["result"]["tools"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let (_client, server_io) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server_io);

        let server = server();
        server.shutdown();
        server.serve(server_read, server_write).await.unwrap();
    }
}
