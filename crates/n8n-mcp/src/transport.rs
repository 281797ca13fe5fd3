//! Newline-delimited JSON-RPC transport.
//!
//! Each line on the input is one request. Responses are written as one
//! line each and flushed immediately. Logs never go to the output stream.

use crate::server::McpServer;
use crate::types::{McpError, McpRequest, McpResponse, RequestId};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Transport result type.
pub type TransportResult<T> = Result<T, TransportError>;

/// Serve requests from `reader` until end of input.
pub async fn serve<R, W>(server: &McpServer, mut reader: R, mut writer: W) -> TransportResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            info!("Input closed, shutting down");
            return Ok(());
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<McpRequest>(message) {
            Ok(request) => {
                debug!(method = %request.method, "Received request");
                server.handle_message(request).await
            }
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                Some(McpResponse::error(RequestId::Null, McpError::parse_error()))
            }
        };

        if let Some(response) = response {
            write_response(&mut writer, &response).await?;
        }
    }
}

async fn write_response<W>(writer: &mut W, response: &McpResponse) -> TransportResult<()>
where
    W: AsyncWrite + Unpin,
{
    let encoded = serde_json::to_string(response)?;
    writer.write_all(encoded.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Serve requests over the process's stdin and stdout.
pub async fn serve_stdio(server: &McpServer) -> TransportResult<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(server, stdin, stdout).await
}
