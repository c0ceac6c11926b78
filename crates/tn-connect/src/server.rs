//! Newline-delimited JSON-RPC over TCP.

use crate::api::{error_line, handle_line};
use crate::manager::ConnectManager;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tn_error::ApiError;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Longest request line accepted, newline excluded.
pub const MAX_REQUEST_BYTES: u64 = 64 * 1024;

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to listen on {}", addr))
}

/// Accept connections forever; each one is served on its own task.
pub async fn serve(listener: TcpListener, manager: Arc<ConnectManager>) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("Connect API listening on {}", addr);
    }
    loop {
        let (stream, peer) = listener.accept().await.context("accept failed")?;
        let manager = manager.clone();
        tokio::spawn(async move {
            if let Err(err) = serve_connection(stream, &manager).await {
                log::warn!("API connection from {} ended: {:#}", peer, err);
            }
        });
    }
}

async fn serve_connection(stream: TcpStream, manager: &ConnectManager) -> Result<()> {
    let (read, write) = stream.into_split();
    serve_lines(read, write, manager).await
}

/// Answer requests until EOF. An oversized line gets a parse error and
/// closes the connection, since the rest of it cannot be framed.
async fn serve_lines<R, W>(read: R, mut write: W, manager: &ConnectManager) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(read);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = (&mut reader)
            .take(MAX_REQUEST_BYTES + 1)
            .read_until(b'\n', &mut buf)
            .await?;
        if n == 0 {
            return Ok(());
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        } else if n as u64 > MAX_REQUEST_BYTES {
            log::warn!("API request exceeds {} bytes; closing", MAX_REQUEST_BYTES);
            let reply = error_line(ApiError::parse_error(format!(
                "Request exceeds {} bytes",
                MAX_REQUEST_BYTES
            )));
            write.write_all(format!("{}\n", reply).as_bytes()).await?;
            return Ok(());
        }

        let mut reply = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(manager, line),
            Err(err) => error_line(ApiError::parse_error(err.to_string())),
        };
        reply.push('\n');
        write.write_all(reply.as_bytes()).await?;
    }
}
