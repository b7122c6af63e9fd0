//! Line-oriented TCP control server.
//!
//! Each connection is a control session: the server writes a `>> ` prompt,
//! reads a line, lower-cases it and feeds it to a session-local
//! [`ProgramCompiler`]. Completed groups go straight onto the shared action
//! queue; errors are answered with `Error: <message>\r\n` and the session
//! stays open.
//!
//! Outside brackets every accepted line is queued at once as its own group.
//! After a `[` line, accepted lines are held in the session and nothing is
//! queued until the matching `]` arrives; they are then queued together as
//! one group. A group still open when the client disconnects is queued as
//! is.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::engine::ActionQueue;
use crate::program::{ProgramCompiler, Step};

pub const PROMPT: &[u8] = b">> ";

/// Accept control sessions until shutdown is signalled.
pub async fn serve(
    listener: TcpListener,
    queue: ActionQueue,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    tracing::info!("Control server listening on {}", listener.local_addr()?);
    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Control server shutting down");
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!("Failed to accept control connection: {}", e);
                    continue;
                }
            },
        };

        let queue = queue.clone();
        let span = tracing::info_span!("session", id = %uuid::Uuid::new_v4(), %peer);
        tokio::spawn(
            async move {
                tracing::info!("Control session opened");
                if let Err(e) = handle_session(stream, queue, peer).await {
                    tracing::warn!("Control session error: {}", e);
                }
                tracing::info!("Control session closed");
            }
            .instrument(span),
        );
    }
}

/// Run one control session over any byte stream.
pub async fn handle_session<S>(stream: S, queue: ActionQueue, peer: SocketAddr) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();
    let mut compiler = ProgramCompiler::new();

    writer.write_all(PROMPT).await?;
    writer.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let command = line.trim().to_lowercase();
        match compiler.feed(&command) {
            Ok(Step::Completed(group)) => {
                if queue.enqueue(group).is_err() {
                    writer.write_all(b"Error: robot is shutting down\r\n").await?;
                    break;
                }
                tracing::info!("Queued: {}", command);
            }
            Ok(Step::Opened) | Ok(Step::Appended) | Ok(Step::Ignored) => {}
            Err(e) => {
                tracing::debug!("Rejected line #{} from {}: {}", e.line, peer, e.kind);
                writer.write_all(format!("Error: {}\r\n", e.kind).as_bytes()).await?;
            }
        }
        writer.write_all(PROMPT).await?;
        writer.flush().await?;
    }

    if let Some((group, _warning)) = compiler.finish() {
        if queue.enqueue(group).is_ok() {
            tracing::info!("Queued unclosed group at disconnect");
        }
    }
    Ok(())
}
