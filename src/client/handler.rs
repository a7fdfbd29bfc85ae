use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::client::{Client, ClientRegistry};
use crate::protocol::responses::{BAD_REQUEST, PAYLOAD_TOO_LARGE, format_response};
use crate::protocol::{CommandResult, CommandStatus, handle_command, parse_command};
use crate::server::DriveState;

const GREETING: &str = "200 rax-drive ready\r\n";

/// Handles one client session.
///
/// - Greets, then reads request lines with a `BufReader`.
/// - PUT-style requests are followed by exactly the announced number of body
///   bytes; bodies over the upload limit are drained and rejected with 413.
/// - Dispatches commands through `handle_command` and writes the response
///   line followed by any payload.
pub async fn handle_client<S>(
    stream: S,
    client_addr: SocketAddr,
    state: Arc<DriveState>,
    registry: Arc<Mutex<ClientRegistry>>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut client = Client::new(client_addr);
    let mut line = String::new();

    if let Err(e) = write_half.write_all(GREETING.as_bytes()).await {
        error!("Failed to greet {}: {}", client_addr, e);
        registry.lock().await.remove(&client_addr);
        return;
    }

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Ok(_) => {
                if line.len() > state.startup.max_command_length {
                    let response = format_response(BAD_REQUEST, "Command too long");
                    if write_half.write_all(response.as_bytes()).await.is_err() {
                        break;
                    }
                    continue;
                }

                let command = parse_command(line.trim_end_matches(['\r', '\n']));
                info!("Received from {}: {:?}", client_addr, command_label(&line));

                let body = match command.body_length() {
                    None => None,
                    Some(Err(raw)) => {
                        let response =
                            format_response(BAD_REQUEST, &format!("Invalid body length: {}", raw));
                        if write_half.write_all(response.as_bytes()).await.is_err() {
                            break;
                        }
                        continue;
                    }
                    Some(Ok(length)) => {
                        let limit = state.runtime.read().await.max_upload_size_bytes();
                        if length > limit {
                            warn!(
                                "Upload of {} bytes from {} exceeds the {} byte limit",
                                length, client_addr, limit
                            );
                            let drained = tokio::io::copy(
                                &mut (&mut reader).take(length),
                                &mut tokio::io::sink(),
                            )
                            .await;
                            let response = format_response(PAYLOAD_TOO_LARGE, "Upload too large");
                            if drained.is_err()
                                || write_half.write_all(response.as_bytes()).await.is_err()
                            {
                                break;
                            }
                            continue;
                        }

                        let mut buffer = vec![0u8; length as usize];
                        if let Err(e) = reader.read_exact(&mut buffer).await {
                            warn!("Incomplete body from {}: {}", client_addr, e);
                            break;
                        }
                        Some(buffer)
                    }
                };

                let was_logged_in = client.is_logged_in();
                let result = handle_command(&state, &mut client, command, body).await;
                if client.is_logged_in() != was_logged_in {
                    registry
                        .lock()
                        .await
                        .set_username(&client_addr, client.username().cloned());
                }

                let close = result.status == CommandStatus::CloseConnection;
                if let Err(e) = write_result(&mut write_half, &result).await {
                    error!("Failed to write to {}: {}", client_addr, e);
                    break;
                }
                if close {
                    info!("Client {} requested to quit", client_addr);
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }

    let mut registry = registry.lock().await;
    registry.remove(&client_addr);
    info!(
        "Client {} disconnected ({} remaining)",
        client_addr,
        registry.len()
    );
}

async fn write_result<W>(writer: &mut W, result: &CommandResult) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if let Some(message) = &result.message {
        writer.write_all(message.as_bytes()).await?;
    }
    if let Some(data) = &result.data {
        writer.write_all(data).await?;
    }
    writer.flush().await
}

/// First word of a request line; PASS and TOKEN arguments stay out of the log.
fn command_label(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}
