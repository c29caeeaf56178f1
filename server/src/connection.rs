use std::future::Future;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use vex_core::{ProtocolError, RespReader, RespWriter};

use crate::commands::dispatch;
use crate::state::AppState;
use crate::stats::ConnectionSlot;

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);
const MAX_CLIENTS_MESSAGE: &str = "max number of clients reached";

/// Why a client session ended.
#[derive(Debug)]
pub(crate) enum SessionEnd {
    Eof,
    Quit,
    IdleTimeout,
    Io(io::Error),
    Protocol(ProtocolError),
}

/// Accepts clients until `shutdown` resolves, then closes every client socket
/// and waits for their workers to finish.
pub(crate) async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let mut workers = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => admit(&state, &mut workers, stream, peer),
                Err(error) => {
                    tracing::warn!(%error, "failed to accept connection");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
            Some(joined) = workers.join_next(), if !workers.is_empty() => {
                if let Err(error) = joined {
                    tracing::error!(%error, "connection worker failed");
                }
            }
        }
    }

    drop(listener);
    tracing::info!(
        open_connections = state.clients.len(),
        "closing client connections"
    );
    for client in state.clients.iter() {
        // The worker may already be tearing this socket down.
        let _ = client.value().shutdown(Shutdown::Both);
    }
    while let Some(joined) = workers.join_next().await {
        if let Err(error) = joined {
            tracing::error!(%error, "connection worker failed");
        }
    }
    Ok(())
}

fn admit(
    state: &AppState,
    workers: &mut JoinSet<()>,
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
) {
    let conn_id = state.next_connection_id();
    let stream = match into_blocking(stream, state.config.idle_timeout()) {
        Ok(stream) => stream,
        Err(error) => {
            tracing::warn!(conn_id, %peer, %error, "failed to configure client socket");
            return;
        }
    };

    let Some(slot) = ConnectionSlot::acquire(&state.stats, state.config.max_connections) else {
        state.stats.record_rejected_connection();
        tracing::warn!(
            conn_id,
            %peer,
            max_connections = state.config.max_connections,
            "rejecting client, connection limit reached"
        );
        workers.spawn_blocking(move || reject(stream));
        return;
    };

    match stream.try_clone() {
        Ok(handle) => {
            state.clients.insert(conn_id, handle);
        }
        Err(error) => {
            tracing::warn!(conn_id, %peer, %error, "failed to register client socket");
            return;
        }
    }

    // Sessions park in socket reads for up to the idle timeout; tokio's
    // blocking pool is bounded, so each one gets a dedicated thread.
    let (done, finished) = oneshot::channel::<()>();
    let session_state = state.clone();
    let spawned = thread::Builder::new()
        .name(format!("vex-conn-{conn_id}"))
        .spawn(move || {
            let _slot = slot;
            let span = tracing::info_span!("connection", conn_id, %peer);
            let _entered = span.enter();
            handle_connection(&session_state, stream);
            session_state.clients.remove(&conn_id);
            let _ = done.send(());
        });

    match spawned {
        Ok(_) => {
            workers.spawn(async move {
                if finished.await.is_err() {
                    tracing::error!(conn_id, "connection worker exited without finishing");
                }
            });
        }
        Err(error) => {
            state.clients.remove(&conn_id);
            tracing::error!(conn_id, %peer, %error, "failed to spawn connection worker");
        }
    }
}

fn into_blocking(stream: tokio::net::TcpStream, idle_timeout: Duration) -> io::Result<TcpStream> {
    let stream = stream.into_std()?;
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(idle_timeout))?;
    Ok(stream)
}

fn reject(stream: TcpStream) {
    let mut writer = RespWriter::new(&stream);
    if let Err(error) = writer
        .write_error(MAX_CLIENTS_MESSAGE)
        .and_then(|()| writer.flush())
    {
        tracing::debug!(%error, "failed to notify rejected client");
    }
}

/// Serves one client until it disconnects, quits, idles out or misbehaves.
pub(crate) fn handle_connection(state: &AppState, stream: TcpStream) {
    tracing::debug!("client connected");
    let write_half = match stream.try_clone() {
        Ok(write_half) => write_half,
        Err(error) => {
            tracing::warn!(%error, "failed to split client socket");
            return;
        }
    };

    let mut reader = RespReader::new(stream);
    let mut writer = RespWriter::new(write_half);
    match run_session(state, &mut reader, &mut writer) {
        SessionEnd::Eof => tracing::debug!("client disconnected"),
        SessionEnd::Quit => tracing::debug!("client quit"),
        SessionEnd::IdleTimeout => tracing::info!(
            idle_timeout_ms = state.config.idle_timeout_ms,
            "closing idle connection"
        ),
        SessionEnd::Io(error) => tracing::debug!(%error, "connection closed on i/o error"),
        SessionEnd::Protocol(error) => tracing::warn!(%error, "closing connection on protocol error"),
    }
}

/// Request loop over an already split connection.
///
/// Replies are flushed once no further pipelined request is buffered.
pub(crate) fn run_session<R: Read, W: Write>(
    state: &AppState,
    reader: &mut RespReader<R>,
    writer: &mut RespWriter<W>,
) -> SessionEnd {
    loop {
        let args = match reader.read_command() {
            Ok(Some(args)) => args,
            Ok(None) => return SessionEnd::Eof,
            Err(error) if error.is_timeout() => return SessionEnd::IdleTimeout,
            Err(ProtocolError::Io(error)) => return SessionEnd::Io(error),
            Err(error) => {
                // Best effort: the stream is no longer frame aligned either way.
                let _ = writer
                    .write_error(&error.to_string())
                    .and_then(|()| writer.flush());
                return SessionEnd::Protocol(error);
            }
        };

        let mut closing = false;
        if !args.is_empty() {
            state.stats.record_command();
            let started = Instant::now();
            let outcome = dispatch(state, &args);
            let written = match &outcome {
                Ok(reply) => {
                    closing = reply.closes_connection();
                    reply.write_to(writer)
                }
                Err(error) => writer.write_error(error.message()),
            };
            tracing::debug!(
                command = %args[0],
                args = args.len() - 1,
                error = outcome.as_ref().err().map(|error| error.code()),
                elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                "command processed"
            );
            if let Err(error) = written {
                return SessionEnd::Io(error);
            }
        }

        if closing || !reader.has_buffered_data() {
            if let Err(error) = writer.flush() {
                return SessionEnd::Io(error);
            }
        }
        if closing {
            return SessionEnd::Quit;
        }
    }
}
