use parking_lot::RwLock;
use std::io::{ self, Write };
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{ AsyncRead, AsyncReadExt };
use tokio::time;

use crate::automation::{ self, AutomationError, AutomationSink, InputStep };
use crate::config::PdcConfig;
use crate::types::BridgeMessage;
use crate::wire::{ self, DecodeError };

/// Why a clearance could not be handed to the bridge
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Could not connect to PDC bridge (is it running?)")]
    Unreachable(#[source] io::Error),

    #[error("Failed writing to PDC bridge channel")]
    Incomplete(#[source] io::Error),
}

/// Plugin-side sender: one message per call, no retry
pub trait BridgeTransport: Send + Sync {
    fn send(&self, message: &BridgeMessage) -> Result<(), TransportError>;
}

/// Blocking channel client: connect, write the whole frame, close
#[derive(Debug, Clone)]
pub struct BridgeClient {
    endpoint: PathBuf,
}

impl BridgeClient {
    pub fn new(endpoint: impl Into<PathBuf>) -> Self {
        Self { endpoint: endpoint.into() }
    }
}

impl BridgeTransport for BridgeClient {
    fn send(&self, message: &BridgeMessage) -> Result<(), TransportError> {
        let mut stream = connect(&self.endpoint).map_err(TransportError::Unreachable)?;

        let payload = wire::encode(message);
        stream
            .write_all(payload.as_bytes())
            .and_then(|_| stream.flush())
            .map_err(TransportError::Incomplete)?;

        tracing::debug!(
            "Wrote {} bytes for {} to {}",
            payload.len(),
            message.callsign,
            self.endpoint.display()
        );
        Ok(())
    }
}

#[cfg(unix)]
fn connect(endpoint: &Path) -> io::Result<std::os::unix::net::UnixStream> {
    std::os::unix::net::UnixStream::connect(endpoint)
}

#[cfg(windows)]
fn connect(endpoint: &Path) -> io::Result<std::fs::File> {
    std::fs::OpenOptions::new().write(true).open(endpoint)
}

/// Failures that end one server iteration without stopping the loop
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("client did not finish its message within {0:?}")]
    ReadTimeout(Duration),
}

/// What happened to one accepted connection
#[derive(Debug)]
pub enum Outcome {
    /// Message decoded and fully replayed
    Delivered(BridgeMessage),

    /// Client closed without sending anything
    Empty,

    /// Payload rejected and dropped
    Malformed(DecodeError),

    /// Payload decoded but the automation sink failed part way
    DispatchFailed {
        message: BridgeMessage,
        error: AutomationError,
    },
}

/// Single-client bridge server.
///
/// Each iteration accepts one connection, reads until the client closes,
/// decodes and replays the message, and only then listens again.
pub struct BridgeServer<S> {
    listener: Listener,
    sink: S,
    config: Arc<RwLock<PdcConfig>>,
}

impl<S: AutomationSink> BridgeServer<S> {
    /// Claim the channel. Fails with `AddrInUse` when another bridge holds it.
    pub fn bind(config: Arc<RwLock<PdcConfig>>, sink: S) -> io::Result<Self> {
        let endpoint = config.read().channel.endpoint();
        let listener = Listener::bind(&endpoint)?;
        tracing::info!("PDC bridge listening on {}", endpoint.display());

        Ok(Self { listener, sink, config })
    }

    pub fn endpoint(&self) -> &Path {
        &self.listener.endpoint
    }

    /// Accept loop; never returns
    pub async fn run(mut self) {
        loop {
            match self.serve_one().await {
                Ok(Outcome::Delivered(message)) => {
                    tracing::info!("OK: {} PDC delivered", message.callsign);
                }
                Ok(Outcome::Empty) => {
                    tracing::debug!("Client disconnected without sending a message");
                }
                Ok(Outcome::Malformed(e)) => {
                    tracing::warn!("Bad payload dropped: {}", e);
                }
                Ok(Outcome::DispatchFailed { message, error }) => {
                    tracing::error!("Automation failed for {}: {}", message.callsign, error);
                }
                Err(ServeError::Accept(e)) => {
                    tracing::error!("Accept error on {}: {}", self.listener.endpoint.display(), e);
                    // Avoid a tight loop if the channel keeps failing
                    time::sleep(Duration::from_millis(100)).await;
                }
                Err(e) => {
                    tracing::warn!("Connection dropped: {}", e);
                }
            }
        }
    }

    /// Handle exactly one connection
    pub async fn serve_one(&mut self) -> Result<Outcome, ServeError> {
        let mut stream = self.listener.accept().await.map_err(ServeError::Accept)?;
        tracing::debug!("Client connected");

        let limits = self.config.read().bridge.clone();
        let read = read_message(&mut stream, limits.max_message_bytes);
        let payload = match time::timeout(limits.read_timeout(), read).await {
            Ok(result) => result.map_err(ServeError::Read)?,
            Err(_) => {
                return Err(ServeError::ReadTimeout(limits.read_timeout()));
            }
        };
        drop(stream);

        let Some(bytes) = payload else {
            return Ok(Outcome::Malformed(DecodeError::TooLarge { limit: limits.max_message_bytes }));
        };
        if bytes.is_empty() {
            return Ok(Outcome::Empty);
        }

        let message = match wire::decode(&bytes) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("Rejected payload: {:?}", String::from_utf8_lossy(&bytes));
                return Ok(Outcome::Malformed(e));
            }
        };

        match self.dispatch(&message).await {
            Ok(()) => Ok(Outcome::Delivered(message)),
            Err(error) => Ok(Outcome::DispatchFailed { message, error }),
        }
    }

    async fn dispatch(&mut self, message: &BridgeMessage) -> Result<(), AutomationError> {
        let steps = automation::replay_script(message, &self.config.read().automation);

        for step in &steps {
            match step {
                InputStep::Pause(duration) => time::sleep(*duration).await,
                other => self.sink.perform(other)?,
            }
        }

        Ok(())
    }
}

/// Read until the client closes. `None` when the payload exceeds `limit`.
async fn read_message<R: AsyncRead + Unpin>(stream: &mut R, limit: usize) -> io::Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    stream.take(limit as u64 + 1).read_to_end(&mut buf).await?;

    if buf.len() > limit { Ok(None) } else { Ok(Some(buf)) }
}

#[cfg(unix)]
struct Listener {
    endpoint: PathBuf,
    inner: tokio::net::UnixListener,
}

#[cfg(unix)]
impl Listener {
    fn bind(endpoint: &Path) -> io::Result<Self> {
        use std::os::unix::fs::FileTypeExt;

        let existing = match std::fs::symlink_metadata(endpoint) {
            Ok(metadata) => Some(metadata),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        if let Some(metadata) = existing {
            // Only ever replace a socket; anything else is not ours to delete
            if !metadata.file_type().is_socket() {
                return Err(
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} exists and is not a socket", endpoint.display())
                    )
                );
            }
            // A live bridge answers; a crashed one leaves a dead socket file
            if std::os::unix::net::UnixStream::connect(endpoint).is_ok() {
                return Err(
                    io::Error::new(
                        io::ErrorKind::AddrInUse,
                        format!("another bridge is already listening on {}", endpoint.display())
                    )
                );
            }
            tracing::warn!("Removing stale socket file: {}", endpoint.display());
            std::fs::remove_file(endpoint)?;
        }

        let inner = tokio::net::UnixListener::bind(endpoint)?;
        Ok(Self { endpoint: endpoint.to_path_buf(), inner })
    }

    async fn accept(&mut self) -> io::Result<tokio::net::UnixStream> {
        let (stream, _addr) = self.inner.accept().await?;
        Ok(stream)
    }
}

#[cfg(unix)]
impl Drop for Listener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.endpoint);
    }
}

#[cfg(windows)]
struct Listener {
    endpoint: PathBuf,
    next: Option<tokio::net::windows::named_pipe::NamedPipeServer>,
}

#[cfg(windows)]
impl Listener {
    fn bind(endpoint: &Path) -> io::Result<Self> {
        let first = Self::create(endpoint, true)?;
        Ok(Self { endpoint: endpoint.to_path_buf(), next: Some(first) })
    }

    /// Inbound-only byte pipe with a single instance
    fn create(endpoint: &Path, first: bool) -> io::Result<tokio::net::windows::named_pipe::NamedPipeServer> {
        use tokio::net::windows::named_pipe::{ PipeMode, ServerOptions };

        ServerOptions::new()
            .first_pipe_instance(first)
            .access_outbound(false)
            .pipe_mode(PipeMode::Byte)
            .max_instances(1)
            .create(endpoint)
            .map_err(|e| {
                if first && e.kind() == io::ErrorKind::PermissionDenied {
                    io::Error::new(
                        io::ErrorKind::AddrInUse,
                        format!("another bridge already owns {}", endpoint.display())
                    )
                } else {
                    e
                }
            })
    }

    async fn accept(&mut self) -> io::Result<tokio::net::windows::named_pipe::NamedPipeServer> {
        let server = match self.next.take() {
            Some(server) => server,
            None => Self::create(&self.endpoint, false)?,
        };
        server.connect().await?;
        Ok(server)
    }
}
