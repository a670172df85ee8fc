//! SSH front end.
//!
//! Accepts password-authenticated connections and hands every shell or exec
//! channel to a fresh [`Session`]. Key exchange, encryption and the wire
//! protocol are left to `russh`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write as _;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand_core::OsRng;
use russh::keys::ssh_key::LineEnding;
use russh::keys::{Algorithm, PrivateKey, PublicKey};
use russh::server::{self, Auth, Msg, Server as _};
use russh::{Channel, ChannelId, ChannelStream, Pty};
use thiserror::Error;
use tokio::io::{ReadHalf, WriteHalf};
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::core::CommandRegistry;
use crate::session::{LineOutcome, Session};

type ChannelSession = Session<ReadHalf<ChannelStream<Msg>>, WriteHalf<ChannelStream<Msg>>>;

/// Errors that abort server start-up.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The host key file exists but cannot be used.
    #[error("cannot load host key '{path}': {source}")]
    LoadKey {
        /// Key file.
        path: String,
        /// Underlying error.
        source: russh::keys::Error,
    },

    /// A new host key could not be created.
    #[error("cannot generate host key '{path}': {message}")]
    GenerateKey {
        /// Key file.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// Writing the host key failed.
    #[error("IO error for '{path}': {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Binding or serving the listener failed.
    #[error("cannot serve on {addr}: {source}")]
    Serve {
        /// Listen address.
        addr: String,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Load the Ed25519 host key at `path`, creating it when absent.
pub fn load_or_generate_host_key(path: &Path) -> Result<PrivateKey, ServerError> {
    let shown = path.display().to_string();

    if path.exists() {
        return russh::keys::load_secret_key(path, None).map_err(|source| ServerError::LoadKey {
            path: shown,
            source,
        });
    }

    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).map_err(|e| ServerError::GenerateKey {
        path: shown.clone(),
        message: e.to_string(),
    })?;
    let encoded = key.to_openssh(LineEnding::LF).map_err(|e| ServerError::GenerateKey {
        path: shown.clone(),
        message: e.to_string(),
    })?;

    write_private(path, encoded.as_bytes()).map_err(|source| ServerError::Io {
        path: shown.clone(),
        source,
    })?;
    info!("Generated new host key at '{}'", shown);

    Ok(key)
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)?.write_all(contents)
}

/// Accepts connections and creates a [`ConnectionHandler`] for each.
pub struct ConsoleServer {
    config: Arc<ConsoleConfig>,
    registry: Arc<CommandRegistry>,
    next_connection: u64,
    sessions: Arc<AtomicU64>,
}

impl ConsoleServer {
    /// Serve `registry` with the given settings.
    pub fn new(config: ConsoleConfig, registry: Arc<CommandRegistry>) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            next_connection: 0,
            sessions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Load the host key, bind and serve until the listener fails.
    pub async fn run(mut self) -> Result<(), ServerError> {
        let key = load_or_generate_host_key(Path::new(&self.config.hostkey))?;

        let ssh_config = server::Config {
            inactivity_timeout: self.config.inactivity_timeout(),
            auth_rejection_time: Duration::from_secs(1),
            auth_rejection_time_initial: Some(Duration::from_secs(0)),
            keys: vec![key],
            ..Default::default()
        };

        let host = self.config.bind_address.clone();
        let port = self.config.port;
        info!("Starting console (via SSH) on {}:{}", host, port);

        self.run_on_address(Arc::new(ssh_config), (host.as_str(), port))
            .await
            .map_err(|source| ServerError::Serve {
                addr: format!("{host}:{port}"),
                source,
            })
    }
}

impl server::Server for ConsoleServer {
    type Handler = ConnectionHandler;

    fn new_client(&mut self, peer: Option<SocketAddr>) -> ConnectionHandler {
        self.next_connection += 1;
        debug!(connection = self.next_connection, ?peer, "accepted");
        ConnectionHandler {
            id: self.next_connection,
            peer,
            config: Arc::clone(&self.config),
            registry: Arc::clone(&self.registry),
            sessions: Arc::clone(&self.sessions),
            user: None,
            channels: HashMap::new(),
            ptys: HashSet::new(),
        }
    }

    fn handle_session_error(&mut self, error: <Self::Handler as server::Handler>::Error) {
        debug!("connection ended with error: {}", error);
    }
}

/// Per-connection state: who logged in and which channels are open.
pub struct ConnectionHandler {
    id: u64,
    peer: Option<SocketAddr>,
    config: Arc<ConsoleConfig>,
    registry: Arc<CommandRegistry>,
    sessions: Arc<AtomicU64>,
    user: Option<String>,
    channels: HashMap<ChannelId, Channel<Msg>>,
    ptys: HashSet<ChannelId>,
}

impl ConnectionHandler {
    /// Server-wide id for a new session; a connection may carry several.
    fn next_session_id(&self) -> u64 {
        self.sessions.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn open_session(&mut self, channel: ChannelId) -> Option<ChannelSession> {
        let stream = self.channels.remove(&channel)?.into_stream();
        let (reader, writer) = tokio::io::split(stream);
        let echo = self.ptys.remove(&channel);

        let id = self.next_session_id();
        debug!(connection = self.id, ?channel, session = id, echo, "channel session");
        Some(Session::new(
            id,
            self.user.clone().unwrap_or_default(),
            Arc::clone(&self.registry),
            &self.config.session_config(echo),
            reader,
            writer,
        ))
    }
}

fn reject() -> Auth {
    Auth::Reject {
        proceed_with_methods: None,
        partial_success: false,
    }
}

/// Whether `user`/`password` are the configured credentials.
pub fn credentials_match(config: &ConsoleConfig, user: &str, password: &str) -> bool {
    user == config.username && password == config.password
}

impl server::Handler for ConnectionHandler {
    type Error = russh::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        if credentials_match(&self.config, user, password) {
            info!(connection = self.id, peer = ?self.peer, user, "login");
            self.user = Some(user.to_string());
            Ok(Auth::Accept)
        } else {
            warn!(connection = self.id, peer = ?self.peer, user, "authentication failed");
            Ok(reject())
        }
    }

    async fn auth_publickey(&mut self, user: &str, _key: &PublicKey) -> Result<Auth, Self::Error> {
        debug!(connection = self.id, user, "public key authentication not supported");
        Ok(reject())
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut server::Session,
    ) -> Result<bool, Self::Error> {
        self.channels.insert(channel.id(), channel);
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        _term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        session: &mut server::Session,
    ) -> Result<(), Self::Error> {
        self.ptys.insert(channel);
        let _ = session.channel_success(channel);
        Ok(())
    }

    async fn shell_request(&mut self, channel: ChannelId, session: &mut server::Session) -> Result<(), Self::Error> {
        let Some(mut console) = self.open_session(channel) else {
            let _ = session.channel_failure(channel);
            return Ok(());
        };
        let _ = session.channel_success(channel);

        let handle = session.handle();
        tokio::spawn(async move {
            console.run().await;
            let _ = handle.eof(channel).await;
            let _ = handle.close(channel).await;
        });
        Ok(())
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut server::Session,
    ) -> Result<(), Self::Error> {
        let Some(mut console) = self.open_session(channel) else {
            let _ = session.channel_failure(channel);
            return Ok(());
        };
        let _ = session.channel_success(channel);

        let line = String::from_utf8_lossy(data).into_owned();
        debug!(connection = self.id, command = %line, "exec");

        let handle = session.handle();
        tokio::spawn(async move {
            let outcome: LineOutcome = console.execute_line(&line).await;
            console.finish().await;
            let _ = handle.exit_status_request(channel, outcome.exit_status()).await;
            let _ = handle.eof(channel).await;
            let _ = handle.close(channel).await;
        });
        Ok(())
    }
}
