//! Control channel over a Unix socket
//!
//! The CLI subcommands talk to the running overlay through this socket.
//! Uses length-prefixed JSON over Unix domain sockets.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use crate::constants::{config, ipc::MAX_MESSAGE_SIZE, ipc::SOCKET_NAME};

mod messages;
pub use messages::{ControlRequest, ControlResponse};

/// Get default socket path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    let base = match dirs::runtime_dir() {
        Some(runtime_dir) => runtime_dir,
        None => dirs::cache_dir()
            .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?,
    };
    Ok(base.join(config::APP_DIR).join(SOCKET_NAME))
}

/// One end of a control connection
pub struct ControlClient {
    pub(crate) stream: UnixStream,
}

impl ControlClient {
    /// Connect to the running overlay
    pub fn connect() -> Result<Self> {
        let path = default_socket_path()?;
        Self::connect_to(&path)
    }

    pub fn connect_to(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .context(format!("Failed to connect to overlay at {} - is it running?", path.display()))?;
        Ok(Self { stream })
    }

    /// Send request and wait for response
    pub fn request(&mut self, req: &ControlRequest) -> Result<ControlResponse> {
        write_message(&mut self.stream, req)?;
        read_message(&mut self.stream)
    }

    pub fn recv_request(&mut self) -> Result<ControlRequest> {
        read_message(&mut self.stream)
    }

    pub fn send_response(&mut self, resp: &ControlResponse) -> Result<()> {
        write_message(&mut self.stream, resp)
    }
}

/// Listening socket of the overlay process
pub struct ControlServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl ControlServer {
    pub fn bind() -> Result<Self> {
        let socket_path = default_socket_path()?;
        Self::bind_to(socket_path)
    }

    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create socket directory: {}", parent.display()))?;
        }

        // Remove stale socket if exists
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .context(format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .context(format!("Failed to bind socket at {}", socket_path.display()))?;

        // Owner only
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        Ok(Self { listener, socket_path })
    }

    /// Accept incoming connection (blocking)
    pub fn accept(&self) -> Result<ControlClient> {
        let (stream, _addr) = self.listener.accept().context("Failed to accept control connection")?;
        Ok(ControlClient { stream })
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Write length-prefixed message to stream
pub(crate) fn write_message<T: Serialize, W: Write>(stream: &mut W, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", json.len(), MAX_MESSAGE_SIZE));
    }

    // Write length prefix (u32 little-endian)
    let len = json.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;
    stream.write_all(&json).context("Failed to write message payload")?;
    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read length-prefixed message from stream
pub(crate) fn read_message<T: for<'de> Deserialize<'de>, R: Read>(stream: &mut R) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    // Sanity check (prevent DoS via huge allocation)
    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", len, MAX_MESSAGE_SIZE));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayState;
    use crate::types::{Edge, Phase};

    #[test]
    fn test_request_response_over_socket_pair() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut client = ControlClient { stream: a };
        let mut server = ControlClient { stream: b };

        let handle = std::thread::spawn(move || {
            let req = server.recv_request().unwrap();
            assert_eq!(req, ControlRequest::MoveToEdge { edge: Edge::Left, offset: Some(0.25) });
            server
                .send_response(&ControlResponse::Status(OverlayState {
                    edge: Edge::Left,
                    offset: 0.25,
                    phase: Phase::Hidden,
                }))
                .unwrap();
        });

        let resp = client
            .request(&ControlRequest::MoveToEdge { edge: Edge::Left, offset: Some(0.25) })
            .unwrap();
        handle.join().unwrap();
        match resp {
            ControlResponse::Status(state) => assert_eq!(state.edge, Edge::Left),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&((MAX_MESSAGE_SIZE as u32) + 1).to_le_bytes());
        let result: Result<ControlRequest> = read_message(&mut frame.as_slice());
        assert!(result.unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn test_frame_layout() {
        let mut buf = Vec::new();
        write_message(&mut buf, &ControlRequest::Ping).unwrap();
        assert_eq!(&buf[..4], &6u32.to_le_bytes());
        assert_eq!(&buf[4..], b"\"Ping\"");
    }

    #[test]
    fn test_truncated_payload_is_error() {
        let mut buf = Vec::new();
        write_message(&mut buf, &ControlRequest::Status).unwrap();
        buf.truncate(buf.len() - 2);
        assert!(read_message::<ControlRequest, _>(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn test_server_removes_socket_on_drop() {
        let dir = std::env::temp_dir().join(format!("peekcat-test-{}", std::process::id()));
        let path = dir.join("control.sock");
        {
            let server = ControlServer::bind_to(path.clone()).unwrap();
            assert!(server.path().exists());
            let mut client = ControlClient::connect_to(&path).unwrap();
            let mut accepted = server.accept().unwrap();
            write_message(&mut client.stream, &ControlRequest::Ping).unwrap();
            assert_eq!(accepted.recv_request().unwrap(), ControlRequest::Ping);
        }
        assert!(!path.exists());
        let _ = std::fs::remove_dir(&dir);
    }
}
