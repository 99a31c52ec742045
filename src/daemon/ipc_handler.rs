//! Control socket listener for the overlay process

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::Command;
use crate::host::{CharacterPlayer, FrameClock, WindowHost};
use crate::ipc::{ControlClient, ControlRequest, ControlResponse, ControlServer};
use crate::overlay::Overlay;

/// A request waiting for the overlay task to answer it
pub struct ControlMessage {
    pub request: ControlRequest,
    pub reply: oneshot::Sender<ControlResponse>,
}

/// Spawn IPC listener thread; requests are forwarded to the overlay task
pub fn spawn_ipc_listener(
    server: ControlServer,
    requests: mpsc::UnboundedSender<ControlMessage>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(e) = run_ipc_loop(&server, &requests) {
            error!(error = ?e, "IPC listener thread crashed");
        }
    })
}

fn run_ipc_loop(server: &ControlServer, requests: &mpsc::UnboundedSender<ControlMessage>) -> Result<()> {
    info!(socket = ?server.path(), "IPC listener started");

    loop {
        let mut client = server.accept().context("Failed to accept IPC connection")?;
        debug!("Control client connected");

        if !serve_client(&mut client, requests) {
            info!("Overlay task gone, stopping IPC listener");
            return Ok(());
        }
    }
}

/// Answer requests until the client hangs up. Returns false once the
/// overlay task has stopped listening.
fn serve_client(client: &mut ControlClient, requests: &mpsc::UnboundedSender<ControlMessage>) -> bool {
    loop {
        let request = match client.recv_request() {
            Ok(request) => request,
            Err(e) => {
                debug!(error = ?e, "Control connection closed");
                return true;
            }
        };

        let (reply, response) = oneshot::channel();
        if requests.send(ControlMessage { request, reply }).is_err() {
            let _ = client.send_response(&ControlResponse::Error("overlay is shutting down".into()));
            return false;
        }
        let response = response
            .blocking_recv()
            .unwrap_or_else(|_| ControlResponse::Error("overlay is shutting down".into()));

        if let Err(e) = client.send_response(&response) {
            warn!(error = ?e, "Failed to send control response");
            return true;
        }
    }
}

/// Immediate response to a request plus the command it triggers, if any
pub fn answer<H, P, C>(overlay: &Overlay<H, P, C>, request: ControlRequest) -> (ControlResponse, Option<Command>)
where
    H: WindowHost,
    P: CharacterPlayer,
    C: FrameClock,
{
    let command = match request {
        ControlRequest::Ping => return (ControlResponse::Pong, None),
        ControlRequest::Status => return (ControlResponse::Status(overlay.state()), None),
        ControlRequest::MoveToEdge { offset: Some(offset), .. } if !offset.is_finite() => {
            return (ControlResponse::Error(format!("invalid offset {offset}")), None);
        }
        ControlRequest::Show => Command::Show,
        ControlRequest::Hide => Command::Hide,
        ControlRequest::Peek => Command::Peek,
        ControlRequest::Toggle => Command::Toggle,
        ControlRequest::MoveToEdge { edge, offset } => Command::MoveToEdge { edge, offset },
        ControlRequest::Close => Command::Close,
    };
    info!(command = ?command, "Received command via IPC");
    (ControlResponse::Ack, Some(command))
}
