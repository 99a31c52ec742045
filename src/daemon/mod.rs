//! The overlay process
//!
//! Everything that touches overlay state runs as a local task on a single
//! threaded runtime. X11 events, control requests, signals and tray clicks
//! arrive from helper threads over channels and are dispatched here.

mod event_handler;
mod ipc_handler;
mod tray;

use anyhow::{Context, Result};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::LocalSet;
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::animation::RefreshClock;
use crate::character::Timeline;
use crate::config::Settings;
use crate::drag::DragController;
use crate::host::{CharacterPlayer, FrameClock, WindowHost};
use crate::ipc::ControlServer;
use crate::overlay::Overlay;
use crate::scheduler::{Scheduler, SystemRandom};
use crate::types::Edge;
use crate::x11_utils::{KeyMap, X11Host};
use ipc_handler::ControlMessage;

pub type DesktopOverlay = Overlay<X11Host, Timeline, RefreshClock>;

/// User-facing overlay operations
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show,
    Hide,
    Peek,
    Toggle,
    /// `None` keeps the current offset
    MoveToEdge { edge: Edge, offset: Option<f64> },
    Close,
}

pub fn run_daemon(settings: Settings) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    LocalSet::new().block_on(&runtime, serve(settings))
}

async fn serve(settings: Settings) -> Result<()> {
    let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11 display")?;
    let conn = Arc::new(conn);
    info!(screen = screen_num, "Connected to X11");

    let host = X11Host::create(conn.clone(), screen_num, &settings)?;
    let keymap = KeyMap::load(&conn)?;
    let frame_rate = match settings.timing.frame_rate {
        0 => host.refresh_rate(),
        rate => rate,
    };
    let clock = RefreshClock::new(frame_rate);
    info!(frame_rate = frame_rate, period = ?clock.period(), "Animation frame rate");

    let timeline = Timeline::load(settings.character.asset.as_deref());
    let overlay = Rc::new(Overlay::new(
        host,
        timeline,
        clock,
        settings.geometry(),
        settings.timings(),
        settings.edge,
        settings.offset,
    ));
    overlay.park();

    let (command_tx, mut commands) = mpsc::unbounded_channel::<Command>();
    let (event_tx, mut events) = mpsc::unbounded_channel::<Event>();
    let (request_tx, mut requests) = mpsc::unbounded_channel::<ControlMessage>();

    spawn_event_pump(conn, event_tx, command_tx.clone());

    let socket_path = match ControlServer::bind() {
        Ok(server) => {
            let path = server.path().to_path_buf();
            ipc_handler::spawn_ipc_listener(server, request_tx);
            Some(path)
        }
        Err(e) => {
            warn!(error = ?e, "Control socket unavailable, CLI commands will not reach this overlay");
            None
        }
    };

    if let Err(e) = spawn_signal_listener(command_tx.clone()) {
        warn!(error = ?e, "Failed to install signal handlers");
    }

    let _tray = tray::spawn_tray(command_tx.clone())
        .await
        .inspect_err(|e| warn!(error = ?e, "Continuing without system tray"))
        .ok();

    let autopilot = settings.autopilot.enabled.then(|| {
        let overlay = overlay.clone();
        let mut scheduler = Scheduler::new(settings.cycle(), SystemRandom::new());
        tokio::task::spawn_local(async move { scheduler.run(&overlay).await })
    });
    if autopilot.is_none() {
        info!("Autopilot disabled, waiting for commands");
    }

    let mut drag = DragController::new(settings.drag.threshold);
    loop {
        let command = tokio::select! {
            Some(event) = events.recv() => event_handler::handle_event(&overlay, &mut drag, &keymap, event),
            Some(command) = commands.recv() => Some(command),
            Some(ControlMessage { request, reply }) = requests.recv() => {
                let (response, command) = ipc_handler::answer(&overlay, request);
                let _ = reply.send(response);
                command
            }
            else => break,
        };

        match command {
            Some(Command::Close) => break,
            Some(command) => {
                debug!(command = ?command, "Dispatching command");
                let overlay = overlay.clone();
                tokio::task::spawn_local(async move { execute(&overlay, command).await });
            }
            None => {}
        }
    }

    if let Some(autopilot) = autopilot {
        autopilot.abort();
    }
    overlay.close();
    if let Some(path) = socket_path {
        let _ = std::fs::remove_file(path);
    }
    info!("Overlay closed");
    Ok(())
}

/// Run one command to completion
pub async fn execute<H, P, C>(overlay: &Overlay<H, P, C>, command: Command)
where
    H: WindowHost,
    P: CharacterPlayer,
    C: FrameClock,
{
    match command {
        Command::Show => overlay.show().await,
        Command::Hide => overlay.hide().await,
        Command::Peek => overlay.peek_cycle().await,
        Command::Toggle => overlay.toggle().await,
        Command::MoveToEdge { edge, offset } => {
            let offset = offset.unwrap_or(overlay.state().offset);
            overlay.move_to_edge(edge, offset).await;
        }
        Command::Close => overlay.close(),
    }
}

/// Forward X11 events to the overlay task; a dead connection closes the overlay
fn spawn_event_pump(
    conn: Arc<RustConnection>,
    events: UnboundedSender<Event>,
    commands: UnboundedSender<Command>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            match conn.wait_for_event() {
                Ok(event) => {
                    if events.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(error = ?e, "Lost X11 connection");
                    let _ = commands.send(Command::Close);
                    break;
                }
            }
        }
    })
}

fn spawn_signal_listener(commands: UnboundedSender<Command>) -> Result<std::thread::JoinHandle<()>> {
    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to register SIGINT/SIGTERM handlers")?;
    Ok(std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            info!(signal = signal, "Received signal, closing overlay");
            let _ = commands.send(Command::Close);
        }
    }))
}
