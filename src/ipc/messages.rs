//! Control channel message types

use serde::{Deserialize, Serialize};

use crate::overlay::OverlayState;
use crate::types::Edge;

/// Requests sent from the CLI to the running overlay
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ControlRequest {
    Show,
    Hide,
    /// Show, stay, hide
    Peek,
    Toggle,
    /// Switch edges; `None` keeps the current offset
    MoveToEdge { edge: Edge, offset: Option<f64> },
    /// Destroy the overlay and exit
    Close,
    Status,
    /// Health check
    Ping,
}

/// Responses sent back by the overlay
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ControlResponse {
    /// Request accepted; busy overlays may still drop it
    Ack,
    Pong,
    Status(OverlayState),
    Error(String),
}
