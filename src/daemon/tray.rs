//! System tray icon; its menu doubles as the overlay's context menu

use anyhow::{Result, anyhow};
use ksni::menu::{StandardItem, SubMenu};
use ksni::{MenuItem, ToolTip, TrayMethods};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use super::Command;
use crate::types::Edge;

pub struct OverlayTray {
    commands: UnboundedSender<Command>,
}

impl OverlayTray {
    pub fn new(commands: UnboundedSender<Command>) -> Self {
        Self { commands }
    }

    fn send(&self, command: Command) {
        // Closed channel means the overlay is already shutting down
        let _ = self.commands.send(command);
    }
}

fn action(label: &str, command: Command) -> MenuItem<OverlayTray> {
    StandardItem {
        label: label.into(),
        activate: Box::new(move |tray: &mut OverlayTray| tray.send(command.clone())),
        ..Default::default()
    }
    .into()
}

fn edge_label(edge: Edge) -> &'static str {
    match edge {
        Edge::Bottom => "Bottom",
        Edge::Top => "Top",
        Edge::Left => "Left",
        Edge::Right => "Right",
    }
}

impl ksni::Tray for OverlayTray {
    fn id(&self) -> String {
        env!("CARGO_PKG_NAME").into()
    }

    fn title(&self) -> String {
        "peekcat".into()
    }

    fn icon_name(&self) -> String {
        "face-smile".into()
    }

    fn tool_tip(&self) -> ToolTip {
        ToolTip {
            title: "peekcat".into(),
            description: "Click to peek, right-click for options".into(),
            ..Default::default()
        }
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        self.send(Command::Toggle);
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        vec![
            action("Peek", Command::Peek),
            action("Hide", Command::Hide),
            SubMenu {
                label: "Move to edge".into(),
                submenu: Edge::ALL
                    .iter()
                    .map(|&edge| action(edge_label(edge), Command::MoveToEdge { edge, offset: None }))
                    .collect(),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            action("Quit", Command::Close),
        ]
    }
}

/// Register the tray with the StatusNotifier host
pub async fn spawn_tray(commands: UnboundedSender<Command>) -> Result<ksni::Handle<OverlayTray>> {
    let handle = OverlayTray::new(commands)
        .spawn()
        .await
        .map_err(|e| anyhow!("Failed to spawn tray service: {e:?}"))?;
    info!("System tray registered");
    Ok(handle)
}
