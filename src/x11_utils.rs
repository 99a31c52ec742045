//! X11 implementation of the window host

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::randr::ConnectionExt as RandrExt;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use crate::config::Settings;
use crate::constants::{timing, x11};
use crate::host::WindowHost;
use crate::types::{Position, Rect};

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub wm_class: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_state_skip_taskbar: Atom,
    pub net_wm_state_skip_pager: Atom,
    pub net_workarea: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .context(format!("Failed to intern {name} atom"))?
        .reply()
        .context(format!("Failed to get reply for {name} atom"))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            wm_class: intern(conn, "WM_CLASS")?,
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_above: intern(conn, "_NET_WM_STATE_ABOVE")?,
            net_wm_state_skip_taskbar: intern(conn, "_NET_WM_STATE_SKIP_TASKBAR")?,
            net_wm_state_skip_pager: intern(conn, "_NET_WM_STATE_SKIP_PAGER")?,
            net_workarea: intern(conn, "_NET_WORKAREA")?,
        })
    }
}

/// The overlay window on an X11 display
pub struct X11Host {
    conn: Arc<RustConnection>,
    root: Window,
    window: Window,
    screen_size: (i32, i32),
    atoms: CachedAtoms,
}

impl X11Host {
    /// Create, decorate and map the overlay window
    pub fn create(conn: Arc<RustConnection>, screen_num: usize, settings: &Settings) -> Result<Self> {
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let screen_size = (screen.width_in_pixels as i32, screen.height_in_pixels as i32);
        let size = settings.geometry.footprint as u16;

        conn.randr_query_version(1, 5)
            .context("Failed to query RandR version")?
            .reply()
            .context("RandR 1.5 is required for monitor enumeration")?;
        let atoms = CachedAtoms::new(&conn)?;

        let window = conn.generate_id().context("Failed to generate X11 window ID")?;
        conn.create_window(
            screen.root_depth,
            window,
            root,
            0,
            0,
            size,
            size,
            0,
            WindowClass::INPUT_OUTPUT,
            screen.root_visual,
            &CreateWindowAux::new()
                .override_redirect(x11::OVERRIDE_REDIRECT)
                .background_pixel(settings.color_pixel())
                .event_mask(
                    EventMask::STRUCTURE_NOTIFY
                        | EventMask::BUTTON_PRESS
                        | EventMask::BUTTON_RELEASE
                        | EventMask::POINTER_MOTION
                        | EventMask::KEY_PRESS,
                ),
        )
        .context("Failed to create overlay window")?;

        conn.change_property8(PropMode::REPLACE, window, atoms.wm_class, AtomEnum::STRING, x11::WM_CLASS)
            .context("Failed to set WM_CLASS")?;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.net_wm_state,
            AtomEnum::ATOM,
            &[
                atoms.net_wm_state_above,
                atoms.net_wm_state_skip_taskbar,
                atoms.net_wm_state_skip_pager,
            ],
        )
        .context("Failed to set _NET_WM_STATE")?;

        conn.map_window(window).context("Failed to map overlay window")?;
        conn.configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
            .context("Failed to raise overlay window")?;
        conn.flush().context("Failed to flush X11 connection after window setup")?;
        info!(window = window, size = size, "Mapped overlay window");

        Ok(Self {
            conn,
            root,
            window,
            screen_size,
            atoms,
        })
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Take keyboard focus so key bindings work after a click
    pub fn focus(&self) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::PARENT, self.window, x11rb::CURRENT_TIME)
            .context("Failed to focus overlay window")?;
        self.conn.flush().context("Failed to flush X11 connection after focus")?;
        Ok(())
    }

    /// Refresh rate of the screen, falling back to 60Hz
    pub fn refresh_rate(&self) -> u32 {
        let rate = self
            .conn
            .randr_get_screen_info(self.root)
            .context("Failed to query RandR screen info")
            .and_then(|cookie| cookie.reply().context("Failed to get RandR screen info reply"));
        match rate {
            Ok(info) if info.rate > 0 => info.rate as u32,
            Ok(_) => timing::FALLBACK_FRAME_RATE,
            Err(e) => {
                warn!(error = ?e, fallback = timing::FALLBACK_FRAME_RATE, "Could not read refresh rate");
                timing::FALLBACK_FRAME_RATE
            }
        }
    }

    /// `_NET_WORKAREA` of the current desktop, if the WM publishes one
    fn net_workarea(&self) -> Option<Rect> {
        let reply = self
            .conn
            .get_property(false, self.root, self.atoms.net_workarea, AtomEnum::CARDINAL, 0, 4)
            .ok()?
            .reply()
            .ok()?;
        let values: Vec<u32> = reply.value32()?.collect();
        match values.as_slice() {
            [x, y, width, height] => Some(Rect::new(*x as i32, *y as i32, *width as i32, *height as i32)),
            _ => None,
        }
    }

    fn geometry(&self) -> Result<GetGeometryReply> {
        self.conn
            .get_geometry(self.window)
            .context(format!("Failed to query geometry of window {}", self.window))?
            .reply()
            .context(format!("Failed to get geometry reply for window {}", self.window))
    }
}

impl WindowHost for X11Host {
    fn position(&self) -> Result<Position> {
        let geom = self.geometry()?;
        Ok(Position::new(geom.x as i32, geom.y as i32))
    }

    fn set_position(&self, position: Position) -> Result<()> {
        self.conn
            .configure_window(self.window, &ConfigureWindowAux::new().x(position.x).y(position.y))
            .context(format!("Failed to move overlay to ({}, {})", position.x, position.y))?;
        self.conn.flush().context("Failed to flush X11 connection after reposition")?;
        Ok(())
    }

    fn bounds(&self) -> Result<Rect> {
        let geom = self.geometry()?;
        Ok(Rect::new(geom.x as i32, geom.y as i32, geom.width as i32, geom.height as i32))
    }

    fn work_area_near(&self, point: Position) -> Result<Rect> {
        let displays = self.displays()?;
        let monitor = nearest_display(&displays, point)
            .context("No displays available")?;
        let work_area = clip_work_area(monitor, self.net_workarea());
        debug!(point = ?point, monitor = ?monitor, work_area = ?work_area, "Resolved work area");
        Ok(work_area)
    }

    fn displays(&self) -> Result<Vec<Rect>> {
        let monitors = self
            .conn
            .randr_get_monitors(self.root, true)
            .context("Failed to query RandR monitors")?
            .reply()
            .context("Failed to get RandR monitors reply")?
            .monitors;
        if monitors.is_empty() {
            let (width, height) = self.screen_size;
            return Ok(vec![Rect::new(0, 0, width, height)]);
        }
        Ok(monitors
            .iter()
            .map(|m| Rect::new(m.x as i32, m.y as i32, m.width as i32, m.height as i32))
            .collect())
    }

    fn close(&self) -> Result<()> {
        self.conn
            .destroy_window(self.window)
            .context(format!("Failed to destroy overlay window {}", self.window))?;
        self.conn.flush().context("Failed to flush X11 connection during cleanup")?;
        Ok(())
    }
}

/// Display containing `point`, else the one closest to it
pub fn nearest_display(displays: &[Rect], point: Position) -> Option<Rect> {
    displays
        .iter()
        .find(|d| d.contains(point))
        .or_else(|| displays.iter().min_by_key(|d| d.distance_sq(point)))
        .copied()
}

/// Monitor bounds minus panels. `_NET_WORKAREA` spans the whole root window,
/// so it is intersected with the monitor; no overlap means no panels apply.
pub fn clip_work_area(monitor: Rect, net_workarea: Option<Rect>) -> Rect {
    net_workarea
        .and_then(|area| area.intersect(&monitor))
        .unwrap_or(monitor)
}

/// Keycode to keysym lookup for the first (unshifted) level
pub struct KeyMap {
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<Keysym>,
}

impl KeyMap {
    pub fn load(conn: &RustConnection) -> Result<Self> {
        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let count = setup.max_keycode - min_keycode + 1;
        let mapping = conn
            .get_keyboard_mapping(min_keycode, count)
            .context("Failed to query keyboard mapping")?
            .reply()
            .context("Failed to get keyboard mapping reply")?;
        Ok(Self {
            min_keycode,
            keysyms_per_keycode: mapping.keysyms_per_keycode,
            keysyms: mapping.keysyms,
        })
    }

    pub fn keysym(&self, keycode: u8) -> Option<Keysym> {
        let index = (keycode.checked_sub(self.min_keycode)? as usize) * self.keysyms_per_keycode as usize;
        self.keysyms.get(index).copied().filter(|&sym| sym != 0)
    }
}
