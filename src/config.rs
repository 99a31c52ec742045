//! Configuration for the overlay
//!
//! Loaded from `$XDG_CONFIG_HOME/peekcat/config.toml`. A missing file is
//! generated from defaults so users have something to edit; environment
//! variables override file values, and everything is clamped to sane ranges
//! before use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::constants::{autopilot, character, drag, geometry, timing};
use crate::geometry::GeometryConfig;
use crate::overlay::Timings;
use crate::scheduler::CycleSettings;
use crate::types::Edge;

/// Top-level settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Edge the overlay starts on
    pub edge: Edge,

    /// Starting position along the edge (0.0 - 1.0)
    pub offset: f64,

    pub geometry: GeometrySettings,
    pub timing: TimingSettings,
    pub autopilot: AutopilotSettings,
    pub drag: DragSettings,
    pub character: CharacterSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySettings {
    /// Window edge length in pixels
    pub footprint: i32,

    /// How far the hidden position sits beyond the visible one (top/bottom edges)
    pub hidden_offset: i32,

    /// Gap (px) under which a neighboring display counts as adjacent
    pub adjacent_tolerance: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub appear_ms: u64,
    pub hide_ms: u64,
    pub stay_ms: u64,
    pub settle_ms: u64,
    pub cycle_delay_ms: u64,
    pub start_delay_ms: u64,

    /// Animation frame rate; 0 follows the display refresh rate
    pub frame_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotSettings {
    pub enabled: bool,

    /// Chance of moving to a new spot after each peek
    pub edge_change_probability: f64,

    pub offset_min: f64,
    pub offset_max: f64,

    /// Edges the autopilot may pick from
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    /// Pointer travel before a press turns into a drag
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSettings {
    /// Lottie JSON describing the character animation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<PathBuf>,

    /// Window background color (#RRGGBB)
    pub color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            edge: Edge::Bottom,
            offset: 0.5,
            geometry: GeometrySettings::default(),
            timing: TimingSettings::default(),
            autopilot: AutopilotSettings::default(),
            drag: DragSettings::default(),
            character: CharacterSettings::default(),
        }
    }
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            footprint: geometry::FOOTPRINT,
            hidden_offset: geometry::HIDDEN_OFFSET,
            adjacent_tolerance: geometry::ADJACENT_TOLERANCE,
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            appear_ms: timing::APPEAR_MS,
            hide_ms: timing::HIDE_MS,
            stay_ms: timing::STAY_MS,
            settle_ms: timing::SETTLE_MS,
            cycle_delay_ms: timing::CYCLE_DELAY_MS,
            start_delay_ms: timing::START_DELAY_MS,
            frame_rate: 0,
        }
    }
}

impl Default for AutopilotSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            edge_change_probability: autopilot::EDGE_CHANGE_PROBABILITY,
            offset_min: autopilot::OFFSET_MIN,
            offset_max: autopilot::OFFSET_MAX,
            edges: Edge::ALL.to_vec(),
        }
    }
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            threshold: drag::THRESHOLD,
        }
    }
}

impl Default for CharacterSettings {
    fn default() -> Self {
        Self {
            asset: None,
            color: character::COLOR.to_string(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    /// Load from the default path, writing defaults if no file exists yet
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let mut settings = if path.exists() {
            Self::load_from(&path)?
        } else {
            info!(path = %path.display(), "No config file found, generating default");
            let settings = Self::default();
            if let Err(e) = settings.save_to(&path) {
                error!(error = ?e, "Failed to save default config");
            } else {
                info!(path = %path.display(), "Generated config file for user to edit (env vars still override)");
            }
            settings
        };

        settings.apply_overrides(|var| env::var(var).ok());
        settings.validate_and_clamp();
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .context(format!("Failed to parse config file {} - please fix the syntax errors", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config to TOML")?;
        fs::write(path, contents)
            .context(format!("Failed to write config file to {}", path.display()))?;
        Ok(())
    }

    /// Apply `PEEKCAT_*` overrides; `lookup` is `env::var` outside of tests
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(edge) = lookup("PEEKCAT_EDGE") {
            match edge.parse() {
                Ok(edge) => self.edge = edge,
                Err(e) => error!(var = "PEEKCAT_EDGE", error = %e, "failed to parse env var"),
            }
        }
        if let Some(stay) = lookup("PEEKCAT_STAY_MS") {
            match stay.trim().parse() {
                Ok(stay) => self.timing.stay_ms = stay,
                Err(e) => error!(var = "PEEKCAT_STAY_MS", error = ?e, "failed to parse env var"),
            }
        }
        if let Some(enabled) = lookup("PEEKCAT_AUTOPILOT") {
            self.autopilot.enabled = matches!(enabled.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
    }

    /// Clamp config values to safe ranges, logging every correction
    pub fn validate_and_clamp(&mut self) {
        use crate::constants::validation::*;

        if !self.offset.is_finite() || !(0.0..=1.0).contains(&self.offset) {
            warn!(offset = %self.offset, "offset outside 0.0-1.0, clamping");
            self.offset = if self.offset.is_finite() { self.offset.clamp(0.0, 1.0) } else { 0.5 };
        }

        let g = &mut self.geometry;
        if !(MIN_FOOTPRINT..=MAX_FOOTPRINT).contains(&g.footprint) {
            warn!(footprint = g.footprint, min = MIN_FOOTPRINT, max = MAX_FOOTPRINT, "footprint out of range, clamping");
            g.footprint = g.footprint.clamp(MIN_FOOTPRINT, MAX_FOOTPRINT);
        }
        if !(0..=g.footprint).contains(&g.hidden_offset) {
            warn!(hidden_offset = g.hidden_offset, footprint = g.footprint, "hidden_offset must be within the footprint, clamping");
            g.hidden_offset = g.hidden_offset.clamp(0, g.footprint);
        }
        if !(0..=MAX_ADJACENT_TOLERANCE).contains(&g.adjacent_tolerance) {
            warn!(adjacent_tolerance = g.adjacent_tolerance, max = MAX_ADJACENT_TOLERANCE, "adjacent_tolerance out of range, clamping");
            g.adjacent_tolerance = g.adjacent_tolerance.clamp(0, MAX_ADJACENT_TOLERANCE);
        }

        let t = &mut self.timing;
        for (name, value) in [
            ("appear_ms", &mut t.appear_ms),
            ("hide_ms", &mut t.hide_ms),
            ("stay_ms", &mut t.stay_ms),
            ("settle_ms", &mut t.settle_ms),
            ("cycle_delay_ms", &mut t.cycle_delay_ms),
            ("start_delay_ms", &mut t.start_delay_ms),
        ] {
            if *value > MAX_DURATION_MS {
                warn!(setting = name, value = *value, max = MAX_DURATION_MS, "duration exceeds maximum, clamping");
                *value = MAX_DURATION_MS;
            }
        }
        if t.frame_rate > MAX_FRAME_RATE {
            warn!(frame_rate = t.frame_rate, max = MAX_FRAME_RATE, "frame_rate exceeds maximum, clamping");
            t.frame_rate = MAX_FRAME_RATE;
        }

        let a = &mut self.autopilot;
        if !(0.0..=1.0).contains(&a.edge_change_probability) {
            warn!(probability = %a.edge_change_probability, "edge_change_probability outside 0.0-1.0, using default");
            a.edge_change_probability = autopilot::EDGE_CHANGE_PROBABILITY;
        }
        let range_ok = (0.0..=1.0).contains(&a.offset_min)
            && (0.0..=1.0).contains(&a.offset_max)
            && a.offset_min <= a.offset_max;
        if !range_ok {
            warn!(offset_min = %a.offset_min, offset_max = %a.offset_max, "invalid autopilot offset range, using default");
            a.offset_min = autopilot::OFFSET_MIN;
            a.offset_max = autopilot::OFFSET_MAX;
        }
        if a.edges.is_empty() {
            warn!("autopilot edges is empty, allowing all edges");
            a.edges = Edge::ALL.to_vec();
        }

        if !(0.0..=MAX_DRAG_THRESHOLD).contains(&self.drag.threshold) {
            warn!(threshold = %self.drag.threshold, max = MAX_DRAG_THRESHOLD, "drag threshold out of range, using default");
            self.drag.threshold = drag::THRESHOLD;
        }

        if parse_color(&self.character.color).is_none() {
            error!(color = %self.character.color, "Invalid character color hex, using default");
            self.character.color = character::COLOR.to_string();
        }
    }

    pub fn geometry(&self) -> GeometryConfig {
        GeometryConfig {
            footprint: self.geometry.footprint,
            hidden_offset: self.geometry.hidden_offset,
            adjacent_tolerance: self.geometry.adjacent_tolerance,
        }
    }

    pub fn timings(&self) -> Timings {
        Timings {
            appear: Duration::from_millis(self.timing.appear_ms),
            hide: Duration::from_millis(self.timing.hide_ms),
            stay: Duration::from_millis(self.timing.stay_ms),
            settle: Duration::from_millis(self.timing.settle_ms),
        }
    }

    pub fn cycle(&self) -> CycleSettings {
        CycleSettings {
            start_delay: Duration::from_millis(self.timing.start_delay_ms),
            cycle_delay: Duration::from_millis(self.timing.cycle_delay_ms),
            edge_change_probability: self.autopilot.edge_change_probability,
            offset_range: (self.autopilot.offset_min, self.autopilot.offset_max),
            edges: self.autopilot.edges.clone(),
        }
    }

    /// Background pixel for the overlay window
    pub fn color_pixel(&self) -> u32 {
        parse_color(&self.character.color).unwrap_or(0x00F4_A261)
    }
}

/// Parse `#RRGGBB` (the `#` is optional) into a 24-bit pixel value
pub fn parse_color(hex: &str) -> Option<u32> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_constants() {
        let settings = Settings::default();
        assert_eq!(settings.edge, Edge::Bottom);
        assert_eq!(settings.offset, 0.5);
        assert_eq!(settings.geometry.footprint, 200);
        assert_eq!(settings.geometry.hidden_offset, 170);
        assert_eq!(settings.timing.stay_ms, 60_000);
        assert_eq!(settings.autopilot.edges.len(), 4);
        assert_eq!(settings.drag.threshold, 5.0);
    }

    #[test]
    fn test_toml_roundtrip() {
        let settings = Settings::default();
        let contents = toml::to_string_pretty(&settings).unwrap();
        let loaded: Settings = toml::from_str(&contents).unwrap();
        assert_eq!(settings, loaded);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let contents = r#"
edge = "left"

[timing]
stay_ms = 5000

[autopilot]
edges = ["bottom"]
"#;
        let settings: Settings = toml::from_str(contents).unwrap();
        assert_eq!(settings.edge, Edge::Left);
        assert_eq!(settings.timing.stay_ms, 5000);
        assert_eq!(settings.timing.appear_ms, 1000);
        assert_eq!(settings.autopilot.edges, vec![Edge::Bottom]);
        assert!(settings.autopilot.enabled);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_overrides(env(&[
            ("PEEKCAT_EDGE", "top"),
            ("PEEKCAT_STAY_MS", "1500"),
            ("PEEKCAT_AUTOPILOT", "off"),
        ]));
        assert_eq!(settings.edge, Edge::Top);
        assert_eq!(settings.timing.stay_ms, 1500);
        assert!(!settings.autopilot.enabled);
    }

    #[test]
    fn test_invalid_env_override_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_overrides(env(&[("PEEKCAT_EDGE", "diagonal"), ("PEEKCAT_STAY_MS", "soon")]));
        assert_eq!(settings.edge, Edge::Bottom);
        assert_eq!(settings.timing.stay_ms, 60_000);
    }

    #[test]
    fn test_validate_and_clamp() {
        let mut settings = Settings::default();
        settings.offset = 4.0;
        settings.geometry.footprint = 5000;
        settings.geometry.hidden_offset = -3;
        settings.autopilot.edge_change_probability = 1.5;
        settings.autopilot.offset_min = 0.9;
        settings.autopilot.offset_max = 0.1;
        settings.autopilot.edges.clear();
        settings.drag.threshold = -1.0;
        settings.character.color = "orange".to_string();

        settings.validate_and_clamp();

        assert_eq!(settings.offset, 1.0);
        assert_eq!(settings.geometry.footprint, 1024);
        assert_eq!(settings.geometry.hidden_offset, 0);
        assert_eq!(settings.autopilot.edge_change_probability, 0.3);
        assert_eq!((settings.autopilot.offset_min, settings.autopilot.offset_max), (0.3, 0.7));
        assert_eq!(settings.autopilot.edges, Edge::ALL.to_vec());
        assert_eq!(settings.drag.threshold, 5.0);
        assert_eq!(settings.character.color, "#F4A261");
    }

    #[test]
    fn test_nan_offset_falls_back_to_center() {
        let mut settings = Settings::default();
        settings.offset = f64::NAN;
        settings.validate_and_clamp();
        assert_eq!(settings.offset, 0.5);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#F4A261"), Some(0xF4A261));
        assert_eq!(parse_color("00ff00"), Some(0x00FF00));
        assert_eq!(parse_color("#FFF"), None);
        assert_eq!(parse_color("#GGGGGG"), None);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join(format!("peekcat-config-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let mut settings = Settings::default();
        settings.edge = Edge::Right;
        settings.character.asset = Some(PathBuf::from("/tmp/cat.json"));

        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();
        let _ = fs::remove_dir_all(&dir);

        assert_eq!(loaded, settings);
    }
}
