//! Configuration schema for the motion controller core (SPEC_FULL.md §3, §6
//! "Configuration (ADDED)"). Loaded from TOML at startup; immutable once the
//! main loop starts.

use serde::{Deserialize, Serialize};

use crate::consts::{
    BACKLASH_ENABLE_THRESHOLD, DEFAULT_FEED_OVERRIDE, DEFAULT_RAPID_OVERRIDE,
    DEFAULT_SPINDLE_RPM_OVERRIDE, N_AXIS,
};

/// Top-level settings recognized by the core (SPEC_FULL.md §6 "Configuration").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Per-axis backlash compensation length (mm). Enabled for an axis when
    /// the value exceeds [`BACKLASH_ENABLE_THRESHOLD`].
    #[serde(default = "default_backlash")]
    pub backlash: [f64; N_AXIS],

    /// Maximum chordal deviation per arc segment (mm).
    #[serde(default = "default_arc_tolerance")]
    pub arc_tolerance: f64,

    #[serde(default)]
    pub homing: HomingConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub flags: CoreFlags,

    /// Step-up distance applied between pecks in chip-break drilling (mm).
    #[serde(default = "default_g73_retract")]
    pub g73_retract: f64,

    #[serde(default)]
    pub overrides: OverrideConfig,
}

fn default_backlash() -> [f64; N_AXIS] {
    [0.0; N_AXIS]
}
fn default_arc_tolerance() -> f64 {
    0.002
}
fn default_g73_retract() -> f64 {
    1.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backlash: default_backlash(),
            arc_tolerance: default_arc_tolerance(),
            homing: HomingConfig::default(),
            limits: LimitsConfig::default(),
            flags: CoreFlags::default(),
            g73_retract: default_g73_retract(),
            overrides: OverrideConfig::default(),
        }
    }
}

impl Settings {
    /// Reject out-of-range values before the main loop starts
    /// (SPEC_FULL.md §3 "a `validate()` method").
    pub fn validate(&self) -> Result<(), String> {
        if self.arc_tolerance <= 0.0 {
            return Err(format!(
                "arc_tolerance must be positive, got {}",
                self.arc_tolerance
            ));
        }
        for (idx, &b) in self.backlash.iter().enumerate() {
            if b < 0.0 {
                return Err(format!("backlash[{idx}] must be non-negative, got {b}"));
            }
        }
        if self.g73_retract <= 0.0 {
            return Err(format!(
                "g73_retract must be positive, got {}",
                self.g73_retract
            ));
        }
        self.overrides.validate()?;
        Ok(())
    }

    /// True if backlash compensation is active for this axis
    /// (SPEC_FULL.md §6: "enabled when > 1e-4 for that axis").
    pub fn backlash_enabled(&self, axis: usize) -> bool {
        self.backlash.get(axis).copied().unwrap_or(0.0) > BACKLASH_ENABLE_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HomingCycleMask {
    pub mask: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub init_lock: bool,
    #[serde(default)]
    pub dir_mask: u32,
    /// Ordered homing passes; each mask selects the axes that home together.
    #[serde(default)]
    pub cycle: Vec<HomingCycleMask>,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            init_lock: false,
            dir_mask: 0,
            cycle: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default)]
    pub soft_enabled: bool,
    #[serde(default)]
    pub hard_enabled: bool,
    #[serde(default)]
    pub jog_soft_limited: bool,
    #[serde(default)]
    pub two_switches: bool,
    #[serde(default)]
    pub check_at_init: bool,
    /// Per-axis travel bounds, used by the soft-limit check (mm).
    #[serde(default = "default_min_travel")]
    pub min_travel: [f64; N_AXIS],
    #[serde(default = "default_max_travel")]
    pub max_travel: [f64; N_AXIS],
}

fn default_min_travel() -> [f64; N_AXIS] {
    [0.0; N_AXIS]
}
fn default_max_travel() -> [f64; N_AXIS] {
    [f64::MAX; N_AXIS]
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            soft_enabled: false,
            hard_enabled: false,
            jog_soft_limited: false,
            two_switches: false,
            check_at_init: false,
            min_travel: default_min_travel(),
            max_travel: default_max_travel(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CoreFlags {
    #[serde(default)]
    pub laser_mode: bool,
    #[serde(default)]
    pub block_delete_enabled: bool,
    #[serde(default)]
    pub force_initialization_alarm: bool,
    #[serde(default)]
    pub sleep_enable: bool,
    #[serde(default)]
    pub safety_door_ignore_when_idle: bool,
    #[serde(default)]
    pub legacy_rt_commands: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OverrideConfig {
    #[serde(default = "default_feed_override")]
    pub default_feed: u8,
    #[serde(default = "default_rapid_override")]
    pub default_rapid: u8,
    #[serde(default = "default_spindle_override")]
    pub default_spindle: u8,
}

fn default_feed_override() -> u8 {
    DEFAULT_FEED_OVERRIDE
}
fn default_rapid_override() -> u8 {
    DEFAULT_RAPID_OVERRIDE
}
fn default_spindle_override() -> u8 {
    DEFAULT_SPINDLE_RPM_OVERRIDE
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            default_feed: default_feed_override(),
            default_rapid: default_rapid_override(),
            default_spindle: default_spindle_override(),
        }
    }
}

impl OverrideConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.default_feed == 0 || self.default_rapid == 0 || self.default_spindle == 0 {
            return Err("override defaults must be non-zero percentages".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn negative_backlash_rejected() {
        let mut s = Settings::default();
        s.backlash[0] = -1.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn zero_arc_tolerance_rejected() {
        let mut s = Settings::default();
        s.arc_tolerance = 0.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn backlash_enabled_threshold() {
        let mut s = Settings::default();
        s.backlash[0] = 0.1;
        s.backlash[1] = 0.00001;
        assert!(s.backlash_enabled(0));
        assert!(!s.backlash_enabled(1));
    }

    #[test]
    fn toml_roundtrip() {
        let s = Settings::default();
        let text = toml::to_string(&s).expect("serialize");
        let back: Settings = toml::from_str(&text).expect("deserialize");
        assert_eq!(back.arc_tolerance, s.arc_tolerance);
    }

    #[test]
    fn toml_missing_fields_use_defaults() {
        let parsed: Settings = toml::from_str("arc_tolerance = 0.01\n").expect("deserialize");
        assert_eq!(parsed.arc_tolerance, 0.01);
        assert_eq!(parsed.g73_retract, default_g73_retract());
        assert!(!parsed.flags.laser_mode);
    }
}
