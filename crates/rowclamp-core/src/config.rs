#![forbid(unsafe_code)]

//! Truncation engine configuration.
//!
//! [`TruncateConfig`] collects the knobs of the fit search: the ellipsis
//! marker, the placeholder used to sample line height, the default row
//! budget, the oscillation window, and a hard cap on measurements.
//! Values can be overridden from the environment; the lookup is injectable
//! so tests never touch the process environment.
//!
//! # Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `ROWCLAMP_ELLIPSIS` | [`TruncateConfig::ellipsis`] |
//! | `ROWCLAMP_PLACEHOLDER` | [`TruncateConfig::placeholder`] |
//! | `ROWCLAMP_DEFAULT_ROWS` | [`TruncateConfig::default_rows`] |
//! | `ROWCLAMP_HISTORY_LEN` | [`TruncateConfig::history_len`] |
//! | `ROWCLAMP_MAX_MEASUREMENTS` | [`TruncateConfig::max_measurements`] |
//! | `ROWCLAMP_TRACE` | [`TruncateConfig::enable_trace`] (`1/0/true/false`) |

use std::fmt;
use std::str::FromStr;

const ENV_ELLIPSIS: &str = "ROWCLAMP_ELLIPSIS";
const ENV_PLACEHOLDER: &str = "ROWCLAMP_PLACEHOLDER";
const ENV_DEFAULT_ROWS: &str = "ROWCLAMP_DEFAULT_ROWS";
const ENV_HISTORY_LEN: &str = "ROWCLAMP_HISTORY_LEN";
const ENV_MAX_MEASUREMENTS: &str = "ROWCLAMP_MAX_MEASUREMENTS";
const ENV_TRACE: &str = "ROWCLAMP_TRACE";

/// Default ellipsis marker appended to truncated candidates.
pub const DEFAULT_ELLIPSIS: &str = "\u{2026}";
/// Default placeholder committed to sample line height.
pub const DEFAULT_PLACEHOLDER: &str = ".";
/// Default row budget when the caller does not supply one.
pub const DEFAULT_ROWS: u16 = 3;
/// Default length of the rolling `mid` history used by the oscillation guard.
pub const DEFAULT_HISTORY_LEN: usize = 3;
/// Default cap on candidate measurements per search.
pub const DEFAULT_MAX_MEASUREMENTS: u32 = 64;

/// Configuration for the truncation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateConfig {
    /// Marker appended to a strict word prefix.
    pub ellipsis: String,
    /// Minimal non-empty string used to sample line height and as the search
    /// baseline.
    pub placeholder: String,
    /// Row budget used when props do not specify one.
    pub default_rows: u16,
    /// Number of recent `mid` guesses kept for oscillation detection. The
    /// guard fires when the oldest and newest entries are equal.
    pub history_len: usize,
    /// Hard cap on candidate measurements in one search.
    pub max_measurements: u32,
    /// Record a per-decision trace on each widget.
    pub enable_trace: bool,
}

impl Default for TruncateConfig {
    fn default() -> Self {
        Self {
            ellipsis: DEFAULT_ELLIPSIS.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            default_rows: DEFAULT_ROWS,
            history_len: DEFAULT_HISTORY_LEN,
            max_measurements: DEFAULT_MAX_MEASUREMENTS,
            enable_trace: false,
        }
    }
}

impl TruncateConfig {
    /// Build a configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build a configuration using a custom environment lookup (for tests).
    ///
    /// Unparsable values are ignored and the default is kept.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = get_env(ENV_ELLIPSIS) {
            config.ellipsis = value;
        }
        if let Some(value) = get_env(ENV_PLACEHOLDER)
            && !value.is_empty()
        {
            config.placeholder = value;
        }
        if let Some(rows) = parse_env(&get_env, ENV_DEFAULT_ROWS) {
            config.default_rows = rows;
        }
        if let Some(len) = parse_env(&get_env, ENV_HISTORY_LEN) {
            config.history_len = len;
        }
        if let Some(max) = parse_env(&get_env, ENV_MAX_MEASUREMENTS) {
            config.max_measurements = max;
        }
        if let Some(value) = get_env(ENV_TRACE) {
            match parse_bool(&value) {
                Some(enabled) => config.enable_trace = enabled,
                None => {
                    crate::warn!(var = ENV_TRACE, value = %value, "ignoring unparsable env override");
                }
            }
        }
        config
    }

    /// Set the ellipsis marker.
    #[must_use]
    pub fn with_ellipsis(mut self, ellipsis: impl Into<String>) -> Self {
        self.ellipsis = ellipsis.into();
        self
    }

    /// Set the line-height placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Set the default row budget.
    #[must_use]
    pub fn with_default_rows(mut self, rows: u16) -> Self {
        self.default_rows = rows;
        self
    }

    /// Set the oscillation history length.
    #[must_use]
    pub fn with_history_len(mut self, len: usize) -> Self {
        self.history_len = len;
        self
    }

    /// Set the measurement cap.
    #[must_use]
    pub fn with_max_measurements(mut self, max: u32) -> Self {
        self.max_measurements = max;
        self
    }

    /// Enable or disable the per-widget search trace.
    #[must_use]
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.enable_trace = enabled;
        self
    }

    /// Check that the configuration can drive a search.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.placeholder.is_empty() {
            return Err(ConfigError::EmptyPlaceholder);
        }
        if self.history_len < 2 {
            return Err(ConfigError::HistoryTooShort(self.history_len));
        }
        if self.max_measurements == 0 {
            return Err(ConfigError::ZeroMeasurementCap);
        }
        if self.default_rows == 0 {
            return Err(ConfigError::ZeroDefaultRows);
        }
        Ok(())
    }

    /// Validate and return `self`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Serialize configuration to a single JSON line (for evidence logs).
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        format!(
            r#"{{"event":"config","ellipsis":"{}","placeholder":"{}","default_rows":{},"history_len":{},"max_measurements":{},"trace":{}}}"#,
            json_escape(&self.ellipsis),
            json_escape(&self.placeholder),
            self.default_rows,
            self.history_len,
            self.max_measurements,
            self.enable_trace,
        )
    }
}

fn parse_env<F, T>(get_env: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let value = get_env(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            crate::warn!(var = key, value = %value, "ignoring unparsable env override");
            None
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Escape a string for embedding in a JSON string literal.
#[must_use]
pub fn json_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write as _;
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The placeholder must render at least one glyph.
    EmptyPlaceholder,
    /// The oscillation window needs at least two entries.
    HistoryTooShort(usize),
    /// A search needs at least one measurement.
    ZeroMeasurementCap,
    /// The default row budget must be positive.
    ZeroDefaultRows,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPlaceholder => write!(f, "placeholder must not be empty"),
            Self::HistoryTooShort(len) => {
                write!(f, "history length {len} is too short (minimum 2)")
            }
            Self::ZeroMeasurementCap => write!(f, "max_measurements must be positive"),
            Self::ZeroDefaultRows => write!(f, "default_rows must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}
