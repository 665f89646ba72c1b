// SPDX-License-Identifier: MIT
//
// Demo configuration.
//
// An optional JSON file, named by the first command-line argument or by
// `GROVE_CONFIG`. Every field has a default, so `{}` and a missing file
// argument both give the stock setup:
//
//   {
//     "escape_timeout_ms": 50,
//     "dsr_timeout_ms": 100,
//     "double_click_timeout_ms": 500,
//     "tick_interval_us": 8333,
//     "render_mode": "regions",
//     "mouse": true,
//     "bracketed_paste": true,
//     "focus_reporting": true,
//     "background": [16, 16, 24],
//     "inline": false,
//     "inline_height": 10
//   }
//
// With `inline` set the demo draws into `inline_height` rows below the
// prompt instead of taking over the alternate screen.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use grove_compose::{LoopConfig, RenderMode};
use grove_term::input::ParserConfig;
use grove_term::{Cell, Rgb};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "GROVE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderModeName {
    #[default]
    Regions,
    Painter,
}

impl From<RenderModeName> for RenderMode {
    fn from(name: RenderModeName) -> Self {
        match name {
            RenderModeName::Regions => Self::Regions,
            RenderModeName::Painter => Self::Painter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub escape_timeout_ms: u64,
    pub dsr_timeout_ms: u64,
    pub double_click_timeout_ms: u64,
    pub tick_interval_us: u64,
    pub render_mode: RenderModeName,
    pub mouse: bool,
    pub bracketed_paste: bool,
    pub focus_reporting: bool,
    pub background: [u8; 3],
    pub inline: bool,
    pub inline_height: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            escape_timeout_ms: 50,
            dsr_timeout_ms: 100,
            double_click_timeout_ms: 500,
            tick_interval_us: 8333,
            render_mode: RenderModeName::default(),
            mouse: true,
            bracketed_paste: true,
            focus_reporting: true,
            background: [16, 16, 24],
            inline: false,
            inline_height: 10,
        }
    }
}

impl Config {
    /// Load from the first CLI argument, else `GROVE_CONFIG`, else defaults.
    pub fn load(mut args: impl Iterator<Item = String>) -> Result<Self, ConfigError> {
        let path = args
            .next()
            .or_else(|| env::var(CONFIG_ENV).ok())
            .filter(|p| !p.is_empty());
        match path {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.escape_timeout_ms == 0 {
            return Err(ConfigError::Zero {
                field: "escape_timeout_ms",
            });
        }
        if self.tick_interval_us == 0 {
            return Err(ConfigError::Zero {
                field: "tick_interval_us",
            });
        }
        if self.inline && self.inline_height == 0 {
            return Err(ConfigError::Zero {
                field: "inline_height",
            });
        }
        Ok(())
    }

    pub const fn background(&self) -> Rgb {
        let [r, g, b] = self.background;
        Rgb::new(r, g, b)
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            tick_interval: Duration::from_micros(self.tick_interval_us),
            render_mode: self.render_mode.into(),
            mouse: self.mouse,
            bracketed_paste: self.bracketed_paste,
            focus_reporting: self.focus_reporting,
            parser: ParserConfig {
                escape_timeout: Duration::from_millis(self.escape_timeout_ms),
                dsr_timeout: Duration::from_millis(self.dsr_timeout_ms),
            },
            click_timeout: Duration::from_millis(self.double_click_timeout_ms),
            background: Cell::new(' ', Rgb::WHITE, self.background()),
            inline_height: self.inline.then_some(self.inline_height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> Config {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(parse("{}"), Config::default());
    }

    #[test]
    fn partial_override() {
        let config = parse(r#"{ "render_mode": "painter", "mouse": false }"#);
        assert_eq!(config.render_mode, RenderModeName::Painter);
        assert!(!config.mouse);
        assert_eq!(config.escape_timeout_ms, 50);
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{ "colour": 1 }"#).is_err());
    }

    #[test]
    fn loop_config_carries_every_setting() {
        let config = parse(
            r#"{
                "escape_timeout_ms": 20,
                "dsr_timeout_ms": 300,
                "double_click_timeout_ms": 250,
                "tick_interval_us": 16667,
                "render_mode": "painter",
                "focus_reporting": false,
                "background": [1, 2, 3]
            }"#,
        );
        let lc = config.loop_config();
        assert_eq!(lc.tick_interval, Duration::from_micros(16667));
        assert_eq!(lc.render_mode, RenderMode::Painter);
        assert_eq!(lc.parser.escape_timeout, Duration::from_millis(20));
        assert_eq!(lc.parser.dsr_timeout, Duration::from_millis(300));
        assert_eq!(lc.click_timeout, Duration::from_millis(250));
        assert!(lc.mouse);
        assert!(!lc.focus_reporting);
        assert_eq!(lc.background.bg, Rgb::new(1, 2, 3));
        assert_eq!(lc.inline_height, None);
    }

    #[test]
    fn inline_rows_reach_loop_config() {
        let config = parse(r#"{ "inline": true, "inline_height": 6 }"#);
        assert_eq!(config.loop_config().inline_height, Some(6));
        let config = parse(r#"{ "inline_height": 6 }"#);
        assert_eq!(config.loop_config().inline_height, None);
    }

    #[test]
    fn inline_needs_rows() {
        let config = parse(r#"{ "inline": true, "inline_height": 0 }"#);
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "inline_height must be greater than zero");
        assert!(parse(r#"{ "inline_height": 0 }"#).validate().is_ok());
    }

    #[test]
    fn cli_argument_wins() {
        let dir = env::temp_dir().join(format!("grove-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("grove.json");
        fs::write(&path, r#"{ "tick_interval_us": 1000 }"#).unwrap();

        let config = Config::load([path.display().to_string()].into_iter()).unwrap();
        assert_eq!(config.tick_interval_us, 1000);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::from_file(Path::new("/nonexistent/grove.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().starts_with("cannot read /nonexistent/grove.json"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = env::temp_dir().join(format!("grove-zero-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("grove.json");
        fs::write(&path, r#"{ "escape_timeout_ms": 0 }"#).unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert_eq!(err.to_string(), "escape_timeout_ms must be greater than zero");
        fs::remove_dir_all(&dir).unwrap();
    }
}
