//! Trim options and TOML configuration
//!
//! Options can be built in code, deserialized from a `[trim]` table in a
//! TOML file, or both: the CLI loads the file first and then applies its
//! flags on top.

use crate::error::TrimError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which page axes are trimmed.
///
/// A pinned axis keeps the page's full extent regardless of what the
/// detector found on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPolicy {
    /// Trim left/right margins, keep the full height
    #[default]
    Horizontal,
    /// Trim top/bottom margins, keep the full width
    Vertical,
    /// Trim all four sides
    Both,
}

impl AxisPolicy {
    pub fn trims_horizontal(self) -> bool {
        matches!(self, AxisPolicy::Horizontal | AxisPolicy::Both)
    }

    pub fn trims_vertical(self) -> bool {
        matches!(self, AxisPolicy::Vertical | AxisPolicy::Both)
    }
}

/// How pages are scheduled for detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    /// Detection runs on `workers` threads; reconstruction stays sequential
    Parallel { workers: usize },
}

/// Parameters for one trim run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimOptions {
    /// Brightness leniency in [0, 1]; higher counts more pixels as background
    pub threshold: f64,
    /// Safety margin added around detected content, in points
    pub margin: f64,
    pub axis: AxisPolicy,
    /// Render resolution used for detection
    pub dpi: f64,
    /// Run detection on a worker pool
    pub parallel: bool,
    /// Worker threads for parallel detection
    pub workers: usize,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            margin: 10.0,
            axis: AxisPolicy::default(),
            dpi: 72.0,
            parallel: false,
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl TrimOptions {
    pub fn execution_mode(&self) -> ExecutionMode {
        if self.parallel {
            ExecutionMode::Parallel {
                workers: self.workers,
            }
        } else {
            ExecutionMode::Sequential
        }
    }

    /// Reject option values the detector cannot work with
    pub fn validate(&self) -> Result<(), TrimError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(TrimError::InvalidOption(format!(
                "threshold must be between 0 and 1, got {}",
                self.threshold
            )));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(TrimError::InvalidOption(format!(
                "margin must be a non-negative number of points, got {}",
                self.margin
            )));
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(TrimError::InvalidOption(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        if self.workers == 0 {
            return Err(TrimError::InvalidOption(
                "worker count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Contents of a trim configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrimConfig {
    #[serde(default)]
    pub trim: TrimOptions,
}

impl TrimConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// ```
    /// use pdftrim_core::config::{AxisPolicy, TrimConfig};
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = TrimConfig::from_str("[trim]\nmargin = 15\naxis = \"both\"")?;
    /// assert_eq!(config.trim.axis, AxisPolicy::Both);
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TrimOptions::default();
        assert_eq!(options.threshold, 0.1);
        assert_eq!(options.margin, 10.0);
        assert_eq!(options.axis, AxisPolicy::Horizontal);
        assert_eq!(options.dpi, 72.0);
        assert_eq!(options.execution_mode(), ExecutionMode::Sequential);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
            [trim]
            threshold = 0.25
            margin = 15
            axis = "vertical"
        "#;

        let config = TrimConfig::from_str(toml).unwrap();
        assert_eq!(config.trim.threshold, 0.25);
        assert_eq!(config.trim.margin, 15.0);
        assert_eq!(config.trim.axis, AxisPolicy::Vertical);
        assert_eq!(config.trim.dpi, 72.0);
    }

    #[test]
    fn test_parse_parallel_config() {
        let toml = r#"
            [trim]
            parallel = true
            workers = 3
        "#;

        let config = TrimConfig::from_str(toml).unwrap();
        assert_eq!(
            config.trim.execution_mode(),
            ExecutionMode::Parallel { workers: 3 }
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TrimConfig::from_str("").unwrap();
        assert_eq!(config.trim.margin, 10.0);
    }

    #[test]
    fn test_unknown_axis_rejected() {
        assert!(TrimConfig::from_str("[trim]\naxis = \"diagonal\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trim.toml");
        fs::write(&path, "[trim]\nmargin = 4.5\n").unwrap();
        let config = TrimConfig::from_file(&path).unwrap();
        assert_eq!(config.trim.margin, 4.5);
        assert!(TrimConfig::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let bad = [
            TrimOptions {
                threshold: 1.5,
                ..Default::default()
            },
            TrimOptions {
                margin: -1.0,
                ..Default::default()
            },
            TrimOptions {
                dpi: 0.0,
                ..Default::default()
            },
            TrimOptions {
                workers: 0,
                ..Default::default()
            },
        ];
        for options in bad {
            assert!(matches!(
                options.validate(),
                Err(TrimError::InvalidOption(_))
            ));
        }
    }

    #[test]
    fn test_axis_policy_flags() {
        assert!(AxisPolicy::Horizontal.trims_horizontal());
        assert!(!AxisPolicy::Horizontal.trims_vertical());
        assert!(AxisPolicy::Vertical.trims_vertical());
        assert!(!AxisPolicy::Vertical.trims_horizontal());
        assert!(AxisPolicy::Both.trims_horizontal() && AxisPolicy::Both.trims_vertical());
    }
}
