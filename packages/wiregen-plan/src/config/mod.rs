//! Planner configuration
//!
//! Preset-based defaults with per-field overrides, JSON round-trippable.
//! Configuration only tunes policy (which analyzers run, how the artifact is
//! rendered); it never changes the meaning of a descriptor.

use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, Result};

/// On/off switches for the whole-graph analyzers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerControl {
    #[serde(default = "default_true")]
    pub cycles: bool,
    #[serde(default = "default_true")]
    pub lifetimes: bool,
    #[serde(default = "default_true")]
    pub captive: bool,
    #[serde(default = "default_true")]
    pub collections: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AnalyzerControl {
    fn default() -> Self {
        Self {
            cycles: true,
            lifetimes: true,
            captive: true,
            collections: true,
        }
    }
}

impl AnalyzerControl {
    /// All analyzers enabled
    pub fn all() -> Self {
        Self::default()
    }

    /// Graph-shape checks only (cycles), no lifetime policy
    pub fn structural() -> Self {
        Self {
            cycles: true,
            lifetimes: false,
            captive: false,
            collections: false,
        }
    }
}

/// Artifact rendering options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    /// Render the generated-file header comment.
    #[serde(default = "default_true")]
    pub header: bool,
    /// Render the bootstrap startup hook.
    #[serde(default = "default_true")]
    pub startup_hook: bool,
    /// Also produce the JSON dependency-graph export.
    #[serde(default)]
    pub graph_export: bool,
    /// Indent unit for the emitted source.
    #[serde(default = "default_indent")]
    pub indent: String,
    /// Pin the export's generatedAt stamp (RFC 3339). Only for reproducible
    /// test output; `None` takes the wall clock.
    #[serde(default)]
    pub fixed_timestamp: Option<String>,
}

fn default_indent() -> String {
    "    ".to_string()
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            header: true,
            startup_hook: true,
            graph_export: false,
            indent: default_indent(),
            fixed_timestamp: None,
        }
    }
}

/// Top-level planner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub analyzers: AnalyzerControl,
    pub emit: EmitConfig,
    /// Refuse artifact generation on warnings too, not only errors.
    #[serde(default)]
    pub warnings_as_errors: bool,
}

impl PlannerConfig {
    /// Default policy: all analyzers, source artifact only.
    pub fn new() -> Self {
        Self::default()
    }

    /// CI-style policy: warnings block generation.
    pub fn strict() -> Self {
        Self {
            warnings_as_errors: true,
            ..Self::default()
        }
    }

    /// Default policy plus the JSON graph export.
    pub fn with_graph_export(mut self) -> Self {
        self.emit.graph_export = true;
        self
    }

    pub fn with_analyzers(mut self, analyzers: AnalyzerControl) -> Self {
        self.analyzers = analyzers;
        self
    }

    /// Parse from JSON, then validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PlanError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.emit.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(PlanError::config("indent must be spaces or tabs"));
        }
        if let Some(stamp) = &self.emit.fixed_timestamp {
            chrono::DateTime::parse_from_rfc3339(stamp)
                .map_err(|e| PlanError::config(format!("fixed_timestamp: {e}")))?;
        }
        Ok(())
    }
}
