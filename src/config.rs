// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Repair configuration

use crate::split::Splitter;
use crate::utils::DEFAULT_TOLERANCE;
use crate::weld::{CandidateEdges, Welder};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "meshmend.toml";

/// Settings for the weld and split passes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    pub weld: WeldConfig,
    pub split: SplitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeldConfig {
    pub absolute_tolerance: f64,
    pub relative_tolerance: f64,
    /// Merge any coincident edges, not only open ones
    pub merge_any: bool,
    /// Merge only edges carrying the flag instead of open ones
    pub weld_flagged_edges: bool,
    /// Color faces by connected region
    pub mark_regions: bool,
}

impl Default for WeldConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: DEFAULT_TOLERANCE,
            relative_tolerance: DEFAULT_TOLERANCE,
            merge_any: false,
            weld_flagged_edges: false,
            mark_regions: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub absolute_tolerance: f64,
    pub relative_tolerance: f64,
    /// Add red marker cylinders along intersections
    pub mark_intersections: bool,
    /// Flag edges found crossing a face
    pub flag_new_edges: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: DEFAULT_TOLERANCE,
            relative_tolerance: DEFAULT_TOLERANCE,
            mark_intersections: false,
            flag_new_edges: false,
        }
    }
}

impl RepairConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: RepairConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `meshmend.toml` from the working directory if present, then
    /// apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override tolerances and `merge_any` from `MESHMEND_*` variables.
    /// Tolerance overrides apply to both passes.
    pub fn apply_env_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var("MESHMEND_ABS_TOLERANCE") {
            let tolerance: f64 = value
                .parse()
                .with_context(|| format!("Invalid MESHMEND_ABS_TOLERANCE: {value}"))?;
            self.weld.absolute_tolerance = tolerance;
            self.split.absolute_tolerance = tolerance;
        }

        if let Some(value) = var("MESHMEND_REL_TOLERANCE") {
            let tolerance: f64 = value
                .parse()
                .with_context(|| format!("Invalid MESHMEND_REL_TOLERANCE: {value}"))?;
            self.weld.relative_tolerance = tolerance;
            self.split.relative_tolerance = tolerance;
        }

        if let Some(value) = var("MESHMEND_MERGE_ANY") {
            self.weld.merge_any = value
                .parse()
                .with_context(|| format!("Invalid MESHMEND_MERGE_ANY: {value}"))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn welder(&self) -> Welder {
        let mut welder = Welder::new();
        welder.set_absolute_tolerance(self.weld.absolute_tolerance);
        welder.set_relative_tolerance(self.weld.relative_tolerance);
        welder.set_merge_any(self.weld.merge_any);
        welder.set_mark_regions(self.weld.mark_regions);
        welder.set_candidate_edges(if self.weld.weld_flagged_edges {
            CandidateEdges::Flagged
        } else {
            CandidateEdges::Perimeter
        });
        welder
    }

    pub fn splitter(&self) -> Splitter {
        let mut splitter = Splitter::new();
        splitter.set_absolute_tolerance(self.split.absolute_tolerance);
        splitter.set_relative_tolerance(self.split.relative_tolerance);
        splitter.set_mark_intersections(self.split.mark_intersections);
        splitter.set_flag_intersected_edges(self.split.flag_new_edges);
        splitter
    }
}
