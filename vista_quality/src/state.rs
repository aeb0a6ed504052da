use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::level::DegradationLevel;

/// One-shot markers recording which degradation branch has already run for
/// the current model. A set flag is never re-applied, which keeps the
/// expensive geometry/material mutations from repeating on every tick.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationFlag {
    Large,
    Critical,
    HighMemory,
    Emergency,
    SmallScreen,
}

/// The controller's whole mutable state: one instance per loaded model,
/// reset on unload/replace, touched by nothing but the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationState {
    pub level: DegradationLevel,
    pub applied_flags: BTreeSet<OptimizationFlag>,
    pub aggressive_enabled: bool,
}

impl Default for OptimizationState {
    fn default() -> Self {
        OptimizationState {
            level: DegradationLevel::None,
            applied_flags: BTreeSet::new(),
            aggressive_enabled: true,
        }
    }
}

impl OptimizationState {
    pub fn has_flag(&self, flag: OptimizationFlag) -> bool {
        self.applied_flags.contains(&flag)
    }

    /// Levels only move forward; a lower target is ignored.
    pub fn advance_level(&mut self, target: DegradationLevel) {
        if target > self.level {
            self.level = target;
        }
    }

    /// Back to pristine, keeping the aggressive-mode preference.
    pub fn reset(&mut self) {
        self.level = DegradationLevel::None;
        self.applied_flags.clear();
    }
}
