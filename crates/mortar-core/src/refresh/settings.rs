// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tunable thresholds for the stock staleness policies.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// An error raised while loading [`RefreshSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The RON text could not be parsed into settings.
    #[error("failed to parse refresh settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A version delta of zero would make every cache permanently fresh.
    #[error("min_version_delta must be at least 1")]
    ZeroVersionDelta,
}

/// Thresholds used by [`Refreshing::with_max_age`](super::Refreshing::with_max_age)
/// and [`Refreshing::tracking`](super::Refreshing::tracking).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Milliseconds after a refresh before a time-based cache goes stale.
    pub max_age_ms: u64,
    /// How far a version counter must advance before a tracking cache goes stale.
    pub min_version_delta: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            max_age_ms: 500,
            min_version_delta: 1,
        }
    }
}

impl RefreshSettings {
    /// Parses settings from RON text. Missing fields take their default value.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(text)?;
        if settings.min_version_delta == 0 {
            return Err(SettingsError::ZeroVersionDelta);
        }
        Ok(settings)
    }

    /// The time-based threshold as a [`Duration`].
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings = RefreshSettings::from_ron_str("(max_age_ms: 250)").unwrap();
        assert_eq!(settings.max_age(), Duration::from_millis(250));
        assert_eq!(settings.min_version_delta, 1);

        let settings = RefreshSettings::from_ron_str("(min_version_delta: 1)").unwrap();
        assert_eq!(settings, RefreshSettings::default());
    }

    #[test]
    fn zero_version_delta_is_rejected() {
        let result = RefreshSettings::from_ron_str("(min_version_delta: 0)");
        assert!(matches!(result, Err(SettingsError::ZeroVersionDelta)));
    }

    #[test]
    fn malformed_text_reports_a_parse_error() {
        let result = RefreshSettings::from_ron_str("(max_age_ms: \"soon\")");
        assert!(
            matches!(result, Err(SettingsError::Parse(_))),
            "Expected a parse error, got {result:?}"
        );
    }
}
