// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Reconciler configuration

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::poller::MAX_TIMEOUT;
use crate::state::Timeouts;

/// Default interval between status checks of a pending remote operation
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default deadline for create, update and delete (two hours)
const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 2 * 60 * 60;

/// Reconciler configuration loaded from defaults, environment variables or a
/// JSON file.
///
/// Per-resource [`Timeouts`] override the operation timeouts configured here.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Seconds between status checks of a pending operation
    pub poll_interval_secs: u64,
    /// Default deadline for create, in seconds
    pub create_timeout_secs: u64,
    /// Default deadline for update, in seconds
    pub update_timeout_secs: u64,
    /// Default deadline for delete, in seconds
    pub delete_timeout_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            create_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            update_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            delete_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables keep their defaults; set but unparseable variables are
    /// errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any name-to-value source shaped like the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            poll_interval_secs: env_secs(
                &lookup,
                "CLOUDACCESS_POLL_INTERVAL_SECS",
                defaults.poll_interval_secs,
            )?,
            create_timeout_secs: env_secs(
                &lookup,
                "CLOUDACCESS_CREATE_TIMEOUT_SECS",
                defaults.create_timeout_secs,
            )?,
            update_timeout_secs: env_secs(
                &lookup,
                "CLOUDACCESS_UPDATE_TIMEOUT_SECS",
                defaults.update_timeout_secs,
            )?,
            delete_timeout_secs: env_secs(
                &lookup,
                "CLOUDACCESS_DELETE_TIMEOUT_SECS",
                defaults.delete_timeout_secs,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the poller cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        for (name, value) in [
            ("create_timeout_secs", self.create_timeout_secs),
            ("update_timeout_secs", self.update_timeout_secs),
            ("delete_timeout_secs", self.delete_timeout_secs),
        ] {
            if value < self.poll_interval_secs {
                bail!(
                    "{} ({}) must not be shorter than poll_interval_secs ({})",
                    name,
                    value,
                    self.poll_interval_secs
                );
            }
            if value > MAX_TIMEOUT.as_secs() {
                bail!(
                    "{} ({}) must not exceed {} seconds",
                    name,
                    value,
                    MAX_TIMEOUT.as_secs()
                );
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn create_timeout(&self, overrides: &Timeouts) -> Duration {
        overrides
            .create
            .unwrap_or(Duration::from_secs(self.create_timeout_secs))
    }

    pub fn update_timeout(&self, overrides: &Timeouts) -> Duration {
        overrides
            .update
            .unwrap_or(Duration::from_secs(self.update_timeout_secs))
    }

    pub fn delete_timeout(&self, overrides: &Timeouts) -> Duration {
        overrides
            .delete
            .unwrap_or(Duration::from_secs(self.delete_timeout_secs))
    }
}

fn env_secs(lookup: impl Fn(&str) -> Option<String>, name: &str, default: u64) -> Result<u64> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, value)),
        None => Ok(default),
    }
}
