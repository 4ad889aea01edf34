// Copyright 2025 JiangLong.
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

//! Loader settings
//!
//! ```toml
//! schema_dir = "/deckhouse/candi"
//! kubeconfig = "/root/.kube/config"
//! context = "prod"
//!
//! [retry]
//! loud_attempts = 10
//! silent_attempts = 5
//! delay_secs = 5
//! policy = "uniform"
//! ```

use crate::domain::schema::SchemaStore;
use crate::infrastructure::constants::{
    FROM_CLUSTER_LOOP_NAME, IN_CLUSTER_LOOP_NAME, LOOP_DELAY_SECS, LOUD_LOOP_ATTEMPTS,
    SETTINGS_ENV, SILENT_LOOP_ATTEMPTS,
};
use crate::infrastructure::kubernetes::KubeSecretReader;
use crate::infrastructure::retry::{RetryLoop, RetryPolicy};
use crate::infrastructure::schema::DirectorySchemaSource;
use crate::shared::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Schema tree on disk; the built-in set is used when unset
    pub schema_dir: Option<String>,
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub loud_attempts: u32,
    pub silent_attempts: u32,
    pub delay_secs: u64,
    pub policy: RetryPolicy,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            loud_attempts: LOUD_LOOP_ATTEMPTS,
            silent_attempts: SILENT_LOOP_ATTEMPTS,
            delay_secs: LOOP_DELAY_SECS,
            policy: RetryPolicy::default(),
        }
    }
}

impl LoaderSettings {
    pub fn from<T: AsRef<str>>(path: T) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;

        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load from the file named by `METACONFIG_SETTINGS`, or fall back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_optional_path(std::env::var(SETTINGS_ENV).ok())
    }

    fn from_optional_path(path: Option<String>) -> Result<Self> {
        match path.filter(|p| !p.trim().is_empty()) {
            Some(path) => {
                info!(path = %path, "Loading loader settings");
                Self::from(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn schema_store(&self) -> Result<SchemaStore> {
        match &self.schema_dir {
            Some(dir) => SchemaStore::from_source(&DirectorySchemaSource::new(dir)),
            None => SchemaStore::new(),
        }
    }

    pub async fn secret_reader(&self) -> Result<KubeSecretReader> {
        if self.kubeconfig.is_some() || self.context.is_some() {
            KubeSecretReader::new_with_config(self.kubeconfig.clone(), self.context.clone()).await
        } else {
            KubeSecretReader::new().await
        }
    }

    pub fn loud_loop(&self) -> RetryLoop {
        RetryLoop::loud(FROM_CLUSTER_LOOP_NAME)
            .with_attempts(self.retry.loud_attempts)
            .with_delay(self.retry.delay())
            .with_policy(self.retry.policy)
    }

    pub fn silent_loop(&self) -> RetryLoop {
        RetryLoop::silent(IN_CLUSTER_LOOP_NAME)
            .with_attempts(self.retry.silent_attempts)
            .with_delay(self.retry.delay())
            .with_policy(self.retry.policy)
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}
