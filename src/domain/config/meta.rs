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

//! The finished configuration aggregate handed to installer stages

use crate::domain::config::document::RawConfig;
use crate::infrastructure::constants::{
    CLOUD_CLUSTER_TYPE, DEFAULT_BUNDLE, DEFAULT_IMAGES_REPO, DEFAULT_LOG_LEVEL,
    DEFAULT_REGISTRY_SCHEME, STATIC_CLUSTER_TYPE,
};
use crate::shared::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Aggregate
// ============================================================================

/// Validated, finalized configuration. Produced only by
/// [`ConfigAssembler::finalize`](crate::domain::config::ConfigAssembler::finalize).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) init: Option<RawConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) cluster: Option<RawConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) static_cluster: Option<RawConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) provider: Option<RawConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) provider_kind: Option<String>,
    pub(crate) derived: DerivedConfig,
}

impl MetaConfig {
    pub fn init(&self) -> Option<&RawConfig> {
        self.init.as_ref()
    }

    pub fn cluster(&self) -> Option<&RawConfig> {
        self.cluster.as_ref()
    }

    pub fn static_cluster(&self) -> Option<&RawConfig> {
        self.static_cluster.as_ref()
    }

    pub fn provider(&self) -> Option<&RawConfig> {
        self.provider.as_ref()
    }

    /// Kind of the document held in the provider slot, e.g. `AwsClusterConfiguration`
    pub fn provider_kind(&self) -> Option<&str> {
        self.provider_kind.as_deref()
    }

    pub fn derived(&self) -> &DerivedConfig {
        &self.derived
    }

    pub fn cluster_type(&self) -> Option<ClusterType> {
        self.derived.cluster_type
    }

    pub fn is_cloud(&self) -> bool {
        self.derived.cluster_type == Some(ClusterType::Cloud)
    }
}

// ============================================================================
// Cluster type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterType {
    Cloud,
    Static,
}

impl FromStr for ClusterType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            CLOUD_CLUSTER_TYPE => Ok(Self::Cloud),
            STATIC_CLUSTER_TYPE => Ok(Self::Static),
            other => Err(ConfigError::prepare(format!(
                "unsupported clusterType '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloud => f.write_str(CLOUD_CLUSTER_TYPE),
            Self::Static => f.write_str(STATIC_CLUSTER_TYPE),
        }
    }
}

// ============================================================================
// Derived values
// ============================================================================

/// Values computed across slots during finalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedConfig {
    pub cluster_type: Option<ClusterType>,
    pub provider_name: Option<String>,
    pub cluster_prefix: Option<String>,
    pub layout: Option<String>,
    pub master_replicas: Option<u64>,
    pub pod_subnet_cidr: Option<String>,
    pub service_subnet_cidr: Option<String>,
    pub cluster_domain: Option<String>,
    pub kubernetes_version: Option<String>,
    pub deckhouse: Option<DeckhouseSettings>,
}

/// Bootstrap settings from the `deckhouse` section of `InitConfiguration`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckhouseSettings {
    pub images_repo: String,
    pub registry_address: String,
    pub registry_path: String,
    pub registry_scheme: String,
    pub bundle: String,
    pub log_level: String,
    pub release_channel: Option<String>,
    pub dev_branch: Option<String>,
}

impl DeckhouseSettings {
    pub fn from_init(init: &RawConfig) -> Self {
        let section = init.get("deckhouse");
        let field = |name: &str| {
            section
                .and_then(|s| s.get(name))
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        };

        let images_repo = field("imagesRepo")
            .map(|repo| repo.trim().trim_end_matches('/').to_string())
            .filter(|repo| !repo.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGES_REPO.to_string());
        let (registry_address, registry_path) = split_images_repo(&images_repo);

        Self {
            registry_address,
            registry_path,
            images_repo,
            registry_scheme: field("registryScheme")
                .unwrap_or_else(|| DEFAULT_REGISTRY_SCHEME.to_string()),
            bundle: field("bundle").unwrap_or_else(|| DEFAULT_BUNDLE.to_string()),
            log_level: field("logLevel").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            release_channel: field("releaseChannel"),
            dev_branch: field("devBranch"),
        }
    }
}

/// `registry.example.com/deckhouse/ce` -> (`registry.example.com`, `/deckhouse/ce`)
fn split_images_repo(images_repo: &str) -> (String, String) {
    match images_repo.split_once('/') {
        Some((address, path)) => (address.to_string(), format!("/{}", path)),
        None => (images_repo.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn init_with(deckhouse: JsonValue) -> RawConfig {
        let mut init = RawConfig::new();
        init.insert("deckhouse".to_string(), deckhouse);
        init
    }

    #[test]
    fn test_cluster_type_parse() {
        assert_eq!("Cloud".parse::<ClusterType>().unwrap(), ClusterType::Cloud);
        assert_eq!("Static".parse::<ClusterType>().unwrap(), ClusterType::Static);
        assert!(matches!(
            "cloud".parse::<ClusterType>(),
            Err(ConfigError::Prepare(_))
        ));
    }

    #[test]
    fn test_deckhouse_defaults() {
        let settings = DeckhouseSettings::from_init(&init_with(json!({})));
        assert_eq!(settings.images_repo, "registry.deckhouse.io/deckhouse/ce");
        assert_eq!(settings.registry_address, "registry.deckhouse.io");
        assert_eq!(settings.registry_path, "/deckhouse/ce");
        assert_eq!(settings.registry_scheme, "HTTPS");
        assert_eq!(settings.bundle, "Default");
        assert_eq!(settings.log_level, "Info");
        assert_eq!(settings.release_channel, None);
    }

    #[test]
    fn test_deckhouse_explicit_values() {
        let settings = DeckhouseSettings::from_init(&init_with(json!({
            "imagesRepo": "registry.example.com/mirror/deckhouse/",
            "bundle": "Minimal",
            "logLevel": "Debug",
            "registryScheme": "HTTP",
            "releaseChannel": "Stable"
        })));
        assert_eq!(settings.images_repo, "registry.example.com/mirror/deckhouse");
        assert_eq!(settings.registry_address, "registry.example.com");
        assert_eq!(settings.registry_path, "/mirror/deckhouse");
        assert_eq!(settings.bundle, "Minimal");
        assert_eq!(settings.log_level, "Debug");
        assert_eq!(settings.registry_scheme, "HTTP");
        assert_eq!(settings.release_channel.as_deref(), Some("Stable"));
    }

    #[test]
    fn test_split_images_repo_without_path() {
        assert_eq!(
            split_images_repo("localhost:5000"),
            ("localhost:5000".to_string(), String::new())
        );
    }
}
