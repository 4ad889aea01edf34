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

use crate::domain::config::document::{ConfigDocument, RawConfig, Slot};
use crate::domain::config::meta::{ClusterType, DeckhouseSettings, DerivedConfig, MetaConfig};
use crate::infrastructure::constants::{DEFAULT_CLUSTER_DOMAIN, PROVIDER_KIND_SUFFIX};
use crate::shared::error::{ConfigError, Result};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// Collects classified documents into slots, then seals them into a [`MetaConfig`].
#[derive(Debug, Default)]
pub struct ConfigAssembler {
    init: Option<RawConfig>,
    cluster: Option<RawConfig>,
    static_cluster: Option<RawConfig>,
    provider: Option<(String, RawConfig)>,
}

impl ConfigAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `document` in its slot. A later document for an occupied slot replaces the
    /// earlier one.
    pub fn route(&mut self, document: ConfigDocument) {
        if let Some(slot) = document.slot() {
            if self.is_occupied(slot) {
                warn!(
                    slot = %slot,
                    kind = document.kind(),
                    "Slot already filled, overwriting previous document"
                );
            }
        }

        match document {
            ConfigDocument::Init(data) => self.init = Some(data),
            ConfigDocument::Cluster(data) => self.cluster = Some(data),
            ConfigDocument::Static(data) => self.static_cluster = Some(data),
            ConfigDocument::Provider { kind, data } => self.provider = Some((kind, data)),
            ConfigDocument::Unrecognized { kind, .. } => {
                debug!(kind = %kind, "Ignoring document without a configuration slot");
            }
        }
    }

    pub fn is_occupied(&self, slot: Slot) -> bool {
        match slot {
            Slot::Init => self.init.is_some(),
            Slot::Cluster => self.cluster.is_some(),
            Slot::Static => self.static_cluster.is_some(),
            Slot::Provider => self.provider.is_some(),
        }
    }

    /// Check cross-slot consistency and compute derived values.
    pub fn finalize(self) -> Result<MetaConfig> {
        let mut derived = DerivedConfig {
            deckhouse: self.init.as_ref().map(DeckhouseSettings::from_init),
            ..Default::default()
        };

        match &self.cluster {
            None => {
                if let Some((kind, _)) = &self.provider {
                    return Err(ConfigError::prepare(format!(
                        "{} requires a ClusterConfiguration with clusterType Cloud",
                        kind
                    )));
                }
            }
            Some(cluster) => {
                let cluster_type: ClusterType = string_at(cluster, &["clusterType"])
                    .ok_or_else(|| {
                        ConfigError::prepare(
                            "unable to read clusterType from cluster configuration",
                        )
                    })?
                    .parse()?;

                derived.cluster_type = Some(cluster_type);
                derived.pod_subnet_cidr =
                    string_at(cluster, &["podSubnetCIDR"]).map(str::to_string);
                derived.service_subnet_cidr =
                    string_at(cluster, &["serviceSubnetCIDR"]).map(str::to_string);
                derived.kubernetes_version =
                    string_at(cluster, &["kubernetesVersion"]).map(str::to_string);
                derived.cluster_domain = Some(
                    string_at(cluster, &["clusterDomain"])
                        .unwrap_or(DEFAULT_CLUSTER_DOMAIN)
                        .to_string(),
                );

                match cluster_type {
                    ClusterType::Static => {
                        if let Some((kind, _)) = &self.provider {
                            return Err(ConfigError::prepare(format!(
                                "{} is only allowed when clusterType is Cloud, got Static",
                                kind
                            )));
                        }
                    }
                    ClusterType::Cloud => self.prepare_cloud(cluster, &mut derived)?,
                }
            }
        }

        let (provider_kind, provider) = match self.provider {
            Some((kind, data)) => (Some(kind), Some(data)),
            None => (None, None),
        };

        Ok(MetaConfig {
            init: self.init,
            cluster: self.cluster,
            static_cluster: self.static_cluster,
            provider,
            provider_kind,
            derived,
        })
    }

    fn prepare_cloud(&self, cluster: &RawConfig, derived: &mut DerivedConfig) -> Result<()> {
        if self.static_cluster.is_some() {
            return Err(ConfigError::prepare(
                "StaticClusterConfiguration is not allowed when clusterType is Cloud",
            ));
        }

        let (kind, provider) = self.provider.as_ref().ok_or_else(|| {
            ConfigError::prepare(
                "clusterType is Cloud but no provider cluster configuration was supplied",
            )
        })?;

        let cloud_provider = string_at(cluster, &["cloud", "provider"]).ok_or_else(|| {
            ConfigError::prepare("unable to read cloud.provider from cluster configuration")
        })?;

        let kind_provider = kind.strip_suffix(PROVIDER_KIND_SUFFIX).unwrap_or(kind);
        if !kind_provider.eq_ignore_ascii_case(cloud_provider) {
            return Err(ConfigError::prepare(format!(
                "cloud.provider is {} but provider configuration kind is {}",
                cloud_provider, kind
            )));
        }

        derived.provider_name = Some(cloud_provider.to_lowercase());
        derived.cluster_prefix = string_at(cluster, &["cloud", "prefix"]).map(str::to_string);
        derived.layout = string_at(provider, &["layout"])
            .map(|layout| layout.to_lowercase().replace('-', "_"));
        derived.master_replicas = value_at(provider, &["masterNodeGroup", "replicas"])
            .and_then(JsonValue::as_u64);

        Ok(())
    }
}

fn value_at<'a>(config: &'a RawConfig, path: &[&str]) -> Option<&'a JsonValue> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(config.get(*first)?, |value, key| value.get(*key))
}

fn string_at<'a>(config: &'a RawConfig, path: &[&str]) -> Option<&'a str> {
    value_at(config, path).and_then(JsonValue::as_str)
}
