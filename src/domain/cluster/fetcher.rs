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

//! Remote path: configuration persisted in the cluster's control plane

use crate::domain::config::assembler::ConfigAssembler;
use crate::domain::config::document::{ConfigDocument, Slot};
use crate::domain::config::meta::MetaConfig;
use crate::domain::schema::SchemaStore;
use crate::infrastructure::constants::{
    CLOUD_CLUSTER_TYPE, CLUSTER_CONFIG_KEY, CLUSTER_CONFIG_SECRET, CONFIG_NAMESPACE,
    FROM_CLUSTER_LOOP_NAME, IN_CLUSTER_LOOP_NAME, PROVIDER_CONFIG_KEY, PROVIDER_CONFIG_SECRET,
};
use crate::infrastructure::kubernetes::ClusterSecretReader;
use crate::infrastructure::retry::RetryLoop;
use crate::shared::error::{ConfigError, Result};
use serde_json::Value as JsonValue;
use tracing::debug;

pub struct RemoteConfigFetcher<'a> {
    reader: &'a dyn ClusterSecretReader,
    store: &'a SchemaStore,
}

impl<'a> RemoteConfigFetcher<'a> {
    pub fn new(reader: &'a dyn ClusterSecretReader, store: &'a SchemaStore) -> Self {
        Self { reader, store }
    }

    /// One attempt: the cluster record, then the provider record when the cluster is Cloud.
    pub async fn fetch_once(&self) -> Result<MetaConfig> {
        let mut assembler = ConfigAssembler::new();

        let cluster =
            self.read_document(CLUSTER_CONFIG_SECRET, CLUSTER_CONFIG_KEY, Slot::Cluster).await?;
        let is_cloud = cluster.data().get("clusterType").and_then(JsonValue::as_str)
            == Some(CLOUD_CLUSTER_TYPE);
        assembler.route(cluster);

        if is_cloud {
            let provider = self
                .read_document(PROVIDER_CONFIG_SECRET, PROVIDER_CONFIG_KEY, Slot::Provider)
                .await?;
            assembler.route(provider);
        }

        assembler.finalize()
    }

    /// Run [`RemoteConfigFetcher::fetch_once`] under a caller-built loop.
    pub async fn fetch_with(&self, retry: &RetryLoop) -> Result<MetaConfig> {
        retry.run(|| self.fetch_once()).await
    }

    async fn read_document(&self, name: &str, key: &str, expected: Slot) -> Result<ConfigDocument> {
        let bytes = self.reader.get_secret_data(CONFIG_NAMESPACE, name, key).await?;
        debug!(secret = name, key, bytes = bytes.len(), "Read configuration record");

        let text = String::from_utf8(bytes).map_err(|e| {
            ConfigError::unmarshal(format!(
                "{}/{} key {} is not UTF-8: {}",
                CONFIG_NAMESPACE, name, key, e
            ))
        })?;

        let (_, document) = self.store.validate_document(&text)?;
        if document.slot() != Some(expected) {
            return Err(ConfigError::prepare(format!(
                "{}/{} holds {} but a {} configuration was expected",
                CONFIG_NAMESPACE,
                name,
                document.kind(),
                expected
            )));
        }

        Ok(document)
    }
}

/// Fetch from outside the cluster: loud loop, 10 attempts 5 seconds apart.
pub async fn parse_config_from_cluster(
    reader: &dyn ClusterSecretReader,
    store: &SchemaStore,
) -> Result<MetaConfig> {
    RemoteConfigFetcher::new(reader, store)
        .fetch_with(&RetryLoop::loud(FROM_CLUSTER_LOOP_NAME))
        .await
}

/// Fetch from a pod inside the cluster: silent loop, 5 attempts 5 seconds apart.
pub async fn parse_config_in_cluster(
    reader: &dyn ClusterSecretReader,
    store: &SchemaStore,
) -> Result<MetaConfig> {
    RemoteConfigFetcher::new(reader, store)
        .fetch_with(&RetryLoop::silent(IN_CLUSTER_LOOP_NAME))
        .await
}
