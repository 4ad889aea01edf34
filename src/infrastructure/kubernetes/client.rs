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

use crate::shared::error::ConfigError;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tracing::debug;

/// Read-only access to key-value records persisted in the control plane.
#[async_trait::async_trait]
pub trait ClusterSecretReader: Send + Sync {
    /// Return the raw bytes stored under `key` in secret `namespace/name`.
    ///
    /// A missing secret, a missing key and a transport failure all surface as
    /// [`ConfigError::RemoteFetch`].
    async fn get_secret_data(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<Vec<u8>, ConfigError>;
}

pub struct KubeSecretReader {
    client: Client,
}

impl KubeSecretReader {
    pub async fn new() -> Result<Self, ConfigError> {
        let client = Client::try_default().await?;

        Ok(Self { client })
    }

    pub async fn new_with_config(
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self, ConfigError> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path)
                .map_err(|e| ConfigError::Kube(format!("Failed to load kubeconfig: {}", e)))?
        } else {
            Kubeconfig::read()
                .map_err(|e| ConfigError::Kube(format!("Failed to load kubeconfig: {}", e)))?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                ConfigError::Kube(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config)?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ClusterSecretReader for KubeSecretReader {
    async fn get_secret_data(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<Vec<u8>, ConfigError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        debug!(namespace, name, key, "Reading secret");

        let secret = api.get(name).await.map_err(|e| {
            let reason = match e {
                kube::Error::Api(ae) if ae.code == 404 => "secret not found".to_string(),
                kube::Error::Api(ae) => ae.message,
                other => other.to_string(),
            };
            ConfigError::remote_fetch(namespace, name, key, reason)
        })?;

        secret_value(&secret, key)
            .ok_or_else(|| ConfigError::remote_fetch(namespace, name, key, "key not found"))
    }
}

/// Look up `key` in `data`, falling back to the write-only `stringData` map.
pub fn secret_value(secret: &Secret, key: &str) -> Option<Vec<u8>> {
    if let Some(value) = secret.data.as_ref().and_then(|data| data.get(key)) {
        return Some(value.0.clone());
    }

    secret
        .string_data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| value.as_bytes().to_vec())
}
