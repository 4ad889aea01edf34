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

/// Persisted configuration records
pub const CONFIG_NAMESPACE: &str = "kube-system";
pub const CLUSTER_CONFIG_SECRET: &str = "d8-cluster-configuration";
pub const CLUSTER_CONFIG_KEY: &str = "cluster-configuration.yaml";
pub const PROVIDER_CONFIG_SECRET: &str = "d8-provider-cluster-configuration";
pub const PROVIDER_CONFIG_KEY: &str = "cloud-provider-cluster-configuration.yaml";

/// Document kinds
pub const KIND_INIT: &str = "InitConfiguration";
pub const KIND_CLUSTER: &str = "ClusterConfiguration";
pub const KIND_STATIC: &str = "StaticClusterConfiguration";
pub const PROVIDER_KIND_SUFFIX: &str = "ClusterConfiguration";

/// Cluster types
pub const CLOUD_CLUSTER_TYPE: &str = "Cloud";
pub const STATIC_CLUSTER_TYPE: &str = "Static";

/// Schema layout
pub const PROVIDER_SCHEMA_DIR: &str = "cloud-providers";
pub const PROVIDER_SCHEMA_FILENAME_SUFFIX: &str = "_configuration.yaml";
pub const SCHEMA_FILE_EXTENSION: &str = ".yaml";
pub const API_VERSION_V1: &str = "deckhouse.io/v1";
pub const API_VERSION_V1ALPHA1: &str = "deckhouse.io/v1alpha1";

/// Document separator
pub const DOCUMENT_SEPARATOR: &str = "---";

/// Retry loops
pub const LOUD_LOOP_ATTEMPTS: u32 = 10;
pub const SILENT_LOOP_ATTEMPTS: u32 = 5;
pub const LOOP_DELAY_SECS: u64 = 5;
pub const FROM_CLUSTER_LOOP_NAME: &str = "Get Cluster configuration from Kubernetes cluster";
pub const IN_CLUSTER_LOOP_NAME: &str = "Get Cluster configuration from inside Kubernetes cluster";

/// Finalization defaults
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";
pub const DEFAULT_IMAGES_REPO: &str = "registry.deckhouse.io/deckhouse/ce";
pub const DEFAULT_REGISTRY_SCHEME: &str = "HTTPS";
pub const DEFAULT_BUNDLE: &str = "Default";
pub const DEFAULT_LOG_LEVEL: &str = "Info";

/// Settings file override
pub const SETTINGS_ENV: &str = "METACONFIG_SETTINGS";
