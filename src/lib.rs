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

// Core modules
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export commonly used types
pub use domain::cluster::{parse_config_from_cluster, parse_config_in_cluster, RemoteConfigFetcher};
pub use domain::config::{
    parse_config, parse_config_from_data, parse_config_from_data_with_store,
    parse_config_with_store, ClusterType, ConfigAssembler, ConfigDocument, LoaderSettings,
    MetaConfig,
};
pub use domain::schema::{SchemaIndex, SchemaStore};
pub use infrastructure::kubernetes::{ClusterSecretReader, KubeSecretReader};
pub use infrastructure::retry::{RetryLoop, RetryPolicy};
pub use infrastructure::schema::{DirectorySchemaSource, EmbeddedSchemaSource, SchemaSource};
pub use shared::{ConfigError, Result};
