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

use crate::infrastructure::constants::{KIND_CLUSTER, KIND_INIT, KIND_STATIC, PROVIDER_KIND_SUFFIX};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Top-level fields of one document, values left as raw JSON.
pub type RawConfig = BTreeMap<String, JsonValue>;

/// A schema-valid document, tagged by the aggregate slot its kind belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigDocument {
    Init(RawConfig),
    Cluster(RawConfig),
    Static(RawConfig),
    Provider { kind: String, data: RawConfig },
    /// Accepted by a schema but owned by some other concern
    Unrecognized { kind: String, data: RawConfig },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Init,
    Cluster,
    Static,
    Provider,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::Init => "init",
            Slot::Cluster => "cluster",
            Slot::Static => "static",
            Slot::Provider => "provider",
        };
        f.write_str(name)
    }
}

impl ConfigDocument {
    /// Exact kinds win over the `ClusterConfiguration` suffix rule.
    pub fn from_kind(kind: &str, data: RawConfig) -> Self {
        match kind {
            KIND_INIT => Self::Init(data),
            KIND_CLUSTER => Self::Cluster(data),
            KIND_STATIC => Self::Static(data),
            k if k.ends_with(PROVIDER_KIND_SUFFIX) => Self::Provider {
                kind: k.to_string(),
                data,
            },
            k => Self::Unrecognized {
                kind: k.to_string(),
                data,
            },
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Init(_) => KIND_INIT,
            Self::Cluster(_) => KIND_CLUSTER,
            Self::Static(_) => KIND_STATIC,
            Self::Provider { kind, .. } | Self::Unrecognized { kind, .. } => kind,
        }
    }

    pub fn slot(&self) -> Option<Slot> {
        match self {
            Self::Init(_) => Some(Slot::Init),
            Self::Cluster(_) => Some(Slot::Cluster),
            Self::Static(_) => Some(Slot::Static),
            Self::Provider { .. } => Some(Slot::Provider),
            Self::Unrecognized { .. } => None,
        }
    }

    pub fn data(&self) -> &RawConfig {
        match self {
            Self::Init(data) | Self::Cluster(data) | Self::Static(data) => data,
            Self::Provider { data, .. } | Self::Unrecognized { data, .. } => data,
        }
    }
}
