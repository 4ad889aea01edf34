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

//! Classification and structural validation of configuration documents
//!
//! Every schema file declares a `kind` and one OpenAPI spec per `apiVersion`. Each
//! `(kind, apiVersion)` pair is compiled once into a JSON Schema validator; documents are
//! routed to a validator by their own `kind` and `apiVersion` fields.

use crate::domain::config::document::{ConfigDocument, RawConfig};
use crate::infrastructure::constants::{
    API_VERSION_V1, API_VERSION_V1ALPHA1, PROVIDER_SCHEMA_DIR, PROVIDER_SCHEMA_FILENAME_SUFFIX,
    SCHEMA_FILE_EXTENSION,
};
use crate::infrastructure::schema::{EmbeddedSchemaSource, SchemaSource};
use crate::shared::error::{ConfigError, Result, ValidationReport};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Which schema a document matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaIndex {
    pub kind: String,
    #[serde(rename = "apiVersion")]
    pub version: String,
}

impl SchemaIndex {
    pub fn new(kind: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for SchemaIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.kind, self.version)
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    kind: String,
    #[serde(rename = "apiVersions")]
    api_versions: Vec<SchemaVersion>,
}

#[derive(Debug, Deserialize)]
struct SchemaVersion {
    #[serde(rename = "apiVersion")]
    api_version: String,
    #[serde(rename = "openAPISpec")]
    open_api_spec: JsonValue,
}

/// Registry of compiled schemas. Read-only once built.
pub struct SchemaStore {
    cache: HashMap<SchemaIndex, jsonschema::Validator>,
}

impl fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaStore")
            .field("indexes", &self.indexes())
            .finish()
    }
}

impl SchemaStore {
    /// Build a store from the schema set compiled into the crate.
    pub fn new() -> Result<Self> {
        Self::from_source(&EmbeddedSchemaSource::new())
    }

    pub fn from_source(source: &dyn SchemaSource) -> Result<Self> {
        let mut cache = HashMap::new();

        for name in source.list_schemas()? {
            if !is_loadable_schema(&name) {
                debug!(schema = %name, "Skipping schema file");
                continue;
            }

            let content = source.load_schema(&name)?;
            let file: SchemaFile =
                serde_yaml::from_str(&content).map_err(|e| ConfigError::InvalidSchema {
                    name: name.clone(),
                    message: e.to_string(),
                })?;

            for version in file.api_versions {
                let compiled = jsonschema::validator_for(&version.open_api_spec).map_err(|e| {
                    ConfigError::InvalidSchema {
                        name: name.clone(),
                        message: format!("{} {}: {}", file.kind, version.api_version, e),
                    }
                })?;
                cache.insert(SchemaIndex::new(&file.kind, version.api_version), compiled);
            }
        }

        debug!(schemas = cache.len(), "Schema store loaded");
        Ok(Self { cache })
    }

    /// Registered indexes, sorted.
    pub fn indexes(&self) -> Vec<SchemaIndex> {
        let mut indexes: Vec<SchemaIndex> = self.cache.keys().cloned().collect();
        indexes.sort();
        indexes
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.cache.keys().any(|index| index.kind == kind)
    }

    /// Classify `document` and check it against the matching schema.
    pub fn validate(&self, document: &str) -> Result<SchemaIndex> {
        self.check(document).map(|(index, _)| index)
    }

    /// Like [`SchemaStore::validate`], additionally decoding the document into its typed slot.
    pub fn validate_document(&self, document: &str) -> Result<(SchemaIndex, ConfigDocument)> {
        let (index, value) = self.check(document)?;
        let data: RawConfig = serde_json::from_value(value)
            .map_err(|e| ConfigError::unmarshal(e.to_string()))?;
        let document = ConfigDocument::from_kind(&index.kind, data);
        Ok((index, document))
    }

    fn check(&self, document: &str) -> Result<(SchemaIndex, JsonValue)> {
        let value: JsonValue = serde_yaml::from_str(document)
            .map_err(|e| ConfigError::unmarshal(format!("schema index unmarshal failed: {}", e)))?;

        let index = read_index(&value)?;
        let validator = self.lookup(&index).ok_or_else(|| {
            ConfigError::unknown_kind(format!("schema for {} wasn't found", index))
        })?;

        if validator.is_valid(&value) {
            return Ok((index, value));
        }

        let diagnostics: Vec<String> = validator
            .iter_errors(&value)
            .map(|e| {
                let path = e.instance_path.to_string();
                let path = if path.is_empty() {
                    "(root)".to_string()
                } else {
                    path
                };
                format!("{}: {}", path, e)
            })
            .collect();

        Err(ConfigError::Validation(Box::new(ValidationReport {
            index: index.to_string(),
            diagnostics,
            document: None,
        })))
    }

    fn lookup(&self, index: &SchemaIndex) -> Option<&jsonschema::Validator> {
        self.cache.get(index).or_else(|| {
            // v1alpha1 documents are accepted by the v1 schema of the same kind
            if index.version == API_VERSION_V1ALPHA1 {
                self.cache.get(&SchemaIndex::new(&index.kind, API_VERSION_V1))
            } else {
                None
            }
        })
    }
}

fn read_index(value: &JsonValue) -> Result<SchemaIndex> {
    let kind = value.get("kind").and_then(JsonValue::as_str).unwrap_or_default();
    let version = value
        .get("apiVersion")
        .and_then(JsonValue::as_str)
        .unwrap_or_default();

    if kind.is_empty() || version.is_empty() {
        return Err(ConfigError::unknown_kind(format!(
            "document needs \"kind\" and \"apiVersion\" fields:\n\tapiVersion: {}\n\tkind: {}",
            version, kind
        )));
    }

    Ok(SchemaIndex::new(kind, version))
}

/// Top-level schemas are always loaded. Provider-scoped schemas are loaded only when the
/// file name marks them as a cluster configuration.
fn is_loadable_schema(name: &str) -> bool {
    if !name.ends_with(SCHEMA_FILE_EXTENSION) {
        return false;
    }

    match name.split_once('/') {
        None => true,
        Some((top, rest)) if top == PROVIDER_SCHEMA_DIR => {
            let file_name = rest.rsplit('/').next().unwrap_or(rest);
            file_name.ends_with(PROVIDER_SCHEMA_FILENAME_SUFFIX)
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::schema::MemorySchemaSource;

    const CLUSTER_DOC: &str = r#"
apiVersion: deckhouse.io/v1
kind: ClusterConfiguration
clusterType: Static
kubernetesVersion: "1.29"
podSubnetCIDR: 10.111.0.0/16
serviceSubnetCIDR: 10.222.0.0/16
"#;

    fn store() -> SchemaStore {
        SchemaStore::new().unwrap()
    }

    #[test]
    fn test_builtin_store_skips_non_configuration_provider_files() {
        let store = store();
        assert!(store.has_kind("ClusterConfiguration"));
        assert!(store.has_kind("InitConfiguration"));
        assert!(store.has_kind("StaticClusterConfiguration"));
        assert!(store.has_kind("AwsClusterConfiguration"));
        assert!(store.has_kind("OpenStackClusterConfiguration"));
        assert!(!store.has_kind("AwsCloudDiscoveryData"));
    }

    #[test]
    fn test_is_loadable_schema() {
        assert!(is_loadable_schema("cluster_configuration.yaml"));
        assert!(is_loadable_schema("anything.yaml"));
        assert!(is_loadable_schema(
            "cloud-providers/aws/aws_cluster_configuration.yaml"
        ));
        assert!(!is_loadable_schema("cloud-providers/aws/cloud_discovery_data.yaml"));
        assert!(!is_loadable_schema("other/x_configuration.yaml"));
        assert!(!is_loadable_schema("README.md"));
    }

    #[test]
    fn test_validate_returns_index() {
        let index = store().validate(CLUSTER_DOC).unwrap();
        assert_eq!(index, SchemaIndex::new("ClusterConfiguration", "deckhouse.io/v1"));
        assert_eq!(index.to_string(), "ClusterConfiguration, deckhouse.io/v1");
    }

    #[test]
    fn test_missing_kind_is_unknown() {
        let doc = "apiVersion: deckhouse.io/v1\nclusterType: Static\n";
        assert!(matches!(
            store().validate(doc),
            Err(ConfigError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_scalar_document_is_unknown() {
        assert!(matches!(
            store().validate("just a string"),
            Err(ConfigError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_unrecognized_kind_is_unknown() {
        let doc = "apiVersion: deckhouse.io/v1\nkind: MysteryConfiguration\n";
        let err = store().validate(doc).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind(_)));
        assert!(err.to_string().contains("MysteryConfiguration"));
    }

    #[test]
    fn test_invalid_yaml_is_unmarshal_error() {
        assert!(matches!(
            store().validate("kind: [unclosed"),
            Err(ConfigError::Unmarshal { .. })
        ));
    }

    #[test]
    fn test_structural_violation_reports_paths() {
        let doc = CLUSTER_DOC.replace("clusterType: Static", "clusterType: Hybrid");
        let err = store().validate(&doc).unwrap_err();
        match err {
            ConfigError::Validation(report) => {
                assert_eq!(report.index, "ClusterConfiguration, deckhouse.io/v1");
                assert!(report
                    .diagnostics
                    .iter()
                    .any(|d| d.starts_with("/clusterType")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_field_reported_at_root() {
        let doc = CLUSTER_DOC.replace("podSubnetCIDR: 10.111.0.0/16\n", "");
        match store().validate(&doc).unwrap_err() {
            ConfigError::Validation(report) => {
                assert!(report
                    .diagnostics
                    .iter()
                    .any(|d| d.starts_with("(root)") && d.contains("podSubnetCIDR")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_cloud_cluster_requires_cloud_section() {
        let doc = CLUSTER_DOC.replace("clusterType: Static", "clusterType: Cloud");
        assert!(matches!(
            store().validate(&doc),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_v1alpha1_falls_back_to_v1_schema() {
        let doc = CLUSTER_DOC.replace("deckhouse.io/v1", "deckhouse.io/v1alpha1");
        let index = store().validate(&doc).unwrap();
        assert_eq!(index.version, "deckhouse.io/v1alpha1");

        let other = CLUSTER_DOC.replace("deckhouse.io/v1", "deckhouse.io/v2");
        assert!(matches!(
            store().validate(&other),
            Err(ConfigError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_validate_document_classifies() {
        let (_, document) = store().validate_document(CLUSTER_DOC).unwrap();
        match document {
            ConfigDocument::Cluster(data) => {
                assert_eq!(data["clusterType"], JsonValue::from("Static"));
            }
            other => panic!("expected cluster document, got {:?}", other),
        }
    }

    #[test]
    fn test_from_source_rejects_malformed_schema() {
        let source = MemorySchemaSource::new().with_schema("broken.yaml", "kind: [");
        assert!(matches!(
            SchemaStore::from_source(&source),
            Err(ConfigError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_from_source_custom_kind() {
        let schema = r#"
kind: WidgetConfiguration
apiVersions:
- apiVersion: example.io/v1
  openAPISpec:
    type: object
    required: [size]
    properties:
      size:
        type: integer
"#;
        let source = MemorySchemaSource::new().with_schema("widget.yaml", schema);
        let store = SchemaStore::from_source(&source).unwrap();
        assert_eq!(
            store.indexes(),
            vec![SchemaIndex::new("WidgetConfiguration", "example.io/v1")]
        );

        let doc = "apiVersion: example.io/v1\nkind: WidgetConfiguration\nsize: 3\n";
        let (_, document) = store.validate_document(doc).unwrap();
        assert!(matches!(document, ConfigDocument::Unrecognized { .. }));

        let bad = "apiVersion: example.io/v1\nkind: WidgetConfiguration\nsize: big\n";
        assert!(matches!(store.validate(bad), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_store_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaStore>();
    }
}
