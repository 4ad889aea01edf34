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

//! Where schema documents come from
//!
//! Names are relative, `/`-separated paths such as `cluster_configuration.yaml` or
//! `cloud-providers/aws/aws_cluster_configuration.yaml`.

use crate::shared::error::{ConfigError, Result};
use include_dir::{include_dir, Dir, DirEntry};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

static SCHEMAS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/assets/schemas");

pub trait SchemaSource: Send + Sync {
    /// List every schema name, sorted.
    fn list_schemas(&self) -> Result<Vec<String>>;

    fn load_schema(&self, name: &str) -> Result<String>;
}

/// Built-in schema set compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSchemaSource;

impl EmbeddedSchemaSource {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaSource for EmbeddedSchemaSource {
    fn list_schemas(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        collect_embedded(&SCHEMAS_DIR, &mut names);
        names.sort();
        Ok(names)
    }

    fn load_schema(&self, name: &str) -> Result<String> {
        SCHEMAS_DIR
            .get_file(name)
            .and_then(|file| file.contents_utf8())
            .map(|s| s.to_string())
            .ok_or_else(|| ConfigError::InvalidSchema {
                name: name.to_string(),
                message: "no such embedded schema".to_string(),
            })
    }
}

fn collect_embedded(dir: &'static Dir, names: &mut Vec<String>) {
    for entry in dir.entries() {
        match entry {
            DirEntry::File(file) => names.push(to_schema_name(file.path())),
            DirEntry::Dir(subdir) => collect_embedded(subdir, names),
        }
    }
}

/// Schemas read from a directory tree on disk.
#[derive(Debug, Clone)]
pub struct DirectorySchemaSource {
    root: PathBuf,
}

impl DirectorySchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collect(&self, dir: &Path, names: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.collect(&path, names)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                names.push(to_schema_name(relative));
            }
        }
        Ok(())
    }
}

impl SchemaSource for DirectorySchemaSource {
    fn list_schemas(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        self.collect(&self.root, &mut names)?;
        names.sort();
        Ok(names)
    }

    fn load_schema(&self, name: &str) -> Result<String> {
        let path = self.root.join(name);
        fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Schemas held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySchemaSource {
    schemas: BTreeMap<String, String>,
}

impl MemorySchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.schemas.insert(name.into(), content.into());
        self
    }
}

impl SchemaSource for MemorySchemaSource {
    fn list_schemas(&self) -> Result<Vec<String>> {
        Ok(self.schemas.keys().cloned().collect())
    }

    fn load_schema(&self, name: &str) -> Result<String> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::InvalidSchema {
                name: name.to_string(),
                message: "no such schema".to_string(),
            })
    }
}

fn to_schema_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_lists_builtin_schemas() {
        let names = EmbeddedSchemaSource::new().list_schemas().unwrap();
        assert!(names.contains(&"cluster_configuration.yaml".to_string()));
        assert!(names.contains(&"init_configuration.yaml".to_string()));
        assert!(names
            .iter()
            .any(|n| n.starts_with("cloud-providers/aws/")));

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_embedded_load_roundtrips_listing() {
        let source = EmbeddedSchemaSource::new();
        for name in source.list_schemas().unwrap() {
            let content = source.load_schema(&name).unwrap();
            assert!(!content.is_empty(), "{} is empty", name);
        }
        assert!(source.load_schema("missing.yaml").is_err());
    }

    #[test]
    fn test_directory_source_walks_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), "kind: A").unwrap();
        fs::create_dir_all(dir.path().join("cloud-providers/x")).unwrap();
        fs::write(
            dir.path().join("cloud-providers/x/x_cluster_configuration.yaml"),
            "kind: XClusterConfiguration",
        )
        .unwrap();

        let source = DirectorySchemaSource::new(dir.path());
        let names = source.list_schemas().unwrap();
        assert_eq!(
            names,
            vec![
                "a.yaml".to_string(),
                "cloud-providers/x/x_cluster_configuration.yaml".to_string()
            ]
        );
        assert_eq!(
            source
                .load_schema("cloud-providers/x/x_cluster_configuration.yaml")
                .unwrap(),
            "kind: XClusterConfiguration"
        );
        assert!(matches!(
            source.load_schema("nope.yaml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
