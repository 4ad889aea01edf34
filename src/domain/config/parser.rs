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

//! Text path: file or string -> documents -> validated aggregate

use crate::domain::config::assembler::ConfigAssembler;
use crate::domain::config::meta::MetaConfig;
use crate::domain::config::splitter::{numerate_manifest_lines, split_documents};
use crate::domain::schema::SchemaStore;
use crate::shared::error::{ConfigError, Result};
use std::fs::read_to_string;
use std::path::Path;
use tracing::debug;

/// Load and parse a configuration file using the built-in schemas.
pub fn parse_config<P: AsRef<Path>>(path: P) -> Result<MetaConfig> {
    let store = SchemaStore::new()?;
    parse_config_with_store(path, &store)
}

pub fn parse_config_with_store<P: AsRef<Path>>(path: P, store: &SchemaStore) -> Result<MetaConfig> {
    let path = path.as_ref();
    let content = read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    parse_config_from_data_with_store(&content, store)
}

/// Parse multi-document configuration text using the built-in schemas.
pub fn parse_config_from_data(data: &str) -> Result<MetaConfig> {
    let store = SchemaStore::new()?;
    parse_config_from_data_with_store(data, &store)
}

/// Errors carry a line-numbered copy of the failing document.
pub fn parse_config_from_data_with_store(data: &str, store: &SchemaStore) -> Result<MetaConfig> {
    let mut assembler = ConfigAssembler::new();

    for doc in split_documents(data) {
        let (index, document) = store
            .validate_document(doc)
            .map_err(|e| e.with_document(numerate_manifest_lines(doc)))?;

        debug!(index = %index, "Configuration document accepted");
        assembler.route(document);
    }

    assembler.finalize()
}
