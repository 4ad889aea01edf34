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

//! Configuration domain

pub mod assembler;
pub mod document;
pub mod meta;
pub mod parser;
pub mod settings;
pub mod splitter;

pub use self::assembler::ConfigAssembler;
pub use self::document::{ConfigDocument, RawConfig, Slot};
pub use self::meta::{ClusterType, DeckhouseSettings, DerivedConfig, MetaConfig};
pub use self::parser::{
    parse_config, parse_config_from_data, parse_config_from_data_with_store,
    parse_config_with_store,
};
pub use self::settings::{LoaderSettings, RetrySettings};
pub use self::splitter::{numerate_manifest_lines, split_documents};
