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

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Loading config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown configuration kind: {0}")]
    UnknownKind(String),

    #[error("Config validation: {0}")]
    Validation(Box<ValidationReport>),

    #[error("Config unmarshal: {message}{}", dump_suffix(.document))]
    Unmarshal {
        message: String,
        document: Option<String>,
    },

    #[error("Prepare config: {0}")]
    Prepare(String),

    #[error("Failed to fetch secret '{name}' key '{key}' in namespace '{namespace}': {reason}")]
    RemoteFetch {
        namespace: String,
        name: String,
        key: String,
        reason: String,
    },

    #[error("{name}: giving up after {attempts} attempts: {source}")]
    RetryExhausted {
        name: String,
        attempts: u32,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("{0}: cancelled")]
    Cancelled(String),

    #[error("{name}: deadline of {deadline:?} exceeded")]
    DeadlineExceeded { name: String, deadline: Duration },

    #[error("Invalid schema '{name}': {message}")]
    InvalidSchema { name: String, message: String },

    #[error("Kubernetes API error: {0}")]
    Kube(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl From<kube::Error> for ConfigError {
    fn from(err: kube::Error) -> Self {
        ConfigError::Kube(err.to_string())
    }
}

/// Structural schema violations found in one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// `kind, apiVersion` of the schema the document was checked against
    pub index: String,
    /// One `path: message` entry per violation
    pub diagnostics: Vec<String>,
    /// Line-numbered document text, attached on the text path
    pub document: Option<String>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document does not match schema for {}:", self.index)?;
        for diagnostic in &self.diagnostics {
            write!(f, "\n\t{}", diagnostic)?;
        }
        f.write_str(&dump_suffix(&self.document))
    }
}

fn dump_suffix(document: &Option<String>) -> String {
    match document {
        Some(doc) => format!("\ndata: \n{}", doc),
        None => String::new(),
    }
}

impl ConfigError {
    pub fn prepare(context: impl Into<String>) -> Self {
        Self::Prepare(context.into())
    }

    pub fn unknown_kind(context: impl Into<String>) -> Self {
        Self::UnknownKind(context.into())
    }

    pub fn unmarshal(message: impl Into<String>) -> Self {
        Self::Unmarshal {
            message: message.into(),
            document: None,
        }
    }

    pub fn remote_fetch(
        namespace: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::RemoteFetch {
            namespace: namespace.into(),
            name: name.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Attach a line-numbered copy of the offending document to classification,
    /// validation and unmarshal errors. Other variants are returned untouched.
    pub fn with_document(self, numbered: String) -> Self {
        match self {
            Self::UnknownKind(message) => {
                Self::UnknownKind(format!("{}{}", message, dump_suffix(&Some(numbered))))
            }
            Self::Validation(mut report) => {
                report.document = Some(numbered);
                Self::Validation(report)
            }
            Self::Unmarshal { message, .. } => Self::Unmarshal {
                message,
                document: Some(numbered),
            },
            other => other,
        }
    }

    /// Whether a retry loop may reasonably expect a different outcome on the next attempt.
    ///
    /// Only control-plane and IO failures qualify. Schema, decode and assembly errors are
    /// deterministic for a given record.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RemoteFetch { .. } | Self::Kube(_) | Self::Io(_)
        )
    }
}
