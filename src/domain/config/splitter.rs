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

//! Multi-document text splitting
//!
//! A boundary is a line whose trimmed content is exactly `---`. Anything else, including
//! a marker embedded in a value or followed by other text, stays part of the document.

use crate::infrastructure::constants::DOCUMENT_SEPARATOR;

#[derive(Debug, Clone, Copy)]
enum ScanState {
    /// No content since the last boundary
    Idle,
    /// Inside a document that began at this byte offset
    Collecting { start: usize },
}

/// Split `text` into trimmed, non-empty documents, in order.
pub fn split_documents(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut documents = Vec::new();
    let mut state = ScanState::Idle;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let is_separator = line.trim() == DOCUMENT_SEPARATOR;

        state = match (state, is_separator) {
            (ScanState::Collecting { start }, true) => {
                push_document(&text[start..offset], &mut documents);
                ScanState::Idle
            }
            (ScanState::Idle, true) => ScanState::Idle,
            (ScanState::Idle, false) if line.trim().is_empty() => ScanState::Idle,
            (ScanState::Idle, false) => ScanState::Collecting { start: offset },
            (collecting @ ScanState::Collecting { .. }, false) => collecting,
        };

        offset += line.len();
    }

    if let ScanState::Collecting { start } = state {
        push_document(&text[start..], &mut documents);
    }

    documents
}

fn push_document<'a>(fragment: &'a str, documents: &mut Vec<&'a str>) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        documents.push(fragment);
    }
}

/// Prefix every line with its 1-based number and a tab.
pub fn numerate_manifest_lines(manifest: &str) -> String {
    manifest
        .split('\n')
        .enumerate()
        .map(|(index, line)| format!("{}\t{}\n", index + 1, line))
        .collect()
}
