// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! In-memory document store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{DocumentStore, Revision, StoredDocument, WriteOutcome};
use crate::errors::JetflowResult;

/// Process-local [`DocumentStore`]; revisions are a per-document counter
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, (Vec<u8>, u64)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of a document
    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.documents
            .read()
            .await
            .get(key)
            .map(|(bytes, _)| bytes.clone())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, key: &str) -> JetflowResult<Option<StoredDocument>> {
        Ok(self
            .documents
            .read()
            .await
            .get(key)
            .map(|(bytes, counter)| StoredDocument {
                bytes: bytes.clone(),
                revision: Revision::new(counter.to_string()),
            }))
    }

    async fn write(
        &self,
        key: &str,
        bytes: Vec<u8>,
        expected: Option<&Revision>,
    ) -> JetflowResult<WriteOutcome> {
        let mut documents = self.documents.write().await;

        let current = documents.get(key).map(|(_, counter)| *counter);
        let matches = match (current, expected) {
            (None, None) => true,
            (Some(counter), Some(expected)) => counter.to_string() == expected.as_str(),
            _ => false,
        };

        if !matches {
            return Ok(WriteOutcome::Conflict);
        }

        let next = current.map_or(1, |c| c + 1);
        documents.insert(key.to_string(), (bytes, next));
        Ok(WriteOutcome::Written(Revision::new(next.to_string())))
    }

    async fn ping(&self) -> JetflowResult<()> {
        Ok(())
    }
}
