// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Generic repository over a document store

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{DocumentStore, ItemsDocument, Repository, Revision, WriteOutcome};
use crate::context::RequestContext;
use crate::errors::{JetflowError, JetflowResult};

/// Default number of re-read/re-apply rounds after a revision conflict
pub const DEFAULT_CONFLICT_RETRIES: usize = 3;

/// [`Repository`] storing every item of type `T` in one named document
pub struct CatalogRepository<T, S: ?Sized> {
    store: Arc<S>,
    document: String,
    max_conflict_retries: usize,
    _items: PhantomData<fn() -> T>,
}

impl<T, S> CatalogRepository<T, S>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
    S: DocumentStore + ?Sized,
{
    pub fn new(store: Arc<S>, document: impl Into<String>) -> Self {
        Self {
            store,
            document: document.into(),
            max_conflict_retries: DEFAULT_CONFLICT_RETRIES,
            _items: PhantomData,
        }
    }

    pub fn with_max_conflict_retries(mut self, retries: usize) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    fn key_not_found(&self, name: Option<&str>) -> JetflowError {
        JetflowError::KeyNotFound {
            document: self.document.clone(),
            name: name.map(str::to_string),
        }
    }

    /// Read and decode the document; absent documents load as empty
    async fn load(
        &self,
        ctx: &RequestContext,
    ) -> JetflowResult<Option<(BTreeMap<String, T>, Revision)>> {
        let Some(stored) = ctx.run(self.store.read(&self.document)).await? else {
            return Ok(None);
        };

        let doc: ItemsDocument<T> = serde_json::from_slice(&stored.bytes)
            .map_err(|e| JetflowError::store(&format!("decode document '{}'", self.document), e))?;

        Ok(Some((doc.items, stored.revision)))
    }

    /// Read-modify-write with revision-conditional writes.
    ///
    /// `apply` runs again on fresh data after every conflict, so it must be
    /// repeatable and decide solely from the items it is handed.
    async fn mutate<F>(&self, ctx: &RequestContext, op: &str, mut apply: F) -> JetflowResult<()>
    where
        F: FnMut(&mut BTreeMap<String, T>) -> JetflowResult<()> + Send,
    {
        let attempts = self.max_conflict_retries + 1;

        for attempt in 1..=attempts {
            let (mut items, revision) = match self.load(ctx).await? {
                Some((items, revision)) => (items, Some(revision)),
                None => (BTreeMap::new(), None),
            };

            apply(&mut items)?;

            let bytes = serde_json::to_vec(&ItemsDocument { items }).map_err(|e| {
                JetflowError::store(&format!("encode document '{}'", self.document), e)
            })?;

            let outcome = ctx
                .run(self.store.write(&self.document, bytes, revision.as_ref()))
                .await?;

            match outcome {
                WriteOutcome::Written(revision) => {
                    tracing::debug!(
                        document = %self.document,
                        op,
                        %revision,
                        attempt,
                        "Document written"
                    );
                    return Ok(());
                }
                WriteOutcome::Conflict => {
                    tracing::warn!(
                        document = %self.document,
                        op,
                        attempt,
                        "Revision conflict, re-reading document"
                    );
                }
            }
        }

        Err(JetflowError::RevisionConflict {
            document: self.document.clone(),
            attempts,
        })
    }
}

#[async_trait]
impl<T, S> Repository<T> for CatalogRepository<T, S>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
    S: DocumentStore + ?Sized,
{
    async fn add(&self, ctx: &RequestContext, name: &str, item: T) -> JetflowResult<()> {
        self.mutate(ctx, "add", |items| {
            if items.contains_key(name) {
                return Err(JetflowError::ItemAlreadyExists {
                    document: self.document.clone(),
                    name: name.to_string(),
                });
            }

            items.insert(name.to_string(), item.clone());
            Ok(())
        })
        .await
    }

    async fn get(&self, ctx: &RequestContext, name: &str) -> JetflowResult<T> {
        let (mut items, _) = self
            .load(ctx)
            .await?
            .ok_or_else(|| self.key_not_found(Some(name)))?;

        items.remove(name).ok_or_else(|| self.key_not_found(Some(name)))
    }

    async fn list(&self, ctx: &RequestContext) -> JetflowResult<BTreeMap<String, T>> {
        match self.load(ctx).await? {
            Some((items, _)) if !items.is_empty() => Ok(items),
            _ => Err(self.key_not_found(None)),
        }
    }

    async fn update(&self, ctx: &RequestContext, name: &str, item: T) -> JetflowResult<()> {
        self.mutate(ctx, "update", |items| match items.get_mut(name) {
            Some(slot) => {
                *slot = item.clone();
                Ok(())
            }
            None => Err(self.key_not_found(Some(name))),
        })
        .await
    }

    async fn modify(
        &self,
        ctx: &RequestContext,
        name: &str,
        change: &(dyn for<'m> Fn(&'m mut T) -> JetflowResult<()> + Send + Sync),
    ) -> JetflowResult<T> {
        let mut changed = None;

        self.mutate(ctx, "modify", |items| {
            let slot = items
                .get_mut(name)
                .ok_or_else(|| self.key_not_found(Some(name)))?;
            change(slot)?;
            changed = Some(slot.clone());
            Ok(())
        })
        .await?;

        changed.ok_or_else(|| self.key_not_found(Some(name)))
    }

    async fn remove(&self, ctx: &RequestContext, name: &str) -> JetflowResult<()> {
        self.mutate(ctx, "remove", |items| {
            items
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| self.key_not_found(Some(name)))
        })
        .await
    }

    async fn ping(&self, ctx: &RequestContext) -> JetflowResult<()> {
        ctx.run(self.store.ping()).await
    }
}
