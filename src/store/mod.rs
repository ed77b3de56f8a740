// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Versioned catalog storage
//!
//! Items of one type live together in a single backing-store document of
//! the shape `{"items": {"<name>": T}}`. [`CatalogRepository`] implements
//! the [`Repository`] contract over any [`DocumentStore`] adapter, using
//! revision-conditional writes so concurrent writers never lose updates.

mod catalog;
mod filesystem;
mod memory;

pub use catalog::{CatalogRepository, DEFAULT_CONFLICT_RETRIES};
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::context::RequestContext;
use crate::errors::JetflowResult;

/// Document holding stored flows
pub const FLOWS_DOCUMENT: &str = "flows";

/// Document holding registered clusters
pub const CLUSTERS_DOCUMENT: &str = "clusters";

/// Name-keyed storage for one item type
#[async_trait]
pub trait Repository<T>: Send + Sync
where
    T: Send + Sync,
{
    /// Insert a new item; fails with `ItemAlreadyExists` if the name is taken
    async fn add(&self, ctx: &RequestContext, name: &str, item: T) -> JetflowResult<()>;

    /// Fetch one item
    async fn get(&self, ctx: &RequestContext, name: &str) -> JetflowResult<T>;

    /// All items, ordered by name.
    ///
    /// An absent or empty document is reported as `KeyNotFound`.
    async fn list(&self, ctx: &RequestContext) -> JetflowResult<BTreeMap<String, T>>;

    /// Replace an existing item
    async fn update(&self, ctx: &RequestContext, name: &str, item: T) -> JetflowResult<()>;

    /// Change an existing item in place and return the result.
    ///
    /// `change` is re-run on the freshly read item after every revision
    /// conflict, so checks it makes always see the latest stored state.
    async fn modify(
        &self,
        ctx: &RequestContext,
        name: &str,
        change: &(dyn for<'m> Fn(&'m mut T) -> JetflowResult<()> + Send + Sync),
    ) -> JetflowResult<T>;

    /// Delete an existing item
    async fn remove(&self, ctx: &RequestContext, name: &str) -> JetflowResult<()>;

    /// Liveness probe of the backing store
    async fn ping(&self, ctx: &RequestContext) -> JetflowResult<()>;
}

/// Opaque version tag of a stored document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw document bytes together with the revision they were read at
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub bytes: Vec<u8>,
    pub revision: Revision,
}

/// Result of a conditional write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write landed; the document is now at this revision
    Written(Revision),
    /// The document moved past the expected revision
    Conflict,
}

/// Trait for backing-store adapters
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document, `None` if it was never written
    async fn read(&self, key: &str) -> JetflowResult<Option<StoredDocument>>;

    /// Write a document if it is still at `expected`.
    ///
    /// `expected == None` means the document must not exist yet.
    async fn write(
        &self,
        key: &str,
        bytes: Vec<u8>,
        expected: Option<&Revision>,
    ) -> JetflowResult<WriteOutcome>;

    /// Check the store is reachable
    async fn ping(&self) -> JetflowResult<()>;
}

/// Persisted document shape
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ItemsDocument<T> {
    #[serde(default)]
    pub items: BTreeMap<String, T>,
}
