// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Control plane service
//!
//! [`ControlPlane`] ties the catalog, the validator and the repositories
//! together into the operations exposed to operators: storing flows,
//! registering clusters and attaching flows to cluster namespaces.

mod runner;

pub use runner::normalize_runner_version;

use std::sync::Arc;

use crate::cluster::{Cluster, NamespaceLookup};
use crate::component::{Catalog, ComponentSource};
use crate::context::RequestContext;
use crate::errors::{JetflowError, JetflowResult, ValidationError};
use crate::flow::{FlowDefinition, FlowSubmission, FlowValidator, ValidatedFlow};
use crate::store::{
    CatalogRepository, DocumentStore, Repository, CLUSTERS_DOCUMENT, FLOWS_DOCUMENT,
};

/// The control plane
pub struct ControlPlane {
    store: Arc<dyn DocumentStore>,
    flows: Arc<dyn Repository<FlowDefinition>>,
    clusters: Arc<dyn Repository<Cluster>>,
    namespaces: Arc<dyn NamespaceLookup>,
    catalog: Arc<Catalog>,
    validator: FlowValidator,
    runner_version: String,
}

impl ControlPlane {
    /// Create a control plane over a backing store and a loaded catalog
    pub fn new(
        store: Arc<dyn DocumentStore>,
        namespaces: Arc<dyn NamespaceLookup>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            flows: Arc::new(CatalogRepository::<FlowDefinition, _>::new(
                store.clone(),
                FLOWS_DOCUMENT,
            )),
            clusters: Arc::new(CatalogRepository::<Cluster, _>::new(
                store.clone(),
                CLUSTERS_DOCUMENT,
            )),
            store,
            namespaces,
            catalog,
            validator: FlowValidator::new(),
            runner_version: String::new(),
        }
    }

    /// Load the catalog from `source` and create the control plane.
    ///
    /// A catalog that fails to load makes the control plane unusable, so
    /// the error is returned instead of starting with an empty catalog.
    pub async fn load(
        store: Arc<dyn DocumentStore>,
        namespaces: Arc<dyn NamespaceLookup>,
        source: &dyn ComponentSource,
    ) -> JetflowResult<Self> {
        let catalog = Catalog::load(source).await?;
        Ok(Self::new(store, namespaces, Arc::new(catalog)))
    }

    pub fn with_validator(mut self, validator: FlowValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Runner version stamped into new attachments; a leading `v` is dropped
    pub fn with_runner_version(mut self, version: &str) -> Self {
        self.runner_version = normalize_runner_version(version);
        self
    }

    pub fn with_max_conflict_retries(mut self, retries: usize) -> Self {
        self.flows = Arc::new(
            CatalogRepository::<FlowDefinition, _>::new(self.store.clone(), FLOWS_DOCUMENT)
                .with_max_conflict_retries(retries),
        );
        self.clusters = Arc::new(
            CatalogRepository::<Cluster, _>::new(self.store.clone(), CLUSTERS_DOCUMENT)
                .with_max_conflict_retries(retries),
        );
        self
    }

    pub fn runner_version(&self) -> &str {
        &self.runner_version
    }

    pub fn validator(&self) -> &FlowValidator {
        &self.validator
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Components
    // ─────────────────────────────────────────────────────────────────────────

    /// The catalog loaded at startup
    pub fn list_components(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Flows
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate a submission without storing it
    pub fn validate_flow(&self, submission: &FlowSubmission) -> Result<ValidatedFlow, ValidationError> {
        self.validator.validate(submission, &self.catalog)
    }

    /// Store a validated flow; fails with `ItemAlreadyExists` if the name is taken
    pub async fn add_flow(&self, ctx: &RequestContext, flow: ValidatedFlow) -> JetflowResult<()> {
        let name = flow.name().to_string();
        self.flows.add(ctx, &name, flow.into_definition()).await?;

        tracing::info!(flow = %name, "Flow stored");
        Ok(())
    }

    /// Validate then store a submission
    pub async fn submit_flow(
        &self,
        ctx: &RequestContext,
        submission: &FlowSubmission,
    ) -> JetflowResult<FlowDefinition> {
        let flow = self.validate_flow(submission)?;
        let definition = flow.definition().clone();
        self.add_flow(ctx, flow).await?;
        Ok(definition)
    }

    /// All stored flows ordered by name; empty when none were stored
    pub async fn list_flows(&self, ctx: &RequestContext) -> JetflowResult<Vec<FlowDefinition>> {
        match self.flows.list(ctx).await {
            Ok(items) => Ok(items.into_values().collect()),
            Err(e) if e.is_key_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub async fn get_flow(&self, ctx: &RequestContext, name: &str) -> JetflowResult<FlowDefinition> {
        self.flows.get(ctx, name).await.map_err(|e| flow_not_found(e, name))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Clusters
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a cluster; fails with `ItemAlreadyExists` if the name is taken
    pub async fn add_cluster(&self, ctx: &RequestContext, cluster: Cluster) -> JetflowResult<()> {
        if cluster.name.trim().is_empty() {
            return Err(ValidationError::MissingClusterName.into());
        }

        let name = cluster.name.clone();
        self.clusters.add(ctx, &name, cluster).await?;

        tracing::info!(cluster = %name, "Cluster registered");
        Ok(())
    }

    /// All registered clusters ordered by name; empty when none exist
    pub async fn list_clusters(&self, ctx: &RequestContext) -> JetflowResult<Vec<Cluster>> {
        match self.clusters.list(ctx).await {
            Ok(items) => Ok(items.into_values().collect()),
            Err(e) if e.is_key_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub async fn get_cluster(&self, ctx: &RequestContext, name: &str) -> JetflowResult<Cluster> {
        self.clusters
            .get(ctx, name)
            .await
            .map_err(|e| cluster_not_found(e, name))
    }

    /// Namespaces of a registered cluster
    pub async fn list_cluster_namespaces(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> JetflowResult<Vec<String>> {
        let cluster = self.get_cluster(ctx, name).await?;
        ctx.run(self.namespaces.list_namespaces(&cluster)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Health
    // ─────────────────────────────────────────────────────────────────────────

    /// Ping the backing store
    pub async fn health(&self, ctx: &RequestContext) -> JetflowResult<()> {
        self.flows.ping(ctx).await
    }
}

fn flow_not_found(error: JetflowError, name: &str) -> JetflowError {
    if error.is_key_not_found() {
        JetflowError::FlowNotFound {
            name: name.to_string(),
        }
    } else {
        error
    }
}

fn cluster_not_found(error: JetflowError, name: &str) -> JetflowError {
    if error.is_key_not_found() {
        JetflowError::ClusterNotFound {
            name: name.to_string(),
        }
    } else {
        error
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cluster::StaticNamespaces;
    use crate::component::{ArgumentSpec, ArgumentType, ComponentSpec, StaticCatalog};
    use crate::flow::InvocationRequest;
    use crate::store::MemoryStore;

    pub(crate) fn catalog() -> Catalog {
        Catalog::new(vec![
            ComponentSpec::new("webhook", "1.4.0", true)
                .with_argument(ArgumentSpec::new("url", ArgumentType::String, true)),
            ComponentSpec::new("notify", "0.3.1", false)
                .with_argument(ArgumentSpec::new("channel", ArgumentType::String, true)),
        ])
    }

    pub(crate) fn submission(name: &str) -> FlowSubmission {
        FlowSubmission::new(
            name,
            vec![
                InvocationRequest::new("webhook")
                    .with_argument("url", "https://x")
                    .with_targets([1]),
                InvocationRequest::new("notify").with_argument("channel", "#ops"),
            ],
        )
    }

    pub(crate) fn plane() -> ControlPlane {
        let namespaces = StaticNamespaces::new().with_cluster("clusterX", ["nsY", "default"]);
        ControlPlane::new(
            Arc::new(MemoryStore::new()),
            Arc::new(namespaces),
            Arc::new(catalog()),
        )
        .with_runner_version("v1.2.0")
    }

    #[tokio::test]
    async fn test_submit_and_get_flow() {
        let ctx = RequestContext::background();
        let plane = plane();

        let stored = plane.submit_flow(&ctx, &submission("flowA")).await.unwrap();
        assert_eq!(stored.components[0].version, "1.4.0");

        let fetched = plane.get_flow(&ctx, "flowA").await.unwrap();
        assert_eq!(fetched, stored);

        let err = plane.submit_flow(&ctx, &submission("flowA")).await.unwrap_err();
        assert!(matches!(err, JetflowError::ItemAlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_invalid_submission_is_not_stored() {
        let ctx = RequestContext::background();
        let plane = plane();

        let bad = FlowSubmission::new("flowA", vec![InvocationRequest::new("notify")]);
        let err = plane.submit_flow(&ctx, &bad).await.unwrap_err();
        assert!(matches!(err, JetflowError::Validation(_)));
        assert!(plane.list_flows(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_flow() {
        let ctx = RequestContext::background();
        let err = plane().get_flow(&ctx, "nope").await.unwrap_err();
        assert!(matches!(err, JetflowError::FlowNotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_flows_sorted_by_name() {
        let ctx = RequestContext::background();
        let plane = plane();

        plane.submit_flow(&ctx, &submission("b")).await.unwrap();
        plane.submit_flow(&ctx, &submission("a")).await.unwrap();

        let names: Vec<String> = plane
            .list_flows(&ctx)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_clusters() {
        let ctx = RequestContext::background();
        let plane = plane();

        assert!(plane.list_clusters(&ctx).await.unwrap().is_empty());

        plane.add_cluster(&ctx, Cluster::new("clusterX")).await.unwrap();
        let err = plane.add_cluster(&ctx, Cluster::new("clusterX")).await.unwrap_err();
        assert!(matches!(err, JetflowError::ItemAlreadyExists { .. }));

        assert_eq!(plane.list_clusters(&ctx).await.unwrap().len(), 1);
        assert_eq!(
            plane.list_cluster_namespaces(&ctx, "clusterX").await.unwrap(),
            vec!["nsY", "default"]
        );

        let err = plane.list_cluster_namespaces(&ctx, "other").await.unwrap_err();
        assert!(matches!(err, JetflowError::ClusterNotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_cluster_name_is_a_client_error() {
        let ctx = RequestContext::background();
        let plane = plane();

        let err = plane.add_cluster(&ctx, Cluster::new("  ")).await.unwrap_err();
        assert!(matches!(
            err,
            JetflowError::Validation(ValidationError::MissingClusterName)
        ));
        assert_eq!(err.kind(), crate::errors::ErrorKind::Validation);
        assert_eq!(err.public_message(), "Cluster name is empty");
        assert!(plane.list_clusters(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_with_catalog_source() {
        let source = StaticCatalog::new(catalog().iter().cloned().collect());
        let plane = ControlPlane::load(
            Arc::new(MemoryStore::new()),
            Arc::new(StaticNamespaces::new()),
            &source,
        )
        .await
        .unwrap();

        assert_eq!(plane.list_components().len(), 2);
        plane.health(&RequestContext::background()).await.unwrap();
    }
}
