// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Runner attachment
//!
//! Attaching records where a stored flow is meant to run. No workload is
//! created on the cluster: the attachment is registered intent, deployed
//! by a later step.

use super::{flow_not_found, ControlPlane};
use crate::context::RequestContext;
use crate::errors::{JetflowError, JetflowResult};
use crate::flow::{FlowDefinition, RunnerAttachment};

/// Turn a release tag such as `v1.2.0` into the bare version `1.2.0`
pub fn normalize_runner_version(tag: &str) -> String {
    let tag = tag.trim();
    tag.strip_prefix('v').unwrap_or(tag).to_string()
}

impl ControlPlane {
    /// Attach a stored flow to a cluster namespace.
    ///
    /// The cluster and namespace lookups are separate round trips. The
    /// final write re-checks for an existing runner on the cluster and
    /// appends the attachment against the freshly read flow, repeating
    /// both after every revision conflict.
    pub async fn attach_runner(
        &self,
        ctx: &RequestContext,
        flow: &str,
        cluster: &str,
        namespace: &str,
    ) -> JetflowResult<FlowDefinition> {
        let definition = self.get_flow(ctx, flow).await?;
        ensure_unattached(&definition, cluster)?;

        let target = self.get_cluster(ctx, cluster).await?;

        let namespaces = ctx.run(self.namespaces.list_namespaces(&target)).await?;
        if !namespaces.iter().any(|n| n == namespace) {
            return Err(JetflowError::NamespaceNotFound {
                cluster: cluster.to_string(),
                namespace: namespace.to_string(),
            });
        }

        let attach = |definition: &mut FlowDefinition| -> JetflowResult<()> {
            ensure_unattached(definition, cluster)?;
            definition.runners.push(RunnerAttachment {
                cluster: cluster.to_string(),
                namespace: namespace.to_string(),
                version: self.runner_version.clone(),
            });
            Ok(())
        };

        let definition = self
            .flows
            .modify(ctx, flow, &attach)
            .await
            .map_err(|e| flow_not_found(e, flow))?;

        tracing::info!(
            flow,
            cluster,
            namespace,
            version = %self.runner_version,
            "Runner attached"
        );

        Ok(definition)
    }
}

fn ensure_unattached(definition: &FlowDefinition, cluster: &str) -> JetflowResult<()> {
    if definition.runner_for(cluster).is_some() {
        return Err(JetflowError::RunnerAlreadyAttached {
            flow: definition.name.clone(),
            cluster: cluster.to_string(),
        });
    }

    Ok(())
}
