// ── Cluster cloning ──
//
// Copies appear in the store at once under temporary ids. Each copy is
// then stored on its own; a stored copy is re-keyed with the backend id,
// a refused one is taken out again.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use super::EffectContext;
use crate::action::{Action, ClonedCluster, ClusterFailure, Ticket};
use crate::backend::ConfigurationBackend;
use crate::error::CoreError;
use crate::model::{Cluster, EntityId, ShortCluster, unique_name};
use crate::store::{SliceAction, State};

/// A local copy waiting for the backend.
struct PendingClone {
    source: EntityId,
    cluster: Arc<Cluster>,
}

async fn source_cluster<B: ConfigurationBackend>(
    ctx: &EffectContext<B>,
    state: &State,
    id: &EntityId,
) -> Result<Arc<Cluster>, CoreError> {
    match state.clusters.get(id) {
        Some(cluster) => Ok(Arc::clone(cluster)),
        None => ctx.backend.cluster(id).await.map(Arc::new),
    }
}

fn short_upsert(clusters: &[Arc<Cluster>]) -> Action {
    Action::ShortClusters(SliceAction::Upsert(
        clusters
            .iter()
            .map(|c| Arc::new(ShortCluster::from(&**c)))
            .collect(),
    ))
}

pub(super) async fn clone_clusters<B: ConfigurationBackend>(
    ctx: EffectContext<B>,
    ticket: Ticket,
    ids: Vec<EntityId>,
) {
    let state = ctx.store.state();
    let mut taken: Vec<String> = state
        .short_clusters
        .values()
        .map(|c| c.name.clone())
        .chain(state.clusters.values().map(|c| c.name.clone()))
        .collect();

    let mut pending = Vec::with_capacity(ids.len());
    let mut failed = Vec::new();
    for id in &ids {
        match source_cluster(&ctx, &state, id).await {
            Ok(source) => {
                let name = unique_name(
                    &format!("{} (clone)", source.name),
                    taken.iter().map(String::as_str),
                );
                taken.push(name.clone());
                pending.push(PendingClone {
                    source: id.clone(),
                    cluster: Arc::new(Cluster {
                        id: EntityId::generate(),
                        name,
                        ..Cluster::clone(&source)
                    }),
                });
            }
            Err(e) => failed.push(ClusterFailure {
                id: id.clone(),
                message: e.message(),
            }),
        }
    }

    let copies: Vec<Arc<Cluster>> = pending.iter().map(|p| Arc::clone(&p.cluster)).collect();
    if !copies.is_empty() {
        ctx.store.dispatch_all([
            Action::Clusters(SliceAction::Upsert(copies.clone())),
            short_upsert(&copies),
        ]);
    }

    let backend = &*ctx.backend;
    let results = join_all(pending.iter().map(|p| async move {
        (p, backend.create_cluster(&p.cluster).await)
    }))
    .await;

    let temporary: Vec<EntityId> = copies.iter().map(|c| c.id.clone()).collect();
    let mut stored = Vec::new();
    let mut cloned = Vec::new();
    for (p, result) in results {
        match result {
            Ok(id) => {
                cloned.push(ClonedCluster {
                    source: p.source.clone(),
                    id: id.clone(),
                    name: p.cluster.name.clone(),
                });
                stored.push(Arc::new(Cluster {
                    id,
                    ..Cluster::clone(&p.cluster)
                }));
            }
            Err(e) => {
                warn!(source = %p.source, error = %e, "cluster clone refused, removing copy");
                failed.push(ClusterFailure {
                    id: p.source.clone(),
                    message: e.message(),
                });
            }
        }
    }

    info!(cloned = cloned.len(), failed = failed.len(), "clusters cloned");
    let mut actions = Vec::with_capacity(5);
    if !temporary.is_empty() {
        actions.extend([
            Action::Clusters(SliceAction::Remove(temporary.clone())),
            Action::ShortClusters(SliceAction::Remove(temporary)),
        ]);
    }
    if !stored.is_empty() {
        actions.extend([
            short_upsert(&stored),
            Action::Clusters(SliceAction::Upsert(stored)),
        ]);
    }
    actions.push(Action::CloneClustersOk {
        ticket,
        cloned,
        failed,
    });
    ctx.store.dispatch_all(actions);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_upsert_projects_each_cluster() {
        let clusters = vec![Arc::new(Cluster::blank("A")), Arc::new(Cluster::blank("B"))];
        match short_upsert(&clusters) {
            Action::ShortClusters(SliceAction::Upsert(shorts)) => {
                let names: Vec<&str> = shorts.iter().map(|s| s.name.as_str()).collect();
                assert_eq!(names, ["A", "B"]);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }
}
