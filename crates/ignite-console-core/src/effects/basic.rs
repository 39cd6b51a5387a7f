// ── Basic save ──
//
// Cluster plus the caches edited on the basic screen. The store is
// updated optimistically in one transaction before the backend call and
// rolled back if the call fails.

use std::sync::Arc;

use tracing::{info, warn};

use super::{EffectContext, SaveGuard, save_error_title};
use crate::action::{Action, BasicSaveRequest, SaveError, Ticket};
use crate::backend::ConfigurationBackend;
use crate::model::{Cache, ShortCache, ShortCluster};
use crate::store::{ItemsEditAction, SliceAction, State};
use crate::transaction::Transaction;

/// Caches as the backend receives them: linked to the saved cluster only.
fn linked_caches(request: &BasicSaveRequest) -> Vec<Arc<Cache>> {
    let cluster_id = &request.cluster.id;
    request
        .caches
        .iter()
        .map(|cache| {
            Arc::new(Cache {
                clusters: vec![cluster_id.clone()],
                ..Cache::clone(cache)
            })
        })
        .collect()
}

/// Forward actions: session edits, then the optimistic store upserts,
/// including the basic-screen cache list.
fn forward_actions(
    state: &State,
    request: &BasicSaveRequest,
    caches: &[Arc<Cache>],
) -> Vec<Action> {
    let cluster = Arc::clone(&request.cluster);
    let full_caches = caches
        .iter()
        .map(|cache| match state.caches.get(&cache.id) {
            Some(stored) => Arc::new(cache.overlay(stored)),
            None => Arc::clone(cache),
        })
        .collect();
    let short_caches = caches
        .iter()
        .map(|cache| Arc::new(ShortCache::from(&**cache)))
        .collect();

    let mut forward = request.prev_actions.clone();
    let short_cluster = Arc::new(ShortCluster::from(&*cluster));
    forward.extend([
        Action::Clusters(SliceAction::Upsert(vec![cluster])),
        Action::ShortClusters(SliceAction::Upsert(vec![short_cluster])),
        Action::Caches(SliceAction::Upsert(full_caches)),
        Action::ShortCaches(SliceAction::Upsert(short_caches)),
        Action::BasicCaches(ItemsEditAction::Upsert(caches.to_vec())),
    ]);
    forward
}

pub(super) async fn save<B: ConfigurationBackend>(
    ctx: EffectContext<B>,
    ticket: Ticket,
    request: Arc<BasicSaveRequest>,
    guard: SaveGuard,
) {
    let caches = linked_caches(&request);
    let state = ctx.store.state();
    let tx = Arc::new(Transaction::prepare(
        &state,
        forward_actions(&state, &request, &caches),
    ));
    ctx.store.dispatch(Action::ApplyTransaction(Arc::clone(&tx)));

    let result = ctx.backend.save_basic(&request.cluster, &caches).await;

    let cluster = Arc::clone(&request.cluster);
    match result {
        Ok(cluster_id) => {
            info!(cluster_id = %cluster_id, "Cluster {} saved.", cluster.name);
            ctx.store.dispatch_all([
                Action::EditCluster(Arc::clone(&cluster)),
                Action::BasicSaveClusterAndCachesOk {
                    ticket,
                    cluster,
                    cluster_id,
                },
            ]);
        }
        Err(e) => {
            warn!(cluster = %cluster.name, error = %e, "basic save failed, rolling back");
            ctx.store.dispatch_all([
                Action::BasicSaveClusterAndCachesErr {
                    ticket,
                    error: SaveError {
                        title: save_error_title(&cluster.name),
                        message: e.message(),
                    },
                },
                Action::UndoActions(tx),
            ]);
        }
    }
    // Results are queued; a later save now prepares against settled state.
    drop(guard);
}
