// ── Cluster removal ──
//
// Clusters disappear from the store at once; the backend is then asked
// to remove each one. If some removals fail, the store is put back and
// only the clusters that are really gone are removed again.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use super::EffectContext;
use crate::action::{Action, ClusterFailure, Ticket};
use crate::backend::ConfigurationBackend;
use crate::model::EntityId;
use crate::store::{SliceAction, State};
use crate::transaction::Transaction;

fn removal(state: &State, ids: &[EntityId]) -> Arc<Transaction> {
    Arc::new(Transaction::prepare(
        state,
        vec![
            Action::Clusters(SliceAction::Remove(ids.to_vec())),
            Action::ShortClusters(SliceAction::Remove(ids.to_vec())),
        ],
    ))
}

pub(super) async fn remove_clusters<B: ConfigurationBackend>(
    ctx: EffectContext<B>,
    ticket: Ticket,
    ids: Vec<EntityId>,
) {
    let tx = removal(&ctx.store.state(), &ids);
    ctx.store.dispatch(Action::ApplyTransaction(Arc::clone(&tx)));

    let backend = &*ctx.backend;
    let results = join_all(ids.iter().map(|id| async move {
        (id, backend.remove_clusters(std::slice::from_ref(id)).await)
    }))
    .await;

    let mut removed = Vec::new();
    let mut failed = Vec::new();
    for (id, result) in results {
        match result {
            Ok(_) => removed.push(id.clone()),
            Err(e) => failed.push(ClusterFailure {
                id: id.clone(),
                message: e.message(),
            }),
        }
    }

    if failed.is_empty() {
        info!(count = removed.len(), "clusters removed");
        ctx.store.dispatch(Action::RemoveClustersOk {
            ticket,
            removed,
            failed,
        });
        return;
    }

    warn!(
        failed = failed.len(),
        removed = removed.len(),
        "cluster removal partially failed, restoring"
    );
    // Restore and re-remove in one publish.
    let mut restore = vec![Action::UndoActions(tx)];
    if !removed.is_empty() {
        restore.extend([
            Action::Clusters(SliceAction::Remove(removed.clone())),
            Action::ShortClusters(SliceAction::Remove(removed.clone())),
        ]);
    }
    let restore = Transaction::prepare(&ctx.store.state(), restore);
    ctx.store.dispatch_all([
        Action::ApplyTransaction(Arc::new(restore)),
        Action::RemoveClustersOk {
            ticket,
            removed,
            failed,
        },
    ]);
}
