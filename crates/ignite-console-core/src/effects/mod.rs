// ── Effects ──
//
// The background task that answers request actions. It listens on the
// bus, spawns one task per request, and those tasks talk to the backend
// and dispatch `_OK`/`_ERR` results. Effects never fail outward: every
// error becomes an action.

mod advanced;
mod basic;
mod clone;
mod load;
mod remove;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::action::{Action, AdvancedSaveRequest, SaveError, Ticket};
use crate::backend::ConfigurationBackend;
use crate::bus::ConfigureState;
use crate::guard::Confirm;
use crate::model::{Entity, EntityId, ItemType};
use crate::store::State;
use crate::stream::ActionStream;

pub(crate) const SAVE_IN_PROGRESS: &str = "another save is already in progress";

/// Handles shared by every effect task.
pub(crate) struct EffectContext<B> {
    pub store: Arc<ConfigureState>,
    pub backend: Arc<B>,
    pub confirm: Arc<dyn Confirm>,
    pub saving: Arc<AtomicBool>,
}

impl<B> Clone for EffectContext<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            backend: Arc::clone(&self.backend),
            confirm: Arc::clone(&self.confirm),
            saving: Arc::clone(&self.saving),
        }
    }
}

// ── Save gate ───────────────────────────────────────────────────────

/// Held by the one save allowed in flight; released on drop.
pub(crate) struct SaveGuard(Arc<AtomicBool>);

impl SaveGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(Arc::clone(flag)))
        }
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn save_error_title(cluster_name: &str) -> String {
    format!("Failed to save cluster {cluster_name}")
}

// ── Effects task ────────────────────────────────────────────────────

pub(crate) async fn effects_task<B: ConfigurationBackend>(
    ctx: EffectContext<B>,
    mut actions: ActionStream,
    cancel: CancellationToken,
) {
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "effect task ended abnormally");
                }
            }
            envelope = actions.recv() => {
                let Some(envelope) = envelope else { break };
                route(&ctx, &envelope.action, &envelope.state, &mut tasks);
            }
        }
    }

    tasks.shutdown().await;
    debug!("effects task stopped");
}

fn route<B: ConfigurationBackend>(
    ctx: &EffectContext<B>,
    action: &Action,
    state: &Arc<State>,
    tasks: &mut JoinSet<()>,
) {
    match action {
        Action::BasicSaveClusterAndCaches { ticket, request } => {
            let Some(guard) = SaveGuard::acquire(&ctx.saving) else {
                reject_save(ctx, action, *ticket, &request.cluster.name);
                return;
            };
            tasks.spawn(basic::save(ctx.clone(), *ticket, Arc::clone(request), guard));
        }
        Action::AdvancedSaveCompleteConfiguration { ticket, request } => {
            let Some(guard) = SaveGuard::acquire(&ctx.saving) else {
                reject_save(ctx, action, *ticket, &request.changed.cluster.name);
                return;
            };
            tasks.spawn(advanced::save(ctx.clone(), *ticket, Arc::clone(request), guard));
        }
        Action::Load { ticket, request } => {
            tasks.spawn(load::load(ctx.clone(), *ticket, request.clone()));
        }
        Action::RemoveClusters { ticket, ids } => {
            tasks.spawn(remove::remove_clusters(ctx.clone(), *ticket, ids.clone()));
        }
        Action::CloneClusters { ticket, ids } => {
            tasks.spawn(clone::clone_clusters(ctx.clone(), *ticket, ids.clone()));
        }
        Action::RemoveClusterItems {
            item_type,
            item_ids,
            save,
            confirm: true,
        } => {
            tasks.spawn(confirm_item_removal(
                ctx.clone(),
                *item_type,
                item_ids.clone(),
                *save,
            ));
        }
        Action::RemoveClusterItems {
            save: true,
            confirm: false,
            ..
        } => save_session(ctx, state),
        _ => {}
    }
}

fn reject_save<B>(ctx: &EffectContext<B>, action: &Action, ticket: Ticket, cluster_name: &str) {
    warn!(action = action.kind(), "save rejected: {SAVE_IN_PROGRESS}");
    let error = SaveError {
        title: save_error_title(cluster_name),
        message: SAVE_IN_PROGRESS.into(),
    };
    let result = match action {
        Action::BasicSaveClusterAndCaches { .. } => {
            Action::BasicSaveClusterAndCachesErr { ticket, error }
        }
        _ => Action::AdvancedSaveCompleteConfigurationErr { ticket, error },
    };
    ctx.store.dispatch(result);
}

/// Request an advanced save of the edit session as it stands in `state`.
fn save_session<B>(ctx: &EffectContext<B>, state: &State) {
    let Some(changed) = state.edit.changed_items() else {
        debug!("no cluster being edited, nothing to save");
        return;
    };
    ctx.store.dispatch(Action::AdvancedSaveCompleteConfiguration {
        ticket: ctx.store.next_ticket(),
        request: Arc::new(AdvancedSaveRequest {
            changed,
            prev_actions: Vec::new(),
        }),
    });
}

// ── Cluster item removal ────────────────────────────────────────────

fn removal_prompt(state: &State, item_type: ItemType, ids: &[EntityId]) -> String {
    let names: Vec<String> = ids
        .iter()
        .map(|id| {
            let name = match item_type {
                ItemType::Caches => state.short_caches.get(id).map(|c| c.name().to_owned()),
                ItemType::Models => state.short_models.get(id).map(|m| m.name().to_owned()),
                ItemType::Igfss => state.short_igfss.get(id).map(|i| i.name().to_owned()),
            };
            name.unwrap_or_else(|| id.to_string())
        })
        .collect();
    format!(
        "Are you sure you want to remove these {item_type}: {}?",
        names.join(", ")
    )
}

async fn confirm_item_removal<B: ConfigurationBackend>(
    ctx: EffectContext<B>,
    item_type: ItemType,
    item_ids: Vec<EntityId>,
    save: bool,
) {
    let prompt = removal_prompt(&ctx.store.state(), item_type, &item_ids);
    let confirm = Arc::clone(&ctx.confirm);
    let answer = tokio::task::spawn_blocking(move || confirm.confirm(&prompt)).await;

    let confirmed = match answer {
        Ok(Ok(yes)) => yes,
        Ok(Err(e)) => {
            warn!(error = %e, "confirmation failed");
            false
        }
        Err(e) => {
            warn!(error = %e, "confirmation task failed");
            false
        }
    };
    if !confirmed {
        debug!(%item_type, "item removal declined");
        return;
    }

    ctx.store.dispatch(Action::RemoveClusterItemsConfirmed {
        item_type,
        item_ids,
    });
    if save {
        save_session(&ctx, &ctx.store.state());
    }
}
