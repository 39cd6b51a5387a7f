// ── Advanced save ──
//
// Saves a whole edit session: the cluster and every changed cache, model
// and IGFS. Model→cache links are kept consistent from both sides before
// anything is upserted, then the store is updated optimistically and
// rolled back if the backend refuses.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{info, warn};

use super::{EffectContext, SaveGuard, save_error_title};
use crate::action::{Action, AdvancedSaveRequest, SaveError, SavedItem, SavedKind, Ticket};
use crate::backend::ConfigurationBackend;
use crate::model::{Cache, Entity, EntityId, ShortCache, ShortCluster, ShortIgfs, ShortModel};
use crate::store::{ChangedItems, SliceAction, State};
use crate::transaction::Transaction;

// ── Domain sync ─────────────────────────────────────────────────────

/// Pending `domains` edits for one cache.
#[derive(Debug, Default)]
struct DomainDelta {
    add: Vec<EntityId>,
    remove: Vec<EntityId>,
    /// Models dropped from the cluster; these win over any add.
    detach: Vec<EntityId>,
}

fn push_unique(list: &mut Vec<EntityId>, id: &EntityId) {
    if !list.contains(id) {
        list.push(id.clone());
    }
}

fn minus<'a>(from: &'a [EntityId], other: &'a [EntityId]) -> impl Iterator<Item = &'a EntityId> {
    from.iter().filter(move |id| !other.contains(id))
}

fn domain_deltas(state: &State, changed: &ChangedItems) -> IndexMap<EntityId, DomainDelta> {
    let mut deltas: IndexMap<EntityId, DomainDelta> = IndexMap::new();
    let changed_model = |id: &EntityId| changed.models.iter().find(|m| &m.id == id).cloned();

    let old_models = state
        .clusters
        .get(&changed.cluster.id)
        .map(|c| c.models.clone())
        .unwrap_or_default();
    let new_models = &changed.cluster.models;

    for model_id in minus(new_models, &old_models) {
        let Some(model) = changed_model(model_id).or_else(|| state.models.get(model_id).cloned())
        else {
            continue;
        };
        for cache_id in &model.caches {
            push_unique(&mut deltas.entry(cache_id.clone()).or_default().add, model_id);
        }
    }

    for model_id in minus(&old_models, new_models) {
        let Some(stored) = state.models.get(model_id) else {
            continue;
        };
        for cache_id in &stored.caches {
            push_unique(&mut deltas.entry(cache_id.clone()).or_default().detach, model_id);
        }
    }

    for model in &changed.models {
        let old_caches = state
            .models
            .get(&model.id)
            .map(|m| m.caches.clone())
            .unwrap_or_default();
        for cache_id in minus(&model.caches, &old_caches) {
            push_unique(&mut deltas.entry(cache_id.clone()).or_default().add, &model.id);
        }
        for cache_id in minus(&old_caches, &model.caches) {
            push_unique(&mut deltas.entry(cache_id.clone()).or_default().remove, &model.id);
        }
    }

    deltas
}

fn apply_delta(domains: &[EntityId], delta: &DomainDelta) -> Vec<EntityId> {
    let mut next: Vec<EntityId> = minus(domains, &delta.remove).cloned().collect();
    for id in &delta.add {
        push_unique(&mut next, id);
    }
    next.retain(|id| !delta.detach.contains(id));
    next
}

/// The caches to save: every changed cache, with `domains` patched to
/// match the models' links, plus unchanged caches whose `domains` moved.
pub(crate) fn sync_domains(state: &State, changed: &ChangedItems) -> Vec<Arc<Cache>> {
    let mut caches: IndexMap<EntityId, Arc<Cache>> = changed
        .caches
        .iter()
        .map(|c| (c.id.clone(), Arc::clone(c)))
        .collect();

    for (cache_id, delta) in domain_deltas(state, changed) {
        let base = caches
            .get(&cache_id)
            .cloned()
            .or_else(|| state.caches.get(&cache_id).cloned());
        let Some(base) = base else {
            warn!(cache_id = %cache_id, "cache not loaded, skipping domain sync");
            continue;
        };
        let domains = apply_delta(&base.domains, &delta);
        if domains == base.domains {
            continue;
        }
        caches.insert(
            cache_id,
            Arc::new(Cache {
                domains,
                ..Cache::clone(&base)
            }),
        );
    }

    caches.into_values().collect()
}

// ── Saved item ──────────────────────────────────────────────────────

/// The item to bring into focus after a save: the first element of the
/// last non-empty list among caches, IGFS and models, else the cluster.
pub(crate) fn saved_item(changed: &ChangedItems) -> SavedItem {
    let item = |kind, id: &EntityId, name: &str| SavedItem {
        kind,
        id: id.clone(),
        name: name.to_owned(),
    };
    if let Some(m) = changed.models.first() {
        item(SavedKind::Model, &m.id, m.name())
    } else if let Some(i) = changed.igfss.first() {
        item(SavedKind::Igfs, &i.id, i.name())
    } else if let Some(c) = changed.caches.first() {
        item(SavedKind::Cache, &c.id, c.name())
    } else {
        item(SavedKind::Cluster, &changed.cluster.id, &changed.cluster.name)
    }
}

// ── Effect ──────────────────────────────────────────────────────────

fn forward_actions(request: &AdvancedSaveRequest, payload: &ChangedItems) -> Vec<Action> {
    let cluster = Arc::clone(&payload.cluster);
    let short_cluster = Arc::new(ShortCluster::from(&*cluster));

    let mut forward = request.prev_actions.clone();
    forward.extend([
        Action::Models(SliceAction::Upsert(payload.models.clone())),
        Action::ShortModels(SliceAction::Upsert(
            payload
                .models
                .iter()
                .map(|m| Arc::new(ShortModel::from(&**m)))
                .collect(),
        )),
        Action::Igfss(SliceAction::Upsert(payload.igfss.clone())),
        Action::ShortIgfss(SliceAction::Upsert(
            payload
                .igfss
                .iter()
                .map(|i| Arc::new(ShortIgfs::from(&**i)))
                .collect(),
        )),
        Action::Caches(SliceAction::Upsert(payload.caches.clone())),
        Action::ShortCaches(SliceAction::Upsert(
            payload
                .caches
                .iter()
                .map(|c| Arc::new(ShortCache::from(&**c)))
                .collect(),
        )),
        Action::Clusters(SliceAction::Upsert(vec![cluster])),
        Action::ShortClusters(SliceAction::Upsert(vec![short_cluster])),
    ]);
    forward
}

pub(super) async fn save<B: ConfigurationBackend>(
    ctx: EffectContext<B>,
    ticket: Ticket,
    request: Arc<AdvancedSaveRequest>,
    guard: SaveGuard,
) {
    let state = ctx.store.state();
    let changed = &request.changed;
    let payload = ChangedItems {
        caches: sync_domains(&state, changed),
        ..changed.clone()
    };
    let tx = Arc::new(Transaction::prepare(
        &state,
        forward_actions(&request, &payload),
    ));
    ctx.store.dispatch(Action::ApplyTransaction(Arc::clone(&tx)));

    let result = ctx.backend.save_advanced(&payload).await;

    let cluster = Arc::clone(&payload.cluster);
    match result {
        Ok(()) => {
            let saved = saved_item(changed);
            info!(id = %saved.id, "{} {} saved", saved.kind, saved.name);
            ctx.store.dispatch_all([
                Action::EditCluster(cluster),
                Action::AdvancedSaveCompleteConfigurationOk { ticket, saved },
            ]);
        }
        Err(e) => {
            warn!(cluster = %cluster.name, error = %e, "advanced save failed, rolling back");
            ctx.store.dispatch_all([
                Action::AdvancedSaveCompleteConfigurationErr {
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Cluster, Model};
    use crate::store::reduce;

    fn ids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().map(|&s| EntityId::from(s)).collect()
    }

    fn cluster(models: &[&str]) -> Arc<Cluster> {
        let mut c = Cluster::blank("A");
        c.id = "c1".into();
        c.models = ids(models);
        Arc::new(c)
    }

    fn cache(id: &str, domains: &[&str]) -> Arc<Cache> {
        let mut c = Cache::blank(id, ids(&["c1"]));
        c.id = id.into();
        c.domains = ids(domains);
        Arc::new(c)
    }

    fn model(id: &str, caches: &[&str]) -> Arc<Model> {
        let mut m = Model::blank(ids(&["c1"]));
        m.id = id.into();
        m.value_type = format!("org.{id}");
        m.caches = ids(caches);
        Arc::new(m)
    }

    fn stored(
        clusters: Vec<Arc<Cluster>>,
        caches: Vec<Arc<Cache>>,
        models: Vec<Arc<Model>>,
    ) -> State {
        let state = reduce(&State::default(), &Action::Clusters(SliceAction::Upsert(clusters)));
        let state = reduce(&state, &Action::Caches(SliceAction::Upsert(caches)));
        reduce(&state, &Action::Models(SliceAction::Upsert(models)))
    }

    fn domains_of(caches: &[Arc<Cache>]) -> Vec<(String, Vec<String>)> {
        caches
            .iter()
            .map(|c| {
                (
                    c.id.to_string(),
                    c.domains.iter().map(ToString::to_string).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn new_model_is_added_to_its_caches() {
        let state = stored(
            vec![cluster(&[])],
            vec![cache("ca1", &[]), cache("ca2", &[]), cache("ca3", &[])],
            vec![],
        );
        let changed = ChangedItems {
            cluster: cluster(&["m1"]),
            caches: vec![],
            models: vec![model("m1", &["ca1", "ca2"])],
            igfss: vec![],
        };
        assert_eq!(
            domains_of(&sync_domains(&state, &changed)),
            vec![
                ("ca1".to_owned(), vec!["m1".to_owned()]),
                ("ca2".to_owned(), vec!["m1".to_owned()]),
            ]
        );
    }

    #[test]
    fn model_removed_from_cluster_is_detached() {
        let state = stored(
            vec![cluster(&["m1"])],
            vec![cache("ca1", &["m1"]), cache("ca2", &[])],
            vec![model("m1", &["ca1"])],
        );
        let changed = ChangedItems {
            cluster: cluster(&[]),
            caches: vec![],
            models: vec![],
            igfss: vec![],
        };
        assert_eq!(
            domains_of(&sync_domains(&state, &changed)),
            vec![("ca1".to_owned(), Vec::<String>::new())]
        );
    }

    #[test]
    fn model_cache_diff_patches_changed_cache_version() {
        let state = stored(
            vec![cluster(&["m1"])],
            vec![cache("ca1", &["m1"]), cache("ca2", &[])],
            vec![model("m1", &["ca1"])],
        );
        let mut edited = Cache::clone(&cache("ca2", &[]));
        edited.name = "Renamed".into();
        let changed = ChangedItems {
            cluster: cluster(&["m1"]),
            caches: vec![Arc::new(edited)],
            models: vec![model("m1", &["ca2"])],
            igfss: vec![],
        };
        let caches = sync_domains(&state, &changed);
        assert_eq!(
            domains_of(&caches),
            vec![
                ("ca2".to_owned(), vec!["m1".to_owned()]),
                ("ca1".to_owned(), Vec::<String>::new()),
            ]
        );
        assert_eq!(caches[0].name, "Renamed");
    }

    #[test]
    fn unloaded_caches_are_skipped() {
        let state = stored(vec![cluster(&[])], vec![], vec![]);
        let changed = ChangedItems {
            cluster: cluster(&["m1"]),
            caches: vec![],
            models: vec![model("m1", &["ghost"])],
            igfss: vec![],
        };
        assert!(sync_domains(&state, &changed).is_empty());
    }

    #[test]
    fn saved_item_prefers_models_then_igfs_then_caches() {
        let mut changed = ChangedItems {
            cluster: cluster(&[]),
            caches: vec![cache("ca1", &[])],
            models: vec![],
            igfss: vec![],
        };
        assert_eq!(saved_item(&changed).kind, SavedKind::Cache);

        changed.models = vec![model("m1", &[])];
        let saved = saved_item(&changed);
        assert_eq!(saved.kind, SavedKind::Model);
        assert_eq!(saved.name, "org.m1");

        changed.models.clear();
        changed.caches.clear();
        assert_eq!(saved_item(&changed).kind, SavedKind::Cluster);
    }
}
