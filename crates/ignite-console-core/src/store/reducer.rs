// ── Reducer root ──
//
// Pure `(state, action) -> state`. Only slices an action touches are
// replaced; everything else is carried over by `Arc` clone.

use std::sync::Arc;

use super::{EditSession, Loading, State};
use crate::action::Action;
use crate::model::AnyItem;

pub fn reduce(state: &State, action: &Action) -> State {
    let mut next = state.clone();
    match action {
        // ── Entity store ──
        Action::Clusters(a) => next.clusters = a.reduce(&state.clusters),
        Action::ShortClusters(a) => next.short_clusters = a.reduce(&state.short_clusters),
        Action::Caches(a) => next.caches = a.reduce(&state.caches),
        Action::ShortCaches(a) => next.short_caches = a.reduce(&state.short_caches),
        Action::Models(a) => next.models = a.reduce(&state.models),
        Action::ShortModels(a) => next.short_models = a.reduce(&state.short_models),
        Action::Igfss(a) => next.igfss = a.reduce(&state.igfss),
        Action::ShortIgfss(a) => next.short_igfss = a.reduce(&state.short_igfss),
        Action::BasicCaches(a) => next.basic_caches = a.reduce(&state.basic_caches),

        // ── Edit session ──
        Action::EditCluster(cluster) => {
            next.edit = Arc::new(EditSession::editing(Arc::clone(cluster)));
        }
        Action::UpsertCluster(cluster) => {
            next.edit = Arc::new(EditSession {
                cluster: Some(Arc::clone(cluster)),
                ..EditSession::clone(&state.edit)
            });
        }
        Action::UpsertClusterItem(item) => {
            next.edit = Arc::new(upsert_item(&state.edit, item));
        }
        Action::RemoveClusterItems {
            item_type,
            item_ids,
            confirm: false,
            ..
        }
        | Action::RemoveClusterItemsConfirmed {
            item_type,
            item_ids,
        } => {
            if !item_ids.is_empty() {
                next.edit = Arc::new(state.edit.without_items(*item_type, item_ids));
            }
        }
        Action::ResetEditChanges => {
            if let Some(cluster) = &state.edit.cluster {
                next.edit = Arc::new(EditSession::editing(Arc::clone(cluster)));
            }
        }
        Action::SetEdit(edit) => next.edit = Arc::clone(edit),

        // ── Loading indicator ──
        Action::ShowConfigLoading(text) => {
            next.loading = Arc::new(Loading {
                is_loading: true,
                text: Some(text.clone()),
            });
        }
        Action::HideConfigLoading => {
            if state.loading.is_loading {
                next.loading = Arc::new(Loading::default());
            }
        }

        // ── Transactions ──
        Action::ApplyTransaction(tx) => return tx.apply(state),
        Action::UndoActions(tx) => return tx.undo(state),

        // Requests and results are for effects and callers.
        Action::RemoveClusterItems { confirm: true, .. }
        | Action::BasicSaveClusterAndCaches { .. }
        | Action::BasicSaveClusterAndCachesOk { .. }
        | Action::BasicSaveClusterAndCachesErr { .. }
        | Action::AdvancedSaveCompleteConfiguration { .. }
        | Action::AdvancedSaveCompleteConfigurationOk { .. }
        | Action::AdvancedSaveCompleteConfigurationErr { .. }
        | Action::Load { .. }
        | Action::LoadOk { .. }
        | Action::LoadErr { .. }
        | Action::RemoveClusters { .. }
        | Action::RemoveClustersOk { .. }
        | Action::CloneClusters { .. }
        | Action::CloneClustersOk { .. } => {}
    }
    next
}

fn upsert_item(edit: &EditSession, item: &AnyItem) -> EditSession {
    let mut next = edit.clone();
    match item {
        AnyItem::Cache(c) => next.caches = Arc::new(edit.caches.upsert(&[Arc::clone(c)])),
        AnyItem::Model(m) => next.models = Arc::new(edit.models.upsert(&[Arc::clone(m)])),
        AnyItem::Igfs(i) => next.igfss = Arc::new(edit.igfss.upsert(&[Arc::clone(i)])),
    }
    next
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Cache, Cluster, EntityId, ItemType, Model, ShortCluster};
    use crate::store::SliceAction;

    fn cluster(id: &str, caches: &[&str]) -> Arc<Cluster> {
        let mut c = Cluster::blank(format!("Cluster {id}"));
        c.id = id.into();
        c.caches = caches.iter().map(|&s| EntityId::from(s)).collect();
        Arc::new(c)
    }

    fn cache(id: &str, name: &str) -> AnyItem {
        let mut c = Cache::blank(name, Vec::new());
        c.id = id.into();
        AnyItem::from(c)
    }

    fn cache_ids(state: &State) -> Vec<String> {
        state.edit.caches.ids.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn edit_cluster_initializes_session() {
        let state = reduce(&State::default(), &Action::EditCluster(cluster("c1", &["a", "b"])));
        assert_eq!(cache_ids(&state), ["a", "b"]);
        assert!(state.edit.caches.changed_items.is_empty());
    }

    #[test]
    fn untouched_slices_keep_identity() {
        let s0 = State::default();
        let s1 = reduce(&s0, &Action::EditCluster(cluster("c1", &[])));
        assert!(Arc::ptr_eq(&s0.caches, &s1.caches));
        assert!(Arc::ptr_eq(&s0.short_clusters, &s1.short_clusters));
        assert!(!Arc::ptr_eq(&s0.edit, &s1.edit));

        let s2 = reduce(
            &s1,
            &Action::ShortClusters(SliceAction::Upsert(vec![Arc::new(ShortCluster::from(
                &*cluster("c1", &[]),
            ))])),
        );
        assert!(Arc::ptr_eq(&s1.edit, &s2.edit));
        assert!(Arc::ptr_eq(&s1.clusters, &s2.clusters));
    }

    #[test]
    fn repeated_upserts_keep_most_recent_position() {
        let mut state = reduce(&State::default(), &Action::EditCluster(cluster("c1", &[])));
        for id in ["a", "b", "a", "c", "b"] {
            state = reduce(&state, &Action::UpsertClusterItem(cache(id, id)));
        }
        assert_eq!(cache_ids(&state), ["a", "c", "b"]);
        assert_eq!(state.edit.caches.changed_items.len(), 3);
    }

    #[test]
    fn upsert_cluster_keeps_link_sets() {
        let state = reduce(&State::default(), &Action::EditCluster(cluster("c1", &["a"])));
        let state = reduce(&state, &Action::UpsertClusterItem(cache("b", "B")));
        let state = reduce(&state, &Action::UpsertCluster(cluster("c1", &[])));
        assert_eq!(cache_ids(&state), ["a", "b"]);
        assert_eq!(state.edit.cluster.as_ref().unwrap().caches.len(), 0);
    }

    #[test]
    fn remove_then_readd() {
        let state = reduce(&State::default(), &Action::EditCluster(cluster("c1", &["a", "b"])));
        let state = reduce(
            &state,
            &Action::RemoveClusterItems {
                item_type: ItemType::Caches,
                item_ids: vec!["a".into()],
                save: false,
                confirm: false,
            },
        );
        assert_eq!(cache_ids(&state), ["b"]);

        let state = reduce(&state, &Action::UpsertClusterItem(cache("a", "A")));
        assert_eq!(cache_ids(&state), ["b", "a"]);
    }

    #[test]
    fn confirmed_removal_waits_for_confirmation() {
        let state = reduce(&State::default(), &Action::EditCluster(cluster("c1", &["a"])));
        let pending = reduce(
            &state,
            &Action::RemoveClusterItems {
                item_type: ItemType::Caches,
                item_ids: vec!["a".into()],
                save: false,
                confirm: true,
            },
        );
        assert!(Arc::ptr_eq(&state.edit, &pending.edit));

        let done = reduce(
            &pending,
            &Action::RemoveClusterItemsConfirmed {
                item_type: ItemType::Caches,
                item_ids: vec!["a".into()],
            },
        );
        assert!(cache_ids(&done).is_empty());
    }

    #[test]
    fn reset_edit_changes_reverts_to_cluster_links() {
        let state = reduce(&State::default(), &Action::EditCluster(cluster("c1", &["a"])));
        let state = reduce(&state, &Action::UpsertClusterItem(cache("b", "B")));
        let mut model = Model::blank(Vec::new());
        model.id = "m1".into();
        let state = reduce(&state, &Action::UpsertClusterItem(AnyItem::from(model)));

        let state = reduce(&state, &Action::ResetEditChanges);
        assert_eq!(cache_ids(&state), ["a"]);
        assert!(state.edit.models.ids.is_empty());
        assert!(state.edit.caches.changed_items.is_empty());
    }

    #[test]
    fn loading_indicator() {
        let state = reduce(&State::default(), &Action::ShowConfigLoading("Loading...".into()));
        assert_eq!(
            *state.loading,
            Loading {
                is_loading: true,
                text: Some("Loading...".into())
            }
        );
        let hidden = reduce(&state, &Action::HideConfigLoading);
        assert!(!hidden.loading.is_loading);
        let again = reduce(&hidden, &Action::HideConfigLoading);
        assert!(Arc::ptr_eq(&hidden.loading, &again.loading));
    }

    #[test]
    fn basic_caches_slice() {
        let mut c = Cache::blank("A", Vec::new());
        c.id = "a".into();
        let c = Arc::new(c);
        let state = reduce(
            &State::default(),
            &Action::BasicCaches(crate::store::ItemsEditAction::Upsert(vec![Arc::clone(&c)])),
        );
        assert_eq!(state.basic_caches.ids, vec![EntityId::from("a")]);
        let state = reduce(
            &state,
            &Action::BasicCaches(crate::store::ItemsEditAction::Remove(vec!["a".into()])),
        );
        assert!(state.basic_caches.ids.is_empty());
    }
}
