// ── Selectors ──
//
// Read-only projections over the state tree. Each selector remembers its
// last inputs by `Arc` identity (and its parameters by value) and hands
// back the previous output untouched when nothing it reads has changed,
// so consumers can detect change by pointer.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::model::{
    Cache, Cluster, Entity, EntityId, Igfs, ItemRef, Model, ShortCluster, unique_name,
};
use crate::store::{ClusterItem, ItemsEdit, Slice, State};

// ── Reference equality ──────────────────────────────────────────────

/// Identity comparison used for memo keys and change detection.
pub trait SameRefs {
    fn same_refs(&self, other: &Self) -> bool;
}

impl<T: ?Sized> SameRefs for Arc<T> {
    fn same_refs(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: SameRefs> SameRefs for Option<T> {
    fn same_refs(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_refs(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! impl_same_refs_tuple {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: SameRefs),+> SameRefs for ($($name,)+) {
            fn same_refs(&self, other: &Self) -> bool {
                $(self.$idx.same_refs(&other.$idx))&&+
            }
        }
    };
}

impl_same_refs_tuple!(A.0, B.1);
impl_same_refs_tuple!(A.0, B.1, C.2);
impl_same_refs_tuple!(A.0, B.1, C.2, D.3);

// ── Memo ────────────────────────────────────────────────────────────

/// Single-entry cache keyed on input identity and parameter value.
struct Memo<I, P, O> {
    last: Mutex<Option<(I, P, O)>>,
}

impl<I, P, O> Default for Memo<I, P, O> {
    fn default() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }
}

impl<I: SameRefs, P: PartialEq + Clone, O: Clone> Memo<I, P, O> {
    fn get(&self, inputs: I, params: &P, compute: impl FnOnce(&I, &P) -> O) -> O {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((li, lp, lo)) = last.as_ref() {
            if li.same_refs(&inputs) && lp == params {
                return lo.clone();
            }
        }
        let out = compute(&inputs, params);
        *last = Some((inputs, params.clone(), out.clone()));
        out
    }
}

// ── Selector ────────────────────────────────────────────────────────

/// A memoized projection of the state tree.
pub trait Selector: Send + Sync {
    type Output: Clone + SameRefs + Send + Sync;

    fn select(&self, state: &State) -> Self::Output;
}

// ── Current short items ─────────────────────────────────────────────

/// The edited cluster's items of one kind, in link order.
///
/// Each id resolves to the locally changed item (projected to its short
/// form) if there is one, else to the short store entry; ids that
/// resolve to neither are left out.
pub struct CurrentShortItems<T: ClusterItem> {
    memo: Memo<(Arc<ItemsEdit<T>>, Arc<Slice<T::Short>>), (), Arc<Vec<Arc<T::Short>>>>,
}

impl<T: ClusterItem> Default for CurrentShortItems<T> {
    fn default() -> Self {
        Self {
            memo: Memo::default(),
        }
    }
}

impl<T: ClusterItem> Selector for CurrentShortItems<T> {
    type Output = Arc<Vec<Arc<T::Short>>>;

    fn select(&self, state: &State) -> Self::Output {
        let inputs = (
            Arc::clone(T::edit_of(&state.edit)),
            Arc::clone(T::short_store(state)),
        );
        self.memo.get(inputs, &(), |(edit, shorts), ()| {
            let items = edit
                .ids
                .iter()
                .filter_map(|id| {
                    edit.changed(id)
                        .map(|changed| Arc::new(T::Short::from(changed)))
                        .or_else(|| shorts.get(id).cloned())
                })
                .collect();
            Arc::new(items)
        })
    }
}

pub fn select_current_short_caches() -> CurrentShortItems<Cache> {
    CurrentShortItems::default()
}

pub fn select_current_short_models() -> CurrentShortItems<Model> {
    CurrentShortItems::default()
}

pub fn select_current_short_igfss() -> CurrentShortItems<Igfs> {
    CurrentShortItems::default()
}

// ── Item to edit ────────────────────────────────────────────────────

/// The item an edit screen should show.
///
/// For `ItemRef::New`, a blank linked to the edited cluster and named
/// uniquely among loaded siblings; its id is fixed when the selector is
/// built, so repeated selections describe the same new item. For an
/// existing id, the in-session changed version wins over the stored one;
/// `None` until either is available.
pub struct ItemToEdit<T: ClusterItem> {
    item: ItemRef,
    blank_id: EntityId,
    memo: Memo<
        (Arc<ItemsEdit<T>>, Arc<Slice<T>>, Arc<Slice<T::Short>>),
        (ItemRef, Option<EntityId>),
        Option<Arc<T>>,
    >,
    _kind: PhantomData<fn() -> T>,
}

impl<T: ClusterItem> ItemToEdit<T> {
    pub fn new(item: ItemRef) -> Self {
        Self {
            item,
            blank_id: EntityId::generate(),
            memo: Memo::default(),
            _kind: PhantomData,
        }
    }

    /// Id a new item gets from this selector.
    pub fn blank_id(&self) -> &EntityId {
        &self.blank_id
    }
}

impl<T: ClusterItem> Selector for ItemToEdit<T> {
    type Output = Option<Arc<T>>;

    fn select(&self, state: &State) -> Self::Output {
        let inputs = (
            Arc::clone(T::edit_of(&state.edit)),
            Arc::clone(T::full_store(state)),
            Arc::clone(T::short_store(state)),
        );
        let params = (self.item.clone(), state.edit_cluster_id().cloned());
        self.memo.get(inputs, &params, |(edit, full, _), (item, _)| {
            let id = match item {
                ItemRef::New => &self.blank_id,
                ItemRef::Existing(id) => id,
            };
            if let Some(changed) = edit.changed(id) {
                return Some(Arc::clone(changed));
            }
            match item {
                ItemRef::New => Some(Arc::new(T::blank(state, self.blank_id.clone()))),
                ItemRef::Existing(id) => full.get(id).cloned(),
            }
        })
    }
}

pub fn select_cache_to_edit(item: ItemRef) -> ItemToEdit<Cache> {
    ItemToEdit::new(item)
}

pub fn select_model_to_edit(item: ItemRef) -> ItemToEdit<Model> {
    ItemToEdit::new(item)
}

pub fn select_igfs_to_edit(item: ItemRef) -> ItemToEdit<Igfs> {
    ItemToEdit::new(item)
}

// ── Cluster to edit ─────────────────────────────────────────────────

/// The cluster an edit screen should show; `New` yields a blank named
/// uniquely among the loaded short clusters.
pub struct ClusterToEdit {
    item: ItemRef,
    blank_id: EntityId,
    memo: Memo<(Arc<Slice<Cluster>>, Arc<Slice<ShortCluster>>), ItemRef, Option<Arc<Cluster>>>,
}

impl ClusterToEdit {
    pub fn new(item: ItemRef) -> Self {
        Self {
            item,
            blank_id: EntityId::generate(),
            memo: Memo::default(),
        }
    }
}

impl Selector for ClusterToEdit {
    type Output = Option<Arc<Cluster>>;

    fn select(&self, state: &State) -> Self::Output {
        let inputs = (
            Arc::clone(&state.clusters),
            Arc::clone(&state.short_clusters),
        );
        self.memo.get(inputs, &self.item, |(clusters, shorts), item| match item {
            ItemRef::New => {
                let name = unique_name("New cluster", shorts.values().map(|c| c.name()));
                let mut cluster = Cluster::blank(name);
                cluster.id = self.blank_id.clone();
                Some(Arc::new(cluster))
            }
            ItemRef::Existing(id) => clusters.get(id).cloned(),
        })
    }
}

pub fn select_cluster_to_edit(item: ItemRef) -> ClusterToEdit {
    ClusterToEdit::new(item)
}

// ── Complete cluster configuration ──────────────────────────────────

/// A cluster joined with the full versions of everything it links.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfiguration {
    pub cluster: Option<Arc<Cluster>>,
    pub caches: Vec<Arc<Cache>>,
    pub models: Vec<Arc<Model>>,
    pub igfss: Vec<Arc<Igfs>>,
    /// `false` while the cluster or any linked full item is not loaded.
    pub is_complete: bool,
}

pub struct CompleteClusterConfiguration {
    cluster_id: EntityId,
    memo: Memo<
        (
            Arc<Slice<Cluster>>,
            Arc<Slice<Cache>>,
            Arc<Slice<Model>>,
            Arc<Slice<Igfs>>,
        ),
        EntityId,
        Arc<ClusterConfiguration>,
    >,
}

impl CompleteClusterConfiguration {
    pub fn new(cluster_id: EntityId) -> Self {
        Self {
            cluster_id,
            memo: Memo::default(),
        }
    }
}

fn resolve<T>(slice: &Slice<T>, ids: &[EntityId]) -> (Vec<Arc<T>>, bool) {
    let items: Vec<Arc<T>> = ids.iter().filter_map(|id| slice.get(id).cloned()).collect();
    let complete = items.len() == ids.len();
    (items, complete)
}

impl Selector for CompleteClusterConfiguration {
    type Output = Arc<ClusterConfiguration>;

    fn select(&self, state: &State) -> Self::Output {
        let inputs = (
            Arc::clone(&state.clusters),
            Arc::clone(&state.caches),
            Arc::clone(&state.models),
            Arc::clone(&state.igfss),
        );
        self.memo.get(
            inputs,
            &self.cluster_id,
            |(clusters, caches, models, igfss), cluster_id| {
                let Some(cluster) = clusters.get(cluster_id).cloned() else {
                    return Arc::new(ClusterConfiguration {
                        cluster: None,
                        caches: Vec::new(),
                        models: Vec::new(),
                        igfss: Vec::new(),
                        is_complete: false,
                    });
                };
                let (caches, caches_done) = resolve(caches, &cluster.caches);
                let (models, models_done) = resolve(models, &cluster.models);
                let (igfss, igfss_done) = resolve(igfss, &cluster.igfss);
                Arc::new(ClusterConfiguration {
                    cluster: Some(cluster),
                    caches,
                    models,
                    igfss,
                    is_complete: caches_done && models_done && igfss_done,
                })
            },
        )
    }
}

pub fn select_complete_cluster_configuration(cluster_id: EntityId) -> CompleteClusterConfiguration {
    CompleteClusterConfiguration::new(cluster_id)
}

// ── Plain lookups ───────────────────────────────────────────────────

pub fn select_cluster(state: &State, id: &EntityId) -> Option<Arc<Cluster>> {
    state.clusters.get(id).cloned()
}

pub fn select_cache(state: &State, id: &EntityId) -> Option<Arc<Cache>> {
    state.caches.get(id).cloned()
}

pub fn select_model(state: &State, id: &EntityId) -> Option<Arc<Model>> {
    state.models.get(id).cloned()
}

pub fn select_igfs(state: &State, id: &EntityId) -> Option<Arc<Igfs>> {
    state.igfss.get(id).cloned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::action::Action;
    use crate::model::{AnyItem, ShortCache};
    use crate::store::{SliceAction, reduce};

    fn cluster(id: &str, caches: &[&str]) -> Arc<Cluster> {
        let mut c = Cluster::blank(id);
        c.id = id.into();
        c.caches = caches.iter().map(|&s| EntityId::from(s)).collect();
        Arc::new(c)
    }

    fn cache(id: &str, name: &str) -> Arc<Cache> {
        let mut c = Cache::blank(name, Vec::new());
        c.id = id.into();
        Arc::new(c)
    }

    fn short_cache(id: &str, name: &str) -> Arc<ShortCache> {
        Arc::new(ShortCache::from(&*cache(id, name)))
    }

    #[test]
    fn empty_ids_give_empty_list() {
        let state = reduce(
            &State::default(),
            &Action::ShortCaches(SliceAction::Upsert(vec![short_cache("ca1", "A")])),
        );
        let state = reduce(&state, &Action::EditCluster(cluster("c1", &[])));
        assert!(select_current_short_caches().select(&state).is_empty());
    }

    #[test]
    fn changed_item_resolves_without_short_store() {
        let state = reduce(&State::default(), &Action::EditCluster(cluster("c1", &["ca1"])));
        let state = reduce(
            &state,
            &Action::UpsertClusterItem(AnyItem::Cache(cache("ca1", "Foo"))),
        );

        let items = select_current_short_caches().select(&state);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, EntityId::from("ca1"));
        assert_eq!(items[0].name, "Foo");
    }

    #[test]
    fn unresolved_ids_are_dropped_and_order_kept() {
        let state = reduce(
            &State::default(),
            &Action::ShortCaches(SliceAction::Upsert(vec![
                short_cache("ca1", "A"),
                short_cache("ca3", "C"),
            ])),
        );
        let state = reduce(&state, &Action::EditCluster(cluster("c1", &["ca3", "ca2", "ca1"])));
        let names: Vec<String> = select_current_short_caches()
            .select(&state)
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, ["C", "A"]);
    }

    #[test]
    fn recomputes_only_when_inputs_change() {
        let selector = select_current_short_caches();
        let state = reduce(&State::default(), &Action::EditCluster(cluster("c1", &["ca1"])));
        let first = selector.select(&state);

        // Unrelated slice changes keep the output.
        let state = reduce(&state, &Action::ShowConfigLoading("x".into()));
        assert!(Arc::ptr_eq(&first, &selector.select(&state)));

        let state = reduce(
            &state,
            &Action::ShortCaches(SliceAction::Upsert(vec![short_cache("ca1", "A")])),
        );
        let second = selector.select(&state);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn new_cache_gets_unique_name_and_stable_id() {
        let state = reduce(
            &State::default(),
            &Action::ShortCaches(SliceAction::Upsert(vec![short_cache("ca1", "New cache")])),
        );
        let state = reduce(&state, &Action::EditCluster(cluster("c1", &[])));

        let selector = select_cache_to_edit(ItemRef::New);
        let blank = selector.select(&state).unwrap();
        assert_eq!(blank.name, "New cache (1)");
        assert_eq!(blank.clusters, vec![EntityId::from("c1")]);
        assert_eq!(&blank.id, selector.blank_id());

        let state = reduce(&state, &Action::ShowConfigLoading("x".into()));
        assert_eq!(selector.select(&state).unwrap().id, blank.id);
    }

    #[test]
    fn existing_item_prefers_session_version() {
        let state = reduce(
            &State::default(),
            &Action::Caches(SliceAction::Upsert(vec![cache("ca1", "Stored")])),
        );
        let selector = select_cache_to_edit(ItemRef::Existing("ca1".into()));
        assert_eq!(selector.select(&state).unwrap().name, "Stored");

        let state = reduce(&state, &Action::EditCluster(cluster("c1", &["ca1"])));
        let state = reduce(
            &state,
            &Action::UpsertClusterItem(AnyItem::Cache(cache("ca1", "Edited"))),
        );
        assert_eq!(selector.select(&state).unwrap().name, "Edited");

        assert!(select_cache_to_edit(ItemRef::Existing("zz".into())).select(&state).is_none());
    }

    #[test]
    fn new_cluster_name_is_unique() {
        let mut taken = Cluster::blank("New cluster");
        taken.id = "c1".into();
        let mut taken2 = Cluster::blank("New cluster (1)");
        taken2.id = "c2".into();
        let state = reduce(
            &State::default(),
            &Action::ShortClusters(SliceAction::Upsert(vec![
                Arc::new(ShortCluster::from(&taken)),
                Arc::new(ShortCluster::from(&taken2)),
            ])),
        );
        let blank = select_cluster_to_edit(ItemRef::New).select(&state).unwrap();
        assert_eq!(blank.name, "New cluster (2)");
    }

    #[test]
    fn complete_configuration_tracks_loading() {
        let selector = select_complete_cluster_configuration("c1".into());
        let state = State::default();
        assert!(!selector.select(&state).is_complete);

        let state = reduce(
            &state,
            &Action::Clusters(SliceAction::Upsert(vec![cluster("c1", &["ca1", "ca2"])])),
        );
        let partial = selector.select(&state);
        assert!(!partial.is_complete);
        assert!(partial.cluster.is_some());

        let state = reduce(
            &state,
            &Action::Caches(SliceAction::Upsert(vec![cache("ca1", "A"), cache("ca2", "B")])),
        );
        let done = selector.select(&state);
        assert!(done.is_complete);
        assert_eq!(done.caches.len(), 2);
    }

    #[test]
    fn plain_lookups() {
        let state = reduce(
            &State::default(),
            &Action::Caches(SliceAction::Upsert(vec![cache("ca1", "A")])),
        );
        assert!(select_cache(&state, &"ca1".into()).is_some());
        assert!(select_cluster(&state, &"ca1".into()).is_none());
        assert!(select_model(&state, &"m1".into()).is_none());
        assert!(select_igfs(&state, &"i1".into()).is_none());
    }
}
