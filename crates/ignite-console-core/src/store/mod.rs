// ── State tree ──
//
// Every slice sits behind its own `Arc`. The reducer swaps only the
// slices an action touches, so untouched slices keep pointer identity
// across reductions.

mod edit;
mod items;
pub(crate) mod reducer;
mod slice;

use std::sync::Arc;

pub use edit::{ChangedItems, EditSession, ItemsEdit, ItemsEditAction, Loading};
pub use items::ClusterItem;
pub use reducer::reduce;
pub use slice::{Slice, SliceAction};

use crate::model::{
    Cache, Cluster, EntityId, Igfs, Model, ShortCache, ShortCluster, ShortIgfs, ShortModel,
};

/// The whole configuration state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub clusters: Arc<Slice<Cluster>>,
    pub short_clusters: Arc<Slice<ShortCluster>>,
    pub caches: Arc<Slice<Cache>>,
    pub short_caches: Arc<Slice<ShortCache>>,
    pub models: Arc<Slice<Model>>,
    pub short_models: Arc<Slice<ShortModel>>,
    pub igfss: Arc<Slice<Igfs>>,
    pub short_igfss: Arc<Slice<ShortIgfs>>,
    /// Cache list of the basic configuration screen.
    pub basic_caches: Arc<ItemsEdit<Cache>>,
    pub edit: Arc<EditSession>,
    pub loading: Arc<Loading>,
}

impl State {
    /// `true` if every slice of `self` is the same allocation as in `other`.
    pub fn same_as(&self, other: &State) -> bool {
        Arc::ptr_eq(&self.clusters, &other.clusters)
            && Arc::ptr_eq(&self.short_clusters, &other.short_clusters)
            && Arc::ptr_eq(&self.caches, &other.caches)
            && Arc::ptr_eq(&self.short_caches, &other.short_caches)
            && Arc::ptr_eq(&self.models, &other.models)
            && Arc::ptr_eq(&self.short_models, &other.short_models)
            && Arc::ptr_eq(&self.igfss, &other.igfss)
            && Arc::ptr_eq(&self.short_igfss, &other.short_igfss)
            && Arc::ptr_eq(&self.basic_caches, &other.basic_caches)
            && Arc::ptr_eq(&self.edit, &other.edit)
            && Arc::ptr_eq(&self.loading, &other.loading)
    }

    /// The cluster currently being edited, if any.
    pub fn edit_cluster_id(&self) -> Option<&EntityId> {
        self.edit.cluster.as_ref().map(|c| &c.id)
    }
}
