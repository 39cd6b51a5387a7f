// ── Cluster item kinds ──
//
// Caches, models and IGFS share one shape: a full slice, a short slice,
// and an `ItemsEdit` in the session. `ClusterItem` lets selectors and
// effects be written once over all three.

use std::fmt::Debug;
use std::sync::Arc;

use serde::Serialize;

use super::{EditSession, ItemsEdit, Slice, SliceAction, State};
use crate::action::Action;
use crate::model::{
    AnyItem, Cache, Entity, EntityId, Igfs, ItemType, Model, ShortCache, ShortIgfs, ShortModel, unique_name,
};

pub trait ClusterItem:
    Entity + Clone + PartialEq + Debug + Serialize + Send + Sync + 'static
{
    type Short: Entity + for<'a> From<&'a Self> + PartialEq + Debug + Send + Sync + 'static;

    const ITEM_TYPE: ItemType;

    fn edit_of(edit: &EditSession) -> &Arc<ItemsEdit<Self>>;
    fn full_store(state: &State) -> &Arc<Slice<Self>>;
    fn short_store(state: &State) -> &Arc<Slice<Self::Short>>;

    /// A fresh, unsaved item with the given id, linked to the edited
    /// cluster.
    fn blank(state: &State, id: EntityId) -> Self;

    fn into_item(self: Arc<Self>) -> AnyItem;

    fn full_action(action: SliceAction<Self>) -> Action;
    fn short_action(action: SliceAction<Self::Short>) -> Action;
}

fn edited_cluster_ids(state: &State) -> Vec<EntityId> {
    state.edit_cluster_id().cloned().into_iter().collect()
}

impl ClusterItem for Cache {
    type Short = ShortCache;

    const ITEM_TYPE: ItemType = ItemType::Caches;

    fn edit_of(edit: &EditSession) -> &Arc<ItemsEdit<Self>> {
        &edit.caches
    }

    fn full_store(state: &State) -> &Arc<Slice<Self>> {
        &state.caches
    }

    fn short_store(state: &State) -> &Arc<Slice<Self::Short>> {
        &state.short_caches
    }

    fn blank(state: &State, id: EntityId) -> Self {
        let name = unique_name("New cache", state.short_caches.values().map(|c| c.name()));
        Cache {
            id,
            ..Cache::blank(name, edited_cluster_ids(state))
        }
    }

    fn into_item(self: Arc<Self>) -> AnyItem {
        AnyItem::Cache(self)
    }

    fn full_action(action: SliceAction<Self>) -> Action {
        Action::Caches(action)
    }

    fn short_action(action: SliceAction<Self::Short>) -> Action {
        Action::ShortCaches(action)
    }
}

impl ClusterItem for Model {
    type Short = ShortModel;

    const ITEM_TYPE: ItemType = ItemType::Models;

    fn edit_of(edit: &EditSession) -> &Arc<ItemsEdit<Self>> {
        &edit.models
    }

    fn full_store(state: &State) -> &Arc<Slice<Self>> {
        &state.models
    }

    fn short_store(state: &State) -> &Arc<Slice<Self::Short>> {
        &state.short_models
    }

    fn blank(state: &State, id: EntityId) -> Self {
        Model {
            id,
            ..Model::blank(edited_cluster_ids(state))
        }
    }

    fn into_item(self: Arc<Self>) -> AnyItem {
        AnyItem::Model(self)
    }

    fn full_action(action: SliceAction<Self>) -> Action {
        Action::Models(action)
    }

    fn short_action(action: SliceAction<Self::Short>) -> Action {
        Action::ShortModels(action)
    }
}

impl ClusterItem for Igfs {
    type Short = ShortIgfs;

    const ITEM_TYPE: ItemType = ItemType::Igfss;

    fn edit_of(edit: &EditSession) -> &Arc<ItemsEdit<Self>> {
        &edit.igfss
    }

    fn full_store(state: &State) -> &Arc<Slice<Self>> {
        &state.igfss
    }

    fn short_store(state: &State) -> &Arc<Slice<Self::Short>> {
        &state.short_igfss
    }

    fn blank(state: &State, id: EntityId) -> Self {
        let name = unique_name("New IGFS", state.short_igfss.values().map(|i| i.name()));
        Igfs {
            id,
            ..Igfs::blank(name, edited_cluster_ids(state))
        }
    }

    fn into_item(self: Arc<Self>) -> AnyItem {
        AnyItem::Igfs(self)
    }

    fn full_action(action: SliceAction<Self>) -> Action {
        Action::Igfss(action)
    }

    fn short_action(action: SliceAction<Self::Short>) -> Action {
        Action::ShortIgfss(action)
    }
}
