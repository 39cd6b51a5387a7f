// ── Action vocabulary ──
//
// Everything the bus accepts is one closed enum. The reducer matches it
// exhaustively; effects watch for the request variants and answer with
// the matching `_OK`/`_ERR` variants, correlated by `Ticket`.

use std::sync::Arc;

use serde::Serialize;
use strum::{Display, IntoStaticStr};

use crate::error::CoreError;
use crate::model::{
    AnyItem, Cache, Cluster, EntityId, Igfs, ItemRef, ItemType, Model, ShortCache, ShortCluster,
    ShortIgfs, ShortModel,
};
use crate::store::{ChangedItems, EditSession, ItemsEditAction, SliceAction, State};
use crate::transaction::Transaction;

/// Correlates a request action with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(pub u64);

// ── Payloads ────────────────────────────────────────────────────────

/// User-facing save failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveError {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum SavedKind {
    Cluster,
    Cache,
    Model,
    #[strum(serialize = "IGFS")]
    #[serde(rename = "IGFS")]
    Igfs,
}

impl From<ItemType> for SavedKind {
    fn from(t: ItemType) -> Self {
        match t {
            ItemType::Caches => Self::Cache,
            ItemType::Models => Self::Model,
            ItemType::Igfss => Self::Igfs,
        }
    }
}

/// The entity an advanced save should bring into focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedItem {
    pub kind: SavedKind,
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct BasicSaveRequest {
    pub cluster: Arc<Cluster>,
    pub caches: Vec<Arc<Cache>>,
    /// Session edits applied ahead of the optimistic update.
    pub prev_actions: Vec<Action>,
}

#[derive(Debug, Clone)]
pub struct AdvancedSaveRequest {
    pub changed: ChangedItems,
    pub prev_actions: Vec<Action>,
}

/// What to fetch from the backend into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    UserClusters,
    CompleteConfiguration(EntityId),
    AndEditCluster(ItemRef),
    Cache(ItemRef),
    Model(ItemRef),
    Igfs(ItemRef),
    ShortCaches {
        cluster_id: EntityId,
        ids: Vec<EntityId>,
    },
    ShortModels {
        cluster_id: EntityId,
        ids: Vec<EntityId>,
    },
    ShortIgfss {
        cluster_id: EntityId,
        ids: Vec<EntityId>,
    },
}

impl LoadRequest {
    /// Text for the loading indicator.
    pub fn loading_text(&self) -> &'static str {
        match self {
            Self::UserClusters => "Loading clusters...",
            Self::CompleteConfiguration(_) => "Loading cluster configuration...",
            Self::AndEditCluster(_) => "Loading cluster...",
            Self::Cache(_) | Self::ShortCaches { .. } => "Loading caches...",
            Self::Model(_) | Self::ShortModels { .. } => "Loading domain models...",
            Self::Igfs(_) | Self::ShortIgfss { .. } => "Loading IGFS...",
        }
    }
}

/// A cluster a removal or clone could not handle, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterFailure {
    pub id: EntityId,
    pub message: String,
}

/// A stored copy of `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClonedCluster {
    pub source: EntityId,
    pub id: EntityId,
    pub name: String,
}

// ── Action ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    // ── Entity store ──
    Clusters(SliceAction<Cluster>),
    ShortClusters(SliceAction<ShortCluster>),
    Caches(SliceAction<Cache>),
    ShortCaches(SliceAction<ShortCache>),
    Models(SliceAction<Model>),
    ShortModels(SliceAction<ShortModel>),
    Igfss(SliceAction<Igfs>),
    ShortIgfss(SliceAction<ShortIgfs>),
    BasicCaches(ItemsEditAction<Cache>),

    // ── Edit session ──
    EditCluster(Arc<Cluster>),
    UpsertCluster(Arc<Cluster>),
    UpsertClusterItem(AnyItem),
    /// With `confirm`, nothing changes until the user agrees.
    RemoveClusterItems {
        item_type: ItemType,
        item_ids: Vec<EntityId>,
        save: bool,
        confirm: bool,
    },
    RemoveClusterItemsConfirmed {
        item_type: ItemType,
        item_ids: Vec<EntityId>,
    },
    ResetEditChanges,
    SetEdit(Arc<EditSession>),

    // ── Loading indicator ──
    ShowConfigLoading(String),
    HideConfigLoading,

    // ── Transactions ──
    ApplyTransaction(Arc<Transaction>),
    UndoActions(Arc<Transaction>),

    // ── Basic save ──
    BasicSaveClusterAndCaches {
        ticket: Ticket,
        request: Arc<BasicSaveRequest>,
    },
    BasicSaveClusterAndCachesOk {
        ticket: Ticket,
        cluster: Arc<Cluster>,
        cluster_id: EntityId,
    },
    BasicSaveClusterAndCachesErr {
        ticket: Ticket,
        error: SaveError,
    },

    // ── Advanced save ──
    AdvancedSaveCompleteConfiguration {
        ticket: Ticket,
        request: Arc<AdvancedSaveRequest>,
    },
    AdvancedSaveCompleteConfigurationOk {
        ticket: Ticket,
        saved: SavedItem,
    },
    AdvancedSaveCompleteConfigurationErr {
        ticket: Ticket,
        error: SaveError,
    },

    // ── Loads ──
    Load {
        ticket: Ticket,
        request: LoadRequest,
    },
    LoadOk {
        ticket: Ticket,
    },
    LoadErr {
        ticket: Ticket,
        error: CoreError,
    },

    // ── Cluster removal ──
    RemoveClusters {
        ticket: Ticket,
        ids: Vec<EntityId>,
    },
    RemoveClustersOk {
        ticket: Ticket,
        removed: Vec<EntityId>,
        failed: Vec<ClusterFailure>,
    },

    // ── Cluster cloning ──
    CloneClusters {
        ticket: Ticket,
        ids: Vec<EntityId>,
    },
    /// `failed` is keyed by source cluster id.
    CloneClustersOk {
        ticket: Ticket,
        cloned: Vec<ClonedCluster>,
        failed: Vec<ClusterFailure>,
    },
}

impl Action {
    /// SCREAMING_SNAKE_CASE tag, for logs.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// The ticket of a request or result action.
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Self::BasicSaveClusterAndCaches { ticket, .. }
            | Self::BasicSaveClusterAndCachesOk { ticket, .. }
            | Self::BasicSaveClusterAndCachesErr { ticket, .. }
            | Self::AdvancedSaveCompleteConfiguration { ticket, .. }
            | Self::AdvancedSaveCompleteConfigurationOk { ticket, .. }
            | Self::AdvancedSaveCompleteConfigurationErr { ticket, .. }
            | Self::Load { ticket, .. }
            | Self::LoadOk { ticket }
            | Self::LoadErr { ticket, .. }
            | Self::RemoveClusters { ticket, .. }
            | Self::RemoveClustersOk { ticket, .. }
            | Self::CloneClusters { ticket, .. }
            | Self::CloneClustersOk { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }

    /// The action that puts back what `self` would change in `state`.
    ///
    /// `None` for actions the reducer ignores, and for transactions,
    /// which carry their own inverse.
    pub fn restore_point(&self, state: &State) -> Option<Action> {
        let restore = match self {
            Self::Clusters(_) => Self::Clusters(SliceAction::Set(Arc::clone(&state.clusters))),
            Self::ShortClusters(_) => {
                Self::ShortClusters(SliceAction::Set(Arc::clone(&state.short_clusters)))
            }
            Self::Caches(_) => Self::Caches(SliceAction::Set(Arc::clone(&state.caches))),
            Self::ShortCaches(_) => {
                Self::ShortCaches(SliceAction::Set(Arc::clone(&state.short_caches)))
            }
            Self::Models(_) => Self::Models(SliceAction::Set(Arc::clone(&state.models))),
            Self::ShortModels(_) => {
                Self::ShortModels(SliceAction::Set(Arc::clone(&state.short_models)))
            }
            Self::Igfss(_) => Self::Igfss(SliceAction::Set(Arc::clone(&state.igfss))),
            Self::ShortIgfss(_) => {
                Self::ShortIgfss(SliceAction::Set(Arc::clone(&state.short_igfss)))
            }
            Self::BasicCaches(_) => {
                Self::BasicCaches(ItemsEditAction::Set(Arc::clone(&state.basic_caches)))
            }
            Self::EditCluster(_)
            | Self::UpsertCluster(_)
            | Self::UpsertClusterItem(_)
            | Self::RemoveClusterItems { .. }
            | Self::RemoveClusterItemsConfirmed { .. }
            | Self::ResetEditChanges
            | Self::SetEdit(_) => Self::SetEdit(Arc::clone(&state.edit)),
            Self::ShowConfigLoading(_) | Self::HideConfigLoading => {
                if state.loading.is_loading {
                    Self::ShowConfigLoading(state.loading.text.clone().unwrap_or_default())
                } else {
                    Self::HideConfigLoading
                }
            }
            _ => return None,
        };
        Some(restore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_screaming_snake_case() {
        let action = Action::UpsertClusterItem(AnyItem::from(Cache::blank("A", Vec::new())));
        assert_eq!(action.kind(), "UPSERT_CLUSTER_ITEM");
        assert_eq!(Action::ResetEditChanges.kind(), "RESET_EDIT_CHANGES");
        let ok = Action::AdvancedSaveCompleteConfigurationOk {
            ticket: Ticket(1),
            saved: SavedItem {
                kind: SavedKind::Igfs,
                id: "i1".into(),
                name: "igfs".into(),
            },
        };
        assert_eq!(ok.kind(), "ADVANCED_SAVE_COMPLETE_CONFIGURATION_OK");
        assert_eq!(ok.ticket(), Some(Ticket(1)));
    }

    #[test]
    fn saved_kind_labels() {
        assert_eq!(SavedKind::Igfs.to_string(), "IGFS");
        assert_eq!(SavedKind::from(ItemType::Caches).to_string(), "Cache");
    }

    #[test]
    fn restore_point_snapshots_touched_slice() {
        let state = State::default();
        let upsert = Action::Caches(SliceAction::Upsert(Vec::new()));
        match upsert.restore_point(&state) {
            Some(Action::Caches(SliceAction::Set(slice))) => {
                assert!(Arc::ptr_eq(&slice, &state.caches));
            }
            other => panic!("unexpected restore point: {other:?}"),
        }
        assert!(Action::LoadOk { ticket: Ticket(3) }.restore_point(&state).is_none());
    }
}
