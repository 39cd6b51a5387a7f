// ── Domain model ──
//
// Canonical configuration documents and their identifiers.

pub mod entities;
pub mod entity_id;
pub mod naming;

pub use entities::{
    AnyItem, Cache, Cluster, CompleteConfiguration, Discovery, Entity, Igfs, ItemType, Model,
    ShortCache, ShortCluster, ShortIgfs, ShortModel,
};
pub use entity_id::{EntityId, ItemRef};
pub use naming::unique_name;
