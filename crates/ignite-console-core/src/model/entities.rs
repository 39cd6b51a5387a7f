// ── Configuration entities ──
//
// Full documents as the backend stores them, plus the short projections
// list screens use. Every full entity keeps the fields it does not model
// in `extra`, so a document read from the backend is written back intact.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString, IntoStaticStr};

use super::entity_id::EntityId;

/// Common accessors shared by every stored document.
pub trait Entity {
    fn id(&self) -> &EntityId;
    /// Display name (the value type, for models).
    fn name(&self) -> &str;
}

// ── Cluster ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<Discovery>,
    #[serde(default)]
    pub caches: Vec<EntityId>,
    #[serde(default)]
    pub models: Vec<EntityId>,
    #[serde(default)]
    pub igfss: Vec<EntityId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Discovery SPI settings. Only the kind is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl Cluster {
    /// A blank cluster with a fresh id and multicast discovery.
    pub fn blank(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(),
            space: None,
            name: name.into(),
            discovery: Some(Discovery {
                kind: Some("Multicast".into()),
                settings: Map::new(),
            }),
            caches: Vec::new(),
            models: Vec::new(),
            igfss: Vec::new(),
            extra: Map::new(),
        }
    }

    /// The link array for one item kind.
    pub fn links(&self, item_type: ItemType) -> &[EntityId] {
        match item_type {
            ItemType::Caches => &self.caches,
            ItemType::Models => &self.models,
            ItemType::Igfss => &self.igfss,
        }
    }
}

// ── Cache ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cache {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atomicity_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backups: Option<u32>,
    #[serde(default)]
    pub clusters: Vec<EntityId>,
    /// Linked domain models.
    #[serde(default)]
    pub domains: Vec<EntityId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cache {
    pub fn blank(name: impl Into<String>, clusters: Vec<EntityId>) -> Self {
        Self {
            id: EntityId::generate(),
            space: None,
            name: name.into(),
            cache_mode: Some("PARTITIONED".into()),
            atomicity_mode: Some("ATOMIC".into()),
            backups: Some(0),
            clusters,
            domains: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Lay this cache's fields over a stored version of the same cache.
    ///
    /// Modeled fields come from `self`; unmodeled fields are merged with
    /// `self` winning on key collisions.
    pub fn overlay(&self, base: &Cache) -> Cache {
        let mut extra = base.extra.clone();
        extra.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Cache {
            space: self.space.clone().or_else(|| base.space.clone()),
            extra,
            ..self.clone()
        }
    }
}

// ── Model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub key_type: String,
    #[serde(default)]
    pub caches: Vec<EntityId>,
    #[serde(default)]
    pub clusters: Vec<EntityId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Model {
    pub fn blank(clusters: Vec<EntityId>) -> Self {
        Self {
            id: EntityId::generate(),
            space: None,
            value_type: String::new(),
            key_type: String::new(),
            caches: Vec::new(),
            clusters,
            extra: Map::new(),
        }
    }
}

// ── IGFS ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Igfs {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<String>,
    #[serde(default)]
    pub clusters: Vec<EntityId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Igfs {
    pub fn blank(name: impl Into<String>, clusters: Vec<EntityId>) -> Self {
        Self {
            id: EntityId::generate(),
            space: None,
            name: name.into(),
            default_mode: Some("DUAL_ASYNC".into()),
            clusters,
            extra: Map::new(),
        }
    }
}

// ── Short projections ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortCluster {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    /// Discovery kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<String>,
    #[serde(default)]
    pub caches_count: usize,
    #[serde(default)]
    pub models_count: usize,
    #[serde(default)]
    pub igfs_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortCache {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atomicity_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backups: Option<u32>,
    #[serde(default)]
    pub clusters: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortModel {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub key_type: String,
    #[serde(default)]
    pub caches: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortIgfs {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<String>,
    #[serde(default)]
    pub clusters: Vec<EntityId>,
}

impl From<&Cluster> for ShortCluster {
    fn from(c: &Cluster) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            discovery: c.discovery.as_ref().and_then(|d| d.kind.clone()),
            caches_count: c.caches.len(),
            models_count: c.models.len(),
            igfs_count: c.igfss.len(),
        }
    }
}

impl From<&Cache> for ShortCache {
    fn from(c: &Cache) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            cache_mode: c.cache_mode.clone(),
            atomicity_mode: c.atomicity_mode.clone(),
            backups: c.backups,
            clusters: c.clusters.clone(),
        }
    }
}

impl From<&Model> for ShortModel {
    fn from(m: &Model) -> Self {
        Self {
            id: m.id.clone(),
            value_type: m.value_type.clone(),
            key_type: m.key_type.clone(),
            caches: m.caches.clone(),
        }
    }
}

impl From<&Igfs> for ShortIgfs {
    fn from(i: &Igfs) -> Self {
        Self {
            id: i.id.clone(),
            name: i.name.clone(),
            default_mode: i.default_mode.clone(),
            clusters: i.clusters.clone(),
        }
    }
}

// ── Entity impls ────────────────────────────────────────────────────

macro_rules! impl_entity {
    ($($ty:ty => $name:ident),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> &EntityId {
                    &self.id
                }

                fn name(&self) -> &str {
                    &self.$name
                }
            }
        )*
    };
}

impl_entity! {
    Cluster => name,
    Cache => name,
    Model => value_type,
    Igfs => name,
    ShortCluster => name,
    ShortCache => name,
    ShortModel => value_type,
    ShortIgfs => name,
}

// ── Item kinds ──────────────────────────────────────────────────────

/// The three kinds of items a cluster links to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemType {
    Caches,
    Models,
    Igfss,
}

impl ItemType {
    /// Singular label used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Caches => "Cache",
            Self::Models => "Model",
            Self::Igfss => "IGFS",
        }
    }
}

/// Any one cluster item, as edited in a session.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyItem {
    Cache(Arc<Cache>),
    Model(Arc<Model>),
    Igfs(Arc<Igfs>),
}

impl AnyItem {
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Cache(_) => ItemType::Caches,
            Self::Model(_) => ItemType::Models,
            Self::Igfs(_) => ItemType::Igfss,
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Self::Cache(c) => &c.id,
            Self::Model(m) => &m.id,
            Self::Igfs(i) => &i.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Cache(c) => c.name(),
            Self::Model(m) => m.name(),
            Self::Igfs(i) => i.name(),
        }
    }
}

impl From<Cache> for AnyItem {
    fn from(c: Cache) -> Self {
        Self::Cache(Arc::new(c))
    }
}

impl From<Model> for AnyItem {
    fn from(m: Model) -> Self {
        Self::Model(Arc::new(m))
    }
}

impl From<Igfs> for AnyItem {
    fn from(i: Igfs) -> Self {
        Self::Igfs(Arc::new(i))
    }
}

// ── Complete configuration ──────────────────────────────────────────

/// A cluster with every full item it links, as exchanged with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteConfiguration {
    pub cluster: Cluster,
    #[serde(default)]
    pub caches: Vec<Cache>,
    #[serde(default, alias = "domains")]
    pub models: Vec<Model>,
    #[serde(default)]
    pub igfss: Vec<Igfs>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cluster_round_trips_unmodeled_fields() {
        let raw = json!({
            "_id": "c1",
            "name": "Cluster A",
            "discovery": { "kind": "Vm", "Vm": { "addresses": ["127.0.0.1:47500"] } },
            "caches": ["ca1"],
            "models": [],
            "igfss": [],
            "binaryConfiguration": { "compactFooter": true }
        });
        let cluster: Cluster = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(cluster.caches, vec![EntityId::from("ca1")]);
        assert_eq!(
            cluster.discovery.as_ref().and_then(|d| d.kind.as_deref()),
            Some("Vm")
        );
        assert_eq!(serde_json::to_value(&cluster).unwrap(), raw);
    }

    #[test]
    fn short_cluster_from_full() {
        let mut cluster = Cluster::blank("Cluster A");
        cluster.caches = vec!["ca1".into(), "ca2".into()];
        let short = ShortCluster::from(&cluster);
        assert_eq!(short.name, "Cluster A");
        assert_eq!(short.discovery.as_deref(), Some("Multicast"));
        assert_eq!(short.caches_count, 2);
        assert_eq!(short.igfs_count, 0);
    }

    #[test]
    fn model_name_is_value_type() {
        let mut model = Model::blank(Vec::new());
        model.value_type = "org.example.Person".into();
        assert_eq!(model.name(), "org.example.Person");
        assert_eq!(ShortModel::from(&model).name(), "org.example.Person");
    }

    #[test]
    fn cache_overlay_keeps_stored_extras() {
        let stored: Cache = serde_json::from_value(json!({
            "_id": "ca1",
            "name": "Orders",
            "space": "s1",
            "readThrough": true,
            "evictionPolicy": { "kind": "LRU" }
        }))
        .unwrap();
        let edited: Cache = serde_json::from_value(json!({
            "_id": "ca1",
            "name": "Orders v2",
            "evictionPolicy": { "kind": "FIFO" }
        }))
        .unwrap();

        let merged = edited.overlay(&stored);
        assert_eq!(merged.name, "Orders v2");
        assert_eq!(merged.space.as_deref(), Some("s1"));
        assert_eq!(merged.extra["readThrough"], json!(true));
        assert_eq!(merged.extra["evictionPolicy"], json!({ "kind": "FIFO" }));
    }

    #[test]
    fn item_type_string_forms() {
        assert_eq!(ItemType::Igfss.to_string(), "igfss");
        assert_eq!("models".parse::<ItemType>().unwrap(), ItemType::Models);
        assert_eq!(serde_json::to_string(&ItemType::Caches).unwrap(), "\"caches\"");
    }

    #[test]
    fn complete_configuration_accepts_domains_alias() {
        let raw = json!({
            "cluster": { "_id": "c1", "name": "A", "models": ["m1"] },
            "domains": [{ "_id": "m1", "valueType": "a.B" }]
        });
        let config: CompleteConfiguration = serde_json::from_value(raw).unwrap();
        assert_eq!(config.models.len(), 1);
        assert!(config.caches.is_empty());
    }
}
