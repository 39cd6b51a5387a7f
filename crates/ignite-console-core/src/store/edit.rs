// ── Edit session ──
//
// The working copy of one cluster: its link arrays as edited so far, and
// the items changed locally but not yet saved.

use std::sync::Arc;

use serde::Serialize;

use crate::model::{Cache, Cluster, Entity, EntityId, Igfs, ItemType, Model};

/// Linked ids of one item kind plus the locally changed items among them.
#[derive(Debug)]
pub struct ItemsEdit<T> {
    pub ids: Vec<EntityId>,
    pub changed_items: Vec<Arc<T>>,
}

impl<T> Default for ItemsEdit<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            changed_items: Vec::new(),
        }
    }
}

impl<T> Clone for ItemsEdit<T> {
    fn clone(&self) -> Self {
        Self {
            ids: self.ids.clone(),
            changed_items: self.changed_items.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq for ItemsEdit<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids && self.changed_items == other.changed_items
    }
}

impl<T: Entity> ItemsEdit<T> {
    pub fn from_ids(ids: &[EntityId]) -> Self {
        Self {
            ids: ids.to_vec(),
            changed_items: Vec::new(),
        }
    }

    /// Move each item's id to the end of `ids` and replace its changed copy.
    pub fn upsert(&self, items: &[Arc<T>]) -> Self {
        let mut next = self.clone();
        for item in items {
            let id = item.id();
            next.ids.retain(|i| i != id);
            next.ids.push(id.clone());
            next.changed_items.retain(|c| c.id() != id);
            next.changed_items.push(Arc::clone(item));
        }
        next
    }

    pub fn remove(&self, ids: &[EntityId]) -> Self {
        Self {
            ids: self.ids.iter().filter(|i| !ids.contains(i)).cloned().collect(),
            changed_items: self
                .changed_items
                .iter()
                .filter(|c| !ids.contains(c.id()))
                .cloned()
                .collect(),
        }
    }

    pub fn changed(&self, id: &EntityId) -> Option<&Arc<T>> {
        self.changed_items.iter().find(|c| c.id() == id)
    }
}

// ── ItemsEditAction ─────────────────────────────────────────────────

/// Mutation of a free-standing `ItemsEdit` slice (the basic-screen cache list).
#[derive(Debug)]
pub enum ItemsEditAction<T> {
    Upsert(Vec<Arc<T>>),
    Remove(Vec<EntityId>),
    Set(Arc<ItemsEdit<T>>),
}

impl<T> Clone for ItemsEditAction<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Upsert(items) => Self::Upsert(items.clone()),
            Self::Remove(ids) => Self::Remove(ids.clone()),
            Self::Set(edit) => Self::Set(Arc::clone(edit)),
        }
    }
}

impl<T: Entity> ItemsEditAction<T> {
    pub fn reduce(&self, edit: &Arc<ItemsEdit<T>>) -> Arc<ItemsEdit<T>> {
        match self {
            Self::Upsert(items) if items.is_empty() => Arc::clone(edit),
            Self::Remove(ids) if ids.is_empty() => Arc::clone(edit),
            Self::Upsert(items) => Arc::new(edit.upsert(items)),
            Self::Remove(ids) => Arc::new(edit.remove(ids)),
            Self::Set(next) => Arc::clone(next),
        }
    }
}

// ── EditSession ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSession {
    pub cluster: Option<Arc<Cluster>>,
    pub caches: Arc<ItemsEdit<Cache>>,
    pub models: Arc<ItemsEdit<Model>>,
    pub igfss: Arc<ItemsEdit<Igfs>>,
}

impl EditSession {
    /// Start editing `cluster`, with link sets taken from its arrays.
    pub fn editing(cluster: Arc<Cluster>) -> Self {
        Self {
            caches: Arc::new(ItemsEdit::from_ids(&cluster.caches)),
            models: Arc::new(ItemsEdit::from_ids(&cluster.models)),
            igfss: Arc::new(ItemsEdit::from_ids(&cluster.igfss)),
            cluster: Some(cluster),
        }
    }

    pub fn ids(&self, item_type: ItemType) -> &[EntityId] {
        match item_type {
            ItemType::Caches => &self.caches.ids,
            ItemType::Models => &self.models.ids,
            ItemType::Igfss => &self.igfss.ids,
        }
    }

    /// Drop `ids` of one kind from both the link set and the changed items.
    pub fn without_items(&self, item_type: ItemType, ids: &[EntityId]) -> Self {
        let mut next = self.clone();
        match item_type {
            ItemType::Caches => next.caches = Arc::new(self.caches.remove(ids)),
            ItemType::Models => next.models = Arc::new(self.models.remove(ids)),
            ItemType::Igfss => next.igfss = Arc::new(self.igfss.remove(ids)),
        }
        next
    }

    /// The session as a save payload: the cluster with its link arrays
    /// replaced by the session ids, plus every changed item.
    ///
    /// `None` while no cluster is being edited.
    pub fn changed_items(&self) -> Option<ChangedItems> {
        let cluster = self.cluster.as_ref()?;
        let cluster = Cluster {
            caches: self.caches.ids.clone(),
            models: self.models.ids.clone(),
            igfss: self.igfss.ids.clone(),
            ..Cluster::clone(cluster)
        };
        Some(ChangedItems {
            cluster: Arc::new(cluster),
            caches: self.caches.changed_items.clone(),
            models: self.models.changed_items.clone(),
            igfss: self.igfss.changed_items.clone(),
        })
    }
}

// ── ChangedItems ────────────────────────────────────────────────────

/// What an advanced save sends: `{cluster, caches, models, igfss}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangedItems {
    pub cluster: Arc<Cluster>,
    pub caches: Vec<Arc<Cache>>,
    pub models: Vec<Arc<Model>>,
    pub igfss: Vec<Arc<Igfs>>,
}

// ── Loading indicator ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loading {
    pub is_loading: bool,
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(id: &str, name: &str) -> Arc<Cache> {
        let mut c = Cache::blank(name, Vec::new());
        c.id = id.into();
        Arc::new(c)
    }

    fn ids(edit: &ItemsEdit<Cache>) -> Vec<String> {
        edit.ids.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn upsert_dedupes_and_moves_to_end() {
        let edit = ItemsEdit::<Cache>::from_ids(&["a".into(), "b".into(), "c".into()]);
        let edit = edit.upsert(&[cache("a", "A")]);
        let edit = edit.upsert(&[cache("b", "B"), cache("a", "A2")]);
        assert_eq!(ids(&edit), ["c", "b", "a"]);
        assert_eq!(edit.changed_items.len(), 2);
        assert_eq!(edit.changed(&"a".into()).map(|c| c.name.as_str()), Some("A2"));
    }

    #[test]
    fn removal_does_not_poison_later_adds() {
        let edit = ItemsEdit::<Cache>::from_ids(&["a".into()]).upsert(&[cache("a", "A")]);
        let edit = edit.remove(&["a".into()]);
        assert!(edit.ids.is_empty());
        assert!(edit.changed_items.is_empty());

        let edit = edit.upsert(&[cache("a", "A")]);
        assert_eq!(ids(&edit), ["a"]);
    }

    #[test]
    fn changed_items_applies_session_ids() {
        let mut cluster = Cluster::blank("A");
        cluster.caches = vec!["a".into()];
        let session = EditSession::editing(Arc::new(cluster));
        let session = EditSession {
            caches: Arc::new(session.caches.upsert(&[cache("b", "B")])),
            ..session
        };

        let changed = session.changed_items().unwrap_or_else(|| panic!("editing"));
        assert_eq!(changed.cluster.caches, vec![EntityId::from("a"), EntityId::from("b")]);
        assert_eq!(changed.caches.len(), 1);
        assert!(EditSession::default().changed_items().is_none());
    }
}
