// ── Normalized entity slice ──
//
// One id-keyed map per entity kind. Slices are immutable: every change
// yields a new `Arc`, and inputs that change nothing hand back the same
// `Arc`, so selectors can detect change by pointer.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::model::{Entity, EntityId};

/// An ordered, id-keyed set of entities plus its `pristine` flag.
///
/// `pristine` is `true` until the first upsert or remove after a reset.
pub struct Slice<T> {
    value: IndexMap<EntityId, Arc<T>>,
    pristine: bool,
}

impl<T> Default for Slice<T> {
    fn default() -> Self {
        Self {
            value: IndexMap::new(),
            pristine: true,
        }
    }
}

impl<T> Clone for Slice<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            pristine: self.pristine,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Slice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("pristine", &self.pristine)
            .field("value", &self.value)
            .finish()
    }
}

impl<T: PartialEq> PartialEq for Slice<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pristine == other.pristine
            && self.value.len() == other.value.len()
            && self
                .value
                .iter()
                .zip(other.value.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && (Arc::ptr_eq(va, vb) || va == vb))
    }
}

impl<T: Entity> Slice<T> {
    /// A non-pristine slice holding `items` in the given order.
    pub fn loaded(items: impl IntoIterator<Item = Arc<T>>) -> Self {
        Self {
            value: items
                .into_iter()
                .map(|item| (item.id().clone(), item))
                .collect(),
            pristine: false,
        }
    }

    /// Insert or replace by id. Replaced entries keep their position.
    pub fn upsert(self: &Arc<Self>, items: &[Arc<T>]) -> Arc<Self> {
        if items.is_empty() {
            return Arc::clone(self);
        }
        let mut value = self.value.clone();
        for item in items {
            value.insert(item.id().clone(), Arc::clone(item));
        }
        Arc::new(Self {
            value,
            pristine: false,
        })
    }

    pub fn remove(self: &Arc<Self>, ids: &[EntityId]) -> Arc<Self> {
        if ids.is_empty() {
            return Arc::clone(self);
        }
        let mut value = self.value.clone();
        for id in ids {
            value.shift_remove(id);
        }
        Arc::new(Self {
            value,
            pristine: false,
        })
    }
}

impl<T> Slice<T> {
    pub fn get(&self, id: &EntityId) -> Option<&Arc<T>> {
        self.value.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.value.contains_key(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<T>> {
        self.value.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.value.keys()
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn is_pristine(&self) -> bool {
        self.pristine
    }
}

// ── SliceAction ─────────────────────────────────────────────────────

/// Mutation of a single slice.
#[derive(Debug)]
pub enum SliceAction<T> {
    Upsert(Vec<Arc<T>>),
    Remove(Vec<EntityId>),
    /// Install a whole slice verbatim (bulk load, rollback).
    Set(Arc<Slice<T>>),
    Reset,
}

impl<T> Clone for SliceAction<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Upsert(items) => Self::Upsert(items.clone()),
            Self::Remove(ids) => Self::Remove(ids.clone()),
            Self::Set(slice) => Self::Set(Arc::clone(slice)),
            Self::Reset => Self::Reset,
        }
    }
}

impl<T: Entity> SliceAction<T> {
    pub fn reduce(&self, slice: &Arc<Slice<T>>) -> Arc<Slice<T>> {
        match self {
            Self::Upsert(items) => slice.upsert(items),
            Self::Remove(ids) => slice.remove(ids),
            Self::Set(next) => Arc::clone(next),
            Self::Reset if slice.is_pristine() && slice.is_empty() => Arc::clone(slice),
            Self::Reset => Arc::new(Slice::default()),
        }
    }

    /// `true` for upserts/removes that would leave the slice untouched.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Upsert(items) => items.is_empty(),
            Self::Remove(ids) => ids.is_empty(),
            Self::Set(_) | Self::Reset => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShortCache;

    fn short(id: &str, name: &str) -> Arc<ShortCache> {
        Arc::new(ShortCache {
            id: id.into(),
            name: name.into(),
            cache_mode: None,
            atomicity_mode: None,
            backups: None,
            clusters: Vec::new(),
        })
    }

    #[test]
    fn empty_input_keeps_reference() {
        let slice = Arc::new(Slice::<ShortCache>::default());
        assert!(Arc::ptr_eq(&slice, &slice.upsert(&[])));
        assert!(Arc::ptr_eq(&slice, &slice.remove(&[])));
    }

    #[test]
    fn upsert_marks_dirty_and_replaces_in_place() {
        let slice = Arc::new(Slice::default());
        let slice = slice.upsert(&[short("a", "A"), short("b", "B")]);
        assert!(!slice.is_pristine());

        let next = slice.upsert(&[short("a", "A2")]);
        assert!(!Arc::ptr_eq(&slice, &next));
        let names: Vec<&str> = next.values().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A2", "B"]);
        // The previous slice is untouched.
        assert_eq!(slice.get(&"a".into()).map(|c| c.name.as_str()), Some("A"));
    }

    #[test]
    fn upsert_is_idempotent() {
        let items = [short("a", "A"), short("b", "B")];
        let once = Arc::new(Slice::default()).upsert(&items);
        let twice = once.upsert(&items);
        assert_eq!(*once, *twice);
    }

    #[test]
    fn remove_drops_ids() {
        let slice = Arc::new(Slice::loaded([short("a", "A"), short("b", "B")]));
        let next = slice.remove(&["a".into(), "zzz".into()]);
        assert_eq!(next.ids().collect::<Vec<_>>(), [&EntityId::from("b")]);
    }

    #[test]
    fn reset_restores_pristine() {
        let slice = Arc::new(Slice::loaded([short("a", "A")]));
        let reset = SliceAction::Reset.reduce(&slice);
        assert!(reset.is_pristine());
        assert!(reset.is_empty());
        // Resetting a pristine, empty slice changes nothing.
        assert!(Arc::ptr_eq(&reset, &SliceAction::Reset.reduce(&reset)));
    }

    #[test]
    fn set_installs_verbatim() {
        let slice = Arc::new(Slice::default());
        let other = Arc::new(Slice::loaded([short("x", "X")]));
        let next = SliceAction::Set(Arc::clone(&other)).reduce(&slice);
        assert!(Arc::ptr_eq(&next, &other));
    }
}
