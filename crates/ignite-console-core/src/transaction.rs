// ── Transactions ──
//
// An optimistic update is a list of forward actions plus the linear undo
// stack that reverts them. Both are applied by the reducer in one step,
// so observers never see a half-applied update or a half-undone one.

use crate::action::Action;
use crate::store::{State, reduce};

#[derive(Debug)]
pub struct Transaction {
    forward: Vec<Action>,
    inverse: Vec<Action>,
}

impl Transaction {
    /// Capture the inverse of `forward` as it would apply to `state`.
    ///
    /// Each forward action contributes one restore action snapshotting the
    /// slice it touches just before it runs; the list is then reversed.
    pub fn prepare(state: &State, forward: Vec<Action>) -> Self {
        let mut current = state.clone();
        let mut inverse = Vec::with_capacity(forward.len());
        for action in &forward {
            if let Some(restore) = action.restore_point(&current) {
                inverse.push(restore);
            }
            current = reduce(&current, action);
        }
        inverse.reverse();
        Self { forward, inverse }
    }

    pub fn forward(&self) -> &[Action] {
        &self.forward
    }

    pub fn inverse(&self) -> &[Action] {
        &self.inverse
    }

    pub fn apply(&self, state: &State) -> State {
        fold(state, &self.forward)
    }

    pub fn undo(&self, state: &State) -> State {
        fold(state, &self.inverse)
    }
}

fn fold(state: &State, actions: &[Action]) -> State {
    actions
        .iter()
        .fold(state.clone(), |acc, action| reduce(&acc, action))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AnyItem, Cache, Cluster, ShortCache};
    use crate::store::SliceAction;

    #[test]
    fn undo_restores_every_touched_slice() {
        let mut cluster = Cluster::blank("A");
        cluster.id = "c1".into();
        let s0 = reduce(&State::default(), &Action::EditCluster(Arc::new(cluster.clone())));

        let mut cache = Cache::blank("Orders", vec!["c1".into()]);
        cache.id = "ca1".into();
        let cache = Arc::new(cache);
        let forward = vec![
            Action::UpsertClusterItem(AnyItem::Cache(Arc::clone(&cache))),
            Action::Caches(SliceAction::Upsert(vec![Arc::clone(&cache)])),
            Action::ShortCaches(SliceAction::Upsert(vec![Arc::new(ShortCache::from(&*cache))])),
            Action::Caches(SliceAction::Upsert(vec![Arc::clone(&cache)])),
        ];
        let tx = Transaction::prepare(&s0, forward);
        assert_eq!(tx.inverse().len(), 4);

        let s1 = tx.apply(&s0);
        assert_eq!(s1.caches.len(), 1);
        assert_eq!(s1.edit.caches.ids.len(), 1);

        let s2 = tx.undo(&s1);
        assert_eq!(s2, s0);
        assert!(s2.same_as(&s0));
    }

    #[test]
    fn actions_without_state_effect_have_no_inverse() {
        let tx = Transaction::prepare(
            &State::default(),
            vec![Action::LoadOk {
                ticket: crate::action::Ticket(1),
            }],
        );
        assert!(tx.inverse().is_empty());
        assert_eq!(tx.forward().len(), 1);
    }
}
