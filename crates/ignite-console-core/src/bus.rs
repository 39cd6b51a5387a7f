// ── Action dispatch bus ──
//
// `ConfigureState` owns the state tree. Dispatch is synchronous: each
// action is reduced, the new state is published, and every action
// listener receives the `(action, state)` envelope before the next action
// starts. Dispatches issued while another is in progress (re-entrant or
// from another thread) are queued and drained in order by the dispatcher
// already running.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

use crate::action::{Action, Ticket};
use crate::store::{State, reduce};
use crate::stream::{ActionStream, StateStream};

/// An action together with the state it produced.
#[derive(Debug)]
pub struct ActionEnvelope {
    pub action: Action,
    pub state: Arc<State>,
}

/// The configuration store: state, dispatch queue, and listeners.
pub struct ConfigureState {
    state: watch::Sender<Arc<State>>,
    queue: Mutex<VecDeque<Action>>,
    dispatching: AtomicBool,
    listeners: Mutex<Vec<mpsc::UnboundedSender<Arc<ActionEnvelope>>>>,
    tickets: AtomicU64,
}

impl Default for ConfigureState {
    fn default() -> Self {
        Self::new(State::default())
    }
}

impl ConfigureState {
    pub fn new(initial: State) -> Self {
        let (state, _) = watch::channel(Arc::new(initial));
        Self {
            state,
            queue: Mutex::new(VecDeque::new()),
            dispatching: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
            tickets: AtomicU64::new(1),
        }
    }

    /// Current state snapshot (cheap `Arc` clone).
    pub fn state(&self) -> Arc<State> {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.state.subscribe())
    }

    /// Subscribe to every action processed from now on.
    pub fn actions(&self) -> ActionStream {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.listeners).push(tx);
        ActionStream::new(rx)
    }

    /// A fresh ticket for correlating a request with its result.
    pub fn next_ticket(&self) -> Ticket {
        Ticket(self.tickets.fetch_add(1, Ordering::Relaxed))
    }

    /// Queue `action` and, unless a dispatch is already running, drain
    /// the queue.
    pub fn dispatch(&self, action: Action) {
        lock(&self.queue).push_back(action);
        self.drain();
    }

    /// Queue several actions back to back; no other dispatch can land
    /// between them.
    pub fn dispatch_all(&self, actions: impl IntoIterator<Item = Action>) {
        lock(&self.queue).extend(actions);
        self.drain();
    }

    fn drain(&self) {
        loop {
            if self
                .dispatching
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                trace!("dispatch queued behind running dispatcher");
                return;
            }

            loop {
                let next = lock(&self.queue).pop_front();
                let Some(action) = next else { break };
                self.process(action);
            }

            self.dispatching.store(false, Ordering::Release);

            // An action queued between the last pop and the flag release
            // would otherwise be stranded.
            if lock(&self.queue).is_empty() {
                return;
            }
        }
    }

    fn process(&self, action: Action) {
        debug!(action = action.kind(), "dispatch");

        let current = self.state();
        let reduced = reduce(&current, &action);
        let state = if reduced.same_as(&current) {
            current
        } else {
            let next = Arc::new(reduced);
            self.state.send_replace(Arc::clone(&next));
            next
        };

        let envelope = Arc::new(ActionEnvelope { action, state });
        lock(&self.listeners).retain(|tx| tx.send(Arc::clone(&envelope)).is_ok());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::thread;

    use super::*;
    use crate::model::{Cluster, ShortCluster};
    use crate::store::SliceAction;

    fn short(id: &str) -> Arc<ShortCluster> {
        let mut c = Cluster::blank(id);
        c.id = id.into();
        Arc::new(ShortCluster::from(&c))
    }

    #[test]
    fn dispatch_reduces_and_publishes() {
        let store = ConfigureState::default();
        let mut states = store.subscribe();
        store.dispatch(Action::ShortClusters(SliceAction::Upsert(vec![short("c1")])));

        assert_eq!(store.state().short_clusters.len(), 1);
        assert_eq!(states.latest().short_clusters.len(), 1);
        assert!(states.has_changed());
    }

    #[tokio::test]
    async fn listeners_see_actions_in_order() {
        let store = ConfigureState::default();
        let mut actions = store.actions();

        store.dispatch(Action::ShowConfigLoading("x".into()));
        store.dispatch(Action::HideConfigLoading);

        let first = actions.recv().await.unwrap();
        assert_eq!(first.action.kind(), "SHOW_CONFIG_LOADING");
        assert!(first.state.loading.is_loading);
        let second = actions.recv().await.unwrap();
        assert_eq!(second.action.kind(), "HIDE_CONFIG_LOADING");
        assert!(!second.state.loading.is_loading);
    }

    #[test]
    fn no_op_actions_do_not_republish() {
        let store = ConfigureState::default();
        let before = store.state();
        store.dispatch(Action::HideConfigLoading);
        assert!(Arc::ptr_eq(&before, &store.state()));
    }

    #[test]
    fn dropped_listeners_are_pruned() {
        let store = ConfigureState::default();
        drop(store.actions());
        store.dispatch(Action::HideConfigLoading);
        assert!(lock(&store.listeners).is_empty());
    }

    #[test]
    fn concurrent_dispatches_are_all_applied() {
        let store = Arc::new(ConfigureState::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..25 {
                        let id = format!("c{t}-{i}");
                        store.dispatch(Action::ShortClusters(SliceAction::Upsert(vec![short(&id)])));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.state().short_clusters.len(), 200);
    }

    #[tokio::test]
    async fn dispatch_all_keeps_batch_together() {
        let store = ConfigureState::default();
        let mut actions = store.actions();
        store.dispatch_all([
            Action::ShowConfigLoading("a".into()),
            Action::ShowConfigLoading("b".into()),
        ]);
        assert_eq!(store.state().loading.text.as_deref(), Some("b"));
        assert_eq!(actions.recv().await.unwrap().state.loading.text.as_deref(), Some("a"));
    }

    #[test]
    fn tickets_are_unique() {
        let store = ConfigureState::default();
        assert_ne!(store.next_ticket(), store.next_ticket());
    }
}
