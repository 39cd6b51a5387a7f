// ── Reactive streams ──
//
// Subscription types for consuming state and action changes from the
// `ConfigureState` bus.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::{UnboundedReceiverStream, WatchStream};

use crate::bus::ActionEnvelope;
use crate::selectors::{SameRefs, Selector};
use crate::store::State;

// ── StateStream ─────────────────────────────────────────────────────

/// A subscription to the state tree.
///
/// Provides both point-in-time snapshot access and change notification
/// via `changed()` or by converting to a `Stream`.
pub struct StateStream {
    current: Arc<State>,
    receiver: watch::Receiver<Arc<State>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<State>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> &Arc<State> {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<State> {
        self.receiver.borrow().clone()
    }

    /// `true` if a state newer than `current()` has been published.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<State>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current state first, then each newly published state.
pub struct StateWatchStream {
    inner: WatchStream<Arc<State>>,
}

impl Stream for StateWatchStream {
    type Item = Arc<State>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

// ── ActionStream ────────────────────────────────────────────────────

/// Every action the bus processes after the subscription was made, in
/// dispatch order.
pub struct ActionStream {
    receiver: mpsc::UnboundedReceiver<Arc<ActionEnvelope>>,
}

impl ActionStream {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<Arc<ActionEnvelope>>) -> Self {
        Self { receiver }
    }

    /// Returns `None` once the store has been dropped.
    pub async fn recv(&mut self) -> Option<Arc<ActionEnvelope>> {
        self.receiver.recv().await
    }

    /// Take an envelope that is already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<ActionEnvelope>> {
        self.receiver.try_recv().ok()
    }

    pub fn into_stream(self) -> UnboundedReceiverStream<Arc<ActionEnvelope>> {
        UnboundedReceiverStream::new(self.receiver)
    }
}

// ── SelectorStream ──────────────────────────────────────────────────

/// A selector bound to a state subscription.
///
/// `changed()` resolves only when the selector's output differs by
/// reference from the last one handed out.
pub struct SelectorStream<S: Selector> {
    selector: S,
    states: StateStream,
    current: S::Output,
}

impl<S: Selector> SelectorStream<S> {
    pub fn new(selector: S, states: StateStream) -> Self {
        let current = selector.select(states.current());
        Self {
            selector,
            states,
            current,
        }
    }

    pub fn current(&self) -> &S::Output {
        &self.current
    }

    /// Wait until the selected value changes.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<S::Output> {
        loop {
            let state = self.states.changed().await?;
            let next = self.selector.select(&state);
            if !next.same_refs(&self.current) {
                self.current = next.clone();
                return Some(next);
            }
        }
    }

    /// Convert into a `Stream` of distinct selector outputs.
    pub fn into_stream(self) -> impl Stream<Item = S::Output> + Send
    where
        S: 'static,
    {
        futures_util::stream::unfold(self, |mut stream| async move {
            let next = stream.changed().await?;
            Some((next, stream))
        })
    }
}
