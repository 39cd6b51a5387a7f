// ── Console facade ──
//
// Composition root for one configuration session: owns the store, the
// backend, the confirm hook and the effects task. Typed operations turn
// caller intent into actions and, for requests, await the matching
// `_OK`/`_ERR` result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use ignite_console_api::transport::{TlsMode, TransportConfig};
use ignite_console_api::ConsoleClient;

use crate::action::{
    Action, AdvancedSaveRequest, BasicSaveRequest, ClonedCluster, ClusterFailure, LoadRequest,
    SaveError, SavedItem, Ticket,
};
use crate::backend::ConfigurationBackend;
use crate::bus::ConfigureState;
use crate::config::{ConsoleConfig, TlsVerification};
use crate::effects::{EffectContext, effects_task};
use crate::error::CoreError;
use crate::guard::{ConfigChangesGuard, Confirm};
use crate::model::{AnyItem, Cache, Cluster, EntityId, Igfs, ItemType, Model};
use crate::selectors::Selector;
use crate::store::{
    ChangedItems, EditSession, ItemsEdit, ItemsEditAction, SliceAction, State, reduce,
};
use crate::stream::{ActionStream, SelectorStream, StateStream};

/// Outcome of a cluster removal: which ids are gone and which are not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub removed: Vec<EntityId>,
    pub failed: Vec<ClusterFailure>,
}

/// Outcome of cloning clusters: the stored copies, and the sources that
/// could not be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOutcome {
    pub cloned: Vec<ClonedCluster>,
    pub failed: Vec<ClusterFailure>,
}

// ── Console ─────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ConsoleInner>`. Call [`start()`](Self::start)
/// before issuing requests; edits and reads work without it.
pub struct Console<B: ConfigurationBackend> {
    inner: Arc<ConsoleInner<B>>,
}

impl<B: ConfigurationBackend> Clone for Console<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ConsoleInner<B> {
    store: Arc<ConfigureState>,
    backend: Arc<B>,
    confirm: Arc<dyn Confirm>,
    saving: Arc<AtomicBool>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl<B: ConfigurationBackend> Console<B> {
    pub fn new(backend: B, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            inner: Arc::new(ConsoleInner {
                store: Arc::new(ConfigureState::default()),
                backend: Arc::new(backend),
                confirm,
                saving: Arc::new(AtomicBool::new(false)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
            }),
        }
    }

    pub fn store(&self) -> &Arc<ConfigureState> {
        &self.inner.store
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.inner.backend
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the effects task. Idempotent.
    pub async fn start(&self) {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return;
        }
        let ctx = EffectContext {
            store: Arc::clone(&self.inner.store),
            backend: Arc::clone(&self.inner.backend),
            confirm: Arc::clone(&self.inner.confirm),
            saving: Arc::clone(&self.inner.saving),
        };
        // Subscribe before spawning so no request slips past the task.
        let actions = self.inner.store.actions();
        let cancel = self.inner.cancel.child_token();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(effects_task(ctx, actions, cancel)));
        debug!("console started");
    }

    /// Stop the effects task and wait for it. Pending requests resolve
    /// with [`CoreError::ConsoleStopped`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "effects task ended abnormally");
            }
        }
        debug!("console stopped");
    }

    // ── State access ─────────────────────────────────────────────────

    pub fn dispatch(&self, action: Action) {
        self.inner.store.dispatch(action);
    }

    pub fn state(&self) -> Arc<State> {
        self.inner.store.state()
    }

    pub fn subscribe(&self) -> StateStream {
        self.inner.store.subscribe()
    }

    pub fn actions(&self) -> ActionStream {
        self.inner.store.actions()
    }

    /// Bind a selector to a fresh state subscription.
    pub fn select<S: Selector>(&self, selector: S) -> SelectorStream<S> {
        SelectorStream::new(selector, self.subscribe())
    }

    // ── Edit session ─────────────────────────────────────────────────

    pub fn edit_cluster(&self, cluster: Cluster) {
        self.dispatch(Action::EditCluster(Arc::new(cluster)));
    }

    pub fn upsert_cluster(&self, cluster: Cluster) {
        self.dispatch(Action::UpsertCluster(Arc::new(cluster)));
    }

    /// Record a local change to one cluster item.
    pub fn change_item(&self, item: AnyItem) {
        self.dispatch(Action::UpsertClusterItem(item));
    }

    /// Unlink items from the edited cluster. With `confirm`, the user is
    /// asked first; with `save`, the session is saved afterwards.
    pub fn remove_cluster_items(
        &self,
        item_type: ItemType,
        item_ids: Vec<EntityId>,
        save: bool,
        confirm: bool,
    ) {
        self.dispatch(Action::RemoveClusterItems {
            item_type,
            item_ids,
            save,
            confirm,
        });
    }

    pub fn reset_edit_changes(&self) {
        self.dispatch(Action::ResetEditChanges);
    }

    // ── Basic screen ─────────────────────────────────────────────────

    /// Add or replace a cache in the basic-screen list.
    pub fn upsert_basic_cache(&self, cache: Cache) {
        self.dispatch(Action::BasicCaches(ItemsEditAction::Upsert(vec![Arc::new(cache)])));
    }

    pub fn remove_basic_caches(&self, ids: Vec<EntityId>) {
        self.dispatch(Action::BasicCaches(ItemsEditAction::Remove(ids)));
    }

    /// Forget everything loaded or edited. Used when the session ends.
    pub fn reset(&self) {
        self.inner.store.dispatch_all([
            Action::Clusters(SliceAction::Reset),
            Action::ShortClusters(SliceAction::Reset),
            Action::Caches(SliceAction::Reset),
            Action::ShortCaches(SliceAction::Reset),
            Action::Models(SliceAction::Reset),
            Action::ShortModels(SliceAction::Reset),
            Action::Igfss(SliceAction::Reset),
            Action::ShortIgfss(SliceAction::Reset),
            Action::BasicCaches(ItemsEditAction::Set(Arc::new(ItemsEdit::default()))),
            Action::SetEdit(Arc::new(EditSession::default())),
        ]);
        debug!("store reset");
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Dispatch `action` and wait for the first result carrying `ticket`
    /// that `outcome` recognizes.
    async fn request<T>(
        &self,
        ticket: Ticket,
        action: Action,
        mut outcome: impl FnMut(&Action) -> Option<Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        if !self.inner.started.load(Ordering::Acquire) || self.inner.cancel.is_cancelled() {
            return Err(CoreError::ConsoleStopped);
        }
        let mut actions = self.inner.store.actions();
        self.inner.store.dispatch(action);

        loop {
            tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => return Err(CoreError::ConsoleStopped),
                envelope = actions.recv() => {
                    let Some(envelope) = envelope else {
                        return Err(CoreError::ConsoleStopped);
                    };
                    if envelope.action.ticket() != Some(ticket) {
                        continue;
                    }
                    if let Some(result) = outcome(&envelope.action) {
                        return result;
                    }
                }
            }
        }
    }

    /// Load from the backend into the store, with the loading indicator
    /// shown meanwhile.
    pub async fn load(&self, request: LoadRequest) -> Result<(), CoreError> {
        let ticket = self.inner.store.next_ticket();
        self.dispatch(Action::ShowConfigLoading(request.loading_text().into()));
        let result = self
            .request(ticket, Action::Load { ticket, request }, |action| match action {
                Action::LoadOk { .. } => Some(Ok(())),
                Action::LoadErr { error, .. } => Some(Err(error.clone())),
                _ => None,
            })
            .await;
        self.dispatch(Action::HideConfigLoading);
        result
    }

    /// Session edits that put `cluster` and `items` into the edit session.
    fn prev_actions(&self, cluster: Arc<Cluster>, items: Vec<AnyItem>) -> Vec<Action> {
        let state = self.state();
        let mut prev = Vec::with_capacity(items.len() + 1);
        if state.edit_cluster_id() == Some(&cluster.id) {
            prev.push(Action::UpsertCluster(cluster));
        } else {
            prev.push(Action::EditCluster(cluster));
        }
        prev.extend(items.into_iter().map(Action::UpsertClusterItem));
        prev
    }

    /// The save payload `prev` would leave in the session.
    fn preview(&self, prev: &[Action]) -> Result<ChangedItems, CoreError> {
        let state = self.state();
        let preview = prev
            .iter()
            .fold(State::clone(&state), |acc, action| reduce(&acc, action));
        preview
            .edit
            .changed_items()
            .ok_or_else(|| CoreError::Internal("no cluster is being edited".into()))
    }

    /// Save a cluster and the caches edited with it. Returns the stored
    /// cluster id.
    pub async fn save_basic(
        &self,
        cluster: Cluster,
        caches: Vec<Cache>,
    ) -> Result<EntityId, CoreError> {
        let prev = self.prev_actions(
            Arc::new(cluster),
            caches.into_iter().map(AnyItem::from).collect(),
        );
        let changed = self.preview(&prev)?;
        let request = Arc::new(BasicSaveRequest {
            cluster: changed.cluster,
            caches: changed.caches,
            prev_actions: prev,
        });
        let ticket = self.inner.store.next_ticket();
        self.request(
            ticket,
            Action::BasicSaveClusterAndCaches { ticket, request },
            |action| match action {
                Action::BasicSaveClusterAndCachesOk { cluster_id, .. } => {
                    Some(Ok(cluster_id.clone()))
                }
                Action::BasicSaveClusterAndCachesErr { error, .. } => Some(Err(save_failed(error))),
                _ => None,
            },
        )
        .await
    }

    /// Save a complete configuration: the cluster plus every changed item.
    /// Returns the item to bring into focus.
    pub async fn save_advanced(
        &self,
        cluster: Cluster,
        items: Vec<AnyItem>,
    ) -> Result<SavedItem, CoreError> {
        let prev = self.prev_actions(Arc::new(cluster), items);
        let changed = self.preview(&prev)?;
        self.advanced_request(AdvancedSaveRequest {
            changed,
            prev_actions: prev,
        })
        .await
    }

    /// Save the edit session as it stands.
    pub async fn save_edit_session(&self) -> Result<SavedItem, CoreError> {
        let changed = self.preview(&[])?;
        self.advanced_request(AdvancedSaveRequest {
            changed,
            prev_actions: Vec::new(),
        })
        .await
    }

    async fn advanced_request(&self, request: AdvancedSaveRequest) -> Result<SavedItem, CoreError> {
        let ticket = self.inner.store.next_ticket();
        self.request(
            ticket,
            Action::AdvancedSaveCompleteConfiguration {
                ticket,
                request: Arc::new(request),
            },
            |action| match action {
                Action::AdvancedSaveCompleteConfigurationOk { saved, .. } => Some(Ok(saved.clone())),
                Action::AdvancedSaveCompleteConfigurationErr { error, .. } => {
                    Some(Err(save_failed(error)))
                }
                _ => None,
            },
        )
        .await
    }

    /// Remove clusters locally and on the backend.
    pub async fn remove_clusters(&self, ids: Vec<EntityId>) -> Result<RemoveOutcome, CoreError> {
        let ticket = self.inner.store.next_ticket();
        self.request(ticket, Action::RemoveClusters { ticket, ids }, |action| match action {
            Action::RemoveClustersOk {
                removed, failed, ..
            } => Some(Ok(RemoveOutcome {
                removed: removed.clone(),
                failed: failed.clone(),
            })),
            _ => None,
        })
        .await
    }

    /// Copy clusters under fresh names and store the copies. Copies the
    /// backend refuses are dropped from the store again.
    pub async fn clone_clusters(&self, ids: Vec<EntityId>) -> Result<CloneOutcome, CoreError> {
        let ticket = self.inner.store.next_ticket();
        self.request(ticket, Action::CloneClusters { ticket, ids }, |action| match action {
            Action::CloneClustersOk { cloned, failed, .. } => Some(Ok(CloneOutcome {
                cloned: cloned.clone(),
                failed: failed.clone(),
            })),
            _ => None,
        })
        .await
    }

    // ── Unsaved changes ──────────────────────────────────────────────

    /// Ask before discarding the edit session, if it differs from what
    /// the store holds. `Ok(true)` means it is fine to move on.
    pub async fn guard_unsaved_changes(&self) -> Result<bool, CoreError> {
        let state = self.state();
        let Some(edited) = state.edit.changed_items() else {
            return Ok(true);
        };
        let persisted = Comparable {
            cluster: state.clusters.get(&edited.cluster.id).map(|c| &**c),
            caches: edited
                .caches
                .iter()
                .filter_map(|c| state.caches.get(&c.id).map(|c| &**c))
                .collect(),
            models: edited
                .models
                .iter()
                .filter_map(|m| state.models.get(&m.id).map(|m| &**m))
                .collect(),
            igfss: edited
                .igfss
                .iter()
                .filter_map(|i| state.igfss.get(&i.id).map(|i| &**i))
                .collect(),
        };
        let persisted = to_json(&persisted)?;
        let edited = to_json(&edited)?;

        let guard = ConfigChangesGuard::new(Arc::clone(&self.inner.confirm));
        tokio::task::spawn_blocking(move || guard.guard(Some(&persisted), Some(&edited)))
            .await
            .map_err(|e| CoreError::Internal(format!("confirmation task failed: {e}")))
    }
}

/// Stored counterpart of an edit session, shaped like `ChangedItems`.
#[derive(Serialize)]
struct Comparable<'a> {
    cluster: Option<&'a Cluster>,
    caches: Vec<&'a Cache>,
    models: Vec<&'a Model>,
    igfss: Vec<&'a Igfs>,
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, CoreError> {
    serde_json::to_value(value).map_err(|e| CoreError::Internal(e.to_string()))
}

fn save_failed(error: &SaveError) -> CoreError {
    CoreError::SaveFailed {
        title: error.title.clone(),
        message: error.message.clone(),
    }
}

// ── REST-backed console ─────────────────────────────────────────────

/// A console talking to the Web Console backend over HTTP.
pub type RestConsole = Console<ConsoleClient>;

impl Console<ConsoleClient> {
    /// Build the REST client, sign in if credentials are given, and start
    /// the effects task.
    pub async fn connect(
        config: &ConsoleConfig,
        confirm: Arc<dyn Confirm>,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: match &config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: config.timeout,
            cookie_jar: None,
        }
        .with_cookie_jar();

        let client = ConsoleClient::new(config.url.clone(), &transport)?;
        if let Some(credentials) = &config.credentials {
            client
                .signin(&credentials.email, &credentials.password)
                .await?;
            debug!(email = %credentials.email, "signed in");
        }

        let console = Self::new(client, confirm);
        console.start().await;
        Ok(console)
    }

    /// One-shot: connect, run closure, sign out and shut down.
    ///
    /// The closure may use its own error type, as long as connection
    /// failures convert into it.
    pub async fn oneshot<F, Fut, T, E>(
        config: &ConsoleConfig,
        confirm: Arc<dyn Confirm>,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Console<ConsoleClient>) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        let console = Self::connect(config, confirm).await?;
        let result = f(console.clone()).await;
        if config.credentials.is_some() {
            console.logout().await;
        }
        console.shutdown().await;
        result
    }

    /// Sign out and drop whatever the session loaded. A failed sign-out
    /// is logged; the store is reset either way.
    pub async fn logout(&self) {
        if let Err(e) = self.backend().logout().await {
            warn!(error = %e, "logout failed (non-fatal)");
        }
        self.reset();
    }
}
