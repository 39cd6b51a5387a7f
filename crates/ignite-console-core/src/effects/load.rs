// ── Loads ──
//
// Fill the store from the backend. Each load first checks whether the
// store can already answer it and skips the request if so.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use super::EffectContext;
use crate::action::{Action, LoadRequest, Ticket};
use crate::backend::ConfigurationBackend;
use crate::error::CoreError;
use crate::model::{Cache, Cluster, Entity, EntityId, Igfs, ItemRef, Model, unique_name};
use crate::store::{ClusterItem, Slice, SliceAction};

pub(super) async fn load<B: ConfigurationBackend>(
    ctx: EffectContext<B>,
    ticket: Ticket,
    request: LoadRequest,
) {
    match fetch(&ctx, &request).await {
        Ok(()) => ctx.store.dispatch(Action::LoadOk { ticket }),
        Err(error) => {
            warn!(error = %error, "Failed to load {}", subject(&request));
            ctx.store.dispatch(Action::LoadErr { ticket, error });
        }
    }
}

fn subject(request: &LoadRequest) -> &'static str {
    match request {
        LoadRequest::UserClusters => "clusters",
        LoadRequest::CompleteConfiguration(_) => "cluster configuration",
        LoadRequest::AndEditCluster(_) => "cluster",
        LoadRequest::Cache(_) => "cache",
        LoadRequest::Model(_) => "model",
        LoadRequest::Igfs(_) => "IGFS",
        LoadRequest::ShortCaches { .. } => "caches",
        LoadRequest::ShortModels { .. } => "models",
        LoadRequest::ShortIgfss { .. } => "IGFSs",
    }
}

async fn fetch<B: ConfigurationBackend>(
    ctx: &EffectContext<B>,
    request: &LoadRequest,
) -> Result<(), CoreError> {
    let backend = &*ctx.backend;
    match request {
        LoadRequest::UserClusters => {
            let clusters = backend.clusters_overview().await?;
            let slice = Slice::loaded(clusters.into_iter().map(Arc::new));
            ctx.store
                .dispatch(Action::ShortClusters(SliceAction::Set(Arc::new(slice))));
        }
        LoadRequest::CompleteConfiguration(cluster_id) => {
            let configuration = backend.configuration(cluster_id).await?;
            let mut actions = vec![Action::Clusters(SliceAction::Upsert(vec![Arc::new(
                configuration.cluster,
            )]))];
            if !configuration.caches.is_empty() {
                actions.push(Action::Caches(SliceAction::Upsert(arcs(configuration.caches))));
            }
            if !configuration.models.is_empty() {
                actions.push(Action::Models(SliceAction::Upsert(arcs(configuration.models))));
            }
            if !configuration.igfss.is_empty() {
                actions.push(Action::Igfss(SliceAction::Upsert(arcs(configuration.igfss))));
            }
            ctx.store.dispatch_all(actions);
        }
        LoadRequest::AndEditCluster(ItemRef::New) => {
            let state = ctx.store.state();
            let name = unique_name(
                "New cluster",
                state.short_clusters.values().map(|c| c.name()),
            );
            ctx.store
                .dispatch(Action::EditCluster(Arc::new(Cluster::blank(name))));
        }
        LoadRequest::AndEditCluster(ItemRef::Existing(id)) => {
            if let Some(cluster) = ctx.store.state().clusters.get(id).cloned() {
                ctx.store.dispatch(Action::EditCluster(cluster));
            } else {
                let cluster = Arc::new(backend.cluster(id).await?);
                ctx.store.dispatch_all([
                    Action::Clusters(SliceAction::Upsert(vec![Arc::clone(&cluster)])),
                    Action::EditCluster(cluster),
                ]);
            }
        }
        LoadRequest::Cache(ItemRef::New)
        | LoadRequest::Model(ItemRef::New)
        | LoadRequest::Igfs(ItemRef::New) => {}
        LoadRequest::Cache(ItemRef::Existing(id)) => {
            load_item::<_, Cache, _>(ctx, id, backend.cache(id)).await?;
        }
        LoadRequest::Model(ItemRef::Existing(id)) => {
            load_item::<_, Model, _>(ctx, id, backend.model(id)).await?;
        }
        LoadRequest::Igfs(ItemRef::Existing(id)) => {
            load_item::<_, Igfs, _>(ctx, id, backend.igfs(id)).await?;
        }
        LoadRequest::ShortCaches { cluster_id, ids } => {
            load_short::<_, Cache, _>(ctx, ids, backend.cluster_caches(cluster_id)).await?;
        }
        LoadRequest::ShortModels { cluster_id, ids } => {
            load_short::<_, Model, _>(ctx, ids, backend.cluster_models(cluster_id)).await?;
        }
        LoadRequest::ShortIgfss { cluster_id, ids } => {
            load_short::<_, Igfs, _>(ctx, ids, backend.cluster_igfss(cluster_id)).await?;
        }
    }
    Ok(())
}

fn arcs<T>(items: Vec<T>) -> Vec<Arc<T>> {
    items.into_iter().map(Arc::new).collect()
}

/// Fetch one full item unless the store already has it. `fetch` is not
/// polled on a hit.
async fn load_item<B, T, F>(
    ctx: &EffectContext<B>,
    id: &EntityId,
    fetch: F,
) -> Result<(), CoreError>
where
    B: ConfigurationBackend,
    T: ClusterItem,
    F: Future<Output = Result<T, CoreError>>,
{
    if T::full_store(&ctx.store.state()).contains(id) {
        debug!(%id, item_type = %T::ITEM_TYPE, "already loaded");
        return Ok(());
    }
    let item = fetch.await?;
    ctx.store
        .dispatch(T::full_action(SliceAction::Upsert(vec![Arc::new(item)])));
    Ok(())
}

/// Fetch a cluster's short items unless every id in `ids` is already in
/// a non-pristine short store.
async fn load_short<B, T, F>(
    ctx: &EffectContext<B>,
    ids: &[EntityId],
    fetch: F,
) -> Result<(), CoreError>
where
    B: ConfigurationBackend,
    T: ClusterItem,
    F: Future<Output = Result<Vec<T::Short>, CoreError>>,
{
    if ids.is_empty() {
        return Ok(());
    }
    {
        let state = ctx.store.state();
        let shorts = T::short_store(&state);
        if !shorts.is_pristine() && ids.iter().all(|id| shorts.contains(id)) {
            debug!(item_type = %T::ITEM_TYPE, "short items already loaded");
            return Ok(());
        }
    }
    let items = fetch.await?;
    ctx.store
        .dispatch(T::short_action(SliceAction::Upsert(arcs(items))));
    Ok(())
}
