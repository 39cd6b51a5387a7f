// ── Backend seam ──
//
// Effects reach the server only through `ConfigurationBackend`. The REST
// client implements it; tests substitute in-memory fakes.

use std::future::Future;
use std::sync::Arc;

use ignite_console_api::ConsoleClient;

use crate::error::CoreError;
use crate::model::{
    Cache, Cluster, CompleteConfiguration, EntityId, Igfs, Model, ShortCache, ShortCluster,
    ShortIgfs, ShortModel,
};
use crate::store::ChangedItems;

/// Everything the configuration effects need from the server.
pub trait ConfigurationBackend: Send + Sync + 'static {
    fn clusters_overview(&self) -> impl Future<Output = Result<Vec<ShortCluster>, CoreError>> + Send;

    fn cluster(&self, id: &EntityId) -> impl Future<Output = Result<Cluster, CoreError>> + Send;

    fn cluster_caches(
        &self,
        cluster_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<ShortCache>, CoreError>> + Send;

    fn cluster_models(
        &self,
        cluster_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<ShortModel>, CoreError>> + Send;

    fn cluster_igfss(
        &self,
        cluster_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<ShortIgfs>, CoreError>> + Send;

    fn configuration(
        &self,
        cluster_id: &EntityId,
    ) -> impl Future<Output = Result<CompleteConfiguration, CoreError>> + Send;

    fn cache(&self, id: &EntityId) -> impl Future<Output = Result<Cache, CoreError>> + Send;

    fn model(&self, id: &EntityId) -> impl Future<Output = Result<Model, CoreError>> + Send;

    fn igfs(&self, id: &EntityId) -> impl Future<Output = Result<Igfs, CoreError>> + Send;

    /// Persist a cluster with its basic-screen caches; yields the stored
    /// cluster id.
    fn save_basic(
        &self,
        cluster: &Cluster,
        caches: &[Arc<Cache>],
    ) -> impl Future<Output = Result<EntityId, CoreError>> + Send;

    fn save_advanced(
        &self,
        changed: &ChangedItems,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Store `cluster` as a new document, ignoring its local id; yields
    /// the id the backend assigned.
    fn create_cluster(
        &self,
        cluster: &Cluster,
    ) -> impl Future<Output = Result<EntityId, CoreError>> + Send;

    /// Remove clusters; yields the number of affected rows.
    fn remove_clusters(
        &self,
        ids: &[EntityId],
    ) -> impl Future<Output = Result<u64, CoreError>> + Send;
}

impl ConfigurationBackend for ConsoleClient {
    async fn clusters_overview(&self) -> Result<Vec<ShortCluster>, CoreError> {
        Ok(self.list_clusters().await?)
    }

    async fn cluster(&self, id: &EntityId) -> Result<Cluster, CoreError> {
        Ok(self.get_cluster(&id.to_string()).await?)
    }

    async fn cluster_caches(&self, cluster_id: &EntityId) -> Result<Vec<ShortCache>, CoreError> {
        Ok(self.list_cluster_caches(&cluster_id.to_string()).await?)
    }

    async fn cluster_models(&self, cluster_id: &EntityId) -> Result<Vec<ShortModel>, CoreError> {
        Ok(self.list_cluster_models(&cluster_id.to_string()).await?)
    }

    async fn cluster_igfss(&self, cluster_id: &EntityId) -> Result<Vec<ShortIgfs>, CoreError> {
        Ok(self.list_cluster_igfss(&cluster_id.to_string()).await?)
    }

    async fn configuration(&self, cluster_id: &EntityId) -> Result<CompleteConfiguration, CoreError> {
        Ok(self.get_configuration(&cluster_id.to_string()).await?)
    }

    async fn cache(&self, id: &EntityId) -> Result<Cache, CoreError> {
        Ok(self.get_cache(&id.to_string()).await?)
    }

    async fn model(&self, id: &EntityId) -> Result<Model, CoreError> {
        Ok(self.get_model(&id.to_string()).await?)
    }

    async fn igfs(&self, id: &EntityId) -> Result<Igfs, CoreError> {
        Ok(self.get_igfs(&id.to_string()).await?)
    }

    async fn save_basic(&self, cluster: &Cluster, caches: &[Arc<Cache>]) -> Result<EntityId, CoreError> {
        Ok(self.upsert_basic(cluster, caches).await?)
    }

    async fn save_advanced(&self, changed: &ChangedItems) -> Result<(), CoreError> {
        self.upsert_advanced(changed).await?;
        Ok(())
    }

    async fn create_cluster(&self, cluster: &Cluster) -> Result<EntityId, CoreError> {
        let mut document =
            serde_json::to_value(cluster).map_err(|e| CoreError::Internal(e.to_string()))?;
        if let Some(fields) = document.as_object_mut() {
            fields.remove("_id");
        }
        Ok(self.save_cluster(&document).await?)
    }

    async fn remove_clusters(&self, ids: &[EntityId]) -> Result<u64, CoreError> {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let result = ConsoleClient::remove_clusters(self, &ids).await?;
        Ok(result.rows_affected)
    }
}
