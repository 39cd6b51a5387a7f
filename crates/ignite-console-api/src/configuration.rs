// Configuration endpoints
//
// Clusters, caches, domain models and IGFS documents. Payload types are
// supplied by the caller so the same transport serves any schema the
// backend stores; only the envelopes this module owns are typed here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::ConsoleClient;
use crate::error::Error;

/// Result of a remove call: `{ "rowsAffected": N }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResult {
    pub rows_affected: u64,
}

/// Body of a basic save: the cluster plus the caches edited with it.
#[derive(Debug, Serialize)]
pub struct BasicSavePayload<'a, C: Serialize, K: Serialize> {
    pub cluster: &'a C,
    pub caches: &'a [K],
}

impl ConsoleClient {
    // ── Clusters ─────────────────────────────────────────────────────

    /// List the short overview of every cluster visible to the session.
    pub async fn list_clusters<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        let url = self.api_url("configuration/clusters")?;
        self.get(url).await
    }

    /// Fetch a single full cluster document.
    pub async fn get_cluster<T: DeserializeOwned>(&self, cluster_id: &str) -> Result<T, Error> {
        let url = self.api_url(&format!("configuration/clusters/{cluster_id}"))?;
        self.get(url).await
    }

    /// Short caches linked to a cluster.
    pub async fn list_cluster_caches<T: DeserializeOwned>(
        &self,
        cluster_id: &str,
    ) -> Result<Vec<T>, Error> {
        let url = self.api_url(&format!("configuration/clusters/{cluster_id}/caches"))?;
        self.get(url).await
    }

    /// Short domain models linked to a cluster.
    pub async fn list_cluster_models<T: DeserializeOwned>(
        &self,
        cluster_id: &str,
    ) -> Result<Vec<T>, Error> {
        let url = self.api_url(&format!("configuration/clusters/{cluster_id}/models"))?;
        self.get(url).await
    }

    /// Short IGFS linked to a cluster.
    pub async fn list_cluster_igfss<T: DeserializeOwned>(
        &self,
        cluster_id: &str,
    ) -> Result<Vec<T>, Error> {
        let url = self.api_url(&format!("configuration/clusters/{cluster_id}/igfss"))?;
        self.get(url).await
    }

    /// The cluster together with every full cache, model and IGFS it links.
    pub async fn get_configuration<T: DeserializeOwned>(
        &self,
        cluster_id: &str,
    ) -> Result<T, Error> {
        let url = self.api_url(&format!("configuration/{cluster_id}"))?;
        self.get(url).await
    }

    // ── Cluster items ────────────────────────────────────────────────

    pub async fn get_cache<T: DeserializeOwned>(&self, cache_id: &str) -> Result<T, Error> {
        let url = self.api_url(&format!("configuration/caches/{cache_id}"))?;
        self.get(url).await
    }

    /// Domain models live under the backend's historical `domains` path.
    pub async fn get_model<T: DeserializeOwned>(&self, model_id: &str) -> Result<T, Error> {
        let url = self.api_url(&format!("configuration/domains/{model_id}"))?;
        self.get(url).await
    }

    pub async fn get_igfs<T: DeserializeOwned>(&self, igfs_id: &str) -> Result<T, Error> {
        let url = self.api_url(&format!("configuration/igfs/{igfs_id}"))?;
        self.get(url).await
    }

    // ── Saves ────────────────────────────────────────────────────────

    /// Save a cluster and the caches edited on the basic screen.
    ///
    /// Returns the persisted cluster id.
    pub async fn upsert_basic<C, K, R>(&self, cluster: &C, caches: &[K]) -> Result<R, Error>
    where
        C: Serialize + Sync,
        K: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.api_url("configuration/clusters/basic")?;
        debug!(caches = caches.len(), "saving cluster (basic)");
        self.post(url, &BasicSavePayload { cluster, caches }).await
    }

    /// Save a complete configuration (`{cluster, caches, models, igfss}`).
    ///
    /// The backend acknowledges with a small JSON document that callers
    /// usually ignore.
    pub async fn upsert_advanced<P: Serialize + Sync>(
        &self,
        configuration: &P,
    ) -> Result<serde_json::Value, Error> {
        let url = self.api_url("configuration/clusters")?;
        debug!("saving cluster (advanced)");
        self.post(url, configuration).await
    }

    /// Create or update one cluster document on its own.
    ///
    /// A document without `_id` is stored as a new cluster. Returns the
    /// persisted id.
    pub async fn save_cluster<C, R>(&self, cluster: &C) -> Result<R, Error>
    where
        C: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.api_url("configuration/clusters/save")?;
        debug!("saving cluster");
        self.post(url, cluster).await
    }

    // ── Removal ──────────────────────────────────────────────────────

    /// Remove clusters by id, together with the caches and IGFS owned only
    /// by them.
    pub async fn remove_clusters(&self, cluster_ids: &[String]) -> Result<RemoveResult, Error> {
        let url = self.api_url("configuration/clusters/remove")?;
        self.post(url, &json!({ "clusterIDs": cluster_ids })).await
    }
}
