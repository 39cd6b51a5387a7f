//! Cluster command handlers.

use std::fmt::Write as _;

use serde::Deserialize;
use tabled::Tabled;

use ignite_console_core::selectors::{ClusterConfiguration, select_complete_cluster_configuration};
use ignite_console_core::{
    AnyItem, Cache, ClonedCluster, Cluster, ClusterFailure, ConfigurationBackend, Console,
    CoreError, EntityId, Igfs, LoadRequest, Model, Selector, ShortCluster,
};

use crate::cli::{ClustersArgs, ClustersCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Discovery")]
    discovery: String,
    #[tabled(rename = "Caches")]
    caches: usize,
    #[tabled(rename = "Models")]
    models: usize,
    #[tabled(rename = "IGFS")]
    igfs: usize,
}

fn cluster_row(c: &ShortCluster) -> ClusterRow {
    ClusterRow {
        id: c.id.to_string(),
        name: c.name.clone(),
        discovery: c.discovery.clone().unwrap_or_else(|| "-".into()),
        caches: c.caches_count,
        models: c.models_count,
        igfs: c.igfs_count,
    }
}

#[derive(Tabled)]
struct ClonedRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Source")]
    source: String,
}

fn cloned_row(c: &ClonedCluster) -> ClonedRow {
    ClonedRow {
        id: c.id.to_string(),
        name: c.name.clone(),
        source: c.source.to_string(),
    }
}

/// One `id: reason` line per failed cluster.
fn failure_details(failed: &[ClusterFailure]) -> String {
    failed
        .iter()
        .map(|f| format!("{}: {}", f.id, f.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn detail(configuration: &ClusterConfiguration) -> String {
    let Some(cluster) = configuration.cluster.as_deref() else {
        return String::new();
    };
    let mut out = String::new();
    let _ = writeln!(out, "ID:         {}", cluster.id);
    let _ = writeln!(out, "Name:       {}", cluster.name);
    let discovery = cluster
        .discovery
        .as_ref()
        .and_then(|d| d.kind.as_deref())
        .unwrap_or("-");
    let _ = writeln!(out, "Discovery:  {discovery}");

    let _ = writeln!(out, "Caches:     {}", configuration.caches.len());
    for cache in &configuration.caches {
        let mode = cache.cache_mode.as_deref().unwrap_or("-");
        let _ = writeln!(out, "  - {} ({mode})", cache.name);
    }
    let _ = writeln!(out, "Models:     {}", configuration.models.len());
    for model in &configuration.models {
        let _ = writeln!(out, "  - {} -> {}", model.key_type, model.value_type);
    }
    let _ = write!(out, "IGFS:       {}", configuration.igfss.len());
    for igfs in &configuration.igfss {
        let _ = write!(out, "\n  - {}", igfs.name);
    }
    out
}

// ── Save payloads ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BasicPayload {
    cluster: Cluster,
    #[serde(default)]
    caches: Vec<Cache>,
}

#[derive(Debug, Deserialize)]
struct AdvancedPayload {
    cluster: Cluster,
    #[serde(default)]
    caches: Vec<Cache>,
    #[serde(default)]
    models: Vec<Model>,
    #[serde(default)]
    igfss: Vec<Igfs>,
}

impl AdvancedPayload {
    fn into_parts(self) -> (Cluster, Vec<AnyItem>) {
        let items = self
            .caches
            .into_iter()
            .map(AnyItem::from)
            .chain(self.models.into_iter().map(AnyItem::from))
            .chain(self.igfss.into_iter().map(AnyItem::from))
            .collect();
        (self.cluster, items)
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle<B: ConfigurationBackend>(
    console: &Console<B>,
    args: ClustersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ClustersCommand::List => {
            let pb = util::spinner("Loading clusters...", global.quiet);
            let loaded = console.load(LoadRequest::UserClusters).await;
            pb.finish_and_clear();
            loaded?;

            let state = console.state();
            let clusters: Vec<ShortCluster> = state
                .short_clusters
                .values()
                .map(|c| c.as_ref().clone())
                .collect();
            let out = output::render_list(
                &global.output,
                &clusters,
                cluster_row,
                |c| c.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClustersCommand::Show { id } => {
            let id = EntityId::from(id);
            let pb = util::spinner("Loading cluster configuration...", global.quiet);
            let loaded = console
                .load(LoadRequest::CompleteConfiguration(id.clone()))
                .await;
            pb.finish_and_clear();
            loaded.map_err(|e| util::not_found_as(e, "cluster", &id))?;

            let configuration = select_complete_cluster_configuration(id.clone())
                .select(&console.state());
            let Some(cluster) = configuration.cluster.as_deref() else {
                return Err(util::not_found_as(
                    CoreError::NotFound {
                        identifier: id.to_string(),
                    },
                    "cluster",
                    &id,
                ));
            };
            if !configuration.is_complete {
                return Err(CliError::IncompleteConfiguration {
                    cluster: cluster.name.clone(),
                });
            }

            let out = output::render_single(&global.output, &*configuration, detail, |c| {
                c.cluster
                    .as_ref()
                    .map(|c| c.id.to_string())
                    .unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClustersCommand::Remove { ids } => {
            let ids: Vec<EntityId> = ids.into_iter().map(EntityId::from).collect();

            // Names make the prompt readable; a failed listing is not fatal.
            let names: Vec<String> = if console.load(LoadRequest::UserClusters).await.is_ok() {
                let state = console.state();
                ids.iter()
                    .map(|id| {
                        state
                            .short_clusters
                            .get(id)
                            .map_or_else(|| id.to_string(), |c| c.name.clone())
                    })
                    .collect()
            } else {
                ids.iter().map(ToString::to_string).collect()
            };

            let prompt = format!(
                "Remove {} cluster(s): {}? Linked items go with them.",
                ids.len(),
                names.join(", ")
            );
            if !util::confirm(&prompt, "clusters remove", global.yes)? {
                return Ok(());
            }

            let pb = util::spinner("Removing clusters...", global.quiet);
            let outcome = console.remove_clusters(ids).await;
            pb.finish_and_clear();
            let outcome = outcome?;

            if !outcome.removed.is_empty() {
                output::success(
                    &format!("Removed {} cluster(s)", outcome.removed.len()),
                    global.quiet,
                );
            }
            if outcome.failed.is_empty() {
                return Ok(());
            }
            Err(CliError::RemoveFailed {
                count: outcome.failed.len(),
                details: failure_details(&outcome.failed),
            })
        }

        ClustersCommand::Clone { ids } => {
            let ids: Vec<EntityId> = ids.into_iter().map(EntityId::from).collect();

            let pb = util::spinner("Cloning clusters...", global.quiet);
            let outcome = async {
                // Copy names are made unique against the listing.
                console.load(LoadRequest::UserClusters).await?;
                console.clone_clusters(ids).await
            }
            .await;
            pb.finish_and_clear();
            let outcome = outcome?;

            if !outcome.cloned.is_empty() {
                output::success(
                    &format!("Cloned {} cluster(s)", outcome.cloned.len()),
                    global.quiet,
                );
                let out = output::render_list(&global.output, &outcome.cloned, cloned_row, |c| {
                    c.id.to_string()
                });
                output::print_output(&out, global.quiet);
            }
            if outcome.failed.is_empty() {
                return Ok(());
            }
            Err(CliError::CloneFailed {
                count: outcome.failed.len(),
                details: failure_details(&outcome.failed),
            })
        }

        ClustersCommand::SaveBasic { from_file } => {
            let payload: BasicPayload = util::read_json_file(&from_file)?;
            let name = payload.cluster.name.clone();

            let pb = util::spinner("Saving cluster...", global.quiet);
            let saved = console.save_basic(payload.cluster, payload.caches).await;
            pb.finish_and_clear();
            let cluster_id = saved?;

            output::success(&format!("Cluster '{name}' saved"), global.quiet);
            let out = output::render_single(
                &global.output,
                &cluster_id,
                ToString::to_string,
                ToString::to_string,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClustersCommand::SaveAdvanced { from_file } => {
            let payload: AdvancedPayload = util::read_json_file(&from_file)?;
            let cluster_id = payload.cluster.id.clone();

            // Bring in what is stored so untouched items keep their fields.
            match console
                .load(LoadRequest::CompleteConfiguration(cluster_id))
                .await
            {
                Ok(()) | Err(CoreError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }

            let (cluster, items) = payload.into_parts();
            let pb = util::spinner("Saving configuration...", global.quiet);
            let saved = console.save_advanced(cluster, items).await;
            pb.finish_and_clear();
            let saved = saved?;

            output::success(
                &format!("{} '{}' saved", saved.kind, saved.name),
                global.quiet,
            );
            let out = output::render_single(
                &global.output,
                &saved,
                |s| format!("{}\t{}\t{}", s.kind, s.id, s.name),
                |s| s.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn advanced_payload_keeps_item_order() {
        let payload: AdvancedPayload = serde_json::from_value(serde_json::json!({
            "cluster": {"_id": "c1", "name": "Prod"},
            "caches": [{"_id": "ca1", "name": "Cache1"}],
            "igfss": [{"_id": "i1", "name": "igfs1"}],
        }))
        .unwrap();
        let (cluster, items) = payload.into_parts();
        assert_eq!(cluster.name, "Prod");
        let ids: Vec<String> = items.iter().map(|i| i.id().to_string()).collect();
        assert_eq!(ids, vec!["ca1", "i1"]);
    }

    #[test]
    fn row_shows_dash_without_discovery() {
        let row = cluster_row(&ShortCluster {
            id: EntityId::from("c1"),
            name: "Prod".into(),
            discovery: None,
            caches_count: 2,
            models_count: 0,
            igfs_count: 1,
        });
        assert_eq!(row.discovery, "-");
        assert_eq!(row.caches, 2);
    }

    #[test]
    fn failure_details_list_one_cluster_per_line() {
        let details = failure_details(&[
            ClusterFailure {
                id: EntityId::from("c1"),
                message: "locked".into(),
            },
            ClusterFailure {
                id: EntityId::from("c2"),
                message: "not unique".into(),
            },
        ]);
        assert_eq!(details, "c1: locked\nc2: not unique");
    }
}
