//! Handlers for the per-cluster item lists: caches, models and IGFS.

use tabled::Tabled;

use ignite_console_core::selectors::{
    select_current_short_caches, select_current_short_igfss, select_current_short_models,
};
use ignite_console_core::{
    ConfigurationBackend, Console, EntityId, ItemRef, ItemType, LoadRequest, Selector,
    ShortCache, ShortIgfs, ShortModel,
};

use crate::cli::{GlobalOpts, ItemsArgs, ItemsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct CacheRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Atomicity")]
    atomicity: String,
    #[tabled(rename = "Backups")]
    backups: String,
}

fn cache_row(c: &ShortCache) -> CacheRow {
    CacheRow {
        id: c.id.to_string(),
        name: c.name.clone(),
        mode: c.cache_mode.clone().unwrap_or_else(|| "-".into()),
        atomicity: c.atomicity_mode.clone().unwrap_or_else(|| "-".into()),
        backups: c.backups.map_or_else(|| "-".into(), |b| b.to_string()),
    }
}

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Key Type")]
    key_type: String,
    #[tabled(rename = "Value Type")]
    value_type: String,
    #[tabled(rename = "Caches")]
    caches: usize,
}

fn model_row(m: &ShortModel) -> ModelRow {
    ModelRow {
        id: m.id.to_string(),
        key_type: m.key_type.clone(),
        value_type: m.value_type.clone(),
        caches: m.caches.len(),
    }
}

#[derive(Tabled)]
struct IgfsRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Default Mode")]
    default_mode: String,
}

fn igfs_row(i: &ShortIgfs) -> IgfsRow {
    IgfsRow {
        id: i.id.to_string(),
        name: i.name.clone(),
        default_mode: i.default_mode.clone().unwrap_or_else(|| "-".into()),
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Put the cluster into the edit session, then load the short versions
/// of its `item_type` links.
async fn load_items<B: ConfigurationBackend>(
    console: &Console<B>,
    cluster_id: &EntityId,
    item_type: ItemType,
    quiet: bool,
) -> Result<(), CliError> {
    let pb = util::spinner(&format!("Loading {item_type}..."), quiet);
    let result = async {
        console
            .load(LoadRequest::AndEditCluster(ItemRef::Existing(cluster_id.clone())))
            .await
            .map_err(|e| util::not_found_as(e, "cluster", cluster_id))?;

        let ids = console.state().edit.ids(item_type).to_vec();
        let request = match item_type {
            ItemType::Caches => LoadRequest::ShortCaches {
                cluster_id: cluster_id.clone(),
                ids,
            },
            ItemType::Models => LoadRequest::ShortModels {
                cluster_id: cluster_id.clone(),
                ids,
            },
            ItemType::Igfss => LoadRequest::ShortIgfss {
                cluster_id: cluster_id.clone(),
                ids,
            },
        };
        console.load(request).await.map_err(CliError::from)
    }
    .await;
    pb.finish_and_clear();
    result
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle<B: ConfigurationBackend>(
    console: &Console<B>,
    item_type: ItemType,
    args: ItemsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ItemsCommand::List { cluster } = args.command;
    let cluster_id = EntityId::from(cluster);
    load_items(console, &cluster_id, item_type, global.quiet).await?;

    let state = console.state();
    let out = match item_type {
        ItemType::Caches => {
            let items: Vec<ShortCache> = select_current_short_caches()
                .select(&state)
                .iter()
                .map(|c| c.as_ref().clone())
                .collect();
            output::render_list(&global.output, &items, cache_row, |c| c.id.to_string())
        }
        ItemType::Models => {
            let items: Vec<ShortModel> = select_current_short_models()
                .select(&state)
                .iter()
                .map(|m| m.as_ref().clone())
                .collect();
            output::render_list(&global.output, &items, model_row, |m| m.id.to_string())
        }
        ItemType::Igfss => {
            let items: Vec<ShortIgfs> = select_current_short_igfss()
                .select(&state)
                .iter()
                .map(|i| i.as_ref().clone())
                .collect();
            output::render_list(&global.output, &items, igfs_row, |i| i.id.to_string())
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_row_fills_missing_modes() {
        let row = cache_row(&ShortCache {
            id: EntityId::from("ca1"),
            name: "Cache1".into(),
            cache_mode: Some("PARTITIONED".into()),
            atomicity_mode: None,
            backups: Some(1),
            clusters: vec![EntityId::from("c1")],
        });
        assert_eq!(row.mode, "PARTITIONED");
        assert_eq!(row.atomicity, "-");
        assert_eq!(row.backups, "1");
    }
}
