use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use omni_launcher::actions::commands::expand_shortcut;
use omni_launcher::custom_actions::{self, CustomActions};
use omni_launcher::favicons::FaviconCache;
use omni_launcher::hosts::{self, HostIgnoreHashList};
use omni_launcher::launcher::Launcher;
use omni_launcher::logging;
use omni_launcher::settings::Settings;
use omni_launcher::snapshot::SnapshotSources;
use omni_launcher::store::{JsonFilePersistence, KeyValuePersistence, PersistentStore, StoreContext};

const SETTINGS_FILE: &str = "settings.json";
const STATE_FILE: &str = "omni_state.json";
const USAGE: &str = "usage: omni-launcher <snapshot.json> [--duplicates] [query...]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load(SETTINGS_FILE)?;
    logging::init(settings.debug_logging, settings.log_file.clone());

    let mut snapshot = None;
    let mut duplicates = false;
    let mut words = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--duplicates" => duplicates = true,
            _ if snapshot.is_none() => snapshot = Some(arg),
            _ => words.push(arg),
        }
    }
    let snapshot = snapshot.context(USAGE)?;

    let sources = Arc::new(SnapshotSources::load(Path::new(&snapshot))?).into_sources();
    let persistence: Arc<dyn KeyValuePersistence> = Arc::new(JsonFilePersistence::new(STATE_FILE));
    let custom = Arc::new(CustomActions::new(PersistentStore::open(
        persistence.clone(),
        custom_actions::store_options(StoreContext::Background),
    )));
    let host_list = Arc::new(HostIgnoreHashList::new(PersistentStore::open(
        persistence.clone(),
        hosts::store_options(StoreContext::Background),
    )));
    let favicons = Arc::new(FaviconCache::new(
        persistence,
        settings.favicon_path_limit,
        settings.favicon_save_debounce(),
    ));
    let launcher = Launcher::new(sources, settings, custom, host_list, favicons.clone());

    if duplicates {
        let groups = launcher.duplicate_groups().await?;
        if groups.is_empty() {
            eprintln!("No duplicates");
        }
        for group in &groups {
            let Some(plan) = group.removal_plan() else {
                continue;
            };
            let line = serde_json::json!({
                "key": group.key,
                "title": group.display_title(),
                "windows": group.window_count(),
                "keep": plan.keep.id,
                "remove": plan.remove_ids(),
            });
            println!("{line}");
        }
        return Ok(());
    }

    let items = launcher.load_items().await?;
    let query = words.join(" ");
    let query = expand_shortcut(&query).unwrap_or(query);
    match launcher.search(&query, &items).await? {
        Some(results) if results.is_empty() => eprintln!("No results"),
        Some(results) => {
            for item in results {
                println!("{}", serde_json::to_string(&item)?);
            }
        }
        None => {}
    }

    favicons.shutdown().await?;
    Ok(())
}
