//! Favorites commands, persisted under `DEALDECK_STORAGE_DIR`.

use dealdeck_catalog::{FavoritesStore, FileStorage};
use dealdeck_core::{AppConfig, GeoState};

use crate::catalog::{load_visible_offers, truncate};

fn open_store(config: &AppConfig) -> FavoritesStore<FileStorage> {
    FavoritesStore::hydrate(FileStorage::new(&config.storage_dir))
}

pub(crate) fn run_list(config: &AppConfig) {
    let store = open_store(config);
    if store.is_empty() {
        println!("no favorites saved; run `favorites add <id>` first");
        return;
    }

    println!("{:<7}{:<34}OFFER", "ID", "NAME");
    for offer in store.list() {
        println!(
            "{:<7}{:<34}{}",
            offer.id,
            truncate(&offer.name, 32),
            offer.offer
        );
    }
}

/// Saves a snapshot of the offer with `id` from the live catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read, the id is unknown, or the
/// favorites file cannot be written.
pub(crate) async fn run_add(config: &AppConfig, id: i64) -> anyhow::Result<()> {
    let mut store = open_store(config);
    if store.is_favorite(id) {
        println!("offer {id} is already a favorite");
        return Ok(());
    }

    // Unresolved geolocation is fail-open, so every offer is addressable.
    let offers = load_visible_offers(config, GeoState::Unresolved).await?;
    let offer = offers
        .into_iter()
        .find(|offer| offer.id == id)
        .ok_or_else(|| anyhow::anyhow!("offer {id} not found in the catalog"))?;
    let name = offer.name.clone();

    store.add(offer)?;
    println!("saved {id} ({name}); {} favorite(s)", store.len());
    Ok(())
}

/// # Errors
///
/// Returns an error if the favorites file cannot be written.
pub(crate) fn run_remove(config: &AppConfig, id: i64) -> anyhow::Result<()> {
    let mut store = open_store(config);
    if store.remove(id)? {
        println!("removed {id}; {} favorite(s)", store.len());
    } else {
        println!("offer {id} was not a favorite");
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the favorites file cannot be written.
pub(crate) fn run_clear(config: &AppConfig) -> anyhow::Result<()> {
    let mut store = open_store(config);
    let count = store.len();
    store.clear_all()?;
    println!("cleared {count} favorite(s)");
    Ok(())
}
