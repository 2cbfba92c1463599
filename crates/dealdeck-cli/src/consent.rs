//! Consent commands, persisted next to favorites under `DEALDECK_STORAGE_DIR`.

use dealdeck_catalog::{ConsentFlags, ConsentStore, FileStorage};
use dealdeck_core::AppConfig;

fn open_store(config: &AppConfig) -> ConsentStore<FileStorage> {
    ConsentStore::hydrate(FileStorage::new(&config.storage_dir))
}

pub(crate) fn describe(flags: ConsentFlags) -> String {
    let analytics = match flags.analytics {
        Some(true) => "granted",
        Some(false) => "denied",
        None => "not answered",
    };
    let toast = if flags.toast_shown { "shown" } else { "not shown" };
    format!("analytics: {analytics}; consent notice: {toast}")
}

pub(crate) fn run_show(config: &AppConfig) {
    println!("{}", describe(open_store(config).flags()));
}

/// Records an analytics answer and marks the consent notice as shown.
///
/// # Errors
///
/// Returns an error if the consent file cannot be written.
pub(crate) fn run_set_analytics(config: &AppConfig, granted: bool) -> anyhow::Result<()> {
    let mut store = open_store(config);
    store.set_analytics(granted)?;
    store.mark_toast_shown()?;
    println!("{}", describe(store.flags()));
    Ok(())
}

/// # Errors
///
/// Returns an error if the consent file cannot be removed.
pub(crate) fn run_reset(config: &AppConfig) -> anyhow::Result<()> {
    let mut store = open_store(config);
    store.reset()?;
    println!("consent answers cleared");
    Ok(())
}
