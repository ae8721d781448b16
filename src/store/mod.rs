pub mod connections;
pub mod document;
pub mod favorites;
pub mod history;
pub mod settings;

pub use connections::ConnectionStore;
pub use favorites::FavoritesStore;
pub use history::{HistoryStore, HISTORY_LIMIT};
pub use settings::SettingsStore;

use std::path::{Path, PathBuf};

pub(crate) const SETTINGS_FILE: &str = "settings.json";
pub(crate) const HISTORY_FILE: &str = "history.json";
pub(crate) const FAVORITES_FILE: &str = "favorites.json";
pub(crate) const CONNECTIONS_DIR: &str = "connections";

pub(crate) fn connections_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(CONNECTIONS_DIR)
}

pub(crate) fn connection_dir(data_dir: &Path, name: &str) -> PathBuf {
    connections_dir(data_dir).join(name)
}
