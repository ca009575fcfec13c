//! Favorites persistence to a flat properties file
//!
//! The file holds `app{i}`/`device{i}` pairs. Loading repairs whatever it
//! finds; saving always rewrites the whole file.

use super::properties;
use super::store::FavoritesStore;
use crate::error::StoreError;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

/// Comment written at the top of every saved file
const FILE_HEADER: &str = "Sound Menu favorites";

impl FavoritesStore {
    /// Parse properties text, normalizing gaps, half pairs and duplicates
    pub fn from_properties(text: &str) -> Self {
        let (store, report) = Self::from_key_values(properties::parse(text));
        if !report.is_clean() {
            warn!(
                incomplete = ?report.incomplete,
                duplicates = ?report.duplicates,
                unknown_keys = ?report.unknown_keys,
                "Favorites file was inconsistent, compacted to {} entries",
                store.len()
            );
        }
        store
    }

    /// Render as properties text
    pub fn to_properties(&self) -> String {
        let pairs = self.to_key_values();
        properties::render(
            FILE_HEADER,
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    /// Load favorites from `path`.
    ///
    /// A missing file is an empty store. Any other read failure is returned
    /// so the caller can log it before starting empty.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No favorites file at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let store = Self::from_properties(&String::from_utf8_lossy(&bytes));
        info!("Loaded {} favorites from {}", store.len(), path.display());
        Ok(store)
    }

    /// Overwrite `path` with the current favorites
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        fs::write(path, self.to_properties())
            .await
            .map_err(|source| StoreError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Saved {} favorites to {}", self.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::FavoriteAssociation;
    use tempfile::TempDir;

    fn store_with(n: usize) -> FavoritesStore {
        let mut store = FavoritesStore::new();
        for i in 0..n {
            store.add(&format!(r"C:\Apps\app {i}.exe"), &format!("{{0.0.0.00000000}}.{{dev-{i}}}"));
        }
        store
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.properties");

        for n in [0, 1, 5] {
            let store = store_with(n);
            store.save_to_file(&path).await.unwrap();
            let loaded = FavoritesStore::load_from_file(&path).await.unwrap();
            assert_eq!(loaded.associations(), store.associations(), "n = {n}");
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let loaded = FavoritesStore::load_from_file(dir.path().join("absent.properties"))
            .await
            .unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_load_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = FavoritesStore::load_from_file(dir.path()).await;
        assert!(matches!(result, Err(StoreError::Read { .. })));
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("config.properties");
        let result = store_with(1).save_to_file(&path).await;
        assert!(matches!(result, Err(StoreError::Write { .. })));
    }

    #[test]
    fn test_reads_legacy_file() {
        let text = "#Sun Mar 03 12:00:00 CET 2024\n\
                    device2=DevB\n\
                    app1=C\\:\\\\chrome.exe\n\
                    app2=C\\:\\\\spotify.exe\n\
                    device1=DevA\n";
        let store = FavoritesStore::from_properties(text);

        assert_eq!(store.get(1), Some(&FavoriteAssociation::new(r"C:\chrome.exe", "DevA")));
        assert_eq!(store.get(2), Some(&FavoriteAssociation::new(r"C:\spotify.exe", "DevB")));
    }

    #[test]
    fn test_odd_key_count_is_normalized() {
        let store = FavoritesStore::from_properties("app1=a\ndevice1=d\napp2=b\n");
        assert_eq!(store.len(), 1);
        assert_eq!(store.key_count(), 2);
    }

    #[test]
    fn test_to_properties_layout() {
        let mut store = FavoritesStore::new();
        store.add("a", "d");
        assert_eq!(store.to_properties(), "#Sound Menu favorites\napp1=a\ndevice1=d\n");
    }
}
