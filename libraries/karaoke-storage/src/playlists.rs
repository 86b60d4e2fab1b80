//! Local playlist catalog stored as a JSON file
//!
//! The file is re-read on every call so hand edits show up without a
//! restart. Writes go through a temporary file and a rename.

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use karaoke_core::{Playlist, PlaylistId, PlaylistStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// On-disk layout: `{ "playlists": [ ... ] }`
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    playlists: Vec<Playlist>,
}

/// `PlaylistStore` backed by a JSON file
pub struct JsonPlaylistStore {
    path: PathBuf,
    seed: Vec<Playlist>,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonPlaylistStore {
    /// Open a catalog, creating an empty one if the file is missing
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_seed(path, Vec::new()).await
    }

    /// Open a catalog, creating it from `seed` if the file is missing
    pub async fn open_with_seed(path: impl Into<PathBuf>, seed: Vec<Playlist>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            seed,
            write_lock: Mutex::new(()),
        };
        store.ensure_exists().await?;
        Ok(store)
    }

    /// Path of the catalog file, for manual editing
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Replace the catalog with the seed list
    pub async fn reset_to_default(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        info!(path = %self.path.display(), "Resetting playlist catalog");
        self.write(&self.seed).await
    }

    async fn ensure_exists(&self) -> Result<()> {
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        if exists {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }
        info!(path = %self.path.display(), playlists = self.seed.len(), "Creating playlist catalog");
        self.write(&self.seed).await
    }

    /// Current entries; an unreadable or corrupt file reads as empty
    async fn read(&self) -> Result<Vec<Playlist>> {
        self.ensure_exists().await?;
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read playlist catalog");
                return Ok(Vec::new());
            }
        };
        match serde_json::from_str::<CatalogFile>(&raw) {
            Ok(file) => Ok(file.playlists),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt playlist catalog, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, playlists: &[Playlist]) -> Result<()> {
        let file = CatalogFile {
            playlists: playlists.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        debug!(path = %self.path.display(), playlists = playlists.len(), "Saved playlist catalog");
        Ok(())
    }
}

#[async_trait]
impl PlaylistStore for JsonPlaylistStore {
    async fn playlists(&self) -> karaoke_core::Result<Vec<Playlist>> {
        Ok(self.read().await?)
    }

    async fn add(&self, playlist: Playlist) -> karaoke_core::Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut playlists = self.read().await?;
        if playlists.iter().any(|p| p.id == playlist.id) {
            debug!(playlist_id = %playlist.id, "Playlist already in catalog");
            return Ok(false);
        }
        info!(playlist_id = %playlist.id, title = %playlist.title, "Adding playlist");
        playlists.push(playlist);
        self.write(&playlists).await?;
        Ok(true)
    }

    async fn update(&self, playlist: Playlist) -> karaoke_core::Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut playlists = self.read().await?;
        let Some(slot) = playlists.iter_mut().find(|p| p.id == playlist.id) else {
            return Ok(false);
        };
        *slot = playlist;
        self.write(&playlists).await?;
        Ok(true)
    }

    async fn remove(&self, playlist_id: &PlaylistId) -> karaoke_core::Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut playlists = self.read().await?;
        let before = playlists.len();
        playlists.retain(|p| &p.id != playlist_id);
        if playlists.len() == before {
            return Ok(false);
        }
        info!(playlist_id = %playlist_id, "Removing playlist");
        self.write(&playlists).await?;
        Ok(true)
    }

    async fn contains(&self, playlist_id: &PlaylistId) -> karaoke_core::Result<bool> {
        Ok(self.read().await?.iter().any(|p| &p.id == playlist_id))
    }
}
