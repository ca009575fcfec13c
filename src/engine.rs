//! Engine - single owner of inventory, favorites and mode flags
//!
//! Tray callbacks and the periodic refresher may run on different threads,
//! so all state sits behind one mutex. The lock is never held across a tool
//! invocation: refreshes build a complete new inventory first and swap it
//! in, which makes a refresh racing a routing change harmless.

use crate::audio_tool::AudioTool;
use crate::cli::Settings;
use crate::dump;
use crate::error::{RefreshError, StoreError};
use crate::favorites::FavoritesStore;
use crate::inventory::Inventory;
use crate::view::{self, Action, AppMenu, DisplayOptions, GroupedFavorites, ModeState};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Everything the presentation layer needs after a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub modes: ModeState,
    pub settings: Settings,
    pub favorites: GroupedFavorites,
    pub apps: Vec<AppMenu>,
}

#[derive(Debug, Default)]
struct EngineState {
    inventory: Inventory,
    favorites: FavoritesStore,
    modes: ModeState,
}

/// Owns the mutable state and dispatches user actions
pub struct Engine {
    tool: Arc<dyn AudioTool>,
    settings: Settings,
    state: Mutex<EngineState>,
    listeners: RwLock<Vec<Listener>>,
}

impl Engine {
    pub fn new(tool: Arc<dyn AudioTool>, settings: Settings) -> Self {
        Self {
            tool,
            settings,
            state: Mutex::new(EngineState {
                modes: ModeState::new(settings.start_full),
                ..EngineState::default()
            }),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Register a listener called after every state change
    pub fn subscribe<F>(&self, listener: F) -> usize
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write();
        listeners.push(Arc::new(listener));
        listeners.len() - 1
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        let listeners: Vec<Listener> = self.listeners.read().clone();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Current presentation data
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        let options = DisplayOptions {
            info_suppressed: self.settings.info_suppressed,
        };
        let favorites = if self.settings.favorites_enabled {
            view::build_favorites(&state.favorites, &state.inventory, &state.modes, &options)
        } else {
            GroupedFavorites::default()
        };
        Snapshot {
            modes: state.modes,
            settings: self.settings,
            favorites,
            apps: view::build_apps(&state.inventory, &state.modes, &options),
        }
    }

    pub fn inventory(&self) -> Inventory {
        self.state.lock().inventory.clone()
    }

    pub fn favorites(&self) -> FavoritesStore {
        self.state.lock().favorites.clone()
    }

    pub fn modes(&self) -> ModeState {
        self.state.lock().modes
    }

    /// Query the tool and replace the inventory.
    ///
    /// On failure the previous inventory stays in place.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let bytes = self.tool.query_dump().await?;
        let text = dump::decode_utf16le(&bytes)?;
        let decoded = dump::decode(&text)?;
        let inventory = Inventory::from_dump(&decoded);

        self.state.lock().inventory = inventory;
        self.notify();
        Ok(())
    }

    /// Refresh, logging instead of returning the failure
    pub async fn refresh_logged(&self) {
        if let Err(e) = self.refresh().await {
            warn!("Refresh failed, keeping previous inventory: {}", e);
        }
    }

    /// Carry out a menu action
    pub async fn dispatch(&self, action: Action) {
        debug!(?action, "Dispatching action");
        match action {
            Action::SwitchDevice {
                process_id,
                device_id,
            } => {
                if let Err(e) = self.tool.set_app_default(&device_id, &process_id).await {
                    warn!("Failed to switch device for process {}: {}", process_id, e);
                }
                self.refresh_logged().await;
            }
            Action::SetMuted { process_id, muted } => {
                if let Err(e) = self.tool.set_muted(&process_id, muted).await {
                    warn!("Failed to set mute for process {}: {}", process_id, e);
                }
                self.refresh_logged().await;
            }
            Action::AddFavorite {
                app_path,
                device_id,
            } => self.add_favorite(&app_path, &device_id),
            Action::RemoveFavorite { ordinal } => self.remove_favorite(ordinal),
            Action::RemoveAllFavorites { app_path } => self.remove_all_favorites(&app_path),
        }
    }

    pub fn add_favorite(&self, app_path: &str, device_id: &str) {
        if !self.settings.favorites_enabled {
            return;
        }
        let added = self.state.lock().favorites.add(app_path, device_id);
        if added.is_some() {
            self.notify();
        }
    }

    pub fn remove_favorite(&self, ordinal: usize) {
        let removed = self.state.lock().favorites.remove_at(ordinal);
        if removed.is_some() {
            self.notify();
        }
    }

    pub fn remove_all_favorites(&self, app_path: &str) {
        let removed = self.state.lock().favorites.remove_all_for_path(app_path);
        if removed > 0 {
            self.notify();
        }
    }

    pub fn clear_favorites(&self) {
        self.state.lock().favorites.clear();
        self.notify();
    }

    /// Toggle edit mode; ignored when favorites are disabled
    pub fn toggle_edit_mode(&self) {
        if !self.settings.edit_mode_allowed() {
            debug!("Edit mode unavailable with favorites disabled");
            return;
        }
        self.state.lock().modes.toggle_edit_mode();
        self.notify();
    }

    pub fn toggle_favorite_mode(&self) {
        self.state.lock().modes.toggle_favorite_mode();
        self.notify();
    }

    pub async fn open_volume_settings(&self) {
        if let Err(e) = self.tool.open_volume_settings().await {
            warn!("Failed to open sound settings: {}", e);
        }
    }

    pub async fn open_tool_window(&self) {
        if let Err(e) = self.tool.open_tool_window().await {
            warn!("Failed to open {}: {}", self.tool.name(), e);
        }
    }

    /// Load favorites if enabled; failures leave the store empty
    pub async fn load_favorites(&self, path: &Path) {
        if !self.settings.load_favorites {
            debug!("Favorites loading disabled");
            return;
        }
        let store = match FavoritesStore::load_from_file(path).await {
            Ok(store) => store,
            Err(e) => {
                warn!("{}, starting with no favorites", e);
                FavoritesStore::new()
            }
        };
        self.state.lock().favorites = store;
        self.notify();
    }

    /// Save favorites if enabled. Returns whether a file was written.
    pub async fn save_favorites(&self, path: &Path) -> Result<bool, StoreError> {
        if !self.settings.save_favorites {
            debug!("Favorites saving disabled");
            return Ok(false);
        }
        let store = self.favorites();
        store.save_to_file(path).await?;
        info!("Favorites saved ({} entries)", store.len());
        Ok(true)
    }
}
