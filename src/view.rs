//! Presentation data: favorites joined with the live inventory
//!
//! Nothing here renders anything. The builders resolve labels, decide which
//! items are enabled and attach the [`Action`] each item triggers in the
//! current mode; the tray turns that into native menus.

use crate::favorites::FavoritesStore;
use crate::inventory::{ApplicationEntry, Inventory};
use std::collections::HashMap;

/// Label for a favorite whose device is not in the current inventory
pub const DEVICE_NOT_FOUND: &str = "Device not found";

/// Which popup the tray shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FavoriteMode {
    /// Favorites-only popup
    #[default]
    Compact,
    /// Full menu with apps, favorites and options
    Full,
}

/// Whether favorite items edit the store instead of routing audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Off,
    On,
}

/// Mode flags owned by the caller.
///
/// Edit mode is only ever on together with full mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeState {
    favorite_mode: FavoriteMode,
    edit_mode: EditMode,
}

impl ModeState {
    pub fn new(start_full: bool) -> Self {
        Self {
            favorite_mode: if start_full {
                FavoriteMode::Full
            } else {
                FavoriteMode::Compact
            },
            edit_mode: EditMode::Off,
        }
    }

    pub fn favorite_mode(&self) -> FavoriteMode {
        self.favorite_mode
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    pub fn is_full(&self) -> bool {
        self.favorite_mode == FavoriteMode::Full
    }

    pub fn is_editing(&self) -> bool {
        self.edit_mode == EditMode::On
    }

    /// Switch between compact and full; leaving full also leaves edit mode
    pub fn toggle_favorite_mode(&mut self) {
        self.favorite_mode = match self.favorite_mode {
            FavoriteMode::Compact => FavoriteMode::Full,
            FavoriteMode::Full => {
                self.edit_mode = EditMode::Off;
                FavoriteMode::Compact
            }
        };
    }

    /// Switch edit mode; entering it from compact forces full mode first
    pub fn toggle_edit_mode(&mut self) {
        match self.edit_mode {
            EditMode::Off => {
                self.favorite_mode = FavoriteMode::Full;
                self.edit_mode = EditMode::On;
            }
            EditMode::On => self.edit_mode = EditMode::Off,
        }
    }
}

/// Label options resolved from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayOptions {
    /// Hide process ids and device sub-names
    pub info_suppressed: bool,
}

impl DisplayOptions {
    fn app_label(&self, app: &ApplicationEntry) -> String {
        if self.info_suppressed {
            app.name.clone()
        } else {
            format!("{} ({})", app.name, app.process_id)
        }
    }

    fn device_label(&self, name: &str, sub_name: &str) -> String {
        if self.info_suppressed {
            name.to_string()
        } else {
            format!("{} ({})", name, sub_name)
        }
    }
}

/// Something a menu item asks the engine to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SwitchDevice { process_id: String, device_id: String },
    SetMuted { process_id: String, muted: bool },
    AddFavorite { app_path: String, device_id: String },
    RemoveFavorite { ordinal: usize },
    RemoveAllFavorites { app_path: String },
}

/// One favorite device under an application group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteBinding {
    pub ordinal: usize,
    pub device_id: String,
    pub label: String,
    pub device_found: bool,
    pub enabled: bool,
    pub action: Option<Action>,
}

/// Favorites of one application, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteGroup {
    pub app_path: String,
    pub label: String,
    /// Live entry when the application is running
    pub app: Option<ApplicationEntry>,
    pub enabled: bool,
    pub bindings: Vec<FavoriteBinding>,
    /// "Remove all" for this application, only offered in edit mode
    pub remove_all: Option<Action>,
}

impl FavoriteGroup {
    pub fn is_running(&self) -> bool {
        self.app.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupedFavorites {
    pub groups: Vec<FavoriteGroup>,
    pub editing: bool,
}

impl GroupedFavorites {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, app_path: &str) -> Option<&FavoriteGroup> {
        self.groups.iter().find(|g| g.app_path == app_path)
    }
}

/// Last segment of a stored executable path
fn file_name(path: &str) -> &str {
    path.rsplit(['\\', '/'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

/// Join the favorites with the live inventory and group them by application
pub fn build_favorites(
    favorites: &FavoritesStore,
    inventory: &Inventory,
    modes: &ModeState,
    options: &DisplayOptions,
) -> GroupedFavorites {
    let editing = modes.is_editing();
    let mut groups: Vec<FavoriteGroup> = Vec::new();
    let mut by_path: HashMap<&str, usize> = HashMap::new();

    for (ordinal, association) in favorites.iter() {
        let path = association.app_path.as_str();
        let index = *by_path.entry(path).or_insert_with(|| {
            let app = inventory.application_by_path(path).cloned();
            let label = match &app {
                Some(app) => app.name.clone(),
                None => file_name(path).to_string(),
            };
            groups.push(FavoriteGroup {
                app_path: path.to_string(),
                label,
                enabled: app.is_some() || editing,
                app,
                bindings: Vec::new(),
                remove_all: editing.then(|| Action::RemoveAllFavorites {
                    app_path: path.to_string(),
                }),
            });
            groups.len() - 1
        });

        let group = &mut groups[index];
        let binding = match inventory.device(&association.device_id) {
            Some(device) => {
                let action = if editing {
                    Some(Action::RemoveFavorite { ordinal })
                } else {
                    group.app.as_ref().map(|app| Action::SwitchDevice {
                        process_id: app.process_id.clone(),
                        device_id: device.device_id.clone(),
                    })
                };
                FavoriteBinding {
                    ordinal,
                    device_id: association.device_id.clone(),
                    label: options.device_label(&device.name, &device.sub_name),
                    device_found: true,
                    enabled: true,
                    action,
                }
            }
            None => FavoriteBinding {
                ordinal,
                device_id: association.device_id.clone(),
                label: DEVICE_NOT_FOUND.to_string(),
                device_found: false,
                enabled: false,
                action: None,
            },
        };
        group.bindings.push(binding);
    }

    GroupedFavorites { groups, editing }
}

/// One output device under a running application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceChoice {
    pub device_id: String,
    pub label: String,
    pub enabled: bool,
    pub action: Action,
}

/// A running application with its device choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMenu {
    pub label: String,
    pub process_id: String,
    pub process_path: String,
    pub muted: Option<bool>,
    pub devices: Vec<DeviceChoice>,
}

impl AppMenu {
    /// Action toggling the mute state, if the dump reports it
    pub fn toggle_mute(&self) -> Option<Action> {
        self.muted.map(|muted| Action::SetMuted {
            process_id: self.process_id.clone(),
            muted: !muted,
        })
    }
}

/// Running applications with every active device.
///
/// Outside edit mode the current device is disabled; an application whose
/// device is unresolved has none disabled. In edit mode a device adds a
/// favorite instead of switching.
pub fn build_apps(inventory: &Inventory, modes: &ModeState, options: &DisplayOptions) -> Vec<AppMenu> {
    let editing = modes.is_editing();
    inventory
        .applications
        .iter()
        .map(|app| AppMenu {
            label: options.app_label(app),
            process_id: app.process_id.clone(),
            process_path: app.process_path.clone(),
            muted: app.muted,
            devices: inventory
                .devices
                .iter()
                .map(|device| DeviceChoice {
                    device_id: device.device_id.clone(),
                    label: options.device_label(&device.name, &device.sub_name),
                    enabled: editing || !app.current_device.is(&device.device_id),
                    action: if editing {
                        Action::AddFavorite {
                            app_path: app.process_path.clone(),
                            device_id: device.device_id.clone(),
                        }
                    } else {
                        Action::SwitchDevice {
                            process_id: app.process_id.clone(),
                            device_id: device.device_id.clone(),
                        }
                    },
                })
                .collect(),
        })
        .collect()
}
