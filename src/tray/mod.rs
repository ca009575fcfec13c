//! System tray UI module
//!
//! The platform-independent half turns engine snapshots into a menu model
//! and defines the messages exchanged with the tray thread. The native
//! tray itself only exists on Windows, where the audio tool runs.

pub mod icons;
#[cfg(windows)]
pub mod manager;
pub mod menu;

pub use menu::{build_menu, MenuModel, MenuNode};

#[cfg(windows)]
pub use manager::TrayManager;

use crate::cli::Settings;
use crate::view::Action;

/// Commands sent from tray UI to the main Tokio runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayCommand {
    /// A favorite or app menu item was activated
    Action(Action),
    /// Re-query the audio tool
    Refresh,
    /// Switch between the favorites popup and the full menu
    ToggleFavoriteMode,
    /// Enter or leave favorites edit mode
    ToggleEditMode,
    /// Remove every favorite
    ClearFavorites,
    /// Open the system per-app volume settings
    OpenVolumeSettings,
    /// Open the audio tool's own window
    OpenToolWindow,
    /// Shutdown the application
    Shutdown,
}

/// Updates sent from the main runtime to the tray UI
#[derive(Debug, Clone)]
pub enum TrayUpdate {
    /// Replace the popup menu
    Menu(MenuModel),
    /// Remove the icon and stop the tray thread
    Quit,
}

/// What a double-click on the icon does
pub fn double_click_command(settings: &Settings) -> TrayCommand {
    if settings.double_click_switch {
        TrayCommand::ToggleFavoriteMode
    } else {
        TrayCommand::Shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_click_switches_by_default() {
        assert_eq!(
            double_click_command(&Settings::default()),
            TrayCommand::ToggleFavoriteMode
        );
    }

    #[test]
    fn test_double_click_exits_when_switching_disabled() {
        let settings = Settings {
            double_click_switch: false,
            ..Settings::default()
        };
        assert_eq!(double_click_command(&settings), TrayCommand::Shutdown);
    }
}
