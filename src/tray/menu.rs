//! Menu model built from an engine snapshot
//!
//! Compact mode shows only the favorites. Full mode adds the favorites
//! submenu with its edit controls, every running application, and the
//! launchers.

use super::TrayCommand;
use crate::engine::Snapshot;
use crate::view::{AppMenu, FavoriteGroup};

/// One entry of a tray popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuNode {
    Item {
        label: String,
        enabled: bool,
        command: Option<TrayCommand>,
    },
    Check {
        label: String,
        checked: bool,
        enabled: bool,
        command: Option<TrayCommand>,
    },
    Submenu {
        label: String,
        enabled: bool,
        children: Vec<MenuNode>,
    },
    Separator,
}

impl MenuNode {
    fn item(label: &str, command: TrayCommand) -> Self {
        MenuNode::Item {
            label: label.to_string(),
            enabled: true,
            command: Some(command),
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            MenuNode::Item { label, .. }
            | MenuNode::Check { label, .. }
            | MenuNode::Submenu { label, .. } => Some(label),
            MenuNode::Separator => None,
        }
    }

    pub fn command(&self) -> Option<&TrayCommand> {
        match self {
            MenuNode::Item { command, .. } | MenuNode::Check { command, .. } => command.as_ref(),
            _ => None,
        }
    }

    pub fn children(&self) -> &[MenuNode] {
        match self {
            MenuNode::Submenu { children, .. } => children,
            _ => &[],
        }
    }
}

/// A complete popup plus the mode it was built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuModel {
    pub full: bool,
    pub nodes: Vec<MenuNode>,
}

impl MenuModel {
    /// First top-level node with this label
    pub fn find(&self, label: &str) -> Option<&MenuNode> {
        self.nodes.iter().find(|n| n.label() == Some(label))
    }
}

fn favorite_group(group: &FavoriteGroup) -> MenuNode {
    let mut children: Vec<MenuNode> = group
        .bindings
        .iter()
        .map(|binding| MenuNode::Item {
            label: binding.label.clone(),
            enabled: binding.enabled,
            command: binding.action.clone().map(TrayCommand::Action),
        })
        .collect();

    if let Some(remove_all) = &group.remove_all {
        children.push(MenuNode::Separator);
        children.push(MenuNode::item("Delete All", TrayCommand::Action(remove_all.clone())));
    }

    MenuNode::Submenu {
        label: group.label.clone(),
        enabled: group.enabled,
        children,
    }
}

fn app_menu(app: &AppMenu, simple: bool) -> MenuNode {
    let devices: Vec<MenuNode> = app
        .devices
        .iter()
        .map(|device| MenuNode::Item {
            label: device.label.clone(),
            enabled: device.enabled,
            command: Some(TrayCommand::Action(device.action.clone())),
        })
        .collect();

    let children = if simple {
        devices
    } else {
        vec![
            MenuNode::Submenu {
                label: "Output Device".to_string(),
                enabled: !devices.is_empty(),
                children: devices,
            },
            MenuNode::Separator,
            MenuNode::Check {
                label: "Mute".to_string(),
                checked: app.muted.unwrap_or(false),
                enabled: app.muted.is_some(),
                command: app.toggle_mute().map(TrayCommand::Action),
            },
        ]
    };

    MenuNode::Submenu {
        label: app.label.clone(),
        enabled: true,
        children,
    }
}

/// Build the popup for the snapshot's current mode
pub fn build_menu(snapshot: &Snapshot) -> MenuModel {
    let settings = &snapshot.settings;

    if !snapshot.modes.is_full() {
        let mut nodes: Vec<MenuNode> = snapshot.favorites.groups.iter().map(favorite_group).collect();
        if nodes.is_empty() {
            nodes.push(MenuNode::item("Switch mode", TrayCommand::ToggleFavoriteMode));
        }
        return MenuModel { full: false, nodes };
    }

    let mut nodes = Vec::new();

    if settings.favorites_enabled {
        let mut favorites: Vec<MenuNode> = snapshot.favorites.groups.iter().map(favorite_group).collect();
        if !favorites.is_empty() {
            favorites.push(MenuNode::Separator);
        }
        let edit_label = if snapshot.modes.is_editing() { "Cancel" } else { "Edit" };
        favorites.push(MenuNode::item(edit_label, TrayCommand::ToggleEditMode));
        favorites.push(MenuNode::item("Remove All", TrayCommand::ClearFavorites));

        nodes.push(MenuNode::Submenu {
            label: "Favorites".to_string(),
            enabled: true,
            children: favorites,
        });
        nodes.push(MenuNode::Separator);
    }

    nodes.push(MenuNode::Submenu {
        label: "Apps".to_string(),
        enabled: true,
        children: snapshot
            .apps
            .iter()
            .map(|app| app_menu(app, settings.simple_menu))
            .collect(),
    });
    nodes.push(MenuNode::Separator);
    nodes.push(MenuNode::item("(Refresh)", TrayCommand::Refresh));

    if settings.include_options {
        nodes.push(MenuNode::Separator);
        nodes.push(MenuNode::item("Sound Settings", TrayCommand::OpenVolumeSettings));
        nodes.push(MenuNode::item("SoundVolumeView", TrayCommand::OpenToolWindow));
    }

    nodes.push(MenuNode::Separator);
    nodes.push(MenuNode::item("Exit", TrayCommand::Shutdown));

    MenuModel { full: true, nodes }
}
