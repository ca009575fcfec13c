//! Tray manager - Windows system tray integration
//!
//! Runs on a dedicated OS thread to handle Win32 message loop.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace, warn};

use super::icons::{generate_icon_bytes, IconColor, ICON_SIZE};
use super::{MenuModel, MenuNode, TrayCommand, TrayUpdate};
use crate::config::TrayConfig;

type MenuItems = Vec<Box<dyn muda::IsMenuItem>>;

/// Tray manager running on dedicated OS thread
pub struct TrayManager {
    /// Receive updates from Tokio runtime
    update_rx: crossbeam::channel::Receiver<TrayUpdate>,
    /// Send commands to Tokio runtime
    command_tx: UnboundedSender<TrayCommand>,
    config: TrayConfig,
    /// Sent when the icon is double-clicked
    double_click: TrayCommand,
    /// Menu item id -> command, rebuilt with every menu
    commands: HashMap<String, TrayCommand>,
    next_id: usize,
    /// Last rendered model, to skip identical rebuilds
    current: Option<MenuModel>,
}

impl TrayManager {
    pub fn new(
        update_rx: crossbeam::channel::Receiver<TrayUpdate>,
        command_tx: UnboundedSender<TrayCommand>,
        config: TrayConfig,
        double_click: TrayCommand,
    ) -> Self {
        Self {
            update_rx,
            command_tx,
            config,
            double_click,
            commands: HashMap::new(),
            next_id: 0,
            current: None,
        }
    }

    /// Run the tray manager (blocks until quit)
    ///
    /// This runs the Win32 message loop on the current thread.
    pub fn run(mut self) -> anyhow::Result<()> {
        debug!("Starting system tray manager...");

        let tray_icon = tray_icon::TrayIconBuilder::new()
            .with_icon(make_icon(IconColor::Compact)?)
            .with_tooltip(&self.config.tooltip)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create tray icon: {}", e))?;

        debug!("System tray icon created");

        let menu_channel = muda::MenuEvent::receiver();
        let icon_channel = tray_icon::TrayIconEvent::receiver();

        loop {
            // Pump Windows messages (required for tray/menu events on Windows)
            pump_windows_messages();

            while let Ok(event) = menu_channel.try_recv() {
                match self.commands.get(event.id.as_ref()) {
                    Some(command) => {
                        debug!("Menu command: {:?}", command);
                        self.send(command.clone());
                    }
                    None => debug!("Unknown menu item: {:?}", event.id),
                }
            }

            while let Ok(event) = icon_channel.try_recv() {
                if matches!(event, tray_icon::TrayIconEvent::DoubleClick { .. }) {
                    trace!("Tray icon double-clicked");
                    self.send(self.double_click.clone());
                }
            }

            let update = match self.update_rx.recv_timeout(Duration::from_millis(50)) {
                Ok(update) => update,
                Err(crossbeam::channel::RecvTimeoutError::Timeout) => continue,
                Err(crossbeam::channel::RecvTimeoutError::Disconnected) => break,
            };

            match update {
                TrayUpdate::Menu(model) => {
                    if self.current.as_ref() == Some(&model) {
                        trace!("Menu unchanged, skipping rebuild");
                        continue;
                    }

                    let full_changed = self.current.as_ref().map(|m| m.full) != Some(model.full);
                    if full_changed {
                        match make_icon(IconColor::for_mode(model.full)) {
                            Ok(icon) => {
                                if let Err(e) = tray_icon.set_icon(Some(icon)) {
                                    warn!("Failed to update tray icon: {}", e);
                                }
                            }
                            Err(e) => warn!("{}", e),
                        }
                    }

                    match self.render(&model) {
                        Ok(menu) => {
                            tray_icon.set_menu(Some(Box::new(menu)));
                            trace!("Menu rebuilt ({} commands)", self.commands.len());
                            self.current = Some(model);
                        }
                        Err(e) => warn!("Failed to build tray menu: {}", e),
                    }
                }
                TrayUpdate::Quit => break,
            }
        }

        debug!("Tray manager shutting down, removing icon...");

        // Explicitly remove the tray icon to prevent ghost icons
        if let Err(e) = tray_icon.set_visible(false) {
            warn!("Failed to hide tray icon: {}", e);
        }
        drop(tray_icon);

        Ok(())
    }

    fn send(&self, command: TrayCommand) {
        if self.command_tx.send(command).is_err() {
            debug!("Command receiver closed");
        }
    }

    /// Turn the model into a native menu and remember which id runs what
    fn render(&mut self, model: &MenuModel) -> anyhow::Result<muda::Menu> {
        self.commands.clear();
        let items = self.build_items(&model.nodes)?;

        let menu = muda::Menu::new();
        for item in &items {
            menu.append(item.as_ref())?;
        }
        Ok(menu)
    }

    fn build_items(&mut self, nodes: &[MenuNode]) -> anyhow::Result<MenuItems> {
        let mut items: MenuItems = Vec::with_capacity(nodes.len());

        for node in nodes {
            match node {
                MenuNode::Item {
                    label,
                    enabled,
                    command,
                } => {
                    let id = self.register(command);
                    items.push(Box::new(muda::MenuItem::with_id(id, label, *enabled, None)));
                }
                MenuNode::Check {
                    label,
                    checked,
                    enabled,
                    command,
                } => {
                    let id = self.register(command);
                    items.push(Box::new(muda::CheckMenuItem::with_id(
                        id, label, *enabled, *checked, None,
                    )));
                }
                MenuNode::Submenu {
                    label,
                    enabled,
                    children,
                } => {
                    let submenu = muda::Submenu::new(label, *enabled);
                    for child in self.build_items(children)? {
                        submenu.append(child.as_ref())?;
                    }
                    items.push(Box::new(submenu));
                }
                MenuNode::Separator => items.push(Box::new(muda::PredefinedMenuItem::separator())),
            }
        }

        Ok(items)
    }

    fn register(&mut self, command: &Option<TrayCommand>) -> String {
        self.next_id += 1;
        let id = format!("item-{}", self.next_id);
        if let Some(command) = command {
            self.commands.insert(id.clone(), command.clone());
        }
        id
    }
}

fn make_icon(color: IconColor) -> anyhow::Result<tray_icon::Icon> {
    tray_icon::Icon::from_rgba(generate_icon_bytes(color), ICON_SIZE, ICON_SIZE)
        .map_err(|e| anyhow::anyhow!("Failed to create icon: {}", e))
}

/// Pump Windows messages to process tray/menu events
fn pump_windows_messages() {
    use windows::Win32::UI::WindowsAndMessaging::*;

    unsafe {
        let mut msg = std::mem::zeroed();
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}
