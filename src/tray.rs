//! StatusNotifier tray icon via ksni
//!
//! The tray only renders the latest [`TrayView`] and forwards menu clicks to
//! the dispatcher as [`Command`]s.

use std::fmt::Display;
use std::future::Future;

use ksni::menu::{CheckmarkItem, MenuItem, StandardItem};
use ksni::{Handle, TrayMethods};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::constants::{icon, tray};
use crate::error::TrayError;
use crate::event_handler::{Command, TrayView};

pub struct PointerTray {
    sender: UnboundedSender<Command>,
    view: TrayView,
}

impl PointerTray {
    fn new(sender: UnboundedSender<Command>, view: TrayView) -> Self {
        Self { sender, view }
    }

    fn send(&self, command: Command) {
        if self.sender.send(command).is_err() {
            warn!(?command, "Dispatcher gone, dropping menu command");
        }
    }
}

impl ksni::Tray for PointerTray {
    fn id(&self) -> String {
        tray::ID.to_string()
    }

    fn title(&self) -> String {
        tray::TITLE.to_string()
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        vec![ksni::Icon {
            width: icon::SIZE as i32,
            height: icon::SIZE as i32,
            data: self.view.icon.to_argb32(),
        }]
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            title: self.view.tooltip.clone(),
            ..Default::default()
        }
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        let mut items = Vec::new();

        if let Some(status) = &self.view.status {
            items.push(MenuItem::Standard(StandardItem {
                label: status.clone(),
                enabled: false,
                ..Default::default()
            }));
            items.push(MenuItem::Separator);
        }

        for (index, name) in self.view.profiles.iter().enumerate() {
            items.push(MenuItem::Checkmark(CheckmarkItem {
                label: format!("{}. {name}", index + 1),
                checked: self.view.selected == Some(index),
                activate: Box::new(move |this: &mut Self| this.send(Command::ActivateProfile(index))),
                ..Default::default()
            }));
        }

        items.extend([
            MenuItem::Separator,
            MenuItem::Standard(StandardItem {
                label: "Next profile".to_string(),
                enabled: !self.view.profiles.is_empty(),
                activate: Box::new(|this: &mut Self| this.send(Command::Cycle)),
                ..Default::default()
            }),
            MenuItem::Standard(StandardItem {
                label: "Reload configuration".to_string(),
                activate: Box::new(|this: &mut Self| this.send(Command::Reload)),
                ..Default::default()
            }),
            MenuItem::Separator,
            MenuItem::Standard(StandardItem {
                label: "Quit".to_string(),
                icon_name: "application-exit".to_string(),
                activate: Box::new(|this: &mut Self| this.send(Command::Quit)),
                ..Default::default()
            }),
        ]);

        items
    }
}

/// Runs `attempt`, and once more if it fails
async fn register_with_retry<T, E, F, Fut>(mut attempt: F) -> Result<T, TrayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    match attempt().await {
        Ok(registered) => Ok(registered),
        Err(e) => {
            warn!(error = %e, "Tray registration failed, retrying once");
            attempt().await.map_err(|e| TrayError(e.to_string()))
        }
    }
}

/// Owns the live tray item
pub struct TrayPresenter {
    handle: Handle<PointerTray>,
    sender: UnboundedSender<Command>,
}

impl TrayPresenter {
    pub async fn spawn(sender: UnboundedSender<Command>, view: TrayView) -> Result<Self, TrayError> {
        let handle = Self::register(&sender, view).await?;
        info!(id = tray::ID, "System tray icon created (StatusNotifier)");
        Ok(Self { handle, sender })
    }

    async fn register(
        sender: &UnboundedSender<Command>,
        view: TrayView,
    ) -> Result<Handle<PointerTray>, TrayError> {
        register_with_retry(|| PointerTray::new(sender.clone(), view.clone()).spawn()).await
    }

    /// Pushes `view` to the tray, re-registering the item if the service
    /// went away. The previous icon stays up when that fails.
    pub async fn show(&mut self, view: TrayView) -> Result<(), TrayError> {
        let update = view.clone();
        if self.handle.update(move |tray| tray.view = update).await.is_some() {
            return Ok(());
        }

        warn!("Tray service closed, registering a new item");
        self.handle = Self::register(&self.sender, view).await?;
        Ok(())
    }

    pub async fn shutdown(self) {
        self.handle.shutdown().await;
        info!("System tray icon removed");
    }
}
