//! Command dispatch
//!
//! Hotkey threads, the signal thread and tray menu callbacks only send
//! [`Command`]s; the main task drains them one at a time through
//! [`App::handle`], which owns every piece of mutable state.

use tracing::{debug, info, warn};

use crate::constants::tray;
use crate::engine::{IconRefresh, ProfileEngine, ReloadOutcome};
use crate::hotkeys::{HotkeyAction, HotkeyBinder, HotkeyId};
use crate::icon::{CompositeIcon, GlyphRasterizer, IconCompositor};
use crate::persistence::ConfigSource;
use crate::pointer::SettingsSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// A registered hotkey fired
    Hotkey(HotkeyId),
    /// Profile chosen from the tray menu
    ActivateProfile(usize),
    Cycle,
    Reload,
    Quit,
}

/// Everything the tray needs to draw itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayView {
    pub profiles: Vec<String>,
    pub selected: Option<usize>,
    pub icon: CompositeIcon,
    pub tooltip: String,
    pub status: Option<String>,
}

#[derive(Debug)]
pub enum Flow {
    Continue(TrayView),
    Quit,
}

pub struct App<S, B, C, R> {
    engine: ProfileEngine<S, B>,
    source: C,
    compositor: IconCompositor<R>,
    icon: CompositeIcon,
    status: Option<String>,
}

impl<S, B, C, R> App<S, B, C, R>
where
    S: SettingsSink,
    B: HotkeyBinder,
    C: ConfigSource,
    R: GlyphRasterizer,
{
    pub fn new(engine: ProfileEngine<S, B>, source: C, compositor: IconCompositor<R>) -> Self {
        let icon = compositor.base_icon();
        Self {
            engine,
            source,
            compositor,
            icon,
            status: None,
        }
    }

    /// Shows `message` on the tray status line until the next success
    pub fn report(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn handle(&mut self, command: Command) -> Flow {
        debug!(?command, "Dispatching command");
        match command {
            Command::Hotkey(id) => match self.engine.route(id) {
                HotkeyAction::Cycle => self.cycle(),
                HotkeyAction::ActivateProfile(index) => self.activate(index),
                HotkeyAction::Unknown => debug!(id, "Ignoring hotkey with no profile"),
            },
            Command::ActivateProfile(index) => {
                let count = self.engine.configuration().profiles.len();
                if index < count {
                    self.activate(index);
                } else {
                    warn!(index, count, "Ignoring menu request for a profile that no longer exists");
                }
            }
            Command::Cycle => self.cycle(),
            Command::Reload => self.reload(),
            Command::Quit => {
                info!("Quit requested");
                return Flow::Quit;
            }
        }
        Flow::Continue(self.view())
    }

    /// Current state, composing the icon for any pending change first
    pub fn view(&mut self) -> TrayView {
        if let Some(refresh) = self.engine.take_icon_refresh() {
            // Replacement is built before the previous icon is dropped
            let icon = match refresh {
                IconRefresh::Profile { numeral, tint } => self.compositor.render_or_base(tint, numeral),
                IconRefresh::Base => self.compositor.base_icon(),
            };
            self.icon = icon;
        }

        let configuration = self.engine.configuration();
        let selected = self.engine.selected();
        let current = selected
            .and_then(|index| configuration.profiles.get(index))
            .map_or("no profile selected", |profile| profile.name.as_str());

        let mut tooltip = format!("{}: {current}", tray::TITLE);
        if let Some(status) = &self.status {
            tooltip.push('\n');
            tooltip.push_str(status);
        }

        TrayView {
            profiles: configuration.profiles.iter().map(|p| p.name.clone()).collect(),
            selected,
            icon: self.icon.clone(),
            tooltip,
            status: self.status.clone(),
        }
    }

    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }

    fn activate(&mut self, index: usize) {
        match self.engine.activate_profile(index) {
            Ok(()) => self.status = None,
            Err(e) => self.report(format!("Could not apply profile: {e}")),
        }
    }

    fn cycle(&mut self) {
        match self.engine.cycle() {
            Ok(Some(_)) => self.status = None,
            Ok(None) => debug!("No profiles to cycle through"),
            Err(e) => self.report(format!("Could not apply profile: {e}")),
        }
    }

    fn reload(&mut self) {
        match self.engine.reload(&self.source) {
            Ok(ReloadOutcome::Unchanged) => {
                self.report("Configuration file not found, keeping current profiles");
            }
            Ok(ReloadOutcome::Reloaded { restored: Some(Err(e)), .. }) => {
                self.report(format!("Reloaded, but could not reapply profile: {e}"));
            }
            Ok(ReloadOutcome::Reloaded { .. }) => self.status = None,
            Err(e) => self.report(format!("Reload failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::config::ConfigStore;
    use crate::hotkeys::HotkeyRouter;
    use crate::icon::BaseGlyph;
    use crate::testing::{document, BlockRasterizer, FakeSink, MemorySource, RecordingBinder};

    type TestApp = App<FakeSink, RecordingBinder, MemorySource, BlockRasterizer>;

    fn app(names: &[&str]) -> TestApp {
        let source = MemorySource::with(&document(names));
        let configuration = ConfigStore::load(&source.read().unwrap()).unwrap();
        let engine = ProfileEngine::new(FakeSink::default(), RecordingBinder::default(), configuration);
        let compositor = IconCompositor::new(Some(BlockRasterizer), BaseGlyph::bundled().unwrap());
        App::new(engine, source, compositor)
    }

    fn view(flow: Flow) -> TrayView {
        match flow {
            Flow::Continue(view) => view,
            Flow::Quit => panic!("unexpected quit"),
        }
    }

    fn expected_icon(numeral: u8) -> CompositeIcon {
        IconCompositor::new(Some(BlockRasterizer), BaseGlyph::bundled().unwrap())
            .render(Rgb::new(0, 255, 0), numeral)
            .unwrap()
    }

    #[test]
    fn test_initial_view_has_base_icon_and_no_selection() {
        let mut app = app(&["Mouse", "Trackball"]);
        let view = app.view();
        assert_eq!(view.profiles, ["Mouse", "Trackball"]);
        assert_eq!(view.selected, None);
        assert_eq!(view.icon, CompositeIcon::from_base(&BaseGlyph::bundled().unwrap()));
        assert_eq!(view.tooltip, "Pointer Profiles: no profile selected");
    }

    #[test]
    fn test_profile_hotkey_activates_and_numbers_icon() {
        let mut app = app(&["Mouse", "Trackball"]);
        let view = view(app.handle(Command::Hotkey(HotkeyRouter::profile_id(1))));

        assert_eq!(view.selected, Some(1));
        assert_eq!(view.icon, expected_icon(2));
        assert_eq!(view.tooltip, "Pointer Profiles: Trackball");
    }

    #[test]
    fn test_cycle_hotkey_and_menu_cycle_share_state() {
        let mut app = app(&["a", "b"]);
        let first = view(app.handle(Command::Hotkey(crate::constants::hotkey_ids::CYCLE)));
        assert_eq!(first.selected, Some(0));
        let second = view(app.handle(Command::Cycle));
        assert_eq!(second.selected, Some(1));
        let third = view(app.handle(Command::Cycle));
        assert_eq!(third.selected, Some(0));
    }

    #[test]
    fn test_stale_hotkey_and_menu_index_are_ignored() {
        let mut app = app(&["a", "b"]);
        let view_a = view(app.handle(Command::Hotkey(HotkeyRouter::profile_id(5))));
        assert_eq!(view_a.selected, None);
        let view_b = view(app.handle(Command::ActivateProfile(2)));
        assert_eq!(view_b.selected, None);
        assert_eq!(view_b.status, None);
    }

    #[test]
    fn test_reload_parse_error_is_reported() {
        let mut app = app(&["a", "b"]);
        app.handle(Command::ActivateProfile(0));
        app.source.replace("{ broken");

        let view = view(app.handle(Command::Reload));

        assert_eq!(view.profiles, ["a", "b"]);
        assert_eq!(view.selected, Some(0));
        let status = view.status.unwrap();
        assert!(status.starts_with("Reload failed"), "{status}");
        assert!(view.tooltip.ends_with(&status));
    }

    #[test]
    fn test_successful_activation_clears_status() {
        let mut app = app(&["a", "b"]);
        app.source.remove();
        let reported = view(app.handle(Command::Reload));
        assert!(reported.status.is_some());

        let cleared = view(app.handle(Command::ActivateProfile(1)));
        assert_eq!(cleared.status, None);
    }

    #[test]
    fn test_reload_shrink_restores_base_icon() {
        let mut app = app(&["a", "b", "c"]);
        app.handle(Command::ActivateProfile(2));
        app.source.replace(&document(&["x"]));

        let view = view(app.handle(Command::Reload));

        assert_eq!(view.profiles, ["x"]);
        assert_eq!(view.selected, None);
        assert_eq!(view.icon, CompositeIcon::from_base(&BaseGlyph::bundled().unwrap()));
    }

    #[test]
    fn test_quit_stops_dispatch() {
        let mut app = app(&["a"]);
        assert!(matches!(app.handle(Command::Quit), Flow::Quit));
    }
}
