//! Module trait for extensible UI components

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::Frame;

use super::{Action, Command, Context};

/// Trait for UI modules that can handle input
pub trait Module {
    /// Stable identifier used in logs
    fn id(&self) -> &'static str;

    /// Handle keyboard input
    /// Returns an Action describing what should happen
    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action;

    /// Handle a `:` command the app did not consume itself
    fn handle_command(&mut self, cmd: &Command, ctx: &mut Context) -> Action;

    /// Draw the module into `area`
    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context);
}
