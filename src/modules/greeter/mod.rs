//! Greeter module - greeting panel plus the three object inspectors

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::core::{Action, Command, Context, Module, NotifyLevel};
use crate::domain::greeter::addresses::chain_name;
use crate::domain::greeter::{GreetingPanel, PrepareState, ReadStatus};

const BUTTON_LABEL: &str = "[ Update greeting ]";

pub struct GreeterModule {
    panel: GreetingPanel,
    editing: bool,
    expanded: [bool; 3],
}

impl GreeterModule {
    pub fn new(panel: GreetingPanel) -> Self {
        Self {
            panel,
            editing: false,
            expanded: [false; 3],
        }
    }

    pub fn panel(&self) -> &GreetingPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut GreetingPanel {
        &mut self.panel
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.get(index).copied().unwrap_or(false)
    }

    pub fn toggle_inspector(&mut self, index: usize) {
        if let Some(flag) = self.expanded.get_mut(index) {
            *flag = !*flag;
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.editing = false;
                Action::None
            }
            KeyCode::Backspace => {
                self.panel.pop_char();
                Action::None
            }
            KeyCode::Char(c) => {
                self.panel.push_char(c);
                Action::None
            }
            _ => Action::None,
        }
    }
}

impl Module for GreeterModule {
    fn id(&self) -> &'static str {
        "greeter"
    }

    fn handle_key(&mut self, key: KeyEvent, _ctx: &mut Context) -> Action {
        if self.editing {
            return self.handle_edit_key(key);
        }

        match key.code {
            KeyCode::Char('i') | KeyCode::Char('e') => {
                self.editing = true;
                Action::None
            }
            KeyCode::Enter => Action::Submit,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Char(c @ '1'..='3') => {
                self.toggle_inspector(c as usize - '1' as usize);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_command(&mut self, cmd: &Command, _ctx: &mut Context) -> Action {
        match cmd {
            Command::Set(text) => {
                self.panel.set_draft(text.clone());
                Action::Notify(format!("Draft set: {text:?}"), NotifyLevel::Info)
            }
            Command::Clear => {
                self.panel.clear_draft();
                Action::Notify("Draft cleared".to_string(), NotifyLevel::Info)
            }
            Command::Send => Action::Submit,
            Command::Refresh => Action::Refresh,
            Command::Reset => {
                self.panel.reset_write();
                Action::Notify("Broadcast history cleared".to_string(), NotifyLevel::Info)
            }
            _ => Action::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(3)])
            .split(columns[0]);

        self.render_panel(frame, left[0], ctx);
        self.render_events(frame, left[1]);
        self.render_inspectors(frame, columns[1]);
    }
}

impl GreeterModule {
    fn render_panel(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let border_style = if self.editing {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title("GREETER")
            .border_style(border_style);

        let label = Style::default().fg(Color::DarkGray);
        let mut lines = Vec::new();

        let contract = match self.panel.target() {
            Some(target) => format!("{} on {}", target.address, chain_name(target.chain_id)),
            None if !ctx.wallet.is_connected() => "wallet not connected".to_string(),
            None => format!(
                "not deployed on chain {}",
                ctx.wallet.chain_id().unwrap_or_default()
            ),
        };
        lines.push(Line::from(vec![
            Span::styled("Contract ", label),
            Span::raw(contract),
        ]));
        lines.push(Line::from(""));

        let read = self.panel.read_state();
        let greeting = match self.panel.greeting() {
            Some(greeting) => Span::styled(
                greeting.to_string(),
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            ),
            None => match read.status {
                ReadStatus::Loading => Span::styled("loading…", label),
                ReadStatus::Error => Span::styled(
                    read.error.clone().unwrap_or_else(|| "read failed".to_string()),
                    Style::default().fg(Color::Red),
                ),
                _ => Span::styled("--", label),
            },
        };
        let mut greeting_line = vec![Span::styled("Greeting ", label), greeting];
        if read.is_fetching {
            greeting_line.push(Span::styled("  (refreshing)", label));
        }
        lines.push(Line::from(greeting_line));
        if let Some(number) = read.block_number {
            lines.push(Line::from(vec![
                Span::styled("At block ", label),
                Span::raw(number.to_string()),
            ]));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(""));

        let cursor = if self.editing { "▏" } else { "" };
        lines.push(Line::from(vec![
            Span::styled("New greeting ", label),
            Span::styled(
                format!("{}{}", self.panel.draft(), cursor),
                Style::default().fg(Color::White),
            ),
        ]));

        let button_style = if self.panel.can_submit() {
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightCyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM)
        };
        let mut button_line = vec![Span::styled(BUTTON_LABEL, button_style)];
        if let Some(hint) = prepare_hint(self.panel.prepare_state()) {
            button_line.push(Span::styled(format!("  {hint}"), label));
        }
        lines.push(Line::from(button_line));

        let paragraph = Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_events(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("SET GREETING EVENTS")
            .border_style(Style::default().fg(Color::DarkGray));

        let mut lines: Vec<Line> = self
            .panel
            .events()
            .rev()
            .map(|event| {
                Line::from(vec![
                    Span::styled(
                        format!("#{:<9}", event.block_number.unwrap_or_default()),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(format!("{} ", short_addr(&event.sender.to_string()))),
                    Span::styled(event.greeting.clone(), Style::default().fg(Color::White)),
                ])
            })
            .collect();
        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "No events yet",
                Style::default().fg(Color::DarkGray),
            )));
        }

        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn render_inspectors(&self, frame: &mut Frame, area: Rect) {
        let views = self.panel.inspectors();
        let constraints: Vec<Constraint> = (0..views.len())
            .map(|index| {
                if self.is_expanded(index) {
                    Constraint::Min(5)
                } else {
                    Constraint::Length(3)
                }
            })
            .collect();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (index, view) in views.iter().enumerate() {
            let expanded = self.is_expanded(index);
            let mut lines = view.lines(expanded).into_iter();
            let title = format!(
                "{} {}",
                index + 1,
                lines.next().unwrap_or_else(|| view.name.clone())
            );
            let body: Vec<Line> = lines.map(Line::from).collect();
            let border_style = if expanded {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style);
            frame.render_widget(
                Paragraph::new(Text::from(body))
                    .block(block)
                    .wrap(Wrap { trim: false }),
                chunks[index],
            );
        }
    }
}

fn prepare_hint(state: &PrepareState) -> Option<String> {
    match state {
        PrepareState::Idle => Some("waiting for input".to_string()),
        PrepareState::Unavailable { reason } => Some(reason.clone()),
        PrepareState::Pending { .. } => Some("preparing…".to_string()),
        PrepareState::Ready(prepared) => Some(format!("gas {}", prepared.gas)),
        PrepareState::Failed { error, .. } => Some(format!("simulation failed: {error}")),
    }
}

fn short_addr(value: &str) -> String {
    if value.len() <= 12 {
        return value.to_string();
    }
    format!("{}…{}", &value[..6], &value[value.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    use crate::core::WalletContext;
    use crate::domain::greeter::addresses::HOLESKY;
    use crate::domain::greeter::testing::RecordingGateway;
    use crate::domain::greeter::AddressTable;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn module() -> GreeterModule {
        GreeterModule::new(GreetingPanel::new(AddressTable::new()))
    }

    #[test]
    fn test_edit_mode_appends_and_deletes() {
        let mut module = module();
        let mut ctx = Context::new();

        module.handle_key(key(KeyCode::Char('i')), &mut ctx);
        assert!(module.is_editing());
        for c in "hey".chars() {
            module.handle_key(key(KeyCode::Char(c)), &mut ctx);
        }
        module.handle_key(key(KeyCode::Backspace), &mut ctx);
        assert_eq!(module.panel().draft(), "he");

        // 'r' is text while editing
        assert_eq!(module.handle_key(key(KeyCode::Char('r')), &mut ctx), Action::None);
        assert_eq!(module.panel().draft(), "her");

        module.handle_key(key(KeyCode::Esc), &mut ctx);
        assert!(!module.is_editing());
    }

    #[test]
    fn test_normal_mode_actions() {
        let mut module = module();
        let mut ctx = Context::new();

        assert_eq!(module.handle_key(key(KeyCode::Enter), &mut ctx), Action::Submit);
        assert_eq!(module.handle_key(key(KeyCode::Char('r')), &mut ctx), Action::Refresh);

        module.handle_key(key(KeyCode::Char('2')), &mut ctx);
        assert!(module.is_expanded(1));
        assert!(!module.is_expanded(0));
        module.handle_key(key(KeyCode::Char('2')), &mut ctx);
        assert!(!module.is_expanded(1));
    }

    #[test]
    fn test_set_command_invalidates_preparation() {
        let mut module = module();
        let mut ctx = Context::new();
        let mut gateway = RecordingGateway::default();
        let mut wallet = WalletContext::new();
        wallet.connect(HOLESKY, None);

        module.panel_mut().evaluate(&wallet, &mut gateway);
        assert_eq!(gateway.prepares.len(), 1);

        let action = module.handle_command(&Command::Set("gm".to_string()), &mut ctx);
        assert!(matches!(action, Action::Notify(_, NotifyLevel::Info)));
        assert_eq!(module.panel().prepare_state(), &PrepareState::Idle);

        module.panel_mut().evaluate(&wallet, &mut gateway);
        assert_eq!(gateway.prepares.len(), 2);
        assert_eq!(gateway.prepares[1].1.args, vec!["gm".to_string()]);
    }

    #[test]
    fn test_reset_command_clears_broadcast_history() {
        let mut module = module();
        let mut ctx = Context::new();
        module.panel_mut().apply_submitted("0x42".to_string());
        assert!(module.panel().write_state().last_tx_hash.is_some());

        let action = module.handle_command(&Command::Reset, &mut ctx);
        assert!(matches!(action, Action::Notify(_, NotifyLevel::Info)));
        assert_eq!(module.panel().write_state().last_tx_hash, None);
    }

    #[test]
    fn test_short_addr() {
        assert_eq!(
            short_addr("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234…5678"
        );
        assert_eq!(short_addr("0x1234"), "0x1234");
    }
}
