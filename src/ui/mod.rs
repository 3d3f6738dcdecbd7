use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, InputMode, StatusLevel};
use crate::config;
use crate::core::Module;
use crate::domain::greeter::addresses::chain_name;

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    app.greeter.render(f, areas.main, &app.ctx);
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let label = Style::default().fg(Color::DarkGray);
    let title = Line::from(vec![
        Span::styled(
            "Greeter",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("RPC", label),
        Span::raw(format!(" {} ", app.ctx.rpc_endpoint)),
        Span::styled("Node", label),
        Span::raw(format!(" {}", app.ctx.node_kind)),
    ]);

    let left = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let chain = app
        .ctx
        .wallet
        .chain_id()
        .map(|id| format!("{id} ({})", chain_name(id)))
        .unwrap_or_else(|| "--".to_string());
    let account = app
        .ctx
        .wallet
        .account()
        .map(|address| short_addr(&address.to_string()))
        .unwrap_or_else(|| "--".to_string());
    let right_line = Line::from(vec![
        Span::styled("Chain ", label),
        Span::raw(format!("{}  ", chain)),
        Span::styled("Account ", label),
        Span::raw(account),
    ]);
    let right = Paragraph::new(right_line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::DarkGray);
    let latest = app
        .ctx
        .latest_block
        .map(|n| n.to_string())
        .unwrap_or_else(|| "--".to_string());
    let updated = app
        .last_read_at
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--".to_string());
    let endpoint_position = if app.rpc_endpoints.is_empty() {
        "--".to_string()
    } else {
        format!("{}/{}", app.rpc_endpoint_index + 1, app.rpc_endpoints.len())
    };
    let write = app.panel().write_state();

    let mut spans = vec![
        Span::styled("Latest ", label),
        Span::raw(format!("{}  ", latest)),
        Span::styled("Read ", label),
        Span::raw(format!("{}  ", updated)),
        Span::styled("Endpoint ", label),
        Span::raw(format!("{}  ", endpoint_position)),
        Span::styled("Sent ", label),
        Span::raw(write.broadcasts.to_string()),
    ];
    if let Some(hash) = write.last_tx_hash.as_ref() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("Last tx ", label));
        spans.push(Span::raw(short_hash(hash, 18)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("set", "Replace the draft greeting"),
        ("clear", "Clear the draft"),
        ("send", "Broadcast the prepared update"),
        ("refresh", "Re-read greet()"),
        ("reset", "Clear the broadcast history"),
        ("endpoint", "Show or switch endpoint (endpoint <n>)"),
        ("chain", "Show chain and contract"),
        ("help", "Toggle help"),
        ("quit", "Quit"),
    ];

    let word = input.split_whitespace().next().unwrap_or("");
    commands
        .into_iter()
        .find(|(cmd, _)| cmd.starts_with(word))
        .map(|(_, desc)| desc)
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint_text = command_hint(&app.command.input).unwrap_or("set | send | refresh | endpoint <n>");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(&app.command.input),
                Span::styled(
                    format!("  {}", hint_text),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    StatusLevel::Info => Color::LightGreen,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text, Style::default().fg(color)),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let key = Style::default().fg(Color::Yellow);
    let text = Style::default().fg(Color::DarkGray);
    let pairs: &[(&str, &str)] = if app.greeter.is_editing() {
        &[("Enter/Esc", "done"), ("Backspace", "delete")]
    } else {
        &[
            ("i", "edit"),
            ("Enter", "update"),
            ("r", "refresh"),
            ("1-3", "inspect"),
            ("[ ]", "endpoint"),
            (":", "command"),
            ("?", "help"),
            ("q", "quit"),
        ]
    };

    let mut spans = Vec::new();
    for (k, desc) in pairs {
        spans.push(Span::styled(k.to_string(), key));
        spans.push(Span::styled(format!(" {desc}  "), text));
    }
    Line::from(spans)
}

fn draw_help_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = centered_rect(64, 64, area);
    f.render_widget(Clear, popup_area);

    let config_path = config::config_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string());
    let log_path = config::log_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string());

    let lines = vec![
        Line::from("Greeting"),
        Line::from("  i / e      Edit draft"),
        Line::from("  Enter      Send setGreeting(draft)"),
        Line::from("  r          Re-read greet()"),
        Line::from("  1 / 2 / 3  Toggle inspectors"),
        Line::from(""),
        Line::from("Editing"),
        Line::from("  Backspace  Delete character"),
        Line::from("  Enter/Esc  Stop editing"),
        Line::from(""),
        Line::from("Connection"),
        Line::from("  [ / ]      Prev/Next endpoint"),
        Line::from(""),
        Line::from("Commands (:)"),
        Line::from("  set <text>  clear  send  refresh  reset"),
        Line::from("  endpoint [n]  chain  quit"),
        Line::from(""),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from(format!("Config: {config_path}")),
        Line::from(format!("Log:    {log_path}")),
        Line::from(format!(
            "Known deployments: {}",
            app.panel().table().len()
        )),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn short_addr(value: &str) -> String {
    if value.len() <= 12 {
        return value.to_string();
    }
    format!("{}…{}", &value[..6], &value[value.len() - 4..])
}

fn short_hash(value: &str, len: usize) -> String {
    if value.len() <= len {
        return value.to_string();
    }
    format!("{}…", &value[..len])
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_hint_matches_prefix() {
        assert_eq!(command_hint(""), None);
        assert_eq!(command_hint("se"), Some("Replace the draft greeting"));
        assert_eq!(command_hint("send"), Some("Broadcast the prepared update"));
        assert_eq!(
            command_hint("endpoint 2"),
            Some("Show or switch endpoint (endpoint <n>)")
        );
        assert_eq!(command_hint("zzz"), None);
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 40, outer);
        assert!(inner.x >= outer.x && inner.right() <= outer.right());
        assert!(inner.y >= outer.y && inner.bottom() <= outer.bottom());
        assert_eq!(inner.width, 60);
    }
}
