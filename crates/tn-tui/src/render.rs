//! Drawing a [`Modal`] as a centered box.

use crate::modal::{Modal, PasswordStage};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const HIGHLIGHT: Style = Style::new().fg(Color::Black).bg(Color::Cyan);

fn footer(modal: &Modal) -> &'static str {
    match modal {
        Modal::Menu { .. } => "Up/Down: move  Enter: select  Esc: back",
        Modal::Checklist { .. } => "Space: toggle  Enter: confirm  Esc: cancel",
        Modal::YesNo { .. } => "Left/Right: choose  Enter: confirm  Esc: no",
        Modal::Message => "Enter: OK",
        Modal::Password { .. } => "Enter: next  Esc: cancel",
    }
}

/// Rows the widget part of `modal` wants below the text.
fn body_height(modal: &Modal) -> u16 {
    let rows = match modal {
        Modal::Menu { items, .. } => items.len(),
        Modal::Checklist { rows, .. } => rows.len(),
        Modal::YesNo { .. } => 1,
        Modal::Message => 0,
        Modal::Password { .. } => 3,
    };
    rows.min(u16::MAX as usize) as u16
}

/// `width` columns by `height` rows in the middle of `area`, clipped to it.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn draw(frame: &mut Frame, title: &str, text: &str, modal: &Modal) {
    let area = frame.area();
    let width = area.width.saturating_sub(4).min(76);
    let inner_width = width.saturating_sub(2).max(1) as usize;
    let text_rows: u16 = text
        .lines()
        .map(|line| (line.chars().count().max(1) + inner_width - 1) / inner_width)
        .sum::<usize>()
        .min(u16::MAX as usize) as u16;
    let height = text_rows + body_height(modal) + 5;
    let popup = centered(area, width, height);

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(text_rows),
            Constraint::Length(1),
            Constraint::Min(body_height(modal)),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(text.to_string()).wrap(Wrap { trim: false }),
        chunks[0],
    );
    draw_body(frame, modal, chunks[2]);
    frame.render_widget(
        Paragraph::new(footer(modal)).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );
}

fn draw_body(frame: &mut Frame, modal: &Modal, area: Rect) {
    match modal {
        Modal::Menu { items, cursor } => {
            let list = List::new(items.iter().map(|item| ListItem::new(item.as_str())))
                .highlight_style(HIGHLIGHT)
                .highlight_symbol("> ");
            let mut state = ListState::default().with_selected(Some(*cursor));
            frame.render_stateful_widget(list, area, &mut state);
        }
        Modal::Checklist {
            rows,
            checked,
            cursor,
        } => {
            let items = rows.iter().zip(checked.iter()).map(|((tag, desc), on)| {
                let mark = if *on { "[x]" } else { "[ ]" };
                ListItem::new(format!("{} {:<10} {}", mark, tag, desc))
            });
            let list = List::new(items).highlight_style(HIGHLIGHT);
            let mut state = ListState::default().with_selected(Some(*cursor));
            frame.render_stateful_widget(list, area, &mut state);
        }
        Modal::YesNo { yes } => {
            let button = |label: &'static str, active: bool| {
                if active {
                    Span::styled(label, HIGHLIGHT.add_modifier(Modifier::BOLD))
                } else {
                    Span::raw(label)
                }
            };
            let line = Line::from(vec![
                button("< Yes >", *yes),
                Span::raw("    "),
                button("< No >", !*yes),
            ])
            .centered();
            frame.render_widget(Paragraph::new(line), area);
        }
        Modal::Message => {
            frame.render_widget(Paragraph::new(Line::from("< OK >").centered()), area);
        }
        Modal::Password {
            first,
            second,
            stage,
            mismatch,
        } => {
            let field = |label: &str, masked: String, active: bool| {
                let style = if active { HIGHLIGHT } else { Style::default() };
                Line::from(vec![
                    Span::raw(format!("{:<9}", label)),
                    Span::styled(format!("{:<24}", masked), style),
                ])
            };
            let mut lines = vec![
                field("Password", first.masked(), *stage == PasswordStage::Enter),
                field("Confirm", second.masked(), *stage == PasswordStage::Confirm),
            ];
            if *mismatch {
                lines.push(Line::styled(
                    "Passwords do not match.",
                    Style::default().fg(Color::Red),
                ));
            }
            frame.render_widget(Paragraph::new(lines), area);
        }
    }
}
