use crate::app::{App, TABLEAU_COLUMNS};
use oraculo_core::label;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Color, Line, Modifier, Span, Style, Stylize};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

pub fn draw(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(12),
            Constraint::Length(8),
        ])
        .split(frame.area());

    draw_header(frame, root[0], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(root[1]);

    if app.engine.entry().is_none() {
        draw_summary(frame, middle[0], app);
    } else if app.is_tableau() {
        draw_tableau(frame, middle[0], app);
    } else {
        draw_fan(frame, middle[0], app);
    }
    draw_preview(frame, middle[1], app);
    draw_events(frame, root[2], app);

    if app.show_help {
        draw_help_popup(frame, app);
    } else if let Some(err) = app.engine.last_error() {
        draw_error_popup(frame, app, &err.to_string());
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let entry_line = match app.engine.entry() {
        Some(entry) => format!(
            "{} {}/{}: {} / {} ({} {})",
            app.locale.text("Entry", "Entrada"),
            app.queue.current_index() + 1,
            app.queue.len(),
            entry.oracle_type.display_name(),
            entry.method.display_name(),
            entry.cards_needed(),
            app.locale.text("cards", "cartas"),
        ),
        None => format!(
            "{} {}/{}",
            app.locale.text("Readings", "Leituras"),
            app.readings.len(),
            app.queue.len()
        ),
    };
    let extra = format!(
        "{} {} | {} {} | {} {}",
        app.locale.text("Seed", "Semente"),
        app.seed,
        app.locale.text("Lang", "Idioma"),
        app.locale.code(),
        app.locale.text("State", "Estado"),
        app.header_status()
    );
    let lines = vec![
        Line::from(entry_line.bold()),
        Line::from(extra),
        Line::from(format!(
            "{}: {}",
            app.locale.text("Status", "Situação"),
            app.status_line
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Oracle", "Oráculo"));
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(paragraph, area);
}

/// One row per deck position, face down until flipped.
fn draw_fan(frame: &mut Frame, area: Rect, app: &App) {
    let Some(deck) = app.engine.deck() else {
        draw_waiting(frame, area, app);
        return;
    };
    let selected = app.engine.selected();
    let items: Vec<ListItem<'_>> = deck
        .cards()
        .iter()
        .enumerate()
        .map(|(position, card)| {
            let slot = selected.iter().position(|&p| p == position);
            match slot {
                Some(slot) => {
                    let role = app
                        .engine
                        .entry()
                        .map(|entry| entry.method.position_role(slot))
                        .unwrap_or_default();
                    let name = label(deck.oracle(), &card.code, card.is_reversed());
                    ListItem::new(format!("#{position:02}  {}. {role}: {name}", slot + 1))
                        .style(Style::default().fg(Color::Cyan))
                }
                None => ListItem::new(format!("#{position:02}  ▒▒▒▒")),
            }
        })
        .collect();
    let title = format!(
        "{} ({}/{})",
        app.locale.text("Deck", "Baralho"),
        selected.len(),
        app.engine.entry().map_or(0, |entry| entry.cards_needed())
    );
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    let mut state = ListState::default();
    state.select(Some(app.cursor.min(deck.len().saturating_sub(1))));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_tableau(frame: &mut Frame, area: Rect, app: &App) {
    let Some(deck) = app.engine.deck() else {
        draw_waiting(frame, area, app);
        return;
    };
    let mut lines = Vec::new();
    for (row, cards) in deck.cards().chunks(TABLEAU_COLUMNS).enumerate() {
        let spans: Vec<Span<'_>> = cards
            .iter()
            .enumerate()
            .map(|(col, card)| {
                let position = row * TABLEAU_COLUMNS + col;
                let text = if app.engine.is_flipped(position) {
                    format!("{:>2} {:<7}", position + 1, short_name(&card.code))
                } else {
                    format!("{:>2} {:<7}", position + 1, "▒▒▒▒")
                };
                let mut style = Style::default();
                if position == app.cursor {
                    style = style.fg(Color::Black).bg(Color::Yellow);
                } else if app.engine.is_flipped(position) {
                    style = style.fg(Color::Cyan);
                }
                Span::styled(text, style)
            })
            .collect();
        lines.push(Line::from(spans));
        lines.push(Line::from(""));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Grand Tableau", "Grand Tableau"));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_waiting(frame: &mut Frame, area: Rect, app: &App) {
    let text = if app.engine.last_error().is_some() {
        app.locale
            .text("deck unavailable, press t to retry", "baralho indisponível, t para tentar de novo")
    } else {
        app.locale.text("shuffling...", "embaralhando...")
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Deck", "Baralho"));
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_summary(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();
    if app.readings.is_empty() {
        lines.push(Line::from(app.locale.text("nothing drawn", "nenhuma carta")));
    }
    for reading in &app.readings {
        lines.push(Line::from(
            format!(
                "{} / {}",
                reading.oracle_type.display_name(),
                reading.method.display_name()
            )
            .bold(),
        ));
        for card in &reading.cards {
            lines.push(Line::from(format!("  {}: {}", card.role, card.label)));
        }
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Readings", "Leituras"));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Revealed cards in reveal order, with the image each one would show.
fn draw_preview(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();
    match app.engine.entry() {
        Some(entry) => {
            let cards = app.engine.selected_cards();
            if cards.is_empty() {
                lines.push(Line::from(format!(
                    "{} {}",
                    app.locale.text("back:", "verso:"),
                    app.assets.back_image_url(entry.oracle_type)
                )));
            }
            for (slot, (position, card)) in cards.iter().enumerate() {
                lines.push(Line::from(format!(
                    "{}. {}: {}",
                    slot + 1,
                    entry.method.position_role(slot),
                    label(entry.oracle_type, &card.code, card.is_reversed())
                )));
                lines.push(Line::from(
                    format!(
                        "   #{position} {}",
                        app.assets.front_image_or_placeholder(&card.code)
                    )
                    .dark_gray(),
                ));
            }
            if app.engine.can_complete() {
                lines.push(Line::from(""));
                lines.push(Line::from(
                    app.locale
                        .text("c continue | x close", "c continuar | x encerrar")
                        .green(),
                ));
            } else if app.engine.can_reshuffle() {
                lines.push(Line::from(""));
                lines.push(Line::from(
                    app.locale.text("r reshuffle", "r embaralhar").dark_gray(),
                ));
            }
        }
        None => {
            lines.push(Line::from(
                app.locale
                    .text("q quit", "q sair")
                    .dark_gray(),
            ));
        }
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Preview", "Prévia"));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_events(frame: &mut Frame, area: Rect, app: &App) {
    let visible = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem<'_>> = app
        .event_log
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|line| ListItem::new(line.as_str()))
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Events", "Eventos"));
    frame.render_widget(List::new(items).block(block), area);
}

fn draw_help_popup(frame: &mut Frame, app: &App) {
    let area = centered_rect(70, 50, frame.area());
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from(app.locale.text(
            "q quit | ? help | arrows/hjkl move",
            "q sair | ? ajuda | setas/hjkl mover",
        )),
        Line::from(app.locale.text(
            "enter/space flip the card under the cursor",
            "enter/espaço vira a carta sob o cursor",
        )),
        Line::from(app.locale.text(
            "r reshuffle (before any reveal) | t retry deck",
            "r embaralhar (antes de revelar) | t tentar de novo",
        )),
        Line::from(app.locale.text(
            "c continue to the next oracle | x close consultation",
            "c continuar para o próximo oráculo | x encerrar consulta",
        )),
        Line::from(app.locale.text(
            "esc clears a deck error, otherwise closes once settled",
            "esc fecha o erro do baralho, senão encerra após a abertura",
        )),
    ];
    let block = Block::default()
        .title(app.locale.text("Help", "Ajuda"))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_error_popup(frame: &mut Frame, app: &App, message: &str) {
    let area = centered_rect(60, 25, frame.area());
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(app.locale.text("t retry / dismiss", "t tentar de novo / fechar")),
    ];
    let block = Block::default()
        .title(app.locale.text("Deck error", "Erro no baralho"))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

/// Last segment of a card code, clipped for the tableau grid.
fn short_name(code: &str) -> String {
    code.rsplit('_').next().unwrap_or(code).chars().take(7).collect()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
