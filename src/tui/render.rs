use super::input::InputState;
use super::state::{PanelState, SourceSlot};
use crate::backend::types::RunAction;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const DEFAULT_SOURCE: &str = "por defecto en Datasets crudos";
const EMPTY_LOG: &str = "Aún no hay ejecuciones. Inicia alguna etapa para ver el detalle.";
/// Button line plus a status message wrapped over two lines.
const UPLOAD_ROWS: u16 = 3;

pub fn draw(f: &mut Frame, state: &PanelState, input: &InputState, spinner_frame: u8) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(13),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, state, chunks[0], spinner_frame);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    draw_sources(f, state, cards[0]);
    draw_action(f, state, cards[1]);

    draw_activity(f, state, input, chunks[2]);
    draw_footer(f, input, chunks[3]);

    if let Some(slot) = input.editing {
        draw_path_prompt(f, slot, &input.edit_buffer);
    }
}

fn draw_header(f: &mut Frame, state: &PanelState, area: Rect, spinner_frame: u8) {
    let channel_status = if state.channel_connected {
        Span::styled("OK", Style::default().fg(Color::Green))
    } else {
        Span::styled("DOWN", Style::default().fg(Color::Red))
    };

    let activity = if state.is_running {
        let ch = SPINNER_FRAMES[(spinner_frame as usize) % SPINNER_FRAMES.len()];
        Span::styled(format!(" {} RUN", ch), Style::default().fg(Color::Cyan))
    } else {
        Span::raw("")
    };

    let lines = vec![
        Line::from(Span::styled(
            " Control y actualización del pipeline de datos para el equipo comercial.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(vec![
            Span::raw(" Última actualización: "),
            Span::styled(
                state.last_execution.display(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | Canal: "),
            channel_status,
            activity,
        ]),
    ];

    let block = Block::default()
        .title(Span::styled(
            " Horizonte Inmobiliaria \u{00b7} Panel de Datos ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn source_lines<'a>(state: &'a PanelState, slot: SourceSlot, key: char) -> Vec<Line<'a>> {
    let current = state.configured_path(slot).unwrap_or(DEFAULT_SOURCE);
    let selected = state
        .selected_file(slot)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    vec![
        Line::from(vec![
            Span::styled(format!("[{}] ", key), Style::default().fg(Color::Yellow)),
            Span::styled(slot.label(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(Span::styled(
            format!("Actual: {}", current),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(format!("Seleccionado: {}", selected)),
    ]
}

fn draw_sources(f: &mut Frame, state: &PanelState, area: Rect) {
    let block = Block::default()
        .title(" Fuentes de datos ")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    // Upload row is pinned to the bottom so long paths can't push it out.
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(UPLOAD_ROWS)])
        .split(inner);

    let mut lines = Vec::with_capacity(7);
    lines.extend(source_lines(state, SourceSlot::Training, 't'));
    lines.extend(source_lines(state, SourceSlot::Dolar, 'd'));
    if let Some(ref err) = state.sources_status {
        lines.push(Line::from(Span::styled(err.as_str(), Style::default().fg(Color::Red))));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), rows[0]);

    let button_style = if state.uploading {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };
    let mut upload = vec![Line::from(vec![
        Span::styled("[u] ", Style::default().fg(Color::Yellow)),
        Span::styled(state.upload_button_label(), button_style),
    ])];
    if !state.upload_status.is_empty() {
        upload.push(Line::from(Span::styled(
            state.upload_status.as_str(),
            Style::default().fg(Color::Gray),
        )));
    }
    f.render_widget(Paragraph::new(upload).wrap(Wrap { trim: true }), rows[1]);
}

fn draw_action(f: &mut Frame, state: &PanelState, area: Rect) {
    let block = Block::default()
        .title(" Pipeline de limpieza ")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(Span::styled(
            "Limpia datos, convierte precios a USD y elimina valores fuera de mercado.",
            Style::default().fg(Color::DarkGray),
        ))
        .wrap(Wrap { trim: true }),
        rows[0],
    );

    let mut buttons = Vec::with_capacity(3);
    for (action, key) in [(RunAction::Clean, 'l'), (RunAction::Convert, 'c'), (RunAction::Full, 'f')] {
        let style = if state.is_running {
            if state.current_action == Some(action) {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            }
        } else if action == RunAction::Full {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        buttons.push(Line::from(vec![
            Span::styled(format!("[{}] ", key), Style::default().fg(Color::Yellow)),
            Span::styled(state.run_button_label(action), style),
        ]));
    }
    f.render_widget(Paragraph::new(buttons), rows[1]);

    let label = Line::from(vec![
        Span::styled("Estado: ", Style::default().fg(Color::DarkGray)),
        Span::styled(state.progress_label(), Style::default().add_modifier(Modifier::BOLD)),
    ]);
    f.render_widget(Paragraph::new(label).wrap(Wrap { trim: true }), rows[2]);

    let gauge_color = if state.progress >= 100 { Color::Green } else { Color::Cyan };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(gauge_color))
        .percent(u16::from(state.progress.min(100)))
        .label(format!("{}%", state.progress));
    f.render_widget(gauge, rows[3]);

    f.render_widget(
        Paragraph::new(Span::styled(state.progress_hint(), Style::default().fg(Color::DarkGray)))
            .wrap(Wrap { trim: true }),
        rows[4],
    );
}

/// Window of log lines to show for a viewport of `height` rows.
pub fn visible_range(total: usize, height: usize, scroll_back: usize) -> (usize, usize) {
    let back = scroll_back.min(total.saturating_sub(height));
    let end = total - back;
    (end.saturating_sub(height), end)
}

fn draw_activity(f: &mut Frame, state: &PanelState, input: &InputState, area: Rect) {
    let height = area.height.saturating_sub(2) as usize;
    let total = state.status_log.len();

    let title = if input.log_scroll_back > 0 && total > height {
        " Detalle del proceso [scroll] "
    } else {
        " Detalle del proceso "
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    if state.status_log.is_empty() {
        let para = Paragraph::new(Line::from(Span::styled(
            EMPTY_LOG,
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        f.render_widget(para, area);
        return;
    }

    let (start, end) = visible_range(total, height, input.log_scroll_back);
    let lines: Vec<Line> = state.status_log[start..end]
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled("\u{2022} ", Style::default().fg(Color::Cyan)),
                Span::styled(format!("{} ", entry.time), Style::default().fg(Color::DarkGray)),
                Span::raw(entry.text.as_str()),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(f: &mut Frame, input: &InputState, area: Rect) {
    let text = if input.editing.is_some() {
        " [Enter] confirmar  [Esc] cancelar  (vacío = quitar selección)"
    } else {
        " [l/c/f] etapas  [t/d] elegir CSV  [u] guardar fuentes  [\u{2191}\u{2193}] log  [q] salir"
    };
    let para = Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)));
    f.render_widget(para, area);
}

fn draw_path_prompt(f: &mut Frame, slot: SourceSlot, buffer: &str) {
    let area = centered_rect(70, 5, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {} ", slot.label()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let lines = vec![
        Line::from(Span::styled("Ruta del archivo .csv:", Style::default().fg(Color::DarkGray))),
        Line::from(vec![
            Span::raw(buffer),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
    ];
    let para = Paragraph::new(lines).block(block).alignment(Alignment::Left);
    f.render_widget(para, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let width = (u32::from(r.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}
