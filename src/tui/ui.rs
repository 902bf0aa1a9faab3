use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use super::{App, Modal, NoticeKind, ESTADO_CHOICES, FILTER_ROWS};
use crate::status::{self, DueStatus};
use chrono::Local;

const ACCENT: Color = Color::Cyan;
const HEADER_BG: Color = Color::DarkGray;
const SELECTED_BG: Color = Color::Rgb(40, 40, 60);
const DIM: Color = Color::DarkGray;
const GOOD: Color = Color::Green;
const WARN: Color = Color::Yellow;
const BAD: Color = Color::Red;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

fn status_color(status: DueStatus) -> Color {
    match status {
        DueStatus::AlDia => GOOD,
        DueStatus::Proxima => WARN,
        DueStatus::Critica => Color::LightRed,
        DueStatus::Vencida => BAD,
    }
}

// ─── Main render ────────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_summary(f, app, chunks[0]);
    render_clock(f, chunks[0]);
    render_table(f, app, chunks[1]);
    render_pagination(f, app, chunks[2]);
    render_status_bar(f, app, chunks[3]);

    match &app.modal {
        Modal::Hidden => {}
        Modal::FilterPanel => render_filter_panel(f, app),
        Modal::ConfirmDelete { quote_id } => render_confirm_delete(f, *quote_id),
        Modal::InstallmentsLoading { quote_id } => render_installments_loading(f, app, *quote_id),
        Modal::Installments { quote_id, rows } => {
            let (quote_id, rows) = (*quote_id, rows.clone());
            render_installments(f, quote_id, &rows);
        }
    }

    render_notices(f, app);
}

// ─── Summary strip ──────────────────────────────────────────────────────────

/// Counts per status across the full record set (not the filtered subset).
fn render_summary(f: &mut Frame, app: &App, area: Rect) {
    let s = app.view.summary();
    let line = Line::from(vec![
        Span::styled(
            format!("  Vencidas: {}", s.vencidas),
            Style::default().fg(status_color(DueStatus::Vencida)),
        ),
        Span::styled("  |  ", Style::default().fg(DIM)),
        Span::styled(
            format!("Críticas: {}", s.criticas),
            Style::default().fg(status_color(DueStatus::Critica)),
        ),
        Span::styled("  |  ", Style::default().fg(DIM)),
        Span::styled(
            format!("Próximas: {}", s.proximas),
            Style::default().fg(status_color(DueStatus::Proxima)),
        ),
        Span::styled("  |  ", Style::default().fg(DIM)),
        Span::styled(
            format!("Al día: {}", s.al_dia),
            Style::default().fg(status_color(DueStatus::AlDia)),
        ),
    ]);

    let summary = Paragraph::new(vec![Line::from(""), line]).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .title(" Cotizaciones ")
            .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
    );
    f.render_widget(summary, area);
}

fn render_clock(f: &mut Frame, header_area: Rect) {
    let time_str = format!(" {} ", Local::now().format("%a %d/%m  %H:%M:%S"));
    let clock_width = time_str.len() as u16;
    let clock_area = Rect {
        x: header_area.right().saturating_sub(clock_width),
        y: header_area.y,
        width: clock_width.min(header_area.width),
        height: 1,
    };
    f.render_widget(
        Paragraph::new(time_str).style(Style::default().fg(ACCENT)),
        clock_area,
    );
}

// ─── Quotes table ───────────────────────────────────────────────────────────

fn render_table(f: &mut Frame, app: &mut App, area: Rect) {
    let title = format!(
        " Cotizaciones — orden: {}  [s/u] ",
        app.view.sort_key.label()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(ACCENT));

    let slice = app.view.page_slice();
    if slice.is_empty() {
        let placeholder = Paragraph::new("\n  No se encontraron cotizaciones")
            .style(Style::default().fg(DIM))
            .block(block);
        f.render_widget(placeholder, area);
        return;
    }

    let header = Row::new(vec![
        "ID",
        "Usuario",
        "Fecha",
        "Cliente",
        "DNI",
        "Distrito",
        "Nivel predio",
        "Total",
        "Estado",
    ])
    .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let rows: Vec<Row> = slice
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let badge = status::badge_text(q.status, q.days_remaining);
            let row = Row::new(vec![
                Line::raw(q.id.to_string()),
                Line::raw(q.user_id.clone()),
                Line::raw(status::format_date(q.fecha)),
                Line::raw(truncate(&q.cliente, 28)),
                Line::raw(q.dni.clone()),
                Line::raw(truncate(&q.distrito, 16)),
                Line::raw(truncate(&q.nivel_predio, 14)),
                Line::styled(status::format_money(q.total), Style::default().fg(GOOD)),
                Line::styled(badge, Style::default().fg(status_color(q.status))),
            ]);
            if i == app.selected {
                row.style(Style::default().bg(SELECTED_BG))
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().bg(SELECTED_BG))
    .block(block);

    app.table_state.select(Some(app.selected));
    f.render_stateful_widget(table, area, &mut app.table_state);
}

// ─── Pagination line ────────────────────────────────────────────────────────

fn render_pagination(f: &mut Frame, app: &App, area: Rect) {
    let total = app.view.total_pages();
    let pages = if total > 0 {
        format!("Página {} de {}", app.view.page(), total)
    } else {
        "Sin páginas".to_string()
    };

    let nav_style = |enabled: bool| {
        if enabled {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(DIM)
        }
    };

    let line = Line::from(vec![
        Span::styled(format!(" {}", app.view.record_count_label()), Style::default().fg(Color::White)),
        Span::styled("   ", Style::default()),
        Span::styled(pages, Style::default().fg(ACCENT)),
        Span::styled("   ", Style::default()),
        Span::styled("◀ p:anterior", nav_style(app.view.can_prev())),
        Span::styled("  ", Style::default()),
        Span::styled("n:siguiente ▶", nav_style(app.view.can_next())),
        Span::styled(
            format!("   {}/pág [z]", app.view.page_size()),
            Style::default().fg(DIM),
        ),
    ]);

    f.render_widget(Paragraph::new(line), area);
}

// ─── Status bar ─────────────────────────────────────────────────────────────

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let left = if app.search_active {
        format!(" /{}▏", app.view.filters.text)
    } else if app.loading {
        let spin = SPINNER[(app.frame_count / 2) as usize % SPINNER.len()];
        format!(" {spin} {}", app.status_message)
    } else {
        format!(" {}", app.status_message)
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            left,
            Style::default().fg(if app.loading { WARN } else { Color::White }),
        ),
        Span::styled(
            "  q:salir  /:buscar  f:filtros  m:mías  Enter:cuotas  e:editar  d:eliminar  r:recargar  ",
            Style::default().fg(DIM),
        ),
    ]))
    .style(Style::default().bg(HEADER_BG));

    f.render_widget(status, area);
}

// ─── Filter panel ───────────────────────────────────────────────────────────

fn estado_label(choice: Option<DueStatus>) -> &'static str {
    match choice {
        None => "Todos",
        Some(s) => s.label(),
    }
}

fn render_filter_panel(f: &mut Frame, app: &App) {
    let area = centered_rect(52, 15, f.area());
    f.render_widget(Clear, area);

    let users = app.view.user_ids();
    let distritos = app.view.distritos();
    let form = &app.form;

    let user_value = form
        .user_idx
        .checked_sub(1)
        .and_then(|i| users.get(i).cloned())
        .unwrap_or_else(|| "Todos".into());
    let distrito_value = form
        .distrito_idx
        .checked_sub(1)
        .and_then(|i| distritos.get(i).cloned())
        .unwrap_or_else(|| "Todos".into());
    let estado_value = estado_label(ESTADO_CHOICES.get(form.estado_idx).copied().flatten());

    let rows: [(&str, String, bool); FILTER_ROWS] = [
        ("Fecha desde (AAAA-MM-DD)", form.fecha_desde.clone(), true),
        ("Fecha hasta (AAAA-MM-DD)", form.fecha_hasta.clone(), true),
        ("Usuario", user_value, false),
        ("Distrito", distrito_value, false),
        ("Monto mínimo", form.monto_min.clone(), true),
        ("Monto máximo", form.monto_max.clone(), true),
        ("Estado de cuotas", estado_value.to_string(), false),
    ];

    let mut lines: Vec<Line> = vec![Line::from("")];
    for (i, (label, value, typed)) in rows.iter().enumerate() {
        let focused = i == form.cursor;
        let marker = if focused { "> " } else { "  " };
        let hint = if *typed { "" } else { "  ◀ ▶" };
        let value_style = if focused {
            Style::default().fg(Color::White).bg(SELECTED_BG)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(ACCENT)),
            Span::styled(format!("{label:<26}"), Style::default().fg(DIM)),
            Span::styled(format!(" {value} "), value_style),
            Span::styled(hint, Style::default().fg(DIM)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Enter:aplicar  Esc:cerrar  (c limpia filtros desde la tabla)",
        Style::default().fg(DIM),
    )));

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Filtros avanzados ")
            .title_style(Style::default().fg(ACCENT)),
    );
    f.render_widget(panel, area);
}

// ─── Delete confirmation ────────────────────────────────────────────────────

fn render_confirm_delete(f: &mut Frame, quote_id: u64) {
    let area = centered_rect(44, 7, f.area());
    f.render_widget(Clear, area);

    let body = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  ¿Eliminar la cotización #{quote_id}?"),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Esta acción no se puede deshacer.",
            Style::default().fg(WARN),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  y:eliminar  n/Esc:cancelar",
            Style::default().fg(DIM),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Confirmar eliminación ")
            .title_style(Style::default().fg(BAD)),
    );
    f.render_widget(body, area);
}

// ─── Installments modal ─────────────────────────────────────────────────────

fn render_installments_loading(f: &mut Frame, app: &App, quote_id: u64) {
    let area = centered_rect(40, 5, f.area());
    f.render_widget(Clear, area);
    let spin = SPINNER[(app.frame_count / 2) as usize % SPINNER.len()];
    let body = Paragraph::new(format!("\n  {spin} Cargando cuotas de #{quote_id}..."))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Cuotas ")
                .title_style(Style::default().fg(ACCENT)),
        );
    f.render_widget(body, area);
}

fn render_installments(f: &mut Frame, quote_id: u64, rows: &[crate::models::Installment]) {
    let area = centered_rect(66, (rows.len() as u16 + 6).max(8), f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Cuotas de la cotización #{quote_id} "))
        .title_style(Style::default().fg(ACCENT));

    if rows.is_empty() {
        let empty = Paragraph::new("\n  Sin cuotas registradas")
            .style(Style::default().fg(DIM))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec!["#", "Monto", "Fecha", "Estado", "Descripción"])
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    // Classified against today's date on every render; rows stay in fetch
    // order, not date order.
    let today = Local::now().date_naive();
    let body: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, cuota)| {
            let (state, days) = status::classify(cuota.fecha, today);
            Row::new(vec![
                Line::raw(format!("{}", i + 1)),
                Line::styled(status::format_money(cuota.monto), Style::default().fg(GOOD)),
                Line::raw(status::format_date(cuota.fecha)),
                Line::styled(
                    status::badge_text(state, days),
                    Style::default().fg(status_color(state)),
                ),
                Line::raw(truncate(&cuota.descripcion, 30)),
            ])
        })
        .collect();

    let table = Table::new(
        body,
        [
            Constraint::Length(4),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Min(16),
        ],
    )
    .header(header)
    .block(block);
    f.render_widget(table, area);
}

// ─── Notices ────────────────────────────────────────────────────────────────

fn render_notices(f: &mut Frame, app: &App) {
    let width = 44u16.min(f.area().width);
    for (i, notice) in app.notices.iter().enumerate() {
        let area = Rect {
            x: f.area().right().saturating_sub(width),
            y: 1 + (i as u16) * 3,
            width,
            height: 3,
        };
        if area.bottom() > f.area().bottom() {
            break;
        }
        let (color, title) = match notice.kind {
            NoticeKind::Success => (GOOD, " OK "),
            NoticeKind::Error => (BAD, " Error "),
        };
        f.render_widget(Clear, area);
        let body = Paragraph::new(notice.text.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(title)
                    .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
            );
        f.render_widget(body, area);
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn centered_rect(width_pct: u16, height_rows: u16, r: Rect) -> Rect {
    let width = (r.width * width_pct / 100).min(r.width);
    let height = height_rows.min(r.height);
    Rect {
        x: r.x + (r.width.saturating_sub(width)) / 2,
        y: r.y + (r.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

/// Truncate to a display width, appending `…` when cut.
fn truncate(s: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width.saturating_sub(1) {
            out.push('…');
            return out;
        }
        width += w;
        out.push(ch);
    }
    s.to_string()
}
