use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use std::time::Duration;

use super::{App, Modal};

pub fn poll_event(timeout: Duration) -> anyhow::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if code == KeyCode::Char('c') && modifiers == KeyModifiers::CONTROL {
        app.running = false;
        return;
    }

    // ── Modals intercept all keys while open ──────────────────────────
    match app.modal {
        Modal::FilterPanel => {
            handle_filter_panel_key(app, code);
            return;
        }
        Modal::ConfirmDelete { .. } => {
            match code {
                KeyCode::Char('y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Esc => app.modal = Modal::Hidden,
                _ => {}
            }
            return;
        }
        Modal::Installments { .. } | Modal::InstallmentsLoading { .. } => {
            if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                app.modal = Modal::Hidden;
            }
            return;
        }
        Modal::Hidden => {}
    }

    // ── Incremental search edits the text predicate live ──────────────
    if app.search_active {
        match code {
            KeyCode::Esc | KeyCode::Enter => app.search_active = false,
            KeyCode::Backspace => {
                app.view.filters.text.pop();
                app.view.apply_filters();
                app.clamp_selection();
            }
            KeyCode::Char(c) => {
                app.view.filters.text.push(c);
                app.view.apply_filters();
                app.clamp_selection();
            }
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char('q') => app.running = false,

        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),

        KeyCode::Right | KeyCode::Char('n') => {
            app.view.next_page();
            app.clamp_selection();
        }
        KeyCode::Left | KeyCode::Char('p') => {
            app.view.prev_page();
            app.clamp_selection();
        }
        KeyCode::Char('z') => {
            app.view.cycle_page_size();
            app.clamp_selection();
        }

        KeyCode::Char('s') => {
            app.view.cycle_sort_field();
            app.clamp_selection();
        }
        KeyCode::Char('u') => {
            app.view.set_sort(crate::view::SortKey::Urgency);
            app.clamp_selection();
        }
        KeyCode::Char('m') => {
            app.view.toggle_scope();
            app.clamp_selection();
        }
        KeyCode::Char('/') => app.search_active = true,
        KeyCode::Char('c') => app.clear_filters(),
        KeyCode::Char('f') => app.open_filter_panel(),

        KeyCode::Enter => app.open_installments(),
        KeyCode::Char('e') => app.show_edit_link(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('r') if !app.loading => app.needs_refresh = true,
        _ => {}
    }
}

// Rows 0/1/4/5 take typed input; rows 2/3/6 cycle through choices.
fn is_typed_row(cursor: usize) -> bool {
    matches!(cursor, 0 | 1 | 4 | 5)
}

fn handle_filter_panel_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.modal = Modal::Hidden,
        KeyCode::Enter => {
            app.apply_filter_panel();
            app.clamp_selection();
        }
        KeyCode::Down | KeyCode::Tab => {
            app.form.cursor = (app.form.cursor + 1) % super::FILTER_ROWS;
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.form.cursor = app
                .form
                .cursor
                .checked_sub(1)
                .unwrap_or(super::FILTER_ROWS - 1);
        }
        KeyCode::Left | KeyCode::Right => {
            let forward = code == KeyCode::Right;
            cycle_choice(app, forward);
        }
        KeyCode::Backspace => {
            if let Some(buf) = typed_buffer(app) {
                buf.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(buf) = typed_buffer(app) {
                buf.push(c);
            } else if c == ' ' {
                cycle_choice(app, true);
            }
        }
        _ => {}
    }
}

fn typed_buffer(app: &mut App) -> Option<&mut String> {
    match app.form.cursor {
        0 => Some(&mut app.form.fecha_desde),
        1 => Some(&mut app.form.fecha_hasta),
        4 => Some(&mut app.form.monto_min),
        5 => Some(&mut app.form.monto_max),
        _ => None,
    }
}

fn cycle_choice(app: &mut App, forward: bool) {
    let step = |idx: usize, len: usize| -> usize {
        if len == 0 {
            return 0;
        }
        if forward {
            (idx + 1) % len
        } else {
            idx.checked_sub(1).unwrap_or(len - 1)
        }
    };

    match app.form.cursor {
        // "all" occupies slot 0, hence len + 1.
        2 => app.form.user_idx = step(app.form.user_idx, app.view.user_ids().len() + 1),
        3 => app.form.distrito_idx = step(app.form.distrito_idx, app.view.distritos().len() + 1),
        6 => app.form.estado_idx = step(app.form.estado_idx, super::ESTADO_CHOICES.len()),
        _ => {
            debug_assert!(is_typed_row(app.form.cursor));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::QuotesClient;
    use crate::models::Quote;
    use crate::status::DueStatus;
    use crate::tui::FetchResult;

    fn quote(id: u64) -> Quote {
        Quote {
            id,
            user_id: "jlopez".into(),
            user_username: "jlopez".into(),
            cliente: format!("Cliente {id}"),
            dni: format!("{id:08}"),
            distrito: "Lima".into(),
            nivel_predio: "Urbano".into(),
            total: id as f64,
            fecha: "2026-08-10".parse().unwrap(),
            estado_cuotas: Some("al_dia".into()),
            dias_restantes: 30,
            status: DueStatus::AlDia,
            days_remaining: 30,
        }
    }

    fn app_with(n: u64) -> App {
        let client =
            QuotesClient::new("https://intranet.example.com/", "csrftoken=t", "csrftoken").unwrap();
        let mut app = App::new(client);
        app.loading = false;
        app.apply_fetch_result(FetchResult {
            seq: 0,
            outcome: Ok((1..=n).map(quote).collect()),
        });
        app
    }

    #[test]
    fn slash_enters_search_and_keys_edit_the_predicate() {
        let mut app = app_with(5);
        handle_key(&mut app, KeyCode::Char('/'), KeyModifiers::NONE);
        assert!(app.search_active);

        handle_key(&mut app, KeyCode::Char('3'), KeyModifiers::NONE);
        assert_eq!(app.view.filters.text, "3");
        assert_eq!(app.view.filtered_len(), 1);

        handle_key(&mut app, KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(app.view.filtered_len(), 5);

        handle_key(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.search_active);
    }

    #[test]
    fn q_quits_only_outside_search_mode() {
        let mut app = app_with(1);
        app.search_active = true;
        handle_key(&mut app, KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(app.running);
        app.search_active = false;
        handle_key(&mut app, KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(!app.running);
    }

    #[test]
    fn confirm_modal_cancels_on_n() {
        let mut app = app_with(2);
        handle_key(&mut app, KeyCode::Char('d'), KeyModifiers::NONE);
        assert!(matches!(app.modal, Modal::ConfirmDelete { quote_id: _ }));
        handle_key(&mut app, KeyCode::Char('n'), KeyModifiers::NONE);
        assert!(app.modal.is_hidden());
    }

    #[test]
    fn page_navigation_clamps_the_cursor() {
        let mut app = app_with(120);
        app.view.set_page_size(50);
        handle_key(&mut app, KeyCode::Char('n'), KeyModifiers::NONE);
        handle_key(&mut app, KeyCode::Char('n'), KeyModifiers::NONE);
        assert_eq!(app.view.page(), 3);
        handle_key(&mut app, KeyCode::Char('G'), KeyModifiers::NONE);
        assert_eq!(app.selected, 19);
        // Next is a no-op on the last page.
        handle_key(&mut app, KeyCode::Char('n'), KeyModifiers::NONE);
        assert_eq!(app.view.page(), 3);
    }

    #[test]
    fn filter_panel_cycles_and_applies() {
        let mut app = app_with(3);
        handle_key(&mut app, KeyCode::Char('f'), KeyModifiers::NONE);
        assert!(matches!(app.modal, Modal::FilterPanel));

        // Move to the estado row and pick "Vencida".
        for _ in 0..6 {
            handle_key(&mut app, KeyCode::Down, KeyModifiers::NONE);
        }
        handle_key(&mut app, KeyCode::Right, KeyModifiers::NONE);
        handle_key(&mut app, KeyCode::Enter, KeyModifiers::NONE);

        assert!(app.modal.is_hidden());
        assert_eq!(app.view.filters.estado, Some(DueStatus::Vencida));
        assert_eq!(app.view.filtered_len(), 0);
    }

    #[test]
    fn clear_resets_filters_but_keeps_scope() {
        let mut app = app_with(3);
        handle_key(&mut app, KeyCode::Char('m'), KeyModifiers::NONE);
        app.view.filters.text = "xyz".into();
        app.view.apply_filters();
        handle_key(&mut app, KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(app.view.filters.text.is_empty());
        assert_eq!(app.view.filters.scope, crate::view::Scope::Mine);
    }
}
