pub mod event;
pub mod ui;

use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::api::QuotesClient;
use crate::models::{Installment, Quote};
use crate::status::DueStatus;
use crate::view::{Filters, ViewState};

// ─── Transient notices ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A toast-style notice. Success notices live 3 s, errors 5 s; they are
/// pruned every frame regardless of any other state change.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub expires_at: Instant,
}

pub const SUCCESS_NOTICE_TTL: Duration = Duration::from_secs(3);
pub const ERROR_NOTICE_TTL: Duration = Duration::from_secs(5);

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
            expires_at: Instant::now() + SUCCESS_NOTICE_TTL,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
            expires_at: Instant::now() + ERROR_NOTICE_TTL,
        }
    }
}

// ─── Background task results ────────────────────────────────────────────────

pub struct FetchResult {
    /// Sequence number of the request this result answers. Results whose
    /// sequence is older than the latest issued request are dropped, so a
    /// slow response can never overwrite newer state.
    pub seq: u64,
    pub outcome: Result<Vec<Quote>, String>,
}

pub struct DetailResult {
    pub quote_id: u64,
    pub outcome: Result<Vec<Installment>, String>,
}

pub struct DeleteResult {
    pub quote_id: u64,
    pub outcome: Result<(), String>,
}

// ─── Modal state ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub enum Modal {
    #[default]
    Hidden,
    /// Advanced filter panel.
    FilterPanel,
    /// Waiting for the user to confirm a delete.
    ConfirmDelete { quote_id: u64 },
    /// Installment fetch in flight.
    InstallmentsLoading { quote_id: u64 },
    /// Installments shown in fetch order; classification against "today"
    /// happens at render time, never here.
    Installments {
        quote_id: u64,
        rows: Vec<Installment>,
    },
}

impl Modal {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }
}

// ─── Filter panel form ──────────────────────────────────────────────────────

/// Text buffers behind the filter panel. Parsed into `Filters` on apply;
/// unparseable dates or amounts fall back to "no constraint".
#[derive(Debug, Clone, Default)]
pub struct FilterForm {
    pub cursor: usize,
    pub fecha_desde: String,
    pub fecha_hasta: String,
    pub user_idx: usize,
    pub distrito_idx: usize,
    pub monto_min: String,
    pub monto_max: String,
    pub estado_idx: usize,
}

pub const FILTER_ROWS: usize = 7;

/// Status filter choices in panel order; index 0 is the wildcard.
pub const ESTADO_CHOICES: [Option<DueStatus>; 5] = [
    None,
    Some(DueStatus::Vencida),
    Some(DueStatus::Critica),
    Some(DueStatus::Proxima),
    Some(DueStatus::AlDia),
];

impl FilterForm {
    pub fn from_filters(filters: &Filters, users: &[String], distritos: &[String]) -> Self {
        let user_idx = filters
            .user_id
            .as_deref()
            .and_then(|u| users.iter().position(|c| c == u))
            .map_or(0, |i| i + 1);
        let distrito_idx = filters
            .distrito
            .as_deref()
            .and_then(|d| distritos.iter().position(|c| c == d))
            .map_or(0, |i| i + 1);
        let estado_idx = ESTADO_CHOICES
            .iter()
            .position(|c| *c == filters.estado)
            .unwrap_or(0);

        Self {
            cursor: 0,
            fecha_desde: filters.fecha_desde.map(|d| d.to_string()).unwrap_or_default(),
            fecha_hasta: filters.fecha_hasta.map(|d| d.to_string()).unwrap_or_default(),
            user_idx,
            distrito_idx,
            monto_min: if filters.monto_min > 0.0 {
                filters.monto_min.to_string()
            } else {
                String::new()
            },
            monto_max: if filters.monto_max.is_finite() {
                filters.monto_max.to_string()
            } else {
                String::new()
            },
            estado_idx,
        }
    }

    /// Build the new predicate set, carrying over the live-typed text search
    /// and scope which the panel does not own.
    pub fn to_filters(&self, prev: &Filters, users: &[String], distritos: &[String]) -> Filters {
        Filters {
            text: prev.text.clone(),
            scope: prev.scope,
            fecha_desde: self.fecha_desde.trim().parse().ok(),
            fecha_hasta: self.fecha_hasta.trim().parse().ok(),
            user_id: self
                .user_idx
                .checked_sub(1)
                .and_then(|i| users.get(i).cloned()),
            distrito: self
                .distrito_idx
                .checked_sub(1)
                .and_then(|i| distritos.get(i).cloned()),
            monto_min: self.monto_min.trim().parse().unwrap_or(0.0),
            monto_max: self.monto_max.trim().parse().unwrap_or(f64::INFINITY),
            estado: ESTADO_CHOICES
                .get(self.estado_idx)
                .copied()
                .flatten(),
        }
    }
}

// ─── App State ──────────────────────────────────────────────────────────────

pub struct App {
    pub client: QuotesClient,
    pub running: bool,

    /// All table state: records, predicates, sort, pagination.
    pub view: ViewState,
    /// Cursor within the visible page slice.
    pub selected: usize,
    pub table_state: ratatui::widgets::TableState,

    pub modal: Modal,
    pub form: FilterForm,
    /// `/` incremental search mode; keystrokes edit the text predicate live.
    pub search_active: bool,

    pub notices: Vec<Notice>,
    pub status_message: String,
    pub loading: bool,
    pub needs_refresh: bool,

    fetch_rx: Option<oneshot::Receiver<FetchResult>>,
    fetch_seq: u64,
    detail_rx: Option<oneshot::Receiver<DetailResult>>,
    delete_rx: Option<oneshot::Receiver<DeleteResult>>,

    // Incremented each frame; drives the loading spinner.
    pub frame_count: u64,
}

impl App {
    pub fn new(client: QuotesClient) -> Self {
        Self {
            client,
            running: true,
            view: ViewState::new(),
            selected: 0,
            table_state: ratatui::widgets::TableState::default(),
            modal: Modal::Hidden,
            form: FilterForm::default(),
            search_active: false,
            notices: Vec::new(),
            status_message: "Cargando...".into(),
            loading: true,
            needs_refresh: false,
            fetch_rx: None,
            fetch_seq: 0,
            detail_rx: None,
            delete_rx: None,
            frame_count: 0,
        }
    }

    // ── List fetch ──────────────────────────────────────────────────────

    /// Spawn a background list fetch. A newer request supersedes any
    /// in-flight one: the old receiver is dropped and its result would be
    /// rejected by sequence number anyway.
    pub fn start_fetch(&mut self) {
        self.fetch_seq += 1;
        let seq = self.fetch_seq;
        let client = self.client.clone();
        let (tx, rx) = oneshot::channel();
        self.fetch_rx = Some(rx);
        self.loading = true;
        self.status_message = "Sincronizando...".into();
        tokio::spawn(async move {
            let outcome = client.list_quotes().await.map_err(|e| e.to_string());
            let _ = tx.send(FetchResult { seq, outcome });
        });
    }

    /// Check the fetch channel without blocking; apply the result if one
    /// arrived and it is not stale.
    pub fn poll_fetch_result(&mut self) -> bool {
        let result = match self.fetch_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(r) => r,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.fetch_rx = None;
                    return false;
                }
            },
        };
        self.fetch_rx = None;
        self.apply_fetch_result(result);
        true
    }

    pub fn apply_fetch_result(&mut self, result: FetchResult) {
        if result.seq != self.fetch_seq {
            debug!(seq = result.seq, latest = self.fetch_seq, "dropping stale list response");
            return;
        }
        self.loading = false;
        match result.outcome {
            Ok(records) => {
                self.view.load(records);
                self.selected = 0;
                self.status_message = format!(
                    "{} cotizaciones cargadas — usuario {}",
                    self.view.full_len(),
                    self.view.current_user()
                );
            }
            Err(e) => {
                error!(error = %e, "list fetch failed");
                self.notices.push(Notice::error("Error al cargar las cotizaciones"));
                self.status_message = "Error al cargar las cotizaciones".into();
            }
        }
    }

    // ── Installment detail ──────────────────────────────────────────────

    /// Open the detail modal for the selected quote and fetch its
    /// installments in the background. Installments are never cached.
    pub fn open_installments(&mut self) {
        let Some(quote_id) = self.selected_quote().map(|q| q.id) else {
            self.status_message = "No hay cotización seleccionada.".into();
            return;
        };
        self.modal = Modal::InstallmentsLoading { quote_id };

        let client = self.client.clone();
        let (tx, rx) = oneshot::channel();
        self.detail_rx = Some(rx);
        tokio::spawn(async move {
            let outcome = client
                .list_installments(quote_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(DetailResult { quote_id, outcome });
        });
    }

    pub fn poll_detail_result(&mut self) -> bool {
        let result = match self.detail_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(r) => r,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.detail_rx = None;
                    return false;
                }
            },
        };
        self.detail_rx = None;
        self.apply_detail_result(result);
        true
    }

    pub fn apply_detail_result(&mut self, result: DetailResult) {
        // The user may have closed the modal (or asked for another quote)
        // while the fetch was in flight.
        let waiting_for = match self.modal {
            Modal::InstallmentsLoading { quote_id } => quote_id,
            _ => return,
        };
        if waiting_for != result.quote_id {
            return;
        }
        match result.outcome {
            Ok(rows) => {
                self.modal = Modal::Installments {
                    quote_id: result.quote_id,
                    rows,
                };
            }
            Err(e) => {
                error!(error = %e, quote_id = result.quote_id, "installment fetch failed");
                self.modal = Modal::Hidden;
                self.notices.push(Notice::error("Error al cargar las cuotas"));
            }
        }
    }

    // ── Delete ──────────────────────────────────────────────────────────

    pub fn request_delete(&mut self) {
        match self.selected_quote() {
            Some(q) => self.modal = Modal::ConfirmDelete { quote_id: q.id },
            None => self.status_message = "No hay cotización seleccionada.".into(),
        }
    }

    /// Fire the DELETE after confirmation. On success the list is re-fetched
    /// wholesale; local state is never patched.
    pub fn confirm_delete(&mut self) {
        let Modal::ConfirmDelete { quote_id } = self.modal else {
            return;
        };
        self.modal = Modal::Hidden;

        let client = self.client.clone();
        let (tx, rx) = oneshot::channel();
        self.delete_rx = Some(rx);
        tokio::spawn(async move {
            let outcome = client.delete_quote(quote_id).await.map_err(|e| e.to_string());
            let _ = tx.send(DeleteResult { quote_id, outcome });
        });
    }

    pub fn poll_delete_result(&mut self) -> bool {
        let result = match self.delete_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(r) => r,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.delete_rx = None;
                    return false;
                }
            },
        };
        self.delete_rx = None;
        self.apply_delete_result(result);
        true
    }

    pub fn apply_delete_result(&mut self, result: DeleteResult) {
        match result.outcome {
            Ok(()) => {
                self.notices
                    .push(Notice::success("Cotización eliminada exitosamente"));
                self.needs_refresh = true;
            }
            Err(e) => {
                error!(error = %e, quote_id = result.quote_id, "delete failed");
                self.notices
                    .push(Notice::error("Error al eliminar la cotización"));
            }
        }
    }

    // ── Selection ───────────────────────────────────────────────────────

    pub fn selected_quote(&self) -> Option<&Quote> {
        self.view.page_slice().get(self.selected)
    }

    pub fn select_next(&mut self) {
        let len = self.view.page_slice().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.view.page_slice().len().saturating_sub(1);
    }

    /// Keep the cursor inside the visible slice after any view mutation.
    pub fn clamp_selection(&mut self) {
        let len = self.view.page_slice().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    // ── Misc ────────────────────────────────────────────────────────────

    pub fn show_edit_link(&mut self) {
        match self.selected_quote().map(|q| q.id) {
            Some(id) => match self.client.edit_url(id) {
                Ok(url) => self.status_message = format!("Editar en: {url}"),
                Err(e) => self.status_message = format!("No se pudo construir el enlace: {e}"),
            },
            None => self.status_message = "No hay cotización seleccionada.".into(),
        }
    }

    pub fn prune_notices(&mut self) {
        self.prune_notices_at(Instant::now());
    }

    fn prune_notices_at(&mut self, now: Instant) {
        self.notices.retain(|n| n.expires_at > now);
    }

    pub fn open_filter_panel(&mut self) {
        self.form = FilterForm::from_filters(
            &self.view.filters,
            &self.view.user_ids(),
            &self.view.distritos(),
        );
        self.modal = Modal::FilterPanel;
    }

    pub fn apply_filter_panel(&mut self) {
        self.view.filters = self.form.to_filters(
            &self.view.filters,
            &self.view.user_ids(),
            &self.view.distritos(),
        );
        self.view.apply_filters();
        self.selected = 0;
        self.modal = Modal::Hidden;
    }

    pub fn clear_filters(&mut self) {
        let scope = self.view.filters.scope;
        self.view.filters = Filters { scope, ..Filters::default() };
        self.view.apply_filters();
        self.selected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SortKey;

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

    fn app_with(records: Vec<Quote>) -> App {
        let client =
            QuotesClient::new("https://intranet.example.com/", "csrftoken=t", "csrftoken").unwrap();
        let mut app = App::new(client);
        app.fetch_seq = 1;
        app.apply_fetch_result(FetchResult {
            seq: 1,
            outcome: Ok(records),
        });
        app
    }

    #[test]
    fn delete_failure_leaves_records_untouched_and_raises_error_notice() {
        let mut app = app_with(vec![quote(1), quote(2)]);
        app.apply_delete_result(DeleteResult {
            quote_id: 1,
            outcome: Err("HTTP 500: boom".into()),
        });

        assert_eq!(app.view.full_len(), 2);
        assert!(!app.needs_refresh);
        assert!(app
            .notices
            .iter()
            .any(|n| n.kind == NoticeKind::Error && n.text.contains("eliminar")));
    }

    #[test]
    fn delete_success_schedules_a_refetch_not_a_local_removal() {
        let mut app = app_with(vec![quote(1), quote(2)]);
        app.apply_delete_result(DeleteResult {
            quote_id: 1,
            outcome: Ok(()),
        });

        // The record is still present until the re-fetch lands.
        assert_eq!(app.view.full_len(), 2);
        assert!(app.needs_refresh);
        assert!(app.notices.iter().any(|n| n.kind == NoticeKind::Success));
    }

    #[test]
    fn stale_fetch_responses_are_dropped() {
        let mut app = app_with(vec![quote(1)]);
        app.fetch_seq = 5;
        app.apply_fetch_result(FetchResult {
            seq: 3,
            outcome: Ok(vec![quote(99)]),
        });
        // The stale payload must not overwrite current state.
        assert_eq!(app.view.full_len(), 1);
        assert_eq!(app.view.filtered()[0].id, 1);
    }

    #[test]
    fn fetch_error_keeps_previous_records() {
        let mut app = app_with(vec![quote(1)]);
        app.fetch_seq += 1;
        let seq = app.fetch_seq;
        app.apply_fetch_result(FetchResult {
            seq,
            outcome: Err("network".into()),
        });
        assert_eq!(app.view.full_len(), 1);
        assert!(app.notices.iter().any(|n| n.kind == NoticeKind::Error));
    }

    #[test]
    fn notice_lifetimes_are_three_and_five_seconds() {
        let mut app = app_with(vec![quote(1)]);
        app.notices.push(Notice::success("ok"));
        app.notices.push(Notice::error("fail"));

        let now = Instant::now();
        app.prune_notices_at(now + Duration::from_secs(4));
        assert_eq!(app.notices.len(), 1);
        assert_eq!(app.notices[0].kind, NoticeKind::Error);

        app.prune_notices_at(now + Duration::from_secs(6));
        assert!(app.notices.is_empty());
    }

    #[test]
    fn detail_result_for_a_closed_modal_is_ignored() {
        let mut app = app_with(vec![quote(1)]);
        app.modal = Modal::Hidden;
        app.apply_detail_result(DetailResult {
            quote_id: 1,
            outcome: Ok(vec![]),
        });
        assert!(app.modal.is_hidden());
    }

    #[test]
    fn detail_result_fills_the_open_modal_in_fetch_order() {
        let mut app = app_with(vec![quote(1)]);
        app.modal = Modal::InstallmentsLoading { quote_id: 1 };
        let rows = vec![
            Installment {
                monto: 100.0,
                fecha: "2026-09-01".parse().unwrap(),
                descripcion: "Cuota inicial".into(),
            },
            Installment {
                monto: 50.0,
                fecha: "2026-08-01".parse().unwrap(),
                descripcion: "Segunda".into(),
            },
        ];
        app.apply_detail_result(DetailResult {
            quote_id: 1,
            outcome: Ok(rows),
        });
        match &app.modal {
            Modal::Installments { rows, .. } => {
                // Fetch order is preserved, not date order.
                assert_eq!(rows[0].descripcion, "Cuota inicial");
                assert_eq!(rows[1].descripcion, "Segunda");
            }
            other => panic!("unexpected modal: {other:?}"),
        }
    }

    #[test]
    fn selection_clamps_to_the_visible_slice() {
        let mut app = app_with((1..=5).map(quote).collect());
        app.view.set_sort(SortKey::default());
        app.selected = 4;
        app.view.filters.text = "Cliente 1".into();
        app.view.apply_filters();
        app.clamp_selection();
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn filter_form_round_trips_through_filters() {
        let app = app_with(vec![quote(1)]);
        let users = app.view.user_ids();
        let distritos = app.view.distritos();

        let mut form = FilterForm::from_filters(&app.view.filters, &users, &distritos);
        form.fecha_desde = "2026-08-01".into();
        form.monto_min = "100".into();
        form.monto_max = "nonsense".into();
        form.estado_idx = 1; // Vencida
        form.distrito_idx = 1; // Lima

        let filters = form.to_filters(&app.view.filters, &users, &distritos);
        assert_eq!(filters.fecha_desde, Some("2026-08-01".parse().unwrap()));
        assert_eq!(filters.monto_min, 100.0);
        assert_eq!(filters.monto_max, f64::INFINITY);
        assert_eq!(filters.estado, Some(DueStatus::Vencida));
        assert_eq!(filters.distrito.as_deref(), Some("Lima"));
    }
}
