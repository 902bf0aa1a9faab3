pub mod filter;
pub mod sort;

pub use filter::{Filters, Scope};
pub use sort::{Direction, SortField, SortKey, SortOptions};

use crate::models::Quote;
use crate::status::DueStatus;

/// Selectable page sizes; the admin view opens at 50.
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 50;

// ─── Summary ────────────────────────────────────────────────────────────────

/// Per-status counts shown in the header strip. Computed over the **full**
/// record set, not the filtered subset (see DESIGN.md; flagged as a
/// possible latent display bug).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub al_dia: usize,
    pub proximas: usize,
    pub criticas: usize,
    pub vencidas: usize,
}

// ─── View state ─────────────────────────────────────────────────────────────

/// All table state in one place: the loaded records, the filtered/sorted
/// subset derived from them, and the cursor into it. Owned by the app and
/// mutated only through these methods, which maintain the invariants that
/// `filtered ⊆ all` under the current predicates and that `page` stays in
/// `[1, total_pages]` (1 when empty).
pub struct ViewState {
    all: Vec<Quote>,
    filtered: Vec<Quote>,
    page: usize,
    page_size: usize,
    pub sort_key: SortKey,
    pub sort_opts: SortOptions,
    pub filters: Filters,
    current_user: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            all: Vec::new(),
            filtered: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_key: SortKey::default(),
            sort_opts: SortOptions::default(),
            filters: Filters::default(),
            current_user: String::new(),
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full set with a fresh fetch: derive per-record status,
    /// capture the acting username from the first record, and re-derive the
    /// filtered view from page 1.
    pub fn load(&mut self, mut records: Vec<Quote>) {
        for q in &mut records {
            q.derive_status();
        }
        if let Some(first) = records.first() {
            self.current_user = first.user_username.clone();
        }
        self.all = records;
        self.apply_filters();
    }

    /// Re-derive the filtered subset from the current predicates, re-sort,
    /// and reset to page 1.
    pub fn apply_filters(&mut self) {
        self.filtered = self.filters.apply(&self.all, &self.current_user);
        sort::sort_quotes(&mut self.filtered, self.sort_key, self.sort_opts);
        self.page = 1;
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.sort_key = key;
        self.apply_filters();
    }

    pub fn cycle_sort_field(&mut self) {
        self.set_sort(self.sort_key.cycle_field());
    }

    pub fn toggle_scope(&mut self) {
        self.filters.scope = self.filters.scope.toggle();
        self.apply_filters();
    }

    // ── Pagination ──────────────────────────────────────────────────────

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size)
    }

    pub fn set_page_size(&mut self, size: usize) {
        if size > 0 {
            self.page_size = size;
            self.page = 1;
        }
    }

    pub fn cycle_page_size(&mut self) {
        let idx = PAGE_SIZES
            .iter()
            .position(|&s| s == self.page_size)
            .unwrap_or(0);
        self.set_page_size(PAGE_SIZES[(idx + 1) % PAGE_SIZES.len()]);
    }

    pub fn can_prev(&self) -> bool {
        self.page > 1
    }

    pub fn can_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn prev_page(&mut self) {
        if self.can_prev() {
            self.page -= 1;
        }
    }

    pub fn next_page(&mut self) {
        if self.can_next() {
            self.page += 1;
        }
    }

    /// The visible slice: records `[(page-1)*size, min(page*size, len))`.
    pub fn page_slice(&self) -> &[Quote] {
        let start = (self.page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.filtered.len());
        if start >= end {
            &[]
        } else {
            &self.filtered[start..end]
        }
    }

    // ── Derived views ───────────────────────────────────────────────────

    pub fn full_len(&self) -> usize {
        self.all.len()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn filtered(&self) -> &[Quote] {
        &self.filtered
    }

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    /// Status counts across the full set.
    pub fn summary(&self) -> StatusSummary {
        let mut s = StatusSummary::default();
        for q in &self.all {
            match q.status {
                DueStatus::AlDia => s.al_dia += 1,
                DueStatus::Proxima => s.proximas += 1,
                DueStatus::Critica => s.criticas += 1,
                DueStatus::Vencida => s.vencidas += 1,
            }
        }
        s
    }

    /// Distinct districts across the full set, sorted, for the filter panel.
    pub fn distritos(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .all
            .iter()
            .map(|q| q.distrito.clone())
            .filter(|d| !d.is_empty())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Distinct user identifiers across the full set, sorted.
    pub fn user_ids(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .all
            .iter()
            .map(|q| q.user_id.clone())
            .filter(|u| !u.is_empty())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// "Mostrando N de M registros" line under the table.
    pub fn record_count_label(&self) -> String {
        if self.filters.scope == Scope::Mine {
            format!("Mostrando {} de mis cotizaciones", self.filtered.len())
        } else {
            format!(
                "Mostrando {} de {} registros",
                self.filtered.len(),
                self.all.len()
            )
        }
    }
}
