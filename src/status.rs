use chrono::NaiveDate;

// ─── Due status ─────────────────────────────────────────────────────────────

/// Urgency classification of a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DueStatus {
    /// More than a week away.
    #[default]
    AlDia,
    /// Due within 4–7 days.
    Proxima,
    /// Due within 0–3 days.
    Critica,
    /// Past due.
    Vencida,
}

impl DueStatus {
    pub const ALL: [DueStatus; 4] = [
        DueStatus::AlDia,
        DueStatus::Proxima,
        DueStatus::Critica,
        DueStatus::Vencida,
    ];

    /// Parse a backend/filter status token.
    ///
    /// The upcoming state is spelled three ways across the backend surface:
    /// `proxima_vencer` on list rows, `proximas_vencer` in the status filter,
    /// and `proxima` on per-installment classification. All are accepted.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "al_dia" => Some(Self::AlDia),
            "proxima_vencer" | "proximas_vencer" | "proxima" => Some(Self::Proxima),
            "critica" => Some(Self::Critica),
            "vencida" => Some(Self::Vencida),
            _ => None,
        }
    }

    /// Rank used by the urgency sort: most urgent first.
    pub fn urgency_rank(self) -> u8 {
        match self {
            Self::Vencida => 4,
            Self::Critica => 3,
            Self::Proxima => 2,
            Self::AlDia => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AlDia => "Al día",
            Self::Proxima => "Próxima",
            Self::Critica => "Crítica",
            Self::Vencida => "Vencida",
        }
    }
}

// ─── Classifier ─────────────────────────────────────────────────────────────

/// Classify a due date against `today` (both plain calendar dates).
///
/// Pure; callers must re-evaluate against the current date on every render
/// rather than caching the result across sessions.
pub fn classify(due: NaiveDate, today: NaiveDate) -> (DueStatus, i64) {
    let days = (due - today).num_days();
    match days {
        d if d < 0 => (DueStatus::Vencida, d.abs()),
        0..=3 => (DueStatus::Critica, days),
        4..=7 => (DueStatus::Proxima, days),
        _ => (DueStatus::AlDia, days),
    }
}

// ─── Display formatting ─────────────────────────────────────────────────────

/// Dates travel as `YYYY-MM-DD`; the UI shows `DD/MM/YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Soles, two decimals: `S/ 1250.50`.
pub fn format_money(amount: f64) -> String {
    format!("S/ {amount:.2}")
}

/// Short badge text: `Vencida (3d)`, `Al día`.
pub fn badge_text(status: DueStatus, days: i64) -> String {
    match status {
        DueStatus::AlDia => status.label().to_string(),
        _ => format!("{} ({days}d)", status.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn due_today_is_critical_with_zero_days() {
        let today = d("2026-08-24");
        assert_eq!(classify(today, today), (DueStatus::Critica, 0));
    }

    #[test]
    fn due_yesterday_is_overdue_by_one() {
        let today = d("2026-08-24");
        assert_eq!(classify(d("2026-08-23"), today), (DueStatus::Vencida, 1));
    }

    #[test]
    fn boundaries_between_states() {
        let today = d("2026-08-24");
        assert_eq!(classify(d("2026-08-27"), today).0, DueStatus::Critica); // +3
        assert_eq!(classify(d("2026-08-28"), today).0, DueStatus::Proxima); // +4
        assert_eq!(classify(d("2026-08-31"), today).0, DueStatus::Proxima); // +7
        assert_eq!(classify(d("2026-09-01"), today), (DueStatus::AlDia, 8)); // +8
    }

    #[test]
    fn upcoming_token_synonyms_parse_identically() {
        for token in ["proxima_vencer", "proximas_vencer", "proxima"] {
            assert_eq!(DueStatus::from_token(token), Some(DueStatus::Proxima));
        }
    }

    #[test]
    fn unknown_token_is_none() {
        assert_eq!(DueStatus::from_token("pendiente"), None);
    }

    #[test]
    fn date_renders_day_first() {
        assert_eq!(format_date(d("2026-01-09")), "09/01/2026");
    }

    #[test]
    fn money_renders_two_decimals() {
        assert_eq!(format_money(1250.5), "S/ 1250.50");
    }

    #[test]
    fn badge_includes_days_except_up_to_date() {
        assert_eq!(badge_text(DueStatus::Vencida, 3), "Vencida (3d)");
        assert_eq!(badge_text(DueStatus::AlDia, 12), "Al día");
    }
}
