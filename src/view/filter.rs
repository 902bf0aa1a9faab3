use chrono::NaiveDate;

use crate::models::Quote;
use crate::status::DueStatus;

// ─── Predicates ─────────────────────────────────────────────────────────────

/// Whether the view shows everyone's quotes or only the acting user's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Mine,
}

impl Scope {
    pub fn toggle(self) -> Self {
        match self {
            Self::All => Self::Mine,
            Self::Mine => Self::All,
        }
    }
}

/// The current predicate conjunction. Unset fields impose no constraint.
#[derive(Debug, Clone)]
pub struct Filters {
    pub text: String,
    pub fecha_desde: Option<NaiveDate>,
    pub fecha_hasta: Option<NaiveDate>,
    pub user_id: Option<String>,
    pub distrito: Option<String>,
    pub monto_min: f64,
    pub monto_max: f64,
    pub estado: Option<DueStatus>,
    pub scope: Scope,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            text: String::new(),
            fecha_desde: None,
            fecha_hasta: None,
            user_id: None,
            distrito: None,
            monto_min: 0.0,
            monto_max: f64::INFINITY,
            estado: None,
            scope: Scope::All,
        }
    }
}

impl Filters {
    pub fn is_default(&self) -> bool {
        self.text.is_empty()
            && self.fecha_desde.is_none()
            && self.fecha_hasta.is_none()
            && self.user_id.is_none()
            && self.distrito.is_none()
            && self.monto_min == 0.0
            && self.monto_max == f64::INFINITY
            && self.estado.is_none()
            && self.scope == Scope::All
    }

    /// All predicates ANDed. `current_user` backs the `Mine` scope and is
    /// the username captured from the first loaded record.
    pub fn matches(&self, q: &Quote, current_user: &str) -> bool {
        if self.scope == Scope::Mine && q.user_username != current_user {
            return false;
        }

        let text = self.text.trim().to_lowercase();
        let matches_text = text.is_empty()
            || q.cliente.to_lowercase().contains(&text)
            || q.dni.to_lowercase().contains(&text)
            || q.distrito.to_lowercase().contains(&text)
            || q.nivel_predio.to_lowercase().contains(&text)
            || q.user_id.to_lowercase().contains(&text)
            || q.id.to_string().contains(&text);
        if !matches_text {
            return false;
        }

        if self.fecha_desde.is_some_and(|d| q.fecha < d) {
            return false;
        }
        if self.fecha_hasta.is_some_and(|d| q.fecha > d) {
            return false;
        }

        if self.user_id.as_deref().is_some_and(|u| q.user_id != u) {
            return false;
        }
        if self.distrito.as_deref().is_some_and(|d| q.distrito != d) {
            return false;
        }

        if q.total < self.monto_min || q.total > self.monto_max {
            return false;
        }

        if self.estado.is_some_and(|e| q.status != e) {
            return false;
        }

        true
    }

    /// Reduce the full set to the records satisfying every active predicate.
    /// Output order is unspecified until the sort engine runs.
    pub fn apply(&self, all: &[Quote], current_user: &str) -> Vec<Quote> {
        all.iter()
            .filter(|q| self.matches(q, current_user))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn quote(id: u64) -> Quote {
        Quote {
            id,
            user_id: "jlopez".into(),
            user_username: "jlopez".into(),
            cliente: "María Quispe".into(),
            dni: "44556677".into(),
            distrito: "San Borja".into(),
            nivel_predio: "Residencial".into(),
            total: 1500.0,
            fecha: "2026-08-10".parse().unwrap(),
            estado_cuotas: Some("proxima_vencer".into()),
            dias_restantes: 5,
            status: DueStatus::Proxima,
            days_remaining: 5,
        }
    }

    #[test]
    fn empty_filters_keep_everything() {
        let all = vec![quote(1), quote(2), quote(3)];
        let kept = Filters::default().apply(&all, "jlopez");
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn text_matches_any_field_case_insensitively() {
        let mut other = quote(2);
        other.cliente = "Pedro Rojas".into();
        other.dni = "11223344".into();
        other.distrito = "Ate".into();
        other.user_id = "prior".into();
        let all = vec![quote(1), other];

        for needle in ["maría", "4455", "san borja", "residen", "JLOPEZ"] {
            let filters = Filters {
                text: needle.into(),
                ..Filters::default()
            };
            let kept = filters.apply(&all, "jlopez");
            assert_eq!(kept.len(), 1, "needle {needle:?}");
            assert_eq!(kept[0].id, 1);
        }
    }

    #[test]
    fn text_matches_stringified_id() {
        let all = vec![quote(1024), quote(7)];
        let filters = Filters {
            text: "102".into(),
            ..Filters::default()
        };
        let kept = filters.apply(&all, "jlopez");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1024);
    }

    #[test]
    fn date_bounds_are_inclusive_and_optional() {
        let mut early = quote(1);
        early.fecha = "2026-08-01".parse().unwrap();
        let mut late = quote(2);
        late.fecha = "2026-08-20".parse().unwrap();
        let all = vec![early, late];

        let filters = Filters {
            fecha_desde: Some("2026-08-01".parse().unwrap()),
            fecha_hasta: Some("2026-08-10".parse().unwrap()),
            ..Filters::default()
        };
        let kept = filters.apply(&all, "jlopez");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);

        let unbounded = Filters::default().apply(&all, "jlopez");
        assert_eq!(unbounded.len(), 2);
    }

    #[test]
    fn amount_range_defaults_are_unbounded() {
        let mut cheap = quote(1);
        cheap.total = 10.0;
        let mut dear = quote(2);
        dear.total = 99_000.0;
        let all = vec![cheap, dear];

        assert_eq!(Filters::default().apply(&all, "jlopez").len(), 2);

        let filters = Filters {
            monto_min: 100.0,
            monto_max: 2000.0,
            ..Filters::default()
        };
        assert!(filters.apply(&all, "jlopez").is_empty());
    }

    #[test]
    fn mine_scope_matches_captured_username() {
        let mut theirs = quote(2);
        theirs.user_username = "prior".into();
        let all = vec![quote(1), theirs];

        let filters = Filters {
            scope: Scope::Mine,
            ..Filters::default()
        };
        let kept = filters.apply(&all, "jlopez");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);
    }

    #[test]
    fn status_synonyms_select_the_same_subset() {
        let mut current = quote(2);
        current.status = DueStatus::AlDia;
        let all = vec![quote(1), current];

        // Both accepted spellings of "upcoming" must parse to the same
        // predicate and therefore the same subset.
        let singular = Filters {
            estado: DueStatus::from_token("proxima_vencer"),
            ..Filters::default()
        };
        let plural = Filters {
            estado: DueStatus::from_token("proximas_vencer"),
            ..Filters::default()
        };
        let a: Vec<u64> = singular.apply(&all, "jlopez").iter().map(|q| q.id).collect();
        let b: Vec<u64> = plural.apply(&all, "jlopez").iter().map(|q| q.id).collect();
        assert_eq!(a, b);
        assert_eq!(a, vec![1]);
    }

    #[test]
    fn exact_user_and_district_predicates() {
        let mut other = quote(2);
        other.user_id = "prior".into();
        other.distrito = "Ate".into();
        let all = vec![quote(1), other];

        let by_user = Filters {
            user_id: Some("prior".into()),
            ..Filters::default()
        };
        assert_eq!(by_user.apply(&all, "jlopez")[0].id, 2);

        let by_district = Filters {
            distrito: Some("San Borja".into()),
            ..Filters::default()
        };
        assert_eq!(by_district.apply(&all, "jlopez")[0].id, 1);
    }

    proptest! {
        /// Soundness and completeness: the result is exactly the subset of
        /// the input satisfying the predicate conjunction.
        #[test]
        fn filter_is_exact_subset(
            ids in proptest::collection::vec(1u64..500, 0..40),
            totals in proptest::collection::vec(0.0f64..10_000.0, 0..40),
            text in "[a-z0-9]{0,4}",
            min in 0.0f64..5_000.0,
        ) {
            let all: Vec<Quote> = ids
                .iter()
                .zip(totals.iter().chain(std::iter::repeat(&100.0)))
                .map(|(&id, &total)| {
                    let mut q = quote(id);
                    q.total = total;
                    q
                })
                .collect();

            let filters = Filters { text, monto_min: min, ..Filters::default() };
            let kept = filters.apply(&all, "jlopez");

            for q in &kept {
                prop_assert!(filters.matches(q, "jlopez"));
                prop_assert!(all.iter().any(|a| a.id == q.id));
            }
            let expected = all.iter().filter(|q| filters.matches(q, "jlopez")).count();
            prop_assert_eq!(kept.len(), expected);
        }
    }
}
