use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::Quote;

// ─── Sort keys ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Fecha,
    Total,
    Id,
    Cliente,
    Dni,
    Distrito,
    NivelPredio,
    Usuario,
}

impl SortField {
    pub const ALL: [SortField; 8] = [
        SortField::Fecha,
        SortField::Total,
        SortField::Id,
        SortField::Cliente,
        SortField::Dni,
        SortField::Distrito,
        SortField::NivelPredio,
        SortField::Usuario,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Fecha => "Fecha",
            Self::Total => "Total",
            Self::Id => "ID",
            Self::Cliente => "Cliente",
            Self::Dni => "DNI",
            Self::Distrito => "Distrito",
            Self::NivelPredio => "Nivel predio",
            Self::Usuario => "Usuario",
        }
    }

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Urgency rank descending, ties by ascending days remaining.
    Urgency,
    Field {
        field: SortField,
        dir: Direction,
    },
}

impl Default for SortKey {
    fn default() -> Self {
        // The admin view opens on newest-first.
        Self::Field {
            field: SortField::Fecha,
            dir: Direction::Desc,
        }
    }
}

impl SortKey {
    /// Column-header cycling: same field toggles direction, then moves to
    /// the next field ascending. Leaves urgency mode into `Fecha` ascending.
    pub fn cycle_field(self) -> Self {
        match self {
            Self::Field {
                field,
                dir: Direction::Asc,
            } => Self::Field {
                field,
                dir: Direction::Desc,
            },
            Self::Field {
                field,
                dir: Direction::Desc,
            } => Self::Field {
                field: field.next(),
                dir: Direction::Asc,
            },
            Self::Urgency => Self::Field {
                field: SortField::Fecha,
                dir: Direction::Asc,
            },
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Urgency => "Urgencia".to_string(),
            Self::Field { field, dir } => format!(
                "{} {}",
                field.label(),
                match dir {
                    Direction::Asc => "↑",
                    Direction::Desc => "↓",
                }
            ),
        }
    }
}

/// Tie handling for field sorts. `field_cmp` returns "less" for equal
/// values, so equal elements end up in arrival-reversed positions;
/// `strict_ties` opts into a corrected stable ordering instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortOptions {
    pub strict_ties: bool,
}

// ─── Value extraction ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Date(NaiveDate),
    Num(f64),
    Int(u64),
    Text(String),
}

fn sort_value(q: &Quote, field: SortField) -> SortValue {
    match field {
        SortField::Fecha => SortValue::Date(q.fecha),
        SortField::Total => SortValue::Num(q.total),
        SortField::Id => SortValue::Int(q.id),
        SortField::Cliente => SortValue::Text(q.cliente.to_lowercase()),
        SortField::Dni => SortValue::Text(q.dni.to_lowercase()),
        SortField::Distrito => SortValue::Text(q.distrito.to_lowercase()),
        SortField::NivelPredio => SortValue::Text(q.nivel_predio.to_lowercase()),
        SortField::Usuario => SortValue::Text(q.user_id.to_lowercase()),
    }
}

fn value_cmp(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Date(x), SortValue::Date(y)) => x.cmp(y),
        (SortValue::Num(x), SortValue::Num(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (SortValue::Int(x), SortValue::Int(y)) => x.cmp(y),
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        // Values for one field are always the same variant.
        _ => Ordering::Equal,
    }
}

// ─── Comparators ────────────────────────────────────────────────────────────

/// The field-mode comparator, quirk included:
/// ascending yields `Greater` iff `a > b` and `Less` otherwise, so equal
/// values compare `Less`. Not a total order; `sort_quotes` decorates it
/// with an index tiebreak before handing it to a real sort.
pub fn field_cmp(a: &Quote, b: &Quote, field: SortField, dir: Direction) -> Ordering {
    let (va, vb) = (sort_value(a, field), sort_value(b, field));
    match dir {
        Direction::Asc => {
            if value_cmp(&va, &vb) == Ordering::Greater {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        Direction::Desc => {
            if value_cmp(&va, &vb) == Ordering::Less {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
    }
}

/// Urgency comparator: rank descending, then days remaining ascending.
pub fn urgency_cmp(a: &Quote, b: &Quote) -> Ordering {
    b.status
        .urgency_rank()
        .cmp(&a.status.urgency_rank())
        .then(a.days_remaining.cmp(&b.days_remaining))
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Sort the filtered subset in place.
///
/// Field mode sorts by the extracted value in the requested direction; equal
/// values land in arrival-reversed order (the non-strict comparator's
/// observable effect) unless `strict_ties` is set, which keeps them stable.
pub fn sort_quotes(quotes: &mut [Quote], key: SortKey, opts: SortOptions) {
    match key {
        SortKey::Urgency => quotes.sort_by(urgency_cmp),
        SortKey::Field { field, dir } => {
            let mut decorated: Vec<(SortValue, usize)> = quotes
                .iter()
                .enumerate()
                .map(|(i, q)| (sort_value(q, field), i))
                .collect();
            decorated.sort_by(|(va, ia), (vb, ib)| {
                let ord = match dir {
                    Direction::Asc => value_cmp(va, vb),
                    Direction::Desc => value_cmp(vb, va),
                };
                if ord == Ordering::Equal {
                    if opts.strict_ties {
                        ia.cmp(ib)
                    } else {
                        ib.cmp(ia)
                    }
                } else {
                    ord
                }
            });

            let order: Vec<usize> = decorated.into_iter().map(|(_, i)| i).collect();
            let mut sorted: Vec<Quote> = order.iter().map(|&i| quotes[i].clone()).collect();
            quotes.swap_with_slice(&mut sorted);
        }
    }
}
