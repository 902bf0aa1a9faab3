use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::status::DueStatus;

// ─── Quotes ─────────────────────────────────────────────────────────────────

/// A quote record as served by `GET /api/lista-cotizaciones/`.
///
/// `status` and `days_remaining` are derived once at load time from the
/// backend-supplied `estado_cuotas` / `dias_restantes` pair; everything else
/// is immutable after the fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: u64,
    pub user_id: String,
    pub user_username: String,
    pub cliente: String,
    pub dni: String,
    pub distrito: String,
    pub nivel_predio: String,
    #[serde(deserialize_with = "de_decimal")]
    pub total: f64,
    pub fecha: NaiveDate,
    pub estado_cuotas: Option<String>,
    #[serde(default)]
    pub dias_restantes: i64,

    #[serde(skip)]
    pub status: DueStatus,
    #[serde(skip)]
    pub days_remaining: i64,
}

impl Quote {
    /// Map the backend status token onto the derived fields. Called once
    /// per record when a list fetch lands.
    pub fn derive_status(&mut self) {
        self.status = self
            .estado_cuotas
            .as_deref()
            .and_then(DueStatus::from_token)
            .unwrap_or(DueStatus::AlDia);
        self.days_remaining = self.dias_restantes;
    }
}

// ─── Installments ───────────────────────────────────────────────────────────

/// A single installment ("cuota") of a quote, from
/// `GET /api/detalle-cuotas/{id}/`. Fetched on demand, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    #[serde(deserialize_with = "de_decimal")]
    pub monto: f64,
    pub fecha: NaiveDate,
    pub descripcion: String,
}

// ─── Wire helpers ───────────────────────────────────────────────────────────

/// The backend serializes Django decimals as JSON strings; accept either a
/// number or a numeric string.
fn de_decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("bad decimal '{s}': {e}"))),
    }
}
