pub mod cookies;

use anyhow::{Context, Result};
use reqwest::header::COOKIE;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::models::{Installment, Quote};

// ─── Error types ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Unauthorized – check your session cookie")]
    Unauthorized,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

// ─── Client ─────────────────────────────────────────────────────────────────

/// Thin client over the intranet quotes API. Auth is cookie-based: every
/// request carries the configured `Cookie` header, and mutations add the
/// `X-CSRFToken` header extracted from it.
#[derive(Debug, Clone)]
pub struct QuotesClient {
    client: Client,
    base_url: Url,
    cookie_header: String,
    csrf_cookie: String,
}

impl QuotesClient {
    pub fn new(base_url: &str, cookie_header: &str, csrf_cookie: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;

        let client = Client::builder().user_agent("cotiza-tui/0.1.0").build()?;

        Ok(Self {
            client,
            base_url,
            cookie_header: cookie_header.to_string(),
            csrf_cookie: csrf_cookie.to_string(),
        })
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        let full = format!("/api{path}");
        self.base_url
            .join(&full)
            .with_context(|| format!("Bad API path: {path}"))
    }

    fn csrf_token(&self) -> Result<String, ApiError> {
        cookies::get_cookie(&self.cookie_header, &self.csrf_cookie).ok_or_else(|| {
            ApiError::Other(anyhow::anyhow!(
                "cookie '{}' not found in the configured cookie string",
                self.csrf_cookie
            ))
        })
    }

    async fn get(&self, path: &str) -> Result<Response, ApiError> {
        let url = self.api_url(path).map_err(ApiError::Other)?;
        let resp = self
            .client
            .get(url)
            .header(COOKIE, &self.cookie_header)
            .send()
            .await?;
        Self::check_status(resp).await
    }

    async fn check_status(resp: Response) -> Result<Response, ApiError> {
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized),
            s if s.is_client_error() || s.is_server_error() => {
                let status = s.as_u16();
                let message = resp.text().await.unwrap_or_default();
                Err(ApiError::Api { status, message })
            }
            _ => Ok(resp),
        }
    }

    // ── Quotes ──────────────────────────────────────────────────────────

    pub async fn list_quotes(&self) -> Result<Vec<Quote>, ApiError> {
        let resp = self.get("/lista-cotizaciones/").await?;
        Ok(resp.json().await?)
    }

    pub async fn list_installments(&self, id: u64) -> Result<Vec<Installment>, ApiError> {
        let resp = self.get(&format!("/detalle-cuotas/{id}/")).await?;
        Ok(resp.json().await?)
    }

    /// Delete a quote. Any 2xx counts as success; the caller re-fetches the
    /// whole list rather than patching local state.
    pub async fn delete_quote(&self, id: u64) -> Result<(), ApiError> {
        let token = self.csrf_token()?;
        let url = self
            .api_url(&format!("/cotizaciones/{id}/"))
            .map_err(ApiError::Other)?;
        let resp = self
            .client
            .delete(url)
            .header(COOKIE, &self.cookie_header)
            .header("X-CSRFToken", token)
            .send()
            .await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    /// The external edit page for a quote, resolved against the base URL.
    /// Surfaced in the UI; never fetched by this client.
    pub fn edit_url(&self, id: u64) -> Result<Url> {
        self.base_url
            .join(&format!("editar/{id}"))
            .context("Bad edit URL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(QuotesClient::new("not a url", "", "csrftoken").is_err());
    }

    #[test]
    fn builds_api_and_edit_urls_against_the_base() {
        let client =
            QuotesClient::new("https://intranet.example.com/", "csrftoken=t", "csrftoken").unwrap();
        assert_eq!(
            client.api_url("/lista-cotizaciones/").unwrap().as_str(),
            "https://intranet.example.com/api/lista-cotizaciones/"
        );
        assert_eq!(
            client.edit_url(42).unwrap().as_str(),
            "https://intranet.example.com/editar/42"
        );
    }

    #[test]
    fn csrf_token_comes_from_the_configured_cookie() {
        let client = QuotesClient::new(
            "https://intranet.example.com/",
            "sessionid=s; csrftoken=tok-1",
            "csrftoken",
        )
        .unwrap();
        assert_eq!(client.csrf_token().unwrap(), "tok-1");

        let missing =
            QuotesClient::new("https://intranet.example.com/", "sessionid=s", "csrftoken").unwrap();
        assert!(missing.csrf_token().is_err());
    }
}
