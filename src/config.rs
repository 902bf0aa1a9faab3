use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the intranet deployment, e.g. `https://intranet.example.com/`.
    pub base_url: String,
    /// Raw `Cookie` header value for an authenticated session; must contain
    /// the CSRF cookie.
    pub cookies: String,
    /// Name of the anti-forgery cookie.
    #[serde(default = "default_csrf_cookie")]
    pub csrf_cookie: String,
}

fn default_csrf_cookie() -> String {
    "csrftoken".into()
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config at {}", path.display()))?;
                return Self::parse(&contents);
            }
        }

        let base_url = std::env::var("COTIZA_URL")
            .with_context(|| "COTIZA_URL not set. Create a config file or set the env var.")?;
        let cookies = std::env::var("COTIZA_COOKIES")
            .with_context(|| "COTIZA_COOKIES not set. Create a config file or set the env var.")?;
        let csrf_cookie =
            std::env::var("COTIZA_CSRF_COOKIE").unwrap_or_else(|_| default_csrf_cookie());

        Ok(Self {
            base_url,
            cookies,
            csrf_cookie,
        })
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).with_context(|| "Failed to parse config.toml")
    }

    pub fn generate_default() -> Result<PathBuf> {
        let path = Self::config_path().with_context(|| "Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let default = Config {
            base_url: "https://your-intranet.example.com".into(),
            cookies: "sessionid=...; csrftoken=...".into(),
            csrf_cookie: default_csrf_cookie(),
        };

        let toml_str = toml::to_string_pretty(&default)?;
        std::fs::write(&path, toml_str)?;
        Ok(path)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("cotiza-tui").join("config.toml"))
    }
}
