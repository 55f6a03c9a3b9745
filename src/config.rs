use std::{env, path::PathBuf};

use lazy_static::lazy_static;
use log::{log, Level};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

lazy_static! {
    static ref DEFAULT_SESSION_FILE: PathBuf = dirs::data_dir()
        .unwrap_or_else(env::temp_dir)
        .join("quotes")
        .join("session.json");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub session_file: PathBuf,
}

impl Config {
    pub fn new(api_base_url: impl Into<String>, session_file: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: normalize_base_url(&api_base_url.into()),
            session_file: session_file.into(),
        }
    }

    /// Reads `QUOTES_API_BASE_URL` and `QUOTES_SESSION_FILE`.
    pub fn from_env() -> Self {
        let api_base_url = match env::var("QUOTES_API_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                log!(
                    Level::Warn,
                    "QUOTES_API_BASE_URL not set, falling back to {DEFAULT_API_BASE_URL}"
                );
                DEFAULT_API_BASE_URL.to_string()
            }
        };
        let session_file = env::var_os("QUOTES_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| DEFAULT_SESSION_FILE.clone());
        Self::new(api_base_url, session_file)
    }

    pub fn with_overrides(
        mut self,
        api_base_url: Option<String>,
        session_file: Option<PathBuf>,
    ) -> Self {
        if let Some(url) = api_base_url {
            self.api_base_url = normalize_base_url(&url);
        }
        if let Some(path) = session_file {
            self.session_file = path;
        }
        self
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
