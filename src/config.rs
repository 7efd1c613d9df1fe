use std::path::PathBuf;

pub const WORKSPACE_ENV: &str = "SCHOOLBOOKD_WORKSPACE";
pub const LOG_ENV: &str = "SCHOOLBOOKD_LOG";
const DEFAULT_LOG_FILTER: &str = "schoolbookd=info";

#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let workspace = get(WORKSPACE_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let log_filter = get(LOG_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Config {
            workspace,
            log_filter,
        }
    }
}
