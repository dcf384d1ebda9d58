use std::path::PathBuf;
use std::str::FromStr;

use crate::i18n::Language;
use crate::recommend::DEFAULT_RECOMMENDATION_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    File,
    Sqlite,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreKind::File),
            "sqlite" => Ok(StoreKind::Sqlite),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown store kind: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub data_dir: PathBuf,
    pub store: StoreKind,
    pub language: Language,
    pub recommend_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let data_dir = lookup("MAIA_DATA_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let store = lookup("MAIA_STORE")
            .and_then(|value| value.parse::<StoreKind>().ok())
            .unwrap_or(StoreKind::File);

        let language = lookup("MAIA_LANG")
            .or_else(|| lookup("LANG"))
            .map(|value| Language::detect(&value))
            .unwrap_or_default();

        let recommend_limit = lookup("MAIA_RECOMMEND_LIMIT")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);

        Self {
            log_level,
            data_dir,
            store,
            language,
            recommend_limit,
        }
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("maia.db")
    }
}
