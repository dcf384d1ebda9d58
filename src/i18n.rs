//! Translation tables, language selection and learn line title registration.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::content::LearnLine;
use crate::store::KeyValueStore;

pub const LANGUAGE_KEY: &str = "preferredLanguage";

static PARAM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Sv,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Sv];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Sv => "sv",
        }
    }

    /// Language of a locale tag like `sv-SE` or `sv_SE.UTF-8`, English otherwise.
    pub fn detect(locale: &str) -> Self {
        let primary = locale
            .split(|c: char| c == '-' || c == '_' || c == '.')
            .next()
            .unwrap_or_default();
        primary.parse().unwrap_or_default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "sv" => Ok(Language::Sv),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// A translation table node: either a string or a nested group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationNode {
    Text(String),
    Group(BTreeMap<String, TranslationNode>),
}

fn default_tables() -> HashMap<Language, TranslationNode> {
    let en = serde_json::json!({
        "app": {
            "title": "Maia Learning Assistant",
            "subtitle": "Learn step by step",
            "lgm": { "open": "Explore Learning Lines" }
        },
        "lgm": {
            "title": "Learn Graph Map",
            "description": "Explore all learning lines. Completed topics are marked with ✓.",
            "status": { "completed": "Completed", "locked": "Locked", "available": "Available" },
            "prereq": "Prerequisites:",
            "close": "Close",
            "noItems": "No learning topics available yet."
        },
        "learnLines": {
            "startPrompt": "Pick a learning line to start learning!",
            "completed": "Completed",
            "locked": "Locked"
        },
        "progress": { "overall": "Overall progress: {percent}%" },
        "conversation": {
            "inputPlaceholder": "Type your message...",
            "send": "Send",
            "continue": "Continue",
            "greeting": "Hello! How can I help you today?"
        }
    });
    let sv = serde_json::json!({
        "app": {
            "title": "Maia Lärande-assistent",
            "subtitle": "Lär steg för steg",
            "lgm": { "open": "Utforska lärolinjer" }
        },
        "lgm": {
            "title": "Lärolinjeutforskare",
            "description": "Utforska alla lärolinjer. Avklarade ämnen är markerade med ✓.",
            "status": { "completed": "Avklarad", "locked": "Låst", "available": "Tillgänglig" },
            "prereq": "Förkunskaper:",
            "close": "Stäng",
            "noItems": "Inga läroämnen är tillgängliga än."
        },
        "navigation": { "learnMap": "Ämnesöversikt", "settings": "Inställningar" },
        "learnLines": {
            "startPrompt": "Välj en lärolinje för att börja lära dig!",
            "completed": "Avslutad",
            "locked": "Låst"
        },
        "progress": { "overall": "Total framsteg: {percent}%" },
        "conversation": {
            "inputPlaceholder": "Skriv ditt meddelande...",
            "send": "Skicka",
            "continue": "Fortsätt",
            "greeting": "Hej! Hur kan jag hjälpa dig idag?"
        }
    });

    [(Language::En, en), (Language::Sv, sv)]
        .into_iter()
        .filter_map(|(language, value)| match serde_json::from_value(value) {
            Ok(node) => Some((language, node)),
            Err(err) => {
                error!(language = %language, error = %err, "built-in translation table is malformed");
                None
            }
        })
        .collect()
}

/// Current language plus one translation tree per language.
pub struct I18n {
    language: Language,
    tables: HashMap<Language, TranslationNode>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl I18n {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            tables: default_tables(),
            store: None,
        }
    }

    /// Start from `fallback`, then switch to the stored preference if there is one.
    pub fn initialize(fallback: Language, store: Arc<dyn KeyValueStore>) -> Self {
        let mut i18n = Self::new(fallback);
        match store.get(LANGUAGE_KEY) {
            Ok(Some(saved)) => match saved.trim().parse() {
                Ok(language) => i18n.language = language,
                Err(err) => warn!(error = %err, "ignoring stored language preference"),
            },
            Ok(None) => {}
            Err(err) => error!(error = %err, "failed to read language preference"),
        }
        i18n.store = Some(store);
        i18n
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switch language and remember the choice.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        if let Some(ref store) = self.store {
            if let Err(err) = store.set(LANGUAGE_KEY, language.code()) {
                error!(error = %err, "failed to save language preference");
            }
        }
    }

    pub fn t(&self, key: &str) -> String {
        self.t_with(key, &[])
    }

    /// Look up a dotted key and fill `{name}` placeholders from `params`.
    ///
    /// A missing key yields the key itself. Placeholders without a value are
    /// kept verbatim.
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(mut node) = self.tables.get(&self.language) else {
            warn!(key, language = %self.language, "no translation table for language");
            return key.to_string();
        };

        for part in key.split('.') {
            match node {
                TranslationNode::Group(children) => match children.get(part) {
                    Some(child) => node = child,
                    None => {
                        warn!(key, language = %self.language, "translation missing");
                        return key.to_string();
                    }
                },
                TranslationNode::Text(_) => {
                    warn!(key, segment = part, "cannot descend into a translated string");
                    return key.to_string();
                }
            }
        }

        match node {
            TranslationNode::Text(text) => PARAM_PATTERN
                .replace_all(text, |caps: &Captures| {
                    let name = &caps[1];
                    params
                        .iter()
                        .find(|(param, _)| *param == name)
                        .map(|(_, value)| value.to_string())
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned(),
            TranslationNode::Group(_) => {
                warn!(key, "translation key names a group, not a string");
                key.to_string()
            }
        }
    }

    /// Merge `entries` into the table of `language` under the dotted `prefix`.
    pub fn insert(&mut self, language: Language, prefix: &str, entries: BTreeMap<String, TranslationNode>) {
        let mut node = self
            .tables
            .entry(language)
            .or_insert_with(|| TranslationNode::Group(BTreeMap::new()));

        for part in prefix.split('.').filter(|part| !part.is_empty()) {
            let children = match node {
                TranslationNode::Group(children) => children,
                TranslationNode::Text(_) => {
                    warn!(prefix, "cannot insert translations below a string");
                    return;
                }
            };
            node = children
                .entry(part.to_string())
                .or_insert_with(|| TranslationNode::Group(BTreeMap::new()));
        }

        match node {
            TranslationNode::Group(children) => children.extend(entries),
            TranslationNode::Text(_) => warn!(prefix, "cannot insert translations below a string"),
        }
    }

    /// Register `learnLines.<id>.{title,description,example}` for every line.
    ///
    /// English strings come from the line itself; other languages from its
    /// translations. Translations for unsupported languages are skipped.
    pub fn register_learn_lines(&mut self, lines: &[LearnLine]) {
        for line in lines {
            let base = line_entry(&line.title, line.description.as_deref(), line.example.as_deref());
            self.insert(Language::En, "learnLines", BTreeMap::from([(line.id.clone(), base)]));

            for (code, translation) in &line.translations {
                let Ok(language) = code.parse::<Language>() else {
                    debug!(line_id = %line.id, language = %code, "skipping unsupported translation");
                    continue;
                };
                let entry = line_entry(
                    &translation.title,
                    translation.description.as_deref(),
                    translation.example.as_deref(),
                );
                self.insert(language, "learnLines", BTreeMap::from([(line.id.clone(), entry)]));
            }
        }
    }
}

fn line_entry(title: &str, description: Option<&str>, example: Option<&str>) -> TranslationNode {
    TranslationNode::Group(BTreeMap::from([
        ("title".to_string(), TranslationNode::Text(title.to_string())),
        (
            "description".to_string(),
            TranslationNode::Text(description.unwrap_or_default().to_string()),
        ),
        (
            "example".to_string(),
            TranslationNode::Text(example.unwrap_or_default().to_string()),
        ),
    ]))
}
