use thiserror::Error;

use crate::language::LanguageCode;

/// Why a dictionary could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no dictionary for language `{0}`")]
    NotFound(LanguageCode),

    #[error("failed to read dictionary for `{lang}`: {source}")]
    Io {
        lang: LanguageCode,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dictionary for `{lang}`: {source}")]
    Parse {
        lang: LanguageCode,
        #[source]
        source: DictionaryParseError,
    },

    #[error("no async runtime available to fetch `{0}`")]
    NoRuntime(LanguageCode),

    #[error("fetch for `{0}` panicked")]
    Panicked(LanguageCode),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum DictionaryParseError {
    #[error("json dictionary error: {0}")]
    Json(String),

    #[error("yaml dictionary error: {0}")]
    Yaml(String),

    #[error("dictionary syntax error at line {line}: {msg}")]
    Syntax { line: usize, msg: String },
}
