//! Dictionary fetchers
//!
//! Any `Fn(LanguageCode) -> impl Future<Output = Result<Dictionary, FetchError>>`
//! is a fetcher. [`CatalogDirFetcher`] serves catalogs from a directory.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::dictionary::{CatalogFormat, Dictionary};
use crate::error::FetchError;
use crate::language::{locale_fallback_chain, LanguageCode};

/// Boxed future returned by a fetcher
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Dictionary, FetchError>> + Send + 'static>>;

/// Loads the dictionary for a language
pub trait DictionaryFetcher: Send + Sync + 'static {
    fn fetch(&self, lang: &LanguageCode) -> FetchFuture;
}

impl<F, Fut> DictionaryFetcher for F
where
    F: Fn(LanguageCode) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Dictionary, FetchError>> + Send + 'static,
{
    fn fetch(&self, lang: &LanguageCode) -> FetchFuture {
        Box::pin(self(lang.clone()))
    }
}

/// A catalog file found in a directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogFile {
    pub lang: LanguageCode,
    pub path: PathBuf,
    pub format: CatalogFormat,
}

/// Reads `<dir>/<lang>.{json,yaml,yml,txt}`.
///
/// `en_US` is looked up as `en-US`, then `en`.
#[derive(Clone, Debug)]
pub struct CatalogDirFetcher {
    dir: PathBuf,
    latency: Option<Duration>,
}

impl CatalogDirFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            latency: None,
        }
    }

    /// Delay every fetch, to exercise loading states
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = (!latency.is_zero()).then_some(latency);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List every catalog file in the directory, sorted by language
    pub async fn catalogs(&self) -> std::io::Result<Vec<CatalogFile>> {
        let mut out = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(format) = CatalogFormat::from_path(&path) else {
                continue;
            };
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            out.push(CatalogFile {
                lang: LanguageCode::from(stem),
                path: path.clone(),
                format,
            });
        }
        out.sort_by(|a, b| a.lang.cmp(&b.lang).then_with(|| a.path.cmp(&b.path)));
        Ok(out)
    }
}

/// Codes that could escape the catalog directory are never looked up.
fn is_safe_file_stem(code: &str) -> bool {
    !code.is_empty() && !code.starts_with('.') && !code.contains(['/', '\\'])
}

async fn locate(dir: &Path, lang: &LanguageCode) -> Result<Option<(PathBuf, CatalogFormat)>, FetchError> {
    for candidate in locale_fallback_chain(lang.as_str()) {
        if !is_safe_file_stem(&candidate) {
            continue;
        }
        for format in CatalogFormat::ALL {
            for ext in format.extensions() {
                let path = dir.join(format!("{candidate}.{ext}"));
                let exists = tokio::fs::try_exists(&path)
                    .await
                    .map_err(|source| FetchError::Io {
                        lang: lang.clone(),
                        source,
                    })?;
                if exists {
                    return Ok(Some((path, format)));
                }
            }
        }
    }
    Ok(None)
}

impl DictionaryFetcher for CatalogDirFetcher {
    fn fetch(&self, lang: &LanguageCode) -> FetchFuture {
        let dir = self.dir.clone();
        let latency = self.latency;
        let lang = lang.clone();

        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            let Some((path, format)) = locate(&dir, &lang).await? else {
                return Err(FetchError::NotFound(lang));
            };

            let src = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| FetchError::Io {
                    lang: lang.clone(),
                    source,
                })?;
            let dictionary = Dictionary::parse_as(&src, format).map_err(|source| FetchError::Parse {
                lang: lang.clone(),
                source,
            })?;

            debug!(
                lang = %lang,
                path = %path.display(),
                entries = dictionary.len(),
                "loaded catalog"
            );
            Ok(dictionary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn closures_are_fetchers() {
        let fetcher = |lang: LanguageCode| async move {
            Ok::<Dictionary, FetchError>([("lang", lang.into_string())].into_iter().collect())
        };
        let dict = fetcher.fetch(&"it".into()).await.unwrap();
        assert_eq!(dict.get("lang"), Some("it"));
    }

    #[tokio::test]
    async fn dir_fetcher_reads_each_format() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), r#"{"hello": "hello"}"#).unwrap();
        std::fs::write(dir.path().join("it.yaml"), "hello: ciao\n").unwrap();
        std::fs::write(dir.path().join("de.txt"), "hello = hallo\n").unwrap();

        let fetcher = CatalogDirFetcher::new(dir.path());
        for (lang, expected) in [("en", "hello"), ("it", "ciao"), ("de", "hallo")] {
            let dict = fetcher.fetch(&lang.into()).await.unwrap();
            assert_eq!(dict.get("hello"), Some(expected), "lang={lang}");
        }
    }

    #[tokio::test]
    async fn dir_fetcher_loads_sentence_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("it.json"), r#"{"Hello world": "Ciao mondo"}"#).unwrap();

        let dict = CatalogDirFetcher::new(dir.path())
            .fetch(&"it".into())
            .await
            .unwrap();
        assert_eq!(dict.translate("Hello world"), "Ciao mondo");
    }

    #[tokio::test]
    async fn dir_fetcher_falls_back_to_primary_language() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pt.json"), r#"{"hello": "olá"}"#).unwrap();

        let fetcher = CatalogDirFetcher::new(dir.path());
        let dict = fetcher.fetch(&"pt_BR".into()).await.unwrap();
        assert_eq!(dict.get("hello"), Some("olá"));
    }

    #[tokio::test]
    async fn dir_fetcher_reports_missing_and_broken_catalogs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fr.json"), "{ not json").unwrap();

        let fetcher = CatalogDirFetcher::new(dir.path());
        let missing = fetcher.fetch(&"xx".into()).await.unwrap_err();
        assert!(matches!(missing, FetchError::NotFound(ref l) if l == "xx"));

        let broken = fetcher.fetch(&"fr".into()).await.unwrap_err();
        assert!(matches!(broken, FetchError::Parse { .. }));

        let escape = fetcher.fetch(&"../secrets".into()).await.unwrap_err();
        assert!(matches!(escape, FetchError::NotFound(_)));
    }

    #[tokio::test]
    async fn catalogs_are_listed_by_language() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("it.yml"), "hello: ciao\n").unwrap();
        std::fs::write(dir.path().join("en.json"), "{}").unwrap();
        std::fs::write(dir.path().join("README.md"), "# catalogs").unwrap();

        let files = CatalogDirFetcher::new(dir.path()).catalogs().await.unwrap();
        let langs: Vec<&str> = files.iter().map(|f| f.lang.as_str()).collect();
        assert_eq!(langs, vec!["en", "it"]);
        assert_eq!(files[1].format, CatalogFormat::Yaml);
    }
}
