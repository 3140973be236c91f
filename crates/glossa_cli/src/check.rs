//! Catalog validation

use anyhow::{Context, Result};
use glossa_i18n::{CatalogFile, Dictionary, LanguageCode};
use std::collections::BTreeSet;

use crate::config::GlossaConfig;

#[derive(Debug)]
pub struct CheckReport {
    pub lines: Vec<String>,
    pub failures: usize,
}

/// Parse every catalog in the configured directory.
///
/// Keys present in the default language but missing elsewhere are listed,
/// they do not count as failures.
pub async fn check_catalogs(config: &GlossaConfig) -> Result<CheckReport> {
    let fetcher = config.fetcher();
    let files = fetcher
        .catalogs()
        .await
        .with_context(|| format!("Failed to list {}", fetcher.dir().display()))?;

    let mut lines = Vec::new();
    let mut failures = 0;
    let mut parsed: Vec<(LanguageCode, Dictionary)> = Vec::new();

    for CatalogFile { lang, path, format } in files {
        let src = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match Dictionary::parse_as(&src, format) {
            Ok(dict) => {
                lines.push(format!("ok    {lang:<8} {:>5} keys  {}", dict.len(), path.display()));
                parsed.push((lang, dict));
            }
            Err(err) => {
                failures += 1;
                tracing::warn!(path = %path.display(), error = %err, "catalog failed to parse");
                lines.push(format!("error {lang:<8} {err}  {}", path.display()));
            }
        }
    }

    if let Some(default) = &config.translations.default_lang {
        if let Some((_, reference)) = parsed.iter().find(|(lang, _)| lang == default) {
            for (lang, dict) in parsed.iter().filter(|(lang, _)| lang != default) {
                let missing: BTreeSet<&str> = reference
                    .keys()
                    .filter(|key| !dict.contains_key(key))
                    .collect();
                if !missing.is_empty() {
                    let keys: Vec<&str> = missing.into_iter().collect();
                    lines.push(format!("missing {lang}: {}", keys.join(", ")));
                }
            }
        }
    }

    Ok(CheckReport { lines, failures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[tokio::test]
    async fn reports_counts_errors_and_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let langs = dir.path().join("langs");
        fs::create_dir(&langs).unwrap();
        fs::write(langs.join("en.json"), r#"{"hello": "hello", "bye": "bye"}"#).unwrap();
        fs::write(langs.join("it.yaml"), "hello: ciao\n").unwrap();
        fs::write(langs.join("fr.json"), "{ nope").unwrap();
        fs::write(dir.path().join("glossa.toml"), "[translations]\ndefault_lang = \"en\"\n").unwrap();

        let config = GlossaConfig::load_from_dir(dir.path()).unwrap();
        let report = check_catalogs(&config).await.unwrap();

        assert_eq!(report.failures, 1);
        assert_eq!(report.lines.len(), 4);
        assert!(report.lines[0].starts_with("ok    en           2 keys"));
        assert!(report.lines[1].starts_with("error fr"));
        assert!(report.lines[2].starts_with("ok    it           1 keys"));
        assert_eq!(report.lines[3], "missing it: bye");
    }
}
