//! Project scaffolding

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{GlossaConfig, CONFIG_FILE};

const SAMPLE_EN: &str = r#"{
  "hello": "hello",
  "greeting": "Hello, {name}!",
  "menu": {
    "open": "Open",
    "quit": "Quit"
  }
}
"#;

const SAMPLE_IT: &str = "hello: ciao\ngreeting: \"Ciao, {name}!\"\nmenu.open: Apri\nmenu.quit: Esci\n";

/// Write `glossa.toml` and a starter catalog directory into `path`
pub fn init_project(path: &Path, force: bool) -> Result<()> {
    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (pass --force to overwrite)",
            config_path.display()
        );
    }

    fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))?;

    let config = GlossaConfig::new();
    fs::write(&config_path, config.to_toml()?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let langs = path.join(&config.catalogs.dir);
    fs::create_dir_all(&langs).with_context(|| format!("Failed to create {}", langs.display()))?;
    for (file, content) in [("en.json", SAMPLE_EN), ("it.yaml", SAMPLE_IT)] {
        let target = langs.join(file);
        if !target.exists() {
            fs::write(&target, content)
                .with_context(|| format!("Failed to write {}", target.display()))?;
        }
    }

    tracing::info!(path = %path.display(), "initialized glossa project");
    Ok(())
}
