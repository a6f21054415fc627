//! Commands operating on the temp workspace.

use mdlab_core::{Config, Error, LanguageFamily, TempWorkspace, synthesizer_for};

use crate::colors;

/// Print the synthesized entry file for a language.
pub fn main_file(config: &Config, language: &str) -> anyhow::Result<()> {
    let canonical = mdlab_doc::canonical_language(language);
    let family = LanguageFamily::from_language(canonical)
        .ok_or_else(|| Error::UnsupportedLanguage(language.to_string()))?;

    let workspace = TempWorkspace::new(&config.temp_path);
    let path = workspace.resolve(synthesizer_for(family, config).entry_file());
    if !path.exists() {
        tracing::warn!("{} has not been synthesized yet", path.display());
    }
    println!("{}", path.display());
    Ok(())
}

/// Delete the temp workspace.
pub fn clean(config: &Config) -> anyhow::Result<()> {
    let workspace = TempWorkspace::new(&config.temp_path);
    if workspace.clean()? {
        println!("{}Removed{} {}", colors::GREEN, colors::RESET, workspace.root().display());
    } else {
        println!("Nothing to clean at {}", workspace.root().display());
    }
    Ok(())
}
