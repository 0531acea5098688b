//! The export command: write the builtin default configuration to the
//! standard config location as a starting point for customization.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context as _;

use crate::commands::{CommandError, CommandResult};
use crate::config::{AppConfig, builtin_defaults};

pub fn run(defaults: bool, overwrite: bool, out: &mut dyn Write) -> CommandResult {
    if !defaults {
        return Err(CommandError::User(
            "nothing to export; use --defaults to write the default configuration".to_string(),
        ));
    }
    let path = AppConfig::default_path().ok_or_else(|| {
        CommandError::User("no configuration directory is defined for this platform".to_string())
    })?;
    export_to(&path, overwrite, out)
}

fn export_to(path: &Path, overwrite: bool, out: &mut dyn Write) -> CommandResult {
    tracing::info!(command = "export", path = %path.display(), "executing command");
    if path.exists() && !overwrite {
        return Err(CommandError::User(format!(
            "{path:?} exists; use --overwrite to replace it"
        )));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory {parent:?}"))?;
    }
    let rendered =
        toml::to_string_pretty(&builtin_defaults()).context("render default configuration")?;
    fs::write(path, rendered).with_context(|| format!("write config {path:?}"))?;
    writeln!(out, "Default configuration written to {path:?}")
        .context("write console output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_parseable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagward").join("defaults.toml");
        let mut out = Vec::new();
        export_to(&path, false, &mut out).unwrap();

        let written = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(written.check.unwrap().files, Some(false));
        assert_eq!(written.repair.unwrap().dry_run, Some(false));
    }

    #[test]
    fn refuses_to_overwrite_without_the_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.toml");
        fs::write(&path, "# hand-edited\n").unwrap();

        let mut out = Vec::new();
        match export_to(&path, false, &mut out) {
            Err(CommandError::User(message)) => assert!(message.contains("--overwrite")),
            other => panic!("expected user error, got {other:?}"),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "# hand-edited\n");

        export_to(&path, true, &mut out).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[check]"));
    }
}
