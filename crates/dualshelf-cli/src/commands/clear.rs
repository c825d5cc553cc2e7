use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use library_audit_config::PathManager;
use std::fs;
use std::path::Path;

pub fn run_clear(all: bool, credentials: bool, config: bool, reports: bool, output: &Output) -> Result<()> {
    clear_with(&PathManager::default(), all, credentials, config, reports, output)
}

fn clear_with(
    path_manager: &PathManager,
    all: bool,
    credentials: bool,
    config: bool,
    reports: bool,
    output: &Output,
) -> Result<()> {
    if all {
        clear_file(&path_manager.credentials_file(), "credentials", output)?;
        clear_file(&path_manager.config_file(), "configuration", output)?;
        clear_reports(path_manager, output)?;
        output.success("Credentials, configuration and reports cleared");
        return Ok(());
    }

    if !(credentials || config || reports) {
        output.warn("No clear option specified. Use --credentials, --config, --reports, or --all");
        output.println("\nExample: dualshelf clear --credentials");
        return Ok(());
    }

    if credentials {
        clear_file(&path_manager.credentials_file(), "credentials", output)?;
    }
    if config {
        clear_file(&path_manager.config_file(), "configuration", output)?;
    }
    if reports {
        clear_reports(path_manager, output)?;
    }
    Ok(())
}

fn clear_file(path: &Path, what: &str, output: &Output) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| eyre!("Failed to remove {} file at {}: {}", what, path.display(), e))?;
        output.success(format!("Cleared {}: {}", what, path.display()));
    } else {
        output.info(format!("No {} file found to clear", what));
    }
    Ok(())
}

fn clear_reports(path_manager: &PathManager, output: &Output) -> Result<()> {
    let reports_dir = path_manager.reports_dir();
    if !reports_dir.exists() {
        output.info("No reports found to clear");
        return Ok(());
    }

    let mut removed = 0;
    for entry in fs::read_dir(&reports_dir).map_err(|e| eyre!("Failed to read {}: {}", reports_dir.display(), e))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            fs::remove_file(&path).map_err(|e| eyre!("Failed to remove report {}: {}", path.display(), e))?;
            removed += 1;
        }
    }
    output.success(format!("Cleared {} report(s) from {}", removed, reports_dir.display()));
    Ok(())
}
