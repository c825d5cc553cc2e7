use super::audit_ui::AuditUi;
use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use library_audit_config::{Config, CredentialStore, PathManager};
use library_audit_core::{AuditError, AuditOrchestrator, CancelFlag};
use library_audit_models::{EntrySnapshot, MediaKind, Report, ReportBucket};
use library_audit_sources::kitsu::TokenInfo;
use library_audit_sources::ServiceEndpoints;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::{Path, PathBuf};

pub async fn run_audit(
    kind: Option<MediaKind>,
    report_file: Option<PathBuf>,
    bucket: Option<ReportBucket>,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Audit command started");

    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();
    let mut config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config.apply_env_overrides();
    if let Some(kind) = kind {
        config.audit.media_kind = kind;
    }
    config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;

    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;

    let cancel = CancelFlag::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping the audit");
                cancel.cancel();
            }
        })
    };

    output.info(format!(
        "Auditing {} libraries for AniList user '{}' and Kitsu user '{}'",
        config.audit.media_kind,
        config.anilist_username().unwrap_or_default(),
        config.kitsu_username().unwrap_or_default()
    ));

    let connected = AuditOrchestrator::connect(&config, &cred_store, &ServiceEndpoints::default(), cancel).await;
    let (orchestrator, refreshed) = match connected {
        Ok(connected) => connected,
        Err(e) => {
            interrupt.abort();
            return Err(describe_failure(e));
        }
    };

    if let Some(token) = refreshed {
        persist_kitsu_token(&mut cred_store, token, output);
    }

    let mut ui = AuditUi::new(output.is_human() && !output.is_quiet());
    let result = orchestrator.run(&mut ui).await;
    ui.finish();
    interrupt.abort();
    let report = result.map_err(describe_failure)?;

    let report_path = report_file
        .unwrap_or_else(|| path_manager.reports_dir().join(report_file_name(&report)));
    write_report(&report, &report_path)?;

    match output.format() {
        OutputFormat::Human => {
            output.println("");
            output.table(&summary_table(&report));
            if let Some(bucket) = bucket {
                output.println(format!("\n{}", bucket.as_str().bold().bright_cyan()));
                if report.bucket(bucket).is_empty() {
                    output.println("  (empty)".bright_black().to_string());
                } else {
                    output.table(&bucket_table(&report, bucket));
                }
            }
            for warning in ui.warnings() {
                output.warn(warning);
            }
            output.success(format!("Report written to {}", report_path.display()));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let mut result = json!({
                "success": true,
                "media_kind": report.media_kind,
                "report_file": report_path.display().to_string(),
                "summary": report.summary,
                "warnings": ui.warnings(),
            });
            if let Some(bucket) = bucket {
                result["bucket"] = json!(bucket.as_str());
                result["items"] = json!(report.bucket(bucket));
            }
            output.json(&result);
        }
    }

    Ok(())
}

fn describe_failure(err: AuditError) -> color_eyre::Report {
    if err.is_auth() {
        eyre!(
            "{}\nCheck your credentials with 'dualshelf config anilist' / 'dualshelf config kitsu'",
            err
        )
    } else {
        eyre!("Audit failed: {}", err)
    }
}

fn persist_kitsu_token(cred_store: &mut CredentialStore, token: TokenInfo, output: &Output) {
    cred_store.set_kitsu_access_token(token.access_token);
    cred_store.set_kitsu_token_expires(token.expires_at);
    if let Err(e) = cred_store.save() {
        output.warn(format!("Could not cache the Kitsu access token: {}", e));
    }
}

/// e.g. `manga-20261019T153000Z.json`
fn report_file_name(report: &Report) -> String {
    format!(
        "{}-{}.json",
        report.media_kind.kitsu_type(),
        report.generated_at.format("%Y%m%dT%H%M%SZ")
    )
}

fn write_report(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| eyre!("Failed to create report directory {}: {}", parent.display(), e))?;
    }
    let content = serde_json::to_string_pretty(report)
        .map_err(|e| eyre!("Failed to serialize report: {}", e))?;
    std::fs::write(path, content).map_err(|e| eyre!("Failed to write report to {}: {}", path.display(), e))?;
    tracing::info!(path = %path.display(), "Report written");
    Ok(())
}

fn styled(table: &mut Table) {
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
}

fn summary_table(report: &Report) -> Table {
    let summary = &report.summary;
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new(format!("{} audit", report.media_kind))
            .fg(comfy_table::Color::Cyan)
            .add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Count").add_attribute(comfy_table::Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("AniList entries"), Cell::new(summary.anilist_total)]);
    table.add_row(vec![Cell::new("Kitsu entries"), Cell::new(summary.kitsu_total)]);
    for bucket in ReportBucket::ALL {
        let count = summary.count(bucket);
        let cell = match bucket {
            ReportBucket::Ok => Cell::new(count).fg(comfy_table::Color::Green),
            _ if count > 0 => Cell::new(count).fg(comfy_table::Color::Yellow),
            _ => Cell::new(count),
        };
        table.add_row(vec![Cell::new(bucket.as_str()), cell]);
    }
    table.add_row(vec![Cell::new("suppressed"), Cell::new(summary.suppressed)]);
    styled(&mut table);
    table
}

fn bucket_table(report: &Report, bucket: ReportBucket) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("AniList").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Kitsu").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for item in report.bucket(bucket) {
        table.add_row(vec![
            Cell::new(describe_side(item.anilist.as_ref())),
            Cell::new(describe_side(item.kitsu.as_ref())),
        ]);
    }
    styled(&mut table);
    table
}

/// `Title\nSTATUS, progress N\nurl`
fn describe_side(side: Option<&EntrySnapshot>) -> String {
    let Some(side) = side else {
        return "-".to_string();
    };
    let mut lines = vec![side.title.clone().unwrap_or_else(|| "(untitled)".to_string())];
    match (side.status, side.progress) {
        (Some(status), Some(progress)) => lines.push(format!("{}, progress {}", status, progress)),
        (Some(status), None) => lines.push(status.to_string()),
        _ => {}
    }
    if let Some(url) = &side.url {
        lines.push(url.clone());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use library_audit_models::{CanonicalStatus, ReportItem};

    fn sample_report() -> Report {
        let mut report = Report::new(MediaKind::Manga);
        report.push(
            ReportBucket::AnilistHigher,
            ReportItem {
                anilist: Some(EntrySnapshot {
                    media_id: Some("30002".to_string()),
                    title: Some("Berserk".to_string()),
                    url: Some("https://anilist.co/manga/30002".to_string()),
                    status: Some(CanonicalStatus::Current),
                    progress: Some(120),
                    ..EntrySnapshot::default()
                }),
                kitsu: Some(EntrySnapshot {
                    media_id: Some("8".to_string()),
                    title: Some("Berserk".to_string()),
                    status: Some(CanonicalStatus::Current),
                    progress: Some(100),
                    ..EntrySnapshot::default()
                }),
            },
        );
        report.summarize(1, 1);
        report
    }

    #[test]
    fn test_report_file_name_uses_kind_and_timestamp() {
        let report = sample_report();
        let name = report_file_name(&report);
        assert!(name.starts_with("manga-"));
        assert!(name.ends_with("Z.json"));
        assert_eq!(name.len(), "manga-20261019T153000Z.json".len());
    }

    #[test]
    fn test_write_report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("audit.json");
        let report = sample_report();

        write_report(&report, &path).unwrap();

        let written: Report = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report);
    }

    #[test]
    fn test_describe_side() {
        let report = sample_report();
        let item = &report.bucket(ReportBucket::AnilistHigher)[0];
        let anilist = describe_side(item.anilist.as_ref());
        assert!(anilist.starts_with("Berserk\n"));
        assert!(anilist.contains("progress 120"));
        assert!(anilist.ends_with("https://anilist.co/manga/30002"));
        assert_eq!(describe_side(None), "-");
    }

    #[test]
    fn test_summary_table_lists_every_bucket() {
        let rendered = summary_table(&sample_report()).to_string();
        for bucket in ReportBucket::ALL {
            assert!(rendered.contains(bucket.as_str()), "missing {}", bucket.as_str());
        }
        assert!(rendered.contains("suppressed"));
    }

    #[test]
    fn test_bucket_table_has_one_row_per_item() {
        let rendered = bucket_table(&sample_report(), ReportBucket::AnilistHigher).to_string();
        assert!(rendered.contains("progress 100"));
        assert!(rendered.contains("https://anilist.co/manga/30002"));
    }
}
