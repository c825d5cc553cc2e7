use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use library_audit_core::{ProgressEvent, ProgressSink, TracingSink};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Progress sink for the `audit` command: indicatif bars on a terminal, structured logs otherwise
pub struct AuditUi {
    multi: MultiProgress,
    bar: ProgressBar,
    interactive: bool,
    warnings: Vec<String>,
}

impl AuditUi {
    pub fn new(show_bars: bool) -> Self {
        let interactive = show_bars && is_interactive();
        let multi = MultiProgress::new();

        let bar = multi.add(ProgressBar::new(0));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );

        if !interactive {
            bar.finish_and_clear();
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - progress bars disabled, using structured logging"
            );
        }

        Self {
            multi,
            bar,
            interactive,
            warnings: Vec::new(),
        }
    }

    /// Everything reported as a warning during the run
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn finish(&self) {
        if self.interactive {
            self.bar.finish_and_clear();
        }
    }
}

impl ProgressSink for AuditUi {
    fn emit(&mut self, event: ProgressEvent) {
        if let ProgressEvent::Warning(message) = &event {
            self.warnings.push(message.clone());
        }

        if !self.interactive {
            TracingSink.emit(event);
            return;
        }

        match event {
            ProgressEvent::Log(message) => {
                let _ = self.multi.println(message);
            }
            ProgressEvent::Warning(message) => {
                let _ = self.multi.println(format!("{} {}", "⚠".yellow(), message));
            }
            ProgressEvent::Progress { message, current, total } => {
                self.bar.set_length(total as u64);
                self.bar.set_position(current as u64);
                self.bar.set_message(message);
            }
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_are_collected_without_a_terminal() {
        let mut ui = AuditUi::new(false);
        ui.log("Fetching AniList Manga library".to_string());
        ui.warning("Dropped Kitsu entry 12: missing media".to_string());
        ui.progress("Checking (1/2): Berserk".to_string(), 1, 3);
        ui.finish();
        assert_eq!(ui.warnings(), ["Dropped Kitsu entry 12: missing media".to_string()]);
    }
}
