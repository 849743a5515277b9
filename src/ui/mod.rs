//! Terminal UI helpers for the CLI.
//!
//! Colored status lines and a load spinner. Nothing here is used by the
//! paging engine itself.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::paging::UiState;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print a success line to stderr.
pub fn print_success(msg: &str) {
    eprintln!("{} {}", "✓".green().bold(), msg);
}

/// Print a warning line to stderr.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow().bold(), msg);
}

/// Colored label for a UI state.
pub fn ui_state_badge(state: UiState) -> String {
    match state {
        UiState::Idle => state.as_str().dimmed().to_string(),
        UiState::Loading => state.as_str().cyan().to_string(),
        UiState::Success => state.as_str().green().to_string(),
        UiState::Error => state.as_str().red().bold().to_string(),
        UiState::Empty => state.as_str().yellow().to_string(),
    }
}

fn style(template: &str) -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(template)
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
}

/// Spinner shown while pages load. Hidden when stderr is not a terminal.
pub struct LoadSpinner {
    pb: indicatif::ProgressBar,
}

impl LoadSpinner {
    pub fn new(msg: &str) -> Self {
        let pb = if std::io::stderr().is_terminal() {
            indicatif::ProgressBar::new_spinner()
        } else {
            indicatif::ProgressBar::hidden()
        };
        pb.set_style(style("{spinner:.cyan} {msg}").tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));

        Self { pb }
    }

    /// Report progress after a page has loaded
    pub fn page_loaded(&self, page: u32, total_items: usize) {
        self.pb
            .set_message(format!("Loaded page {} ({} articles)", page, total_items));
    }

    pub fn finish_with_success(&self, msg: &str) {
        self.pb.set_style(style("{spinner:.green} {msg}").tick_chars("✓"));
        self.pb.finish_with_message(msg.to_string());
    }

    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(style("{spinner:.red} {msg}").tick_chars("✗"));
        self.pb.finish_with_message(msg.to_string());
    }
}
