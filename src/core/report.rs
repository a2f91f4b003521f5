//! Operator-facing result output.

use crate::core::error::ItemFailure;
use crate::core::lifecycle::InitReport;
use crate::core::record_store::StoreOutcome;
use crate::core::tui::{self, BoxStyle, ItemStatus};
use crate::core::validate::Validation;

const MAX_REASON_CHARS: usize = 120;

fn print_lines(title: &str, lines: &[String], status: ItemStatus) {
    tui::print_section(title);
    for line in lines {
        tui::print_status_line(line, status);
    }
}

pub fn print_failures(failures: &[ItemFailure]) {
    for failure in failures {
        tui::print_status_line(
            &tui::compact_line(&failure.to_string(), MAX_REASON_CHARS),
            ItemStatus::Failed,
        );
    }
}

pub fn print_store_outcome(title: &str, collection: &str, outcome: &StoreOutcome) {
    tui::print_section(title);
    if outcome.stored.is_empty() && outcome.failures.is_empty() {
        tui::print_status_line(&format!("{}: nothing stored", collection), ItemStatus::Skipped);
    }
    for id in &outcome.stored {
        tui::print_status_line(&format!("{}/{}", collection, id), ItemStatus::Created);
    }
    print_failures(&outcome.failures);
}

pub fn print_validation(validation: &Validation) {
    tui::print_section("Validation");
    for message in &validation.messages {
        let status = if message.contains('✗') || message.starts_with('❌') {
            ItemStatus::Fail
        } else if message.contains('✓') || message.starts_with('✅') {
            ItemStatus::Pass
        } else {
            ItemStatus::Info
        };
        tui::print_status_line(message, status);
    }
}

/// Prints every section the branch produced, in a fixed order.
pub fn print_init_report(report: &InitReport) {
    if let Some(ids) = &report.generated_ids {
        print_lines("Generated ids", ids, ItemStatus::Info);
    }
    if let Some(records) = &report.records {
        print_store_outcome("Records", "vault", records);
    }
    if let Some(writes) = &report.id_writes {
        print_lines("Id markers", writes, ItemStatus::Created);
    }
    if let Some(backup) = &report.backup {
        print_lines(
            "Backup",
            &[format!("Snapshot {}", backup.display())],
            ItemStatus::Info,
        );
    }
    if let Some(dirs) = &report.init_dirs {
        print_lines("Directories", dirs, ItemStatus::Created);
    }
    if let Some(copied) = &report.copy_assets {
        tui::print_section("Assets");
        for line in copied {
            let status = if line.contains("(0 written") {
                ItemStatus::Unchanged
            } else {
                ItemStatus::Created
            };
            tui::print_status_line(line, status);
        }
    }
    if let Some(root) = &report.generate_root {
        print_store_outcome("Root", "tbc", root);
    }
    if let Some(restores) = &report.restores {
        print_lines("Restore", restores, ItemStatus::Info);
    }
    if let Some(validation) = &report.validation {
        print_validation(validation);
        println!();
        if validation.is_valid_root {
            tui::render_box("TBC ROOT READY", "", BoxStyle::Success);
        } else {
            tui::render_box("TBC ROOT INVALID", "", BoxStyle::Warning);
        }
    }
}

pub fn print_error(message: &str) {
    use colored::Colorize;
    eprintln!("{} {}", "Error:".bright_red().bold(), message);
}

pub fn print_plain(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

pub fn print_info_box(title: &str, subtitle: &str) {
    tui::render_box(title, subtitle, BoxStyle::Info);
}
