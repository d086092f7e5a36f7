//! CLI presentation: text and JSON formatting of run reports, users and artifacts.

use crate::batch::{RunOutcome, RunReport};
use crate::cli::output::to_json;
use crate::error::ApiError;
use crate::types::{ArtifactRecord, UserProfile};
use comfy_table::presets::{UTF8_BORDERS_ONLY, UTF8_FULL};
use comfy_table::{ContentArrangement, Table};
use owo_colors::OwoColorize;

const PREVIEW_CHARS: usize = 60;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_run_report(report: &RunReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(report);
    }
    Ok(format_run_report_text(report))
}

pub fn format_run_report_text(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Run Report")));
    out.push_str(&format!("  Run: {}\n", report.run_id));
    out.push_str(&format!("  Scope: {}\n", report.scope));
    out.push_str(&format!(
        "  Started: {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(ms) = report.duration_ms() {
        out.push_str(&format!("  Duration: {} ms\n", ms));
    }
    if report.cancelled {
        out.push_str(&format!("  {}\n", "Cancelled before completion".yellow()));
    }
    out.push('\n');

    let counts = report.counts;
    let mut summary = Table::new();
    summary.load_preset(UTF8_BORDERS_ONLY);
    summary.set_header(vec!["Total", "Succeeded", "Skipped", "Failed", "Success rate"]);
    summary.add_row(vec![
        counts.total.to_string(),
        counts.succeeded.to_string(),
        counts.skipped.to_string(),
        counts.failed.to_string(),
        format!("{:.1}%", report.success_rate()),
    ]);
    out.push_str(&format!("{}\n", summary));

    if report.outcomes.is_empty() {
        out.push_str("\nNo users to process.\n");
        return out;
    }

    out.push_str(&format!("\n{}\n\n", format_section_heading("Outcomes")));
    let mut outcomes: Vec<&RunOutcome> = report.outcomes.iter().collect();
    outcomes.sort_by(|a, b| a.user_id().cmp(b.user_id()));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["User", "Status", "Attempts", "Detail"]);
    for outcome in outcomes {
        let (status, attempts, detail) = match outcome {
            RunOutcome::Succeeded { result, attempts } => (
                format!("{}", "succeeded".green()),
                attempts.to_string(),
                preview(result.challenge_text.as_str()),
            ),
            RunOutcome::SkippedInvalidProfile { reason, .. } => (
                format!("{}", "skipped".yellow()),
                "-".to_string(),
                reason.clone(),
            ),
            RunOutcome::Failed {
                kind,
                message,
                attempts,
                ..
            } => (
                format!("{}", "failed".red()),
                attempts.to_string(),
                format!("{}: {}", kind, message),
            ),
        };
        table.add_row(vec![
            display_id(outcome.user_id()),
            status,
            attempts,
            detail,
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_users(users: &[UserProfile], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(&users);
    }
    if users.is_empty() {
        return Ok("No users registered.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["User", "Name", "Attributes"]);
    for user in users {
        table.add_row(vec![
            display_id(&user.user_id),
            user.display_name.clone(),
            user.attributes.len().to_string(),
        ]);
    }
    Ok(format!("{}\n{} user(s)", table, users.len()))
}

pub fn format_artifact(record: &ArtifactRecord, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(record);
    }
    Ok(format!(
        "{}\n\n  User: {}\n  Name: {}\n  Created: {}\n  Processed: {}\n\n{}",
        format_section_heading("Daily Challenge"),
        record.user_id,
        record.display_name,
        record.created_at.to_rfc3339(),
        record.processed_at.to_rfc3339(),
        record.challenge_text
    ))
}

pub fn format_artifacts(records: &[ArtifactRecord], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(&records);
    }
    if records.is_empty() {
        return Ok("No challenges stored.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["User", "Processed", "Challenge"]);
    for record in records {
        table.add_row(vec![
            display_id(&record.user_id),
            record.processed_at.format("%Y-%m-%d %H:%M").to_string(),
            preview(record.challenge_text.as_str()),
        ]);
    }
    Ok(table.to_string())
}

fn display_id(user_id: &str) -> String {
    if user_id.trim().is_empty() {
        "(empty)".to_string()
    } else {
        user_id.to_string()
    }
}

fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > PREVIEW_CHARS {
        let cut: String = first_line.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    } else {
        first_line.to_string()
    }
}
