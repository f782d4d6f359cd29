//! Scan report rendering.

use colored::Colorize;

use crate::finding::{Severity, ValidatedFinding};
use crate::redact::mask_labeled;
use crate::scan::ScanReport;
use crate::scoring::RiskLevel;

pub trait Reporter {
    fn report(&self, report: &ScanReport) -> String;
}

pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for JsonReporter {
    fn report(&self, report: &ScanReport) -> String {
        serde_json::to_string_pretty(report)
            .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize report: {}"}}"#, e))
    }
}

pub struct TerminalReporter {
    verbose: bool,
}

impl TerminalReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn severity_label(&self, severity: Severity) -> colored::ColoredString {
        let label = format!("[{}]", severity);
        match severity {
            Severity::Critical => label.red().bold(),
            Severity::High => label.yellow().bold(),
            Severity::Medium => label.cyan(),
            Severity::Low => label.white(),
        }
    }

    fn risk_level_label(&self, level: RiskLevel) -> colored::ColoredString {
        let label = level.as_str();
        match level {
            RiskLevel::Safe => label.green().bold(),
            RiskLevel::Low => label.white(),
            RiskLevel::Medium => label.cyan().bold(),
            RiskLevel::High => label.yellow().bold(),
            RiskLevel::Critical => label.red().bold(),
        }
    }

    fn format_finding(&self, finding: &ValidatedFinding) -> String {
        let masked: Vec<String> = finding
            .matched_identifiers
            .iter()
            .map(|id| mask_labeled(&id.id_type, &id.value))
            .collect();
        let mut line = format!(
            "  {} {:<13} {:<24} {}\n",
            self.severity_label(finding.resolved_severity()),
            finding.category().as_str(),
            finding.source_name,
            masked.join(", ")
        );
        if self.verbose {
            if let Some(url) = &finding.source_url {
                line.push_str(&format!("      {} {}\n", "url:".dimmed(), url));
            }
            line.push_str(&format!(
                "      {} {}\n",
                "id:".dimmed(),
                finding.id.as_str()
            ));
        }
        line
    }
}

/// Visual 10-char bar for a 0-100 score.
fn score_bar(score: u8) -> String {
    let filled = ((f64::from(score) / 100.0) * 10.0).round() as usize;
    let filled = filled.min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

impl Reporter for TerminalReporter {
    fn report(&self, report: &ScanReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n",
            format!("━━━ Scan report: {} ━━━", report.profile_id)
                .bold()
        ));
        output.push_str(&format!(
            "Identifiers: {}   Candidates: {}   Accepted: {}   Rejected: {}   Failures: {}\n\n",
            report.identifiers_scanned,
            report.candidates_seen,
            report.accepted,
            report.rejected,
            report.lookup_failures
        ));

        if report.findings.is_empty() {
            output.push_str(&format!("{}\n", "No new findings.".green()));
        } else {
            output.push_str(&format!("{}\n", "New findings:".bold()));
            for finding in &report.findings {
                output.push_str(&self.format_finding(finding));
            }
        }

        output.push_str(&format!(
            "\nOverall risk: {}/100 {} {}\n",
            report.risk.overall,
            score_bar(report.risk.overall),
            self.risk_level_label(report.risk.level)
        ));
        output.push_str(&format!(
            "Critical: {}   High: {}   Total findings: {}\n",
            report.risk.critical_count, report.risk.high_count, report.risk.total_findings
        ));
        for category in &report.risk.by_category {
            output.push_str(&format!(
                "  {:<13} {:>3}  ({} finding{})\n",
                category.category,
                category.score,
                category.findings_count,
                if category.findings_count == 1 { "" } else { "s" }
            ));
        }

        output.push_str(&format!("\nCompleted in {} ms\n", report.elapsed_ms));
        output
    }
}
