use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{Aggregate, Module, ModuleFilterOption, RosterRow, StatusCategory, StudentDetail};
use crate::risk;
use crate::roster;
use crate::trend;

pub fn render_aggregate(counts: &Aggregate) -> String {
    format!(
        "Students at Risk: {}  |  Newly At Risk: {}  |  Improving Students: {}",
        counts.at_risk_count, counts.newly_at_risk_count, counts.improving_count
    )
}

pub fn render_roster_table(rows: &[RosterRow]) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<16} {:<24} {:<10} {:>10}  {}",
        "Student Number", "Full Name", "Module", "Risk Score", "Status"
    );

    if rows.is_empty() {
        let _ = writeln!(output, "No students match the current view.");
        return output;
    }

    for row in rows {
        let _ = writeln!(
            output,
            "{:<16} {:<24} {:<10} {:>10.2}  {} ({})",
            row.student_number,
            row.full_name,
            row.module,
            row.risk_score,
            row.status.label().to_uppercase(),
            row.status.tag_color()
        );
    }
    output
}

pub fn render_module_options(options: &[ModuleFilterOption]) -> String {
    options
        .iter()
        .map(|option| option.display_text.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_modules(modules: &[Module]) -> String {
    let mut output = String::new();
    if modules.is_empty() {
        let _ = writeln!(output, "No modules yet.");
        return output;
    }
    let _ = writeln!(output, "{:<10} {:<32} {:>11}", "Code", "Name", "Assessments");
    for module in modules {
        let _ = writeln!(
            output,
            "{:<10} {:<32} {:>11}",
            module.module_code, module.module_name, module.assessment_count
        );
    }
    output
}

pub fn render_student_detail(detail: &StudentDetail) -> String {
    let student = &detail.student;
    let analysis = trend::analyze_detail(detail);
    let headline = risk::headline_color(student.risk_score);
    let mut output = String::new();

    let _ = writeln!(output, "{}", student.student_name);
    let _ = writeln!(
        output,
        "Student ID: {} | Module: {}",
        student.student_id, student.module
    );
    let _ = writeln!(
        output,
        "Current Risk Score: {:.1} / 100 ({})",
        student.risk_score,
        headline.name()
    );
    let _ = writeln!(
        output,
        "Average {:.1} over {} assessments, longest run of misses {}, semester {:.0}% complete",
        student.average_score,
        student.assessments_completed,
        student.max_consecutive_misses,
        student.progress_in_semester * 100.0
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "Performance Trajectory");
    if analysis.series.is_empty() {
        let _ = writeln!(output, "No grades recorded yet.");
    } else {
        let points: Vec<String> = analysis
            .series
            .iter()
            .map(|point| format!("#{}: {:.1}", point.x, point.y))
            .collect();
        let _ = writeln!(output, "{}", points.join("  ->  "));
    }
    let _ = writeln!(
        output,
        "Performance Trend: {} ({})",
        analysis.trend_label(),
        analysis.trend_color.name()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "Grade History");
    for line in trend::grade_lines(&detail.grades) {
        let marker = if line.danger { "  danger" } else { "" };
        let _ = writeln!(
            output,
            "Assessment #{:<4} {:>6.1}%{}",
            line.assessment_number, line.score, marker
        );
    }

    output
}

pub fn build_report(
    lecturer: &str,
    generated_at: DateTime<Utc>,
    rows: &[RosterRow],
    limit: usize,
) -> String {
    let counts = roster::aggregate(rows);
    let mix = roster::status_mix(rows);
    let modules = roster::module_counts(rows);

    let mut output = String::new();
    let _ = writeln!(output, "# Student Risk Report");
    let _ = writeln!(
        output,
        "Generated for {} at {}",
        lecturer,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Students at risk: {}", counts.at_risk_count);
    let _ = writeln!(output, "- Newly at risk: {}", counts.newly_at_risk_count);
    let _ = writeln!(output, "- Improving: {}", counts.improving_count);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");
    if rows.is_empty() {
        let _ = writeln!(output, "No students on the roster.");
    } else {
        for (status, count) in mix.iter() {
            let _ = writeln!(output, "- {}: {} rows", status, count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Modules");
    if modules.is_empty() {
        let _ = writeln!(output, "No modules on the roster.");
    } else {
        for (module, (total, at_risk)) in modules.iter() {
            let _ = writeln!(output, "- {}: {} students, {} at risk", module, total, at_risk);
        }
    }

    let mut highest: Vec<&RosterRow> = rows
        .iter()
        .filter(|row| row.status == StatusCategory::AtRisk)
        .collect();
    highest.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Students");

    if highest.is_empty() {
        let _ = writeln!(output, "No students currently at risk.");
    } else {
        for row in highest.iter().take(limit) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) risk score {:.2}",
                row.full_name, row.student_number, row.module, row.risk_score
            );
        }
    }

    output
}
