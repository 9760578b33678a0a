use std::fmt;

use serde::{Deserialize, Serialize};

/// One student/module risk row as the server sends it from `/students`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentRecord {
    pub student_id: i64,
    pub student_name: String,
    pub module: String,
    pub risk_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    AtRisk,
    NewlyAtRisk,
    Improving,
    OnTrack,
}

impl StatusCategory {
    pub const ALL: [StatusCategory; 4] = [
        StatusCategory::AtRisk,
        StatusCategory::NewlyAtRisk,
        StatusCategory::Improving,
        StatusCategory::OnTrack,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatusCategory::AtRisk => "At Risk",
            StatusCategory::NewlyAtRisk => "Newly At Risk",
            StatusCategory::Improving => "Improving",
            StatusCategory::OnTrack => "On Track",
        }
    }

    /// Tag color used by the roster table.
    pub fn tag_color(self) -> &'static str {
        match self {
            StatusCategory::AtRisk => "volcano",
            StatusCategory::Improving => "green",
            StatusCategory::NewlyAtRisk | StatusCategory::OnTrack => "geekblue",
        }
    }

    pub fn parse(value: &str) -> Option<StatusCategory> {
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "atrisk" => Some(StatusCategory::AtRisk),
            "newlyatrisk" => Some(StatusCategory::NewlyAtRisk),
            "improving" => Some(StatusCategory::Improving),
            "ontrack" => Some(StatusCategory::OnTrack),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterRow {
    pub key: String,
    pub student_number: i64,
    pub full_name: String,
    pub module: String,
    pub risk_score: f64,
    pub status: StatusCategory,
}

/// Summary counters shown above the roster table. On Track is not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub at_risk_count: usize,
    pub newly_at_risk_count: usize,
    pub improving_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub module_code: String,
    pub module_name: String,
    pub assessment_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFilterOption {
    pub display_text: String,
    pub match_value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentSummary {
    pub student_id: i64,
    pub student_name: String,
    pub module: String,
    pub average_score: f64,
    pub assessments_completed: u32,
    pub performance_trend: f64,
    pub max_consecutive_misses: u32,
    pub progress_in_semester: f64,
    pub risk_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GradeSample {
    pub assessment_number: i64,
    pub score: f64,
    pub progress_in_semester: f64,
}

/// Payload of `/students/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentDetail {
    pub student: StudentSummary,
    pub grades: Vec<GradeSample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub lecturer_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}
