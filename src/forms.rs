use std::path::Path;

use crate::api::GradeUpload;
use crate::error::DashboardError;
use crate::models::{Module, Registration};

pub const SEMESTER_WEEKS: u32 = 12;
pub const MAX_ASSESSMENTS: u32 = 50;

fn required(value: &str, message: &str) -> Result<String, DashboardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::validation(message));
    }
    Ok(trimmed.to_string())
}

pub fn registration(
    name: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<Registration, DashboardError> {
    let lecturer_name = required(name, "Please input your Name!")?;
    let email = required(email, "Please input your Email!")?;
    if password.is_empty() {
        return Err(DashboardError::validation("Please input your Password!"));
    }
    if confirm.is_empty() {
        return Err(DashboardError::validation("Please confirm your password!"));
    }
    if password != confirm {
        return Err(DashboardError::validation(
            "The new password that you entered do not match!",
        ));
    }
    Ok(Registration {
        email,
        password: password.to_string(),
        lecturer_name,
    })
}

pub fn module(code: &str, name: &str, assessment_count: u32) -> Result<Module, DashboardError> {
    let module_code = required(code, "Module Code is required")?;
    let module_name = required(name, "Module Name is required")?;
    if !(1..=MAX_ASSESSMENTS).contains(&assessment_count) {
        return Err(DashboardError::validation(format!(
            "Number of Assessments must be between 1 and {MAX_ASSESSMENTS}"
        )));
    }
    Ok(Module {
        module_code,
        module_name,
        assessment_count,
    })
}

/// Semester progress for a teaching week, rounded to two decimals.
pub fn progress_for_week(week: u32) -> Result<f64, DashboardError> {
    if !(1..=SEMESTER_WEEKS).contains(&week) {
        return Err(DashboardError::validation(format!(
            "week must be between 1 and {SEMESTER_WEEKS}"
        )));
    }
    let progress = week as f64 / SEMESTER_WEEKS as f64;
    Ok((progress * 100.0).round() / 100.0)
}

/// Number of data rows, after checking the file has a header and parses as CSV.
pub fn check_grades_csv(contents: &[u8]) -> Result<usize, DashboardError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents);
    let headers = reader
        .headers()
        .map_err(|error| DashboardError::validation(format!("CSV file is unreadable: {error}")))?;
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(DashboardError::validation("CSV file has no header row"));
    }

    let mut rows = 0usize;
    for result in reader.records() {
        result.map_err(|error| DashboardError::validation(format!("CSV file is malformed: {error}")))?;
        rows += 1;
    }
    Ok(rows)
}

pub fn grade_upload(
    module_code: Option<&str>,
    week: u32,
    file: Option<&Path>,
) -> Result<GradeUpload, DashboardError> {
    let module_code = required(module_code.unwrap_or_default(), "Please select a module")?;
    let progress_in_semester = progress_for_week(week)?;
    let path = file.ok_or_else(|| DashboardError::validation("Please upload a CSV file."))?;

    let contents = std::fs::read(path).map_err(|error| {
        DashboardError::validation(format!("Please upload a CSV file. ({}: {error})", path.display()))
    })?;
    if contents.is_empty() {
        return Err(DashboardError::validation("Please upload a CSV file."));
    }
    let rows = check_grades_csv(&contents)?;
    tracing::debug!(rows, module = %module_code, "grades file checked");

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("grades.csv")
        .to_string();

    Ok(GradeUpload {
        module_code,
        progress_in_semester,
        file_name,
        contents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_validation(result: Result<impl std::fmt::Debug, DashboardError>, expected: &str) {
        match result {
            Err(DashboardError::ValidationFailure(message)) => assert_eq!(message, expected),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn registration_requires_matching_passwords() {
        assert_validation(
            registration("Dr Quinn", "q@uni.edu", "secret", "secrat"),
            "The new password that you entered do not match!",
        );
        let ok = registration(" Dr Quinn ", "q@uni.edu", "secret", "secret").expect("valid");
        assert_eq!(ok.lecturer_name, "Dr Quinn");
    }

    #[test]
    fn registration_requires_every_field() {
        assert_validation(
            registration("", "q@uni.edu", "secret", "secret"),
            "Please input your Name!",
        );
        assert_validation(
            registration("Dr Quinn", "  ", "secret", "secret"),
            "Please input your Email!",
        );
    }

    #[test]
    fn module_assessment_count_is_bounded() {
        assert!(module("CS161", "Intro", 0).is_err());
        assert!(module("CS161", "Intro", 51).is_err());
        assert_eq!(module("CS161", "Intro", 50).expect("valid").assessment_count, 50);
        assert_validation(module("", "Intro", 3), "Module Code is required");
    }

    #[test]
    fn week_maps_to_two_decimal_progress() {
        assert_eq!(progress_for_week(3).expect("valid"), 0.25);
        assert_eq!(progress_for_week(4).expect("valid"), 0.33);
        assert_eq!(progress_for_week(12).expect("valid"), 1.0);
        assert!(progress_for_week(0).is_err());
        assert!(progress_for_week(13).is_err());
    }

    #[test]
    fn upload_aborts_without_module_or_file() {
        assert_validation(grade_upload(None, 3, None), "Please select a module");
        assert_validation(grade_upload(Some("CS161"), 3, None), "Please upload a CSV file.");
    }

    #[test]
    fn csv_check_counts_rows() {
        let body = b"student_id,student_name,assessment_1\n1,Ann,55\n2,Bo,71\n";
        assert_eq!(check_grades_csv(body).expect("valid"), 2);
    }

    #[test]
    fn csv_check_rejects_ragged_rows() {
        let body = b"student_id,student_name\n1,Ann,55\n";
        assert!(check_grades_csv(body).is_err());
    }

    #[test]
    fn upload_reads_file_from_disk() {
        let dir = std::env::temp_dir().join(format!("risk-dashboard-upload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("cs161.csv");
        std::fs::write(&path, "student_id,score\n1,40\n").expect("write");

        let upload = grade_upload(Some("CS161"), 6, Some(&path)).expect("valid upload");
        assert_eq!(upload.file_name, "cs161.csv");
        assert_eq!(upload.progress_in_semester, 0.5);
        assert_eq!(upload.module_code, "CS161");
    }
}
