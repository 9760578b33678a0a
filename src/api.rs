//! HTTP client for the risk backend.
//!
//! Every response body goes through an explicit decode and validate step so
//! that a malformed payload becomes a [`DecodeError`] instead of bad rows.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::error::{DashboardError, DecodeError};
use crate::models::{Module, Registration, StudentDetail, StudentRecord, TokenResponse};
use crate::session::AuthContext;

const USER_AGENT: &str = concat!("risk-dashboard/", env!("CARGO_PKG_VERSION"));

/// Reads the dashboard needs; implemented by [`ApiClient`] and by test fakes.
pub trait StudentApi {
    async fn fetch_students(&self, auth: &AuthContext) -> Result<Vec<StudentRecord>, DashboardError>;

    async fn fetch_modules(&self, auth: &AuthContext) -> Result<Vec<Module>, DashboardError>;

    async fn fetch_student(
        &self,
        auth: &AuthContext,
        student_id: i64,
    ) -> Result<StudentDetail, DashboardError>;
}

#[derive(Debug, Clone)]
pub struct GradeUpload {
    pub module_code: String,
    pub progress_in_semester: f64,
    pub file_name: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    upload_requires_auth: bool,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, DashboardError> {
        let base = Url::parse(&config.api_url).map_err(|error| {
            DashboardError::validation(format!("invalid api url '{}': {error}", config.api_url))
        })?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base,
            upload_requires_auth: config.upload_requires_auth,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, DashboardError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::validation("api url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, label: &str) -> Result<String, DashboardError> {
        tracing::debug!(request = label, "sending");
        let response = request.send().await.map_err(|error| {
            tracing::warn!(request = label, %error, "transport failure");
            DashboardError::NetworkFailure(format!("{label}: {error}"))
        })?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(request = label, status = status.as_u16(), "response");
        check_status(status, label)?;
        Ok(body)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, DashboardError> {
        let request = self
            .client
            .post(self.endpoint(&["login"])?)
            .form(&[("username", email), ("password", password)]);

        let response = request
            .send()
            .await
            .map_err(|error| DashboardError::NetworkFailure(format!("POST /login: {error}")))?;
        login_status(response.status())?;
        let body = response.text().await?;
        Ok(decode_body::<TokenResponse>(&body)?.access_token)
    }

    pub async fn register(&self, registration: &Registration) -> Result<(), DashboardError> {
        let request = self
            .client
            .post(self.endpoint(&["register"])?)
            .json(registration);

        let response = request
            .send()
            .await
            .map_err(|error| DashboardError::NetworkFailure(format!("POST /register: {error}")))?;
        register_status(response.status())
    }

    pub async fn create_module(
        &self,
        auth: &AuthContext,
        module: &Module,
    ) -> Result<(), DashboardError> {
        let request = self
            .client
            .post(self.endpoint(&["modules"])?)
            .header(reqwest::header::AUTHORIZATION, auth.bearer())
            .json(module);
        self.send(request, "POST /modules").await.map(|_| ())
    }

    pub async fn update_module(
        &self,
        auth: &AuthContext,
        module: &Module,
    ) -> Result<(), DashboardError> {
        let request = self
            .client
            .put(self.endpoint(&["modules", &module.module_code])?)
            .header(reqwest::header::AUTHORIZATION, auth.bearer())
            .json(module);
        self.send(request, "PUT /modules/{code}").await.map(|_| ())
    }

    pub async fn delete_module(
        &self,
        auth: &AuthContext,
        module_code: &str,
    ) -> Result<(), DashboardError> {
        let request = self
            .client
            .delete(self.endpoint(&["modules", module_code])?)
            .header(reqwest::header::AUTHORIZATION, auth.bearer());
        self.send(request, "DELETE /modules/{code}").await.map(|_| ())
    }

    /// The bearer token is attached only when uploads are configured to require it.
    fn upload_request(
        &self,
        auth: Option<&AuthContext>,
        upload: GradeUpload,
    ) -> Result<RequestBuilder, DashboardError> {
        let part = Part::bytes(upload.contents)
            .file_name(upload.file_name)
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let mut request = self
            .client
            .post(self.endpoint(&["students", &upload.module_code, "grades"])?)
            .query(&[(
                "progress_in_semester",
                format!("{:.2}", upload.progress_in_semester),
            )])
            .multipart(form);

        if self.upload_requires_auth {
            let auth = auth.ok_or(DashboardError::SessionExpired)?;
            request = request.header(reqwest::header::AUTHORIZATION, auth.bearer());
        }
        Ok(request)
    }

    pub async fn upload_grades(
        &self,
        auth: Option<&AuthContext>,
        upload: GradeUpload,
    ) -> Result<(), DashboardError> {
        let request = self.upload_request(auth, upload)?;
        self.send(request, "POST /students/{module}/grades")
            .await
            .map(|_| ())
    }
}

impl StudentApi for ApiClient {
    async fn fetch_students(&self, auth: &AuthContext) -> Result<Vec<StudentRecord>, DashboardError> {
        let request = self
            .client
            .get(self.endpoint(&["students"])?)
            .header(reqwest::header::AUTHORIZATION, auth.bearer());
        let body = self.send(request, "GET /students").await?;
        Ok(decode_students(&body)?)
    }

    async fn fetch_modules(&self, auth: &AuthContext) -> Result<Vec<Module>, DashboardError> {
        let request = self
            .client
            .get(self.endpoint(&["modules"])?)
            .header(reqwest::header::AUTHORIZATION, auth.bearer());
        let body = self.send(request, "GET /modules").await?;
        Ok(decode_modules(&body)?)
    }

    async fn fetch_student(
        &self,
        auth: &AuthContext,
        student_id: i64,
    ) -> Result<StudentDetail, DashboardError> {
        let id = student_id.to_string();
        let request = self
            .client
            .get(self.endpoint(&["students", &id])?)
            .header(reqwest::header::AUTHORIZATION, auth.bearer());
        let body = self.send(request, "GET /students/{id}").await?;
        Ok(decode_student_detail(&body)?)
    }
}

pub fn check_status(status: StatusCode, label: &str) -> Result<(), DashboardError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(DashboardError::SessionExpired);
    }
    if !status.is_success() {
        return Err(DashboardError::NetworkFailure(format!(
            "{label} returned {status}"
        )));
    }
    Ok(())
}

/// Any 4xx from `/login` is a credential problem, not an expired session.
pub fn login_status(status: StatusCode) -> Result<(), DashboardError> {
    if status.is_client_error() {
        tracing::info!(status = status.as_u16(), "login rejected");
        return Err(DashboardError::validation(
            "Login failed. Please check your credentials and try again.",
        ));
    }
    check_status(status, "POST /login")
}

/// The backend answers 400 when the email is already registered.
pub fn register_status(status: StatusCode) -> Result<(), DashboardError> {
    if status == StatusCode::BAD_REQUEST {
        return Err(DashboardError::ConflictFailure(
            "An account with this email already exists.".to_string(),
        ));
    }
    check_status(status, "POST /register")
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, DecodeError> {
    serde_json::from_str(body).map_err(|error| DecodeError::Body(error.to_string()))
}

fn field_error(index: usize, reason: impl Into<String>) -> DecodeError {
    DecodeError::Field {
        index,
        reason: reason.into(),
    }
}

pub fn decode_students(body: &str) -> Result<Vec<StudentRecord>, DecodeError> {
    let records: Vec<StudentRecord> = decode_body(body)?;
    for (index, record) in records.iter().enumerate() {
        if !record.risk_score.is_finite() {
            return Err(field_error(index, "risk_score is not a finite number"));
        }
        if record.module.trim().is_empty() {
            return Err(field_error(index, "module is empty"));
        }
    }
    Ok(records)
}

pub fn decode_modules(body: &str) -> Result<Vec<Module>, DecodeError> {
    let modules: Vec<Module> = decode_body(body)?;
    for (index, module) in modules.iter().enumerate() {
        if module.module_code.trim().is_empty() {
            return Err(field_error(index, "module_code is empty"));
        }
    }
    Ok(modules)
}

pub fn decode_student_detail(body: &str) -> Result<StudentDetail, DecodeError> {
    let detail: StudentDetail = decode_body(body)?;
    let student = &detail.student;
    if !student.risk_score.is_finite() || !student.performance_trend.is_finite() {
        return Err(DecodeError::Body(
            "student summary carries a non-finite number".to_string(),
        ));
    }
    for (index, grade) in detail.grades.iter().enumerate() {
        if grade.assessment_number < 1 {
            return Err(field_error(index, "assessment_number must be at least 1"));
        }
        if !grade.score.is_finite() {
            return Err(field_error(index, "score is not a finite number"));
        }
        if !(0.0..=1.0).contains(&grade.progress_in_semester) {
            return Err(field_error(index, "progress_in_semester outside 0..1"));
        }
    }
    Ok(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_roster_payload() {
        let body = r#"[
            {"student_id": 1, "student_name": "Ann", "module": "CS161", "risk_score": 85.0},
            {"student_id": 2, "student_name": "Bo", "module": "CS161", "risk_score": 120}
        ]"#;
        let records = decode_students(body).expect("valid roster");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].risk_score, 120.0);
    }

    #[test]
    fn missing_field_is_a_decode_error() {
        let body = r#"[{"student_id": 1, "student_name": "Ann", "module": "CS161"}]"#;
        assert!(matches!(decode_students(body), Err(DecodeError::Body(_))));
    }

    #[test]
    fn wrong_type_is_a_decode_error() {
        let body = r#"[{"student_id": "one", "student_name": "Ann", "module": "CS161", "risk_score": 5}]"#;
        assert!(matches!(decode_students(body), Err(DecodeError::Body(_))));
    }

    #[test]
    fn empty_module_is_rejected() {
        let body = r#"[{"student_id": 1, "student_name": "Ann", "module": " ", "risk_score": 5}]"#;
        assert_eq!(
            decode_students(body),
            Err(DecodeError::Field {
                index: 0,
                reason: "module is empty".to_string()
            })
        );
    }

    #[test]
    fn decodes_student_detail() {
        let body = r#"{
            "student": {
                "student_id": 3, "student_name": "Cy", "module": "CS162",
                "average_score": 55.0, "assessments_completed": 3,
                "performance_trend": 15.0, "max_consecutive_misses": 0,
                "progress_in_semester": 0.75, "risk_score": 15.0
            },
            "grades": [
                {"assessment_number": 3, "score": 70, "progress_in_semester": 0.75},
                {"assessment_number": 1, "score": 40, "progress_in_semester": 0.25}
            ]
        }"#;
        let detail = decode_student_detail(body).expect("valid detail");
        assert_eq!(detail.student.student_name, "Cy");
        assert_eq!(detail.grades.len(), 2);
    }

    #[test]
    fn rejects_zero_assessment_number() {
        let body = r#"{
            "student": {
                "student_id": 3, "student_name": "Cy", "module": "CS162",
                "average_score": 55.0, "assessments_completed": 1,
                "performance_trend": 0.0, "max_consecutive_misses": 0,
                "progress_in_semester": 0.25, "risk_score": 15.0
            },
            "grades": [{"assessment_number": 0, "score": 40, "progress_in_semester": 0.25}]
        }"#;
        assert!(matches!(
            decode_student_detail(body),
            Err(DecodeError::Field { index: 0, .. })
        ));
    }

    #[test]
    fn maps_status_codes_to_taxonomy() {
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, "GET /students"),
            Err(DashboardError::SessionExpired)
        ));
        assert!(matches!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR, "GET /students"),
            Err(DashboardError::NetworkFailure(_))
        ));
        assert!(check_status(StatusCode::OK, "GET /students").is_ok());
    }

    #[test]
    fn login_rejection_is_a_validation_failure() {
        for status in [StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            match login_status(status) {
                Err(DashboardError::ValidationFailure(message)) => assert_eq!(
                    message,
                    "Login failed. Please check your credentials and try again."
                ),
                other => panic!("expected validation failure for {status}, got {other:?}"),
            }
        }
        assert!(matches!(
            login_status(StatusCode::BAD_GATEWAY),
            Err(DashboardError::NetworkFailure(_))
        ));
        assert!(login_status(StatusCode::OK).is_ok());
    }

    #[test]
    fn duplicate_registration_is_a_conflict() {
        match register_status(StatusCode::BAD_REQUEST) {
            Err(DashboardError::ConflictFailure(message)) => {
                assert_eq!(message, "An account with this email already exists.")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert!(matches!(
            register_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(DashboardError::NetworkFailure(_))
        ));
        assert!(register_status(StatusCode::CREATED).is_ok());
    }

    fn upload() -> GradeUpload {
        GradeUpload {
            module_code: "CS161".to_string(),
            progress_in_semester: 0.25,
            file_name: "cs161.csv".to_string(),
            contents: b"student_id,score\n1,40\n".to_vec(),
        }
    }

    fn auth() -> AuthContext {
        AuthContext {
            token: "abc123".to_string(),
            email: "lecturer@uni.edu".to_string(),
            generation: 1,
        }
    }

    fn client(upload_requires_auth: bool) -> ApiClient {
        ApiClient::new(&AppConfig {
            upload_requires_auth,
            ..AppConfig::default()
        })
        .expect("client")
    }

    #[test]
    fn upload_omits_bearer_unless_configured() {
        let auth = auth();
        let request = client(false)
            .upload_request(Some(&auth), upload())
            .expect("request")
            .build()
            .expect("built");
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8000/students/CS161/grades?progress_in_semester=0.25"
        );
    }

    #[test]
    fn upload_sends_bearer_when_configured() {
        let auth = auth();
        let request = client(true)
            .upload_request(Some(&auth), upload())
            .expect("request")
            .build()
            .expect("built");
        assert_eq!(
            request
                .headers()
                .get(reqwest::header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok()),
            Some("Bearer abc123")
        );
    }

    #[test]
    fn upload_requiring_auth_without_session_expires() {
        assert!(matches!(
            client(true).upload_request(None, upload()),
            Err(DashboardError::SessionExpired)
        ));
    }

    #[test]
    fn endpoints_append_to_base_path() {
        let config = AppConfig {
            api_url: "http://localhost:8000/api".to_string(),
            ..AppConfig::default()
        };
        let client = ApiClient::new(&config).expect("client");
        let url = client
            .endpoint(&["students", "CS 161", "grades"])
            .expect("url");
        assert_eq!(url.as_str(), "http://localhost:8000/api/students/CS%20161/grades");
    }
}
