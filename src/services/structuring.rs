// src/services/structuring.rs

//! Structuring engine: unstructured posting content in, [`StructuredPosting`] out.
//!
//! The completion backend is told the exact schema and business rules, and
//! its answer goes through an explicit decode step:
//!
//! 1. locate the JSON object (inside a markdown fence if there is one)
//! 2. parse it ([`ExtractionError::MalformedJson`] on failure)
//! 3. decode it into the schema ([`ExtractionError::SchemaViolation`])
//! 4. normalize skills, then check bounds ([`ExtractionError::SchemaViolation`])

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{ExtractionError, Result};
use crate::models::{MAX_SKILLS, MIN_SKILLS, StructuredPosting};
use crate::services::ai::CompletionBackend;

/// Turns posting content into [`StructuredPosting`]s through a completion backend.
#[derive(Clone)]
pub struct StructuringEngine {
    backend: Arc<dyn CompletionBackend>,
}

impl StructuringEngine {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Structure one document. `now` anchors the remaining-days computation.
    pub async fn structure(&self, input: &Value, now: DateTime<Utc>) -> Result<StructuredPosting> {
        let system = instructions(now);
        let user = format!(
            "Generate structured data for this object: {}",
            serde_json::to_string(input)?
        );
        let raw = self.backend.complete(&system, &user).await?;
        Ok(decode_response(&raw)?)
    }
}

/// System instruction naming the schema and the extraction rules.
pub fn instructions(now: DateTime<Utc>) -> String {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        r#"You are an HR assistant that converts unstructured job data into one structured JSON object.
The object must have exactly these fields:

{{
  "position": string,
  "company": string,
  "remainingDays": integer (days from the current time until the closing date),
  "gender": "male" | "female" | "any",
  "locations": "any" | string[] (province or city names),
  "summary": string (three line summary of the job description),
  "duration": "unspecified" | string,
  "educationDegree": "bachelor" | "master" | "12grade" | "any",
  "educationFields": string[] (e.g. "computer science", "software engineering"),
  "experienceYears": string ("0" when no experience is required, otherwise e.g. "2 years" or "1-3 years"),
  "englishRequired": boolean (true only when English is clearly required),
  "skillsRequired": string[] (required skills as lowercase snake_case tokens),
  "skillsOptional": string[] (optional skills as lowercase snake_case tokens)
}}

Rules:
- Skills must be concrete competencies that can be learned, like mysql, react or frontend_design.
- Leave out soft skills such as teamwork, communication, presentation or problem solving.
- Each skill list holds at least {MIN_SKILLS} and at most {MAX_SKILLS} of the most important items.
- Any required languages field in the input is unreliable. Detect language requirements from the description text.
- Return only the JSON object, with no text before or after it.

Current time: {timestamp}"#
    )
}

/// Decode a completion response into a validated posting.
pub fn decode_response(raw: &str) -> std::result::Result<StructuredPosting, ExtractionError> {
    let object = locate_object(raw).ok_or(ExtractionError::NoJsonObject)?;
    let value: Value = serde_json::from_str(object)
        .map_err(|e| ExtractionError::MalformedJson(e.to_string()))?;
    let mut posting: StructuredPosting = serde_json::from_value(value)
        .map_err(|e| ExtractionError::SchemaViolation(e.to_string()))?;

    posting.normalize();
    posting
        .validate()
        .map_err(ExtractionError::SchemaViolation)?;
    Ok(posting)
}

/// The outermost `{ ... }` span, looked for inside a code fence first and
/// then in the whole response.
fn locate_object(raw: &str) -> Option<&str> {
    fenced_body(raw)
        .and_then(object_span)
        .or_else(|| object_span(raw))
}

fn object_span(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

fn fenced_body(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after = raw[open + 3..].trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    match after.find("```") {
        Some(close) => Some(&after[..close]),
        None => Some(after),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{EducationDegree, Gender, Locations};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    const POSTING: &str = r#"{
        "position": "Backend Developer",
        "company": "Acme",
        "remainingDays": 12,
        "gender": "any",
        "locations": ["Kabul"],
        "summary": "Builds APIs.",
        "duration": "1 year",
        "educationDegree": "bachelor",
        "educationFields": ["Computer Science"],
        "experienceYears": "2 years",
        "englishRequired": true,
        "skillsRequired": ["Rust", "PostgreSQL"],
        "skillsOptional": ["Docker", "Kubernetes"]
    }"#;

    struct FixedBackend {
        answer: String,
        prompts: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        async fn complete(&self, system: &str, user: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            Ok(self.answer.clone())
        }
    }

    #[test]
    fn test_decode_plain_object() {
        let posting = decode_response(POSTING).unwrap();
        assert_eq!(posting.position, "Backend Developer");
        assert_eq!(posting.gender, Gender::Any);
        assert_eq!(posting.education_degree, EducationDegree::Bachelor);
        assert_eq!(posting.locations, Locations::Named(vec!["Kabul".into()]));
        assert_eq!(posting.skills_required, vec!["rust", "postgresql"]);
    }

    #[test]
    fn test_decode_fenced_object() {
        let fenced = format!("```json\n{POSTING}\n```");
        assert!(decode_response(&fenced).is_ok());

        let bare = format!("Here you go:\n```\n{POSTING}\n```\nThanks");
        assert!(decode_response(&bare).is_ok());
    }

    #[test]
    fn test_decode_object_outside_fence() {
        let raw = format!("```text\nsee below\n```\n{POSTING}");
        let posting = decode_response(&raw).unwrap();
        assert_eq!(posting.position, "Backend Developer");
    }

    #[test]
    fn test_decode_without_object() {
        assert_eq!(
            decode_response("I cannot help with that."),
            Err(ExtractionError::NoJsonObject)
        );
    }

    #[test]
    fn test_decode_malformed_json() {
        let err = decode_response(r#"{"position": "Dev", }"#).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedJson(_)));
    }

    #[test]
    fn test_missing_skills_required_is_schema_violation() {
        let mut value: Value = serde_json::from_str(POSTING).unwrap();
        value.as_object_mut().unwrap().remove("skillsRequired");
        let err = decode_response(&value.to_string()).unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)));
    }

    #[test]
    fn test_skill_bounds_are_enforced() {
        let mut value: Value = serde_json::from_str(POSTING).unwrap();
        value["skillsRequired"] = serde_json::json!(["rust"]);
        let err = decode_response(&value.to_string()).unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(ref m) if m.contains("skillsRequired")));

        value["skillsRequired"] = serde_json::json!([
            "a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8", "a9"
        ]);
        assert!(matches!(
            decode_response(&value.to_string()),
            Err(ExtractionError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_duplicates_collapse_before_bounds_check() {
        let mut value: Value = serde_json::from_str(POSTING).unwrap();
        value["skillsRequired"] = serde_json::json!(["MySQL", "mysql"]);
        assert!(matches!(
            decode_response(&value.to_string()),
            Err(ExtractionError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_instructions_carry_timestamp_and_bounds() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap();
        let text = instructions(now);
        assert!(text.contains("Current time: 2026-10-16T08:30:00Z"));
        assert!(text.contains("at least 2 and at most 8"));
        assert!(text.contains("\"skillsRequired\""));
    }

    #[tokio::test]
    async fn test_structure_sends_document() {
        let backend = Arc::new(FixedBackend {
            answer: format!("```json\n{POSTING}\n```"),
            prompts: Mutex::new(Vec::new()),
        });
        let engine = StructuringEngine::new(backend.clone());

        let input = serde_json::json!({ "title": "Backend Developer" });
        let posting = engine.structure(&input, Utc::now()).await.unwrap();
        assert_eq!(posting.company, "Acme");

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].1.ends_with(r#"{"title":"Backend Developer"}"#));
    }

    #[tokio::test]
    async fn test_structure_reports_extraction_error() {
        let backend = Arc::new(FixedBackend {
            answer: "no json".into(),
            prompts: Mutex::new(Vec::new()),
        });
        let engine = StructuringEngine::new(backend);

        let err = engine
            .structure(&serde_json::json!({}), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::NoJsonObject)
        ));
    }
}
