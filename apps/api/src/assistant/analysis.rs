//! Job analysis. Scores a posting against the résumé and extracts its key facts.
//!
//! Flow: analysis_prompt → LlmClient::call (JSON mode) → decode → AnalysisOutcome.
//!
//! `analyze` is total. A provider error, or a response that is not a JSON object, yields
//! the fixed fallback record tagged `AnalysisStatus::Failed`, so callers need not compare
//! sentinels. A JSON object is always kept: absent or mistyped fields take their
//! defaults and are listed in `AnalysisStatus::Partial`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::assistant::prompts::{analysis_prompt, UNKNOWN};
use crate::assistant::ModelSelection;
use crate::llm_client::{strip_json_fences, LlmClient, ProviderRequest};

/// Title and company of the fallback record ("could not be analyzed").
pub const FAILED_TITLE: &str = "Analiz Edilemedi";
pub const FAILED_SUMMARY: &str = "Analysis failed";

/// The six facts extracted for one posting. Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    pub company: String,
    pub summary_tr: String,
    pub language_reqs: String,
    pub location: String,
    /// 0–100 by prompt contract. Not clamped here.
    pub score: i64,
}

impl AnalysisResult {
    /// The record returned whenever analysis fails.
    pub fn fallback() -> Self {
        Self {
            title: FAILED_TITLE.to_string(),
            company: FAILED_TITLE.to_string(),
            summary_tr: FAILED_SUMMARY.to_string(),
            language_reqs: UNKNOWN.to_string(),
            location: UNKNOWN.to_string(),
            score: 0,
        }
    }

    pub fn score_in_range(&self) -> bool {
        (0..=100).contains(&self.score)
    }
}

/// Why an analysis fell back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisFailure {
    /// Transport, auth or vendor-side error.
    Provider { message: String },
    /// Response text is not JSON at all.
    NotJson { message: String },
    /// Valid JSON, but not an object.
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisStatus {
    Complete,
    /// The object decoded, but some fields hold the persistence defaults: `missing`
    /// were absent or null, `wrong_type` had a JSON type that could not be used.
    Partial {
        missing: Vec<String>,
        wrong_type: Vec<String>,
    },
    Failed { reason: AnalysisFailure },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub status: AnalysisStatus,
}

impl AnalysisOutcome {
    fn failed(reason: AnalysisFailure) -> Self {
        Self {
            result: AnalysisResult::fallback(),
            status: AnalysisStatus::Failed { reason },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, AnalysisStatus::Failed { .. })
    }
}

/// Parameters for one analysis call.
#[derive(Debug)]
pub struct AnalysisRequest<'a> {
    pub job_description: &'a str,
    pub cv_text: &'a str,
    pub link: &'a str,
    pub selection: &'a ModelSelection,
}

/// Analyzes a job posting against the résumé. Never returns an error.
pub async fn analyze(llm: &LlmClient, request: AnalysisRequest<'_>) -> AnalysisOutcome {
    let prompt = analysis_prompt(request.job_description, request.cv_text, request.link);
    let selection = request.selection;

    let text = match llm
        .call(&ProviderRequest {
            prompt: &prompt,
            provider: &selection.provider,
            api_key: &selection.api_key,
            model_name: &selection.model_name,
            wants_json: true,
        })
        .await
    {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "Job analysis via {} failed: {e}",
                llm.resolve(&selection.provider).name()
            );
            return AnalysisOutcome::failed(AnalysisFailure::Provider {
                message: e.to_string(),
            });
        }
    };

    match decode_analysis(&text) {
        Ok(outcome) => {
            if !outcome.result.score_in_range() {
                warn!(
                    "Model returned out-of-range score {}; passing it through unchanged",
                    outcome.result.score
                );
            }
            if let AnalysisStatus::Partial { wrong_type, .. } = &outcome.status {
                if !wrong_type.is_empty() {
                    warn!("Model sent unusable values for {wrong_type:?}; defaults stored");
                }
            }
            info!(
                "Job analyzed: title={:?}, score={}",
                outcome.result.title, outcome.result.score
            );
            outcome
        }
        Err(reason) => {
            warn!("Job analysis response rejected: {reason:?}");
            AnalysisOutcome::failed(reason)
        }
    }
}

/// Fields of the answer that fell back to their defaults.
#[derive(Debug, Default)]
struct FieldReport {
    missing: Vec<String>,
    wrong_type: Vec<String>,
}

impl FieldReport {
    fn into_status(self) -> AnalysisStatus {
        if self.missing.is_empty() && self.wrong_type.is_empty() {
            AnalysisStatus::Complete
        } else {
            AnalysisStatus::Partial {
                missing: self.missing,
                wrong_type: self.wrong_type,
            }
        }
    }
}

/// Decodes the model's JSON answer. Absent or unusable fields take the defaults the
/// job store uses ("Bilinmiyor" for title/company, empty text, score 0) and are
/// reported; the remaining fields are kept as sent.
fn decode_analysis(text: &str) -> Result<AnalysisOutcome, AnalysisFailure> {
    let value: Value =
        serde_json::from_str(strip_json_fences(text)).map_err(|e| AnalysisFailure::NotJson {
            message: e.to_string(),
        })?;
    let object = value.as_object().ok_or(AnalysisFailure::NotAnObject)?;

    let mut report = FieldReport::default();
    let result = AnalysisResult {
        title: text_field(object, "title", UNKNOWN, &mut report),
        company: text_field(object, "company", UNKNOWN, &mut report),
        summary_tr: text_field(object, "summary_tr", "", &mut report),
        language_reqs: text_field(object, "language_reqs", "", &mut report),
        location: text_field(object, "location", "", &mut report),
        score: score_field(object, &mut report),
    };

    Ok(AnalysisOutcome {
        result,
        status: report.into_status(),
    })
}

fn text_field(
    object: &Map<String, Value>,
    field: &str,
    default: &str,
    report: &mut FieldReport,
) -> String {
    match object.get(field) {
        None | Some(Value::Null) => report.missing.push(field.to_string()),
        Some(Value::String(s)) => return s.clone(),
        Some(_) => report.wrong_type.push(field.to_string()),
    }
    default.to_string()
}

/// Accepts integers, integral floats (`82.0`) and numeric strings (`"82"`).
fn score_field(object: &Map<String, Value>, report: &mut FieldReport) -> i64 {
    let score = match object.get("score") {
        None | Some(Value::Null) => {
            report.missing.push("score".to_string());
            return 0;
        }
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        Some(_) => None,
    };

    score.unwrap_or_else(|| {
        report.wrong_type.push("score".to_string());
        0
    })
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() <= i64::MAX as f64).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::StubBackend;
    use crate::llm_client::{ApiKey, ProviderKind};

    const JD: &str = "Backend Engineer at Acme, remote, German required";
    const CV: &str = "Jane Doe. Rust, Go, PostgreSQL. C1 German.";
    const FULL_JSON: &str = r#"{"title":"Backend Engineer","company":"Acme","summary_tr":"Acme uzaktan çalışacak bir backend mühendisi arıyor.","language_reqs":"German","location":"Remote","score":82}"#;

    fn selection(provider: &str) -> ModelSelection {
        ModelSelection {
            provider: provider.into(),
            api_key: ApiKey::new("key123"),
            model_name: "model-x".to_string(),
        }
    }

    async fn run(llm: &LlmClient, provider: &str) -> AnalysisOutcome {
        let selection = selection(provider);
        analyze(
            llm,
            AnalysisRequest {
                job_description: JD,
                cv_text: CV,
                link: "",
                selection: &selection,
            },
        )
        .await
    }

    #[tokio::test]
    async fn test_full_json_maps_verbatim() {
        let backend = StubBackend::replying("gemini", FULL_JSON);
        let llm = LlmClient::new(backend.clone());

        let outcome = run(&llm, "Gemini").await;

        assert_eq!(outcome.status, AnalysisStatus::Complete);
        assert_eq!(outcome.result.title, "Backend Engineer");
        assert_eq!(outcome.result.company, "Acme");
        assert_eq!(
            outcome.result.summary_tr,
            "Acme uzaktan çalışacak bir backend mühendisi arıyor."
        );
        assert_eq!(outcome.result.language_reqs, "German");
        assert_eq!(outcome.result.location, "Remote");
        assert_eq!(outcome.result.score, 82);
    }

    #[tokio::test]
    async fn test_requests_json_mode_with_rendered_prompt() {
        let backend = StubBackend::replying("gemini", FULL_JSON);
        let llm = LlmClient::new(backend.clone());

        run(&llm, "Gemini").await;

        assert!(backend.last_wants_json());
        assert!(backend.last_prompt().contains(JD));
        assert!(backend.last_prompt().contains(CV));
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].1, "key123");
        assert_eq!(seen[0].2, "model-x");
    }

    #[tokio::test]
    async fn test_provider_error_yields_fallback_record() {
        let llm = LlmClient::new(StubBackend::failing("gemini", 503, "overloaded"));

        let outcome = run(&llm, "Gemini").await;

        assert_eq!(outcome.result, AnalysisResult::fallback());
        assert!(outcome.is_failed());
        assert!(matches!(
            outcome.status,
            AnalysisStatus::Failed {
                reason: AnalysisFailure::Provider { .. }
            }
        ));
    }

    #[test]
    fn test_fallback_record_is_exact() {
        let fallback = AnalysisResult::fallback();
        assert_eq!(fallback.title, "Analiz Edilemedi");
        assert_eq!(fallback.company, "Analiz Edilemedi");
        assert_eq!(fallback.summary_tr, "Analysis failed");
        assert_eq!(fallback.language_reqs, "Bilinmiyor");
        assert_eq!(fallback.location, "Bilinmiyor");
        assert_eq!(fallback.score, 0);
    }

    #[tokio::test]
    async fn test_non_json_yields_fallback_record() {
        let llm = LlmClient::new(StubBackend::replying(
            "gemini",
            "Sure! Here is the analysis: the candidate fits well.",
        ));

        let outcome = run(&llm, "Gemini").await;

        assert_eq!(outcome.result, AnalysisResult::fallback());
        assert!(matches!(
            outcome.status,
            AnalysisStatus::Failed {
                reason: AnalysisFailure::NotJson { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_provider_routes_to_default_backend() {
        let claude = StubBackend::failing("claude", 500, "should not be called");
        let gemini = StubBackend::replying("gemini", FULL_JSON);
        let llm = LlmClient::new(gemini.clone()).with_backend(ProviderKind::Claude, claude.clone());

        let outcome = run(&llm, "Clode").await;

        assert_eq!(outcome.result.score, 82);
        assert_eq!(gemini.calls(), 1);
        assert_eq!(claude.calls(), 0);
    }

    #[test]
    fn test_decode_fenced_json() {
        let text = format!("```json\n{FULL_JSON}\n```");
        let outcome = decode_analysis(&text).unwrap();
        assert_eq!(outcome.result.location, "Remote");
    }

    #[test]
    fn test_decode_array_is_not_an_object() {
        assert_eq!(
            decode_analysis("[1, 2, 3]").unwrap_err(),
            AnalysisFailure::NotAnObject
        );
    }

    #[test]
    fn test_decode_missing_fields_are_reported_not_failed() {
        let outcome = decode_analysis(r#"{"title": "SRE", "score": 40}"#).unwrap();
        assert_eq!(outcome.result.title, "SRE");
        assert_eq!(outcome.result.company, "Bilinmiyor");
        assert_eq!(outcome.result.summary_tr, "");
        assert_eq!(outcome.result.score, 40);
        assert_eq!(
            outcome.status,
            AnalysisStatus::Partial {
                missing: vec![
                    "company".to_string(),
                    "summary_tr".to_string(),
                    "language_reqs".to_string(),
                    "location".to_string(),
                ],
                wrong_type: vec![],
            }
        );
    }

    #[tokio::test]
    async fn test_numeric_string_score_keeps_record_verbatim() {
        let llm = LlmClient::new(StubBackend::replying(
            "gemini",
            r#"{"title":"Backend Engineer","company":"Acme","summary_tr":"Acme bir backend mühendisi arıyor.","language_reqs":"German","location":"Remote","score":"82"}"#,
        ));

        let outcome = run(&llm, "Gemini").await;

        assert_eq!(outcome.status, AnalysisStatus::Complete);
        assert_eq!(
            outcome.result,
            AnalysisResult {
                title: "Backend Engineer".to_string(),
                company: "Acme".to_string(),
                summary_tr: "Acme bir backend mühendisi arıyor.".to_string(),
                language_reqs: "German".to_string(),
                location: "Remote".to_string(),
                score: 82,
            }
        );
    }

    #[test]
    fn test_decode_wrong_type_keeps_other_fields() {
        let outcome = decode_analysis(
            r#"{"title":"SRE","company":"X","summary_tr":"s","language_reqs":"-","location":"L","score":"high"}"#,
        )
        .unwrap();
        assert_eq!(outcome.result.title, "SRE");
        assert_eq!(outcome.result.company, "X");
        assert_eq!(outcome.result.location, "L");
        assert_eq!(outcome.result.score, 0);
        assert_eq!(
            outcome.status,
            AnalysisStatus::Partial {
                missing: vec![],
                wrong_type: vec!["score".to_string()],
            }
        );
        assert!(!outcome.is_failed());

        let outcome = decode_analysis(
            r#"{"title":["a","b"],"company":"Acme","summary_tr":"s","language_reqs":"-","location":"L","score":70}"#,
        )
        .unwrap();
        assert_eq!(outcome.result.title, "Bilinmiyor");
        assert_eq!(outcome.result.company, "Acme");
        assert_eq!(outcome.result.score, 70);
        assert_eq!(
            outcome.status,
            AnalysisStatus::Partial {
                missing: vec![],
                wrong_type: vec!["title".to_string()],
            }
        );
    }

    #[test]
    fn test_decode_out_of_range_score_passes_through() {
        let outcome = decode_analysis(
            r#"{"title":"a","company":"b","summary_tr":"c","language_reqs":"d","location":"e","score":140}"#,
        )
        .unwrap();
        assert_eq!(outcome.result.score, 140);
        assert!(!outcome.result.score_in_range());
        assert_eq!(outcome.status, AnalysisStatus::Complete);
    }

    #[test]
    fn test_decode_integral_float_score() {
        let outcome = decode_analysis(r#"{"score": 75.0}"#).unwrap();
        assert_eq!(outcome.result.score, 75);
        assert_eq!(decode_analysis(r#"{"score": " 64 "}"#).unwrap().result.score, 64);
        assert_eq!(decode_analysis(r#"{"score": "90.0"}"#).unwrap().result.score, 90);

        let outcome = decode_analysis(r#"{"score": 75.5}"#).unwrap();
        assert_eq!(outcome.result.score, 0);
        assert!(matches!(
            outcome.status,
            AnalysisStatus::Partial { ref wrong_type, .. } if wrong_type == &["score".to_string()]
        ));
    }

    #[test]
    fn test_status_serializes_with_tag() {
        let failed = AnalysisStatus::Failed {
            reason: AnalysisFailure::NotAnObject,
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"]["kind"], "not_an_object");
    }
}
