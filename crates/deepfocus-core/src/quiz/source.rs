//! Quiz-content collaborators.
//!
//! A [`QuizSource`] turns a node's title, description, and duration into
//! active-recall questions. The contract is infallible: implementations
//! resolve every failure to the built-in fallback list so playback is
//! never blocked on content generation.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ConfigError, CoreError, Result};

use super::question::QuizQuestion;

const GEMINI_MODEL: &str = "gemini-3-flash-preview";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// External quiz-content collaborator.
pub trait QuizSource {
    /// Generate questions for one node. Must return a non-empty list;
    /// on any failure implementations return
    /// [`fallback_quiz`] instead of propagating an error.
    fn generate_quiz(
        &self,
        title: &str,
        description: &str,
        duration_secs: u32,
    ) -> Vec<QuizQuestion>;
}

/// The fixed fallback: exactly one question at 30% of the duration,
/// floored to a whole second.
pub fn fallback_quiz(duration_secs: u32) -> Vec<QuizQuestion> {
    vec![QuizQuestion {
        id: "fallback_1".into(),
        trigger_secs: (f64::from(duration_secs) * 0.3).floor(),
        prompt: "Which foundational concept was just established as the core pillar of this lecture?"
            .into(),
        options: vec![
            "Structural Reductionism".into(),
            "Emergent Complexity".into(),
            "Linear Extrapolation".into(),
            "Recursive Validation".into(),
        ],
        correct_index: 0,
        explanation: "The introduction focuses on breaking down the subject into its smallest indivisible parts."
            .into(),
        answered: false,
        presented: false,
    }]
}

/// Offline source: always the fallback list.
#[derive(Debug, Default)]
pub struct FallbackQuizSource;

impl QuizSource for FallbackQuizSource {
    fn generate_quiz(&self, _title: &str, _description: &str, duration_secs: u32) -> Vec<QuizQuestion> {
        fallback_quiz(duration_secs)
    }
}

/// Gemini-backed source. Any transport, HTTP, or parse failure resolves
/// to the fallback list.
pub struct GeminiQuizSource {
    api_key: String,
    base_url: String,
    runtime: tokio::runtime::Runtime,
}

impl GeminiQuizSource {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            runtime,
        })
    }

    /// Read the API key from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            CoreError::Config(ConfigError::InvalidValue {
                key: "GEMINI_API_KEY".into(),
                message: "environment variable not set".into(),
            })
        })?;
        Self::new(api_key)
    }

    /// Override the API endpoint (tests point this at a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn fetch(
        &self,
        title: &str,
        description: &str,
        duration_secs: u32,
    ) -> std::result::Result<Vec<QuizQuestion>, Box<dyn std::error::Error>> {
        let prompt = format!(
            "Analyze this educational video context for a 'DeepFocus' learning platform.\n\
             Video Title: {title}\n\
             Context/Description: {description}\n\
             Total Duration: {duration_secs} seconds.\n\n\
             GENERATE 4 \"Active Recall\" questions. These are not simple trivia; they must test deep conceptual mental models.\n\n\
             RULES:\n\
             1. Timestamps: Space them logically (e.g., 20%, 40%, 65%, 90% marks). Use seconds.\n\
             2. Format: Multiple Choice (exactly 4 options).\n\
             3. Difficulty: High. Assume the viewer is paying intense attention.\n\
             4. Focus: Critical conceptual junctions where a student might get confused.\n\n\
             Respond with a JSON array of objects with fields: id, timestamp, question, options, correctIndex, explanation."
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, GEMINI_MODEL
        );

        let client = Client::new();
        let response: GenerateContentResponse = self.runtime.block_on(async {
            client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
                .map_err(Into::<Box<dyn std::error::Error>>::into)
        })?;

        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .unwrap_or("[]");
        let questions: Vec<QuizQuestion> = serde_json::from_str(text)?;
        Ok(questions
            .into_iter()
            .filter(|q| q.validate().is_ok())
            .collect())
    }
}

impl QuizSource for GeminiQuizSource {
    fn generate_quiz(&self, title: &str, description: &str, duration_secs: u32) -> Vec<QuizQuestion> {
        match self.fetch(title, description, duration_secs) {
            Ok(questions) if !questions.is_empty() => questions,
            _ => fallback_quiz(duration_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}
