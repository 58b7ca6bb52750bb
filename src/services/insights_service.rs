use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::InsightsError;
use crate::models::MonthlyStats;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Trait for text/vision generation providers.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Generate free-form text from a prompt.
    async fn generate_text(&self, prompt: &str) -> Result<String, InsightsError>;

    /// Generate text from a prompt plus one inline image (base64-encoded).
    async fn generate_with_image(
        &self,
        prompt: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> Result<String, InsightsError>;
}

// Gemini generateContent request/response structures
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inline_data")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

/// Gemini provider implementation.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            client,
        }
    }

    async fn call_with_retry(&self, request: GeminiRequest) -> Result<String, InsightsError> {
        let mut retry_count = 0;
        let max_retries = 3;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.call_gemini(&request).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    retry_count += 1;
                    if retry_count >= max_retries {
                        return Err(e);
                    }

                    warn!(
                        "Generation call failed (attempt {}/{}): {}. Retrying in {:?}...",
                        retry_count, max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    async fn call_gemini(&self, request: &GeminiRequest) -> Result<String, InsightsError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_ENDPOINT, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InsightsError::Timeout
                } else {
                    InsightsError::Network(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            return Err(InsightsError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InsightsError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| InsightsError::InvalidResponse(e.to_string()))?;

        body.candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.unwrap_or_default().into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| InsightsError::InvalidResponse("No text in response".to_string()))
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    async fn generate_text(&self, prompt: &str) -> Result<String, InsightsError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart::Text {
                    text: prompt.to_string(),
                }],
            }],
        };

        self.call_with_retry(request).await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> Result<String, InsightsError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::Text {
                        text: prompt.to_string(),
                    },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: mime_type.to_string(),
                            data: image_base64.to_string(),
                        },
                    },
                ],
            }],
        };

        self.call_with_retry(request).await
    }
}

/// Generation facade used by the monthly report and receipt scanner. Holds
/// an optional provider: without an API key the service stays disabled and
/// every call returns `InsightsError::Disabled`, leaving callers to apply
/// their fallbacks.
pub struct InsightsService {
    provider: Option<Arc<dyn GenerativeProvider>>,
}

impl InsightsService {
    pub fn new(provider: Option<Arc<dyn GenerativeProvider>>) -> Self {
        Self { provider }
    }

    pub fn from_env() -> Self {
        match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.is_empty() => {
                info!("Initializing generation provider: gemini ({})", DEFAULT_MODEL);
                Self::new(Some(Arc::new(GeminiProvider::new(key))))
            }
            _ => {
                warn!("GEMINI_API_KEY not configured. Insight generation disabled.");
                Self::new(None)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&Arc<dyn GenerativeProvider>, InsightsError> {
        self.provider.as_ref().ok_or(InsightsError::Disabled)
    }

    /// Ask for 3 short insights about one month of finances. Returns the
    /// parsed list or a typed error; the caller decides what to substitute
    /// on failure.
    pub async fn monthly_insights(
        &self,
        stats: &MonthlyStats,
        month: &str,
    ) -> Result<Vec<String>, InsightsError> {
        let prompt = build_insights_prompt(stats, month);
        let text = self.provider()?.generate_text(&prompt).await?;
        parse_insights(&text)
    }

    pub async fn generate_with_image(
        &self,
        prompt: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> Result<String, InsightsError> {
        self.provider()?
            .generate_with_image(prompt, mime_type, image_base64)
            .await
    }
}

fn build_insights_prompt(stats: &MonthlyStats, month: &str) -> String {
    let categories = stats
        .by_category
        .iter()
        .map(|(category, amount)| format!("{}: ${}", category, amount))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Analyze this financial data and provide 3 concise, actionable insights.\n\
         Focus on spending patterns and practical advice.\n\
         Keep it friendly and conversational.\n\
         \n\
         Financial Data for {month}:\n\
         - Total Income: ${income}\n\
         - Total Expenses: ${expenses}\n\
         - Net Income: ${net}\n\
         - Expense Categories: {categories}\n\
         \n\
         Format the response as a JSON array of strings, like this:\n\
         [\"insight 1\", \"insight 2\", \"insight 3\"]",
        month = month,
        income = stats.total_income,
        expenses = stats.total_expenses,
        net = stats.net(),
        categories = categories,
    )
}

/// Strip markdown code fences the model tends to wrap JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse the expected JSON array of short strings out of raw model output.
pub fn parse_insights(text: &str) -> Result<Vec<String>, InsightsError> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str::<Vec<String>>(&cleaned)
        .map_err(|e| InsightsError::InvalidResponse(format!("not a JSON string array: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[test]
    fn parses_plain_json_array() {
        let parsed = parse_insights(r#"["a", "b", "c"]"#).unwrap();
        assert_eq!(parsed, vec!["a", "b", "c"]);
    }

    #[test]
    fn parses_fenced_json_array() {
        let raw = "```json\n[\"watch your dining spend\", \"save more\"]\n```";
        let parsed = parse_insights(raw).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn rejects_non_array_output() {
        assert!(parse_insights("Here are some thoughts!").is_err());
        assert!(parse_insights(r#"{"insights": []}"#).is_err());
    }

    #[test]
    fn prompt_includes_aggregates_and_month() {
        let mut stats = MonthlyStats::default();
        stats.total_income = BigDecimal::from(2000);
        stats.total_expenses = BigDecimal::from(500);
        stats
            .by_category
            .insert("rent".to_string(), BigDecimal::from(400));

        let prompt = build_insights_prompt(&stats, "April");
        assert!(prompt.contains("April"));
        assert!(prompt.contains("$2000"));
        assert!(prompt.contains("rent: $400"));
        assert!(prompt.contains("JSON array"));
    }

    #[tokio::test]
    async fn disabled_service_returns_typed_error() {
        let service = InsightsService::new(None);
        let result = service.monthly_insights(&MonthlyStats::default(), "May").await;
        assert!(matches!(result, Err(InsightsError::Disabled)));
    }
}
