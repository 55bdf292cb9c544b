//! Thin client for a Gemini-style `generateContent` endpoint.
//!
//! Two calls are exposed: extracting structured data from a receipt image
//! and turning monthly statistics into short textual insights. Both ask the
//! model for raw JSON and defensively strip the markdown code fences some
//! models wrap around it anyway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const RECEIPT_CATEGORIES: &str = "housing, transportation, groceries, utilities, \
entertainment, food, shopping, healthcare, education, personal, travel, \
insurance, gifts, bills, other-expense";

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("model returned no content")]
    MissingContent,
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error("the image does not look like a receipt")]
    NotAReceipt,
}

/// Structured fields extracted from a receipt image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptData {
    /// Receipt total in minor units (cents).
    pub amount_minor: i64,
    pub date: DateTime<Utc>,
    pub description: String,
    pub merchant_name: String,
    pub category: String,
}

/// The model replies with major units; see the scan prompt.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptWire {
    amount: f64,
    date: DateTime<Utc>,
    description: String,
    merchant_name: String,
    category: String,
}

impl From<ReceiptWire> for ReceiptData {
    fn from(wire: ReceiptWire) -> Self {
        Self {
            amount_minor: (wire.amount * 100.0).round() as i64,
            date: wire.date,
            description: wire.description,
            merchant_name: wire.merchant_name,
            category: wire.category,
        }
    }
}

/// Pre-aggregated month figures fed to the insights prompt.
#[derive(Clone, Debug)]
pub struct FinancialSummary {
    pub month: String,
    pub total_income_minor: i64,
    pub total_expenses_minor: i64,
    /// (category, expense total in minor units) pairs.
    pub expense_by_category: Vec<(String, i64)>,
}

#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

// generateContent wire format. Field names follow the endpoint's JSON.

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl Client {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the endpoint, mainly for tests against a local stub.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    async fn generate(&self, parts: Vec<RequestPart>) -> Result<String, AiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        );

        let resp = self
            .http
            .post(url)
            .json(&GenerateRequest {
                contents: vec![RequestContent { parts }],
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = resp.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .ok_or(AiError::MissingContent)?;

        if text.is_empty() {
            return Err(AiError::MissingContent);
        }
        Ok(text)
    }

    /// Extract amount, date, merchant and category from a receipt image.
    ///
    /// `image_base64` must already be base64-encoded. An empty JSON object in
    /// the reply means the model saw no receipt in the image.
    pub async fn scan_receipt(
        &self,
        image_base64: String,
        mime_type: String,
    ) -> Result<ReceiptData, AiError> {
        let prompt = format!(
            "Analyze this receipt image and extract the following information in JSON format:\n\
             - Total amount (just the number)\n\
             - Date (in ISO format)\n\
             - Description or items purchased (brief summary)\n\
             - Merchant/store name\n\
             - Suggested category (one of: {RECEIPT_CATEGORIES})\n\n\
             Only respond with valid JSON in this exact format:\n\
             {{\n\
               \"amount\": number,\n\
               \"date\": \"ISO date string\",\n\
               \"description\": \"string\",\n\
               \"merchantName\": \"string\",\n\
               \"category\": \"string\"\n\
             }}\n\n\
             If it's not a receipt, return an empty object"
        );

        let text = self
            .generate(vec![
                RequestPart::InlineData {
                    inline_data: InlineData {
                        mime_type,
                        data: image_base64,
                    },
                },
                RequestPart::Text { text: prompt },
            ])
            .await?;

        let cleaned = strip_code_fences(&text);
        if cleaned == "{}" {
            return Err(AiError::NotAReceipt);
        }
        let wire: ReceiptWire = serde_json::from_str(cleaned).map_err(|err| {
            tracing::warn!("unparsable receipt payload: {err}");
            AiError::MalformedResponse(err.to_string())
        })?;
        Ok(wire.into())
    }

    /// Produce three short insights from a month's aggregated figures.
    pub async fn generate_insights(
        &self,
        summary: &FinancialSummary,
    ) -> Result<Vec<String>, AiError> {
        let by_category = summary
            .expense_by_category
            .iter()
            .map(|(category, minor)| format!("{category}: {}", format_major(*minor)))
            .collect::<Vec<_>>()
            .join(", ");

        let prompt = format!(
            "Analyze this financial data and provide 3 concise, actionable insights.\n\
             Focus on spending patterns and practical advice.\n\
             Keep it friendly and conversational.\n\n\
             Financial Data for {month}:\n\
             - Total Income: {income}\n\
             - Total Expenses: {expenses}\n\
             - Net Income: {net}\n\
             - Expense Categories: {by_category}\n\n\
             Format the response as a JSON array of strings, like this:\n\
             [\"insight 1\", \"insight 2\", \"insight 3\"]",
            month = summary.month,
            income = format_major(summary.total_income_minor),
            expenses = format_major(summary.total_expenses_minor),
            net = format_major(summary.total_income_minor - summary.total_expenses_minor),
        );

        let text = self
            .generate(vec![RequestPart::Text { text: prompt }])
            .await?;

        serde_json::from_str(strip_code_fences(&text))
            .map_err(|err| AiError::MalformedResponse(err.to_string()))
    }
}

/// Render minor units as a decimal string, e.g. `123456` -> `"1234.56"`.
fn format_major(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Drop a leading/trailing markdown code fence if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // The fence may carry a language tag on the same line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_with_language_tag_are_stripped() {
        let text = "```json\n{\"amount\": 4.2}\n```";
        assert_eq!(strip_code_fences(text), "{\"amount\": 4.2}");
    }

    #[test]
    fn fences_without_language_tag_are_stripped() {
        let text = "```\n[\"a\", \"b\"]\n```";
        assert_eq!(strip_code_fences(text), "[\"a\", \"b\"]");
    }

    #[test]
    fn unfenced_text_is_left_alone() {
        assert_eq!(strip_code_fences("  {\"x\": 1} "), "{\"x\": 1}");
    }

    #[test]
    fn receipt_payload_parses_camel_case_and_converts_to_minor_units() {
        let json = r#"{
            "amount": 42.50,
            "date": "2026-08-12T00:00:00Z",
            "description": "groceries run",
            "merchantName": "Esselunga",
            "category": "groceries"
        }"#;
        let wire: ReceiptWire = serde_json::from_str(json).unwrap();
        let data = ReceiptData::from(wire);
        assert_eq!(data.merchant_name, "Esselunga");
        assert_eq!(data.amount_minor, 4_250);
    }

    #[test]
    fn minor_units_render_as_decimal() {
        assert_eq!(format_major(123456), "1234.56");
        assert_eq!(format_major(5), "0.05");
        assert_eq!(format_major(-250), "-2.50");
    }
}
