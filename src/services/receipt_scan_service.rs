use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::insights_service::{strip_code_fences, InsightsService};

/// Receipt images above this size are rejected before any upload.
pub const MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;

const SCAN_PROMPT: &str = "\
Analyze this receipt image and extract the following information in JSON format:
- Total amount (just the number)
- Date (in ISO format, YYYY-MM-DD)
- Description or items purchased (brief summary)
- Merchant/store name
- Suggested category (one of: housing, transportation, groceries, utilities, \
entertainment, food, shopping, healthcare, education, personal, travel, \
insurance, gifts, bills, other-expense)

Only respond with valid JSON in this exact format:
{\"amount\": number, \"date\": \"YYYY-MM-DD\", \"description\": \"string\", \
\"merchantName\": \"string\", \"category\": \"string\"}

If it is not a receipt, return an empty JSON object {}.";

/// Structured fields extracted from a receipt image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedReceipt {
    pub amount: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub merchant_name: Option<String>,
    pub category: String,
}

/// Send a receipt image through the vision endpoint and parse the reply.
pub async fn scan_receipt(
    insights: &InsightsService,
    mime_type: &str,
    image: &[u8],
) -> Result<ScannedReceipt, AppError> {
    if image.len() > MAX_RECEIPT_BYTES {
        return Err(AppError::Validation(
            "receipt image exceeds the 5 MB limit".to_string(),
        ));
    }
    if image.is_empty() {
        return Err(AppError::Validation("receipt image is empty".to_string()));
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(image);
    let raw = insights
        .generate_with_image(SCAN_PROMPT, mime_type, &encoded)
        .await?;

    parse_scanned_receipt(&raw)
}

fn parse_scanned_receipt(raw: &str) -> Result<ScannedReceipt, AppError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str::<ScannedReceipt>(&cleaned).map_err(|e| {
        AppError::External(format!("receipt scan returned unparsable output: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_scan_output() {
        let raw = r#"{"amount": 42.50, "date": "2025-03-14", "description": "Weekly shop",
                      "merchantName": "Grocer & Co", "category": "groceries"}"#;
        let receipt = parse_scanned_receipt(raw).unwrap();
        assert_eq!(receipt.amount, 42.50);
        assert_eq!(receipt.category, "groceries");
        assert_eq!(receipt.merchant_name.as_deref(), Some("Grocer & Co"));
        assert_eq!(
            receipt.date,
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
        );
    }

    #[test]
    fn parses_fenced_scan_output() {
        let raw = "```json\n{\"amount\": 9.99, \"date\": \"2025-01-02\", \"description\": null, \"merchantName\": null, \"category\": \"food\"}\n```";
        let receipt = parse_scanned_receipt(raw).unwrap();
        assert_eq!(receipt.amount, 9.99);
    }

    #[test]
    fn rejects_non_receipt_output() {
        assert!(parse_scanned_receipt("{}").is_err());
        assert!(parse_scanned_receipt("sorry, that is not a receipt").is_err());
    }

    #[tokio::test]
    async fn rejects_oversized_image_before_upload() {
        let service = InsightsService::new(None);
        let image = vec![0u8; MAX_RECEIPT_BYTES + 1];
        let result = scan_receipt(&service, "image/png", &image).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
