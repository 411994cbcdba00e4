//! Trip request model and input sanitization.
//!
//! Sanitization is total: it clamps and strips instead of rejecting, so
//! whatever the caller hands us, the payload that leaves the process is
//! bounded and free of markup. Unknown fields in untrusted JSON are
//! dropped wholesale (default-deny).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::{
    MAX_CURRENCY_LEN, MAX_DAILY_BUDGET, MAX_DESTINATION_LEN, MAX_DURATION_DAYS, MAX_INTEREST_LEN,
    MAX_TRAVELERS,
};

/// One trip generation request, as sent to the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TripRequest {
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    pub travelers_count: u32,
    pub interests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_daily_budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl TripRequest {
    /// Build a request from untrusted JSON, keeping only allow-listed
    /// fields. Anything else in the payload is discarded.
    pub fn from_untrusted(payload: &Value) -> Self {
        Self {
            destination: str_field(payload, "destination"),
            start_date: opt_str_field(payload, "start_date"),
            end_date: opt_str_field(payload, "end_date"),
            duration_days: payload
                .get("duration_days")
                .and_then(Value::as_u64)
                .map(|n| n as u32),
            travelers_count: payload
                .get("travelers_count")
                .and_then(Value::as_u64)
                .map(|n| n as u32)
                .unwrap_or(0),
            interests: payload
                .get("interests")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            max_daily_budget: payload.get("max_daily_budget").and_then(Value::as_f64),
            currency: opt_str_field(payload, "currency"),
        }
    }
}

fn str_field(payload: &Value, key: &str) -> String {
    payload
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_str_field(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Normalize and bound a request. Never fails; empty-after-cleaning
/// destinations are caught by the orchestrator pre-flight check.
pub fn sanitize(request: TripRequest) -> TripRequest {
    TripRequest {
        destination: clean_text(&request.destination, MAX_DESTINATION_LEN),
        start_date: request.start_date.map(|d| clean_text(&d, MAX_DESTINATION_LEN)),
        end_date: request.end_date.map(|d| clean_text(&d, MAX_DESTINATION_LEN)),
        duration_days: request
            .duration_days
            .map(|d| d.clamp(1, MAX_DURATION_DAYS)),
        travelers_count: request.travelers_count.clamp(1, MAX_TRAVELERS),
        interests: request
            .interests
            .iter()
            .map(|i| clean_text(i, MAX_INTEREST_LEN))
            .filter(|i| !i.is_empty())
            .collect(),
        max_daily_budget: request
            .max_daily_budget
            .map(|b| if b.is_finite() { b.clamp(0.0, MAX_DAILY_BUDGET) } else { 0.0 }),
        currency: request
            .currency
            .map(|c| clean_text(&c, MAX_CURRENCY_LEN))
            .filter(|c| !c.is_empty()),
    }
}

/// Strip HTML/script tags and dangerous punctuation, trim, cap length.
pub fn clean_text(input: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(input.len().min(max_len));
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if in_tag => {}
            '{' | '}' | '[' | ']' | '\\' | '`' | '|' => {}
            _ => out.push(c),
        }
    }
    out.trim().chars().take(max_len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_text_strips_tags() {
        assert_eq!(clean_text("<script>alert(1)</script>Paris", 100), "Paris");
        assert_eq!(clean_text("Par<b>is</b>", 100), "Paris");
    }

    #[test]
    fn clean_text_removes_dangerous_punctuation() {
        assert_eq!(clean_text("Pa{r}i[s]\\`|", 100), "Paris");
    }

    #[test]
    fn clean_text_trims_and_caps() {
        assert_eq!(clean_text("  Paris  ", 100), "Paris");
        assert_eq!(clean_text("abcdef", 3), "abc");
    }

    #[test]
    fn clean_text_unclosed_tag_drops_rest() {
        assert_eq!(clean_text("Paris<img src=x onerror=", 100), "Paris");
    }

    #[test]
    fn travelers_clamp_into_range() {
        let low = sanitize(TripRequest {
            destination: "Paris".to_string(),
            travelers_count: 0,
            ..TripRequest::default()
        });
        assert_eq!(low.travelers_count, 1);

        let high = sanitize(TripRequest {
            destination: "Paris".to_string(),
            travelers_count: 50,
            ..TripRequest::default()
        });
        assert_eq!(high.travelers_count, MAX_TRAVELERS);
    }

    #[test]
    fn duration_clamps_when_present() {
        let req = sanitize(TripRequest {
            destination: "Paris".to_string(),
            duration_days: Some(90),
            ..TripRequest::default()
        });
        assert_eq!(req.duration_days, Some(MAX_DURATION_DAYS));

        let absent = sanitize(TripRequest {
            destination: "Paris".to_string(),
            ..TripRequest::default()
        });
        assert_eq!(absent.duration_days, None);
    }

    #[test]
    fn budget_clamps_to_ceiling_and_floor() {
        let high = sanitize(TripRequest {
            destination: "Paris".to_string(),
            max_daily_budget: Some(9e9),
            ..TripRequest::default()
        });
        assert_eq!(high.max_daily_budget, Some(MAX_DAILY_BUDGET));

        let negative = sanitize(TripRequest {
            destination: "Paris".to_string(),
            max_daily_budget: Some(-5.0),
            ..TripRequest::default()
        });
        assert_eq!(negative.max_daily_budget, Some(0.0));

        let nan = sanitize(TripRequest {
            destination: "Paris".to_string(),
            max_daily_budget: Some(f64::NAN),
            ..TripRequest::default()
        });
        assert_eq!(nan.max_daily_budget, Some(0.0));
    }

    #[test]
    fn interests_cleaned_and_empty_ones_dropped() {
        let req = sanitize(TripRequest {
            destination: "Paris".to_string(),
            interests: vec![
                "museums".to_string(),
                "<script></script>".to_string(),
                "  food  ".to_string(),
            ],
            ..TripRequest::default()
        });
        assert_eq!(req.interests, vec!["museums", "food"]);
    }

    #[test]
    fn currency_capped_at_five_chars() {
        let req = sanitize(TripRequest {
            destination: "Paris".to_string(),
            currency: Some("EURODOLLAR".to_string()),
            ..TripRequest::default()
        });
        assert_eq!(req.currency.as_deref(), Some("EUROD"));
    }

    #[test]
    fn from_untrusted_drops_unknown_fields() {
        let payload = json!({
            "destination": "Paris",
            "travelers_count": 2,
            "__proto__": {"polluted": true},
            "admin": true,
            "callback_url": "http://evil.example"
        });

        let req = TripRequest::from_untrusted(&payload);
        let serialized = serde_json::to_value(&req).unwrap();
        let keys: Vec<&str> = serialized
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        assert!(keys.contains(&"destination"));
        assert!(!keys.contains(&"admin"));
        assert!(!keys.contains(&"__proto__"));
        assert!(!keys.contains(&"callback_url"));
    }

    #[test]
    fn from_untrusted_tolerates_wrong_types() {
        let payload = json!({
            "destination": 42,
            "travelers_count": "two",
            "interests": "not-an-array"
        });

        let req = TripRequest::from_untrusted(&payload);
        assert_eq!(req.destination, "");
        assert_eq!(req.travelers_count, 0);
        assert!(req.interests.is_empty());
    }

    #[test]
    fn serialized_payload_omits_absent_optionals() {
        let req = sanitize(TripRequest {
            destination: "Paris".to_string(),
            travelers_count: 2,
            ..TripRequest::default()
        });
        let value = serde_json::to_value(&req).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("max_daily_budget"));
        assert!(!obj.contains_key("currency"));
        assert!(!obj.contains_key("duration_days"));
    }
}
