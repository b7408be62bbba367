use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Score breakdown for one user, as rendered by the profile and score widgets.
///
/// Every field defaults to zero; `UserMetrics::zero()` doubles as the
/// "no data / fetch failed" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMetrics {
    pub identifi_score: f64,
    pub reach_score: f64,
    pub impression_score: f64,
    pub engagement_score: f64,
    pub on_chain_score: f64,
}

impl UserMetrics {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Lenient decode of the `data` object: missing, null or non-numeric
    /// fields become zero. Numeric strings are accepted.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| -> f64 {
            match value.get(name) {
                Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
                Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
                _ => 0.0,
            }
        };
        Self {
            identifi_score: field("identifi_score"),
            reach_score: field("reach_score"),
            impression_score: field("impression_score"),
            engagement_score: field("engagement_score"),
            on_chain_score: field("on_chain_score"),
        }
    }
}
