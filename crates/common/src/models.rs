use serde::{Deserialize, Serialize};

/// Labels attached to an alert reported by Alertmanager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertLabels {
    pub alertname: String,
    pub severity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertStatus {
    pub state: String, // "active", "suppressed", "unprocessed"
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertAnnotations {
    pub summary: String,
}

/// One firing or resolved alert instance, as returned by `/api/v2/alerts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alert {
    pub labels: AlertLabels,
    pub status: AlertStatus,
    pub annotations: AlertAnnotations,
}

/// Body of the response returned when a silence is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceId {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceMatcher {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceStatus {
    pub state: String,
}

/// A time-bounded suppression rule.
///
/// Timestamps are kept as the strings Alertmanager sent; they are never parsed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Silence {
    pub id: String,
    pub matchers: Vec<SilenceMatcher>,
    pub status: SilenceStatus,
    pub comment: String,
    pub created_by: String,
    pub ends_at: String,
    pub starts_at: String,
}

pub fn decode_alerts(payload: &str) -> Result<Vec<Alert>, serde_json::Error> {
    serde_json::from_str(payload)
}

pub fn decode_silences(payload: &str) -> Result<Vec<Silence>, serde_json::Error> {
    serde_json::from_str(payload)
}

pub fn decode_silence(payload: &str) -> Result<Silence, serde_json::Error> {
    serde_json::from_str(payload)
}
