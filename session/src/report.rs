use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::Tally;

/// Who is taking the quiz. Serialized flat into the score report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Respondent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Respondent {
    pub fn named(name: impl Into<String>) -> Self {
        Respondent {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// The JSON body POSTed to the results endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub quiz_name: String,
    #[serde(flatten)]
    pub respondent: Respondent,
    pub score: usize,
    pub total: usize,
    pub timestamp: DateTime<Utc>,
}

impl ScoreReport {
    pub fn new(quiz_name: impl Into<String>, respondent: Respondent, tally: Tally, timestamp: DateTime<Utc>) -> Self {
        ScoreReport {
            quiz_name: quiz_name.into(),
            respondent,
            score: tally.correct,
            total: tally.total,
            timestamp,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub const GENERIC_SUCCESS: &str = "Results submitted.";

/// What a successful (2xx) response told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub message: String,
}

#[derive(Deserialize)]
struct ReceiptBody {
    message: Option<String>,
}

impl Receipt {
    /// Read a 2xx body. A JSON `{ "message": ... }` is used as is; anything
    /// else still counts as success with a generic message.
    pub fn from_body(body: &str) -> Receipt {
        let message = serde_json::from_str::<ReceiptBody>(body)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| GENERIC_SUCCESS.to_string());
        Receipt { message }
    }
}
