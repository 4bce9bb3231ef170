//! Response envelopes: `response` carries data, `alerts` carries human-readable outcomes.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, Serialize)]
pub struct Alert {
    pub text: String,
    pub level: AlertLevel,
}

#[derive(Clone, Debug, Serialize)]
pub struct Alerts {
    pub alerts: Vec<Alert>,
}

impl Alerts {
    pub fn success(text: impl Into<String>) -> Self {
        Alerts {
            alerts: vec![Alert {
                text: text.into(),
                level: AlertLevel::Success,
            }],
        }
    }

    pub fn errors(messages: Vec<String>) -> Self {
        Alerts {
            alerts: messages
                .into_iter()
                .map(|text| Alert {
                    text,
                    level: AlertLevel::Error,
                })
                .collect(),
        }
    }
}

/// Body of a read: every matching resource.
#[derive(Serialize)]
pub struct ReadResponse<T> {
    pub response: Vec<T>,
}

/// Body of a create or update: the outcome alert plus the post-write resource.
#[derive(Serialize)]
pub struct MutationResponse<T> {
    pub alerts: Vec<Alert>,
    pub response: T,
}

impl<T> MutationResponse<T> {
    pub fn new(text: impl Into<String>, response: T) -> Self {
        MutationResponse {
            alerts: Alerts::success(text).alerts,
            response,
        }
    }
}
