use serde::{Deserialize, Serialize};

/// Status an invoice is issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitialStatus {
    #[default]
    Draft,
    Sent,
}

/// How invoices are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePolicy {
    /// Days from issue date to due date.
    pub payment_terms_days: u32,
    pub initial_status: InitialStatus,
}

impl Default for IssuePolicy {
    fn default() -> Self {
        Self {
            payment_terms_days: 30,
            initial_status: InitialStatus::Draft,
        }
    }
}
