use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{book::BookSummary, user::MemberSummary};
use crate::constants::{RENEWAL_WINDOW_MAX_DAYS, RENEWAL_WINDOW_MIN_DAYS};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Borrow,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Active,
    PendingReturnApproval,
    Completed,
    Cancelled,
    Overdue,
}

/// A loan record. Owned by the backend; the client only ever holds a cached
/// copy and re-fetches after every mutation instead of patching in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub book_id: String,
    pub member_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    #[serde(default)]
    pub borrowed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub return_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<BookSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberSummary>,
}

impl Transaction {
    /// A loan that still counts against the member's concurrent-loan cap.
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Active | TransactionStatus::PendingReturnApproval
        )
    }

    /// Whole days between `now` and the due date, negative when overdue.
    pub fn days_until_due(&self, now: DateTime<Utc>) -> Option<i64> {
        self.due_date.map(|due| (due - now).num_days())
    }

    /// Renewal window: the loan is active and the due date is 1-2 whole days
    /// out, inclusive.
    pub fn is_renewable(&self, now: DateTime<Utc>) -> bool {
        if self.status != TransactionStatus::Active {
            return false;
        }
        match self.days_until_due(now) {
            Some(days) => (RENEWAL_WINDOW_MIN_DAYS..=RENEWAL_WINDOW_MAX_DAYS).contains(&days),
            None => false,
        }
    }
}
