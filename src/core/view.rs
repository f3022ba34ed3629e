//! Client-side derivation of the transaction list into UI-ready state:
//! the pending-first recent view, the loan-limit advisory, and the
//! post-return rating prompt.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::constants::{MAX_CONCURRENT_LOANS, RATING_PROMPT_WINDOW_SECS, RECENT_TRANSACTIONS_LIMIT};
use crate::core::errors::{LibraryError, LibraryResult};
use crate::core::models::transaction::{Transaction, TransactionStatus, TransactionType};

/// What the rating modal needs: which loan completed, for which book.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatingPrompt {
    pub transaction_id: String,
    pub book_id: String,
}

/// Lifecycle of the one-time rating prompt for the current transaction set.
///
/// Replaces the ad hoc "already checked" boolean: once the prompt has been
/// surfaced (or dismissed) it stays out of the way across re-derivations,
/// and only an empty-then-repopulated set arms it again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RatingPromptState {
    Idle,
    Eligible(RatingPrompt),
    Shown(RatingPrompt),
    Dismissed,
}

/// Two-layer view over the fetched transactions: `all` is the authoritative
/// cache replaced wholesale after each fetch, `visible` is what the UI
/// renders.
pub struct TransactionView {
    all: Vec<Transaction>,
    visible: Vec<Transaction>,
    status_filter: Option<TransactionStatus>,
    prompt: RatingPromptState,
    version: u64,
}

impl TransactionView {
    pub fn new() -> Self {
        TransactionView {
            all: Vec::new(),
            visible: Vec::new(),
            status_filter: None,
            prompt: RatingPromptState::Idle,
            version: 0,
        }
    }

    /// Replaces the cached set with a fresh server response and re-derives
    /// the visible subset. Prompt eligibility is evaluated at most once per
    /// set version: only while the state machine is idle, and an empty set
    /// resets it.
    pub fn set_transactions(
        &mut self,
        transactions: Vec<Transaction>,
        member_id: Option<&str>,
        now: DateTime<Utc>,
    ) {
        self.version += 1;

        if transactions.is_empty() {
            self.prompt = RatingPromptState::Idle;
        } else if self.prompt == RatingPromptState::Idle {
            if let Some(prompt) = recently_completed_loan(&transactions, member_id, now) {
                debug!(
                    transaction_id = %prompt.transaction_id,
                    book_id = %prompt.book_id,
                    "rating prompt armed from recent return"
                );
                self.prompt = RatingPromptState::Eligible(prompt);
            }
        }

        self.all = transactions;
        self.derive();
    }

    /// Restricts the view to a single status, or clears the filter.
    pub fn set_status_filter(&mut self, filter: Option<TransactionStatus>) {
        self.status_filter = filter;
        self.derive();
    }

    fn derive(&mut self) {
        self.visible = match self.status_filter {
            Some(status) => {
                let mut subset: Vec<Transaction> = self
                    .all
                    .iter()
                    .filter(|t| t.status == status)
                    .cloned()
                    .collect();
                subset.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                subset
            }
            None => {
                let mut recent = self.all.clone();
                recent.sort_by(|a, b| {
                    let a_pending = a.status == TransactionStatus::PendingReturnApproval;
                    let b_pending = b.status == TransactionStatus::PendingReturnApproval;
                    b_pending
                        .cmp(&a_pending)
                        .then(b.created_at.cmp(&a.created_at))
                });
                recent.truncate(RECENT_TRANSACTIONS_LIMIT);
                recent
            }
        };
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.visible
    }

    pub fn all_transactions(&self) -> &[Transaction] {
        &self.all
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Concurrent open loans (active or pending return approval) held by the
    /// member in the cached set.
    pub fn active_loan_count(&self, member_id: &str) -> usize {
        self.all
            .iter()
            .filter(|t| t.member_id == member_id && t.is_open())
            .count()
    }

    /// Fast-fail advisory before a borrow attempt. The server is the
    /// enforcement authority and may still reject.
    pub fn check_loan_limit(&self, member_id: &str) -> LibraryResult<()> {
        let active = self.active_loan_count(member_id);
        if active >= MAX_CONCURRENT_LOANS {
            return Err(LibraryError::Validation(format!(
                "Loan Limit Reached ({}/{})",
                active, MAX_CONCURRENT_LOANS
            )));
        }
        Ok(())
    }

    /// Arms the prompt directly after a successful approve-return, bypassing
    /// the idle gate: the approval itself is the one-time trigger.
    pub fn notify_return_approved(&mut self, transaction: &Transaction) {
        let prompt = RatingPrompt {
            transaction_id: transaction.id.clone(),
            book_id: transaction.book_id.clone(),
        };
        let already_current = matches!(
            &self.prompt,
            RatingPromptState::Shown(existing) | RatingPromptState::Eligible(existing)
                if *existing == prompt
        );
        if !already_current {
            self.prompt = RatingPromptState::Eligible(prompt);
        }
    }

    /// Hands the prompt to the UI exactly once: the first call after the
    /// prompt becomes eligible returns it and moves the machine to `Shown`;
    /// every later call returns `None` until the set empties.
    pub fn take_rating_prompt(&mut self) -> Option<RatingPrompt> {
        if let RatingPromptState::Eligible(prompt) = self.prompt.clone() {
            self.prompt = RatingPromptState::Shown(prompt.clone());
            return Some(prompt);
        }
        None
    }

    pub fn dismiss_rating_prompt(&mut self) {
        if matches!(self.prompt, RatingPromptState::Shown(_) | RatingPromptState::Eligible(_)) {
            self.prompt = RatingPromptState::Dismissed;
        }
    }

    pub fn rating_prompt_state(&self) -> &RatingPromptState {
        &self.prompt
    }
}

impl Default for TransactionView {
    fn default() -> Self {
        Self::new()
    }
}

/// Load-time eligibility: a completed borrow belonging to the member whose
/// return date falls within the last five minutes.
fn recently_completed_loan(
    transactions: &[Transaction],
    member_id: Option<&str>,
    now: DateTime<Utc>,
) -> Option<RatingPrompt> {
    let window = Duration::seconds(RATING_PROMPT_WINDOW_SECS);
    transactions
        .iter()
        .filter(|t| {
            t.kind == TransactionType::Borrow
                && t.status == TransactionStatus::Completed
                && member_id.is_none_or(|id| t.member_id == id)
        })
        .filter(|t| {
            t.return_date
                .is_some_and(|returned| returned <= now && now - returned <= window)
        })
        .max_by_key(|t| t.return_date)
        .map(|t| RatingPrompt {
            transaction_id: t.id.clone(),
            book_id: t.book_id.clone(),
        })
}
