use chrono::{Duration, Utc};

use crate::core::errors::LibraryError;
use crate::core::models::{TransactionStatus, TransactionType};
use crate::core::view::{RatingPromptState, TransactionView};
use crate::tests::test_transaction;

#[test]
fn unfiltered_view_is_capped_and_pending_sorts_first() {
    let now = Utc::now();
    let mut transactions = Vec::new();
    for i in 0..12 {
        let status = if i % 4 == 0 {
            TransactionStatus::PendingReturnApproval
        } else {
            TransactionStatus::Active
        };
        transactions.push(test_transaction(
            &format!("t{i}"),
            "b1",
            "mem1",
            status,
            now - Duration::hours(i),
        ));
    }

    let mut view = TransactionView::new();
    view.set_transactions(transactions, Some("mem1"), now);

    let visible = view.transactions();
    assert_eq!(visible.len(), 10);

    // Every pending record precedes every non-pending record.
    let first_non_pending = visible
        .iter()
        .position(|t| t.status != TransactionStatus::PendingReturnApproval)
        .unwrap();
    assert!(
        visible[first_non_pending..]
            .iter()
            .all(|t| t.status != TransactionStatus::PendingReturnApproval)
    );

    // Ties broken by created_at descending within each group.
    for pair in visible[first_non_pending..].windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[test]
fn status_filter_is_a_hard_filter() {
    let now = Utc::now();
    let transactions = vec![
        test_transaction("t1", "b1", "mem1", TransactionStatus::Active, now),
        test_transaction("t2", "b2", "mem1", TransactionStatus::Completed, now - Duration::hours(1)),
        test_transaction("t3", "b3", "mem1", TransactionStatus::Completed, now),
    ];

    let mut view = TransactionView::new();
    view.set_transactions(transactions, Some("mem1"), now);
    view.set_status_filter(Some(TransactionStatus::Completed));

    let visible = view.transactions();
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|t| t.status == TransactionStatus::Completed));
    assert_eq!(visible[0].id, "t3");

    view.set_status_filter(None);
    assert_eq!(view.transactions().len(), 3);
}

#[test]
fn loan_limit_blocks_at_cap_with_exact_message() {
    let now = Utc::now();
    let mut view = TransactionView::new();
    view.set_transactions(
        vec![
            test_transaction("t1", "b1", "mem1", TransactionStatus::Active, now),
            test_transaction("t2", "b2", "mem1", TransactionStatus::PendingReturnApproval, now),
            test_transaction("t3", "b3", "other", TransactionStatus::Active, now),
        ],
        Some("mem1"),
        now,
    );

    assert_eq!(view.active_loan_count("mem1"), 2);
    let err = view.check_loan_limit("mem1").unwrap_err();
    assert_eq!(
        err,
        LibraryError::Validation("Loan Limit Reached (2/2)".to_string())
    );

    // The other member only holds one open loan.
    assert!(view.check_loan_limit("other").is_ok());
}

#[test]
fn completed_and_cancelled_do_not_count_against_the_cap() {
    let now = Utc::now();
    let mut view = TransactionView::new();
    view.set_transactions(
        vec![
            test_transaction("t1", "b1", "mem1", TransactionStatus::Completed, now),
            test_transaction("t2", "b2", "mem1", TransactionStatus::Cancelled, now),
            test_transaction("t3", "b3", "mem1", TransactionStatus::Active, now),
        ],
        Some("mem1"),
        now,
    );
    assert_eq!(view.active_loan_count("mem1"), 1);
    assert!(view.check_loan_limit("mem1").is_ok());
}

#[test]
fn recent_return_arms_the_prompt_once_per_set() {
    let now = Utc::now();
    let mut completed = test_transaction("t1", "b1", "mem1", TransactionStatus::Completed, now);
    completed.return_date = Some(now - Duration::minutes(2));

    let mut view = TransactionView::new();
    view.set_transactions(vec![completed.clone()], Some("mem1"), now);

    let prompt = view.take_rating_prompt().unwrap();
    assert_eq!(prompt.transaction_id, "t1");
    assert_eq!(prompt.book_id, "b1");

    // Re-render: nothing more to take.
    assert!(view.take_rating_prompt().is_none());

    // A fresh non-empty fetch does not re-arm the latch.
    view.set_transactions(vec![completed.clone()], Some("mem1"), now);
    assert!(view.take_rating_prompt().is_none());

    // Empty set resets; repopulating arms it again.
    view.set_transactions(Vec::new(), Some("mem1"), now);
    assert_eq!(*view.rating_prompt_state(), RatingPromptState::Idle);
    view.set_transactions(vec![completed], Some("mem1"), now);
    assert!(view.take_rating_prompt().is_some());
}

#[test]
fn stale_or_foreign_returns_do_not_arm_the_prompt() {
    let now = Utc::now();

    let mut stale = test_transaction("t1", "b1", "mem1", TransactionStatus::Completed, now);
    stale.return_date = Some(now - Duration::minutes(6));

    let mut foreign = test_transaction("t2", "b2", "other", TransactionStatus::Completed, now);
    foreign.return_date = Some(now - Duration::minutes(1));

    let mut view = TransactionView::new();
    view.set_transactions(vec![stale, foreign], Some("mem1"), now);
    assert!(view.take_rating_prompt().is_none());
}

#[test]
fn dismissed_prompt_stays_dismissed_until_reset() {
    let now = Utc::now();
    let mut completed = test_transaction("t1", "b1", "mem1", TransactionStatus::Completed, now);
    completed.return_date = Some(now - Duration::minutes(1));

    let mut view = TransactionView::new();
    view.set_transactions(vec![completed.clone()], Some("mem1"), now);
    view.dismiss_rating_prompt();
    assert_eq!(*view.rating_prompt_state(), RatingPromptState::Dismissed);
    assert!(view.take_rating_prompt().is_none());

    view.set_transactions(vec![completed], Some("mem1"), now);
    assert!(view.take_rating_prompt().is_none());
}

#[test]
fn approval_notification_arms_the_prompt_directly() {
    let now = Utc::now();
    let approved = test_transaction("t9", "b2", "mem1", TransactionStatus::Completed, now);

    let mut view = TransactionView::new();
    view.set_transactions(
        vec![test_transaction("t1", "b1", "mem1", TransactionStatus::Active, now)],
        Some("mem1"),
        now,
    );
    view.notify_return_approved(&approved);

    let prompt = view.take_rating_prompt().unwrap();
    assert_eq!(prompt.transaction_id, "t9");
    assert!(view.take_rating_prompt().is_none());
}

#[test]
fn renewal_window_is_one_to_two_days_inclusive() {
    let now = Utc::now();
    let mut t = test_transaction("t1", "b1", "mem1", TransactionStatus::Active, now);

    t.due_date = Some(now + Duration::days(1));
    assert!(t.is_renewable(now));
    t.due_date = Some(now + Duration::days(2));
    assert!(t.is_renewable(now));

    t.due_date = Some(now + Duration::hours(12));
    assert!(!t.is_renewable(now));
    t.due_date = Some(now + Duration::days(3));
    assert!(!t.is_renewable(now));
    t.due_date = None;
    assert!(!t.is_renewable(now));

    let mut pending = test_transaction("t2", "b1", "mem1", TransactionStatus::PendingReturnApproval, now);
    pending.due_date = Some(now + Duration::days(1));
    assert!(!pending.is_renewable(now));

    let mut kind_check = test_transaction("t3", "b1", "mem1", TransactionStatus::Active, now);
    kind_check.due_date = Some(now + Duration::days(1) + Duration::hours(12));
    assert_eq!(kind_check.kind, TransactionType::Borrow);
    assert!(kind_check.is_renewable(now));
}
