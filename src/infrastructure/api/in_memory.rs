//! In-memory stand-in for the REST backend.
//!
//! Plays the server's part faithfully enough for the client to be exercised
//! without a network: it owns the authoritative transaction state, enforces
//! the loan cap and status transitions, and moderates reviews. Call counters
//! and failure switches exist so tests can assert what went over the "wire".

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LibraryApi, LoginRequest, LoginResponse, RatingSubmission, RegisterRequest, ReviewSubmission};
use crate::constants::{LENDING_PERIOD_DAYS, MAX_CONCURRENT_LOANS, MIN_REVIEW_LENGTH, RENEWAL_EXTENSION_DAYS};
use crate::core::errors::{LibraryError, LibraryResult};
use crate::core::models::{
    ApprovalStatus, Book, Notification, Rating, Review, Transaction, TransactionStatus,
    TransactionType, User,
};
use crate::core::roles;

#[derive(Clone)]
struct Account {
    user: User,
    password: String,
}

#[derive(Clone)]
pub struct InMemoryApi {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    tokens: Arc<RwLock<HashMap<String, String>>>,
    books: Arc<RwLock<HashMap<String, Book>>>,
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
    reviews: Arc<RwLock<Vec<Review>>>,
    ratings: Arc<RwLock<Vec<Rating>>>,
    notifications: Arc<RwLock<HashMap<String, Vec<Notification>>>>,
    unread_count_calls: Arc<AtomicU64>,
    borrow_calls: Arc<AtomicU64>,
    fail_profile: Arc<AtomicBool>,
    fail_unread_count: Arc<AtomicBool>,
    latency: Arc<RwLock<Option<Duration>>>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        InMemoryApi {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            tokens: Arc::new(RwLock::new(HashMap::new())),
            books: Arc::new(RwLock::new(HashMap::new())),
            transactions: Arc::new(RwLock::new(HashMap::new())),
            reviews: Arc::new(RwLock::new(Vec::new())),
            ratings: Arc::new(RwLock::new(Vec::new())),
            notifications: Arc::new(RwLock::new(HashMap::new())),
            unread_count_calls: Arc::new(AtomicU64::new(0)),
            borrow_calls: Arc::new(AtomicU64::new(0)),
            fail_profile: Arc::new(AtomicBool::new(false)),
            fail_unread_count: Arc::new(AtomicBool::new(false)),
            latency: Arc::new(RwLock::new(None)),
        }
    }

    // seeding -------------------------------------------------------------

    pub async fn seed_account(&self, user: User, password: &str) {
        let mut accounts = self.accounts.write().await;
        accounts.insert(
            user.email.clone(),
            Account {
                user,
                password: password.to_string(),
            },
        );
    }

    pub async fn seed_book(&self, book: Book) {
        let mut books = self.books.write().await;
        books.insert(book.id.clone(), book);
    }

    pub async fn seed_transaction(&self, transaction: Transaction) {
        self.store_transaction(transaction).await;
    }

    pub async fn seed_notification(&self, user_id: &str, notification: Notification) {
        let mut notifications = self.notifications.write().await;
        notifications
            .entry(user_id.to_string())
            .or_default()
            .push(notification);
    }

    /// Simulates the account-integrity failure: the token still resolves but
    /// the profile record is gone.
    pub fn set_profile_missing(&self, missing: bool) {
        self.fail_profile.store(missing, Ordering::Relaxed);
    }

    pub fn set_unread_count_failing(&self, failing: bool) {
        self.fail_unread_count.store(failing, Ordering::Relaxed);
    }

    /// Artificial delay at the head of every operation; with a paused test
    /// clock this makes in-flight overlap deterministic.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }

    // instrumentation -----------------------------------------------------

    pub fn unread_count_calls(&self) -> u64 {
        self.unread_count_calls.load(Ordering::Relaxed)
    }

    pub fn borrow_calls(&self) -> u64 {
        self.borrow_calls.load(Ordering::Relaxed)
    }

    // internals -----------------------------------------------------------

    async fn simulate_latency(&self) {
        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn require_user(&self, token: &str) -> LibraryResult<User> {
        let user_id = {
            let tokens = self.tokens.read().await;
            tokens.get(token).cloned()
        }
        .ok_or(LibraryError::Unauthenticated)?;

        if self.fail_profile.load(Ordering::Relaxed) {
            return Err(LibraryError::ProfileMissing);
        }

        let accounts = self.accounts.read().await;
        accounts
            .values()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .ok_or(LibraryError::ProfileMissing)
    }

    async fn require_staff(&self, token: &str) -> LibraryResult<User> {
        let user = self.require_user(token).await?;
        if roles::is_admin_or_librarian(Some(&user)) {
            Ok(user)
        } else {
            Err(LibraryError::Forbidden)
        }
    }

    async fn issue_token(&self, user_id: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let mut tokens = self.tokens.write().await;
        tokens.insert(token.clone(), user_id.to_string());
        token
    }

    async fn open_loan_count(&self, member_id: &str) -> usize {
        let transactions = self.transactions.read().await;
        transactions
            .values()
            .filter(|t| t.member_id == member_id && t.is_open())
            .count()
    }

    async fn set_book_status(&self, book_id: &str, status: &str) {
        let mut books = self.books.write().await;
        if let Some(book) = books.get_mut(book_id) {
            book.status = Some(status.to_string());
            book.is_available = Some(status == "available");
        }
    }

    async fn transaction(&self, transaction_id: &str) -> LibraryResult<Transaction> {
        let transactions = self.transactions.read().await;
        transactions
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound(format!("Transaction {transaction_id} not found")))
    }

    async fn store_transaction(&self, transaction: Transaction) {
        let mut transactions = self.transactions.write().await;
        transactions.insert(transaction.id.clone(), transaction);
    }
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LibraryApi for InMemoryApi {
    async fn login(&self, request: LoginRequest) -> LibraryResult<LoginResponse> {
        self.simulate_latency().await;
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(&request.email)
            .filter(|a| a.password == request.password)
            .ok_or_else(|| LibraryError::Validation("Invalid email or password".to_string()))?
            .clone();
        drop(accounts);

        let token = self.issue_token(&account.user.id).await;
        Ok(LoginResponse {
            token,
            user: Some(account.user),
        })
    }

    async fn register(&self, request: RegisterRequest) -> LibraryResult<LoginResponse> {
        self.simulate_latency().await;
        {
            let accounts = self.accounts.read().await;
            if accounts.contains_key(&request.email) {
                return Err(LibraryError::Conflict(format!(
                    "Email {} is already registered",
                    request.email
                )));
            }
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: request.email.clone(),
            name: request.name,
            role: roles::MEMBER.to_string(),
            group_id: None,
        };
        self.seed_account(user.clone(), &request.password).await;
        let token = self.issue_token(&user.id).await;
        Ok(LoginResponse {
            token,
            user: Some(user),
        })
    }

    async fn profile(&self, token: &str) -> LibraryResult<User> {
        self.simulate_latency().await;
        self.require_user(token).await
    }

    async fn list_books(&self, _token: Option<&str>) -> LibraryResult<Vec<Book>> {
        self.simulate_latency().await;
        let books = self.books.read().await;
        Ok(books.values().cloned().collect())
    }

    async fn get_book(&self, _token: Option<&str>, book_id: &str) -> LibraryResult<Book> {
        self.simulate_latency().await;
        let books = self.books.read().await;
        books
            .get(book_id)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound(format!("Book {book_id} not found")))
    }

    async fn my_transactions(&self, token: &str) -> LibraryResult<Vec<Transaction>> {
        self.simulate_latency().await;
        let user = self.require_user(token).await?;
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|t| t.member_id == user.id)
            .cloned()
            .collect())
    }

    async fn all_transactions(&self, token: &str, book_id: Option<&str>) -> LibraryResult<Vec<Transaction>> {
        self.simulate_latency().await;
        self.require_staff(token).await?;
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|t| book_id.is_none_or(|id| t.book_id == id))
            .cloned()
            .collect())
    }

    async fn borrow(&self, token: &str, book_id: &str) -> LibraryResult<Transaction> {
        self.simulate_latency().await;
        self.borrow_calls.fetch_add(1, Ordering::Relaxed);
        let user = self.require_user(token).await?;

        let book = self.get_book(Some(token), book_id).await?;
        if !book.is_borrowable() {
            return Err(LibraryError::Conflict(format!(
                "Book \"{}\" is not available for borrowing",
                book.title
            )));
        }
        if self.open_loan_count(&user.id).await >= MAX_CONCURRENT_LOANS {
            return Err(LibraryError::Conflict(format!(
                "You can only borrow {MAX_CONCURRENT_LOANS} book(s) at a time"
            )));
        }

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            member_id: user.id.clone(),
            kind: TransactionType::Borrow,
            status: TransactionStatus::Active,
            borrowed_date: Some(now),
            due_date: Some(now + ChronoDuration::days(LENDING_PERIOD_DAYS)),
            return_date: None,
            created_at: now,
            book: None,
            member: None,
        };
        self.store_transaction(transaction.clone()).await;
        self.set_book_status(book_id, "borrowed").await;
        Ok(transaction)
    }

    async fn return_book(&self, token: &str, transaction_id: &str) -> LibraryResult<Transaction> {
        self.simulate_latency().await;
        let user = self.require_user(token).await?;
        let mut transaction = self.transaction(transaction_id).await?;

        if transaction.member_id != user.id && !roles::is_admin_or_librarian(Some(&user)) {
            return Err(LibraryError::Forbidden);
        }
        if transaction.status != TransactionStatus::Active {
            return Err(LibraryError::Conflict(
                "Only an active loan can be returned".to_string(),
            ));
        }

        transaction.status = TransactionStatus::PendingReturnApproval;
        self.store_transaction(transaction.clone()).await;
        Ok(transaction)
    }

    async fn renew(&self, token: &str, transaction_id: &str) -> LibraryResult<Transaction> {
        self.simulate_latency().await;
        let user = self.require_user(token).await?;
        let mut transaction = self.transaction(transaction_id).await?;

        if transaction.member_id != user.id && !roles::is_admin_or_librarian(Some(&user)) {
            return Err(LibraryError::Forbidden);
        }
        if !transaction.is_renewable(Utc::now()) {
            return Err(LibraryError::Validation(
                "This loan can only be renewed within 2 days of its due date".to_string(),
            ));
        }

        transaction.due_date = transaction
            .due_date
            .map(|due| due + ChronoDuration::days(RENEWAL_EXTENSION_DAYS));
        self.store_transaction(transaction.clone()).await;
        Ok(transaction)
    }

    async fn approve_return(&self, token: &str, transaction_id: &str) -> LibraryResult<Transaction> {
        self.simulate_latency().await;
        self.require_staff(token).await?;
        let mut transaction = self.transaction(transaction_id).await?;

        if transaction.status != TransactionStatus::PendingReturnApproval {
            return Err(LibraryError::Conflict(
                "Only a pending return can be approved".to_string(),
            ));
        }

        transaction.status = TransactionStatus::Completed;
        transaction.return_date = Some(Utc::now());
        self.store_transaction(transaction.clone()).await;
        self.set_book_status(&transaction.book_id, "available").await;
        Ok(transaction)
    }

    async fn reject_return(
        &self,
        token: &str,
        transaction_id: &str,
        _reason: Option<&str>,
    ) -> LibraryResult<Transaction> {
        self.simulate_latency().await;
        self.require_staff(token).await?;
        let mut transaction = self.transaction(transaction_id).await?;

        if transaction.status != TransactionStatus::PendingReturnApproval {
            return Err(LibraryError::Conflict(
                "Only a pending return can be rejected".to_string(),
            ));
        }

        transaction.status = TransactionStatus::Active;
        self.store_transaction(transaction.clone()).await;
        Ok(transaction)
    }

    async fn submit_review(&self, token: &str, submission: ReviewSubmission) -> LibraryResult<Review> {
        self.simulate_latency().await;
        let user = self.require_user(token).await?;
        if submission.review.trim().len() < MIN_REVIEW_LENGTH {
            return Err(LibraryError::Validation(format!(
                "Review must be at least {MIN_REVIEW_LENGTH} characters long."
            )));
        }

        let review = Review {
            id: Uuid::new_v4().to_string(),
            book_id: submission.book_id,
            member_id: user.id,
            transaction_id: submission.transaction_id,
            review: submission.review.trim().to_string(),
            approval_status: ApprovalStatus::Pending,
            created_at: Utc::now(),
        };
        self.reviews.write().await.push(review.clone());
        Ok(review)
    }

    async fn book_reviews(&self, book_id: &str) -> LibraryResult<Vec<Review>> {
        self.simulate_latency().await;
        let reviews = self.reviews.read().await;
        Ok(reviews
            .iter()
            .filter(|r| r.book_id == book_id && r.approval_status == ApprovalStatus::Approved)
            .cloned()
            .collect())
    }

    async fn submit_rating(&self, token: &str, submission: RatingSubmission) -> LibraryResult<Rating> {
        self.simulate_latency().await;
        let user = self.require_user(token).await?;
        if !(1..=5).contains(&submission.rating) {
            return Err(LibraryError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let rating = Rating {
            id: Uuid::new_v4().to_string(),
            book_id: submission.book_id,
            member_id: user.id,
            transaction_id: submission.transaction_id,
            rating: submission.rating,
            created_at: Utc::now(),
        };
        self.ratings.write().await.push(rating.clone());
        Ok(rating)
    }

    async fn average_rating(&self, book_id: &str) -> LibraryResult<f64> {
        self.simulate_latency().await;
        let ratings = self.ratings.read().await;
        let values: Vec<u8> = ratings
            .iter()
            .filter(|r| r.book_id == book_id)
            .map(|r| r.rating)
            .collect();
        if values.is_empty() {
            return Ok(0.0);
        }
        Ok(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
    }

    async fn notifications(&self, token: &str) -> LibraryResult<Vec<Notification>> {
        self.simulate_latency().await;
        let user = self.require_user(token).await?;
        let notifications = self.notifications.read().await;
        Ok(notifications.get(&user.id).cloned().unwrap_or_default())
    }

    async fn unread_count(&self, token: &str) -> LibraryResult<u64> {
        self.simulate_latency().await;
        self.unread_count_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_unread_count.load(Ordering::Relaxed) {
            return Err(LibraryError::Timeout);
        }
        let user = self.require_user(token).await?;
        let notifications = self.notifications.read().await;
        Ok(notifications
            .get(&user.id)
            .map(|list| list.iter().filter(|n| !n.read).count() as u64)
            .unwrap_or(0))
    }

    async fn mark_notification_read(&self, token: &str, notification_id: &str) -> LibraryResult<()> {
        self.simulate_latency().await;
        let user = self.require_user(token).await?;
        let mut notifications = self.notifications.write().await;
        let list = notifications
            .get_mut(&user.id)
            .ok_or_else(|| LibraryError::NotFound("Notification not found".to_string()))?;
        let notification = list
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| LibraryError::NotFound("Notification not found".to_string()))?;
        notification.read = true;
        Ok(())
    }

    async fn mark_all_notifications_read(&self, token: &str) -> LibraryResult<()> {
        self.simulate_latency().await;
        let user = self.require_user(token).await?;
        let mut notifications = self.notifications.write().await;
        if let Some(list) = notifications.get_mut(&user.id) {
            for notification in list.iter_mut() {
                notification.read = true;
            }
        }
        Ok(())
    }

    async fn delete_notification(&self, token: &str, notification_id: &str) -> LibraryResult<()> {
        self.simulate_latency().await;
        let user = self.require_user(token).await?;
        let mut notifications = self.notifications.write().await;
        let list = notifications
            .get_mut(&user.id)
            .ok_or_else(|| LibraryError::NotFound("Notification not found".to_string()))?;
        let before = list.len();
        list.retain(|n| n.id != notification_id);
        if list.len() == before {
            return Err(LibraryError::NotFound("Notification not found".to_string()));
        }
        Ok(())
    }
}
