//! The REST backend seam. Everything the client says to the server goes
//! through [`LibraryApi`], so the rest of the crate never sees a URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::LibraryResult;
use crate::core::models::{Book, Notification, Rating, Review, Transaction, User};

pub mod http;
pub mod in_memory;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The login endpoint may return a partial user record; the session follows
/// up with a profile fetch and only falls back to this copy if that fails.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    pub book_id: String,
    pub review: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    pub book_id: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

#[async_trait]
pub trait LibraryApi: Send + Sync {
    // auth
    async fn login(&self, request: LoginRequest) -> LibraryResult<LoginResponse>;
    async fn register(&self, request: RegisterRequest) -> LibraryResult<LoginResponse>;
    async fn profile(&self, token: &str) -> LibraryResult<User>;

    // catalog (anonymous access allowed)
    async fn list_books(&self, token: Option<&str>) -> LibraryResult<Vec<Book>>;
    async fn get_book(&self, token: Option<&str>, book_id: &str) -> LibraryResult<Book>;

    // transactions
    async fn my_transactions(&self, token: &str) -> LibraryResult<Vec<Transaction>>;
    async fn all_transactions(&self, token: &str, book_id: Option<&str>) -> LibraryResult<Vec<Transaction>>;
    async fn borrow(&self, token: &str, book_id: &str) -> LibraryResult<Transaction>;
    async fn return_book(&self, token: &str, transaction_id: &str) -> LibraryResult<Transaction>;
    async fn renew(&self, token: &str, transaction_id: &str) -> LibraryResult<Transaction>;
    async fn approve_return(&self, token: &str, transaction_id: &str) -> LibraryResult<Transaction>;
    async fn reject_return(
        &self,
        token: &str,
        transaction_id: &str,
        reason: Option<&str>,
    ) -> LibraryResult<Transaction>;

    // reviews and ratings
    async fn submit_review(&self, token: &str, submission: ReviewSubmission) -> LibraryResult<Review>;
    async fn book_reviews(&self, book_id: &str) -> LibraryResult<Vec<Review>>;
    async fn submit_rating(&self, token: &str, submission: RatingSubmission) -> LibraryResult<Rating>;
    async fn average_rating(&self, book_id: &str) -> LibraryResult<f64>;

    // notifications
    async fn notifications(&self, token: &str) -> LibraryResult<Vec<Notification>>;
    async fn unread_count(&self, token: &str) -> LibraryResult<u64>;
    async fn mark_notification_read(&self, token: &str, notification_id: &str) -> LibraryResult<()>;
    async fn mark_all_notifications_read(&self, token: &str) -> LibraryResult<()>;
    async fn delete_notification(&self, token: &str, notification_id: &str) -> LibraryResult<()>;
}
