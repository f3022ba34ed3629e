//! reqwest-backed implementation of [`LibraryApi`].
//!
//! Error payloads are translated once, here: the server's `message` (falling
//! back to `error`) is preferred over generic strings, a `PROFILE_NOT_FOUND`
//! code maps to the account-integrity variant, and transport failures become
//! `Network`/`Timeout`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::{LibraryApi, LoginRequest, LoginResponse, RatingSubmission, RegisterRequest, ReviewSubmission};
use crate::constants::PROFILE_NOT_FOUND_CODE;
use crate::core::errors::{LibraryError, LibraryResult};
use crate::core::models::{Book, Notification, Rating, Review, Transaction, UnreadCount, User};

pub struct HttpApi {
    client: Client,
    base_url: String,
    /// Bounded timeout applied to auxiliary fetches only.
    aux_timeout: Duration,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, aux_timeout: Duration) -> Self {
        HttpApi {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            aux_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.bearer_auth(token)
    }

    fn maybe_authorized(&self, builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> LibraryResult<T> {
        let response = builder.send().await.map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn send_unit(&self, builder: RequestBuilder) -> LibraryResult<()> {
        let response = builder.send().await.map_err(transport_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> LibraryResult<T> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| LibraryError::Network(format!("invalid response body: {e}")))
    }

    async fn error_from(response: Response) -> LibraryError {
        let status = response.status();
        let payload: Option<serde_json::Value> = response.json().await.ok();

        let code = payload
            .as_ref()
            .and_then(|v| v.get("code"))
            .and_then(|c| c.as_str());
        if code == Some(PROFILE_NOT_FOUND_CODE) {
            return LibraryError::ProfileMissing;
        }

        let message = payload.as_ref().and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .or_else(|| v.get("error").and_then(|m| m.as_str()))
                .map(String::from)
        });
        debug!(status = %status, message = ?message, "request failed");
        LibraryError::from_status(status, message)
    }
}

fn transport_error(error: reqwest::Error) -> LibraryError {
    if error.is_timeout() {
        LibraryError::Timeout
    } else {
        LibraryError::Network(error.to_string())
    }
}

#[async_trait]
impl LibraryApi for HttpApi {
    async fn login(&self, request: LoginRequest) -> LibraryResult<LoginResponse> {
        self.send(self.client.post(self.url("/auth/login")).json(&request))
            .await
    }

    async fn register(&self, request: RegisterRequest) -> LibraryResult<LoginResponse> {
        self.send(self.client.post(self.url("/auth/register")).json(&request))
            .await
    }

    async fn profile(&self, token: &str) -> LibraryResult<User> {
        let builder = self.authorized(self.client.get(self.url("/auth/profile")), token);
        self.send(builder).await
    }

    async fn list_books(&self, token: Option<&str>) -> LibraryResult<Vec<Book>> {
        let builder = self.maybe_authorized(self.client.get(self.url("/books")), token);
        self.send(builder).await
    }

    async fn get_book(&self, token: Option<&str>, book_id: &str) -> LibraryResult<Book> {
        let builder = self.maybe_authorized(
            self.client.get(self.url(&format!("/books/{book_id}"))),
            token,
        );
        self.send(builder).await
    }

    async fn my_transactions(&self, token: &str) -> LibraryResult<Vec<Transaction>> {
        let builder = self.authorized(
            self.client.get(self.url("/transactions/my-transactions")),
            token,
        );
        self.send(builder).await
    }

    async fn all_transactions(&self, token: &str, book_id: Option<&str>) -> LibraryResult<Vec<Transaction>> {
        let mut builder = self.authorized(self.client.get(self.url("/transactions")), token);
        if let Some(book_id) = book_id {
            builder = builder.query(&[("bookId", book_id)]);
        }
        self.send(builder).await
    }

    async fn borrow(&self, token: &str, book_id: &str) -> LibraryResult<Transaction> {
        let builder = self
            .authorized(self.client.post(self.url("/transactions")), token)
            .json(&json!({ "bookId": book_id, "type": "borrow" }));
        self.send(builder).await
    }

    async fn return_book(&self, token: &str, transaction_id: &str) -> LibraryResult<Transaction> {
        let builder = self.authorized(
            self.client
                .patch(self.url(&format!("/transactions/{transaction_id}/return"))),
            token,
        );
        self.send(builder).await
    }

    async fn renew(&self, token: &str, transaction_id: &str) -> LibraryResult<Transaction> {
        let builder = self.authorized(
            self.client
                .patch(self.url(&format!("/transactions/{transaction_id}/renew"))),
            token,
        );
        self.send(builder).await
    }

    async fn approve_return(&self, token: &str, transaction_id: &str) -> LibraryResult<Transaction> {
        let builder = self.authorized(
            self.client
                .patch(self.url(&format!("/transactions/{transaction_id}/approve-return"))),
            token,
        );
        self.send(builder).await
    }

    async fn reject_return(
        &self,
        token: &str,
        transaction_id: &str,
        reason: Option<&str>,
    ) -> LibraryResult<Transaction> {
        let mut builder = self.authorized(
            self.client
                .patch(self.url(&format!("/transactions/{transaction_id}/reject-return"))),
            token,
        );
        if let Some(reason) = reason {
            builder = builder.json(&json!({ "reason": reason }));
        }
        self.send(builder).await
    }

    async fn submit_review(&self, token: &str, submission: ReviewSubmission) -> LibraryResult<Review> {
        let builder = self
            .authorized(self.client.post(self.url("/reviews")), token)
            .json(&submission);
        self.send(builder).await
    }

    async fn book_reviews(&self, book_id: &str) -> LibraryResult<Vec<Review>> {
        self.send(self.client.get(self.url(&format!("/reviews/book/{book_id}"))))
            .await
    }

    async fn submit_rating(&self, token: &str, submission: RatingSubmission) -> LibraryResult<Rating> {
        let builder = self
            .authorized(self.client.post(self.url("/ratings")), token)
            .json(&submission);
        self.send(builder).await
    }

    async fn average_rating(&self, book_id: &str) -> LibraryResult<f64> {
        self.send(
            self.client
                .get(self.url(&format!("/ratings/book/{book_id}/average"))),
        )
        .await
    }

    async fn notifications(&self, token: &str) -> LibraryResult<Vec<Notification>> {
        let builder = self.authorized(self.client.get(self.url("/notifications")), token);
        self.send(builder).await
    }

    async fn unread_count(&self, token: &str) -> LibraryResult<u64> {
        let builder = self
            .authorized(self.client.get(self.url("/notifications/unread-count")), token)
            .timeout(self.aux_timeout);
        let payload: UnreadCount = self.send(builder).await?;
        Ok(payload.count)
    }

    async fn mark_notification_read(&self, token: &str, notification_id: &str) -> LibraryResult<()> {
        let builder = self.authorized(
            self.client
                .patch(self.url(&format!("/notifications/{notification_id}/read"))),
            token,
        );
        self.send_unit(builder).await
    }

    async fn mark_all_notifications_read(&self, token: &str) -> LibraryResult<()> {
        let builder = self.authorized(
            self.client.post(self.url("/notifications/mark-all-read")),
            token,
        );
        self.send_unit(builder).await
    }

    async fn delete_notification(&self, token: &str, notification_id: &str) -> LibraryResult<()> {
        let builder = self.authorized(
            self.client
                .delete(self.url(&format!("/notifications/{notification_id}"))),
            token,
        );
        self.send_unit(builder).await
    }
}
