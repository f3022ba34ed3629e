use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::join;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::constants::MIN_REVIEW_LENGTH;
use crate::core::errors::{LibraryError, LibraryResult};
use crate::core::models::{Book, Rating, Review, Transaction, TransactionStatus, User};
use crate::core::roles;
use crate::core::view::{RatingPrompt, RatingPromptState, TransactionView};
use crate::infrastructure::api::{LibraryApi, RatingSubmission, ReviewSubmission};

/// Client-side coordinator for the borrow/return/approval workflow.
///
/// Every mutation is fire-and-confirm: the server call goes first, then the
/// authoritative list is re-fetched into the view. No transaction status is
/// ever patched locally.
pub struct TransactionService<A: LibraryApi> {
    api: Arc<A>,
    view: Mutex<TransactionView>,
    in_flight: Mutex<HashSet<String>>,
}

impl<A: LibraryApi> TransactionService<A> {
    pub fn new(api: Arc<A>) -> Self {
        TransactionService {
            api,
            view: Mutex::new(TransactionView::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Runs `operation` under a per-action slot so a second identical request
    /// is refused while the first is still in flight.
    async fn with_guard<T>(
        &self,
        key: String,
        operation: impl Future<Output = LibraryResult<T>>,
    ) -> LibraryResult<T> {
        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(key.clone()) {
                debug!(%key, "duplicate submission refused");
                return Err(LibraryError::Conflict(
                    "This action is already in progress".to_string(),
                ));
            }
        }
        let result = operation.await;
        self.in_flight.lock().await.remove(&key);
        result
    }

    /// Role decides the endpoint: staff see every record, members only their
    /// own. The book filter is applied client-side on the self-scoped path
    /// only; the admin endpoint filters server-side.
    async fn fetch_list(
        &self,
        token: &str,
        user: &User,
        book_id: Option<&str>,
    ) -> LibraryResult<Vec<Transaction>> {
        if roles::is_admin_or_librarian(Some(user)) {
            self.api.all_transactions(token, book_id).await
        } else {
            let mut transactions = self.api.my_transactions(token).await?;
            if let Some(book_id) = book_id {
                transactions.retain(|t| t.book_id == book_id);
            }
            Ok(transactions)
        }
    }

    /// Re-fetches the authoritative list and rebuilds the derived view.
    pub async fn refresh(&self, token: &str, user: &User) -> LibraryResult<Vec<Transaction>> {
        let transactions = self.fetch_list(token, user, None).await?;
        let mut view = self.view.lock().await;
        view.set_transactions(transactions, Some(&user.id), Utc::now());
        Ok(view.transactions().to_vec())
    }

    pub async fn refresh_for_book(
        &self,
        token: &str,
        user: &User,
        book_id: &str,
    ) -> LibraryResult<Vec<Transaction>> {
        let transactions = self.fetch_list(token, user, Some(book_id)).await?;
        let mut view = self.view.lock().await;
        view.set_transactions(transactions, Some(&user.id), Utc::now());
        Ok(view.transactions().to_vec())
    }

    pub async fn borrow(&self, token: &str, user: &User, book_id: &str) -> LibraryResult<Transaction> {
        self.with_guard(format!("borrow:{book_id}"), async {
            // Fast-fail on what the cache already shows, before any network
            // traffic. The server remains the enforcement authority.
            {
                let view = self.view.lock().await;
                view.check_loan_limit(&user.id)?;
            }

            // Refresh the advisory state; if the listing fails we still let
            // the server arbitrate the borrow itself.
            match self.fetch_list(token, user, None).await {
                Ok(transactions) => {
                    let mut view = self.view.lock().await;
                    view.set_transactions(transactions, Some(&user.id), Utc::now());
                    view.check_loan_limit(&user.id)?;
                }
                Err(e) => warn!(error = %e, "could not refresh loan state before borrow"),
            }

            info!(book_id, member_id = %user.id, "borrowing book");
            let transaction = self.api.borrow(token, book_id).await?;
            self.refresh(token, user).await?;
            Ok(transaction)
        })
        .await
    }

    /// Requests a return: `active -> pending_return_approval`. The book stays
    /// unavailable until an approver acts.
    pub async fn return_book(
        &self,
        token: &str,
        user: &User,
        transaction_id: &str,
    ) -> LibraryResult<Transaction> {
        self.with_guard(format!("return:{transaction_id}"), async {
            info!(transaction_id, "requesting return");
            let transaction = self.api.return_book(token, transaction_id).await?;
            self.refresh(token, user).await?;
            Ok(transaction)
        })
        .await
    }

    pub async fn renew(&self, token: &str, user: &User, transaction_id: &str) -> LibraryResult<Transaction> {
        self.with_guard(format!("renew:{transaction_id}"), async {
            {
                let view = self.view.lock().await;
                let cached = view
                    .all_transactions()
                    .iter()
                    .find(|t| t.id == transaction_id);
                if let Some(cached) = cached {
                    if !cached.is_renewable(Utc::now()) {
                        return Err(LibraryError::Validation(
                            "This loan can only be renewed within 2 days of its due date"
                                .to_string(),
                        ));
                    }
                }
            }

            info!(transaction_id, "renewing loan");
            let transaction = self.api.renew(token, transaction_id).await?;
            self.refresh(token, user).await?;
            Ok(transaction)
        })
        .await
    }

    /// Staff only: `pending_return_approval -> completed`, frees the book and
    /// arms the rating prompt for the finished loan.
    pub async fn approve_return(
        &self,
        token: &str,
        user: &User,
        transaction_id: &str,
    ) -> LibraryResult<Transaction> {
        if !roles::is_admin_or_librarian(Some(user)) {
            return Err(LibraryError::Forbidden);
        }
        self.with_guard(format!("approve:{transaction_id}"), async {
            info!(transaction_id, approver = %user.id, "approving return");
            let transaction = self.api.approve_return(token, transaction_id).await?;
            self.refresh(token, user).await?;
            self.view.lock().await.notify_return_approved(&transaction);
            Ok(transaction)
        })
        .await
    }

    /// Staff only: `pending_return_approval -> active`. No prompt.
    pub async fn reject_return(
        &self,
        token: &str,
        user: &User,
        transaction_id: &str,
        reason: Option<&str>,
    ) -> LibraryResult<Transaction> {
        if !roles::is_admin_or_librarian(Some(user)) {
            return Err(LibraryError::Forbidden);
        }
        self.with_guard(format!("reject:{transaction_id}"), async {
            info!(transaction_id, approver = %user.id, "rejecting return");
            let transaction = self.api.reject_return(token, transaction_id, reason).await?;
            self.refresh(token, user).await?;
            Ok(transaction)
        })
        .await
    }

    // view accessors ------------------------------------------------------

    pub async fn visible_transactions(&self) -> Vec<Transaction> {
        self.view.lock().await.transactions().to_vec()
    }

    pub async fn set_status_filter(&self, filter: Option<TransactionStatus>) -> Vec<Transaction> {
        let mut view = self.view.lock().await;
        view.set_status_filter(filter);
        view.transactions().to_vec()
    }

    pub async fn active_loan_count(&self, member_id: &str) -> usize {
        self.view.lock().await.active_loan_count(member_id)
    }

    /// Surfaces the rating prompt at most once; see [`TransactionView`].
    pub async fn take_rating_prompt(&self) -> Option<RatingPrompt> {
        self.view.lock().await.take_rating_prompt()
    }

    pub async fn dismiss_rating_prompt(&self) {
        self.view.lock().await.dismiss_rating_prompt();
    }

    pub async fn rating_prompt_state(&self) -> RatingPromptState {
        self.view.lock().await.rating_prompt_state().clone()
    }
}

/// Everything the UI shows on a book page, fetched together.
#[derive(Clone, Debug)]
pub struct BookDetails {
    pub book: Book,
    pub reviews: Vec<Review>,
    pub average_rating: f64,
}

/// Catalog browsing plus review/rating submission. Submissions carry the
/// transaction id forwarded by the rating prompt so the backend can link
/// them to the specific loan.
pub struct CatalogService<A: LibraryApi> {
    api: Arc<A>,
}

impl<A: LibraryApi> CatalogService<A> {
    pub fn new(api: Arc<A>) -> Self {
        CatalogService { api }
    }

    pub async fn list_books(&self, token: Option<&str>) -> LibraryResult<Vec<Book>> {
        self.api.list_books(token).await
    }

    /// Book record plus reviews and average rating. Only the book fetch is
    /// fatal; the auxiliary fetches degrade to empty/zero.
    pub async fn book_details(&self, token: Option<&str>, book_id: &str) -> LibraryResult<BookDetails> {
        let (book, reviews, average) = join!(
            self.api.get_book(token, book_id),
            self.api.book_reviews(book_id),
            self.api.average_rating(book_id),
        );

        let reviews = reviews.unwrap_or_else(|e| {
            warn!(book_id, error = %e, "could not fetch reviews");
            Vec::new()
        });
        let average_rating = average.unwrap_or_else(|e| {
            warn!(book_id, error = %e, "could not fetch average rating");
            0.0
        });

        Ok(BookDetails {
            book: book?,
            reviews,
            average_rating,
        })
    }

    pub async fn submit_review(
        &self,
        token: &str,
        book_id: &str,
        review: &str,
        prompt: Option<&RatingPrompt>,
    ) -> LibraryResult<Review> {
        let trimmed = review.trim();
        if trimmed.is_empty() {
            return Err(LibraryError::Validation(
                "Please enter a review before submitting.".to_string(),
            ));
        }
        if trimmed.len() < MIN_REVIEW_LENGTH {
            return Err(LibraryError::Validation(format!(
                "Review must be at least {MIN_REVIEW_LENGTH} characters long."
            )));
        }

        self.api
            .submit_review(
                token,
                ReviewSubmission {
                    book_id: book_id.to_string(),
                    review: trimmed.to_string(),
                    transaction_id: prompt.map(|p| p.transaction_id.clone()),
                },
            )
            .await
    }

    pub async fn submit_rating(
        &self,
        token: &str,
        book_id: &str,
        rating: u8,
        prompt: Option<&RatingPrompt>,
    ) -> LibraryResult<Rating> {
        if !(1..=5).contains(&rating) {
            return Err(LibraryError::Validation(
                "Please select a rating between 1 and 5 stars.".to_string(),
            ));
        }

        self.api
            .submit_rating(
                token,
                RatingSubmission {
                    book_id: book_id.to_string(),
                    rating,
                    transaction_id: prompt.map(|p| p.transaction_id.clone()),
                },
            )
            .await
    }
}
