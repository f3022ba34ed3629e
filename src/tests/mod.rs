mod roles_tests;
mod session_tests;
mod view_tests;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::core::models::{
    Book, Notification, Transaction, TransactionStatus, TransactionType, User,
};
use crate::infrastructure::api::in_memory::InMemoryApi;
use crate::infrastructure::api::{LibraryApi, LoginRequest};

pub fn test_user(id: &str, role: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: id.to_string(),
        role: role.to_string(),
        group_id: None,
    }
}

pub fn test_book(id: &str, title: &str) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: "Test Author".to_string(),
        isbn: "978-0000000000".to_string(),
        status: Some("available".to_string()),
        is_available: Some(true),
        for_sale: false,
        price: None,
        count: Some(1),
    }
}

pub fn test_transaction(
    id: &str,
    book_id: &str,
    member_id: &str,
    status: TransactionStatus,
    created_at: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        book_id: book_id.to_string(),
        member_id: member_id.to_string(),
        kind: TransactionType::Borrow,
        status,
        borrowed_date: Some(created_at),
        due_date: Some(created_at + Duration::days(30)),
        return_date: None,
        created_at,
        book: None,
        member: None,
    }
}

pub fn test_notification(id: &str, read: bool) -> Notification {
    Notification {
        id: id.to_string(),
        title: format!("Notification {id}"),
        message: "Something happened".to_string(),
        kind: Some("info".to_string()),
        read,
        created_at: Utc::now(),
    }
}

/// Backend double with a staff account (mixed-case role on purpose), a
/// librarian, a member and a few available books.
pub async fn seeded_api() -> Arc<InMemoryApi> {
    let api = Arc::new(InMemoryApi::new());
    api.seed_account(test_user("admin1", "Admin"), "secret").await;
    api.seed_account(test_user("lib1", "librarian"), "secret").await;
    api.seed_account(test_user("mem1", "member"), "secret").await;
    api.seed_book(test_book("b1", "The Left Hand of Darkness")).await;
    api.seed_book(test_book("b2", "Snow Crash")).await;
    api.seed_book(test_book("b3", "A Memory Called Empire")).await;
    api
}

pub async fn login_as(api: &InMemoryApi, id: &str) -> (String, User) {
    let response = api
        .login(LoginRequest {
            email: format!("{id}@example.com"),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    let user = response.user.clone().unwrap();
    (response.token, user)
}
