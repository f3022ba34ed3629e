pub mod book;
pub mod notification;
pub mod review;
pub mod transaction;
pub mod user;

pub use book::{Availability, Book, BookSummary};
pub use notification::{Notification, UnreadCount};
pub use review::{ApprovalStatus, Rating, Review};
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use user::{MemberSummary, User};
