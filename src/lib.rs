pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;
pub mod poller;
pub mod session;

pub use crate::core::errors::{LibraryError, LibraryResult};
pub use crate::core::services::{BookDetails, CatalogService, TransactionService};
pub use crate::core::view::{RatingPrompt, RatingPromptState, TransactionView};
pub use crate::infrastructure::api::LibraryApi;
pub use crate::infrastructure::api::http::HttpApi;
pub use crate::infrastructure::api::in_memory::InMemoryApi;
pub use crate::infrastructure::token::{FileTokenStore, InMemoryTokenStore, TokenStore};
pub use crate::poller::{PollerHandle, Visibility};
pub use crate::session::{Session, SessionRedirect, SessionState};

#[cfg(test)]
mod tests;
