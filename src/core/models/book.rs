use serde::{Deserialize, Serialize};

/// Canonical availability derived from the wire representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    Available,
    Borrowed,
    Reserved,
    Damaged,
}

/// A catalog record. Depending on the API version the wire carries either a
/// `status` string or an `isAvailable` boolean; both are kept verbatim here
/// and resolved once through [`Book::availability`]. Nothing downstream
/// should read the raw fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub for_sale: bool,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub count: Option<u32>,
}

impl Book {
    /// Resolves the dual wire representation. The `status` string wins when
    /// it names a known state; an unknown or absent string falls back to the
    /// legacy `isAvailable` flag, and an absent flag means not available.
    pub fn availability(&self) -> Availability {
        if let Some(status) = self.status.as_deref() {
            match status.trim().to_lowercase().as_str() {
                "available" => return Availability::Available,
                "borrowed" | "with_me" => return Availability::Borrowed,
                "reserved" => return Availability::Reserved,
                "damaged" => return Availability::Damaged,
                _ => {}
            }
        }
        if self.is_available.unwrap_or(false) {
            Availability::Available
        } else {
            Availability::Borrowed
        }
    }

    pub fn is_borrowable(&self) -> bool {
        self.availability() == Availability::Available
    }
}

/// Compact book record embedded in transaction listings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub title: String,
    #[serde(default)]
    pub isbn: Option<String>,
}
