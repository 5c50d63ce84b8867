//! Data models for mochi.
//!
//! - Card
//! - Deck

pub mod card;
pub mod deck;

pub use card::{index_by_id, Card};
pub use deck::Deck;
