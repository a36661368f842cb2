//! Card and deck loaders
//!
//! Card definitions come as structured JSON, deck lists in a small sectioned
//! text format.

pub mod database;
pub mod deck;
pub mod game_init;

pub use database::CardDatabase;
pub use deck::{DeckEntry, DeckList, DeckLoader};
pub use game_init::GameInitializer;
