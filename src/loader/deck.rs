//! Deck list loader
//!
//! ```text
//! # Red aggro
//! [Leader]
//! 1 OP01-001
//!
//! [Main]
//! 4 OP01-013
//! 4xOP01-016
//! ```
//!
//! Card references are definition ids. Lines in any other `[Section]` are
//! ignored.

use crate::{EngineError, Result};
use std::fs;
use std::path::Path;

/// Deck loader for deck list files
pub struct DeckLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Leader,
    Main,
    Other,
}

impl DeckLoader {
    /// Load a deck from a file
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a deck from its text content
    pub fn parse(content: &str) -> Result<DeckList> {
        let mut leaders = Vec::new();
        let mut main_deck = Vec::new();
        let mut section = Section::Main;

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = match name.trim().to_ascii_lowercase().as_str() {
                    "leader" => Section::Leader,
                    "main" | "deck" => Section::Main,
                    _ => Section::Other,
                };
                continue;
            }
            if section == Section::Other {
                continue;
            }

            let entry = Self::parse_entry(line).ok_or_else(|| {
                EngineError::InvalidDeckFormat(format!("line {}: cannot parse {line:?}", number + 1))
            })?;
            match section {
                Section::Leader => leaders.push(entry),
                _ => main_deck.push(entry),
            }
        }

        let leader = match leaders.as_slice() {
            [one] if one.count == 1 => one.card_id.clone(),
            [] => return Err(EngineError::InvalidDeckFormat("no leader".to_string())),
            _ => {
                return Err(EngineError::InvalidDeckFormat(
                    "a deck has exactly one leader".to_string(),
                ))
            }
        };
        if main_deck.is_empty() {
            return Err(EngineError::InvalidDeckFormat("Empty deck".to_string()));
        }

        Ok(DeckList { leader, main_deck })
    }

    /// "4 OP01-013", "4xOP01-013" or "4x OP01-013"
    fn parse_entry(line: &str) -> Option<DeckEntry> {
        let digits = line.find(|c: char| !c.is_ascii_digit())?;
        if digits == 0 {
            return None;
        }
        let count: u8 = line[..digits].parse().ok()?;
        let rest = line[digits..].trim_start();
        let rest = rest
            .strip_prefix('x')
            .or_else(|| rest.strip_prefix('X'))
            .unwrap_or(rest)
            .trim();
        if count == 0 || rest.is_empty() || rest.contains(char::is_whitespace) {
            return None;
        }
        Some(DeckEntry {
            card_id: rest.to_string(),
            count,
        })
    }
}

/// Represents a deck entry (card id and count)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    pub card_id: String,
    pub count: u8,
}

/// Represents a complete deck list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckList {
    pub leader: String,
    pub main_deck: Vec<DeckEntry>,
}

impl DeckList {
    /// Total cards in main deck
    pub fn total_cards(&self) -> usize {
        self.main_deck.iter().map(|e| e.count as usize).sum()
    }
}
