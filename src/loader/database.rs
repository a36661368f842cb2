//! Card database for looking up card definitions
//!
//! Definitions are loaded from a single JSON file (one object or an array)
//! or from a directory tree of `*.json` files. Directories are walked with
//! jwalk and the files parsed in parallel with rayon; insertion happens in
//! sorted path order so duplicate detection is deterministic.

use crate::effects::{CardDefinition, CardLookup};
use crate::{EngineError, Result};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
#[serde(untagged)]
enum CardFile {
    Many(Vec<CardDefinition>),
    One(Box<CardDefinition>),
}

/// Database of card definitions keyed by card id
#[derive(Debug, Default)]
pub struct CardDatabase {
    cards: FxHashMap<String, CardDefinition>,
    /// Reject cards carrying unknown rule keywords
    strict: bool,
}

impl CardDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        CardDatabase::default()
    }

    /// Create an empty database that rejects unknown keywords
    pub fn strict() -> Self {
        CardDatabase {
            cards: FxHashMap::default(),
            strict: true,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Build a database from definitions already in memory
    pub fn from_definitions(definitions: impl IntoIterator<Item = CardDefinition>) -> Result<Self> {
        let mut db = CardDatabase::new();
        for def in definitions {
            db.add_card(def)?;
        }
        Ok(db)
    }

    /// Load definitions from a JSON file or a directory of JSON files
    pub fn load_from_path(path: &Path, strict: bool) -> Result<Self> {
        if !path.exists() {
            return Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("card path not found: {path:?}"),
            )));
        }
        let mut db = if strict {
            CardDatabase::strict()
        } else {
            CardDatabase::new()
        };

        let files = if path.is_dir() {
            Self::json_files(path)?
        } else {
            vec![path.to_path_buf()]
        };

        let parsed: Vec<Vec<CardDefinition>> = files
            .par_iter()
            .map(|file| Self::parse_file(file))
            .collect::<Result<_>>()?;

        for def in parsed.into_iter().flatten() {
            db.add_card(def)?;
        }
        Ok(db)
    }

    /// Every `*.json` file under `dir`, sorted
    fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in jwalk::WalkDir::new(dir).sort(true) {
            let entry = entry.map_err(|e| {
                EngineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            })?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().and_then(|s| s.to_str()) == Some("json")
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Parse one JSON file holding a definition or an array of definitions
    pub fn parse_file(path: &Path) -> Result<Vec<CardDefinition>> {
        let json = std::fs::read_to_string(path)?;
        Self::parse_str(&json).map_err(|e| {
            EngineError::InvalidCardData(format!("{}: {e}", path.display()))
        })
    }

    pub fn parse_str(json: &str) -> Result<Vec<CardDefinition>> {
        Ok(match serde_json::from_str::<CardFile>(json)? {
            CardFile::Many(defs) => defs,
            CardFile::One(def) => vec![*def],
        })
    }

    /// Add a single card definition to the database
    pub fn add_card(&mut self, def: CardDefinition) -> Result<()> {
        def.validate()?;
        if self.strict {
            let unknown = def.unknown_keywords();
            if !unknown.is_empty() {
                return Err(EngineError::InvalidCardData(format!(
                    "{} uses unknown rule keywords: {}",
                    def.id,
                    unknown.join(", ")
                )));
            }
        }
        let key = def.id.as_str().to_string();
        if self.cards.contains_key(&key) {
            return Err(EngineError::InvalidCardData(format!(
                "duplicate card id {key}"
            )));
        }
        self.cards.insert(key, def);
        Ok(())
    }

    /// Look up a card by id
    pub fn get_card(&self, id: &str) -> Option<&CardDefinition> {
        self.cards.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cards.contains_key(id)
    }

    /// Total number of cards in database
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card ids in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.cards.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Cards with rule keywords the engine does not implement, sorted by id
    pub fn unknown_keywords(&self) -> Vec<(String, Vec<String>)> {
        self.ids()
            .into_iter()
            .filter_map(|id| {
                let unknown = self.cards.get(id)?.unknown_keywords();
                (!unknown.is_empty()).then(|| (id.to_string(), unknown))
            })
            .collect()
    }
}

impl CardLookup for CardDatabase {
    fn lookup(&self, id: &str) -> Option<&CardDefinition> {
        self.cards.get(id)
    }
}
