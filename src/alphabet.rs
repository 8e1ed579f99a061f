//! The residue alphabet. It fixes the dimension of composition vectors and the
//! mapping from vector slot to residue symbol, so it must be identical between
//! database build and request time. It is dumped in json form beside the database
//! file so that coherence can be checked at reload.

use std::fs::OpenOptions;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::to_writer;

use crate::error::CompError;

/// the 20 standard amino acids plus the X placeholder for translated unknowns
pub const AMINO_ACIDS: &str = "ARNDCQEGHILKMFPSTWYVX";

/// An ordered set of recognized one-character residue symbols.
/// Symbols are unique and uppercase; any symbol outside the set is classified foreign.
/// Immutable once built, shared by reference everywhere dimensionality matters.
#[derive(Clone, Serialize, Deserialize)]
pub struct Alphabet {
    symbols: String,
}

impl Default for Alphabet {
    fn default() -> Self {
        Alphabet::new(AMINO_ACIDS)
    }
} // end of Default for Alphabet

impl Alphabet {
    /// panics if symbols are not unique, that is a configuration error not a data error
    pub fn new(symbols: &str) -> Self {
        let upper = symbols.to_uppercase();
        for (i, c) in upper.chars().enumerate() {
            assert!(
                !upper.chars().take(i).any(|s| s == c),
                "alphabet symbols must be unique, got duplicate {}",
                c
            );
        }
        Alphabet { symbols: upper }
    } // end of new

    /// number of recognized symbols, the K of composition vectors
    pub fn get_size(&self) -> usize {
        self.symbols.chars().count()
    }

    pub fn get_symbols(&self) -> &str {
        &self.symbols
    }

    /// slot of symbol c in the fixed order, None if c is foreign
    pub fn index_of(&self, c: char) -> Option<usize> {
        self.symbols.chars().position(|s| s == c)
    }

    pub fn is_foreign(&self, c: char) -> bool {
        self.index_of(c).is_none()
    }

    /// dump in json format, used as database sidecar to check coherence at reload
    pub fn dump_json(&self, filepath: &Path) -> Result<(), CompError> {
        log::info!("dumping Alphabet in json file : {:?}", filepath);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(filepath)?;
        let mut writer = BufWriter::new(file);
        to_writer(&mut writer, &self)?;
        Ok(())
    } // end of dump_json

    /// reload from a json dump. Used at database load to ensure coherence with database constitution
    pub fn reload_json(filepath: &Path) -> Result<Self, CompError> {
        let file = OpenOptions::new().read(true).open(filepath)?;
        let reader = BufReader::new(file);
        let alphabet: Self = serde_json::from_reader(reader)?;
        log::info!(
            "Alphabet reload, symbols : {}, size : {}",
            alphabet.get_symbols(),
            alphabet.get_size()
        );
        Ok(alphabet)
    } // end of reload_json
} // end of impl Alphabet

//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alphabet_size() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.get_size(), 21);
    }

    #[test]
    fn test_index_order() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.index_of('A'), Some(0));
        assert_eq!(alphabet.index_of('R'), Some(1));
        assert_eq!(alphabet.index_of('X'), Some(20));
        assert_eq!(alphabet.index_of('#'), None);
        assert!(alphabet.is_foreign('B'));
    }

    #[test]
    #[should_panic]
    fn test_duplicate_symbols_panic() {
        let _ = Alphabet::new("AAR");
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alphabet.json");
        let alphabet = Alphabet::default();
        alphabet.dump_json(&path).unwrap();
        let reloaded = Alphabet::reload_json(&path).unwrap();
        assert_eq!(reloaded.get_symbols(), alphabet.get_symbols());
    }
} // end of mod tests
