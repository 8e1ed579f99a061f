//! compsearch : alignment free protein search by amino acid composition.
//!
//! A sequence is turned into a composition vector, its length plus one relative
//! frequency per alphabet symbol. A database of such vectors is persisted as tab
//! separated text and reloaded wholesale. For each query the whole database is
//! scanned in parallel, exhaustively, keeping only entries of the exact same
//! length and ranking them by Euclidean distance in composition space.

pub mod alphabet;
pub mod composition;
pub mod db;
pub mod error;
pub mod files;
pub mod params;
pub mod scorer;
pub mod search;
