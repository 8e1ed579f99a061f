//! The similarity engine : brute force scan of a query vector against every
//! database entry, in parallel.
//!
//! Entries whose stored length differs from the query's are excluded from the
//! result entirely, they are not scored as infinite. Surviving entries get the
//! Euclidean norm of the elementwise frequency difference. Entries are
//! independent so the scan is a parallel map with a join barrier, merged into
//! a label keyed map afterwards.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::composition::CompositionVector;
use crate::db::CompositionDb;
use crate::params::ScanParams;

/// Euclidean norm of the elementwise difference of two frequency vectors of equal dimension.
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
} // end of euclidean

/// The scan engine. Owns a thread pool sized from `ScanParams`, kept across
/// queries (per query completeness is guaranteed by the par_iter join barrier).
pub struct Scorer {
    pool: rayon::ThreadPool,
}

impl Scorer {
    pub fn new(params: &ScanParams) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.get_nb_threads())
            .build()
            .unwrap();
        log::info!("scorer pool, nb threads : {}", pool.current_num_threads());
        Scorer { pool }
    } // end of new

    /// scores one query against the whole database and returns the candidate set,
    /// a mapping from entry label to distance restricted to length matching entries.
    /// On duplicate labels the later processed entry silently wins, we only log it.
    pub fn score(&self, query: &CompositionVector, db: &CompositionDb) -> HashMap<String, f64> {
        let pairs: Vec<(&str, f64)> = self.pool.install(|| {
            db.get_entries()
                .par_iter()
                .filter(|entry| entry.get_comp().get_length() == query.get_length())
                .map(|entry| {
                    let dist = euclidean(query.get_freqs(), entry.get_comp().get_freqs());
                    (entry.get_label(), dist)
                })
                .collect()
        });
        //
        let mut candidates = HashMap::<String, f64>::with_capacity(pairs.len());
        for (label, dist) in pairs {
            if candidates.insert(label.to_string(), dist).is_some() {
                log::warn!("duplicate label '{}' in database, keeping last distance", label);
            }
        }
        log::debug!(
            "scored query of length {} : {} candidates out of {} entries",
            query.get_length(),
            candidates.len(),
            db.len()
        );
        candidates
    } // end of score
} // end of impl Scorer

//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::composition::Composer;
    use crate::db::DbEntry;

    fn make_db(seqs: &[(&str, &str)]) -> CompositionDb {
        let composer = Composer::new(&Alphabet::default());
        let entries = seqs
            .iter()
            .map(|(label, seq)| {
                DbEntry::new(label.to_string(), composer.compose(label, seq).unwrap())
            })
            .collect();
        CompositionDb::from_entries(entries)
    }

    #[test]
    fn test_length_gating() {
        let db = make_db(&[("len5a", "AAAAA"), ("len5b", "ARNDC"), ("len7", "AAAAAAA")]);
        let composer = Composer::new(&Alphabet::default());
        let query = composer.compose("q", "RRRRR").unwrap();
        let candidates = Scorer::new(&ScanParams::default()).score(&query, &db);
        assert_eq!(candidates.len(), 2);
        assert!(candidates.contains_key("len5a"));
        assert!(candidates.contains_key("len5b"));
        assert!(!candidates.contains_key("len7"));
    }

    #[test]
    fn test_self_distance_is_zero() {
        let db = make_db(&[("same", "ARNDCQEGH")]);
        let composer = Composer::new(&Alphabet::default());
        let query = composer.compose("q", "ARNDCQEGH").unwrap();
        let candidates = Scorer::new(&ScanParams::default()).score(&query, &db);
        assert!(candidates["same"].abs() < 1.0e-9);
    }

    #[test]
    fn test_end_to_end_example() {
        // db from AAAA and RRRR, query AAAA : seqA at 0, seqB at sqrt(2)
        // since exactly the A and R slots differ by 1.0 each
        let db = make_db(&[("seqA", "AAAA"), ("seqB", "RRRR")]);
        let composer = Composer::new(&Alphabet::default());
        let query = composer.compose("q1", "AAAA").unwrap();
        let candidates = Scorer::new(&ScanParams::default()).score(&query, &db);
        assert_eq!(candidates.len(), 2);
        assert!(candidates["seqA"].abs() < 1.0e-9);
        assert!((candidates["seqB"] - 2.0_f64.sqrt()).abs() < 1.0e-9);
    }

    #[test]
    fn test_duplicate_label_overwrites() {
        let db = make_db(&[("dup", "AAAA"), ("dup", "AARR")]);
        let composer = Composer::new(&Alphabet::default());
        let query = composer.compose("q", "AAAA").unwrap();
        let candidates = Scorer::new(&ScanParams::new(2)).score(&query, &db);
        assert_eq!(candidates.len(), 1);
        // last processed entry wins
        assert!((candidates["dup"] - euclidean(query.get_freqs(), composer.compose("d", "AARR").unwrap().get_freqs())).abs() < 1.0e-12);
    }
} // end of mod tests
