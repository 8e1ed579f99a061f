//! The search orchestrator : drives queries one at a time against the database,
//! sorts each candidate set and writes result rows.
//!
//! Queries do not overlap : each query's own scan is already parallel, so one is
//! fully processed before the next begins. A query that vectorizes to an empty
//! sequence is skipped with an error log, the run continues with the remaining
//! queries. All length matching candidates are reported, there is no top-K cap.

use std::io::Write;

use crate::composition::Composer;
use crate::db::CompositionDb;
use crate::error::CompError;
use crate::files::SeqRecord;
use crate::params::ScanParams;
use crate::scorer::Scorer;

/// csv header of result files
pub const RESULT_HEADER: [&str; 3] = ["Queries", "Hits", "Distances"];

/// per run counters returned by [Searcher::search]
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchOutcome {
    /// queries fully processed
    pub nb_queries: usize,
    /// queries skipped because they vectorized empty
    pub nb_skipped: usize,
    /// result rows written
    pub nb_rows: usize,
}

/// Orchestrates compose, scan, sort and output for a batch of queries.
pub struct Searcher {
    composer: Composer,
    scorer: Scorer,
}

impl Searcher {
    pub fn new(composer: Composer, params: &ScanParams) -> Self {
        let scorer = Scorer::new(params);
        Searcher { composer, scorer }
    } // end of new

    /// runs all queries in input order against the database and writes one csv row
    /// per (query, candidate) pair, distances at 4 decimals, candidates sorted by
    /// ascending distance with the label as deterministic tie break.
    pub fn search<W: Write>(
        &self,
        queries: &[SeqRecord],
        db: &CompositionDb,
        out: W,
    ) -> Result<SearchOutcome, CompError> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(RESULT_HEADER)?;
        let mut outcome = SearchOutcome::default();
        //
        for query in queries {
            let query_comp = match self.composer.compose(query.get_label(), query.get_seq()) {
                Ok(comp) => comp,
                Err(CompError::EmptySequence { label }) => {
                    // one bad input must not abort the batch
                    log::error!("skipping query '{}' : empty after foreign symbol removal", label);
                    outcome.nb_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let candidates = self.scorer.score(&query_comp, db);
            let mut sorted: Vec<(String, f64)> = candidates.into_iter().collect();
            sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            for (hit, dist) in &sorted {
                let dist_str = format!("{:.4}", dist);
                writer.write_record([query.get_label(), hit.as_str(), dist_str.as_str()])?;
                outcome.nb_rows += 1;
            }
            outcome.nb_queries += 1;
            log::debug!("query '{}' : {} hits", query.get_label(), sorted.len());
        }
        writer.flush()?;
        //
        log::info!(
            "search complete : {} queries, {} skipped, {} rows",
            outcome.nb_queries,
            outcome.nb_skipped,
            outcome.nb_rows
        );
        Ok(outcome)
    } // end of search
} // end of impl Searcher

//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;

    fn searcher() -> Searcher {
        Searcher::new(
            Composer::new(&Alphabet::default()),
            &ScanParams::default(),
        )
    }

    fn build_db(dir: &tempfile::TempDir, seqs: &[(&str, &str)]) -> CompositionDb {
        let records: Vec<SeqRecord> = seqs
            .iter()
            .map(|(l, s)| SeqRecord::new(l.to_string(), s.to_string()))
            .collect();
        CompositionDb::build(&records, &dir.path().join("db.compdb"), &Alphabet::default()).unwrap()
    }

    #[test]
    fn test_end_to_end_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = build_db(&dir, &[("seqA", "AAAA"), ("seqB", "RRRR")]);
        let queries = vec![SeqRecord::new("q1".to_string(), "AAAA".to_string())];
        let mut out = Vec::<u8>::new();
        let outcome = searcher().search(&queries, &db, &mut out).unwrap();
        assert_eq!(outcome.nb_queries, 1);
        assert_eq!(outcome.nb_rows, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Queries,Hits,Distances");
        // ascending distance : exact match first, then sqrt(2) at 4 decimals
        assert_eq!(lines[1], "q1,seqA,0.0000");
        assert_eq!(lines[2], "q1,seqB,1.4142");
    }

    #[test]
    fn test_length_gating_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let db = build_db(&dir, &[("len5", "AAAAA"), ("len7", "AAAAAAA")]);
        let queries = vec![SeqRecord::new("q".to_string(), "RRRRR".to_string())];
        let mut out = Vec::<u8>::new();
        let outcome = searcher().search(&queries, &db, &mut out).unwrap();
        assert_eq!(outcome.nb_rows, 1);
        assert!(String::from_utf8(out).unwrap().contains("len5"));
    }

    #[test]
    fn test_bad_query_skipped_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let db = build_db(&dir, &[("seqA", "AAAA")]);
        let queries = vec![
            SeqRecord::new("allforeign".to_string(), "###".to_string()),
            SeqRecord::new("q2".to_string(), "AAAA".to_string()),
        ];
        let mut out = Vec::<u8>::new();
        let outcome = searcher().search(&queries, &db, &mut out).unwrap();
        assert_eq!(outcome.nb_skipped, 1);
        assert_eq!(outcome.nb_queries, 1);
        assert_eq!(outcome.nb_rows, 1);
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        // two identical entries under different labels tie at the same distance
        let db = build_db(&dir, &[("zeta", "AAAA"), ("alpha", "AAAA")]);
        let queries = vec![SeqRecord::new("q".to_string(), "AAAA".to_string())];
        let mut out = Vec::<u8>::new();
        let _ = searcher().search(&queries, &db, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "q,alpha,0.0000");
        assert_eq!(lines[2], "q,zeta,0.0000");
    }
} // end of mod tests
