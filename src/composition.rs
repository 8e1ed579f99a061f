//! The vectorizer : turns a raw sequence into a fixed dimension composition vector.
//!
//! A composition vector is the filtered sequence length plus one relative frequency
//! per alphabet symbol. Foreign symbols are stripped before counting, so the stored
//! length is the post-filter length : two sequences differing only by foreign
//! residues compose to the same vector.

use crate::alphabet::Alphabet;
use crate::error::CompError;

/// fixed dimension numeric fingerprint of a sequence.
/// Invariant : length > 0 and sum of frequencies == 1.0 within floating point tolerance.
/// Frequencies are indexed by the alphabet's fixed symbol order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionVector {
    length: usize,
    freqs: Vec<f64>,
}

impl CompositionVector {
    pub(crate) fn new(length: usize, freqs: Vec<f64>) -> Self {
        CompositionVector { length, freqs }
    }

    /// number of residues counted, after foreign symbol removal
    pub fn get_length(&self) -> usize {
        self.length
    }

    pub fn get_freqs(&self) -> &[f64] {
        &self.freqs
    }

    /// the K of the alphabet the vector was built with
    pub fn dimension(&self) -> usize {
        self.freqs.len()
    }
} // end of CompositionVector

//=========================================================================================

/// The vectorizer. Holds the alphabet fixing vector dimension.
/// Deterministic and side effect free apart from the foreign symbol warning.
pub struct Composer {
    alphabet: Alphabet,
}

impl Composer {
    pub fn new(alphabet: &Alphabet) -> Self {
        Composer {
            alphabet: alphabet.clone(),
        }
    }

    pub fn get_alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// computes the composition vector of a raw sequence.
    /// Input is uppercased, foreign symbols are reported (warning, non fatal) and removed,
    /// each remaining residue contributes 1/length to its slot.
    /// The label is only used to give context in warnings and errors.
    pub fn compose(&self, label: &str, sequence: &str) -> Result<CompositionVector, CompError> {
        let upper = sequence.to_uppercase();
        // foreign symbols : set difference between symbols present and the alphabet
        let mut foreign: Vec<char> = upper
            .chars()
            .filter(|c| self.alphabet.is_foreign(*c))
            .collect();
        foreign.sort_unstable();
        foreign.dedup();
        if !foreign.is_empty() {
            let list: String = foreign.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(",");
            log::warn!(
                "special residues in sequence '{}' : {} (ignored during comparison)",
                label,
                list
            );
        }
        //
        let k = self.alphabet.get_size();
        let mut counts = vec![0usize; k];
        let mut length = 0usize;
        for c in upper.chars() {
            if let Some(slot) = self.alphabet.index_of(c) {
                counts[slot] += 1;
                length += 1;
            }
        }
        // an all foreign or empty sequence would mean a division by zero below
        if length == 0 {
            return Err(CompError::EmptySequence {
                label: label.to_string(),
            });
        }
        let freqs: Vec<f64> = counts.iter().map(|&n| n as f64 / length as f64).collect();
        Ok(CompositionVector::new(length, freqs))
    } // end of compose
} // end of impl Composer

//=========================================================================================

// end of mod tests
