//! structures related to processing parameters

/// parameters of the parallel scan, passed into the scorer at construction
/// instead of living in ambient globals.
#[derive(Copy, Clone)]
pub struct ScanParams {
    /// number of worker threads for the per query scan, 0 means all available processing units
    nb_threads: usize,
}

impl Default for ScanParams {
    fn default() -> Self {
        ScanParams { nb_threads: 0 }
    }
} // end of Default for ScanParams

impl ScanParams {
    pub fn new(nb_threads: usize) -> Self {
        ScanParams { nb_threads }
    } // end of new

    /// the effective worker count
    pub fn get_nb_threads(&self) -> usize {
        if self.nb_threads > 0 {
            self.nb_threads
        } else {
            num_cpus::get()
        }
    }
} // end of impl ScanParams

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_means_all_units() {
        assert!(ScanParams::default().get_nb_threads() >= 1);
        assert_eq!(ScanParams::new(3).get_nb_threads(), 3);
    }
} // end of mod tests
