//! fasta file reading. This is the sequence source collaborator : the core only
//! needs an ordered collection of (label, raw sequence) pairs with single line labels.

use std::path::Path;

use crate::error::CompError;

/// a (label, raw sequence) pair as read from a fasta file.
/// Transient : consumed to produce one composition vector.
#[derive(Debug, Clone)]
pub struct SeqRecord {
    label: String,
    seq: String,
}

impl SeqRecord {
    pub fn new(label: String, seq: String) -> Self {
        SeqRecord { label, seq }
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }

    pub fn get_seq(&self) -> &str {
        &self.seq
    }
} // end of SeqRecord

// labels must stay single line, embedded tabs would break the database format
fn normalize_label(id: &[u8]) -> String {
    String::from_utf8_lossy(id).trim().replace('\t', " ")
}

/// opens and parses a fasta file with needletail, in input order.
/// Records with an empty body are kept, the database store decides what to do with them.
pub fn read_fasta(path: &Path) -> Result<Vec<SeqRecord>, CompError> {
    let mut records = Vec::<SeqRecord>::new();
    let mut reader = needletail::parse_fastx_file(path).map_err(|e| CompError::Fasta {
        path: path.to_path_buf(),
        msg: e.to_string(),
    })?;
    while let Some(record) = reader.next() {
        let seqrec = record.map_err(|e| CompError::Fasta {
            path: path.to_path_buf(),
            msg: e.to_string(),
        })?;
        let label = normalize_label(seqrec.id());
        let seq = String::from_utf8_lossy(&seqrec.seq()).to_string();
        records.push(SeqRecord::new(label, seq));
    }
    log::info!("found {} sequences in {:?}", records.len(), path);
    Ok(records)
} // end of read_fasta

/// streams a fasta file into a channel by blocks of block_size records,
/// for the producer side of the database build pipeline.
/// Stops silently if the receiving end hung up, the consumer error is the one reported.
pub fn stream_fasta(
    path: &Path,
    sender: &crossbeam_channel::Sender<Vec<SeqRecord>>,
    block_size: usize,
) -> Result<usize, CompError> {
    let mut reader = needletail::parse_fastx_file(path).map_err(|e| CompError::Fasta {
        path: path.to_path_buf(),
        msg: e.to_string(),
    })?;
    let mut nb_sent = 0;
    let mut block = Vec::<SeqRecord>::with_capacity(block_size);
    while let Some(record) = reader.next() {
        let seqrec = record.map_err(|e| CompError::Fasta {
            path: path.to_path_buf(),
            msg: e.to_string(),
        })?;
        let label = normalize_label(seqrec.id());
        let seq = String::from_utf8_lossy(&seqrec.seq()).to_string();
        block.push(SeqRecord::new(label, seq));
        if block.len() >= block_size {
            nb_sent += block.len();
            if sender.send(std::mem::take(&mut block)).is_err() {
                log::debug!("stream_fasta : receiver disconnected, stopping");
                return Ok(nb_sent);
            }
            block = Vec::with_capacity(block_size);
        }
    }
    if !block.is_empty() {
        nb_sent += block.len();
        if sender.send(block).is_err() {
            log::debug!("stream_fasta : receiver disconnected, stopping");
        }
    }
    log::trace!("stream_fasta sent {} records from {:?}", nb_sent, path);
    Ok(nb_sent)
} // end of stream_fasta

//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fasta(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("seqs.fasta")).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        dir
    }

    #[test]
    fn test_read_fasta_order_and_labels() {
        let dir = write_fasta(">seqA some\tdescription\nAAAA\n>seqB\nRRR\nRRR\n");
        let records = read_fasta(&dir.path().join("seqs.fasta")).unwrap();
        assert_eq!(records.len(), 2);
        // tab in header is replaced, multi line bodies are concatenated
        assert_eq!(records[0].get_label(), "seqA some description");
        assert_eq!(records[0].get_seq(), "AAAA");
        assert_eq!(records[1].get_label(), "seqB");
        assert_eq!(records[1].get_seq(), "RRRRRR");
    }

    #[test]
    fn test_stream_fasta_blocks() {
        let dir = write_fasta(">s1\nAA\n>s2\nRR\n>s3\nNN\n");
        let (send, receive) = crossbeam_channel::unbounded::<Vec<SeqRecord>>();
        let nb_sent = stream_fasta(&dir.path().join("seqs.fasta"), &send, 2).unwrap();
        drop(send);
        assert_eq!(nb_sent, 3);
        let received: Vec<SeqRecord> = receive.iter().flatten().collect();
        assert_eq!(received.len(), 3);
        assert_eq!(received[2].get_label(), "s3");
    }
} // end of mod tests
