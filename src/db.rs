//! The database store : builds a database of labeled composition vectors from
//! sequence records, persists it as tab separated text and reloads it.
//!
//! On disk layout, one entry per line, frequencies at 6 decimals :
//! `label<TAB>length<TAB>freq_1<TAB>...<TAB>freq_K`
//! so a reader must see exactly K+2 fields per line.
//! The file is written to a temporary path and renamed into place once complete,
//! so an interrupted build never leaves a half written database behind.
//! An `Alphabet` json sidecar is dumped beside the file and checked at reload.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::alphabet::Alphabet;
use crate::composition::{Composer, CompositionVector};
use crate::error::CompError;
use crate::files::{self, SeqRecord};

// block size for the fasta producer / vectorizer consumer channel
const SEND_BLOCK_SIZE: usize = 500;

/// a labeled composition vector. Created once at build time, immutable thereafter.
#[derive(Debug, Clone)]
pub struct DbEntry {
    label: String,
    comp: CompositionVector,
}

impl DbEntry {
    pub fn new(label: String, comp: CompositionVector) -> Self {
        DbEntry { label, comp }
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }

    pub fn get_comp(&self) -> &CompositionVector {
        &self.comp
    }
} // end of DbEntry

//=========================================================================================

/// An ordered collection of database entries, loaded wholesale in memory.
/// Read only during search, safely shared by reference across scan workers.
pub struct CompositionDb {
    entries: Vec<DbEntry>,
    /// backing file when the database was persisted or reloaded
    path: Option<PathBuf>,
}

impl CompositionDb {
    /// an in memory database, used by tests and by callers providing their own entries
    pub fn from_entries(entries: Vec<DbEntry>) -> Self {
        CompositionDb {
            entries,
            path: None,
        }
    }

    pub fn get_entries(&self) -> &[DbEntry] {
        &self.entries
    }

    pub fn get_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// builds a database from records in input order, streaming one line to dbpath
    /// per entry as it is computed. Records with an empty raw sequence, or left empty
    /// by foreign symbol removal, are skipped with a warning.
    /// Fails immediately if the destination cannot be opened.
    pub fn build(
        records: &[SeqRecord],
        dbpath: &Path,
        alphabet: &Alphabet,
    ) -> Result<Self, CompError> {
        let composer = Composer::new(alphabet);
        let mut writer = DbWriter::create(dbpath, alphabet)?;
        for record in records {
            writer.append(&composer, record)?;
        }
        writer.finish()
    } // end of build

    /// builds a database straight from a fasta file with a producer / consumer split :
    /// a reader thread streams records into a bounded channel while this thread
    /// vectorizes and writes them as they arrive.
    pub fn build_from_fasta(
        fasta_path: &Path,
        dbpath: &Path,
        alphabet: &Alphabet,
    ) -> Result<Self, CompError> {
        log::info!("building database from fasta : {:?} ...", fasta_path);
        let composer = Composer::new(alphabet);
        let mut writer = DbWriter::create(dbpath, alphabet)?;
        let (send, receive) = crossbeam_channel::bounded::<Vec<SeqRecord>>(10);
        //
        let db = crossbeam_utils::thread::scope(|scope| -> Result<Self, CompError> {
            // record sending, productor thread
            let sender_handle = scope.spawn(move |_| {
                let res_nb_sent = files::stream_fasta(fasta_path, &send, SEND_BLOCK_SIZE);
                drop(send);
                res_nb_sent
            });
            // record reception, vectorize and write as blocks arrive
            let mut read_more = true;
            while read_more {
                // if error is Disconnected the producer is finished
                match receive.recv() {
                    Err(_) => {
                        read_more = false;
                    }
                    Ok(records) => {
                        for record in &records {
                            writer.append(&composer, record)?;
                        }
                    }
                }
            }
            let nb_sent = sender_handle.join().unwrap()?;
            let db = writer.finish()?;
            log::debug!("build_from_fasta, nb records read : {}, nb entries : {}", nb_sent, db.len());
            Ok(db)
        })
        .unwrap()?;
        //
        log::info!("generated database for {} sequences at {:?}", db.len(), dbpath);
        Ok(db)
    } // end of build_from_fasta

    /// reloads a persisted database, parsing each line strictly by the K+2 field layout
    /// of the current alphabet. The json sidecar, when present, is checked first so a
    /// database built under a different alphabet is refused before any line is parsed.
    pub fn load(dbpath: &Path, alphabet: &Alphabet) -> Result<Self, CompError> {
        let k = alphabet.get_size();
        //
        let sidecar = params_path(dbpath);
        if sidecar.is_file() {
            let stored = Alphabet::reload_json(&sidecar)?;
            if stored.get_size() != k {
                return Err(CompError::DimensionMismatch {
                    expected: k,
                    found: stored.get_size(),
                });
            }
            if stored.get_symbols() != alphabet.get_symbols() {
                log::warn!(
                    "database {:?} was built with alphabet {} but current is {}, slots will be remapped blindly",
                    dbpath,
                    stored.get_symbols(),
                    alphabet.get_symbols()
                );
            }
        } else {
            log::debug!("no alphabet sidecar at {:?}, relying on field count only", sidecar);
        }
        //
        let file = File::open(dbpath)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::<DbEntry>::new();
        for (numline, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                return Err(CompError::CorruptDatabase {
                    path: dbpath.to_path_buf(),
                    line: numline + 1,
                    reason: format!("expected at least 2 fields, got {}", fields.len()),
                });
            }
            if fields.len() != k + 2 {
                return Err(CompError::DimensionMismatch {
                    expected: k,
                    found: fields.len() - 2,
                });
            }
            let length = fields[1].parse::<usize>().map_err(|_| CompError::CorruptDatabase {
                path: dbpath.to_path_buf(),
                line: numline + 1,
                reason: format!("unparseable length field '{}'", fields[1]),
            })?;
            let mut freqs = Vec::<f64>::with_capacity(k);
            for field in &fields[2..] {
                let freq = field.parse::<f64>().map_err(|_| CompError::CorruptDatabase {
                    path: dbpath.to_path_buf(),
                    line: numline + 1,
                    reason: format!("unparseable frequency field '{}'", field),
                })?;
                freqs.push(freq);
            }
            entries.push(DbEntry::new(
                fields[0].to_string(),
                CompositionVector::new(length, freqs),
            ));
        }
        log::info!("loaded {} entries from {:?}", entries.len(), dbpath);
        Ok(CompositionDb {
            entries,
            path: Some(dbpath.to_path_buf()),
        })
    } // end of load
} // end of impl CompositionDb

// sidecar path carrying the alphabet the database was built with
fn params_path(dbpath: &Path) -> PathBuf {
    let mut name = dbpath.as_os_str().to_os_string();
    name.push(".params.json");
    PathBuf::from(name)
}

//=========================================================================================

// Streaming writer behind build and build_from_fasta. Writes to a temporary path,
// finish() renames into place and dumps the alphabet sidecar.
struct DbWriter {
    final_path: PathBuf,
    tmp_path: PathBuf,
    out: BufWriter<File>,
    alphabet: Alphabet,
    entries: Vec<DbEntry>,
    nb_skipped: usize,
}

impl DbWriter {
    fn create(dbpath: &Path, alphabet: &Alphabet) -> Result<Self, CompError> {
        let mut tmp_name = dbpath.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        let out = BufWriter::new(File::create(&tmp_path)?);
        Ok(DbWriter {
            final_path: dbpath.to_path_buf(),
            tmp_path,
            out,
            alphabet: alphabet.clone(),
            entries: Vec::new(),
            nb_skipped: 0,
        })
    } // end of create

    fn append(&mut self, composer: &Composer, record: &SeqRecord) -> Result<(), CompError> {
        if record.get_seq().is_empty() {
            log::warn!("skipping record '{}' : header with no sequence body", record.get_label());
            self.nb_skipped += 1;
            return Ok(());
        }
        let comp = match composer.compose(record.get_label(), record.get_seq()) {
            Ok(comp) => comp,
            Err(CompError::EmptySequence { label }) => {
                log::warn!("skipping record '{}' : empty after foreign symbol removal", label);
                self.nb_skipped += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let freqs: Vec<String> = comp.get_freqs().iter().map(|f| format!("{:.6}", f)).collect();
        writeln!(
            self.out,
            "{}\t{}\t{}",
            record.get_label(),
            comp.get_length(),
            freqs.join("\t")
        )?;
        self.entries.push(DbEntry::new(record.get_label().to_string(), comp));
        Ok(())
    } // end of append

    fn finish(mut self) -> Result<CompositionDb, CompError> {
        self.out.flush()?;
        drop(self.out);
        fs::rename(&self.tmp_path, &self.final_path)?;
        self.alphabet.dump_json(&params_path(&self.final_path))?;
        if self.nb_skipped > 0 {
            log::warn!("database build skipped {} empty records", self.nb_skipped);
        }
        Ok(CompositionDb {
            entries: self.entries,
            path: Some(self.final_path),
        })
    } // end of finish
} // end of impl DbWriter

//=========================================================================================

// end of mod tests
