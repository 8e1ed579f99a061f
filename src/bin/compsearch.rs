//! compsearch todb --fasta [-f] file [--db [-o] path]
//!
//! builds a composition database from the fasta file. Default database path is
//! the fasta path with a .compdb suffix. The alphabet used is dumped in a json
//! sidecar beside the database file.
//!
//! compsearch request --db [-b] path --query [-q] file [--out [-o] path] [--nbthreads n]
//!
//! searches every query sequence against the database and writes a csv file
//! `Queries,Hits,Distances` with one row per length matching candidate, sorted
//! by ascending distance. --dbfasta can replace --db to build the database from
//! a fasta file on the fly (it is persisted at the default path as a side effect).
//!
//! Verbosity is driven by RUST_LOG (env_logger), not a flag.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{bail, Context};
use clap::{Arg, ArgMatches, Command};
use cpu_time::ProcessTime;
use env_logger::Builder;

use compsearch::alphabet::Alphabet;
use compsearch::composition::Composer;
use compsearch::db::CompositionDb;
use compsearch::files;
use compsearch::params::ScanParams;
use compsearch::search::Searcher;

// install a logger facility
fn init_log() {
    Builder::from_default_env().init();
}

fn default_db_path(fasta: &str) -> PathBuf {
    PathBuf::from(format!("{}.compdb", fasta))
}

// result file name derived from the query path plus a timestamp
fn default_out_path(query: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let stem = Path::new(query)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "query".to_string());
    let mut out = Path::new(query).to_path_buf();
    out.set_file_name(format!("{}_search-{}.csv", stem, stamp));
    out
}

fn parse_todb(matches: &ArgMatches) -> Result<(), anyhow::Error> {
    let fasta = matches.get_one::<String>("fasta").unwrap();
    let dbpath = match matches.get_one::<String>("db") {
        Some(path) => PathBuf::from(path),
        None => default_db_path(fasta),
    };
    //
    let start_t = SystemTime::now();
    let cpu_start = ProcessTime::now();
    let db = CompositionDb::build_from_fasta(Path::new(fasta), &dbpath, &Alphabet::default())
        .with_context(|| format!("database build from {} failed", fasta))?;
    println!(
        "generated database for {} sequences at {:?}",
        db.len(),
        dbpath
    );
    log::info!(
        "build cpu time(s) : {}, elapsed time(s) : {}",
        cpu_start.elapsed().as_secs(),
        start_t.elapsed().unwrap().as_secs()
    );
    Ok(())
} // end of parse_todb

fn parse_request(matches: &ArgMatches) -> Result<(), anyhow::Error> {
    let query = matches.get_one::<String>("query").unwrap();
    let nb_threads = *matches.get_one::<usize>("nbthreads").unwrap_or(&0);
    let alphabet = Alphabet::default();
    //
    let db = match (
        matches.get_one::<String>("db"),
        matches.get_one::<String>("dbfasta"),
    ) {
        (Some(dbpath), None) => CompositionDb::load(Path::new(dbpath), &alphabet)
            .with_context(|| format!("database load from {} failed", dbpath))?,
        (None, Some(dbfasta)) => {
            let dbpath = default_db_path(dbfasta);
            CompositionDb::build_from_fasta(Path::new(dbfasta), &dbpath, &alphabet)
                .with_context(|| format!("database build from {} failed", dbfasta))?
        }
        _ => bail!("exactly one of --db or --dbfasta is required"),
    };
    if db.is_empty() {
        bail!("database is empty, nothing to search against");
    }
    //
    let queries = files::read_fasta(Path::new(query))
        .with_context(|| format!("could not read query fasta {}", query))?;
    let out_path = match matches.get_one::<String>("out") {
        Some(path) => PathBuf::from(path),
        None => default_out_path(query),
    };
    let out = BufWriter::new(
        File::create(&out_path).with_context(|| format!("could not create {:?}", out_path))?,
    );
    //
    let params = ScanParams::new(nb_threads);
    println!("searching on {} threads ...", params.get_nb_threads());
    let searcher = Searcher::new(Composer::new(&alphabet), &params);
    let start_t = SystemTime::now();
    let cpu_start = ProcessTime::now();
    let outcome = searcher.search(&queries, &db, out)?;
    //
    println!(
        "search complete, {} queries ({} skipped), {} rows saved as {:?}",
        outcome.nb_queries, outcome.nb_skipped, outcome.nb_rows, out_path
    );
    log::info!(
        "request cpu time(s) : {}, elapsed time(s) : {}",
        cpu_start.elapsed().as_secs(),
        start_t.elapsed().unwrap().as_secs()
    );
    Ok(())
} // end of parse_request

//============================================================================================

fn main() -> Result<(), anyhow::Error> {
    init_log();
    //
    let todb_cmd = Command::new("todb")
        .about("Build a composition database from a fasta file")
        .arg(
            Arg::new("fasta")
                .short('f')
                .long("fasta")
                .value_name("FASTA")
                .help("fasta file of database sequences")
                .required(true),
        )
        .arg(
            Arg::new("db")
                .short('o')
                .long("db")
                .value_name("DB")
                .help("database path, defaults to <FASTA>.compdb"),
        );
    //
    let request_cmd = Command::new("request")
        .about("Search nearest length-matching database sequences for each query, by composition")
        .arg(
            Arg::new("db")
                .short('b')
                .long("db")
                .value_name("DB")
                .help("pre-built database file"),
        )
        .arg(
            Arg::new("dbfasta")
                .long("dbfasta")
                .value_name("FASTA")
                .conflicts_with("db")
                .help("build the database from this fasta instead of loading one"),
        )
        .arg(
            Arg::new("query")
                .short('q')
                .long("query")
                .value_name("FASTA")
                .help("query fasta file")
                .required(true),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("OUT")
                .help("result csv path, defaults to a timestamped name beside the query file"),
        )
        .arg(
            Arg::new("nbthreads")
                .long("nbthreads")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("number of scan threads, defaults to all available units"),
        );
    //
    let matches = Command::new("compsearch")
        .version("0.1.0")
        .about("Search similar proteins by amino acid composition, exhaustive scan with exact length filter")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(todb_cmd)
        .subcommand(request_cmd)
        .get_matches();
    //
    match matches.subcommand() {
        Some(("todb", sub)) => parse_todb(sub),
        Some(("request", sub)) => parse_request(sub),
        _ => unreachable!(),
    }
} // end of main
