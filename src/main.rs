use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use job_geo_rs::{
    CbsaQuerier, CrosswalkCbsaQuerier, CrosswalkConfig, CrosswalkTables, JobPosting,
    job_posting_search_strings,
};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "job_geo_rs=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <job_postings> [crosswalk_dir]", args[0]);
        eprintln!("  job_postings: JSON file (array, single posting or JSON Lines)");
        eprintln!("                or - to read from stdin");
        eprintln!("  crosswalk_dir: directory with place_ua.json, cousub_ua.json, ua_cbsa.json");
        eprintln!("                 (default: $CROSSWALK_DIR or data/crosswalk)");
        std::process::exit(1);
    }

    let input = read_input(&args[1])?;
    let job_postings = parse_job_postings(&input)
        .with_context(|| format!("Failed to parse job postings from {}", args[1]))?;

    if job_postings.is_empty() {
        eprintln!("Error: No job postings found in {}", args[1]);
        std::process::exit(1);
    }

    // Positional argument takes precedence over CROSSWALK_DIR
    let config = match args.get(2) {
        Some(dir) => CrosswalkConfig {
            data_dir: PathBuf::from(dir),
        },
        None => CrosswalkConfig::from_env(),
    };
    let querier = CrosswalkCbsaQuerier::new(CrosswalkTables::from_dir(&config.data_dir)?);

    println!("Querying {} job posting(s)...", job_postings.len());

    for (index, job_posting) in job_postings.iter().enumerate() {
        match &job_posting.id {
            Some(id) => println!("\nJob posting: {}", id),
            None => println!("\nJob posting: #{}", index + 1),
        }

        let search_strings = job_posting_search_strings(job_posting);
        if search_strings.is_empty() {
            println!("  Search strings: N/A");
        } else {
            println!("  Search strings: {}", search_strings.join(" | "));
        }

        match querier.query(job_posting) {
            Some(cbsa) => println!("  CBSA: {} - {}", cbsa.code, cbsa.name),
            None => println!("  CBSA: NOT_FOUND"),
        }
    }

    Ok(())
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read job postings from stdin")?;
        Ok(input)
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
    }
}

/// Accepts a JSON array, a single posting, or one posting per line
fn parse_job_postings(input: &str) -> Result<Vec<JobPosting>> {
    let input = input.trim();
    if input.starts_with('[') {
        return Ok(serde_json::from_str(input)?);
    }

    serde_json::Deserializer::from_str(input)
        .into_iter::<JobPosting>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}
