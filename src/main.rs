use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use phrasing::{
    CollisionReport, ExclusionSet, FlatDictionary, PhraseComposer, ReverseIndex, RuleTables,
    audit, grammar,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(name = "phrasing")]
#[command(about = "Compose steno phrasing strokes and audit dictionaries against them", long_about = None)]
struct Cli {
    /// Rule tables to use instead of the bundled ones.
    #[arg(long, global = true, env = "PHRASING_RULES")]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the phrase for each outline.
    Lookup {
        /// Show the middle word, decorator and verb form as well.
        #[arg(short, long)]
        explain: bool,

        #[arg(required = true)]
        outlines: Vec<String>,
    },
    /// Print the strokes that write a phrase, canonical stroke first.
    Reverse { phrase: String },
    /// Report flat-dictionary entries that collide with phrasing strokes.
    Audit {
        /// Plover JSON dictionary.
        dictionary: PathBuf,

        /// Audited strokes to use instead of the bundled list.
        #[arg(long, env = "PHRASING_AUDITED")]
        audited: Option<PathBuf>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let tables = load_tables(cli.rules.as_deref())?;

    match cli.command {
        Command::Lookup { explain, outlines } => {
            let composer = PhraseComposer::new(tables);
            let mut status = ExitCode::SUCCESS;
            for outline in &outlines {
                let strokes: Vec<&str> = outline.split(grammar::STROKE_SEPARATOR).collect();
                let result = if explain && strokes.len() == 1 {
                    composer.explain(outline).map(|c| serde_json::to_string(&c))
                } else {
                    composer.lookup(&strokes).map(|phrase| Ok(format!("{:?}", phrase.trim())))
                };
                match result {
                    Ok(line) => println!("{outline}: {}", line?),
                    Err(e) => {
                        eprintln!("{e}");
                        status = ExitCode::FAILURE;
                    }
                }
            }
            Ok(status)
        }
        Command::Reverse { phrase } => {
            let index = ReverseIndex::build(&PhraseComposer::new(tables));
            let strokes = index.strokes(&phrase);
            if strokes.is_empty() {
                eprintln!("no stroke writes {phrase:?}");
                return Ok(ExitCode::FAILURE);
            }
            for stroke in strokes {
                println!("{stroke}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Audit {
            dictionary,
            audited,
            json,
        } => {
            let dictionary = FlatDictionary::from_file(&dictionary)?;
            println!("Loaded dict with {} entries", dictionary.len());
            let exclusions = match audited {
                Some(path) => ExclusionSet::from_file(&path)?,
                None => ExclusionSet::default(),
            };

            let report = audit(&dictionary, &tables, &exclusions);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn load_tables(path: Option<&Path>) -> Result<RuleTables, phrasing::TableError> {
    match path {
        Some(path) => RuleTables::from_file(path),
        None => Ok(RuleTables::default()),
    }
}

fn print_report(report: &CollisionReport) {
    for collision in &report.collisions {
        println!("Match on {}", collision.cell());
        for (stroke, output) in &collision.entries {
            println!("  {stroke}: {output:?}");
        }
        println!();
    }

    println!("Collisions caused by starters");
    for (starter, count) in &report.starter_counts {
        println!(" {starter}: {count}");
    }

    println!();
    println!("Collisions caused by enders");
    for (ender, count) in &report.ender_counts {
        println!(" {ender}: {count}");
    }

    println!();
    println!("Total collisions: {}", report.total);
}
