use clap::{Parser, ValueEnum};
use plan_csv::{ColumnLayout, Exclusions, PdfExtractor, PlanError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Calendar CSV, one row per class
    Csv,
    /// Reconstructed events, one per line
    Events,
    /// Schedule fragments with their layout coordinates
    Fragments,
}

#[derive(Parser)]
#[command(name = "plan-csv")]
#[command(about = "Convert a PDF class schedule into calendar CSV", long_about = None)]
struct Args {
    /// Schedule PDF to convert
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Write output to this file instead of stdout
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    /// Class names to leave out, separated by ';'
    #[arg(short, long, value_name = "NAMES")]
    exclude: Option<String>,

    /// Password for encrypted PDFs
    #[arg(short, long)]
    password: Option<String>,

    /// Let the owner column take every offset no other column claims
    #[arg(long)]
    legacy_owner_column: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

fn run(args: &Args, out: &mut dyn Write) -> Result<(), PlanError> {
    let mut builder = PdfExtractor::builder();
    if let Some(password) = &args.password {
        builder = builder.password(password.clone());
    }
    if args.legacy_owner_column {
        builder = builder.layout(ColumnLayout::legacy());
    }
    let extractor = builder.build();

    let excluded = args
        .exclude
        .as_deref()
        .map(Exclusions::parse)
        .unwrap_or_default();

    match args.format {
        OutputFormat::Csv => {
            let events = extractor.events_from_path(&args.file, &excluded)?;
            plan_csv::write_csv(&events, &mut *out)?;
        }
        OutputFormat::Events => {
            for event in extractor.events_from_path(&args.file, &excluded)? {
                writeln!(out, "{}", event)?;
            }
        }
        OutputFormat::Fragments => {
            for fragment in extractor.fragments_from_path(&args.file)? {
                let kind = extractor
                    .layout()
                    .classify(fragment.x)
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "?".to_string());
                writeln!(out, "{:>6} {}", kind, fragment)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    let result = match &args.output {
        Some(path) => File::create(path)
            .map_err(PlanError::from)
            .and_then(|file| run(&args, &mut BufWriter::new(file))),
        None => run(&args, &mut io::stdout().lock()),
    };

    if let Err(e) = result {
        eprintln!("Error converting {:?}: {}", args.file, e);
        std::process::exit(1);
    }
}
