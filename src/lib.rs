//! Class schedule extraction from PDF timetables.
//!
//! A timetable PDF carries no table structure, only positioned text. This
//! library reads the text runs in content-stream order, assigns each run to a
//! column by its horizontal offset, rebuilds one event per schedule row and
//! writes the result as calendar-importable CSV.
//!
//! ```no_run
//! use plan_csv::Exclusions;
//!
//! let csv = plan_csv::plan_from_path("plan.pdf", &Exclusions::parse("Wychowanie fizyczne"))?;
//! std::fs::write("plan.csv", csv)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod classify;
mod date;
mod error;
mod exclusions;
mod extract;
mod fonts;
mod layout;
mod output;
mod processor;
mod reconstruct;
mod types;
mod utils;

// Re-export error type
pub use error::PlanError;

// Re-export extraction API
pub use extract::{
    FOOTER_FRAGMENTS, HEADER_FRAGMENTS, PdfExtractor, PdfExtractorBuilder, UNITS_PER_POINT,
    plan_from_bytes, plan_from_fragments, plan_from_path,
};

// Re-export the reconstruction core
pub use classify::Classifier;
pub use date::{clean_date, format_hours};
pub use exclusions::Exclusions;
pub use layout::{ColumnBucket, ColumnLayout};
pub use output::{CSV_HEADER, csv_row, to_csv, write_csv};
pub use reconstruct::{Reconstructor, classify_and_reconstruct};

// Re-export public types
pub use types::{DEFAULT_KIND, EventRecord, Field, FieldKind, Fragment, NOT_DEFINED};
