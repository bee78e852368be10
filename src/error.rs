use std::fmt::Formatter;

#[derive(Debug)]
pub enum PlanError {
    /// A fragment run starts at an `x` offset outside every known column.
    InvalidColumn { text: String, x: f64 },
    IoError(std::io::Error),
    PdfError(lopdf::Error),
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            PlanError::InvalidColumn { text, x } => {
                write!(f, "Invalid element on PDF at x={}: {}", x, text)
            }
            PlanError::IoError(e) => write!(f, "IO error: {}", e),
            PlanError::PdfError(e) => write!(f, "PDF error: {}", e),
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanError::InvalidColumn { .. } => None,
            PlanError::IoError(e) => Some(e),
            PlanError::PdfError(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for PlanError {
    fn from(e: std::io::Error) -> Self {
        PlanError::IoError(e)
    }
}

impl From<lopdf::Error> for PlanError {
    fn from(e: lopdf::Error) -> Self {
        PlanError::PdfError(e)
    }
}
