use std::io::Read;
use std::path::Path;

use lopdf::{Dictionary, Document};
use tracing::{debug, warn};

use crate::error::PlanError;
use crate::exclusions::Exclusions;
use crate::layout::ColumnLayout;
use crate::output::to_csv;
use crate::processor::{FragmentSink, Processor};
use crate::reconstruct::Reconstructor;
use crate::types::{EventRecord, Fragment};
use crate::utils::{get_inherited, page_media_box, page_rotation};

/// Fragments before the first schedule row: title block and table header.
pub const HEADER_FRAGMENTS: usize = 18;

/// Fragments after the last schedule row: the page footer.
pub const FOOTER_FRAGMENTS: usize = 1;

/// Layout units per PDF point. Column buckets are expressed in sixteenths of
/// the page's point grid.
pub const UNITS_PER_POINT: f64 = 1. / 16.;

fn extract_fragments_from_doc(
    doc: &Document,
    units_per_point: f64,
) -> Result<Vec<Fragment>, PlanError> {
    let mut sink = FragmentSink::new(units_per_point);
    let empty_resources = Dictionary::new();
    let mut p = Processor::new();

    for (page_num, object_id) in doc.get_pages() {
        let page_dict = doc.get_object(object_id)?.as_dict()?;
        let resources = get_inherited(doc, page_dict, b"Resources")
            .and_then(|o| o.as_dict().ok())
            .unwrap_or(&empty_resources);

        sink.begin_page(
            page_num,
            page_media_box(doc, page_dict),
            page_rotation(doc, page_dict),
        );
        let content = doc.get_page_content(object_id)?;
        p.process_stream(doc, &content, resources, &mut sink)?;
    }

    Ok(sink.into_fragments())
}

/// Builder for configuring schedule extraction.
///
/// # Examples
///
/// ```no_run
/// use plan_csv::{Exclusions, PdfExtractor};
///
/// let csv = PdfExtractor::builder()
///     .password("secret")
///     .build()
///     .plan_from_path("plan.pdf", &Exclusions::parse("Matematyka"))?;
/// # Ok::<(), plan_csv::PlanError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PdfExtractorBuilder {
    password: Option<String>,
    skip_leading: usize,
    skip_trailing: usize,
    units_per_point: f64,
    layout: ColumnLayout,
}

impl Default for PdfExtractorBuilder {
    fn default() -> Self {
        PdfExtractorBuilder {
            password: None,
            skip_leading: HEADER_FRAGMENTS,
            skip_trailing: FOOTER_FRAGMENTS,
            units_per_point: UNITS_PER_POINT,
            layout: ColumnLayout::default(),
        }
    }
}

impl PdfExtractorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the password for encrypted PDFs.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Number of fragments to drop from the start of the document.
    pub fn skip_leading(mut self, count: usize) -> Self {
        self.skip_leading = count;
        self
    }

    /// Number of fragments to drop from the end of the document.
    pub fn skip_trailing(mut self, count: usize) -> Self {
        self.skip_trailing = count;
        self
    }

    pub fn units_per_point(mut self, units: f64) -> Self {
        self.units_per_point = units;
        self
    }

    /// Column table used to classify fragments.
    pub fn layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Build the extractor configuration.
    pub fn build(self) -> PdfExtractor {
        PdfExtractor {
            password: self.password,
            skip_leading: self.skip_leading,
            skip_trailing: self.skip_trailing,
            units_per_point: self.units_per_point,
            layout: self.layout,
        }
    }
}

/// Reads a schedule PDF and turns it into events or calendar CSV.
///
/// # Examples
///
/// ```no_run
/// use plan_csv::{Exclusions, PdfExtractor};
///
/// let extractor = PdfExtractor::default();
/// for event in extractor.events_from_path("plan.pdf", &Exclusions::new())? {
///     println!("{}", event);
/// }
/// # Ok::<(), plan_csv::PlanError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    password: Option<String>,
    skip_leading: usize,
    skip_trailing: usize,
    units_per_point: f64,
    layout: ColumnLayout,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        PdfExtractorBuilder::default().build()
    }
}

impl PdfExtractor {
    /// Create a builder for configuring extraction options.
    pub fn builder() -> PdfExtractorBuilder {
        PdfExtractorBuilder::new()
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Schedule fragments of a PDF file, header and footer removed.
    pub fn fragments_from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Vec<Fragment>, PlanError> {
        let mut doc = Document::load(path)?;
        self.fragments_from_document(&mut doc)
    }

    /// Schedule fragments of a PDF in memory.
    pub fn fragments_from_bytes(&self, bytes: &[u8]) -> Result<Vec<Fragment>, PlanError> {
        let mut doc = Document::load_mem(bytes)?;
        self.fragments_from_document(&mut doc)
    }

    /// Schedule fragments of a PDF reader.
    pub fn fragments_from_reader<R: Read>(
        &self,
        mut reader: R,
    ) -> Result<Vec<Fragment>, PlanError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.fragments_from_bytes(&bytes)
    }

    pub fn events_from_path<P: AsRef<Path>>(
        &self,
        path: P,
        excluded: &Exclusions,
    ) -> Result<Vec<EventRecord>, PlanError> {
        let fragments = self.fragments_from_path(path)?;
        Reconstructor::new(&self.layout).run(&fragments, excluded)
    }

    pub fn events_from_bytes(
        &self,
        bytes: &[u8],
        excluded: &Exclusions,
    ) -> Result<Vec<EventRecord>, PlanError> {
        let fragments = self.fragments_from_bytes(bytes)?;
        Reconstructor::new(&self.layout).run(&fragments, excluded)
    }

    /// Calendar CSV for a schedule PDF file.
    pub fn plan_from_path<P: AsRef<Path>>(
        &self,
        path: P,
        excluded: &Exclusions,
    ) -> Result<String, PlanError> {
        Ok(to_csv(&self.events_from_path(path, excluded)?))
    }

    /// Calendar CSV for a schedule PDF in memory.
    pub fn plan_from_bytes(
        &self,
        bytes: &[u8],
        excluded: &Exclusions,
    ) -> Result<String, PlanError> {
        Ok(to_csv(&self.events_from_bytes(bytes, excluded)?))
    }

    fn fragments_from_document(&self, doc: &mut Document) -> Result<Vec<Fragment>, PlanError> {
        if doc.is_encrypted() {
            if let Some(password) = &self.password {
                doc.decrypt(password)?;
            } else {
                doc.decrypt("")?;
            }
        }

        let fragments = extract_fragments_from_doc(doc, self.units_per_point)?;
        Ok(self.strip_frame(fragments))
    }

    /// Drop the header and footer fragments around the schedule rows.
    fn strip_frame(&self, mut fragments: Vec<Fragment>) -> Vec<Fragment> {
        let total = fragments.len();
        if total < self.skip_leading + self.skip_trailing {
            warn!(
                "document has {} fragments, fewer than its {} header and {} footer fragments",
                total, self.skip_leading, self.skip_trailing
            );
            return Vec::new();
        }
        fragments.truncate(total - self.skip_trailing);
        fragments.drain(..self.skip_leading);
        debug!("{} of {} fragments are schedule rows", fragments.len(), total);
        fragments
    }
}

/// Calendar CSV for a schedule PDF file using default settings.
///
/// This is a convenience function equivalent to
/// `PdfExtractor::default().plan_from_path(path, excluded)`.
pub fn plan_from_path<P: AsRef<Path>>(
    path: P,
    excluded: &Exclusions,
) -> Result<String, PlanError> {
    PdfExtractor::default().plan_from_path(path, excluded)
}

/// Calendar CSV for a schedule PDF in memory using default settings.
pub fn plan_from_bytes(bytes: &[u8], excluded: &Exclusions) -> Result<String, PlanError> {
    PdfExtractor::default().plan_from_bytes(bytes, excluded)
}

/// Calendar CSV for an already extracted fragment stream, header and footer
/// already removed.
pub fn plan_from_fragments(
    fragments: &[Fragment],
    excluded: &Exclusions,
) -> Result<String, PlanError> {
    let events = crate::reconstruct::classify_and_reconstruct(fragments, excluded)?;
    Ok(to_csv(&events))
}
