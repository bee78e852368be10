use std::mem;

use tracing::debug;

use crate::classify::Classifier;
use crate::error::PlanError;
use crate::exclusions::Exclusions;
use crate::layout::ColumnLayout;
use crate::types::{EventRecord, FieldKind, FieldSet, Fragment};

/// Rebuilds schedule events from a classified fragment stream.
///
/// Fields are merged into one in-progress record until either every required
/// column has been seen, or a column shows up a second time. In the second
/// case the repeated field belongs to the next event: the cursor is rewound
/// so it is read again for the fresh record. A record still open when the
/// stream ends is dropped.
#[derive(Debug, Clone, Copy)]
pub struct Reconstructor<'a> {
    layout: &'a ColumnLayout,
}

impl<'a> Reconstructor<'a> {
    pub fn new(layout: &'a ColumnLayout) -> Self {
        Reconstructor { layout }
    }

    /// All closed records in document order, before any filtering.
    pub fn events(&self, fragments: &[Fragment]) -> Result<Vec<EventRecord>, PlanError> {
        let mut classifier = Classifier::new(fragments, self.layout);
        let mut events = Vec::new();
        let mut record = EventRecord::default();
        let mut seen = FieldSet::default();

        loop {
            let field_start = classifier.position();
            let Some(field) = classifier.next_field()? else {
                break;
            };

            let kind = field.kind();
            if kind == FieldKind::Date {
                continue;
            }

            record.merge(field);

            if seen.contains(kind) {
                debug!(
                    "{} repeated at fragment {}, closing {:?}",
                    kind, field_start, record.name
                );
                classifier.rewind(field_start);
                events.push(mem::take(&mut record));
                seen = FieldSet::default();
                continue;
            }

            seen.insert(kind);
            if seen.is_complete() {
                debug!("closing complete event {:?}", record.name);
                events.push(mem::take(&mut record));
                seen = FieldSet::default();
            }
        }

        if seen != FieldSet::default() {
            debug!("dropping unfinished event {:?} at end of stream", record.name);
        }

        Ok(events)
    }

    /// Closed records with every excluded name removed.
    pub fn run(
        &self,
        fragments: &[Fragment],
        excluded: &Exclusions,
    ) -> Result<Vec<EventRecord>, PlanError> {
        let mut events = self.events(fragments)?;
        events.retain(|event| !excluded.contains(&event.name));
        Ok(events)
    }
}

/// Rebuild the events of a fragment stream with the standard column layout,
/// leaving out every event whose name is excluded.
pub fn classify_and_reconstruct(
    fragments: &[Fragment],
    excluded: &Exclusions,
) -> Result<Vec<EventRecord>, PlanError> {
    Reconstructor::new(&ColumnLayout::default()).run(fragments, excluded)
}
