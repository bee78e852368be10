use tracing::trace;

use crate::date::format_hours;
use crate::error::PlanError;
use crate::layout::ColumnLayout;
use crate::types::{Field, FieldKind, Fragment};

/// Reads classified fields off a fragment stream.
///
/// The classifier owns the parse cursor: the index of the next unread
/// fragment and the most recent date header. Both live only as long as one
/// pass over one document.
#[derive(Debug)]
pub struct Classifier<'a> {
    fragments: &'a [Fragment],
    layout: &'a ColumnLayout,
    position: usize,
    current_date: String,
}

impl<'a> Classifier<'a> {
    pub fn new(fragments: &'a [Fragment], layout: &'a ColumnLayout) -> Self {
        Classifier {
            fragments,
            layout,
            position: 0,
            current_date: String::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current_date(&self) -> &str {
        &self.current_date
    }

    /// Move the cursor back to a position previously returned by
    /// [`Classifier::position`].
    pub(crate) fn rewind(&mut self, position: usize) {
        debug_assert!(position <= self.position);
        self.position = position;
    }

    /// Join the run of fragments starting at the cursor that share one `x`
    /// and move the cursor past it. Returns the run's `x` and its text, or
    /// `None` when the cursor is already at the end of the stream.
    fn accumulate(&mut self) -> Option<(f64, String)> {
        let (first, rest) = self.fragments.get(self.position..)?.split_first()?;

        let mut text = first.text.clone();
        let mut consumed = 1;
        for fragment in rest.iter().take_while(|f| f.x == first.x) {
            text.push(' ');
            text.push_str(&fragment.text);
            consumed += 1;
        }

        self.position += consumed;
        Some((first.x, text.trim().to_string()))
    }

    /// Classify the next field, or `Ok(None)` once the stream is exhausted.
    pub fn next_field(&mut self) -> Result<Option<Field>, PlanError> {
        let Some((x, value)) = self.accumulate() else {
            return Ok(None);
        };

        let Some(kind) = self.layout.classify(x) else {
            return Err(PlanError::InvalidColumn { text: value, x });
        };
        trace!("{} at x={}: {:?}", kind, x, value);

        let field = match kind {
            FieldKind::Hours => {
                let (start, end) = format_hours(&value, &self.current_date);
                Field::Hours { start, end }
            }
            FieldKind::Date => {
                self.current_date.clone_from(&value);
                Field::Date(value)
            }
            FieldKind::Type => Field::Type(value),
            FieldKind::Name => Field::Name(value),
            FieldKind::Choice => Field::Choice(value),
            FieldKind::Room => Field::Room(value),
            FieldKind::Owner => Field::Owner(value),
        };

        Ok(Some(field))
    }
}
