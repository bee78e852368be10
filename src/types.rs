use std::fmt;

use euclid::Transform2D;

pub struct Space;
pub type Transform = Transform2D<f32, Space, Space>;

/// Placeholder for a field that never appeared before its record closed.
pub const NOT_DEFINED: &str = "n/z";

/// Event type used when no type column was seen.
pub const DEFAULT_KIND: &str = "inne";

/// Page rectangle in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MediaBox {
    pub(crate) llx: f32,
    pub(crate) lly: f32,
    pub(crate) urx: f32,
    pub(crate) ury: f32,
}

impl Default for MediaBox {
    // US Letter, the PDF default user space.
    fn default() -> Self {
        MediaBox {
            llx: 0.,
            lly: 0.,
            urx: 612.,
            ury: 792.,
        }
    }
}

/// One positioned text run, in the order it appears in the content stream.
///
/// Coordinates are in layout units (PDF points divided by 16), `x` measured
/// from the left edge and `y` from the top of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub page: u32,
}

impl Fragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Fragment {
            text: text.into(),
            x,
            y,
            page: 1,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p{} (x: {:.3}, y: {:.3}) {:?}",
            self.page, self.x, self.y, self.text
        )
    }
}

/// The semantic column a fragment run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Hours,
    Date,
    Type,
    Name,
    Choice,
    Room,
    Owner,
}

impl FieldKind {
    /// Kinds that must all be seen before a record is complete. `Date` is a
    /// row header and never counts.
    pub const REQUIRED: [FieldKind; 6] = [
        FieldKind::Owner,
        FieldKind::Hours,
        FieldKind::Room,
        FieldKind::Name,
        FieldKind::Choice,
        FieldKind::Type,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Hours => "hours",
            FieldKind::Date => "date",
            FieldKind::Type => "type",
            FieldKind::Name => "name",
            FieldKind::Choice => "choice",
            FieldKind::Room => "room",
            FieldKind::Owner => "owner",
        };
        f.write_str(name)
    }
}

/// A classified field value built from one or more fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Hours { start: String, end: String },
    Date(String),
    Type(String),
    Name(String),
    Choice(String),
    Room(String),
    Owner(String),
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Hours { .. } => FieldKind::Hours,
            Field::Date(_) => FieldKind::Date,
            Field::Type(_) => FieldKind::Type,
            Field::Name(_) => FieldKind::Name,
            Field::Choice(_) => FieldKind::Choice,
            Field::Room(_) => FieldKind::Room,
            Field::Owner(_) => FieldKind::Owner,
        }
    }
}

/// Set of field kinds seen for the record being built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FieldSet(u8);

impl FieldSet {
    pub(crate) fn contains(&self, kind: FieldKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub(crate) fn insert(&mut self, kind: FieldKind) {
        self.0 |= kind.bit();
    }

    pub(crate) fn is_complete(&self) -> bool {
        FieldKind::REQUIRED.iter().all(|&k| self.contains(k))
    }
}

/// One reconstructed class occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub owner: String,
    pub start: String,
    pub end: String,
    pub room: String,
    pub name: String,
    pub choice: String,
    pub kind: String,
}

impl Default for EventRecord {
    fn default() -> Self {
        EventRecord {
            owner: NOT_DEFINED.to_string(),
            start: NOT_DEFINED.to_string(),
            end: NOT_DEFINED.to_string(),
            room: NOT_DEFINED.to_string(),
            name: NOT_DEFINED.to_string(),
            choice: NOT_DEFINED.to_string(),
            kind: DEFAULT_KIND.to_string(),
        }
    }
}

impl EventRecord {
    /// Overwrite the slot the field maps to. Date headers carry no event data
    /// and are ignored here.
    pub(crate) fn merge(&mut self, field: Field) {
        match field {
            Field::Hours { start, end } => {
                self.start = start;
                self.end = end;
            }
            Field::Date(_) => {}
            Field::Type(v) => self.kind = v,
            Field::Name(v) => self.name = v,
            Field::Choice(v) => self.choice = v,
            Field::Room(v) => self.room = v,
            Field::Owner(v) => self.owner = v,
        }
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} [{} .. {}] {} / {} / {}",
            self.kind, self.name, self.start, self.end, self.room, self.owner, self.choice
        )
    }
}
