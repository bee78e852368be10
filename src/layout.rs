use crate::types::FieldKind;

/// A horizontal band of the page assigned to one field kind. Both bounds are
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBucket {
    pub min: f64,
    pub max: f64,
    pub kind: FieldKind,
}

impl ColumnBucket {
    pub const fn new(min: f64, max: f64, kind: FieldKind) -> Self {
        ColumnBucket { min, max, kind }
    }

    pub fn contains(&self, x: f64) -> bool {
        x > self.min && x < self.max
    }
}

const SCHEDULE_BUCKETS: [ColumnBucket; 7] = [
    ColumnBucket::new(0.2, 1.5, FieldKind::Hours),
    ColumnBucket::new(2.0, 2.5, FieldKind::Date),
    ColumnBucket::new(4.5, 5.5, FieldKind::Type),
    ColumnBucket::new(6.0, 7.5, FieldKind::Name),
    ColumnBucket::new(18.0, 20.0, FieldKind::Choice),
    ColumnBucket::new(21.0, 23.0, FieldKind::Room),
    ColumnBucket::new(23.5, 25.5, FieldKind::Owner),
];

/// Ordered column table used to classify fragments by their `x` offset.
///
/// Buckets are tested in order and the first match wins, so overlapping
/// entries are allowed and resolved by position.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    buckets: Vec<ColumnBucket>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout {
            buckets: SCHEDULE_BUCKETS.to_vec(),
        }
    }
}

impl ColumnLayout {
    pub fn new(buckets: Vec<ColumnBucket>) -> Self {
        ColumnLayout { buckets }
    }

    /// The layout older exports were produced with: the owner column is
    /// open-ended and takes every `x` no earlier bucket claims, so no
    /// fragment is ever rejected.
    pub fn legacy() -> Self {
        let mut buckets = SCHEDULE_BUCKETS.to_vec();
        if let Some(owner) = buckets.iter_mut().find(|b| b.kind == FieldKind::Owner) {
            owner.min = f64::NEG_INFINITY;
            owner.max = f64::INFINITY;
        }
        ColumnLayout { buckets }
    }

    pub fn buckets(&self) -> &[ColumnBucket] {
        &self.buckets
    }

    pub fn classify(&self, x: f64) -> Option<FieldKind> {
        self.buckets.iter().find(|b| b.contains(x)).map(|b| b.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.5, Some(FieldKind::Hours))]
    #[case(2.2, Some(FieldKind::Date))]
    #[case(5.0, Some(FieldKind::Type))]
    #[case(6.5, Some(FieldKind::Name))]
    #[case(19.0, Some(FieldKind::Choice))]
    #[case(22.0, Some(FieldKind::Room))]
    #[case(24.0, Some(FieldKind::Owner))]
    #[case(26.0, None)]
    #[case(3.0, None)]
    #[case(0.2, None)]
    #[case(1.5, None)]
    #[case(23.2, None)]
    fn default_layout_buckets(#[case] x: f64, #[case] expected: Option<FieldKind>) {
        assert_eq!(ColumnLayout::default().classify(x), expected);
    }

    #[rstest]
    #[case(26.0)]
    #[case(3.0)]
    #[case(0.1)]
    #[case(23.2)]
    fn legacy_layout_falls_through_to_owner(#[case] x: f64) {
        assert_eq!(ColumnLayout::legacy().classify(x), Some(FieldKind::Owner));
    }

    #[test]
    fn legacy_owner_bucket_is_open_and_last() {
        let legacy = ColumnLayout::legacy();
        let default = ColumnLayout::default();
        assert_eq!(legacy.buckets().len(), default.buckets().len());
        assert_eq!(legacy.buckets()[..6], default.buckets()[..6]);

        let owner = legacy.buckets()[6];
        assert_eq!(owner.kind, FieldKind::Owner);
        assert_eq!(owner.min, f64::NEG_INFINITY);
        assert_eq!(owner.max, f64::INFINITY);
    }

    #[test]
    fn legacy_layout_keeps_earlier_columns() {
        let layout = ColumnLayout::legacy();
        assert_eq!(layout.classify(0.5), Some(FieldKind::Hours));
        assert_eq!(layout.classify(22.0), Some(FieldKind::Room));
    }

    #[test]
    fn custom_layout_first_match_wins() {
        let layout = ColumnLayout::new(vec![
            ColumnBucket::new(0.0, 10.0, FieldKind::Name),
            ColumnBucket::new(5.0, 15.0, FieldKind::Room),
        ]);
        assert_eq!(layout.classify(7.0), Some(FieldKind::Name));
        assert_eq!(layout.classify(12.0), Some(FieldKind::Room));
    }
}
