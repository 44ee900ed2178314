use bevy::prelude::*;

/// Running min/max of node type labels over every skeleton loaded in this session.
///
/// The abstraction boundary interpolates inside this range, so widening it
/// moves where a given slider threshold lands.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct LabelRange {
    bounds: Option<(i32, i32)>,
}

impl LabelRange {
    pub fn widen(&mut self, label: i32) {
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(label), max.max(label)),
            None => (label, label),
        });
    }

    pub fn min(&self) -> Option<i32> {
        self.bounds.map(|(min, _)| min)
    }

    pub fn max(&self) -> Option<i32> {
        self.bounds.map(|(_, max)| max)
    }

    /// Label value separating collapsed from visible elements for a slider
    /// `threshold` in [0, 1]: `min + (1 - threshold) * (max - min)`.
    pub fn boundary(&self, threshold: f32) -> Option<f32> {
        self.bounds.map(|(min, max)| {
            let threshold = threshold.clamp(0.0, 1.0);
            min as f32 + (1.0 - threshold) * (max - min) as f32
        })
    }

    /// Position of an absolute `boundary` within the range, in [0, 1].
    pub fn normalised(&self, boundary: f32) -> Option<f32> {
        self.bounds.map(|(min, max)| {
            let span = (max - min) as f32;
            if span <= 0.0 {
                0.0
            } else {
                ((boundary - min as f32) / span).clamp(0.0, 1.0)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_interpolates_inverted_threshold() {
        let mut range = LabelRange::default();
        assert_eq!(range.boundary(0.5), None);

        range.widen(2);
        range.widen(6);
        assert_eq!(range.boundary(1.0), Some(2.0));
        assert_eq!(range.boundary(0.0), Some(6.0));
        assert_eq!(range.boundary(0.25), Some(5.0));
    }

    #[test]
    fn widening_moves_normalised_position() {
        let mut range = LabelRange::default();
        range.widen(0);
        range.widen(4);
        let boundary = range.boundary(0.5).unwrap();
        assert_eq!(range.normalised(boundary), Some(0.5));

        range.widen(8);
        assert_eq!(range.normalised(boundary), Some(0.25));
    }

    #[test]
    fn degenerate_range_normalises_to_zero() {
        let mut range = LabelRange::default();
        range.widen(3);
        assert_eq!(range.normalised(3.0), Some(0.0));
    }
}
