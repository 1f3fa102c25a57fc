//! Search-restricted view over an [`OrderedSet`].
//!
//! Filtering never reorders: surviving items keep their ordered-set order.

use super::ad::Ad;
use super::ordering::OrderedSet;

/// Positions into one ordered set that match the current search term.
#[derive(Debug, Clone)]
pub struct FilteredView {
    source: OrderedSet,
    positions: Vec<usize>,
}

impl FilteredView {
    /// Restrict `source` to ads whose title or description contains `term`
    /// (case-insensitive, surrounding whitespace ignored).
    pub fn new(source: &OrderedSet, term: &str) -> Self {
        let needle = term.trim().to_lowercase();
        let positions = source
            .items()
            .iter()
            .enumerate()
            .filter(|(_, ad)| ad.matches(&needle))
            .map(|(i, _)| i)
            .collect();
        Self {
            source: source.clone(),
            positions,
        }
    }

    pub fn empty() -> Self {
        Self {
            source: OrderedSet::empty(0),
            positions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn get(&self, index: usize) -> Option<&Ad> {
        self.positions
            .get(index)
            .and_then(|&p| self.source.items().get(p))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ad> + '_ {
        self.positions
            .iter()
            .filter_map(move |&p| self.source.items().get(p))
    }

    /// Same load and the same element sequence.  Length alone is not enough:
    /// two different searches can match the same number of ads.
    pub fn is_same(&self, other: &FilteredView) -> bool {
        self.source.same_load(&other.source) && self.positions == other.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ad::sample_ad;
    use crate::core::ordering::XorShift64;

    fn ordered() -> OrderedSet {
        let ads = vec![
            sample_ad(1, "Red shoes", "Running gear"),
            sample_ad(2, "Blue hat", "Warm winter wear"),
            sample_ad(3, "Red scarf", "Winter accessory"),
            sample_ad(4, "Green mug", "Kitchen"),
            sample_ad(5, "Tea set", "Red porcelain"),
        ];
        OrderedSet::from_load(ads, 1, &mut XorShift64::new(99))
    }

    fn ids(view: &FilteredView) -> Vec<i64> {
        view.iter().map(|a| a.id).collect()
    }

    #[test]
    fn filtering_preserves_ordered_set_order() {
        let set = ordered();
        let full: Vec<i64> = set.items().iter().map(|a| a.id).collect();

        for term in ["", "red", "WINTER", "  mug ", "nothing"] {
            let view = FilteredView::new(&set, term);
            let expected: Vec<i64> = full
                .iter()
                .copied()
                .filter(|id| ids(&view).contains(id))
                .collect();
            assert_eq!(ids(&view), expected, "order changed for {term:?}");
        }
        assert_eq!(FilteredView::new(&set, "red").len(), 3);
    }

    #[test]
    fn identity_is_by_sequence_not_length() {
        let set = ordered();
        let red = FilteredView::new(&set, "red");
        let red_again = FilteredView::new(&set, "RED");
        assert!(red.is_same(&red_again));

        // "winter" and "red s" differ in members.
        let winter = FilteredView::new(&set, "winter");
        let red_s = FilteredView::new(&set, "red s");
        assert_eq!(winter.len(), red_s.len());
        assert!(!winter.is_same(&red_s));
    }

    #[test]
    fn a_new_load_is_never_the_same_view() {
        let a = FilteredView::new(&ordered(), "");
        let b = FilteredView::new(&ordered(), "");
        assert_eq!(ids(&a), ids(&b));
        assert!(!a.is_same(&b));
    }
}
