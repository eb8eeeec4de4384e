use std::collections::{BTreeMap, BTreeSet};

/// Currently selected region ids and the fill color assigned to each.
///
/// Invariant: every selected id has an override color (assigned at
/// selection time from the caller's current paint color), and no override
/// exists for an unselected id.
///
/// BTree containers keep iteration in id order so the selection list,
/// legend, and composited output are deterministic frame to frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionStore {
    selected: BTreeSet<u32>,
    override_colors: BTreeMap<u32, [u8; 3]>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a region. Selecting assigns `default_color` (the paint color
    /// chosen at the moment of the click — the store itself has no notion
    /// of a current color); deselecting drops both entries.
    pub fn toggle(&mut self, region_id: u32, default_color: [u8; 3]) {
        if self.selected.remove(&region_id) {
            self.override_colors.remove(&region_id);
        } else {
            self.selected.insert(region_id);
            self.override_colors.insert(region_id, default_color);
        }
    }

    /// Deselect everything. Also drops the override colors, making this
    /// behaviorally identical to [`reset_all`](Self::reset_all): the render
    /// path never shows override colors for unselected regions, so keeping
    /// them around could only leak stale assignments. (Documented choice;
    /// the UI still exposes both buttons.)
    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.override_colors.clear();
    }

    /// Drop all selections and color assignments.
    pub fn reset_all(&mut self) {
        self.selected.clear();
        self.override_colors.clear();
    }

    pub fn is_selected(&self, region_id: u32) -> bool {
        self.selected.contains(&region_id)
    }

    pub fn override_color_of(&self, region_id: u32) -> Option<[u8; 3]> {
        self.override_colors.get(&region_id).copied()
    }

    /// Selected ids in ascending order.
    pub fn selected_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.selected.iter().copied()
    }

    /// (id, override color) pairs in ascending id order.
    pub fn assignments(&self) -> impl Iterator<Item = (u32, [u8; 3])> + '_ {
        self.override_colors.iter().map(|(&id, &c)| (id, c))
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: [u8; 3] = [0, 0, 255];
    const TEAL: [u8; 3] = [0, 128, 128];

    #[test]
    fn toggle_selects_with_color_then_deselects() {
        let mut sel = SelectionStore::new();
        sel.toggle(3, BLUE);
        assert!(sel.is_selected(3));
        assert_eq!(sel.override_color_of(3), Some(BLUE));

        sel.toggle(3, TEAL); // color argument irrelevant on deselect
        assert!(!sel.is_selected(3));
        assert_eq!(sel.override_color_of(3), None);
    }

    #[test]
    fn toggle_round_trip_restores_prior_state() {
        let mut sel = SelectionStore::new();
        sel.toggle(1, BLUE);
        sel.toggle(7, TEAL);
        let before = sel.clone();

        sel.toggle(4, [9, 9, 9]);
        sel.toggle(4, [1, 1, 1]);
        assert_eq!(sel, before);
    }

    #[test]
    fn reselecting_takes_the_new_color() {
        let mut sel = SelectionStore::new();
        sel.toggle(2, BLUE);
        sel.toggle(2, BLUE);
        sel.toggle(2, TEAL);
        assert_eq!(sel.override_color_of(2), Some(TEAL));
    }

    #[test]
    fn reset_always_empties_both() {
        let mut sel = SelectionStore::new();
        for id in [5, 1, 9, 5, 2] {
            sel.toggle(id, BLUE);
        }
        sel.reset_all();
        assert!(sel.is_empty());
        assert_eq!(sel.assignments().count(), 0);
        assert_eq!(sel, SelectionStore::new());
    }

    #[test]
    fn clear_selection_matches_reset() {
        let mut a = SelectionStore::new();
        let mut b = SelectionStore::new();
        for id in [1, 2, 3] {
            a.toggle(id, TEAL);
            b.toggle(id, TEAL);
        }
        a.clear_selection();
        b.reset_all();
        assert_eq!(a, b);
    }

    #[test]
    fn ids_iterate_in_order() {
        let mut sel = SelectionStore::new();
        for id in [9, 2, 5] {
            sel.toggle(id, BLUE);
        }
        let ids: Vec<u32> = sel.selected_ids().collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }
}
