//! Multi-select state for bulk actions.
//!
//! # Invariants
//! - `Inactive` holds no ids.
//! - Emptying the set through `toggle` returns to `Inactive`; `deselect_all`
//!   clears the set but stays `Active` until the caller exits.
//! - Iteration order is ascending id order, so bulk loops are stable.

use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SelectionMode<Id> {
    Inactive,
    Active(BTreeSet<Id>),
}

/// Selection set over reminder or space ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet<Id: Ord + Copy> {
    mode: SelectionMode<Id>,
}

impl<Id: Ord + Copy> Default for SelectionSet<Id> {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Inactive,
        }
    }
}

impl<Id: Ord + Copy> SelectionSet<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters selection mode with `id` selected (long-press).
    pub fn enter(&mut self, id: Id) {
        match &mut self.mode {
            SelectionMode::Inactive => self.mode = SelectionMode::Active(BTreeSet::from([id])),
            SelectionMode::Active(ids) => {
                ids.insert(id);
            }
        }
    }

    /// Adds or removes `id`; returns whether it is selected afterwards.
    ///
    /// Does nothing while inactive.
    pub fn toggle(&mut self, id: Id) -> bool {
        let SelectionMode::Active(ids) = &mut self.mode else {
            return false;
        };
        let selected = if ids.remove(&id) {
            false
        } else {
            ids.insert(id);
            true
        };
        if ids.is_empty() {
            self.mode = SelectionMode::Inactive;
        }
        selected
    }

    /// Unions the selection with every visible candidate.
    pub fn select_all(&mut self, candidates: impl IntoIterator<Item = Id>) {
        match &mut self.mode {
            SelectionMode::Active(ids) => ids.extend(candidates),
            SelectionMode::Inactive => {
                let ids = candidates.into_iter().collect::<BTreeSet<_>>();
                if !ids.is_empty() {
                    self.mode = SelectionMode::Active(ids);
                }
            }
        }
    }

    /// Clears the set without leaving selection mode.
    pub fn deselect_all(&mut self) {
        if let SelectionMode::Active(ids) = &mut self.mode {
            ids.clear();
        }
    }

    pub fn exit(&mut self) {
        self.mode = SelectionMode::Inactive;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.mode, SelectionMode::Active(_))
    }

    pub fn contains(&self, id: &Id) -> bool {
        match &self.mode {
            SelectionMode::Active(ids) => ids.contains(id),
            SelectionMode::Inactive => false,
        }
    }

    pub fn len(&self) -> usize {
        match &self.mode {
            SelectionMode::Active(ids) => ids.len(),
            SelectionMode::Inactive => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> Vec<Id> {
        match &self.mode {
            SelectionMode::Active(ids) => ids.iter().copied().collect(),
            SelectionMode::Inactive => Vec::new(),
        }
    }
}

impl<Id: Ord + Copy> FromIterator<Id> for SelectionSet<Id> {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        let mut selection = Self::new();
        selection.select_all(iter);
        selection
    }
}
