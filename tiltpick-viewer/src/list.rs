//! An ordered list with a single active selection and change events.

use std::fmt;

/// Change notifications emitted by a [`SelectableList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// An item was inserted at `index`.
    Inserted { index: usize },
    /// The item at `index` was removed.
    Removed { index: usize },
    /// The active item changed.
    SelectionChanged { active: Option<usize> },
}

type Listener = Box<dyn FnMut(&ListEvent) + Send>;

/// Ordered items with at most one active (selected) item.
pub struct SelectableList<T> {
    items: Vec<T>,
    active: Option<usize>,
    listeners: Vec<Listener>,
}

impl<T: fmt::Debug> fmt::Debug for SelectableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectableList")
            .field("items", &self.items)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<T> Default for SelectableList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> SelectableList<T> {
    /// Creates a list with nothing selected.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            active: None,
            listeners: Vec::new(),
        }
    }

    /// Registers a callback invoked after every change.
    pub fn connect(&mut self, listener: impl FnMut(&ListEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: &ListEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Iterates over items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Appends an item.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        let index = self.items.len() - 1;
        self.emit(&ListEvent::Inserted { index });
    }

    /// Removes and returns the item at `index`, keeping the selection on the
    /// same item if it survives.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.emit(&ListEvent::Removed { index });

        let active = match self.active {
            Some(a) if a == index => None,
            Some(a) if a > index => Some(a - 1),
            other => other,
        };
        if active != self.active {
            self.active = active;
            self.emit(&ListEvent::SelectionChanged { active });
        }
        Some(item)
    }

    /// Makes `index` the active item. Out-of-range indices clear the selection.
    pub fn select(&mut self, index: usize) {
        let active = (index < self.items.len()).then_some(index);
        if active != self.active {
            self.active = active;
            self.emit(&ListEvent::SelectionChanged { active });
        }
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        if self.active.is_some() {
            self.active = None;
            self.emit(&ListEvent::SelectionChanged { active: None });
        }
    }

    /// Index of the active item.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The active item.
    #[must_use]
    pub fn active(&self) -> Option<&T> {
        self.active.and_then(|i| self.items.get(i))
    }
}

impl<T> From<Vec<T>> for SelectableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<'a, T> IntoIterator for &'a SelectableList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
