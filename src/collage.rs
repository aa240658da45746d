use crate::item::TextItem;

/// Ordered collection of [`TextItem`]s with single-level undo.
///
/// Insertion order is z-order: later items are drawn on top and are the first
/// to go on undo. Every call that changes the collage fires the redraw hook
/// exactly once.
#[derive(Default)]
pub struct Collage {
    items: Vec<TextItem>,
    undo_available: bool,
    redraw_hook: Option<Box<dyn FnMut()>>,
}

impl std::fmt::Debug for Collage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collage")
            .field("items", &self.items)
            .field("undo_available", &self.undo_available)
            .finish_non_exhaustive()
    }
}

impl Collage {
    /// Creates an empty collage without a redraw hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the callback fired after each mutation, replacing any
    /// previous one.
    pub fn set_redraw_hook(&mut self, hook: impl FnMut() + 'static) {
        self.redraw_hook = Some(Box::new(hook));
    }

    /// Appends an item on top of the collage.
    pub fn add(&mut self, item: TextItem) {
        self.items.push(item);
        self.undo_available = true;
        self.notify_redraw();
    }

    /// Appends a batch one item at a time, in order, with a single redraw.
    ///
    /// Undo still removes only the last item of the batch.
    pub fn extend(&mut self, items: impl IntoIterator<Item = TextItem>) {
        let before = self.items.len();
        self.items.extend(items);
        if self.items.len() != before {
            self.undo_available = true;
            self.notify_redraw();
        }
    }

    /// Removes the most recently added item.
    ///
    /// The last remaining item is never removed this way: with one item or
    /// none the call does nothing and returns `None`.
    pub fn remove_last(&mut self) -> Option<TextItem> {
        if self.items.len() <= 1 {
            return None;
        }

        let removed = self.items.pop();
        self.undo_available = !self.items.is_empty();
        self.notify_redraw();
        removed
    }

    /// Removes every item and disables undo.
    pub fn clear(&mut self) {
        self.items.clear();
        self.undo_available = false;
        self.notify_redraw();
    }

    /// Items in insertion (drawing) order.
    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    pub fn last(&self) -> Option<&TextItem> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an undo command should currently be offered.
    pub fn undo_available(&self) -> bool {
        self.undo_available
    }

    /// Appends without notifying; the caller owns the redraw for the whole
    /// operation.
    pub(crate) fn push_silent(&mut self, item: TextItem) {
        self.items.push(item);
        self.undo_available = true;
    }

    /// Clears without notifying; see [`Self::push_silent`].
    pub(crate) fn clear_silent(&mut self) {
        self.items.clear();
        self.undo_available = false;
    }

    pub(crate) fn notify_redraw(&mut self) {
        if let Some(hook) = self.redraw_hook.as_mut() {
            hook();
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counted() -> (Collage, Rc<Cell<usize>>) {
        let count = Rc::new(Cell::new(0));
        let mut collage = Collage::new();
        let hook_count = Rc::clone(&count);
        collage.set_redraw_hook(move || hook_count.set(hook_count.get() + 1));
        (collage, count)
    }

    #[test]
    fn test_add_appends_in_order() {
        let (mut collage, redraws) = counted();
        collage.add(TextItem::new("Hello World!", 100, 150));
        assert_eq!(collage.len(), 1);
        assert!(collage.undo_available());
        assert_eq!(redraws.get(), 1);

        collage.add(TextItem::new("second", 1, 2));
        let texts: Vec<_> = collage.items().iter().map(|i| i.text()).collect();
        assert_eq!(texts, ["Hello World!", "second"]);
        assert_eq!(redraws.get(), 2);
    }

    #[test]
    fn test_remove_last_keeps_single_item() {
        let (mut collage, redraws) = counted();
        collage.add(TextItem::new("only", 0, 0));
        assert_eq!(collage.remove_last(), None);
        assert_eq!(collage.len(), 1);
        // nothing changed, so nothing to redraw
        assert_eq!(redraws.get(), 1);
    }

    #[test]
    fn test_remove_last_on_empty_is_noop() {
        let mut collage = Collage::new();
        assert_eq!(collage.remove_last(), None);
        assert!(collage.is_empty());
        assert!(!collage.undo_available());
    }

    #[test]
    fn test_undo_removes_most_recent() {
        let (mut collage, redraws) = counted();
        let a = TextItem::new("A", 10, 10);
        let b = TextItem::new("B", 20, 20);
        collage.add(a.clone());
        collage.add(b.clone());

        assert_eq!(collage.remove_last(), Some(b));
        assert_eq!(collage.items(), std::slice::from_ref(&a));
        assert!(collage.undo_available());
        assert_eq!(redraws.get(), 3);

        assert_eq!(collage.remove_last(), None);
        assert_eq!(collage.items(), std::slice::from_ref(&a));
        assert_eq!(redraws.get(), 3);
    }

    #[test]
    fn test_clear_disables_undo() {
        let (mut collage, redraws) = counted();
        collage.add(TextItem::new("A", 0, 0));
        collage.add(TextItem::new("B", 0, 0));
        collage.clear();
        assert!(collage.is_empty());
        assert!(!collage.undo_available());
        assert_eq!(redraws.get(), 3);

        assert_eq!(collage.remove_last(), None);
        assert!(collage.is_empty());
    }

    #[test]
    fn test_extend_redraws_once() {
        let (mut collage, redraws) = counted();
        let batch: Vec<_> = (0..30).map(|i| TextItem::new("x", i, i)).collect();
        collage.extend(batch);
        assert_eq!(collage.len(), 30);
        assert_eq!(redraws.get(), 1);

        let removed = collage.remove_last().unwrap();
        assert_eq!(removed.x(), 29);
        assert_eq!(collage.len(), 29);

        collage.extend(Vec::new());
        assert_eq!(redraws.get(), 2);
    }
}
