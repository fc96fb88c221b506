use crate::error::Error;

use super::equiv_class::ClassId;

/// Index of an item in the array's arena.
pub type ItemId = usize;

#[derive(Debug, Clone, Copy)]
struct Item {
    position: usize,
    next_item: Option<ItemId>,
    next_run: Option<ItemId>,
}

/// Bookkeeping for one equivalence class.
#[derive(Debug, Clone, Copy, Default)]
struct ClassList {
    first_item: Option<ItemId>,
    last_item: Option<ItemId>,
    previous_start_item: Option<ItemId>,
    /// First item of the run currently being extended.
    run_head: Option<ItemId>,
}

/// One list of positions per equivalence class, in insertion order.
///
/// Consecutive items whose positions carry the same character form a
/// *run*; `next_run` of every item points at the first later item with
/// a different character. The palindrome sweep hops runs to discard a
/// whole stretch of equivalent candidates at once, and keeps a per-class
/// cursor (`previous_start_item`) so repeated scans never rewind.
pub struct EquivClassArray {
    items: Vec<Item>,
    lists: Vec<ClassList>,
}

impl EquivClassArray {
    pub fn new(num_classes: usize) -> EquivClassArray {
        EquivClassArray { items: Vec::new(), lists: vec![ClassList::default(); num_classes] }
    }

    pub fn num_classes(&self) -> usize {
        self.lists.len()
    }

    fn check_class(&self, class: ClassId) -> Result<(), Error> {
        if class >= self.lists.len() {
            return Err(Error::ClassOutOfBounds { class, num_classes: self.lists.len() });
        }
        Ok(())
    }

    /// Appends `position` to the list for `class`. A character change
    /// against the previous item closes the current run, pointing all of
    /// its items' `next_run` at the new item.
    pub fn add(&mut self, class: ClassId, position: usize, text: &[u8]) -> Result<ItemId, Error> {
        self.check_class(class)?;

        let new_item = self.items.len();
        self.items.push(Item { position, next_item: None, next_run: None });

        match self.lists[class].last_item {
            None => {
                let list = &mut self.lists[class];
                list.first_item = Some(new_item);
                list.run_head = Some(new_item);
            }
            Some(last) => {
                self.items[last].next_item = Some(new_item);
                if text[position] != text[self.items[last].position] {
                    // Backfill the closing run; each item is visited
                    // once over the life of the list.
                    let mut current = self.lists[class].run_head;
                    while let Some(item) = current {
                        self.items[item].next_run = Some(new_item);
                        current = if item == last { None } else { self.items[item].next_item };
                    }
                    self.lists[class].run_head = Some(new_item);
                }
            }
        }
        self.lists[class].last_item = Some(new_item);
        Ok(new_item)
    }

    /// Most recently added item of the class, if any.
    pub fn last_item(&self, class: ClassId) -> Result<Option<ItemId>, Error> {
        self.check_class(class)?;
        Ok(self.lists[class].last_item)
    }

    /// The stored scan cursor for the class, or the first item ever
    /// added when the cursor was never set.
    pub fn previous_start_item(&self, class: ClassId) -> Result<Option<ItemId>, Error> {
        self.check_class(class)?;
        let list = &self.lists[class];
        Ok(list.previous_start_item.or(list.first_item))
    }

    pub fn set_previous_start_item(
        &mut self,
        class: ClassId,
        item: Option<ItemId>,
    ) -> Result<(), Error> {
        self.check_class(class)?;
        self.lists[class].previous_start_item = item;
        Ok(())
    }

    pub fn position(&self, item: ItemId) -> usize {
        self.items[item].position
    }

    pub fn next_item(&self, item: ItemId) -> Option<ItemId> {
        self.items[item].next_item
    }

    pub fn next_run(&self, item: ItemId) -> Option<ItemId> {
        self.items[item].next_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_keep_insertion_order() {
        let text = b"ABABAB";
        let mut array = EquivClassArray::new(3);
        for position in [0, 2, 4] {
            array.add(1, position, text).unwrap();
        }

        let mut item = array.previous_start_item(1).unwrap();
        let mut positions = Vec::new();
        while let Some(id) = item {
            positions.push(array.position(id));
            item = array.next_item(id);
        }
        assert_eq!(positions, [0, 2, 4]);
        assert_eq!(array.last_item(1).unwrap().map(|id| array.position(id)), Some(4));
        assert_eq!(array.last_item(2).unwrap(), None);
    }

    #[test]
    fn runs_split_on_character_changes() {
        //                0    1    2    3    4
        let text = b"AABBA";
        let mut array = EquivClassArray::new(2);
        let items: Vec<ItemId> =
            (0..5).map(|position| array.add(1, position, text).unwrap()).collect();

        // Runs are [0, 1], [2, 3], [4]; every member of a run points at
        // the next run's head.
        assert_eq!(array.next_run(items[0]), Some(items[2]));
        assert_eq!(array.next_run(items[1]), Some(items[2]));
        assert_eq!(array.next_run(items[2]), Some(items[4]));
        assert_eq!(array.next_run(items[3]), Some(items[4]));
        assert_eq!(array.next_run(items[4]), None);
    }

    #[test]
    fn cursor_falls_back_to_the_first_item() {
        let text = b"XYZ";
        let mut array = EquivClassArray::new(2);
        let first = array.add(0, 0, text).unwrap();
        let second = array.add(0, 1, text).unwrap();

        assert_eq!(array.previous_start_item(0).unwrap(), Some(first));
        array.set_previous_start_item(0, Some(second)).unwrap();
        assert_eq!(array.previous_start_item(0).unwrap(), Some(second));
        array.set_previous_start_item(0, None).unwrap();
        assert_eq!(array.previous_start_item(0).unwrap(), Some(first));
    }

    #[test]
    fn class_bounds_are_enforced() {
        let mut array = EquivClassArray::new(2);
        assert!(matches!(
            array.add(2, 0, b"A"),
            Err(Error::ClassOutOfBounds { class: 2, num_classes: 2 })
        ));
        assert!(matches!(
            array.previous_start_item(5),
            Err(Error::ClassOutOfBounds { class: 5, num_classes: 2 })
        ));
    }
}
