//! Inventory system.

use chronicles_common::{GameError, GameResult, ItemId};
use serde::{Deserialize, Serialize};

/// Maximum number of items a character can carry.
pub const MAX_INVENTORY_SIZE: usize = 20;

/// An ordered bag of item ids, one entry per carried item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Items in pickup order
    items: Vec<ItemId>,
    /// Maximum number of entries
    capacity: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(MAX_INVENTORY_SIZE)
    }
}

impl Inventory {
    /// Creates a new inventory with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    /// Builds an inventory from stored ids.
    ///
    /// Fails if there are more ids than [`MAX_INVENTORY_SIZE`].
    pub fn from_items(items: Vec<ItemId>) -> GameResult<Self> {
        if items.len() > MAX_INVENTORY_SIZE {
            return Err(GameError::InventoryFull {
                capacity: MAX_INVENTORY_SIZE,
            });
        }
        Ok(Self {
            items,
            capacity: MAX_INVENTORY_SIZE,
        })
    }

    /// Returns the number of carried items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if nothing is carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns how many more items fit.
    #[must_use]
    pub fn space_remaining(&self) -> usize {
        self.capacity.saturating_sub(self.items.len())
    }

    /// Checks if no more items fit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.space_remaining() == 0
    }

    /// Returns how many copies of an item are carried.
    #[must_use]
    pub fn count(&self, item: &str) -> usize {
        self.items.iter().filter(|i| i.as_str() == item).count()
    }

    /// Checks if at least one copy is carried.
    #[must_use]
    pub fn has(&self, item: &str) -> bool {
        self.items.iter().any(|i| i.as_str() == item)
    }

    /// Adds one item.
    pub fn add(&mut self, item: ItemId) -> GameResult<()> {
        if self.is_full() {
            return Err(GameError::InventoryFull {
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(())
    }

    /// Removes the first copy of an item.
    pub fn remove(&mut self, item: &str) -> GameResult<ItemId> {
        let index = self
            .items
            .iter()
            .position(|i| i.as_str() == item)
            .ok_or_else(|| GameError::ItemNotFound(ItemId::new(item)))?;
        Ok(self.items.remove(index))
    }

    /// Removes everything, returning the removed items in order.
    pub fn clear(&mut self) -> Vec<ItemId> {
        std::mem::take(&mut self.items)
    }

    /// Returns an iterator over all items.
    pub fn iter(&self) -> impl Iterator<Item = &ItemId> + '_ {
        self.items.iter()
    }

    /// Returns the items as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[ItemId] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ItemId {
        ItemId::new(s)
    }

    #[test]
    fn test_inventory_add_remove() {
        let mut inv = Inventory::default();
        inv.add(id("health_potion")).expect("space");
        inv.add(id("health_potion")).expect("space");
        inv.add(id("iron_sword")).expect("space");

        assert_eq!(inv.len(), 3);
        assert_eq!(inv.count("health_potion"), 2);
        assert!(inv.has("iron_sword"));
        assert_eq!(inv.space_remaining(), 17);

        assert_eq!(inv.remove("health_potion"), Ok(id("health_potion")));
        assert_eq!(inv.count("health_potion"), 1);
    }

    #[test]
    fn test_inventory_remove_missing() {
        let mut inv = Inventory::default();
        assert_eq!(
            inv.remove("ghost"),
            Err(GameError::ItemNotFound(id("ghost")))
        );
    }

    #[test]
    fn test_inventory_full() {
        let mut inv = Inventory::default();
        for i in 0..MAX_INVENTORY_SIZE {
            inv.add(id(&format!("item_{i}"))).expect("space");
        }
        assert!(inv.is_full());
        assert_eq!(
            inv.add(id("one_more")),
            Err(GameError::InventoryFull {
                capacity: MAX_INVENTORY_SIZE
            })
        );
        assert_eq!(inv.len(), MAX_INVENTORY_SIZE);
    }

    #[test]
    fn test_inventory_from_items() {
        let inv = Inventory::from_items(vec![id("iron_sword"); MAX_INVENTORY_SIZE]).expect("fits");
        assert!(inv.is_full());

        assert_eq!(
            Inventory::from_items(vec![id("iron_sword"); MAX_INVENTORY_SIZE + 1]),
            Err(GameError::InventoryFull {
                capacity: MAX_INVENTORY_SIZE
            })
        );
    }

    #[test]
    fn test_inventory_clear_returns_items() {
        let mut inv = Inventory::default();
        inv.add(id("a")).expect("space");
        inv.add(id("b")).expect("space");

        let removed = inv.clear();
        assert_eq!(removed, vec![id("a"), id("b")]);
        assert!(inv.is_empty());
    }
}
