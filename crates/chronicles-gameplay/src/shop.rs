//! Shop transactions: buying and selling items for gold.

use chronicles_common::{GameError, GameResult, ItemId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::character::Character;
use crate::item::Item;

/// Direction of a shop transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Gold paid for an item
    Purchase,
    /// Item traded back for gold
    Sale,
}

/// A record of a completed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Item involved
    pub item: ItemId,
    /// Gold paid or received
    pub gold: u32,
    /// Purchase or sale
    pub kind: TransactionKind,
    /// Character's gold after the transaction
    pub balance: u32,
}

impl Character {
    /// Buys one item at its listed cost.
    ///
    /// Checks gold first, then inventory space; nothing changes if either
    /// check fails.
    pub fn purchase_item(&mut self, item: &Item) -> GameResult<Transaction> {
        if self.gold < item.cost {
            return Err(GameError::InsufficientResources {
                needed: u64::from(item.cost),
                have: u64::from(self.gold),
            });
        }
        if self.inventory.is_full() {
            return Err(GameError::InventoryFull {
                capacity: self.inventory.capacity(),
            });
        }

        self.gold -= item.cost;
        self.inventory.add(item.id.clone())?;

        debug!("{} bought {} for {} gold", self.name, item.id, item.cost);
        Ok(Transaction {
            item: item.id.clone(),
            gold: item.cost,
            kind: TransactionKind::Purchase,
            balance: self.gold,
        })
    }

    /// Sells one carried item for half its cost.
    pub fn sell_item(&mut self, item: &Item) -> GameResult<Transaction> {
        self.inventory.remove(item.id.as_str())?;

        let price = item.sell_price();
        self.gold = self.gold.saturating_add(price);

        debug!("{} sold {} for {} gold", self.name, item.id, price);
        Ok(Transaction {
            item: item.id.clone(),
            gold: price,
            kind: TransactionKind::Sale,
            balance: self.gold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::MAX_INVENTORY_SIZE;
    use crate::item::{ItemEffect, ItemType};

    fn sword() -> Item {
        Item::new(
            "iron_sword",
            "Iron Sword",
            ItemType::Weapon,
            ItemEffect::new("strength", 5),
            100,
        )
    }

    fn warrior() -> Character {
        Character::create("Aria", "Warrior").expect("valid class")
    }

    #[test]
    fn test_purchase_then_sell_half_price() {
        let mut c = warrior();
        c.gold = 150;

        let bought = c.purchase_item(&sword()).expect("affordable");
        assert_eq!(bought.gold, 100);
        assert_eq!(bought.balance, 50);
        assert!(c.inventory.has("iron_sword"));

        let sold = c.sell_item(&sword()).expect("held");
        assert_eq!(sold.gold, 50);
        assert_eq!(sold.kind, TransactionKind::Sale);
        assert_eq!(c.gold, 100);
        assert!(!c.inventory.has("iron_sword"));
    }

    #[test]
    fn test_purchase_insufficient_gold() {
        let mut c = warrior();
        c.gold = 99;
        let before = c.clone();

        assert_eq!(
            c.purchase_item(&sword()),
            Err(GameError::InsufficientResources {
                needed: 100,
                have: 99
            })
        );
        assert_eq!(c, before);
    }

    #[test]
    fn test_gold_checked_before_space() {
        let mut c = warrior();
        c.gold = 0;
        for i in 0..MAX_INVENTORY_SIZE {
            c.inventory.add(ItemId::new(format!("junk_{i}"))).expect("space");
        }
        assert!(matches!(
            c.purchase_item(&sword()),
            Err(GameError::InsufficientResources { .. })
        ));
    }

    #[test]
    fn test_purchase_full_inventory() {
        let mut c = warrior();
        for i in 0..MAX_INVENTORY_SIZE {
            c.inventory.add(ItemId::new(format!("junk_{i}"))).expect("space");
        }
        assert_eq!(
            c.purchase_item(&sword()),
            Err(GameError::InventoryFull {
                capacity: MAX_INVENTORY_SIZE
            })
        );
        assert_eq!(c.gold, 100);
    }

    #[test]
    fn test_sell_with_full_inventory() {
        let mut c = warrior();
        c.inventory.add(sword().id).expect("space");
        for i in 1..MAX_INVENTORY_SIZE {
            c.inventory.add(ItemId::new(format!("junk_{i}"))).expect("space");
        }
        assert!(c.inventory.add(ItemId::new("extra")).is_err());

        let sold = c.sell_item(&sword()).expect("held");
        assert_eq!(sold.gold, 50);
        assert_eq!(c.inventory.len(), MAX_INVENTORY_SIZE - 1);
    }

    #[test]
    fn test_sell_missing_item() {
        let mut c = warrior();
        assert_eq!(
            c.sell_item(&sword()),
            Err(GameError::ItemNotFound(ItemId::new("iron_sword")))
        );
        assert_eq!(c.gold, 100);
    }
}
