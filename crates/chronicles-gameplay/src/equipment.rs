//! Item usage and equipment slots.
//!
//! Equipping records the stat change that was *actually applied*, so taking
//! the item off again reverses exactly that change.

use chronicles_common::{GameError, GameResult, ItemId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::character::Character;
use crate::item::{Item, ItemType, Stat};

/// A named attachment point for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipSlot {
    /// Holds a weapon
    Weapon,
    /// Holds armor
    Armor,
}

impl EquipSlot {
    /// Item category this slot accepts.
    #[must_use]
    pub const fn item_type(self) -> ItemType {
        match self {
            Self::Weapon => ItemType::Weapon,
            Self::Armor => ItemType::Armor,
        }
    }

    /// Returns the lowercase slot name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Armor => "armor",
        }
    }
}

impl fmt::Display for EquipSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weapon" => Ok(Self::Weapon),
            "armor" => Ok(Self::Armor),
            other => Err(format!("unknown equipment slot '{other}'")),
        }
    }
}

/// An item sitting in a slot, with the bonus it applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedItem {
    /// The equipped item
    pub item: ItemId,
    /// Stat the bonus went to (`None` if the effect named no numeric stat)
    pub stat: Option<Stat>,
    /// Change actually applied to `stat`
    pub bonus: i32,
}

/// Weapon and armor slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    weapon: Option<EquippedItem>,
    armor: Option<EquippedItem>,
}

impl Equipment {
    /// Returns what occupies a slot.
    #[must_use]
    pub const fn get(&self, slot: EquipSlot) -> Option<&EquippedItem> {
        match slot {
            EquipSlot::Weapon => self.weapon.as_ref(),
            EquipSlot::Armor => self.armor.as_ref(),
        }
    }

    /// Puts an item in a slot, returning the previous occupant.
    pub fn set(&mut self, slot: EquipSlot, equipped: EquippedItem) -> Option<EquippedItem> {
        self.slot_mut(slot).replace(equipped)
    }

    /// Empties a slot.
    pub fn take(&mut self, slot: EquipSlot) -> Option<EquippedItem> {
        self.slot_mut(slot).take()
    }

    /// Iterates occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, &EquippedItem)> + '_ {
        [EquipSlot::Weapon, EquipSlot::Armor]
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|e| (slot, e)))
    }

    fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<EquippedItem> {
        match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
        }
    }
}

impl Character {
    /// Uses a consumable from the inventory, applying its effect.
    pub fn use_item(&mut self, item: &Item) -> GameResult<String> {
        if !self.inventory.has(item.id.as_str()) {
            return Err(GameError::ItemNotFound(item.id.clone()));
        }
        if item.item_type != ItemType::Consumable {
            return Err(GameError::InvalidItemType {
                item: item.id.clone(),
                expected: ItemType::Consumable.to_string(),
                actual: item.item_type.to_string(),
            });
        }

        if let Some(stat) = item.effect.target() {
            self.apply_stat_delta(stat, item.effect.value);
        }
        self.inventory.remove(item.id.as_str())?;

        debug!("{} used {}", self.name, item.id);
        Ok(format!(
            "{} gained {} {}",
            self.name, item.effect.value, item.effect.stat
        ))
    }

    /// Equips a weapon, swapping out any current one.
    pub fn equip_weapon(&mut self, item: &Item) -> GameResult<String> {
        self.equip(item, EquipSlot::Weapon)
    }

    /// Equips armor, swapping out any current piece.
    pub fn equip_armor(&mut self, item: &Item) -> GameResult<String> {
        self.equip(item, EquipSlot::Armor)
    }

    /// Equips an item into a slot.
    ///
    /// The new item leaves the inventory before the old one returns to it,
    /// so a swap never needs a free slot.
    pub fn equip(&mut self, item: &Item, slot: EquipSlot) -> GameResult<String> {
        if !self.inventory.has(item.id.as_str()) {
            return Err(GameError::ItemNotFound(item.id.clone()));
        }
        if item.item_type != slot.item_type() {
            return Err(GameError::InvalidItemType {
                item: item.id.clone(),
                expected: slot.item_type().to_string(),
                actual: item.item_type.to_string(),
            });
        }
        self.inventory.remove(item.id.as_str())?;

        let mut message = String::new();
        if let Some(old) = self.equipment.take(slot) {
            self.reverse_bonus(&old);
            message = format!(
                "Unequipped {}, removing {} {}. ",
                old.item,
                old.bonus,
                old.stat.map_or("nothing", Stat::as_str)
            );
            self.inventory.add(old.item)?;
        }

        let stat = item.effect.target();
        let bonus = stat.map_or(0, |s| self.apply_stat_delta(s, item.effect.value));
        self.equipment.set(
            slot,
            EquippedItem {
                item: item.id.clone(),
                stat,
                bonus,
            },
        );

        debug!("{} equipped {} as {}", self.name, item.id, slot);
        message.push_str(&format!(
            "Equipped {}, granting {} {}.",
            item.name, item.effect.value, item.effect.stat
        ));
        Ok(message)
    }

    /// Removes the weapon and returns it to the inventory.
    pub fn unequip_weapon(&mut self) -> GameResult<Option<ItemId>> {
        self.unequip(EquipSlot::Weapon)
    }

    /// Removes the armor and returns it to the inventory.
    pub fn unequip_armor(&mut self) -> GameResult<Option<ItemId>> {
        self.unequip(EquipSlot::Armor)
    }

    /// Empties a slot, reversing its bonus.
    ///
    /// Returns `None` if the slot was already empty.
    pub fn unequip(&mut self, slot: EquipSlot) -> GameResult<Option<ItemId>> {
        if self.equipment.get(slot).is_none() {
            return Ok(None);
        }
        if self.inventory.is_full() {
            return Err(GameError::InventoryFull {
                capacity: self.inventory.capacity(),
            });
        }
        let Some(old) = self.equipment.take(slot) else {
            return Ok(None);
        };

        self.reverse_bonus(&old);
        self.inventory.add(old.item.clone())?;

        debug!("{} unequipped {} from {}", self.name, old.item, slot);
        Ok(Some(old.item))
    }

    fn reverse_bonus(&mut self, equipped: &EquippedItem) {
        if let Some(stat) = equipped.stat {
            self.apply_stat_delta(stat, -equipped.bonus);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::MAX_INVENTORY_SIZE;
    use crate::item::ItemEffect;

    fn sword() -> Item {
        Item::new(
            "iron_sword",
            "Iron Sword",
            ItemType::Weapon,
            ItemEffect::new("strength", 5),
            100,
        )
    }

    fn axe() -> Item {
        Item::new(
            "battle_axe",
            "Battle Axe",
            ItemType::Weapon,
            ItemEffect::new("strength", 8),
            180,
        )
    }

    fn mail() -> Item {
        Item::new(
            "chain_mail",
            "Chain Mail",
            ItemType::Armor,
            ItemEffect::new("max_health", 20),
            150,
        )
    }

    fn potion() -> Item {
        Item::new(
            "health_potion",
            "Health Potion",
            ItemType::Consumable,
            ItemEffect::new("health", 25),
            20,
        )
    }

    fn warrior() -> Character {
        Character::create("Aria", "Warrior").expect("valid class")
    }

    #[test]
    fn test_use_consumable() {
        let mut c = warrior();
        c.health = 60;
        c.inventory.add(potion().id).expect("space");

        let message = c.use_item(&potion()).expect("usable");
        assert_eq!(message, "Aria gained 25 health");
        assert_eq!(c.health, 85);
        assert!(!c.inventory.has("health_potion"));
    }

    #[test]
    fn test_use_consumable_caps_health() {
        let mut c = warrior();
        c.health = 110;
        c.inventory.add(potion().id).expect("space");
        c.use_item(&potion()).expect("usable");
        assert_eq!(c.health, c.max_health);
    }

    #[test]
    fn test_use_unknown_stat_still_consumes() {
        let mut c = warrior();
        let charm = Item::new(
            "charm",
            "Lucky Charm",
            ItemType::Consumable,
            ItemEffect::new("luck", 3),
            5,
        );
        c.inventory.add(charm.id.clone()).expect("space");
        let before = c.clone();

        c.use_item(&charm).expect("usable");
        assert!(c.inventory.is_empty());
        assert_eq!(c.strength, before.strength);
        assert_eq!(c.health, before.health);
    }

    #[test]
    fn test_use_errors() {
        let mut c = warrior();
        assert_eq!(
            c.use_item(&potion()),
            Err(GameError::ItemNotFound(ItemId::new("health_potion")))
        );

        c.inventory.add(sword().id).expect("space");
        assert!(matches!(
            c.use_item(&sword()),
            Err(GameError::InvalidItemType { .. })
        ));
        assert!(c.inventory.has("iron_sword"));
    }

    #[test]
    fn test_equip_weapon() {
        let mut c = warrior();
        c.inventory.add(sword().id).expect("space");

        let message = c.equip_weapon(&sword()).expect("equippable");
        assert_eq!(message, "Equipped Iron Sword, granting 5 strength.");
        assert_eq!(c.strength, 20);
        assert!(!c.inventory.has("iron_sword"));

        let equipped = c.equipment.get(EquipSlot::Weapon).expect("weapon slot");
        assert_eq!(equipped.item.as_str(), "iron_sword");
        assert_eq!(equipped.stat, Some(Stat::Strength));
        assert_eq!(equipped.bonus, 5);
    }

    #[test]
    fn test_equip_swaps_weapon() {
        let mut c = warrior();
        c.inventory.add(sword().id).expect("space");
        c.inventory.add(axe().id).expect("space");

        c.equip_weapon(&sword()).expect("equippable");
        let message = c.equip_weapon(&axe()).expect("equippable");

        assert_eq!(
            message,
            "Unequipped iron_sword, removing 5 strength. Equipped Battle Axe, granting 8 strength."
        );
        assert_eq!(c.strength, 23);
        assert!(c.inventory.has("iron_sword"));
        assert!(!c.inventory.has("battle_axe"));
    }

    #[test]
    fn test_equip_swap_with_full_inventory() {
        let mut c = warrior();
        c.inventory.add(sword().id).expect("space");
        c.equip_weapon(&sword()).expect("equippable");

        c.inventory.add(axe().id).expect("space");
        while !c.inventory.is_full() {
            c.inventory.add(potion().id).expect("space");
        }

        c.equip_weapon(&axe()).expect("swap frees a slot first");
        assert_eq!(c.inventory.len(), MAX_INVENTORY_SIZE);
        assert!(c.inventory.has("iron_sword"));
    }

    #[test]
    fn test_equip_wrong_type() {
        let mut c = warrior();
        c.inventory.add(mail().id).expect("space");
        let before = c.clone();

        let result = c.equip_weapon(&mail());
        assert_eq!(
            result,
            Err(GameError::InvalidItemType {
                item: ItemId::new("chain_mail"),
                expected: "weapon".to_string(),
                actual: "armor".to_string(),
            })
        );
        assert_eq!(c, before);
    }

    #[test]
    fn test_equip_unequip_round_trip() {
        let mut c = warrior();
        c.inventory.add(sword().id).expect("space");
        c.inventory.add(mail().id).expect("space");
        let before = c.clone();

        c.equip_weapon(&sword()).expect("equippable");
        c.equip_armor(&mail()).expect("equippable");
        assert_eq!(c.max_health, 140);

        assert_eq!(c.unequip_weapon(), Ok(Some(ItemId::new("iron_sword"))));
        assert_eq!(c.unequip_armor(), Ok(Some(ItemId::new("chain_mail"))));

        assert_eq!(c.strength, before.strength);
        assert_eq!(c.max_health, before.max_health);
        assert_eq!(c.health, before.health);
        assert_eq!(c.inventory.count("iron_sword"), 1);
        assert_eq!(c.inventory.count("chain_mail"), 1);

        // Re-equip gives the same totals again
        c.equip_weapon(&sword()).expect("equippable");
        assert_eq!(c.strength, before.strength + 5);
    }

    #[test]
    fn test_negative_bonus_round_trip_at_floor() {
        let mut c = warrior();
        let cursed = Item::new(
            "cursed_blade",
            "Cursed Blade",
            ItemType::Weapon,
            ItemEffect::new("strength", -40),
            1,
        );
        c.inventory.add(cursed.id.clone()).expect("space");

        c.equip_weapon(&cursed).expect("equippable");
        assert_eq!(c.strength, 0);
        assert_eq!(c.equipment.get(EquipSlot::Weapon).map(|e| e.bonus), Some(-15));

        c.unequip_weapon().expect("space");
        assert_eq!(c.strength, 15);
    }

    #[test]
    fn test_unequip_empty_slot() {
        let mut c = warrior();
        assert_eq!(c.unequip_weapon(), Ok(None));
    }

    #[test]
    fn test_unequip_full_inventory() {
        let mut c = warrior();
        c.inventory.add(sword().id).expect("space");
        c.equip_weapon(&sword()).expect("equippable");
        while !c.inventory.is_full() {
            c.inventory.add(potion().id).expect("space");
        }
        let before = c.clone();

        assert_eq!(
            c.unequip_weapon(),
            Err(GameError::InventoryFull {
                capacity: MAX_INVENTORY_SIZE
            })
        );
        assert_eq!(c, before);
    }

    #[test]
    fn test_slot_parse() {
        assert_eq!("Weapon".parse::<EquipSlot>(), Ok(EquipSlot::Weapon));
        assert_eq!("armor".parse::<EquipSlot>(), Ok(EquipSlot::Armor));
        assert!("ring".parse::<EquipSlot>().is_err());
    }
}
