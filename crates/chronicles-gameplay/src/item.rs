//! Item definitions and the static item table.

use ahash::AHashMap;
use chronicles_common::{GameError, GameResult, ItemId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Equipped in the weapon slot
    Weapon,
    /// Equipped in the armor slot
    Armor,
    /// Used up on use
    Consumable,
}

impl ItemType {
    /// Returns the lowercase name used in data files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Consumable => "consumable",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weapon" => Ok(Self::Weapon),
            "armor" => Ok(Self::Armor),
            "consumable" => Ok(Self::Consumable),
            other => Err(format!("unknown item type '{other}'")),
        }
    }
}

/// Numeric character fields an item effect may modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    /// Current health
    Health,
    /// Health ceiling
    MaxHealth,
    /// Physical power
    Strength,
    /// Magical power
    Magic,
    /// Character level
    Level,
    /// Experience points
    Experience,
    /// Gold carried
    Gold,
}

impl Stat {
    /// Looks up a stat by its data-file name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "health" => Some(Self::Health),
            "max_health" => Some(Self::MaxHealth),
            "strength" => Some(Self::Strength),
            "magic" => Some(Self::Magic),
            "level" => Some(Self::Level),
            "experience" => Some(Self::Experience),
            "gold" => Some(Self::Gold),
            _ => None,
        }
    }

    /// Returns the data-file name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::MaxHealth => "max_health",
            Self::Strength => "strength",
            Self::Magic => "magic",
            Self::Level => "level",
            Self::Experience => "experience",
            Self::Gold => "gold",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single stat modification carried by an item.
///
/// The stat is kept as written in the data file; a name that matches no
/// numeric character field makes the effect a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEffect {
    /// Stat name as written in the data file
    pub stat: String,
    /// Signed amount applied to the stat
    pub value: i32,
}

impl ItemEffect {
    /// Creates a new effect.
    #[must_use]
    pub fn new(stat: impl Into<String>, value: i32) -> Self {
        Self {
            stat: stat.into(),
            value,
        }
    }

    /// Returns the targeted stat, if the name matches a numeric field.
    #[must_use]
    pub fn target(&self) -> Option<Stat> {
        Stat::from_name(&self.stat)
    }
}

impl FromStr for ItemEffect {
    type Err = String;

    /// Parses the `stat:value` form used in data files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (stat, value) = s
            .split_once(':')
            .ok_or_else(|| format!("effect '{s}' must be 'stat:value'"))?;
        let value = value
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("effect value '{}' is not an integer", value.trim()))?;
        Ok(Self::new(stat.trim(), value))
    }
}

impl fmt::Display for ItemEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.stat, self.value)
    }
}

/// Static definition of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item key
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Item category
    pub item_type: ItemType,
    /// Stat effect when used or equipped
    pub effect: ItemEffect,
    /// Shop price in gold
    pub cost: u32,
    /// Flavor text
    pub description: String,
}

impl Item {
    /// Creates a new item definition.
    #[must_use]
    pub fn new(
        id: impl Into<ItemId>,
        name: impl Into<String>,
        item_type: ItemType,
        effect: ItemEffect,
        cost: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            item_type,
            effect,
            cost,
            description: String::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Gold received when selling this item.
    #[must_use]
    pub const fn sell_price(&self) -> u32 {
        self.cost / 2
    }
}

/// Read-only table of every item definition, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ItemTable {
    items: AHashMap<ItemId, Item>,
    /// Ids in insertion order, for stable listings
    order: Vec<ItemId>,
}

impl ItemTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an item, returning the previous definition with that id.
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        let id = item.id.clone();
        let previous = self.items.insert(id.clone(), item);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// Looks up an item.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Looks up an item, failing with `ItemNotFound`.
    pub fn require(&self, id: &str) -> GameResult<&Item> {
        self.get(id)
            .ok_or_else(|| GameError::ItemNotFound(ItemId::new(id)))
    }

    /// Checks whether an id is defined.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// Returns all items of a category.
    #[must_use]
    pub fn by_type(&self, item_type: ItemType) -> Vec<&Item> {
        self.iter().filter(|i| i.item_type == item_type).collect()
    }
}

impl FromIterator<Item> for ItemTable {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        let mut table = Self::new();
        for item in iter {
            table.insert(item);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_parse() {
        let effect: ItemEffect = "strength:5".parse().expect("valid effect");
        assert_eq!(effect.stat, "strength");
        assert_eq!(effect.value, 5);
        assert_eq!(effect.target(), Some(Stat::Strength));

        let effect: ItemEffect = " health : -3 ".parse().expect("valid effect");
        assert_eq!(effect.value, -3);
        assert_eq!(effect.target(), Some(Stat::Health));

        assert!("strength".parse::<ItemEffect>().is_err());
        assert!("strength:lots".parse::<ItemEffect>().is_err());
    }

    #[test]
    fn test_unknown_stat_has_no_target() {
        let effect = ItemEffect::new("charisma", 4);
        assert_eq!(effect.target(), None);
    }

    #[test]
    fn test_item_type_parse() {
        assert_eq!("Weapon".parse::<ItemType>(), Ok(ItemType::Weapon));
        assert_eq!("ARMOR".parse::<ItemType>(), Ok(ItemType::Armor));
        assert!("ring".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_sell_price_is_half_cost() {
        let item = Item::new(
            "iron_sword",
            "Iron Sword",
            ItemType::Weapon,
            ItemEffect::new("strength", 5),
            100,
        );
        assert_eq!(item.sell_price(), 50);

        let odd = Item::new("pebble", "Pebble", ItemType::Consumable, ItemEffect::new("gold", 0), 5);
        assert_eq!(odd.sell_price(), 2);
    }

    #[test]
    fn test_table_keeps_insertion_order() {
        let table: ItemTable = ["c", "a", "b"]
            .into_iter()
            .map(|id| Item::new(id, id, ItemType::Consumable, ItemEffect::new("health", 1), 1))
            .collect();

        let ids: Vec<&str> = table.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert!(table.require("a").is_ok());
        assert_eq!(
            table.require("zzz"),
            Err(GameError::ItemNotFound(ItemId::new("zzz")))
        );
    }
}
