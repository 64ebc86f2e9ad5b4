//! Quest system: definitions, acceptance rules, and prerequisite chains.

use ahash::{AHashMap, AHashSet};
use chronicles_common::{GameError, GameResult, QuestId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::character::Character;

/// Static definition of a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// Unique quest identifier
    pub id: QuestId,
    /// Quest title
    pub title: String,
    /// Quest description
    pub description: String,
    /// Experience granted on completion
    pub reward_xp: u32,
    /// Gold granted on completion
    pub reward_gold: u32,
    /// Minimum character level to accept
    pub required_level: u32,
    /// Quest that must be completed first
    pub prerequisite: Option<QuestId>,
}

impl Quest {
    /// Creates a level 1 quest with no rewards and no prerequisite.
    #[must_use]
    pub fn new(id: impl Into<QuestId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            reward_xp: 0,
            reward_gold: 0,
            required_level: 1,
            prerequisite: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the rewards.
    #[must_use]
    pub const fn with_rewards(mut self, xp: u32, gold: u32) -> Self {
        self.reward_xp = xp;
        self.reward_gold = gold;
        self
    }

    /// Sets the required level.
    #[must_use]
    pub const fn with_required_level(mut self, level: u32) -> Self {
        self.required_level = level;
        self
    }

    /// Sets the prerequisite quest.
    #[must_use]
    pub fn with_prerequisite(mut self, quest_id: impl Into<QuestId>) -> Self {
        self.prerequisite = Some(quest_id.into());
        self
    }
}

/// Rewards paid out when a quest is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestReward {
    /// Completed quest
    pub quest_id: QuestId,
    /// Experience granted
    pub xp: u32,
    /// Gold granted
    pub gold: u32,
}

/// Totals of experience and gold earned from completed quests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTotals {
    /// Total experience
    pub xp: u64,
    /// Total gold
    pub gold: u64,
}

/// Read-only table of every quest definition, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct QuestTable {
    quests: AHashMap<QuestId, Quest>,
    /// Ids in insertion order, for stable listings
    order: Vec<QuestId>,
}

impl QuestTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a quest, returning the previous definition with that id.
    pub fn insert(&mut self, quest: Quest) -> Option<Quest> {
        let id = quest.id.clone();
        let previous = self.quests.insert(id.clone(), quest);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// Looks up a quest.
    #[must_use]
    pub fn get(&self, quest_id: &str) -> Option<&Quest> {
        self.quests.get(quest_id)
    }

    /// Looks up a quest, failing with `QuestNotFound`.
    pub fn require(&self, quest_id: &str) -> GameResult<&Quest> {
        self.get(quest_id)
            .ok_or_else(|| GameError::QuestNotFound(QuestId::new(quest_id)))
    }

    /// Returns the number of quests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quests.len()
    }

    /// Checks if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    /// Iterates quests in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Quest> + '_ {
        self.order.iter().filter_map(|id| self.quests.get(id))
    }

    /// Returns quests whose required level lies in `min..=max`.
    #[must_use]
    pub fn by_level_range(&self, min_level: u32, max_level: u32) -> Vec<&Quest> {
        self.iter()
            .filter(|q| (min_level..=max_level).contains(&q.required_level))
            .collect()
    }

    /// Follows prerequisite links back from a quest.
    ///
    /// Returns the chain earliest first, ending with `quest_id` itself.
    pub fn prerequisite_chain(&self, quest_id: &str) -> GameResult<Vec<QuestId>> {
        let mut chain = Vec::new();
        let mut visited = AHashSet::new();
        let mut current = Some(self.require(quest_id)?);

        while let Some(quest) = current {
            if !visited.insert(quest.id.clone()) {
                return Err(GameError::CyclicPrerequisite(quest.id.clone()));
            }
            chain.push(quest.id.clone());
            current = match &quest.prerequisite {
                Some(prereq) => Some(self.require(prereq.as_str())?),
                None => None,
            };
        }

        chain.reverse();
        Ok(chain)
    }

    /// Checks that every prerequisite names a known quest and that no
    /// chain loops.
    pub fn validate_prerequisites(&self) -> GameResult<()> {
        for quest in self.iter() {
            if let Some(prereq) = &quest.prerequisite {
                self.require(prereq.as_str())?;
            }
        }
        for quest in self.iter() {
            self.prerequisite_chain(quest.id.as_str())?;
        }
        Ok(())
    }
}

impl FromIterator<Quest> for QuestTable {
    fn from_iter<T: IntoIterator<Item = Quest>>(iter: T) -> Self {
        let mut table = Self::new();
        for quest in iter {
            table.insert(quest);
        }
        table
    }
}

impl Character {
    /// Accepts a quest.
    ///
    /// Checks, in order: the quest exists, it is not completed, it is not
    /// active, the level is high enough, the prerequisite is completed.
    pub fn accept_quest(&mut self, quest_id: &str, quests: &QuestTable) -> GameResult<()> {
        let quest = quests.require(quest_id)?;

        if self.is_quest_completed(quest_id) {
            return Err(GameError::QuestAlreadyCompleted(quest.id.clone()));
        }
        if self.is_quest_active(quest_id) {
            return Err(GameError::QuestAlreadyActive(quest.id.clone()));
        }
        if self.level < quest.required_level {
            return Err(GameError::InsufficientLevel {
                required: quest.required_level,
                current: self.level,
            });
        }
        if let Some(prereq) = &quest.prerequisite {
            if !self.is_quest_completed(prereq.as_str()) {
                quests.require(prereq.as_str())?;
                return Err(GameError::QuestRequirementsNotMet {
                    quest: quest.id.clone(),
                    prerequisite: prereq.clone(),
                });
            }
        }

        self.active_quests.push(quest.id.clone());
        info!("{} accepted quest {}", self.name, quest.id);
        Ok(())
    }

    /// Completes an active quest and pays out its rewards.
    pub fn complete_quest(&mut self, quest_id: &str, quests: &QuestTable) -> GameResult<QuestReward> {
        let quest = quests.require(quest_id)?;

        let index = self
            .active_quests
            .iter()
            .position(|q| q.as_str() == quest_id)
            .ok_or_else(|| GameError::QuestNotActive(quest.id.clone()))?;
        if self.is_dead() {
            return Err(GameError::CharacterDead(self.name.clone()));
        }

        let id = self.active_quests.remove(index);
        self.completed_quests.push(id.clone());
        self.gain_experience(quest.reward_xp)?;
        self.add_gold(i64::from(quest.reward_gold))?;

        info!(
            "{} completed quest {} (+{} xp, +{} gold)",
            self.name, id, quest.reward_xp, quest.reward_gold
        );
        Ok(QuestReward {
            quest_id: id,
            xp: quest.reward_xp,
            gold: quest.reward_gold,
        })
    }

    /// Drops an active quest without reward.
    pub fn abandon_quest(&mut self, quest_id: &str) -> GameResult<()> {
        let index = self
            .active_quests
            .iter()
            .position(|q| q.as_str() == quest_id)
            .ok_or_else(|| GameError::QuestNotActive(QuestId::new(quest_id)))?;
        let id = self.active_quests.remove(index);
        debug!("{} abandoned quest {}", self.name, id);
        Ok(())
    }

    /// Checks every acceptance rule without failing.
    #[must_use]
    pub fn can_accept_quest(&self, quest_id: &str, quests: &QuestTable) -> bool {
        let Some(quest) = quests.get(quest_id) else {
            return false;
        };
        if self.is_quest_completed(quest_id) || self.is_quest_active(quest_id) {
            return false;
        }
        if self.level < quest.required_level {
            return false;
        }
        match &quest.prerequisite {
            Some(prereq) => {
                quests.get(prereq.as_str()).is_some() && self.is_quest_completed(prereq.as_str())
            },
            None => true,
        }
    }

    /// Returns every quest the character could accept right now.
    #[must_use]
    pub fn available_quests<'a>(&self, quests: &'a QuestTable) -> Vec<&'a Quest> {
        quests
            .iter()
            .filter(|q| self.can_accept_quest(q.id.as_str(), quests))
            .collect()
    }

    /// Returns the definitions of active quests that exist in the table.
    #[must_use]
    pub fn active_quest_records<'a>(&self, quests: &'a QuestTable) -> Vec<&'a Quest> {
        self.active_quests
            .iter()
            .filter_map(|id| quests.get(id.as_str()))
            .collect()
    }

    /// Returns the definitions of completed quests that exist in the table.
    #[must_use]
    pub fn completed_quest_records<'a>(&self, quests: &'a QuestTable) -> Vec<&'a Quest> {
        self.completed_quests
            .iter()
            .filter_map(|id| quests.get(id.as_str()))
            .collect()
    }

    /// Percentage of all quests completed, rounded to two decimals.
    #[must_use]
    pub fn quest_completion_percentage(&self, quests: &QuestTable) -> f64 {
        if quests.is_empty() {
            return 0.0;
        }
        let pct = self.completed_quests.len() as f64 / quests.len() as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }

    /// Sums the rewards of every completed quest still in the table.
    #[must_use]
    pub fn total_quest_rewards(&self, quests: &QuestTable) -> RewardTotals {
        self.completed_quest_records(quests)
            .into_iter()
            .fold(RewardTotals::default(), |acc, q| RewardTotals {
                xp: acc.xp + u64::from(q.reward_xp),
                gold: acc.gold + u64::from(q.reward_gold),
            })
    }
}
