//! Scripted play sessions.
//!
//! A session script is a JSON list of steps (create a character, fight, take
//! quests, shop, save) run headlessly against the loaded game data. Steps
//! that break a game rule are logged and recorded in the report; file and
//! parse failures stop the session.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::Path;

use chronicles_common::GameError;
use chronicles_gameplay::{
    ActionSource, Battle, BattleResult, Character, CooldownPolicy, Enemy, EquipSlot, ItemType,
    PlayerAction,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::data_loader::GameData;
use crate::save_manager::{CharacterStore, SaveError};

/// Errors raised while running a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to read the script file.
    #[error("Failed to read session script: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse the script.
    #[error("Failed to parse session script: {0}")]
    Parse(#[from] serde_json::Error),

    /// Save store failure.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// A game rule rejected the step.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The step needs a character and none is loaded.
    #[error("No character is loaded")]
    NoCharacter,
}

impl SessionError {
    /// Fatal errors stop the session; the rest only fail their step.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Io(_) | Self::Parse(_) => true,
            Self::Save(err) => !matches!(err, SaveError::CharacterNotFound(_) | SaveError::InvalidName(_)),
            Self::Game(_) | Self::NoCharacter => false,
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// A single scripted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionStep {
    /// Create a fresh character and make it current
    CreateCharacter {
        /// Character name
        name: String,
        /// Class name
        class: String,
    },
    /// Load a saved character and make it current
    LoadCharacter {
        /// Character name
        name: String,
    },
    /// Save the current character
    SaveCharacter,
    /// Delete a saved character
    DeleteCharacter {
        /// Character name
        name: String,
    },
    /// List saved characters
    ListCharacters,
    /// Fight an enemy
    Fight {
        /// Enemy name; a level-appropriate enemy when absent
        #[serde(default)]
        enemy: Option<String>,
        /// Actions to take, one per round; attacks once exhausted
        #[serde(default)]
        actions: Vec<PlayerAction>,
    },
    /// Bring a dead character back
    Revive,
    /// Accept a quest
    AcceptQuest {
        /// Quest id
        quest_id: String,
    },
    /// Complete an active quest
    CompleteQuest {
        /// Quest id
        quest_id: String,
    },
    /// Abandon an active quest
    AbandonQuest {
        /// Quest id
        quest_id: String,
    },
    /// Buy an item
    BuyItem {
        /// Item id
        item_id: String,
    },
    /// Sell an item
    SellItem {
        /// Item id
        item_id: String,
    },
    /// Use a consumable
    UseItem {
        /// Item id
        item_id: String,
    },
    /// Equip a weapon or armor
    EquipItem {
        /// Item id
        item_id: String,
    },
    /// Take off whatever is in a slot
    UnequipItem {
        /// Slot to empty
        slot: EquipSlot,
    },
    /// Log a message
    Log {
        /// Message to log
        message: String,
    },
    /// Repeat a set of steps
    Repeat {
        /// Number of times to repeat
        count: u32,
        /// Steps to repeat
        steps: Vec<SessionStep>,
    },
}

impl SessionStep {
    /// Short name of the step kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateCharacter { .. } => "create_character",
            Self::LoadCharacter { .. } => "load_character",
            Self::SaveCharacter => "save_character",
            Self::DeleteCharacter { .. } => "delete_character",
            Self::ListCharacters => "list_characters",
            Self::Fight { .. } => "fight",
            Self::Revive => "revive",
            Self::AcceptQuest { .. } => "accept_quest",
            Self::CompleteQuest { .. } => "complete_quest",
            Self::AbandonQuest { .. } => "abandon_quest",
            Self::BuyItem { .. } => "buy_item",
            Self::SellItem { .. } => "sell_item",
            Self::UseItem { .. } => "use_item",
            Self::EquipItem { .. } => "equip_item",
            Self::UnequipItem { .. } => "unequip_item",
            Self::Log { .. } => "log",
            Self::Repeat { .. } => "repeat",
        }
    }
}

/// A named sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    /// Script name
    pub name: String,
    /// What the script does
    #[serde(default)]
    pub description: Option<String>,
    /// Steps in order
    pub steps: Vec<SessionStep>,
}

impl SessionScript {
    /// Parses a script from JSON.
    pub fn from_json(json: &str) -> SessionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a script file.
    pub fn load(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let script = Self::from_json(&fs::read_to_string(path)?)?;
        info!("Loaded session script '{}' from {}", script.name, path.display());
        Ok(script)
    }

    /// A short tour of the game using the starter data.
    #[must_use]
    pub fn demo() -> Self {
        let fight = SessionStep::Fight {
            enemy: None,
            actions: Vec::new(),
        };
        let id = |id: &str| id.to_string();

        Self {
            name: "demo".to_string(),
            description: Some("Create a warrior, clear the first quest, gear up".to_string()),
            steps: vec![
                SessionStep::CreateCharacter {
                    name: "Aria".to_string(),
                    class: "Warrior".to_string(),
                },
                SessionStep::AcceptQuest {
                    quest_id: id("first_steps"),
                },
                SessionStep::Repeat {
                    count: 3,
                    steps: vec![fight.clone()],
                },
                SessionStep::CompleteQuest {
                    quest_id: id("first_steps"),
                },
                SessionStep::AcceptQuest {
                    quest_id: id("orc_warlord"),
                },
                SessionStep::BuyItem {
                    item_id: id("health_potion"),
                },
                SessionStep::BuyItem {
                    item_id: id("iron_sword"),
                },
                SessionStep::EquipItem {
                    item_id: id("iron_sword"),
                },
                SessionStep::AcceptQuest {
                    quest_id: id("goblin_trouble"),
                },
                SessionStep::Fight {
                    enemy: Some("Goblin".to_string()),
                    actions: vec![PlayerAction::Attack, PlayerAction::SpecialAbility],
                },
                SessionStep::UseItem {
                    item_id: id("health_potion"),
                },
                SessionStep::CompleteQuest {
                    quest_id: id("goblin_trouble"),
                },
                SessionStep::SaveCharacter,
                SessionStep::Log {
                    message: "Demo complete".to_string(),
                },
            ],
        }
    }
}

/// Plays a fixed list of actions, then attacks.
///
/// A special ability scheduled for a turn where it is not ready becomes an
/// attack.
#[derive(Debug, Clone, Default)]
pub struct ScriptedActions {
    actions: VecDeque<PlayerAction>,
}

impl ScriptedActions {
    /// Creates a source from a list of actions.
    #[must_use]
    pub fn new(actions: impl IntoIterator<Item = PlayerAction>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
        }
    }
}

impl ActionSource for ScriptedActions {
    fn choose_action(&mut self, character: &Character, _: &Enemy, turn: u32, special_ready: bool) -> PlayerAction {
        match self.actions.pop_front() {
            Some(PlayerAction::SpecialAbility) if !special_ready => {
                warn!(
                    "{}'s special ability is not ready on turn {}, attacking instead",
                    character.name, turn
                );
                PlayerAction::Attack
            },
            Some(action) => action,
            None => PlayerAction::Attack,
        }
    }
}

/// How one step went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step succeeded
    Ok {
        /// What happened
        message: String,
    },
    /// A game rule rejected the step
    Failed {
        /// Why
        error: String,
    },
}

/// Record of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Position in execution order, from 1
    pub index: usize,
    /// Step kind
    pub step: String,
    /// What happened
    pub outcome: StepOutcome,
}

/// Summary of a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Script name
    pub script: String,
    /// Every executed step
    pub steps: Vec<StepRecord>,
    /// Every battle fought, in order
    pub battles: Vec<BattleResult>,
}

impl SessionReport {
    /// Number of steps that succeeded.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Ok { .. }))
            .count()
    }

    /// Number of steps a game rule rejected.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.steps.len() - self.succeeded()
    }
}

/// Runs session scripts against loaded game data.
pub struct SessionRunner<'a> {
    data: &'a GameData,
    store: CharacterStore,
    character: Option<Character>,
    rng: fastrand::Rng,
    cooldown: CooldownPolicy,
}

impl<'a> SessionRunner<'a> {
    /// Creates a runner.
    #[must_use]
    pub fn new(data: &'a GameData, store: CharacterStore) -> Self {
        Self {
            data,
            store,
            character: None,
            rng: fastrand::Rng::new(),
            cooldown: CooldownPolicy::default(),
        }
    }

    /// Creates a runner using the config's save directory, seed, and cooldown.
    #[must_use]
    pub fn from_config(data: &'a GameData, config: &EngineConfig) -> Self {
        Self::new(data, CharacterStore::new(&config.save_dir))
            .with_rng(config.rng())
            .with_cooldown(config.special_cooldown)
    }

    /// Uses the given random source; each battle draws its own seed from it.
    #[must_use]
    pub fn with_rng(mut self, rng: fastrand::Rng) -> Self {
        self.rng = rng;
        self
    }

    /// Sets the special ability cooldown policy for battles.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: CooldownPolicy) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// The current character, if any.
    #[must_use]
    pub const fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    /// The save store.
    #[must_use]
    pub const fn store(&self) -> &CharacterStore {
        &self.store
    }

    /// Runs every step of a script.
    pub fn run(&mut self, script: &SessionScript) -> SessionResult<SessionReport> {
        info!("Running session script '{}'", script.name);

        let mut report = SessionReport {
            script: script.name.clone(),
            ..SessionReport::default()
        };
        self.run_steps(&script.steps, &mut report)?;

        info!(
            "Session '{}' finished: {} steps ok, {} failed",
            script.name,
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    fn run_steps(&mut self, steps: &[SessionStep], report: &mut SessionReport) -> SessionResult<()> {
        for step in steps {
            if let SessionStep::Repeat { count, steps } = step {
                for _ in 0..*count {
                    self.run_steps(steps, report)?;
                }
                continue;
            }

            let index = report.steps.len() + 1;
            let outcome = match self.run_step(step, report) {
                Ok(message) => {
                    debug!("Step {} ({}): {}", index, step.kind(), message);
                    StepOutcome::Ok { message }
                },
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Step {} ({}) failed: {}", index, step.kind(), e);
                    StepOutcome::Failed {
                        error: e.to_string(),
                    }
                },
            };

            report.steps.push(StepRecord {
                index,
                step: step.kind().to_string(),
                outcome,
            });
        }
        Ok(())
    }

    fn current(&mut self) -> SessionResult<&mut Character> {
        self.character.as_mut().ok_or(SessionError::NoCharacter)
    }

    fn run_step(&mut self, step: &SessionStep, report: &mut SessionReport) -> SessionResult<String> {
        let data = self.data;

        match step {
            SessionStep::CreateCharacter { name, class } => {
                let character = Character::create(name.clone(), class)?;
                let message = format!("created {} the {}", character.name, character.class);
                self.character = Some(character);
                Ok(message)
            },
            SessionStep::LoadCharacter { name } => {
                let character = self.store.load(name)?;
                let message = format!("loaded {} (level {})", character.name, character.level);
                self.character = Some(character);
                Ok(message)
            },
            SessionStep::SaveCharacter => {
                let character = self.character.as_ref().ok_or(SessionError::NoCharacter)?;
                let path = self.store.save(character)?;
                Ok(format!("saved {} to {}", character.name, path.display()))
            },
            SessionStep::DeleteCharacter { name } => {
                self.store.delete(name)?;
                Ok(format!("deleted save for {name}"))
            },
            SessionStep::ListCharacters => {
                let names = self.store.list()?;
                Ok(format!("{} saved: {}", names.len(), names.join(", ")))
            },
            SessionStep::Fight { enemy, actions } => {
                let seed = self.rng.u64(..);
                let cooldown = self.cooldown;
                let character = self.current()?;
                let enemy = match enemy {
                    Some(name) => Enemy::from_name(name)?,
                    None => Enemy::for_level(character.level),
                };
                let enemy_name = enemy.name.clone();

                let mut source = ScriptedActions::new(actions.iter().copied());
                let mut battle = Battle::new(character, enemy)?
                    .with_rng(fastrand::Rng::with_seed(seed))
                    .with_cooldown(cooldown);
                let result = battle.run(&mut source)?;
                report.battles.push(result);

                Ok(format!(
                    "fought {}: {:?} after {} turns (+{} xp, +{} gold)",
                    enemy_name, result.outcome, result.turns, result.xp_gained, result.gold_gained
                ))
            },
            SessionStep::Revive => {
                let character = self.current()?;
                if character.revive() {
                    Ok(format!("{} revived with {} health", character.name, character.health))
                } else {
                    Ok(format!("{} is not dead", character.name))
                }
            },
            SessionStep::AcceptQuest { quest_id } => {
                self.current()?.accept_quest(quest_id, &data.quests)?;
                Ok(format!("accepted {quest_id}"))
            },
            SessionStep::CompleteQuest { quest_id } => {
                let reward = self.current()?.complete_quest(quest_id, &data.quests)?;
                Ok(format!(
                    "completed {} (+{} xp, +{} gold)",
                    reward.quest_id, reward.xp, reward.gold
                ))
            },
            SessionStep::AbandonQuest { quest_id } => {
                self.current()?.abandon_quest(quest_id)?;
                Ok(format!("abandoned {quest_id}"))
            },
            SessionStep::BuyItem { item_id } => {
                let item = data.items.require(item_id)?;
                let tx = self.current()?.purchase_item(item)?;
                Ok(format!("bought {} for {} gold ({} left)", tx.item, tx.gold, tx.balance))
            },
            SessionStep::SellItem { item_id } => {
                let item = data.items.require(item_id)?;
                let tx = self.current()?.sell_item(item)?;
                Ok(format!("sold {} for {} gold ({} left)", tx.item, tx.gold, tx.balance))
            },
            SessionStep::UseItem { item_id } => {
                let item = data.items.require(item_id)?;
                Ok(self.current()?.use_item(item)?)
            },
            SessionStep::EquipItem { item_id } => {
                let item = data.items.require(item_id)?;
                let character = self.current()?;
                let slot = match item.item_type {
                    ItemType::Armor => EquipSlot::Armor,
                    _ => EquipSlot::Weapon,
                };
                Ok(character.equip(item, slot)?)
            },
            SessionStep::UnequipItem { slot } => match self.current()?.unequip(*slot)? {
                Some(item) => Ok(format!("unequipped {item} from {slot}")),
                None => Ok(format!("nothing equipped in {slot}")),
            },
            SessionStep::Log { message } => {
                info!("[session] {}", message);
                Ok(message.clone())
            },
            SessionStep::Repeat { count, .. } => Ok(format!("repeat x{count}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicles_gameplay::{Item, ItemEffect, Quest};

    fn data() -> GameData {
        GameData {
            items: [
                Item::new(
                    "health_potion",
                    "Health Potion",
                    ItemType::Consumable,
                    ItemEffect::new("health", 20),
                    25,
                ),
                Item::new(
                    "iron_sword",
                    "Iron Sword",
                    ItemType::Weapon,
                    ItemEffect::new("strength", 5),
                    100,
                ),
            ]
            .into_iter()
            .collect(),
            quests: [Quest::new("first_steps", "First Steps").with_rewards(50, 25)]
                .into_iter()
                .collect(),
        }
    }

    fn character() -> Character {
        Character::create("Aria", "Warrior").expect("valid class")
    }

    #[test]
    fn test_parse_script_json() {
        let json = r#"{
            "name": "smoke",
            "steps": [
                { "type": "create_character", "name": "Aria", "class": "Warrior" },
                { "type": "fight", "enemy": "Orc", "actions": ["attack", "special_ability", "flee"] },
                { "type": "fight" },
                { "type": "unequip_item", "slot": "armor" },
                { "type": "repeat", "count": 2, "steps": [{ "type": "save_character" }] }
            ]
        }"#;

        let script = SessionScript::from_json(json).expect("valid script");
        assert_eq!(script.name, "smoke");
        assert_eq!(script.description, None);
        assert_eq!(script.steps.len(), 5);
        assert_eq!(
            script.steps[1],
            SessionStep::Fight {
                enemy: Some("Orc".to_string()),
                actions: vec![
                    PlayerAction::Attack,
                    PlayerAction::SpecialAbility,
                    PlayerAction::Flee
                ],
            }
        );
        assert_eq!(
            script.steps[2],
            SessionStep::Fight {
                enemy: None,
                actions: Vec::new()
            }
        );
        assert_eq!(
            script.steps[3],
            SessionStep::UnequipItem {
                slot: EquipSlot::Armor
            }
        );
    }

    #[test]
    fn test_parse_script_rejects_unknown_step() {
        let json = r#"{ "name": "bad", "steps": [{ "type": "dance" }] }"#;
        assert!(matches!(
            SessionScript::from_json(json),
            Err(SessionError::Parse(_))
        ));
    }

    #[test]
    fn test_scripted_actions_fall_back_to_attack() {
        let c = character();
        let e = Enemy::for_level(1);
        let mut source = ScriptedActions::new([PlayerAction::SpecialAbility, PlayerAction::SpecialAbility]);

        assert_eq!(source.choose_action(&c, &e, 1, false), PlayerAction::Attack);
        assert_eq!(source.choose_action(&c, &e, 2, true), PlayerAction::SpecialAbility);
        assert_eq!(source.choose_action(&c, &e, 3, false), PlayerAction::Attack);
    }

    #[test]
    fn test_error_fatality() {
        assert!(!SessionError::NoCharacter.is_fatal());
        assert!(!SessionError::Game(GameError::CombatNotActive).is_fatal());
        assert!(!SessionError::Save(SaveError::CharacterNotFound("x".into())).is_fatal());
        assert!(SessionError::Io(io::Error::new(io::ErrorKind::Other, "disk")).is_fatal());
    }

    #[test]
    fn test_rule_failures_do_not_abort() {
        let data = data();
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let mut runner = SessionRunner::new(&data, CharacterStore::new(temp_dir.path()))
            .with_rng(fastrand::Rng::with_seed(5));

        let script = SessionScript {
            name: "rules".to_string(),
            description: None,
            steps: vec![
                SessionStep::AcceptQuest {
                    quest_id: "first_steps".to_string(),
                },
                SessionStep::CreateCharacter {
                    name: "Aria".to_string(),
                    class: "Bard".to_string(),
                },
                SessionStep::CreateCharacter {
                    name: "Aria".to_string(),
                    class: "Warrior".to_string(),
                },
                SessionStep::BuyItem {
                    item_id: "mithril".to_string(),
                },
                SessionStep::UseItem {
                    item_id: "health_potion".to_string(),
                },
                SessionStep::LoadCharacter {
                    name: "Ghost".to_string(),
                },
                SessionStep::Log {
                    message: "still running".to_string(),
                },
            ],
        };

        let report = runner.run(&script).expect("no fatal errors");
        let failed: Vec<usize> = report
            .steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
            .map(|s| s.index)
            .collect();
        assert_eq!(failed, vec![1, 2, 4, 5, 6]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(
            report.steps[0].outcome,
            StepOutcome::Failed {
                error: "No character is loaded".to_string()
            }
        );
        assert!(runner.character().is_some());
    }

    #[test]
    fn test_fight_records_battle() {
        let data = data();
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let mut runner = SessionRunner::new(&data, CharacterStore::new(temp_dir.path()))
            .with_rng(fastrand::Rng::with_seed(11));

        let script = SessionScript {
            name: "fight".to_string(),
            description: None,
            steps: vec![
                SessionStep::CreateCharacter {
                    name: "Aria".to_string(),
                    class: "Warrior".to_string(),
                },
                SessionStep::Repeat {
                    count: 2,
                    steps: vec![SessionStep::Fight {
                        enemy: Some("goblin".to_string()),
                        actions: Vec::new(),
                    }],
                },
                SessionStep::Fight {
                    enemy: Some("Slime".to_string()),
                    actions: Vec::new(),
                },
            ],
        };

        let report = runner.run(&script).expect("no fatal errors");
        assert_eq!(report.steps.len(), 4);
        assert_eq!(report.battles.len(), 2);
        assert_eq!(report.failed(), 1);

        let hero = runner.character().expect("created");
        assert_eq!(hero.experience, 50);
        assert_eq!(hero.gold, 120);
    }
}
