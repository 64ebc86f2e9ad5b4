//! Turn-based combat between a character and an enemy.
//!
//! This module provides:
//! - The damage formula shared by both sides
//! - The `Battle` state machine (player turn, enemy turn, escape)
//! - Special ability cooldown policies
//! - Reward payout on victory
//!
//! A round increments the turn counter, runs the player's action, checks
//! whether the enemy fell, runs the enemy's attack, then checks whether the
//! character fell. A successful escape ends the battle before the enemy acts.

use chronicles_common::{GameError, GameResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ability::{use_special_ability, AbilityOutcome};
use crate::character::Character;
use crate::enemy::Enemy;

/// Chance that an escape attempt succeeds.
pub const ESCAPE_CHANCE: f64 = 0.5;

/// Anything that can deal and take damage.
pub trait Combatant {
    /// Display name
    fn name(&self) -> &str;
    /// Current health
    fn health(&self) -> u32;
    /// Health ceiling
    fn max_health(&self) -> u32;
    /// Physical power, used for both attack and defense
    fn strength(&self) -> u32;
    /// Overwrites current health
    fn set_health(&mut self, health: u32);
}

impl Combatant for Character {
    fn name(&self) -> &str {
        &self.name
    }

    fn health(&self) -> u32 {
        self.health
    }

    fn max_health(&self) -> u32 {
        self.max_health
    }

    fn strength(&self) -> u32 {
        self.strength
    }

    fn set_health(&mut self, health: u32) {
        self.health = health;
    }
}

impl Combatant for Enemy {
    fn name(&self) -> &str {
        &self.name
    }

    fn health(&self) -> u32 {
        self.health
    }

    fn max_health(&self) -> u32 {
        self.max_health
    }

    fn strength(&self) -> u32 {
        self.strength
    }

    fn set_health(&mut self, health: u32) {
        self.health = health;
    }
}

/// Basic attack damage: `attacker.strength - defender.strength / 4`, at least 1.
#[must_use]
pub fn calculate_damage<A, D>(attacker: &A, defender: &D) -> u32
where
    A: Combatant + ?Sized,
    D: Combatant + ?Sized,
{
    attacker
        .strength()
        .saturating_sub(defender.strength() / 4)
        .max(1)
}

/// Subtracts damage from a target, stopping at zero.
///
/// Returns the remaining health.
pub fn apply_damage<T: Combatant + ?Sized>(target: &mut T, damage: u32) -> u32 {
    let health = target.health().saturating_sub(damage);
    target.set_health(health);
    debug!("{} takes {} damage ({} left)", target.name(), damage, health);
    if health == 0 {
        debug!("{} has been defeated", target.name());
    }
    health
}

/// Checks whether a character is fit to start a fight.
#[must_use]
pub const fn can_character_fight(character: &Character, in_battle: bool) -> bool {
    !character.is_dead() && !in_battle
}

/// Experience and gold paid for defeating an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryRewards {
    /// Experience
    pub xp: u32,
    /// Gold
    pub gold: u32,
}

/// Returns what defeating an enemy pays.
#[must_use]
pub const fn victory_rewards(enemy: &Enemy) -> VictoryRewards {
    VictoryRewards {
        xp: enemy.xp_reward,
        gold: enemy.gold_reward,
    }
}

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    /// The enemy fell
    PlayerWon,
    /// The character fell
    EnemyWon,
    /// The character fled
    Escaped,
}

/// Winning side, for callers that only care about who won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    /// The character
    Player,
    /// The enemy
    Enemy,
}

/// Battle lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleState {
    /// Rounds may still be played
    Active,
    /// Terminal state
    Finished(BattleOutcome),
}

/// An action the player can take on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    /// Basic attack, always available
    Attack,
    /// The class's special ability, subject to cooldown
    SpecialAbility,
    /// Try to escape
    Flee,
}

/// Supplies the player's choice each round.
pub trait ActionSource {
    /// Picks an action for the upcoming turn.
    ///
    /// `special_ready` tells whether the special ability may be used on
    /// `turn`.
    fn choose_action(
        &mut self,
        character: &Character,
        enemy: &Enemy,
        turn: u32,
        special_ready: bool,
    ) -> PlayerAction;
}

/// Source that only ever attacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAttack;

impl ActionSource for AlwaysAttack {
    fn choose_action(&mut self, _: &Character, _: &Enemy, _: u32, _: bool) -> PlayerAction {
        PlayerAction::Attack
    }
}

/// When the special ability may be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CooldownPolicy {
    /// Usable on even-numbered turns only
    #[default]
    EvenTurns,
    /// Unusable for `turns` turns after each use
    Fixed {
        /// Turns to wait after a use
        turns: u32,
    },
}

impl CooldownPolicy {
    /// Turns left before the ability is usable on `turn`; zero when ready.
    #[must_use]
    pub const fn turns_remaining(self, turn: u32, last_used: Option<u32>) -> u32 {
        match self {
            Self::EvenTurns => {
                if turn > 0 && turn % 2 == 0 {
                    0
                } else if turn == 0 {
                    2
                } else {
                    1
                }
            },
            Self::Fixed { turns } => match last_used {
                Some(used) => used.saturating_add(turns).saturating_add(1).saturating_sub(turn),
                None => 0,
            },
        }
    }

    /// Checks whether the ability is usable on `turn`.
    #[must_use]
    pub const fn is_ready(self, turn: u32, last_used: Option<u32>) -> bool {
        self.turns_remaining(turn, last_used) == 0
    }
}

/// Something that happened during a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    /// The battle began
    Started {
        /// Character name
        character: String,
        /// Enemy name
        enemy: String,
    },
    /// A basic attack landed
    Attack {
        /// Turn number
        turn: u32,
        /// Who attacked
        attacker: String,
        /// Who was hit
        target: String,
        /// Damage dealt
        damage: u32,
        /// Target's health afterwards
        remaining: u32,
    },
    /// The character used a special ability
    Ability {
        /// Turn number
        turn: u32,
        /// What the ability did
        outcome: AbilityOutcome,
        /// Enemy health afterwards
        enemy_health: u32,
    },
    /// The character tried to flee
    EscapeAttempt {
        /// Turn number
        turn: u32,
        /// Whether it worked
        success: bool,
    },
    /// The battle ended
    Finished {
        /// How it ended
        outcome: BattleOutcome,
        /// Experience paid
        xp_gained: u32,
        /// Gold paid
        gold_gained: u32,
    },
}

/// Summary of a finished battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    /// How it ended
    pub outcome: BattleOutcome,
    /// Experience paid to the character
    pub xp_gained: u32,
    /// Gold paid to the character
    pub gold_gained: u32,
    /// Rounds played
    pub turns: u32,
}

impl BattleResult {
    /// Two-sided view of the outcome; `None` when the character escaped.
    #[must_use]
    pub const fn winner(&self) -> Option<Winner> {
        match self.outcome {
            BattleOutcome::PlayerWon => Some(Winner::Player),
            BattleOutcome::EnemyWon => Some(Winner::Enemy),
            BattleOutcome::Escaped => None,
        }
    }
}

/// One encounter between a character and an enemy.
///
/// The character is borrowed for the whole battle; damage taken and rewards
/// earned are written straight to it and are not rolled back.
pub struct Battle<'a> {
    character: &'a mut Character,
    enemy: Enemy,
    state: BattleState,
    turn: u32,
    cooldown: CooldownPolicy,
    last_special_turn: Option<u32>,
    rng: fastrand::Rng,
    events: Vec<BattleEvent>,
    result: Option<BattleResult>,
}

impl<'a> Battle<'a> {
    /// Starts a battle. Fails if the character is already dead.
    pub fn new(character: &'a mut Character, enemy: Enemy) -> GameResult<Self> {
        if character.is_dead() {
            return Err(GameError::CharacterDead(character.name.clone()));
        }

        info!("Battle: {} vs {}", character.name, enemy.name);
        let events = vec![BattleEvent::Started {
            character: character.name.clone(),
            enemy: enemy.name.clone(),
        }];

        Ok(Self {
            character,
            enemy,
            state: BattleState::Active,
            turn: 0,
            cooldown: CooldownPolicy::default(),
            last_special_turn: None,
            rng: fastrand::Rng::new(),
            events,
            result: None,
        })
    }

    /// Uses the given random source for escapes and ability rolls.
    #[must_use]
    pub fn with_rng(mut self, rng: fastrand::Rng) -> Self {
        self.rng = rng;
        self
    }

    /// Sets the special ability cooldown policy.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: CooldownPolicy) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> BattleState {
        self.state
    }

    /// Checks whether rounds may still be played.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, BattleState::Active)
    }

    /// Current turn number; zero before the first round.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// The fighting character.
    #[must_use]
    pub fn character(&self) -> &Character {
        &*self.character
    }

    /// The opponent.
    #[must_use]
    pub const fn enemy(&self) -> &Enemy {
        &self.enemy
    }

    /// Everything that happened so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// The result, once the battle has finished.
    #[must_use]
    pub const fn result(&self) -> Option<BattleResult> {
        self.result
    }

    /// Checks whether the special ability is usable on the current turn.
    #[must_use]
    pub const fn special_ready(&self) -> bool {
        self.cooldown.is_ready(self.turn, self.last_special_turn)
    }

    fn ensure_active(&self) -> GameResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(GameError::CombatNotActive)
        }
    }

    /// Both sides must still be standing for a turn to be taken.
    fn ensure_standing(&self) -> GameResult<()> {
        self.ensure_active()?;
        if self.character.is_dead() {
            return Err(GameError::CharacterDead(self.character.name.clone()));
        }
        if self.enemy.is_dead() {
            return Err(GameError::CombatNotActive);
        }
        Ok(())
    }

    fn record(&mut self, event: BattleEvent) -> BattleEvent {
        self.events.push(event.clone());
        event
    }

    /// Runs the player's action for the current turn.
    ///
    /// Does not check for a winner; see [`Battle::check_battle_end`].
    pub fn player_turn(&mut self, action: PlayerAction) -> GameResult<BattleEvent> {
        self.ensure_standing()?;

        match action {
            PlayerAction::Attack => {
                let damage = calculate_damage(&*self.character, &self.enemy);
                let remaining = apply_damage(&mut self.enemy, damage);
                Ok(self.record(BattleEvent::Attack {
                    turn: self.turn,
                    attacker: self.character.name.clone(),
                    target: self.enemy.name.clone(),
                    damage,
                    remaining,
                }))
            },
            PlayerAction::SpecialAbility => {
                let turns_remaining = self.cooldown.turns_remaining(self.turn, self.last_special_turn);
                if turns_remaining > 0 {
                    return Err(GameError::AbilityOnCooldown { turns_remaining });
                }

                let outcome = use_special_ability(&mut *self.character, &mut self.rng);
                match &outcome {
                    AbilityOutcome::Damage { amount, .. } => {
                        apply_damage(&mut self.enemy, *amount);
                    },
                    AbilityOutcome::Unknown => {
                        warn!("{} has no special ability, turn skipped", self.character.name);
                    },
                    AbilityOutcome::Miss { .. } | AbilityOutcome::Healed { .. } => {},
                }
                self.last_special_turn = Some(self.turn);

                Ok(self.record(BattleEvent::Ability {
                    turn: self.turn,
                    outcome,
                    enemy_health: self.enemy.health,
                }))
            },
            PlayerAction::Flee => {
                let success = self.attempt_escape()?;
                Ok(self.record(BattleEvent::EscapeAttempt {
                    turn: self.turn,
                    success,
                }))
            },
        }
    }

    /// The enemy attacks the character.
    ///
    /// A fallen enemy does not attack; the battle only needs
    /// [`Battle::check_battle_end`] at that point.
    pub fn enemy_turn(&mut self) -> GameResult<BattleEvent> {
        self.ensure_standing()?;

        let damage = calculate_damage(&self.enemy, &*self.character);
        let remaining = apply_damage(&mut *self.character, damage);
        Ok(self.record(BattleEvent::Attack {
            turn: self.turn,
            attacker: self.enemy.name.clone(),
            target: self.character.name.clone(),
            damage,
            remaining,
        }))
    }

    /// Tries to flee. Success ends the battle immediately.
    pub fn attempt_escape(&mut self) -> GameResult<bool> {
        self.ensure_standing()?;

        if self.rng.f64() < ESCAPE_CHANCE {
            info!("{} escaped from {}", self.character.name, self.enemy.name);
            self.conclude(BattleOutcome::Escaped)?;
            Ok(true)
        } else {
            debug!("{} failed to escape", self.character.name);
            Ok(false)
        }
    }

    /// Ends the battle if either side has fallen, paying rewards on victory.
    ///
    /// Returns the outcome once the battle is over.
    pub fn check_battle_end(&mut self) -> GameResult<Option<BattleOutcome>> {
        if let BattleState::Finished(outcome) = self.state {
            return Ok(Some(outcome));
        }

        let outcome = if self.enemy.is_dead() {
            BattleOutcome::PlayerWon
        } else if self.character.is_dead() {
            BattleOutcome::EnemyWon
        } else {
            return Ok(None);
        };

        self.conclude(outcome)?;
        Ok(Some(outcome))
    }

    /// Pays any rewards, then records state, event and result together.
    /// A failed payout leaves the battle active.
    fn conclude(&mut self, outcome: BattleOutcome) -> GameResult<BattleResult> {
        let (xp_gained, gold_gained) = if outcome == BattleOutcome::PlayerWon {
            let rewards = victory_rewards(&self.enemy);
            self.character.gain_experience(rewards.xp)?;
            self.character.add_gold(i64::from(rewards.gold))?;
            (rewards.xp, rewards.gold)
        } else {
            (0, 0)
        };

        info!(
            "Battle over after {} turns: {:?} (+{} xp, +{} gold)",
            self.turn, outcome, xp_gained, gold_gained
        );
        self.state = BattleState::Finished(outcome);
        self.events.push(BattleEvent::Finished {
            outcome,
            xp_gained,
            gold_gained,
        });

        let result = BattleResult {
            outcome,
            xp_gained,
            gold_gained,
            turns: self.turn,
        };
        self.result = Some(result);
        Ok(result)
    }

    /// Plays one full round with an action from `source`.
    ///
    /// A special ability chosen while on cooldown is rejected before the turn
    /// counter moves. Returns the outcome if the round ended the battle.
    pub fn play_round(&mut self, source: &mut dyn ActionSource) -> GameResult<Option<BattleOutcome>> {
        self.ensure_active()?;

        let next_turn = self.turn + 1;
        let turns_remaining = self.cooldown.turns_remaining(next_turn, self.last_special_turn);
        let action = source.choose_action(
            &*self.character,
            &self.enemy,
            next_turn,
            turns_remaining == 0,
        );
        if action == PlayerAction::SpecialAbility && turns_remaining > 0 {
            return Err(GameError::AbilityOnCooldown { turns_remaining });
        }

        self.turn = next_turn;
        self.player_turn(action)?;
        if let Some(outcome) = self.check_battle_end()? {
            return Ok(Some(outcome));
        }

        self.enemy_turn()?;
        self.check_battle_end()
    }

    /// Plays rounds until the battle ends.
    pub fn run(&mut self, source: &mut dyn ActionSource) -> GameResult<BattleResult> {
        loop {
            if self.play_round(source)?.is_some() {
                break;
            }
        }
        self.result.ok_or(GameError::CombatNotActive)
    }
}
