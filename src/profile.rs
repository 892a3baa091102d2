//! Player profile: level, XP, streak and per-game best scores
//!
//! Persisted in LocalStorage as one whole record. Leveling follows
//! `xp_needed(level) = XP_BASE + (level - 1) * XP_INCREMENT`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::{XP_BASE, XP_INCREMENT};
use crate::tuning::GameId;

/// A missed day or less keeps the streak alive
pub const STREAK_GRACE_DAYS: i64 = 2;

/// XP required to advance from `level` to `level + 1`.
///
/// Saturates at `u32::MAX` for levels no real profile reaches.
pub fn xp_needed(level: u32) -> u32 {
    checked_xp_needed(level).unwrap_or(u32::MAX)
}

fn checked_xp_needed(level: u32) -> Option<u32> {
    level
        .saturating_sub(1)
        .checked_mul(XP_INCREMENT)?
        .checked_add(XP_BASE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub level: u32,
    pub xp: u32,
    pub streak: u32,
    pub last_played: Option<NaiveDate>,
    /// Best score per game; only ever raised
    #[serde(deserialize_with = "lenient_best")]
    pub best: BTreeMap<GameId, u32>,
    /// Unsaved micro-journal text
    pub journal_draft: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            streak: 0,
            last_played: None,
            best: BTreeMap::new(),
            journal_draft: String::new(),
        }
    }
}

impl Profile {
    /// LocalStorage key
    pub const STORAGE_KEY: &'static str = "mindgym_profile";

    pub fn new() -> Self {
        Self::default()
    }

    /// Add XP and run the leveling pass.
    ///
    /// Returns every level reached, in order (several when the award
    /// overflows more than one threshold).
    pub fn award_xp(&mut self, amount: u32) -> Vec<u32> {
        self.xp = self.xp.saturating_add(amount);
        self.level_up()
    }

    fn level_up(&mut self) -> Vec<u32> {
        let mut reached = Vec::new();
        while let Some(needed) = checked_xp_needed(self.level) {
            if self.xp < needed {
                break;
            }
            self.xp -= needed;
            self.level += 1;
            reached.push(self.level);
        }
        reached
    }

    pub fn best(&self, game: GameId) -> u32 {
        self.best.get(&game).copied().unwrap_or(0)
    }

    /// Raise the stored best for `game` to `score` if higher.
    /// Returns true when the best changed.
    pub fn record_best(&mut self, game: GameId, score: u32) -> bool {
        let best = self.best.entry(game).or_insert(0);
        if score > *best {
            *best = score;
            true
        } else {
            false
        }
    }

    /// Daily streak bookkeeping on launch. Returns true when the profile changed.
    pub fn bump_streak(&mut self, today: NaiveDate) -> bool {
        match self.last_played {
            None => {
                self.last_played = Some(today);
                true
            }
            Some(last) if last == today => false,
            Some(last) => {
                let gap = (today - last).num_days();
                self.streak = if (1..=STREAK_GRACE_DAYS).contains(&gap) {
                    self.streak + 1
                } else {
                    0
                };
                self.last_played = Some(today);
                true
            }
        }
    }

    /// Back to first-launch defaults; all best scores are cleared
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Repair a record loaded from storage so the leveling invariant holds
    pub fn normalize(&mut self) {
        if checked_xp_needed(self.level).is_none() {
            log::warn!("Stored level {} out of range, resetting profile", self.level);
            *self = Self::default();
            return;
        }
        self.level = self.level.max(1);
        self.level_up();
    }
}

/// Accept best maps written by other builds: unknown game keys and
/// non-numeric values are dropped instead of failing the whole profile.
fn lenient_best<'de, D>(deserializer: D) -> Result<BTreeMap<GameId, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let game = GameId::from_key(&key)?;
            let score = u32::try_from(value.as_u64()?).ok()?;
            Some((game, score))
        })
        .collect())
}
