//! Player elimination and ranking ledger.
//!
//! Tracks removal of players from active play with a result and a final rank
//! position while the game continues among the remainder. A player index
//! appears in exactly one of {remaining, eliminated}.
//!
//! ## Position assignment
//!
//! Win-class eliminations (`Win`, `Draw`) receive the lowest unused position
//! scanning upward from 1; `Loss` eliminations receive the highest unused
//! position scanning downward from the player count. Ties eliminated in one
//! batch share one position. This produces correct numbers regardless of the
//! temporal order in which batches resolve: a player eliminated later in real
//! time can still receive a better position than one eliminated earlier.
//!
//! Eliminating an out-of-range or already-eliminated index is a programmer
//! error and panics; it is never a recoverable game-state condition.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// Outcome assigned to an eliminated player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinResult {
    /// Finished better than the remainder.
    Win,
    /// Finished tied.
    Draw,
    /// Finished worse than the remainder.
    Loss,
}

/// One player's final outcome. Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerElimination {
    /// The eliminated player.
    pub player: PlayerId,
    /// Win, draw or loss.
    pub result: WinResult,
    /// Final rank, 1 = best. Batches eliminated together share a position.
    pub position: u32,
}

/// Ledger of eliminations plus the complement set of remaining players.
#[derive(Clone, Debug, Default)]
pub struct EliminationLedger {
    player_count: usize,
    eliminations: Vec<PlayerElimination>,
    // Eliminations not yet drained into Elimination events by the engine.
    fresh: Vec<PlayerElimination>,
}

impl EliminationLedger {
    /// Create a ledger for `player_count` players, all initially remaining.
    #[must_use]
    pub fn new(player_count: usize) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");
        Self {
            player_count,
            eliminations: Vec::new(),
            fresh: Vec::new(),
        }
    }

    /// Get the player count.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Iterate over all player IDs, eliminated or not.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::all(self.player_count)
    }

    /// Players still in active play, in index order.
    #[must_use]
    pub fn remaining_players(&self) -> Vec<PlayerId> {
        self.player_ids()
            .filter(|p| self.is_alive(*p))
            .collect()
    }

    /// All eliminations so far, in elimination order.
    #[must_use]
    pub fn eliminations(&self) -> &[PlayerElimination] {
        &self.eliminations
    }

    /// The elimination for a player, if assigned.
    #[must_use]
    pub fn elimination_for(&self, player: PlayerId) -> Option<&PlayerElimination> {
        self.eliminations.iter().find(|e| e.player == player)
    }

    /// Check whether a player is still in active play.
    #[must_use]
    pub fn is_alive(&self, player: PlayerId) -> bool {
        self.elimination_for(player).is_none()
    }

    /// Check whether a player has been eliminated.
    #[must_use]
    pub fn is_eliminated(&self, player: PlayerId) -> bool {
        !self.is_alive(player)
    }

    /// The game is over once every player has an assigned result.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.eliminations.len() == self.player_count
    }

    /// The position the next elimination with this result would receive.
    ///
    /// Win-class results scan upward from 1 skipping taken positions;
    /// `Loss` scans downward from the player count.
    #[must_use]
    pub fn next_position(&self, result: WinResult) -> u32 {
        let taken = |pos: u32| self.eliminations.iter().any(|e| e.position == pos);
        match result {
            WinResult::Win | WinResult::Draw => {
                let mut position = 1;
                while taken(position) {
                    position += 1;
                }
                position
            }
            WinResult::Loss => {
                let mut position = self.player_count as u32;
                while taken(position) {
                    position -= 1;
                }
                position
            }
        }
    }

    /// Assign one player's outcome at the next computed position.
    ///
    /// Panics if the player is out of range or already eliminated.
    pub fn assign(&mut self, player: PlayerId, result: WinResult) {
        let position = self.next_position(result);
        self.assign_at(player, result, position);
    }

    /// Assign one player's outcome at an explicit position.
    ///
    /// Panics if the player is out of range or already eliminated, or if the
    /// position is outside `1..=player_count`.
    pub fn assign_at(&mut self, player: PlayerId, result: WinResult, position: u32) {
        self.eliminate(PlayerElimination {
            player,
            result,
            position,
        });
    }

    /// Eliminate a batch atomically, sharing one computed position.
    pub fn assign_many(&mut self, players: &[PlayerId], result: WinResult) {
        let position = self.next_position(result);
        for player in players {
            self.assign_at(*player, result, position);
        }
    }

    /// Apply the same result to every still-active player in one batch.
    pub fn assign_remaining(&mut self, result: WinResult) {
        let position = self.next_position(result);
        for player in self.remaining_players() {
            self.assign_at(player, result, position);
        }
    }

    /// One winner, everybody else loses.
    pub fn single_winner(&mut self, player: PlayerId) {
        assert!(
            player.index() < self.player_count,
            "player index {} out of range for {} players",
            player.index(),
            self.player_count
        );
        self.assign(player, WinResult::Win);
        self.assign_remaining(WinResult::Loss);
    }

    /// Rank players by a comparable score and eliminate them all.
    ///
    /// The strictly-best batch wins, the strictly-worst batch loses, and tied
    /// scores draw among themselves. Batch positions advance by batch size,
    /// so two players tied for second leave position 2 and 3 occupied and the
    /// next batch lands on 4.
    ///
    /// `cmp` orders scores ascending; the greatest score is best.
    pub fn rank_by<S>(
        &mut self,
        scored: Vec<(PlayerId, S)>,
        cmp: impl Fn(&S, &S) -> Ordering,
    ) {
        let total = scored.len();
        let mut remaining = scored;
        let mut position = self.next_position(WinResult::Win);

        while !remaining.is_empty() {
            let mut best_index = 0;
            for i in 1..remaining.len() {
                if cmp(&remaining[i].1, &remaining[best_index].1) == Ordering::Greater {
                    best_index = i;
                }
            }
            let batch: Vec<usize> = remaining
                .iter()
                .enumerate()
                .filter(|(_, (_, s))| cmp(s, &remaining[best_index].1) == Ordering::Equal)
                .map(|(i, _)| i)
                .collect();

            let result = if batch.len() == total {
                WinResult::Draw
            } else if remaining.len() == total {
                WinResult::Win
            } else if remaining.len() == batch.len() {
                WinResult::Loss
            } else {
                WinResult::Draw
            };

            for &i in &batch {
                self.assign_at(remaining[i].0, result, position);
            }
            position += batch.len() as u32;

            let mut index = 0;
            remaining.retain(|_| {
                let keep = !batch.contains(&index);
                index += 1;
                keep
            });
        }
    }

    /// Next remaining player after `current` in index order, wrapping around.
    ///
    /// Returns `None` when nobody remains.
    #[must_use]
    pub fn next_player(&self, current: PlayerId) -> Option<PlayerId> {
        let remaining = self.remaining_players();
        remaining
            .iter()
            .find(|p| **p > current)
            .or_else(|| remaining.first())
            .copied()
    }

    /// Drain eliminations recorded since the last drain, in order.
    ///
    /// The engine turns these into `Elimination` events.
    pub(crate) fn drain_new(&mut self) -> Vec<PlayerElimination> {
        std::mem::take(&mut self.fresh)
    }

    fn eliminate(&mut self, elimination: PlayerElimination) {
        assert!(
            elimination.player.index() < self.player_count,
            "player index {} out of range for {} players",
            elimination.player.index(),
            self.player_count
        );
        if let Some(previous) = self.elimination_for(elimination.player) {
            panic!(
                "player is already eliminated: {:?}, unable to eliminate {:?}",
                previous, elimination
            );
        }
        assert!(
            elimination.position >= 1,
            "elimination position must be positive, got {}",
            elimination.position
        );
        assert!(
            elimination.position <= self.player_count as u32,
            "elimination position {} exceeds player count {}",
            elimination.position,
            self.player_count
        );
        self.eliminations.push(elimination);
        self.fresh.push(elimination);
    }
}
