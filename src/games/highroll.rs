//! High-roll: a dice game exercising the replay subsystem end to end.
//!
//! Each player starts with a secret bonus drawn from a shared deck (setup
//! randomness via `pick`), then rolls two dice per turn for a fixed number
//! of rounds (per-step randomness via `ints`). When the last round ends, a
//! global rule ranks everyone by total: highest wins, lowest loses, ties
//! draw.

use std::sync::Arc;

use crate::actions::action::ActionDef;
use crate::core::{PlayerId, PlayerMap, Value};
use crate::flow::def::{GameDef, GameDefBuilder};
use crate::flow::program::{FlowNode, StepDef};
use crate::flow::scope::RuleScope;
use crate::rules::GameRule;

/// Game state.
pub struct HighRoll {
    rounds: i64,
    round: i64,
    current: PlayerId,
    totals: PlayerMap<i64>,
}

impl HighRoll {
    /// Completed round count.
    #[must_use]
    pub fn round(&self) -> i64 {
        self.round
    }

    /// The player whose turn it is.
    #[must_use]
    pub fn current(&self) -> PlayerId {
        self.current
    }

    /// A player's running total.
    #[must_use]
    pub fn total(&self, player: PlayerId) -> i64 {
        self.totals[player]
    }

    fn all_rounds_played(&self) -> bool {
        self.round >= self.rounds
    }
}

/// Build the high-roll definition.
#[must_use]
pub fn high_roll() -> Arc<GameDef<HighRoll>> {
    GameDefBuilder::<HighRoll>::new("highroll")
        .players(2..=6)
        .config("rounds", Value::Int(3))
        .setup(|scope| {
            let deck: Vec<i64> = (0..8).collect();
            let bonuses = scope
                .replay
                .pick("bonus", &deck, scope.player_count, |v| v.to_string())?;
            Ok(HighRoll {
                rounds: scope.config.int("rounds"),
                round: 0,
                current: PlayerId::new(0),
                totals: PlayerMap::new(scope.player_count, |p| bonuses[p.index()]),
            })
        })
        .action(
            ActionDef::<HighRoll, ()>::new("roll")
                .precondition(|scope| {
                    scope.player == scope.game.current && !scope.game.all_rounds_played()
                })
                .fixed(())
                .effect(|scope, _| {
                    let player = scope.acting_player();
                    let dice = scope
                        .replay
                        .ints("dice", |rng| (0..2).map(|_| rng.gen_range(1..7)).collect())?;
                    let sum: i64 = dice.iter().sum();
                    scope.game.totals[player] += sum;
                    scope.log(format!("{} rolls {:?} for {}", player, dice, sum));
                    let total = scope.game.totals[player];
                    scope.log_secret(player, format!("running total {}", total));

                    let count = scope.game.totals.player_count();
                    let next = (player.index() + 1) % count;
                    if next == 0 {
                        scope.game.round += 1;
                    }
                    scope.game.current = PlayerId::new(next as u8);
                    Ok(())
                }),
        )
        .rule(
            GameRule::new("final-scoring")
                .applies_when(|scope: &RuleScope<'_, HighRoll>| {
                    scope.game.all_rounds_played() && !scope.eliminations.is_game_over()
                })
                .effect(|scope| {
                    let scored: Vec<(PlayerId, i64)> =
                        scope.game.totals.iter().map(|(p, t)| (p, *t)).collect();
                    scope.eliminations.rank_by(scored, i64::cmp);
                    Ok(())
                }),
        )
        .flow(vec![FlowNode::game_loop(vec![StepDef::new("roll-turn")
            .action("roll")
            .into()])])
        .view("totals", |scope| {
            Value::list(scope.game.totals.iter().map(|(_, t)| Value::Int(*t)))
        })
        .view("round", |scope| Value::Int(scope.game.round))
        .view("current", |scope| {
            Value::Int(scope.game.current.index() as i64)
        })
        .view("you", |scope| Value::Int(scope.viewer.index() as i64))
        .build()
}
