//! Grid-fill: an alternating-turn board game on an N×N grid.
//!
//! Players claim empty cells; a full row, column or diagonal wins. A full
//! board with no line is a shared draw. The classic 3×3 board is
//! tic-tac-toe, but the size is configurable.
//!
//! Kept small on purpose: it exercises turn alternation, a non-primitive
//! action parameter with a wire mapping, both validation layers, and the
//! elimination ledger - with no randomness at all.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::actions::action::{ActionDef, ActionParameter};
use crate::core::{PlayerId, Value};
use crate::eliminations::WinResult;
use crate::flow::def::{GameDef, GameDefBuilder};
use crate::flow::program::{FlowNode, StepDef};

/// A cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column, 0-based.
    pub x: i64,
    /// Row, 0-based.
    pub y: i64,
}

impl ActionParameter for Point {
    fn to_wire(&self) -> Value {
        Value::map([("x", Value::Int(self.x)), ("y", Value::Int(self.y))])
    }

    fn from_wire(value: &Value) -> Option<Self> {
        let x = value.get("x")?.as_int()?;
        let y = value.get("y")?.as_int()?;
        Some(Point { x, y })
    }
}

/// Board state.
pub struct GridFill {
    size: i64,
    cells: Vec<Option<PlayerId>>,
    current: PlayerId,
}

impl GridFill {
    /// Board side length.
    #[must_use]
    pub fn size(&self) -> i64 {
        self.size
    }

    /// The player whose turn it is.
    #[must_use]
    pub fn current(&self) -> PlayerId {
        self.current
    }

    /// The owner of a cell.
    #[must_use]
    pub fn cell(&self, point: Point) -> Option<PlayerId> {
        self.cells[self.index(point)]
    }

    fn index(&self, point: Point) -> usize {
        assert!(
            (0..self.size).contains(&point.x) && (0..self.size).contains(&point.y),
            "point {:?} outside {}x{} board",
            point,
            self.size,
            self.size
        );
        (point.y * self.size + point.x) as usize
    }

    fn empty_points(&self) -> Vec<Point> {
        let mut points = Vec::new();
        for y in 0..self.size {
            for x in 0..self.size {
                let point = Point { x, y };
                if self.cell(point).is_none() {
                    points.push(point);
                }
            }
        }
        points
    }

    fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    fn has_line(&self, player: PlayerId) -> bool {
        let owned = |x: i64, y: i64| self.cell(Point { x, y }) == Some(player);
        let n = self.size;
        for i in 0..n {
            if (0..n).all(|j| owned(j, i)) || (0..n).all(|j| owned(i, j)) {
                return true;
            }
        }
        (0..n).all(|i| owned(i, i)) || (0..n).all(|i| owned(i, n - 1 - i))
    }
}

/// Build the grid-fill definition.
#[must_use]
pub fn grid_fill() -> Arc<GameDef<GridFill>> {
    GameDefBuilder::<GridFill>::new("gridfill")
        .players(2..=2)
        .config("size", Value::Int(3))
        .setup(|scope| {
            let size = scope.config.int("size");
            Ok(GridFill {
                size,
                cells: vec![None; (size * size) as usize],
                current: PlayerId::new(0),
            })
        })
        .action(
            ActionDef::<GridFill, Point>::new("claim")
                .precondition(|scope| scope.player == scope.game.current)
                .options(|scope| scope.game.empty_points())
                .requires(|scope, point| scope.game.cell(*point).is_none())
                .effect(|scope, point| {
                    let player = scope.acting_player();
                    let index = scope.game.index(*point);
                    scope.game.cells[index] = Some(player);
                    scope.log(format!("{} claims ({}, {})", player, point.x, point.y));

                    if scope.game.has_line(player) {
                        scope.eliminations.single_winner(player);
                    } else if scope.game.is_full() {
                        scope.eliminations.assign_remaining(WinResult::Draw);
                    } else {
                        scope.game.current = scope
                            .eliminations
                            .next_player(player)
                            .expect("opponent remains");
                    }
                    Ok(())
                }),
        )
        .flow(vec![FlowNode::game_loop(vec![StepDef::new("turn")
            .action("claim")
            .into()])])
        .view("board", |scope| {
            let n = scope.game.size;
            Value::list((0..n).map(|y| {
                Value::list((0..n).map(|x| {
                    match scope.game.cell(Point { x, y }) {
                        Some(player) => Value::Int(player.index() as i64),
                        None => Value::Int(-1),
                    }
                }))
            }))
        })
        .view("current", |scope| {
            Value::Int(scope.game.current.index() as i64)
        })
        .view("you", |scope| Value::Int(scope.viewer.index() as i64))
        .build()
}
