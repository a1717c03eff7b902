//! Instance scheduling: one task and one bounded queue per game, ordered
//! event delivery, isolation between instances, and teardown.

use turnwise::core::PlayerId;
use turnwise::games::{grid_fill, Point};
use turnwise::{spawn, ActionParameter, Actionable, FlowStep, GameHandle, GameRegistry, GameStartInfo};

fn claim(player: u8, x: i64, y: i64) -> Actionable {
    Actionable::new(PlayerId::new(player), "claim", Point { x, y }.to_wire())
}

fn spawn_gridfill(seed: u64) -> GameHandle {
    let mut registry = GameRegistry::new();
    registry.register(grid_fill());
    let game = registry
        .create("gridfill", GameStartInfo::new(2, seed))
        .unwrap();
    spawn(game, 8)
}

/// Drain events until the next `AwaitInput`, `GameEnd` or `GameException`.
async fn drain_until_idle(handle: &mut GameHandle, collected: &mut Vec<FlowStep>) -> FlowStep {
    loop {
        let step = handle.next_step().await.expect("stream open");
        collected.push(step.clone());
        match step {
            FlowStep::AwaitInput | FlowStep::GameEnd | FlowStep::GameException { .. } => {
                return step
            }
            _ => {}
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn spawned_game_plays_to_completion() {
    let mut handle = spawn_gridfill(1);
    let mut events = Vec::new();

    let first = drain_until_idle(&mut handle, &mut events).await;
    assert_eq!(first, FlowStep::AwaitInput);

    for (player, x, y) in [(0, 0, 0), (1, 1, 1), (0, 1, 0), (1, 2, 2), (0, 2, 0)] {
        handle.submit(claim(player, x, y)).await.unwrap();
        let idle = drain_until_idle(&mut handle, &mut events).await;
        assert!(!matches!(idle, FlowStep::GameException { .. }));
    }

    assert_eq!(events.last(), Some(&FlowStep::GameEnd));
    let eliminations = events
        .iter()
        .filter(|s| matches!(s, FlowStep::Elimination(_)))
        .count();
    assert_eq!(eliminations, 2);
    handle.finished().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn illegal_actions_are_reported_not_fatal() {
    let mut handle = spawn_gridfill(2);
    let mut events = Vec::new();
    drain_until_idle(&mut handle, &mut events).await;

    handle.submit(claim(1, 0, 0)).await.unwrap();
    let idle = drain_until_idle(&mut handle, &mut events).await;

    assert_eq!(idle, FlowStep::AwaitInput);
    assert!(events
        .iter()
        .any(|s| matches!(s, FlowStep::IllegalAction { .. })));

    // The instance keeps accepting input afterwards.
    handle.submit(claim(0, 0, 0)).await.unwrap();
    let idle = drain_until_idle(&mut handle, &mut events).await;
    assert_eq!(idle, FlowStep::AwaitInput);
    handle.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_instances_share_no_state() {
    let mut first = spawn_gridfill(10);
    let mut second = spawn_gridfill(20);
    let mut first_events = Vec::new();
    let mut second_events = Vec::new();

    drain_until_idle(&mut first, &mut first_events).await;
    drain_until_idle(&mut second, &mut second_events).await;

    // Interleave submissions: instance one plays a full winning line,
    // instance two plays a single unrelated move.
    second.submit(claim(0, 2, 2)).await.unwrap();
    for (player, x, y) in [(0, 0, 0), (1, 1, 1), (0, 1, 0), (1, 2, 2), (0, 2, 0)] {
        first.submit(claim(player, x, y)).await.unwrap();
        drain_until_idle(&mut first, &mut first_events).await;
    }
    drain_until_idle(&mut second, &mut second_events).await;

    assert_eq!(first_events.last(), Some(&FlowStep::GameEnd));
    // Instance two is still mid-game, unaffected by instance one ending.
    assert!(!second_events.iter().any(|s| matches!(s, FlowStep::GameEnd)));
    assert_eq!(
        second_events
            .iter()
            .filter(|s| matches!(s, FlowStep::ActionPerformed { .. }))
            .count(),
        1
    );
    second.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn stopping_discards_the_instance() {
    let mut handle = spawn_gridfill(3);
    let mut events = Vec::new();
    drain_until_idle(&mut handle, &mut events).await;

    handle.stop();

    // The task is gone; a fresh instance is unaffected.
    let mut fresh = spawn_gridfill(4);
    let mut fresh_events = Vec::new();
    let idle = drain_until_idle(&mut fresh, &mut fresh_events).await;
    assert_eq!(idle, FlowStep::AwaitInput);
    fresh.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn events_preserve_emission_order_across_the_channel() {
    let mut handle = spawn_gridfill(5);
    let mut events = Vec::new();
    drain_until_idle(&mut handle, &mut events).await;

    handle.submit(claim(0, 1, 1)).await.unwrap();
    drain_until_idle(&mut handle, &mut events).await;

    let kinds: Vec<&str> = events.iter().map(FlowStep::kind).collect();
    assert_eq!(
        kinds,
        vec![
            "setup",
            "await-input",
            "action-performed",
            "log",
            "await-input",
        ]
    );
    handle.stop();
}
