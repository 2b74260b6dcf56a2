//! Simulation tests that verify game mechanics end to end.
//!
//! These drive a full [`Simulation`] through frames and commands and check
//! the properties that must hold after every step.

use proptest::prelude::*;
use swarm_core::clock::{ClockConfig, StepMode};
use swarm_core::components::{BuildingKind, PerClass, ShipKind, Team};
use swarm_core::economy::Resources;
use swarm_core::error::GameError;
use swarm_core::math::Vec2;
use swarm_core::simulation::Simulation;
use swarm_core::waves::WavePhase;
use swarm_test_utils::determinism::strategies::arb_frame_delta;
use swarm_test_utils::fixtures::{
    battle_simulation, ledger_config, quiet_config, quiet_simulation, run_frames, spawn_row,
    TEST_FRAME,
};

// =============================================================================
// Helpers
// =============================================================================

fn assert_targets_valid(sim: &Simulation) {
    for (handle, ship) in sim.store().ships.iter() {
        if let Some(target) = ship.target {
            let enemy = sim
                .ship(target)
                .unwrap_or_else(|| panic!("ship {handle} holds stale target {target}"));
            assert_ne!(enemy.team, ship.team, "ship {handle} targets a friend");
            assert!(!enemy.is_dead(), "ship {handle} targets a dead ship");
        }
    }
}

// =============================================================================
// Motion
// =============================================================================

#[test]
fn test_headings_stay_unit_length() {
    let mut sim = battle_simulation(21, 10);
    for _ in 0..40 {
        sim.advance(TEST_FRAME);
        for view in sim.ships() {
            let len = view.velocity.length();
            assert!(
                len == 0.0 || (len - 1.0).abs() < 1e-4,
                "heading length {len}"
            );
            assert!(view.position.is_finite());
        }
    }
}

#[test]
fn test_targets_valid_after_every_step() {
    let mut sim = battle_simulation(22, 12);
    let mut engaged = false;
    for _ in 0..200 {
        sim.advance(TEST_FRAME);
        assert_targets_valid(&sim);
        engaged |= sim.ships().any(|s| s.has_target);
    }
    assert!(engaged, "fleets in sensor range never engaged");
}

#[test]
fn test_battle_kills_ships() {
    let mut sim = battle_simulation(23, 12);
    let before = sim.ship_count();
    let events = run_frames(&mut sim, 400, TEST_FRAME);
    assert!(!events.deaths.is_empty());
    assert_eq!(sim.ship_count(), before - events.deaths.len());
    for dead in &events.deaths {
        assert!(sim.ship(*dead).is_none());
    }
}

// =============================================================================
// Entity store
// =============================================================================

#[test]
fn test_removal_does_not_alias_targets() {
    let mut sim = quiet_simulation(24, 3);
    let a = sim
        .spawn_ship(Vec2::new(0.0, 60.0), ShipKind::Fighter, Team::Player)
        .unwrap();
    let b = sim
        .spawn_ship(Vec2::new(5.0, 60.0), ShipKind::Bomber, Team::Enemy)
        .unwrap();
    let c = sim
        .spawn_ship(Vec2::new(9.0, 60.0), ShipKind::Cruiser, Team::Enemy)
        .unwrap();
    sim.set_target(a, b).unwrap();
    let b_state = sim.ship(b).unwrap().clone();

    sim.remove_ship(c).unwrap();

    let target = sim.ship(a).unwrap().target.unwrap();
    assert_eq!(target, b);
    assert_eq!(sim.ship(target), Some(&b_state));
    assert!(sim.ship(c).is_none());
    assert_eq!(sim.remove_ship(c), Err(GameError::InvalidHandle(c)));
}

#[test]
fn test_removed_target_is_cleared() {
    let mut sim = quiet_simulation(25, 3);
    let a = sim
        .spawn_ship(Vec2::new(0.0, 60.0), ShipKind::Fighter, Team::Player)
        .unwrap();
    let b = sim
        .spawn_ship(Vec2::new(5.0, 60.0), ShipKind::Fighter, Team::Enemy)
        .unwrap();
    sim.set_target(a, b).unwrap();

    sim.remove_ship(b).unwrap();
    // Slot reuse must not revive the old handle
    let fresh = sim
        .spawn_ship(Vec2::new(5.0, 60.0), ShipKind::Fighter, Team::Enemy)
        .unwrap();

    assert_eq!(sim.ship(a).unwrap().target, None);
    assert_ne!(fresh, b);
    assert!(sim.ship(b).is_none());
}

#[test]
fn test_pool_limit_drops_spawns() {
    let mut config = quiet_config(26, 3);
    config.max_ships = Some(2);
    let mut sim = Simulation::with_config(config);
    spawn_row(&mut sim, Vec2::new(0.0, 50.0), 2, ShipKind::Fighter, Team::Player);

    let err = sim
        .spawn_ship(Vec2::ZERO, ShipKind::Fighter, Team::Player)
        .unwrap_err();
    assert_eq!(err, GameError::CapacityExceeded { capacity: 2 });
}

// =============================================================================
// Economy
// =============================================================================

#[test]
fn test_headquarters_ledger_grows_linearly() {
    let mut sim = Simulation::with_config(ledger_config(27, 100.0));
    // 4 seconds of 0.125s steps
    run_frames(&mut sim, 32, TEST_FRAME);

    let expected = 100.0 + 3.0 * 4.0;
    let stored = sim.resources();
    for value in [stored.energy, stored.raw_material, stored.food] {
        assert!((value - expected).abs() < 1e-3, "{value} != {expected}");
    }
}

#[test]
fn test_ledger_independent_of_step_size() {
    let mut coarse_config = ledger_config(28, 100.0);
    coarse_config.clock.mode = StepMode::Fixed(0.25);
    let mut coarse = Simulation::with_config(coarse_config);
    let mut fine = Simulation::with_config(ledger_config(28, 100.0));

    coarse.build_on_tile(0, 0, BuildingKind::PowerPlant).unwrap();
    fine.build_on_tile(0, 0, BuildingKind::PowerPlant).unwrap();
    run_frames(&mut coarse, 8, 0.25);
    run_frames(&mut fine, 16, TEST_FRAME);

    let (a, b) = (coarse.resources(), fine.resources());
    assert!((a.energy - b.energy).abs() < 1e-3);
    assert!((a.raw_material - b.raw_material).abs() < 1e-3);
}

#[test]
fn test_food_upkeep_drains_player_planets() {
    let mut config = ledger_config(29, 100.0);
    config.economy.food_upkeep = 1.0;
    config.buildings.headquarters.yields = Resources::ZERO;
    let mut sim = Simulation::with_config(config);
    let radius = sim.planets().next().unwrap().radius;

    run_frames(&mut sim, 8, TEST_FRAME);

    let expected = 100.0 - radius.sqrt();
    assert!((sim.resources().food - expected).abs() < 1e-3);
}

#[test]
fn test_building_captures_planet() {
    let mut sim = quiet_simulation(30, 4);
    assert_eq!(sim.planets().nth(3).unwrap().owner, Team::Enemy);

    sim.build_on_tile(3, 1, BuildingKind::Farm).unwrap();

    let planet = sim.planets().nth(3).unwrap();
    assert_eq!(planet.owner, Team::Player);
    assert_eq!(planet.buildings[1], BuildingKind::Farm);
}

#[test]
fn test_unaffordable_build_is_rejected() {
    let mut config = quiet_config(31, 3);
    config.starting_resources = Resources::new(0.0, 10.0, 0.0);
    let mut sim = Simulation::with_config(config);

    let err = sim
        .build_on_tile(1, 0, BuildingKind::ShipyardCruiser)
        .unwrap_err();
    assert!(matches!(err, GameError::InsufficientFunds { .. }));
    assert_eq!(sim.planets().nth(1).unwrap().owner, Team::Enemy);
}

#[test]
fn test_shipyard_launches_fighters() {
    let mut sim = quiet_simulation(32, 3);
    sim.build_on_tile(0, 0, BuildingKind::ShipyardFighter).unwrap();

    // Crosses the 2s and 4s marks
    let events = run_frames(&mut sim, 36, TEST_FRAME);
    assert_eq!(events.spawned.len(), 2);
    assert_eq!(sim.team_ship_count(Team::Player), 2);
}

// =============================================================================
// Waves
// =============================================================================

#[test]
fn test_wave_escalation_cycle() {
    let mut config = quiet_config(33, 3);
    config.waves.enabled = true;
    config.waves.first = PerClass::new(1.0, 0.0, 0.0);
    config.waves.first_countdown = 0.0;
    config.waves.next = PerClass::new(15.0, 5.0, 1.0);
    let mut sim = Simulation::with_config(config);

    let events = sim.advance(TEST_FRAME);
    assert_eq!(events.waves_started, 1);
    assert_eq!(events.spawned.len(), 1);
    assert_eq!(sim.waves().current().remaining, PerClass::new(0.0, 0.0, 0.0));
    assert_eq!(sim.waves().current().phase(), WavePhase::Depleted);

    // Depleted but an enemy is still alive: no handoff
    sim.advance(TEST_FRAME);
    assert_eq!(sim.waves().current().remaining, PerClass::new(0.0, 0.0, 0.0));

    sim.remove_ship(events.spawned[0]).unwrap();
    sim.advance(TEST_FRAME);
    assert_eq!(
        sim.waves().current().remaining,
        PerClass::new(22.5, 7.5, 1.5)
    );
    assert_eq!(sim.waves().current().phase(), WavePhase::Pending);
}

#[test]
fn test_enemies_spawn_inside_area() {
    let mut config = quiet_config(34, 3);
    config.waves.enabled = true;
    config.waves.first = PerClass::new(3.0, 2.0, 1.0);
    config.waves.first_countdown = 0.0;
    config.waves.spawn_area = Some((Vec2::new(150.0, -10.0), Vec2::new(170.0, 10.0)));
    let mut sim = Simulation::with_config(config);

    let events = sim.advance(TEST_FRAME);
    assert_eq!(events.spawned.len(), 3);
    for handle in events.spawned {
        let ship = sim.ship(handle).unwrap();
        assert_eq!(ship.team, Team::Enemy);
        // One step of motion at most
        assert!(ship.position.x > 148.0 && ship.position.x < 172.0);
    }
}

// =============================================================================
// Clock and game flow
// =============================================================================

#[test]
fn test_long_frame_runs_at_most_five_steps() {
    let mut config = quiet_config(35, 3);
    config.clock = ClockConfig {
        mode: StepMode::Fixed(0.016),
        max_steps_per_frame: 5,
    };
    let mut sim = Simulation::with_config(config);

    let events = sim.advance(10.0);
    assert_eq!(events.steps, 5);
    assert_eq!(sim.tick_count(), 5);
}

#[test]
fn test_zero_frame_is_idempotent() {
    let mut sim = battle_simulation(36, 6);
    run_frames(&mut sim, 10, TEST_FRAME);
    let ships: Vec<_> = sim.ships().collect();
    let resources = sim.resources();

    let events = sim.advance(0.0);
    assert_eq!(events.steps, 0);
    let after: Vec<_> = sim.ships().collect();
    // Only dead ships may disappear
    assert_eq!(after.len() + events.deaths.len(), ships.len());
    for view in &after {
        let old = ships.iter().find(|s| s.handle == view.handle).unwrap();
        assert_eq!(old.position, view.position);
        assert_eq!(old.velocity, view.velocity);
    }
    assert_eq!(sim.resources(), resources);
}

#[test]
fn test_game_over_when_last_player_ship_dies() {
    let mut config = quiet_config(37, 3);
    config.end_on_fleet_loss = true;
    let mut sim = Simulation::with_config(config);
    let player = sim
        .spawn_ship(Vec2::new(0.0, 80.0), ShipKind::Fighter, Team::Player)
        .unwrap();
    let hunters = spawn_row(
        &mut sim,
        Vec2::new(-6.0, 84.0),
        6,
        ShipKind::Cruiser,
        Team::Enemy,
    );
    for hunter in hunters {
        sim.set_target(hunter, player).unwrap();
    }

    let events = run_frames(&mut sim, 40, TEST_FRAME);
    assert!(events.game_over);
    assert!(sim.is_game_over());
    assert_eq!(sim.speed_modifier(), 0.0);
    assert!(events.deaths.contains(&player));

    let age = sim.game_age();
    sim.advance(1.0);
    assert_eq!(sim.game_age(), age);
}

#[test]
fn test_removing_last_player_ship_ends_game() {
    let mut config = quiet_config(39, 3);
    config.end_on_fleet_loss = true;
    let mut sim = Simulation::with_config(config);
    let only = sim
        .spawn_ship(Vec2::new(300.0, 300.0), ShipKind::Fighter, Team::Player)
        .unwrap();
    sim.spawn_ship(Vec2::new(320.0, 300.0), ShipKind::Fighter, Team::Enemy)
        .unwrap();

    sim.remove_ship(only).unwrap();
    assert!(!sim.is_game_over());

    let events = sim.advance(TEST_FRAME);
    assert!(events.game_over);
    assert_eq!(events.steps, 0);
    assert!(sim.is_game_over());
    assert_eq!(sim.speed_modifier(), 0.0);
}

#[test]
fn test_out_of_range_target_released() {
    let mut sim = quiet_simulation(40, 3);
    // 20 apart: a fighter sees this far but cannot shoot.
    let player = sim
        .spawn_ship(Vec2::new(300.0, 300.0), ShipKind::Fighter, Team::Player)
        .unwrap();
    let enemy = sim
        .spawn_ship(Vec2::new(320.0, 300.0), ShipKind::Fighter, Team::Enemy)
        .unwrap();
    sim.set_target(player, enemy).unwrap();

    let events = sim.advance(TEST_FRAME);
    assert_eq!(events.steps, 1);
    assert_eq!(sim.ship(player).unwrap().target, None);
    assert_eq!(
        sim.ship(enemy).unwrap().health.current,
        sim.config().ships.fighter.health
    );
}

#[test]
fn test_stock_game_runs_a_minute() {
    let mut sim = Simulation::new_game(38, 100.0, 8);
    let events = run_frames(&mut sim, 3600, 1.0 / 60.0);
    assert!(events.steps > 3000);
    assert!(sim.game_age() > 50.0);
    assert!(events.waves_started >= 1);
    for view in sim.ships() {
        assert!(view.position.is_finite());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_arbitrary_frames_stay_bounded(
        seed in 0u64..1000,
        deltas in prop::collection::vec(arb_frame_delta(), 1..60),
    ) {
        let mut sim = battle_simulation(seed, 6);
        for delta in deltas {
            let events = sim.advance(delta);
            prop_assert!(events.steps <= 5);
            assert_targets_valid(&sim);
        }
        for view in sim.ships() {
            prop_assert!(view.position.is_finite());
            prop_assert!(view.velocity.is_finite());
        }
    }
}
