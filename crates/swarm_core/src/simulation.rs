//! Core simulation loop.
//!
//! [`Simulation`] owns one game: the entity store, the resource ledger, the
//! wave scheduler, the clock and the random source. The hosting application
//! calls [`Simulation::advance`] once per frame, issues commands between
//! frames and reads state back through the view iterators.
//!
//! # Determinism
//!
//! Given the same [`GameConfig`] and the same sequence of frame deltas and
//! commands, a simulation produces bit-identical state on the same platform:
//! - every random decision draws from one seeded [`SimRng`]
//! - ships are processed in pool order, planets in index order
//! - no wall-clock time or process-wide state is read
//!
//! # Example
//!
//! ```
//! use swarm_core::components::BuildingKind;
//! use swarm_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new_game(1, 100.0, 5);
//! sim.build_on_tile(0, 0, BuildingKind::Mine).unwrap();
//!
//! let events = sim.advance(0.1);
//! assert!(events.steps > 0);
//! assert!(sim.game_age() > 0.0);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::SimulationClock;
use crate::components::{BuildingKind, PerClass, Planet, Ship, ShipKind, Team};
use crate::config::GameConfig;
use crate::economy::{upkeep_rate, ResourceLedger, Resources};
use crate::error::Result;
use crate::flocking::{accumulate_presence, step_ships};
use crate::galaxy::generate_galaxy;
use crate::math::Vec2;
use crate::production::{
    build_on_tile, crossed_interval, production_step, spawn_at_rim, PresenceReport,
};
use crate::rng::SimRng;
use crate::store::{EntityStore, ShipHandle};
use crate::waves::WaveScheduler;

/// Index of the player's home planet.
pub const HOME_PLANET: usize = 0;

/// What happened during one [`Simulation::advance`] call.
///
/// Lets the host trigger effects without diffing state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    /// Simulation steps run.
    pub steps: u32,
    /// Ships removed by mortality sweeps.
    pub deaths: Vec<ShipHandle>,
    /// Ships created by waves, reinforcements and shipyards.
    pub spawned: Vec<ShipHandle>,
    /// Waves that started spawning.
    pub waves_started: u32,
    /// Spawn requests dropped because the pool was full.
    pub dropped_spawns: u32,
    /// Whether the game is over after this call.
    pub game_over: bool,
}

/// Read-only snapshot of one ship, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipView {
    /// Stable handle.
    pub handle: ShipHandle,
    /// World position.
    pub position: Vec2,
    /// Heading.
    pub velocity: Vec2,
    /// Force applied last step.
    pub force: Vec2,
    /// Owning team.
    pub team: Team,
    /// Ship class.
    pub kind: ShipKind,
    /// Health as a fraction of max.
    pub health_ratio: f32,
    /// Whether an enemy is locked.
    pub has_target: bool,
    /// Muzzle flash on this frame.
    pub weapon_flash: bool,
}

impl ShipView {
    fn new(handle: ShipHandle, ship: &Ship) -> Self {
        Self {
            handle,
            position: ship.position,
            velocity: ship.velocity,
            force: ship.force,
            team: ship.team,
            kind: ship.kind,
            health_ratio: ship.health.ratio(),
            has_target: ship.target.is_some(),
            weapon_flash: ship.weapon_flash(),
        }
    }
}

/// Read-only snapshot of one planet, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetView {
    /// Planet index.
    pub index: usize,
    /// World position.
    pub position: Vec2,
    /// Body radius.
    pub radius: f32,
    /// Current owner.
    pub owner: Team,
    /// Presence per ship class.
    pub presence: PerClass<f32>,
    /// Building on each tile.
    pub buildings: Vec<BuildingKind>,
}

impl PlanetView {
    fn new(index: usize, planet: &Planet) -> Self {
        Self {
            index,
            position: planet.position,
            radius: planet.radius,
            owner: planet.owner,
            presence: planet.presence,
            buildings: planet.tiles.iter().map(|t| t.building).collect(),
        }
    }
}

/// One running game.
///
/// # Step Order
///
/// Each simulation step runs, in order:
/// 1. **Mortality sweep** - remove dead ships, latch game over
/// 2. **Waves** - count down and spawn enemies, then home reinforcements
/// 3. **Production** - run every building on player planets
/// 4. **Presence** - recompute planet presence scores
/// 5. **Motion** - steer, fight and integrate ships
/// 6. **Ledger** - apply yields and upkeep scaled by the step
#[derive(Debug, Clone)]
pub struct Simulation {
    config: GameConfig,
    store: EntityStore,
    ledger: ResourceLedger,
    waves: WaveScheduler,
    clock: SimulationClock,
    rng: SimRng,
    game_age: f32,
    tick: u64,
    game_over: bool,
}

impl Simulation {
    /// Start a stock game with the given galaxy shape.
    #[must_use]
    pub fn new_game(seed: u64, galaxy_radius: f32, planet_count: usize) -> Self {
        Self::with_config(GameConfig::default().with_galaxy(seed, galaxy_radius, planet_count))
    }

    /// Start a game from a full configuration.
    #[must_use]
    pub fn with_config(config: GameConfig) -> Self {
        let mut rng = SimRng::new(config.galaxy.seed);
        let planets = generate_galaxy(&config.galaxy, &mut rng.fork());

        let mut sim = Self {
            store: EntityStore::new(planets, config.max_ships),
            ledger: ResourceLedger::new(config.starting_resources),
            waves: WaveScheduler::new(&config.waves, config.galaxy.radius),
            clock: SimulationClock::new(config.clock),
            rng,
            game_age: 0.0,
            tick: 0,
            game_over: false,
            config,
        };

        if sim.config.initial_ship {
            sim.launch_initial_ship();
        }

        info!(
            seed = sim.config.galaxy.seed,
            planets = sim.store.planets.len(),
            "new game"
        );
        sim
    }

    fn launch_initial_ship(&mut self) {
        let Some(home) = self.store.planets.get(HOME_PLANET) else {
            return;
        };
        let (position, outward) = home.rim_point(self.rng.angle());
        let kind = ShipKind::Fighter;
        let mut ship = Ship::new(position, kind, Team::Player, self.config.ships[kind].health);
        ship.velocity = outward;

        if let Err(err) = self.store.ships.spawn(ship) {
            warn!(%err, "initial ship dropped");
        }
    }

    /// Advance by one frame of `delta` seconds.
    ///
    /// Runs the mortality sweep even when no step is due, so dead ships are
    /// removed at zero elapsed time. Does nothing else once the game is over.
    pub fn advance(&mut self, delta: f32) -> TickEvents {
        let mut events = TickEvents::default();
        self.mortality_sweep(&mut events);

        let plan = self.clock.advance(delta);
        for _ in 0..plan.steps {
            if self.game_over {
                break;
            }
            self.step(plan.step, &mut events);
        }

        events.game_over = self.game_over;
        events
    }

    fn step(&mut self, step: f32, events: &mut TickEvents) {
        self.mortality_sweep(events);
        if self.game_over {
            return;
        }

        let prev_age = self.game_age;
        self.game_age += step;
        self.tick += 1;
        events.steps += 1;

        // 2. Waves and reinforcements
        let wave = self
            .waves
            .step(&mut self.store.ships, &self.config.ships, &mut self.rng, step);
        events.spawned.extend(wave.spawned);
        events.dropped_spawns += wave.dropped;
        events.waves_started += u32::from(wave.started);
        self.reinforce(prev_age, events);

        // 3. Production
        let production = production_step(
            &mut self.store,
            &mut self.ledger,
            &self.config.ships,
            &self.config.buildings,
            &mut self.rng,
            prev_age,
            self.game_age,
        );
        events.spawned.extend(production.spawned);
        events.dropped_spawns += production.dropped;

        // 4. Presence
        accumulate_presence(&mut self.store);

        // 5. Motion
        step_ships(
            &mut self.store,
            &self.config.ships,
            &self.config.flocking,
            &mut self.rng,
            step,
        );

        // 6. Ledger
        let upkeep = upkeep_rate(&self.store, &self.config.ships, &self.config.economy);
        self.ledger.apply_rate(production.rate + upkeep, step);

        #[cfg(feature = "debug-validation")]
        self.validate_targets();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }
    }

    /// Every held target must be a live enemy at the end of a step.
    #[cfg(feature = "debug-validation")]
    fn validate_targets(&self) {
        for (handle, ship) in self.store.ships.iter() {
            if let Some(target) = ship.target {
                let valid = self
                    .store
                    .ships
                    .get(target)
                    .is_some_and(|t| t.team != ship.team && !t.is_dead());
                assert!(valid, "ship {handle} holds invalid target {target}");
            }
        }
    }

    fn reinforce(&mut self, prev_age: f32, events: &mut TickEvents) {
        let Some(interval) = self.config.reinforcement_interval else {
            return;
        };
        if !crossed_interval(prev_age, self.game_age, interval) {
            return;
        }
        let Some(home) = self.store.planets.get(HOME_PLANET) else {
            return;
        };
        match spawn_at_rim(
            &mut self.store.ships,
            home,
            ShipKind::Fighter,
            Team::Player,
            &self.config.ships,
            &mut self.rng,
        ) {
            Ok(handle) => events.spawned.push(handle),
            Err(err) => {
                warn!(%err, "reinforcement dropped");
                events.dropped_spawns += 1;
            }
        }
    }

    /// Remove every dead ship, back to front so each live index is visited
    /// once. Latches game over when no player ship is left, however it went.
    fn mortality_sweep(&mut self, events: &mut TickEvents) {
        for dense in (0..self.store.ships.len()).rev() {
            let dead = self
                .store
                .ships
                .as_slice()
                .get(dense)
                .is_some_and(|ship| ship.is_dead());
            let Some(handle) = self.store.ships.handle_at(dense).filter(|_| dead) else {
                continue;
            };
            if self.store.ships.remove(handle).is_ok() {
                events.deaths.push(handle);
            }
        }

        if self.config.end_on_fleet_loss
            && !self.game_over
            && self.store.ships.team_count(Team::Player) == 0
        {
            self.game_over = true;
            self.clock.set_speed(0.0);
            warn!(age = self.game_age, "no player ships left, game over");
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Set the speed multiplier. Zero or below pauses.
    pub fn set_speed_modifier(&mut self, speed: f32) {
        self.clock.set_speed(speed);
    }

    /// Place a building, paying its raw material cost.
    ///
    /// # Errors
    ///
    /// Rejects bad indices, occupied tiles, unbuildable kinds and
    /// unaffordable buildings without changing any state.
    pub fn build_on_tile(
        &mut self,
        planet: usize,
        tile: usize,
        building: BuildingKind,
    ) -> Result<()> {
        build_on_tile(
            &mut self.store,
            &mut self.ledger,
            &self.config.buildings,
            planet,
            tile,
            building,
        )
    }

    /// Start the active wave now, or promote the queued one.
    pub fn trigger_debug_wave(&mut self) {
        self.waves.trigger_now();
        info!(age = self.game_age, "debug wave triggered");
    }

    /// Presence scores of every planet. Each line is also logged.
    pub fn debug_dump_planet_presence(&self) -> Vec<PresenceReport> {
        self.store
            .planets
            .iter()
            .enumerate()
            .map(|(index, planet)| {
                let report = PresenceReport {
                    planet: index,
                    owner: planet.owner,
                    fighter: planet.presence.fighter,
                    bomber: planet.presence.bomber,
                    cruiser: planet.presence.cruiser,
                };
                info!(
                    planet = index,
                    owner = ?planet.owner,
                    fighter = report.fighter,
                    bomber = report.bomber,
                    cruiser = report.cruiser,
                    "planet presence"
                );
                report
            })
            .collect()
    }

    /// Spawn a ship at full class health with zero velocity.
    ///
    /// # Errors
    ///
    /// [`GameError::CapacityExceeded`](crate::error::GameError::CapacityExceeded)
    /// if the pool is full.
    pub fn spawn_ship(&mut self, position: Vec2, kind: ShipKind, team: Team) -> Result<ShipHandle> {
        let ship = Ship::new(position, kind, team, self.config.ships[kind].health);
        self.store.ships.spawn(ship)
    }

    /// Remove a ship immediately, clearing every target that pointed at it.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidHandle`](crate::error::GameError::InvalidHandle)
    /// for a stale handle.
    pub fn remove_ship(&mut self, handle: ShipHandle) -> Result<Ship> {
        self.store.ships.remove(handle)
    }

    /// Lock one ship onto an enemy.
    ///
    /// # Errors
    ///
    /// Fails for stale handles or same-team pairs.
    pub fn set_target(&mut self, attacker: ShipHandle, target: ShipHandle) -> Result<()> {
        self.store.ships.set_target(attacker, target)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether the game has ended with no player ship left.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Live ships in pool order.
    pub fn ships(&self) -> impl Iterator<Item = ShipView> + '_ {
        self.store
            .ships
            .iter()
            .map(|(handle, ship)| ShipView::new(handle, ship))
    }

    /// Planets in index order.
    pub fn planets(&self) -> impl Iterator<Item = PlanetView> + '_ {
        self.store
            .planets
            .iter()
            .enumerate()
            .map(|(index, planet)| PlanetView::new(index, planet))
    }

    /// Resolve a ship handle.
    #[must_use]
    pub fn ship(&self, handle: ShipHandle) -> Option<&Ship> {
        self.store.ships.get(handle)
    }

    /// Number of live ships.
    #[must_use]
    pub fn ship_count(&self) -> usize {
        self.store.ships.len()
    }

    /// Number of live ships on one team.
    #[must_use]
    pub fn team_ship_count(&self, team: Team) -> usize {
        self.store.ships.team_count(team)
    }

    /// The entity store.
    #[must_use]
    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Stored resources.
    #[must_use]
    pub const fn resources(&self) -> Resources {
        self.ledger.stored
    }

    /// Wave state.
    #[must_use]
    pub const fn waves(&self) -> &WaveScheduler {
        &self.waves
    }

    /// Seconds of simulated time.
    #[must_use]
    pub const fn game_age(&self) -> f32 {
        self.game_age
    }

    /// Current speed multiplier.
    #[must_use]
    pub const fn speed_modifier(&self) -> f32 {
        self.clock.speed()
    }

    /// Steps run so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Configuration this game was created with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Hash of the simulation state, for determinism checks.
    ///
    /// Covers the tick, game age, resources, every live ship in pool order
    /// and every planet's geometry, owner and tiles.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.game_age.to_bits().hash(&mut hasher);
        let stored = self.ledger.stored;
        for value in [stored.energy, stored.raw_material, stored.food] {
            value.to_bits().hash(&mut hasher);
        }

        self.store.ships.len().hash(&mut hasher);
        for (handle, ship) in self.store.ships.iter() {
            handle.hash(&mut hasher);
            ship.kind.hash(&mut hasher);
            ship.team.hash(&mut hasher);
            for value in [
                ship.position.x,
                ship.position.y,
                ship.velocity.x,
                ship.velocity.y,
                ship.health.current,
                ship.weapon_timer,
            ] {
                value.to_bits().hash(&mut hasher);
            }
            ship.target.hash(&mut hasher);
        }

        for planet in &self.store.planets {
            for value in [planet.position.x, planet.position.y, planet.radius] {
                value.to_bits().hash(&mut hasher);
            }
            planet.owner.hash(&mut hasher);
            planet.tiles.hash(&mut hasher);
        }

        hasher.finish()
    }
}
