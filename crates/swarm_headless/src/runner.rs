//! Headless game runner implementation.
//!
//! The runner plays the part of the interactive frame loop: it owns one
//! [`Simulation`], feeds it frame deltas on request and reports state back.
//! Input and output are generic so tests can drive it from byte buffers.

use std::io::{self, BufRead, Write};

use swarm_core::config::GameConfig;
use swarm_core::simulation::Simulation;
use tracing::{debug, info, warn};

use crate::protocol::{clamp_frame_delta, Command, ProtocolError, Response};
use crate::snapshot::Snapshot;

/// Totals of one protocol session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Lines that parsed into commands.
    pub commands: u64,
    /// Lines that failed to parse.
    pub errors: u64,
    /// Whether the session ended with `quit` rather than end of input.
    pub quit: bool,
}

/// JSON-line runner around one game.
pub struct HeadlessRunner<R, W> {
    input: R,
    output: W,
    base: GameConfig,
    sim: Simulation,
    auto_state: bool,
}

impl<R: BufRead, W: Write> HeadlessRunner<R, W> {
    /// Create a runner playing a game built from `config`.
    pub fn new(config: GameConfig, input: R, output: W) -> Self {
        let sim = Simulation::with_config(config.clone());
        Self {
            input,
            output,
            base: config,
            sim,
            auto_state: false,
        }
    }

    /// Answer `speed`, `build` and `debug_wave` with a state line instead
    /// of an ack.
    pub fn with_auto_state(mut self, auto_state: bool) -> Self {
        self.auto_state = auto_state;
        self
    }

    /// The running game.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Consume the runner, returning the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until `quit` or end of input.
    ///
    /// Writes a ready line first, then exactly one response per non-blank
    /// input line.
    pub fn run(&mut self) -> Result<SessionSummary, ProtocolError> {
        let mut summary = SessionSummary::default();
        let ready = Response::ready(
            self.sim.config().galaxy.seed,
            self.sim.store().planets.len(),
        );
        self.send(&ready)?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let command = match Command::from_json(text) {
                Ok(command) => command,
                Err(e) => {
                    summary.errors += 1;
                    warn!(error = %e, "unparseable command");
                    self.send(&Response::error(format!("Parse error: {e}")))?;
                    continue;
                }
            };
            summary.commands += 1;

            if command == Command::Quit {
                summary.quit = true;
                self.send(&Response::ack(&command))?;
                break;
            }

            let response = self.handle(&command);
            self.send(&response)?;
        }

        info!(
            commands = summary.commands,
            errors = summary.errors,
            age = self.sim.game_age(),
            "session ended"
        );
        Ok(summary)
    }

    /// Apply one command and build its response.
    pub fn handle(&mut self, command: &Command) -> Response {
        debug!(cmd = command.name(), "command");
        match *command {
            Command::Advance { frames, dt } => self.advance(frames, dt),
            Command::Speed { value } => {
                if !value.is_finite() {
                    return Response::rejected(command, "speed must be finite");
                }
                self.sim.set_speed_modifier(value);
                self.applied(command)
            }
            Command::Build {
                planet,
                tile,
                building,
            } => match self.sim.build_on_tile(planet, tile, building) {
                Ok(()) => self.applied(command),
                Err(e) => Response::rejected(command, e.to_string()),
            },
            Command::Query => self.state(),
            Command::DumpPresence => Response::Presence {
                reports: self.sim.debug_dump_planet_presence(),
            },
            Command::DebugWave => {
                self.sim.trigger_debug_wave();
                self.applied(command)
            }
            Command::NewGame {
                seed,
                galaxy_radius,
                planets,
            } => {
                let config = self.base.clone().with_galaxy(seed, galaxy_radius, planets);
                self.sim = Simulation::with_config(config);
                info!(seed, planets, "new game");
                Response::ready(seed, self.sim.store().planets.len())
            }
            Command::Quit => Response::ack(command),
        }
    }

    fn advance(&mut self, frames: u32, dt: f32) -> Response {
        let dt = clamp_frame_delta(dt);
        let mut steps = 0;
        for _ in 0..frames {
            if self.sim.is_game_over() {
                break;
            }
            steps += self.sim.advance(dt).steps;
        }
        debug!(frames, dt, steps, "advanced");

        if self.sim.is_game_over() {
            Response::GameOver {
                age: self.sim.game_age(),
                tick: self.sim.tick_count(),
            }
        } else {
            self.state()
        }
    }

    fn applied(&self, command: &Command) -> Response {
        if self.auto_state {
            self.state()
        } else {
            Response::ack(command)
        }
    }

    fn state(&self) -> Response {
        Response::State(Box::new(Snapshot::capture(&self.sim)))
    }

    fn send(&mut self, response: &Response) -> Result<(), ProtocolError> {
        self.output.write_all(response.to_json_line()?.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }
}

/// Run the protocol over the process's stdin and stdout.
pub fn run_stdio(config: GameConfig, auto_state: bool) -> Result<SessionSummary, ProtocolError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    HeadlessRunner::new(config, stdin.lock(), stdout.lock())
        .with_auto_state(auto_state)
        .run()
}
