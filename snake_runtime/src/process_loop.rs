//! Per-role scheduling loop.
//!
//! Every tick drains input, then runs the body for the current role:
//!
//! - Settling: watch the region until the settle window decides.
//! - Active: check ownership and beat, apply commands, step the engine
//!   on its cadence, publishing and syncing after each mutation.
//! - Dormant: poll the region and let the arbiter decide whether to claim.
//!
//! `tick` takes the current instant so protocol scenarios can be driven
//! without sleeping. `run` supplies the real clock and sleeps out the
//! rest of each tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use snake_engine::commands::Command as EngineCommand;
use snake_engine::domain::StepOutcome;
use snake_engine::engine::SnakeEngine;
use tracing::{debug, info, warn};

use crate::arbiter::{ClaimReason, Decision, Role, RoleArbiter};
use crate::config::RuntimeConfig;
use crate::display::{Display, Frame};
use crate::error::Result;
use crate::heartbeat::HeartbeatPulse;
use crate::input::{Command, InputSource};
use crate::layout::{Control, ProcessId, Snapshot};
use crate::region::SharedRegion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct ProcessLoop<I: InputSource, D: Display> {
    active_tick: Duration,
    poll_interval: Duration,
    region: SharedRegion,
    arbiter: RoleArbiter,
    engine: SnakeEngine,
    pulse: HeartbeatPulse,
    input: I,
    display: D,
    last_step: Instant,
    /// What gets rendered: the local game while Active, otherwise the
    /// last region read that carried a valid header.
    view: Snapshot,
    released: bool,
}

impl<I: InputSource, D: Display> ProcessLoop<I, D> {
    pub fn new(
        config: &RuntimeConfig,
        region: SharedRegion,
        engine: SnakeEngine,
        me: ProcessId,
        input: I,
        display: D,
        now: Instant,
    ) -> Self {
        let view = region.read();
        let arbiter = RoleArbiter::new(
            me,
            &view.control,
            config.settle_window(),
            config.liveness_timeout(),
            now,
        );
        info!(%me, owner = %view.control.owner, heartbeat = view.control.heartbeat, "settling");
        Self {
            active_tick: config.active_tick(),
            poll_interval: config.poll_interval(),
            region,
            arbiter,
            engine,
            pulse: HeartbeatPulse::new(config.heartbeat_interval(), now),
            input,
            display,
            last_step: now,
            view,
            released: false,
        }
    }

    pub fn me(&self) -> ProcessId {
        self.arbiter.me()
    }

    pub fn role(&self) -> Role {
        self.arbiter.role()
    }

    pub fn arbiter(&self) -> &RoleArbiter {
        &self.arbiter
    }

    pub fn engine(&self) -> &SnakeEngine {
        &self.engine
    }

    pub fn region(&self) -> &SharedRegion {
        &self.region
    }

    pub fn view(&self) -> &Snapshot {
        &self.view
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Sleep between ticks for the current role.
    pub fn tick_period(&self) -> Duration {
        match self.arbiter.role() {
            Role::Active => self.active_tick,
            Role::Settling | Role::Dormant => self.poll_interval,
        }
    }

    /// One loop body.
    pub fn tick(&mut self, now: Instant) -> Result<Flow> {
        let commands = self.input.poll()?;
        if commands.contains(&Command::Quit) {
            info!(me = %self.me(), role = %self.role(), "quit requested");
            return Ok(Flow::Quit);
        }

        match self.arbiter.role() {
            Role::Settling => self.settling_tick(now)?,
            Role::Active => self.active_tick(commands, now)?,
            Role::Dormant => {
                if !commands.is_empty() {
                    debug!(count = commands.len(), "ignoring commands while dormant");
                }
                self.dormant_tick(now)?;
            }
        }

        let frame = Frame {
            role: self.arbiter.role(),
            snapshot: &self.view,
            me: self.arbiter.me(),
        };
        self.display.render(&frame)?;
        Ok(Flow::Continue)
    }

    /// Tick until quit or `shutdown` is raised, then release ownership.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        let result = self.run_until(shutdown);
        self.shutdown();
        result
    }

    /// Best-effort release of ownership. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.arbiter.release(&mut self.region) {
            warn!(%err, "failed to release ownership on exit");
        }
    }

    fn run_until(&mut self, shutdown: &AtomicBool) -> Result<()> {
        while !shutdown.load(Ordering::Relaxed) {
            let started = Instant::now();
            if self.tick(started)? == Flow::Quit {
                break;
            }
            if let Some(rest) = self.tick_period().checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        Ok(())
    }

    // ── Role bodies ───────────────────────────────────────────────

    fn settling_tick(&mut self, now: Instant) -> Result<()> {
        self.refresh_view();
        let control = self.view.control;
        if let Some(Decision::Claim(reason)) = self.arbiter.settle(&control, now) {
            self.take_control(reason, now)?;
        }
        Ok(())
    }

    fn dormant_tick(&mut self, now: Instant) -> Result<()> {
        self.refresh_view();
        let control = self.view.control;
        if let Decision::Claim(reason) = self.arbiter.dormant_check(&control, now) {
            self.take_control(reason, now)?;
        }
        Ok(())
    }

    fn active_tick(&mut self, commands: Vec<Command>, now: Instant) -> Result<()> {
        // A holder that stalled past the liveness timeout is always due
        // here, so it learns it was replaced before writing anything.
        if self.pulse.is_due(now) {
            let control = self.region.read_control();
            if self.arbiter.active_check(&control, self.pulse.counter()) == Decision::Yield {
                self.arbiter.yield_to(&control, now);
                self.refresh_view();
                return Ok(());
            }
            self.pulse.catch_up(control.heartbeat);
            let heartbeat = self.pulse.beat(now);
            let control = self.own_control(heartbeat);
            self.region.write_control(&control);
            self.region.sync()?;
        }

        for command in commands {
            let command = match command {
                Command::Turn(heading) => EngineCommand::Turn(heading),
                Command::TogglePause => EngineCommand::TogglePause,
                Command::Reset => EngineCommand::Reset,
                Command::Relinquish => {
                    self.arbiter.relinquish(&mut self.region, now)?;
                    self.refresh_view();
                    return Ok(());
                }
                Command::Quit => continue,
            };
            self.step(command)?;
        }

        if now.saturating_duration_since(self.last_step) >= self.engine.move_interval() {
            self.last_step = now;
            self.step(EngineCommand::Advance)?;
        }

        self.view = Snapshot {
            control: self.own_control(self.pulse.counter()),
            game: self.engine.state().clone(),
            ..Snapshot::canonical()
        };
        Ok(())
    }

    // ── Helpers ───────────────────────────────────────────────────

    fn take_control(&mut self, reason: ClaimReason, now: Instant) -> Result<()> {
        let report = self
            .arbiter
            .claim(reason, &mut self.region, &mut self.engine)?;
        self.pulse.restart(report.heartbeat, now);
        self.last_step = now;
        self.view = Snapshot {
            control: self.own_control(report.heartbeat),
            game: self.engine.state().clone(),
            ..Snapshot::canonical()
        };
        Ok(())
    }

    /// Apply one engine command; publish and sync if it changed anything.
    fn step(&mut self, command: EngineCommand) -> Result<StepOutcome> {
        let outcome = self.engine.apply(command);
        if outcome.mutated() {
            self.region.write_simulation(self.engine.state());
            self.region.sync()?;
        }
        if outcome.ended_game() {
            let state = self.engine.state();
            info!(
                me = %self.me(),
                ?outcome,
                score = state.score,
                high_score = state.high_score,
                "game over"
            );
        }
        Ok(outcome)
    }

    fn own_control(&self, heartbeat: u64) -> Control {
        Control {
            owner: self.arbiter.me(),
            heartbeat,
            takeover_request: false,
            requested_by: ProcessId::NONE,
        }
    }

    /// Keep the last good view when the header does not validate.
    fn refresh_view(&mut self) {
        let snapshot = self.region.read();
        if snapshot.is_valid() {
            self.view = snapshot;
        } else {
            debug!(magic = snapshot.magic, "region header invalid, keeping last view");
        }
    }
}

impl<I: InputSource, D: Display> Drop for ProcessLoop<I, D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
