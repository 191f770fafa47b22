//! Role arbitration between the two processes.
//!
//! ```text
//!   Settling ──(heartbeat moved)──────────────▶ Dormant
//!      │                                          │  ▲
//!      └──(window elapsed, no incumbent)──▶ Active ◀┘  │
//!                                             │        │
//!                    (relinquish / superseded)└────────┘
//! ```
//!
//! Dormant claims when the owner slot is empty, when someone else asked
//! to be relieved, or when the owner's heartbeat went silent. A handoff
//! requested by this process never triggers its own claim.
//!
//! Two processes may briefly both believe they are Active, typically
//! after one stalled long enough to be declared dead. Before each beat an
//! Active holder compares the region against its own counter. A claim
//! always writes a heartbeat above anything the previous holder wrote, so
//! a foreign owner with a higher heartbeat means this process was
//! superseded and yields. Equal heartbeats come from two claims racing on
//! the same value; the higher `ProcessId` keeps the role.

use std::cmp::Ordering;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use snake_engine::engine::{ResumeOutcome, SnakeEngine};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::heartbeat::{Liveness, LivenessWatch};
use crate::layout::{Control, ProcessId, Snapshot, LAYOUT_VERSION, REGION_MAGIC};
use crate::region::SharedRegion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Observing the region before deciding whether an incumbent exists.
    Settling,
    Active,
    Dormant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Settling => "settling",
            Role::Active => "active",
            Role::Dormant => "dormant",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimReason {
    /// Settle window passed without a heartbeat.
    FreshStart,
    /// Owner slot empty; the previous holder exited cleanly.
    OwnerVacant,
    /// The owner asked to be relieved.
    TakeoverRequested,
    /// Owner's heartbeat stopped.
    OwnerSilent { silent_for: Duration },
    /// The region names this process as owner and no handoff is pending.
    AlreadyOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Stay,
    Claim(ClaimReason),
    /// Become (or remain) Dormant.
    Yield,
}

/// Result of a successful claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReport {
    pub reason: ClaimReason,
    pub resume: ResumeOutcome,
    /// Heartbeat value written with the claim.
    pub heartbeat: u64,
}

#[derive(Debug, Clone, Copy)]
struct SettleWindow {
    started: Instant,
    length: Duration,
    first_heartbeat: u64,
}

pub struct RoleArbiter {
    me: ProcessId,
    role: Role,
    handoff_pending: bool,
    watch: LivenessWatch,
    settle: SettleWindow,
}

impl RoleArbiter {
    /// Start Settling with `control` as the first observation.
    pub fn new(
        me: ProcessId,
        control: &Control,
        settle_window: Duration,
        liveness_timeout: Duration,
        now: Instant,
    ) -> Self {
        Self {
            me,
            role: Role::Settling,
            handoff_pending: false,
            watch: LivenessWatch::new(liveness_timeout, control.heartbeat, now),
            settle: SettleWindow {
                started: now,
                length: settle_window,
                first_heartbeat: control.heartbeat,
            },
        }
    }

    pub fn me(&self) -> ProcessId {
        self.me
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn handoff_pending(&self) -> bool {
        self.handoff_pending
    }

    /// Startup observation. `None` while the window is still open and
    /// nothing has been learned.
    ///
    /// A heartbeat that moves during the window proves an incumbent and
    /// ends the window early with `Yield`; the arbiter is then Dormant.
    /// `Claim` leaves the role unchanged until `claim` succeeds.
    pub fn settle(&mut self, control: &Control, now: Instant) -> Option<Decision> {
        if self.role != Role::Settling {
            return None;
        }
        if control.heartbeat != self.settle.first_heartbeat && !control.owner.is_none() {
            info!(me = %self.me, owner = %control.owner, "incumbent detected, standing by");
            self.become_dormant(control, now);
            return Some(Decision::Yield);
        }
        if now.saturating_duration_since(self.settle.started) < self.settle.length {
            return None;
        }
        debug!(me = %self.me, owner = %control.owner, "settle window elapsed without a heartbeat");
        Some(Decision::Claim(ClaimReason::FreshStart))
    }

    /// One Dormant poll against the current control fields.
    pub fn dormant_check(&mut self, control: &Control, now: Instant) -> Decision {
        if self.handoff_pending
            && (!control.takeover_request || control.requested_by != self.me)
        {
            info!(me = %self.me, owner = %control.owner, "handoff accepted");
            self.handoff_pending = false;
        }

        let liveness = self.watch.observe(control.heartbeat, now);

        if control.owner.is_none() {
            return Decision::Claim(ClaimReason::OwnerVacant);
        }
        if control.foreign_request(self.me) {
            return Decision::Claim(ClaimReason::TakeoverRequested);
        }
        if control.owner == self.me {
            if self.handoff_pending {
                return Decision::Stay;
            }
            return Decision::Claim(ClaimReason::AlreadyOwner);
        }
        if let Liveness::Dead { silent_for } = liveness {
            return Decision::Claim(ClaimReason::OwnerSilent { silent_for });
        }
        Decision::Stay
    }

    /// Conflict check for an Active holder whose last written heartbeat
    /// is `own_heartbeat`.
    pub fn active_check(&self, control: &Control, own_heartbeat: u64) -> Decision {
        if control.owner.is_none() || control.owner == self.me {
            return Decision::Stay;
        }
        match control.heartbeat.cmp(&own_heartbeat) {
            Ordering::Greater => Decision::Yield,
            Ordering::Equal if control.owner > self.me => Decision::Yield,
            _ => Decision::Stay,
        }
    }

    /// Step down after `active_check` returned `Yield`.
    pub fn yield_to(&mut self, control: &Control, now: Instant) {
        warn!(
            me = %self.me,
            owner = %control.owner,
            heartbeat = control.heartbeat,
            "another process holds the active role, yielding"
        );
        self.become_dormant(control, now);
    }

    /// Take the Active role: resume the region's game or reset it, then
    /// publish the whole snapshot under this process's ownership.
    pub fn claim(
        &mut self,
        reason: ClaimReason,
        region: &mut SharedRegion,
        engine: &mut SnakeEngine,
    ) -> Result<ClaimReport> {
        let snapshot = region.read();
        let resume = engine.resume_or_reset(snapshot.game);
        if let ResumeOutcome::Reset(why) = &resume {
            info!(me = %self.me, %why, "region state not resumable, starting a new game");
        }

        let heartbeat = snapshot.control.heartbeat.wrapping_add(1);
        let published = Snapshot {
            magic: REGION_MAGIC,
            layout_version: LAYOUT_VERSION,
            control: Control {
                owner: self.me,
                heartbeat,
                takeover_request: false,
                requested_by: ProcessId::NONE,
            },
            game: engine.state().clone(),
        };
        region.write(&published);
        region.sync()?;

        let previous = self.role;
        self.role = Role::Active;
        self.handoff_pending = false;
        info!(
            me = %self.me,
            from = %previous,
            previous_owner = %snapshot.control.owner,
            ?reason,
            resumed = matches!(resume, ResumeOutcome::Resumed),
            heartbeat,
            "claimed active role"
        );
        Ok(ClaimReport {
            reason,
            resume,
            heartbeat,
        })
    }

    /// Ask the other process to take over, then stand by. Ownership stays
    /// recorded until the other side claims.
    pub fn relinquish(&mut self, region: &mut SharedRegion, now: Instant) -> Result<()> {
        let mut control = region.read_control();
        control.takeover_request = true;
        control.requested_by = self.me;
        region.write_control(&control);
        region.sync()?;

        self.handoff_pending = true;
        self.become_dormant(&control, now);
        info!(me = %self.me, heartbeat = control.heartbeat, "relinquished active role");
        Ok(())
    }

    /// Clear this process's ownership and request, if still recorded.
    /// Returns whether anything was written.
    pub fn release(&mut self, region: &mut SharedRegion) -> Result<bool> {
        let mut control = region.read_control();
        let mut touched = false;
        if control.owner == self.me {
            control.owner = ProcessId::NONE;
            touched = true;
        }
        if control.takeover_request && control.requested_by == self.me {
            control.takeover_request = false;
            control.requested_by = ProcessId::NONE;
            touched = true;
        }
        if touched {
            region.write_control(&control);
            region.sync()?;
            info!(me = %self.me, role = %self.role, "released ownership");
        }
        Ok(touched)
    }

    fn become_dormant(&mut self, control: &Control, now: Instant) {
        self.role = Role::Dormant;
        self.watch.reset(control.heartbeat, now);
    }
}
