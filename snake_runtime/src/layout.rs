//! Shared region layout: fixed offsets, little-endian fields.
//!
//! Pure codec layer. No I/O, no clocks. Both processes must agree on
//! every offset here; changing one requires bumping `LAYOUT_VERSION`.
//!
//! ```text
//!  0  magic            u32      40  phase         u32
//!  4  layout_version   u32      44  heading       u32
//!  8  write_seq        u32      48  score         u32
//! 12  takeover_request u32      52  high_score    u32
//! 16  owner            u64      56  body_len      u32
//! 24  heartbeat        u64      60  food x, y     i32, i32
//! 32  requested_by     u64      68  games_played  u32
//!                               72  food_eaten    u64
//!                               80  longest_body  u32
//!                               84  reserved      u32
//!                               88  body          [(i32, i32); MAX_BODY_LEN]
//! ```
//!
//! Decoding never fails. Out-of-range codes and lengths are mapped to
//! values the engine's resume check will reject, so garbage turns into
//! a reset rather than an error.

use std::fmt;

use serde::Serialize;
use snake_engine::domain::{Counters, GameState, Heading, Phase, Point, MAX_BODY_LEN};

pub const REGION_MAGIC: u32 = 0x534E_4B44;
pub const LAYOUT_VERSION: u32 = 1;

const MAGIC: usize = 0;
const VERSION: usize = 4;
/// Seqlock word; accessed only through volatile byte operations in `region`.
pub(crate) const WRITE_SEQ: usize = 8;
const TAKEOVER_REQUEST: usize = 12;
const OWNER: usize = 16;
const HEARTBEAT: usize = 24;
const REQUESTED_BY: usize = 32;
const PHASE: usize = 40;
const HEADING: usize = 44;
const SCORE: usize = 48;
const HIGH_SCORE: usize = 52;
const BODY_LEN: usize = 56;
const FOOD_X: usize = 60;
const FOOD_Y: usize = 64;
const GAMES_PLAYED: usize = 68;
const FOOD_EATEN: usize = 72;
const LONGEST_BODY: usize = 80;
const BODY: usize = 88;
const POINT_SIZE: usize = 8;

/// Bytes mapped from the backing store.
pub const REGION_SIZE: usize = BODY + MAX_BODY_LEN * POINT_SIZE;

// ── Identity ───────────────────────────────────────────────────────

/// Identity of a participating process. Zero means "nobody".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProcessId(u64);

impl ProcessId {
    pub const NONE: ProcessId = ProcessId(0);

    /// OS pid in the high half, random nonce in the low half, so a
    /// recycled pid still gets a distinct identity.
    pub fn generate() -> Self {
        let pid = u64::from(std::process::id());
        let nonce = u64::from(rand::random::<u32>());
        Self::from_raw((pid << 32) | nonce.max(1))
    }

    pub const fn from_raw(raw: u64) -> Self {
        ProcessId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("none")
        } else {
            write!(f, "{:016x}", self.0)
        }
    }
}

// ── Records ────────────────────────────────────────────────────────

/// Ownership and liveness fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Control {
    pub owner: ProcessId,
    pub heartbeat: u64,
    /// Set by the Active holder asking to be relieved.
    pub takeover_request: bool,
    /// Who raised `takeover_request`; lets the requester ignore its own flag.
    pub requested_by: ProcessId,
}

impl Control {
    pub const EMPTY: Control = Control {
        owner: ProcessId::NONE,
        heartbeat: 0,
        takeover_request: false,
        requested_by: ProcessId::NONE,
    };

    /// A takeover request raised by someone other than `me`.
    pub fn foreign_request(&self, me: ProcessId) -> bool {
        self.takeover_request && self.requested_by != me
    }
}

/// The complete region contents at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub magic: u32,
    pub layout_version: u32,
    pub control: Control,
    pub game: GameState,
}

impl Snapshot {
    /// What a freshly stamped region decodes to.
    pub fn canonical() -> Self {
        Self {
            magic: REGION_MAGIC,
            layout_version: LAYOUT_VERSION,
            control: Control::EMPTY,
            game: GameState::default(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == REGION_MAGIC && self.layout_version == LAYOUT_VERSION
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

pub fn header_valid(buf: &[u8]) -> bool {
    get_u32(buf, MAGIC) == REGION_MAGIC && get_u32(buf, VERSION) == LAYOUT_VERSION
}

/// Zero everything, then stamp magic and version.
pub fn stamp_canonical(buf: &mut [u8]) {
    buf[..REGION_SIZE].fill(0);
    put_u32(buf, MAGIC, REGION_MAGIC);
    put_u32(buf, VERSION, LAYOUT_VERSION);
}

// ---------------------------------------------------------------------------
// Encoders
// ---------------------------------------------------------------------------

pub fn encode_control(buf: &mut [u8], control: &Control) {
    put_u32(buf, TAKEOVER_REQUEST, u32::from(control.takeover_request));
    put_u64(buf, OWNER, control.owner.raw());
    put_u64(buf, HEARTBEAT, control.heartbeat);
    put_u64(buf, REQUESTED_BY, control.requested_by.raw());
}

/// Bodies longer than the layout allows are truncated at the tail.
pub fn encode_simulation(buf: &mut [u8], game: &GameState) {
    let len = game.body.len().min(MAX_BODY_LEN);
    put_u32(buf, PHASE, game.phase.code());
    put_u32(buf, HEADING, game.heading.code());
    put_u32(buf, SCORE, game.score);
    put_u32(buf, HIGH_SCORE, game.high_score);
    put_u32(buf, BODY_LEN, len as u32);
    put_i32(buf, FOOD_X, game.food.x);
    put_i32(buf, FOOD_Y, game.food.y);
    put_u32(buf, GAMES_PLAYED, game.counters.games_played);
    put_u64(buf, FOOD_EATEN, game.counters.food_eaten);
    put_u32(buf, LONGEST_BODY, game.counters.longest_body);
    for (i, p) in game.body.iter().take(len).enumerate() {
        let at = BODY + i * POINT_SIZE;
        put_i32(buf, at, p.x);
        put_i32(buf, at + 4, p.y);
    }
}

/// Header, control and simulation; `write_seq` is left to the caller.
pub fn encode_snapshot(buf: &mut [u8], snapshot: &Snapshot) {
    put_u32(buf, MAGIC, snapshot.magic);
    put_u32(buf, VERSION, snapshot.layout_version);
    encode_control(buf, &snapshot.control);
    encode_simulation(buf, &snapshot.game);
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

pub fn decode_control(buf: &[u8]) -> Control {
    Control {
        owner: ProcessId::from_raw(get_u64(buf, OWNER)),
        heartbeat: get_u64(buf, HEARTBEAT),
        takeover_request: get_u32(buf, TAKEOVER_REQUEST) != 0,
        requested_by: ProcessId::from_raw(get_u64(buf, REQUESTED_BY)),
    }
}

pub fn decode_simulation(buf: &[u8]) -> GameState {
    let len = (get_u32(buf, BODY_LEN) as usize).min(MAX_BODY_LEN);
    let body = (0..len)
        .map(|i| {
            let at = BODY + i * POINT_SIZE;
            Point::new(get_i32(buf, at), get_i32(buf, at + 4))
        })
        .collect();

    GameState {
        // Unknown phase: treat as finished so a claimant resets.
        phase: Phase::from_code(get_u32(buf, PHASE)).unwrap_or(Phase::Over),
        heading: Heading::from_code(get_u32(buf, HEADING)).unwrap_or(Heading::Right),
        score: get_u32(buf, SCORE),
        high_score: get_u32(buf, HIGH_SCORE),
        body,
        food: Point::new(get_i32(buf, FOOD_X), get_i32(buf, FOOD_Y)),
        counters: Counters {
            games_played: get_u32(buf, GAMES_PLAYED),
            food_eaten: get_u64(buf, FOOD_EATEN),
            longest_body: get_u32(buf, LONGEST_BODY),
        },
    }
}

pub fn decode_snapshot(buf: &[u8]) -> Snapshot {
    Snapshot {
        magic: get_u32(buf, MAGIC),
        layout_version: get_u32(buf, VERSION),
        control: decode_control(buf),
        game: decode_simulation(buf),
    }
}

// ---------------------------------------------------------------------------
// Field access (private)
// ---------------------------------------------------------------------------

fn get_u32(buf: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(b)
}

fn get_i32(buf: &[u8], at: usize) -> i32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[at..at + 4]);
    i32::from_le_bytes(b)
}

fn get_u64(buf: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(b)
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_i32(buf: &mut [u8], at: usize, v: i32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut [u8], at: usize, v: u64) {
    buf[at..at + 8].copy_from_slice(&v.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> Vec<u8> {
        vec![0u8; REGION_SIZE]
    }

    #[test]
    fn region_size_matches_table() {
        assert_eq!(REGION_SIZE, 8088);
    }

    #[test]
    fn zeroed_buffer_is_not_valid_until_stamped() {
        let mut buf = blank();
        assert!(!header_valid(&buf));
        stamp_canonical(&mut buf);
        assert!(header_valid(&buf));
        assert_eq!(decode_snapshot(&buf), Snapshot::canonical());
    }

    #[test]
    fn control_write_leaves_simulation_alone() {
        let mut buf = blank();
        stamp_canonical(&mut buf);
        let game = GameState {
            score: 30,
            body: vec![Point::new(3, 3), Point::new(2, 3)],
            food: Point::new(7, 7),
            ..GameState::default()
        };
        encode_simulation(&mut buf, &game);
        encode_control(
            &mut buf,
            &Control {
                owner: ProcessId::from_raw(5),
                heartbeat: 12,
                takeover_request: true,
                requested_by: ProcessId::from_raw(5),
            },
        );
        let snap = decode_snapshot(&buf);
        assert_eq!(snap.game, game);
        assert_eq!(snap.control.heartbeat, 12);
        assert!(!snap.control.foreign_request(ProcessId::from_raw(5)));
        assert!(snap.control.foreign_request(ProcessId::from_raw(6)));
    }

    #[test]
    fn garbage_codes_decode_to_unresumable_values() {
        let mut buf = blank();
        stamp_canonical(&mut buf);
        put_u32(&mut buf, PHASE, 99);
        put_u32(&mut buf, HEADING, 42);
        put_u32(&mut buf, BODY_LEN, u32::MAX);
        let game = decode_simulation(&buf);
        assert_eq!(game.phase, Phase::Over);
        assert_eq!(game.heading, Heading::Right);
        assert_eq!(game.body.len(), MAX_BODY_LEN);
    }

    #[test]
    fn process_id_never_none() {
        let id = ProcessId::generate();
        assert!(!id.is_none());
        assert_eq!(id.raw() >> 32, u64::from(std::process::id()));
        assert_eq!(ProcessId::NONE.to_string(), "none");
    }
}
