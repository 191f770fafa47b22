//! Memory-mapped shared region.
//!
//! The only channel between the two processes. Writers bracket every
//! payload with an odd/even `write_seq`; readers retry a bounded number
//! of times and then accept whatever they copied. A torn read costs at
//! most one stale tick, which the next poll corrects.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::atomic::{fence, Ordering};

use memmap2::{Mmap, MmapMut, MmapOptions};
use snake_engine::domain::GameState;
use tracing::{debug, info, warn};

use crate::config::SizePolicy;
use crate::error::{Result, RuntimeError};
use crate::layout::{
    decode_control, decode_snapshot, encode_control, encode_simulation, encode_snapshot,
    header_valid, stamp_canonical, Control, Snapshot, REGION_SIZE, WRITE_SEQ,
};

/// Copies attempted before a read settles for a possibly torn one.
const READ_ATTEMPTS: usize = 8;

/// What `open` had to do to make the region usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenReport {
    /// Magic or version did not match; the region was zeroed and stamped.
    pub reinitialized: bool,
    /// The backing file was grown to fit the region.
    pub resized: bool,
}

pub struct SharedRegion {
    path: PathBuf,
    offset: u64,
    map: MmapMut,
    _file: File,
}

impl SharedRegion {
    /// Map `REGION_SIZE` bytes of `path` starting at `offset`.
    ///
    /// Regular files shorter than `offset + REGION_SIZE` are grown or
    /// rejected according to `policy`. Device files are mapped as is.
    pub fn open(path: &Path, offset: u64, policy: SizePolicy) -> Result<(Self, OpenReport)> {
        let mut report = OpenReport::default();

        let required = offset.checked_add(REGION_SIZE as u64).ok_or_else(|| {
            RuntimeError::InvalidConfig(format!("region offset {offset:#x} overflows"))
        })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| RuntimeError::io(path, e))?;

        let meta = file.metadata().map_err(|e| RuntimeError::io(path, e))?;
        if meta.is_file() && meta.len() < required {
            match policy {
                SizePolicy::Extend => {
                    file.set_len(required).map_err(|e| RuntimeError::io(path, e))?;
                    report.resized = true;
                    debug!(path = %path.display(), from = meta.len(), to = required, "backing file extended");
                }
                SizePolicy::Require => {
                    return Err(RuntimeError::RegionTooSmall {
                        path: path.to_path_buf(),
                        required,
                        actual: meta.len(),
                    });
                }
            }
        }

        // SAFETY: the mapping is shared with exactly one cooperating
        // process and is only ever viewed as plain bytes; no references
        // into it outlive a single encode/decode call.
        #[allow(unsafe_code)]
        let map = unsafe {
            MmapOptions::new()
                .offset(offset)
                .len(REGION_SIZE)
                .map_mut(&file)
        }
        .map_err(|e| RuntimeError::io(path, e))?;

        let mut region = Self {
            path: path.to_path_buf(),
            offset,
            map,
            _file: file,
        };

        if !header_valid(&region.map) {
            warn!(path = %path.display(), offset, "region header invalid, reinitializing");
            region.reinitialize()?;
            report.reinitialized = true;
        }

        info!(
            path = %path.display(),
            offset,
            reinitialized = report.reinitialized,
            resized = report.resized,
            "shared region mapped"
        );
        Ok((region, report))
    }

    /// Read-only view for diagnostics. Never creates, grows or
    /// reinitializes anything; an invalid header is returned as found.
    pub fn peek(path: &Path, offset: u64) -> Result<Snapshot> {
        let required = offset.checked_add(REGION_SIZE as u64).ok_or_else(|| {
            RuntimeError::InvalidConfig(format!("region offset {offset:#x} overflows"))
        })?;
        let file = File::open(path).map_err(|e| RuntimeError::io(path, e))?;
        let meta = file.metadata().map_err(|e| RuntimeError::io(path, e))?;
        if meta.is_file() && meta.len() < required {
            return Err(RuntimeError::RegionTooSmall {
                path: path.to_path_buf(),
                required,
                actual: meta.len(),
            });
        }

        // SAFETY: read-only mapping, copied out before it is dropped.
        #[allow(unsafe_code)]
        let map: Mmap = unsafe {
            MmapOptions::new()
                .offset(offset)
                .len(REGION_SIZE)
                .map(&file)
        }
        .map_err(|e| RuntimeError::io(path, e))?;
        Ok(decode_snapshot(&stable_copy(&map)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Zero-fill, stamp magic and version, sync.
    pub fn reinitialize(&mut self) -> Result<()> {
        stamp_canonical(&mut self.map);
        self.sync()
    }

    pub fn read(&self) -> Snapshot {
        decode_snapshot(&stable_copy(&self.map))
    }

    pub fn read_control(&self) -> Control {
        decode_control(&stable_copy(&self.map))
    }

    /// Header, control and simulation in one bracketed write.
    pub fn write(&mut self, snapshot: &Snapshot) {
        let seq = self.begin_write();
        encode_snapshot(&mut self.map, snapshot);
        self.end_write(seq);
    }

    pub fn write_control(&mut self, control: &Control) {
        let seq = self.begin_write();
        encode_control(&mut self.map, control);
        self.end_write(seq);
    }

    pub fn write_simulation(&mut self, game: &GameState) {
        let seq = self.begin_write();
        encode_simulation(&mut self.map, game);
        self.end_write(seq);
    }

    /// Flush the region's bytes so the other side never acts on cached
    /// data.
    pub fn sync(&self) -> Result<()> {
        self.map
            .flush_range(0, REGION_SIZE)
            .map_err(|e| RuntimeError::io(&self.path, e))
    }

    // ── Seqlock ────────────────────────────────────────────────────

    fn begin_write(&mut self) -> u32 {
        let seq = load_seq(&self.map) | 1;
        store_seq(&mut self.map, seq);
        fence(Ordering::Release);
        seq
    }

    fn end_write(&mut self, seq: u32) {
        fence(Ordering::Release);
        store_seq(&mut self.map, seq.wrapping_add(1));
    }
}

fn stable_copy(map: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; REGION_SIZE];
    for attempt in 0..READ_ATTEMPTS {
        let before = load_seq(map);
        fence(Ordering::Acquire);
        buf.copy_from_slice(&map[..REGION_SIZE]);
        fence(Ordering::Acquire);
        let after = load_seq(map);
        if before & 1 == 0 && before == after {
            return buf;
        }
        debug!(attempt, before, after, "region read raced a write");
    }
    buf
}

// The seq word may sit at an unaligned address once the region is
// mapped at an arbitrary offset, so it is moved byte by byte.

#[allow(unsafe_code)]
fn load_seq(map: &[u8]) -> u32 {
    debug_assert!(map.len() >= WRITE_SEQ + 4);
    let base = map.as_ptr();
    let mut bytes = [0u8; 4];
    for (i, b) in bytes.iter_mut().enumerate() {
        // SAFETY: callers pass a full region; WRITE_SEQ + 4 <= REGION_SIZE.
        *b = unsafe { ptr::read_volatile(base.add(WRITE_SEQ + i)) };
    }
    u32::from_le_bytes(bytes)
}

#[allow(unsafe_code)]
fn store_seq(map: &mut MmapMut, seq: u32) {
    let base = map.as_mut_ptr();
    for (i, b) in seq.to_le_bytes().into_iter().enumerate() {
        // SAFETY: WRITE_SEQ + 4 <= REGION_SIZE == map.len().
        unsafe { ptr::write_volatile(base.add(WRITE_SEQ + i), b) };
    }
}
