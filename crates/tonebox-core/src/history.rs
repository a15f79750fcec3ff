use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::spec::FilterSpec;

/// Maximum number of committed entries kept per image.
pub const HISTORY_CAPACITY: usize = 20;

/// Operation class of an incoming command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Live edit: lands in the scratch slot only.
    Cached,
    /// Confirmed edit: commits scratch (if any) and then the payload.
    Preview,
    Undo,
    Redo,
    Reset,
    /// Export of every rendered preview.
    Final,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Preview => "preview",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Reset => "reset",
            Self::Final => "final",
        }
    }

    /// Every mode except `cached` reads from committed history.
    pub fn is_committed(&self) -> bool {
        !matches!(self, Self::Cached)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cached" => Ok(Self::Cached),
            "preview" => Ok(Self::Preview),
            "undo" => Ok(Self::Undo),
            "redo" => Ok(Self::Redo),
            "reset" => Ok(Self::Reset),
            "final" => Ok(Self::Final),
            other => Err(CoreError::InvalidMode(other.to_string())),
        }
    }
}

/// Bounded undo/redo history of filter specs for one image, plus a single
/// scratch slot for an edit that has not been committed yet.
///
/// Entries live in a fixed ring of [`HISTORY_CAPACITY`] slots. Logical index 0
/// is the oldest entry; appending to a full ring drops it. The cursor is a
/// logical index and is `None` exactly when the history is empty.
#[derive(Debug, Clone, Default)]
pub struct FilterHistory {
    slots: [Option<FilterSpec>; HISTORY_CAPACITY],
    head: usize,
    len: usize,
    cursor: Option<usize>,
    scratch: Option<FilterSpec>,
}

impl FilterHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `spec` according to `mode`. Returns false when nothing changed:
    /// an empty spec, or a mode that does not push.
    pub fn push(&mut self, spec: FilterSpec, mode: Mode) -> bool {
        if spec.is_empty() {
            debug!(%mode, "ignoring empty filter spec");
            return false;
        }

        match mode {
            Mode::Cached => {
                self.scratch = Some(spec);
                debug!(len = self.len, "scratch slot replaced");
                true
            }
            Mode::Preview => {
                self.truncate_after_cursor();
                if let Some(pending) = self.scratch.take() {
                    self.append(pending);
                }
                self.append(spec);
                self.cursor = self.len.checked_sub(1);
                debug!(len = self.len, cursor = ?self.cursor, "filter spec committed");
                true
            }
            Mode::Undo | Mode::Redo | Mode::Reset | Mode::Final => {
                debug!(%mode, "mode does not push");
                false
            }
        }
    }

    /// Step the cursor back one entry and return it. `None` when the cursor
    /// already sits on the oldest entry or the history is empty.
    pub fn undo(&mut self) -> Option<&FilterSpec> {
        let current = self.cursor?;
        if current == 0 {
            debug!("nothing to undo");
            return None;
        }
        self.cursor = Some(current - 1);
        debug!(cursor = current - 1, "undo");
        self.get(current - 1)
    }

    /// Step the cursor forward one entry and return it. `None` at the tail.
    pub fn redo(&mut self) -> Option<&FilterSpec> {
        let current = self.cursor?;
        if current + 1 >= self.len {
            debug!("nothing to redo");
            return None;
        }
        self.cursor = Some(current + 1);
        debug!(cursor = current + 1, "redo");
        self.get(current + 1)
    }

    /// Drop every entry and the scratch slot.
    pub fn reset(&mut self) {
        *self = Self::default();
        debug!("history reset");
    }

    /// The filter spec the pipeline should render under `mode`.
    pub fn active_spec(&self, mode: Mode) -> Result<&FilterSpec> {
        if !mode.is_committed() {
            return self.scratch.as_ref().ok_or(CoreError::EmptyScratch);
        }
        self.cursor
            .and_then(|c| self.get(c))
            .ok_or(CoreError::EmptyHistory { mode })
    }

    /// Committed entry at logical `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&FilterSpec> {
        if index >= self.len {
            return None;
        }
        self.slots[self.physical(index)].as_ref()
    }

    /// Committed entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &FilterSpec> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Cursor as a signed index, -1 when empty.
    pub fn index(&self) -> isize {
        self.cursor.map_or(-1, |c| c as isize)
    }

    pub fn scratch(&self) -> Option<&FilterSpec> {
        self.scratch.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.len)
    }

    fn physical(&self, index: usize) -> usize {
        (self.head + index) % HISTORY_CAPACITY
    }

    fn append(&mut self, spec: FilterSpec) {
        if self.len == HISTORY_CAPACITY {
            self.slots[self.head] = None;
            self.head = (self.head + 1) % HISTORY_CAPACITY;
            self.len -= 1;
            self.cursor = self.cursor.and_then(|c| c.checked_sub(1));
            debug!("evicted oldest history entry");
        }
        let slot = self.physical(self.len);
        self.slots[slot] = Some(spec);
        self.len += 1;
    }

    fn truncate_after_cursor(&mut self) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        for index in keep..self.len {
            let slot = self.physical(index);
            self.slots[slot] = None;
        }
        self.len = keep.min(self.len);
    }
}
