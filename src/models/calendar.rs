//! Weekly time grid and the institutional time-slot catalog.
//!
//! # Time Model
//! A week has 7 weekdays (1 = Monday .. 7 = Sunday), each divided into
//! [`SLOTS_PER_DAY`] teaching units numbered from 1. A session of duration
//! `d` starting at slot `s` occupies slots `s..=s + d - 1`.
//!
//! # Catalog
//! Sessions may not start anywhere: the timetable only allows a fixed,
//! duration-dependent set of contiguous blocks. One weekday afternoon is
//! reserved institution-wide and rejects every placement.
//!
//! | Duration | Legal blocks |
//! |----------|--------------|
//! | 2 | 1-2, 3-4, 6-7, 9-10, 11-12 |
//! | 3 | 3-5, 6-8, 11-13 |
//! | 4 | 1-4, 6-9 |

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of teaching units in one day.
pub const SLOTS_PER_DAY: u8 = 13;

/// Weekdays sampled by the search (Monday to Friday).
pub const TEACHING_WEEKDAYS: [u8; 5] = [1, 2, 3, 4, 5];

/// Last slot of the morning period.
const MORNING_END: u8 = 5;
/// Last slot of the afternoon period.
const AFTERNOON_END: u8 = 10;
/// Last start slot still counted as prime daytime for electives.
const PRIME_TIME_END: u8 = 8;

/// One occupied `(weekday, slot)` cell of the weekly grid.
pub type Cell = (u8, u8);

/// Expands a placement into the cells it occupies.
pub fn cells(weekday: u8, start_slot: u8, duration: u8) -> impl Iterator<Item = Cell> {
    (start_slot..start_slot.saturating_add(duration)).map(move |slot| (weekday, slot))
}

/// A contiguous block of slots `[start, end]` (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeBlock {
    /// First slot (inclusive).
    pub start: u8,
    /// Last slot (inclusive).
    pub end: u8,
}

impl TimeBlock {
    /// Creates a block.
    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    /// Creates the block a session of `duration` occupies from `start`.
    pub fn starting_at(start: u8, duration: u8) -> Self {
        Self::new(start, start + duration.saturating_sub(1))
    }

    /// Number of slots in the block.
    #[inline]
    pub fn len(&self) -> u8 {
        self.end + 1 - self.start
    }

    /// Whether the block contains a slot.
    #[inline]
    pub fn contains(&self, slot: u8) -> bool {
        slot >= self.start && slot <= self.end
    }

    /// Whether two blocks share at least one slot.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// A weekday-bound slot range, used for blackouts and teacher preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotWindow {
    /// Weekday (1-7).
    pub weekday: u8,
    /// First slot (inclusive).
    pub start_slot: u8,
    /// Last slot (inclusive).
    pub end_slot: u8,
}

impl SlotWindow {
    /// Creates a window.
    pub fn new(weekday: u8, start_slot: u8, end_slot: u8) -> Self {
        Self {
            weekday,
            start_slot,
            end_slot,
        }
    }

    /// The window's slot range as a block.
    pub fn block(&self) -> TimeBlock {
        TimeBlock::new(self.start_slot, self.end_slot)
    }

    /// Whether a single cell falls inside the window.
    pub fn contains(&self, weekday: u8, slot: u8) -> bool {
        weekday == self.weekday && slot >= self.start_slot && slot <= self.end_slot
    }

    /// Whether a placement shares any cell with the window.
    pub fn overlaps(&self, weekday: u8, block: TimeBlock) -> bool {
        weekday == self.weekday && self.block().overlaps(&block)
    }

    /// Whether a placement lies entirely inside the window.
    pub fn covers(&self, weekday: u8, block: TimeBlock) -> bool {
        weekday == self.weekday && block.start >= self.start_slot && block.end <= self.end_slot
    }
}

/// Half-day period used for commute grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayPeriod {
    /// Slots 1-5.
    Morning,
    /// Slots 6-10.
    Afternoon,
    /// Slots 11-13.
    Evening,
}

impl DayPeriod {
    /// Period a start slot belongs to.
    pub fn of_slot(slot: u8) -> Self {
        if slot <= MORNING_END {
            Self::Morning
        } else if slot <= AFTERNOON_END {
            Self::Afternoon
        } else {
            Self::Evening
        }
    }
}

/// Institution-wide reserved window: every start at or after `from_slot`
/// on `weekday` is off-limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictedWindow {
    /// Reserved weekday.
    pub weekday: u8,
    /// First reserved start slot.
    pub from_slot: u8,
}

impl Default for RestrictedWindow {
    /// Thursday afternoon.
    fn default() -> Self {
        Self {
            weekday: 4,
            from_slot: 6,
        }
    }
}

const BLOCKS_2: [TimeBlock; 5] = [
    TimeBlock::new(1, 2),
    TimeBlock::new(3, 4),
    TimeBlock::new(6, 7),
    TimeBlock::new(9, 10),
    TimeBlock::new(11, 12),
];

const BLOCKS_3: [TimeBlock; 3] = [
    TimeBlock::new(3, 5),
    TimeBlock::new(6, 8),
    TimeBlock::new(11, 13),
];

const BLOCKS_4: [TimeBlock; 2] = [TimeBlock::new(1, 4), TimeBlock::new(6, 9)];

/// Lookup table of legal blocks plus the reserved window.
///
/// # Example
/// ```
/// use u_timetable::models::TimeSlotCatalog;
///
/// let catalog = TimeSlotCatalog::standard();
/// assert_eq!(catalog.valid_blocks(4).unwrap().len(), 2);
/// assert!(catalog.is_restricted(4, 6));
/// assert!(catalog.valid_blocks(5).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotCatalog {
    /// Reserved window.
    pub restricted: RestrictedWindow,
}

impl TimeSlotCatalog {
    /// The institutional catalog (Thursday afternoon reserved).
    pub fn standard() -> Self {
        Self::default()
    }

    /// Durations with a legal block table.
    pub fn supported_durations() -> [u8; 3] {
        [2, 3, 4]
    }

    /// Legal blocks for a duration.
    ///
    /// Two-unit sessions may also take the front half of a three-unit block.
    ///
    /// # Errors
    /// [`Error::UnsupportedDuration`] for any duration outside the table.
    pub fn valid_blocks(&self, duration: u8) -> Result<&'static [TimeBlock]> {
        match duration {
            2 => Ok(&BLOCKS_2),
            3 => Ok(&BLOCKS_3),
            4 => Ok(&BLOCKS_4),
            other => Err(Error::UnsupportedDuration(other)),
        }
    }

    /// Whether a start falls in the reserved window.
    #[inline]
    pub fn is_restricted(&self, weekday: u8, start_slot: u8) -> bool {
        weekday == self.restricted.weekday && start_slot >= self.restricted.from_slot
    }

    /// Legal blocks that may be used on a specific weekday.
    pub fn blocks_on(&self, weekday: u8, duration: u8) -> Result<Vec<TimeBlock>> {
        Ok(self
            .valid_blocks(duration)?
            .iter()
            .copied()
            .filter(|b| !self.is_restricted(weekday, b.start))
            .collect())
    }

    /// Whether a placement is legal for the duration on that weekday.
    pub fn is_legal(&self, weekday: u8, start_slot: u8, duration: u8) -> bool {
        !self.is_restricted(weekday, start_slot)
            && self
                .valid_blocks(duration)
                .map(|blocks| blocks.iter().any(|b| b.start == start_slot))
                .unwrap_or(false)
    }

    /// Daytime blocks (start before the evening period).
    pub fn is_daytime(start_slot: u8) -> bool {
        start_slot <= AFTERNOON_END
    }

    /// Evening placement (slots 11-13).
    pub fn is_evening(start_slot: u8) -> bool {
        start_slot > AFTERNOON_END
    }

    /// Morning and early-afternoon prime time.
    pub fn is_prime_time(start_slot: u8) -> bool {
        start_slot <= PRIME_TIME_END
    }

    /// Saturday or Sunday.
    pub fn is_weekend(weekday: u8) -> bool {
        weekday >= 6
    }
}
