//! Windowed replay of a table as a paced live feed.
//!
//! A replay walks a table snapshot in fixed-size, contiguous windows:
//! window `i` covers rows `[i * chunk_size, min((i + 1) * chunk_size, len))`.
//! The windows partition the table exactly and come out in row order. Between
//! two windows the replay pauses for the configured delay; the first window is
//! available immediately and nothing waits after the last one.
//!
//! ```rust
//! use epiwatch::replay::ReplayEngine;
//! use epiwatch::{ReplayConfig, Table};
//! use std::time::Duration;
//!
//! let engine = ReplayEngine::new(ReplayConfig::new(10, Duration::ZERO))?;
//! let table = Table::empty();
//! assert_eq!(engine.replay(&table).count(), 0);
//!
//! // A zero chunk size is rejected up front
//! assert!(ReplayEngine::new(ReplayConfig::new(0, Duration::ZERO)).is_err());
//! # Ok::<(), epiwatch::EpiError>(())
//! ```

mod cancel;

pub use cancel::CancelToken;

use crate::aggregate::window_summary;
use crate::config::ReplayConfig;
use crate::error::{EpiError, Result};
use crate::table::Table;
use epiwatch_types::record::CaseRecord;
use epiwatch_types::summary::RegionCases;
use std::iter::FusedIterator;
use std::time::Duration;

/// A contiguous run of rows delivered as one unit.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    index: usize,
    offset: usize,
    rows: &'a [CaseRecord],
}

impl<'a> Window<'a> {
    /// Position of this window in the sequence, starting at zero.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Index of the window's first row in the replayed table.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rows(&self) -> &'a [CaseRecord] {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// New cases per region within this window.
    pub fn summary(&self) -> Vec<RegionCases> {
        window_summary(self.rows)
    }
}

/// Validated replay settings; hands out one [`Replay`] per invocation.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    chunk_size: usize,
    delay: Duration,
}

impl ReplayEngine {
    /// Fails with [`EpiError::InvalidConfiguration`] if the chunk size is zero.
    pub fn new(config: ReplayConfig) -> Result<Self> {
        config.validate().map_err(EpiError::InvalidConfiguration)?;
        Ok(Self {
            chunk_size: config.chunk_size,
            delay: config.delay(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start a replay that runs to exhaustion.
    pub fn replay<'a>(&self, table: &'a Table) -> Replay<'a> {
        self.replay_until(table, CancelToken::new())
    }

    /// Start a replay that stops early once `cancel` fires.
    pub fn replay_until<'a>(&self, table: &'a Table, cancel: CancelToken) -> Replay<'a> {
        log::debug!(
            "Starting replay of {} rows in windows of {} ({:?} apart)",
            table.len(),
            self.chunk_size,
            self.delay
        );
        Replay {
            rows: table.rows(),
            chunk_size: self.chunk_size,
            delay: self.delay,
            cursor: 0,
            next_index: 0,
            cancel,
        }
    }
}

/// Split `table` into windows of `chunk_size` rows without pacing.
pub fn windows(table: &Table, chunk_size: usize) -> Result<Replay<'_>> {
    let engine = ReplayEngine::new(ReplayConfig::new(chunk_size, Duration::ZERO))?;
    Ok(engine.replay(table))
}

/// An in-progress replay. Owns its cursor; not restartable.
#[derive(Debug)]
pub struct Replay<'a> {
    rows: &'a [CaseRecord],
    chunk_size: usize,
    delay: Duration,
    cursor: usize,
    next_index: usize,
    cancel: CancelToken,
}

impl<'a> Replay<'a> {
    /// Offset of the first row of the next window.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.rows.len() && !self.cancel.is_cancelled()
    }

    /// Total windows the table splits into: `ceil(len / chunk_size)`.
    pub fn window_count(&self) -> usize {
        self.rows.len().div_ceil(self.chunk_size)
    }

    /// Windows not yet produced, assuming no cancellation.
    pub fn remaining(&self) -> usize {
        (self.rows.len() - self.cursor).div_ceil(self.chunk_size)
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn stop(&mut self) {
        log::debug!(
            "Replay cancelled after {} of {} windows",
            self.next_index,
            self.window_count()
        );
        self.cursor = self.rows.len();
    }
}

impl<'a> Iterator for Replay<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Window<'a>> {
        if self.cursor >= self.rows.len() {
            return None;
        }

        let cancelled = if self.next_index == 0 {
            self.cancel.is_cancelled()
        } else {
            self.cancel.sleep(self.delay)
        };
        if cancelled {
            self.stop();
            return None;
        }

        let start = self.cursor;
        let end = start.saturating_add(self.chunk_size).min(self.rows.len());
        let window = Window {
            index: self.next_index,
            offset: start,
            rows: &self.rows[start..end],
        };

        self.cursor = end;
        self.next_index += 1;
        log::debug!(
            "Replay window {} ({} rows at offset {})",
            window.index,
            window.len(),
            window.offset
        );
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl FusedIterator for Replay<'_> {}
