// hierarchy.rs
//
// The thin orchestrator that wires two `Cache` levels and one L2 stride
// prefetcher together: route each access L1-first, replay misses against
// L2, tally statistics, and advance both logical clocks once per access.

use crate::cache::{Cache, Geometry, Outcome, StridePrefetcher};
use crate::errors::SimulatorError;
use crate::stats::Stats;
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Read,
    Write,
}

impl Op {
    fn from_char(c: char) -> Result<Self, SimulatorError> {
        match c {
            'r' => Ok(Op::Read),
            'w' => Ok(Op::Write),
            other => Err(SimulatorError::InvalidOp(other)),
        }
    }
}

/// Which level a tally applies to; only used to pick the right counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    L1,
    L2,
}

pub struct CacheHierarchy {
    l1: Cache,
    l2: Cache,
    prefetcher: StridePrefetcher,
    stats: Stats,
    s1: u32,
    s2: u32,
}

impl CacheHierarchy {
    /// Constructs both cache levels and zeroes the statistics record.
    /// Preconditions (`b + s <= c` for each level) are enforced by
    /// `Geometry::new`; failure here leaves no partial state.
    pub fn setup(
        c1: u32,
        b1: u32,
        s1: u32,
        c2: u32,
        b2: u32,
        s2: u32,
        k: u32,
    ) -> Result<Self, SimulatorError> {
        let g1 = Geometry::new(c1, b1, s1)?;
        let g2 = Geometry::new(c2, b2, s2)?;
        Ok(Self {
            l1: Cache::new(g1),
            l2: Cache::new(g2),
            prefetcher: StridePrefetcher::new(k, b2),
            stats: Stats::new(),
            s1,
            s2,
        })
    }

    /// Applies the level/outcome tally matching the reference simulator's
    /// `tally` routine: `L1_accesses` only increments once per access (at
    /// level 1); a non-hit bumps the level's read/write miss counter; a
    /// `WriteBack` at L2 additionally bumps `write_backs`; a
    /// `PrefetchHit` anywhere bumps `successful_prefetches`.
    fn tally(&mut self, status: Outcome, level: Level, op: Op) {
        if level == Level::L1 {
            self.stats.l1_accesses += 1;
        }

        if status.is_hit() {
            if status == Outcome::PrefetchHit {
                self.stats.successful_prefetches += 1;
            }
            return;
        }

        match (level, op) {
            (Level::L1, Op::Read) => self.stats.l1_read_misses += 1,
            (Level::L1, Op::Write) => self.stats.l1_write_misses += 1,
            (Level::L2, Op::Read) => self.stats.l2_read_misses += 1,
            (Level::L2, Op::Write) => self.stats.l2_write_misses += 1,
        }

        if status == Outcome::WriteBack && level == Level::L2 {
            self.stats.write_backs += 1;
        }
    }

    /// Routes one trace event through L1, replaying against L2 on any
    /// non-hit, and arms the L2 stride prefetcher whenever L2 itself
    /// misses the demand access.
    pub fn access(&mut self, op: char, address: u64) -> Result<(), SimulatorError> {
        let op = Op::from_char(op)?;

        match op {
            Op::Read => self.stats.reads += 1,
            Op::Write => self.stats.writes += 1,
        }

        let status1 = match op {
            Op::Read => self.l1.read(address),
            Op::Write => self.l1.write(address),
        };
        self.tally(status1, Level::L1, op);

        if !status1.is_hit() {
            if status1 == Outcome::WriteBack {
                let evicted = self.l1.last_writeback_addr();
                let wb_status = self.l2.write(evicted);
                self.tally(wb_status, Level::L2, Op::Write);
            }

            let status2 = match op {
                Op::Read => self.l2.read(address),
                Op::Write => self.l2.write(address),
            };
            self.tally(status2, Level::L2, op);

            if !status2.is_hit() {
                let result = self.prefetcher.execute_prefetch(&mut self.l2, address);
                self.stats.prefetched_blocks += result.prefetched_blocks;
                self.stats.write_backs += result.write_backs;
            }

            trace!("access op={:?} addr={:#x} l1={:?} l2={:?}", op, address, status1, status2);
        }

        self.l1.tick();
        self.l2.tick();
        Ok(())
    }

    /// Finalizes AMAT and hands back the accumulated statistics. Consumes
    /// the hierarchy, so a second `complete` is a compile-time error
    /// rather than a runtime usage fault.
    pub fn complete(mut self) -> Stats {
        self.stats.finalize(self.s1, self.s2);
        self.stats
    }

    /// The reference configuration's defaults (C1=12,B1=5,S1=3;
    /// C2=15,B2=6,S2=5; K=2).
    pub fn default_config() -> (u32, u32, u32, u32, u32, u32, u32) {
        (12, 5, 3, 15, 6, 5, 2)
    }
}
