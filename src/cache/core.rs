// core.rs
//
// The set-associative write-back/write-allocate cache: one `Cache` per
// hierarchy level, holding its own line array, LRU clock and write-back
// scratch slot.

use super::geometry::Geometry;
use super::line::CacheLine;
use crate::errors::SimulatorError;
use log::trace;

/// Result of a single `read`/`write`/`prefetch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit,
    PrefetchHit,
    Miss,
    WriteBack,
}

impl Outcome {
    pub fn is_hit(self) -> bool {
        matches!(self, Outcome::Hit | Outcome::PrefetchHit)
    }
}

/// One set-associative, write-back/write-allocate cache level.
pub struct Cache {
    pub geometry: Geometry,
    lines: Vec<CacheLine>,
    clock: u64,
    /// Block address of the most recently evicted dirty line; consumed by
    /// the hierarchy orchestrator immediately after a `WriteBack` outcome.
    last_writeback_addr: u64,
}

impl Cache {
    pub fn new(geometry: Geometry) -> Self {
        let lines = vec![CacheLine::new(); (geometry.lines) as usize];
        // clock starts at 1, not 0: invalid lines carry the last_access=0
        // sentinel, and a real install must never collide with it or LRU
        // tie-breaking could evict a valid line ahead of an empty way.
        Self { geometry, lines, clock: 1, last_writeback_addr: 0 }
    }

    pub fn with_geometry(c: u32, b: u32, s: u32) -> Result<Self, SimulatorError> {
        Ok(Self::new(Geometry::new(c, b, s)?))
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Advances the logical clock. Called by the orchestrator exactly once
    /// per `access`, after both cache levels have finished mutating.
    pub fn tick(&mut self) {
        self.clock += 1;
    }

    /// Block address reconstructed on the most recent `WriteBack` outcome.
    pub fn last_writeback_addr(&self) -> u64 {
        self.last_writeback_addr
    }

    /// Read-only access to a line by its flat array offset, for tests and
    /// external structural checks (e.g. scanning a set for duplicate tags).
    pub fn line_at(&self, offset: usize) -> Option<&CacheLine> {
        self.lines.get(offset)
    }

    fn set_range(&self, index: u64) -> impl Iterator<Item = usize> + '_ {
        (0..self.geometry.ways).map(move |way| self.geometry.line_offset(way, index))
    }

    fn find_hit(&self, index: u64, tag: u64) -> Option<usize> {
        self.set_range(index).find(|&off| self.lines[off].valid && self.lines[off].tag == tag)
    }

    /// Smallest `last_access` in the set, tie-broken by lowest way index.
    fn find_victim(&self, index: u64) -> usize {
        self.set_range(index)
            .min_by_key(|&off| self.lines[off].last_access)
            .expect("geometry guarantees at least one way")
    }

    fn min_last_access_in_set(&self, index: u64) -> u64 {
        self.set_range(index).map(|off| self.lines[off].last_access).min().unwrap_or(0)
    }

    fn evict_if_dirty(&mut self, victim: usize, index: u64) -> Option<Outcome> {
        if self.lines[victim].valid && self.lines[victim].dirty {
            self.last_writeback_addr = self.geometry.block_address(self.lines[victim].tag, index);
            Some(Outcome::WriteBack)
        } else {
            None
        }
    }

    /// Shared hit/miss scan used by `read` and `write`. `dirty_on_install`
    /// controls whether the freshly installed line starts dirty (a demand
    /// write-miss is itself the store that dirties the block).
    fn demand_access(&mut self, address: u64, is_write: bool, dirty_on_install: bool) -> Outcome {
        let (tag, index) = self.geometry.decode(address);

        if let Some(off) = self.find_hit(index, tag) {
            self.lines[off].last_access = self.clock;
            if is_write {
                self.lines[off].dirty = true;
            }
            if self.lines[off].prefetched {
                self.lines[off].prefetched = false;
                return Outcome::PrefetchHit;
            }
            return Outcome::Hit;
        }

        let victim = self.find_victim(index);
        let outcome = self.evict_if_dirty(victim, index).unwrap_or(Outcome::Miss);

        self.lines[victim] = CacheLine {
            tag,
            valid: true,
            dirty: dirty_on_install,
            prefetched: false,
            last_access: self.clock,
        };
        trace!(
            "install tag={:#x} index={} dirty={} outcome={:?}",
            tag,
            index,
            dirty_on_install,
            outcome
        );
        outcome
    }

    /// Demand load. A hit does not change dirty state; an install leaves
    /// the line clean (the fetched block matches the next level).
    pub fn read(&mut self, address: u64) -> Outcome {
        self.demand_access(address, false, false)
    }

    /// Demand store. Write-allocate: the install that follows a miss marks
    /// the line dirty immediately, since the very access that missed is a
    /// store (see SPEC_FULL's resolution of the source's open question).
    pub fn write(&mut self, address: u64) -> Outcome {
        self.demand_access(address, true, true)
    }

    /// Speculative fetch. A tag hit never disturbs LRU state (no clock
    /// update, no `prefetched` clear) so a prefetch of an already-resident
    /// line cannot promote it to MRU. A miss/eviction installs the line as
    /// `prefetched`, demoted below every other line in the set so it is
    /// the first candidate re-evicted if never demand-hit.
    pub fn prefetch(&mut self, address: u64) -> Outcome {
        let (tag, index) = self.geometry.decode(address);

        if self.find_hit(index, tag).is_some() {
            return Outcome::Hit;
        }

        let victim = self.find_victim(index);
        let outcome = self.evict_if_dirty(victim, index).unwrap_or(Outcome::Miss);

        let min_in_set = self.min_last_access_in_set(index);
        let demoted = min_in_set.checked_sub(1).unwrap_or(0);

        self.lines[victim] =
            CacheLine { tag, valid: true, dirty: false, prefetched: true, last_access: demoted };
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_mapped() -> Cache {
        // C=3,B=1,S=0 -> 4 lines, direct-mapped, 2-byte blocks.
        Cache::with_geometry(3, 1, 0).unwrap()
    }

    #[test]
    fn scenario_1_repeat_read_hits() {
        let mut c = direct_mapped();
        assert_eq!(c.read(0x00), Outcome::Miss);
        c.tick();
        assert_eq!(c.read(0x00), Outcome::Hit);
    }

    #[test]
    fn scenario_2_same_index_clean_eviction() {
        let mut c = direct_mapped();
        assert_eq!(c.read(0x00), Outcome::Miss);
        c.tick();
        assert_eq!(c.read(0x08), Outcome::Miss);
    }

    #[test]
    fn scenario_3_dirty_victim_writeback() {
        let mut c = direct_mapped();
        assert_eq!(c.write(0x00), Outcome::Miss);
        c.tick();
        assert_eq!(c.read(0x08), Outcome::WriteBack);
        assert_eq!(c.last_writeback_addr(), 0x00);
    }

    #[test]
    fn scenario_4_two_way_no_eviction() {
        // C=4,B=1,S=1 -> 8 lines, 4 sets, 2 ways.
        let mut c = Cache::with_geometry(4, 1, 1).unwrap();
        assert_eq!(c.read(0x00), Outcome::Miss);
        c.tick();
        assert_eq!(c.read(0x08), Outcome::Miss);
        c.tick();
        assert_eq!(c.read(0x00), Outcome::Hit);
    }

    #[test]
    fn prefetch_hit_does_not_clear_flag_or_disturb_lru() {
        let mut c = direct_mapped();
        assert_eq!(c.prefetch(0x00), Outcome::Miss);
        c.tick();
        // A second prefetch of the same line is a Hit and must not clear
        // `prefetched` or touch `last_access`.
        assert_eq!(c.prefetch(0x00), Outcome::Hit);
        c.tick();
        // The eventual demand read still sees the prefetched flag.
        assert_eq!(c.read(0x00), Outcome::PrefetchHit);
    }

    #[test]
    fn prefetch_hit_on_demand_line_is_plain_hit_next_time() {
        let mut c = direct_mapped();
        assert_eq!(c.prefetch(0x00), Outcome::Miss);
        c.tick();
        assert_eq!(c.read(0x00), Outcome::PrefetchHit);
        c.tick();
        assert_eq!(c.read(0x00), Outcome::Hit);
    }

    #[test]
    fn write_then_read_is_hit_and_dirty() {
        let mut c = direct_mapped();
        assert_eq!(c.write(0x00), Outcome::Miss);
        c.tick();
        assert_eq!(c.read(0x00), Outcome::Hit);
    }

    #[test]
    fn no_duplicate_tags_within_a_set() {
        let mut c = Cache::with_geometry(4, 1, 1).unwrap();
        for addr in [0x00u64, 0x08, 0x10, 0x18] {
            c.read(addr);
            c.tick();
        }
        // index 0's set now holds at most `ways` distinct tags.
        let (_, index) = c.geometry.decode(0x00);
        let tags: Vec<u64> = (0..c.geometry.ways)
            .map(|w| c.geometry.line_offset(w, index))
            .filter(|&off| c.lines[off].valid)
            .map(|off| c.lines[off].tag)
            .collect();
        let mut unique = tags.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(tags.len(), unique.len());
    }
}
