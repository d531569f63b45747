// prefetcher.rs
//
// Per-cache stride prefetcher: watches consecutive miss addresses, confirms
// a repeating block-stride, and issues `k` prefetches on confirmation.

use super::core::{Cache, Outcome};
use log::debug;

/// Outcome of one `execute_prefetch` call, folded back into the
/// hierarchy's statistics by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchResult {
    /// Prefetches that were not already present (Miss or WriteBack).
    pub prefetched_blocks: u64,
    /// Write-backs caused by those prefetches evicting dirty lines.
    pub write_backs: u64,
}

pub struct StridePrefetcher {
    k: u32,
    pending_stride: i64,
    last_miss_addr: u64,
    block_mask: u64,
}

impl StridePrefetcher {
    pub fn new(k: u32, block_bits: u32) -> Self {
        let block_mask = !((1u64 << block_bits).wrapping_sub(1));
        Self { k, pending_stride: 0, last_miss_addr: 0, block_mask }
    }

    /// Runs the stride state machine against `trigger_addr` (the address of
    /// a demand access that just missed or wrote back at this cache level),
    /// issuing prefetches into `cache` on stride confirmation.
    pub fn execute_prefetch(&mut self, cache: &mut Cache, trigger_addr: u64) -> PrefetchResult {
        let block = trigger_addr & self.block_mask;
        let delta = (block as i64).wrapping_sub(self.last_miss_addr as i64);

        let mut result = PrefetchResult::default();

        if delta == self.pending_stride && delta != 0 {
            debug!("stride {} confirmed at block {:#x}, issuing {} prefetches", delta, block, self.k);
            for i in 1..=self.k as i64 {
                let addr = (trigger_addr as i64).wrapping_add(i * delta) as u64;
                match cache.prefetch(addr) {
                    Outcome::Miss => result.prefetched_blocks += 1,
                    Outcome::WriteBack => {
                        result.prefetched_blocks += 1;
                        result.write_backs += 1;
                    },
                    Outcome::Hit | Outcome::PrefetchHit => {},
                }
            }
        }

        self.last_miss_addr = block;
        self.pending_stride = delta;
        result
    }
}
