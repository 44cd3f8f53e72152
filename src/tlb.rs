//! Fully associative translation lookaside buffer with LRU replacement.
//!
//! Every operation scans all slots, the way an associative hardware search
//! compares every tag at once. There is no hashing and no set indexing.

use crate::memory::FrameIndex;
use crate::page_table::Vpn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlbEntry {
    pub vpn: Vpn,
    pub frame: FrameIndex,
    pub valid: bool,
    /// logical time of the last hit or fill
    pub last_used: u64,
}

impl TlbEntry {
    #[inline]
    fn matches(&self, vpn: Vpn) -> bool {
        self.valid && self.vpn == vpn
    }
}

pub struct Tlb {
    entries: Vec<TlbEntry>,
}

impl Tlb {
    pub fn new(capacity: usize) -> Self {
        Tlb {
            entries: vec![TlbEntry::default(); capacity],
        }
    }

    /// Look up `vpn`. A hit refreshes the entry to `now`; a miss changes nothing.
    pub fn lookup(&mut self, vpn: Vpn, now: u64) -> Option<FrameIndex> {
        let entry = self.entries.iter_mut().find(|entry| entry.matches(vpn))?;
        entry.last_used = now;
        Some(entry.frame)
    }

    /// Look up `vpn` without touching recency.
    pub fn peek(&self, vpn: Vpn) -> Option<FrameIndex> {
        self.entries
            .iter()
            .find(|entry| entry.matches(vpn))
            .map(|entry| entry.frame)
    }

    /// Insert or refresh the translation for `vpn`.
    ///
    /// An existing entry is updated in place; otherwise the first invalid
    /// slot is filled; otherwise the entry with the oldest timestamp is
    /// replaced (lowest slot on ties). Returns the VPN that was evicted, if any.
    pub fn upsert(&mut self, vpn: Vpn, frame: FrameIndex, now: u64) -> Option<Vpn> {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.matches(vpn)) {
            entry.frame = frame;
            entry.last_used = now;
            return None;
        }

        let fresh = TlbEntry {
            vpn,
            frame,
            valid: true,
            last_used: now,
        };

        if let Some(slot) = self.entries.iter_mut().find(|entry| !entry.valid) {
            *slot = fresh;
            return None;
        }

        // min_by_key keeps the first minimum, i.e. the lowest slot
        let slot = self
            .entries
            .iter_mut()
            .min_by_key(|entry| entry.last_used)?;
        let evicted = slot.vpn;
        *slot = fresh;
        Some(evicted)
    }

    /// Drop the translation for `vpn`. No-op when it is not cached.
    pub fn invalidate(&mut self, vpn: Vpn) -> bool {
        match self.entries.iter_mut().find(|entry| entry.matches(vpn)) {
            Some(entry) => {
                entry.valid = false;
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[TlbEntry] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.valid).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tlb_misses() {
        let mut tlb = Tlb::new(4);
        assert_eq!(tlb.capacity(), 4);
        assert_eq!(tlb.valid_count(), 0);
        assert_eq!(tlb.lookup(0, 1), None);
    }

    #[test]
    fn test_hit_refreshes_timestamp() {
        let mut tlb = Tlb::new(4);
        tlb.upsert(7, 3, 1);

        assert_eq!(tlb.lookup(7, 5), Some(3));
        assert_eq!(tlb.entries()[0].last_used, 5);
    }

    #[test]
    fn test_miss_leaves_state_unchanged() {
        let mut tlb = Tlb::new(2);
        tlb.upsert(1, 0, 1);
        tlb.upsert(2, 1, 2);
        let before = tlb.entries().to_vec();

        assert_eq!(tlb.lookup(9, 3), None);
        assert_eq!(tlb.entries(), before.as_slice());
    }

    #[test]
    fn test_upsert_updates_existing_entry() {
        let mut tlb = Tlb::new(4);
        tlb.upsert(7, 3, 1);
        assert_eq!(tlb.upsert(7, 2, 4), None);

        assert_eq!(tlb.valid_count(), 1);
        assert_eq!(tlb.peek(7), Some(2));
        assert_eq!(tlb.entries()[0].last_used, 4);
    }

    #[test]
    fn test_upsert_fills_first_free_slot() {
        let mut tlb = Tlb::new(4);
        tlb.upsert(1, 1, 1);
        tlb.upsert(2, 2, 2);
        tlb.upsert(3, 3, 3);
        tlb.invalidate(2);

        tlb.upsert(4, 4, 4);
        assert_eq!(tlb.entries()[1].vpn, 4);
        assert!(tlb.entries()[1].valid);
        // slot 3 was never used and stays free
        assert!(!tlb.entries()[3].valid);
    }

    #[test]
    fn test_upsert_evicts_least_recently_used() {
        let mut tlb = Tlb::new(2);
        tlb.upsert(10, 0, 1);
        tlb.upsert(11, 1, 2);
        // touch VPN 10 so 11 becomes the oldest
        tlb.lookup(10, 3);

        assert_eq!(tlb.upsert(12, 2, 4), Some(11));
        assert_eq!(tlb.peek(11), None);
        assert_eq!(tlb.peek(10), Some(0));
        assert_eq!(tlb.peek(12), Some(2));
        assert_eq!(tlb.entries()[1].vpn, 12);
    }

    #[test]
    fn test_eviction_tie_breaks_on_lowest_slot() {
        let mut tlb = Tlb::new(3);
        tlb.upsert(1, 0, 5);
        tlb.upsert(2, 1, 2);
        tlb.upsert(3, 2, 2);

        assert_eq!(tlb.upsert(4, 3, 6), Some(2));
        assert_eq!(tlb.entries()[1].vpn, 4);
    }

    #[test]
    fn test_invalidate() {
        let mut tlb = Tlb::new(2);
        tlb.upsert(5, 1, 1);

        assert!(tlb.invalidate(5));
        assert_eq!(tlb.lookup(5, 2), None);
        // second invalidate is a no-op
        assert!(!tlb.invalidate(5));
        assert!(!tlb.invalidate(99));
    }
}
