//! Hierarchical page table stored as a flat arena.
//!
//! The VPN is split into 1 to 3 index fields. Every non-leaf level is one
//! directory vector holding, per slot, the base index of a child table in the
//! next level down; the leaf level is a single vector of [`PageTableEntry`].
//! All tables are materialized when the table is built, so a walk never has
//! to create anything.
//!
//! A frame-to-VPN back-map is kept next to the leaves so that finding the
//! owner of a frame on eviction does not require scanning every leaf.

use crate::config::Config;
use crate::memory::FrameIndex;

pub type Vpn = u64;

/// Leaf of the hierarchy: a frame if the page is mapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTableEntry {
    frame: Option<FrameIndex>,
}

impl PageTableEntry {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.frame.is_some()
    }

    #[inline]
    pub fn frame(&self) -> Option<FrameIndex> {
        self.frame
    }
}

/// Index field of one level, extracted as `(vpn >> shift) & mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Level {
    bits: u32,
    shift: u32,
    mask: u64,
}

impl Level {
    #[inline]
    fn index(&self, vpn: Vpn) -> usize {
        ((vpn >> self.shift) & self.mask) as usize
    }

    #[inline]
    fn fanout(&self) -> usize {
        1 << self.bits
    }
}

/// Split `vpn_bits` across `levels`, giving the remainder to the earliest levels.
pub fn split_bits(vpn_bits: u32, levels: u32) -> Vec<u32> {
    let levels = levels.max(1);
    let base = vpn_bits / levels;
    let remainder = vpn_bits % levels;
    (0..levels)
        .map(|level| base + u32::from(level < remainder))
        .collect()
}

pub struct PageTable {
    vpn_bits: u32,
    /// Non-leaf levels, root first, each paired with its directory arena.
    directories: Vec<(Level, Vec<usize>)>,
    leaf_level: Level,
    leaves: Vec<PageTableEntry>,
    /// frame -> VPN currently mapped to it
    owners: Vec<Option<Vpn>>,
}

impl PageTable {
    pub fn new(config: &Config) -> Self {
        Self::with_geometry(config.vpn_bits(), config.levels(), config.total_frames())
    }

    /// Build a table for `vpn_bits`-wide VPNs split over `levels` levels,
    /// tracking owners for `frames` physical frames.
    pub fn with_geometry(vpn_bits: u32, levels: u32, frames: usize) -> Self {
        let mut shift = vpn_bits;
        let mut fields: Vec<Level> = split_bits(vpn_bits, levels)
            .into_iter()
            .map(|bits| {
                shift -= bits;
                Level {
                    bits,
                    shift,
                    mask: (1u64 << bits) - 1,
                }
            })
            .collect();

        // split_bits always yields at least one field; the last is the leaf
        let leaf_level = fields.pop().unwrap_or(Level {
            bits: vpn_bits,
            shift: 0,
            mask: (1u64 << vpn_bits) - 1,
        });

        // number of tables at the level being built; the root is a single table
        let mut tables = 1usize;
        let mut directories = Vec::with_capacity(fields.len());
        for (depth, level) in fields.iter().enumerate() {
            let child_fanout = fields
                .get(depth + 1)
                .map_or(leaf_level.fanout(), Level::fanout);
            let slots = tables * level.fanout();
            let arena: Vec<usize> = (0..slots).map(|slot| slot * child_fanout).collect();
            directories.push((*level, arena));
            tables = slots;
        }

        let leaves = vec![PageTableEntry::default(); tables * leaf_level.fanout()];
        debug_assert_eq!(leaves.len(), 1usize << vpn_bits);

        PageTable {
            vpn_bits,
            directories,
            leaf_level,
            leaves,
            owners: vec![None; frames],
        }
    }

    /// Walk the directories down to the leaf slot for `vpn`.
    #[inline]
    fn leaf_index(&self, vpn: Vpn) -> usize {
        debug_assert!(vpn < self.leaves.len() as u64, "VPN {vpn} out of range");

        let mut base = 0;
        for (level, arena) in &self.directories {
            base = arena[base + level.index(vpn)];
        }
        base + self.leaf_level.index(vpn)
    }

    /// Frame mapped to `vpn`, or `None` on a miss.
    pub fn lookup(&self, vpn: Vpn) -> Option<FrameIndex> {
        self.leaves[self.leaf_index(vpn)].frame
    }

    pub fn entry(&self, vpn: Vpn) -> PageTableEntry {
        self.leaves[self.leaf_index(vpn)]
    }

    /// Map `vpn` to `frame`. Any previous occupant of `frame` must already
    /// have been unmapped by the caller.
    pub fn map(&mut self, vpn: Vpn, frame: FrameIndex) {
        debug_assert!(
            self.owners[frame].is_none_or(|owner| owner == vpn),
            "frame {frame} still mapped"
        );

        let index = self.leaf_index(vpn);
        if let Some(previous) = self.leaves[index].frame.replace(frame) {
            if previous != frame {
                self.owners[previous] = None;
            }
        }
        self.owners[frame] = Some(vpn);
    }

    /// Invalidate the mapping for `vpn`, if any.
    pub fn unmap(&mut self, vpn: Vpn) {
        let index = self.leaf_index(vpn);
        if let Some(frame) = self.leaves[index].frame.take() {
            self.owners[frame] = None;
        }
    }

    /// VPN currently mapped to `frame`.
    #[inline]
    pub fn find_by_frame(&self, frame: FrameIndex) -> Option<Vpn> {
        self.owners.get(frame).copied().flatten()
    }

    /// Every entry in VPN order, for the final dump.
    pub fn entries(&self) -> impl Iterator<Item = (Vpn, PageTableEntry)> + '_ {
        (0..self.leaves.len() as Vpn).map(|vpn| (vpn, self.entry(vpn)))
    }

    pub fn mapped_count(&self) -> usize {
        self.owners.iter().filter(|owner| owner.is_some()).count()
    }

    /// Total number of VPNs covered.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn vpn_bits(&self) -> u32 {
        self.vpn_bits
    }

    /// Index width of each level, root first.
    pub fn level_bits(&self) -> Vec<u32> {
        self.directories
            .iter()
            .map(|(level, _)| level.bits)
            .chain(std::iter::once(self.leaf_level.bits))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(4, 1 => vec![4] ; "single level")]
    #[test_case(4, 2 => vec![2, 2] ; "even split")]
    #[test_case(5, 2 => vec![3, 2] ; "remainder to root")]
    #[test_case(8, 3 => vec![3, 3, 2] ; "two remainder bits")]
    #[test_case(2, 3 => vec![1, 1, 0] ; "more levels than bits")]
    fn test_split_bits(vpn_bits: u32, levels: u32) -> Vec<u32> {
        split_bits(vpn_bits, levels)
    }

    #[test]
    fn test_new_table_is_empty() {
        let table = PageTable::with_geometry(4, 1, 4);

        assert_eq!(table.len(), 16);
        assert_eq!(table.mapped_count(), 0);
        for vpn in 0..16 {
            assert_eq!(table.lookup(vpn), None);
            assert!(!table.entry(vpn).is_valid());
        }
        for frame in 0..4 {
            assert_eq!(table.find_by_frame(frame), None);
        }
    }

    #[test]
    fn test_map_lookup_unmap() {
        let mut table = PageTable::with_geometry(4, 1, 4);

        table.map(3, 2);
        assert_eq!(table.lookup(3), Some(2));
        assert_eq!(table.entry(3).frame(), Some(2));
        assert_eq!(table.find_by_frame(2), Some(3));

        table.unmap(3);
        assert_eq!(table.lookup(3), None);
        assert!(!table.entry(3).is_valid());
        assert_eq!(table.find_by_frame(2), None);

        // unmapping an unmapped VPN is a no-op
        table.unmap(3);
        assert_eq!(table.mapped_count(), 0);
    }

    #[test]
    fn test_remap_moves_back_mapping() {
        let mut table = PageTable::with_geometry(4, 2, 4);

        table.map(5, 0);
        table.map(5, 3);

        assert_eq!(table.lookup(5), Some(3));
        assert_eq!(table.find_by_frame(0), None);
        assert_eq!(table.find_by_frame(3), Some(5));
        assert_eq!(table.mapped_count(), 1);
    }

    #[test_case(1 ; "one level")]
    #[test_case(2 ; "two levels")]
    #[test_case(3 ; "three levels")]
    fn test_every_vpn_has_its_own_leaf(levels: u32) {
        let vpn_bits = 7;
        let frames = 1 << vpn_bits;
        let mut table = PageTable::with_geometry(vpn_bits, levels, frames);

        // map each VPN to the frame of its mirror image so a walk that
        // mixed up levels would be caught
        for vpn in 0..frames as Vpn {
            table.map(vpn, frames - 1 - vpn as usize);
        }
        for vpn in 0..frames as Vpn {
            assert_eq!(table.lookup(vpn), Some(frames - 1 - vpn as usize));
            assert_eq!(table.find_by_frame(frames - 1 - vpn as usize), Some(vpn));
        }
        assert_eq!(table.mapped_count(), frames);
    }

    #[test]
    fn test_level_bits_and_directories() {
        let table = PageTable::with_geometry(8, 3, 4);
        assert_eq!(table.level_bits(), vec![3, 3, 2]);
        assert_eq!(table.len(), 256);

        // root: 8 slots; second level: 8 tables * 8 slots
        assert_eq!(table.directories[0].1.len(), 8);
        assert_eq!(table.directories[1].1.len(), 64);
        assert_eq!(table.directories[0].1[1], 8);
        assert_eq!(table.directories[1].1[9], 36);
    }

    #[test]
    fn test_entries_dump_in_vpn_order() {
        let mut table = PageTable::with_geometry(2, 2, 2);
        table.map(2, 1);

        let dump: Vec<(Vpn, Option<FrameIndex>)> = table
            .entries()
            .map(|(vpn, entry)| (vpn, entry.frame()))
            .collect();
        assert_eq!(dump, vec![(0, None), (1, None), (2, Some(1)), (3, None)]);
    }

    #[test]
    fn test_zero_vpn_bits() {
        let mut table = PageTable::with_geometry(0, 2, 1);
        assert_eq!(table.len(), 1);
        table.map(0, 0);
        assert_eq!(table.lookup(0), Some(0));
    }
}
