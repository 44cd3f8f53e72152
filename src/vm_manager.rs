use crate::config::Config;
use crate::memory::{FrameAllocator, FrameIndex};
use crate::page_table::{PageTable, Vpn};
use crate::tlb::Tlb;

/// All mutable MMU state for one run: page table, TLB and physical frames.
///
/// The [`Translator`](crate::translation::Translator) borrows this mutably
/// for each address, so the three structures are always updated together.
pub struct VmManager {
    pub(crate) page_table: PageTable,
    pub(crate) tlb: Tlb,
    pub(crate) frames: FrameAllocator,
}

impl VmManager {
    pub fn new(config: &Config) -> Self {
        VmManager {
            page_table: PageTable::new(config),
            tlb: Tlb::new(config.tlb_capacity()),
            frames: FrameAllocator::new(config.total_frames()),
        }
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    pub fn frames(&self) -> &FrameAllocator {
        &self.frames
    }

    /// Give `frame` to `vpn`, tearing down whatever page held it before.
    ///
    /// The old mapping is removed from the page table and then from the TLB
    /// before the new one is installed, so no stale translation survives.
    /// Returns the VPN that lost the frame.
    pub(crate) fn install(&mut self, vpn: Vpn, frame: FrameIndex, now: u64) -> Option<Vpn> {
        let evicted = self
            .page_table
            .find_by_frame(frame)
            .filter(|&owner| owner != vpn);

        if let Some(old) = evicted {
            self.page_table.unmap(old);
            self.tlb.invalidate(old);
        }

        self.page_table.map(vpn, frame);
        self.frames.assign(frame, vpn, now);
        self.tlb.upsert(vpn, frame, now);

        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Geometry;
    use crate::memory::FrameOccupant;

    fn two_frame_manager() -> VmManager {
        let config = Config::new(Geometry {
            physical_bits: 13,
            ..Geometry::default()
        })
        .unwrap();
        VmManager::new(&config)
    }

    #[test]
    fn test_sized_from_config() {
        let vm = VmManager::new(&Config::default());
        assert_eq!(vm.page_table().len(), 16);
        assert_eq!(vm.tlb().capacity(), 8);
        assert_eq!(vm.frames().len(), 4);
    }

    #[test]
    fn test_install_into_free_frame() {
        let mut vm = two_frame_manager();

        assert_eq!(vm.install(3, 0, 1), None);
        assert_eq!(vm.page_table().lookup(3), Some(0));
        assert_eq!(vm.tlb().peek(3), Some(0));
        assert_eq!(vm.frames().occupant(0), FrameOccupant::Page(3));
    }

    #[test]
    fn test_install_tears_down_previous_owner() {
        let mut vm = two_frame_manager();
        vm.install(3, 0, 1);

        assert_eq!(vm.install(9, 0, 2), Some(3));

        assert_eq!(vm.page_table().lookup(3), None);
        assert_eq!(vm.tlb().peek(3), None);
        assert_eq!(vm.page_table().lookup(9), Some(0));
        assert_eq!(vm.page_table().find_by_frame(0), Some(9));
        assert_eq!(vm.frames().occupant(0), FrameOccupant::Page(9));
        assert_eq!(vm.frames().frame(0).last_used, 2);
    }
}
