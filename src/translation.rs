use std::fmt;

use log::{debug, trace};

use crate::config::Config;
use crate::error::TranslationError;
use crate::memory::FrameIndex;
use crate::page_table::Vpn;
use crate::segment::{SegmentLayout, SegmentTag};
use crate::vm_manager::VmManager;

/// Represents the decomposed components of a Virtual Address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: u64,
    pub vpn: Vpn,
    pub offset: u64,
}

impl VirtualAddress {
    /// Split a raw VA at `offset_bits` into VPN and page offset
    pub fn decompose(va: u64, offset_bits: u32) -> Self {
        VirtualAddress {
            va,
            vpn: va >> offset_bits,
            offset: va & ((1u64 << offset_bits) - 1),
        }
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VA({}) = (vpn={}, offset={})", self.va, self.vpn, self.offset)
    }
}

/// Which path through the pipeline resolved an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    TlbHit,
    TableHit,
    /// The page had no frame; `evicted` is the page that was pushed out, if any
    Fault { evicted: Option<Vpn> },
}

/// Result of translating one address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationResult {
    pub address: VirtualAddress,
    pub segment: SegmentTag,
    pub frame: FrameIndex,
    pub physical_address: u64,
    pub outcome: Outcome,
}

impl TranslationResult {
    #[inline]
    pub fn tlb_hit(&self) -> bool {
        self.outcome == Outcome::TlbHit
    }

    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(self.outcome, Outcome::Fault { .. })
    }
}

impl fmt::Display for TranslationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VA={} VPN={} OFFSET={} SEG={} FRAME={} PA={} TLB_HIT={}",
            self.address.va,
            self.address.vpn,
            self.address.offset,
            self.segment,
            self.frame,
            self.physical_address,
            self.tlb_hit()
        )
    }
}

/// Drives addresses through the TLB, page table and frame allocator.
///
/// Owns the logical clock; the MMU state itself lives in [`VmManager`].
pub struct Translator {
    layout: SegmentLayout,
    offset_bits: u32,
    vpn_bits: u32,
    clock: u64,
}

impl Translator {
    pub fn new(config: &Config) -> Self {
        Translator {
            layout: SegmentLayout::new(config),
            offset_bits: config.offset_bits(),
            vpn_bits: config.vpn_bits(),
            clock: 0,
        }
    }

    /// Current logical time (number of addresses processed so far)
    pub fn now(&self) -> u64 {
        self.clock
    }

    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    /// Translate a single virtual address, resolving a fault if necessary
    pub fn translate(
        &mut self,
        vm: &mut VmManager,
        raw_va: u64,
    ) -> Result<TranslationResult, TranslationError> {
        let address = VirtualAddress::decompose(raw_va, self.offset_bits);
        if self.vpn_bits < u64::BITS && address.vpn >> self.vpn_bits != 0 {
            return Err(TranslationError::AddressOutOfRange {
                address: raw_va,
                vpn: address.vpn,
                vpn_bits: self.vpn_bits,
            });
        }

        // Step 1: advance the clock before touching any structure
        self.clock += 1;
        let now = self.clock;
        let vpn = address.vpn;

        let segment = self.layout.classify(raw_va);

        // Step 2: TLB, then page table, then fault
        let (frame, outcome) = if let Some(frame) = vm.tlb.lookup(vpn, now) {
            vm.frames.touch(frame, now);
            trace!("{address}: TLB hit, frame {frame}");
            (frame, Outcome::TlbHit)
        } else if let Some(frame) = vm.page_table.lookup(vpn) {
            vm.frames.touch(frame, now);
            vm.tlb.upsert(vpn, frame, now);
            trace!("{address}: page table hit, frame {frame}");
            (frame, Outcome::TableHit)
        } else {
            let frame = vm.frames.select_victim_or_free(now);
            let evicted = vm.install(vpn, frame, now);
            match evicted {
                Some(old) => debug!("{address}: page fault, evicted VPN {old} from frame {frame}"),
                None => debug!("{address}: page fault, loaded into free frame {frame}"),
            }
            (frame, Outcome::Fault { evicted })
        };

        // Step 3: compose the physical address
        let physical_address = ((frame as u64) << self.offset_bits) | address.offset;

        Ok(TranslationResult {
            address,
            segment,
            frame,
            physical_address,
            outcome,
        })
    }

    /// Translate a whole trace in order, stopping at the first failure
    pub fn translate_trace<I>(
        &mut self,
        vm: &mut VmManager,
        addresses: I,
    ) -> Result<Vec<TranslationResult>, TranslationError>
    where
        I: IntoIterator<Item = u64>,
    {
        addresses
            .into_iter()
            .map(|va| self.translate(vm, va))
            .collect()
    }
}

/// Aggregate counters for a processed trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub addresses: usize,
    pub tlb_hits: usize,
    pub table_hits: usize,
    pub faults: usize,
    pub evictions: usize,
}

impl Summary {
    pub fn from_results(results: &[TranslationResult]) -> Self {
        results.iter().fold(Summary::default(), |mut summary, result| {
            summary.addresses += 1;
            match result.outcome {
                Outcome::TlbHit => summary.tlb_hits += 1,
                Outcome::TableHit => summary.table_hits += 1,
                Outcome::Fault { evicted } => {
                    summary.faults += 1;
                    if evicted.is_some() {
                        summary.evictions += 1;
                    }
                }
            }
            summary
        })
    }

    /// Fraction of addresses served by the TLB, 0.0 for an empty trace
    pub fn tlb_hit_ratio(&self) -> f64 {
        if self.addresses == 0 {
            0.0
        } else {
            self.tlb_hits as f64 / self.addresses as f64
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} addresses: {} TLB hits ({:.1}%), {} page table hits, {} faults, {} evictions",
            self.addresses,
            self.tlb_hits,
            self.tlb_hit_ratio() * 100.0,
            self.table_hits,
            self.faults,
            self.evictions
        )
    }
}
