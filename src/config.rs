//! Simulator geometry: raw parameters and the validated, frozen configuration.

use std::fmt;

use crate::constants::*;
use crate::error::ConfigError;

/// Raw, unvalidated parameters. Sizes are given as base-2 exponents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub virtual_bits: u32,
    pub physical_bits: u32,
    pub offset_bits: u32,
    /// log2 of the TLB capacity
    pub tlb_bits: u32,
    pub levels: u32,
    pub text_bits: u32,
    pub data_bits: u32,
    pub stack_bits: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            virtual_bits: DEFAULT_VIRTUAL_BITS,
            physical_bits: DEFAULT_PHYSICAL_BITS,
            offset_bits: DEFAULT_OFFSET_BITS,
            tlb_bits: DEFAULT_TLB_BITS,
            levels: DEFAULT_LEVELS,
            text_bits: DEFAULT_TEXT_BITS,
            data_bits: DEFAULT_DATA_BITS,
            stack_bits: DEFAULT_STACK_BITS,
        }
    }
}

/// Validated geometry. Once built it never changes for the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    geometry: Geometry,
}

impl Config {
    /// Validate `geometry` and freeze it.
    pub fn new(geometry: Geometry) -> Result<Self, ConfigError> {
        let g = geometry;

        if g.virtual_bits < g.physical_bits {
            return Err(ConfigError::VirtualNarrowerThanPhysical {
                virtual_bits: g.virtual_bits,
                physical_bits: g.physical_bits,
            });
        }
        if !(MIN_LEVELS..=MAX_LEVELS).contains(&g.levels) {
            return Err(ConfigError::LevelsOutOfRange(g.levels));
        }
        if g.virtual_bits > MAX_VIRTUAL_BITS {
            return Err(ConfigError::VirtualTooWide(g.virtual_bits));
        }
        // also guarantees at least one frame
        if g.offset_bits > g.physical_bits {
            return Err(ConfigError::OffsetWiderThanPhysical {
                offset_bits: g.offset_bits,
                physical_bits: g.physical_bits,
            });
        }

        let counts = [
            ("page table", g.virtual_bits - g.offset_bits),
            ("physical memory", g.physical_bits - g.offset_bits),
            ("TLB", g.tlb_bits),
        ];
        for (what, bits) in counts {
            if bits > MAX_COUNT_BITS {
                return Err(ConfigError::TooManyEntries { what, bits });
            }
        }

        let segments = [
            (".text", g.text_bits),
            (".data", g.data_bits),
            (".stack", g.stack_bits),
        ];
        for (segment, bits) in segments {
            if bits > g.virtual_bits {
                return Err(ConfigError::SegmentTooLarge {
                    segment,
                    bits,
                    virtual_bits: g.virtual_bits,
                });
            }
        }

        Ok(Config { geometry })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn virtual_bits(&self) -> u32 {
        self.geometry.virtual_bits
    }

    #[inline]
    pub fn physical_bits(&self) -> u32 {
        self.geometry.physical_bits
    }

    #[inline]
    pub fn offset_bits(&self) -> u32 {
        self.geometry.offset_bits
    }

    #[inline]
    pub fn levels(&self) -> u32 {
        self.geometry.levels
    }

    /// Number of high address bits forming the VPN
    #[inline]
    pub fn vpn_bits(&self) -> u32 {
        self.geometry.virtual_bits - self.geometry.offset_bits
    }

    /// Number of bits needed to index a physical frame
    #[inline]
    pub fn frame_bits(&self) -> u32 {
        self.geometry.physical_bits - self.geometry.offset_bits
    }

    #[inline]
    pub fn page_size(&self) -> u64 {
        1 << self.geometry.offset_bits
    }

    #[inline]
    pub fn offset_mask(&self) -> u64 {
        self.page_size() - 1
    }

    #[inline]
    pub fn total_vpns(&self) -> usize {
        1 << self.vpn_bits()
    }

    #[inline]
    pub fn total_frames(&self) -> usize {
        1 << self.frame_bits()
    }

    #[inline]
    pub fn tlb_capacity(&self) -> usize {
        1 << self.geometry.tlb_bits
    }

    #[inline]
    pub fn address_space_size(&self) -> u64 {
        1 << self.geometry.virtual_bits
    }

    #[inline]
    pub fn text_size(&self) -> u64 {
        1 << self.geometry.text_bits
    }

    #[inline]
    pub fn data_size(&self) -> u64 {
        1 << self.geometry.data_bits
    }

    #[inline]
    pub fn stack_size(&self) -> u64 {
        1 << self.geometry.stack_bits
    }

    /// `.bss` spans three times the combined size of `.text`, `.data` and `.stack`.
    pub fn bss_size(&self) -> u64 {
        self.text_size()
            .saturating_add(self.data_size())
            .saturating_add(self.stack_size())
            .saturating_mul(BSS_MULTIPLIER)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VA {} bits, PA {} bits, page {} B, {} levels, {} VPNs, {} frames, {} TLB entries",
            self.virtual_bits(),
            self.physical_bits(),
            self.page_size(),
            self.levels(),
            self.total_vpns(),
            self.total_frames(),
            self.tlb_capacity(),
        )
    }
}
