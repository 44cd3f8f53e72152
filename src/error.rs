//! Error types for the simulator.
//!
//! A miss in the TLB or page table is never an error; only broken
//! configuration, out-of-range addresses and I/O glue failures end up here.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Rejected geometry. Raised before any address is processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "virtual address space ({virtual_bits} bits) must be at least as wide as physical memory ({physical_bits} bits)"
    )]
    VirtualNarrowerThanPhysical { virtual_bits: u32, physical_bits: u32 },

    #[error("page table levels must be 1, 2 or 3 (got {0})")]
    LevelsOutOfRange(u32),

    #[error("page offset ({offset_bits} bits) is wider than physical memory ({physical_bits} bits)")]
    OffsetWiderThanPhysical { offset_bits: u32, physical_bits: u32 },

    #[error("virtual address width {0} exceeds the supported maximum of {max} bits", max = crate::constants::MAX_VIRTUAL_BITS)]
    VirtualTooWide(u32),

    #[error("{what} needs {bits} index bits, more than the supported {max}", max = crate::constants::MAX_COUNT_BITS)]
    TooManyEntries { what: &'static str, bits: u32 },

    #[error("{segment} segment exponent {bits} exceeds the virtual address width {virtual_bits}")]
    SegmentTooLarge {
        segment: &'static str,
        bits: u32,
        virtual_bits: u32,
    },
}

/// Fatal per-address failure inside the translation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("address {address} has VPN {vpn}, which does not fit in {vpn_bits} bits")]
    AddressOutOfRange { address: u64, vpn: u64, vpn_bits: u32 },
}

/// Failures of the file glue around the core (properties, trace, report).
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid virtual address {token:?}")]
    InvalidAddress { line: usize, token: String },

    #[error("line {line}: invalid value {value:?} for {key}")]
    InvalidProperty {
        line: usize,
        key: String,
        value: String,
    },

    #[error("line {line}: expected key=value, got {text:?}")]
    MalformedProperty { line: usize, text: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
