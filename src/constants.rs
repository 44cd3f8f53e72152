// default geometry: 64 KiB virtual space, 16 KiB of RAM, 4 KiB pages
pub const DEFAULT_VIRTUAL_BITS: u32 = 16;
pub const DEFAULT_PHYSICAL_BITS: u32 = 14;
pub const DEFAULT_OFFSET_BITS: u32 = 12;
pub const DEFAULT_TLB_BITS: u32 = 3;
pub const DEFAULT_LEVELS: u32 = 1;

pub const DEFAULT_TEXT_BITS: u32 = 12;
pub const DEFAULT_DATA_BITS: u32 = 12;
pub const DEFAULT_STACK_BITS: u32 = 12;

pub const MIN_LEVELS: u32 = 1;
pub const MAX_LEVELS: u32 = 3;

// addresses are u64, and the address-space size (1 << bits) must still fit
pub const MAX_VIRTUAL_BITS: u32 = 63;

// every table/frame/TLB array is materialized up front, so cap the counts
pub const MAX_COUNT_BITS: u32 = 30;

// .bss is sized as a multiple of text + data + stack
pub const BSS_MULTIPLIER: u64 = 3;

pub const DEFAULT_INPUT_FILE: &str = "addresses.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "simulation_report.txt";

// rendered in the report for invalid PTEs and free frames
pub const INVALID_FRAME: i64 = -1;
pub const FREE_FRAME_CONTENT: i64 = -1;
