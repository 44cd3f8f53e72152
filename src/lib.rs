pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod logger;
pub mod memory;
pub mod page_table;
pub mod segment;
pub mod tlb;
pub mod translation;
pub mod vm_manager;

// Re-export commonly used items for convenience
pub use config::{Config, Geometry};
pub use error::{ConfigError, Error, Result, TranslationError};
pub use segment::SegmentTag;
pub use translation::{Outcome, Summary, TranslationResult, Translator, VirtualAddress};
pub use vm_manager::VmManager;
