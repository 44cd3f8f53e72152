//! Classification of virtual addresses into program segments.
//!
//! The layout is fixed at construction: `.text` at address zero, `.data` and
//! `.bss` packed right after it, and `.stack` pinned to the top of the
//! virtual address space.

use std::fmt;
use std::ops::Range;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentTag {
    Text,
    Data,
    Bss,
    Stack,
    Unknown,
}

impl SegmentTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentTag::Text => "TEXT",
            SegmentTag::Data => "DATA",
            SegmentTag::Bss => "BSS",
            SegmentTag::Stack => "STACK",
            SegmentTag::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SegmentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Precomputed half-open segment ranges, checked in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLayout {
    ranges: [(SegmentTag, Range<u64>); 4],
}

impl SegmentLayout {
    pub fn new(config: &Config) -> Self {
        let text = 0..config.text_size();
        let data = text.end..text.end.saturating_add(config.data_size());
        let bss = data.end..data.end.saturating_add(config.bss_size());

        let top = config.address_space_size();
        let stack = top.saturating_sub(config.stack_size())..top;

        SegmentLayout {
            ranges: [
                (SegmentTag::Text, text),
                (SegmentTag::Data, data),
                (SegmentTag::Bss, bss),
                (SegmentTag::Stack, stack),
            ],
        }
    }

    /// Return the first segment containing `address`, or `Unknown`.
    pub fn classify(&self, address: u64) -> SegmentTag {
        self.ranges
            .iter()
            .find(|(_, range)| range.contains(&address))
            .map_or(SegmentTag::Unknown, |(tag, _)| *tag)
    }

    /// Range reserved for `tag`; `None` for `Unknown`.
    pub fn range(&self, tag: SegmentTag) -> Option<Range<u64>> {
        self.ranges
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, range)| range.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentTag, Range<u64>)> + '_ {
        self.ranges.iter().cloned()
    }
}
