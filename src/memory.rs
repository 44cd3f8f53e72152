use crate::page_table::Vpn;

pub type FrameIndex = usize;

/// Who currently holds a physical frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameOccupant {
    #[default]
    Free,
    Page(Vpn),
}

impl FrameOccupant {
    #[inline]
    pub fn is_free(&self) -> bool {
        matches!(self, FrameOccupant::Free)
    }

    #[inline]
    pub fn vpn(&self) -> Option<Vpn> {
        match self {
            FrameOccupant::Free => None,
            FrameOccupant::Page(vpn) => Some(*vpn),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    pub occupant: FrameOccupant,
    /// logical time of the last access
    pub last_used: u64,
}

/// Physical RAM as a fixed set of frames with LRU bookkeeping
pub struct FrameAllocator {
    frames: Vec<Frame>,
}

impl FrameAllocator {
    /// Create `count` free frames, all stamped at time zero
    pub fn new(count: usize) -> Self {
        FrameAllocator {
            frames: vec![Frame::default(); count],
        }
    }

    /// Refresh the recency of `frame` without changing who holds it
    #[inline]
    pub fn touch(&mut self, frame: FrameIndex, now: u64) {
        self.frames[frame].last_used = now;
    }

    /// Record that `vpn` now lives in `frame`
    pub fn assign(&mut self, frame: FrameIndex, vpn: Vpn, now: u64) {
        self.frames[frame] = Frame {
            occupant: FrameOccupant::Page(vpn),
            last_used: now,
        };
    }

    /// Pick the frame for the next page: the lowest free frame if any,
    /// otherwise the least recently used one (lowest index on ties).
    /// The chosen frame is stamped with `now`.
    ///
    /// There is always at least one frame; the configuration guarantees it.
    pub fn select_victim_or_free(&mut self, now: u64) -> FrameIndex {
        let chosen = self
            .frames
            .iter()
            .position(|frame| frame.occupant.is_free())
            .unwrap_or_else(|| self.least_recently_used());

        self.frames[chosen].last_used = now;
        chosen
    }

    fn least_recently_used(&self) -> FrameIndex {
        // min_by_key keeps the first minimum, which is the lowest index
        self.frames
            .iter()
            .enumerate()
            .min_by_key(|(_, frame)| frame.last_used)
            .map_or(0, |(index, _)| index)
    }

    #[inline]
    pub fn occupant(&self, frame: FrameIndex) -> FrameOccupant {
        self.frames[frame].occupant
    }

    #[inline]
    pub fn frame(&self, frame: FrameIndex) -> &Frame {
        &self.frames[frame]
    }

    /// Every frame in index order, for the final dump
    pub fn frames(&self) -> impl Iterator<Item = (FrameIndex, &Frame)> + '_ {
        self.frames.iter().enumerate()
    }

    pub fn free_count(&self) -> usize {
        self.frames.iter().filter(|frame| frame.occupant.is_free()).count()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
