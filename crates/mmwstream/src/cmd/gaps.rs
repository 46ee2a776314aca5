/// Counts frames missing from a sequence of sensor `frame_number`s.
///
/// A number at or below the previous one is treated as a sensor restart
/// and starts a new sequence.
#[derive(Debug, Default)]
pub struct FrameGapTracker {
    last: Option<u32>,
    dropped: u64,
}

impl FrameGapTracker {
    /// Record a frame number. Returns the number of frames skipped before it.
    pub fn observe(&mut self, frame_number: u32) -> u32 {
        let gap = match self.last {
            Some(last) if frame_number > last => frame_number - last - 1,
            _ => 0,
        };
        self.last = Some(frame_number);
        self.dropped += u64::from(gap);
        gap
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
