/// Gap bookkeeping for the recovery side
///
/// The session only reports that a gap exists; something out of band has to
/// request the retransmission. `GapTracker` keeps the inclusive ranges of
/// missing sequence numbers so that client knows exactly what to ask for, and
/// lets it mark ranges resolved as retransmitted data arrives.

#[derive(Debug, Clone, Default)]
pub struct GapTracker {
    gaps: Vec<(u32, u32)>, // inclusive (first_missing, last_missing) ranges
    total_missing: u32,
}

impl GapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a gap reported by the session: everything in
    /// `expected..received` is missing.
    pub fn record(&mut self, expected: u32, received: u32) {
        if received <= expected {
            return;
        }
        self.gaps.push((expected, received - 1));
        self.total_missing = self
            .total_missing
            .wrapping_add(received.wrapping_sub(expected));
    }

    /// Drop every range fully recovered once the session has advanced past
    /// `sequence`, trimming ranges it lands inside.
    pub fn resolve(&mut self, sequence: u32) {
        let mut recovered = 0u32;
        self.gaps.retain_mut(|(start, end)| {
            if sequence > *end {
                recovered = recovered.wrapping_add(*end - *start + 1);
                false
            } else if sequence > *start {
                recovered = recovered.wrapping_add(sequence - *start);
                *start = sequence;
                true
            } else {
                true
            }
        });
        self.total_missing = self.total_missing.wrapping_sub(recovered);
    }

    /// Unresolved ranges as inclusive (first, last) tuples, in arrival order.
    pub fn gaps(&self) -> &[(u32, u32)] {
        &self.gaps
    }

    pub fn gap_count(&self) -> usize {
        self.gaps.len()
    }

    /// Number of sequence numbers still missing.
    pub fn total_missing(&self) -> u32 {
        self.total_missing
    }

    pub fn is_missing(&self, sequence: u32) -> bool {
        self.gaps
            .iter()
            .any(|&(start, end)| sequence >= start && sequence <= end)
    }

    /// Forget everything, e.g. on a session rollover.
    pub fn reset(&mut self) {
        self.gaps.clear();
        self.total_missing = 0;
    }
}
