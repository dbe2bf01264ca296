//! Fixed-window ring buffer with an arithmetic mean
//!
//! The mean always divides by the full window length, so a ring that has
//! not been filled yet averages in its zero-initialised slots. The PPG
//! pipeline relies on this: its rings start at zero and are never cleared.

/// Ring of the last `N` samples
#[derive(Clone, Copy, Debug)]
pub struct SampleRing<const N: usize> {
    /// Sample storage
    buffer: [u32; N],
    /// Next slot to overwrite
    pos: usize,
    /// Samples pushed so far, saturating at `N`
    filled: usize,
}

impl<const N: usize> SampleRing<N> {
    /// Create a zero-filled ring
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            pos: 0,
            filled: 0,
        }
    }

    /// Overwrite the oldest slot
    pub fn push(&mut self, sample: u32) {
        if N == 0 {
            return;
        }
        self.buffer[self.pos] = sample;
        self.pos = (self.pos + 1) % N;
        if self.filled < N {
            self.filled += 1;
        }
    }

    /// Push a sample and return the new mean
    pub fn push_mean(&mut self, sample: u32) -> u32 {
        self.push(sample);
        self.mean()
    }

    /// Sum of all slots
    #[must_use]
    pub fn sum(&self) -> u64 {
        self.buffer.iter().map(|&s| u64::from(s)).sum()
    }

    /// Integer mean over the whole window (zero for an empty window size)
    #[must_use]
    pub fn mean(&self) -> u32 {
        if N == 0 {
            return 0;
        }
        // Mean of u32 values always fits in u32
        (self.sum() / N as u64) as u32
    }

    /// True once every slot has been written at least once
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.filled == N
    }

    /// Number of slots written so far (saturates at `N`)
    #[must_use]
    pub const fn filled(&self) -> usize {
        self.filled
    }

    /// Window length
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Raw slots in storage order
    #[must_use]
    pub const fn as_slice(&self) -> &[u32; N] {
        &self.buffer
    }
}

impl<const N: usize> Default for SampleRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
