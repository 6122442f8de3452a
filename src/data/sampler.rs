// Copyright (C) 2025 Bellande Artificial Intelligence Computer Vision Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Endless source of dataset indices. Every call returns exactly `n` indices;
/// the underlying sequence wraps around forever.
pub trait Sampler: Send {
    fn sample(&mut self, n: usize) -> Vec<usize>;
    /// Length of one pass over the underlying dataset.
    fn len(&self) -> usize;
}

/// `0, 1, .., N-1, 0, 1, ..`
pub struct SequentialSampler {
    data_len: usize,
    current_index: usize,
}

impl SequentialSampler {
    pub fn new(data_len: usize) -> Self {
        SequentialSampler {
            data_len,
            current_index: 0,
        }
    }

    fn next_index(&mut self) -> usize {
        let index = self.current_index;
        self.current_index = (self.current_index + 1) % self.data_len;
        index
    }
}

impl Sampler for SequentialSampler {
    fn sample(&mut self, n: usize) -> Vec<usize> {
        if self.data_len == 0 {
            return Vec::new();
        }
        (0..n).map(|_| self.next_index()).collect()
    }

    fn len(&self) -> usize {
        self.data_len
    }
}

/// Buffered shuffle over the repeating sequence. The buffer holds `buffer_size`
/// pending indices; each draw emits a uniformly chosen slot and refills it from
/// the sequence, so neighbouring epochs can interleave near their boundary.
pub struct ShuffleBufferSampler {
    source: SequentialSampler,
    buffer: Vec<usize>,
    buffer_size: usize,
    rng: StdRng,
}

impl ShuffleBufferSampler {
    pub fn new(data_len: usize, buffer_size: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        ShuffleBufferSampler {
            source: SequentialSampler::new(data_len),
            buffer: Vec::with_capacity(buffer_size),
            buffer_size: buffer_size.max(1),
            rng,
        }
    }

    fn next_index(&mut self) -> usize {
        while self.buffer.len() < self.buffer_size {
            let index = self.source.next_index();
            self.buffer.push(index);
        }
        let slot = self.rng.gen_range(0..self.buffer.len());
        self.buffer.swap_remove(slot)
    }
}

impl Sampler for ShuffleBufferSampler {
    fn sample(&mut self, n: usize) -> Vec<usize> {
        if self.source.data_len == 0 {
            return Vec::new();
        }
        (0..n).map(|_| self.next_index()).collect()
    }

    fn len(&self) -> usize {
        self.source.data_len
    }
}
