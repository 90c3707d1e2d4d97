//! Per-account set of contracts still worth minting

use ethers::types::Address;
use rand::Rng;

/// Contracts not yet attempted in this session; only ever shrinks
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    remaining: Vec<Address>,
}

impl CandidateSet {
    pub fn new(remaining: Vec<Address>) -> Self {
        Self { remaining }
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    #[cfg(test)]
    pub fn contains(&self, address: &Address) -> bool {
        self.remaining.contains(address)
    }

    /// Remove and return a uniformly random candidate
    pub fn take<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Address> {
        if self.remaining.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.remaining.len());
        Some(self.remaining.swap_remove(idx))
    }
}
