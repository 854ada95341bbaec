//! Bag randomizer and the next-piece queue built on it
//!
//! A bag holds one of each configured kind in random order. Pieces are drawn
//! from the front; when the bag runs dry a freshly shuffled one replaces it.
//! Within any refill window every kind appears exactly once, although a kind
//! can end one bag and start the next.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::types::PieceKind;

#[derive(Debug, Clone)]
pub struct Bag {
    kinds: Vec<PieceKind>,
    pending: VecDeque<PieceKind>,
    rng: StdRng,
}

impl Bag {
    /// A bag over `kinds` seeded from the thread RNG
    pub fn new(kinds: Vec<PieceKind>) -> Self {
        Self::with_rng(kinds, StdRng::from_rng(&mut rand::rng()))
    }

    /// A bag over `kinds` with a reproducible draw sequence
    pub fn seeded(kinds: Vec<PieceKind>, seed: u64) -> Self {
        Self::with_rng(kinds, StdRng::seed_from_u64(seed))
    }

    fn with_rng(kinds: Vec<PieceKind>, rng: StdRng) -> Self {
        assert!(!kinds.is_empty(), "bag needs at least one piece kind");
        Self {
            pending: VecDeque::with_capacity(kinds.len()),
            kinds,
            rng,
        }
    }

    /// Pieces left before the next refill
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn refill(&mut self) {
        let mut batch = self.kinds.clone();
        batch.shuffle(&mut self.rng);
        debug_assert!(
            {
                let mut sorted = batch.clone();
                sorted.sort();
                let mut expected = self.kinds.clone();
                expected.sort();
                sorted == expected
            },
            "bag refill is not a permutation of the piece set"
        );
        tracing::trace!("bag refilled: {:?}", batch);
        self.pending.extend(batch);
    }

    /// Draw the next kind, refilling first if the bag is empty
    pub fn next_piece(&mut self) -> PieceKind {
        if self.pending.is_empty() {
            self.refill();
        }
        match self.pending.pop_front() {
            Some(kind) => kind,
            None => unreachable!("bag is never empty after a refill"),
        }
    }
}

/// Upcoming pieces: a preview window of fixed size in front of a bag
#[derive(Debug, Clone)]
pub struct PieceQueue {
    bag: Bag,
    preview: VecDeque<PieceKind>,
    preview_size: usize,
}

impl PieceQueue {
    pub fn new(bag: Bag, preview_size: usize) -> Self {
        let mut queue = Self {
            bag,
            preview: VecDeque::with_capacity(preview_size),
            preview_size,
        };
        queue.top_up();
        queue
    }

    fn top_up(&mut self) {
        while self.preview.len() < self.preview_size {
            let kind = self.bag.next_piece();
            self.preview.push_back(kind);
        }
    }

    /// Take the next kind. With an empty preview the bag is drawn directly.
    pub fn next(&mut self) -> PieceKind {
        let kind = match self.preview.pop_front() {
            Some(kind) => kind,
            None => self.bag.next_piece(),
        };
        self.top_up();
        kind
    }

    /// The next kind that `next` will return, if the preview holds one
    pub fn peek(&self) -> Option<PieceKind> {
        self.preview.front().copied()
    }

    /// Upcoming kinds, soonest first
    pub fn preview(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.preview.iter().copied()
    }
}
