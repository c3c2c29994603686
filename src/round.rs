//! Dealing a round: one target poem plus distractors, shuffled into a hand.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::poems::{Dataset, PoemId, PoemRecord};
use crate::recitation::Recitation;

/// Cards shown to the player, in display order.
#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    cards: Vec<PoemRecord>,
}

impl Hand {
    pub fn cards(&self) -> &[PoemRecord] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&PoemRecord> {
        self.cards.get(index)
    }

    pub fn contains(&self, id: PoemId) -> bool {
        self.cards.iter().any(|c| c.id == id)
    }

    pub fn ids(&self) -> Vec<PoemId> {
        self.cards.iter().map(|c| c.id).collect()
    }

    /// Reorder in place; membership never changes.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Round {
    id: u64,
    target: PoemRecord,
    pub(crate) hand: Hand,
    pub(crate) recitation: Recitation,
    /// Set once answered correctly; the round then only waits to be replaced.
    pub(crate) resolved: bool,
}

impl Round {
    /// Deal a hand of `hand_size` cards around a fixed target.
    pub fn with_target<R: Rng + ?Sized>(
        dataset: &Dataset,
        target: &PoemRecord,
        hand_size: usize,
        id: u64,
        rng: &mut R,
    ) -> Self {
        let mut distractors: Vec<&PoemRecord> =
            dataset.poems().iter().filter(|p| p.id != target.id).collect();
        distractors.shuffle(rng);
        distractors.truncate(hand_size.saturating_sub(1));

        let mut cards = Vec::with_capacity(distractors.len() + 1);
        cards.push(target.clone());
        cards.extend(distractors.into_iter().cloned());
        // Second shuffle so the target's slot is independent of insertion order.
        cards.shuffle(rng);

        Self {
            id,
            target: target.clone(),
            hand: Hand { cards },
            recitation: Recitation::for_poem(target),
            resolved: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn target(&self) -> &PoemRecord {
        &self.target
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn recitation(&self) -> &Recitation {
        &self.recitation
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// Pick a target uniformly at random and deal its hand.
pub fn generate_round<R: Rng + ?Sized>(
    dataset: &Dataset,
    hand_size: usize,
    id: u64,
    rng: &mut R,
) -> Round {
    let target = &dataset.poems()[rng.gen_range(0..dataset.len())];
    log::info!("round {id}: target poem {} ({})", target.id, target.first_half);
    Round::with_target(dataset, target, hand_size, id, rng)
}
