//! Render-ready snapshot of a session. This is the whole presentation boundary:
//! the DOM layer and JavaScript callers only ever see these structs.

use serde::Serialize;

use crate::game::{GameState, Session};
use crate::poems::{PoemId, PoemRecord};

/// Key label for a hand slot: `1`..`9`, then `0` for the tenth card.
pub fn slot_label(index: usize) -> String {
    match index {
        0..=8 => (index + 1).to_string(),
        9 => "0".to_string(),
        _ => String::new(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CardView {
    pub slot: String,
    pub id: PoemId,
    pub second_half: String,
    pub author: String,
    pub image_ref: Option<String>,
}

/// Answer shown after a miss or a pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnswerView {
    pub id: PoemId,
    pub first_half: String,
    pub second_half: String,
    /// Reading of the first half split at the deciding prefix.
    pub deciding_prefix: String,
    pub reading_rest: String,
    pub deciding_prefix_len: usize,
    pub author: String,
    pub author_kana: String,
}

impl AnswerView {
    fn of(poem: &PoemRecord) -> Self {
        let (prefix, rest) = poem.deciding_prefix();
        Self {
            id: poem.id,
            first_half: poem.first_half.clone(),
            second_half: poem.second_half.clone(),
            deciding_prefix: prefix.to_string(),
            reading_rest: rest.to_string(),
            deciding_prefix_len: poem.deciding_prefix_len,
            author: poem.author.clone(),
            author_kana: poem.author_kana.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub state: GameState,
    pub score: u32,
    pub total_attempts: u32,
    pub hand: Vec<CardView>,
    pub revealed_text: String,
    pub recitation_active: bool,
    pub can_start_recitation: bool,
    pub show_correct: bool,
    pub recitation_speed_ms: u32,
    pub answer: Option<AnswerView>,
}

impl Snapshot {
    pub fn of(session: &Session) -> Self {
        let round = session.round();
        let hand = round
            .map(|r| {
                r.hand
                    .cards()
                    .iter()
                    .enumerate()
                    .map(|(i, card)| CardView {
                        slot: slot_label(i),
                        id: card.id,
                        second_half: card.second_half.clone(),
                        author: card.author.clone(),
                        image_ref: card.image_ref.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let answer = match (session.state(), round) {
            (GameState::Result, Some(r)) => Some(AnswerView::of(r.target())),
            _ => None,
        };
        Self {
            state: session.state(),
            score: session.score(),
            total_attempts: session.total_attempts(),
            hand,
            revealed_text: round.map(|r| r.recitation.revealed_prefix()).unwrap_or_default(),
            recitation_active: round.is_some_and(|r| r.recitation.is_active()),
            can_start_recitation: session.can_start_recitation(),
            show_correct: session.show_correct(),
            recitation_speed_ms: session.recitation_speed_ms(),
            answer,
        }
    }

    pub fn to_json(&self) -> String {
        // Plain structs of strings and numbers always serialize.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Id of the card in `slot`, if the hand has that many cards.
    pub fn card_in_slot(&self, slot: usize) -> Option<PoemId> {
        self.hand.get(slot).map(|c| c.id)
    }
}
