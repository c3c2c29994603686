//! Character-by-character recitation of the target poem.
//!
//! Each reveal is scheduled from the previous due time rather than from when it
//! actually fired, so a slow frame catches up instead of drifting.

use crate::poems::PoemRecord;
use crate::schedule::{Schedule, TaskKind, TaskToken};

#[derive(Clone, Debug, PartialEq)]
pub struct Recitation {
    text: Vec<char>,
    revealed: usize,
    active: bool,
    started: bool,
    timer: Option<TaskToken>,
}

impl Recitation {
    pub fn for_poem(poem: &PoemRecord) -> Self {
        Self::from_text(&poem.full_text())
    }

    pub fn from_text(text: &str) -> Self {
        Self { text: text.chars().collect(), revealed: 0, active: false, started: false, timer: None }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether this recitation has been started at least once.
    pub fn started(&self) -> bool {
        self.started
    }

    pub fn revealed_len(&self) -> usize {
        self.revealed
    }

    pub fn full_len(&self) -> usize {
        self.text.len()
    }

    pub fn revealed_prefix(&self) -> String {
        self.text[..self.revealed].iter().collect()
    }

    pub fn is_complete(&self) -> bool {
        !self.text.is_empty() && self.revealed == self.text.len()
    }

    /// Begin revealing from an empty prefix. Returns false (and changes nothing)
    /// when already active. Text with nothing to recite never activates.
    pub fn start(
        &mut self,
        schedule: &mut Schedule,
        round_id: u64,
        now_ms: f64,
        speed_ms: u32,
    ) -> bool {
        if self.active {
            return false;
        }
        self.cancel_timer(schedule);
        self.revealed = 0;
        self.started = true;
        if self.text.iter().all(|c| c.is_whitespace()) {
            log::error!("recitation text is empty, nothing to recite");
            return false;
        }
        self.active = true;
        self.timer = Some(schedule.schedule(TaskKind::RevealNext, round_id, now_ms + speed_ms as f64));
        true
    }

    /// Handle a fired reveal task. Tokens other than the live one are ignored.
    pub fn on_tick(
        &mut self,
        schedule: &mut Schedule,
        token: TaskToken,
        round_id: u64,
        due_ms: f64,
        speed_ms: u32,
    ) {
        if !self.active || self.timer != Some(token) {
            return;
        }
        self.timer = None;
        if self.revealed < self.text.len() {
            self.revealed += 1;
        }
        if self.revealed >= self.text.len() {
            self.active = false;
            return;
        }
        self.timer = Some(schedule.schedule(TaskKind::RevealNext, round_id, due_ms + speed_ms as f64));
    }

    /// Stop revealing, keeping whatever is already shown.
    pub fn stop(&mut self, schedule: &mut Schedule) {
        self.cancel_timer(schedule);
        self.active = false;
    }

    fn cancel_timer(&mut self, schedule: &mut Schedule) {
        if let Some(token) = self.timer.take() {
            schedule.cancel(token);
        }
    }
}
