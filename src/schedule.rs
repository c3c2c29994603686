//! Cancelable one-shot tasks keyed by due time.
//!
//! Nothing here owns a real timer. The animation loop passes the current
//! `performance.now()` into the session, which pops every task that has come due.
//! Each task remembers the round it was scheduled for so a late firing can be
//! recognised and dropped.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskToken(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Reveal the next character of the recitation.
    RevealNext,
    /// Deal the next round after a correct answer.
    AdvanceRound,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DueTask {
    pub token: TaskToken,
    pub kind: TaskKind,
    pub round_id: u64,
    pub due_ms: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schedule {
    next_token: u64,
    tasks: Vec<DueTask>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TaskKind, round_id: u64, due_ms: f64) -> TaskToken {
        let token = TaskToken(self.next_token);
        self.next_token += 1;
        self.tasks.push(DueTask { token, kind, round_id, due_ms });
        token
    }

    /// Cancelling a fired or unknown token does nothing.
    pub fn cancel(&mut self, token: TaskToken) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.token != token);
        self.tasks.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    /// Remove and return the earliest task due at or before `now_ms`. Ties fire in
    /// scheduling order.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<DueTask> {
        let idx = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by(|(_, a), (_, b)| {
                a.due_ms
                    .total_cmp(&b.due_ms)
                    .then(a.token.0.cmp(&b.token.0))
            })
            .map(|(idx, _)| idx)?;
        Some(self.tasks.remove(idx))
    }

    pub fn is_pending(&self, token: TaskToken) -> bool {
        self.tasks.iter().any(|t| t.token == token)
    }

    pub fn count(&self, kind: TaskKind) -> usize {
        self.tasks.iter().filter(|t| t.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
