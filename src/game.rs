//! Session state machine: Start -> Playing -> Result.
//!
//! `Session::reduce` consumes the session and returns the next one. Everything the
//! transition needs besides the session itself (dataset, tuning, randomness, the
//! clock) is passed in through `Env`, so there is no hidden global game.
//! Commands that make no sense in the current state are dropped with a debug log
//! instead of surfacing as errors: they are almost always a key press racing a
//! transition.

use std::fmt;

use rand::Rng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::config::GameConfig;
use crate::poems::{Dataset, PoemId};
use crate::round::{Round, generate_round};
use crate::schedule::{Schedule, TaskKind, TaskToken};
use crate::view::Snapshot;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Start,
    Playing,
    Result,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Begin,
    SelectCard(PoemId),
    StartRecitation,
    Resume,
    /// Give up on the current round and show the answer.
    Skip,
    End,
    ShuffleHand,
    SetRecitationSpeed(u32),
    /// Fire every scheduled task that has come due.
    Tick,
}

/// Why a command was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    WrongState { actual: GameState },
    NoRound,
    CardNotInHand(PoemId),
    RoundResolved,
    RecitationAlreadyStarted,
    SpeedOutOfRange(u32),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::WrongState { actual } => write!(f, "not allowed in {actual:?} state"),
            Rejection::NoRound => write!(f, "no round in progress"),
            Rejection::CardNotInHand(id) => write!(f, "poem {id} is not in the hand"),
            Rejection::RoundResolved => write!(f, "round already answered"),
            Rejection::RecitationAlreadyStarted => write!(f, "recitation already started"),
            Rejection::SpeedOutOfRange(ms) => write!(f, "speed {ms}ms out of range"),
        }
    }
}

/// Collaborators a transition may use.
pub struct Env<'a, R: Rng + ?Sized> {
    pub dataset: &'a Dataset,
    pub config: &'a GameConfig,
    pub rng: &'a mut R,
    /// Milliseconds on the same clock the schedule uses (`performance.now()`).
    pub now_ms: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    state: GameState,
    round: Option<Round>,
    score: u32,
    total_attempts: u32,
    recitation_speed_ms: u32,
    schedule: Schedule,
    advance: Option<TaskToken>,
    show_correct: bool,
    rounds_dealt: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}

impl Session {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            state: GameState::Start,
            round: None,
            score: 0,
            total_attempts: 0,
            recitation_speed_ms: config.recitation_speed_ms,
            schedule: Schedule::new(),
            advance: None,
            show_correct: false,
            rounds_dealt: 0,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    pub fn recitation_speed_ms(&self) -> u32 {
        self.recitation_speed_ms
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Transient "correct" signal, cleared when the next round is dealt.
    pub fn show_correct(&self) -> bool {
        self.show_correct
    }

    pub fn advance_pending(&self) -> bool {
        self.advance.is_some_and(|t| self.schedule.is_pending(t))
    }

    /// One manual start per round, only while the round is still open.
    pub fn can_start_recitation(&self) -> bool {
        self.state == GameState::Playing
            && self
                .round
                .as_ref()
                .is_some_and(|r| !r.resolved && !r.recitation.started())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::of(self)
    }

    pub fn reduce<R: Rng + ?Sized>(mut self, command: Command, env: &mut Env<'_, R>) -> Self {
        if let Err(why) = self.apply(command, env) {
            log::debug!("ignored {command:?}: {why}");
        }
        self
    }

    fn apply<R: Rng + ?Sized>(
        &mut self,
        command: Command,
        env: &mut Env<'_, R>,
    ) -> Result<(), Rejection> {
        match command {
            Command::Begin => {
                self.expect_state(GameState::Start)?;
                self.score = 0;
                self.total_attempts = 0;
                self.schedule.cancel_all();
                self.advance = None;
                self.deal_round(env);
                self.state = GameState::Playing;
            }
            Command::SelectCard(id) => {
                self.expect_state(GameState::Playing)?;
                let round = self.round.as_mut().ok_or(Rejection::NoRound)?;
                if round.resolved {
                    return Err(Rejection::RoundResolved);
                }
                if !round.hand.contains(id) {
                    return Err(Rejection::CardNotInHand(id));
                }
                self.total_attempts += 1;
                if id == round.target().id {
                    self.score += 1;
                    self.show_correct = true;
                    round.resolved = true;
                    let due = env.now_ms + env.config.advance_delay_ms as f64;
                    self.advance = Some(self.schedule.schedule(TaskKind::AdvanceRound, round.id(), due));
                } else {
                    log::info!("wrong card {id}, answer was {}", round.target().id);
                    round.recitation.stop(&mut self.schedule);
                    self.state = GameState::Result;
                }
            }
            Command::StartRecitation => {
                self.expect_state(GameState::Playing)?;
                let round = self.round.as_mut().ok_or(Rejection::NoRound)?;
                if round.resolved {
                    return Err(Rejection::RoundResolved);
                }
                if round.recitation.started() {
                    return Err(Rejection::RecitationAlreadyStarted);
                }
                let round_id = round.id();
                round.recitation.start(
                    &mut self.schedule,
                    round_id,
                    env.now_ms,
                    self.recitation_speed_ms,
                );
            }
            Command::Resume => {
                self.expect_state(GameState::Result)?;
                self.deal_round(env);
                self.state = GameState::Playing;
            }
            Command::Skip => {
                self.expect_state(GameState::Playing)?;
                let round = self.round.as_mut().ok_or(Rejection::NoRound)?;
                if round.resolved {
                    return Err(Rejection::RoundResolved);
                }
                round.recitation.stop(&mut self.schedule);
                self.state = GameState::Result;
            }
            Command::End => {
                if self.state == GameState::Start {
                    return Err(Rejection::WrongState { actual: self.state });
                }
                self.schedule.cancel_all();
                self.advance = None;
                self.round = None;
                self.show_correct = false;
                self.score = 0;
                self.total_attempts = 0;
                self.state = GameState::Start;
            }
            Command::ShuffleHand => {
                self.expect_state(GameState::Playing)?;
                let round = self.round.as_mut().ok_or(Rejection::NoRound)?;
                round.hand.shuffle(env.rng);
            }
            Command::SetRecitationSpeed(ms) => {
                if !env.config.speed_in_range(ms) {
                    log::warn!(
                        "recitation speed {ms}ms rejected, allowed {}..={}",
                        env.config.min_speed_ms,
                        env.config.max_speed_ms
                    );
                    return Err(Rejection::SpeedOutOfRange(ms));
                }
                self.recitation_speed_ms = ms;
            }
            Command::Tick => self.fire_due(env),
        }
        Ok(())
    }

    fn expect_state(&self, wanted: GameState) -> Result<(), Rejection> {
        if self.state == wanted {
            Ok(())
        } else {
            Err(Rejection::WrongState { actual: self.state })
        }
    }

    fn fire_due<R: Rng + ?Sized>(&mut self, env: &mut Env<'_, R>) {
        while let Some(task) = self.schedule.pop_due(env.now_ms) {
            let current = self.round.as_ref().map(Round::id);
            if current != Some(task.round_id) {
                log::debug!("dropping stale {:?} for round {}", task.kind, task.round_id);
                continue;
            }
            match task.kind {
                TaskKind::RevealNext => {
                    if let Some(round) = self.round.as_mut() {
                        round.recitation.on_tick(
                            &mut self.schedule,
                            task.token,
                            task.round_id,
                            task.due_ms,
                            self.recitation_speed_ms,
                        );
                    }
                }
                TaskKind::AdvanceRound => {
                    if self.advance != Some(task.token) {
                        continue;
                    }
                    self.advance = None;
                    if self.state == GameState::Playing {
                        self.deal_round(env);
                    }
                }
            }
        }
    }

    /// Replace the current round, cancelling everything scheduled for the old one.
    fn deal_round<R: Rng + ?Sized>(&mut self, env: &mut Env<'_, R>) {
        if let Some(old) = self.round.as_mut() {
            old.recitation.stop(&mut self.schedule);
        }
        if let Some(token) = self.advance.take() {
            self.schedule.cancel(token);
        }
        self.rounds_dealt += 1;
        self.round = Some(generate_round(
            env.dataset,
            env.config.hand_size,
            self.rounds_dealt,
            env.rng,
        ));
        self.show_correct = false;
    }
}

/// Owns everything a running game needs and drives the session reducer.
pub struct Game<R: Rng = StdRng> {
    dataset: Dataset,
    config: GameConfig,
    rng: R,
    session: Session,
}

impl<R: Rng> Game<R> {
    pub fn new(dataset: Dataset, config: GameConfig, rng: R) -> Self {
        let session = Session::new(&config);
        Self { dataset, config, rng, session }
    }

    pub fn dispatch(&mut self, command: Command, now_ms: f64) {
        let session = std::mem::take(&mut self.session);
        let mut env = Env {
            dataset: &self.dataset,
            config: &self.config,
            rng: &mut self.rng,
            now_ms,
        };
        self.session = session.reduce(command, &mut env);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poems::tests::numbered;
    use rand::SeedableRng;

    struct Fixture {
        dataset: Dataset,
        config: GameConfig,
        rng: StdRng,
    }

    impl Fixture {
        fn new() -> Self {
            Self { dataset: numbered(12), config: GameConfig::default(), rng: StdRng::seed_from_u64(42) }
        }

        fn step(&mut self, session: Session, command: Command, now_ms: f64) -> Session {
            let mut env = Env {
                dataset: &self.dataset,
                config: &self.config,
                rng: &mut self.rng,
                now_ms,
            };
            session.reduce(command, &mut env)
        }

        /// A playing session whose round targets poem 5 and also holds poem 7,
        /// dealt by the seeded generator.
        fn playing_with_target_5(&mut self) -> Session {
            let session = self.step(Session::new(&self.config), Command::Begin, 0.0);
            let round = (0..)
                .map(|seed| {
                    let mut rng = StdRng::seed_from_u64(seed);
                    generate_round(&self.dataset, 10, session.rounds_dealt, &mut rng)
                })
                .find(|r| r.target().id == 5 && r.hand().contains(7))
                .unwrap();
            Session { round: Some(round), ..session }
        }
    }

    #[test]
    fn begin_resets_counters_and_deals() {
        let mut fx = Fixture::new();
        let mut s = Session::new(&fx.config);
        s.score = 3;
        s.total_attempts = 9;
        let s = fx.step(s, Command::Begin, 0.0);
        assert_eq!(s.state(), GameState::Playing);
        assert_eq!((s.score(), s.total_attempts()), (0, 0));
        assert_eq!(s.round().unwrap().hand.len(), 10);
        assert!(s.can_start_recitation());
    }

    #[test]
    fn correct_pick_scores_and_advances_after_delay() {
        let mut fx = Fixture::new();
        let s = fx.playing_with_target_5();
        let first_round = s.round().unwrap().id();
        let s = fx.step(s, Command::SelectCard(5), 100.0);
        assert_eq!((s.score(), s.total_attempts()), (1, 1));
        assert!(s.show_correct());
        assert!(s.advance_pending());
        assert_eq!(s.round().unwrap().id(), first_round);

        let s = fx.step(s, Command::Tick, 1599.0);
        assert_eq!(s.round().unwrap().id(), first_round, "advance fired early");

        let s = fx.step(s, Command::Tick, 1600.0);
        assert_eq!(s.state(), GameState::Playing);
        assert_ne!(s.round().unwrap().id(), first_round);
        assert!(!s.show_correct());
        assert_eq!((s.score(), s.total_attempts()), (1, 1));
    }

    #[test]
    fn resolved_round_ignores_further_picks() {
        let mut fx = Fixture::new();
        let s = fx.playing_with_target_5();
        let s = fx.step(s, Command::SelectCard(5), 0.0);
        let s = fx.step(s, Command::SelectCard(5), 10.0);
        let s = fx.step(s, Command::SelectCard(7), 20.0);
        assert_eq!((s.score(), s.total_attempts()), (1, 1));
        assert_eq!(s.state(), GameState::Playing);
        assert!(!s.can_start_recitation());
    }

    #[test]
    fn wrong_pick_goes_to_result_and_keeps_target() {
        let mut fx = Fixture::new();
        let s = fx.playing_with_target_5();
        let s = fx.step(s, Command::SelectCard(7), 0.0);
        assert_eq!(s.state(), GameState::Result);
        assert_eq!((s.score(), s.total_attempts()), (0, 1));
        let target = s.round().unwrap().target();
        assert_eq!(target.id, 5);
        assert_eq!(target.second_half, "下の句5");
        assert!(!s.advance_pending());
    }

    #[test]
    fn skip_does_not_count_as_attempt() {
        let mut fx = Fixture::new();
        let s = fx.playing_with_target_5();
        let s = fx.step(s, Command::StartRecitation, 0.0);
        let s = fx.step(s, Command::Skip, 50.0);
        assert_eq!(s.state(), GameState::Result);
        assert_eq!((s.score(), s.total_attempts()), (0, 0));
        assert!(s.schedule().is_empty());
        assert_eq!(s.round().unwrap().target().id, 5);
    }

    #[test]
    fn resume_deals_fresh_round() {
        let mut fx = Fixture::new();
        let s = fx.playing_with_target_5();
        let s = fx.step(s, Command::StartRecitation, 0.0);
        let s = fx.step(s, Command::Tick, 1000.0);
        assert!(s.round().unwrap().recitation.revealed_len() > 0);
        let old = s.round().unwrap().id();
        let s = fx.step(s, Command::SelectCard(7), 1000.0);
        let s = fx.step(s, Command::Resume, 2000.0);
        assert_eq!(s.state(), GameState::Playing);
        let round = s.round().unwrap();
        assert_ne!(round.id(), old);
        assert_eq!(round.recitation.revealed_prefix(), "");
        assert!(!round.recitation.is_active());
        assert!(s.can_start_recitation());
    }

    #[test]
    fn recitation_starts_once_per_round() {
        let mut fx = Fixture::new();
        let s = fx.playing_with_target_5();
        let s = fx.step(s, Command::StartRecitation, 0.0);
        let s = fx.step(s, Command::Tick, 400.0);
        assert_eq!(s.round().unwrap().recitation.revealed_len(), 1);
        let s = fx.step(s, Command::StartRecitation, 450.0);
        assert_eq!(s.round().unwrap().recitation.revealed_len(), 1);
        assert_eq!(s.schedule().count(TaskKind::RevealNext), 1);
        assert!(!s.can_start_recitation());
    }

    #[test]
    fn recitation_runs_to_completion() {
        let mut fx = Fixture::new();
        let s = fx.playing_with_target_5();
        let full = s.round().unwrap().target().full_text().chars().count();
        let mut s = fx.step(s, Command::StartRecitation, 0.0);
        for i in 1..=full {
            s = fx.step(s, Command::Tick, (i * 400) as f64);
            assert_eq!(s.round().unwrap().recitation.revealed_len(), i);
        }
        assert!(!s.round().unwrap().recitation.is_active());
        assert!(s.schedule().is_empty());
    }

    #[test]
    fn stale_advance_never_replaces_newer_round() {
        let mut fx = Fixture::new();
        let s = fx.playing_with_target_5();
        let s = fx.step(s, Command::SelectCard(5), 0.0);
        let s = fx.step(s, Command::End, 100.0);
        assert_eq!(s.state(), GameState::Start);
        assert!(s.schedule().is_empty());
        let s = fx.step(s, Command::Begin, 200.0);
        let dealt = s.round().unwrap().id();
        let s = fx.step(s, Command::Tick, 10_000.0);
        assert_eq!(s.round().unwrap().id(), dealt);
        assert_eq!((s.score(), s.total_attempts()), (0, 0));
    }

    #[test]
    fn reveal_task_from_previous_round_is_dropped() {
        let mut fx = Fixture::new();
        let mut s = fx.playing_with_target_5();
        let old_id = s.round().unwrap().id();
        s.schedule.schedule(TaskKind::RevealNext, old_id.wrapping_sub(1), 0.0);
        let s = fx.step(s, Command::Tick, 5.0);
        assert_eq!(s.round().unwrap().recitation.revealed_len(), 0);
        assert!(s.schedule().is_empty());
    }

    #[test]
    fn invalid_commands_are_noops() {
        let mut fx = Fixture::new();
        let start = Session::new(&fx.config);
        for cmd in [
            Command::SelectCard(1),
            Command::StartRecitation,
            Command::Resume,
            Command::Skip,
            Command::End,
            Command::ShuffleHand,
            Command::Tick,
        ] {
            assert_eq!(fx.step(start.clone(), cmd, 0.0), start, "{cmd:?}");
        }
        let playing = fx.playing_with_target_5();
        let outsider = (1..=12).find(|id| !playing.round().unwrap().hand.contains(*id)).unwrap();
        for cmd in [Command::SelectCard(outsider), Command::Begin, Command::Resume] {
            assert_eq!(fx.step(playing.clone(), cmd, 0.0), playing, "{cmd:?}");
        }
    }

    #[test]
    fn shuffle_only_reorders() {
        let mut fx = Fixture::new();
        let s = fx.playing_with_target_5();
        let mut before = s.round().unwrap().hand.ids();
        let s = fx.step(s, Command::ShuffleHand, 0.0);
        let mut after = s.round().unwrap().hand.ids();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
        assert_eq!(s.round().unwrap().target().id, 5);
    }

    #[test]
    fn speed_changes_respect_bounds() {
        let mut fx = Fixture::new();
        let s = Session::new(&fx.config);
        let s = fx.step(s, Command::SetRecitationSpeed(150), 0.0);
        assert_eq!(s.recitation_speed_ms(), 150);
        let s = fx.step(s, Command::SetRecitationSpeed(5), 0.0);
        assert_eq!(s.recitation_speed_ms(), 150);
    }

    #[test]
    fn game_wrapper_dispatches() {
        let mut game = Game::new(numbered(12), GameConfig::default(), StdRng::seed_from_u64(1));
        game.dispatch(Command::Begin, 0.0);
        assert_eq!(game.session().state(), GameState::Playing);
        let target = game.session().round().unwrap().target().id;
        game.dispatch(Command::SelectCard(target), 10.0);
        assert_eq!(game.snapshot().score, 1);
    }
}
