// Integration tests (native) for the `hyakunin-karuta` crate.
// These tests avoid wasm-specific functionality and drive the public game API
// the same way the browser loop does.

use std::collections::HashSet;

use hyakunin_karuta::input::command_for_key;
use hyakunin_karuta::{Command, Dataset, Game, GameConfig, GameState};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn new_game(seed: u64) -> Game {
    let config = GameConfig::default();
    let dataset = Dataset::builtin(config.hand_size).unwrap();
    Game::new(dataset, config, StdRng::seed_from_u64(seed))
}

fn target(game: &Game) -> u32 {
    game.session().round().unwrap().target().id
}

fn wrong_card(game: &Game) -> u32 {
    let t = target(game);
    game.snapshot().hand.iter().map(|c| c.id).find(|&id| id != t).unwrap()
}

#[test]
fn snapshot_json_is_null_before_start() {
    assert_eq!(hyakunin_karuta::snapshot_json(), "null");
}

#[test]
fn full_session_by_keyboard() {
    let mut game = new_game(2024);
    game.dispatch(Command::Begin, 0.0);

    let snap = game.snapshot();
    assert_eq!(snap.hand.len(), 10);
    assert!(snap.can_start_recitation);

    // Space starts the recitation; the reveal follows the clock.
    let cmd = command_for_key("Space", " ", &snap).unwrap();
    game.dispatch(cmd, 0.0);
    game.dispatch(Command::Tick, 1200.0);
    let snap = game.snapshot();
    assert!(snap.recitation_active);
    assert_eq!(snap.revealed_text.chars().count(), 3);

    // Pick the right card by its digit key.
    let slot = snap.hand.iter().position(|c| c.id == target(&game)).unwrap();
    let key = snap.hand[slot].slot.clone();
    let cmd = command_for_key(&format!("Digit{key}"), &key, &snap).unwrap();
    game.dispatch(cmd, 1300.0);
    assert!(game.snapshot().show_correct);
    assert_eq!(game.snapshot().score, 1);

    game.dispatch(Command::Tick, 2800.0);
    let snap = game.snapshot();
    assert_eq!(snap.state, GameState::Playing);
    assert!(!snap.show_correct);
    assert_eq!(snap.revealed_text, "");
    assert!(snap.can_start_recitation);

    // Miss, then resume with space.
    let miss = wrong_card(&game);
    let answer_id = target(&game);
    game.dispatch(Command::SelectCard(miss), 3000.0);
    let snap = game.snapshot();
    assert_eq!(snap.state, GameState::Result);
    assert_eq!((snap.score, snap.total_attempts), (1, 2));
    let answer = snap.answer.as_ref().unwrap();
    assert_eq!(answer.id, answer_id);
    assert_eq!(answer.deciding_prefix.chars().filter(|c| !c.is_whitespace()).count(), answer.deciding_prefix_len);

    let cmd = command_for_key("Space", " ", &snap).unwrap();
    assert_eq!(cmd, Command::Resume);
    game.dispatch(cmd, 3100.0);
    assert_eq!(game.snapshot().state, GameState::Playing);

    game.dispatch(Command::Skip, 3200.0);
    assert_eq!(game.snapshot().total_attempts, 2);
    game.dispatch(Command::End, 3300.0);
    let snap = game.snapshot();
    assert_eq!(snap.state, GameState::Start);
    assert!(snap.hand.is_empty());
}

#[test]
fn many_rounds_keep_hands_valid() {
    let mut game = new_game(9);
    game.dispatch(Command::Begin, 0.0);
    let mut now = 0.0;
    for _ in 0..200 {
        let ids: HashSet<u32> = game.snapshot().hand.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 10);
        assert!(ids.contains(&target(&game)));
        game.dispatch(Command::SelectCard(target(&game)), now);
        now += 1500.0;
        game.dispatch(Command::Tick, now);
    }
    assert_eq!(game.snapshot().score, 200);
}

#[test]
fn speed_change_applies_to_next_reveal() {
    let mut game = new_game(5);
    game.dispatch(Command::Begin, 0.0);
    game.dispatch(Command::StartRecitation, 0.0);
    game.dispatch(Command::Tick, 400.0);
    game.dispatch(Command::SetRecitationSpeed(100), 410.0);
    // Next reveal was already booked at 800; the one after uses the new speed.
    game.dispatch(Command::Tick, 800.0);
    game.dispatch(Command::Tick, 900.0);
    assert_eq!(game.snapshot().revealed_text.chars().count(), 3);
    assert_eq!(game.snapshot().recitation_speed_ms, 100);
}

#[test]
fn custom_config_and_dataset() {
    let config = GameConfig::from_json(r#"{"hand_size": 4, "advance_delay_ms": 10}"#).unwrap();
    let json = r#"[
        {"id": 1, "first_half": "a", "second_half": "b"},
        {"id": 2, "first_half": "c", "second_half": "d"},
        {"id": 3, "first_half": "e", "second_half": "f"},
        {"id": 4, "first_half": "g", "second_half": "h"},
        {"id": 5, "first_half": "", "second_half": "h"}
    ]"#;
    let dataset = Dataset::from_json(json, config.hand_size).unwrap();
    let mut game = Game::new(dataset, config, StdRng::seed_from_u64(0));
    game.dispatch(Command::Begin, 0.0);
    assert_eq!(game.snapshot().hand.len(), 4);
    let t = target(&game);
    game.dispatch(Command::SelectCard(t), 0.0);
    game.dispatch(Command::Tick, 10.0);
    assert!(!game.snapshot().show_correct);
}
