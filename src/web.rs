//! Browser front end: DOM overlays, event listeners and the animation loop.
//!
//! The game lives in a thread-local. Listeners translate events into commands
//! through `input`, and every frame feeds `performance.now()` to the session as
//! a `Tick` before re-rendering the snapshot. Rendering only touches the DOM
//! when the snapshot changed.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, window};

use crate::config::GameConfig;
use crate::game::{Command, Game, GameState};
use crate::input;
use crate::poems::Dataset;
use crate::view::{Snapshot, slot_label};

const SLOT_COUNT: usize = 10;

struct WebGame {
    game: Game,
    last_rendered: Option<Snapshot>,
}

thread_local! {
    static GAME: RefCell<Option<WebGame>> = const { RefCell::new(None) };
    // DOM and listeners are created once; a restart only swaps the game.
    static WIRED: RefCell<bool> = const { RefCell::new(false) };
}

pub fn start(config: GameConfig) -> Result<(), JsValue> {
    log::set_max_level(config.level_filter()?.to_level_filter());
    let dataset = Dataset::builtin(config.hand_size)?;
    let game = Game::new(dataset, config, StdRng::from_entropy());
    GAME.with(|g| g.replace(Some(WebGame { game, last_rendered: None })));

    if WIRED.with(|w| *w.borrow()) {
        return Ok(());
    }
    wire_page()?;
    WIRED.with(|w| w.replace(true));
    start_loop();
    log::info!("karuta: started");
    Ok(())
}

// A failed attempt removes its partial overlay so the next start builds afresh.
fn wire_page() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let wired = build_overlay(&doc)
        .and_then(|_| wire_buttons(&doc))
        .and_then(|_| wire_keyboard(&doc));
    if let Err(err) = wired {
        log::error!("karuta: wiring the page failed: {err:?}");
        if let Some(root) = doc.get_element_by_id("hk-root") {
            root.remove();
        }
        return Err(err);
    }
    Ok(())
}

pub fn dispatch(command: Command) {
    let now = now_ms();
    GAME.with(|cell| {
        if let Some(web) = cell.borrow_mut().as_mut() {
            web.game.dispatch(command, now);
        }
    });
}

pub fn snapshot() -> Option<Snapshot> {
    GAME.with(|cell| cell.borrow().as_ref().map(|web| web.game.snapshot()))
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

// --- DOM construction -------------------------------------------------------

fn append(
    doc: &Document,
    parent: &Element,
    tag: &str,
    id: &str,
    style: &str,
    text: &str,
) -> Result<Element, JsValue> {
    let el = doc.create_element(tag)?;
    if !id.is_empty() {
        el.set_id(id);
    }
    if !style.is_empty() {
        el.set_attribute("style", style)?;
    }
    if !text.is_empty() {
        el.set_text_content(Some(text));
    }
    parent.append_child(&el)?;
    Ok(el)
}

const BUTTON_STYLE: &str = "margin:0 6px; padding:8px 18px; border-radius:999px; border:1px solid #555; background:#f59e0b; color:#fff; font-weight:bold; cursor:pointer;";
const SLOT_STYLE: &str = "position:relative; height:180px; background:#fff; color:#1e293b; border:none; border-radius:8px; box-shadow:0 4px 12px rgba(0,0,0,0.3); white-space:pre-line; font-size:14px; cursor:pointer; padding:24px 8px 8px;";

fn build_overlay(doc: &Document) -> Result<(), JsValue> {
    if doc.get_element_by_id("hk-root").is_some() {
        return Ok(());
    }
    let body: Element = doc
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .into();
    let root = append(doc, &body, "div", "hk-root", "min-height:100vh; background:#0f172a; color:#fff; font-family:'Noto Serif JP', serif; padding:24px;", "")?;

    let header = append(doc, &root, "div", "", "display:flex; justify-content:space-between; border-bottom:1px solid #334155; padding-bottom:12px;", "")?;
    append(doc, &header, "h1", "", "color:#fbbf24; margin:0;", "百人一首")?;
    append(doc, &header, "div", "hk-score", "font-size:28px; color:#fbbf24;", "0 / 0")?;

    // Start
    let start = append(doc, &root, "div", "hk-start", "text-align:center; margin-top:15vh;", "")?;
    append(doc, &start, "h2", "", "font-size:40px; color:#fcd34d;", "いざ、勝負。")?;
    append(
        doc,
        &start,
        "p",
        "",
        "white-space:pre-line; color:#cbd5e1;",
        "手札を確認し、「札を読む」（スペースキー）で読み上げを開始します。\n対応する下の句の札を選んでください（数字キー 1〜0）。",
    )?;
    append(doc, &start, "button", "hk-begin", BUTTON_STYLE, "ゲーム開始")?;

    // Playing
    let play = append(doc, &root, "div", "hk-play", "margin-top:24px;", "")?;
    append(doc, &play, "p", "hk-recite", "font-size:32px; min-height:48px; text-align:center; color:#fcd34d; background:#1e293b; padding:24px; border-radius:8px;", "...")?;
    let controls = append(doc, &play, "div", "", "text-align:center; margin:16px 0;", "")?;
    append(doc, &controls, "button", "hk-read", BUTTON_STYLE, "札を読む")?;
    append(doc, &controls, "button", "hk-shuffle", BUTTON_STYLE, "手札を混ぜる")?;
    append(doc, &controls, "button", "hk-pass", BUTTON_STYLE, "パスする")?;
    let hand = append(doc, &play, "div", "hk-hand", "position:relative; display:grid; grid-template-columns:repeat(5, 1fr); gap:16px;", "")?;
    for slot in 0..SLOT_COUNT {
        append(doc, &hand, "button", &format!("hk-slot-{slot}"), SLOT_STYLE, "")?;
    }
    append(doc, &hand, "div", "hk-correct", "position:absolute; inset:0; text-align:center; padding-top:140px; font-size:40px; color:#4ade80; pointer-events:none;", "正解！")?;

    // Result
    let result = append(doc, &root, "div", "hk-result", "max-width:640px; margin:10vh auto; background:#1e293b; padding:32px; border-radius:12px;", "")?;
    append(doc, &result, "h2", "", "color:#f87171; text-align:center;", "残念...")?;
    append(doc, &result, "p", "hk-answer-head", "font-size:18px;", "")?;
    let reading = append(doc, &result, "p", "", "font-size:18px;", "")?;
    append(doc, &reading, "span", "hk-answer-prefix", "color:#fbbf24;", "")?;
    append(doc, &reading, "span", "hk-answer-rest", "", "")?;
    append(doc, &result, "p", "hk-answer-first", "font-size:18px;", "")?;
    append(doc, &result, "p", "hk-answer-second", "font-size:18px;", "")?;
    append(doc, &result, "p", "hk-answer-author", "color:#cbd5e1;", "")?;
    let buttons = append(doc, &result, "div", "", "text-align:center;", "")?;
    append(doc, &buttons, "button", "hk-next", BUTTON_STYLE, "次の問題へ")?;
    append(doc, &buttons, "button", "hk-end", BUTTON_STYLE, "ゲーム終了")?;
    Ok(())
}

// --- Listeners --------------------------------------------------------------

fn on_click(
    doc: &Document,
    id: &str,
    to_command: impl Fn(&Snapshot) -> Option<Command> + 'static,
) -> Result<(), JsValue> {
    let el = doc
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?;
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
        if let Some(command) = snapshot().and_then(|snap| to_command(&snap)) {
            dispatch(command);
        }
    }) as Box<dyn FnMut(_)>);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn wire_buttons(doc: &Document) -> Result<(), JsValue> {
    on_click(doc, "hk-begin", |_| Some(Command::Begin))?;
    on_click(doc, "hk-read", |_| Some(Command::StartRecitation))?;
    on_click(doc, "hk-shuffle", |_| Some(Command::ShuffleHand))?;
    on_click(doc, "hk-pass", |_| Some(Command::Skip))?;
    on_click(doc, "hk-next", |_| Some(Command::Resume))?;
    on_click(doc, "hk-end", |_| Some(Command::End))?;
    for slot in 0..SLOT_COUNT {
        on_click(doc, &format!("hk-slot-{slot}"), move |snap| input::command_for_slot(slot, snap))?;
    }
    Ok(())
}

fn wire_keyboard(doc: &Document) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
        if evt.repeat() {
            return;
        }
        let Some(snap) = snapshot() else { return };
        if let Some(command) = input::command_for_key(&evt.code(), &evt.key(), &snap) {
            // Space would otherwise scroll the page.
            evt.prevent_default();
            dispatch(command);
        }
    }) as Box<dyn FnMut(_)>);
    doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// --- Loop & rendering -------------------------------------------------------

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        GAME.with(|cell| {
            if let Some(web) = cell.borrow_mut().as_mut() {
                web.game.dispatch(Command::Tick, ts);
                let snap = web.game.snapshot();
                if web.last_rendered.as_ref() != Some(&snap) {
                    render(&snap);
                    web.last_rendered = Some(snap);
                }
            }
        });
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

fn set_text(doc: &Document, id: &str, text: &str) {
    if let Some(el) = doc.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

fn set_shown(doc: &Document, id: &str, shown: bool) {
    if let Some(el) = doc.get_element_by_id(id) {
        let _ = if shown {
            el.remove_attribute("hidden")
        } else {
            el.set_attribute("hidden", "")
        };
    }
}

fn render(snap: &Snapshot) {
    let Some(doc) = window().and_then(|w| w.document()) else { return };
    set_text(&doc, "hk-score", &format!("{} / {}", snap.score, snap.total_attempts));
    set_shown(&doc, "hk-start", snap.state == GameState::Start);
    set_shown(&doc, "hk-play", snap.state == GameState::Playing);
    set_shown(&doc, "hk-result", snap.state == GameState::Result);
    set_shown(&doc, "hk-correct", snap.show_correct);

    let recited = if snap.revealed_text.is_empty() { "..." } else { snap.revealed_text.as_str() };
    set_text(&doc, "hk-recite", recited);
    if let Some(read) = doc.get_element_by_id("hk-read") {
        let _ = if snap.can_start_recitation {
            read.remove_attribute("disabled")
        } else {
            read.set_attribute("disabled", "")
        };
    }

    for slot in 0..SLOT_COUNT {
        let id = format!("hk-slot-{slot}");
        match snap.hand.get(slot) {
            Some(card) => {
                set_text(&doc, &id, &format!("{}\n{}\n\n{}", slot_label(slot), card.author, card.second_half));
                set_shown(&doc, &id, true);
            }
            None => set_shown(&doc, &id, false),
        }
    }

    if let Some(answer) = &snap.answer {
        set_text(
            &doc,
            "hk-answer-head",
            &format!("{}番　{}字決まり", answer.id, answer.deciding_prefix_len),
        );
        set_text(&doc, "hk-answer-prefix", &answer.deciding_prefix);
        set_text(&doc, "hk-answer-rest", &answer.reading_rest);
        set_text(&doc, "hk-answer-first", &format!("上の句　{}", answer.first_half));
        set_text(&doc, "hk-answer-second", &format!("下の句　{}", answer.second_half));
        set_text(&doc, "hk-answer-author", &format!("作者　{}（{}）", answer.author, answer.author_kana));
    }
}
