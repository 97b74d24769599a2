//! `wasm-bindgen` entry points for the host page.
//!
//! Host listeners run synchronously inside `dispatchEvent`, so any export may
//! be re-entered while the runner is mid-update. Those calls never panic: jumps
//! are queued and applied on the next update, other input is dropped with a
//! warning, and `game_state` falls back to the last broadcast snapshot.
use std::cell::RefCell;

use crate::bridge::{JumpListener, dispatch_state};
use crate::dom;
use crate::runner::{WebRunner, seed_from_f64};
use log::{info, warn};
use wasm_bindgen::prelude::*;
use workday_game::{JumpSender, StateSnapshot};

thread_local! {
    static RUNNER: RefCell<Option<WebRunner>> = const { RefCell::new(None) };
    static JUMPS: RefCell<Option<JumpSender>> = const { RefCell::new(None) };
    static LAST_STATE: RefCell<Option<StateSnapshot>> = const { RefCell::new(None) };
    static LISTENER: RefCell<Option<JumpListener>> = const { RefCell::new(None) };
}

/// Create (or replace) the page's session and broadcast the boot scene.
///
/// `config_json` may be empty to use the default configuration.
///
/// # Errors
///
/// Returns an error if the config is invalid or the jump listener cannot be
/// registered.
#[wasm_bindgen]
pub fn game_init(config_json: &str, seed: f64) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // Already initialised on a second call.
    let _ = console_log::init_with_level(log::Level::Info);

    if RUNNER.with(|slot| slot.try_borrow_mut().is_err()) {
        return Err(JsValue::from_str("game_init called while the session is broadcasting"));
    }
    LISTENER.with(|slot| slot.borrow_mut().take());
    RUNNER.with(|slot| slot.borrow_mut().take());
    let runner = WebRunner::new(config_json, seed_from_f64(seed), |router| {
        router.subscribe(Box::new(|snapshot: &StateSnapshot| {
            LAST_STATE.with(|last| {
                if let Ok(mut last) = last.try_borrow_mut() {
                    *last = Some(snapshot.clone());
                }
            });
            if let Err(err) = dispatch_state(snapshot) {
                dom::console_error(&dom::js_error_message(&err));
            }
        }));
    })
    .map_err(|err| JsValue::from_str(&format!("{err:#}")))?;

    let sender = runner.jump_sender();
    JUMPS.with(|slot| *slot.borrow_mut() = Some(sender.clone()));
    RUNNER.with(|slot| *slot.borrow_mut() = Some(runner));
    let listener = JumpListener::attach(sender, flush_jumps)?;
    LISTENER.with(|slot| *slot.borrow_mut() = Some(listener));
    info!("workday session initialised");
    Ok(())
}

/// Advance the session clock by `dt_ms` milliseconds.
#[wasm_bindgen]
pub fn game_tick(dt_ms: f64) {
    with_runner("game_tick", |runner| runner.tick(dt_ms));
}

#[wasm_bindgen]
pub fn game_confirm() {
    with_runner("game_confirm", WebRunner::confirm);
}

/// Report the running minigame as won.
#[wasm_bindgen]
pub fn game_pass() {
    with_runner("game_pass", WebRunner::pass);
}

/// Report the running minigame as lost.
#[wasm_bindgen]
pub fn game_fail() {
    with_runner("game_fail", WebRunner::fail);
}

#[wasm_bindgen]
pub fn game_select_stage(stage_id: u32) {
    with_runner("game_select_stage", |runner| runner.select_stage(stage_id));
}

/// Jump straight into a stage's minigame by zero-based index.
#[wasm_bindgen]
pub fn game_jump(stage_index: i32) {
    let queued = JUMPS.with(|slot| {
        slot.borrow().as_ref().is_some_and(|sender| {
            sender.request_jump(i64::from(stage_index));
            true
        })
    });
    if queued {
        flush_jumps();
    } else {
        warn!("game_jump called before game_init");
    }
}

/// Current snapshot, or `null` before `game_init`.
#[wasm_bindgen]
pub fn game_state() -> JsValue {
    let current = RUNNER.with(|slot| {
        slot.try_borrow()
            .ok()
            .and_then(|runner| runner.as_ref().map(WebRunner::snapshot))
    });
    let snapshot = current.or_else(|| {
        LAST_STATE.with(|last| last.try_borrow().ok().and_then(|last| last.clone()))
    });
    snapshot
        .and_then(|snapshot| serde_wasm_bindgen::to_value(&snapshot).ok())
        .unwrap_or(JsValue::NULL)
}

/// Apply queued jumps now unless the runner is busy; a busy runner drains
/// them itself on its next update.
fn flush_jumps() {
    RUNNER.with(|slot| {
        if let Ok(mut runner) = slot.try_borrow_mut()
            && let Some(runner) = runner.as_mut()
        {
            runner.tick(0.0);
        }
    });
}

fn with_runner(caller: &str, action: impl FnOnce(&mut WebRunner)) {
    RUNNER.with(|slot| match slot.try_borrow_mut() {
        Ok(mut runner) => match runner.as_mut() {
            Some(runner) => action(runner),
            None => warn!("{caller} called before game_init"),
        },
        Err(_) => warn!("{caller} ignored while the session is broadcasting"),
    });
}
