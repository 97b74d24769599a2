//! DOM side of the broadcast bridge.
use crate::dom;
use crate::events::{GAME_STATE_EVENT, JUMP_EVENT, parse_jump_detail};
use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit, Window};
use workday_game::{JumpSender, StateSnapshot};

/// Fire a `game-state` event on `window` carrying the snapshot as `detail`.
pub(crate) fn dispatch_state(snapshot: &StateSnapshot) -> Result<(), JsValue> {
    let window = dom::window().ok_or_else(|| JsValue::from_str("no window available"))?;
    let detail = serde_wasm_bindgen::to_value(snapshot)?;
    let init = CustomEventInit::new();
    init.set_detail(&detail);
    let event = CustomEvent::new_with_event_init_dict(GAME_STATE_EVENT, &init)?;
    window.dispatch_event(&event)?;
    Ok(())
}

/// `jump-to-stage` listener registered on `window` for as long as it lives.
pub(crate) struct JumpListener {
    window: Window,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl JumpListener {
    /// Listen for jump requests and queue them on `sender`. `on_queued` runs
    /// after each accepted request so the caller can flush the queue.
    pub(crate) fn attach(
        sender: JumpSender,
        mut on_queued: impl FnMut() + 'static,
    ) -> Result<Self, JsValue> {
        let window = dom::window().ok_or_else(|| JsValue::from_str("no window available"))?;
        let callback = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let Some(custom) = event.dyn_ref::<CustomEvent>() else {
                debug!("ignoring {JUMP_EVENT} event without detail");
                return;
            };
            let detail = match serde_wasm_bindgen::from_value::<serde_json::Value>(custom.detail())
            {
                Ok(detail) => detail,
                Err(err) => {
                    warn!("unreadable {JUMP_EVENT} detail: {err}");
                    return;
                }
            };
            match parse_jump_detail(&detail) {
                Some(request) => {
                    sender.send(request);
                    on_queued();
                }
                None => warn!("{JUMP_EVENT} detail has no integral stageIndex: {detail}"),
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        window.add_event_listener_with_callback(JUMP_EVENT, callback.as_ref().unchecked_ref())?;
        Ok(Self { window, callback })
    }
}

impl Drop for JumpListener {
    fn drop(&mut self) {
        if let Err(err) = self
            .window
            .remove_event_listener_with_callback(JUMP_EVENT, self.callback.as_ref().unchecked_ref())
        {
            dom::console_error(&dom::js_error_message(&err));
        }
    }
}
