//! State broadcast bridge between the engine and its host.
//!
//! Outbound, every scene entry produces one [`StateSnapshot`] delivered
//! synchronously to each subscriber in subscription order. Inbound, the host
//! queues [`JumpRequest`]s through a cloneable [`JumpSender`]; the router
//! drains them on its next step.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::catalog::{ControllerKey, Period};
use crate::grade::GradeTier;
use crate::scene::SceneKey;

/// Wire shape of the `game-state` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub scene: SceneKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<ControllerKey>,
    pub progress: usize,
    pub all_cleared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<GradeTier>,
}

impl StateSnapshot {
    /// Snapshot carrying only the required fields.
    #[must_use]
    pub const fn bare(scene: SceneKey, progress: usize, all_cleared: bool) -> Self {
        Self {
            scene,
            stage_id: None,
            variant: None,
            progress,
            all_cleared,
            stress: None,
            time: None,
            period: None,
            success_count: None,
            grade: None,
        }
    }
}

/// Host request to force the session onto a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpRequest {
    /// Zero-based; out-of-range values are clamped, never rejected.
    pub stage_index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Subscriber = Box<dyn FnMut(&StateSnapshot)>;

/// Cloneable handle a host uses to queue jump requests.
#[derive(Clone, Default)]
pub struct JumpSender {
    queue: Rc<RefCell<VecDeque<JumpRequest>>>,
}

impl JumpSender {
    pub fn request_jump(&self, stage_index: i64) {
        self.queue
            .borrow_mut()
            .push_back(JumpRequest { stage_index });
    }

    pub fn send(&self, request: JumpRequest) {
        self.queue.borrow_mut().push_back(request);
    }
}

impl fmt::Debug for JumpSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JumpSender")
            .field("queued", &self.queue.borrow().len())
            .finish()
    }
}

#[derive(Default)]
pub struct BroadcastBridge {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
    jumps: JumpSender,
    published: u64,
}

impl BroadcastBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, snapshot: &StateSnapshot) {
        self.published += 1;
        for (_, subscriber) in &mut self.subscribers {
            subscriber(snapshot);
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Total snapshots published since construction.
    #[must_use]
    pub const fn published(&self) -> u64 {
        self.published
    }

    #[must_use]
    pub fn jump_sender(&self) -> JumpSender {
        self.jumps.clone()
    }

    /// Pop the oldest queued jump request.
    pub fn take_jump(&mut self) -> Option<JumpRequest> {
        self.jumps.queue.borrow_mut().pop_front()
    }
}

impl fmt::Debug for BroadcastBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastBridge")
            .field("subscribers", &self.subscribers.len())
            .field("published", &self.published)
            .field("jumps", &self.jumps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_preserves_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bridge = BroadcastBridge::new();
        for tag in ["a", "b", "c"] {
            let seen = Rc::clone(&seen);
            bridge.subscribe(Box::new(move |snapshot: &StateSnapshot| {
                seen.borrow_mut().push((tag, snapshot.scene));
            }));
        }
        bridge.publish(&StateSnapshot::bare(SceneKey::Boot, 0, false));
        assert_eq!(
            *seen.borrow(),
            vec![("a", SceneKey::Boot), ("b", SceneKey::Boot), ("c", SceneKey::Boot)]
        );
        assert_eq!(bridge.published(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0_u32));
        let mut bridge = BroadcastBridge::new();
        let counter = Rc::clone(&count);
        let id = bridge.subscribe(Box::new(move |_: &StateSnapshot| *counter.borrow_mut() += 1));
        bridge.publish(&StateSnapshot::bare(SceneKey::Narrative, 0, false));
        assert!(bridge.unsubscribe(id));
        assert!(!bridge.unsubscribe(id));
        bridge.publish(&StateSnapshot::bare(SceneKey::Narrative, 0, false));
        assert_eq!(*count.borrow(), 1);
        assert_eq!(bridge.subscriber_count(), 0);
    }

    #[test]
    fn jump_requests_queue_in_order() {
        let mut bridge = BroadcastBridge::new();
        let sender = bridge.jump_sender();
        sender.request_jump(3);
        sender.clone().request_jump(-1);
        assert_eq!(bridge.take_jump(), Some(JumpRequest { stage_index: 3 }));
        assert_eq!(bridge.take_jump(), Some(JumpRequest { stage_index: -1 }));
        assert_eq!(bridge.take_jump(), None);
    }

    #[test]
    fn snapshot_wire_shape_uses_camel_case_and_omits_absent_fields() {
        let mut snapshot = StateSnapshot::bare(SceneKey::Minigame, 2, false);
        snapshot.stage_id = Some(3);
        snapshot.variant = Some(ControllerKey::MenuRoulette);
        snapshot.period = Some(Period::Pm);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "scene": "minigame",
                "stageId": 3,
                "variant": "menu_roulette",
                "progress": 2,
                "allCleared": false,
                "period": "PM"
            })
        );

        let bare = serde_json::to_value(StateSnapshot::bare(SceneKey::StageSelect, 0, true)).unwrap();
        assert_eq!(
            bare,
            serde_json::json!({"scene": "stage-select", "progress": 0, "allCleared": true})
        );
    }

    #[test]
    fn jump_request_reads_camel_case() {
        let request: JumpRequest = serde_json::from_str(r#"{"stageIndex": 7}"#).unwrap();
        assert_eq!(request.stage_index, 7);
    }
}
