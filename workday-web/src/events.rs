//! Event names and detail parsing shared by the browser bridge.
use serde_json::Value;
use workday_game::JumpRequest;

/// Engine to host: fired on `window` once per scene entry.
pub const GAME_STATE_EVENT: &str = "game-state";
/// Host to engine: `detail = { stageIndex: number }`, zero-based.
pub const JUMP_EVENT: &str = "jump-to-stage";

/// Read a `jump-to-stage` detail payload.
///
/// JavaScript numbers arrive as floats, so integral floats are accepted.
/// Anything without a usable `stageIndex` is rejected; range checking is left
/// to the session, which clamps.
#[must_use]
pub fn parse_jump_detail(detail: &Value) -> Option<JumpRequest> {
    let raw = detail.get("stageIndex")?;
    let stage_index = raw.as_i64().or_else(|| {
        raw.as_f64()
            .filter(|value| value.is_finite() && value.fract() == 0.0)
            .map(saturating_f64_to_i64)
    })?;
    Some(JumpRequest { stage_index })
}

#[allow(clippy::cast_possible_truncation)]
fn saturating_f64_to_i64(value: f64) -> i64 {
    // `as` saturates at the integer bounds.
    value as i64
}
