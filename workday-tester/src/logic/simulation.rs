use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::rc::Rc;

use log::debug;
use serde::Serialize;
use sha2::{Digest, Sha256};
use workday_game::constants::{STRESS_MAX, STRESS_MIN};
use workday_game::{
    FailurePolicy, GameConfig, GradeTier, ProgressionModel, SceneInput, SceneKey, SceneRouter,
    SceneView, SessionState, StageCatalog, StateSnapshot,
};

use crate::logic::policy::{MinigameAction, PlayerPolicy, PolicyKind};

/// Virtual time the driver lets pass when the active scene is waiting.
pub const STEP_MS: u64 = 250;
pub const DEFAULT_MAX_STEPS: usize = 20_000;
const MAX_RECORDED_VIOLATIONS: usize = 20;

/// Configuration for one headless session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub policy: PolicyKind,
    pub game: GameConfig,
    pub max_steps: usize,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(policy: PolicyKind, game: GameConfig, seed: u64) -> Self {
        Self {
            seed,
            policy,
            game,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Everything observed during one session.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub policy: PolicyKind,
    pub seed: u64,
    pub progression: ProgressionModel,
    pub failure_policy: FailurePolicy,
    /// Reached the ending scene before the step limit.
    pub completed: bool,
    pub grade: Option<GradeTier>,
    pub stress: i32,
    pub success_count: usize,
    pub restarts: usize,
    pub steps: usize,
    pub elapsed_ms: u64,
    pub broadcasts: usize,
    /// SHA-256 prefix over the serialized broadcast stream.
    pub transcript_digest: String,
    pub violations: Vec<String>,
}

impl RunReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Drive a router from boot to the ending (or the step limit) with the
/// configured policy, checking invariants after every step.
#[must_use]
pub fn run_simulation(config: &SimulationConfig) -> RunReport {
    let mut router = SceneRouter::with_builtin_data(config.game, config.seed);
    let transcript: Rc<RefCell<Vec<StateSnapshot>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&transcript);
    router.subscribe(Box::new(move |snapshot: &StateSnapshot| {
        sink.borrow_mut().push(snapshot.clone());
    }));

    let mut policy = config.policy.create_policy(config.seed);
    let mut checker = InvariantChecker::default();
    let mut decided_entry = None;
    let mut steps = 0;

    router.start();
    checker.check(0, &router, &transcript.borrow());
    while steps < config.max_steps && router.active_scene() != Some(SceneKey::Ending) {
        steps += 1;
        drive_step(&mut router, policy.as_mut(), &mut decided_entry);
        checker.check(steps, &router, &transcript.borrow());
    }

    let transcript = transcript.borrow();
    let completed = router.active_scene() == Some(SceneKey::Ending);
    let grade = transcript.last().and_then(|snapshot| snapshot.grade);
    let restarts = transcript
        .iter()
        .filter(|snapshot| snapshot.scene == SceneKey::Boot)
        .count()
        .saturating_sub(1);
    debug!(
        "{} seed {} finished after {steps} steps (completed: {completed})",
        policy.name(),
        config.seed
    );

    RunReport {
        policy: config.policy,
        seed: config.seed,
        progression: config.game.progression,
        failure_policy: config.game.failure_policy,
        completed,
        grade,
        stress: router.session().stress(),
        success_count: router.session().success_count(),
        restarts,
        steps,
        elapsed_ms: router.now_ms(),
        broadcasts: transcript.len(),
        transcript_digest: transcript_digest(&transcript),
        violations: checker.violations,
    }
}

fn drive_step(
    router: &mut SceneRouter,
    policy: &mut dyn PlayerPolicy,
    decided_entry: &mut Option<u64>,
) {
    let input = match router.controller_view() {
        Some(SceneView::Boot { fading: false })
        | Some(SceneView::Narrative {
            can_advance: true, ..
        }) => Some(SceneInput::Confirm),
        Some(SceneView::StageSelect { .. }) => {
            next_open_stage(router.session(), router.catalog()).map(SceneInput::SelectStage)
        }
        Some(SceneView::Minigame {
            stage_id,
            variant_id,
            finished: None,
            ..
        }) if *decided_entry != Some(router.scene_entries()) => {
            *decided_entry = Some(router.scene_entries());
            let stage = router.catalog().stage(stage_id);
            let variant = stage
                .variant(variant_id)
                .unwrap_or_else(|| stage.first_variant());
            match policy.decide(stage, variant) {
                MinigameAction::Pass => Some(SceneInput::Pass),
                MinigameAction::Fail => Some(SceneInput::Fail),
                MinigameAction::Wait => None,
            }
        }
        _ => None,
    };
    match input {
        Some(input) => router.dispatch(input),
        None => router.advance(STEP_MS),
    }
}

/// Lowest stage that is unlocked and not yet cleared.
fn next_open_stage(session: &SessionState, catalog: &StageCatalog) -> Option<u32> {
    catalog
        .all_stages()
        .iter()
        .map(|stage| stage.id)
        .find(|id| session.is_stage_unlocked(*id) && !session.is_stage_cleared(*id))
}

fn transcript_digest(transcript: &[StateSnapshot]) -> String {
    let mut hasher = Sha256::new();
    for snapshot in transcript {
        if let Ok(line) = serde_json::to_string(snapshot) {
            hasher.update(line.as_bytes());
        }
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    digest.iter().take(8).fold(String::new(), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

#[derive(Debug, Default)]
struct InvariantChecker {
    seen: usize,
    cleared: BTreeSet<u32>,
    violations: Vec<String>,
}

impl InvariantChecker {
    fn check(&mut self, step: usize, router: &SceneRouter, transcript: &[StateSnapshot]) {
        let session = router.session();
        let stage_count = session.stage_count();

        for snapshot in transcript.iter().skip(self.seen) {
            if let Some(stress) = snapshot.stress
                && !(STRESS_MIN..=STRESS_MAX).contains(&stress)
            {
                self.flag(step, format!("broadcast stress {stress} out of range"));
            }
            if snapshot.progress > stage_count {
                self.flag(step, format!("progress {} exceeds stage count", snapshot.progress));
            }
            if snapshot.all_cleared != (snapshot.progress >= stage_count) {
                self.flag(step, "allCleared disagrees with progress".to_string());
            }
            if snapshot.scene == SceneKey::Ending {
                match (snapshot.grade, snapshot.success_count, snapshot.stress) {
                    (Some(grade), Some(successes), Some(stress))
                        if grade == GradeTier::classify(successes, stress) => {}
                    _ => self.flag(step, "ending broadcast grade is inconsistent".to_string()),
                }
            }
        }
        self.seen = transcript.len();

        let published = usize::try_from(router.bridge().published()).unwrap_or(usize::MAX);
        if published != transcript.len()
            || router.scene_entries() != router.bridge().published()
        {
            self.flag(step, "broadcast count differs from scene entries".to_string());
        }
        if !(STRESS_MIN..=STRESS_MAX).contains(&session.stress()) {
            self.flag(step, format!("session stress {} out of range", session.stress()));
        }

        match session.model() {
            ProgressionModel::Linear => {
                let in_order = session
                    .outcomes()
                    .iter()
                    .zip(1_u32..)
                    .all(|(outcome, expected)| outcome.stage_id == expected);
                if !in_order {
                    self.flag(step, "linear outcomes are out of stage order".to_string());
                }
            }
            ProgressionModel::Unlock => {
                let cleared = session.cleared();
                if !session.outcomes().is_empty() && !cleared.is_superset(&self.cleared) {
                    self.flag(step, "a cleared stage was locked again".to_string());
                }
                self.cleared.clone_from(cleared);
                if matches!(
                    router.active_scene(),
                    Some(SceneKey::MinigameIntro | SceneKey::Minigame)
                ) && let Some(stage_id) = router.snapshot().stage_id
                    && !session.is_stage_unlocked(stage_id)
                {
                    self.flag(step, format!("stage {stage_id} played while locked"));
                }
            }
        }
    }

    fn flag(&mut self, step: usize, message: String) {
        if self.violations.len() < MAX_RECORDED_VIOLATIONS {
            self.violations.push(format!("step {step}: {message}"));
        }
    }
}
