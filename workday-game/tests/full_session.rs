use std::cell::RefCell;
use std::rc::Rc;

use workday_game::{
    FailurePolicy, GameConfig, GradeTier, Outcome, ProgressionModel, SceneInput, SceneKey,
    SceneRouter, SceneView, StateSnapshot,
};

const STEP_MS: u64 = 50;
const BUDGET_MS: u64 = 120_000;

fn router(config: GameConfig) -> (SceneRouter, Rc<RefCell<Vec<StateSnapshot>>>) {
    let mut router = SceneRouter::with_builtin_data(config, 0x00C0_FFEE);
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    router.subscribe(Box::new(move |snapshot: &StateSnapshot| {
        sink.borrow_mut().push(snapshot.clone());
    }));
    router.start();
    (router, log)
}

fn run_until(router: &mut SceneRouter, what: &str, done: impl Fn(&SceneRouter) -> bool) {
    let mut spent = 0;
    while !done(&*router) {
        assert!(
            spent < BUDGET_MS,
            "never reached {what}; stuck in {:?}",
            router.active_scene()
        );
        router.advance(STEP_MS);
        spent += STEP_MS;
    }
}

fn run_until_scene(router: &mut SceneRouter, key: SceneKey) {
    run_until(router, key.label(), |r| r.active_scene() == Some(key));
}

fn leave_boot(router: &mut SceneRouter) {
    assert_eq!(router.active_scene(), Some(SceneKey::Boot));
    router.dispatch(SceneInput::Confirm);
    run_until(router, "leaving boot", |r| r.active_scene() != Some(SceneKey::Boot));
}

/// From a narrative screen, play its minigame and stop on the result card.
fn play_from_narrative(router: &mut SceneRouter, pass: bool) {
    run_until(router, "advance prompt", |r| {
        matches!(
            r.controller_view(),
            Some(SceneView::Narrative {
                can_advance: true,
                ..
            })
        )
    });
    router.dispatch(SceneInput::Confirm);
    assert_eq!(router.active_scene(), Some(SceneKey::MinigameIntro));
    finish_minigame(router, pass);
}

fn finish_minigame(router: &mut SceneRouter, pass: bool) {
    run_until_scene(router, SceneKey::Minigame);
    router.dispatch(if pass {
        SceneInput::Pass
    } else {
        SceneInput::Fail
    });
    run_until_scene(router, SceneKey::Result);
}

fn leave_result(router: &mut SceneRouter) {
    run_until(router, "leaving result", |r| {
        r.active_scene() != Some(SceneKey::Result)
    });
}

#[test]
fn perfect_linear_day_ends_as_legend() {
    let (mut router, log) = router(GameConfig::default());
    leave_boot(&mut router);
    for stage in 0..10 {
        assert_eq!(router.active_scene(), Some(SceneKey::Narrative));
        assert_eq!(router.session().current_stage_index(), stage);
        play_from_narrative(&mut router, true);
        leave_result(&mut router);
    }

    assert_eq!(router.active_scene(), Some(SceneKey::Ending));
    let session = router.session();
    assert!(session.is_complete());
    assert_eq!(session.success_count(), 10);
    // Ten narrative screens at +2 and ten wins at +5.
    assert_eq!(session.stress(), 70);
    assert_eq!(session.classify_grade(), GradeTier::Legend);

    let log = log.borrow();
    assert_eq!(log.len(), 42, "one broadcast per scene entry");
    assert_eq!(router.scene_entries(), 42);
    let scenes: Vec<SceneKey> = log.iter().map(|s| s.scene).collect();
    assert_eq!(
        &scenes[..6],
        &[
            SceneKey::Boot,
            SceneKey::Narrative,
            SceneKey::MinigameIntro,
            SceneKey::Minigame,
            SceneKey::Result,
            SceneKey::Narrative,
        ]
    );
    let ending = log.last().unwrap();
    assert_eq!(ending.scene, SceneKey::Ending);
    assert!(ending.all_cleared);
    assert_eq!(ending.progress, 10);
    assert_eq!(ending.success_count, Some(10));
    assert_eq!(ending.grade, Some(GradeTier::Legend));
}

#[test]
fn failure_restarts_the_day_by_default() {
    let (mut router, log) = router(GameConfig::default());
    leave_boot(&mut router);
    play_from_narrative(&mut router, true);
    leave_result(&mut router);
    play_from_narrative(&mut router, false);
    assert_eq!(router.session().stress(), 2 + 5 + 2 + 15);
    leave_result(&mut router);

    assert_eq!(router.active_scene(), Some(SceneKey::Boot));
    let session = router.session();
    assert_eq!(session.stress(), 0);
    assert_eq!(session.current_stage_index(), 0);
    assert!(session.outcomes().is_empty());
    assert_eq!(log.borrow().last().map(|s| s.scene), Some(SceneKey::Boot));
}

#[test]
fn advance_anyway_counts_failures_toward_the_day() {
    let config = GameConfig::default().with_failure_policy(FailurePolicy::AdvanceAnyway);
    let (mut router, _log) = router(config);
    leave_boot(&mut router);
    for stage in 0..10 {
        play_from_narrative(&mut router, stage % 2 == 0);
        leave_result(&mut router);
    }
    assert_eq!(router.active_scene(), Some(SceneKey::Ending));
    let session = router.session();
    assert!(session.is_complete());
    assert_eq!(session.success_count(), 5);
    assert_eq!(session.stress(), 100);
    assert_eq!(session.classify_grade(), GradeTier::Intern);
    assert!(matches!(
        router.controller_view(),
        Some(SceneView::Ending {
            grade: GradeTier::Intern,
            success_count: 5,
            ..
        })
    ));

    router.dispatch(SceneInput::Confirm);
    assert_eq!(router.active_scene(), Some(SceneKey::Boot));
    assert_eq!(router.session().progress_count(), 0);
}

#[test]
fn unlock_model_clears_stages_in_order() {
    let config = GameConfig::default().with_progression(ProgressionModel::Unlock);
    let (mut router, _log) = router(config);
    leave_boot(&mut router);
    assert_eq!(router.active_scene(), Some(SceneKey::StageSelect));

    router.dispatch(SceneInput::SelectStage(3));
    assert_eq!(router.active_scene(), Some(SceneKey::StageSelect));

    router.dispatch(SceneInput::SelectStage(1));
    finish_minigame(&mut router, false);
    leave_result(&mut router);
    assert_eq!(router.active_scene(), Some(SceneKey::StageSelect));
    assert!(!router.session().is_stage_unlocked(2));

    let mut unlocked_before = 1;
    for stage_id in 1..=10 {
        router.dispatch(SceneInput::SelectStage(stage_id));
        finish_minigame(&mut router, true);
        leave_result(&mut router);
        let unlocked = (1..=10)
            .filter(|id| router.session().is_stage_unlocked(*id))
            .count();
        assert!(unlocked >= unlocked_before, "unlocking is monotonic");
        unlocked_before = unlocked;
    }

    assert_eq!(router.active_scene(), Some(SceneKey::Ending));
    let session = router.session();
    assert_eq!(session.progress_count(), 10);
    assert_eq!(session.outcomes().len(), 11);
    assert_eq!(session.stress(), 15 + 50);
    assert_eq!(session.classify_grade(), GradeTier::Legend);
}

#[test]
fn single_failure_costs_fifteen_stress() {
    let (mut router, _log) = router(GameConfig::default());
    router.request_jump(0);
    assert_eq!(router.active_scene(), Some(SceneKey::Minigame));
    router.dispatch(SceneInput::Fail);
    assert_eq!(router.session().stress(), 15);
    assert_eq!(router.session().outcomes(), &[Outcome::failure(1)]);
}

#[test]
fn jump_requests_clamp_silently() {
    let (mut router, log) = router(GameConfig::default());
    let sender = router.jump_sender();

    sender.request_jump(-5);
    router.advance(0);
    assert_eq!(router.session().current_stage_index(), 0);
    assert_eq!(log.borrow().last().and_then(|s| s.stage_id), Some(1));

    sender.request_jump(15);
    router.dispatch(SceneInput::Confirm);
    assert_eq!(router.session().current_stage_index(), 9);
    let last = log.borrow().last().cloned().unwrap();
    assert_eq!(last.scene, SceneKey::Minigame);
    assert_eq!(last.stage_id, Some(10));
}

#[test]
fn stale_timers_never_fire_after_a_jump() {
    let (mut router, log) = router(GameConfig::default());
    leave_boot(&mut router);
    // Mid-prologue: the hold and reveal timers belong to the narrative scope.
    router.advance(500);
    router.request_jump(3);
    assert_eq!(router.active_scene(), Some(SceneKey::Minigame));
    let entries = log.borrow().len();

    router.advance(600_000);
    assert_eq!(router.active_scene(), Some(SceneKey::Minigame));
    assert_eq!(log.borrow().len(), entries);
    assert!(router.session().outcomes().is_empty());

    // A timed minigame abandoned mid-countdown never reports its expiry.
    router.request_jump(0);
    router.advance(5_000);
    router.request_jump(5);
    router.advance(600_000);
    assert!(router.session().outcomes().is_empty());
    assert_eq!(router.active_scene(), Some(SceneKey::Minigame));
}

#[test]
fn expiry_fails_the_stage() {
    let (mut router, _log) = router(GameConfig::default());
    router.request_jump(6);
    router.advance(7_999);
    assert!(router.session().outcomes().is_empty());
    router.advance(1);
    assert_eq!(router.session().outcomes(), &[Outcome::failure(7)]);
    run_until_scene(&mut router, SceneKey::Result);
    leave_result(&mut router);
    assert_eq!(router.active_scene(), Some(SceneKey::Boot));
}

#[test]
fn grade_ladder_properties() {
    assert_eq!(GradeTier::classify(10, 40), GradeTier::Legend);
    assert_eq!(GradeTier::classify(10, 80), GradeTier::Survivor);
    assert_eq!(GradeTier::classify(7, 0), GradeTier::Veteran);
    assert_eq!(GradeTier::classify(7, 100), GradeTier::Veteran);
    assert_eq!(GradeTier::classify(6, 0), GradeTier::Intern);
    assert_eq!(GradeTier::classify(4, 0), GradeTier::Intern);
    assert_eq!(GradeTier::classify(3, 0), GradeTier::Burnout);
    assert_eq!(GradeTier::classify(3, 100), GradeTier::Burnout);
}
