//! Host-owned scene state machine.
//!
//! The router owns the session, the scheduler and the bridge. It builds one
//! controller per [`Transition`], gives each a fresh timer scope and closes
//! the previous scope before the next controller's `on_enter` runs.
use log::{debug, info, warn};

use crate::bridge::{BroadcastBridge, JumpSender, StateSnapshot, Subscriber, SubscriptionId};
use crate::catalog::StageCatalog;
use crate::config::GameConfig;
use crate::narrative::NarrativeCatalog;
use crate::rng::VariantPicker;
use crate::scene::{
    SceneContext, SceneController, SceneInput, SceneKey, SceneTimer, SceneView, Transition,
    controller_for,
};
use crate::session::SessionState;
use crate::timer::{ScopeToken, Scheduler, TimerHandle};

struct ActiveScene {
    controller: Box<dyn SceneController>,
    scope: ScopeToken,
}

pub struct SceneRouter {
    catalog: StageCatalog,
    narratives: NarrativeCatalog,
    config: GameConfig,
    session: SessionState,
    picker: VariantPicker,
    scheduler: Scheduler<SceneTimer>,
    bridge: BroadcastBridge,
    active: Option<ActiveScene>,
    entries: u64,
}

impl SceneRouter {
    #[must_use]
    pub fn new(
        catalog: StageCatalog,
        narratives: NarrativeCatalog,
        config: GameConfig,
        seed: u64,
    ) -> Self {
        let session = SessionState::new(catalog.len(), config.progression);
        Self {
            catalog,
            narratives,
            config,
            session,
            picker: VariantPicker::from_seed(seed),
            scheduler: Scheduler::new(),
            bridge: BroadcastBridge::new(),
            active: None,
            entries: 0,
        }
    }

    /// Router over the embedded stage and narrative data.
    #[must_use]
    pub fn with_builtin_data(config: GameConfig, seed: u64) -> Self {
        Self::new(
            StageCatalog::builtin().clone(),
            NarrativeCatalog::builtin().clone(),
            config,
            seed,
        )
    }

    /// Enter the boot screen.
    pub fn start(&mut self) {
        self.enter(Transition::Boot);
    }

    pub fn dispatch(&mut self, input: SceneInput) {
        self.drain_jumps();
        if let Some(next) = self.with_active(|scene, ctx| scene.on_input(input, ctx)) {
            self.enter(next);
        }
    }

    /// Move the virtual clock forward, firing due timers one at a time.
    ///
    /// Each timer reaches whichever controller is active when it fires; timers
    /// belonging to a scene that was already left are never delivered.
    pub fn advance(&mut self, dt_ms: u64) {
        self.drain_jumps();
        let until = self.scheduler.now_ms().saturating_add(dt_ms);
        while let Some(fired) = self.scheduler.pop_due(until) {
            let current = self
                .active
                .as_ref()
                .is_some_and(|active| active.scope == fired.scope);
            if !current {
                debug!("dropping timer {:?} from a closed scene", fired.event);
                continue;
            }
            if let Some(next) = self.with_active(|scene, ctx| scene.on_timer(fired.event, ctx)) {
                self.enter(next);
            }
        }
        self.scheduler.advance_to(until);
    }

    /// Force the session onto a stage and start its first minigame variant.
    ///
    /// Out-of-range indices are clamped; nothing is reported back.
    pub fn request_jump(&mut self, stage_index: i64) {
        let applied = self.session.jump_to_stage(stage_index);
        if i64::try_from(applied).ok() != Some(stage_index) {
            warn!("jump to stage index {stage_index} clamped to {applied}");
        }
        let Some(stage) = self.catalog.stage_at(applied) else {
            return;
        };
        let next = Transition::StartMinigame {
            stage_id: stage.id,
            variant_id: stage.first_variant().variant_id,
        };
        info!("jumping to stage {}", stage.id);
        self.enter(next);
    }

    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn narratives(&self) -> &NarrativeCatalog {
        &self.narratives
    }

    #[must_use]
    pub fn active_scene(&self) -> Option<SceneKey> {
        self.active.as_ref().map(|active| active.controller.key())
    }

    #[must_use]
    pub fn controller_view(&self) -> Option<SceneView> {
        self.active.as_ref().map(|active| active.controller.view())
    }

    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Timers still queued for the active scene.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.active
            .as_ref()
            .map_or(0, |active| self.scheduler.pending(active.scope))
    }

    /// Number of scene entries since construction.
    #[must_use]
    pub const fn scene_entries(&self) -> u64 {
        self.entries
    }

    #[must_use]
    pub const fn bridge(&self) -> &BroadcastBridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut BroadcastBridge {
        &mut self.bridge
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) -> SubscriptionId {
        self.bridge.subscribe(subscriber)
    }

    #[must_use]
    pub fn jump_sender(&self) -> JumpSender {
        self.bridge.jump_sender()
    }

    /// Snapshot of the active scene as it would be broadcast right now.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let session = &self.session;
        let progress = session.progress_count();
        let all_cleared = session.is_complete();
        let Some(active) = &self.active else {
            return StateSnapshot::bare(SceneKey::Boot, progress, all_cleared);
        };
        let controller = active.controller.as_ref();
        let key = controller.key();
        let stage = controller
            .stage_id()
            .and_then(|id| self.catalog.get_stage(id));

        let mut snapshot = StateSnapshot::bare(key, progress, all_cleared);
        snapshot.stress = Some(session.stress());
        snapshot.stage_id = stage.map(|stage| stage.id);
        snapshot.variant = stage
            .zip(controller.variant_id())
            .and_then(|(stage, variant_id)| stage.variant(variant_id))
            .map(|variant| variant.controller);
        snapshot.time = stage.map(|stage| stage.time.clone());
        snapshot.period = stage.map(|stage| stage.period);

        match controller.view() {
            SceneView::Narrative { stage_index, .. } => {
                if let Some(beat) = self.narratives.get(stage_index) {
                    snapshot.time = Some(beat.time.clone());
                    snapshot.period = Some(beat.period);
                }
            }
            SceneView::Result { .. } => {
                snapshot.success_count = Some(session.success_count());
            }
            SceneView::Ending {
                grade,
                success_count,
                ..
            } => {
                snapshot.success_count = Some(success_count);
                snapshot.grade = Some(grade);
            }
            _ => {}
        }
        snapshot
    }

    fn drain_jumps(&mut self) {
        while let Some(request) = self.bridge.take_jump() {
            self.request_jump(request.stage_index);
        }
    }

    fn enter(&mut self, transition: Transition) {
        let mut pending = Some(transition);
        while let Some(transition) = pending.take() {
            if let Some(previous) = self.active.take() {
                self.scheduler.close_scope(previous.scope);
            }
            if transition == Transition::Restart {
                info!("restarting the workday");
            }
            debug!("entering scene {}", transition.target());
            let scope = self.scheduler.open_scope();
            self.active = Some(ActiveScene {
                controller: controller_for(transition),
                scope,
            });
            self.entries += 1;
            pending = self.with_active(|scene, ctx| scene.on_enter(ctx));
            let snapshot = self.snapshot();
            self.bridge.publish(&snapshot);
        }
    }

    fn with_active<F>(&mut self, hook: F) -> Option<Transition>
    where
        F: FnOnce(&mut dyn SceneController, &mut SceneContext<'_>) -> Option<Transition>,
    {
        let active = self.active.as_mut()?;
        let mut ctx = SceneContext {
            session: &mut self.session,
            catalog: &self.catalog,
            narratives: &self.narratives,
            picker: &mut self.picker,
            config: &self.config,
            timers: TimerHandle::new(&mut self.scheduler, active.scope),
        };
        hook(active.controller.as_mut(), &mut ctx)
    }
}

impl std::fmt::Debug for SceneRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRouter")
            .field("active", &self.active_scene())
            .field("session", &self.session)
            .field("now_ms", &self.scheduler.now_ms())
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}
