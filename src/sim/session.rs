//! Game session: one player's state machine, round and timers
//!
//! Everything time-driven goes through the session's own `TimerQueue`, so
//! sessions are independent of each other and of wall-clock time. Hosts
//! call `advance` with elapsed milliseconds and issue commands in between.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::difficulty::Difficulty;
use super::hit::{HitOutcome, resolve_hit};
use super::holes::{EffectKind, HitEffect, HoleRegistry};
use super::kinds::TargetKind;
use super::scheduler::{CountdownTick, SchedulerLoop, SessionTimer, SpawnContext};
use super::spawn::RandomSource;
use super::state::{
    Feedback, GameEvent, GameObserver, GamePhase, RoundState, RoundSummary, Snapshot, hole_anchor,
};
use super::timer::{Millis, TimerQueue};
use crate::audio::{CueQueue, SoundCue};
use crate::consts::{CATCH_POINTS, FEEDBACK_TTL_MS, GRID_SIZE, MISS_PENALTY};
use crate::error::GameError;
use crate::highscores::HighScore;
use crate::persistence::KeyValueStore;
use crate::settings::{PlayerConfig, Settings};

/// Config a round was started with; edits only apply to the next round
#[derive(Debug, Clone)]
struct RoundConfig {
    player: PlayerConfig,
    difficulty: Difficulty,
}

/// A complete game for one player
pub struct GameSession {
    phase: GamePhase,
    settings: Settings,
    active: RoundConfig,
    timers: TimerQueue<SessionTimer>,
    rng: Box<dyn RandomSource>,
    round: RoundState,
    scheduler: SchedulerLoop,
    /// Emitted but not yet delivered to observers
    pending: Vec<GameEvent>,
    /// Delivered, waiting for `drain_events`
    delivered: Vec<GameEvent>,
    observers: Vec<Box<dyn GameObserver>>,
    cues: CueQueue,
    high_score: HighScore,
    store: Box<dyn KeyValueStore>,
    summary: Option<RoundSummary>,
}

impl GameSession {
    /// Session with a seeded RNG, loading settings and high score from `store`
    pub fn new(seed: u64, store: Box<dyn KeyValueStore>) -> Self {
        let settings = Settings::load(store.as_ref());
        Self::with_rng(settings, Box::new(Pcg32::seed_from_u64(seed)), store)
    }

    /// Session with explicit settings and random source
    pub fn with_rng(
        settings: Settings,
        rng: Box<dyn RandomSource>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let high_score = HighScore::load(store.as_ref());
        Self {
            phase: GamePhase::Menu,
            active: RoundConfig {
                player: settings.player.clone(),
                difficulty: settings.difficulty,
            },
            cues: CueQueue::new(settings.muted),
            round: RoundState::new(GRID_SIZE, settings.round_duration_secs),
            settings,
            timers: TimerQueue::new(),
            rng,
            scheduler: SchedulerLoop::new(),
            pending: Vec::new(),
            delivered: Vec::new(),
            observers: Vec::new(),
            high_score,
            store,
            summary: None,
        }
    }

    // === Queries ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Player configuration used for the next (or current) round
    pub fn player_config(&self) -> &PlayerConfig {
        &self.settings.player
    }

    pub fn difficulty(&self) -> Difficulty {
        self.settings.difficulty
    }

    pub fn score(&self) -> u32 {
        self.round.score
    }

    pub fn time_remaining_secs(&self) -> u32 {
        self.round.time_remaining_secs
    }

    /// Kind per hole, `None` for empty
    pub fn grid(&self) -> Vec<Option<TargetKind>> {
        self.round.holes.snapshot()
    }

    pub fn holes(&self) -> &HoleRegistry {
        &self.round.holes
    }

    pub fn hit_effect(&self, slot: usize) -> Option<HitEffect> {
        self.round.holes.effect_of(slot)
    }

    pub fn timers(&self) -> &TimerQueue<SessionTimer> {
        &self.timers
    }

    /// Session clock in ms
    pub fn now(&self) -> Millis {
        self.timers.now()
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Playing && self.scheduler.is_running()
    }

    pub fn high_score(&self) -> u32 {
        self.high_score.best()
    }

    /// Game-over data for the last finished round
    pub fn summary(&self) -> Option<RoundSummary> {
        self.summary
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            grid: self.round.holes.snapshot(),
            effects: self.round.holes.effects(),
            score: self.round.score,
            high_score: self.high_score.best(),
            time_remaining_secs: self.round.time_remaining_secs,
            difficulty: self.settings.difficulty,
            sheriff: self.settings.player.sheriff(),
            correct_kinds: self.settings.player.correct_kinds().iter().copied().collect(),
            muted: self.settings.muted,
        }
    }

    // === Observers ===

    pub fn add_observer(&mut self, observer: Box<dyn GameObserver>) {
        self.observers.push(observer);
    }

    /// Events delivered since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.delivered)
    }

    /// Sound cues queued since the last call
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        self.cues.drain()
    }

    // === Configuration ===

    pub fn select_sheriff(&mut self, kind: TargetKind) {
        self.settings.player.select_sheriff(kind);
        self.settings.save(self.store.as_mut());
    }

    /// Toggle a kind on the catch list. Returns whether it is on the list after.
    pub fn toggle_correct_kind(&mut self, kind: TargetKind) -> bool {
        let on = self.settings.player.toggle_correct_kind(kind);
        self.settings.save(self.store.as_mut());
        on
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.settings.difficulty = difficulty;
        self.settings.save(self.store.as_mut());
    }

    /// Returns the new mute state
    pub fn toggle_mute(&mut self) -> bool {
        self.settings.muted = !self.settings.muted;
        self.cues.set_muted(self.settings.muted);
        self.settings.save(self.store.as_mut());
        self.settings.muted
    }

    // === Commands ===

    /// MENU or GAME_OVER -> SETUP
    pub fn open_setup(&mut self) -> Result<(), GameError> {
        match self.phase {
            GamePhase::Menu | GamePhase::GameOver => {
                self.transition(GamePhase::Setup);
                self.flush();
                Ok(())
            }
            from => Err(GameError::InvalidTransition {
                from,
                action: "open setup",
            }),
        }
    }

    /// SETUP or GAME_OVER -> PLAYING with a fresh round
    pub fn start_round(
        &mut self,
        player: PlayerConfig,
        difficulty: Difficulty,
    ) -> Result<(), GameError> {
        if !matches!(self.phase, GamePhase::Setup | GamePhase::GameOver) {
            return Err(GameError::InvalidTransition {
                from: self.phase,
                action: "start a round",
            });
        }

        self.settings.player = player;
        self.settings.difficulty = difficulty;
        self.settings.save(self.store.as_mut());
        self.active = RoundConfig {
            player: self.settings.player.clone(),
            difficulty,
        };
        self.summary = None;

        log::info!(
            "Round start: sheriff {:?}, catching {:?}, {:?}",
            self.active.player.sheriff(),
            self.active.player.correct_kinds(),
            difficulty
        );
        self.transition(GamePhase::Playing);
        self.start_scheduler(Some(self.settings.round_duration_secs));
        self.flush();
        Ok(())
    }

    /// Start a round with the stored settings ("play again")
    pub fn start_with_settings(&mut self) -> Result<(), GameError> {
        let player = self.settings.player.clone();
        let difficulty = self.settings.difficulty;
        self.start_round(player, difficulty)
    }

    /// PLAYING -> PAUSED. Every in-flight timer is dropped.
    pub fn pause(&mut self) -> Result<(), GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::InvalidTransition {
                from: self.phase,
                action: "pause",
            });
        }
        self.scheduler.stop(&mut self.timers, &mut self.round);
        self.transition(GamePhase::Paused);
        log::info!("Paused with {}s left, score {}", self.round.time_remaining_secs, self.round.score);
        self.flush();
        Ok(())
    }

    /// PAUSED -> PLAYING, keeping score and time
    pub fn resume(&mut self) -> Result<(), GameError> {
        if self.phase != GamePhase::Paused {
            return Err(GameError::InvalidTransition {
                from: self.phase,
                action: "resume",
            });
        }
        self.transition(GamePhase::Playing);
        self.start_scheduler(None);
        log::info!("Resumed");
        self.flush();
        Ok(())
    }

    /// Any phase but MENU -> MENU, hard-stopping the round
    pub fn quit(&mut self) -> Result<(), GameError> {
        if self.phase == GamePhase::Menu {
            return Err(GameError::InvalidTransition {
                from: self.phase,
                action: "quit",
            });
        }
        self.scheduler.stop(&mut self.timers, &mut self.round);
        self.transition(GamePhase::Menu);
        log::info!("Quit to menu");
        self.flush();
        Ok(())
    }

    /// Player hit a hole
    pub fn hit(&mut self, slot: usize) -> HitOutcome {
        let running = self.is_running();
        let resolution = resolve_hit(
            &mut self.round,
            &mut self.timers,
            slot,
            &self.active.player,
            running,
        );
        if !resolution.accepted() {
            return resolution.outcome;
        }

        self.pending.push(GameEvent::HitResolved {
            slot,
            outcome: resolution.outcome,
            score_delta: resolution.score_delta,
        });
        let (effect, text) = match resolution.outcome {
            HitOutcome::Correct => (EffectKind::Caught, format!("+{}", CATCH_POINTS)),
            _ => (EffectKind::Missed, format!("-{}", MISS_PENALTY)),
        };
        self.pending.push(GameEvent::Feedback(Feedback {
            slot,
            effect,
            text,
            anchor: hole_anchor(slot, self.round.holes.len()),
            ttl_ms: FEEDBACK_TTL_MS,
        }));

        if self.high_score.record(self.round.score, self.store.as_mut()) {
            self.pending.push(GameEvent::NewHighScore {
                score: self.round.score,
            });
        }
        self.flush();
        resolution.outcome
    }

    /// Advance the session clock by `dt_ms`, firing every timer that comes
    /// due, earliest deadline first
    pub fn advance(&mut self, dt_ms: Millis) {
        let target = self.timers.now().saturating_add(dt_ms);
        while let Some((_, timer)) = self.timers.pop_due(target) {
            self.dispatch(timer);
        }
        self.timers.advance_to(target);
        self.flush();
    }

    fn dispatch(&mut self, timer: SessionTimer) {
        match timer {
            SessionTimer::Countdown => match self.scheduler.on_countdown(&mut self.round) {
                CountdownTick::Continue { remaining } => {
                    self.pending.push(GameEvent::TimeTick { remaining });
                }
                CountdownTick::Expired => {
                    self.pending.push(GameEvent::TimeTick { remaining: 0 });
                    self.end_round();
                }
            },
            SessionTimer::SpawnTick => {
                let ctx = SpawnContext {
                    rng: self.rng.as_mut(),
                    difficulty: self.active.difficulty,
                    excluded: self.active.player.sheriff(),
                };
                self.scheduler.spawn_pass(
                    &mut self.timers,
                    &mut self.round.holes,
                    ctx,
                    &mut self.pending,
                );
            }
            SessionTimer::Retract { slot, activation } => {
                if self.round.holes.expire(&mut self.timers, slot, activation) {
                    log::debug!("slot {} retracted unhit", slot);
                    self.pending.push(GameEvent::Expired { slot });
                }
            }
            SessionTimer::EffectDone { slot, activation } => {
                if let Some(effect) = self.round.holes.finish_effect(&mut self.timers, slot, activation) {
                    self.pending.push(GameEvent::EffectFinished { slot, effect });
                }
            }
        }
    }

    fn start_scheduler(&mut self, reset_duration: Option<u32>) {
        let ctx = SpawnContext {
            rng: self.rng.as_mut(),
            difficulty: self.active.difficulty,
            excluded: self.active.player.sheriff(),
        };
        self.scheduler.start(
            &mut self.timers,
            &mut self.round,
            reset_duration,
            ctx,
            &mut self.pending,
        );
    }

    fn end_round(&mut self) {
        self.scheduler.stop(&mut self.timers, &mut self.round);
        self.transition(GamePhase::GameOver);

        let final_score = self.round.score;
        self.high_score.record(final_score, self.store.as_mut());
        let summary = RoundSummary::new(final_score, self.high_score.best());
        self.summary = Some(summary);
        log::info!(
            "Round over: score {} (best {}), {}",
            final_score,
            summary.high_score,
            summary.verdict.as_str()
        );
        self.pending.push(GameEvent::RoundEnded { final_score });
    }

    fn transition(&mut self, to: GamePhase) {
        let from = self.phase;
        self.phase = to;
        log::debug!("phase {:?} -> {:?}", from, to);
        self.pending.push(GameEvent::PhaseChanged { from, to });
    }

    /// Deliver pending events to observers, cues and the poll queue
    fn flush(&mut self) {
        for event in std::mem::take(&mut self.pending) {
            self.cues.push_event(&event);
            for observer in &mut self.observers {
                event.dispatch(observer.as_mut());
            }
            self.delivered.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::spawn::ScriptedSource;
    use crate::sim::state::RoundVerdict;
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    fn session(picks: Vec<usize>) -> GameSession {
        GameSession::with_rng(
            Settings::default(),
            Box::new(ScriptedSource::new(picks)),
            Box::new(MemoryStore::new()),
        )
    }

    fn start(session: &mut GameSession) {
        session.open_setup().unwrap();
        let player = session.player_config().clone();
        session.start_round(player, Difficulty::Normal).unwrap();
    }

    #[test]
    fn test_phase_machine() {
        let mut s = session(vec![]);
        assert_eq!(s.phase(), GamePhase::Menu);
        assert!(s.pause().is_err());
        assert!(s.resume().is_err());
        assert!(s.quit().is_err());
        assert!(s.start_with_settings().is_err());

        start(&mut s);
        assert_eq!(s.phase(), GamePhase::Playing);
        assert!(s.open_setup().is_err());
        assert!(s.resume().is_err());

        s.pause().unwrap();
        assert_eq!(s.phase(), GamePhase::Paused);
        assert!(s.pause().is_err());
        s.resume().unwrap();
        assert_eq!(s.phase(), GamePhase::Playing);

        s.quit().unwrap();
        assert_eq!(s.phase(), GamePhase::Menu);
        assert_eq!(s.timers().pending_count(), 0);
    }

    #[test]
    fn test_countdown_reaches_game_over() {
        let mut s = session(vec![]);
        start(&mut s);
        s.advance(59_000);
        assert_eq!(s.time_remaining_secs(), 1);
        assert_eq!(s.phase(), GamePhase::Playing);

        s.advance(1000);
        assert_eq!(s.time_remaining_secs(), 0);
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert_eq!(s.timers().pending_count(), 0);
        assert!(s.grid().iter().all(Option::is_none));
        assert!(s.summary().is_some());

        let events = s.drain_events();
        assert!(events.contains(&GameEvent::RoundEnded { final_score: 0 }));
    }

    #[test]
    fn test_pause_drops_in_flight_targets() {
        // First pass spawns one Fly in slot 0
        let mut s = session(vec![0, 0, 3]);
        start(&mut s);
        assert_eq!(s.grid()[0], Some(TargetKind::Fly));

        s.advance(1400);
        s.pause().unwrap();
        assert!(s.grid().iter().all(Option::is_none));
        assert_eq!(s.timers().pending_count(), 0);

        // Time passing while paused changes nothing
        let remaining = s.time_remaining_secs();
        s.advance(10_000);
        assert_eq!(s.time_remaining_secs(), remaining);
        assert_eq!(s.hit(0), HitOutcome::NoTarget);
    }

    #[test]
    fn test_config_edits_apply_to_next_round() {
        let mut s = session(vec![0, 0, 3]);
        start(&mut s);
        assert_eq!(s.grid()[0], Some(TargetKind::Fly));

        // Fly removed from the catch list mid-round; the hit still counts
        s.toggle_correct_kind(TargetKind::Fly);
        assert!(!s.player_config().is_correct(TargetKind::Fly));
        assert_eq!(s.hit(0), HitOutcome::Correct);
    }

    #[test]
    fn test_play_again_from_game_over_resets() {
        let mut s = session(vec![0, 0, 3]);
        start(&mut s);
        assert_eq!(s.hit(0), HitOutcome::Correct);
        s.advance(60_000);
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert_eq!(s.score(), 10);

        s.start_with_settings().unwrap();
        assert_eq!(s.score(), 0);
        assert_eq!(s.time_remaining_secs(), 60);
        assert!(s.summary().is_none());
    }

    #[test]
    fn test_sheriff_never_spawns() {
        let mut s = GameSession::new(1234, Box::new(MemoryStore::new()));
        s.open_setup().unwrap();
        let player = PlayerConfig::new(TargetKind::Spider, BTreeSet::from([TargetKind::Fly])).unwrap();
        s.start_round(player, Difficulty::Hard).unwrap();

        for event in s.drain_events() {
            if let GameEvent::Spawned { kind, .. } = event {
                assert_ne!(kind, TargetKind::Spider);
            }
        }
        for _ in 0..60 {
            s.advance(1000);
            for event in s.drain_events() {
                if let GameEvent::Spawned { kind, .. } = event {
                    assert_ne!(kind, TargetKind::Spider);
                }
            }
        }
        assert_eq!(s.phase(), GamePhase::GameOver);
    }

    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl GameObserver for Recorder {
        fn on_spawn(&mut self, slot: usize, kind: TargetKind) {
            self.0.borrow_mut().push(format!("spawn {} {:?}", slot, kind));
        }
        fn on_expire(&mut self, slot: usize) {
            self.0.borrow_mut().push(format!("expire {}", slot));
        }
        fn on_hit_resolved(&mut self, slot: usize, outcome: HitOutcome, score_delta: i32) {
            self.0
                .borrow_mut()
                .push(format!("hit {} {:?} {}", slot, outcome, score_delta));
        }
        fn on_round_end(&mut self, final_score: u32) {
            self.0.borrow_mut().push(format!("end {}", final_score));
        }
    }

    #[test]
    fn test_observer_sees_lifecycle() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut s = session(vec![0, 0, 3]);
        s.add_observer(Box::new(Recorder(log.clone())));
        start(&mut s);

        // Spawn ticks after the first pass: count 1, first empty slot, pool[0] = BlackAnt
        s.advance(1000);
        assert_eq!(s.hit(1), HitOutcome::Incorrect);
        s.advance(1000);

        let log = log.borrow();
        assert_eq!(log[0], "spawn 0 Fly");
        assert_eq!(log[1], "spawn 1 BlackAnt");
        assert_eq!(log[2], "hit 1 Incorrect 0");
        assert!(log.contains(&"expire 0".to_string()));
    }

    #[test]
    fn test_cues_follow_events() {
        let mut s = session(vec![0, 0, 3]);
        start(&mut s);
        s.drain_cues();
        s.hit(0);
        assert_eq!(s.drain_cues(), vec![SoundCue::Score, SoundCue::Hit]);

        assert!(s.toggle_mute());
        s.advance(60_000);
        assert!(s.drain_cues().is_empty());
    }

    #[test]
    fn test_huge_step_ends_round_without_overflow() {
        let mut s = session(vec![]);
        start(&mut s);
        s.advance(1000);
        s.advance(Millis::MAX);
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert_eq!(s.time_remaining_secs(), 0);
        assert_eq!(s.timers().pending_count(), 0);
        assert_eq!(s.now(), Millis::MAX);

        s.advance(5);
        assert_eq!(s.now(), Millis::MAX);
    }

    // === Whole rounds ===

    fn player(correct: &[TargetKind]) -> PlayerConfig {
        PlayerConfig::new(TargetKind::Ladybug, correct.iter().copied().collect()).unwrap()
    }

    fn scripted(picks: Vec<usize>, player: PlayerConfig) -> GameSession {
        let settings = Settings {
            player,
            ..Settings::default()
        };
        GameSession::with_rng(
            settings,
            Box::new(ScriptedSource::new(picks)),
            Box::new(MemoryStore::new()),
        )
    }

    fn play(session: &mut GameSession) {
        session.open_setup().unwrap();
        session.start_with_settings().unwrap();
    }

    /// Occupied slots own exactly one live timer; empty slots own none
    fn assert_occupancy_invariant(session: &GameSession) {
        let mut occupied = 0;
        for slot in session.holes().slots() {
            if let Some(occupant) = slot.occupant() {
                occupied += 1;
                assert!(
                    session.timers().is_pending(occupant.pending),
                    "slot {} is occupied without a pending timer",
                    slot.index
                );
            }
        }
        let cadence = if session.is_running() { 2 } else { 0 };
        assert_eq!(session.timers().pending_count(), occupied + cadence);
    }

    fn spawned(events: &[GameEvent]) -> Vec<(usize, TargetKind)> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Spawned { slot, kind } => Some((*slot, *kind)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_first_spawn_pass_fills_scripted_holes() {
        // count 1+1, slot 3, Fly, slot pool[6] = 7, Bee
        let mut s = scripted(vec![1, 3, 3, 6, 4], PlayerConfig::default());
        play(&mut s);

        let grid = s.grid();
        assert_eq!(grid[3], Some(TargetKind::Fly));
        assert_eq!(grid[7], Some(TargetKind::Bee));
        assert_eq!(grid.iter().filter(|k| k.is_some()).count(), 2);
        assert_eq!(s.holes().empty_slots().len(), 7);
        assert_eq!(
            spawned(&s.drain_events()),
            vec![(3, TargetKind::Fly), (7, TargetKind::Bee)]
        );
        assert_occupancy_invariant(&s);
    }

    #[test]
    fn test_correct_hit_holds_then_clears() {
        let mut s = scripted(vec![1, 3, 3, 6, 4], player(&[TargetKind::Fly, TargetKind::Bee]));
        play(&mut s);

        assert_eq!(s.hit(3), HitOutcome::Correct);
        assert_eq!(s.score(), 10);
        assert_eq!(s.grid()[3], Some(TargetKind::Fly));
        assert_occupancy_invariant(&s);

        s.advance(599);
        assert_eq!(s.grid()[3], Some(TargetKind::Fly));
        s.advance(1);
        assert_eq!(s.grid()[3], None);
        assert_occupancy_invariant(&s);

        let events = s.drain_events();
        assert!(events.contains(&GameEvent::HitResolved {
            slot: 3,
            outcome: HitOutcome::Correct,
            score_delta: 10,
        }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::Feedback(f) if f.slot == 3 && f.text == "+10")));
        assert!(!events.contains(&GameEvent::Expired { slot: 3 }));
    }

    #[test]
    fn test_wrong_hit_penalty_floors_at_zero() {
        // Sheriff Ladybug: pool[1] = Spider
        let mut s = scripted(vec![0, 4, 1], player(&[TargetKind::Fly, TargetKind::Bee]));
        play(&mut s);
        assert_eq!(s.grid()[4], Some(TargetKind::Spider));

        assert_eq!(s.hit(4), HitOutcome::Incorrect);
        assert_eq!(s.score(), 0);
        s.advance(799);
        assert_eq!(s.grid()[4], Some(TargetKind::Spider));
        s.advance(1);
        assert_eq!(s.grid()[4], None);

        let events = s.drain_events();
        assert!(events.contains(&GameEvent::HitResolved {
            slot: 4,
            outcome: HitOutcome::Incorrect,
            score_delta: 0,
        }));
    }

    #[test]
    fn test_wrong_hit_after_catch_costs_five() {
        // count 2: slot 0 Fly, then slot pool[0] = 1 with Spider
        let mut s = scripted(vec![1, 0, 3, 0, 1], player(&[TargetKind::Fly, TargetKind::Bee]));
        play(&mut s);

        assert_eq!(s.hit(0), HitOutcome::Correct);
        assert_eq!(s.hit(1), HitOutcome::Incorrect);
        assert_eq!(s.score(), 5);
    }

    #[test]
    fn test_hitting_empty_hole_does_nothing() {
        let mut s = scripted(vec![0, 0, 3], PlayerConfig::default());
        play(&mut s);
        s.drain_events();

        assert_eq!(s.hit(8), HitOutcome::NoTarget);
        assert_eq!(s.hit(GRID_SIZE + 3), HitOutcome::NoTarget);
        assert_eq!(s.score(), 0);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_last_countdown_tick_ends_round() {
        let mut s = scripted(vec![], PlayerConfig::default());
        play(&mut s);
        s.advance(59_000);
        assert_eq!(s.time_remaining_secs(), 1);
        assert!(s.grid().iter().any(Option::is_some));

        s.advance(1000);
        assert_eq!(s.time_remaining_secs(), 0);
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert!(s.grid().iter().all(Option::is_none));
        assert_eq!(s.timers().pending_count(), 0);

        // Nothing left to fire
        s.drain_events();
        s.advance(10_000);
        assert!(s.drain_events().is_empty());
        assert_eq!(s.hit(0), HitOutcome::NoTarget);
    }

    #[test]
    fn test_last_correct_kind_cannot_be_removed() {
        let mut config = player(&[TargetKind::Fly]);
        assert_eq!(
            config.remove_correct_kind(TargetKind::Fly),
            Err(GameError::LastCorrectKind(TargetKind::Fly))
        );
        assert_eq!(config.correct_kinds(), &BTreeSet::from([TargetKind::Fly]));

        let mut s = scripted(vec![], config);
        assert!(s.toggle_correct_kind(TargetKind::Fly));
        assert_eq!(s.player_config().correct_kinds(), &BTreeSet::from([TargetKind::Fly]));
    }

    #[test]
    fn test_occupancy_invariant_over_a_seeded_round() {
        let mut s = GameSession::new(42, Box::new(MemoryStore::new()));
        play(&mut s);
        let mut step = 0usize;

        while s.phase() == GamePhase::Playing {
            s.advance(37);
            assert_occupancy_invariant(&s);
            step += 1;
            // Hit whatever is visible now and then
            if step % 5 == 0 {
                let target = s.grid().iter().position(Option::is_some);
                if let Some(slot) = target {
                    s.hit(slot);
                    assert_occupancy_invariant(&s);
                }
            }
        }
        assert_occupancy_invariant(&s);
        assert_eq!(s.timers().pending_count(), 0);
    }

    /// Fly in slot 5, retract due at 2000ms
    fn race_session() -> GameSession {
        let mut s = scripted(vec![0, 5, 3], PlayerConfig::default());
        play(&mut s);
        assert_eq!(s.grid()[5], Some(TargetKind::Fly));
        s
    }

    #[test]
    fn test_retract_and_hit_race_either_order() {
        // Retract fires first, the late hit finds nothing
        let mut retract_first = race_session();
        retract_first.advance(2000);
        assert_eq!(retract_first.hit(5), HitOutcome::NoTarget);
        retract_first.advance(600);
        let events = retract_first.drain_events();
        assert!(events.contains(&GameEvent::Expired { slot: 5 }));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::HitResolved { slot: 5, .. })));

        // Hit lands first, the retract never fires
        let mut hit_first = race_session();
        hit_first.advance(1999);
        assert_eq!(hit_first.hit(5), HitOutcome::Correct);
        hit_first.advance(601);
        let events = hit_first.drain_events();
        assert!(!events.contains(&GameEvent::Expired { slot: 5 }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::EffectFinished { slot: 5, .. })));

        assert_eq!(retract_first.now(), hit_first.now());
        assert_eq!(retract_first.grid(), hit_first.grid());
        assert_eq!(retract_first.grid()[5], None);
        assert_occupancy_invariant(&retract_first);
        assert_occupancy_invariant(&hit_first);
    }

    #[test]
    fn test_double_hit_scores_once() {
        let mut s = race_session();
        assert_eq!(s.hit(5), HitOutcome::Correct);
        assert_eq!(s.hit(5), HitOutcome::AlreadyResolving);
        assert_eq!(s.score(), 10);
    }

    #[test]
    fn test_pause_resume_keeps_round_progress() {
        let mut s = race_session();
        assert_eq!(s.hit(5), HitOutcome::Correct);
        s.advance(3500);
        assert_eq!(s.time_remaining_secs(), 57);

        s.pause().unwrap();
        assert_eq!(s.phase(), GamePhase::Paused);
        assert!(s.grid().iter().all(Option::is_none));
        assert_occupancy_invariant(&s);
        s.advance(5000);
        s.drain_events();

        s.resume().unwrap();
        assert_eq!(s.score(), 10);
        assert_eq!(s.time_remaining_secs(), 57);
        // Immediate spawn pass on resume
        assert!(!spawned(&s.drain_events()).is_empty());
        assert_occupancy_invariant(&s);

        // Cadence restarts from the resume point
        s.advance(999);
        assert_eq!(s.time_remaining_secs(), 57);
        s.advance(1);
        assert_eq!(s.time_remaining_secs(), 56);
    }

    #[test]
    fn test_quit_tears_everything_down() {
        let mut s = race_session();
        s.hit(5);
        s.quit().unwrap();
        assert_eq!(s.phase(), GamePhase::Menu);
        assert!(s.grid().iter().all(Option::is_none));
        assert_eq!(s.timers().pending_count(), 0);

        s.open_setup().unwrap();
        s.start_with_settings().unwrap();
        assert_eq!(s.score(), 0);
        assert_eq!(s.time_remaining_secs(), 60);
    }

    #[test]
    fn test_high_score_persists() {
        let mut s = race_session();
        assert_eq!(s.hit(5), HitOutcome::Correct);
        assert!(s.drain_events().contains(&GameEvent::NewHighScore { score: 10 }));
        assert_eq!(HighScore::load(s.store()).best(), 10);

        s.advance(60_000);
        let summary = s.summary().unwrap();
        assert_eq!(summary.final_score, 10);
        assert_eq!(summary.high_score, 10);
        assert!(summary.new_record);
        assert_eq!(summary.verdict, RoundVerdict::Failed);
    }

    #[test]
    fn test_stored_high_score_and_settings_load() {
        let mut store = MemoryStore::new();
        store.set(HighScore::STORAGE_KEY, "40").unwrap();
        let mut s = GameSession::new(7, Box::new(store));
        assert_eq!(s.high_score(), 40);

        s.select_sheriff(TargetKind::Spider);
        s.set_difficulty(Difficulty::Hard);
        let saved = Settings::load(s.store());
        assert_eq!(saved.player.sheriff(), TargetKind::Spider);
        assert_eq!(saved.difficulty, Difficulty::Hard);

        // A round below the record is not a new record
        play(&mut s);
        s.advance(60_000);
        let summary = s.summary().unwrap();
        assert_eq!(summary.final_score, 0);
        assert_eq!(summary.high_score, 40);
        assert!(!summary.new_record);
    }
}
