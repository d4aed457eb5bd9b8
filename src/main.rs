//! Ladybug Sheriff entry point
//!
//! Native: plays one headless round with a simulated player and prints the
//! result. The browser build is driven through `platform::web::WebGame`.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use anyhow::Context;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use ladybug_sheriff::persistence::platform_store;
    use ladybug_sheriff::platform::init_logging;
    use ladybug_sheriff::settings::PlayerConfig;
    use ladybug_sheriff::sim::{GameEvent, GamePhase, GameSession, HitOutcome, Millis};

    /// Time from a bug appearing to the player's click
    const REACTION_MS: Millis = 350;
    const REACTION_JITTER_MS: Millis = 250;
    /// Chance of clicking a bug that should be left alone
    const MISCLICK_CHANCE: f64 = 0.15;

    /// A player with human-ish reactions
    struct DemoPlayer {
        rng: Pcg32,
        planned: Vec<(Millis, usize)>,
        catches: u32,
        misses: u32,
    }

    impl DemoPlayer {
        fn new(seed: u64) -> Self {
            Self {
                rng: Pcg32::seed_from_u64(seed.wrapping_add(1)),
                planned: Vec::new(),
                catches: 0,
                misses: 0,
            }
        }

        fn observe(&mut self, event: &GameEvent, now: Millis, config: &PlayerConfig) {
            match event {
                GameEvent::Spawned { slot, kind } => {
                    let wants = config.is_correct(*kind) || self.rng.random_bool(MISCLICK_CHANCE);
                    if wants {
                        let delay = REACTION_MS + self.rng.random_range(0..=REACTION_JITTER_MS);
                        self.planned.push((now + delay, *slot));
                    }
                }
                GameEvent::Expired { slot } => self.planned.retain(|(_, s)| s != slot),
                _ => {}
            }
        }

        /// When the next planned click lands
        fn next_click(&self) -> Option<Millis> {
            self.planned.iter().map(|(at, _)| *at).min()
        }

        /// Clicks whose time has come
        fn due(&mut self, now: Millis) -> Vec<usize> {
            let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.planned)
                .into_iter()
                .partition(|(at, _)| *at <= now);
            self.planned = later;
            due.into_iter().map(|(_, slot)| slot).collect()
        }
    }

    fn seed_from_args() -> u64 {
        std::env::args()
            .nth(1)
            .and_then(|arg| arg.parse().ok())
            .unwrap_or_else(|| {
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0)
            })
    }

    pub fn run() -> anyhow::Result<()> {
        init_logging();
        let seed = seed_from_args();
        log::info!("Ladybug Sheriff (native) starting with seed {}", seed);

        let mut session = GameSession::new(seed, platform_store());
        let mut player = DemoPlayer::new(seed);
        session.open_setup()?;
        session.start_with_settings().context("could not start the round")?;
        println!(
            "Sheriff {} on duty, catching {:?}",
            session.player_config().sheriff().as_str(),
            session
                .player_config()
                .correct_kinds()
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
        );

        while session.phase() == GamePhase::Playing {
            for event in session.drain_events() {
                log::debug!("{:?}", event);
                player.observe(&event, session.now(), session.player_config());
            }
            for slot in player.due(session.now()) {
                match session.hit(slot) {
                    HitOutcome::Correct => player.catches += 1,
                    HitOutcome::Incorrect => player.misses += 1,
                    HitOutcome::NoTarget | HitOutcome::AlreadyResolving => {}
                }
            }
            // Jump straight to whatever happens next: a click or a timer
            let next = [player.next_click(), session.timers().next_deadline()]
                .into_iter()
                .flatten()
                .min();
            match next {
                Some(at) => session.advance(at.saturating_sub(session.now())),
                None => break,
            }
        }

        let summary = session.summary().context("round ended without a summary")?;
        println!("Caught {}, wrong hits {}", player.catches, player.misses);
        println!("Final score: {}", summary.final_score);
        println!("High score:  {}", summary.high_score);
        println!("{}", summary.verdict.as_str());
        if summary.new_record {
            println!("New record!");
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    demo::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_start, this is just to satisfy the compiler
}
