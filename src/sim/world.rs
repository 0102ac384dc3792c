use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{info, trace};

use super::bot::Bot;
use crate::dsl::vm::Limits;
use crate::error::AppError;
use crate::settings::SimSettings;

/// All live bots plus the worker pool that ticks them.
///
/// A tick has two phases. First every bot runs its machine on one of the
/// workers; each bot is visited exactly once and the phase ends only when
/// all of them are done. Then positions are integrated on the calling thread.
pub struct World {
    bots: Vec<Bot>,
    pool: ThreadPool,
    cycles_per_tick: u32,
    dt: f64,
    limits: Limits,
    ticks: u64,
}

impl World {
    pub fn new(settings: &SimSettings) -> Result<Self, AppError> {
        settings.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.workers)
            .thread_name(|i| format!("bot-worker-{i}"))
            .build()?;
        info!(workers = settings.workers, cycles_per_tick = settings.cycles_per_tick, "world created");
        Ok(Self {
            bots: Vec::new(),
            pool,
            cycles_per_tick: settings.cycles_per_tick,
            dt: settings.dt,
            limits: settings.limits(),
            ticks: 0,
        })
    }

    /// Add a bot. The world's execution limits are applied to its machine.
    pub fn spawn(&mut self, mut bot: Bot) {
        bot.set_limits(self.limits);
        self.bots.push(bot);
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn bot_mut(&mut self, index: usize) -> Option<&mut Bot> {
        self.bots.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn tick(&mut self) {
        let cycles = self.cycles_per_tick;
        let bots = &mut self.bots;
        self.pool.install(|| {
            bots.par_iter_mut().for_each(|bot| {
                bot.body_mut().frame_reset();
                for _ in 0..cycles {
                    bot.run();
                }
            });
        });

        for bot in &mut self.bots {
            bot.body_mut().integrate(self.dt);
        }
        self.ticks += 1;
        trace!(tick = self.ticks, bots = self.bots.len(), "tick complete");
    }

    /// Run `ticks` ticks back to back.
    pub fn advance(&mut self, ticks: u64) {
        info!(ticks, bots = self.bots.len(), "advancing world");
        for _ in 0..ticks {
            self.tick();
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("bots", &self.bots.len())
            .field("workers", &self.workers())
            .field("cycles_per_tick", &self.cycles_per_tick)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}
