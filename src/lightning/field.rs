//! The set of bolts alive at once.
//!
//! Bolts are kept in spawn order in a bounded FIFO; spawning past capacity
//! evicts the oldest. At most one bolt may be held, which keeps it from
//! burning out while the caller's input stays pressed.

use super::animator::{AnimationState, AnimatorParams, BoltAnimator, BranchFrame};
use super::generator::{BoltMode, BoltStructure, FractalBoltGenerator, GeneratorParams, DEFAULT_MAX_DEPTH};
use crate::vec3::Vec3;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Stable handle for a spawned bolt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoltId(u64);

/// Field limits and spawn policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Maximum concurrently live bolts
    pub capacity: usize,
    /// Probability that an unforced spawn is an explosion
    pub explosion_chance: f64,
    pub max_depth: u32,
    pub generator: GeneratorParams,
    pub animator: AnimatorParams,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            explosion_chance: 0.1,
            max_depth: DEFAULT_MAX_DEPTH,
            generator: GeneratorParams::default(),
            animator: AnimatorParams::default(),
        }
    }
}

/// A generated structure together with its animation
#[derive(Debug, Clone)]
pub struct LiveBolt {
    pub id: BoltId,
    pub structure: BoltStructure,
    pub state: AnimationState,
}

impl LiveBolt {
    /// Branches with their current frame, in generation order
    pub fn frames(&self) -> impl Iterator<Item = (usize, &BranchFrame)> + '_ {
        self.state.frames.iter().enumerate()
    }
}

pub struct BoltField {
    config: FieldConfig,
    generator: FractalBoltGenerator,
    animator: BoltAnimator,
    bolts: VecDeque<LiveBolt>,
    held: Option<BoltId>,
    next_id: u64,
    rng: StdRng,
}

impl BoltField {
    pub fn new(config: FieldConfig, seed: u64) -> Self {
        Self {
            generator: FractalBoltGenerator::new(config.generator),
            animator: BoltAnimator::new(config.animator),
            bolts: VecDeque::with_capacity(config.capacity.max(1)),
            held: None,
            next_id: 0,
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Generate a bolt at `origin`; explosions follow the configured chance
    /// unless `force_explosion` is set
    pub fn spawn(&mut self, origin: Vec3, force_explosion: bool) -> BoltId {
        let explosion = force_explosion
            || self.rng.gen_bool(self.config.explosion_chance.clamp(0.0, 1.0));
        let mode = if explosion {
            BoltMode::Explosion
        } else {
            BoltMode::Directional
        };
        self.spawn_mode(origin, mode)
    }

    pub fn spawn_mode(&mut self, origin: Vec3, mode: BoltMode) -> BoltId {
        let structure = self
            .generator
            .generate(origin, mode, self.config.max_depth, &mut self.rng);
        let state = self.animator.spawn(&structure, &mut self.rng);
        let id = BoltId(self.next_id);
        self.next_id += 1;
        self.bolts.push_back(LiveBolt { id, structure, state });

        while self.bolts.len() > self.config.capacity.max(1) {
            if let Some(oldest) = self.bolts.pop_front() {
                tracing::debug!(id = oldest.id.0, "evicting oldest bolt");
                if self.held == Some(oldest.id) {
                    self.held = None;
                }
            }
        }
        id
    }

    /// Mark a live bolt as held; returns false if it is gone
    pub fn hold(&mut self, id: BoltId) -> bool {
        if self.get(id).is_some() {
            self.held = Some(id);
            true
        } else {
            false
        }
    }

    pub fn release(&mut self) {
        self.held = None;
    }

    pub fn held(&self) -> Option<BoltId> {
        self.held
    }

    pub fn get(&self, id: BoltId) -> Option<&LiveBolt> {
        self.bolts.iter().find(|b| b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveBolt> + '_ {
        self.bolts.iter()
    }

    pub fn len(&self) -> usize {
        self.bolts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bolts.is_empty()
    }

    pub fn clear(&mut self) {
        self.bolts.clear();
        self.held = None;
    }

    /// Update every bolt once and drop the dead ones; returns how many died
    pub fn tick(&mut self, now_ms: f64) -> usize {
        let held = self.held;
        let animator = &self.animator;
        let before = self.bolts.len();
        self.bolts.retain_mut(|bolt| {
            let keep_alive = held == Some(bolt.id);
            animator.update(&mut bolt.state, &bolt.structure, keep_alive, now_ms)
        });
        if let Some(id) = self.held {
            if self.get(id).is_none() {
                self.held = None;
            }
        }
        before - self.bolts.len()
    }
}
