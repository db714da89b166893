//! Growth and fade animation for generated bolts.
//!
//! Each bolt carries two progress timers. Growth reveals branches from their
//! start with a staggered, eased front; once growth passes the halfway mark
//! the shrink timer starts retracting branches from their start as well, so
//! the figure appears to flow outward and burn away. The animator never
//! touches the topology, only the per-branch visible ranges and intensities
//! the renderer reads.

use super::easing::{ease_in_out_quad, ease_out_cubic};
use super::generator::BoltStructure;
use crate::vec3::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Pulse frequencies, per millisecond of the caller's clock.
mod constants {
    pub const CORE_PULSE_FREQ: f64 = 0.005;
    pub const CORE_PULSE_BASE: f32 = 0.95;
    pub const CORE_PULSE_DEPTH: f32 = 0.05;

    pub const GLOW_PULSE_FREQ: f64 = 0.003;
    pub const GLOW_PULSE_BASE: f32 = 0.85;
    pub const GLOW_PULSE_DEPTH: f32 = 0.15;

    /// Range of the random per-bolt phase offset
    pub const FLOW_PHASE_RANGE: f64 = 1000.0;
}

/// Timing and intensity tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorParams {
    pub growth_speed: f32,
    pub explosion_growth_speed: f32,
    pub shrink_speed: f32,
    pub explosion_shrink_speed: f32,
    /// Multiplier from timer progress to branch progress
    pub reveal_rate: f32,
    /// Delay applied per branch index
    pub branch_stagger: f32,
    /// Growth progress after which the shrink timer runs
    pub shrink_after: f32,
    pub core_opacity: f32,
    pub glow_opacity: f32,
    /// How much of the opacity the shrink removes while still growing
    pub growing_fade_depth: f32,
    pub growing_edge_intensity: f32,
    pub shrinking_edge_intensity: f32,
    /// Shrink progress at which a bolt dies regardless of growth
    pub shrink_limit: f32,
    /// Shrink progress at which a fully grown bolt dies
    pub grown_shrink_limit: f32,
}

impl Default for AnimatorParams {
    fn default() -> Self {
        Self {
            growth_speed: 0.008,
            explosion_growth_speed: 0.012,
            shrink_speed: 0.01,
            explosion_shrink_speed: 0.015,
            reveal_rate: 1.5,
            branch_stagger: 0.1,
            shrink_after: 0.5,
            core_opacity: 0.9,
            glow_opacity: 0.35,
            growing_fade_depth: 0.6,
            growing_edge_intensity: 10.0,
            shrinking_edge_intensity: 8.0,
            shrink_limit: 1.5,
            grown_shrink_limit: 1.0,
        }
    }
}

impl AnimatorParams {
    pub fn growth_speed(&self, explosion: bool) -> f32 {
        if explosion {
            self.explosion_growth_speed
        } else {
            self.growth_speed
        }
    }

    pub fn shrink_speed(&self, explosion: bool) -> f32 {
        if explosion {
            self.explosion_shrink_speed
        } else {
            self.shrink_speed
        }
    }
}

/// What the renderer should draw for one branch this tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BranchFrame {
    /// Visible segments, relative to the branch
    pub visible: Range<usize>,
    pub core_opacity: f32,
    pub glow_opacity: f32,
    pub line_opacity: f32,
    /// Point light riding the moving edge of the branch
    pub leading_edge: Option<Vec3>,
    pub leading_edge_intensity: f32,
}

impl BranchFrame {
    pub fn is_visible(&self) -> bool {
        !self.visible.is_empty()
    }
}

/// Which half of the timeline the last tick rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationPhase {
    /// Branches still revealing on their staggered fronts
    #[default]
    Growing,
    /// Growth finished; every branch shows out to its end while the shrink eats it
    FullyGrown,
}

/// Mutable per-bolt animation state
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    pub growth_progress: f32,
    pub shrink_progress: f32,
    pub is_explosion: bool,
    pub flow_phase_offset: f64,
    /// Whether the last update was asked to keep the bolt alive
    pub held: bool,
    /// Phase chosen by the last `advance`, before its timers moved
    pub phase: AnimationPhase,
    pub frames: Vec<BranchFrame>,
}

impl AnimationState {
    pub fn new(structure: &BoltStructure, flow_phase_offset: f64) -> Self {
        Self {
            growth_progress: 0.0,
            shrink_progress: 0.0,
            is_explosion: structure.mode.is_explosion(),
            flow_phase_offset,
            held: false,
            phase: AnimationPhase::Growing,
            frames: vec![BranchFrame::default(); structure.branches.len()],
        }
    }

    pub fn is_fully_grown(&self) -> bool {
        self.growth_progress >= 1.0
    }

    /// Visible segment count per branch
    pub fn visible_counts(&self) -> Vec<usize> {
        self.frames.iter().map(|f| f.visible.len()).collect()
    }
}

/// Advances bolt animation one tick at a time
#[derive(Debug, Clone, Default)]
pub struct BoltAnimator {
    params: AnimatorParams,
}

impl BoltAnimator {
    pub fn new(params: AnimatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AnimatorParams {
        &self.params
    }

    /// Fresh state for a newly generated bolt, with a random flow phase
    pub fn spawn<R: Rng + ?Sized>(&self, structure: &BoltStructure, rng: &mut R) -> AnimationState {
        let phase = rng.gen::<f64>() * constants::FLOW_PHASE_RANGE;
        AnimationState::new(structure, phase)
    }

    /// Advance timers, refresh frames and report whether the bolt lives on
    pub fn update(
        &self,
        state: &mut AnimationState,
        structure: &BoltStructure,
        keep_alive: bool,
        now_ms: f64,
    ) -> bool {
        self.advance(state, keep_alive);
        self.evaluate(state, structure, now_ms);
        self.is_alive(state)
    }

    /// Step the growth and shrink timers
    pub fn advance(&self, state: &mut AnimationState, keep_alive: bool) {
        state.held = keep_alive;
        let explosion = state.is_explosion;

        if !state.is_fully_grown() {
            state.phase = AnimationPhase::Growing;
            state.growth_progress += self.params.growth_speed(explosion);
            if state.growth_progress > self.params.shrink_after && !keep_alive {
                state.shrink_progress += self.params.shrink_speed(explosion);
            }
        } else {
            state.phase = AnimationPhase::FullyGrown;
            if !keep_alive {
                state.shrink_progress += self.params.shrink_speed(explosion);
            }
        }
    }

    /// Recompute every branch frame from the current timers and phase.
    ///
    /// Growing branches reveal on staggered fronts; once grown, all of them
    /// show out to their ends and shrink together. Pure with respect to the timers: calling it twice with the same
    /// `now_ms` yields identical frames.
    pub fn evaluate(&self, state: &mut AnimationState, structure: &BoltStructure, now_ms: f64) {
        let p = &self.params;
        let flow = state.flow_phase_offset;
        let core_pulse = pulse(now_ms, constants::CORE_PULSE_FREQ, flow, constants::CORE_PULSE_BASE, constants::CORE_PULSE_DEPTH);
        let glow_pulse = pulse(now_ms, constants::GLOW_PULSE_FREQ, flow, constants::GLOW_PULSE_BASE, constants::GLOW_PULSE_DEPTH);
        let grown = state.phase == AnimationPhase::FullyGrown;
        // Once grown, the whole bolt burns away together
        let grown_shrink_ease = ease_in_out_quad((state.shrink_progress * p.reveal_rate).clamp(0.0, 1.0));

        state.frames.resize_with(structure.branches.len(), BranchFrame::default);

        for (index, frame) in state.frames.iter_mut().enumerate() {
            let segments = structure.branch_segments(index);
            let len = segments.len();
            if len == 0 {
                *frame = BranchFrame::default();
                continue;
            }

            if grown {
                let start = reveal_count(grown_shrink_ease, len);
                let fade = (1.0 - grown_shrink_ease).powi(2);
                frame.visible = start..len;
                frame.core_opacity = p.core_opacity * fade;
                frame.glow_opacity = p.glow_opacity * fade;
                frame.line_opacity = fade;
                if start < len {
                    frame.leading_edge = Some(segments[start].start);
                    frame.leading_edge_intensity = p.shrinking_edge_intensity * fade;
                } else {
                    frame.leading_edge = None;
                    frame.leading_edge_intensity = 0.0;
                }
                continue;
            }

            let stagger = index as f32 * p.branch_stagger;
            let raw_growth = state.growth_progress * p.reveal_rate - stagger;
            if raw_growth <= 0.0 {
                *frame = BranchFrame::default();
                continue;
            }

            let end = reveal_count(ease_out_cubic(raw_growth.min(1.0)), len);
            let shrink_ease = ease_in_out_quad((state.shrink_progress * p.reveal_rate - stagger).clamp(0.0, 1.0));
            let start = reveal_count(shrink_ease, len).min(end);
            let present = if start < end { 1.0 } else { 0.0 };
            let fade = if shrink_ease > 0.0 {
                1.0 - shrink_ease * p.growing_fade_depth
            } else {
                1.0
            };

            frame.visible = start..end;
            frame.core_opacity = p.core_opacity * core_pulse * present * fade;
            frame.glow_opacity = p.glow_opacity * glow_pulse * present * fade;
            frame.line_opacity = 1.0;
            if end > 0 {
                frame.leading_edge = Some(segments[end - 1].end);
                frame.leading_edge_intensity = p.growing_edge_intensity * glow_pulse * fade;
            } else {
                frame.leading_edge = None;
                frame.leading_edge_intensity = 0.0;
            }
        }
    }

    /// A held bolt always lives; otherwise it dies once the shrink has run out
    pub fn is_alive(&self, state: &AnimationState) -> bool {
        if state.held {
            return true;
        }
        state.shrink_progress < self.params.shrink_limit
            && (!state.is_fully_grown() || state.shrink_progress < self.params.grown_shrink_limit)
    }

    /// Upper bound on ticks from spawn to death for an unheld bolt
    pub fn lifetime_bound(&self, explosion: bool) -> usize {
        let growth = 1.0 / self.params.growth_speed(explosion);
        let shrink = 1.0 / self.params.shrink_speed(explosion);
        ((growth + shrink) * self.params.reveal_rate).ceil() as usize
    }
}

fn pulse(now_ms: f64, freq: f64, phase: f64, base: f32, depth: f32) -> f32 {
    base + (now_ms * freq + phase).sin() as f32 * depth
}

fn reveal_count(eased: f32, len: usize) -> usize {
    ((eased * len as f32).floor() as usize).min(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lightning::generator::{BoltMode, FractalBoltGenerator, DEFAULT_MAX_DEPTH};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TICK_MS: f64 = 16.0;

    fn setup(seed: u64, mode: BoltMode) -> (BoltAnimator, BoltStructure, AnimationState) {
        let mut rng = StdRng::seed_from_u64(seed);
        let structure = FractalBoltGenerator::default().generate(Vec3::ZERO, mode, DEFAULT_MAX_DEPTH, &mut rng);
        let animator = BoltAnimator::default();
        let state = animator.spawn(&structure, &mut rng);
        (animator, structure, state)
    }

    fn ticks_to_death(animator: &BoltAnimator, structure: &BoltStructure, state: &mut AnimationState) -> usize {
        let mut ticks = 0;
        while animator.update(state, structure, false, ticks as f64 * TICK_MS) {
            ticks += 1;
            assert!(ticks < 10_000, "bolt never died");
        }
        ticks + 1
    }

    #[test]
    fn new_state_starts_at_zero() {
        let (_, structure, state) = setup(1, BoltMode::Directional);
        assert_eq!(state.growth_progress, 0.0);
        assert_eq!(state.shrink_progress, 0.0);
        assert_eq!(state.frames.len(), structure.branches.len());
        assert!(state.visible_counts().iter().all(|&c| c == 0));
    }

    #[test]
    fn shrink_waits_for_half_growth() {
        let (animator, structure, mut state) = setup(2, BoltMode::Directional);
        for t in 0..60 {
            animator.update(&mut state, &structure, false, t as f64 * TICK_MS);
        }
        assert!(state.growth_progress <= 0.5);
        assert_eq!(state.shrink_progress, 0.0);
        for t in 60..70 {
            animator.update(&mut state, &structure, false, t as f64 * TICK_MS);
        }
        assert!(state.shrink_progress > 0.0);
    }

    #[test]
    fn root_reveals_fully_before_later_branches() {
        let (animator, structure, mut state) = setup(3, BoltMode::Directional);
        let root_len = structure.branches[0].len();
        let mut t = 0;
        while state.frames[0].visible.end < root_len {
            animator.update(&mut state, &structure, true, t as f64 * TICK_MS);
            t += 1;
        }
        // Stagger keeps the fifth branch behind the root
        assert!(state.frames[5].visible.end < structure.branches[5].len());
        assert!(state.frames[0].leading_edge.is_some());
    }

    #[test]
    fn visible_end_never_recedes() {
        let (animator, structure, mut state) = setup(4, BoltMode::Explosion);
        let mut last_end = vec![0usize; structure.branches.len()];
        let mut t = 0;
        while animator.update(&mut state, &structure, false, t as f64 * TICK_MS) {
            for (i, frame) in state.frames.iter().enumerate() {
                if frame.line_opacity > 0.0 && frame.visible.end > 0 {
                    assert!(frame.visible.end >= last_end[i]);
                    assert!(frame.visible.start <= frame.visible.end);
                    last_end[i] = frame.visible.end;
                }
            }
            t += 1;
        }
    }

    #[test]
    fn bolts_die_within_bound() {
        for mode in [BoltMode::Directional, BoltMode::Explosion] {
            let (animator, structure, mut state) = setup(5, mode);
            let ticks = ticks_to_death(&animator, &structure, &mut state);
            assert!(ticks <= animator.lifetime_bound(mode.is_explosion()), "{:?} took {} ticks", mode, ticks);
            assert!(state.shrink_progress >= 1.0);
        }
    }

    #[test]
    fn explosions_burn_out_faster() {
        let (a, s, mut st) = setup(6, BoltMode::Directional);
        let directional = ticks_to_death(&a, &s, &mut st);
        let (a, s, mut st) = setup(6, BoltMode::Explosion);
        let explosion = ticks_to_death(&a, &s, &mut st);
        assert!(explosion < directional);
    }

    #[test]
    fn held_bolt_freezes_shrink() {
        let (animator, structure, mut state) = setup(7, BoltMode::Directional);
        let mut t = 0;
        while !state.is_fully_grown() {
            animator.update(&mut state, &structure, false, t as f64 * TICK_MS);
            t += 1;
        }
        let frozen = state.shrink_progress;
        for _ in 0..100 {
            assert!(animator.update(&mut state, &structure, true, t as f64 * TICK_MS));
            t += 1;
        }
        assert_eq!(state.shrink_progress, frozen);

        animator.update(&mut state, &structure, false, t as f64 * TICK_MS);
        assert!(state.shrink_progress > frozen);
    }

    #[test]
    fn held_bolt_still_grows() {
        let (animator, structure, mut state) = setup(8, BoltMode::Explosion);
        for t in 0..200 {
            assert!(animator.update(&mut state, &structure, true, t as f64 * TICK_MS));
        }
        assert!(state.is_fully_grown());
        assert_eq!(state.shrink_progress, 0.0);
    }

    #[test]
    fn evaluate_is_idempotent_for_fixed_tick() {
        let (animator, structure, mut state) = setup(9, BoltMode::Directional);
        for t in 0..40 {
            animator.update(&mut state, &structure, false, t as f64 * TICK_MS);
        }
        animator.evaluate(&mut state, &structure, 1234.0);
        let first = state.frames.clone();
        animator.evaluate(&mut state, &structure, 1234.0);
        assert_eq!(first, state.frames);

        let (animator2, structure2, mut twin) = setup(9, BoltMode::Directional);
        for t in 0..40 {
            animator2.update(&mut twin, &structure2, false, t as f64 * TICK_MS);
        }
        animator2.evaluate(&mut twin, &structure2, 1234.0);
        assert_eq!(first, twin.frames);
    }

    #[test]
    fn fade_is_sharper_after_peak() {
        let (animator, structure, mut state) = setup(10, BoltMode::Directional);
        let mut t = 0;
        while state.phase != AnimationPhase::FullyGrown {
            animator.update(&mut state, &structure, false, t as f64 * TICK_MS);
            t += 1;
        }
        let shrink_ease = ease_in_out_quad((state.shrink_progress * 1.5).clamp(0.0, 1.0));
        let expected = 0.9 * (1.0 - shrink_ease).powi(2);
        for (index, frame) in state.frames.iter().enumerate() {
            assert!((frame.core_opacity - expected).abs() < 1e-5);
            if frame.is_visible() {
                let start = frame.visible.start;
                assert_eq!(frame.leading_edge, Some(structure.branch_segments(index)[start].start));
            }
        }
    }

    #[test]
    fn every_branch_shows_before_death() {
        for mode in [BoltMode::Directional, BoltMode::Explosion] {
            let (animator, structure, mut state) = setup(5, mode);
            let mut seen = vec![false; structure.branches.len()];
            let mut t = 0;
            loop {
                let alive = animator.update(&mut state, &structure, false, t as f64 * TICK_MS);
                for (i, frame) in state.frames.iter().enumerate() {
                    seen[i] |= frame.is_visible();
                }
                if !alive {
                    break;
                }
                t += 1;
            }
            let hidden: Vec<usize> = (0..seen.len()).filter(|&i| !seen[i]).collect();
            assert!(structure.branches.len() > 15, "{:?} too small to exercise the stagger", mode);
            assert!(hidden.is_empty(), "{:?} never showed branches {:?}", mode, hidden);
        }
    }

    #[test]
    fn grown_branches_show_to_their_end() {
        let (animator, structure, mut state) = setup(12, BoltMode::Directional);
        let mut t = 0;
        while animator.update(&mut state, &structure, false, t as f64 * TICK_MS) {
            if state.phase == AnimationPhase::FullyGrown {
                for (i, frame) in state.frames.iter().enumerate() {
                    if frame.is_visible() {
                        assert_eq!(frame.visible.end, structure.branches[i].len());
                    }
                }
            }
            t += 1;
        }
    }

    #[test]
    fn held_grown_bolt_shows_everything() {
        let (animator, structure, mut state) = setup(13, BoltMode::Explosion);
        for t in 0..200 {
            animator.update(&mut state, &structure, true, t as f64 * TICK_MS);
        }
        assert_eq!(state.phase, AnimationPhase::FullyGrown);
        for (i, frame) in state.frames.iter().enumerate() {
            assert_eq!(frame.visible, 0..structure.branches[i].len());
            assert!((frame.core_opacity - 0.9).abs() < 1e-6);
        }
    }

    #[test]
    fn crossing_tick_still_renders_growth() {
        let (animator, structure, mut state) = setup(14, BoltMode::Directional);
        let mut t = 0;
        while !state.is_fully_grown() {
            animator.update(&mut state, &structure, false, t as f64 * TICK_MS);
            t += 1;
        }
        // Growth crossed 1.0 during this tick, so it was drawn as growing
        assert_eq!(state.phase, AnimationPhase::Growing);
        assert_eq!(state.frames[0].line_opacity, 1.0);

        animator.update(&mut state, &structure, false, t as f64 * TICK_MS);
        assert_eq!(state.phase, AnimationPhase::FullyGrown);
        assert!(state.frames[0].line_opacity < 1.0);
    }

    #[test]
    fn intensities_stay_in_range() {
        let (animator, structure, mut state) = setup(11, BoltMode::Explosion);
        let mut t = 0;
        while animator.update(&mut state, &structure, false, t as f64 * TICK_MS) {
            for frame in &state.frames {
                assert!((0.0..=0.9 + 1e-5).contains(&frame.core_opacity));
                assert!((0.0..=0.35 + 1e-5).contains(&frame.glow_opacity));
                assert!((0.0..=10.0 + 1e-4).contains(&frame.leading_edge_intensity));
            }
            t += 1;
        }
    }
}
