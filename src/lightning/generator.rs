//! Fractal Lichtenberg-figure generator.
//!
//! A bolt is built depth-first from a single origin: every branch is a
//! jittered polyline marching along a main direction, and spawns child
//! branches at evenly spaced points along its own path. Branches are stored
//! in insertion order (root first, then pre-order) and own contiguous ranges
//! of a shared segment arena.

use crate::vec3::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use std::ops::{Range, RangeInclusive};

/// Constants for bolt geometry.
mod constants {
    /// Default recursion limit (root is depth 0)
    pub const DEFAULT_MAX_DEPTH: u32 = 4;
    /// Hard ceiling on recursion; fan-out grows exponentially with depth
    pub const MAX_SUPPORTED_DEPTH: u32 = 6;

    /// Horizontal spread of the downward root direction
    pub const DIRECTIONAL_ROOT_SPREAD: f32 = 0.6;
    /// Offset applied to the random elevation of explosion roots (fraction of PI)
    pub const EXPLOSION_ELEVATION_BIAS: f32 = 0.6;

    /// Per-axis deviation range added to the parent direction
    pub const DIRECTIONAL_DEVIATION: f32 = 2.0;
    pub const EXPLOSION_DEVIATION: f32 = 2.5;
    /// Downward pull folded into the deviation
    pub const DIRECTIONAL_SAG: f32 = 0.4;
    pub const EXPLOSION_SAG: f32 = 0.2;

    /// Per-axis range of the step jitter before scaling
    pub const STEP_JITTER_RANGE: f32 = 1.5;

    /// Child branch angle away from the parent direction, in degrees
    pub const BRANCH_ANGLE_MIN_DEG: f32 = 40.0;
    pub const BRANCH_ANGLE_MAX_DEG: f32 = 90.0;
    /// Vertical squash of the random vector a child branch turns toward
    pub const BRANCH_VERTICAL_SQUASH: f32 = 0.75;

    /// Tip segment length range, before depth scaling
    pub const TIP_LENGTH_MIN: f32 = 0.8;
    pub const TIP_LENGTH_JITTER: f32 = 1.5;
    /// Tip width relative to the branch base width
    pub const TIP_WIDTH_FACTOR: f32 = 0.25;
    /// Explosions drop tips from this depth on
    pub const EXPLOSION_TIP_CUTOFF_DEPTH: u32 = 3;

    /// Shortest step a polyline may take
    pub const MIN_STEP_LENGTH: f32 = 1e-3;
}

pub use constants::DEFAULT_MAX_DEPTH;

/// How a bolt spreads from its origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoltMode {
    /// A strike that heads downward and forks
    Directional,
    /// A radial burst in every direction
    Explosion,
}

impl BoltMode {
    pub fn is_explosion(self) -> bool {
        self == BoltMode::Explosion
    }

    /// Number of children a branch at `depth` may spawn
    pub fn fan_out(self, depth: u32) -> RangeInclusive<usize> {
        match (self, depth) {
            (BoltMode::Explosion, 0) => 6..=8,
            (BoltMode::Explosion, 1) => 3..=4,
            (BoltMode::Explosion, _) => 2..=3,
            (BoltMode::Directional, 0) => 4..=6,
            (BoltMode::Directional, _) => 3..=4,
        }
    }

    /// Number of polyline steps per branch
    pub fn step_range(self) -> RangeInclusive<usize> {
        match self {
            BoltMode::Explosion => 8..=12,
            BoltMode::Directional => 10..=17,
        }
    }

    /// Upper bound on the branch count of a structure built to `max_depth`
    pub fn max_branches(self, max_depth: u32) -> usize {
        let mut total = 0usize;
        let mut level = 1usize;
        for depth in 0..=max_depth {
            total += level;
            level *= *self.fan_out(depth).end();
        }
        total
    }

    fn deviation(self) -> (f32, f32) {
        match self {
            BoltMode::Explosion => (constants::EXPLOSION_DEVIATION, constants::EXPLOSION_SAG),
            BoltMode::Directional => (constants::DIRECTIONAL_DEVIATION, constants::DIRECTIONAL_SAG),
        }
    }

    fn has_tips(self, depth: u32) -> bool {
        depth >= 1 && !(self.is_explosion() && depth >= constants::EXPLOSION_TIP_CUTOFF_DEPTH)
    }

    fn tip_points(self, path_len: usize) -> usize {
        match self {
            BoltMode::Explosion => path_len / 5,
            BoltMode::Directional => path_len / 3,
        }
    }

    fn tips_per_point(self) -> RangeInclusive<usize> {
        match self {
            BoltMode::Explosion => 1..=2,
            BoltMode::Directional => 2..=4,
        }
    }
}

/// One straight piece of a branch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchSegment {
    pub start: Vec3,
    pub end: Vec3,
    pub width: f32,
    pub depth: u32,
    #[serde(default)]
    pub is_tip: bool,
}

impl BranchSegment {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// A contiguous polyline at a single recursion depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub depth: u32,
    /// Range into the structure's segment arena; main path first, tips after
    pub segments: Range<usize>,
    /// Number of main-path (non-tip) segments at the front of `segments`
    pub main_segments: usize,
    /// Index of the branch this one forked from
    pub parent: Option<usize>,
    /// Unit direction the branch marches along
    pub direction: Vec3,
}

impl Branch {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A complete generated figure; topology is fixed after generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoltStructure {
    pub mode: BoltMode,
    pub origin: Vec3,
    pub max_depth: u32,
    pub segments: Vec<BranchSegment>,
    pub branches: Vec<Branch>,
}

impl BoltStructure {
    pub fn branch_segments(&self, index: usize) -> &[BranchSegment] {
        &self.segments[self.branches[index].segments.clone()]
    }

    /// Path points of a branch's main polyline (`main_segments + 1` points)
    pub fn path_points(&self, index: usize) -> Vec<Vec3> {
        let branch = &self.branches[index];
        let main = &self.segments[branch.segments.start..branch.segments.start + branch.main_segments];
        let mut points: Vec<Vec3> = main.iter().map(|s| s.start).collect();
        if let Some(last) = main.last() {
            points.push(last.end);
        }
        points
    }

    pub fn children_of(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.branches
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.parent == Some(index))
            .map(|(i, _)| i)
    }

    pub fn tip_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_tip).count()
    }
}

/// Tunable geometry parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorParams {
    pub base_length: f32,
    pub length_jitter: f32,
    pub explosion_length_multiplier: f32,
    pub base_width: f32,
    /// Per-depth shrink of width and length
    pub depth_attenuation: f32,
    /// Fraction of width lost from the start to the end of a branch
    pub taper: f32,
    /// Weight of per-step jitter relative to the main direction
    pub jitter_scale: f32,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            base_length: 20.0,
            length_jitter: 15.0,
            explosion_length_multiplier: 1.4,
            base_width: 0.1,
            depth_attenuation: 0.75,
            taper: 0.4,
            jitter_scale: 0.4,
        }
    }
}

/// Index along a parent path where child `child` of `children` forks off
pub fn branch_point_index(child: usize, children: usize, path_len: usize) -> usize {
    let t = (child + 1) as f32 / (children + 1) as f32;
    (t * path_len.saturating_sub(2) as f32).floor() as usize + 1
}

/// Index along a path where tip cluster `tip` of `tips` sits
pub fn tip_point_index(tip: usize, tips: usize, path_len: usize) -> usize {
    let t = (tip + 1) as f32 / (tips + 1) as f32;
    (t * path_len.saturating_sub(1) as f32).floor() as usize
}

/// Builds Lichtenberg-figure bolts
#[derive(Debug, Clone, Default)]
pub struct FractalBoltGenerator {
    params: GeneratorParams,
}

impl FractalBoltGenerator {
    pub fn new(params: GeneratorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// Generate a full bolt rooted at `origin`
    pub fn generate<R: Rng + ?Sized>(
        &self,
        origin: Vec3,
        mode: BoltMode,
        max_depth: u32,
        rng: &mut R,
    ) -> BoltStructure {
        let origin = if origin.is_finite() {
            origin
        } else {
            tracing::warn!(?origin, "non-finite bolt origin, using world origin");
            Vec3::ZERO
        };
        let max_depth = if max_depth > constants::MAX_SUPPORTED_DEPTH {
            tracing::warn!(max_depth, limit = constants::MAX_SUPPORTED_DEPTH, "clamping bolt depth");
            constants::MAX_SUPPORTED_DEPTH
        } else {
            max_depth
        };

        let mut builder = Builder {
            params: &self.params,
            mode,
            max_depth,
            rng,
            segments: Vec::with_capacity(256),
            branches: Vec::with_capacity(64),
        };
        builder.grow(origin, None, 0, 1.0);

        tracing::debug!(
            ?mode,
            branches = builder.branches.len(),
            segments = builder.segments.len(),
            "generated bolt"
        );

        BoltStructure {
            mode,
            origin,
            max_depth,
            segments: builder.segments,
            branches: builder.branches,
        }
    }
}

struct Builder<'a, R: Rng + ?Sized> {
    params: &'a GeneratorParams,
    mode: BoltMode,
    max_depth: u32,
    rng: &'a mut R,
    segments: Vec<BranchSegment>,
    branches: Vec<Branch>,
}

impl<R: Rng + ?Sized> Builder<'_, R> {
    /// Uniform value in [-0.5, 0.5) scaled by `range`
    fn centered(&mut self, range: f32) -> f32 {
        (self.rng.gen::<f32>() - 0.5) * range
    }

    fn root_direction(&mut self) -> Vec3 {
        let angle = self.rng.gen::<f32>() * TAU;
        match self.mode {
            BoltMode::Directional => {
                let spread = constants::DIRECTIONAL_ROOT_SPREAD;
                Vec3::new(angle.cos() * spread, -1.0, angle.sin() * spread).normalize_or(-Vec3::UP)
            }
            BoltMode::Explosion => {
                let elevation = (self.rng.gen::<f32>() - constants::EXPLOSION_ELEVATION_BIAS) * PI;
                Vec3::new(
                    angle.cos() * elevation.cos(),
                    elevation.sin(),
                    angle.sin() * elevation.cos(),
                )
                .normalize_or(-Vec3::UP)
            }
        }
    }

    fn deviate(&mut self, parent: Vec3) -> Vec3 {
        let (scale, sag) = self.mode.deviation();
        let deviation = Vec3::new(
            self.centered(scale),
            self.centered(scale) - sag,
            self.centered(scale),
        );
        (parent + deviation).normalize_or(parent)
    }

    fn child_direction(&mut self, main: Vec3) -> Vec3 {
        let angle = self
            .rng
            .gen_range(constants::BRANCH_ANGLE_MIN_DEG..=constants::BRANCH_ANGLE_MAX_DEG)
            .to_radians();
        let random = Vec3::new(
            self.centered(2.0),
            self.centered(2.0 * constants::BRANCH_VERTICAL_SQUASH),
            self.centered(2.0),
        );
        let perpendicular = (random - main * random.dot(main)).normalize_or(main.any_perpendicular());
        (main * angle.cos() + perpendicular * angle.sin()).normalize_or(main)
    }

    fn grow(&mut self, start: Vec3, parent: Option<(usize, Vec3)>, depth: u32, scale: f32) {
        let main = match parent {
            None => self.root_direction(),
            Some((_, parent_dir)) => self.deviate(parent_dir),
        };

        let length_multiplier = if self.mode.is_explosion() {
            self.params.explosion_length_multiplier
        } else {
            1.0
        };
        let length = (self.params.base_length + self.rng.gen::<f32>() * self.params.length_jitter)
            * scale
            * length_multiplier;
        let steps = self.rng.gen_range(self.mode.step_range());
        let step_size = (length / steps as f32).max(constants::MIN_STEP_LENGTH);

        let mut path = Vec::with_capacity(steps + 1);
        let mut current = start;
        path.push(current);
        for _ in 0..steps {
            let jitter = Vec3::new(
                self.centered(constants::STEP_JITTER_RANGE),
                self.centered(constants::STEP_JITTER_RANGE),
                self.centered(constants::STEP_JITTER_RANGE),
            );
            let step = (main + jitter * self.params.jitter_scale).normalize_or(main);
            current += step * step_size;
            path.push(current);
        }

        let base_width = self.params.base_width * self.params.depth_attenuation.powi(depth as i32);
        let first = self.segments.len();
        for (i, pair) in path.windows(2).enumerate() {
            let taper = 1.0 - (i as f32 / path.len() as f32) * self.params.taper;
            self.segments.push(BranchSegment {
                start: pair[0],
                end: pair[1],
                width: base_width * taper,
                depth,
                is_tip: false,
            });
        }

        if self.mode.has_tips(depth) {
            self.scatter_tips(&path, main, depth, scale, base_width);
        }

        let index = self.branches.len();
        self.branches.push(Branch {
            depth,
            segments: first..self.segments.len(),
            main_segments: steps,
            parent: parent.map(|(p, _)| p),
            direction: main,
        });

        if depth < self.max_depth {
            let children = self.rng.gen_range(self.mode.fan_out(depth));
            for c in 0..children {
                let fork = path[branch_point_index(c, children, path.len())];
                let direction = self.child_direction(main);
                self.grow(
                    fork,
                    Some((index, direction)),
                    depth + 1,
                    scale * self.params.depth_attenuation,
                );
            }
        }
    }

    fn scatter_tips(&mut self, path: &[Vec3], main: Vec3, depth: u32, scale: f32, base_width: f32) {
        let tip_points = self.mode.tip_points(path.len());
        for tp in 0..tip_points {
            let anchor = path[tip_point_index(tp, tip_points, path.len())];
            let tips = self.rng.gen_range(self.mode.tips_per_point());
            for _ in 0..tips {
                let dir = Vec3::new(self.centered(2.0), self.centered(2.0), self.centered(2.0))
                    .normalize_or(main.any_perpendicular());
                let len = (constants::TIP_LENGTH_MIN + self.rng.gen::<f32>() * constants::TIP_LENGTH_JITTER) * scale;
                self.segments.push(BranchSegment {
                    start: anchor,
                    end: anchor + dir * len,
                    width: base_width * constants::TIP_WIDTH_FACTOR,
                    depth,
                    is_tip: true,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bolt(seed: u64, mode: BoltMode) -> BoltStructure {
        let mut rng = StdRng::seed_from_u64(seed);
        FractalBoltGenerator::default().generate(Vec3::ZERO, mode, DEFAULT_MAX_DEPTH, &mut rng)
    }

    #[test]
    fn same_seed_same_bolt() {
        assert_eq!(bolt(7, BoltMode::Directional), bolt(7, BoltMode::Directional));
        assert_ne!(bolt(7, BoltMode::Directional), bolt(8, BoltMode::Directional));
    }

    #[test]
    fn branch_count_is_bounded() {
        assert_eq!(BoltMode::Directional.max_branches(4), 1 + 6 + 24 + 96 + 384);
        assert_eq!(BoltMode::Explosion.max_branches(2), 1 + 8 + 32);
        for seed in 0..20 {
            for mode in [BoltMode::Directional, BoltMode::Explosion] {
                let s = bolt(seed, mode);
                assert!(s.branches.len() <= mode.max_branches(DEFAULT_MAX_DEPTH));
                // At least one full chain of branches reaches the limit
                assert!(s.branches.iter().any(|b| b.depth == DEFAULT_MAX_DEPTH));
            }
        }
    }

    #[test]
    fn root_comes_first_and_parents_precede_children() {
        let s = bolt(3, BoltMode::Directional);
        assert_eq!(s.branches[0].depth, 0);
        assert_eq!(s.branches[0].parent, None);
        for (i, b) in s.branches.iter().enumerate().skip(1) {
            let parent = b.parent.expect("non-root branch has a parent");
            assert!(parent < i);
            assert_eq!(s.branches[parent].depth + 1, b.depth);
        }
    }

    #[test]
    fn segments_carry_branch_depth() {
        let s = bolt(11, BoltMode::Explosion);
        for (i, b) in s.branches.iter().enumerate() {
            assert!(b.depth <= s.max_depth);
            for seg in s.branch_segments(i) {
                assert_eq!(seg.depth, b.depth);
            }
        }
    }

    #[test]
    fn main_path_is_contiguous() {
        let s = bolt(5, BoltMode::Directional);
        for (i, b) in s.branches.iter().enumerate() {
            let main = &s.branch_segments(i)[..b.main_segments];
            for pair in main.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            assert!(main.iter().all(|seg| seg.length() > 0.0));
        }
    }

    #[test]
    fn widths_taper_and_attenuate_with_depth() {
        let s = bolt(21, BoltMode::Directional);
        for (i, b) in s.branches.iter().enumerate() {
            let segs = s.branch_segments(i);
            for pair in segs.windows(2) {
                assert!(pair[1].width <= pair[0].width);
            }
            if let Some(parent) = b.parent {
                let parent_base = s.branch_segments(parent)[0].width;
                assert!(segs[0].width < parent_base);
                assert!((segs[0].width / parent_base - 0.75).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn children_fork_at_evenly_spaced_points() {
        for mode in [BoltMode::Directional, BoltMode::Explosion] {
            let s = bolt(42, mode);
            for i in 0..s.branches.len() {
                let children: Vec<usize> = s.children_of(i).collect();
                if children.is_empty() {
                    continue;
                }
                let path = s.path_points(i);
                let k = children.len();
                for (c, &child) in children.iter().enumerate() {
                    let idx = ((c + 1) as f32 / (k + 1) as f32 * (path.len() - 2) as f32).floor() as usize + 1;
                    assert_eq!(s.branch_segments(child)[0].start, path[idx]);
                }
            }
        }
    }

    #[test]
    fn branch_point_index_matches_formula() {
        // 13 path points, 4 children: floor(k/5 * 11) + 1
        let got: Vec<usize> = (0..4).map(|c| branch_point_index(c, 4, 13)).collect();
        assert_eq!(got, vec![3, 5, 7, 9]);
        assert_eq!(tip_point_index(0, 3, 13), 3);
    }

    #[test]
    fn tips_follow_depth_rules() {
        let s = bolt(9, BoltMode::Explosion);
        for seg in s.segments.iter().filter(|seg| seg.is_tip) {
            assert!(seg.depth >= 1 && seg.depth < 3);
        }
        let d = bolt(9, BoltMode::Directional);
        assert!(d.segments.iter().filter(|seg| seg.is_tip).all(|seg| seg.depth >= 1));
        assert!(d.tip_count() > 0);
        assert!(d.segments[d.branches[0].segments.clone()].iter().all(|seg| !seg.is_tip));
    }

    #[test]
    fn directional_root_points_down() {
        for seed in 0..50 {
            let s = bolt(seed, BoltMode::Directional);
            assert!(s.branches[0].direction.y < -0.5);
        }
    }

    #[test]
    fn explosion_roots_spread_both_ways() {
        let ys: Vec<f32> = (0..200)
            .map(|seed| bolt(seed, BoltMode::Explosion).branches[0].direction.y)
            .collect();
        assert!(ys.iter().any(|&y| y > 0.1));
        assert!(ys.iter().any(|&y| y < -0.1));
    }

    #[test]
    fn degenerate_inputs_are_tolerated() {
        let mut rng = StdRng::seed_from_u64(1);
        let generator = FractalBoltGenerator::new(GeneratorParams {
            base_length: 0.0,
            length_jitter: 0.0,
            ..GeneratorParams::default()
        });
        let s = generator.generate(Vec3::new(f32::NAN, 0.0, 0.0), BoltMode::Directional, 1, &mut rng);
        assert_eq!(s.origin, Vec3::ZERO);
        assert!(s.segments.iter().all(|seg| seg.start.is_finite() && seg.end.is_finite()));
        assert!(s.segments.iter().filter(|seg| !seg.is_tip).all(|seg| seg.length() > 0.0));
    }

    #[test]
    fn zero_depth_yields_single_branch() {
        let mut rng = StdRng::seed_from_u64(2);
        let s = FractalBoltGenerator::default().generate(Vec3::ZERO, BoltMode::Explosion, 0, &mut rng);
        assert_eq!(s.branches.len(), 1);
        assert_eq!(s.max_depth, 0);
    }
}
