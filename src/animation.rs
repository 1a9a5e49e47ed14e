//! The four-stage cannon animation.
//!
//! The barrel swings up, squashes along its length, stretches back, swings
//! down again, and repeats. One call to [`CannonAnimation::step`] advances one
//! frame.
//!
//! | Stage | Per frame | Leaves when |
//! |-------|-----------|-------------|
//! | [`Stage::Raise`] | `angle += angle_step` | `angle >= max_angle` |
//! | [`Stage::Squash`] | `zoom_y -= zoom_step` | `zoom_y <= min_zoom` |
//! | [`Stage::Stretch`] | `zoom_y += zoom_step` | `zoom_y >= max_zoom` |
//! | [`Stage::Lower`] | `angle -= angle_step` | `angle <= min_angle` |

use std::fmt;

/// Values closer than this to a stage limit count as having reached it and
/// are snapped onto it, so `0.05` steps add up to exact limits.
const SETTLE_EPSILON: f32 = 1e-4;

/// One phase of the animation cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Raise,
    Squash,
    Stretch,
    Lower,
}

impl Stage {
    /// Position in the cycle, `0..=3`.
    pub fn index(self) -> usize {
        match self {
            Stage::Raise => 0,
            Stage::Squash => 1,
            Stage::Stretch => 2,
            Stage::Lower => 3,
        }
    }

    pub fn next(self) -> Stage {
        match self {
            Stage::Raise => Stage::Squash,
            Stage::Squash => Stage::Stretch,
            Stage::Stretch => Stage::Lower,
            Stage::Lower => Stage::Raise,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Raise => "raise",
            Stage::Squash => "squash",
            Stage::Stretch => "stretch",
            Stage::Lower => "lower",
        };
        write!(f, "{name}")
    }
}

/// Step sizes and limits of the cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationConfig {
    /// Degrees turned per frame while raising or lowering.
    pub angle_step: f32,
    /// Vertical zoom change per frame while squashing or stretching.
    pub zoom_step: f32,
    /// Resting angle, where the cycle starts and ends.
    pub min_angle: f32,
    /// Angle at which the barrel stops rising.
    pub max_angle: f32,
    /// Deepest squash.
    pub min_zoom: f32,
    /// Resting zoom.
    pub max_zoom: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            angle_step: 1.0,
            zoom_step: 0.05,
            min_angle: -90.0,
            max_angle: -30.0,
            min_zoom: 0.7,
            max_zoom: 1.0,
        }
    }
}

/// Animation state, advanced once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CannonAnimation {
    pub angle: f32,
    pub zoom_x: f32,
    pub zoom_y: f32,
    pub stage: Stage,
    config: AnimationConfig,
}

impl Default for CannonAnimation {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}

impl CannonAnimation {
    /// Start at rest: lowest angle, no zoom, about to raise.
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            angle: config.min_angle,
            zoom_x: config.max_zoom,
            zoom_y: config.max_zoom,
            stage: Stage::Raise,
            config,
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Advance one frame. Returns the new stage if this frame finished the
    /// current one.
    pub fn step(&mut self) -> Option<Stage> {
        let c = self.config;
        let done = match self.stage {
            Stage::Raise => rise(&mut self.angle, c.angle_step, c.max_angle),
            Stage::Squash => fall(&mut self.zoom_y, c.zoom_step, c.min_zoom),
            Stage::Stretch => rise(&mut self.zoom_y, c.zoom_step, c.max_zoom),
            Stage::Lower => fall(&mut self.angle, c.angle_step, c.min_angle),
        };

        if done {
            self.stage = self.stage.next();
            Some(self.stage)
        } else {
            None
        }
    }
}

fn rise(value: &mut f32, step: f32, limit: f32) -> bool {
    *value += step;
    settle(value, limit);
    *value >= limit
}

fn fall(value: &mut f32, step: f32, limit: f32) -> bool {
    *value -= step;
    settle(value, limit);
    *value <= limit
}

fn settle(value: &mut f32, limit: f32) {
    if (*value - limit).abs() < SETTLE_EPSILON {
        *value = limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_rest() {
        let anim = CannonAnimation::default();
        assert_eq!(anim.angle, -90.0);
        assert_eq!(anim.zoom_x, 1.0);
        assert_eq!(anim.zoom_y, 1.0);
        assert_eq!(anim.stage, Stage::Raise);
    }

    #[test]
    fn full_cycle_takes_132_frames() {
        let start = CannonAnimation::default();
        let mut anim = start;

        let mut transitions = Vec::new();
        for frame in 1..=132 {
            if let Some(stage) = anim.step() {
                transitions.push((frame, stage));
            }
        }

        assert_eq!(
            transitions,
            vec![
                (60, Stage::Squash),
                (66, Stage::Stretch),
                (72, Stage::Lower),
                (132, Stage::Raise),
            ]
        );
        assert_eq!(anim, start);
    }

    #[test]
    fn raise_only_touches_angle() {
        let mut anim = CannonAnimation::default();
        anim.step();
        assert_eq!(anim.angle, -89.0);
        assert_eq!(anim.zoom_y, 1.0);
        assert_eq!(anim.stage, Stage::Raise);
    }

    #[test]
    fn squash_bottoms_out_exactly() {
        let mut anim = CannonAnimation::default();
        for _ in 0..66 {
            anim.step();
        }
        assert_eq!(anim.stage, Stage::Stretch);
        assert_eq!(anim.zoom_y, 0.7);
        assert_eq!(anim.angle, -30.0);
        assert_eq!(anim.zoom_x, 1.0);
    }

    #[test]
    fn many_cycles_do_not_drift() {
        let start = CannonAnimation::default();
        let mut anim = start;
        for _ in 0..132 * 50 {
            anim.step();
        }
        assert_eq!(anim, start);
    }

    #[test]
    fn overshooting_steps_still_advance() {
        let config = AnimationConfig {
            angle_step: 7.0,
            ..AnimationConfig::default()
        };
        let mut anim = CannonAnimation::new(config);
        let mut frames = 0;
        while anim.stage == Stage::Raise {
            anim.step();
            frames += 1;
        }
        // -90 + 9 * 7 = -27, the first value past -30
        assert_eq!(frames, 9);
        assert_eq!(anim.angle, -27.0);
    }

    #[test]
    fn stage_order_wraps() {
        let mut stage = Stage::Raise;
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(stage.index());
            stage = stage.next();
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 0]);
        assert_eq!(Stage::Squash.to_string(), "squash");
    }
}
