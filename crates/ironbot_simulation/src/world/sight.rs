//! LineOfSight реализации: открытая карта и коробки-препятствия

use bevy::prelude::*;

use super::LineOfSight;

/// Ничего не заслоняет
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSight;

impl LineOfSight for OpenSight {
    fn is_clear(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

/// Axis-aligned коробки (стены) — отрезок не должен пересекать ни одну
#[derive(Debug, Clone, Default)]
pub struct BoxOccluders {
    boxes: Vec<(Vec3, Vec3)>,
}

impl BoxOccluders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_box(&mut self, min: Vec3, max: Vec3) {
        self.boxes.push((min.min(max), min.max(max)));
    }

    /// Slab test: пересекает ли отрезок from→to коробку
    fn segment_hits(from: Vec3, to: Vec3, min: Vec3, max: Vec3) -> bool {
        let dir = to - from;
        let mut t_enter = 0.0_f32;
        let mut t_exit = 1.0_f32;

        for axis in 0..3 {
            let (origin, delta, lo, hi) = (from[axis], dir[axis], min[axis], max[axis]);
            if delta.abs() <= f32::EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let t1 = (lo - origin) / delta;
            let t2 = (hi - origin) / delta;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
            if t_enter > t_exit {
                return false;
            }
        }
        true
    }
}

impl LineOfSight for BoxOccluders {
    fn is_clear(&self, from: Vec3, to: Vec3) -> bool {
        !self
            .boxes
            .iter()
            .any(|(min, max)| Self::segment_hits(from, to, *min, *max))
    }
}
