/// Carousel layout: one enlarged active cube, the rest on a ring behind it
use std::f32::consts::TAU;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::face::Direction;

/// Target position and uniform scale of one cube
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Point3<f32>,
    pub scale: f32,
}

/// Carousel geometry and the full-screen viewing framing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub radius: f32,
    /// Vertical offset of the ring
    pub lift: f32,
    /// Depth of ring cubes, behind the active one
    pub ring_depth: f32,
    pub base_scale: f32,
    pub active_position: [f32; 3],
    pub viewing_position: [f32; 3],
    pub viewing_scale: f32,
    pub carousel_camera: [f32; 3],
    pub viewing_camera: [f32; 3],
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            radius: 15.0,
            lift: 10.0,
            ring_depth: -15.0,
            base_scale: 4.0,
            active_position: [0.0, 0.0, -10.0],
            viewing_position: [0.0, 0.0, 0.0],
            viewing_scale: 30.0,
            carousel_camera: [0.0, -1.0, 20.0],
            viewing_camera: [0.0, 0.0, 35.0],
        }
    }
}

fn point([x, y, z]: [f32; 3]) -> Point3<f32> {
    Point3::new(x, y, z)
}

impl LayoutParams {
    /// Active cubes are drawn at twice the ring scale
    pub fn active_scale(&self) -> f32 {
        self.base_scale * 2.0
    }

    pub fn active_placement(&self) -> Placement {
        Placement {
            position: point(self.active_position),
            scale: self.active_scale(),
        }
    }

    pub fn viewing_placement(&self) -> Placement {
        Placement {
            position: point(self.viewing_position),
            scale: self.viewing_scale,
        }
    }

    /// Slot `slot` of `count` evenly spaced ring positions
    pub fn ring_placement(&self, slot: usize, count: usize) -> Placement {
        let angle = TAU / count.max(1) as f32 * slot as f32;
        Placement {
            position: Point3::new(
                angle.sin() * self.radius,
                angle.cos() * self.radius + self.lift,
                self.ring_depth,
            ),
            scale: self.base_scale,
        }
    }

    pub fn carousel_camera(&self) -> Point3<f32> {
        point(self.carousel_camera)
    }

    pub fn viewing_camera(&self) -> Point3<f32> {
        point(self.viewing_camera)
    }

    /// Placements for every slot with `active_slot` enlarged in front
    pub fn compute(&self, count: usize, active_slot: usize) -> Vec<Placement> {
        (0..count)
            .map(|slot| {
                if slot == active_slot {
                    self.active_placement()
                } else {
                    self.ring_placement(slot, count)
                }
            })
            .collect()
    }

    /// Before and after snapshots for a switch in `direction`
    pub fn plan_switch(&self, count: usize, current_slot: usize, direction: Direction) -> SwitchPlan {
        let to_slot = next_slot(count, current_slot, direction);
        SwitchPlan {
            from_slot: current_slot,
            to_slot,
            from: self.compute(count, current_slot),
            to: self.compute(count, to_slot),
        }
    }
}

/// Interpolation endpoints handed to the tween engine during a switch
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchPlan {
    pub from_slot: usize,
    pub to_slot: usize,
    pub from: Vec<Placement>,
    pub to: Vec<Placement>,
}

/// Slot that becomes active: `(current - direction) mod count`
pub fn next_slot(count: usize, current: usize, direction: Direction) -> usize {
    if count == 0 {
        return 0;
    }
    let count = count as i64;
    (current as i64 - i64::from(direction.sign())).rem_euclid(count) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cube_is_active() {
        let params = LayoutParams::default();
        let placements = params.compute(1, 0);
        assert_eq!(placements, vec![params.active_placement()]);
        assert!((placements[0].scale - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_ring_positions() {
        let params = LayoutParams::default();
        let placements = params.compute(4, 0);
        // Slot 1 of 4 sits a quarter turn round: right of the axis, at lift height
        let slot1 = placements[1];
        assert!((slot1.position.x - 15.0).abs() < 1e-4);
        assert!((slot1.position.y - 10.0).abs() < 1e-4);
        assert!((slot1.position.z + 15.0).abs() < 1e-6);
        assert!((slot1.scale - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_next_slot_wraps() {
        assert_eq!(next_slot(3, 0, Direction::Forward), 2);
        assert_eq!(next_slot(3, 2, Direction::Backward), 0);
        assert_eq!(next_slot(1, 0, Direction::Forward), 0);
        assert_eq!(next_slot(0, 0, Direction::Forward), 0);
    }

    #[test]
    fn test_switch_plan_snapshots() {
        let params = LayoutParams::default();
        let plan = params.plan_switch(3, 0, Direction::Backward);
        assert_eq!(plan.to_slot, 1);
        assert_eq!(plan.from[0], params.active_placement());
        assert_eq!(plan.to[1], params.active_placement());
        assert_eq!(plan.to[0], params.ring_placement(0, 3));
    }

    #[test]
    fn test_params_deserialize_partial() {
        let params: LayoutParams = serde_json::from_str(r#"{"radius": 20.0}"#).unwrap();
        assert!((params.radius - 20.0).abs() < 1e-6);
        assert!((params.base_scale - 4.0).abs() < 1e-6);
    }
}
