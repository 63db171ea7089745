/// Time-based interpolation of scene poses and the camera
use std::time::Instant;

use cubedeck_core::{CubePose, Ticket, Track, TweenBatch};
use nalgebra::Point3;

use crate::scene::Scene;

#[derive(Debug, Clone, Copy)]
enum Origin {
    Cube(CubePose),
    Camera(Point3<f32>),
}

#[derive(Debug, Clone)]
struct Running {
    batch: TweenBatch,
    started: Instant,
    origins: Vec<Origin>,
}

/// Plays at most one batch; a new batch replaces the running one
#[derive(Debug, Default)]
pub struct Tweener {
    running: Option<Running>,
}

impl Tweener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn start(&mut self, batch: TweenBatch, scene: &Scene, now: Instant) {
        let origins = batch
            .tracks
            .iter()
            .map(|track| match track {
                Track::Cube { cube, to } => Origin::Cube(scene.poses.get(cube).copied().unwrap_or(*to)),
                Track::Camera { .. } => Origin::Camera(scene.camera),
            })
            .collect();
        self.running = Some(Running {
            batch,
            started: now,
            origins,
        });
    }

    /// Apply the eased state at `now`; returns the ticket once the batch ends
    pub fn advance(&mut self, scene: &mut Scene, now: Instant) -> Option<Ticket> {
        let running = self.running.as_ref()?;
        let duration = running.batch.duration.as_secs_f32();
        let elapsed = now.saturating_duration_since(running.started).as_secs_f32();
        let linear = if duration <= 0.0 { 1.0 } else { elapsed / duration };
        let t = running.batch.easing.apply(linear);

        for (track, origin) in running.batch.tracks.iter().zip(&running.origins) {
            match (track, origin) {
                (Track::Cube { cube, to }, Origin::Cube(from)) => {
                    scene.poses.insert(*cube, from.lerp(to, t));
                }
                (Track::Camera { to }, Origin::Camera(from)) => {
                    scene.camera = from + (to - from) * t;
                }
                _ => {}
            }
        }

        if linear >= 1.0 {
            let ticket = running.batch.ticket;
            self.running = None;
            Some(ticket)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubedeck_core::{CubeIndex, Easing};
    use std::time::Duration;

    fn batch(to: CubePose) -> TweenBatch {
        TweenBatch {
            ticket: Ticket(7),
            tracks: vec![
                Track::Cube { cube: CubeIndex(0), to },
                Track::Camera { to: Point3::new(0.0, 0.0, 35.0) },
            ],
            duration: Duration::from_millis(1000),
            easing: Easing::QuadraticInOut,
        }
    }

    #[test]
    fn test_tween_reaches_target_and_reports_ticket() {
        let mut scene = Scene::new(Point3::new(0.0, -1.0, 20.0));
        scene.poses.insert(CubeIndex(0), CubePose::new(Point3::new(0.0, 0.0, -10.0), 8.0));
        let target = CubePose::new(Point3::origin(), 30.0);

        let start = Instant::now();
        let mut tweener = Tweener::new();
        tweener.start(batch(target), &scene, start);

        assert_eq!(tweener.advance(&mut scene, start + Duration::from_millis(500)), None);
        let halfway = scene.poses[&CubeIndex(0)];
        assert!((halfway.scale - 19.0).abs() < 1e-3);
        assert!((scene.camera.z - 27.5).abs() < 1e-3);

        assert_eq!(
            tweener.advance(&mut scene, start + Duration::from_millis(1200)),
            Some(Ticket(7))
        );
        assert_eq!(scene.poses[&CubeIndex(0)], target);
        assert!(!tweener.is_running());
        assert_eq!(tweener.advance(&mut scene, start + Duration::from_millis(1300)), None);
    }

    #[test]
    fn test_unplaced_cube_snaps_to_target() {
        let mut scene = Scene::new(Point3::origin());
        let target = CubePose::new(Point3::new(1.0, 2.0, 3.0), 4.0);
        let start = Instant::now();
        let mut tweener = Tweener::new();
        tweener.start(batch(target), &scene, start);
        tweener.advance(&mut scene, start);
        assert_eq!(scene.poses[&CubeIndex(0)], target);
    }
}
