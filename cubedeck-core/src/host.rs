/// Collaborator boundary: everything the controller asks of its host.
///
/// Long-running work never blocks. The host reports completion later by
/// calling the matching `on_*` method of the transition controller.
use std::time::Duration;

use nalgebra::Point3;
use thiserror::Error;

use crate::binding::CubeIndex;
use crate::texture::{FaceTexture, MaterialSlot};
use crate::transform::CubePose;

/// Identifies one tween batch; completions for other tickets are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    QuadraticOut,
    QuadraticInOut,
}

impl Easing {
    /// Map linear progress in [0, 1] to eased progress
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::QuadraticOut => t * (2.0 - t),
            Easing::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

/// One interpolated property
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Track {
    Cube { cube: CubeIndex, to: CubePose },
    Camera { to: Point3<f32> },
}

/// Tracks that start together and finish together
#[derive(Debug, Clone, PartialEq)]
pub struct TweenBatch {
    pub ticket: Ticket,
    pub tracks: Vec<Track>,
    pub duration: Duration,
    pub easing: Easing,
}

/// Failure of the proxied page fetch
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),
}

/// Failure of the content snapshot
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("snapshot failed: {0}")]
pub struct SnapshotError(pub String);

/// Interpolates scene properties; reports through `on_tween_finished`
pub trait TweenEngine {
    fn start(&mut self, batch: TweenBatch);
}

/// The renderer's scene graph
pub trait SceneSink {
    /// Move a cube without animation
    fn place(&mut self, cube: CubeIndex, pose: &CubePose);

    /// Move the camera without animation
    fn place_camera(&mut self, position: Point3<f32>);

    /// Swap a material's texture and flag it for upload
    fn set_face_texture(&mut self, cube: CubeIndex, slot: MaterialSlot, texture: &FaceTexture);
}

/// Synchronous "enter a URL" interaction
pub trait UrlPrompt {
    fn prompt_url(&mut self) -> Option<String>;
}

/// Proxy fetch, embedded view and snapshot collaborators
pub trait ContentHost {
    /// Start fetching; reports through `on_content_fetched`
    fn fetch(&mut self, proxy_path: &str);

    /// Render fetched markup in an isolated view; reports readiness through
    /// `on_content_ready` and a user close through `on_close_requested`
    fn show_content(&mut self, html: &str);

    fn show_error(&mut self, message: &str);

    /// Rasterize the embedded view; reports through `on_snapshot`
    fn snapshot(&mut self);

    /// Remove the embedded view and its controls
    fn dismiss(&mut self);
}

/// Everything a transition controller drives
pub trait Host: TweenEngine + SceneSink + UrlPrompt + ContentHost {}

impl<T: TweenEngine + SceneSink + UrlPrompt + ContentHost> Host for T {}
