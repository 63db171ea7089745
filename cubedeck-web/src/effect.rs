/// Host actions requested by the controller, serialized for JavaScript
use std::cell::RefCell;
use std::rc::Rc;

use cubedeck_core::gateway::{self, PersistenceGateway, SaveAck};
use cubedeck_core::host::{ContentHost, SceneSink, TweenEngine, UrlPrompt};
use cubedeck_core::{
    CollectionState, CubeIndex, CubePose, Easing, FaceTexture, MaterialSlot, Track, TweenBatch,
};
use nalgebra::Point3;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseEffect {
    pub position: [f32; 3],
    pub scale: f32,
    /// Euler angles in radians
    pub rotation: [f32; 3],
}

impl From<&CubePose> for PoseEffect {
    fn from(pose: &CubePose) -> Self {
        Self {
            position: point(&pose.position),
            scale: pose.scale,
            rotation: [pose.rotation.x, pose.rotation.y, pose.rotation.z],
        }
    }
}

fn point(point: &Point3<f32>) -> [f32; 3] {
    [point.x, point.y, point.z]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TrackEffect {
    Cube { cube: u32, to: PoseEffect },
    Camera { to: [f32; 3] },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TextureEffect {
    /// Image source, usable as-is by an `<img>` or texture loader
    Image { src: String },
    Placeholder { label: u8, hue: u16, marker: bool },
}

impl From<&FaceTexture> for TextureEffect {
    fn from(texture: &FaceTexture) -> Self {
        match texture {
            FaceTexture::Cached(url) => TextureEffect::Image {
                src: url.to_string(),
            },
            FaceTexture::Placeholder(placeholder) => TextureEffect::Placeholder {
                label: placeholder.label,
                hue: placeholder.hue,
                marker: placeholder.marker,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Effect {
    StartTween {
        /// A JavaScript number; exact while below 2^53
        ticket: u64,
        duration_ms: u64,
        easing: &'static str,
        tracks: Vec<TrackEffect>,
    },
    Place {
        cube: u32,
        pose: PoseEffect,
    },
    PlaceCamera {
        position: [f32; 3],
    },
    SetTexture {
        cube: u32,
        /// 0-based material slot
        slot: usize,
        texture: TextureEffect,
    },
    Fetch {
        path: String,
    },
    ShowContent {
        html: String,
    },
    ShowError {
        message: String,
    },
    Snapshot,
    /// Tear down the view; the result of a fetch still in flight is discarded
    Dismiss,
    Save {
        document: String,
    },
}

/// Effects waiting for JavaScript, shared by the host and the gateway
pub type Outbox = Rc<RefCell<Vec<Effect>>>;

fn easing_name(easing: Easing) -> &'static str {
    match easing {
        Easing::QuadraticOut => "quadraticOut",
        Easing::QuadraticInOut => "quadraticInOut",
    }
}

/// Turns every collaborator call into an [`Effect`]
pub struct EffectHost {
    outbox: Outbox,
    prompt: Box<dyn FnMut() -> Option<String>>,
}

impl EffectHost {
    pub fn new(outbox: Outbox, prompt: Box<dyn FnMut() -> Option<String>>) -> Self {
        Self { outbox, prompt }
    }

    fn push(&self, effect: Effect) {
        self.outbox.borrow_mut().push(effect);
    }
}

impl TweenEngine for EffectHost {
    fn start(&mut self, batch: TweenBatch) {
        let tracks = batch
            .tracks
            .iter()
            .map(|track| match track {
                Track::Cube { cube, to } => TrackEffect::Cube {
                    cube: cube.0,
                    to: to.into(),
                },
                Track::Camera { to } => TrackEffect::Camera { to: point(to) },
            })
            .collect();
        self.push(Effect::StartTween {
            ticket: batch.ticket.0,
            duration_ms: batch.duration.as_millis() as u64,
            easing: easing_name(batch.easing),
            tracks,
        });
    }
}

impl SceneSink for EffectHost {
    fn place(&mut self, cube: CubeIndex, pose: &CubePose) {
        self.push(Effect::Place {
            cube: cube.0,
            pose: pose.into(),
        });
    }

    fn place_camera(&mut self, position: Point3<f32>) {
        self.push(Effect::PlaceCamera {
            position: point(&position),
        });
    }

    fn set_face_texture(&mut self, cube: CubeIndex, slot: MaterialSlot, texture: &FaceTexture) {
        self.push(Effect::SetTexture {
            cube: cube.0,
            slot: slot.get(),
            texture: texture.into(),
        });
    }
}

impl UrlPrompt for EffectHost {
    fn prompt_url(&mut self) -> Option<String> {
        (self.prompt)()
    }
}

impl ContentHost for EffectHost {
    fn fetch(&mut self, proxy_path: &str) {
        self.push(Effect::Fetch {
            path: proxy_path.to_string(),
        });
    }

    fn show_content(&mut self, html: &str) {
        self.push(Effect::ShowContent {
            html: html.to_string(),
        });
    }

    fn show_error(&mut self, message: &str) {
        self.push(Effect::ShowError {
            message: message.to_string(),
        });
    }

    fn snapshot(&mut self) {
        self.push(Effect::Snapshot);
    }

    fn dismiss(&mut self) {
        self.push(Effect::Dismiss);
    }
}

/// Loads the document JavaScript fetched up front; saves become `Save` effects
pub struct EffectGateway {
    document: String,
    outbox: Outbox,
}

impl EffectGateway {
    pub fn new(document: impl Into<String>, outbox: Outbox) -> Self {
        Self {
            document: document.into(),
            outbox,
        }
    }
}

impl PersistenceGateway for EffectGateway {
    fn load(&mut self) -> gateway::Result<CollectionState> {
        if self.document.trim().is_empty() {
            return Ok(CollectionState::default());
        }
        Ok(CollectionState::from_json(&self.document)?)
    }

    fn save(&mut self, state: &CollectionState) -> gateway::Result<SaveAck> {
        let document = state.to_json()?;
        self.outbox.borrow_mut().push(Effect::Save { document });
        Ok(SaveAck::Queued)
    }
}
