/// CubeDeck Core Library - Bookmark cubes, layout and view transitions
///
/// This library provides the renderer-independent half of the carousel:
/// the persisted face bindings, carousel geometry, the transition state
/// machine and the capture pipeline. Hosts (terminal, browser) supply
/// drawing, tweening and page fetching through the traits in [`host`].

pub mod binding;
pub mod capture;
pub mod data_url;
pub mod face;
pub mod gateway;
pub mod geometry;
pub mod hit_test;
pub mod host;
pub mod layout;
pub mod overlay;
pub mod projection;
pub mod store;
pub mod texture;
pub mod transform;
pub mod transition;

// Re-export commonly used types
pub use binding::{BindingStatus, CollectionState, CubeIndex, CubeRecord, FaceBinding};
pub use face::{Direction, Face, FaceIndex};
pub use gateway::{FileGateway, GatewayError, MemoryGateway, PersistenceGateway, SaveAck};
pub use geometry::{Mesh, Ray, Triangle, Vertex};
pub use host::{Easing, FetchError, Host, SnapshotError, Ticket, Track, TweenBatch};
pub use layout::LayoutParams;
pub use projection::Camera;
pub use store::FaceBindingStore;
pub use texture::{FaceTexture, MaterialSlot};
pub use transform::{CubePose, RotationState, Transform};
pub use transition::{Phase, Timings, TransitionController, ViewState};
