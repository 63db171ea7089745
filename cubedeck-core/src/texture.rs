/// Texture resolver: what each cube face shows.
///
/// This is the only place where the 1-based stored face index meets the
/// 0-based material array of the renderer.
use tracing::warn;

use crate::binding::{BindingStatus, CubeIndex, FaceBinding};
use crate::data_url::{parse_data_url, DataUrl};
use crate::face::FaceIndex;
use crate::gateway::PersistenceGateway;
use crate::store::FaceBindingStore;

/// 0-based index into a cube's material array
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialSlot(usize);

impl MaterialSlot {
    pub const COUNT: usize = 6;

    pub fn new(slot: usize) -> Option<Self> {
        (slot < Self::COUNT).then_some(Self(slot))
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn face_index(self) -> FaceIndex {
        FaceIndex::ALL[self.0]
    }
}

impl From<FaceIndex> for MaterialSlot {
    fn from(index: FaceIndex) -> Self {
        Self(usize::from(index.get()) - 1)
    }
}

/// Generated stand-in for a face without a captured snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    /// Number painted on the face, the stored face index
    pub label: u8,
    /// Background hue in degrees
    pub hue: u16,
    /// Draw the "+" marker inviting a new binding
    pub marker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceTexture {
    Cached(DataUrl),
    Placeholder(Placeholder),
}

impl FaceTexture {
    pub fn is_cached(&self) -> bool {
        matches!(self, FaceTexture::Cached(_))
    }
}

fn placeholder(face: FaceIndex, marker: bool) -> FaceTexture {
    let slot = MaterialSlot::from(face);
    FaceTexture::Placeholder(Placeholder {
        label: face.get(),
        hue: (slot.get() as u16 * 60) % 360,
        marker,
    })
}

/// Texture for one binding. Unreadable snapshots fall back to the pending placeholder.
pub fn resolve(binding: &FaceBinding, face: FaceIndex) -> FaceTexture {
    match binding.status() {
        BindingStatus::Empty => placeholder(face, true),
        BindingStatus::Pending => placeholder(face, false),
        BindingStatus::Captured => {
            let raw = binding.image_data.as_deref().unwrap_or_default();
            match parse_data_url(raw) {
                Ok(url) => FaceTexture::Cached(url),
                Err(err) => {
                    warn!(face = %face, error = %err, "stored snapshot unreadable");
                    placeholder(face, false)
                }
            }
        }
    }
}

/// Material slot and texture for one face of a stored cube
pub fn resolve_face<G: PersistenceGateway>(
    store: &FaceBindingStore<G>,
    cube: CubeIndex,
    face: FaceIndex,
) -> (MaterialSlot, FaceTexture) {
    (MaterialSlot::from(face), resolve(store.get_binding(cube, face), face))
}

/// All six textures of a cube, in material order
pub fn resolve_cube<G: PersistenceGateway>(
    store: &FaceBindingStore<G>,
    cube: CubeIndex,
) -> [FaceTexture; MaterialSlot::COUNT] {
    FaceIndex::ALL.map(|face| resolve(store.get_binding(cube, face), face))
}
