/// Face binding store: the in-memory collection plus its persistence
use tracing::{debug, info, warn};

use crate::binding::{CollectionState, CubeIndex, CubeRecord, FaceBinding, EMPTY_BINDING};
use crate::face::FaceIndex;
use crate::gateway::PersistenceGateway;

/// Owns the collection and saves the whole of it after every durable change.
///
/// Saves are fire-and-forget: failures are logged and never retried.
pub struct FaceBindingStore<G> {
    state: CollectionState,
    gateway: G,
}

impl<G: PersistenceGateway> FaceBindingStore<G> {
    /// Load through the gateway. Missing or malformed documents become a
    /// single default cube, which is saved straight away.
    pub fn open(mut gateway: G) -> Self {
        let state = match gateway.load() {
            Ok(state) => {
                info!(cubes = state.cubes.len(), "collection loaded");
                state
            }
            Err(err) => {
                warn!(error = %err, "collection could not be loaded, starting fresh");
                CollectionState::default()
            }
        };
        Self::with_state(state, gateway)
    }

    /// Adopt an already loaded collection, normalizing it the same way
    pub fn with_state(state: CollectionState, gateway: G) -> Self {
        let mut store = Self { state, gateway };
        if store.state.is_empty() {
            store.create_cube(None);
        }
        store
    }

    /// Append a cube (or upsert at `index`). Existing records keep their
    /// bindings; only a newly created record triggers a save.
    pub fn create_cube(&mut self, index: Option<CubeIndex>) -> CubeIndex {
        let index = index.unwrap_or_else(|| self.next_index());
        if self.state.cubes.contains_key(&index) {
            debug!(cube = %index, "cube already exists");
            return index;
        }
        self.state.cubes.insert(index, CubeRecord::empty());
        info!(cube = %index, "cube created");
        self.persist();
        index
    }

    /// Bind a page to a face without a snapshot yet
    pub fn bind_face(&mut self, cube: CubeIndex, face: FaceIndex, url: impl Into<String>) {
        let binding = FaceBinding::pending(url);
        info!(cube = %cube, face = %face, url = ?binding.url, "face bound");
        self.set_binding(cube, face, binding);
    }

    pub fn complete_capture(
        &mut self,
        cube: CubeIndex,
        face: FaceIndex,
        url: impl Into<String>,
        image_data: impl Into<String>,
    ) {
        let binding = FaceBinding::captured(url, image_data);
        info!(cube = %cube, face = %face, "capture stored");
        self.set_binding(cube, face, binding);
    }

    /// Reset one face to empty. Returns whether anything was bound.
    pub fn clear_face(&mut self, cube: CubeIndex, face: FaceIndex) -> bool {
        let Some(record) = self.state.cubes.get_mut(&cube) else {
            return false;
        };
        let Some(binding) = record.faces.get_mut(&face) else {
            return false;
        };
        if *binding == FaceBinding::default() {
            return false;
        }
        *binding = FaceBinding::default();
        info!(cube = %cube, face = %face, "face cleared");
        self.persist();
        true
    }

    /// Never fails; unknown cubes and faces read as empty
    pub fn get_binding(&self, cube: CubeIndex, face: FaceIndex) -> &FaceBinding {
        self.state
            .cubes
            .get(&cube)
            .map_or(&EMPTY_BINDING, |record| record.binding(face))
    }

    pub fn contains(&self, cube: CubeIndex) -> bool {
        self.state.cubes.contains_key(&cube)
    }

    pub fn len(&self) -> usize {
        self.state.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.cubes.is_empty()
    }

    /// Cube indices in carousel slot order
    pub fn cube_indices(&self) -> impl Iterator<Item = CubeIndex> + '_ {
        self.state.cubes.keys().copied()
    }

    pub fn slot_of(&self, cube: CubeIndex) -> Option<usize> {
        self.cube_indices().position(|index| index == cube)
    }

    pub fn cube_at_slot(&self, slot: usize) -> Option<CubeIndex> {
        self.cube_indices().nth(slot)
    }

    pub fn first_cube(&self) -> Option<CubeIndex> {
        self.cube_indices().next()
    }

    pub fn state(&self) -> &CollectionState {
        &self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    fn next_index(&self) -> CubeIndex {
        self.state
            .cubes
            .keys()
            .next_back()
            .map_or(CubeIndex(0), |last| CubeIndex(last.0 + 1))
    }

    fn set_binding(&mut self, cube: CubeIndex, face: FaceIndex, binding: FaceBinding) {
        self.state
            .cubes
            .entry(cube)
            .or_default()
            .faces
            .insert(face, binding);
        self.persist();
    }

    fn persist(&mut self) {
        match self.gateway.save(&self.state) {
            Ok(ack) => debug!(?ack, "collection saved"),
            Err(err) => warn!(error = %err, "collection save failed"),
        }
    }
}
