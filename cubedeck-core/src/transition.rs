/// Transition controller: the single owner of view state.
///
/// At most one animated transition runs at a time. Events that are not
/// valid in the current phase are dropped, never queued.
use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::binding::{CubeIndex, FaceBinding};
use crate::capture::{CaptureSession, CaptureStep};
use crate::face::{Direction, Face};
use crate::gateway::PersistenceGateway;
use crate::hit_test::{self, RayCaster};
use crate::host::{Easing, FetchError, Host, SnapshotError, Ticket, Track, TweenBatch};
use crate::layout::LayoutParams;
use crate::overlay::{self, UrlLabel};
use crate::projection::Camera;
use crate::store::FaceBindingStore;
use crate::texture::{self, MaterialSlot};
use crate::transform::CubePose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Rotating,
    Switching,
    Enlarging,
    Viewing,
    Capturing,
    Shrinking,
}

/// Transient, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub active_cube: CubeIndex,
    pub active_face: Face,
    pub phase: Phase,
}

/// Tween durations in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub rotate_ms: u64,
    pub switch_ms: u64,
    /// Enlarge and shrink
    pub zoom_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            rotate_ms: 500,
            switch_ms: 1000,
            zoom_ms: 1000,
        }
    }
}

/// Work committed when the in-flight tween completes
#[derive(Debug, Clone)]
enum Pending {
    Rotate { direction: Direction, pose: CubePose },
    Switch { to: CubeIndex, poses: Vec<(CubeIndex, CubePose)> },
    Enlarge { pose: CubePose },
    Shrink { pose: CubePose },
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: Ticket,
    pending: Pending,
}

pub struct TransitionController<G> {
    store: FaceBindingStore<G>,
    view: ViewState,
    layout: LayoutParams,
    timings: Timings,
    poses: BTreeMap<CubeIndex, CubePose>,
    camera: Camera,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    session: Option<CaptureSession>,
}

impl<G: PersistenceGateway> TransitionController<G> {
    pub fn new(store: FaceBindingStore<G>, layout: LayoutParams, timings: Timings, mut camera: Camera) -> Self {
        camera.position = layout.carousel_camera();
        let view = ViewState {
            active_cube: store.first_cube().unwrap_or_default(),
            active_face: Face::default(),
            phase: Phase::Idle,
        };
        let mut controller = Self {
            store,
            view,
            layout,
            timings,
            poses: BTreeMap::new(),
            camera,
            in_flight: None,
            next_ticket: 0,
            session: None,
        };
        controller.relayout();
        controller
    }

    /// Push the whole scene to the host: poses, camera and every face texture
    pub fn attach(&mut self, host: &mut impl Host) {
        self.place_all(host);
        host.place_camera(self.camera.position);
        let cubes: Vec<CubeIndex> = self.store.cube_indices().collect();
        for cube in cubes {
            self.retexture_cube(cube, host);
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn store(&self) -> &FaceBindingStore<G> {
        &self.store
    }

    pub fn layout(&self) -> &LayoutParams {
        &self.layout
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Committed poses; mid-tween the host's scene is ahead of these
    pub fn poses(&self) -> &BTreeMap<CubeIndex, CubePose> {
        &self.poses
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight.as_ref().map(|flight| flight.ticket)
    }

    pub fn active_binding(&self) -> &FaceBinding {
        self.store
            .get_binding(self.view.active_cube, self.view.active_face.index())
    }

    pub fn active_label(&self) -> Option<UrlLabel> {
        let pose = self.poses.get(&self.view.active_cube)?;
        overlay::url_label(self.active_binding(), pose, &self.camera)
    }

    /// Viewport changes touch only the camera
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    // Events

    /// Quarter turn of the active cube; the active face advances on completion
    pub fn rotate(&mut self, direction: Direction, host: &mut impl Host) -> bool {
        if !self.accepts("rotate") {
            return false;
        }
        let cube = self.view.active_cube;
        let current = self.active_pose();
        let pose = CubePose {
            rotation: current.rotation.quarter_turn(direction),
            ..current
        };
        self.view.phase = Phase::Rotating;
        self.launch(
            Pending::Rotate { direction, pose },
            vec![Track::Cube { cube, to: pose }],
            self.timings.rotate_ms,
            Easing::QuadraticOut,
            host,
        );
        true
    }

    /// Make the cube at slot `(current - direction) mod n` active
    pub fn switch_cube(&mut self, direction: Direction, host: &mut impl Host) -> bool {
        if !self.accepts("switch_cube") {
            return false;
        }
        let current = self.store.slot_of(self.view.active_cube).unwrap_or(0);
        let plan = self.layout.plan_switch(self.store.len(), current, direction);
        let Some(to) = self.store.cube_at_slot(plan.to_slot) else {
            return false;
        };
        let poses: Vec<(CubeIndex, CubePose)> = self
            .store
            .cube_indices()
            .zip(plan.to)
            .map(|(cube, placement)| {
                (cube, self.pose_of(cube).moved_to(placement.position, placement.scale))
            })
            .collect();
        let tracks = poses
            .iter()
            .map(|&(cube, to)| Track::Cube { cube, to })
            .collect();

        self.view.phase = Phase::Switching;
        self.launch(
            Pending::Switch { to, poses },
            tracks,
            self.timings.switch_ms,
            Easing::QuadraticInOut,
            host,
        );
        true
    }

    /// Zoom the active cube to fill the view, then open its page
    pub fn enlarge(&mut self, host: &mut impl Host) -> bool {
        if !self.accepts("enlarge") {
            return false;
        }
        let cube = self.view.active_cube;
        let viewing = self.layout.viewing_placement();
        let pose = self.active_pose().moved_to(viewing.position, viewing.scale);
        self.view.phase = Phase::Enlarging;
        self.launch(
            Pending::Enlarge { pose },
            vec![
                Track::Cube { cube, to: pose },
                Track::Camera {
                    to: self.layout.viewing_camera(),
                },
            ],
            self.timings.zoom_ms,
            Easing::QuadraticInOut,
            host,
        );
        true
    }

    /// Pointer click at viewport coordinates; selects and enlarges the face hit
    pub fn click(&mut self, x: f32, y: f32, caster: &impl RayCaster, host: &mut impl Host) -> bool {
        if !self.accepts("click") {
            return false;
        }
        let Some(index) = hit_test::resolve(x, y, &self.camera, caster, self.view.active_cube) else {
            return false;
        };
        self.view.active_face = Face::from_index(index);
        debug!(face = %self.view.active_face, "face selected");
        self.enlarge(host)
    }

    pub fn add_cube(&mut self, host: &mut impl Host) -> Option<CubeIndex> {
        if !self.accepts("add_cube") {
            return None;
        }
        let cube = self.store.create_cube(None);
        self.relayout();
        self.place_all(host);
        self.retexture_cube(cube, host);
        Some(cube)
    }

    /// Prompt for a page, bind it to the active face and open it
    pub fn bind_page(&mut self, host: &mut impl Host) -> bool {
        if !self.accepts("bind_page") {
            return false;
        }
        let Some(url) = Self::prompt(host) else {
            return false;
        };
        let (cube, face) = (self.view.active_cube, self.view.active_face);
        self.store.bind_face(cube, face.index(), url);
        self.retexture_face(cube, face, host);
        self.enlarge(host)
    }

    pub fn change_page(&mut self, host: &mut impl Host) -> bool {
        self.bind_page(host)
    }

    pub fn remove_page(&mut self, host: &mut impl Host) -> bool {
        if !self.accepts("remove_page") {
            return false;
        }
        let (cube, face) = (self.view.active_cube, self.view.active_face);
        let cleared = self.store.clear_face(cube, face.index());
        if cleared {
            self.retexture_face(cube, face, host);
        }
        cleared
    }

    // Completions

    pub fn on_tween_finished(&mut self, ticket: Ticket, host: &mut impl Host) {
        if self.in_flight() != Some(ticket) {
            debug!(ticket = ticket.0, "stale tween completion ignored");
            return;
        }
        let Some(InFlight { pending, .. }) = self.in_flight.take() else {
            return;
        };
        match pending {
            Pending::Rotate { direction, pose } => {
                self.poses.insert(self.view.active_cube, pose);
                self.view.active_face = self.view.active_face.rotated(direction);
                debug!(face = %self.view.active_face, "rotation finished");
                self.view.phase = Phase::Idle;
            }
            Pending::Switch { to, poses } => {
                self.poses.extend(poses);
                self.view.active_cube = to;
                self.relayout();
                self.place_all(host);
                debug!(cube = %to, "switch finished");
                self.view.phase = Phase::Idle;
            }
            Pending::Enlarge { pose } => {
                self.poses.insert(self.view.active_cube, pose);
                self.camera.position = self.layout.viewing_camera();
                self.open_viewing(host);
            }
            Pending::Shrink { pose } => {
                self.poses.insert(self.view.active_cube, pose);
                self.camera.position = self.layout.carousel_camera();
                debug!("shrink finished");
                self.view.phase = Phase::Idle;
            }
        }
    }

    pub fn on_content_fetched(&mut self, result: Result<String, FetchError>, host: &mut impl Host) {
        if self.view.phase != Phase::Viewing {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            let step = session.on_fetched(result, host);
            self.advance(step, host);
        }
    }

    pub fn on_content_ready(&mut self, host: &mut impl Host) {
        if self.view.phase != Phase::Viewing {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            let step = session.on_ready(host);
            self.advance(step, host);
        }
    }

    pub fn on_close_requested(&mut self, host: &mut impl Host) {
        if self.view.phase != Phase::Viewing {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            let step = session.on_close(host);
            self.advance(step, host);
        }
    }

    pub fn on_snapshot(&mut self, result: Result<String, SnapshotError>, host: &mut impl Host) {
        if self.view.phase != Phase::Capturing {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            let step = session.on_snapshot(result, host);
            self.advance(step, host);
        }
    }

    // Internals

    fn accepts(&self, event: &'static str) -> bool {
        if self.view.phase == Phase::Idle {
            true
        } else {
            debug!(event, phase = ?self.view.phase, "event dropped");
            false
        }
    }

    fn prompt(host: &mut impl Host) -> Option<String> {
        host.prompt_url()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
    }

    fn open_viewing(&mut self, host: &mut impl Host) {
        let (cube, face) = (self.view.active_cube, self.view.active_face);
        let url = match self.store.get_binding(cube, face.index()).url.clone() {
            Some(url) => url,
            None => match Self::prompt(host) {
                Some(url) => {
                    self.store.bind_face(cube, face.index(), url.clone());
                    self.retexture_face(cube, face, host);
                    url
                }
                None => {
                    info!(cube = %cube, face = %face, "no page entered");
                    self.shrink(host);
                    return;
                }
            },
        };
        self.view.phase = Phase::Viewing;
        self.session = Some(CaptureSession::begin(cube, face, url, host));
    }

    fn advance(&mut self, step: CaptureStep, host: &mut impl Host) {
        match step {
            CaptureStep::Wait => {}
            CaptureStep::Snapshotting => self.view.phase = Phase::Capturing,
            CaptureStep::Captured { image_data } => {
                if let Some(session) = self.session.take() {
                    let (cube, face) = (session.cube(), session.face());
                    let binding = FaceBinding::captured(session.url(), image_data.as_str());
                    host.set_face_texture(
                        cube,
                        MaterialSlot::from(face.index()),
                        &texture::resolve(&binding, face.index()),
                    );
                    self.store
                        .complete_capture(cube, face.index(), session.url(), image_data);
                }
                self.shrink(host);
            }
            CaptureStep::Abandoned => {
                self.session = None;
                self.shrink(host);
            }
        }
    }

    fn shrink(&mut self, host: &mut impl Host) {
        let cube = self.view.active_cube;
        let active = self.layout.active_placement();
        let pose = self.active_pose().moved_to(active.position, active.scale);
        self.view.phase = Phase::Shrinking;
        self.launch(
            Pending::Shrink { pose },
            vec![
                Track::Cube { cube, to: pose },
                Track::Camera {
                    to: self.layout.carousel_camera(),
                },
            ],
            self.timings.zoom_ms,
            Easing::QuadraticInOut,
            host,
        );
    }

    fn launch(
        &mut self,
        pending: Pending,
        tracks: Vec<Track>,
        duration_ms: u64,
        easing: Easing,
        host: &mut impl Host,
    ) {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        debug!(ticket = ticket.0, phase = ?self.view.phase, "transition started");
        self.in_flight = Some(InFlight { ticket, pending });
        host.start(TweenBatch {
            ticket,
            tracks,
            duration: Duration::from_millis(duration_ms),
            easing,
        });
    }

    /// Recompute placements for the current cube set and active cube,
    /// keeping each cube's rotation
    fn relayout(&mut self) {
        let active_slot = self.store.slot_of(self.view.active_cube).unwrap_or(0);
        let placements = self.layout.compute(self.store.len(), active_slot);
        let cubes: Vec<CubeIndex> = self.store.cube_indices().collect();
        for (cube, placement) in cubes.into_iter().zip(placements) {
            let pose = self.pose_of(cube).moved_to(placement.position, placement.scale);
            self.poses.insert(cube, pose);
        }
    }

    fn pose_of(&self, cube: CubeIndex) -> CubePose {
        self.poses.get(&cube).copied().unwrap_or_else(|| {
            let placement = self.layout.active_placement();
            CubePose::new(placement.position, placement.scale)
        })
    }

    fn active_pose(&self) -> CubePose {
        self.pose_of(self.view.active_cube)
    }

    fn place_all(&self, host: &mut impl Host) {
        for (cube, pose) in &self.poses {
            host.place(*cube, pose);
        }
    }

    fn retexture_face(&self, cube: CubeIndex, face: Face, host: &mut impl Host) {
        let (slot, texture) = texture::resolve_face(&self.store, cube, face.index());
        host.set_face_texture(cube, slot, &texture);
    }

    fn retexture_cube(&self, cube: CubeIndex, host: &mut impl Host) {
        for face in Face::ALL {
            self.retexture_face(cube, face, host);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    use nalgebra::Point3;

    use crate::binding::BindingStatus;
    use crate::face::FaceIndex;
    use crate::gateway::MemoryGateway;
    use crate::hit_test::MeshScene;
    use crate::host::{ContentHost, SceneSink, TweenEngine, UrlPrompt};
    use crate::texture::FaceTexture;

    /// Records every request; completions are fed back by the test
    #[derive(Default)]
    pub(crate) struct MockHost {
        pub batches: Vec<TweenBatch>,
        pub placed: Vec<(CubeIndex, CubePose)>,
        pub camera: Vec<Point3<f32>>,
        pub textures: Vec<(CubeIndex, MaterialSlot, FaceTexture)>,
        pub answers: VecDeque<Option<String>>,
        pub fetches: Vec<String>,
        pub shown: Vec<String>,
        pub errors: Vec<String>,
        pub snapshots: usize,
        pub dismissed: usize,
    }

    impl MockHost {
        pub fn last_ticket(&self) -> Ticket {
            self.batches.last().expect("no tween started").ticket
        }
    }

    impl TweenEngine for MockHost {
        fn start(&mut self, batch: TweenBatch) {
            self.batches.push(batch);
        }
    }

    impl SceneSink for MockHost {
        fn place(&mut self, cube: CubeIndex, pose: &CubePose) {
            self.placed.push((cube, *pose));
        }

        fn place_camera(&mut self, position: Point3<f32>) {
            self.camera.push(position);
        }

        fn set_face_texture(&mut self, cube: CubeIndex, slot: MaterialSlot, texture: &FaceTexture) {
            self.textures.push((cube, slot, texture.clone()));
        }
    }

    impl UrlPrompt for MockHost {
        fn prompt_url(&mut self) -> Option<String> {
            self.answers.pop_front().flatten()
        }
    }

    impl ContentHost for MockHost {
        fn fetch(&mut self, proxy_path: &str) {
            self.fetches.push(proxy_path.to_string());
        }

        fn show_content(&mut self, html: &str) {
            self.shown.push(html.to_string());
        }

        fn show_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }

        fn snapshot(&mut self) {
            self.snapshots += 1;
        }

        fn dismiss(&mut self) {
            self.dismissed += 1;
        }
    }

    pub(crate) fn controller_with(cubes: u32) -> TransitionController<MemoryGateway> {
        let mut store = FaceBindingStore::open(MemoryGateway::new());
        for _ in 1..cubes {
            store.create_cube(None);
        }
        TransitionController::new(
            store,
            LayoutParams::default(),
            Timings::default(),
            Camera::new(800, 600),
        )
    }

    fn finish(controller: &mut TransitionController<MemoryGateway>, host: &mut MockHost) {
        let ticket = host.last_ticket();
        controller.on_tween_finished(ticket, host);
    }

    fn face(value: u8) -> FaceIndex {
        FaceIndex::new(value).unwrap()
    }

    #[test]
    fn test_initial_view() {
        let controller = controller_with(1);
        assert_eq!(
            controller.view(),
            ViewState {
                active_cube: CubeIndex(0),
                active_face: Face::Top,
                phase: Phase::Idle,
            }
        );
    }

    #[test]
    fn test_attach_pushes_scene() {
        let mut controller = controller_with(2);
        let mut host = MockHost::default();
        controller.attach(&mut host);
        assert_eq!(host.placed.len(), 2);
        assert_eq!(host.textures.len(), 12);
        assert_eq!(host.camera, vec![Point3::new(0.0, -1.0, 20.0)]);
    }

    #[test]
    fn test_rotate_advances_face_on_completion() {
        let mut controller = controller_with(1);
        let mut host = MockHost::default();
        assert!(controller.rotate(Direction::Forward, &mut host));
        assert_eq!(controller.view().phase, Phase::Rotating);
        assert_eq!(controller.view().active_face, Face::Top);
        assert_eq!(host.batches[0].duration, Duration::from_millis(500));

        finish(&mut controller, &mut host);
        assert_eq!(controller.view().phase, Phase::Idle);
        assert_eq!(controller.view().active_face, Face::Front);
    }

    #[test]
    fn test_rotate_cycle_and_inverse() {
        let mut controller = controller_with(1);
        let mut host = MockHost::default();
        for _ in 0..4 {
            controller.rotate(Direction::Forward, &mut host);
            finish(&mut controller, &mut host);
        }
        assert_eq!(controller.view().active_face, Face::Top);

        controller.rotate(Direction::Forward, &mut host);
        finish(&mut controller, &mut host);
        controller.rotate(Direction::Backward, &mut host);
        finish(&mut controller, &mut host);
        assert_eq!(controller.view().active_face, Face::Top);
    }

    #[test]
    fn test_events_dropped_while_rotating() {
        let mut controller = controller_with(2);
        let mut host = MockHost::default();
        controller.rotate(Direction::Forward, &mut host);
        let before = controller.view();

        assert!(!controller.rotate(Direction::Forward, &mut host));
        assert!(!controller.switch_cube(Direction::Forward, &mut host));
        assert!(!controller.enlarge(&mut host));
        assert!(controller.add_cube(&mut host).is_none());
        assert!(!controller.remove_page(&mut host));
        assert_eq!(controller.view(), before);
        assert_eq!(host.batches.len(), 1);
        assert_eq!(controller.store().len(), 2);
    }

    #[test]
    fn test_enlarge_during_switch_is_ignored() {
        let mut controller = controller_with(3);
        let mut host = MockHost::default();
        assert!(controller.switch_cube(Direction::Forward, &mut host));
        assert!(!controller.enlarge(&mut host));
        assert_eq!(controller.view().phase, Phase::Switching);
        assert_eq!(host.batches.len(), 1);
    }

    #[test]
    fn test_switch_commits_new_active_cube() {
        let mut controller = controller_with(3);
        let mut host = MockHost::default();
        controller.switch_cube(Direction::Forward, &mut host);
        assert_eq!(host.batches[0].tracks.len(), 3);
        assert_eq!(controller.view().active_cube, CubeIndex(0));

        finish(&mut controller, &mut host);
        assert_eq!(controller.view().active_cube, CubeIndex(2));
        assert_eq!(controller.view().phase, Phase::Idle);
        let active = controller.poses()[&CubeIndex(2)];
        assert_eq!(active.position, Point3::new(0.0, 0.0, -10.0));
        assert!((active.scale - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_stale_ticket_ignored() {
        let mut controller = controller_with(1);
        let mut host = MockHost::default();
        controller.rotate(Direction::Forward, &mut host);
        controller.on_tween_finished(Ticket(99), &mut host);
        assert_eq!(controller.view().phase, Phase::Rotating);
    }

    #[test]
    fn test_full_capture_flow() {
        let mut controller = controller_with(1);
        let mut host = MockHost::default();
        host.answers.push_back(Some(" https://example.com ".to_string()));

        assert!(controller.enlarge(&mut host));
        assert_eq!(controller.view().phase, Phase::Enlarging);
        finish(&mut controller, &mut host);

        assert_eq!(controller.view().phase, Phase::Viewing);
        assert_eq!(host.fetches, vec!["/proxy/https%3A%2F%2Fexample.com".to_string()]);
        assert_eq!(
            controller.active_binding().status(),
            BindingStatus::Pending
        );

        controller.on_content_fetched(Ok("<h1>Example</h1>".to_string()), &mut host);
        controller.on_content_ready(&mut host);
        assert_eq!(controller.view().phase, Phase::Capturing);
        controller.on_close_requested(&mut host);
        assert_eq!(host.snapshots, 1);

        controller.on_snapshot(Ok("data:image/png;base64,AAAA".to_string()), &mut host);
        assert_eq!(controller.view().phase, Phase::Shrinking);
        assert_eq!(
            controller.store().get_binding(CubeIndex(0), Face::Top.index()),
            &FaceBinding::captured("https://example.com", "data:image/png;base64,AAAA")
        );
        let (_, slot, texture) = host.textures.last().unwrap();
        assert_eq!(*slot, MaterialSlot::from(face(4)));
        assert!(texture.is_cached());

        finish(&mut controller, &mut host);
        assert_eq!(controller.view().phase, Phase::Idle);
        assert_eq!(controller.camera().position, Point3::new(0.0, -1.0, 20.0));
        assert!(controller.session().is_none());
    }

    #[test]
    fn test_cancelled_prompt_shrinks() {
        let mut controller = controller_with(1);
        let mut host = MockHost::default();
        host.answers.push_back(None);
        controller.enlarge(&mut host);
        finish(&mut controller, &mut host);
        assert_eq!(controller.view().phase, Phase::Shrinking);
        assert!(host.fetches.is_empty());
        finish(&mut controller, &mut host);
        assert_eq!(controller.view().phase, Phase::Idle);
    }

    #[test]
    fn test_fetch_failure_leaves_binding() {
        let mut controller = controller_with(1);
        let mut host = MockHost::default();
        host.answers.push_back(Some("https://down.test".to_string()));
        controller.bind_page(&mut host);
        finish(&mut controller, &mut host);

        controller.on_content_fetched(Err(FetchError::Status(503)), &mut host);
        assert_eq!(host.errors.len(), 1);
        assert_eq!(controller.view().phase, Phase::Shrinking);
        assert_eq!(controller.active_binding(), &FaceBinding::pending("https://down.test"));
    }

    #[test]
    fn test_close_while_fetching_shrinks_at_once() {
        let mut controller = controller_with(1);
        let mut host = MockHost::default();
        host.answers.push_back(Some("https://slow.test".to_string()));
        controller.enlarge(&mut host);
        finish(&mut controller, &mut host);
        assert_eq!(controller.view().phase, Phase::Viewing);

        controller.on_close_requested(&mut host);
        assert_eq!(controller.view().phase, Phase::Shrinking);
        assert!(controller.session().is_none());

        controller.on_content_fetched(Ok("<p>late</p>".to_string()), &mut host);
        assert!(host.shown.is_empty());
        assert_eq!(host.snapshots, 0);
        finish(&mut controller, &mut host);
        assert_eq!(controller.view().phase, Phase::Idle);
        assert_eq!(controller.active_binding().status(), BindingStatus::Pending);
    }

    #[test]
    fn test_snapshot_failure_returns_to_idle() {
        let mut controller = controller_with(1);
        let mut host = MockHost::default();
        host.answers.push_back(Some("https://a.test".to_string()));
        controller.enlarge(&mut host);
        finish(&mut controller, &mut host);
        controller.on_content_fetched(Ok("<p/>".to_string()), &mut host);
        controller.on_close_requested(&mut host);
        controller.on_snapshot(Err(SnapshotError("boom".to_string())), &mut host);

        assert_eq!(host.dismissed, 1);
        assert_eq!(controller.view().phase, Phase::Shrinking);
        finish(&mut controller, &mut host);
        assert_eq!(controller.view().phase, Phase::Idle);
        assert_eq!(controller.active_binding().status(), BindingStatus::Pending);
    }

    #[test]
    fn test_click_selects_face_and_enlarges() {
        let mut controller = controller_with(2);
        let mut host = MockHost::default();
        let scene = MeshScene::new(controller.poses().iter().map(|(cube, pose)| (*cube, pose)));
        assert!(controller.click(400.0, 300.0, &scene, &mut host));
        assert_eq!(controller.view().active_face, Face::Front);
        assert_eq!(controller.view().phase, Phase::Enlarging);
    }

    #[test]
    fn test_click_on_background_does_nothing() {
        let mut controller = controller_with(2);
        let mut host = MockHost::default();
        let scene = MeshScene::new(controller.poses().iter().map(|(cube, pose)| (*cube, pose)));
        assert!(!controller.click(2.0, 2.0, &scene, &mut host));
        assert_eq!(controller.view().phase, Phase::Idle);
        assert!(host.batches.is_empty());
    }

    #[test]
    fn test_add_and_remove() {
        let mut controller = controller_with(1);
        let mut host = MockHost::default();
        assert_eq!(controller.add_cube(&mut host), Some(CubeIndex(1)));
        assert_eq!(controller.poses().len(), 2);
        assert_eq!(host.textures.len(), 6);

        host.answers.push_back(Some("https://a.test".to_string()));
        assert!(controller.bind_page(&mut host));
        finish(&mut controller, &mut host);
        controller.on_content_fetched(Err(FetchError::Transport("offline".into())), &mut host);
        finish(&mut controller, &mut host);

        assert!(controller.remove_page(&mut host));
        assert!(controller.active_binding().is_empty());
        assert!(!controller.remove_page(&mut host));
    }

    #[test]
    fn test_label_follows_active_binding() {
        let mut controller = controller_with(1);
        let mut host = MockHost::default();
        assert!(controller.active_label().is_none());
        host.answers.push_back(Some("https://a.test".to_string()));
        controller.bind_page(&mut host);
        assert_eq!(controller.active_label().unwrap().text, "https://a.test");
    }
}
