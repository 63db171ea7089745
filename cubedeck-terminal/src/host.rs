/// Terminal implementation of the controller's collaborators
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use cubedeck_core::host::{ContentHost, SceneSink, TweenEngine, UrlPrompt};
use cubedeck_core::{
    CubeIndex, CubePose, FaceTexture, FetchError, MaterialSlot, SnapshotError, Ticket, TweenBatch,
};
use nalgebra::Point3;
use tracing::{debug, warn};

use crate::net::ProxyClient;
use crate::scene::{FaceShade, Scene};
use crate::tween::Tweener;
use crate::view::EmbeddedView;

/// Completions reported back to the transition controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    TweenFinished(Ticket),
    Fetched(Result<String, FetchError>),
    ContentReady,
    CloseRequested,
    Snapshot(Result<String, SnapshotError>),
}

/// Where proxied pages come from
pub trait PageSource {
    fn fetch(&self, proxy_path: &str, events: Sender<HostEvent>);
}

impl PageSource for ProxyClient {
    fn fetch(&self, proxy_path: &str, events: Sender<HostEvent>) {
        ProxyClient::fetch(self, proxy_path, events)
    }
}

pub struct TerminalHost {
    scene: Scene,
    tweener: Tweener,
    pages: Box<dyn PageSource>,
    prompt: Box<dyn UrlPrompt>,
    view: Option<EmbeddedView>,
    notice: Option<String>,
    dwell: Duration,
    viewport: (u32, u32),
    queue: VecDeque<HostEvent>,
    /// Result channel of the session's fetch; dropped on dismiss
    fetch: Option<Receiver<HostEvent>>,
}

impl TerminalHost {
    pub fn new(
        pages: Box<dyn PageSource>,
        prompt: Box<dyn UrlPrompt>,
        dwell: Duration,
        viewport: (u32, u32),
    ) -> Self {
        Self {
            scene: Scene::new(Point3::origin()),
            tweener: Tweener::new(),
            pages,
            prompt,
            view: None,
            notice: None,
            dwell,
            viewport,
            queue: VecDeque::new(),
            fetch: None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn view(&self) -> Option<&EmbeddedView> {
        self.view.as_ref()
    }

    /// Last inline error, shown until the next key press
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// The user asked to close the embedded view
    pub fn request_close(&mut self) {
        self.queue.push_back(HostEvent::CloseRequested);
    }

    /// Advance tweens, collect worker results and the view's ready signal
    pub fn poll(&mut self, now: Instant) {
        if let Some(ticket) = self.tweener.advance(&mut self.scene, now) {
            self.queue.push_back(HostEvent::TweenFinished(ticket));
        }
        if let Some(fetch) = &self.fetch {
            self.queue.extend(fetch.try_iter());
        }
        if let Some(view) = self.view.as_mut() {
            if view.take_ready(now, self.dwell) {
                self.queue.push_back(HostEvent::ContentReady);
            }
        }
    }

    pub fn next_event(&mut self) -> Option<HostEvent> {
        self.queue.pop_front()
    }
}

impl TweenEngine for TerminalHost {
    fn start(&mut self, batch: TweenBatch) {
        debug!(ticket = batch.ticket.0, tracks = batch.tracks.len(), "tween started");
        self.tweener.start(batch, &self.scene, Instant::now());
    }
}

impl SceneSink for TerminalHost {
    fn place(&mut self, cube: CubeIndex, pose: &CubePose) {
        self.scene.poses.insert(cube, *pose);
    }

    fn place_camera(&mut self, position: Point3<f32>) {
        self.scene.camera = position;
    }

    fn set_face_texture(&mut self, cube: CubeIndex, slot: MaterialSlot, texture: &FaceTexture) {
        self.scene.set_shade(cube, slot, FaceShade::from_texture(texture));
    }
}

impl UrlPrompt for TerminalHost {
    fn prompt_url(&mut self) -> Option<String> {
        self.prompt.prompt_url()
    }
}

impl ContentHost for TerminalHost {
    fn fetch(&mut self, proxy_path: &str) {
        self.notice = None;
        let (sender, receiver) = mpsc::channel();
        self.fetch = Some(receiver);
        self.pages.fetch(proxy_path, sender);
    }

    fn show_content(&mut self, html: &str) {
        self.view = Some(EmbeddedView::new(html, Instant::now()));
    }

    fn show_error(&mut self, message: &str) {
        self.notice = Some(message.to_string());
    }

    fn snapshot(&mut self) {
        let (columns, rows) = self.viewport;
        let result = match &self.view {
            Some(view) => view.snapshot(columns, rows),
            None => Err(SnapshotError("no page on display".into())),
        };
        if let Err(err) = &result {
            warn!(error = %err, "snapshot failed");
        }
        self.queue.push_back(HostEvent::Snapshot(result));
    }

    fn dismiss(&mut self) {
        self.view = None;
        self.fetch = None;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Answers every fetch with the same body
    pub(crate) struct StaticPages(pub Result<String, FetchError>);

    impl PageSource for StaticPages {
        fn fetch(&self, _proxy_path: &str, events: Sender<HostEvent>) {
            events.send(HostEvent::Fetched(self.0.clone())).unwrap();
        }
    }

    pub(crate) struct Answer(pub Option<String>);

    impl UrlPrompt for Answer {
        fn prompt_url(&mut self) -> Option<String> {
            self.0.clone()
        }
    }

    pub(crate) fn host(page: Result<String, FetchError>, answer: Option<&str>) -> TerminalHost {
        TerminalHost::new(
            Box::new(StaticPages(page)),
            Box::new(Answer(answer.map(str::to_string))),
            Duration::ZERO,
            (40, 10),
        )
    }

    #[test]
    fn test_fetch_result_arrives_on_poll() {
        let mut host = host(Ok("<p>hi</p>".into()), None);
        host.fetch("/proxy/x");
        assert_eq!(host.next_event(), None);
        host.poll(Instant::now());
        assert_eq!(host.next_event(), Some(HostEvent::Fetched(Ok("<p>hi</p>".into()))));
    }

    /// Holds fetches open until the test answers them
    #[derive(Clone, Default)]
    struct HeldPages(Rc<RefCell<Vec<Sender<HostEvent>>>>);

    impl PageSource for HeldPages {
        fn fetch(&self, _proxy_path: &str, events: Sender<HostEvent>) {
            self.0.borrow_mut().push(events);
        }
    }

    #[test]
    fn test_fetch_after_dismiss_is_dropped() {
        let pages = HeldPages::default();
        let mut host = TerminalHost::new(
            Box::new(pages.clone()),
            Box::new(Answer(None)),
            Duration::from_secs(60),
            (40, 10),
        );
        host.fetch("/proxy/slow");
        host.dismiss();
        host.fetch("/proxy/next");

        let held = pages.0.borrow();
        assert!(held[0].send(HostEvent::Fetched(Ok("<p>old</p>".into()))).is_err());
        held[1].send(HostEvent::Fetched(Ok("<p>new</p>".into()))).unwrap();
        host.poll(Instant::now());
        assert_eq!(host.next_event(), Some(HostEvent::Fetched(Ok("<p>new</p>".into()))));
        assert_eq!(host.next_event(), None);
    }

    #[test]
    fn test_view_ready_and_snapshot() {
        let mut host = host(Ok(String::new()), None);
        host.show_content("<p>hi</p>");
        host.poll(Instant::now());
        assert_eq!(host.next_event(), Some(HostEvent::ContentReady));

        host.snapshot();
        match host.next_event() {
            Some(HostEvent::Snapshot(Ok(data))) => assert!(data.starts_with("data:image/png;base64,")),
            other => panic!("unexpected event {other:?}"),
        }
        host.dismiss();
        assert!(host.view().is_none());
    }

    #[test]
    fn test_snapshot_without_view_fails() {
        let mut host = host(Ok(String::new()), None);
        host.snapshot();
        assert!(matches!(host.next_event(), Some(HostEvent::Snapshot(Err(_)))));
    }
}
