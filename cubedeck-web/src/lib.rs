/// CubeDeck Web - WASM facade over the carousel core
///
/// JavaScript owns the renderer, tweens, page fetches and snapshots. It
/// forwards user input and completions here and applies the effects drained
/// from `drain_effects` after each call.
use cubedeck_core::hit_test::MeshScene;
use cubedeck_core::{
    Camera, Direction, FaceBindingStore, FetchError, LayoutParams, SnapshotError, Ticket, Timings,
    TransitionController,
};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;

pub mod effect;

pub use effect::{Effect, EffectGateway, EffectHost, Outbox};

/// `Number.MAX_SAFE_INTEGER`
const MAX_SAFE_TICKET: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewSummary {
    active_cube: u32,
    active_face: u8,
    face_name: &'static str,
    phase: String,
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct LabelSummary<'a> {
    text: &'a str,
    x: f32,
    y: f32,
}

#[cfg(target_arch = "wasm32")]
fn browser_prompt() -> Option<String> {
    web_sys::window()?
        .prompt_with_message("Enter URL:")
        .ok()
        .flatten()
}

#[cfg(not(target_arch = "wasm32"))]
fn browser_prompt() -> Option<String> {
    None
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        warn!(error = %err, "effect serialization failed");
        "null".to_string()
    })
}

#[wasm_bindgen]
pub struct WebCarousel {
    controller: TransitionController<EffectGateway>,
    host: EffectHost,
    outbox: Outbox,
}

#[wasm_bindgen]
impl WebCarousel {
    /// `document` is the body of `GET /get_data`, or empty
    #[wasm_bindgen(constructor)]
    pub fn new(document: &str, width: u32, height: u32) -> WebCarousel {
        Self::with_prompt(document, width, height, Box::new(browser_prompt))
    }

    /// `+1` or `-1`
    pub fn rotate(&mut self, direction: i32) -> bool {
        self.controller
            .rotate(Direction::from_sign(direction), &mut self.host)
    }

    pub fn switch_cube(&mut self, direction: i32) -> bool {
        self.controller
            .switch_cube(Direction::from_sign(direction), &mut self.host)
    }

    pub fn enlarge(&mut self) -> bool {
        self.controller.enlarge(&mut self.host)
    }

    pub fn click(&mut self, x: f32, y: f32) -> bool {
        let scene = MeshScene::new(
            self.controller
                .poses()
                .iter()
                .map(|(cube, pose)| (*cube, pose)),
        );
        self.controller.click(x, y, &scene, &mut self.host)
    }

    pub fn add_cube(&mut self) -> Option<u32> {
        self.controller
            .add_cube(&mut self.host)
            .map(|cube| cube.0)
    }

    pub fn bind_page(&mut self) -> bool {
        self.controller.bind_page(&mut self.host)
    }

    pub fn change_page(&mut self) -> bool {
        self.controller.change_page(&mut self.host)
    }

    pub fn remove_page(&mut self) -> bool {
        self.controller.remove_page(&mut self.host)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.controller.resize(width, height);
    }

    /// `ticket` as received in `startTween`
    pub fn tween_finished(&mut self, ticket: f64) {
        if !(ticket >= 0.0 && ticket.fract() == 0.0 && ticket <= MAX_SAFE_TICKET) {
            warn!(ticket, "ignoring malformed tween ticket");
            return;
        }
        self.controller
            .on_tween_finished(Ticket(ticket as u64), &mut self.host);
    }

    pub fn content_fetched(&mut self, html: String) {
        self.controller.on_content_fetched(Ok(html), &mut self.host);
    }

    /// `status` is the HTTP status, or absent for a network failure
    pub fn content_fetch_failed(&mut self, status: Option<u16>, message: String) {
        let err = match status {
            Some(status) => FetchError::Status(status),
            None => FetchError::Transport(message),
        };
        self.controller.on_content_fetched(Err(err), &mut self.host);
    }

    pub fn content_ready(&mut self) {
        self.controller.on_content_ready(&mut self.host);
    }

    pub fn close_requested(&mut self) {
        self.controller.on_close_requested(&mut self.host);
    }

    pub fn snapshot_taken(&mut self, data_url: String) {
        self.controller.on_snapshot(Ok(data_url), &mut self.host);
    }

    pub fn snapshot_failed(&mut self, message: String) {
        self.controller
            .on_snapshot(Err(SnapshotError(message)), &mut self.host);
    }

    /// Pending effects as a JSON array, oldest first
    pub fn drain_effects(&mut self) -> String {
        let effects: Vec<Effect> = self.outbox.borrow_mut().drain(..).collect();
        to_json(&effects)
    }

    /// Current view state as JSON
    pub fn view(&self) -> String {
        let view = self.controller.view();
        to_json(&ViewSummary {
            active_cube: view.active_cube.0,
            active_face: view.active_face.index().get(),
            face_name: view.active_face.name(),
            phase: format!("{:?}", view.phase).to_lowercase(),
            url: self.controller.active_binding().url.clone(),
        })
    }

    /// Floating URL label as JSON, or `null`
    pub fn label(&self) -> String {
        match self.controller.active_label() {
            Some(label) => to_json(&LabelSummary {
                text: &label.text,
                x: label.x,
                y: label.y,
            }),
            None => "null".to_string(),
        }
    }
}

impl WebCarousel {
    pub fn with_prompt(
        document: &str,
        width: u32,
        height: u32,
        prompt: Box<dyn FnMut() -> Option<String>>,
    ) -> Self {
        let outbox = Outbox::default();
        let store = FaceBindingStore::open(EffectGateway::new(document, outbox.clone()));
        let mut controller = TransitionController::new(
            store,
            LayoutParams::default(),
            Timings::default(),
            Camera::new(width, height),
        );
        let mut host = EffectHost::new(outbox.clone(), prompt);
        controller.attach(&mut host);
        Self {
            controller,
            host,
            outbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn effects(carousel: &mut WebCarousel) -> Vec<Value> {
        serde_json::from_str(&carousel.drain_effects()).unwrap()
    }

    fn last_ticket(effects: &[Value]) -> f64 {
        effects
            .iter()
            .rev()
            .find(|effect| effect["type"] == "startTween")
            .and_then(|effect| effect["ticket"].as_f64())
            .unwrap()
    }

    #[test]
    fn test_new_collection_is_saved_and_drawn() {
        let mut carousel = WebCarousel::new("", 800, 600);
        let effects = effects(&mut carousel);
        let count = |kind: &str| effects.iter().filter(|e| e["type"] == kind).count();
        assert_eq!(count("save"), 1);
        assert_eq!(count("place"), 1);
        assert_eq!(count("placeCamera"), 1);
        assert_eq!(count("setTexture"), 6);
        assert!(carousel.drain_effects() == "[]");
    }

    #[test]
    fn test_rotation_round_trip_through_js() {
        let mut carousel = WebCarousel::new("{}", 800, 600);
        carousel.drain_effects();
        assert!(carousel.rotate(1));
        assert!(!carousel.rotate(1));
        let ticket = last_ticket(&effects(&mut carousel));
        carousel.tween_finished(ticket + 0.5);
        carousel.tween_finished(-1.0);
        let view: Value = serde_json::from_str(&carousel.view()).unwrap();
        assert_eq!(view["phase"], "rotating");
        carousel.tween_finished(ticket);

        let view: Value = serde_json::from_str(&carousel.view()).unwrap();
        assert_eq!(view["activeFace"], 2);
        assert_eq!(view["faceName"], "front");
        assert_eq!(view["phase"], "idle");
    }

    #[test]
    fn test_capture_flow_emits_effects_in_order() {
        let mut carousel = WebCarousel::with_prompt(
            "",
            800,
            600,
            Box::new(|| Some("https://example.com".to_string())),
        );
        carousel.drain_effects();

        carousel.enlarge();
        let ticket = last_ticket(&effects(&mut carousel));
        carousel.tween_finished(ticket);
        let opened = effects(&mut carousel);
        assert!(opened.iter().any(|e| e["type"] == "save"));
        assert_eq!(
            opened.last().unwrap()["path"],
            "/proxy/https%3A%2F%2Fexample.com"
        );

        carousel.content_fetched("<p>hello</p>".into());
        carousel.content_ready();
        carousel.close_requested();
        carousel.snapshot_taken("data:image/png;base64,AAAA".into());
        let kinds: Vec<String> = effects(&mut carousel)
            .iter()
            .map(|e| e["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            kinds,
            ["showContent", "snapshot", "dismiss", "setTexture", "save", "startTween"]
        );

        let label: Value = serde_json::from_str(&carousel.label()).unwrap();
        assert_eq!(label["text"], "https://example.com");
    }

    #[test]
    fn test_fetch_failure_shows_error() {
        let mut carousel = WebCarousel::with_prompt(
            "",
            800,
            600,
            Box::new(|| Some("https://down.test".to_string())),
        );
        carousel.enlarge();
        let ticket = last_ticket(&effects(&mut carousel));
        carousel.tween_finished(ticket);
        carousel.drain_effects();

        carousel.content_fetch_failed(Some(500), String::new());
        let effects = effects(&mut carousel);
        assert_eq!(
            effects[0]["message"],
            "Error loading webpage: HTTP error! status: 500"
        );
        let view: Value = serde_json::from_str(&carousel.view()).unwrap();
        assert_eq!(view["phase"], "shrinking");
    }
}
