/// Content capture pipeline: fetch, display, snapshot, once per session
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, error, warn};

use crate::binding::CubeIndex;
use crate::face::Face;
use crate::host::{ContentHost, FetchError, SnapshotError};

/// Characters `encodeURIComponent` leaves alone
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Backend path that proxies `url`
pub fn proxy_path(url: &str) -> String {
    format!("/proxy/{}", utf8_percent_encode(url, URI_COMPONENT))
}

/// Target URL of a `/proxy/<encoded>` path, `None` for anything else
pub fn proxy_target(path: &str) -> Option<String> {
    let encoded = path.strip_prefix("/proxy/")?;
    Some(percent_decode_str(encoded).decode_utf8_lossy().into_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    Fetching,
    Displaying,
    Snapshotting,
    Done,
}

/// What the controller does after feeding the session an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStep {
    /// Nothing to do until the next event
    Wait,
    /// A snapshot was requested
    Snapshotting,
    /// Snapshot taken; store it and shrink
    Captured { image_data: String },
    /// Session over without a snapshot; shrink
    Abandoned,
}

/// One viewing session of a bound face
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSession {
    cube: CubeIndex,
    face: Face,
    url: String,
    stage: CaptureStage,
    /// Set by the first capture trigger; later triggers are no-ops
    closing: bool,
}

impl CaptureSession {
    /// Start fetching `url` through the proxy
    pub fn begin(cube: CubeIndex, face: Face, url: impl Into<String>, host: &mut impl ContentHost) -> Self {
        let url = url.into();
        let path = proxy_path(&url);
        debug!(cube = %cube, face = %face, path = %path, "fetching bound page");
        host.fetch(&path);
        Self {
            cube,
            face,
            url,
            stage: CaptureStage::Fetching,
            closing: false,
        }
    }

    pub fn cube(&self) -> CubeIndex {
        self.cube
    }

    pub fn face(&self) -> Face {
        self.face
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn stage(&self) -> CaptureStage {
        self.stage
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn on_fetched(&mut self, result: Result<String, FetchError>, host: &mut impl ContentHost) -> CaptureStep {
        if self.stage != CaptureStage::Fetching {
            return CaptureStep::Wait;
        }
        match result {
            Err(err) => {
                warn!(url = %self.url, error = %err, "error loading webpage");
                host.show_error(&format!("Error loading webpage: {err}"));
                self.finish(host)
            }
            Ok(html) => {
                host.show_content(&html);
                self.stage = CaptureStage::Displaying;
                CaptureStep::Wait
            }
        }
    }

    /// Implicit trigger: the embedded view finished loading
    pub fn on_ready(&mut self, host: &mut impl ContentHost) -> CaptureStep {
        self.trigger(host)
    }

    /// Explicit trigger: the user closed the view
    pub fn on_close(&mut self, host: &mut impl ContentHost) -> CaptureStep {
        self.trigger(host)
    }

    pub fn on_snapshot(&mut self, result: Result<String, SnapshotError>, host: &mut impl ContentHost) -> CaptureStep {
        if self.stage != CaptureStage::Snapshotting {
            return CaptureStep::Wait;
        }
        match result {
            Ok(image_data) => {
                self.stage = CaptureStage::Done;
                host.dismiss();
                CaptureStep::Captured { image_data }
            }
            Err(err) => {
                error!(url = %self.url, error = %err, "error capturing page content");
                self.finish(host)
            }
        }
    }

    fn trigger(&mut self, host: &mut impl ContentHost) -> CaptureStep {
        if self.closing {
            return CaptureStep::Wait;
        }
        self.closing = true;
        match self.stage {
            CaptureStage::Displaying => {
                self.stage = CaptureStage::Snapshotting;
                host.snapshot();
                CaptureStep::Snapshotting
            }
            // Nothing shown yet; a late fetch result finds the session done
            CaptureStage::Fetching => self.finish(host),
            _ => CaptureStep::Wait,
        }
    }

    fn finish(&mut self, host: &mut impl ContentHost) -> CaptureStep {
        self.stage = CaptureStage::Done;
        host.dismiss();
        CaptureStep::Abandoned
    }
}
