/// Backend HTTP access: collection load/save and the page proxy
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cubedeck_core::gateway::{self, GatewayError, PersistenceGateway, SaveAck};
use cubedeck_core::{CollectionState, FetchError};
use percent_encoding::percent_decode_str;
use reqwest::blocking::Client;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::HostEvent;

fn client() -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30))
        .build()
}

fn transport(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(Box::new(err))
}

/// `GET /get_data` and `POST /save_data` against the backend
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base: String,
}

impl HttpGateway {
    pub fn new(base: &str) -> gateway::Result<Self> {
        Ok(Self {
            client: client().map_err(transport)?,
            base: base.trim_end_matches('/').to_string(),
        })
    }
}

impl PersistenceGateway for HttpGateway {
    fn load(&mut self) -> gateway::Result<CollectionState> {
        let response = self
            .client
            .get(format!("{}/get_data", self.base))
            .send()
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
            });
        }
        let text = response.text().map_err(transport)?;
        Ok(CollectionState::from_json(&text)?)
    }

    fn save(&mut self, state: &CollectionState) -> gateway::Result<SaveAck> {
        let response = self
            .client
            .post(format!("{}/save_data", self.base))
            .json(state)
            .send()
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
            });
        }
        let ack: serde_json::Value = response.json().map_err(transport)?;
        Ok(SaveAck::Acknowledged(ack))
    }
}

/// Writes collections on a worker thread so saves never stall a frame.
///
/// Saves are applied in order; dropping the saver flushes the queue.
pub struct BackgroundSaver<G> {
    inner: G,
    sender: Option<Sender<CollectionState>>,
    worker: Option<JoinHandle<()>>,
}

impl<G> BackgroundSaver<G>
where
    G: PersistenceGateway + Clone + Send + 'static,
{
    pub fn spawn(inner: G) -> Self {
        let (sender, receiver) = mpsc::channel::<CollectionState>();
        let mut writer = inner.clone();
        let worker = thread::spawn(move || {
            for state in receiver {
                match writer.save(&state) {
                    Ok(ack) => info!(?ack, "collection saved"),
                    Err(err) => warn!(error = %err, "error saving data"),
                }
            }
            debug!("save worker stopped");
        });
        Self {
            inner,
            sender: Some(sender),
            worker: Some(worker),
        }
    }
}

impl<G: PersistenceGateway> PersistenceGateway for BackgroundSaver<G> {
    fn load(&mut self) -> gateway::Result<CollectionState> {
        self.inner.load()
    }

    fn save(&mut self, state: &CollectionState) -> gateway::Result<SaveAck> {
        let sender = self.sender.as_ref().ok_or(GatewayError::Disconnected)?;
        sender
            .send(state.clone())
            .map_err(|_| GatewayError::Disconnected)?;
        Ok(SaveAck::Queued)
    }
}

impl<G> Drop for BackgroundSaver<G> {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("save worker panicked");
            }
        }
    }
}

/// Fetches proxied pages on worker threads.
///
/// With a backend the `/proxy/` path is requested from it; without one the
/// target URL is decoded from the path and fetched directly.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    base: Option<String>,
}

impl ProxyClient {
    pub fn new(base: Option<&str>) -> reqwest::Result<Self> {
        Ok(Self {
            client: client()?,
            base: base.map(|base| base.trim_end_matches('/').to_string()),
        })
    }

    /// Absolute URL for a `/proxy/<encoded>` path
    pub fn resolve(&self, proxy_path: &str) -> String {
        match &self.base {
            Some(base) => format!("{base}{proxy_path}"),
            None => {
                let encoded = proxy_path.strip_prefix("/proxy/").unwrap_or(proxy_path);
                direct_target(&percent_decode_str(encoded).decode_utf8_lossy())
            }
        }
    }

    /// Report the outcome as [`HostEvent::Fetched`] on `events`
    pub fn fetch(&self, proxy_path: &str, events: Sender<HostEvent>) {
        let url = self.resolve(proxy_path);
        let client = self.client.clone();
        thread::spawn(move || {
            let result = fetch_text(&client, &url);
            if events.send(HostEvent::Fetched(result)).is_err() {
                debug!(url = %url, "fetch result discarded");
            }
        });
    }
}

/// Page URL as the backend proxy would request it: `http://` when no scheme
/// is given, port 5000 for a local host without one
fn direct_target(target: &str) -> String {
    let url = if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("http://{target}")
    };
    let Ok(mut parsed) = Url::parse(&url) else {
        return url;
    };
    let local = matches!(parsed.host_str(), Some("localhost" | "127.0.0.1"));
    if local && parsed.port().is_none() && parsed.set_port(Some(5000)).is_ok() {
        return parsed.into();
    }
    url
}

fn fetch_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .map_err(|err| FetchError::Transport(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    response
        .text()
        .map_err(|err| FetchError::Transport(err.to_string()))
}
