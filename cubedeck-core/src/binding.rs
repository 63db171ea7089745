/// Durable collection model: cubes, faces and their page bindings
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::capture::proxy_target;
use crate::face::FaceIndex;

/// Key of a cube in the collection. Not its carousel slot.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CubeIndex(pub u32);

impl fmt::Display for CubeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a face renders, derived from its binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStatus {
    /// No page; numbered placeholder with a "+" marker
    Empty,
    /// Page bound but never captured; numbered placeholder without marker
    Pending,
    /// Page bound with a cached snapshot
    Captured,
}

/// Association of a face with an external page and its cached snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBinding {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty"
    )]
    pub url: Option<String>,
    #[serde(
        rename = "imageData",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty"
    )]
    pub image_data: Option<String>,
}

pub(crate) static EMPTY_BINDING: FaceBinding = FaceBinding {
    url: None,
    image_data: None,
};

/// Older documents store unset fields as empty strings
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.is_empty()))
}

impl FaceBinding {
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            image_data: None,
        }
    }

    pub fn captured(url: impl Into<String>, image_data: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            image_data: Some(image_data.into()),
        }
    }

    /// A snapshot without a url carries no meaning and counts as empty
    pub fn status(&self) -> BindingStatus {
        match (&self.url, &self.image_data) {
            (None, _) => BindingStatus::Empty,
            (Some(_), None) => BindingStatus::Pending,
            (Some(_), Some(_)) => BindingStatus::Captured,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status() == BindingStatus::Empty
    }
}

/// One cube: always six face entries once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeRecord {
    #[serde(default)]
    pub faces: BTreeMap<FaceIndex, FaceBinding>,
}

impl CubeRecord {
    pub fn empty() -> Self {
        Self {
            faces: FaceIndex::ALL
                .into_iter()
                .map(|index| (index, FaceBinding::default()))
                .collect(),
        }
    }

    pub fn binding(&self, face: FaceIndex) -> &FaceBinding {
        self.faces.get(&face).unwrap_or(&EMPTY_BINDING)
    }

    fn fill_missing_faces(&mut self) {
        for index in FaceIndex::ALL {
            self.faces.entry(index).or_default();
        }
    }

    /// Older documents stored the proxy path in place of the page URL
    fn unwrap_proxied_urls(&mut self) {
        for (face, binding) in self.faces.iter_mut() {
            if let Some(target) = binding.url.as_deref().and_then(proxy_target) {
                debug!(face = %face, url = %target, "unwrapped proxied url");
                binding.url = Some(target);
            }
        }
    }
}

impl Default for CubeRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// Root persisted object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionState {
    #[serde(default)]
    pub cubes: BTreeMap<CubeIndex, CubeRecord>,
}

/// Accepts both the per-cube layout and the single-cube layout that predates it
#[derive(Deserialize)]
struct StoredDocument {
    #[serde(default)]
    cubes: Option<BTreeMap<CubeIndex, CubeRecord>>,
    #[serde(default)]
    faces: Option<serde_json::Value>,
}

impl CollectionState {
    /// Parse a stored document. An empty object yields an empty collection;
    /// callers decide how to normalize that.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let document: StoredDocument = serde_json::from_str(text)?;
        if document.faces.is_some() {
            warn!("ignoring top-level faces from a pre-cube document");
        }
        let mut state = Self {
            cubes: document.cubes.unwrap_or_default(),
        };
        for record in state.cubes.values_mut() {
            record.fill_missing_faces();
            record.unwrap_proxied_urls();
        }
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }
}
