use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ImagePayload;
use crate::error::{PipelineError, Result};

/// Named camera angle. Declaration order is the canonical view order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewName {
    Front,
    Back,
    Left,
    Right,
    Top,
}

impl ViewName {
    pub const ALL: [ViewName; 5] = [
        ViewName::Front,
        ViewName::Back,
        ViewName::Left,
        ViewName::Right,
        ViewName::Top,
    ];

    /// Views every reconstruction backend needs.
    pub const ELEVATIONS: [ViewName; 4] = [
        ViewName::Front,
        ViewName::Back,
        ViewName::Left,
        ViewName::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewName::Front => "front",
            ViewName::Back => "back",
            ViewName::Left => "left",
            ViewName::Right => "right",
            ViewName::Top => "top",
        }
    }

    /// Camera description appended to the per-view prompt.
    pub fn camera_hint(&self) -> &'static str {
        match self {
            ViewName::Front => "Front elevation, camera at eye level facing the main entrance.",
            ViewName::Back => "Back elevation, camera at eye level facing the rear facade.",
            ViewName::Left => "Left side elevation, camera at eye level facing the left facade.",
            ViewName::Right => "Right side elevation, camera at eye level facing the right facade.",
            ViewName::Top => "Top view, orthographic camera looking straight down at the roof.",
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for one view generation call.
#[derive(Debug, Clone)]
pub struct ViewRequest {
    pub prompt_text: String,
    pub references: Vec<ImagePayload>,
}

/// Generated views keyed by name, iterated in canonical order.
#[derive(Debug, Clone, Default)]
pub struct ViewSet {
    views: BTreeMap<ViewName, ImagePayload>,
}

impl ViewSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, view: ViewName, image: ImagePayload) {
        self.views.insert(view, image);
    }

    pub fn get(&self, view: ViewName) -> Option<&ImagePayload> {
        self.views.get(&view)
    }

    pub fn contains(&self, view: ViewName) -> bool {
        self.views.contains_key(&view)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn names(&self) -> Vec<ViewName> {
        self.views.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ViewName, &ImagePayload)> {
        self.views.iter().map(|(name, image)| (*name, image))
    }

    /// Fails on the first required view that is missing.
    pub fn require(&self, required: &[ViewName]) -> Result<()> {
        match required.iter().find(|view| !self.contains(**view)) {
            Some(missing) => Err(PipelineError::IncompleteViewSet(*missing)),
            None => Ok(()),
        }
    }

    /// Data URI for a view, or an empty string when the view was not generated.
    pub fn data_uri(&self, view: ViewName) -> String {
        self.get(view).map(ImagePayload::to_data_uri).unwrap_or_default()
    }

    pub fn data_uris(&self) -> Vec<String> {
        self.views.values().map(ImagePayload::to_data_uri).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel() -> ImagePayload {
        ImagePayload::new("image/png", vec![0])
    }

    #[test]
    fn test_views_iterate_in_canonical_order() {
        let mut set = ViewSet::new();
        set.insert(ViewName::Right, pixel());
        set.insert(ViewName::Front, pixel());
        set.insert(ViewName::Left, pixel());
        assert_eq!(
            set.names(),
            vec![ViewName::Front, ViewName::Left, ViewName::Right]
        );
    }

    #[test]
    fn test_require_reports_first_missing_view() {
        let mut set = ViewSet::new();
        set.insert(ViewName::Front, pixel());
        set.insert(ViewName::Left, pixel());
        match set.require(&ViewName::ELEVATIONS) {
            Err(PipelineError::IncompleteViewSet(view)) => assert_eq!(view, ViewName::Back),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_view_is_empty_uri() {
        let set = ViewSet::new();
        assert_eq!(set.data_uri(ViewName::Top), "");
    }

    #[test]
    fn test_view_name_wire_format() {
        assert_eq!(serde_json::to_string(&ViewName::Back).unwrap(), "\"back\"");
    }
}
