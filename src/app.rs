//! Headless application wiring: loads images and composes them.

use tracing::{debug, info};

use crate::compose::{Composer, Control};
use crate::loader::LoadListener;

/// One delivered resource.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedResource {
    pub url: String,
    pub data_uri: String,
    /// The filtered SVG, present when the controls moved away from their
    /// initial positions.
    pub composed: Option<String>,
}

impl LoadedResource {
    /// What should be displayed: the composed image when there is one.
    pub fn display(&self) -> &str {
        self.composed.as_deref().unwrap_or(&self.data_uri)
    }
}

/// Applies a fixed set of control values to every image the loader delivers.
#[derive(Debug, Clone)]
pub struct Application {
    controls: Vec<(Control, f64)>,
    loaded: Vec<LoadedResource>,
}

impl Application {
    pub fn new(controls: Vec<(Control, f64)>) -> Self {
        Self {
            controls,
            loaded: Vec::new(),
        }
    }

    pub fn loaded(&self) -> &[LoadedResource] {
        &self.loaded
    }

    pub fn into_loaded(self) -> Vec<LoadedResource> {
        self.loaded
    }

    fn compose(&self, data_uri: &str) -> Option<String> {
        let mut composer = Composer::new();
        composer.set_source(data_uri);

        let mut changed = false;
        for &(control, value) in &self.controls {
            changed |= control.apply(&mut composer, value);
        }

        changed.then(|| composer.compose())
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new(
            Control::ALL
                .iter()
                .map(|&control| (control, control.initial_value()))
                .collect(),
        )
    }
}

impl LoadListener for Application {
    fn on_load_data(&mut self, url: &str, text: &str) {
        info!("Loaded '{}' ({} bytes encoded)", url, text.len());
        let composed = self.compose(text);
        if composed.is_some() {
            debug!("Composed filtered image for '{}'", url);
        }
        self.loaded.push(LoadedResource {
            url: url.to_owned(),
            data_uri: text.to_owned(),
            composed,
        });
    }
}
