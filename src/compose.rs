//! SVG filter composition for loaded images
//!
//! A [`Composer`] holds a loaded image (as a data URI) together with a colour
//! matrix and a Gaussian blur, and renders them into a standalone SVG data URI.
//! Setters report whether the value changed so callers only recompose when
//! something actually moved.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::encoder::{self, BASE64_MARKER, DATA_URI_SCHEME};
use crate::errors::ComposeError;

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Upper bound of a colour control; multipliers are `value / CHANNEL_MAX`.
pub const CHANNEL_MAX: f64 = 255.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub blur: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            red: 1.0,
            green: 1.0,
            blue: 1.0,
            blur: 0.0,
        }
    }
}

/// A slider-style control driving one filter parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Red,
    Green,
    Blue,
    Blur,
}

impl Control {
    pub const ALL: [Control; 4] = [Control::Red, Control::Green, Control::Blue, Control::Blur];

    /// Control position before any image is loaded.
    pub fn initial_value(self) -> f64 {
        match self {
            Control::Blur => 0.0,
            _ => CHANNEL_MAX,
        }
    }

    /// Parse a control's textual value.
    pub fn parse_value(text: &str) -> Option<f64> {
        text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
    }

    /// Apply a raw control value, returning whether the composer changed.
    pub fn apply(self, composer: &mut Composer, value: f64) -> bool {
        match self {
            Control::Red => composer.set_red(value / CHANNEL_MAX),
            Control::Green => composer.set_green(value / CHANNEL_MAX),
            Control::Blue => composer.set_blue(value / CHANNEL_MAX),
            Control::Blur => composer.set_blur(value),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    source: String,
    width: u32,
    height: u32,
    params: FilterParams,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Replace the image, measuring it from its encoded payload.
    pub fn set_source(&mut self, source: &str) {
        self.source = source.to_owned();
        (self.width, self.height) = match probe_dimensions(source) {
            Ok(dimensions) => dimensions,
            Err(e) => {
                warn!("Cannot measure loaded image: {}", e);
                (0, 0)
            }
        };
        debug!("Composer source set ({}x{})", self.width, self.height);
    }

    pub fn set_red(&mut self, red: f64) -> bool {
        Self::update(&mut self.params.red, red)
    }

    pub fn set_green(&mut self, green: f64) -> bool {
        Self::update(&mut self.params.green, green)
    }

    pub fn set_blue(&mut self, blue: f64) -> bool {
        Self::update(&mut self.params.blue, blue)
    }

    pub fn set_blur(&mut self, blur: f64) -> bool {
        Self::update(&mut self.params.blur, blur)
    }

    fn update(slot: &mut f64, value: f64) -> bool {
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    /// The filtered image as an SVG document.
    pub fn svg(&self) -> String {
        let FilterParams {
            red,
            green,
            blue,
            blur,
        } = self.params;
        let (width, height) = (self.width, self.height);
        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width}" height="{height}">"#,
                r#"<defs><filter id="a">"#,
                r#"<feColorMatrix type="matrix" values="{red} 0 0 0 0 0 {green} 0 0 0 0 0 {blue} 0 0 0 0 0 1 0"/>"#,
                r#"<feGaussianBlur stdDeviation="{blur}"/>"#,
                r#"</filter></defs>"#,
                r#"<image x="0" y="0" width="{width}" height="{height}" xlink:href="{source}" filter="url(#a)"/>"#,
                r#"</svg>"#,
            ),
            width = width,
            height = height,
            red = red,
            green = green,
            blue = blue,
            blur = blur,
            source = self.source,
        )
    }

    /// The filtered image as an SVG data URI.
    pub fn compose(&self) -> String {
        encoder::encode(SVG_CONTENT_TYPE, self.svg().as_bytes())
    }
}

/// Read pixel dimensions from a base-64 image data URI.
pub fn probe_dimensions(data_uri: &str) -> Result<(u32, u32), ComposeError> {
    let payload = data_uri
        .strip_prefix(DATA_URI_SCHEME)
        .and_then(|rest| rest.split_once(BASE64_MARKER))
        .map(|(_, payload)| payload)
        .ok_or_else(|| ComposeError::NotDataUri {
            prefix: data_uri.chars().take(32).collect(),
        })?;

    let bytes = STANDARD.decode(payload)?;
    let reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}
