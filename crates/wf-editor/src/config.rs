//! Graph canvas configuration.
//!
//! Defaults match a bare `<wf-graph>` tag. `data-width`/`data-height` on the
//! host element override the configured size.

use serde::{Deserialize, Serialize};
use wf_core::{Element, Result, WfError};

/// Where the canvas's stylesheet comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Stylesheet {
    /// Inline `<style>` element with the built-in rules.
    #[default]
    Embedded,
    /// `<link rel="stylesheet">` to an external file.
    Linked { href: String },
}

/// How a node's outer `box` rectangle is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoxSizing {
    /// Derived from the label rectangle plus the glyph's margin extent.
    /// Does not depend on measuring the whole group, which is unreliable
    /// before a stylesheet has been applied.
    #[default]
    FixedOffset,
    /// Padded bounding box of the whole node group.
    Measured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
    pub width: f64,
    pub height: f64,
    pub stylesheet: Stylesheet,
    pub box_sizing: BoxSizing,
    /// Lower bound for the zoom factor.
    pub min_scale: f64,
    /// Scale change per zoom step.
    pub zoom_step: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 300.0,
            stylesheet: Stylesheet::default(),
            box_sizing: BoxSizing::default(),
            min_scale: 0.2,
            zoom_step: 0.2,
        }
    }
}

impl GraphConfig {
    /// Reject sizes and zoom bounds that would leave the canvas without a
    /// usable matrix: every number must be finite and positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("width", self.width),
            ("height", self.height),
            ("minScale", self.min_scale),
            ("zoomStep", self.zoom_step),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(WfError::Config(format!(
                    "`{name}` must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Apply `data-width`/`data-height` from the host element. Values that
    /// are not positive numbers are ignored.
    #[must_use]
    pub fn with_dataset(&self, host: &Element) -> Self {
        let mut config = self.clone();
        if let Some(w) = dataset_length(host, "data-width") {
            config.width = w;
        }
        if let Some(h) = dataset_length(host, "data-height") {
            config.height = h;
        }
        config
    }
}

fn dataset_length(host: &Element, name: &str) -> Option<f64> {
    let raw = host.attr(name)?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Some(v),
        _ => {
            log::warn!("ignoring {name}={raw:?}");
            None
        }
    }
}
