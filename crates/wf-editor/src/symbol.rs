//! Node glyphs.
//!
//! Every glyph is three nested filled shapes (margin, border, fill) rather
//! than one stroked shape: strokes are not part of the bounding box, so a
//! stroked glyph would be measured too small.

use std::fmt;
use wf_core::{NodeSpec, Result, WfError, svg};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Circle,
    Square,
}

/// Primitive kind plus the three nested sizes (radius for circles, side
/// length for squares).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolShape {
    pub primitive: Primitive,
    pub margin: f64,
    pub border: f64,
    pub fill: f64,
}

impl SymbolShape {
    /// Distance from the glyph center to the outer edge of the margin.
    pub fn margin_extent(&self) -> f64 {
        match self.primitive {
            Primitive::Circle => self.margin,
            Primitive::Square => self.margin / 2.0,
        }
    }

    /// Shapes in paint order. The last one is the drag handle.
    pub fn layers(&self) -> [NodeSpec; 3] {
        [
            self.layer("margin", self.margin),
            self.layer("border", self.border),
            self.layer("fill handle", self.fill),
        ]
    }

    fn layer(&self, class: &str, size: f64) -> NodeSpec {
        match self.primitive {
            Primitive::Circle => svg(
                "circle",
                [
                    ("class", class.to_string()),
                    ("cx", "0".to_string()),
                    ("cy", "0".to_string()),
                    ("r", size.to_string()),
                ],
                vec![],
            ),
            Primitive::Square => {
                let half = size / 2.0;
                svg(
                    "rect",
                    [
                        ("class", class.to_string()),
                        ("x", (-half).to_string()),
                        ("y", (-half).to_string()),
                        ("width", size.to_string()),
                        ("height", size.to_string()),
                    ],
                    vec![],
                )
            }
        }
    }
}

/// Supplies the glyph of a node type.
pub trait SymbolDrawer: fmt::Debug {
    /// Type name, hyphenated into the node group's class.
    fn type_name(&self) -> &'static str;

    fn shape(&self) -> Result<SymbolShape> {
        Err(WfError::AbstractSymbol)
    }
}

/// The base node type. Has no glyph of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbstractSymbol;

impl SymbolDrawer for AbstractSymbol {
    fn type_name(&self) -> &'static str {
        "WfElement"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateSymbol;

impl SymbolDrawer for StateSymbol {
    fn type_name(&self) -> &'static str {
        "WfState"
    }

    fn shape(&self) -> Result<SymbolShape> {
        Ok(SymbolShape {
            primitive: Primitive::Circle,
            margin: 14.0,
            border: 10.0,
            fill: 8.0,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskSymbol;

impl SymbolDrawer for TaskSymbol {
    fn type_name(&self) -> &'static str {
        "WfTask"
    }

    fn shape(&self) -> Result<SymbolShape> {
        Ok(SymbolShape {
            primitive: Primitive::Square,
            margin: 28.0,
            border: 20.0,
            fill: 16.0,
        })
    }
}
