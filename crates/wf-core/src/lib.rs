pub mod bbox;
pub mod dom;
pub mod error;
pub mod id;
pub mod markup;
pub mod matrix;
pub mod naming;

pub use bbox::{FixedAdvance, TextMeasure, TextMetrics, bbox};
pub use dom::{Document, DomNode, Element, Namespace, NodeSpec, element, html, svg, text};
pub use error::{ErrorKind, Result, WfError};
pub use id::ElementId;
pub use markup::{parse_markup, to_markup};
pub use matrix::{Matrix, TransformFn, consolidate, parse_matrix, parse_transform_list};
pub use naming::{camel_to_hyphen, camel_to_separator, camel_to_underscore};

// Re-export geometry and graph types so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect};
pub use petgraph::graph::NodeIndex;
