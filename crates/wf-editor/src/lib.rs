pub mod config;
pub mod graph;
pub mod hit;
pub mod input;
pub mod listeners;
pub mod movability;
pub mod node;
pub mod page;
pub mod registry;
pub mod symbol;

pub use config::{BoxSizing, GraphConfig, Stylesheet};
pub use graph::GraphCanvas;
pub use input::{EventKind, EventState, InputEvent, PointerData};
pub use listeners::{Action, Listener, Listeners};
pub use movability::Movability;
pub use node::WfNode;
pub use page::Page;
pub use registry::{ComponentFactory, ElementRegistry};
pub use symbol::{AbstractSymbol, StateSymbol, SymbolDrawer, SymbolShape, TaskSymbol};
