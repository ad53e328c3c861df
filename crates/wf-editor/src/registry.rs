//! Custom element registry.
//!
//! Maps tag names to component constructors. The page consults it when an
//! element is inserted; tags without an entry stay plain elements.

use crate::symbol::{StateSymbol, SymbolDrawer, TaskSymbol};
use std::collections::HashMap;
use wf_core::{Result, WfError};

pub type SymbolFactory = fn() -> Box<dyn SymbolDrawer>;

#[derive(Debug, Clone, Copy)]
pub enum ComponentFactory {
    /// A `wf-graph` canvas.
    Graph,
    /// A node drawn with the symbol the factory returns.
    Node(SymbolFactory),
}

#[derive(Debug, Clone, Default)]
pub struct ElementRegistry {
    definitions: HashMap<String, ComponentFactory>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `wf-graph`, `wf-state` and `wf-task` defined.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (tag, factory) in [
            ("wf-graph", ComponentFactory::Graph),
            ("wf-state", ComponentFactory::Node(state_symbol)),
            ("wf-task", ComponentFactory::Node(task_symbol)),
        ] {
            let defined = registry.define(tag, factory);
            debug_assert!(defined.is_ok(), "{tag}: {defined:?}");
        }
        registry
    }

    /// Define `tag`. Names must contain a hyphen and can only be defined once.
    pub fn define(&mut self, tag: &str, factory: ComponentFactory) -> Result<()> {
        if !tag.contains('-') || tag.starts_with('-') || tag != tag.to_ascii_lowercase() {
            return Err(WfError::Config(format!(
                "`{tag}` is not a valid custom element name"
            )));
        }
        if self.definitions.contains_key(tag) {
            return Err(WfError::AlreadyDefined(tag.to_string()));
        }
        log::debug!("defined <{tag}>");
        self.definitions.insert(tag.to_string(), factory);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<ComponentFactory> {
        self.definitions.get(tag).copied()
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(tag)
    }
}

fn state_symbol() -> Box<dyn SymbolDrawer> {
    Box::new(StateSymbol)
}

fn task_symbol() -> Box<dyn SymbolDrawer> {
    Box::new(TaskSymbol)
}
