//! WASM bridge for WF Graph: exposes the workflow editor page to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The host page sets the
//! markup returned by [`WfEditor::render`] as the shadow root content of
//! each `<wf-graph>` and forwards pointer events to the handlers here.

mod measure;

pub use measure::CanvasTextMeasure;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;
use wf_core::{ErrorKind, Matrix, NodeIndex, WfError, html, parse_matrix, text};
use wf_editor::{ElementRegistry, GraphConfig, Page, PointerData};

/// The main WASM-facing editor controller.
///
/// Owns the page (document, canvases, nodes). Canvases are addressed by
/// their position in the document.
#[wasm_bindgen]
pub struct WfEditor {
    page: Page,
}

#[wasm_bindgen]
impl WfEditor {
    /// Build a page from `markup`. `config_json` is an optional
    /// `GraphConfig` in JSON; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(markup: &str, config_json: Option<String>) -> Result<WfEditor, JsValue> {
        console_error_panic_hook_setup();
        let config = parse_config(config_json.as_deref()).map_err(to_js)?;
        let page = Page::from_markup(markup, ElementRegistry::with_defaults(), config)
            .map_err(to_js)?;
        Ok(Self { page })
    }

    /// Like the constructor, but measures labels with the given 2D context.
    #[wasm_bindgen(js_name = withTextContext)]
    pub fn with_text_context(
        markup: &str,
        config_json: Option<String>,
        ctx: CanvasRenderingContext2d,
    ) -> Result<WfEditor, JsValue> {
        console_error_panic_hook_setup();
        let config = parse_config(config_json.as_deref()).map_err(to_js)?;
        let mut page = Page::new(ElementRegistry::with_defaults(), config)
            .with_measure(CanvasTextMeasure::new(ctx));
        page.load(markup).map_err(to_js)?;
        Ok(Self { page })
    }

    pub fn canvas_count(&self) -> usize {
        self.page.canvas_hosts().len()
    }

    /// Shadow tree markup of canvas `index`.
    pub fn render(&self, index: usize) -> Result<String, JsValue> {
        let host = self.canvas_host(index)?;
        self.page
            .render(host)
            .ok_or_else(|| to_js(WfError::UnknownElement))
    }

    /// Placement of the canvas svg on screen (`getScreenCTM()`).
    #[allow(clippy::too_many_arguments)]
    pub fn set_screen_transform(
        &mut self,
        index: usize,
        a: f64,
        b: f64,
        c: f64,
        d: f64,
        e: f64,
        f: f64,
    ) -> Result<(), JsValue> {
        let host = self.canvas_host(index)?;
        self.page
            .set_screen_transform(host, Matrix::new(a, b, c, d, e, f))
            .map_err(to_js)
    }

    // ─── Pointer input ───────────────────────────────────────────────────
    //
    // Each handler returns `true` when the default action should be
    // prevented.

    pub fn handle_pointer_down(
        &mut self,
        client_x: f64,
        client_y: f64,
        screen_x: f64,
        screen_y: f64,
    ) -> Result<bool, JsValue> {
        let p = pointer(client_x, client_y, screen_x, screen_y);
        Ok(self.page.pointer_down(p).map_err(to_js)?.default_prevented)
    }

    pub fn handle_pointer_move(
        &mut self,
        client_x: f64,
        client_y: f64,
        screen_x: f64,
        screen_y: f64,
    ) -> Result<bool, JsValue> {
        let p = pointer(client_x, client_y, screen_x, screen_y);
        Ok(self.page.pointer_move(p).map_err(to_js)?.default_prevented)
    }

    pub fn handle_pointer_up(
        &mut self,
        client_x: f64,
        client_y: f64,
        screen_x: f64,
        screen_y: f64,
    ) -> Result<bool, JsValue> {
        let p = pointer(client_x, client_y, screen_x, screen_y);
        Ok(self.page.pointer_up(p).map_err(to_js)?.default_prevented)
    }

    pub fn handle_pointer_leave(&mut self, index: usize) -> Result<bool, JsValue> {
        let host = self.canvas_host(index)?;
        let state = self
            .page
            .pointer_leave(host, PointerData::default())
            .map_err(to_js)?;
        Ok(state.default_prevented)
    }

    pub fn handle_wheel(
        &mut self,
        client_x: f64,
        client_y: f64,
        delta_y: f64,
    ) -> Result<bool, JsValue> {
        let p = PointerData::at(client_x, client_y);
        Ok(self.page.wheel(p, delta_y).map_err(to_js)?.default_prevented)
    }

    pub fn handle_double_click(&mut self, client_x: f64, client_y: f64) -> Result<bool, JsValue> {
        let p = PointerData::at(client_x, client_y);
        Ok(self.page.double_click(p).map_err(to_js)?.default_prevented)
    }

    // ─── Controls ────────────────────────────────────────────────────────

    /// Click one of the canvas controls by its id.
    pub fn click_button(&mut self, index: usize, id: &str) -> Result<(), JsValue> {
        let host = self.canvas_host(index)?;
        self.page.click_button(host, id).map_err(to_js)?;
        Ok(())
    }

    pub fn zoom_in(&mut self, index: usize) -> Result<(), JsValue> {
        self.click_button(index, "zoom-in")
    }

    pub fn zoom_out(&mut self, index: usize) -> Result<(), JsValue> {
        self.click_button(index, "zoom-out")
    }

    pub fn zoom_reset(&mut self, index: usize) -> Result<(), JsValue> {
        self.click_button(index, "zoom-reset")
    }

    pub fn center(&mut self, index: usize) -> Result<(), JsValue> {
        self.click_button(index, "center")
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Insert a `wf-state` or `wf-task` into canvas `index`.
    pub fn add_node(
        &mut self,
        index: usize,
        tag: &str,
        id: &str,
        label: &str,
    ) -> Result<(), JsValue> {
        let host = self.canvas_host(index)?;
        self.page
            .insert(host, html(tag, [("id", id)], vec![text(label)]))
            .map_err(to_js)?;
        Ok(())
    }

    pub fn remove_node(&mut self, id: &str) -> Result<(), JsValue> {
        let host = self
            .page
            .node_by_id(id)
            .map(|n| n.host())
            .ok_or_else(|| to_js(WfError::UnknownElement))?;
        self.page.remove(host).map_err(to_js)
    }

    /// Attached nodes as a JSON array of `{id, type, selected, transform}`.
    pub fn node_states_json(&self) -> String {
        serde_json::to_string(&node_states(&self.page)).unwrap_or_else(|_| "[]".to_string())
    }
}

// ─── Private helpers ─────────────────────────────────────────────────────

impl WfEditor {
    fn canvas_host(&self, index: usize) -> Result<NodeIndex, JsValue> {
        self.page
            .canvas_hosts()
            .get(index)
            .copied()
            .ok_or_else(|| to_js(WfError::UnknownElement))
    }
}

fn pointer(client_x: f64, client_y: f64, screen_x: f64, screen_y: f64) -> PointerData {
    PointerData {
        client: (client_x, client_y).into(),
        screen: (screen_x, screen_y).into(),
    }
}

fn parse_config(json: Option<&str>) -> Result<GraphConfig, WfError> {
    match json {
        None => Ok(GraphConfig::default()),
        Some(json) if json.trim().is_empty() => Ok(GraphConfig::default()),
        Some(json) => {
            let config: GraphConfig =
                serde_json::from_str(json).map_err(|e| WfError::Config(e.to_string()))?;
            config.validate()?;
            Ok(config)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct NodeState {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    selected: bool,
    transform: Matrix,
}

fn node_states(page: &Page) -> Vec<NodeState> {
    let mut states: Vec<_> = page
        .nodes()
        .filter_map(|node| {
            let id = node.id()?;
            let transform = parse_matrix(page.document().attr(node.group(), "transform")).ok()?;
            Some(NodeState {
                id: id.to_string(),
                kind: node.type_name(),
                selected: node.is_selected(),
                transform,
            })
        })
        .collect();
    states.sort_by(|a, b| a.id.cmp(&b.id));
    states
}

/// `TypeError` for type errors, `Error` otherwise.
fn to_js(e: WfError) -> JsValue {
    let msg = e.to_string();
    match e.kind() {
        ErrorKind::Type => js_sys::TypeError::new(&msg).into(),
        ErrorKind::Error => js_sys::Error::new(&msg).into(),
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("WF WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

/// Default configuration as JSON, for hosts that want to tweak it.
#[wasm_bindgen]
pub fn default_config_json() -> String {
    serde_json::to_string(&GraphConfig::default()).unwrap_or_else(|_| "{}".to_string())
}
