#![forbid(unsafe_code)]

//! Browser backend and `wasm-bindgen` exports.
//!
//! [`WebBackend`] implements [`ShellBackend`] over `window.history`,
//! `localStorage` and the overlay container. [`ShellApp`] wraps a
//! [`ShellCore`] with JS-friendly methods and owns the `popstate` and click
//! listeners. Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use js_sys::{Function, JSON, Promise, Reflect};
use navstack_core::{
    HistoryRecord, HostHistory, KeyValueStore, MountHandle, OverlayId, OverlaySpec,
    OverlaySurface, PageRenderer, Route, ShellBackend, StorageError, SystemClock,
};
use navstack_runtime::Activation;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, History, HtmlElement, PopStateEvent, Storage, Window};

use crate::config::{DomConfig, WebShellConfig};
use crate::markup::{OPEN_CLASS, overlay_inner_html};
use crate::shell_core::{ShellCore, activation_json, decode_state, pop_outcome_json};

fn console_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

/// Serialize a JS state value to JSON text; `None` for null / undefined.
fn state_text(state: &JsValue) -> Option<String> {
    if state.is_null() || state.is_undefined() {
        return None;
    }
    JSON::stringify(state).ok().map(String::from)
}

fn js_error_name(err: &JsValue) -> Option<String> {
    Reflect::get(err, &JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string())
}

// ============================================================================
// History
// ============================================================================

/// `window.history` with records stored as plain JSON objects.
pub struct BrowserHistory {
    history: History,
}

impl BrowserHistory {
    fn state_of(record: &HistoryRecord) -> Option<JsValue> {
        match JSON::parse(&record.to_json()) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(error = ?err, "history record not encodable");
                None
            }
        }
    }
}

impl HostHistory for BrowserHistory {
    fn push(&mut self, record: &HistoryRecord) {
        let Some(state) = Self::state_of(record) else {
            return;
        };
        if let Err(err) = self.history.push_state(&state, "") {
            tracing::warn!(error = ?err, "history.pushState failed");
        }
    }

    fn replace(&mut self, record: &HistoryRecord) {
        let Some(state) = Self::state_of(record) else {
            return;
        };
        if let Err(err) = self.history.replace_state(&state, "") {
            tracing::warn!(error = ?err, "history.replaceState failed");
        }
    }

    fn current(&self) -> Option<HistoryRecord> {
        let state = self.history.state().ok()?;
        decode_state(state_text(&state).as_deref())
    }
}

// ============================================================================
// Storage
// ============================================================================

/// `window.localStorage`, absent in some privacy modes.
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        storage
            .get_item(key)
            .map_err(|err| StorageError::Backend(format!("{err:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        storage.set_item(key, value).map_err(|err| {
            if js_error_name(&err).as_deref() == Some("QuotaExceededError") {
                StorageError::QuotaExceeded
            } else {
                StorageError::Backend(format!("{err:?}"))
            }
        })
    }
}

// ============================================================================
// Overlay surface
// ============================================================================

/// Mounts overlays into the container element and toggles the backdrop.
pub struct DomSurface {
    document: Document,
    dom: DomConfig,
    mounted: HashMap<MountHandle, Element>,
}

impl DomSurface {
    fn element(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn set_chrome(&self, open: bool) {
        let Some(overlay) = self.element(&self.dom.overlay) else {
            tracing::warn!(selector = %self.dom.overlay, "overlay backdrop not found");
            return;
        };
        let classes = overlay.class_list();
        let result = if open {
            classes.add_1(OPEN_CLASS)
        } else {
            classes.remove_1(OPEN_CLASS)
        };
        if let Err(err) = result {
            tracing::warn!(error = ?err, "backdrop class toggle failed");
        }
    }

    fn build(&self, handle: MountHandle, id: &OverlayId, spec: &OverlaySpec) -> Result<Element, JsValue> {
        let element = self.document.create_element("div")?;
        element.set_class_name("modal");
        element.set_attribute("data-overlay-id", id.as_str())?;
        element.set_attribute("data-mount", &handle.get().to_string())?;
        element.set_inner_html(&overlay_inner_html(spec));
        Ok(element)
    }
}

impl OverlaySurface for DomSurface {
    fn show_chrome(&mut self) {
        self.set_chrome(true);
    }

    fn hide_chrome(&mut self) {
        self.set_chrome(false);
    }

    fn mount(&mut self, handle: MountHandle, id: &OverlayId, spec: &OverlaySpec) {
        let Some(container) = self.element(&self.dom.container) else {
            tracing::warn!(selector = %self.dom.container, "overlay container not found");
            return;
        };
        let element = match self.build(handle, id, spec) {
            Ok(element) => element,
            Err(err) => {
                tracing::warn!(overlay_id = %id, error = ?err, "overlay element not created");
                return;
            }
        };
        if let Err(err) = container.append_child(&element) {
            tracing::warn!(overlay_id = %id, error = ?err, "overlay element not attached");
            return;
        }
        // Force a layout so the open class animates in.
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            let _ = html.offset_height();
        }
        let _ = element.class_list().add_1(OPEN_CLASS);
        self.mounted.insert(handle, element);
    }

    fn begin_exit(&mut self, handle: MountHandle) {
        if let Some(element) = self.mounted.get(&handle) {
            let _ = element.class_list().remove_1(OPEN_CLASS);
        }
    }

    fn unmount(&mut self, handle: MountHandle) {
        if let Some(element) = self.mounted.remove(&handle) {
            element.remove();
        }
    }
}

// ============================================================================
// Page renderer
// ============================================================================

/// Calls host-supplied `render(route, view)` / `bind(route, view)` functions
/// and maintains the menu markers and page title.
pub struct JsRenderer {
    document: Document,
    dom: DomConfig,
    render: Option<Function>,
    bind: Option<Function>,
}

impl JsRenderer {
    fn view(&self) -> Option<Element> {
        self.document.query_selector(&self.dom.view).ok().flatten()
    }

    fn call(&self, callback: Option<&Function>, route: &Route, view: &Element) {
        if let Some(callback) = callback
            && let Err(err) = callback.call2(&JsValue::NULL, &JsValue::from_str(route.as_str()), view)
        {
            tracing::warn!(route = %route, error = ?err, "page callback threw");
        }
    }
}

impl PageRenderer for JsRenderer {
    fn render(&mut self, route: &Route) {
        let Some(view) = self.view() else {
            return;
        };
        view.set_inner_html("");
        self.call(self.render.as_ref(), route, &view);
    }

    fn bind(&mut self, route: &Route) {
        let Some(view) = self.view() else {
            return;
        };
        self.call(self.bind.as_ref(), route, &view);
    }

    fn mark_active(&mut self, route: &Route, title: &str) {
        if let Ok(items) = self.document.query_selector_all(&self.dom.nav_item) {
            for i in 0..items.length() {
                let Some(item) = items.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                    continue;
                };
                let active = item.get_attribute(&self.dom.route_attribute).as_deref()
                    == Some(route.as_str());
                let _ = item
                    .class_list()
                    .toggle_with_force(&self.dom.active_class, active);
            }
        }
        if let Ok(Some(heading)) = self.document.query_selector(&self.dom.page_title) {
            heading.set_text_content(Some(title));
        }
    }
}

// ============================================================================
// Backend
// ============================================================================

/// [`ShellBackend`] for the browser main thread.
pub struct WebBackend {
    clock: SystemClock,
    history: BrowserHistory,
    surface: DomSurface,
    renderer: JsRenderer,
    storage: LocalStorage,
}

impl WebBackend {
    fn new(
        window: &Window,
        dom: &DomConfig,
        render: Option<Function>,
        bind: Option<Function>,
    ) -> Result<Self, JsValue> {
        let document = window.document().ok_or("no document")?;
        let storage = match window.local_storage() {
            Ok(storage) => storage,
            Err(err) => {
                tracing::warn!(error = ?err, "localStorage unavailable");
                None
            }
        };
        Ok(Self {
            clock: SystemClock::new(),
            history: BrowserHistory {
                history: window.history()?,
            },
            surface: DomSurface {
                document: document.clone(),
                dom: dom.clone(),
                mounted: HashMap::new(),
            },
            renderer: JsRenderer {
                document,
                dom: dom.clone(),
                render,
                bind,
            },
            storage: LocalStorage { storage },
        })
    }
}

impl ShellBackend for WebBackend {
    type Clock = SystemClock;
    type History = BrowserHistory;
    type Surface = DomSurface;
    type Renderer = JsRenderer;
    type Store = LocalStorage;

    fn clock(&self) -> &Self::Clock {
        &self.clock
    }

    fn history(&self) -> &Self::History {
        &self.history
    }

    fn history_mut(&mut self) -> &mut Self::History {
        &mut self.history
    }

    fn surface_mut(&mut self) -> &mut Self::Surface {
        &mut self.surface
    }

    fn renderer_mut(&mut self) -> &mut Self::Renderer {
        &mut self.renderer
    }

    fn store(&self) -> &Self::Store {
        &self.storage
    }

    fn store_mut(&mut self) -> &mut Self::Store {
        &mut self.storage
    }
}

// ============================================================================
// Exports
// ============================================================================

struct State {
    core: ShellCore<WebBackend>,
    on_action: Option<Function>,
    timer_armed: bool,
}

type Shared = Rc<RefCell<State>>;

/// Arm one timeout for the next pending teardown.
fn schedule_flush(shared: &Shared) {
    let delay = {
        let Ok(mut state) = shared.try_borrow_mut() else {
            return;
        };
        if state.timer_armed {
            return;
        }
        let Some(delay) = state.core.bridge().next_teardown_in() else {
            return;
        };
        state.timer_armed = true;
        delay
    };
    let Some(window) = web_sys::window() else {
        return;
    };
    let weak: Weak<RefCell<State>> = Rc::downgrade(shared);
    let callback = Closure::once_into_js(move || {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        if let Ok(mut state) = shared.try_borrow_mut() {
            state.timer_armed = false;
            state.core.bridge_mut().tick();
        }
        schedule_flush(&shared);
    });
    let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    if let Err(err) =
        window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), ms)
    {
        tracing::warn!(error = ?err, "setTimeout failed; teardown deferred");
        if let Ok(mut state) = shared.try_borrow_mut() {
            state.timer_armed = false;
        }
    }
}

fn busy() -> JsError {
    JsError::new("navstack shell is busy (re-entrant call)")
}

/// Overlay-stack / history synchronizer for one page.
#[wasm_bindgen]
pub struct ShellApp {
    shared: Shared,
    window: Window,
    popstate: Option<Closure<dyn FnMut(Event)>>,
    overlay_click: Option<(Element, Closure<dyn FnMut(Event)>)>,
    sidebar_click: Option<(Element, Closure<dyn FnMut(Event)>)>,
}

#[wasm_bindgen]
impl ShellApp {
    /// Create a shell from JSON configuration (empty string for defaults).
    ///
    /// `render(route, view)` and `bind(route, view)` paint the page.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: &str,
        render: Option<Function>,
        bind: Option<Function>,
    ) -> Result<ShellApp, JsError> {
        install_panic_hook();
        let config = WebShellConfig::from_json_str(config_json)
            .map_err(|err| JsError::new(&err.to_string()))?;
        let window = web_sys::window().ok_or_else(|| JsError::new("no window"))?;
        let backend = WebBackend::new(&window, &config.dom, render, bind)
            .map_err(|err| JsError::new(&format!("backend init failed: {err:?}")))?;
        let shared = Rc::new(RefCell::new(State {
            core: ShellCore::new(backend, config),
            on_action: None,
            timer_armed: false,
        }));
        Ok(Self {
            shared,
            window,
            popstate: None,
            overlay_click: None,
            sidebar_click: None,
        })
    }

    /// Install listeners and enter the persisted-or-default route.
    pub fn start(&mut self) -> Result<String, JsError> {
        self.install_listeners()
            .map_err(|err| JsError::new(&format!("listener install failed: {err:?}")))?;
        let mut state = self.shared.try_borrow_mut().map_err(|_| busy())?;
        Ok(state.core.start().as_str().to_owned())
    }

    /// Open an overlay from a JSON spec; returns its id.
    pub fn open(&self, spec_json: &str) -> Result<String, JsError> {
        let mut state = self.shared.try_borrow_mut().map_err(|_| busy())?;
        let id = state
            .core
            .open_json(spec_json)
            .map_err(|err| JsError::new(&format!("invalid overlay spec: {err}")))?;
        Ok(id.as_str().to_owned())
    }

    /// Close `id`, or the top overlay when omitted.
    pub fn close(&self, id: Option<String>) -> Result<bool, JsError> {
        let closed = {
            let mut state = self.shared.try_borrow_mut().map_err(|_| busy())?;
            let id = id.map(OverlayId::new);
            state.core.bridge_mut().close(id.as_ref())
        };
        schedule_flush(&self.shared);
        Ok(closed)
    }

    #[wasm_bindgen(js_name = closeTop)]
    pub fn close_top(&self) -> Result<bool, JsError> {
        let closed = {
            let mut state = self.shared.try_borrow_mut().map_err(|_| busy())?;
            state.core.bridge_mut().close_top()
        };
        schedule_flush(&self.shared);
        Ok(closed)
    }

    #[wasm_bindgen(js_name = closeAll)]
    pub fn close_all(&self) -> Result<u32, JsError> {
        let closed = {
            let mut state = self.shared.try_borrow_mut().map_err(|_| busy())?;
            state.core.bridge_mut().close_all()
        };
        schedule_flush(&self.shared);
        Ok(u32::try_from(closed).unwrap_or(u32::MAX))
    }

    /// Two-button dialog; the promise resolves to the choice.
    pub fn confirm(&self, title: &str, message: &str) -> Result<Promise, JsError> {
        let future = {
            let mut state = self.shared.try_borrow_mut().map_err(|_| busy())?;
            state.core.confirm(title, message)
        };
        Ok(wasm_bindgen_futures::future_to_promise(async move {
            Ok(JsValue::from_bool(future.await))
        }))
    }

    pub fn navigate(&self, route: &str) -> Result<bool, JsError> {
        let mut state = self.shared.try_borrow_mut().map_err(|_| busy())?;
        Ok(state.core.bridge_mut().navigate(route))
    }

    #[wasm_bindgen(js_name = switchRoute)]
    pub fn switch_route(&self, route: &str) -> Result<bool, JsError> {
        let switched = {
            let mut state = self.shared.try_borrow_mut().map_err(|_| busy())?;
            state.core.bridge_mut().switch_route(route)
        };
        schedule_flush(&self.shared);
        Ok(switched)
    }

    #[wasm_bindgen(js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.shared
            .try_borrow()
            .is_ok_and(|state| state.core.bridge().is_open())
    }

    pub fn count(&self) -> u32 {
        self.shared.try_borrow().map_or(0, |state| {
            u32::try_from(state.core.bridge().count()).unwrap_or(u32::MAX)
        })
    }

    #[wasm_bindgen(js_name = topId)]
    pub fn top_id(&self) -> Option<String> {
        let state = self.shared.try_borrow().ok()?;
        state
            .core
            .bridge()
            .peek_top()
            .map(|entry| entry.id.as_str().to_owned())
    }

    #[wasm_bindgen(js_name = currentRoute)]
    pub fn current_route(&self) -> Option<String> {
        let state = self.shared.try_borrow().ok()?;
        state
            .core
            .bridge()
            .current_route()
            .map(|route| route.as_str().to_owned())
    }

    /// Register `handler(id, tag)` for application button actions.
    #[wasm_bindgen(js_name = onAction)]
    pub fn on_action(&self, handler: Option<Function>) -> Result<(), JsError> {
        let mut state = self.shared.try_borrow_mut().map_err(|_| busy())?;
        state.on_action = handler;
        Ok(())
    }

    /// Debug snapshot as JSON text.
    pub fn snapshot(&self) -> String {
        self.shared
            .try_borrow()
            .map(|state| state.core.snapshot_json())
            .unwrap_or_default()
    }

    /// Remove listeners. The instance is inert afterwards.
    pub fn destroy(&mut self) {
        if let Some(popstate) = self.popstate.take() {
            let _ = self
                .window
                .remove_event_listener_with_callback("popstate", popstate.as_ref().unchecked_ref());
        }
        for (element, closure) in [self.overlay_click.take(), self.sidebar_click.take()]
            .into_iter()
            .flatten()
        {
            let _ = element
                .remove_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        }
    }
}

impl ShellApp {
    fn install_listeners(&mut self) -> Result<(), JsValue> {
        if self.popstate.is_some() {
            return Ok(());
        }
        let dom = self
            .shared
            .try_borrow()
            .map_err(|_| JsValue::from_str("busy"))?
            .core
            .config()
            .dom
            .clone();
        let document = self.window.document().ok_or("no document")?;

        let shared = Rc::clone(&self.shared);
        let popstate = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let state_json = event
                .dyn_ref::<PopStateEvent>()
                .and_then(|pop| state_text(&pop.state()));
            let outcome = match shared.try_borrow_mut() {
                Ok(mut state) => state.core.pop(state_json.as_deref()),
                Err(_) => {
                    tracing::warn!("popstate during shell call; dropped");
                    return;
                }
            };
            tracing::trace!(outcome = %pop_outcome_json(&outcome), "popstate handled");
            schedule_flush(&shared);
        });
        self.window
            .add_event_listener_with_callback("popstate", popstate.as_ref().unchecked_ref())?;
        self.popstate = Some(popstate);

        if let Some(container) = document.query_selector(&dom.container)? {
            let shared = Rc::clone(&self.shared);
            let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                handle_overlay_click(&shared, &event);
            });
            container.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            self.overlay_click = Some((container, closure));
        }

        if let Some(sidebar) = document.query_selector(&dom.sidebar)? {
            let shared = Rc::clone(&self.shared);
            let nav_item = dom.nav_item.clone();
            let route_attribute = dom.route_attribute.clone();
            let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                event.prevent_default();
                let route = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|t| t.closest(&nav_item).ok().flatten())
                    .and_then(|item| item.get_attribute(&route_attribute));
                let Some(route) = route.filter(|r| !r.is_empty()) else {
                    return;
                };
                if let Ok(mut state) = shared.try_borrow_mut() {
                    state.core.bridge_mut().switch_route(route);
                }
                schedule_flush(&shared);
            });
            sidebar.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            self.sidebar_click = Some((sidebar, closure));
        }
        Ok(())
    }
}

fn handle_overlay_click(shared: &Shared, event: &Event) {
    let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return;
    };
    let Some(actionable) = target.closest("[data-action]").ok().flatten() else {
        return;
    };
    let Some(overlay_id) = actionable
        .closest("[data-overlay-id]")
        .ok()
        .flatten()
        .and_then(|modal| modal.get_attribute("data-overlay-id"))
    else {
        return;
    };
    let action = actionable.get_attribute("data-action");
    let index = actionable.get_attribute("data-index");

    let (activation, handler) = match shared.try_borrow_mut() {
        Ok(mut state) => {
            let activation = state
                .core
                .click(&overlay_id, action.as_deref(), index.as_deref());
            (activation, state.on_action.clone())
        }
        Err(_) => return,
    };
    tracing::trace!(activation = %activation_json(&activation), "overlay click");

    if let (Activation::Action { id, tag }, Some(handler)) = (&activation, handler) {
        if let Err(err) = handler.call2(
            &JsValue::NULL,
            &JsValue::from_str(id.as_str()),
            &JsValue::from_str(tag.as_str()),
        ) {
            tracing::warn!(overlay_id = %id, error = ?err, "action handler threw");
        }
    }
    schedule_flush(shared);
}

impl Drop for ShellApp {
    fn drop(&mut self) {
        self.destroy();
    }
}
