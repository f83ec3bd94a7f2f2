//! Host side of the Lua scripting bridge.
//!
//! `ScriptHost` owns the interpreter and installs the `buffer`, `editor`,
//! `syntax`, and `window` namespaces as globals. The editor lives behind an
//! `Rc<RefCell<EditorState>>` stored in the interpreter's app-data slot;
//! every API function borrows it only for the duration of the call, so
//! script callbacks invoked by the host (key actions, gutter cells, custom
//! renderers, window hooks) can call back into the API freely.
//!
//! Script runtime errors never propagate: the text lands in the Lua global
//! `_LAST_ERROR`, the host returns a failure status, and the event loop
//! carries on.

mod buffer_api;
mod editor_api;
pub mod keycodes;
mod syntax_api;
mod window_api;

use anyhow::{Context, Result, anyhow};
use core_input::KeyInput;
use core_model::{Leaf, LeafContent, Rect};
use core_render::{DrawOp, RenderHooks};
use core_state::EditorState;
use mlua::{Function, Lua, RegistryKey, Table, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

pub type SharedEditor = Rc<RefCell<EditorState>>;

/// Global the bridge stores the last script error text in.
pub const LAST_ERROR_GLOBAL: &str = "_LAST_ERROR";
/// Global function queried for the two-column gutter cell.
pub const GUTTER_RENDERER_GLOBAL: &str = "_gutter_renderer";

/// Draw target active while a custom renderer runs; `window.draw_text`
/// appends to it.
pub(crate) struct DrawSurface {
    pub rect: Rect,
    pub ops: Vec<DrawOp>,
}

/// Host-side registries for plugin-supplied values, keyed by name or
/// reference id. Lua values are pinned through registry keys owned here.
pub(crate) struct HostRegistry {
    next_data: u32,
    pub(crate) data: HashMap<u32, RegistryKey>,
    pub(crate) renderers: HashMap<String, RegistryKey>,
    pub(crate) layouts: HashMap<String, RegistryKey>,
    pub(crate) hooks: HashMap<String, Vec<RegistryKey>>,
}

impl HostRegistry {
    fn new() -> Self {
        Self {
            // 0 is the null data reference (restored sessions start there).
            next_data: 1,
            data: HashMap::new(),
            renderers: HashMap::new(),
            layouts: HashMap::new(),
            hooks: HashMap::new(),
        }
    }

    pub(crate) fn store_data(&mut self, key: RegistryKey) -> u32 {
        let id = self.next_data;
        self.next_data += 1;
        self.data.insert(id, key);
        id
    }

    pub(crate) fn set_renderer(&mut self, name: String, key: RegistryKey) {
        self.renderers.insert(name, key);
    }

    pub(crate) fn set_layout(&mut self, name: String, key: RegistryKey) {
        self.layouts.insert(name, key);
    }

    pub(crate) fn add_hook(&mut self, event: &str, key: RegistryKey) {
        self.hooks.entry(event.to_string()).or_default().push(key);
    }
}

pub(crate) type SharedRegistry = Rc<RefCell<HostRegistry>>;
pub(crate) type SharedDraw = Rc<RefCell<Option<DrawSurface>>>;

/// Borrow the editor out of the interpreter's app-data slot for the span of
/// one API call. Re-entrant borrows (a hook mutating mid-render-plan) fail
/// as a script error instead of poisoning the host.
pub(crate) fn with_editor<R>(
    lua: &Lua,
    f: impl FnOnce(&mut EditorState) -> mlua::Result<R>,
) -> mlua::Result<R> {
    let shared = lua
        .app_data_ref::<SharedEditor>()
        .ok_or_else(|| mlua::Error::runtime("editor not attached to interpreter"))?;
    let mut editor = shared
        .try_borrow_mut()
        .map_err(|_| mlua::Error::runtime("editor state is busy"))?;
    f(&mut editor)
}

pub(crate) fn note_error(lua: &Lua, err: &mlua::Error) {
    warn!(target: "script.host", error = %err, "script_error");
    let _ = lua.globals().set(LAST_ERROR_GLOBAL, err.to_string());
}

/// Call every hook registered for `event` with `(window, previous)`. The
/// hook list is restored before the calls so a hook may register further
/// hooks without losing them.
pub(crate) fn fire_hooks(lua: &Lua, reg: &SharedRegistry, event: &str, window: u64, previous: u64) {
    let keys: Vec<RegistryKey> = {
        let mut reg = reg.borrow_mut();
        let Some(hooks) = reg.hooks.get_mut(event) else {
            return;
        };
        std::mem::take(hooks)
    };
    let mut callable = Vec::new();
    for key in &keys {
        if let Ok(f) = lua.registry_value::<Function>(key) {
            callable.push(f);
        }
    }
    reg.borrow_mut()
        .hooks
        .entry(event.to_string())
        .or_default()
        .splice(0..0, keys);
    for f in callable {
        if let Err(e) = f.call::<()>((window, previous)) {
            note_error(lua, &e);
        }
    }
}

pub struct ScriptHost {
    lua: Lua,
    editor: SharedEditor,
    reg: SharedRegistry,
    draw: SharedDraw,
}

impl ScriptHost {
    pub fn new(editor: SharedEditor) -> Result<Self> {
        let lua = Lua::new();
        lua.set_app_data::<SharedEditor>(editor.clone());
        let reg: SharedRegistry = Rc::new(RefCell::new(HostRegistry::new()));
        let draw: SharedDraw = Rc::new(RefCell::new(None));

        buffer_api::install(&lua).context("install buffer namespace")?;
        editor_api::install(&lua).context("install editor namespace")?;
        syntax_api::install(&lua).context("install syntax namespace")?;
        window_api::install(&lua, &reg, &draw).context("install window namespace")?;

        Ok(Self {
            lua,
            editor,
            reg,
            draw,
        })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn editor(&self) -> &SharedEditor {
        &self.editor
    }

    /// Run a chunk of script source. Errors are captured, not propagated as
    /// panics; the returned error carries the message for status display.
    pub fn exec(&self, code: &str) -> Result<()> {
        match self.lua.load(code).exec() {
            Ok(()) => Ok(()),
            Err(e) => {
                note_error(&self.lua, &e);
                Err(anyhow!(e.to_string()))
            }
        }
    }

    /// Load and execute a plugin file. Non-fatal on failure.
    pub fn load_plugin(&self, path: &Path) -> Result<()> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("read plugin {}", path.display()))?;
        match self
            .lua
            .load(&source)
            .set_name(path.display().to_string())
            .exec()
        {
            Ok(()) => {
                debug!(target: "script.host", path = %path.display(), "plugin_loaded");
                Ok(())
            }
            Err(e) => {
                note_error(&self.lua, &e);
                Err(anyhow!("plugin {}: {e}", path.display()))
            }
        }
    }

    /// Resolution chain for user init scripts: `./init.lua`, then
    /// `<config>/scrawl/init.lua`. Returns how many loaded; failures are
    /// non-fatal.
    pub fn load_init_scripts(&self) -> usize {
        let mut candidates = vec![PathBuf::from("./init.lua")];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("scrawl").join("init.lua"));
        }
        let mut loaded = 0;
        for path in candidates {
            if !path.exists() {
                continue;
            }
            if self.load_plugin(&path).is_ok() {
                loaded += 1;
                // First hit wins; a local init.lua shadows the config dir.
                break;
            }
        }
        loaded
    }

    /// Invoke a keymap action: a function looked up by name in the global
    /// scope. Returns false when the name is unbound or the call errored.
    pub fn call_action(&self, name: &str) -> bool {
        let func: Function = match self.lua.globals().get(name) {
            Ok(f) => f,
            Err(_) => {
                warn!(target: "script.host", action = name, "action_missing");
                return false;
            }
        };
        match func.call::<()>(()) {
            Ok(()) => true,
            Err(e) => {
                note_error(&self.lua, &e);
                false
            }
        }
    }

    /// Fire `on_create` / `on_focus` / `on_close` / `on_resize` hooks with
    /// `(window_id, previous_window_id)`.
    pub fn fire_window_event(&self, event: &str, window: u64, previous: u64) {
        fire_hooks(&self.lua, &self.reg, event, window, previous);
    }

    /// Offer a key to a custom leaf's `on_key` handler. True when the
    /// script consumed it.
    pub fn custom_on_key(&self, renderer: &str, data: u32, key: KeyInput) -> bool {
        let reg = self.reg.borrow();
        let Some(table_key) = reg.renderers.get(renderer) else {
            return false;
        };
        let Ok(table) = self.lua.registry_value::<Table>(table_key) else {
            return false;
        };
        let data_value = reg
            .data
            .get(&data)
            .and_then(|k| self.lua.registry_value::<Value>(k).ok())
            .unwrap_or(Value::Nil);
        drop(reg);
        let Ok(on_key) = table.get::<Function>("on_key") else {
            return false;
        };
        match on_key.call::<bool>((data_value, keycodes::code_from_key(key.key))) {
            Ok(handled) => handled,
            Err(e) => {
                note_error(&self.lua, &e);
                false
            }
        }
    }

    /// Release the opaque data reference of a closed custom leaf.
    pub fn release_leaf(&self, leaf: &Leaf) {
        if let LeafContent::Custom { data, .. } = &leaf.content {
            if let Some(key) = self.reg.borrow_mut().data.remove(data) {
                let _ = self.lua.remove_registry_value(key);
                debug!(target: "script.host", data = *data, "leaf_data_released");
            }
        }
    }

    /// Most recent captured script error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.lua.globals().get::<Option<String>>(LAST_ERROR_GLOBAL).ok()?
    }
}

impl RenderHooks for ScriptHost {
    fn gutter_cell(&self, file_row: usize) -> Option<String> {
        let func: Function = self.lua.globals().get(GUTTER_RENDERER_GLOBAL).ok()?;
        match func.call::<Option<String>>(file_row as i64) {
            Ok(cell) => cell,
            Err(e) => {
                note_error(&self.lua, &e);
                None
            }
        }
    }

    fn render_custom(&self, renderer: &str, data: u32, rect: Rect) -> Vec<DrawOp> {
        let (render_fn, data_value) = {
            let reg = self.reg.borrow();
            let Some(table_key) = reg.renderers.get(renderer) else {
                return Vec::new();
            };
            let Ok(table) = self.lua.registry_value::<Table>(table_key) else {
                return Vec::new();
            };
            let Ok(render_fn) = table.get::<Function>("render") else {
                return Vec::new();
            };
            let data_value = reg
                .data
                .get(&data)
                .and_then(|k| self.lua.registry_value::<Value>(k).ok())
                .unwrap_or(Value::Nil);
            (render_fn, data_value)
        };

        *self.draw.borrow_mut() = Some(DrawSurface {
            rect,
            ops: Vec::new(),
        });
        let result = render_fn.call::<()>((data_value, rect.x, rect.y, rect.w, rect.h));
        if let Err(e) = result {
            note_error(&self.lua, &e);
        }
        self.draw
            .borrow_mut()
            .take()
            .map(|s| s.ops)
            .unwrap_or_default()
    }
}
