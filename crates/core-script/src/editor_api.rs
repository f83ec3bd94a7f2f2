//! The `editor` namespace: lifecycle, status messages, key bindings, plugin
//! and configuration loading, plus the key/modifier constant tables.

use crate::keycodes::{self, key_from_code};
use crate::{note_error, with_editor};
use core_input::KeyInput;
use mlua::{Lua, Result as LuaResult, Value};
use std::path::PathBuf;

/// Scripts may pass a key as its integer code or as a one-character string.
fn key_from_value(value: &Value) -> Option<core_input::Key> {
    match value {
        Value::Integer(code) => key_from_code(*code),
        Value::Number(code) => key_from_code(*code as i64),
        Value::String(s) => {
            let bytes = s.as_bytes();
            if bytes.len() == 1 {
                key_from_code(i64::from(bytes[0]))
            } else {
                None
            }
        }
        _ => None,
    }
}

pub(crate) fn install(lua: &Lua) -> LuaResult<()> {
    let t = lua.create_table()?;

    t.set(
        "quit",
        lua.create_function(|lua, ()| {
            with_editor(lua, |ed| {
                ed.quit();
                Ok(())
            })
        })?,
    )?;

    t.set(
        "message",
        lua.create_function(|lua, msg: String| {
            with_editor(lua, |ed| {
                ed.set_status(msg);
                Ok(())
            })
        })?,
    )?;

    t.set(
        "bind_key",
        lua.create_function(
            |lua, (key, modifiers, action): (Value, Option<i64>, String)| {
                let Some(key) = key_from_value(&key) else {
                    return Err(mlua::Error::runtime("bind_key: unknown key"));
                };
                let mods = keycodes::mods_from_mask(modifiers.unwrap_or(0));
                with_editor(lua, |ed| {
                    ed.keymap.bind(KeyInput { key, mods }, action.clone());
                    Ok(())
                })
            },
        )?,
    )?;

    t.set(
        "unbind_key",
        lua.create_function(|lua, (key, modifiers): (Value, Option<i64>)| {
            let Some(key) = key_from_value(&key) else {
                return Ok(false);
            };
            let mods = keycodes::mods_from_mask(modifiers.unwrap_or(0));
            with_editor(lua, |ed| Ok(ed.keymap.unbind(&KeyInput { key, mods })))
        })?,
    )?;

    t.set(
        "load_plugin",
        lua.create_function(|lua, path: String| {
            let source = match std::fs::read_to_string(&path) {
                Ok(s) => s,
                Err(e) => {
                    let err = mlua::Error::runtime(format!("load_plugin {path}: {e}"));
                    note_error(lua, &err);
                    return Ok(false);
                }
            };
            match lua.load(&source).set_name(path).exec() {
                Ok(()) => Ok(true),
                Err(e) => {
                    note_error(lua, &e);
                    Ok(false)
                }
            }
        })?,
    )?;

    t.set(
        "load_config",
        lua.create_function(|lua, path: Option<String>| {
            let cfg = match core_config::load_from(path.map(PathBuf::from)) {
                Ok(cfg) => cfg,
                Err(_) => return Ok(false),
            };
            with_editor(lua, |ed| {
                ed.options = core_state::EditorOptions::from(&cfg);
                ed.set_status("configuration loaded");
                Ok(true)
            })
        })?,
    )?;

    let kmod = lua.create_table()?;
    kmod.set("NONE", 0)?;
    kmod.set("CTRL", 1)?;
    kmod.set("ALT", 2)?;
    kmod.set("SHIFT", 4)?;
    t.set("KMOD", kmod)?;

    let key = lua.create_table()?;
    key.set("TAB", keycodes::KEY_TAB)?;
    key.set("ENTER", keycodes::KEY_ENTER)?;
    key.set("ESC", keycodes::KEY_ESC)?;
    key.set("BACKSPACE", keycodes::KEY_BACKSPACE)?;
    key.set("LEFT", keycodes::KEY_ARROW_LEFT)?;
    key.set("RIGHT", keycodes::KEY_ARROW_RIGHT)?;
    key.set("UP", keycodes::KEY_ARROW_UP)?;
    key.set("DOWN", keycodes::KEY_ARROW_DOWN)?;
    key.set("DELETE", keycodes::KEY_DELETE)?;
    key.set("HOME", keycodes::KEY_HOME)?;
    key.set("END", keycodes::KEY_END)?;
    key.set("PAGE_UP", keycodes::KEY_PAGE_UP)?;
    key.set("PAGE_DOWN", keycodes::KEY_PAGE_DOWN)?;
    t.set("KEY", key)?;

    lua.globals().set("editor", t)?;
    Ok(())
}
