//! The `window` namespace: focus, splits, custom content, layouts, session
//! save/restore, and event hooks.

use crate::{SharedDraw, SharedRegistry, fire_hooks, with_editor};
use core_model::{LeafContent, Orientation, session};
use core_render::DrawOp;
use core_state::EditorState;
use core_text::Buffer;
use mlua::{Function, Lua, Result as LuaResult, Table, Value};
use std::path::Path;
use tracing::debug;

fn parse_orientation(s: &str) -> Option<Orientation> {
    match s {
        "h" | "horizontal" => Some(Orientation::Horizontal),
        "v" | "vertical" => Some(Orientation::Vertical),
        _ => None,
    }
}

pub(crate) fn install(lua: &Lua, reg: &SharedRegistry, draw: &SharedDraw) -> LuaResult<()> {
    let t = lua.create_table()?;

    t.set(
        "current",
        lua.create_function(|lua, ()| {
            with_editor(lua, |ed| Ok(ed.tabs.active_leaf_id() as i64))
        })?,
    )?;

    t.set(
        "list",
        lua.create_function(|lua, ()| {
            with_editor(lua, |ed| {
                Ok(ed.tabs
                    .active_tab()
                    .tree
                    .leaves()
                    .iter()
                    .map(|l| l.id as i64)
                    .collect::<Vec<_>>())
            })
        })?,
    )?;

    t.set(
        "count",
        lua.create_function(|lua, ()| {
            with_editor(lua, |ed| Ok(ed.tabs.active_tab().tree.leaf_count() as i64))
        })?,
    )?;

    t.set(
        "get_info",
        lua.create_function(|lua, id: i64| {
            let info = with_editor(lua, |ed| {
                let active = ed.tabs.active_leaf_id();
                Ok(ed.tabs.active_tab().tree.find(id.max(0) as u64).map(|leaf| {
                    (
                        leaf.id,
                        leaf.rect,
                        leaf.id == active,
                        leaf.content.clone(),
                    )
                }))
            })?;
            let Some((id, rect, focused, content)) = info else {
                return Ok(Value::Nil);
            };
            let out = lua.create_table()?;
            out.set("id", id)?;
            out.set("x", rect.x)?;
            out.set("y", rect.y)?;
            out.set("width", rect.w)?;
            out.set("height", rect.h)?;
            out.set("focused", focused)?;
            match content {
                LeafContent::Buffer(idx) => out.set("buffer", idx)?,
                LeafContent::Custom { renderer, data } => {
                    out.set("renderer", renderer)?;
                    out.set("data", data)?;
                }
            }
            Ok(Value::Table(out))
        })?,
    )?;

    {
        let reg = reg.clone();
        t.set(
            "next",
            lua.create_function(move |lua, ()| {
                let moved = with_editor(lua, |ed| {
                    let prev = ed.tabs.active_leaf_id();
                    Ok(ed.focus_next().map(|id| (id, prev)))
                })?;
                if let Some((id, prev)) = moved {
                    fire_hooks(lua, &reg, "on_focus", id, prev);
                    return Ok(Some(id as i64));
                }
                Ok(None)
            })?,
        )?;
    }

    {
        let reg = reg.clone();
        t.set(
            "prev",
            lua.create_function(move |lua, ()| {
                let moved = with_editor(lua, |ed| {
                    let prev = ed.tabs.active_leaf_id();
                    Ok(ed.focus_prev().map(|id| (id, prev)))
                })?;
                if let Some((id, prev)) = moved {
                    fire_hooks(lua, &reg, "on_focus", id, prev);
                    return Ok(Some(id as i64));
                }
                Ok(None)
            })?,
        )?;
    }

    {
        let reg = reg.clone();
        t.set(
            "focus",
            lua.create_function(move |lua, id: i64| {
                let moved = with_editor(lua, |ed| {
                    let prev = ed.tabs.active_leaf_id();
                    if id >= 0 && ed.tabs.set_active_leaf(id as u64) {
                        Ok(Some((id as u64, prev)))
                    } else {
                        Ok(None)
                    }
                })?;
                if let Some((id, prev)) = moved {
                    fire_hooks(lua, &reg, "on_focus", id, prev);
                    return Ok(true);
                }
                Ok(false)
            })?,
        )?;
    }

    {
        let reg = reg.clone();
        t.set(
            "focus_direction",
            lua.create_function(move |lua, dir: String| {
                let moved = with_editor(lua, |ed| {
                    let prev = ed.tabs.active_leaf_id();
                    Ok(ed.focus_direction(&dir).map(|id| (id, prev)))
                })?;
                if let Some((id, prev)) = moved {
                    fire_hooks(lua, &reg, "on_focus", id, prev);
                    return Ok(true);
                }
                Ok(false)
            })?,
        )?;
    }

    {
        let reg = reg.clone();
        t.set(
            "split",
            lua.create_function(move |lua, orientation: Option<String>| {
                let orientation = orientation
                    .as_deref()
                    .and_then(parse_orientation)
                    .unwrap_or(Orientation::Horizontal);
                let created = with_editor(lua, |ed| {
                    let prev = ed.tabs.active_leaf_id();
                    Ok(ed.split_active(orientation).map(|id| (id, prev)))
                })?;
                if let Some((id, prev)) = created {
                    fire_hooks(lua, &reg, "on_create", id, prev);
                    return Ok(Some(id as i64));
                }
                Ok(None)
            })?,
        )?;
    }

    {
        let reg = reg.clone();
        t.set(
            "close",
            lua.create_function(move |lua, ()| {
                let closed = with_editor(lua, |ed| Ok(ed.close_active_leaf()))?;
                let Some(leaf) = closed else {
                    return Ok(false);
                };
                if let LeafContent::Custom { data, .. } = &leaf.content {
                    if let Some(key) = reg.borrow_mut().data.remove(data) {
                        let _ = lua.remove_registry_value(key);
                    }
                }
                let now = with_editor(lua, |ed| Ok(ed.tabs.active_leaf_id()))?;
                fire_hooks(lua, &reg, "on_close", leaf.id, now);
                Ok(true)
            })?,
        )?;
    }

    {
        let reg = reg.clone();
        t.set(
            "only",
            lua.create_function(move |lua, ()| {
                let released = with_editor(lua, |ed| Ok(ed.only_active_leaf()))?;
                let kept = with_editor(lua, |ed| Ok(ed.tabs.active_leaf_id()))?;
                for leaf in &released {
                    if let LeafContent::Custom { data, .. } = &leaf.content {
                        if let Some(key) = reg.borrow_mut().data.remove(data) {
                            let _ = lua.remove_registry_value(key);
                        }
                    }
                    fire_hooks(lua, &reg, "on_close", leaf.id, kept);
                }
                Ok(released.len() as i64)
            })?,
        )?;
    }

    t.set(
        "swap",
        lua.create_function(|lua, (a, b): (i64, i64)| {
            with_editor(lua, |ed| {
                if a < 0 || b < 0 {
                    return Ok(false);
                }
                Ok(ed.tabs.active_tab_mut().tree.swap(a as u64, b as u64))
            })
        })?,
    )?;

    t.set(
        "set_split_ratio",
        lua.create_function(|lua, ratio: f64| {
            with_editor(lua, |ed| {
                let id = ed.tabs.active_leaf_id();
                Ok(ed.tabs.active_tab_mut().tree.set_ratio(id, ratio as f32))
            })
        })?,
    )?;

    t.set(
        "equalize",
        lua.create_function(|lua, ()| {
            with_editor(lua, |ed| {
                ed.tabs.active_tab_mut().tree.equalize();
                Ok(())
            })
        })?,
    )?;

    t.set(
        "resize",
        lua.create_function(|lua, delta: f64| {
            with_editor(lua, |ed| {
                let id = ed.tabs.active_leaf_id();
                Ok(ed.tabs
                    .active_tab_mut()
                    .tree
                    .resize_relative(id, delta as f32))
            })
        })?,
    )?;

    {
        let reg = reg.clone();
        t.set(
            "move",
            lua.create_function(move |lua, dir: Option<String>| {
                let swapped = with_editor(lua, |ed| {
                    let id = ed.tabs.active_leaf_id();
                    let tree = &mut ed.tabs.active_tab_mut().tree;
                    let neighbour = match dir.as_deref() {
                        Some("prev") => tree.prev_leaf(id),
                        _ => tree.next_leaf(id),
                    };
                    let Some(other) = neighbour.filter(|&o| o != id) else {
                        return Ok(None);
                    };
                    if !tree.swap(id, other) {
                        return Ok(None);
                    }
                    let prev = id;
                    ed.tabs.set_active_leaf(other);
                    Ok(Some((other, prev)))
                })?;
                if let Some((id, prev)) = swapped {
                    fire_hooks(lua, &reg, "on_focus", id, prev);
                    return Ok(true);
                }
                Ok(false)
            })?,
        )?;
    }

    {
        let reg = reg.clone();
        t.set(
            "set_custom",
            lua.create_function(move |lua, (renderer, data): (String, Value)| {
                let key = lua.create_registry_value(data)?;
                let data_id = reg.borrow_mut().store_data(key);
                let attached = with_editor(lua, |ed| {
                    let Some(leaf) = ed.active_leaf_mut() else {
                        return Ok(false);
                    };
                    leaf.content = LeafContent::Custom {
                        renderer: renderer.clone(),
                        data: data_id,
                    };
                    Ok(true)
                })?;
                if !attached {
                    if let Some(key) = reg.borrow_mut().data.remove(&data_id) {
                        let _ = lua.remove_registry_value(key);
                    }
                    return Ok(Value::Nil);
                }
                Ok(Value::Integer(i64::from(data_id)))
            })?,
        )?;
    }

    {
        let reg = reg.clone();
        t.set(
            "register_renderer",
            lua.create_function(move |lua, (name, table): (String, Table)| {
                let key = lua.create_registry_value(table)?;
                debug!(target: "script.host", renderer = %name, "renderer_registered");
                reg.borrow_mut().set_renderer(name, key);
                Ok(())
            })?,
        )?;
    }

    {
        let reg = reg.clone();
        t.set(
            "register_layout",
            lua.create_function(move |lua, (name, func): (String, Function)| {
                let key = lua.create_registry_value(func)?;
                reg.borrow_mut().set_layout(name, key);
                Ok(())
            })?,
        )?;
    }

    {
        let reg = reg.clone();
        t.set(
            "apply_layout",
            lua.create_function(move |lua, name: String| {
                let func = {
                    let reg = reg.borrow();
                    let Some(key) = reg.layouts.get(&name) else {
                        return Ok(false);
                    };
                    lua.registry_value::<Function>(key)?
                };
                func.call::<()>(())?;
                Ok(true)
            })?,
        )?;
    }

    t.set(
        "session_save",
        lua.create_function(|lua, path: String| {
            let snapshot = with_editor(lua, |ed| {
                let EditorState { buffers, tabs, .. } = ed;
                let lookup = |idx: usize| {
                    buffers
                        .get(idx)
                        .and_then(|b| b.filename())
                        .map(|p| p.display().to_string())
                };
                Ok(session::snapshot(tabs, &lookup))
            })?;
            let Ok(json) = serde_json::to_string_pretty(&snapshot) else {
                return Ok(false);
            };
            Ok(std::fs::write(path, json).is_ok())
        })?,
    )?;

    t.set(
        "session_restore",
        lua.create_function(|lua, path: String| {
            let Ok(json) = std::fs::read_to_string(path) else {
                return Ok(false);
            };
            let Ok(snapshot) = serde_json::from_str::<session::SessionSnapshot>(&json) else {
                return Ok(false);
            };
            with_editor(lua, |ed| {
                let ed = &mut *ed;
                let EditorState {
                    buffers,
                    registry,
                    tabs,
                    options,
                    ..
                } = ed;
                // Rebind through a local closure over the sibling fields.
                let mut bind = |path: Option<&str>| -> usize {
                    if let Some(path) = path {
                        if let Some(idx) = buffers.iter().position(|b| {
                            b.filename().is_some_and(|p| p.display().to_string() == path)
                        }) {
                            return idx;
                        }
                        let mut buf = Buffer::with_undo_limit(options.undo_history);
                        if buf.open(Path::new(path), registry).is_err() {
                            buf.set_filename(Some(path.into()));
                            buf.append_row_pristine(b"");
                        }
                        buffers.push(buf);
                        buffers.len() - 1
                    } else {
                        let mut buf = Buffer::with_undo_limit(options.undo_history);
                        buf.append_row_pristine(b"");
                        buffers.push(buf);
                        buffers.len() - 1
                    }
                };
                Ok(session::restore(tabs, &snapshot, &mut bind))
            })
        })?,
    )?;

    for event in ["on_create", "on_focus", "on_close", "on_resize"] {
        let reg = reg.clone();
        t.set(
            event,
            lua.create_function(move |lua, func: Function| {
                let key = lua.create_registry_value(func)?;
                reg.borrow_mut().add_hook(event, key);
                Ok(())
            })?,
        )?;
    }

    {
        let draw = draw.clone();
        t.set(
            "draw_text",
            lua.create_function(move |_, (x, y, text): (i64, i64, String)| {
                let mut surface = draw.borrow_mut();
                let Some(surface) = surface.as_mut() else {
                    // Valid only while a custom renderer runs.
                    return Ok(false);
                };
                if x < 0 || y < 0 {
                    return Ok(false);
                }
                let (x, y) = (x as u16, y as u16);
                if !surface.rect.contains(x, y) {
                    return Ok(false);
                }
                surface.ops.push(DrawOp { x, y, text });
                Ok(true)
            })?,
        )?;
    }

    lua.globals().set("window", t)?;
    Ok(())
}
