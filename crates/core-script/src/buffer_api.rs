//! The `buffer` namespace: operations on the focused leaf's buffer.

use crate::with_editor;
use core_text::Buffer;
use mlua::{Lua, Result as LuaResult, Variadic};

fn with_active_buffer<R>(
    lua: &Lua,
    f: impl FnOnce(&mut Buffer) -> LuaResult<R>,
) -> LuaResult<R> {
    with_editor(lua, |ed| match ed.active_buffer_mut() {
        Some(buf) => f(buf),
        None => Err(mlua::Error::runtime("no active buffer")),
    })
}

pub(crate) fn install(lua: &Lua) -> LuaResult<()> {
    let t = lua.create_table()?;

    t.set(
        "insert_char",
        lua.create_function(|lua, c: i64| {
            let byte = u8::try_from(c)
                .map_err(|_| mlua::Error::runtime("insert_char expects a byte value"))?;
            with_active_buffer(lua, |buf| {
                buf.insert_byte(byte);
                Ok(())
            })
        })?,
    )?;

    t.set(
        "insert_string",
        lua.create_function(|lua, s: mlua::String| {
            let bytes = s.as_bytes().to_vec();
            with_active_buffer(lua, |buf| {
                for b in bytes {
                    buf.insert_byte(b);
                }
                Ok(())
            })
        })?,
    )?;

    t.set(
        "insert_newline",
        lua.create_function(|lua, ()| {
            with_active_buffer(lua, |buf| {
                buf.insert_newline();
                Ok(())
            })
        })?,
    )?;

    t.set(
        "delete_char",
        lua.create_function(|lua, ()| {
            with_active_buffer(lua, |buf| {
                buf.delete_byte_before_cursor();
                Ok(())
            })
        })?,
    )?;

    t.set(
        "get_cursor",
        lua.create_function(|lua, ()| {
            with_active_buffer(lua, |buf| Ok((buf.cx as i64, buf.cy as i64)))
        })?,
    )?;

    t.set(
        "set_cursor",
        lua.create_function(|lua, (x, y): (i64, i64)| {
            with_active_buffer(lua, |buf| {
                buf.set_cursor(x.max(0) as usize, y.max(0) as usize);
                Ok(())
            })
        })?,
    )?;

    t.set(
        "get_line",
        lua.create_function(|lua, y: i64| {
            let bytes = with_active_buffer(lua, |buf| {
                Ok(usize::try_from(y)
                    .ok()
                    .and_then(|y| buf.row(y))
                    .map(|r| r.as_bytes().to_vec()))
            })?;
            bytes.map(|b| lua.create_string(&b)).transpose()
        })?,
    )?;

    t.set(
        "line_length",
        lua.create_function(|lua, y: i64| {
            with_active_buffer(lua, |buf| {
                Ok(usize::try_from(y)
                    .ok()
                    .and_then(|y| buf.row(y))
                    .map(|r| r.len() as i64))
            })
        })?,
    )?;

    t.set(
        "get_line_count",
        lua.create_function(|lua, ()| {
            with_active_buffer(lua, |buf| Ok(buf.row_count() as i64))
        })?,
    )?;

    t.set(
        "get_char",
        lua.create_function(|lua, (x, y): (i64, i64)| {
            with_active_buffer(lua, |buf| {
                let byte = usize::try_from(y)
                    .ok()
                    .zip(usize::try_from(x).ok())
                    .and_then(|(y, x)| buf.row(y).and_then(|r| r.byte(x)));
                Ok(byte.map(i64::from))
            })
        })?,
    )?;

    t.set(
        "search",
        lua.create_function(|lua, (query, forward): (mlua::String, Option<bool>)| {
            let query = query.as_bytes().to_vec();
            let found = with_active_buffer(lua, |buf| {
                Ok(buf.search(&query, buf.cy, buf.cx, forward.unwrap_or(true)))
            })?;
            Ok(match found {
                Some(m) => Variadic::from_iter([m.row as i64, m.col as i64]),
                None => Variadic::new(),
            })
        })?,
    )?;

    t.set(
        "replace",
        lua.create_function(
            |lua, (search, replace, all): (mlua::String, mlua::String, Option<bool>)| {
                let (search, replace) = (search.as_bytes().to_vec(), replace.as_bytes().to_vec());
                with_active_buffer(lua, |buf| {
                    Ok(buf.replace(&search, &replace, all.unwrap_or(false)) as i64)
                })
            },
        )?,
    )?;

    t.set(
        "save",
        lua.create_function(|lua, ()| {
            with_editor(lua, |ed| {
                let Some(buf) = ed.active_buffer_mut() else {
                    return Ok(false);
                };
                match buf.save() {
                    Ok(_) => Ok(true),
                    Err(e) => {
                        ed.set_status(format!("save failed: {e}"));
                        Ok(false)
                    }
                }
            })
        })?,
    )?;

    t.set(
        "filename",
        lua.create_function(|lua, ()| {
            with_active_buffer(lua, |buf| {
                Ok(buf.filename().map(|p| p.display().to_string()))
            })
        })?,
    )?;

    lua.globals().set("buffer", t)?;
    Ok(())
}
