//! The `syntax` namespace: registering language definitions from scripts.

use crate::with_editor;
use core_syntax::{HighlightKind, SyntaxId};
use mlua::{Lua, Result as LuaResult};

pub(crate) fn hl_from_int(value: i64) -> HighlightKind {
    match value {
        1 => HighlightKind::Keyword,
        2 => HighlightKind::Type,
        3 => HighlightKind::String,
        4 => HighlightKind::Number,
        5 => HighlightKind::Comment,
        6 => HighlightKind::Operator,
        7 => HighlightKind::Function,
        8 => HighlightKind::Variable,
        9 => HighlightKind::Constant,
        10 => HighlightKind::Preprocessor,
        _ => HighlightKind::Normal,
    }
}

pub(crate) fn install(lua: &Lua) -> LuaResult<()> {
    let t = lua.create_table()?;

    t.set(
        "register",
        lua.create_function(|lua, name: String| {
            with_editor(lua, |ed| Ok(ed.registry.register(name.clone()).to_raw() as i64))
        })?,
    )?;

    t.set(
        "add_extension",
        lua.create_function(|lua, (id, ext): (i64, String)| {
            with_editor(lua, |ed| {
                let Ok(raw) = usize::try_from(id) else {
                    return Ok(false);
                };
                match ed.registry.get_mut(SyntaxId::from_raw(raw)) {
                    Some(syn) => {
                        syn.add_extension(ext.clone());
                        Ok(true)
                    }
                    None => Ok(false),
                }
            })
        })?,
    )?;

    t.set(
        "add_keyword",
        lua.create_function(|lua, (id, word, hl): (i64, String, i64)| {
            with_editor(lua, |ed| {
                let Ok(raw) = usize::try_from(id) else {
                    return Ok(false);
                };
                match ed.registry.get_mut(SyntaxId::from_raw(raw)) {
                    Some(syn) => {
                        syn.add_keyword(word.clone(), hl_from_int(hl));
                        Ok(true)
                    }
                    None => Ok(false),
                }
            })
        })?,
    )?;

    t.set(
        "set_comments",
        lua.create_function(
            |lua, (id, single, start, end): (i64, Option<String>, Option<String>, Option<String>)| {
                with_editor(lua, |ed| {
                    let Ok(raw) = usize::try_from(id) else {
                        return Ok(false);
                    };
                    match ed.registry.get_mut(SyntaxId::from_raw(raw)) {
                        Some(syn) => {
                            syn.set_comments(single.as_deref(), start.as_deref(), end.as_deref());
                            Ok(true)
                        }
                        None => Ok(false),
                    }
                })
            },
        )?,
    )?;

    for (name, value) in [
        ("HL_NORMAL", 0),
        ("HL_KEYWORD", 1),
        ("HL_TYPE", 2),
        ("HL_STRING", 3),
        ("HL_NUMBER", 4),
        ("HL_COMMENT", 5),
        ("HL_OPERATOR", 6),
        ("HL_FUNCTION", 7),
        ("HL_VARIABLE", 8),
        ("HL_CONSTANT", 9),
        ("HL_PREPROCESSOR", 10),
    ] {
        t.set(name, value)?;
    }

    lua.globals().set("syntax", t)?;
    Ok(())
}
