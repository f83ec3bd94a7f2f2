//! Bridge round-trips through a real interpreter.

use core_input::KeyInput;
use core_model::Rect;
use core_render::RenderHooks;
use core_script::{ScriptHost, SharedEditor};
use core_state::{EditorOptions, EditorState};
use std::cell::RefCell;
use std::rc::Rc;

fn host() -> (ScriptHost, SharedEditor) {
    let editor: SharedEditor = Rc::new(RefCell::new(EditorState::new(EditorOptions::default())));
    let host = ScriptHost::new(editor.clone()).unwrap();
    (host, editor)
}

#[test]
fn bound_key_dispatches_to_script_exactly_once() {
    let (host, editor) = host();
    host.exec(
        r#"
        calls = 0
        function my_func() calls = calls + 1 end
        editor.bind_key(string.byte('x'), editor.KMOD.CTRL, "my_func")
    "#,
    )
    .unwrap();

    // The event loop side: look the chord up, then dispatch by name.
    let action = {
        let ed = editor.borrow();
        ed.keymap.lookup(&KeyInput::ctrl(b'x')).map(str::to_string)
    };
    assert_eq!(action.as_deref(), Some("my_func"));
    assert!(host.call_action("my_func"));

    let calls: i64 = host.lua().globals().get("calls").unwrap();
    assert_eq!(calls, 1);
}

#[test]
fn unbind_removes_binding() {
    let (host, editor) = host();
    host.exec(
        r#"
        function f() end
        editor.bind_key(string.byte('k'), editor.KMOD.CTRL, "f")
        editor.unbind_key(string.byte('k'), editor.KMOD.CTRL)
    "#,
    )
    .unwrap();
    assert!(editor.borrow().keymap.lookup(&KeyInput::ctrl(b'k')).is_none());
}

#[test]
fn buffer_namespace_edits_active_buffer() {
    let (host, editor) = host();
    host.exec(
        r#"
        buffer.insert_string("hi there")
        buffer.set_cursor(2, 0)
        buffer.insert_char(string.byte('!'))
        line = buffer.get_line(0)
        count = buffer.get_line_count()
        x, y = buffer.get_cursor()
        ch = buffer.get_char(0, 0)
    "#,
    )
    .unwrap();

    let globals = host.lua().globals();
    assert_eq!(globals.get::<String>("line").unwrap(), "hi! there");
    assert_eq!(globals.get::<i64>("count").unwrap(), 1);
    assert_eq!(globals.get::<i64>("x").unwrap(), 3);
    assert_eq!(globals.get::<i64>("y").unwrap(), 0);
    assert_eq!(globals.get::<i64>("ch").unwrap(), i64::from(b'h'));
    assert!(editor.borrow().buffers[0].is_modified());
}

#[test]
fn search_and_replace_from_script() {
    let (host, _editor) = host();
    host.exec(
        r#"
        buffer.insert_string("abc abc")
        buffer.set_cursor(0, 0)
        r, c = buffer.search("abc", true)
        n = buffer.replace("abc", "xyz", true)
    "#,
    )
    .unwrap();
    let globals = host.lua().globals();
    assert_eq!(globals.get::<i64>("r").unwrap(), 0);
    assert_eq!(globals.get::<i64>("c").unwrap(), 4);
    assert_eq!(globals.get::<i64>("n").unwrap(), 2);
}

#[test]
fn script_error_is_captured_not_fatal() {
    let (host, _editor) = host();
    host.exec("function broken() error('boom') end").unwrap();
    assert!(!host.call_action("broken"));
    let err = host.last_error().expect("error recorded");
    assert!(err.contains("boom"));
    // The host stays usable afterwards.
    host.exec("x = 1").unwrap();
}

#[test]
fn missing_action_is_a_noop() {
    let (host, _editor) = host();
    assert!(!host.call_action("never_defined"));
}

#[test]
fn gutter_renderer_hook_is_consulted() {
    let (host, _editor) = host();
    host.exec(
        r#"
        function _gutter_renderer(line)
            if line == 0 then return "+ " end
            return nil
        end
    "#,
    )
    .unwrap();
    assert_eq!(host.gutter_cell(0), Some("+ ".to_string()));
    assert_eq!(host.gutter_cell(1), None);
}

#[test]
fn custom_renderer_draws_inside_box_only() {
    let (host, editor) = host();
    host.exec(
        r#"
        window.register_renderer("panel", {
            render = function(data, x, y, w, h)
                window.draw_text(x, y, "title:" .. data.name)
                window.draw_text(x + 200, y, "clipped")
            end,
            on_key = function(data, key)
                seen_key = key
                return true
            end,
        })
        data_id = window.set_custom("panel", { name = "files" })
    "#,
    )
    .unwrap();

    let data_id: u32 = host.lua().globals().get::<i64>("data_id").unwrap() as u32;
    {
        let ed = editor.borrow();
        let leaf = ed.active_leaf().unwrap();
        assert!(matches!(
            &leaf.content,
            core_model::LeafContent::Custom { renderer, data }
                if renderer == "panel" && *data == data_id
        ));
    }

    let rect = Rect::new(2, 1, 30, 5);
    let ops = host.render_custom("panel", data_id, rect);
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].text, "title:files");
    assert_eq!((ops[0].x, ops[0].y), (2, 1));

    // Key offer reaches on_key with the shared data.
    assert!(host.custom_on_key("panel", data_id, KeyInput::plain(core_input::Key::Char(b'j'))));
    let seen: i64 = host.lua().globals().get("seen_key").unwrap();
    assert_eq!(seen, i64::from(b'j'));
}

#[test]
fn window_split_fires_on_create_hook() {
    let (host, editor) = host();
    host.exec(
        r#"
        created = nil
        window.on_create(function(id, prev) created = id end)
        new_id = window.split("v")
        total = window.count()
    "#,
    )
    .unwrap();
    let globals = host.lua().globals();
    let new_id: i64 = globals.get("new_id").unwrap();
    assert_eq!(globals.get::<i64>("created").unwrap(), new_id);
    assert_eq!(globals.get::<i64>("total").unwrap(), 2);
    assert_eq!(editor.borrow().tabs.active_leaf_id(), new_id as u64);
}

#[test]
fn window_close_releases_and_fires_hook() {
    let (host, editor) = host();
    host.exec(
        r#"
        closed = nil
        window.on_close(function(id, now) closed = id end)
        victim = window.split("h")
        ok = window.close()
    "#,
    )
    .unwrap();
    let globals = host.lua().globals();
    assert!(globals.get::<bool>("ok").unwrap());
    let victim: i64 = globals.get("victim").unwrap();
    assert_eq!(globals.get::<i64>("closed").unwrap(), victim);
    assert_eq!(editor.borrow().tabs.active_tab().tree.leaf_count(), 1);
}

#[test]
fn closing_last_window_is_refused() {
    let (host, _editor) = host();
    host.exec("refused = window.close()").unwrap();
    assert!(!host.lua().globals().get::<bool>("refused").unwrap());
}

#[test]
fn layout_registration_and_apply() {
    let (host, editor) = host();
    host.exec(
        r#"
        window.register_layout("grid", function()
            window.split("v")
            window.split("h")
            window.equalize()
        end)
        applied = window.apply_layout("grid")
        missing = window.apply_layout("nope")
    "#,
    )
    .unwrap();
    assert!(host.lua().globals().get::<bool>("applied").unwrap());
    assert!(!host.lua().globals().get::<bool>("missing").unwrap());
    assert_eq!(editor.borrow().tabs.active_tab().tree.leaf_count(), 3);
}

#[test]
fn session_round_trip_through_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let (host, editor) = host();
    host.exec("window.split('v')").unwrap();
    host.exec(&format!(
        "saved = window.session_save('{}')",
        path.display()
    ))
    .unwrap();
    assert!(host.lua().globals().get::<bool>("saved").unwrap());

    host.exec("window.only()").unwrap();
    assert_eq!(editor.borrow().tabs.active_tab().tree.leaf_count(), 1);

    host.exec(&format!(
        "restored = window.session_restore('{}')",
        path.display()
    ))
    .unwrap();
    assert!(host.lua().globals().get::<bool>("restored").unwrap());
    assert_eq!(editor.borrow().tabs.active_tab().tree.leaf_count(), 2);
}

#[test]
fn syntax_registration_from_script() {
    let (host, editor) = host();
    host.exec(
        r#"
        local id = syntax.register("zig")
        syntax.add_extension(id, ".zig")
        syntax.add_keyword(id, "defer", syntax.HL_KEYWORD)
        syntax.set_comments(id, "//", nil, nil)
    "#,
    )
    .unwrap();
    let ed = editor.borrow();
    let id = ed.registry.find_by_filename("main.zig").expect("extension registered");
    let syn = ed.registry.get(id).unwrap();
    assert_eq!(syn.name, "zig");
    assert_eq!(syn.singleline_comment.as_deref(), Some("//"));
}

#[test]
fn get_info_reports_geometry_and_focus() {
    let (host, _editor) = host();
    host.exec(
        r#"
        info = window.get_info(window.current())
        missing = window.get_info(9999)
    "#,
    )
    .unwrap();
    let globals = host.lua().globals();
    let info: mlua::Table = globals.get("info").unwrap();
    assert!(info.get::<bool>("focused").unwrap());
    assert_eq!(info.get::<i64>("buffer").unwrap(), 0);
    assert!(globals.get::<mlua::Value>("missing").unwrap().is_nil());
}
