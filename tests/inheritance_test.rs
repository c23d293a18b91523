//! End-to-end rendering of template files through extends chains.

mod common;

use std::fs;
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use serde_json::json;
use strata::{Locals, RenderError, ScopeBindings, TemplateOptions, ESCAPE_HTML};

use common::{assert_lines_match, fixture_dir, init_tracing, locals};

fn options_for(dir: &tempfile::TempDir) -> TemplateOptions {
    TemplateOptions::new().with_base_path(dir.path())
}

#[test]
fn test_render_basic_template() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();

    let content = strata::render(
        "basic.text",
        &locals(json!({"items": ["a", "b"]})),
        &options_for(&dir),
    )?;

    assert_eq!(content, "Basic\na\nb\n");
    Ok(())
}

#[test]
fn test_one_step_inheritance() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();

    let content = strata::render("one_step_1.text", &Locals::new(), &options_for(&dir))?;

    assert_lines_match(&content, &["Base", "Title", "Subtitle"]);
    assert!(!content.contains("Default"));
    Ok(())
}

#[test]
fn test_parent_receives_extends_locals() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();

    let content = strata::render(
        "parent_locals_2.text",
        &locals(json!({"items": ["a", "b"]})),
        &options_for(&dir),
    )?;

    assert_lines_match(&content, &["Base", "a"]);
    Ok(())
}

#[test]
fn test_two_step_inheritance() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();

    let content = strata::render("two_step_2.text", &Locals::new(), &options_for(&dir))?;

    assert_lines_match(&content, &["Base", "Title", "Subtitle"]);
    assert!(!content.contains("Default"));
    Ok(())
}

#[test]
fn test_intermediate_block_wraps_child_content() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();

    let content = strata::render(
        "nested_two_step_2.text",
        &Locals::new(),
        &options_for(&dir),
    )?;

    assert_lines_match(&content, &["Base", "Title - Subtitle", "Default Subtitle"]);
    Ok(())
}

#[test]
fn test_wrapping_template_rendered_as_leaf_has_empty_inner_block() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();

    let content = strata::render(
        "nested_two_step_1.text",
        &Locals::new(),
        &options_for(&dir),
    )?;

    assert_eq!(content, "Base\nTitle - \nDefault Subtitle\n");
    Ok(())
}

#[test]
fn test_nested_block_in_leaf_override_renders_default() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();

    let content = strata::render("nested_leaf", &Locals::new(), &options_for(&dir))?;

    assert_eq!(content, "<main>XI</main>");
    Ok(())
}

#[test]
fn test_repeated_declaration_keeps_last() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();

    let content = strata::render("declared_twice", &Locals::new(), &options_for(&dir))?;

    assert_eq!(content, "[second]");
    Ok(())
}

#[test]
fn test_conditional_extends() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();
    let options = options_for(&dir);

    let framed = strata::render(
        "maybe_framed",
        &locals(json!({"framed": true, "title": "Hello"})),
        &options,
    )?;
    assert_eq!(framed, "<main>Hello</main>");

    let bare = strata::render(
        "maybe_framed",
        &locals(json!({"framed": false, "title": "Hello"})),
        &options,
    )?;
    assert_eq!(bare, "Hello\n");
    Ok(())
}

#[test]
fn test_quoted_argument_may_contain_closing_delimiter() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();

    let content = strata::render("quoted_args", &Locals::new(), &options_for(&dir))?;

    assert_eq!(content, "<h2>Q@}A</h2>\n");
    Ok(())
}

#[test]
fn test_child_overrides_only_its_blocks() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();
    let options = options_for(&dir);

    let child = strata::render("child.html", &Locals::new(), &options)?;
    assert!(child.contains("<title>Child Title</title>"));
    assert!(!child.contains("<title>Default</title>"));
    assert!(child.contains("<p>No content</p>"));

    let parent = strata::render("layouts/page.html", &Locals::new(), &options)?;
    assert_eq!(
        parent,
        "<title>Default</title>\n<main>\n<p>No content</p>\n</main>\n"
    );
    Ok(())
}

#[test]
fn test_no_leakage_between_renders() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();
    let options = options_for(&dir);

    let _ = strata::render("one_step_1.text", &Locals::new(), &options)?;
    let base = strata::render("base.text", &Locals::new(), &options)?;

    assert_eq!(base, "Base\nDefault Title\nDefault Subtitle\n");
    Ok(())
}

#[test]
fn test_scope_object_members_visible() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();
    let options =
        options_for(&dir).with_scope(ScopeBindings::new().method("some_text", || json!("a text")));

    let content = strata::render("scope_object.text", &Locals::new(), &options)?;

    assert_lines_match(&content, &["Base", "a text"]);
    Ok(())
}

#[test]
fn test_escape_html_engine_option() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();
    let options = options_for(&dir).with_engine_option(ESCAPE_HTML, json!(true));

    let content = strata::render("sanitized.html", &Locals::new(), &options)?;

    assert_lines_match(&content, &["Sanitized &amp;", "Not sanitized &"]);
    Ok(())
}

#[test]
fn test_sub_template_uses_same_options() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();

    let content = strata::render("with_sub_template.html", &Locals::new(), &options_for(&dir))?;

    assert_lines_match(&content, &["<h1>Title</h1>", "<h2>Subtitle</h2>"]);
    Ok(())
}

#[test]
fn test_missing_parent_reports_resolved_path() {
    init_tracing();
    let dir = fixture_dir();

    match strata::render("orphan", &Locals::new(), &options_for(&dir)) {
        Err(RenderError::Resolution { path, source }) => {
            assert_eq!(path, dir.path().join("nowhere.tera"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("Expected Resolution error, got {other:?}"),
    }
}

#[test]
fn test_extends_cycle_stopped_by_depth_limit() {
    init_tracing();
    let dir = fixture_dir();
    let options = options_for(&dir).with_max_extends_depth(8);

    match strata::render("cycle_a", &Locals::new(), &options) {
        Err(RenderError::ExtendsDepthExceeded { limit, .. }) => assert_eq!(limit, 8),
        other => panic!("Expected ExtendsDepthExceeded error, got {other:?}"),
    }
}

#[test]
fn test_options_loaded_from_toml_file() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();
    let config_path = dir.path().join("strata.toml");
    fs::write(
        &config_path,
        format!(
            "base-path = {:?}\nmax-extends-depth = 4\nescape-html = true\n",
            dir.path().display().to_string()
        ),
    )?;

    let options = TemplateOptions::load(&config_path)?;
    assert_eq!(options.max_extends_depth, Some(4));

    let content = strata::render("sanitized.html", &Locals::new(), &options)?;
    assert_lines_match(&content, &["Sanitized &amp;"]);
    Ok(())
}

#[test]
fn test_cache_requires_clear_to_see_edits() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();
    let options = options_for(&dir);
    let engine = strata::tera_engine();

    assert_eq!(
        engine.render("subtitle.html", &locals(json!({"text": "v1"})), &options)?,
        "<h2>v1</h2>\n"
    );

    common::write_template(dir.path(), "subtitle.html", "<h3>{{ text }}</h3>\n");
    assert_eq!(
        engine.render("subtitle.html", &locals(json!({"text": "v2"})), &options)?,
        "<h2>v2</h2>\n"
    );

    engine.clear_cache();
    assert_eq!(
        engine.render("subtitle.html", &locals(json!({"text": "v3"})), &options)?,
        "<h3>v3</h3>\n"
    );
    Ok(())
}

#[test]
fn test_engine_shared_across_threads() -> Result<()> {
    init_tracing();
    let dir = fixture_dir();
    let options = Arc::new(options_for(&dir));
    let engine = Arc::new(strata::tera_engine());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let options = Arc::clone(&options);
            thread::spawn(move || {
                let template = if i % 2 == 0 {
                    "nested_two_step_2.text"
                } else {
                    "two_step_2.text"
                };
                engine.render(template, &Locals::new(), &options)
            })
        })
        .collect();

    for handle in handles {
        let content = handle.join().expect("render thread panicked")?;
        assert!(content.contains("Subtitle"));
        assert!(content.starts_with("Base\n"));
    }
    Ok(())
}
