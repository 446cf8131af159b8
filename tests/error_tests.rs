mod common;
use common::fixtures::{components, view};
use common::{TestResult, engine_with, render};
use serde_json::json;
use std::sync::Arc;
use xview::{InMemoryViewLoader, LoaderError, SharedSource, ViewEngine, ViewError, ViewLoader};

#[derive(Debug)]
struct LockedLoader;

impl ViewLoader for LockedLoader {
    fn load(&self, uri: &str) -> Result<SharedSource, LoaderError> {
        Err(LoaderError::LoadFailed {
            path: uri.to_string(),
            message: "permission denied".to_string(),
        })
    }

    fn exists(&self, _uri: &str) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "LockedLoader"
    }
}

#[test]
fn test_missing_view_is_not_found() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = engine_with::<&str>(&[])?;

    let err = engine.load("/missing.xview").unwrap_err();
    assert!(matches!(err, ViewError::NotFound(ref uri) if uri == "/missing.xview"));
    Ok(())
}

#[test]
fn test_loader_failure_is_not_mistaken_for_absence() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = ViewEngine::new(LockedLoader)?;

    let err = engine.load("/a.xview").unwrap_err();
    assert!(matches!(err, ViewError::Load { ref uri, .. } if uri == "/a.xview"));
    assert!(err.to_string().contains("permission denied"));
    Ok(())
}

#[test]
fn test_invalid_utf8_is_an_encoding_error() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let loader = InMemoryViewLoader::new();
    loader.add("/bin.xview", vec![0x3c, 0xff, 0x3e])?;
    let engine = ViewEngine::new(loader)?;

    assert!(matches!(
        engine.load("/bin.xview").unwrap_err(),
        ViewError::Encoding { .. }
    ));
    Ok(())
}

#[test]
fn test_malformed_xml_is_a_parse_error() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = engine_with(&[("/bad.xview", "<div><p></div>")])?;

    let err = engine.load("/bad.xview").unwrap_err();
    assert!(matches!(err, ViewError::Parse { ref uri, .. } if uri == "/bad.xview"));
    Ok(())
}

#[test]
fn test_odd_schema_location_is_a_namespace_error() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = engine_with(&[(
        "/odd.xview",
        view(
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="urn:a /a.xsd urn:b""#,
            "<p/>",
        ),
    )])?;

    assert!(matches!(
        engine.load("/odd.xview").unwrap_err(),
        ViewError::Namespace { .. }
    ));
    Ok(())
}

#[test]
fn test_unknown_builtin_tag() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = engine_with(&[("/a.xview", view("", "<xview:foreach/>"))])?;

    let err = engine.load("/a.xview").unwrap_err();
    assert!(matches!(err, ViewError::UnknownTag { ref tag, .. } if tag == "xview:foreach"));
    assert_eq!(err.to_string(), "/a.xview -> unknown tag [xview:foreach]");
    Ok(())
}

#[test]
fn test_prefix_not_declared_on_root_is_unknown() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = engine_with(&[("/a.xview", r#"<div><p:x xmlns:p="/p.xsd"/></div>"#)])?;

    assert!(matches!(
        engine.load("/a.xview").unwrap_err(),
        ViewError::UnknownTag { ref tag, .. } if tag == "p:x"
    ));
    Ok(())
}

#[test]
fn test_view_from_another_engine_is_rejected() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let first = engine_with(&[("/a.xview", "<p/>")])?;
    let second = engine_with(&[("/a.xview", "<p/>")])?;
    let view = first.load("/a.xview")?;

    let err = second
        .render_to_string(&view, &Default::default())
        .unwrap_err();
    assert!(matches!(err, ViewError::InstanceMismatch { ref uri } if uri == "/a.xview"));
    Ok(())
}

#[test]
fn test_script_failure_names_the_view() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = engine_with(&[("/boom.xview", "<p>${missing_table.field}</p>")])?;

    let err = render(&engine, "/boom.xview", json!({})).unwrap_err();
    assert!(matches!(err, ViewError::Execution { ref uri, .. } if uri == "/boom.xview"));
    Ok(())
}

#[test]
fn test_syntax_error_surfaces_on_first_render() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = engine_with(&[(
        "/syntax.xview",
        view("", "<xview:script>if then</xview:script>"),
    )])?;

    let view = engine.load("/syntax.xview")?;
    let err = engine
        .render_to_string(&view, &Default::default())
        .unwrap_err();
    assert!(matches!(err, ViewError::Execution { .. }));
    assert!(err.to_string().contains("/syntax.xview"));
    assert_eq!(engine.runtime().compile_count(), 0);
    Ok(())
}

#[test]
fn test_nested_missing_view_is_innermost() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut views = components();
    views.push((
        "/pages/index.xview",
        view(r#"xmlns:ui="../components/ui.xsd""#, "<ui:missing/>"),
    ));
    let engine = engine_with(&views)?;

    let err = render(&engine, "/pages/index.xview", json!({})).unwrap_err();
    assert!(matches!(err, ViewError::Execution { ref uri, .. } if uri == "/pages/index.xview"));
    assert!(matches!(
        err.innermost(),
        ViewError::NotFound(uri) if uri == "/components/missing.xview"
    ));
    Ok(())
}

#[test]
fn test_self_invocation_hits_nesting_limit() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let loader = common::loader_with(&[(
        "/loop/self.xview",
        view(r#"xmlns:me="/loop/any.xsd""#, "<i/><me:self/>"),
    )])?;
    let engine = ViewEngine::builder()
        .with_loader(loader)
        .with_max_nesting_depth(5)
        .build()?;

    let err = render(&engine, "/loop/self.xview", json!({})).unwrap_err();
    assert!(matches!(
        err.innermost(),
        ViewError::NestingTooDeep { limit: 5, .. }
    ));
    Ok(())
}

#[test]
fn test_validator_rejection() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let loader = common::loader_with(&[("/a.xview", "<p/>"), ("/b.xview", "<script/>")])?;
    let engine = ViewEngine::builder()
        .with_loader(loader)
        .with_validator(|_: &str, source: &str| -> Result<(), String> {
            if source.contains("<script") {
                Err("script elements are not allowed".to_string())
            } else {
                Ok(())
            }
        })
        .build()?;

    assert!(engine.load("/a.xview").is_ok());
    let err = engine.load("/b.xview").unwrap_err();
    assert!(matches!(
        err,
        ViewError::Validation { ref uri, ref message }
            if uri == "/b.xview" && message == "script elements are not allowed"
    ));
    Ok(())
}

#[test]
fn test_failed_loads_are_not_cached() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let loader = Arc::new(InMemoryViewLoader::new());
    let engine = ViewEngine::new(loader.clone())?;

    assert!(engine.load("/late.xview").is_err());
    loader.add("/late.xview", "<p>late</p>")?;
    assert_eq!(render(&engine, "/late.xview", json!({}))?, "<p>late</p>");
    Ok(())
}

#[test]
fn test_output_before_a_failure_is_kept() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = engine_with(&[("/partial.xview", "<p>ok${error('stop')}</p>")])?;
    let view = engine.load("/partial.xview")?;

    let buffer = Arc::new(std::sync::Mutex::new(Vec::new()));
    let result = engine.render(
        &view,
        &Default::default(),
        &xview::OutputSink::from_shared(buffer.clone()),
    );
    assert!(result.is_err());
    assert_eq!(buffer.lock().map_err(|e| e.to_string())?.as_slice(), b"<p>ok");
    Ok(())
}
