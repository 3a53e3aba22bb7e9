mod support;

use std::io::Write;

use anyhow::Result;
use webbind::{BindingError, LocatorStrategy, ScopeKind, Settings, WebbindError};

use support::{locate, scripted_session, session};

#[tokio::test]
async fn single_text_binding_resolves_to_its_value() -> Result<()> {
    let (_, evaluators, session) = scripted_session(Settings::default());
    for (name, value) in [("a", "1"), ("user name", "ann"), ("path", "/tmp/$[x]")] {
        session.bind(&format!("{}/text", name), value);
        assert_eq!(session.get_attribute(name).await?, value);
    }
    assert!(evaluators.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn javascript_only_binding_returns_script_result() -> Result<()> {
    let (_, evaluators, session) = scripted_session(Settings::default());
    session.bind("title/javascript", "document.title");

    assert_eq!(
        session.get_attribute("title").await?,
        "evaluated(return document.title)"
    );
    assert_eq!(evaluators.calls(), vec!["javascript: return document.title"]);
    Ok(())
}

#[tokio::test]
async fn dispatch_is_exclusive() -> Result<()> {
    let (_, evaluators, session) = scripted_session(Settings::default());
    session.bind("n/javascript", "compute()");
    session.bind("n/text", "plain");

    assert_eq!(session.get_attribute("n").await?, "plain");
    assert!(evaluators.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn inner_scope_binding_shadows_feature_binding() -> Result<()> {
    let (_, _, session) = scripted_session(Settings::default());
    session.begin_feature("login");
    session.bind_in(ScopeKind::Feature, "user/text", "feature user")?;
    session.bind("user/text", "page user");

    assert_eq!(session.get_attribute("user").await?, "page user");
    session.reset_page_scope()?;
    assert_eq!(session.get_attribute("user").await?, "feature user");
    Ok(())
}

#[tokio::test]
async fn derived_kinds_resolve_sources_through_references() -> Result<()> {
    let (_, evaluators, session) = scripted_session(Settings::default());
    session.bind("response/text", r#"{"id": 7}"#);
    session.bind("order id/json path/source", "response");
    session.bind("order id/json path/expression", "$.id");
    session.bind("banner/text", "Order 7 placed");
    session.bind("number/regex/source", "banner");
    session.bind("number/regex/expression", r"Order (\d+)");
    session.bind("feed/text", "<rss/>");
    session.bind("headline/xpath/source", "feed");
    session.bind("headline/xpath/expression", "//item[1]/title");
    session.bind("headline/xpath/targetType", "text");

    assert_eq!(session.get_attribute("order id").await?, "json($.id)");
    assert_eq!(session.get_attribute("number").await?, r"regex(Order (\d+))");
    assert_eq!(session.get_attribute("headline").await?, "xpath(//item[1]/title)");
    assert_eq!(
        evaluators.calls(),
        vec![
            r#"json path: $.id on {"id": 7}"#.to_string(),
            r"regex: Order (\d+) on Order 7 placed".to_string(),
            "xpath: //item[1]/title on <rss/> as text".to_string(),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn bad_xpath_target_type_is_an_evaluation_error() -> Result<()> {
    let (_, _, session) = scripted_session(Settings::default());
    session.bind("feed/text", "<rss/>");
    session.bind("x/xpath/source", "feed");
    session.bind("x/xpath/expression", "//a");
    session.bind("x/xpath/targetType", "attribute");

    let err = session.get_attribute("x").await.unwrap_err();
    assert!(matches!(
        err,
        WebbindError::Binding(BindingError::Evaluation { ref kind, .. }) if kind == "xpath"
    ));
    Ok(())
}

#[tokio::test]
async fn missing_file_is_resource_not_found() -> Result<()> {
    let (_, session) = session(Settings::default());
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing.txt");
    session.bind("N/file", &missing.to_string_lossy());

    let err = session.get_attribute("N").await.unwrap_err();
    assert!(matches!(
        err,
        WebbindError::Binding(BindingError::ResourceNotFound { .. })
    ));
    assert!(!err.is_unbound());
    Ok(())
}

#[tokio::test]
async fn file_binding_path_is_interpolated() -> Result<()> {
    let (_, session) = session(Settings::default());
    let dir = tempfile::tempdir()?;
    let mut file = std::fs::File::create(dir.path().join("greeting.txt"))?;
    write!(file, "hello from disk")?;
    session.bind("data dir", &dir.path().to_string_lossy());
    session.bind("greeting/file", "$[data dir]/greeting.txt");

    assert_eq!(session.get_attribute("greeting").await?, "hello from disk");
    Ok(())
}

#[tokio::test]
async fn json_path_with_real_evaluators() -> Result<()> {
    let (_, session) = session(Settings::default());
    session.bind("payload/text", r#"{"items": [{"name": "pen"}, {"name": "ink"}]}"#);
    session.bind("second/json path/source", "payload");
    session.bind("second/json path/expression", "$.items[1].name");

    assert_eq!(session.get_attribute("second").await?, "ink");
    Ok(())
}

#[tokio::test]
async fn locator_binding_needs_both_keys() -> Result<()> {
    let (_, _, session) = scripted_session(Settings::default());

    let err = session.locator_binding("N").await.unwrap_err();
    assert!(matches!(
        err,
        WebbindError::Binding(BindingError::LocatorBindingNotFound { ref key, .. }) if key == "N/locator"
    ));

    session.bind("N/locator", "xpath");
    let err = session.locator_binding("N").await.unwrap_err();
    assert!(matches!(
        err,
        WebbindError::Binding(BindingError::LocatorBindingNotFound { ref key, .. }) if key == "N/locator/xpath"
    ));

    session.bind("N/locator/xpath", "//div[@id='$[div id]']");
    session.bind("div id", "main");
    let binding = session.locator_binding("N").await?;
    assert_eq!(binding.locator_strategy, LocatorStrategy::XPath);
    assert_eq!(binding.expression, "//div[@id='main']");
    Ok(())
}

#[tokio::test]
async fn cyclic_bindings_fail_with_depth_error() -> Result<()> {
    let settings = Settings {
        max_binding_depth: 6,
        ..Settings::default()
    };
    let (_, _, session) = scripted_session(settings);
    locate(&session, "left pane", "id", "$[right pane]");
    locate(&session, "right pane", "id", "$[left pane]");

    let err = session.get_attribute("left pane").await.unwrap_err();
    assert!(matches!(
        err,
        WebbindError::Binding(BindingError::InterpolationDepthExceeded { limit: 6, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn base_properties_are_used_before_live_text() -> Result<()> {
    let mut settings = Settings::default();
    settings
        .properties
        .insert("base url".to_string(), "https://example.test".to_string());
    let (driver, _, session) = scripted_session(settings);
    locate(&session, "base url", "id", "base");

    assert_eq!(session.get_attribute("base url").await?, "https://example.test");
    assert!(driver.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn unbound_name_without_locator_is_unbound() -> Result<()> {
    let (_, _, session) = scripted_session(Settings::default());

    let err = session.get_attribute("nobody bound me").await.unwrap_err();

    assert!(matches!(
        err,
        WebbindError::Binding(BindingError::UnboundAttribute(ref name)) if name == "nobody bound me"
    ));
    Ok(())
}

#[tokio::test]
async fn sysproc_runs_the_interpolated_command() -> Result<()> {
    let (_, evaluators, session) = scripted_session(Settings::default());
    session.bind("greeting", "hi");
    session.bind("echo/sysproc", "echo $[greeting]");

    assert_eq!(session.get_attribute("echo").await?, "ran(echo hi)");
    assert_eq!(evaluators.calls(), vec!["sysproc: echo hi"]);
    Ok(())
}
