use sbf_browser::{BrowserActions, BrowserEngine, BrowserError, Locator};
use sbf_core::BrowserConfig;

fn headless() -> BrowserConfig {
    BrowserConfig {
        headless: true,
        ..BrowserConfig::default()
    }
}

#[tokio::test]
#[ignore = "Requires Chrome/Chromium installed"]
async fn test_browser_engine_launch_and_shutdown() {
    let engine = BrowserEngine::launch(&headless()).await;
    assert!(engine.is_ok(), "Failed to launch browser engine");
    engine.unwrap().shutdown().await.expect("shutdown");
}

#[tokio::test]
#[ignore = "Requires Chrome/Chromium installed"]
async fn test_navigation_and_text() {
    let engine = BrowserEngine::launch(&headless()).await.unwrap();

    engine.navigate("https://example.com").await.expect("navigate");
    let heading = engine
        .extract_text(&Locator::css("h1"))
        .await
        .expect("heading text");
    assert!(!heading.is_empty());

    let missing = engine.extract_text(&Locator::xpath("//no-such-element")).await;
    assert!(matches!(missing, Err(BrowserError::ElementNotFound(_))));

    engine.shutdown().await.expect("shutdown");
}

#[tokio::test]
#[ignore = "Requires Chrome/Chromium installed"]
async fn test_select_missing_option_is_not_found() {
    let engine = BrowserEngine::launch(&headless()).await.unwrap();
    engine.navigate("https://example.com").await.expect("navigate");

    let err = engine
        .select_by_value(&Locator::css("select"), "0")
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    engine.shutdown().await.expect("shutdown");
}
