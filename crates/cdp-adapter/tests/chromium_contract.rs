//! Contract tests against a real Chromium binary.
//!
//! Run with:
//! ```bash
//! export SHARECODE_USE_REAL_CHROME=1
//! export SHARECODE_CHROME=/usr/bin/google-chrome  # optional
//! cargo test -p cdp-adapter --test chromium_contract -- --nocapture
//! ```

use std::env;
use std::time::Duration;

use action_primitives::{Locator, Surface, TextMatch};
use cdp_adapter::{CdpConfig, ChromiumLauncher};

fn should_run_real_tests() -> bool {
    env::var("SHARECODE_USE_REAL_CHROME")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

const FORM: &str = "data:text/html,<html><body>\
    <h1>What is your passport number?</h1>\
    <label for=n>Passport number</label><input id=n type=text>\
    <fieldset><label><input type=radio name=p value=a>By text message</label>\
    <label><input type=radio name=p value=b>By email</label></fieldset>\
    <dl><dt>Name</dt><dd>JANE DOE</dd></dl>\
    <button>Continue</button></body></html>";

#[tokio::test]
async fn drives_a_simple_form() {
    if !should_run_real_tests() {
        println!("Skipping real browser test (SHARECODE_USE_REAL_CHROME not set)");
        return;
    }

    let cfg = CdpConfig {
        headless: true,
        nav_timeout_ms: 15_000,
        ..CdpConfig::default()
    };
    let surface = ChromiumLauncher::new(cfg)
        .launch_surface()
        .await
        .expect("launch chromium");

    surface.goto(FORM).await.expect("navigate");
    surface.wait_for_settled().await.expect("settle");

    assert_eq!(
        surface
            .count(&Locator::heading("passport number"))
            .await
            .unwrap(),
        1
    );
    let field = Locator::label(TextMatch::exact("Passport number"));
    surface.fill(&field, "123456789").await.expect("fill");
    surface
        .check(&Locator::radio(TextMatch::contains("email")))
        .await
        .expect("check");
    assert_eq!(
        surface
            .inner_text(&Locator::description_value("Name"))
            .await
            .unwrap(),
        "JANE DOE"
    );
    assert!(surface
        .is_visible(&Locator::button(TextMatch::exact("Continue")))
        .await
        .unwrap());
    assert!(surface
        .click(&Locator::button(TextMatch::exact("Missing")))
        .await
        .is_err());
    assert!(!surface.capture_snapshot().await.unwrap().is_empty());
    assert!(surface.capture_content().await.unwrap().contains("Passport number"));
    assert!(surface
        .await_download_artifact(Duration::from_millis(300))
        .await
        .is_err());

    surface.close().await.expect("close");
}
