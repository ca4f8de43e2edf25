use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use action_flow::{CodeProvider, ErrorKind, FlowEngine, FlowError, RunContext};
use action_primitives::testing::{FakeElement, FakePage, ScriptedSurface};
use action_primitives::{Locator, TextMatch, WaitPolicy};
use async_trait::async_trait;
use chrono::NaiveDate;
use sharecode_core_types::{AuthMethod, Credentials, DateOfBirth, Purpose, TwoFactorMethod};
use sharecode_recipes::default_catalog;
use sharecode_recipes::pages::{buttons, headings, purpose_label};
use tokio::time::Instant;

const BASE: &str = "https://evisa.test";

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

fn continue_to(path: &str) -> FakeElement {
    FakeElement::button(buttons::CONTINUE).navigates_to(url(path))
}

/// Every page of the flow, linked in order.
fn scripted_site(staging: &Path) -> Arc<ScriptedSurface> {
    let surface = Arc::new(ScriptedSurface::new(staging));
    let pages = vec![
        FakePage::new(url("/start")).with_elements(vec![
            FakeElement::heading(headings::ENTRY),
            FakeElement::button(buttons::ACCEPT_ADDITIONAL_COOKIES),
            FakeElement::link(headings::ENTRY).navigates_to(url("/document-type")),
        ]),
        FakePage::new(url("/document-type")).with_elements(vec![
            FakeElement::heading(headings::DOCUMENT_TYPE),
            FakeElement::radio("Passport"),
            FakeElement::radio("National identity card"),
            continue_to("/document-number"),
        ]),
        FakePage::new(url("/document-number")).with_elements(vec![
            FakeElement::heading(headings::PASSPORT_NUMBER),
            FakeElement::input("Passport number"),
            continue_to("/date-of-birth"),
        ]),
        FakePage::new(url("/date-of-birth")).with_elements(vec![
            FakeElement::heading(headings::DATE_OF_BIRTH),
            FakeElement::input("Day"),
            FakeElement::input("Month"),
            FakeElement::input("Year"),
            continue_to("/security-method"),
        ]),
        FakePage::new(url("/security-method")).with_elements(vec![
            FakeElement::heading(headings::TWO_FACTOR_METHOD),
            FakeElement::radio("By text message"),
            FakeElement::radio("By email"),
            continue_to("/security-code"),
        ]),
        FakePage::new(url("/security-code")).with_elements(vec![
            FakeElement::heading(headings::CODE_PHONE),
            FakeElement::input("Security code"),
            continue_to("/status"),
        ]),
        FakePage::new(url("/status")).with_elements(vec![
            FakeElement::heading(headings::STATUS),
            FakeElement::button(buttons::ACCEPT_ANALYTICS),
            FakeElement::link(buttons::GET_A_SHARE_CODE).navigates_to(url("/purpose")),
        ]),
        FakePage::new(url("/purpose")).with_elements(vec![
            FakeElement::heading(headings::PURPOSE),
            FakeElement::radio(purpose_label(Purpose::RightToWork)),
            FakeElement::radio(purpose_label(Purpose::RightToRent)),
            FakeElement::radio(purpose_label(Purpose::ImmigrationStatusOther)),
            continue_to("/confirm"),
        ]),
        FakePage::new(url("/confirm")).with_elements(vec![
            FakeElement::heading(headings::CONFIRMATION),
            FakeElement::button(buttons::STAY_SIGNED_IN),
            FakeElement::link(buttons::GET_SHARE_CODE).navigates_to(url("/summary")),
        ]),
        FakePage::new(url("/summary"))
            .with_elements(vec![
                FakeElement::heading(headings::SUMMARY),
                FakeElement::link(buttons::CREATE_SHARE_CODE).navigates_to(url("/details")),
            ])
            .with_definition("Name", "JANE MARY DOE"),
        FakePage::new(url("/details"))
            .with_elements(vec![
                FakeElement::heading(headings::DETAILS),
                FakeElement::link(buttons::DOWNLOAD_PDF).downloads("share-code.pdf"),
            ])
            .with_definition("Name", "SOMEBODY ELSE")
            .with_body_text(
                "Details you need to share\nShare code\nWK7 P2X 9QR\n\
                 The share code is valid until 14 March 2025.",
            ),
    ];
    for page in pages {
        surface.add_page(page);
    }
    surface
}

struct FixedCode {
    code: &'static str,
    asked: Mutex<Vec<TwoFactorMethod>>,
}

#[async_trait]
impl CodeProvider for FixedCode {
    async fn provide(
        &self,
        method: TwoFactorMethod,
        _label: &str,
        _deadline: Instant,
    ) -> Result<String, FlowError> {
        self.asked.lock().unwrap().push(method);
        Ok(self.code.to_string())
    }
}

struct Silent;

#[async_trait]
impl CodeProvider for Silent {
    async fn provide(
        &self,
        _method: TwoFactorMethod,
        _label: &str,
        _deadline: Instant,
    ) -> Result<String, FlowError> {
        std::future::pending().await
    }
}

fn credentials() -> Credentials {
    Credentials {
        auth: AuthMethod::Passport("123456789".into()),
        date_of_birth: DateOfBirth {
            day: 7,
            month: 3,
            year: 1990,
        },
        preferred_two_factor: None,
    }
}

fn fast_wait() -> WaitPolicy {
    WaitPolicy {
        poll_interval_ms: 1,
        presence_timeout_ms: 3,
        action_timeout_ms: 50,
    }
}

fn context(
    surface: Arc<ScriptedSurface>,
    provider: Arc<dyn CodeProvider>,
    output_dir: &Path,
) -> RunContext {
    let mut ctx = RunContext::new(surface, credentials(), provider)
        .with_label("Jane")
        .with_wait_policy(fast_wait());
    ctx.options.output_dir = output_dir.to_path_buf();
    ctx
}

fn engine() -> FlowEngine {
    FlowEngine::new(Arc::new(default_catalog().unwrap()))
}

#[tokio::test]
async fn full_flow_produces_share_code_and_pdf() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let surface = scripted_site(staging.path());
    let provider = Arc::new(FixedCode {
        code: "123456",
        asked: Default::default(),
    });
    let mut ctx = context(surface.clone(), provider.clone(), output.path());

    let result = engine().run(&mut ctx, &url("/start")).await.unwrap();

    assert_eq!(result.share_code, "WK7 P2X 9QR");
    assert_eq!(result.valid_until, NaiveDate::from_ymd_opt(2025, 3, 14));
    // The name captured on the summary page wins over the details list.
    let expected = output.path().join("EVISA_DOE_JANE_2025-03-14.pdf");
    assert_eq!(result.artifact_path, expected);
    assert!(expected.exists());
    assert!(!staging.path().join("share-code.pdf").exists());

    assert_eq!(*provider.asked.lock().unwrap(), vec![TwoFactorMethod::Sms]);
    assert_eq!(
        surface
            .value_on(&url("/document-number"), &Locator::label(TextMatch::exact("Passport number")))
            .as_deref(),
        Some("123456789")
    );
    assert_eq!(
        surface
            .value_on(&url("/date-of-birth"), &Locator::label(TextMatch::exact("Year")))
            .as_deref(),
        Some("1990")
    );
    assert_eq!(
        surface
            .value_on(&url("/security-code"), &Locator::label(TextMatch::exact("Security code")))
            .as_deref(),
        Some("123456")
    );
    assert!(surface.is_checked_on(
        &url("/purpose"),
        &Locator::radio(TextMatch::exact(purpose_label(Purpose::ImmigrationStatusOther)))
    ));
    assert!(surface.is_checked_on(
        &url("/security-method"),
        &Locator::radio(TextMatch::exact("By text message"))
    ));

    let clicks = surface.clicks();
    assert!(clicks.iter().any(|c| c.contains(buttons::ACCEPT_ADDITIONAL_COOKIES)));
    assert!(clicks.iter().any(|c| c.contains(buttons::ACCEPT_ANALYTICS)));
    assert!(clicks.iter().any(|c| c.contains(buttons::STAY_SIGNED_IN)));
    assert_eq!(ctx.extracted.name(), Some("JANE MARY DOE"));
}

#[tokio::test]
async fn preferred_email_and_output_file_are_honoured() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let surface = scripted_site(staging.path());
    let provider = Arc::new(FixedCode {
        code: "9999",
        asked: Default::default(),
    });
    let mut ctx = context(surface.clone(), provider, output.path()).with_purpose(Purpose::RightToWork);
    ctx.credentials.preferred_two_factor = Some(TwoFactorMethod::Email);
    ctx.options.output_file = Some("custom/share.pdf".into());

    let result = engine().run(&mut ctx, &url("/start")).await.unwrap();

    assert_eq!(result.artifact_path, output.path().join("custom/share.pdf"));
    assert!(result.artifact_path.exists());
    assert!(surface.is_checked_on(
        &url("/security-method"),
        &Locator::radio(TextMatch::exact("By email"))
    ));
    assert!(surface.is_checked_on(
        &url("/purpose"),
        &Locator::radio(TextMatch::exact(purpose_label(Purpose::RightToWork)))
    ));
}

#[tokio::test]
async fn missing_code_times_out() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let surface = scripted_site(staging.path());
    let mut ctx = context(surface, Arc::new(Silent), output.path());
    ctx.options.two_factor_timeout = Duration::from_millis(50);

    let err = engine()
        .run(&mut ctx, &url("/security-code"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TwoFactorTimeout);
    assert_eq!(err.to_string(), "2FA timeout for Jane");
}

#[tokio::test]
async fn unrecognised_page_is_a_detection_failure() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let surface = scripted_site(staging.path());
    surface.add_page(
        FakePage::new(url("/maintenance")).with_element(FakeElement::heading("Service unavailable")),
    );
    let mut ctx = context(surface, Arc::new(Silent), output.path());

    let err = engine()
        .run(&mut ctx, &url("/maintenance"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Detection);
    assert!(err
        .artifact()
        .is_some_and(|path| path.starts_with(output.path().join("debug"))));
}
