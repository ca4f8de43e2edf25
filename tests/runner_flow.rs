use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use action_flow::{ErrorKind, FlowEngine, RunOptions};
use action_primitives::testing::{FakeElement, FakePage, ScriptedSurface};
use action_primitives::{ActionError, Locator, Surface, SurfaceLauncher, TextMatch, WaitPolicy};
use async_trait::async_trait;
use code_broker::TwoFactorExchange;
use sharecode_cli::runner::{submit_candidate, CodeNotifier, RunRequest, SessionRunner};
use sharecode_core_types::{
    AuthMethod, Credentials, DateOfBirth, Purpose, RequesterKey, TwoFactorMethod,
};
use sharecode_recipes::default_catalog;
use sharecode_recipes::pages::{buttons, headings};
use tokio::sync::mpsc;

const BASE: &str = "https://evisa.test";

/// Hands out the same scripted surface on every launch.
struct ScriptedLauncher(Arc<ScriptedSurface>);

#[async_trait]
impl SurfaceLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Arc<dyn Surface>, ActionError> {
        Ok(self.0.clone())
    }
}

fn code_page(staging: &Path) -> Arc<ScriptedSurface> {
    let surface = Arc::new(ScriptedSurface::new(staging));
    surface.add_page(FakePage::new(format!("{BASE}/security-code")).with_elements(vec![
        FakeElement::heading(headings::CODE_PHONE),
        FakeElement::input("Security code"),
        FakeElement::button(buttons::CONTINUE).navigates_to(format!("{BASE}/locked")),
    ]));
    surface.add_page(
        FakePage::new(format!("{BASE}/locked"))
            .with_element(FakeElement::heading("Your account is locked")),
    );
    surface
}

fn runner(surface: Arc<ScriptedSurface>, output: &Path) -> SessionRunner {
    let catalog = default_catalog().unwrap();
    SessionRunner::new(
        Arc::new(ScriptedLauncher(surface)),
        FlowEngine::new(Arc::new(catalog)),
        Arc::new(TwoFactorExchange::new()),
        format!("{BASE}/security-code"),
    )
    .with_options(RunOptions {
        output_dir: output.to_path_buf(),
        two_factor_timeout: Duration::from_secs(5),
        ..RunOptions::default()
    })
    .with_wait_policy(WaitPolicy {
        poll_interval_ms: 1,
        presence_timeout_ms: 3,
        action_timeout_ms: 50,
    })
}

fn request(key: &str) -> RunRequest {
    RunRequest {
        key: RequesterKey::new(key),
        label: "Jane".into(),
        credentials: Credentials {
            auth: AuthMethod::Passport("123456789".into()),
            date_of_birth: DateOfBirth {
                day: 7,
                month: 3,
                year: 1990,
            },
            preferred_two_factor: None,
        },
        purpose: Purpose::RightToWork,
        output_file: None,
    }
}

#[tokio::test]
async fn submitted_code_reaches_the_page_and_failures_are_diagnosed() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let surface = code_page(staging.path());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let notifier: CodeNotifier = Arc::new(
        move |key: &RequesterKey, method: TwoFactorMethod, label: &str| {
            let _ = tx.send((key.clone(), method, label.to_string()));
        },
    );
    let runner = runner(surface.clone(), output.path()).with_notifier(notifier);
    let exchange = runner.exchange().clone();

    let run = tokio::spawn(async move { runner.execute(request("+447700900123")).await });

    let (key, method, label) = rx.recv().await.unwrap();
    assert_eq!(key, RequesterKey::new("+447700900123"));
    assert_eq!(method, TwoFactorMethod::Sms);
    assert_eq!(label, "Jane");

    while !exchange.has_pending(&key) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(!submit_candidate(&exchange, &RequesterKey::new("someone-else"), "123456"));
    assert!(submit_candidate(&exchange, &key, "123456"));

    let failure = run.await.unwrap().unwrap_err();
    assert_eq!(failure.error.kind(), ErrorKind::Detection);
    let artifact = failure.artifact.clone().unwrap();
    assert!(artifact.ends_with("debug/unknown-page.png"));
    assert!(!output.path().join("debug/error.png").exists());
    assert_eq!(failure.report().kind, "detection");

    assert_eq!(
        surface.value_on(
            &format!("{BASE}/security-code"),
            &Locator::label(TextMatch::contains("Security code"))
        ),
        Some("123456".to_string())
    );
    assert!(surface.is_closed());
    assert_eq!(exchange.pending_count(), 0);
}

#[tokio::test]
async fn unanswered_code_request_times_out_and_closes() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let surface = code_page(staging.path());
    let runner = runner(surface.clone(), output.path()).with_options(RunOptions {
        output_dir: output.path().to_path_buf(),
        two_factor_timeout: Duration::from_millis(50),
        ..RunOptions::default()
    });

    let failure = runner.execute(request("bob")).await.unwrap_err();
    assert_eq!(failure.error.kind(), ErrorKind::TwoFactorTimeout);
    assert_eq!(failure.error.to_string(), "2FA timeout for Jane");
    assert_eq!(
        failure.artifact.as_deref(),
        Some(output.path().join("debug/error.png").as_path())
    );
    assert!(surface.is_closed());
    assert!(!runner.exchange().has_pending(&RequesterKey::new("bob")));
}
