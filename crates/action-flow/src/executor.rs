//! Flow engine: the bounded detect/execute loop

use std::sync::Arc;

use sharecode_core_types::RunResult;
use tracing::{debug, info, warn, Instrument};

use crate::context::RunContext;
use crate::detector::{Detection, StepDetector};
use crate::diagnostics::{capture_debug, DiagnosticArtifact};
use crate::errors::FlowError;
use crate::step::StepCatalog;

/// Drives one run from the start location to a [`RunResult`].
#[derive(Debug, Clone)]
pub struct FlowEngine {
    catalog: Arc<StepCatalog>,
}

impl FlowEngine {
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    /// Navigate to `start_url` and alternate detection and execution until a
    /// step sets the result.
    ///
    /// Step failures propagate unchanged. Closing the surface and capturing
    /// error diagnostics are left to the caller.
    pub async fn run(&self, ctx: &mut RunContext, start_url: &str) -> Result<RunResult, FlowError> {
        let span = ctx.span().clone();
        self.drive(ctx, start_url).instrument(span).await
    }

    async fn drive(&self, ctx: &mut RunContext, start_url: &str) -> Result<RunResult, FlowError> {
        let detector = StepDetector::new(ctx.options.detect_retries);
        let max_steps = ctx.options.max_steps;

        if let Err(err) = tokio::fs::create_dir_all(&ctx.options.output_dir).await {
            warn!(dir = %ctx.options.output_dir.display(), %err, "failed to create output directory");
        }

        info!(%start_url, "navigating to start location");
        ctx.surface.goto(start_url).await?;

        for iteration in 1..=max_steps {
            let detection = detector
                .detect(&self.catalog, ctx.surface.as_ref(), &ctx.wait)
                .await;
            let step = match detection {
                Detection::Matched(step) => step,
                other => {
                    let identity = ctx.surface.current_identity().await;
                    debug!(?other, %identity, "no step matched");
                    let artifact = self.capture(ctx, "unknown-page").await;
                    return Err(FlowError::Detection {
                        message: format!("Unable to detect current page ({identity})"),
                        artifact: artifact.primary(),
                    });
                }
            };

            info!(step = step.id(), iteration, "executing step");
            if ctx.options.capture_steps {
                self.capture(ctx, &format!("step-{}", step.id())).await;
            }

            step.execute(ctx).await?;

            if let Some(result) = ctx.result() {
                info!(share_code = %result.share_code, "run completed");
                return Ok(result.clone());
            }
        }

        Err(FlowError::detection(
            "Exceeded maximum number of steps without completion",
        ))
    }

    /// Best-effort snapshot and markup dump under `<output_dir>/debug`.
    pub async fn capture(&self, ctx: &RunContext, label: &str) -> DiagnosticArtifact {
        capture_debug(ctx.surface(), &ctx.options.debug_dir(), label).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoCodeProvider;
    use crate::step::Step;
    use action_primitives::testing::{FakeElement, FakePage, ScriptedSurface};
    use action_primitives::{Locator, Surface, TextMatch, WaitPolicy};
    use async_trait::async_trait;
    use sharecode_core_types::{AuthMethod, Credentials, DateOfBirth};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn credentials() -> Credentials {
        Credentials {
            auth: AuthMethod::Passport("123456789".into()),
            date_of_birth: DateOfBirth {
                day: 1,
                month: 2,
                year: 1990,
            },
            preferred_two_factor: None,
        }
    }

    fn fast_wait() -> WaitPolicy {
        WaitPolicy {
            poll_interval_ms: 1,
            presence_timeout_ms: 5,
            action_timeout_ms: 20,
        }
    }

    fn context(surface: Arc<ScriptedSurface>, out: &std::path::Path) -> RunContext {
        let mut ctx = RunContext::new(surface, credentials(), Arc::new(NoCodeProvider))
            .with_wait_policy(fast_wait());
        ctx.options.output_dir = out.to_path_buf();
        ctx
    }

    /// Clicks `Next` on `page`; the final page sets the result instead.
    struct PageStep {
        id: &'static str,
        page: &'static str,
        finish: bool,
        executions: AtomicUsize,
    }

    impl PageStep {
        fn new(id: &'static str, page: &'static str, finish: bool) -> Arc<Self> {
            Arc::new(Self {
                id,
                page,
                finish,
                executions: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Step for PageStep {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn detect(&self, surface: &dyn Surface, _wait: &WaitPolicy) -> bool {
            surface.current_identity().await == self.page
        }

        async fn execute(&self, ctx: &mut RunContext) -> Result<(), FlowError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            if self.finish {
                return ctx.set_result(RunResult {
                    artifact_path: PathBuf::from("share.pdf"),
                    share_code: "ABC DEF GHI".into(),
                    valid_until: None,
                });
            }
            ctx.wait
                .click_when_visible(ctx.surface(), &Locator::button(TextMatch::exact("Next")))
                .await?;
            Ok(())
        }
    }

    fn linked_pages(surface: &ScriptedSurface) {
        surface.add_page(
            FakePage::new("https://t/1")
                .with_element(FakeElement::button("Next").navigates_to("https://t/2")),
        );
        surface.add_page(FakePage::new("https://t/2"));
    }

    #[tokio::test]
    async fn returns_result_and_stops_executing() {
        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(ScriptedSurface::new(dir.path()));
        linked_pages(&surface);

        let first = PageStep::new("first", "https://t/1", false);
        let last = PageStep::new("last", "https://t/2", true);
        let catalog = StepCatalog::new(vec![first.clone() as Arc<dyn Step>, last.clone()]).unwrap();
        let engine = FlowEngine::new(Arc::new(catalog));

        let mut ctx = context(surface.clone(), dir.path());
        let result = engine.run(&mut ctx, "https://t/1").await.unwrap();
        assert_eq!(result.share_code, "ABC DEF GHI");
        assert_eq!(first.executions.load(Ordering::SeqCst), 1);
        assert_eq!(last.executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_page_fails_detection_with_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(ScriptedSurface::new(dir.path()));
        let catalog = StepCatalog::new(vec![PageStep::new("x", "https://t/x", true) as Arc<dyn Step>])
            .unwrap();
        let engine = FlowEngine::new(Arc::new(catalog));

        let mut ctx = context(surface, dir.path());
        let err = engine.run(&mut ctx, "https://t/nowhere").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Detection);
        let artifact = err.artifact().cloned().unwrap();
        assert!(artifact.ends_with("debug/unknown-page.png"));
        assert!(artifact.exists());
    }

    #[tokio::test]
    async fn step_bound_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(ScriptedSurface::new(dir.path()));
        surface.add_page(FakePage::new("https://t/loop").with_element(FakeElement::button("Next")));
        let looping = PageStep::new("loop", "https://t/loop", false);
        let catalog = StepCatalog::new(vec![looping.clone() as Arc<dyn Step>]).unwrap();
        let engine = FlowEngine::new(Arc::new(catalog));

        let mut ctx = context(surface, dir.path());
        ctx.options.max_steps = 4;
        let err = engine.run(&mut ctx, "https://t/loop").await.unwrap_err();
        assert_eq!(err.to_string(), "Exceeded maximum number of steps without completion");
        assert_eq!(looping.executions.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn execute_failures_propagate_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(ScriptedSurface::new(dir.path()));
        surface.add_page(FakePage::new("https://t/1"));
        let broken = PageStep::new("broken", "https://t/1", false);
        let catalog = StepCatalog::new(vec![broken.clone() as Arc<dyn Step>]).unwrap();
        let engine = FlowEngine::new(Arc::new(catalog));

        let mut ctx = context(surface, dir.path());
        let err = engine.run(&mut ctx, "https://t/1").await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::Structural(action_primitives::ActionError::SelectorNotFound(_))
        ));
        assert_eq!(broken.executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn per_step_capture_writes_labelled_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(ScriptedSurface::new(dir.path()));
        linked_pages(&surface);
        let catalog = StepCatalog::new(vec![
            PageStep::new("first", "https://t/1", false) as Arc<dyn Step>,
            PageStep::new("last", "https://t/2", true),
        ])
        .unwrap();
        let engine = FlowEngine::new(Arc::new(catalog));

        let mut ctx = context(surface, dir.path());
        ctx.options.capture_steps = true;
        engine.run(&mut ctx, "https://t/1").await.unwrap();
        assert!(dir.path().join("debug/step-first.png").exists());
        assert!(dir.path().join("debug/step-last.html").exists());
    }
}
