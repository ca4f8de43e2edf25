//! Per-run mutable state threaded through every step

use std::sync::Arc;

use action_primitives::{Surface, WaitPolicy};
use async_trait::async_trait;
use sharecode_core_types::{Credentials, Purpose, RunId, RunResult, TwoFactorMethod};
use tokio::time::Instant;
use tracing::{info, info_span, Span};

use crate::errors::FlowError;
use crate::types::{ExtractedData, RunOptions};

/// Supplies the one-time security code for a suspended run.
///
/// Implementations typically notify a human and then wait for their reply.
/// The caller races the returned future against `deadline`, so a provider
/// that never resolves still ends in a timeout.
#[async_trait]
pub trait CodeProvider: Send + Sync {
    async fn provide(
        &self,
        method: TwoFactorMethod,
        label: &str,
        deadline: Instant,
    ) -> Result<String, FlowError>;
}

#[async_trait]
impl<P> CodeProvider for Arc<P>
where
    P: CodeProvider + ?Sized,
{
    async fn provide(
        &self,
        method: TwoFactorMethod,
        label: &str,
        deadline: Instant,
    ) -> Result<String, FlowError> {
        (**self).provide(method, label, deadline).await
    }
}

/// Provider for runs that must never reach the code page.
pub struct NoCodeProvider;

#[async_trait]
impl CodeProvider for NoCodeProvider {
    async fn provide(
        &self,
        _method: TwoFactorMethod,
        _label: &str,
        _deadline: Instant,
    ) -> Result<String, FlowError> {
        Err(FlowError::domain("no security code source configured"))
    }
}

/// Mutable bag owned by exactly one engine run.
pub struct RunContext {
    pub run_id: RunId,
    pub label: String,
    pub surface: Arc<dyn Surface>,
    pub credentials: Credentials,
    pub purpose: Purpose,
    pub options: RunOptions,
    pub wait: WaitPolicy,
    pub extracted: ExtractedData,
    result: Option<RunResult>,
    code_provider: Arc<dyn CodeProvider>,
    span: Span,
}

impl RunContext {
    pub fn new(
        surface: Arc<dyn Surface>,
        credentials: Credentials,
        code_provider: Arc<dyn CodeProvider>,
    ) -> Self {
        let run_id = RunId::new();
        let label = run_id.to_string();
        let span = info_span!("run", run_id = %run_id, label = %label);
        Self {
            run_id,
            label,
            surface,
            credentials,
            purpose: Purpose::default(),
            options: RunOptions::default(),
            wait: WaitPolicy::default(),
            extracted: ExtractedData::default(),
            result: None,
            code_provider,
            span,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self.span = info_span!("run", run_id = %self.run_id, label = %self.label);
        self
    }

    pub fn with_purpose(mut self, purpose: Purpose) -> Self {
        self.purpose = purpose;
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Span every step of this run executes inside.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    /// Fill the result slot. A run produces at most one result.
    pub fn set_result(&mut self, result: RunResult) -> Result<(), FlowError> {
        if self.result.is_some() {
            return Err(FlowError::domain("result already set"));
        }
        self.result = Some(result);
        Ok(())
    }

    pub fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Ask the code provider for a security code, failing with
    /// [`FlowError::TwoFactorTimeout`] once the configured deadline passes.
    pub async fn request_code(&self, method: TwoFactorMethod) -> Result<String, FlowError> {
        let deadline = Instant::now() + self.options.two_factor_timeout;
        info!(%method, timeout = ?self.options.two_factor_timeout, "awaiting two-factor code");
        let pending = self.code_provider.provide(method, &self.label, deadline);
        match tokio::time::timeout_at(deadline, pending).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FlowError::TwoFactorTimeout {
                label: self.label.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::testing::ScriptedSurface;
    use sharecode_core_types::{AuthMethod, DateOfBirth};
    use std::path::PathBuf;
    use std::time::Duration;

    struct Never;

    #[async_trait]
    impl CodeProvider for Never {
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
                day: 1,
                month: 2,
                year: 1990,
            },
            preferred_two_factor: None,
        }
    }

    fn context(provider: Arc<dyn CodeProvider>) -> RunContext {
        let surface = Arc::new(ScriptedSurface::new(std::env::temp_dir()));
        RunContext::new(surface, credentials(), provider).with_label("alice")
    }

    #[test]
    fn result_slot_is_write_once() {
        let mut ctx = context(Arc::new(NoCodeProvider));
        let result = RunResult {
            artifact_path: PathBuf::from("a.pdf"),
            share_code: "ABC DEF GHI".into(),
            valid_until: None,
        };
        ctx.set_result(result.clone()).unwrap();
        assert!(matches!(ctx.set_result(result.clone()), Err(FlowError::Domain(_))));
        assert_eq!(ctx.result(), Some(&result));
    }

    #[tokio::test(start_paused = true)]
    async fn request_code_times_out_at_deadline() {
        let mut ctx = context(Arc::new(Never));
        ctx.options.two_factor_timeout = Duration::from_millis(100);
        let started = Instant::now();
        let err = ctx.request_code(TwoFactorMethod::Sms).await.unwrap_err();
        assert!(matches!(err, FlowError::TwoFactorTimeout { ref label } if label == "alice"));
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(100) && waited < Duration::from_secs(2));
    }
}
