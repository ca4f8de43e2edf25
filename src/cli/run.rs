use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use serde::Serialize;
use sharecode_core_types::{
    AuthMethod, Credentials, DateOfBirth, DocumentKind, Purpose, RequesterKey, RunResult,
    TwoFactorMethod,
};
use tracing::info;

use super::context::CliContext;
use super::input::{spawn_code_router, stdin_lines, CodeRouting};
use super::output;
use crate::config::AppConfig;
use crate::profile::{load_profiles, Profile};
use crate::runner::{CodeNotifier, RunRequest};

const DEFAULT_KEY: &str = "cli";

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Profiles file; the entry matching --key (or the only entry) is used
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Requester key, used to pick a profile and to address codes
    #[arg(long)]
    pub key: Option<String>,

    /// Identity document: passport, national-id, brc or ukvi
    #[arg(long, value_name = "TYPE")]
    pub document_type: Option<DocumentKind>,

    /// Document or UKVI customer number
    #[arg(long, value_name = "NUMBER")]
    pub document_number: Option<String>,

    /// Date of birth as DD-MM-YYYY
    #[arg(long, value_name = "DATE")]
    pub dob: Option<DateOfBirth>,

    /// Preferred security code delivery: sms or email
    #[arg(long, value_name = "METHOD")]
    pub two_factor: Option<TwoFactorMethod>,

    /// Why the share code is needed: work, rent or other
    #[arg(long)]
    pub purpose: Option<Purpose>,

    /// Name used in prompts and logs
    #[arg(long)]
    pub label: Option<String>,

    /// Where to save the PDF; relative paths resolve under the output dir
    #[arg(long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Directory for artifacts and diagnostics
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Read the security code from stdin without prompting
    #[arg(long)]
    pub code_stdin: bool,

    /// Capture a snapshot before every step
    #[arg(long)]
    pub capture_steps: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// How long to wait for the security code (e.g. 5m)
    #[arg(long, value_name = "DURATION")]
    pub code_timeout: Option<String>,

    /// Override the start page
    #[arg(long, value_name = "URL")]
    pub start_url: Option<String>,
}

#[derive(Serialize)]
struct RunOutcome<'a> {
    key: &'a RequesterKey,
    #[serde(flatten)]
    result: &'a RunResult,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let config = apply_overrides(ctx.config().clone(), &args)?;
    let request = build_request(&args)?;
    let key = request.key.clone();

    let prompt = !args.code_stdin;
    let notifier: CodeNotifier = Arc::new(
        move |_key: &RequesterKey, method: TwoFactorMethod, label: &str| {
            if prompt {
                eprintln!("Enter the security code sent by {method} for {label}:");
            }
        },
    );
    let runner = ctx.runner(&config, notifier)?;
    let router = spawn_code_router(
        runner.exchange().clone(),
        CodeRouting::Single(key.clone()),
        stdin_lines(),
    );

    info!(%key, label = %request.label, "starting run");
    let outcome = runner.execute(request).await;
    router.abort();

    match outcome {
        Ok(result) => output::print(
            ctx.output(),
            &RunOutcome {
                key: &key,
                result: &result,
            },
            |o| human_result(o.result),
        ),
        Err(failure) => {
            let report = failure.report();
            if let Some(path) = &report.artifact {
                eprintln!("Diagnostics saved to {}", path.display());
            }
            Err(anyhow::Error::new(failure).context(format!("run for {key} failed ({})", report.kind)))
        }
    }
}

pub(crate) fn human_result(result: &RunResult) -> String {
    let valid = result
        .valid_until
        .map(|d| d.format("%-d %B %Y").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "Share code: {}\nValid until: {}\nSaved to: {}",
        result.share_code,
        valid,
        result.artifact_path.display()
    )
}

fn apply_overrides(mut config: AppConfig, args: &RunArgs) -> Result<AppConfig> {
    if let Some(dir) = &args.output_dir {
        config.flow.output_dir = dir.clone();
    }
    if args.capture_steps {
        config.flow.capture_steps = true;
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(timeout) = &args.code_timeout {
        config.flow.two_factor_timeout = timeout.clone();
    }
    if let Some(url) = &args.start_url {
        config.start_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Combine the profile (if any) with flag overrides into one request.
fn build_request(args: &RunArgs) -> Result<RunRequest> {
    let mut profile = match &args.profile {
        Some(path) => select_profile(load_profiles(path)?, args.key.as_deref())?,
        None => Profile {
            key: RequesterKey::new(args.key.as_deref().unwrap_or(DEFAULT_KEY)),
            label: None,
            credentials: credentials_from_flags(args)?,
            purpose: Purpose::default(),
            output_file: None,
        },
    };

    if args.profile.is_some() && has_credential_flags(args) {
        profile.credentials = credentials_from_flags(args)?;
    }
    if let Some(method) = args.two_factor {
        profile.credentials.preferred_two_factor = Some(method);
    }
    if let Some(purpose) = args.purpose {
        profile.purpose = purpose;
    }
    if let Some(label) = &args.label {
        profile.label = Some(label.clone());
    }
    if let Some(file) = &args.output_file {
        profile.output_file = Some(file.clone());
    }
    profile
        .credentials
        .validate()
        .context("invalid credentials")?;
    Ok(profile.into_request())
}

fn has_credential_flags(args: &RunArgs) -> bool {
    args.document_type.is_some() || args.document_number.is_some() || args.dob.is_some()
}

fn credentials_from_flags(args: &RunArgs) -> Result<Credentials> {
    let (Some(kind), Some(number), Some(dob)) =
        (args.document_type, args.document_number.as_ref(), args.dob)
    else {
        bail!("--document-type, --document-number and --dob are required without --profile");
    };
    Ok(Credentials {
        auth: AuthMethod::new(kind, number.trim()),
        date_of_birth: dob,
        preferred_two_factor: args.two_factor,
    })
}

fn select_profile(profiles: Vec<Profile>, key: Option<&str>) -> Result<Profile> {
    match key {
        Some(key) => profiles
            .into_iter()
            .find(|p| p.key.as_str() == key)
            .ok_or_else(|| anyhow!("no profile with key `{key}`")),
        None if profiles.len() == 1 => profiles
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no profiles defined")),
        None => bail!(
            "{} profiles defined; choose one with --key or use `batch`",
            profiles.len()
        ),
    }
}
