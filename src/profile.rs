//! Requester profiles read from YAML
//!
//! ```yaml
//! profiles:
//!   - key: "+447700900123"
//!     label: Jane
//!     credentials:
//!       auth: { type: passport, number: "123456789" }
//!       date_of_birth: { day: 7, month: 3, year: 1990 }
//!       preferred_two_factor: sms
//!     purpose: right_to_work
//! ```
//!
//! A file holding a single profile mapping (no `profiles:` list) is accepted
//! too.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sharecode_core_types::{Credentials, Purpose, RequesterKey};

use crate::runner::RunRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Who receives the 2FA prompt and submits the code
    pub key: RequesterKey,
    #[serde(default)]
    pub label: Option<String>,
    pub credentials: Credentials,
    #[serde(default)]
    pub purpose: Purpose,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

impl Profile {
    pub fn label(&self) -> String {
        self.label
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| self.key.to_string())
    }

    pub fn into_request(self) -> RunRequest {
        let label = self.label();
        RunRequest {
            key: self.key,
            label,
            credentials: self.credentials,
            purpose: self.purpose,
            output_file: self.output_file,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileDocument {
    Many { profiles: Vec<Profile> },
    One(Profile),
}

/// Parse and validate profiles. Keys must be unique within one document.
pub fn parse_profiles(source: &str) -> Result<Vec<Profile>> {
    let document: ProfileDocument =
        serde_yaml::from_str(source).context("Failed to parse profiles")?;
    let profiles = match document {
        ProfileDocument::Many { profiles } => profiles,
        ProfileDocument::One(profile) => vec![profile],
    };
    if profiles.is_empty() {
        bail!("no profiles defined");
    }

    let mut seen = HashSet::new();
    for (index, profile) in profiles.iter().enumerate() {
        profile
            .credentials
            .validate()
            .with_context(|| format!("profile #{} ({})", index + 1, profile.key))?;
        if !seen.insert(profile.key.clone()) {
            bail!("duplicate profile key `{}`", profile.key);
        }
    }
    Ok(profiles)
}

pub fn load_profiles(path: &Path) -> Result<Vec<Profile>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profiles from {}", path.display()))?;
    parse_profiles(&source).with_context(|| format!("in {}", path.display()))
}
