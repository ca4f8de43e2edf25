use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Error raised when a domain value fails validation or parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("unknown {field} `{value}`")]
    Unknown { field: &'static str, value: String },
}

impl ValueError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Identity of whoever asked for a run. Keys the pending two-factor table and
/// labels queue items; one requester may own several runs over time.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct RequesterKey(pub String);

impl RequesterKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequesterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequesterKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel the one-time security code is delivered through.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TwoFactorMethod {
    Sms,
    Email,
}

impl TwoFactorMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            TwoFactorMethod::Sms => "sms",
            TwoFactorMethod::Email => "email",
        }
    }
}

impl fmt::Display for TwoFactorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TwoFactorMethod {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sms" | "text" | "phone" => Ok(TwoFactorMethod::Sms),
            "email" => Ok(TwoFactorMethod::Email),
            other => Err(ValueError::Unknown {
                field: "two-factor method",
                value: other.to_string(),
            }),
        }
    }
}

/// Identity document used to sign in, carrying its number.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde-full",
    serde(tag = "type", content = "number", rename_all = "camelCase")
)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AuthMethod {
    Passport(String),
    NationalId(String),
    Brc(String),
    Ukvi(String),
}

/// Document kind without the number, used for page label lookups.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DocumentKind {
    Passport,
    NationalId,
    Brc,
    Ukvi,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Passport,
        DocumentKind::NationalId,
        DocumentKind::Brc,
        DocumentKind::Ukvi,
    ];
}

impl FromStr for DocumentKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "passport" => Ok(DocumentKind::Passport),
            "nationalId" | "national-id" | "national_id" => Ok(DocumentKind::NationalId),
            "brc" => Ok(DocumentKind::Brc),
            "ukvi" => Ok(DocumentKind::Ukvi),
            other => Err(ValueError::Unknown {
                field: "document type",
                value: other.to_string(),
            }),
        }
    }
}

impl AuthMethod {
    pub fn new(kind: DocumentKind, number: impl Into<String>) -> Self {
        let number = number.into();
        match kind {
            DocumentKind::Passport => AuthMethod::Passport(number),
            DocumentKind::NationalId => AuthMethod::NationalId(number),
            DocumentKind::Brc => AuthMethod::Brc(number),
            DocumentKind::Ukvi => AuthMethod::Ukvi(number),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            AuthMethod::Passport(_) => DocumentKind::Passport,
            AuthMethod::NationalId(_) => DocumentKind::NationalId,
            AuthMethod::Brc(_) => DocumentKind::Brc,
            AuthMethod::Ukvi(_) => DocumentKind::Ukvi,
        }
    }

    pub fn number(&self) -> &str {
        match self {
            AuthMethod::Passport(n)
            | AuthMethod::NationalId(n)
            | AuthMethod::Brc(n)
            | AuthMethod::Ukvi(n) => n,
        }
    }

    pub fn validate(&self) -> Result<(), ValueError> {
        if self.number().trim().chars().count() < 3 {
            return Err(ValueError::invalid(
                "document number",
                "must be at least 3 characters",
            ));
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateOfBirth {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl DateOfBirth {
    pub fn validate(&self) -> Result<(), ValueError> {
        if !(1..=31).contains(&self.day) {
            return Err(ValueError::invalid("day", "must be within 1..=31"));
        }
        if !(1..=12).contains(&self.month) {
            return Err(ValueError::invalid("month", "must be within 1..=12"));
        }
        if !(1900..=2100).contains(&self.year) {
            return Err(ValueError::invalid("year", "must be within 1900..=2100"));
        }
        Ok(())
    }
}

/// Parses `DD-MM-YYYY`.
impl FromStr for DateOfBirth {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        let [day, month, year] = parts.as_slice() else {
            return Err(ValueError::invalid("date of birth", "expected DD-MM-YYYY"));
        };
        let parse = |field: &'static str, raw: &str| {
            raw.parse::<i64>()
                .map_err(|_| ValueError::invalid(field, format!("`{raw}` is not a number")))
        };
        let dob = DateOfBirth {
            day: parse("day", day)? as u32,
            month: parse("month", month)? as u32,
            year: parse("year", year)? as i32,
        };
        dob.validate()?;
        Ok(dob)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credentials {
    pub auth: AuthMethod,
    pub date_of_birth: DateOfBirth,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub preferred_two_factor: Option<TwoFactorMethod>,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), ValueError> {
        self.auth.validate()?;
        self.date_of_birth.validate()
    }
}

/// Reason given on the purpose page.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Purpose {
    RightToWork,
    RightToRent,
    #[default]
    ImmigrationStatusOther,
}

impl FromStr for Purpose {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "right_to_work" | "work" => Ok(Purpose::RightToWork),
            "right_to_rent" | "rent" => Ok(Purpose::RightToRent),
            "immigration_status_other" | "other" => Ok(Purpose::ImmigrationStatusOther),
            other => Err(ValueError::Unknown {
                field: "purpose",
                value: other.to_string(),
            }),
        }
    }
}

/// Terminal output of a completed flow.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunResult {
    pub artifact_path: PathBuf,
    pub share_code: String,
    pub valid_until: Option<NaiveDate>,
}
