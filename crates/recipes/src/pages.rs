//! Visible text the steps key on

use sharecode_core_types::{DocumentKind, Purpose};

pub mod headings {
    pub const ENTRY: &str = "View your eVisa and get a share code";
    pub const DOCUMENT_TYPE: &str =
        "Which identity document do you use to sign in to your UKVI account?";
    pub const PASSPORT_NUMBER: &str = "What is your passport number?";
    pub const NATIONAL_ID_NUMBER: &str = "What is your national identity card number?";
    pub const BRC_NUMBER: &str = "What is your biometric residence card or permit number?";
    pub const UKVI_NUMBER: &str = "What is your UKVI customer number?";
    pub const DATE_OF_BIRTH: &str = "What is your date of birth?";
    pub const TWO_FACTOR_METHOD: &str = "How do you want to receive a security code?";
    pub const CODE_PHONE: &str = "Check your phone";
    pub const CODE_EMAIL: &str = "Check your email";
    pub const STATUS: &str = "Your immigration status (eVisa)";
    pub const PROVE_STATUS: &str = "Prove your status";
    pub const PURPOSE: &str = "Why do you need a share code?";
    pub const CONFIRMATION: &str = "Get a share code to prove your status";
    pub const SUMMARY: &str = "Summary of what they can do in the UK";
    pub const DETAILS: &str = "Details you need to share";

    pub const DOCUMENT_NUMBERS: [&str; 4] = [
        PASSPORT_NUMBER,
        NATIONAL_ID_NUMBER,
        BRC_NUMBER,
        UKVI_NUMBER,
    ];
}

pub mod buttons {
    pub const CONTINUE: &str = "Continue";
    pub const ACCEPT_ADDITIONAL_COOKIES: &str = "Accept additional cookies";
    pub const ACCEPT_ANALYTICS: &str = "Accept analytics cookies";
    pub const REJECT_ANALYTICS: &str = "Reject analytics cookies";
    pub const STAY_SIGNED_IN: &str = "Stay signed in";
    pub const GET_A_SHARE_CODE: &str = "Get a share code";
    pub const GET_SHARE_CODE: &str = "Get share code";
    pub const CREATE_SHARE_CODE: &str = "Create a share code";
    pub const DOWNLOAD_PDF: &str = "Download PDF";
}

pub mod selectors {
    pub const ENTRY_HREF: &str = "a[href*=\"view-immigration-status\"]";
    pub const GOVUK_LINK_BUTTON: &str = "a.govuk-button";
    pub const GET_SHARE_CODE_HREF: &str = "a[href=\"/get-share-code\"]";
    pub const SHARE_HREF: &str = "a[href=\"/share\"]";
    pub const CREATE_CODE_HREF: &str = "a[href^=\"/share/\"][href$=\"/code\"]";
    pub const SECURITY_CODE_LABEL: &str = "Security code";
}

pub fn document_type_label(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Passport => "Passport",
        DocumentKind::NationalId => "National identity card",
        DocumentKind::Brc => "Biometric residence card or permit",
        DocumentKind::Ukvi => "I use a UKVI customer number",
    }
}

pub fn document_number_label(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Passport => "Passport number",
        DocumentKind::NationalId => "National identity card number",
        DocumentKind::Brc => "Biometric residence card or permit number",
        DocumentKind::Ukvi => "UKVI customer number",
    }
}

pub fn document_number_heading(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Passport => headings::PASSPORT_NUMBER,
        DocumentKind::NationalId => headings::NATIONAL_ID_NUMBER,
        DocumentKind::Brc => headings::BRC_NUMBER,
        DocumentKind::Ukvi => headings::UKVI_NUMBER,
    }
}

pub fn purpose_label(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::RightToWork => "To prove my right to work",
        Purpose::RightToRent => "To prove my right to rent in England",
        Purpose::ImmigrationStatusOther => "To prove my immigration status for anything else",
    }
}

/// `id` attribute of the purpose radio input.
pub fn purpose_input_id(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::RightToWork => "work",
        Purpose::RightToRent => "rent",
        Purpose::ImmigrationStatusOther => "somethingElse",
    }
}
