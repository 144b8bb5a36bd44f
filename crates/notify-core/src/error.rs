use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{message::extract_field_errors, taxonomy::ErrorCode};

/// Summary used when a failure arrives without any message text.
pub const DEFAULT_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// One per-item validation entry reported by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationEntry {
    /// Input field the message refers to; `None` for general messages.
    #[serde(default)]
    pub field: Option<String>,
    /// Human-readable validation message.
    #[serde(default)]
    pub message: String,
}

impl ValidationEntry {
    /// Entry scoped to one input field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Entry that is not tied to any field.
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// Field name, treating an empty name the same as no name.
    pub fn field_name(&self) -> Option<&str> {
        self.field.as_deref().filter(|field| !field.is_empty())
    }
}

/// Canonical failure shape consumed by the classifier, extractor and dispatcher.
///
/// Values are built once per failed operation and never mutated afterwards;
/// the `with_*` builders consume `self`. The summary message is never empty.
/// Deserialized values go through the same builders, so codes are unique and
/// field/general errors are derived from `errors`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(rename_all = "camelCase", from = "RawNormalizedError")]
#[error("{message}")]
pub struct NormalizedError {
    message: String,
    has_details: bool,
    detailed_message: Option<String>,
    error_codes: Vec<String>,
    field_errors: Option<BTreeMap<String, String>>,
    general_errors: Option<Vec<String>>,
    errors: Vec<ValidationEntry>,
    code: Option<String>,
    status: Option<u16>,
}

/// Client-provided error shape before invariants are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNormalizedError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    has_details: bool,
    #[serde(default)]
    detailed_message: Option<String>,
    #[serde(default)]
    error_codes: Vec<String>,
    #[serde(default)]
    field_errors: Option<BTreeMap<String, String>>,
    #[serde(default)]
    general_errors: Option<Vec<String>>,
    #[serde(default)]
    errors: Vec<ValidationEntry>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    status: Option<u16>,
}

impl From<RawNormalizedError> for NormalizedError {
    fn from(raw: RawNormalizedError) -> Self {
        // Without raw entries, the supplied mappings are the only per-item data.
        let entries = if raw.errors.is_empty() {
            let fields = raw
                .field_errors
                .into_iter()
                .flatten()
                .map(|(field, message)| ValidationEntry::field(field, message));
            let general = raw
                .general_errors
                .into_iter()
                .flatten()
                .map(ValidationEntry::general);
            fields.chain(general).collect()
        } else {
            raw.errors
        };

        let mut error = NormalizedError::new(raw.message.unwrap_or_default())
            .with_codes(raw.error_codes)
            .with_errors(entries);
        if let Some(detailed) = raw.detailed_message {
            error = error.with_detailed_message(detailed);
        }
        error.has_details |= raw.has_details;
        error.code = raw.code;
        error.status = raw.status;
        error
    }
}

impl NormalizedError {
    /// Construct an error with only a summary message.
    ///
    /// Blank messages fall back to [`DEFAULT_ERROR_MESSAGE`].
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: non_blank_or_default(message),
            has_details: false,
            detailed_message: None,
            error_codes: Vec::new(),
            field_errors: None,
            general_errors: None,
            errors: Vec::new(),
            code: None,
            status: None,
        }
    }

    /// Attach taxonomy codes, dropping repeats and keeping first-seen order.
    pub fn with_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for code in codes {
            let code = code.into();
            if !code.is_empty() && !self.error_codes.contains(&code) {
                self.error_codes.push(code);
            }
        }
        self
    }

    /// Attach a single taxonomy code.
    pub fn with_code(self, code: ErrorCode) -> Self {
        self.with_codes([code.as_str()])
    }

    /// Attach per-item validation entries.
    ///
    /// Field errors and general errors are derived from the entries, and the
    /// error is marked as carrying details when at least one entry exists.
    pub fn with_errors(mut self, entries: impl IntoIterator<Item = ValidationEntry>) -> Self {
        self.errors.extend(entries);
        if self.errors.is_empty() {
            return self;
        }

        let field_errors = extract_field_errors(Some(&self));
        let general_errors: Vec<String> = self
            .errors
            .iter()
            .filter(|entry| entry.field_name().is_none())
            .map(|entry| entry.message.clone())
            .collect();

        self.field_errors = (!field_errors.is_empty()).then_some(field_errors);
        self.general_errors = (!general_errors.is_empty()).then_some(general_errors);
        self.has_details = true;
        self
    }

    /// Attach the richer text shown in detail mode.
    pub fn with_detailed_message(mut self, detailed: impl Into<String>) -> Self {
        self.detailed_message = Some(detailed.into());
        self.has_details = true;
        self
    }

    /// Record the transport-level failure code (for example `NETWORK_ERROR`).
    pub fn with_transport_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Record the HTTP status of the response that carried the failure.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Human-readable summary; never empty.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether richer diagnostic data exists.
    pub fn has_details(&self) -> bool {
        self.has_details
    }

    /// Richer text shown in detail mode.
    pub fn detailed_message(&self) -> Option<&str> {
        self.detailed_message.as_deref()
    }

    /// Machine-readable codes, unique and in source order.
    pub fn error_codes(&self) -> &[String] {
        &self.error_codes
    }

    /// Field name to message, derived from the per-item entries.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        self.field_errors.as_ref()
    }

    /// Messages of entries that name no field.
    pub fn general_errors(&self) -> Option<&[String]> {
        self.general_errors.as_deref()
    }

    /// Raw per-item validation entries.
    pub fn errors(&self) -> &[ValidationEntry] {
        &self.errors
    }

    /// Transport-level failure code, if the transport reported one.
    pub fn transport_code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// HTTP status of the failed response, `None` when nothing was received.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Whether the transport received any response.
    pub fn response_received(&self) -> bool {
        self.status.is_some()
    }

    /// Whether `code` is one of this error's codes.
    pub fn has_code(&self, code: &str) -> bool {
        self.error_codes.iter().any(|candidate| candidate == code)
    }

    /// Recognized taxonomy codes in source order; unknown codes are skipped.
    pub fn taxonomy_codes(&self) -> Vec<ErrorCode> {
        self.error_codes
            .iter()
            .filter_map(|code| code.parse().ok())
            .collect()
    }
}

fn non_blank_or_default(message: String) -> String {
    if message.trim().is_empty() {
        DEFAULT_ERROR_MESSAGE.to_owned()
    } else {
        message
    }
}
