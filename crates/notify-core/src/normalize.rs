use serde::Deserialize;
use tracing::{debug, trace};

use crate::{
    error::{NormalizedError, ValidationEntry},
    taxonomy::ErrorCode,
};

/// Error body returned by the REST API.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RestErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_codes: Vec<String>,
    #[serde(default)]
    pub errors: Vec<ValidationEntry>,
}

/// One entry of a GraphQL response's `errors` array.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub extensions: Option<GraphQlExtensions>,
}

/// Server-specific metadata attached to a GraphQL error.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlExtensions {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

impl GraphQlError {
    /// Taxonomy code for this error: explicit codes first, then the
    /// server's error classification.
    fn code(&self) -> Option<String> {
        let extensions = self.extensions.as_ref()?;
        extensions
            .error_code
            .clone()
            .or_else(|| extensions.code.clone())
            .or_else(|| {
                extensions
                    .classification
                    .as_deref()
                    .map(code_for_classification)
            })
    }

    fn field(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|extensions| extensions.field.as_deref())
            .filter(|field| !field.is_empty())
    }
}

/// Taxonomy code implied by an HTTP status when the body carries none.
pub fn code_for_http_status(status: u16) -> Option<ErrorCode> {
    match status {
        400 | 422 => Some(ErrorCode::ValidationError),
        401 | 403 => Some(ErrorCode::Unauthorized),
        404 => Some(ErrorCode::NotFound),
        409 => Some(ErrorCode::DuplicateEntry),
        _ => None,
    }
}

fn code_for_classification(classification: &str) -> String {
    match classification {
        "BAD_REQUEST" => ErrorCode::ValidationError.as_str().to_owned(),
        "NOT_FOUND" => ErrorCode::NotFound.as_str().to_owned(),
        "UNAUTHORIZED" | "FORBIDDEN" => ErrorCode::Unauthorized.as_str().to_owned(),
        other => other.to_owned(),
    }
}

/// Normalize a REST failure from its status and decoded body.
pub fn normalize_rest_failure(status: Option<u16>, body: &RestErrorBody) -> NormalizedError {
    let mut codes: Vec<String> = body
        .error_code
        .iter()
        .chain(body.error_codes.iter())
        .filter(|code| !code.is_empty())
        .cloned()
        .collect();
    if codes.is_empty()
        && let Some(code) = status.and_then(code_for_http_status)
    {
        codes.push(code.as_str().to_owned());
    }

    let message = body.message.clone().unwrap_or_default();
    build(message, codes, body.errors.clone(), status)
}

/// Normalize a REST failure from its status and raw body text.
///
/// Bodies that are not a recognizable error payload are treated as empty.
pub fn parse_rest_failure(status: Option<u16>, raw: &str) -> NormalizedError {
    match serde_json::from_str::<RestErrorBody>(raw) {
        Ok(body) => normalize_rest_failure(status, &body),
        Err(err) => {
            debug!(?status, error = %err, "unrecognized REST error body");
            normalize_rest_failure(status, &RestErrorBody::default())
        }
    }
}

/// Normalize the `errors` array of a GraphQL response.
///
/// The first error provides the summary. Errors naming a field become field
/// entries; any further errors become general entries. GraphQL errors are
/// delivered inside a successful HTTP response, so status 200 is recorded.
pub fn normalize_graphql_errors(errors: &[GraphQlError]) -> NormalizedError {
    let message = errors
        .first()
        .and_then(|error| error.message.clone())
        .unwrap_or_default();
    let codes: Vec<String> = errors.iter().filter_map(GraphQlError::code).collect();
    let entries: Vec<ValidationEntry> = errors
        .iter()
        .enumerate()
        .filter_map(|(index, error)| {
            let text = error.message.clone().unwrap_or_default();
            match error.field() {
                Some(field) => Some(ValidationEntry::field(field, text)),
                None if index > 0 => Some(ValidationEntry::general(text)),
                None => None,
            }
        })
        .collect();

    build(message, codes, entries, Some(200))
}

/// Normalize a raw GraphQL response document.
///
/// Returns `None` when the response carries no errors. An unparseable
/// document is itself reported as a failure.
pub fn parse_graphql_response(raw: &str) -> Option<NormalizedError> {
    match serde_json::from_str::<GraphQlResponse>(raw) {
        Ok(response) if response.errors.is_empty() => None,
        Ok(response) => Some(normalize_graphql_errors(&response.errors)),
        Err(err) => {
            debug!(error = %err, "unparseable GraphQL response");
            Some(NormalizedError::new("").with_status(200))
        }
    }
}

/// Normalize a failure where no response was received.
pub fn normalize_transport_failure(code: &str, message: Option<&str>) -> NormalizedError {
    NormalizedError::new(message.unwrap_or_default()).with_transport_code(code)
}

fn build(
    message: String,
    codes: Vec<String>,
    entries: Vec<ValidationEntry>,
    status: Option<u16>,
) -> NormalizedError {
    let mut error = NormalizedError::new(message).with_codes(codes);
    if !entries.is_empty() {
        let detailed = detailed_message(error.message(), &entries);
        error = error.with_errors(entries).with_detailed_message(detailed);
    }
    if let Some(status) = status {
        error = error.with_status(status);
    }

    trace!(codes = ?error.error_codes(), has_details = error.has_details(), "normalized failure");
    error
}

fn detailed_message(summary: &str, entries: &[ValidationEntry]) -> String {
    let details = entries
        .iter()
        .map(|entry| match entry.field_name() {
            Some(field) => format!("{field}: {}", entry.message),
            None => entry.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ");
    format!("{}: {details}", summary.trim_end_matches('.'))
}
