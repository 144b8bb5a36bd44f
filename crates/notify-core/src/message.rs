use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::NormalizedError;

/// Text shown when there is no error value at all.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";
/// Text shown while the client is offline.
pub const OFFLINE_MESSAGE: &str =
    "You appear to be offline. Please check your internet connection.";
/// Text shown when the server could not be reached.
pub const CONNECTIVITY_MESSAGE: &str = "Unable to connect to server. Please try again later.";

/// Transport codes that mean the request never reached the server.
const NETWORK_FAILURE_CODES: [&str; 2] = ["NETWORK_ERROR", "ERR_NETWORK"];

/// Client connectivity as reported by the host platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Connectivity {
    #[default]
    Online,
    Offline,
}

/// Pick the text to display for `error`.
///
/// Detail mode prefers the detailed message when the error carries details and
/// that message is non-empty.
pub fn format_message(error: Option<&NormalizedError>, show_details: bool) -> String {
    let Some(error) = error else {
        return UNKNOWN_ERROR_MESSAGE.to_owned();
    };

    if show_details
        && error.has_details()
        && let Some(detailed) = error.detailed_message().filter(|text| !text.is_empty())
    {
        return detailed.to_owned();
    }

    error.message().to_owned()
}

/// Map each named field to its validation message.
///
/// Entries without a field name are skipped. When a field repeats, the later
/// entry overwrites the earlier one.
pub fn extract_field_errors(error: Option<&NormalizedError>) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let Some(error) = error else {
        return fields;
    };

    for entry in error.errors() {
        if let Some(field) = entry.field_name() {
            fields.insert(field.to_owned(), entry.message.clone());
        }
    }
    fields
}

/// User-facing text for a failure that may have been caused by the network.
pub fn describe_network_error(error: Option<&NormalizedError>, connectivity: Connectivity) -> String {
    if connectivity == Connectivity::Offline {
        return OFFLINE_MESSAGE.to_owned();
    }

    let Some(error) = error else {
        return CONNECTIVITY_MESSAGE.to_owned();
    };

    let network_code = error
        .transport_code()
        .is_some_and(|code| NETWORK_FAILURE_CODES.contains(&code));
    if network_code || !error.response_received() {
        return CONNECTIVITY_MESSAGE.to_owned();
    }

    format_message(Some(error), false)
}
