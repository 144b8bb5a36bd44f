use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default pending text for tracked operations.
pub const DEFAULT_LOADING_TEXT: &str = "Loading...";
/// Default success text for tracked operations.
pub const DEFAULT_SUCCESS_TEXT: &str = "Success!";
/// Error text used when neither an override nor the failure provides any.
pub const DEFAULT_FAILURE_TEXT: &str = "Something went wrong";
/// Title of structured error records.
pub const ERROR_NOTIFICATION_TITLE: &str = "Error";

/// Intent of a user-visible notification, which drives its default styling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

/// Colour pair overriding the presentation layer's default styling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastStyle {
    /// CSS-style background colour, for example `#fef3c7`.
    pub background: String,
    /// CSS-style text colour.
    pub foreground: String,
}

/// Fire-and-forget notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
    /// Optional icon glyph shown next to the text.
    pub icon: Option<String>,
    /// Optional styling override.
    pub style: Option<ToastStyle>,
}

impl Toast {
    /// Toast with the presentation layer's default styling.
    pub fn plain(kind: ToastKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            icon: None,
            style: None,
        }
    }
}

/// Command handed to the presentation sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NotificationCommand {
    /// Show a notification immediately.
    Show(Toast),
    /// A tracked operation started; show its pending state.
    Pending {
        /// Identity shared by every command of one tracked operation.
        operation_id: Uuid,
        text: String,
    },
    /// A tracked operation finished; replace its pending state.
    Settled {
        operation_id: Uuid,
        /// Either [`ToastKind::Success`] or [`ToastKind::Error`].
        kind: ToastKind,
        text: String,
    },
    /// A tracked operation was cancelled; remove its pending state.
    Dismissed { operation_id: Uuid },
}

impl NotificationCommand {
    /// Operation identity for lifecycle commands.
    pub fn operation_id(&self) -> Option<Uuid> {
        match self {
            NotificationCommand::Show(_) => None,
            NotificationCommand::Pending { operation_id, .. }
            | NotificationCommand::Settled { operation_id, .. }
            | NotificationCommand::Dismissed { operation_id } => Some(*operation_id),
        }
    }
}

/// Text overrides for the three lifecycle notifications of a tracked operation.
///
/// Empty overrides are treated as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackMessages {
    pub loading: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
}

impl TrackMessages {
    /// Text shown while the operation is pending.
    pub fn loading(mut self, text: impl Into<String>) -> Self {
        self.loading = Some(text.into());
        self
    }

    /// Text shown when the operation succeeds.
    pub fn success(mut self, text: impl Into<String>) -> Self {
        self.success = Some(text.into());
        self
    }

    /// Text that replaces the failure message when the operation fails.
    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.error = Some(text.into());
        self
    }

    pub(crate) fn loading_text(&self) -> String {
        non_empty(self.loading.as_deref()).unwrap_or(DEFAULT_LOADING_TEXT).to_owned()
    }

    pub(crate) fn success_text(&self) -> String {
        non_empty(self.success.as_deref()).unwrap_or(DEFAULT_SUCCESS_TEXT).to_owned()
    }

    pub(crate) fn error_override(&self) -> Option<&str> {
        non_empty(self.error.as_deref())
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.is_empty())
}

/// Structured detail attached to an [`ErrorNotification`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub field_errors: Option<BTreeMap<String, String>>,
    pub general_errors: Option<Vec<String>>,
    pub error_codes: Vec<String>,
}

/// Error record for components that render persistent error panels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNotification {
    /// Always [`ToastKind::Error`].
    #[serde(rename = "type")]
    pub kind: ToastKind,
    pub title: String,
    pub message: String,
    pub details: Option<ErrorDetails>,
    /// Creation time, RFC 3339 in UTC with millisecond precision.
    pub timestamp: String,
}

/// Presentation constants attached to info and warning notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresentationHints {
    pub info_icon: String,
    pub warning_icon: String,
    pub warning_style: ToastStyle,
}

impl Default for PresentationHints {
    fn default() -> Self {
        Self {
            info_icon: "ℹ️".to_owned(),
            warning_icon: "⚠️".to_owned(),
            warning_style: ToastStyle {
                background: "#fef3c7".to_owned(),
                foreground: "#92400e".to_owned(),
            },
        }
    }
}
