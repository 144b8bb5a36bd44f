//! Client-side failure handling shared between API callers and the presentation layer.
//!
//! This crate turns failures reported by a remote API into a normalized error
//! shape, classifies them against a closed code taxonomy, and emits
//! notification commands to an injected presentation sink.

/// Notification sink abstraction and broadcast channel.
pub mod channel;
/// Notification dispatcher, including operation-lifecycle tracking.
pub mod dispatcher;
/// Normalized error shape shared by every component.
pub mod error;
/// Display-text helpers over normalized errors.
pub mod message;
/// Conversion of raw REST/GraphQL/transport failures into normalized errors.
pub mod normalize;
/// Closed error-code taxonomy and classification predicates.
pub mod taxonomy;
/// Presentation-facing command and record types.
pub mod types;

pub use channel::{NotificationChannel, NotificationSink, NotificationStream};
pub use dispatcher::{
    NotificationDispatcher, build_error_notification, build_error_notification_at,
};
pub use error::{DEFAULT_ERROR_MESSAGE, NormalizedError, ValidationEntry};
pub use message::{Connectivity, describe_network_error, extract_field_errors, format_message};
pub use normalize::{
    GraphQlError, GraphQlExtensions, RestErrorBody, code_for_http_status,
    normalize_graphql_errors, normalize_rest_failure, normalize_transport_failure,
    parse_graphql_response, parse_rest_failure,
};
pub use taxonomy::{
    ErrorCode, UnknownErrorCode, is_authentication_error, is_duplicate_error, is_error_type,
    is_insufficient_stock_error, is_not_found_error, is_unauthorized_error, is_validation_error,
};
pub use types::{
    ErrorDetails, ErrorNotification, NotificationCommand, PresentationHints, Toast, ToastKind,
    ToastStyle, TrackMessages,
};
