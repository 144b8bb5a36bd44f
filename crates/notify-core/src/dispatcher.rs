use std::{fmt, future::Future, sync::Arc};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    channel::NotificationSink,
    error::NormalizedError,
    message::format_message,
    types::{
        DEFAULT_FAILURE_TEXT, ERROR_NOTIFICATION_TITLE, ErrorDetails, ErrorNotification,
        NotificationCommand, PresentationHints, Toast, ToastKind, TrackMessages,
    },
};

/// Turns messages, normalized errors and in-flight operations into
/// notification commands for the injected sink.
///
/// The dispatcher holds no per-call state; clones share the same sink.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    hints: PresentationHints,
}

impl fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("hints", &self.hints)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    /// Dispatcher using the default presentation hints.
    pub fn new(sink: impl NotificationSink + 'static) -> Self {
        Self::with_hints(sink, PresentationHints::default())
    }

    /// Dispatcher delivering to `sink` with custom presentation hints.
    pub fn with_hints(sink: impl NotificationSink + 'static, hints: PresentationHints) -> Self {
        Self {
            sink: Arc::new(sink),
            hints,
        }
    }

    /// Presentation constants used for info and warning toasts.
    pub fn hints(&self) -> &PresentationHints {
        &self.hints
    }

    /// Show a success toast.
    pub fn notify_success(&self, text: impl Into<String>) {
        self.show(Toast::plain(ToastKind::Success, text));
    }

    /// Show an error toast with `text` as given.
    pub fn notify_error(&self, text: impl Into<String>) {
        self.show(Toast::plain(ToastKind::Error, text));
    }

    /// Show an info toast with the configured icon.
    pub fn notify_info(&self, text: impl Into<String>) {
        self.show(Toast {
            icon: Some(self.hints.info_icon.clone()),
            ..Toast::plain(ToastKind::Info, text)
        });
    }

    /// Show a warning toast with the configured icon and colours.
    pub fn notify_warning(&self, text: impl Into<String>) {
        self.show(Toast {
            icon: Some(self.hints.warning_icon.clone()),
            style: Some(self.hints.warning_style.clone()),
            ..Toast::plain(ToastKind::Warning, text)
        });
    }

    /// Show an error toast for `error`, preferring its detailed text.
    ///
    /// `fallback_text` is used when the error yields no text at all.
    pub fn notify_error_from_error(&self, error: Option<&NormalizedError>, fallback_text: &str) {
        let text = format_message(error, true);
        if text.is_empty() {
            self.notify_error(fallback_text);
        } else {
            self.notify_error(text);
        }
    }

    /// Bind pending, success and error notifications to `operation`.
    ///
    /// The pending command is emitted before this returns, so it always
    /// precedes anything the operation does. Awaiting the returned future
    /// drives the operation and emits exactly one terminal command. An
    /// operation that never settles leaves the pending state in place.
    pub fn track<T, F>(
        &self,
        operation: F,
        messages: TrackMessages,
    ) -> impl Future<Output = Result<T, NormalizedError>> + use<T, F>
    where
        F: Future<Output = Result<T, NormalizedError>>,
    {
        let tracked = TrackedOperation::begin(Arc::clone(&self.sink), messages);
        async move {
            let outcome = operation.await;
            tracked.settle(&outcome);
            outcome
        }
    }

    /// Like [`track`](Self::track), but gives up when `cancel` fires.
    ///
    /// On cancellation the operation is dropped, a `Dismissed` command replaces
    /// the terminal one and `None` is returned.
    pub fn track_until_cancelled<T, F>(
        &self,
        operation: F,
        messages: TrackMessages,
        cancel: CancellationToken,
    ) -> impl Future<Output = Option<Result<T, NormalizedError>>> + use<T, F>
    where
        F: Future<Output = Result<T, NormalizedError>>,
    {
        let tracked = TrackedOperation::begin(Arc::clone(&self.sink), messages);
        async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracked.dismiss();
                    None
                }
                outcome = operation => {
                    tracked.settle(&outcome);
                    Some(outcome)
                }
            }
        }
    }

    fn show(&self, toast: Toast) {
        debug!(kind = ?toast.kind, "dispatching notification");
        self.sink.deliver(NotificationCommand::Show(toast));
    }
}

/// Build the structured error record rendered by error panels.
pub fn build_error_notification(error: Option<&NormalizedError>) -> ErrorNotification {
    build_error_notification_at(error, Utc::now())
}

/// [`build_error_notification`] with an explicit creation time.
pub fn build_error_notification_at(
    error: Option<&NormalizedError>,
    created_at: DateTime<Utc>,
) -> ErrorNotification {
    let details = error
        .filter(|error| error.has_details())
        .map(|error| ErrorDetails {
            field_errors: error.field_errors().cloned(),
            general_errors: error.general_errors().map(<[String]>::to_vec),
            error_codes: error.error_codes().to_vec(),
        });

    ErrorNotification {
        kind: ToastKind::Error,
        title: ERROR_NOTIFICATION_TITLE.to_owned(),
        message: format_message(error, false),
        details,
        timestamp: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Lifecycle of one tracked operation. Settling or dismissing consumes it, so
/// at most one terminal command can follow the pending one.
struct TrackedOperation {
    id: Uuid,
    sink: Arc<dyn NotificationSink>,
    messages: TrackMessages,
}

impl TrackedOperation {
    fn begin(sink: Arc<dyn NotificationSink>, messages: TrackMessages) -> Self {
        let id = Uuid::new_v4();
        debug!(operation_id = %id, "tracking operation");
        sink.deliver(NotificationCommand::Pending {
            operation_id: id,
            text: messages.loading_text(),
        });
        Self { id, sink, messages }
    }

    fn settle<T>(self, outcome: &Result<T, NormalizedError>) {
        let (kind, text) = match outcome {
            Ok(_) => (ToastKind::Success, self.messages.success_text()),
            Err(error) => {
                warn!(
                    operation_id = %self.id,
                    codes = ?error.error_codes(),
                    "tracked operation failed"
                );
                (ToastKind::Error, self.failure_text(error))
            }
        };
        self.sink.deliver(NotificationCommand::Settled {
            operation_id: self.id,
            kind,
            text,
        });
    }

    fn dismiss(self) {
        debug!(operation_id = %self.id, "tracked operation cancelled");
        self.sink.deliver(NotificationCommand::Dismissed {
            operation_id: self.id,
        });
    }

    fn failure_text(&self, error: &NormalizedError) -> String {
        if let Some(text) = self.messages.error_override() {
            return text.to_owned();
        }
        let text = format_message(Some(error), false);
        if text.is_empty() {
            DEFAULT_FAILURE_TEXT.to_owned()
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use chrono::TimeZone;

    use super::*;
    use crate::{
        channel::{NotificationChannel, NotificationStream},
        error::ValidationEntry,
        message::UNKNOWN_ERROR_MESSAGE,
        types::{DEFAULT_LOADING_TEXT, DEFAULT_SUCCESS_TEXT},
    };

    #[derive(Default)]
    struct RecordingSink {
        commands: Mutex<Vec<NotificationCommand>>,
    }

    impl RecordingSink {
        fn commands(&self) -> Vec<NotificationCommand> {
            self.commands.lock().expect("recording lock").clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn deliver(&self, command: NotificationCommand) {
            self.commands.lock().expect("recording lock").push(command);
        }
    }

    fn recording_dispatcher() -> (NotificationDispatcher, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (NotificationDispatcher::new(Arc::clone(&sink)), sink)
    }

    fn drain(rx: &mut NotificationStream) -> Vec<NotificationCommand> {
        let mut out = Vec::new();
        while let Ok(command) = rx.try_recv() {
            out.push(command);
        }
        out
    }

    fn shown(command: &NotificationCommand) -> &Toast {
        match command {
            NotificationCommand::Show(toast) => toast,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn plain_notifications_pass_text_through() {
        let (dispatcher, sink) = recording_dispatcher();
        dispatcher.notify_success("Saved");
        dispatcher.notify_error("Failed");

        let commands = sink.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(shown(&commands[0]), &Toast::plain(ToastKind::Success, "Saved"));
        assert_eq!(shown(&commands[1]), &Toast::plain(ToastKind::Error, "Failed"));
    }

    #[test]
    fn info_and_warning_carry_configured_hints() {
        let (dispatcher, sink) = recording_dispatcher();
        dispatcher.notify_info("Heads up");
        dispatcher.notify_warning("Low stock");

        let commands = sink.commands();
        let info = shown(&commands[0]);
        assert_eq!(info.kind, ToastKind::Info);
        assert_eq!(info.icon.as_deref(), Some("ℹ️"));
        assert_eq!(info.style, None);

        let warning = shown(&commands[1]);
        assert_eq!(warning.kind, ToastKind::Warning);
        assert_eq!(warning.icon.as_deref(), Some("⚠️"));
        let style = warning.style.as_ref().expect("warning should be styled");
        assert_eq!(style.background, "#fef3c7");
        assert_eq!(style.foreground, "#92400e");
    }

    #[test]
    fn custom_hints_replace_defaults() {
        let sink = Arc::new(RecordingSink::default());
        let mut hints = PresentationHints::default();
        hints.warning_style.background = "#000000".to_owned();
        let dispatcher = NotificationDispatcher::with_hints(Arc::clone(&sink), hints);
        assert_eq!(dispatcher.hints().warning_style.background, "#000000");
        assert_eq!(dispatcher.hints().info_icon, "ℹ️");

        dispatcher.notify_warning("dark");
        let commands = sink.commands();
        let style = shown(&commands[0]).style.clone().expect("style");
        assert_eq!(style.background, "#000000");
    }

    #[test]
    fn error_from_error_prefers_detailed_text() {
        let (dispatcher, sink) = recording_dispatcher();
        let err = NormalizedError::new("Validation failed")
            .with_detailed_message("Validation failed: email: bad");

        dispatcher.notify_error_from_error(Some(&err), "Operation failed");
        dispatcher.notify_error_from_error(None, "Operation failed");

        let commands = sink.commands();
        assert_eq!(shown(&commands[0]).text, "Validation failed: email: bad");
        assert_eq!(shown(&commands[1]).text, UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn error_record_includes_details_only_when_present() {
        let created_at = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
            .single()
            .expect("valid timestamp");
        let err = NormalizedError::new("Validation failed")
            .with_code(crate::taxonomy::ErrorCode::ValidationError)
            .with_errors([
                ValidationEntry::field("email", "bad"),
                ValidationEntry::general("general issue"),
            ])
            .with_detailed_message("ignored in records");

        let record = build_error_notification_at(Some(&err), created_at);
        assert_eq!(record.kind, ToastKind::Error);
        assert_eq!(record.title, "Error");
        assert_eq!(record.message, "Validation failed");
        assert_eq!(record.timestamp, "2024-05-01T12:30:00.000Z");
        let details = record.details.expect("details should be attached");
        assert_eq!(details.error_codes, vec!["VALIDATION_ERROR".to_owned()]);
        assert_eq!(
            details.field_errors.and_then(|fields| fields.get("email").cloned()),
            Some("bad".to_owned())
        );
        assert_eq!(details.general_errors, Some(vec!["general issue".to_owned()]));

        let plain = build_error_notification_at(Some(&NormalizedError::new("nope")), created_at);
        assert_eq!(plain.details, None);

        let decoded: NormalizedError = serde_json::from_str(
            r#"{"message":"Validation failed","hasDetails":false,"errors":[{"field":"email","message":"bad"}]}"#,
        )
        .expect("client error should deserialize");
        let decoded_record = build_error_notification_at(Some(&decoded), created_at);
        let decoded_details = decoded_record
            .details
            .expect("entries should attach details");
        assert_eq!(
            decoded_details
                .field_errors
                .and_then(|fields| fields.get("email").cloned()),
            Some("bad".to_owned())
        );

        let absent = build_error_notification(None);
        assert_eq!(absent.message, UNKNOWN_ERROR_MESSAGE);
        assert!(DateTime::parse_from_rfc3339(&absent.timestamp).is_ok());
    }

    #[test]
    fn error_record_serializes_type_field() {
        let record = build_error_notification(Some(&NormalizedError::new("nope")));
        let json = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(json["type"], "error");
        assert_eq!(json["title"], "Error");
        assert!(json["details"].is_null());
    }

    #[tokio::test]
    async fn tracked_failure_emits_loading_then_error() {
        let channel = NotificationChannel::new(16);
        let mut rx = channel.subscribe();
        let dispatcher = NotificationDispatcher::new(channel);

        let outcome = dispatcher
            .track(
                async { Err::<(), _>(NormalizedError::new("boom")) },
                TrackMessages::default(),
            )
            .await;
        assert!(outcome.is_err());

        let commands = drain(&mut rx);
        assert_eq!(commands.len(), 2);
        let NotificationCommand::Pending { operation_id, text } = &commands[0] else {
            panic!("expected pending command, got {:?}", commands[0]);
        };
        assert_eq!(text, DEFAULT_LOADING_TEXT);
        assert_eq!(
            commands[1],
            NotificationCommand::Settled {
                operation_id: *operation_id,
                kind: ToastKind::Error,
                text: "boom".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn tracked_success_uses_default_or_override() {
        let (dispatcher, sink) = recording_dispatcher();

        let value = dispatcher
            .track(async { Ok::<_, NormalizedError>(7) }, TrackMessages::default())
            .await
            .expect("operation should succeed");
        assert_eq!(value, 7);

        dispatcher
            .track(
                async { Ok::<_, NormalizedError>(()) },
                TrackMessages::default().success("Order placed"),
            )
            .await
            .expect("operation should succeed");

        let terminal: Vec<_> = sink
            .commands()
            .into_iter()
            .filter_map(|command| match command {
                NotificationCommand::Settled { kind, text, .. } => Some((kind, text)),
                _ => None,
            })
            .collect();
        assert_eq!(
            terminal,
            vec![
                (ToastKind::Success, DEFAULT_SUCCESS_TEXT.to_owned()),
                (ToastKind::Success, "Order placed".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn error_override_wins_over_failure_text() {
        let (dispatcher, sink) = recording_dispatcher();
        let _ = dispatcher
            .track(
                async { Err::<(), _>(NormalizedError::new("boom")) },
                TrackMessages::default().error("Could not place order"),
            )
            .await;

        let commands = sink.commands();
        assert!(matches!(
            &commands[1],
            NotificationCommand::Settled { kind: ToastKind::Error, text, .. }
                if text == "Could not place order"
        ));
    }

    #[tokio::test]
    async fn pending_is_emitted_before_operation_runs() {
        let (dispatcher, sink) = recording_dispatcher();
        let observed = Arc::new(Mutex::new(Vec::new()));
        let operation = {
            let sink = Arc::clone(&sink);
            let observed = Arc::clone(&observed);
            async move {
                observed
                    .lock()
                    .expect("observed lock")
                    .extend(sink.commands());
                Ok::<_, NormalizedError>(())
            }
        };

        let tracked = dispatcher.track(operation, TrackMessages::default().loading("Saving..."));
        assert_eq!(sink.commands().len(), 1);
        tracked.await.expect("operation should succeed");

        let seen = observed.lock().expect("observed lock").clone();
        assert_eq!(seen.len(), 1);
        assert!(matches!(
            &seen[0],
            NotificationCommand::Pending { text, .. } if text == "Saving..."
        ));
        assert_eq!(sink.commands().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_operations_get_distinct_ids() {
        let (dispatcher, sink) = recording_dispatcher();
        let slow = dispatcher.track(
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, NormalizedError>(())
            },
            TrackMessages::default(),
        );
        let fast = dispatcher.track(
            async { Err::<(), _>(NormalizedError::new("fast failure")) },
            TrackMessages::default(),
        );
        let (slow, fast) = tokio::join!(slow, fast);
        assert!(slow.is_ok());
        assert!(fast.is_err());

        let commands = sink.commands();
        assert_eq!(commands.len(), 4);
        let slow_id = commands[0].operation_id().expect("slow id");
        let fast_id = commands[1].operation_id().expect("fast id");
        assert_ne!(slow_id, fast_id);
        for id in [slow_id, fast_id] {
            let terminal = commands
                .iter()
                .filter(|command| {
                    matches!(command, NotificationCommand::Settled { .. })
                        && command.operation_id() == Some(id)
                })
                .count();
            assert_eq!(terminal, 1);
        }
    }

    #[tokio::test]
    async fn cancellation_dismisses_pending_state() {
        let (dispatcher, sink) = recording_dispatcher();
        let cancel = CancellationToken::new();
        let tracked = dispatcher.track_until_cancelled(
            std::future::pending::<Result<(), NormalizedError>>(),
            TrackMessages::default(),
            cancel.clone(),
        );
        cancel.cancel();

        assert_eq!(tracked.await, None);
        let commands = sink.commands();
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], NotificationCommand::Pending { .. }));
        assert!(matches!(commands[1], NotificationCommand::Dismissed { .. }));
        assert_eq!(commands[0].operation_id(), commands[1].operation_id());
    }

    #[tokio::test]
    async fn uncancelled_tracking_settles_normally() {
        let (dispatcher, sink) = recording_dispatcher();
        let outcome = dispatcher
            .track_until_cancelled(
                async { Ok::<_, NormalizedError>("done") },
                TrackMessages::default(),
                CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome, Some(Ok("done")));
        assert!(matches!(
            sink.commands()[1],
            NotificationCommand::Settled { kind: ToastKind::Success, .. }
        ));
    }
}
