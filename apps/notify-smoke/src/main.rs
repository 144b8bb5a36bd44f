mod config;
mod logging;

use std::time::Duration;

use config::SmokeConfig;
use notify_core::{
    NotificationChannel, NotificationCommand, NotificationDispatcher, NotificationStream,
    TrackMessages, build_error_notification, describe_network_error, extract_field_errors,
    is_insufficient_stock_error, is_unauthorized_error, normalize_transport_failure,
    parse_graphql_response, parse_rest_failure,
};
use tracing::{error, info};

const VALIDATION_BODY: &str = r#"{
    "success": false,
    "message": "Validation failed",
    "errorCode": "VALIDATION_ERROR",
    "errors": [
        {"field": "email", "message": "must be a valid email address"},
        {"field": "password", "message": "must be at least 8 characters long"}
    ]
}"#;

const LOGIN_BODY: &str =
    r#"{"message": "Invalid username or password", "errorCode": "AUTHENTICATION_FAILED"}"#;

const STOCK_RESPONSE: &str = r#"{
    "data": null,
    "errors": [
        {"message": "Insufficient stock for product 42", "extensions": {"errorCode": "INSUFFICIENT_STOCK"}}
    ]
}"#;

#[tokio::main]
async fn main() {
    logging::init();

    let config = match SmokeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let channel = NotificationChannel::new(config.event_buffer);
    let printer = tokio::spawn(print_commands(channel.subscribe()));
    let dispatcher = NotificationDispatcher::with_hints(channel, config.hints.clone());
    info!(hints = ?dispatcher.hints(), "dispatcher ready");

    dispatcher.notify_info("Replaying sample API failures");

    let validation = parse_rest_failure(Some(400), VALIDATION_BODY);
    dispatcher.notify_error_from_error(Some(&validation), "Registration failed");
    info!(fields = ?extract_field_errors(Some(&validation)), "form field errors");
    match serde_json::to_string(&build_error_notification(Some(&validation))) {
        Ok(record) => info!(%record, "error panel record"),
        Err(err) => error!(%err, "failed to encode error record"),
    }

    let login = parse_rest_failure(Some(401), LOGIN_BODY);
    if is_unauthorized_error(Some(&login)) {
        dispatcher.notify_warning("Please sign in again");
    }

    if let Some(stock) = parse_graphql_response(STOCK_RESPONSE)
        && is_insufficient_stock_error(Some(&stock))
    {
        let _ = dispatcher
            .track(
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err::<(), _>(stock)
                },
                TrackMessages::default().loading("Placing order..."),
            )
            .await;
    }

    let checkout = dispatcher
        .track(
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(1042_u64)
            },
            TrackMessages::default()
                .loading("Processing payment...")
                .success("Payment received"),
        )
        .await;
    info!(?checkout, "checkout finished");

    let unreachable = normalize_transport_failure("NETWORK_ERROR", Some("Network Error"));
    dispatcher.notify_error(describe_network_error(
        Some(&unreachable),
        config.connectivity,
    ));

    dispatcher.notify_success("Smoke run complete");
    drop(dispatcher);

    if let Err(err) = printer.await {
        error!(%err, "command printer task failed");
    }
}

async fn print_commands(mut commands: NotificationStream) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match commands.recv().await {
            Ok(command) => print_command(&command),
            Err(RecvError::Lagged(skipped)) => {
                error!(skipped, "command printer lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_command(command: &NotificationCommand) {
    match serde_json::to_string(command) {
        Ok(line) => println!("{line}"),
        Err(err) => error!(%err, "failed to encode notification command"),
    }
}
