//! Output formatting for the CLI.

use account_link_engine::{AccountSessionController, ControllerView, StatusReport};
use clap::ValueEnum;
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything the demo screen shows, for JSON output.
#[derive(Debug, Serialize)]
struct Screen<'a> {
    #[serde(flatten)]
    view: &'a ControllerView,
    status: Option<StatusReport>,
}

/// Print a JSON value.
fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: {}", e),
    }
}

/// Print the whole screen: auth state, session status and log.
pub fn print_screen(controller: &AccountSessionController, format: &OutputFormat) {
    let view = controller.view();
    match format {
        OutputFormat::Text => {
            print_divider();
            println!("{}", view.auth_status());
            print_row("Link state", &view.link_state.to_string());
            print_divider();
            println!("{}", view.user_status);
            print_divider();
            println!("{}", controller.render_log());
        }
        OutputFormat::Json => print_json(&Screen {
            view: &view,
            status: controller.status_report(),
        }),
    }
}

/// Print the current session status.
pub fn print_status(controller: &AccountSessionController, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", controller.render_status()),
        OutputFormat::Json => print_json(&controller.status_report()),
    }
}

/// Print the activity log.
pub fn print_log(controller: &AccountSessionController, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", controller.render_log()),
        OutputFormat::Json => print_json(&controller.log_messages()),
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            print_json(&serde_json::json!({ "status": "success", "message": message }));
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::json!({ "status": "error", "message": message })
            );
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(50));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}
