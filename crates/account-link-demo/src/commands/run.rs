//! Interactive session.
//!
//! Each line typed is one button press on the demo screen. The screen is
//! printed again after every action.

use crate::output::{self, OutputFormat};
use account_link_engine::AccountSessionController;
use anyhow::Result;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Commands:
  link     Sign in with the test account, linked to the anonymous session
  anon     Sign in anonymously
  signout  Sign out
  reset    Delete the test account and start over
  clear    Clear the log
  status   Show the current session
  log      Show the log
  help     Show this help
  quit     Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Link,
    Anonymous,
    SignOut,
    Reset,
    ClearLog,
    Status,
    Log,
    Help,
    Quit,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "link" | "signin" => Ok(Action::Link),
            "anon" | "anonymous" => Ok(Action::Anonymous),
            "signout" | "logout" => Ok(Action::SignOut),
            "reset" | "unlink" => Ok(Action::Reset),
            "clear" => Ok(Action::ClearLog),
            "status" => Ok(Action::Status),
            "log" => Ok(Action::Log),
            "help" | "?" => Ok(Action::Help),
            "quit" | "exit" | "q" => Ok(Action::Quit),
            other => Err(format!("Unknown command: {} (type 'help')", other)),
        }
    }
}

/// Run the interactive loop until `quit` or end of input.
pub async fn interactive(
    controller: &AccountSessionController,
    format: &OutputFormat,
) -> Result<()> {
    if let Err(e) = controller.initialize().await {
        output::print_error(&e.to_string(), format);
    }
    output::print_screen(controller, format);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let action = match line.parse::<Action>() {
            Ok(action) => action,
            Err(message) => {
                output::print_error(&message, format);
                continue;
            }
        };
        debug!(?action, "dispatching");

        if !dispatch(controller, action, format).await {
            break;
        }
    }

    Ok(())
}

/// Apply one action. Returns false when the loop should stop.
async fn dispatch(
    controller: &AccountSessionController,
    action: Action,
    format: &OutputFormat,
) -> bool {
    let result = match action {
        Action::Link => controller.link_with_test_credential().await.map(|_| ()),
        Action::Anonymous => controller.sign_in_anonymously().await.map(|_| ()),
        Action::Reset => controller.reset_and_restart().await.map(|_| ()),
        Action::SignOut => {
            controller.sign_out();
            Ok(())
        }
        Action::ClearLog => {
            controller.clear_log();
            Ok(())
        }
        Action::Status => {
            output::print_status(controller, format);
            return true;
        }
        Action::Log => {
            output::print_log(controller, format);
            return true;
        }
        Action::Help => {
            println!("{}", HELP);
            return true;
        }
        Action::Quit => return false,
    };

    // Failures are already in the activity log shown below.
    if let Err(e) = result {
        output::print_error(&e.to_string(), format);
    }
    output::print_screen(controller, format);
    true
}

async fn prompt() -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"> ").await?;
    stdout.flush().await
}
