//! Scripted walk-through.

use crate::output::{self, OutputFormat};
use account_link_engine::AccountSessionController;
use anyhow::Result;
use tracing::info;

/// Initialize, link the test account, then show the resulting screen.
///
/// A failed link is reported but does not fail the command, so a second run
/// against a backend that still holds the test account shows the collision
/// path.
pub async fn demo(controller: &AccountSessionController, format: &OutputFormat) -> Result<()> {
    let text = matches!(format, OutputFormat::Text);

    if text {
        output::print_heading("1. Initialize");
    }
    let session = controller.initialize().await?;
    info!(anonymous = session.is_anonymous, "demo initialized");
    if text {
        output::print_status(controller, format);
        output::print_heading("2. Link the test account");
    }

    match controller.link_with_test_credential().await {
        Ok(_) if text => output::print_success("Linked.", format),
        Ok(_) => {}
        Err(e) => output::print_error(&e.to_string(), format),
    }

    if text {
        output::print_heading("3. Result");
    }
    output::print_screen(controller, format);
    Ok(())
}
