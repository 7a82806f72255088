//! Clipboard and browser integration for row actions.

use anyhow::{Context, Result};
use arboard::Clipboard;
use tracing::debug;

/// Copy text to the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().context("Clipboard unavailable")?;
    clipboard
        .set_text(text.to_string())
        .context("Failed to write clipboard")?;
    debug!(text, "Copied to clipboard");
    Ok(())
}

/// Open a URL with the platform's default browser.
pub fn open_in_browser(url: &str) -> Result<()> {
    webbrowser::open(url).with_context(|| format!("Failed to open {}", url))?;
    debug!(url, "Opened in browser");
    Ok(())
}
