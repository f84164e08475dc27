use anyhow::{anyhow, Result};

/// Copy `text` to the system clipboard.
pub fn copy_text(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(anyhow!("Nothing to copy"));
    }

    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| anyhow!("Clipboard unavailable: {}", e))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| anyhow!("Failed to copy to clipboard: {}", e))?;
    Ok(())
}

/// Status line message for a successful copy.
pub fn copied_message(text: &str) -> String {
    let lines = text.lines().count().max(1);
    if lines == 1 {
        format!("Copied {} chars", text.chars().count())
    } else {
        format!("Copied {} lines", lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_rejected_before_touching_clipboard() {
        let err = copy_text("").unwrap_err().to_string();
        assert!(err.contains("Nothing to copy"));
    }

    #[test]
    fn copied_message_counts_lines() {
        assert_eq!(copied_message("SELECT 1;"), "Copied 9 chars");
        assert_eq!(copied_message("SELECT *\nFROM t;"), "Copied 2 lines");
    }
}
