//! Wire format shared by the host and the UI process
//!
//! One message per `\n`-terminated UTF-8 line, no envelope. Messages are the
//! host's log strings verbatim, so multi-line messages are folded into a
//! single line before they are written:
//! - `\t` becomes four spaces
//! - `\n` becomes `\t`
//! - `\r` is dropped

/// Log lines the classifier matches exactly
pub const PRELOADER_STARTED: &str = "Preloader started";
pub const PRELOADER_FINISHED: &str = "Preloader finished";
pub const CHAINLOADER_STARTED: &str = "Chainloader started";
pub const CHAINLOADER_INITIALIZED: &str = "Chainloader initialized";
pub const CHAINLOADER_COMPLETE: &str = "Chainloader startup complete";

/// Fold a message into a single wire line
pub fn normalize(message: &str) -> String {
    let mut line = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '\t' => line.push_str("    "),
            '\n' => line.push('\t'),
            '\r' => {}
            c => line.push(c),
        }
    }
    line
}

/// Unfold a wire line back into the (possibly multi-line) message for logging
pub fn denormalize(line: &str) -> String {
    line.replace('\t', "\n").trim_end_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_newlines() {
        assert_eq!(normalize("first\r\nsecond\n"), "first\tsecond\t");
        assert_eq!(normalize("a\tb"), "a    b");
        assert!(!normalize("x\ny\r\nz").contains('\n'));
    }

    #[test]
    fn test_denormalize_restores_lines() {
        assert_eq!(denormalize("Exception\tat Foo()\tat Bar()\t"), "Exception\nat Foo()\nat Bar()");
        assert_eq!(denormalize(&normalize("one\ntwo")), "one\ntwo");
    }

    #[test]
    fn test_plain_line_is_unchanged() {
        assert_eq!(normalize(CHAINLOADER_COMPLETE), CHAINLOADER_COMPLETE);
    }
}
