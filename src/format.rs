//! Response formatter: strips markup control characters from generated text.

/// Characters that chat clients interpret as inline styling.
const MARKUP_CHARS: [char; 4] = ['*', '_', '`', '~'];

/// Remove every markup control character, leaving all other text intact.
pub fn strip_markup(text: &str) -> String {
    text.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_all_four_characters() {
        assert_eq!(strip_markup("**Bold** _it_ `code` ~strike~"), "Bold it code strike");
    }

    #[test]
    fn preserves_whitespace_and_newlines() {
        let text = "1. Arrays\n\n  2. *Graphs*\t\n";
        assert_eq!(strip_markup(text), "1. Arrays\n\n  2. Graphs\t\n");
    }

    #[test]
    fn plain_text_is_unchanged() {
        let text = "Day 1: review system design - caches, queues & (sharding)!";
        assert_eq!(strip_markup(text), text);
    }

    #[test]
    fn idempotent() {
        let inputs = ["__init__ ***x***", "a~b`c", "", "snake_case_name"];
        for input in inputs {
            let once = strip_markup(input);
            assert_eq!(strip_markup(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn handles_multibyte_text() {
        assert_eq!(strip_markup("héllo *wörld* ✅"), "héllo wörld ✅");
    }
}
