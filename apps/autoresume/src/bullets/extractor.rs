//! Extracts bullet text from `\resumeItem{...}` commands in a LaTeX resume.
//!
//! Brace-matching rather than a regex: bullets routinely nest `\textbf{...}` and
//! `\href{...}{...}`, and escaped braces `\{` `\}` must not count.

const RESUME_ITEM: &str = "\\resumeItem";

/// Returns the argument of every `\resumeItem{...}` in document order.
///
/// Skips the macro's own `\newcommand{\resumeItem}` definition, longer command names
/// such as `\resumeItemListStart`, and unterminated arguments.
pub fn extract_resume_items(latex: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut search_from = 0;

    while let Some(found) = latex[search_from..].find(RESUME_ITEM) {
        let after_name = search_from + found + RESUME_ITEM.len();
        search_from = after_name;

        let rest = &latex[after_name..];
        if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            continue;
        }

        let trimmed = rest.trim_start();
        if !trimmed.starts_with('{') {
            continue;
        }
        let open = after_name + (rest.len() - trimmed.len());

        if let Some(close) = matching_brace(latex, open) {
            let body = collapse_whitespace(&latex[open + 1..close]);
            if !body.is_empty() {
                items.push(body);
            }
            search_from = close + 1;
        }
    }

    items
}

/// Byte index of the `}` closing the `{` at `open`, ignoring escaped braces.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                // skip the escaped character
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
