// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub(crate) use re;

/// Single-line excerpt of `s` at most `max_chars` characters long, for warnings.
pub fn truncate_context(s: &str, max_chars: usize) -> String {
    let flat: String = s
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_kept_whole() {
        assert_eq!(truncate_context("<STMTTRN>", 120), "<STMTTRN>");
    }

    #[test]
    fn whitespace_is_flattened() {
        assert_eq!(
            truncate_context("<STMTTRN>\n  <TRNTYPE>DEBIT\n", 120),
            "<STMTTRN> <TRNTYPE>DEBIT"
        );
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        let s = "é".repeat(200);
        let cut = truncate_context(&s, 120);
        assert_eq!(cut.chars().count(), 121);
        assert!(cut.ends_with('…'));
    }
}
