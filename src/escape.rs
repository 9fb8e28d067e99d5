//! Backslash escaping for LaTeX embedded in script source.

/// Double every backslash in `latex` so it survives a JavaScript template
/// literal unchanged. Not idempotent: apply exactly once.
pub fn escape_backslashes(latex: &str) -> String {
    let mut out = String::with_capacity(latex.len() + latex.len() / 4);
    for c in latex.chars() {
        if c == '\\' {
            out.push_str("\\\\");
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn doubles_control_sequences() {
        assert_eq!(escape_backslashes(r"e^{i\pi}+1=0"), r"e^{i\\pi}+1=0");
        assert_eq!(escape_backslashes(r"\\"), r"\\\\");
        assert_eq!(escape_backslashes(""), "");
    }

    #[test]
    fn leaves_other_text_alone() {
        let s = "x^2 + y_1 = `z` ${ü}\n\t";
        assert_eq!(escape_backslashes(s), s);
    }

    #[test]
    fn not_idempotent() {
        let s = "\\";
        let once = escape_backslashes(s);
        assert_ne!(escape_backslashes(&once), once);
    }

    proptest! {
        #[test]
        fn backslash_count_doubles(s in "\\PC*") {
            let out = escape_backslashes(&s);
            let before = s.chars().filter(|&c| c == '\\').count();
            let after = out.chars().filter(|&c| c == '\\').count();
            prop_assert_eq!(after, 2 * before);
        }

        #[test]
        fn collapsing_pairs_restores_input(s in "\\PC*") {
            let out = escape_backslashes(&s);
            prop_assert_eq!(out.replace("\\\\", "\\"), s);
        }
    }
}
