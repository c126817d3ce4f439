//! Human-readable rendering of an edit script.
//!
//! Each operation becomes one line: a label padded to five columns, then the
//! base path joined with the operation's path. `SET` lines also show the
//! value decoded as UTF-8, cut to a maximum number of characters.

use esync_types::{EditScript, Operation};

/// Default number of value characters shown for a `SET`.
pub const DEFAULT_MAX_VALUE_LEN: usize = 80;

/// Rendered in place of an empty script.
pub const NO_DIFFERENCES: &str = "No differences detected";

const ELLIPSIS: &str = "...";

/// Rendering knobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescribeOptions {
    /// Values longer than this many characters are truncated with `...`.
    pub max_value_len: usize,
}

impl Default for DescribeOptions {
    fn default() -> Self {
        Self {
            max_value_len: DEFAULT_MAX_VALUE_LEN,
        }
    }
}

/// Render `script` one line per operation, in script order.
///
/// `base_path` is prefixed to every operation path; a single trailing `/` on
/// it is ignored so `"dir/"` and `"dir"` render the same.
pub fn describe(script: &EditScript, base_path: &str, options: &DescribeOptions) -> String {
    if script.is_empty() {
        return NO_DIFFERENCES.to_owned();
    }
    let base_path = base_path.strip_suffix('/').unwrap_or(base_path);
    script
        .iter()
        .map(|op| describe_operation(op, base_path, options))
        .collect::<Vec<_>>()
        .join("\n")
}

/// [`describe`] with default options.
pub fn describe_default(script: &EditScript, base_path: &str) -> String {
    describe(script, base_path, &DescribeOptions::default())
}

/// Render a single operation.
pub fn describe_operation(op: &Operation, base_path: &str, options: &DescribeOptions) -> String {
    let line = format!("{:<5} {}{}", op.kind().label(), base_path, op.path());
    match op {
        Operation::SetValue(_, value) => {
            format!("{line}: {}", truncate(value, options.max_value_len))
        }
        Operation::MakeDirectory(_) | Operation::RemoveDirectory(_) | Operation::DeleteValue(_) => {
            line
        }
    }
}

fn truncate(value: &[u8], max_len: usize) -> String {
    let text = String::from_utf8_lossy(value);
    let mut chars = text.chars();
    let mut shown: String = chars.by_ref().take(max_len).collect();
    if chars.next().is_some() {
        shown.push_str(ELLIPSIS);
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use esync_types::TreePath;

    fn p(raw: &str) -> TreePath {
        TreePath::parse(raw).unwrap()
    }

    #[test]
    fn empty_script_renders_fixed_message() {
        assert_eq!(describe_default(&EditScript::new(), "/base"), "No differences detected");
    }

    #[test]
    fn each_kind_has_fixed_width_label() {
        let script = EditScript::from_iter([
            Operation::MakeDirectory(p("/d")),
            Operation::SetValue(p("/d/x"), b"hi".to_vec()),
            Operation::DeleteValue(p("/old")),
            Operation::RemoveDirectory(p("/gone")),
        ]);
        assert_eq!(
            describe_default(&script, "/conf"),
            "MKDIR /conf/d\n\
             SET   /conf/d/x: hi\n\
             DEL   /conf/old\n\
             RMDIR /conf/gone"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        let script = EditScript::from_iter([Operation::DeleteValue(p("/k"))]);
        assert_eq!(describe_default(&script, "data/"), "DEL   data/k");
        assert_eq!(describe_default(&script, ""), "DEL   /k");
    }

    #[test]
    fn long_value_is_truncated_with_ellipsis() {
        let value = "x".repeat(100);
        let script = EditScript::from_iter([Operation::SetValue(p("/k"), value.into_bytes())]);
        let options = DescribeOptions { max_value_len: 10 };
        assert_eq!(describe(&script, "", &options), format!("SET   /k: {}...", "x".repeat(10)));
    }

    #[test]
    fn default_limit_is_eighty_characters() {
        let value = "y".repeat(81);
        let op = Operation::SetValue(p("/k"), value.into_bytes());
        let line = describe_operation(&op, "", &DescribeOptions::default());
        assert_eq!(line, format!("SET   /k: {}...", "y".repeat(80)));
    }

    #[test]
    fn value_at_limit_is_not_truncated() {
        let op = Operation::SetValue(p("/k"), b"abcde".to_vec());
        let line = describe_operation(&op, "", &DescribeOptions { max_value_len: 5 });
        assert_eq!(line, "SET   /k: abcde");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let op = Operation::SetValue(p("/k"), "héllo".as_bytes().to_vec());
        let line = describe_operation(&op, "", &DescribeOptions { max_value_len: 2 });
        assert_eq!(line, "SET   /k: hé...");
    }

    #[test]
    fn rendering_does_not_touch_the_script() {
        let script = EditScript::from_iter([Operation::SetValue(p("/k"), vec![b'z'; 200])]);
        let before = script.clone();
        let _ = describe(&script, "", &DescribeOptions { max_value_len: 3 });
        assert_eq!(script, before);
    }

    #[test]
    fn invalid_utf8_is_rendered_lossily() {
        let op = Operation::SetValue(p("/k"), vec![0xff, b'a']);
        let line = describe_operation(&op, "", &DescribeOptions::default());
        assert_eq!(line, "SET   /k: \u{fffd}a");
    }
}
