//! Shell quoting for human-readable command traces.
//!
//! Commands are never executed through a shell; these helpers only render
//! what would be typed to reproduce a step by hand.

/// Placeholder printed in place of secret arguments.
pub const REDACTED: &str = "****";

/// Escape a value for use inside single quotes.
/// Replaces `'` with `'\''` (end quote, escaped quote, start quote).
pub fn escape_single_quote_content(value: &str) -> String {
    value.replace('\'', "'\\''")
}

/// Quote a single argument for shell execution.
/// - Empty strings become `''`
/// - Strings with shell metacharacters are wrapped in single quotes
/// - Embedded single quotes are escaped
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", escape_single_quote_content(arg))
}

/// Render `program args...` as a single quoted command line, masking the
/// arguments at `secret_indices`.
///
/// A masked argument of the form `Key=value` keeps its key so traces still
/// show which parameter was overridden.
pub fn render_command(program: &str, args: &[String], secret_indices: &[usize]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(quote_arg(program));

    for (index, arg) in args.iter().enumerate() {
        if secret_indices.contains(&index) {
            parts.push(redact(arg));
        } else {
            parts.push(quote_arg(arg));
        }
    }

    parts.join(" ")
}

fn redact(arg: &str) -> String {
    match arg.split_once('=') {
        Some((key, _)) => format!("{}={}", quote_arg(key), REDACTED),
        None => REDACTED.to_string(),
    }
}
