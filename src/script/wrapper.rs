// src/script/wrapper.rs

//! The fail-fast execution wrapper.
//!
//! Every command line in a generated script runs as
//! `execute "<command>" <line number>`. On a non-zero exit status `execute`
//! appends
//!
//! ```text
//! Failure code [<status>] on Line [<line>]: <command>
//! ```
//!
//! to the file named by `$failLog` and exits the whole script with that
//! status. A parent script that invoked this one through its own `execute`
//! then fails the same way, so a failure unwinds up to the main script.

use std::path::Path;

use crate::sentinel::{marker_path, Marker};

pub const EXECUTE_FN: &str = "execute";
pub const FAIL_LOG_VAR: &str = "failLog";

/// Definition of the `execute` shell function.
pub fn execute_function() -> Vec<String> {
    vec![
        format!("function {EXECUTE_FN}() {{"),
        "    eval \"$1\"".to_string(),
        "    statusCode=$?".to_string(),
        "    if [ $statusCode -ne 0 ]; then".to_string(),
        format!(
            "        echo \"Failure code [$statusCode] on Line [$2]: $1\" >> \"${FAIL_LOG_VAR}\""
        ),
        "        exit $statusCode".to_string(),
        "    fi".to_string(),
        "}".to_string(),
    ]
}

/// `failLog="<script>_FAILURES"`
pub fn fail_log_assignment(script: &Path) -> String {
    format!(
        "{FAIL_LOG_VAR}=\"{}\"",
        escape_double_quoted(&marker_path(script, Marker::Failures).to_string_lossy())
    )
}

/// `execute "<command>" <line_no>`
pub fn wrap(command: &str, line_no: usize) -> String {
    format!("{EXECUTE_FN} \"{}\" {}", escape_double_quoted(command), line_no)
}

/// Escape text for a double-quoted shell word so `execute` receives the
/// command exactly as written; expansion happens once, inside `eval`.
pub fn escape_double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
