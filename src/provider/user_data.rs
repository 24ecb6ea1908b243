//! Multipart user data rendering.
//!
//! Each boot script part becomes one `text/x-shellscript` MIME part, run by
//! cloud-init in order at first boot.

use std::fmt::Write;

use crate::planner::BootScriptPart;

/// MIME boundary between parts.
pub const BOUNDARY: &str = "+AWS+CDK+User+Data+Separator==";

/// Shebang prepended to every shell part.
const SHEBANG: &str = "#!/bin/bash";

/// Renders boot script parts as a multipart MIME document.
#[must_use]
pub fn render_multipart(parts: &[BootScriptPart]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Content-Type: multipart/mixed; boundary=\"{BOUNDARY}\"");
    let _ = writeln!(out, "MIME-Version: 1.0");

    for part in parts {
        let _ = write!(out, "\n--{BOUNDARY}\n");
        out.push_str("Content-Type: text/x-shellscript; charset=\"utf-8\"\n\n");
        out.push_str(SHEBANG);
        out.push('\n');
        for line in &part.lines {
            out.push_str(line);
            out.push('\n');
        }
    }

    let _ = write!(out, "\n--{BOUNDARY}--\n");
    out
}
