//! System clipboard through whichever copy utility is installed.

use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};

const COPY_COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Copy `text` using the first utility that runs successfully. Blocking.
pub fn copy(text: &str) -> Result<()> {
    for (program, args) in COPY_COMMANDS {
        let child = Command::new(program)
            .args(*args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let Ok(mut child) = child else {
            continue;
        };
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .with_context(|| format!("Failed to write to {program}"))?;
        }
        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for {program}"))?;
        if status.success() {
            return Ok(());
        }
        tracing::debug!("{} exited with {}", program, status);
    }
    anyhow::bail!("no clipboard utility available")
}
