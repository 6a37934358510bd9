//! System clipboard access for the bulk copy action.
//!
//! Goes through the platform's own clipboard tool rather than a native
//! binding; the write is best-effort and the caller still gets the text
//! back, so a missing tool degrades to copy-by-hand.

use std::io::Write as _;
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// Sink for the copy-selected text block.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> std::result::Result<(), String>;
}

/// The real system clipboard, driven through platform commands.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    fn pipe_to(program: &str, args: &[&str], text: &str) -> std::result::Result<(), String> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("failed to launch {program}: {e}"))?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| format!("failed to write to {program}: {e}"))?;
        }

        let status = child
            .wait()
            .map_err(|e| format!("failed to wait for {program}: {e}"))?;
        if !status.success() {
            return Err(format!("{program} exited with {status}"));
        }
        Ok(())
    }
}

impl Clipboard for SystemClipboard {
    #[cfg(target_os = "windows")]
    fn write_text(&self, text: &str) -> std::result::Result<(), String> {
        Self::pipe_to("powershell", &["-NoProfile", "-Command", "Set-Clipboard -Value $input"], text)
    }

    #[cfg(target_os = "macos")]
    fn write_text(&self, text: &str) -> std::result::Result<(), String> {
        Self::pipe_to("pbcopy", &[], text)
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    fn write_text(&self, text: &str) -> std::result::Result<(), String> {
        // X11 first, Wayland as the fallback.
        Self::pipe_to("xclip", &["-selection", "clipboard"], text)
            .or_else(|_| Self::pipe_to("wl-copy", &[], text))
    }
}

/// Test double that records the last written text.
#[derive(Debug, Default)]
pub struct CaptureClipboard {
    last: Mutex<Option<String>>,
}

impl CaptureClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<String> {
        self.last.lock().unwrap().clone()
    }
}

impl Clipboard for CaptureClipboard {
    fn write_text(&self, text: &str) -> std::result::Result<(), String> {
        *self.last.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}
