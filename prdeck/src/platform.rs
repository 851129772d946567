//! Desktop integrations: system clipboard and browser launch.

use std::process::{Command, Stdio};

use prdeck_core::ports::{Browser, Clipboard};

/// Clipboard backed by `arboard`. A fresh handle is opened per copy so no display connection is
/// held while idle.
#[derive(Debug, Default)]
pub struct ArboardClipboard;

impl Clipboard for ArboardClipboard {
    fn copy(&self, text: &str) -> Result<(), String> {
        let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
        clipboard.set_text(text).map_err(|e| e.to_string())
    }
}

/// Launches urls with the platform opener.
///
/// The opener hands the url to the desktop and exits, so `open` waits for it. Callers run it on a
/// blocking thread.
#[derive(Debug, Clone)]
pub struct SystemBrowser {
    program: &'static str,
    prefix_args: &'static [&'static str],
}

impl SystemBrowser {
    pub fn for_os(target_os: &str) -> Self {
        match target_os {
            "macos" => Self {
                program: "open",
                prefix_args: &[],
            },
            "windows" => Self {
                program: "cmd",
                prefix_args: &["/C", "start", ""],
            },
            _ => Self {
                program: "xdg-open",
                prefix_args: &[],
            },
        }
    }

    fn command(&self, url: &str) -> Command {
        let mut command = Command::new(self.program);
        command
            .args(self.prefix_args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl Default for SystemBrowser {
    fn default() -> Self {
        Self::for_os(std::env::consts::OS)
    }
}

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), String> {
        let status = self
            .command(url)
            .status()
            .map_err(|e| format!("failed to launch {}: {e}", self.program))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{} exited with {status}", self.program))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(browser: &SystemBrowser, url: &str) -> Vec<String> {
        let command = browser.command(url);
        std::iter::once(command.get_program())
            .chain(command.get_args())
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn picks_the_platform_opener() {
        let url = "https://github.com/o/r/pull/1";
        assert_eq!(argv(&SystemBrowser::for_os("macos"), url), ["open", url]);
        assert_eq!(argv(&SystemBrowser::for_os("linux"), url), ["xdg-open", url]);
        assert_eq!(
            argv(&SystemBrowser::for_os("windows"), url),
            ["cmd", "/C", "start", "", url]
        );
    }

    #[cfg(unix)]
    #[test]
    fn open_waits_for_the_opener_and_reports_its_exit() {
        let opener = |program: &'static str| SystemBrowser {
            program,
            prefix_args: &[],
        };
        let url = "https://github.com/o/r/pull/1";
        assert_eq!(opener("true").open(url), Ok(()));

        let err = opener("false").open(url).expect_err("non-zero exit");
        assert!(err.starts_with("false exited with"), "{err}");

        let err = opener("prdeck-no-such-opener")
            .open(url)
            .expect_err("missing opener");
        assert!(err.starts_with("failed to launch prdeck-no-such-opener"), "{err}");
    }
}
