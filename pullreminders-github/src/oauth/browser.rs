//! Launching the system browser

use std::process::{Command, Stdio};

use tracing::debug;

/// Open `url` in the user's browser
///
/// `$BROWSER` wins when set, otherwise the platform opener is used. Only the
/// launch is checked; the opener is not waited on.
pub(crate) fn open(url: &str) -> std::io::Result<()> {
    let mut cmd = command(url, std::env::var("BROWSER").ok());
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    debug!(program = ?cmd.get_program(), "Opening browser");
    cmd.spawn().map(|_| ())
}

fn command(url: &str, browser: Option<String>) -> Command {
    if let Some(browser) = browser.filter(|b| !b.trim().is_empty()) {
        let mut cmd = Command::new(browser);
        cmd.arg(url);
        return cmd;
    }

    let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(windows) {
        ("rundll32", &["url.dll,FileProtocolHandler"])
    } else {
        ("xdg-open", &[])
    };

    let mut cmd = Command::new(program);
    cmd.args(args).arg(url);
    cmd
}
