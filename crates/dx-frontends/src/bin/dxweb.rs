//! Entry point for the web application.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

use dx_bootstrap::Variant;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    dx_frontends::run(
        Variant::WebApp,
        std::env::args_os(),
        &mut stdout,
        &mut stderr,
    )
}
