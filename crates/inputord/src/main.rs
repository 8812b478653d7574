//! Entry point for the `inputord` daemon.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    inputord::run(std::env::args_os(), &mut stdout, &mut stderr)
}
