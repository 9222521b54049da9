//! Sitepack - command-line tool for bundling and serving static web assets

use std::process::ExitCode;

use sitepack::cli;

fn main() -> ExitCode {
    cli::run()
}
