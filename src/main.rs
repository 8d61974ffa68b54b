//! c64gfx - Command-line tool for converting images into C64 bitmap and sprite data

use std::process::ExitCode;

use c64gfx::cli;

fn main() -> ExitCode {
    cli::run()
}
