use std::process::ExitCode;

use sorting_operator::{cli, ui::output};

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
