use std::process::ExitCode;

fn main() -> ExitCode {
    match tbc::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tbc::core::report::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
