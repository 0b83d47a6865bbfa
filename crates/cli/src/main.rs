use std::process::ExitCode;

fn main() -> ExitCode {
    brewbot_cli::run()
}
