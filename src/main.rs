use std::process::ExitCode;

use colored::Colorize;
use form_request_phpdoc::cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let command_line_interface = cli::CommandLineInterface::load();
    match command_line_interface.run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{} {error:#}", "error".red().bold());
            ExitCode::from(2)
        }
    }
}
