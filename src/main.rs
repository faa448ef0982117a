use std::env::args_os;
use std::process::ExitCode;

use plotwash::CLIParser;

fn main() -> ExitCode {
    let mut cli_parser = CLIParser::default();
    let arguments = cli_parser.parse(args_os());
    match plotwash::run(&arguments) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("plotwash failed because of: {}", e);
            ExitCode::FAILURE
        }
    }
}
