// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::Write;
use std::process::ExitCode;

use recflow::cli;
use recflow::core::runner;
use recflow::core::transform::TransformerRegistry;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let registry = TransformerRegistry::standard();

    let command = match cli::parse(&args, &registry) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("recflow: {err}");
            return ExitCode::FAILURE;
        }
    };

    let stdout: Box<dyn Write + Send> = Box::new(std::io::stdout());
    match runner::run(
        &command.options,
        command.transformers,
        &command.filenames,
        stdout,
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("recflow: {err}");
            ExitCode::FAILURE
        }
    }
}
