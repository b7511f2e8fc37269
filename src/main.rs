//! Model Protector entry point.
//!
//! Encrypts model files for at-rest storage and inspects encrypted models
//! by loading them through the protected loader.

mod cli_parser;
mod runtime_init;

use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(|s| s.as_str()) else {
        cli_parser::print_usage();
        return ExitCode::from(runtime_init::EXIT_USAGE);
    };

    match command {
        "help" | "--help" | "-h" => {
            if let Some(sub) = args.get(2) {
                cli_parser::print_command_help(sub);
            } else {
                cli_parser::print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("model-protector {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        "encrypt" => run(|config| runtime_init::run_encrypt(&args[2..], config)),
        "inspect" => run(|config| runtime_init::run_inspect(&args[2..], config)),
        other if other.starts_with('-') => {
            eprintln!("Unknown option: {}", other);
            cli_parser::print_usage();
            ExitCode::from(runtime_init::EXIT_USAGE)
        }
        // Bare `model-protector <model_file>` is the one-shot encryption form
        _ => run(|config| runtime_init::run_encrypt(&args[1..], config)),
    }
}

fn run<F>(command: F) -> ExitCode
where
    F: FnOnce(&model_protector::ProtectorConfig) -> u8,
{
    let config = match model_protector::config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(runtime_init::EXIT_CONFIG);
        }
    };
    runtime_init::init_tracing(config.log_format);
    ExitCode::from(command(&config))
}
