//! CLI help text for model-protector.

/// Print general usage information.
pub fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "model-protector - at-rest encryption for model files v{}

USAGE:
    model-protector <MODEL_FILE> [--key-out PATH]
    model-protector [COMMAND] [OPTIONS]

COMMANDS:
    encrypt      Encrypt a model file with a fresh random key and IV
    inspect      Decrypt an encrypted model in memory and report on it
    version      Show version information
    help         Show this help message

OPTIONS:
    -h, --help     Show help for command
    -V, --version  Show version information

EXAMPLES:
    model-protector detector.tflite
    model-protector encrypt detector.tflite --key-out detector.key.json
    model-protector inspect detector.enc --key-file detector.key.json

ENVIRONMENT:
    MODEL_PROTECTOR_CONFIG               TOML configuration file
    MODEL_PROTECTOR_CHUNK_SIZE           Stream read chunk in bytes (default: 4096)
    MODEL_PROTECTOR_EXTENSION            Encrypted file extension (default: enc)
    MODEL_PROTECTOR_LOG_KEY_FINGERPRINT  Log key fingerprints (default: false)
    MODEL_PROTECTOR_LOG_FORMAT           pretty | json
    RUST_LOG                             Log level (debug, info, warn, error)

EXIT CODES:
    0  Success
    1  Encryption or load failure
    2  Usage error
    3  Configuration error
",
        version
    );
}

/// Print detailed help for a specific command.
pub fn print_command_help(command: &str) {
    match command {
        "encrypt" => print_encrypt_help(),
        "inspect" => print_inspect_help(),
        _ => {
            eprintln!(
                "No detailed help available for '{}'. Use 'model-protector help' for general usage.",
                command
            );
        }
    }
}

fn print_encrypt_help() {
    eprintln!(
        "model-protector encrypt - Encrypt a model file

USAGE:
    model-protector encrypt <MODEL_FILE> [--key-out PATH]

OPTIONS:
    --key-out PATH  Write the generated key and IV to PATH (mode 0600).
                    PATH must not exist yet and may not be the model
                    or its encrypted output.

DESCRIPTION:
    Generates a fresh AES-256 key and IV, encrypts MODEL_FILE with
    AES-256-CBC, and writes the ciphertext next to it with the configured
    extension. Key material is never printed. Without --key-out the
    caller has no way to recover it.
"
    );
}

fn print_inspect_help() {
    eprintln!(
        "model-protector inspect - Inspect an encrypted model

USAGE:
    model-protector inspect <ENCRYPTED_FILE> --key-file PATH

OPTIONS:
    --key-file PATH  Key file written by 'encrypt --key-out'

DESCRIPTION:
    Decrypts the model into memory only, validates it as a TFLite
    flatbuffer, and prints its size and root table offset.
"
    );
}
