//! Tracing setup and command implementations for model-protector.

use std::path::{Path, PathBuf};

use model_protector::protector::{encrypted_output_path, read_key_file, write_key_file};
use model_protector::{
    KeyMaterial, LogFormat, ProtectedModelLoader, ProtectorConfig, StreamCipherEngine,
    TfliteDeserializer,
};
use tracing_subscriber::EnvFilter;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_CONFIG: u8 = 3;

/// Install the stderr tracing subscriber. `RUST_LOG` overrides the default `info`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

/// Run the encrypt command: `<MODEL_FILE> [--key-out PATH]`.
pub fn run_encrypt(args: &[String], config: &ProtectorConfig) -> u8 {
    let mut input: Option<PathBuf> = None;
    let mut key_out: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--key-out" => {
                if i + 1 < args.len() {
                    key_out = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    eprintln!("Missing value for --key-out");
                    return EXIT_USAGE;
                }
            }
            arg if input.is_none() && !arg.starts_with("--") => {
                input = Some(PathBuf::from(arg));
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                return EXIT_USAGE;
            }
        }
    }

    let Some(input) = input else {
        eprintln!("Usage: model-protector encrypt <MODEL_FILE> [--key-out PATH]");
        return EXIT_USAGE;
    };
    let output = encrypted_output_path(&input, &config.encrypted_extension);
    if same_location(&output, &input) {
        eprintln!(
            "Input already has the '{}' extension; refusing to overwrite it",
            config.encrypted_extension
        );
        return EXIT_USAGE;
    }
    if let Some(key_path) = &key_out {
        if same_location(key_path, &input) || same_location(key_path, &output) {
            eprintln!(
                "--key-out {} would overwrite the model or its encrypted output",
                key_path.display()
            );
            return EXIT_USAGE;
        }
    }

    let material = match KeyMaterial::generate() {
        Ok(material) => material,
        Err(e) => {
            eprintln!("Key generation failed: {}", e);
            return EXIT_FAILURE;
        }
    };
    material.log_fingerprint(config.log_key_fingerprint, "generated");

    // Key file lands before any ciphertext exists
    if let Some(key_path) = &key_out {
        if let Err(e) = write_key_file(key_path, &material) {
            eprintln!("Could not write key file: {}", e);
            return EXIT_FAILURE;
        }
    }

    let engine = StreamCipherEngine::with_chunk_size(config.chunk_size);
    if let Err(e) = engine.encrypt_file(&input, &output, &material) {
        eprintln!("Encryption failed: {}", e);
        if let Some(key_path) = &key_out {
            if let Err(e) = std::fs::remove_file(key_path) {
                tracing::warn!(path = %key_path.display(), error = %e, "Unused key file not removed");
            }
        }
        return EXIT_FAILURE;
    }

    println!("Encryption successful!");
    println!("Encrypted model saved as: {}", output.display());
    if let Some(key_path) = &key_out {
        println!("Key material saved as: {}", key_path.display());
    }
    0
}

/// True when both paths name the same directory entry, after resolving
/// the parent directories. Entries whose parent does not exist yet can
/// only match by spelling.
fn same_location(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (resolve_entry(a), resolve_entry(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn resolve_entry(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::canonicalize(parent).ok().map(|dir| dir.join(name))
}

/// Run the inspect command: `<ENCRYPTED_FILE> --key-file PATH`.
pub fn run_inspect(args: &[String], config: &ProtectorConfig) -> u8 {
    let mut input: Option<PathBuf> = None;
    let mut key_file: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--key-file" => {
                if i + 1 < args.len() {
                    key_file = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    eprintln!("Missing value for --key-file");
                    return EXIT_USAGE;
                }
            }
            arg if input.is_none() && !arg.starts_with("--") => {
                input = Some(PathBuf::from(arg));
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                return EXIT_USAGE;
            }
        }
    }

    let (Some(input), Some(key_file)) = (input, key_file) else {
        eprintln!("Usage: model-protector inspect <ENCRYPTED_FILE> --key-file PATH");
        return EXIT_USAGE;
    };

    let material = match read_key_file(&key_file) {
        Ok(material) => material,
        Err(e) => {
            eprintln!("Could not read key file: {}", e);
            return EXIT_FAILURE;
        }
    };
    material.log_fingerprint(config.log_key_fingerprint, "key-file");

    let engine = StreamCipherEngine::with_chunk_size(config.chunk_size);
    let loader = ProtectedModelLoader::with_engine(engine, TfliteDeserializer);
    match loader.load_encrypted(&input, &material) {
        Ok(model) => {
            println!("Model: {}", input.display());
            println!("  size:        {} bytes", model.size_bytes());
            println!("  root offset: {}", model.root_offset());
            0
        }
        Err(e) => {
            eprintln!("Load failed: {}", e);
            EXIT_FAILURE
        }
    }
}
