//! Signing utility for Cardioscore model artifacts.
//!
//! Writes `manifest.json` (SHA-256 of `scaler.json` and `model.json`) and its
//! Ed25519 signature `artifacts.sig` into a model directory, or generates a new
//! signing seed.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_artifacts -- <model_dir> [--serial <u64>]
//! cargo run --bin sign_artifacts -- --generate-key <seed_path> [--force]
//! ```
//!
//! # Security
//!
//! - Signing seed read from `CARDIOSCORE_SIGNING_KEY_B64_FILE`
//!   (the `CARDIOSCORE_SIGNING_KEY_B64` env fallback works only in debug builds)
//! - Generated seeds come from OS entropy and are written with 0600 permissions
//! - Seed material is zeroized after use

use std::env;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use cardioscore::adapters::artifacts::{MODEL_FILE, SCALER_FILE};
use cardioscore::adapters::manifest;

const KEY_FILE_ENV: &str = "CARDIOSCORE_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "CARDIOSCORE_SIGNING_KEY_B64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

enum Command {
    Sign {
        model_dir: PathBuf,
        serial: Option<u64>,
    },
    GenerateKey {
        seed_path: PathBuf,
        force: bool,
    },
}

fn usage() -> String {
    "Usage: sign_artifacts <model_dir> [--serial <u64>]\n       sign_artifacts --generate-key <seed_path> [--force]".to_string()
}

fn parse_args() -> Result<Command, String> {
    let mut args = env::args().skip(1);
    let mut model_dir: Option<PathBuf> = None;
    let mut seed_path: Option<PathBuf> = None;
    let mut serial: Option<u64> = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--serial" => {
                let v = args.next().ok_or_else(usage)?;
                let parsed = v
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| "--serial must be a u64".to_string())?;
                serial = Some(parsed);
            }
            "--generate-key" => {
                let v = args.next().ok_or_else(usage)?;
                seed_path = Some(PathBuf::from(v));
            }
            "--force" => force = true,
            "-h" | "--help" => return Err(usage()),
            _ => {
                if model_dir.is_none() && !arg.starts_with('-') {
                    model_dir = Some(PathBuf::from(arg));
                } else {
                    return Err(format!("Unknown arg: {arg}\n{}", usage()));
                }
            }
        }
    }

    match (model_dir, seed_path) {
        (Some(model_dir), None) => Ok(Command::Sign { model_dir, serial }),
        (None, Some(seed_path)) => Ok(Command::GenerateKey { seed_path, force }),
        _ => Err(usage()),
    }
}

fn read_signing_seed_b64() -> Result<Zeroizing<String>, String> {
    let secret = if let Ok(path) = env::var(KEY_FILE_ENV) {
        Zeroizing::new(
            fs::read_to_string(path.trim())
                .map_err(|e| format!("Failed reading signing key file: {e}"))?,
        )
    } else if cfg!(debug_assertions) {
        // Dev-only fallback for convenience.
        Zeroizing::new(env::var(KEY_ENV).map_err(|_| {
            format!("Missing signing key. Set {KEY_FILE_ENV} (or {KEY_ENV} in debug builds).")
        })?)
    } else {
        return Err(format!("Missing signing key. Set {KEY_FILE_ENV}."));
    };

    let trimmed = Zeroizing::new(secret.trim().to_string());
    if trimmed.is_empty() {
        return Err("Empty signing key".to_string());
    }
    Ok(trimmed)
}

fn read_signing_seed() -> Result<Seed, String> {
    let v = read_signing_seed_b64()?;

    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(v.as_bytes())
            .map_err(|e| format!("Invalid base64 in signing key: {e}"))?,
    );

    if raw.len() != 32 {
        return Err(format!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        ));
    }

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&raw);
    Ok(Seed(seed))
}

fn sign(model_dir: &Path, serial: Option<u64>) -> Result<(), String> {
    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let manifest = manifest::sign(model_dir, &[SCALER_FILE, MODEL_FILE], &signing_key, serial)
        .map_err(|e| e.to_string())?;

    println!(
        "Wrote {} and {} in {:?} (serial={:?}, files={})",
        manifest::MANIFEST_FILE,
        manifest::SIGNATURE_FILE,
        model_dir,
        manifest.serial,
        manifest.files.len()
    );
    println!(
        "CARDIOSCORE_MODEL_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn generate_key(seed_path: &Path, force: bool) -> Result<(), String> {
    if seed_path.exists() && !force {
        return Err(format!(
            "Refusing to overwrite existing file {seed_path:?}. Use --force."
        ));
    }

    let mut seed = Seed([0u8; 32]);
    OsRng.fill_bytes(&mut seed.0);
    let verifying_key = SigningKey::from_bytes(&seed.0).verifying_key();
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));
    seed.zeroize();

    if let Some(parent) = seed_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        opts.mode(0o600);
    }

    let mut file = opts
        .open(seed_path)
        .map_err(|e| format!("Failed to open {seed_path:?}: {e}"))?;
    file.write_all(seed_b64.as_bytes())
        .and_then(|()| file.write_all(b"\n"))
        .map_err(|e| format!("Failed to write {seed_path:?}: {e}"))?;

    // Print only non-secret material.
    println!("Wrote signing seed (base64) to {seed_path:?}");
    println!(
        "CARDIOSCORE_MODEL_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(verifying_key.as_bytes())
    );
    Ok(())
}

fn main() -> Result<(), String> {
    match parse_args()? {
        Command::Sign { model_dir, serial } => sign(&model_dir, serial),
        Command::GenerateKey { seed_path, force } => generate_key(&seed_path, force),
    }
}
