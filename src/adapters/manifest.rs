//! Signed artifact manifest.
//!
//! `manifest.json` binds the SHA-256 digest of every artifact file; the
//! manifest bytes are signed with Ed25519 into `artifacts.sig`.
//!
//! # Key Rotation
//!
//! 1. Generate a new seed: `cargo run --bin sign_artifacts -- --generate-key <seed_path>`
//! 2. Re-sign the model directory with the new seed
//! 3. Deploy the new public key via `CARDIOSCORE_MODEL_PUBKEY_B64`

use std::collections::BTreeMap;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ArtifactError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "artifacts.sig";
pub const MANIFEST_VERSION: u32 = 1;

/// Digest list for a model directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    /// Monotonic release number, informational.
    #[serde(default)]
    pub serial: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    /// File name to lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for equal-length ASCII digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Decode a base64 Ed25519 public key.
///
/// # Errors
/// Returns `ArtifactError::Integrity` if the key is not 32 valid bytes.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| ArtifactError::Integrity(format!("invalid public key base64: {e}")))?;
    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        ArtifactError::Integrity(format!("public key must be 32 bytes (got {})", raw.len()))
    })?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| ArtifactError::Integrity("invalid Ed25519 public key".into()))
}

/// Check the manifest signature and that each `(name, bytes)` matches its digest.
///
/// The digests are computed over the exact bytes that will be parsed.
///
/// # Errors
/// Returns `ArtifactError::Integrity` on any mismatch, `Missing`/`Unreadable`
/// if the manifest or signature cannot be read.
pub fn verify(
    dir: &Path,
    key: &VerifyingKey,
    artifacts: &[(&str, &[u8])],
) -> Result<ArtifactManifest, ArtifactError> {
    let manifest_bytes = super::artifacts::read_file(&dir.join(MANIFEST_FILE))?;
    let sig_bytes = super::artifacts::read_file(&dir.join(SIGNATURE_FILE))?;

    let sig_bytes: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Integrity(format!(
            "{SIGNATURE_FILE} must be 64 bytes (got {})",
            sig_bytes.len()
        ))
    })?;
    let signature = Signature::from_bytes(&sig_bytes);
    key.verify(&manifest_bytes, &signature)
        .map_err(|_| ArtifactError::Integrity("manifest signature verification failed".into()))?;

    let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ArtifactError::Integrity(format!("invalid {MANIFEST_FILE}: {e}")))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(ArtifactError::Integrity(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }

    for (name, bytes) in artifacts {
        let expected = manifest.files.get(*name).ok_or_else(|| {
            ArtifactError::Integrity(format!("{name} is not bound by {MANIFEST_FILE}"))
        })?;
        if !constant_time_eq_str(&expected.to_ascii_lowercase(), &sha256_hex(bytes)) {
            return Err(ArtifactError::Integrity(format!(
                "{name} does not match its manifest digest"
            )));
        }
    }

    tracing::info!(
        "Verified artifact manifest (serial={:?}, files={})",
        manifest.serial,
        manifest.files.len()
    );
    Ok(manifest)
}

/// Write `manifest.json` and `artifacts.sig` for the given files in `dir`.
///
/// # Errors
/// Returns error if a file cannot be read or the outputs cannot be written.
pub fn sign(
    dir: &Path,
    files: &[&str],
    signing_key: &SigningKey,
    serial: Option<u64>,
) -> Result<ArtifactManifest, ArtifactError> {
    let mut digests = BTreeMap::new();
    for name in files {
        let bytes = super::artifacts::read_file(&dir.join(name))?;
        digests.insert((*name).to_string(), sha256_hex(&bytes));
    }

    let created_at = chrono::Utc::now().timestamp();
    let manifest = ArtifactManifest {
        version: MANIFEST_VERSION,
        serial: Some(serial.unwrap_or(created_at.max(1) as u64)),
        created_at: Some(created_at),
        files: digests,
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| ArtifactError::Integrity(format!("failed to serialize manifest: {e}")))?;
    let signature: Signature = signing_key.sign(&manifest_bytes);

    write_file(&dir.join(MANIFEST_FILE), &manifest_bytes)?;
    write_file(&dir.join(SIGNATURE_FILE), &signature.to_bytes())?;
    Ok(manifest)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    std::fs::write(path, bytes).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use tempfile::tempdir;

    fn random_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    #[test]
    fn test_sign_then_verify() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        std::fs::write(dir.join("a.json"), b"{\"a\":1}").expect("write");

        let key = random_key();
        let signed = sign(dir, &["a.json"], &key, Some(7)).expect("sign");
        assert_eq!(signed.serial, Some(7));

        let verified = verify(dir, &key.verifying_key(), &[("a.json", b"{\"a\":1}".as_slice())])
            .expect("verify");
        assert_eq!(signed, verified);
    }

    #[test]
    fn test_tampered_artifact_rejected() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        std::fs::write(dir.join("a.json"), b"original").expect("write");
        let key = random_key();
        sign(dir, &["a.json"], &key, None).expect("sign");

        let err = verify(dir, &key.verifying_key(), &[("a.json", b"tampered".as_slice())])
            .expect_err("must fail");
        assert!(err.to_string().contains("digest"));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        std::fs::write(dir.join("a.json"), b"x").expect("write");
        sign(dir, &["a.json"], &random_key(), None).expect("sign");

        let err = verify(dir, &random_key().verifying_key(), &[("a.json", b"x".as_slice())])
            .expect_err("must fail");
        assert!(err.to_string().contains("signature"));
    }

    #[test]
    fn test_unbound_file_rejected() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        std::fs::write(dir.join("a.json"), b"x").expect("write");
        let key = random_key();
        sign(dir, &["a.json"], &key, None).expect("sign");

        let err = verify(dir, &key.verifying_key(), &[("b.json", b"y".as_slice())]).expect_err("must fail");
        assert!(err.to_string().contains("not bound"));
    }

    #[test]
    fn test_public_key_decoding() {
        let key = random_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.verifying_key().to_bytes());
        assert_eq!(
            verifying_key_from_b64(&b64).expect("decode"),
            key.verifying_key()
        );
        assert!(verifying_key_from_b64("AAAA").is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq_str("abcd", "abcd"));
        assert!(!constant_time_eq_str("abcd", "abce"));
        assert!(!constant_time_eq_str("abc", "abcd"));
    }
}
