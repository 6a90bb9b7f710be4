//! Keypair module
//!
//! Ed25519 key material for the local node. The secret is zeroized on drop.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use zeroize::Zeroize;

use super::error::{IdentityError, IdentityResult};
use super::peer_id::PeerId;

/// Node signing keypair
#[derive(Clone, Serialize, Deserialize)]
pub struct Keypair {
    public: PeerId,
    secret: Vec<u8>,
}

impl Keypair {
    /// Generate a fresh Ed25519 keypair
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::rng().fill(&mut seed);

        let keypair = Self::from_secret_bytes(&seed);
        seed.zeroize();
        keypair
    }

    /// Rebuild a keypair from its 32-byte secret seed
    pub fn from_secret_bytes(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Keypair {
            public: PeerId::from_verifying_key(&signing_key.verifying_key()),
            secret: seed.to_vec(),
        }
    }

    pub fn peer_id(&self) -> PeerId {
        self.public
    }

    /// Sign a message, returning the 64-byte signature
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        // `secret` is only ever built from a [u8; 32], including when loaded
        // from disk (checked in `load_from_file`).
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&self.secret);
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();

        signing_key.sign(msg).to_bytes().to_vec()
    }

    /// Verify a signature against a raw public key
    pub fn verify(public_key: &VerifyingKey, msg: &[u8], sig: &[u8]) -> bool {
        match Signature::from_slice(sig) {
            Ok(signature) => public_key.verify(msg, &signature).is_ok(),
            Err(_) => false,
        }
    }

    /// Persist as JSON
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> IdentityResult<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| IdentityError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> IdentityResult<Self> {
        let bytes = std::fs::read(path)?;
        let stored: Keypair = serde_json::from_slice(&bytes)
            .map_err(|e| IdentityError::Serialization(e.to_string()))?;

        let seed: [u8; 32] = stored.secret.as_slice().try_into().map_err(|_| {
            IdentityError::InvalidKeyLength {
                expected: 32,
                actual: stored.secret.len(),
            }
        })?;

        let keypair = Self::from_secret_bytes(&seed);
        if keypair.public != stored.public {
            return Err(IdentityError::Serialization(
                "stored public key does not match secret".to_string(),
            ));
        }
        Ok(keypair)
    }

    /// Load the identity at `path`, creating and saving a new one if absent
    pub fn load_or_generate(path: impl AsRef<Path>) -> IdentityResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load_from_file(path);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let keypair = Self::generate();
        keypair.save_to_file(path)?;
        tracing::info!(peer_id = %keypair.peer_id(), path = %path.display(), "Generated node identity");
        Ok(keypair)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("peer_id", &self.public)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Drop for Keypair {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}
