//! Solana-style verification: base58 signature and wallet public key, ed25519
//! detached signature over the raw message bytes.

use ed25519_dalek::{Signature, VerifyingKey};

use crate::VerifyError;

fn decode_b58(what: &'static str, input: &str) -> Result<Vec<u8>, VerifyError> {
    bs58::decode(input)
        .into_vec()
        .map_err(|e| VerifyError::MalformedEncoding { what, detail: e.to_string() })
}

pub(crate) fn verify(message: &[u8], signature_b58: &str, wallet_b58: &str) -> Result<(), VerifyError> {
    let sig_bytes: [u8; 64] = decode_b58("signature", signature_b58)?
        .as_slice()
        .try_into()
        .map_err(|_| VerifyError::MalformedEncoding {
            what: "signature",
            detail: "expected 64 bytes".into(),
        })?;
    let key_bytes: [u8; 32] = decode_b58("wallet address", wallet_b58)?
        .as_slice()
        .try_into()
        .map_err(|_| VerifyError::MalformedEncoding {
            what: "wallet address",
            detail: "expected 32 bytes".into(),
        })?;

    let key = VerifyingKey::from_bytes(&key_bytes).map_err(|e| VerifyError::MalformedEncoding {
        what: "wallet public key",
        detail: e.to_string(),
    })?;
    let signature = Signature::from_bytes(&sig_bytes);

    key.verify_strict(message, &signature).map_err(|_| VerifyError::BadSignature)
}
