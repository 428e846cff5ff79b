//! Order-signature verification.
//!
//! Every order submission carries a signature over the canonical message
//! `order:{marketId}:{userId}:{side}:{price}:{quantity}:{tokenType}`. The
//! price segment is the exact textual form the client sent; the server never
//! re-renders it. Which scheme applies is a per-chain configuration choice.

mod adr36;
mod ed25519;

use std::collections::HashMap;

pub use adr36::sign_doc_bytes;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("malformed {what}: {detail}")]
    MalformedEncoding { what: &'static str, detail: String },
    #[error("signature does not match")]
    BadSignature,
}

/// The raw order parameters as received in transport, before any parsing.
/// `price` keeps the client's textual representation so the signed message
/// can be reconstructed byte for byte.
#[derive(Debug, Clone, Copy)]
pub struct OrderMessage<'a> {
    pub market_id: &'a str,
    pub user_id: &'a str,
    pub side: &'a str,
    pub price: &'a str,
    pub quantity: u64,
    pub token_type: &'a str,
}

impl OrderMessage<'_> {
    /// The canonical signed message, UTF-8, no trailing newline.
    pub fn canonical(&self) -> String {
        format!(
            "order:{}:{}:{}:{}:{}:{}",
            self.market_id, self.user_id, self.side, self.price, self.quantity, self.token_type
        )
    }
}

/// Signature material accompanying an order submission.
#[derive(Debug, Clone, Default)]
pub struct SignatureProof {
    pub signature: String,
    pub wallet_address: String,
    /// Cosmos-family chains sign with a session key rather than the wallet
    /// key; both fields are required there and ignored elsewhere.
    pub session_public_key: Option<String>,
    pub session_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainScheme {
    /// Base58 ed25519 detached signature over the raw message bytes.
    Ed25519,
    /// Secp256k1 over the SHA-256 of the ADR-36 amino sign doc.
    Adr36,
    /// Accept without verification. Development chains only.
    Trusted,
}

impl ChainScheme {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "ed25519" => Some(ChainScheme::Ed25519),
            "adr36" => Some(ChainScheme::Adr36),
            "trusted" => Some(ChainScheme::Trusted),
            _ => None,
        }
    }
}

/// Per-chain signature scheme registry.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    chains: HashMap<String, ChainScheme>,
}

impl SignatureVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(mut self, chain_id: impl Into<String>, scheme: ChainScheme) -> Self {
        self.chains.insert(chain_id.into(), scheme);
        self
    }

    /// Parse a `chain=scheme` comma list, e.g.
    /// `solana=ed25519,cosmoshub=adr36,devnet=trusted`.
    pub fn from_spec(spec: &str) -> Result<Self, VerifyError> {
        let mut verifier = Self::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (chain, scheme) = entry.split_once('=').ok_or(VerifyError::MalformedEncoding {
                what: "chain scheme spec",
                detail: format!("expected chain=scheme, got {entry:?}"),
            })?;
            let scheme = ChainScheme::parse(scheme.trim()).ok_or(VerifyError::MalformedEncoding {
                what: "chain scheme spec",
                detail: format!("unknown scheme {scheme:?}"),
            })?;
            verifier.chains.insert(chain.trim().to_owned(), scheme);
        }
        Ok(verifier)
    }

    pub fn scheme(&self, chain_id: &str) -> Result<ChainScheme, VerifyError> {
        self.chains
            .get(chain_id)
            .copied()
            .ok_or_else(|| VerifyError::UnsupportedChain(chain_id.to_owned()))
    }

    /// Verify that `proof` authorizes `message` on `chain_id`.
    pub fn verify_order(
        &self,
        chain_id: &str,
        message: &OrderMessage<'_>,
        proof: &SignatureProof,
    ) -> Result<(), VerifyError> {
        let canonical = message.canonical();
        match self.scheme(chain_id)? {
            ChainScheme::Trusted => {
                tracing::debug!(chain_id, "chain is trust-without-verify, skipping signature");
                Ok(())
            }
            ChainScheme::Ed25519 => {
                ed25519::verify(canonical.as_bytes(), &proof.signature, &proof.wallet_address)
            }
            ChainScheme::Adr36 => {
                let pubkey = proof
                    .session_public_key
                    .as_deref()
                    .ok_or(VerifyError::Missing("session public key"))?;
                let address = proof
                    .session_address
                    .as_deref()
                    .ok_or(VerifyError::Missing("session address"))?;
                adr36::verify(canonical.as_bytes(), &proof.signature, pubkey, address)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message<'a>(price: &'a str) -> OrderMessage<'a> {
        OrderMessage {
            market_id: "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d",
            user_id: "alice",
            side: "buy",
            price,
            quantity: 10,
            token_type: "yes",
        }
    }

    #[test]
    fn canonical_message_format() {
        let msg = message("0.50");
        assert_eq!(
            msg.canonical(),
            "order:9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d:alice:buy:0.50:10:yes"
        );
    }

    #[test]
    fn canonical_message_preserves_price_text() {
        // "0.5" and "0.50" are the same number but different messages.
        assert_ne!(message("0.5").canonical(), message("0.50").canonical());
    }

    #[test]
    fn spec_parser_roundtrip() {
        let verifier =
            SignatureVerifier::from_spec("solana=ed25519, cosmoshub=adr36,devnet=trusted").unwrap();
        assert_eq!(verifier.scheme("solana").unwrap(), ChainScheme::Ed25519);
        assert_eq!(verifier.scheme("cosmoshub").unwrap(), ChainScheme::Adr36);
        assert_eq!(verifier.scheme("devnet").unwrap(), ChainScheme::Trusted);
    }

    #[test]
    fn spec_parser_rejects_unknown_scheme() {
        assert!(SignatureVerifier::from_spec("solana=rsa").is_err());
    }

    #[test]
    fn unknown_chain_is_unsupported() {
        let verifier = SignatureVerifier::from_spec("solana=ed25519").unwrap();
        let err = verifier
            .verify_order("near", &message("0.5"), &SignatureProof::default())
            .unwrap_err();
        assert!(matches!(err, VerifyError::UnsupportedChain(_)));
    }

    #[test]
    fn trusted_chain_accepts_anything() {
        let verifier = SignatureVerifier::from_spec("devnet=trusted").unwrap();
        let proof = SignatureProof {
            signature: "garbage".into(),
            wallet_address: "garbage".into(),
            ..Default::default()
        };
        verifier.verify_order("devnet", &message("0.5"), &proof).unwrap();
    }

    #[test]
    fn adr36_requires_session_material() {
        let verifier = SignatureVerifier::from_spec("cosmoshub=adr36").unwrap();
        let proof = SignatureProof {
            signature: "AAAA".into(),
            wallet_address: "cosmos1xyz".into(),
            ..Default::default()
        };
        let err = verifier.verify_order("cosmoshub", &message("0.5"), &proof).unwrap_err();
        assert!(matches!(err, VerifyError::Missing(_)));
    }
}
