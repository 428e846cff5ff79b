//! Cosmos-style verification following ADR-36 offline signing: the message is
//! wrapped in a fixed amino sign doc (`sign/MsgSignData`, empty fee, zeroed
//! account fields), serialized as sorted-key JSON, hashed with SHA-256, and
//! verified as a compact secp256k1 (r,s) signature against the session key.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use secp256k1::{ecdsa, Message, PublicKey, Secp256k1};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::VerifyError;

// Field order in these structs is the sorted-key order of the JSON output,
// matching what Cosmos wallets produce for ADR-36 sign docs.
#[derive(Serialize)]
struct SignDoc<'a> {
    account_number: &'static str,
    chain_id: &'static str,
    fee: Fee,
    memo: &'static str,
    msgs: [Msg<'a>; 1],
    sequence: &'static str,
}

#[derive(Serialize)]
struct Fee {
    amount: [&'static str; 0],
    gas: &'static str,
}

#[derive(Serialize)]
struct Msg<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: MsgValue<'a>,
}

#[derive(Serialize)]
struct MsgValue<'a> {
    data: String,
    signer: &'a str,
}

/// The serialized ADR-36 sign doc for `message` signed by `signer`.
pub fn sign_doc_bytes(message: &[u8], signer: &str) -> Vec<u8> {
    let doc = SignDoc {
        account_number: "0",
        chain_id: "",
        fee: Fee { amount: [], gas: "0" },
        memo: "",
        msgs: [Msg {
            kind: "sign/MsgSignData",
            value: MsgValue { data: BASE64.encode(message), signer },
        }],
        sequence: "0",
    };
    serde_json::to_vec(&doc).expect("sign doc serializes")
}

fn decode_b64(what: &'static str, input: &str) -> Result<Vec<u8>, VerifyError> {
    BASE64
        .decode(input)
        .map_err(|e| VerifyError::MalformedEncoding { what, detail: e.to_string() })
}

pub(crate) fn verify(
    message: &[u8],
    signature_b64: &str,
    session_pubkey_b64: &str,
    session_address: &str,
) -> Result<(), VerifyError> {
    let sig_bytes = decode_b64("signature", signature_b64)?;
    let key_bytes = decode_b64("session public key", session_pubkey_b64)?;

    let mut signature =
        ecdsa::Signature::from_compact(&sig_bytes).map_err(|e| VerifyError::MalformedEncoding {
            what: "signature",
            detail: e.to_string(),
        })?;
    // Wallets are not required to emit low-s form.
    signature.normalize_s();

    let pubkey = PublicKey::from_slice(&key_bytes).map_err(|e| VerifyError::MalformedEncoding {
        what: "session public key",
        detail: e.to_string(),
    })?;

    let digest: [u8; 32] = Sha256::digest(sign_doc_bytes(message, session_address)).into();
    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&Message::from_digest(digest), &signature, &pubkey)
        .map_err(|_| VerifyError::BadSignature)
}
