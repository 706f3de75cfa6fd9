/*
[INPUT]:  Request bytes and a provisioned Ed25519 signing key
[OUTPUT]: Request signatures for authenticated Ethereal API calls
[POS]:    Auth layer - request signing
[UPDATE]: When the signing scheme changes
*/

pub mod signer;

pub use signer::Ed25519Signer;
