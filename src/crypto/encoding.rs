//! URL-safe base64 without padding.

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{alphabet, Engine};

use crate::crypto::CryptoError;

// Encodes unpadded; the decoder accepts inputs with or without trailing '='
// so slugs survive clients that re-pad them.
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn base64url_encode(data: &[u8]) -> String {
    BASE64_URL.encode(data)
}

pub fn base64url_decode(data: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(BASE64_URL.decode(data)?)
}
