use thiserror::Error;

/// Fatal failures of an encode or decode attempt.
///
/// Redundancy mismatches are not errors; they surface as
/// [`crate::steganography::Warning`] values on a successful decode.
#[derive(Error, Debug)]
pub enum StegoError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Cipher setup failed: {0}")]
    Cipher(String),

    #[error("MAC computation failed: {0}")]
    Mac(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("File operation error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Carrier must be {expected_width}x{expected_height}, found {width}x{height}")]
    Dimensions {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Carrier buffer holds {found} bytes, expected {expected}")]
    BufferSize { expected: usize, found: usize },

    #[error("Secret cannot be empty")]
    EmptySecret,

    #[error("Secret too large: ciphertext would be {len} bytes, maximum is {max}")]
    SecretTooLarge { len: usize, max: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported carrier format: {0}")]
    UnsupportedFormat(String),

    #[error("Not a carrier file: {0}")]
    NotACarrier(String),
}

pub type Result<T> = std::result::Result<T, StegoError>;
