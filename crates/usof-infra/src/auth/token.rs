use argon2::password_hash::rand_core::{OsRng, RngCore};

use usof_core::ports::TokenGenerator;

const TOKEN_BYTES: usize = 32;

/// 32 random bytes from the OS, hex encoded (64 characters).
#[derive(Debug, Default, Clone, Copy)]
pub struct HexTokenGenerator;

impl TokenGenerator for HexTokenGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}
