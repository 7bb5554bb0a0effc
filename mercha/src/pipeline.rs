//! The top-level `mercha` pipeline: ChaCha20 in place, then a Merkle
//! reduction of the result.

use crate::chacha::chacha20_encrypt;
use crate::merkle::merkel_tree;

/// Computes `Merkle(ChaCha20(key, nonce, 0, input))` into `output`.
///
/// `input` is mutated in place by the ChaCha20 stage; after this call it
/// holds `ChaCha20(key, nonce, 0, input)`, not the original plaintext.
/// Callers that need to retain the original bytes must clone `input` first.
///
/// # Panics
///
/// Panics if `input.len()` is not a power of two, or is less than 64, or if
/// `output.len() != 64`. These are caller-enforced preconditions per the
/// pipeline's external interface; `input.len()` up to 2^32 blocks
/// (about 256 GiB) is supported, beyond which the ChaCha20 counter wraps.
pub fn mercha(key: &[u8; 32], nonce: &[u8; 12], input: &mut [u8], output: &mut [u8]) {
    assert_eq!(output.len(), 64, "output must be exactly 64 bytes");
    assert!(
        input.len() >= 64 && input.len().is_power_of_two(),
        "input length must be a power of two and at least 64 bytes"
    );

    chacha20_encrypt(key, nonce, 0, input);
    merkel_tree(input, output);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l64_passthrough_equals_chacha20_encrypt() {
        let key = [0x3Cu8; 32];
        let nonce = [0x09u8; 12];

        let mut via_pipeline = vec![5u8; 64];
        let mut output = [0u8; 64];
        mercha(&key, &nonce, &mut via_pipeline, &mut output);

        let mut via_encrypt = vec![5u8; 64];
        chacha20_encrypt(&key, &nonce, 0, &mut via_encrypt);

        assert_eq!(&output[..], &via_encrypt[..]);
    }

    #[test]
    fn s1_zero_key_zero_nonce_zero_input() {
        let key = [0u8; 32];
        let nonce = [0u8; 12];

        let mut input = vec![0u8; 64];
        let mut output = [0u8; 64];
        mercha(&key, &nonce, &mut input, &mut output);

        // First 8 bytes of the RFC 7539 zero-key/zero-nonce keystream block.
        assert_eq!(output[0..8], [0x76, 0xb8, 0xe0, 0xad, 0xa0, 0xf1, 0x3d, 0x90]);
    }

    #[test]
    fn mutates_input_in_place() {
        let key = [1u8; 32];
        let nonce = [2u8; 12];

        let original = vec![9u8; 64];
        let mut input = original.clone();
        let mut output = [0u8; 64];
        mercha(&key, &nonce, &mut input, &mut output);

        assert_ne!(input, original);
    }

    #[test]
    #[should_panic]
    fn rejects_non_power_of_two_length() {
        let key = [0u8; 32];
        let nonce = [0u8; 12];
        let mut input = vec![0u8; 96];
        let mut output = [0u8; 64];
        mercha(&key, &nonce, &mut input, &mut output);
    }

    #[test]
    #[should_panic]
    fn rejects_length_below_64() {
        let key = [0u8; 32];
        let nonce = [0u8; 12];
        let mut input = vec![0u8; 32];
        let mut output = [0u8; 64];
        mercha(&key, &nonce, &mut input, &mut output);
    }
}
