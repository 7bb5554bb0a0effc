//! The ChaCha20 state layout and block function.
//!
//! State is an ordered sequence of 16 unsigned 32-bit words addressed
//! columnwise as a 4x4 matrix: `[c0,c1,c2,c3, k0..k7, ctr, n0,n1,n2]`.

/// ChaCha20 constant words, the ASCII string `"expand 32-byte k"` encoded as
/// little-endian `u32` words.
const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// Builds the initial 16-word state from key, nonce, and starting counter.
#[inline]
pub(crate) fn init_state(key: &[u8; 32], nonce: &[u8; 12], counter: u32) -> [u32; 16] {
    let mut state = [0u32; 16];

    state[0..4].copy_from_slice(&CONSTANTS);

    state[4..12]
        .iter_mut()
        .zip(key.chunks_exact(4))
        .for_each(|(s, k)| *s = u32::from_le_bytes(k.try_into().unwrap()));

    state[12] = counter;

    state[13..16]
        .iter_mut()
        .zip(nonce.chunks_exact(4))
        .for_each(|(s, n)| *s = u32::from_le_bytes(n.try_into().unwrap()));

    state
}

/// One ChaCha20 quarter round: mixes four state words via addition mod 2^32,
/// XOR, and fixed left rotations.
#[inline(always)]
fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(7);
}

/// Applies the full 20-round ChaCha20 permutation: 10 iterations of a column
/// round followed by a diagonal round.
#[inline]
fn rounds(state: &mut [u32; 16]) {
    for _ in 0..10 {
        quarter_round(state, 0, 4, 8, 12);
        quarter_round(state, 1, 5, 9, 13);
        quarter_round(state, 2, 6, 10, 14);
        quarter_round(state, 3, 7, 11, 15);

        quarter_round(state, 0, 5, 10, 15);
        quarter_round(state, 1, 6, 11, 12);
        quarter_round(state, 2, 7, 8, 13);
        quarter_round(state, 3, 4, 9, 14);
    }
}

/// Produces one 64-byte keystream block from an initialized 16-word state.
///
/// Pure and deterministic; has no failure mode.
#[inline]
pub(crate) fn block(state: &[u32; 16]) -> [u8; 64] {
    let mut working = *state;
    rounds(&mut working);

    working
        .iter_mut()
        .zip(state)
        .for_each(|(w, o)| *w = w.wrapping_add(*o));

    let mut out = [0u8; 64];
    out.chunks_exact_mut(4)
        .zip(&working)
        .for_each(|(chunk, word)| chunk.copy_from_slice(&word.to_le_bytes()));

    out
}
