//! CPU feature detection and the accelerated/scalar XOR helper.
//!
//! `merge_hash` and the ChaCha20 driver both need to XOR or load 64-byte
//! blocks. On `x86_64` with AVX2 available, this is done 32 bytes at a time;
//! everywhere else (and with the `no-simd` feature, used by differential
//! tests) a scalar 8-byte-at-a-time path is used instead. Both paths must
//! produce identical bytes.
//!
//! AVX2 support is detected once and cached, replacing the source's
//! unsynchronized `static int simd_checked` with a proper once-initialized
//! descriptor — the same intent, made sound.

use std::sync::OnceLock;

/// Returns whether the accelerated AVX2 path should be used on this host.
#[inline]
pub(crate) fn avx2_available() -> bool {
    #[cfg(all(target_arch = "x86_64", not(feature = "no-simd")))]
    {
        static HAS_AVX2: OnceLock<bool> = OnceLock::new();
        *HAS_AVX2.get_or_init(|| is_x86_feature_detected!("avx2"))
    }

    #[cfg(not(all(target_arch = "x86_64", not(feature = "no-simd"))))]
    {
        false
    }
}

/// `dst[i] ^= src[i]` for all `i`. `dst` and `src` must have equal length.
///
/// Dispatches to an AVX2 path (32 bytes per iteration) when available,
/// falling back to a scalar path (8 bytes per iteration, tail byte-wise)
/// otherwise. Both paths are byte-exact.
#[inline]
pub(crate) fn xor_into(dst: &mut [u8], src: &[u8]) {
    assert_eq!(dst.len(), src.len());

    if avx2_available() {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            xor_into_avx2(dst, src);
            return;
        }
    }

    xor_into_scalar(dst, src);
}

fn xor_into_scalar(dst: &mut [u8], src: &[u8]) {
    let full_qwords = dst.len() / 8;

    for i in 0..full_qwords {
        let d = &mut dst[i * 8..i * 8 + 8];
        let s = &src[i * 8..i * 8 + 8];

        let a = u64::from_ne_bytes(d.try_into().unwrap());
        let b = u64::from_ne_bytes(s.try_into().unwrap());
        d.copy_from_slice(&(a ^ b).to_ne_bytes());
    }

    for i in full_qwords * 8..dst.len() {
        dst[i] ^= src[i];
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn xor_into_avx2(dst: &mut [u8], src: &[u8]) {
    use std::arch::x86_64::{_mm256_loadu_si256, _mm256_storeu_si256, _mm256_xor_si256};

    let len = dst.len();
    let avx_len = (len / 32) * 32;

    let mut offset = 0;
    while offset < avx_len {
        // SAFETY: `offset + 32 <= avx_len <= dst.len() == src.len()`, so both
        // pointers stay in bounds; `target_feature(enable = "avx2")` on this
        // function guarantees the instructions are available.
        unsafe {
            let d = dst.as_mut_ptr().add(offset) as *mut std::arch::x86_64::__m256i;
            let s = src.as_ptr().add(offset) as *const std::arch::x86_64::__m256i;

            let a = _mm256_loadu_si256(d as *const _);
            let b = _mm256_loadu_si256(s);
            _mm256_storeu_si256(d, _mm256_xor_si256(a, b));
        }

        offset += 32;
    }

    xor_into_scalar(&mut dst[avx_len..], &src[avx_len..]);
}
