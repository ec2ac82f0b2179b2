//! Byte-wise Shamir secret sharing over GF(2^8) (spec.md §4.2). Secrets
//! are framed with a leading 1 bit before byte-packing so that leading
//! zero bytes survive a split/combine round trip.

use crate::gf256;
use rand::{CryptoRng, RngCore};

#[derive(Debug, thiserror::Error)]
pub enum ShamirError {
    #[error("n must be in [2, 255], got {0}")]
    InvalidN(usize),
    #[error("k must be in [2, 255] and <= n ({n}), got {k}")]
    InvalidK { k: usize, n: usize },
    #[error("share {0} has wrong length: expected {1}, got {2}")]
    ShareLength(usize, usize, usize),
    #[error("shares disagree on chunk count")]
    ChunkMismatch,
    #[error("no shares provided")]
    Empty,
    #[error("encoded secret has no leading 1 bit (corrupt reconstruction)")]
    MissingLeadingBit,
}

/// One share of a Shamir-split secret: an x-coordinate and the y-values
/// for every chunk of the bit-prepended, byte-packed secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Share {
    pub x: u8,
    pub ys: Vec<u8>,
}

impl Share {
    /// Pack as `x ∥ ys`, the layout spec.md §4.2 requires on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.ys.len());
        out.push(self.x);
        out.extend_from_slice(&self.ys);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&x, ys) = bytes.split_first()?;
        Some(Share { x, ys: ys.to_vec() })
    }
}

/// Prepend a single 1 bit (high order) to `secret`, then zero-pad to a
/// byte boundary. Preserves leading zero bytes of `secret` across a
/// combine() round-trip, since the 1 bit marks where the real data starts.
fn encode_secret(secret: &[u8]) -> Vec<u8> {
    let mut bits: Vec<u8> = Vec::with_capacity((secret.len() + 1) * 8 + 7);
    bits.push(1);
    for &byte in secret {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1);
        }
    }
    while bits.len() % 8 != 0 {
        bits.push(0);
    }
    bits.chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b))
        .collect()
}

/// Inverse of `encode_secret`: strip bits up to and including the first 1.
fn decode_secret(chunks: &[u8]) -> Result<Vec<u8>, ShamirError> {
    let mut bits: Vec<u8> = Vec::with_capacity(chunks.len() * 8);
    for &byte in chunks {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1);
        }
    }
    let first_one = bits
        .iter()
        .position(|&b| b == 1)
        .ok_or(ShamirError::MissingLeadingBit)?;
    let payload = &bits[first_one + 1..];
    let out = payload
        .chunks(8)
        .filter(|c| c.len() == 8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b))
        .collect();
    Ok(out)
}

/// Split `secret` into `n` shares such that any `k` reconstruct it.
pub fn share<R: RngCore + CryptoRng>(
    secret: &[u8],
    n: usize,
    k: usize,
    rng: &mut R,
) -> Result<Vec<Share>, ShamirError> {
    if !(2..=255).contains(&n) {
        return Err(ShamirError::InvalidN(n));
    }
    if !(2..=255).contains(&k) || k > n {
        return Err(ShamirError::InvalidK { k, n });
    }

    let chunks = encode_secret(secret);
    let mut ys_per_share: Vec<Vec<u8>> = (0..n).map(|_| Vec::with_capacity(chunks.len())).collect();

    for &chunk in &chunks {
        let mut coeffs = Vec::with_capacity(k);
        coeffs.push(chunk);
        for _ in 1..k {
            let mut byte = [0u8; 1];
            rng.fill_bytes(&mut byte);
            coeffs.push(byte[0]);
        }
        for (i, share_ys) in ys_per_share.iter_mut().enumerate() {
            let x = (i + 1) as u8;
            share_ys.push(gf256::eval_poly(&coeffs, x));
        }
    }

    Ok(ys_per_share
        .into_iter()
        .enumerate()
        .map(|(i, ys)| Share {
            x: (i + 1) as u8,
            ys,
        })
        .collect())
}

/// Split a single GF(2^8) byte into `n` shares such that any `k`
/// reconstruct it. Unlike `share`, no leading-bit framing is applied: a
/// lone byte has no "leading zero byte" to preserve, so each share is
/// exactly one y-value (spec.md §8 P5/S6 require the per-level hint-share
/// contribution to be exactly one byte per hint key).
pub fn share_byte<R: RngCore + CryptoRng>(
    secret: u8,
    n: usize,
    k: usize,
    rng: &mut R,
) -> Result<Vec<Share>, ShamirError> {
    if !(2..=255).contains(&n) {
        return Err(ShamirError::InvalidN(n));
    }
    if !(2..=255).contains(&k) || k > n {
        return Err(ShamirError::InvalidK { k, n });
    }

    let mut coeffs = Vec::with_capacity(k);
    coeffs.push(secret);
    for _ in 1..k {
        let mut byte = [0u8; 1];
        rng.fill_bytes(&mut byte);
        coeffs.push(byte[0]);
    }

    Ok((0..n)
        .map(|i| {
            let x = (i + 1) as u8;
            Share {
                x,
                ys: vec![gf256::eval_poly(&coeffs, x)],
            }
        })
        .collect())
}

/// Reconstruct a byte from any `k` of the shares returned by `share_byte`.
pub fn combine_byte(shares: &[Share], k: usize) -> Result<u8, ShamirError> {
    if shares.is_empty() {
        return Err(ShamirError::Empty);
    }
    let use_shares = &shares[..k.min(shares.len())];
    for (i, s) in use_shares.iter().enumerate() {
        if s.ys.len() != 1 {
            return Err(ShamirError::ShareLength(i, 1, s.ys.len()));
        }
    }
    Ok(lagrange_at_zero(use_shares, 0))
}

/// Reconstruct the secret from any `k` of the shares returned by `share`.
pub fn combine(shares: &[Share], k: usize) -> Result<Vec<u8>, ShamirError> {
    if shares.is_empty() {
        return Err(ShamirError::Empty);
    }
    let use_shares = &shares[..k.min(shares.len())];
    let chunk_count = use_shares[0].ys.len();
    for (i, s) in use_shares.iter().enumerate() {
        if s.ys.len() != chunk_count {
            return Err(ShamirError::ShareLength(i, chunk_count, s.ys.len()));
        }
    }
    if use_shares.iter().any(|s| s.ys.len() != chunk_count) {
        return Err(ShamirError::ChunkMismatch);
    }

    let mut chunks = Vec::with_capacity(chunk_count);
    for chunk_idx in 0..chunk_count {
        chunks.push(lagrange_at_zero(use_shares, chunk_idx));
    }

    decode_secret(&chunks)
}

/// Lagrange-interpolate the polynomial implied by `shares` at x=0, for the
/// `chunk_idx`-th y-value of each share.
fn lagrange_at_zero(shares: &[Share], chunk_idx: usize) -> u8 {
    let mut result = 0u8;
    for (i, si) in shares.iter().enumerate() {
        let mut numerator = 1u8;
        let mut denominator = 1u8;
        for (j, sj) in shares.iter().enumerate() {
            if i == j {
                continue;
            }
            // At x=0: (0 - x_j) == x_j in GF(2^8) (subtraction is XOR).
            numerator = gf256::mul(numerator, sj.x);
            denominator = gf256::mul(denominator, gf256::add(si.x, sj.x));
        }
        let term = gf256::mul(si.ys[chunk_idx], gf256::div(numerator, denominator));
        result = gf256::add(result, term);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn round_trip_single_zero_byte() {
        let secret = [0x00u8];
        let shares = share(&secret, 3, 2, &mut OsRng).unwrap();
        for pair in [[0, 1], [0, 2], [1, 2]] {
            let subset = vec![shares[pair[0]].clone(), shares[pair[1]].clone()];
            assert_eq!(combine(&subset, 2).unwrap(), secret);
        }
    }

    #[test]
    fn round_trip_three_of_five() {
        let secret = [0x42u8];
        let shares = share(&secret, 5, 3, &mut OsRng).unwrap();
        assert_eq!(combine(&shares[0..3], 3).unwrap(), secret);
        assert_eq!(combine(&shares[1..4], 3).unwrap(), secret);
    }

    #[test]
    fn preserves_leading_zero_bytes() {
        let secret = [0x00u8, 0x00, 0x01];
        let shares = share(&secret, 5, 3, &mut OsRng).unwrap();
        let subset = vec![shares[0].clone(), shares[2].clone(), shares[4].clone()];
        assert_eq!(combine(&subset, 3).unwrap(), secret.to_vec());
    }

    #[test]
    fn rejects_bad_params() {
        assert!(share(&[1], 1, 2, &mut OsRng).is_err());
        assert!(share(&[1], 5, 1, &mut OsRng).is_err());
        assert!(share(&[1], 5, 6, &mut OsRng).is_err());
    }

    #[test]
    fn multi_byte_secret_round_trips() {
        let secret: Vec<u8> = (0..18u8).collect();
        let shares = share(&secret, 18, 10, &mut OsRng).unwrap();
        let subset: Vec<Share> = shares.iter().skip(3).take(10).cloned().collect();
        assert_eq!(combine(&subset, 10).unwrap(), secret);
    }

    #[test]
    fn byte_shares_are_exactly_one_byte_each() {
        let shares = share_byte(0x42, 5, 3, &mut OsRng).unwrap();
        for share in &shares {
            assert_eq!(share.ys.len(), 1);
        }
        assert_eq!(combine_byte(&shares[1..4], 3).unwrap(), 0x42);
    }

    #[test]
    fn byte_round_trip_zero() {
        let shares = share_byte(0x00, 4, 2, &mut OsRng).unwrap();
        let subset = vec![shares[0].clone(), shares[3].clone()];
        assert_eq!(combine_byte(&subset, 2).unwrap(), 0x00);
    }
}
