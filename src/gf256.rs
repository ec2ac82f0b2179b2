//! GF(2^8) arithmetic over the primitive polynomial 0x1D (x^8+x^4+x^3+x^2+1).
//!
//! Tables are built once and shared process-wide through a `Lazy` static.

use once_cell::sync::Lazy;

const PRIMITIVE_POLY: u16 = 0x11D;

pub struct Tables {
    pub exps: [u8; 256],
    pub logs: [u8; 256],
}

pub static TABLES: Lazy<Tables> = Lazy::new(build_tables);

fn build_tables() -> Tables {
    let mut exps = [0u8; 256];
    let mut logs = [0u8; 256];

    let mut x: u16 = 1;
    for i in 0..255usize {
        exps[i] = x as u8;
        logs[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE_POLY;
        }
    }
    // The multiplicative group has order 255; exps[255] wraps back to exps[0] == 1.
    exps[255] = exps[0];

    Tables { exps, logs }
}

/// Multiplication in GF(2^8). Zero annihilates, as in any field.
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = &TABLES;
    let log_sum = t.logs[a as usize] as u16 + t.logs[b as usize] as u16;
    t.exps[(log_sum % 255) as usize]
}

/// Division in GF(2^8). `b` must be nonzero.
pub fn div(a: u8, b: u8) -> u8 {
    assert!(b != 0, "division by zero in GF(2^8)");
    if a == 0 {
        return 0;
    }
    let t = &TABLES;
    let diff = t.logs[a as usize] as i16 - t.logs[b as usize] as i16;
    let idx = diff.rem_euclid(255) as usize;
    t.exps[idx]
}

/// Additive inverse is the identity in characteristic 2.
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Evaluate a GF(2^8) polynomial given its coefficients (lowest degree first)
/// at point `x`, using Horner's method.
pub fn eval_poly(coeffs: &[u8], x: u8) -> u8 {
    let mut acc = 0u8;
    for &c in coeffs.iter().rev() {
        acc = add(mul(acc, x), c);
    }
    acc
}
