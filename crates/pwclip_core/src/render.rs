use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::key::DerivedKey;
use crate::types::PasswordRequest;

type HmacSha512 = Hmac<Sha512>;

const DRBG_STATE_SIZE: usize = 64;

/// Turns a derived key and a request into the password text
pub trait Renderer {
    /// Render the password; must be pure and deterministic
    fn render(&self, key: &DerivedKey, request: &PasswordRequest) -> Zeroizing<String>;
}

/// Renderer built on an HMAC-SHA512 deterministic random bit generator.
///
/// The generator is seeded with the key, reseeded with the url, the username
/// and the question answer, and its output is written in the request's
/// alphabet behind the prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrbgRenderer;

impl Renderer for DrbgRenderer {
    fn render(&self, key: &DerivedKey, request: &PasswordRequest) -> Zeroizing<String> {
        let mut drbg = HmacDrbg::new(key.as_bytes());
        drbg.reseed(request.url().as_bytes());
        drbg.reseed(request.username().as_bytes());
        if let Some(extra) = request.extra() {
            drbg.reseed(extra.as_bytes());
        }

        let length = request.length();
        let random = drbg.generate(length);
        let encoded = encode_base_x(&random, request.charset());

        let mut password = Zeroizing::new(String::with_capacity(request.prefix().len() + length));
        password.extend(request.prefix().chars().chain(encoded.chars()).take(length));
        password
    }
}

/// HMAC_DRBG over SHA-512
#[derive(Zeroize, ZeroizeOnDrop)]
struct HmacDrbg {
    key: [u8; DRBG_STATE_SIZE],
    val: [u8; DRBG_STATE_SIZE],
}

impl HmacDrbg {
    fn new(seed: &[u8]) -> Self {
        let mut drbg = Self {
            key: [0x00; DRBG_STATE_SIZE],
            val: [0x01; DRBG_STATE_SIZE],
        };
        drbg.reseed(seed);
        drbg
    }

    fn reseed(&mut self, data: &[u8]) {
        self.key = hmac(&self.key, &[&self.val[..], &[0x00], data]);
        self.val = hmac(&self.key, &[&self.val[..]]);

        if !data.is_empty() {
            self.key = hmac(&self.key, &[&self.val[..], &[0x01], data]);
            self.val = hmac(&self.key, &[&self.val[..]]);
        }
    }

    fn generate(&mut self, len: usize) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(len + DRBG_STATE_SIZE));
        while out.len() < len {
            self.val = hmac(&self.key, &[&self.val[..]]);
            out.extend_from_slice(&self.val);
        }
        self.reseed(&[]);

        out.truncate(len);
        out
    }
}

fn hmac(key: &[u8], parts: &[&[u8]]) -> [u8; DRBG_STATE_SIZE] {
    let mut mac = match HmacSha512::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    for part in parts {
        mac.update(part);
    }

    let mut out = [0u8; DRBG_STATE_SIZE];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Write little-endian `bytes` as a number in base `alphabet.len()`, most
/// significant digit first.
fn encode_base_x(bytes: &[u8], alphabet: &str) -> Zeroizing<String> {
    let symbols: Vec<char> = alphabet.chars().collect();
    let base = symbols.len() as u64;
    debug_assert!(base >= 2);

    // Big-endian working copy with leading zeros stripped.
    let mut number: Zeroizing<Vec<u8>> =
        Zeroizing::new(bytes.iter().rev().copied().skip_while(|&b| b == 0).collect());

    if number.is_empty() {
        return Zeroizing::new(symbols[0].to_string());
    }

    let mut digits = Zeroizing::new(Vec::new());
    while !number.is_empty() {
        let mut remainder = 0u64;
        let mut quotient = Zeroizing::new(Vec::with_capacity(number.len()));
        for &byte in number.iter() {
            let acc = remainder * 256 + byte as u64;
            let q = acc / base;
            remainder = acc % base;
            if !quotient.is_empty() || q != 0 {
                quotient.push(q as u8);
            }
        }
        digits.push(symbols[remainder as usize]);
        number = quotient;
    }

    Zeroizing::new(digits.iter().rev().collect())
}
