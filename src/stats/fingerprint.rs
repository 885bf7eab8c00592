//! Anonymized visitor fingerprints
//!
//! A fingerprint is a keyed hash of `(user agent, client IP, calendar day)`
//! truncated to a short hex string. Keying the hash means the stored ids
//! cannot be reversed into the inputs, and folding the day in rotates every
//! visitor's id at midnight UTC.

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt::Write;

const FINGERPRINT_HEX_LEN: usize = 12;

#[derive(Clone)]
pub struct Fingerprinter {
    mac: Hmac<Sha256>,
}

impl Fingerprinter {
    pub fn new(secret: &str) -> Result<Self> {
        let mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow!("Failed to create fingerprint HMAC: {e}"))?;
        Ok(Self { mac })
    }

    /// Derive the visitor id for one calendar day.
    pub fn fingerprint(&self, user_agent: &str, client_ip: &str, date: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(user_agent.as_bytes());
        mac.update(b"|");
        mac.update(client_ip.as_bytes());
        mac.update(b"|");
        mac.update(date.as_bytes());

        let digest = mac.finalize().into_bytes();
        let mut hex = String::with_capacity(FINGERPRINT_HEX_LEN);
        for byte in digest.iter().take(FINGERPRINT_HEX_LEN / 2) {
            // Writing to a String cannot fail.
            let _ = write!(hex, "{byte:02x}");
        }
        hex
    }
}
