use crate::domain_port::EntropySource;
use anyhow::anyhow;
use argon2::password_hash::rand_core::{OsRng, RngCore};

/// Operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> anyhow::Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| anyhow!("os rng: {}", e))
    }
}
