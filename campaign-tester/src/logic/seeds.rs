use anyhow::{Result, bail};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

const DEFAULT_SEED: u64 = 1337;

/// A seed together with the phrase it was derived from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub phrase: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, phrase: None }
    }

    #[must_use]
    pub fn from_phrase(phrase: &str) -> Self {
        let digest = Sha256::digest(phrase.as_bytes());
        let mut bytes = [0_u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self {
            seed: u64::from_le_bytes(bytes),
            phrase: Some(phrase.to_string()),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match &self.phrase {
            Some(phrase) => format!("{phrase} ({})", self.seed),
            None => self.seed.to_string(),
        }
    }
}

/// Resolve CLI seed arguments into seeds.
///
/// Supports literal integers, `daily` (today's UTC date as a phrase) and
/// free-form phrases prefixed with `phrase:`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut resolved: Vec<SeedInfo> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let info = if token.eq_ignore_ascii_case("daily") {
            SeedInfo::from_phrase(&Utc::now().format("%Y-%m-%d").to_string())
        } else if let Some(phrase) = token.strip_prefix("phrase:") {
            if phrase.is_empty() {
                bail!("Empty seed phrase");
            }
            SeedInfo::from_phrase(phrase)
        } else if let Ok(value) = token.parse::<u64>() {
            SeedInfo::from_numeric(value)
        } else if let Ok(value) = token.parse::<i64>() {
            SeedInfo::from_numeric(value.unsigned_abs())
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if seen.insert(info.seed) {
            resolved.push(info);
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(resolved)
}
