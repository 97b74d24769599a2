use thiserror::Error;

/// Seed used when no tokens are given.
pub const DEFAULT_SEED: u64 = 1337;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("unrecognized seed token: {0}")]
    Unrecognized(String),
}

/// Resolve CLI seed tokens into a de-duplicated list, preserving order.
///
/// Accepts decimal (`42`, `-7` maps to its magnitude) and `0x` hexadecimal.
/// Empty tokens are skipped; an empty result falls back to [`DEFAULT_SEED`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>, SeedError> {
    let mut seeds = Vec::with_capacity(tokens.len());
    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let seed = parse_seed(token).ok_or_else(|| SeedError::Unrecognized(token.to_string()))?;
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_seed(token: &str) -> Option<u64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok();
    }
    token
        .parse::<u64>()
        .ok()
        .or_else(|| token.parse::<i64>().ok().map(i64::unsigned_abs))
}
