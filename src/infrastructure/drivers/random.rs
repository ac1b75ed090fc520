use embassy_time::Instant;
use esp_hal::rng::Rng;

pub(crate) fn get_seed() -> u64 {
    let rng = Rng::new();
    (u64::from(rng.random()) << 32) | u64::from(rng.random())
}

/// Entropy for an authentication challenge: hardware random plus uptime.
pub(crate) fn nonce_seed() -> [u8; 12] {
    let mut seed = [0u8; 12];
    seed[..4].copy_from_slice(&Rng::new().random().to_le_bytes());
    seed[4..].copy_from_slice(&Instant::now().as_micros().to_le_bytes());
    seed
}
