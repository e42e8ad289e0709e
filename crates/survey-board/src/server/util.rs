use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Short id attached to the log lines of one request.
pub fn generate_correlation_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
