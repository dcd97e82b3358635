//! Record identifiers
//!
//! An id is the current time in milliseconds rendered in base36, followed by a
//! four character random base36 suffix, e.g. `m2x4k9q1abz3`. Ids sort roughly by
//! creation time. Collisions are possible in principle and are not checked.

use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 4;

/// Highest millisecond value handed out so far. Keeps the time prefix
/// non-decreasing if the wall clock steps backwards.
static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Generate a new record identifier
pub fn generate() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let millis = LAST_MILLIS.fetch_max(now, Ordering::Relaxed).max(now);

    let mut id = to_base36(millis);
    let mut rng = rand::thread_rng();
    for _ in 0..SUFFIX_LEN {
        id.push(ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
    }
    id
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
