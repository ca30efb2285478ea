//! Order id generation.

use chrono::Utc;
use rand::Rng;

/// `{prefix}{unix millis}{4 random digits}`, e.g. `ORD17290000000001234`.
pub fn generate_order_id(prefix: &str) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(1000..=9999);
    format!("{}{}{}", prefix, Utc::now().timestamp_millis(), suffix)
}
