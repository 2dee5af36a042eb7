//! Record id generation.

use chrono::Utc;
use uuid::Uuid;

/// Fresh unique id: millisecond timestamp plus a random suffix, so repeated
/// partial seeding runs never collide on a hardcoded constant.
pub fn new_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}
