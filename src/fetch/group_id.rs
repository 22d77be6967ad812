use chrono::Utc;
use std::fmt;
use uuid::Uuid;

/// Consumer group identity owned by a single fetch session.
///
/// Not `Clone`: ownership moves from the session to its cleanup task.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct EphemeralGroupId(String);

impl EphemeralGroupId {
    /// `prefix-<unix millis>=<uuid v4>`
    pub fn mint(prefix: &str) -> Self {
        Self(format!(
            "{}-{}={}",
            prefix,
            Utc::now().timestamp_millis(),
            Uuid::new_v4()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EphemeralGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
