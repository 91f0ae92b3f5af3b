//! ThingsBoard device API topics and MQTT filter matching.

/// Device telemetry upload.
pub const TELEMETRY_TOPIC: &str = "v1/devices/me/telemetry";

/// Server-side RPC requests; the last level is the request id.
pub const RPC_REQUEST_FILTER: &str = "v1/devices/me/rpc/request/+";

/// Client-side attribute updates.
pub const ATTRIBUTES_TOPIC: &str = "v1/devices/me/attributes";

/// Whether `topic` matches the MQTT subscription `filter`.
///
/// `+` matches exactly one level, a trailing `#` matches any remainder
/// (including none).
#[must_use]
pub fn matches_filter(filter: &str, topic: &str) -> bool {
    let mut topic_levels = topic.split('/');
    for level in filter.split('/') {
        match level {
            "#" => return true,
            "+" => {
                if topic_levels.next().is_none() {
                    return false;
                }
            }
            literal => {
                if topic_levels.next() != Some(literal) {
                    return false;
                }
            }
        }
    }
    topic_levels.next().is_none()
}
