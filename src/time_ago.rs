/// Relative age label for a story, e.g. "3h ago". Not cached, the label is
/// cheap to rebuild on every render.
pub fn time_ago(timestamp: u64, now: u64) -> String {
    let seconds = now.saturating_sub(timestamp) / 1000;
    let hours = seconds / 3600;
    if hours > 0 {
        return format!("{}h ago", hours);
    }
    let minutes = seconds / 60;
    if minutes > 0 {
        return format!("{}m ago", minutes);
    }
    "Just now".to_string()
}
