use crate::models::role::Role;
use crate::models::user::User;

/// Transfer direction implied by an announce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `left > 0`
    Download,
    /// `left == 0`, seeding
    Upload,
}

impl Direction {
    pub fn from_left(left: u64) -> Self {
        if left > 0 {
            Direction::Download
        } else {
            Direction::Upload
        }
    }
}

/// Whether `user` under `role` may announce in `direction`
pub fn is_permitted(role: &Role, user: &User, direction: Direction) -> bool {
    match direction {
        Direction::Download => role.download_enabled && user.download_enabled,
        Direction::Upload => role.upload_enabled,
    }
}

/// Scale raw (uploaded, downloaded) deltas by the role multipliers
pub fn credit(role: &Role, uploaded: u64, downloaded: u64) -> (u64, u64) {
    (scale(uploaded, role.multi_up), scale(downloaded, role.multi_down))
}

fn scale(bytes: u64, multiplier: f64) -> u64 {
    if multiplier <= 0.0 || !multiplier.is_finite() {
        return 0;
    }
    // `as` saturates on overflow
    (bytes as f64 * multiplier).round() as u64
}
