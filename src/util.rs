use std::time::SystemTime;

use chrono::Local;

/// Fixed-width zero-padded local time. Date sorting compares these strings
/// lexically, which is only chronological because the format is fixed-width;
/// keep them in sync.
pub fn format_modified(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => {
            let datetime: chrono::DateTime<Local> = time.into();
            datetime.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        None => "-".to_string(),
    }
}
