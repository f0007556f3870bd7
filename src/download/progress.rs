use std::time::Duration;

/// Snapshot handed to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// 0-100, always 0 when the size is unknown
    pub percentage: u8,
    /// 0 when the server sent no content length
    pub total_bytes: u64,
    pub downloaded_bytes: u64,
}

/// Accumulates received bytes and decides when a progress notification is
/// due: only when the whole-number percentage changes. That caps a download
/// at 101 notifications however small the chunks are.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_bytes: u64,
    downloaded_bytes: u64,
    last_percentage: Option<u8>,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            downloaded_bytes: 0,
            last_percentage: None,
        }
    }

    /// Record a received chunk, returning a snapshot if it should be reported
    pub fn advance(&mut self, chunk_len: u64) -> Option<DownloadProgress> {
        self.downloaded_bytes += chunk_len;

        let percentage = Self::percentage(self.downloaded_bytes, self.total_bytes);
        if self.last_percentage == Some(percentage) {
            return None;
        }
        self.last_percentage = Some(percentage);

        Some(DownloadProgress {
            percentage,
            total_bytes: self.total_bytes,
            downloaded_bytes: self.downloaded_bytes,
        })
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes
    }

    fn percentage(downloaded: u64, total: u64) -> u8 {
        if total == 0 {
            return 0;
        }

        (downloaded as u128 * 100 / total as u128).min(100) as u8
    }

    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.1} {}", size, UNITS[unit_index])
        }
    }

    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
