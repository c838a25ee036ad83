//! # Utility Functions
//!
//! This module provides small helpers shared by the view controllers: display
//! formatting for principals, timestamps and sizes, content categorisation
//! for credential icons, and identifiers for log correlation.
//!
//! ## Timestamps
//!
//! The backend reports times as nanoseconds since the Unix epoch. They are
//! converted with `chrono` and a zero value means "never recorded".
//!
//! ## Example Usage
//!
//! ```rust
//! use decentra_verify_web::utils::format_principal;
//!
//! let short = format_principal("abcdefghij0123456789KLMNOPQRST");
//! assert_eq!(short, "abcdefghij...KLMNOPQRST");
//! ```

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::constants::{PRINCIPAL_DISPLAY_EDGE, PRINCIPAL_DISPLAY_LIMIT};

/// Broad category of a declared MIME type, used for credential icons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentCategory {
    Pdf,
    Image,
    Other,
}

impl ContentCategory {
    pub fn icon(self) -> &'static str {
        match self {
            ContentCategory::Pdf => "📄",
            ContentCategory::Image => "🖼️",
            ContentCategory::Other => "📋",
        }
    }
}

pub fn categorize_content_type(content_type: Option<&str>) -> ContentCategory {
    let content_type = content_type.unwrap_or_default().to_lowercase();

    if content_type.contains("pdf") {
        ContentCategory::Pdf
    } else if content_type.contains("image") {
        ContentCategory::Image
    } else {
        ContentCategory::Other
    }
}

/// Shortens long principals to `first10...last10`.
pub fn format_principal(principal: &str) -> String {
    let chars: Vec<char> = principal.chars().collect();
    if chars.len() <= PRINCIPAL_DISPLAY_LIMIT {
        return principal.to_string();
    }

    let head: String = chars[..PRINCIPAL_DISPLAY_EDGE].iter().collect();
    let tail: String = chars[chars.len() - PRINCIPAL_DISPLAY_EDGE..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Converts a backend nanosecond timestamp; zero means unknown.
pub fn timestamp_from_nanos(nanos: u64) -> Option<DateTime<Utc>> {
    if nanos == 0 {
        return None;
    }
    let secs = (nanos / 1_000_000_000) as i64;
    let subsec = (nanos % 1_000_000_000) as u32;
    DateTime::from_timestamp(secs, subsec)
}

pub fn format_date(nanos: u64) -> String {
    timestamp_from_nanos(nanos)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn format_timestamp(nanos: u64) -> String {
    timestamp_from_nanos(nanos)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// File size in kilobytes with one decimal, as shown on credential cards.
pub fn format_size_kb(size: u64) -> String {
    format!("{:.1} KB", size as f64 / 1024.0)
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn generate_operation_id() -> String {
    let uuid_part = Uuid::new_v4().to_string();
    let timestamp = Utc::now().timestamp_millis();
    format!("{}-{}", timestamp, uuid_part)
}
