use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Subscription tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Creator,
    Business,
}

impl Tier {
    pub fn as_str(&self) -> &str {
        match self {
            Tier::Free => "free",
            Tier::Creator => "creator",
            Tier::Business => "business",
        }
    }

    pub fn parse(s: &str) -> Option<Tier> {
        match s {
            "free" => Some(Tier::Free),
            "creator" => Some(Tier::Creator),
            "business" => Some(Tier::Business),
            _ => None,
        }
    }
}

/// Trim size of the finished book
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BookSize {
    FiveByEight,
    #[default]
    SixByNine,
    SevenByTen,
    Letter,
}

impl BookSize {
    /// Wire value expected by the upload endpoint
    pub fn as_str(&self) -> &str {
        match self {
            BookSize::FiveByEight => "5x8",
            BookSize::SixByNine => "6x9",
            BookSize::SevenByTen => "7x10",
            BookSize::Letter => "8.5x11",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BookSize::FiveByEight => "5\" x 8\" (Trade Paperback)",
            BookSize::SixByNine => "6\" x 9\" (Standard Book)",
            BookSize::SevenByTen => "7\" x 10\" (Textbook/Workbook)",
            BookSize::Letter => "8.5\" x 11\" (Letter Size)",
        }
    }

    pub fn next(&self) -> BookSize {
        match self {
            BookSize::FiveByEight => BookSize::SixByNine,
            BookSize::SixByNine => BookSize::SevenByTen,
            BookSize::SevenByTen => BookSize::Letter,
            BookSize::Letter => BookSize::FiveByEight,
        }
    }
}

/// Body font of the formatted manuscript
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Font {
    #[default]
    TimesNewRoman,
    Arial,
    Georgia,
    Garamond,
}

impl Font {
    pub fn as_str(&self) -> &str {
        match self {
            Font::TimesNewRoman => "Times New Roman",
            Font::Arial => "Arial",
            Font::Georgia => "Georgia",
            Font::Garamond => "Garamond",
        }
    }

    pub fn next(&self) -> Font {
        match self {
            Font::TimesNewRoman => Font::Arial,
            Font::Arial => Font::Georgia,
            Font::Georgia => Font::Garamond,
            Font::Garamond => Font::TimesNewRoman,
        }
    }
}

/// Processing status of an uploaded manuscript
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl FileStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Processing => "processing",
            FileStatus::Completed => "completed",
            FileStatus::Failed => "failed",
        }
    }

    /// Only completed files have a downloadable artifact
    pub fn is_downloadable(&self) -> bool {
        matches!(self, FileStatus::Completed)
    }
}

/// A subscription tier as advertised by the server catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionTier {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub monthly_limit: u32,
    pub allowed_genres: Vec<String>,
}

impl SubscriptionTier {
    /// Free tiers skip the payment step entirely
    pub fn requires_payment(&self) -> bool {
        self.price > 0.0
    }
}

/// A genre with its server-computed entitlement flag.
///
/// `allowed` is tier-gated server truth; the client renders it but never
/// recomputes or overrides it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenreOption {
    pub id: String,
    pub name: String,
    pub description: String,
    pub allowed: bool,
}

/// Current monthly usage against the tier limit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub current_usage: u32,
    pub limit: u32,
    pub tier: Tier,
}

impl UsageSnapshot {
    /// Fraction of the monthly quota consumed, clamped to 1.0
    pub fn ratio(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        (f64::from(self.current_usage) / f64::from(self.limit)).min(1.0)
    }
}

/// One row of the processing history, as reported by the server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub file_id: String,
    pub original_filename: String,
    pub genre: String,
    pub book_size: String,
    pub created_at: DateTime<Utc>,
    pub status: FileStatus,
}

/// A validated upload submission, constructed fresh per attempt
#[derive(Clone, Debug, PartialEq)]
pub struct UploadRequest {
    pub file_path: PathBuf,
    pub book_size: BookSize,
    pub font: Font,
    pub genre: String,
}

impl UploadRequest {
    /// Lowercased extension of the selected file, if any
    pub fn extension(&self) -> Option<String> {
        self.file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("manuscript")
            .to_string()
    }
}
