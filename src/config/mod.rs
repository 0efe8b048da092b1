use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::JudgeError;

pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_endpoint: String,
    pub output_dir: PathBuf,
    pub output_basename: String,
    pub min_comment_chars: u32,
    pub include_report: bool,
    pub video_link_column: bool,
    pub ignore_sheet_keywords: Vec<String>,
    pub user_agent: String,
    pub timeout: u64,
    pub mapping: ColumnMapping,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_endpoint: "https://www.googleapis.com/youtube/v3/videos".to_string(),
            output_dir: PathBuf::from("."),
            output_basename: "judging_sheet".to_string(),
            min_comment_chars: 100,
            include_report: true,
            video_link_column: true,
            ignore_sheet_keywords: ["原本", "総合名簿", "削除ログ", "ログ"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            user_agent: format!("judging-sheets/{}", env!("CARGO_PKG_VERSION")),
            timeout: 30,
            mapping: ColumnMapping::default(),
        }
    }
}

impl Config {
    /// Reads a TOML config file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_toml(&text).with_context(|| format!("invalid config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Flag first, then the config file, then `YOUTUBE_API_KEY`.
    pub fn resolve_api_key(&self, flag: Option<&str>) -> Result<String, JudgeError> {
        flag.map(str::to_string)
            .or_else(|| self.api_key.clone())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(JudgeError::MissingApiKey)
    }

    /// Header of the comment column, reflecting the minimum length.
    pub fn comment_header(&self) -> String {
        if self.min_comment_chars > 0 {
            format!("Judge's comment ({}+ characters)", self.min_comment_chars)
        } else {
            "Judge's comment (about 100-200 characters)".to_string()
        }
    }
}

/// Logical roster fields the judging sheet is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    EntryNumber,
    EntryName,
    Instrument,
    Age,
    Song,
    VideoUrl,
    Duration,
    Email,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::EntryNumber,
        Field::EntryName,
        Field::Instrument,
        Field::Age,
        Field::Song,
        Field::VideoUrl,
        Field::Duration,
        Field::Email,
    ];

    pub const REQUIRED: [Field; 4] = [Field::EntryNumber, Field::EntryName, Field::Song, Field::VideoUrl];

    pub fn name(self) -> &'static str {
        match self {
            Field::EntryNumber => "entry_number",
            Field::EntryName => "entry_name",
            Field::Instrument => "instrument",
            Field::Age => "age",
            Field::Song => "song",
            Field::VideoUrl => "video_url",
            Field::Duration => "duration",
            Field::Email => "email",
        }
    }

    /// Header fragments that suggest a column holds this field.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Field::EntryNumber => &["番号", "No", "ID"],
            Field::EntryName => &["氏名", "名前", "団体名", "Name"],
            Field::Instrument => &["楽器", "Instrument"],
            Field::Age => &["年齢", "学年", "Age"],
            Field::Song => &["曲目", "曲名", "Song"],
            Field::VideoUrl => &["YouTube", "URL", "動画"],
            Field::Duration => &["時間", "タイム", "Duration"],
            Field::Email => &["メール", "mail", "Email"],
        }
    }
}

/// Which source column feeds each logical field; `None` means unmapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub entry_number: Option<String>,
    pub entry_name: Option<String>,
    pub instrument: Option<String>,
    pub age: Option<String>,
    pub song: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<String>,
    pub email: Option<String>,
}

impl ColumnMapping {
    pub fn get(&self, field: Field) -> Option<&str> {
        let column = match field {
            Field::EntryNumber => &self.entry_number,
            Field::EntryName => &self.entry_name,
            Field::Instrument => &self.instrument,
            Field::Age => &self.age,
            Field::Song => &self.song,
            Field::VideoUrl => &self.video_url,
            Field::Duration => &self.duration,
            Field::Email => &self.email,
        };
        column.as_deref()
    }

    pub fn set(&mut self, field: Field, column: Option<String>) {
        let slot = match field {
            Field::EntryNumber => &mut self.entry_number,
            Field::EntryName => &mut self.entry_name,
            Field::Instrument => &mut self.instrument,
            Field::Age => &mut self.age,
            Field::Song => &mut self.song,
            Field::VideoUrl => &mut self.video_url,
            Field::Duration => &mut self.duration,
            Field::Email => &mut self.email,
        };
        *slot = column;
    }

    /// Fails with every required field that has no column.
    pub fn validate(&self) -> Result<(), JudgeError> {
        let missing: Vec<&'static str> = Field::REQUIRED
            .iter()
            .filter(|field| self.get(**field).is_none())
            .map(|field| field.name())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(JudgeError::MissingMapping(missing))
        }
    }

    /// Mapped columns that the sheet does not have.
    pub fn missing_columns(&self, columns: &[String]) -> Vec<String> {
        Field::ALL
            .iter()
            .filter_map(|field| self.get(*field))
            .filter(|column| !columns.iter().any(|c| c == *column))
            .map(str::to_string)
            .collect()
    }

    /// Suggests a column per field by header keyword.
    pub fn guess(columns: &[String]) -> Self {
        let mut mapping = Self::default();
        for field in Field::ALL {
            let guess = columns
                .iter()
                .find(|column| field.keywords().iter().any(|kw| column.contains(kw)))
                .cloned();
            mapping.set(field, guess);
        }
        mapping
    }

    /// Fills unmapped fields from `fallback`.
    pub fn or(mut self, fallback: &ColumnMapping) -> Self {
        for field in Field::ALL {
            if self.get(field).is_none() {
                self.set(field, fallback.get(field).map(str::to_string));
            }
        }
        self
    }
}
