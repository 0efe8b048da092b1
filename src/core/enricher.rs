use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::{ColumnMapping, Field};
use crate::core::roster::{CellValue, RosterRow};
use crate::core::{MetadataTable, VideoId, Visibility};
use crate::extractors::extract_video_id;
use crate::utils::format_duration;

pub const NOT_PLAYABLE_TEXT: &str = "【not playable】needs review";
pub const INVALID_TEXT: &str = "【invalid】needs review";
pub const MALFORMED_URL_REASON: &str = "URL format unrecognized";
pub const NOT_FOUND_REASON: &str = "video not found (deleted or invalid id)";
pub const UNKNOWN_EMAIL: &str = "unknown";

/// Classification of a row that carries a video URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Ok(String),
    Blocked(Visibility),
    NotFound,
    MalformedUrl,
}

impl EnrichmentOutcome {
    pub fn reason(&self) -> Option<String> {
        match self {
            EnrichmentOutcome::Ok(_) => None,
            EnrichmentOutcome::Blocked(status) => {
                Some(format!("video visibility is '{}', not playable", status))
            }
            EnrichmentOutcome::NotFound => Some(NOT_FOUND_REASON.to_string()),
            EnrichmentOutcome::MalformedUrl => Some(MALFORMED_URL_REASON.to_string()),
        }
    }
}

/// A row-level problem surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub sheet: String,
    pub entry_number: String,
    pub entry_name: String,
    pub reason: String,
    pub url: String,
    pub email: String,
}

/// Everything the judging sheet shows for one entrant.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub department: String,
    pub instrument: Option<CellValue>,
    pub entry_number: CellValue,
    pub entry_name: CellValue,
    pub age: CellValue,
    pub song: CellValue,
    pub video_url: String,
    /// A URL string was present, regardless of whether it resolved.
    pub playable: bool,
    pub duration_text: String,
    pub score: String,
    pub comment: String,
    pub outcome: Option<EnrichmentOutcome>,
}

impl EnrichedRow {
    pub fn needs_review(&self) -> bool {
        self.duration_text.contains('【') || self.duration_text.contains("needs review")
    }
}

/// Unique ids of a sheet, so duplicate URLs share one lookup.
pub fn collect_video_ids<'a, I>(rows: I, mapping: &ColumnMapping) -> BTreeSet<VideoId>
where
    I: IntoIterator<Item = &'a RosterRow>,
{
    let Some(column) = mapping.get(Field::VideoUrl) else {
        return BTreeSet::new();
    };
    rows.into_iter()
        .filter_map(|row| extract_video_id(row.cell(Some(column))))
        .collect()
}

/// Classifies one roster row against the sheet's metadata table.
pub fn enrich(
    sheet: &str,
    row: &RosterRow,
    mapping: &ColumnMapping,
    table: &MetadataTable,
) -> (EnrichedRow, Option<Diagnostic>) {
    let field = |f: Field| row.cell(mapping.get(f));

    let url_cell = field(Field::VideoUrl);
    let video_url = url_cell.to_string();
    let has_url = !url_cell.is_blank();
    let fallback_duration = field(Field::Duration).to_string();

    let outcome = if has_url {
        Some(match extract_video_id(url_cell) {
            None => EnrichmentOutcome::MalformedUrl,
            Some(id) => match table.get(&id) {
                None => EnrichmentOutcome::NotFound,
                Some(record) if !record.visibility.is_playable() => {
                    EnrichmentOutcome::Blocked(record.visibility.clone())
                }
                Some(record) => EnrichmentOutcome::Ok(format_duration(&record.duration)),
            },
        })
    } else {
        None
    };

    let duration_text = match &outcome {
        Some(EnrichmentOutcome::Ok(text)) => text.clone(),
        Some(EnrichmentOutcome::Blocked(_)) => NOT_PLAYABLE_TEXT.to_string(),
        Some(EnrichmentOutcome::NotFound) => INVALID_TEXT.to_string(),
        Some(EnrichmentOutcome::MalformedUrl) | None => fallback_duration,
    };

    let diagnostic = outcome.as_ref().and_then(EnrichmentOutcome::reason).map(|reason| {
        let email = field(Field::Email);
        Diagnostic {
            sheet: sheet.to_string(),
            entry_number: field(Field::EntryNumber).to_string(),
            entry_name: field(Field::EntryName).to_string(),
            reason,
            url: video_url.clone(),
            email: if email.is_blank() {
                UNKNOWN_EMAIL.to_string()
            } else {
                email.to_string()
            },
        }
    });

    let enriched = EnrichedRow {
        department: sheet.to_string(),
        instrument: mapping.get(Field::Instrument).map(|_| field(Field::Instrument).clone()),
        entry_number: field(Field::EntryNumber).clone(),
        entry_name: field(Field::EntryName).clone(),
        age: field(Field::Age).clone(),
        song: field(Field::Song).clone(),
        video_url,
        playable: has_url,
        duration_text,
        score: String::new(),
        comment: String::new(),
        outcome,
    };

    (enriched, diagnostic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MetadataRecord;

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            entry_number: Some("No".into()),
            entry_name: Some("Name".into()),
            song: Some("Song".into()),
            video_url: Some("URL".into()),
            duration: Some("Time".into()),
            email: Some("Email".into()),
            ..ColumnMapping::default()
        }
    }

    fn row(url: impl Into<CellValue>) -> RosterRow {
        RosterRow::new()
            .with("No", CellValue::Int(7))
            .with("Name", "Aiko")
            .with("Song", "Gavotte")
            .with("URL", url)
            .with("Time", "4:00")
            .with("Email", "aiko@example.com")
    }

    fn table(visibility: &str) -> MetadataTable {
        let mut table = MetadataTable::new();
        table.insert(VideoId::new("dQw4w9WgXcQ"), MetadataRecord::new("PT3M33S", visibility));
        table
    }

    #[test]
    fn test_public_video_is_ok() {
        let (enriched, diagnostic) = enrich("Piano", &row(URL), &mapping(), &table("public"));

        assert_eq!(enriched.outcome, Some(EnrichmentOutcome::Ok("3分33秒".to_string())));
        assert_eq!(enriched.duration_text, "3分33秒");
        assert!(enriched.playable);
        assert!(!enriched.needs_review());
        assert!(diagnostic.is_none());
    }

    #[test]
    fn test_unlisted_video_is_ok() {
        let (enriched, diagnostic) = enrich("Piano", &row(URL), &mapping(), &table("unlisted"));
        assert!(matches!(enriched.outcome, Some(EnrichmentOutcome::Ok(_))));
        assert!(diagnostic.is_none());
    }

    #[test]
    fn test_private_video_is_blocked() {
        let (enriched, diagnostic) = enrich("Piano", &row(URL), &mapping(), &table("private"));

        assert_eq!(enriched.outcome, Some(EnrichmentOutcome::Blocked(Visibility::Private)));
        assert_eq!(enriched.duration_text, NOT_PLAYABLE_TEXT);
        assert!(enriched.needs_review());

        let diagnostic = diagnostic.unwrap();
        assert!(diagnostic.reason.contains("private"));
        assert_eq!(diagnostic.sheet, "Piano");
        assert_eq!(diagnostic.entry_number, "7");
        assert_eq!(diagnostic.entry_name, "Aiko");
        assert_eq!(diagnostic.url, URL);
        assert_eq!(diagnostic.email, "aiko@example.com");
    }

    #[test]
    fn test_missing_metadata_is_not_found() {
        let (enriched, diagnostic) = enrich("Piano", &row(URL), &mapping(), &MetadataTable::new());

        assert_eq!(enriched.outcome, Some(EnrichmentOutcome::NotFound));
        assert_eq!(enriched.duration_text, INVALID_TEXT);
        assert_eq!(diagnostic.unwrap().reason, NOT_FOUND_REASON);
    }

    #[test]
    fn test_unrecognized_url_is_malformed_but_still_linked() {
        let (enriched, diagnostic) = enrich("Piano", &row("not a url"), &mapping(), &table("public"));

        assert_eq!(enriched.outcome, Some(EnrichmentOutcome::MalformedUrl));
        assert_eq!(enriched.duration_text, "4:00");
        assert!(enriched.playable);
        assert_eq!(diagnostic.unwrap().reason, MALFORMED_URL_REASON);
    }

    #[test]
    fn test_numeric_url_cell_is_malformed() {
        let (enriched, diagnostic) = enrich("Piano", &row(CellValue::Int(42)), &mapping(), &table("public"));
        assert_eq!(enriched.outcome, Some(EnrichmentOutcome::MalformedUrl));
        assert!(diagnostic.is_some());
    }

    #[test]
    fn test_empty_url_passes_through() {
        for url in [CellValue::from(""), CellValue::from("nan"), CellValue::Empty] {
            let (enriched, diagnostic) = enrich("Piano", &row(url), &mapping(), &table("public"));

            assert_eq!(enriched.outcome, None);
            assert_eq!(enriched.duration_text, "4:00");
            assert!(!enriched.playable);
            assert!(diagnostic.is_none());
        }
    }

    #[test]
    fn test_unmapped_url_and_duration() {
        let mut mapping = mapping();
        mapping.video_url = None;
        mapping.duration = None;

        let (enriched, diagnostic) = enrich("Piano", &row(URL), &mapping, &table("private"));

        assert_eq!(enriched.outcome, None);
        assert_eq!(enriched.duration_text, "");
        assert_eq!(enriched.video_url, "");
        assert!(diagnostic.is_none());
    }

    #[test]
    fn test_unknown_email() {
        let mut no_email = mapping();
        no_email.email = None;
        let (_, diagnostic) = enrich("Piano", &row("bad"), &no_email, &table("public"));
        assert_eq!(diagnostic.unwrap().email, UNKNOWN_EMAIL);

        let blank_email = row("bad").with("Email", CellValue::Empty);
        let (_, diagnostic) = enrich("Piano", &blank_email, &mapping(), &table("public"));
        assert_eq!(diagnostic.unwrap().email, UNKNOWN_EMAIL);
    }

    #[test]
    fn test_instrument_only_when_mapped() {
        let (enriched, _) = enrich("Piano", &row(URL), &mapping(), &table("public"));
        assert_eq!(enriched.instrument, None);

        let mut with_instrument = mapping();
        with_instrument.instrument = Some("Inst".into());
        let (enriched, _) = enrich("Piano", &row(URL).with("Inst", "Violin"), &with_instrument, &table("public"));
        assert_eq!(enriched.instrument, Some(CellValue::from("Violin")));
    }

    #[test]
    fn test_enrich_is_deterministic() {
        let table = table("private");
        let first = enrich("Piano", &row(URL), &mapping(), &table);
        let second = enrich("Piano", &row(URL), &mapping(), &table);
        assert_eq!(first, second);
    }

    #[test]
    fn test_collect_video_ids_dedupes() {
        let rows = vec![
            row(URL),
            row("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            row("https://youtu.be/aaaaaaaaaaa"),
            row("not a url"),
        ];

        let ids = collect_video_ids(&rows, &mapping());

        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&VideoId::new("dQw4w9WgXcQ")));

        let mut unmapped = mapping();
        unmapped.video_url = None;
        assert!(collect_video_ids(&rows, &unmapped).is_empty());
    }
}
