use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::config::{ColumnMapping, Config, Field};
use crate::core::enricher::{collect_video_ids, enrich};
use crate::core::roster::RosterSheet;
use crate::core::{report, Diagnostic, EnrichedRow, JudgeError, MetadataClient, VideosApi};
use crate::output::{render_workbook, SheetLayout};
use crate::utils::sheet_output_filename;

/// Per-run settings; everything the pipeline needs is passed in here.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub api_key: String,
    pub mapping: ColumnMapping,
    pub output_basename: String,
    pub min_comment_chars: u32,
    pub comment_header: String,
    pub include_report: bool,
    pub video_link_column: bool,
}

impl JobSettings {
    pub fn new(config: &Config, api_key: String, mapping: ColumnMapping) -> Self {
        Self {
            api_key,
            mapping,
            output_basename: config.output_basename.clone(),
            min_comment_chars: config.min_comment_chars,
            comment_header: config.comment_header(),
            include_report: config.include_report,
            video_link_column: config.video_link_column,
        }
    }

    fn layout(&self) -> SheetLayout {
        SheetLayout {
            instrument: self.mapping.get(Field::Instrument).is_some(),
            video_link: self.video_link_column,
            comment_header: self.comment_header.clone(),
            min_comment_chars: self.min_comment_chars,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetOutput {
    pub sheet: String,
    pub file_name: String,
    pub rows: Vec<EnrichedRow>,
    pub workbook: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSheet {
    pub sheet: String,
    pub missing_columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub sheets: Vec<SheetOutput>,
    pub skipped: Vec<SkippedSheet>,
    pub diagnostics: Vec<Diagnostic>,
    pub report: Option<String>,
}

pub struct Pipeline<A: VideosApi> {
    client: MetadataClient<A>,
    settings: JobSettings,
}

impl<A: VideosApi> Pipeline<A> {
    pub fn new(api: A, settings: JobSettings) -> Self {
        Self {
            client: MetadataClient::new(api),
            settings,
        }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    pub fn api(&self) -> &A {
        self.client.api()
    }

    /// Processes the sheets in order. Configuration errors abort before any
    /// sheet is touched; a sheet lacking a mapped column is skipped; any
    /// other failure aborts the whole run.
    pub async fn run(&self, sheets: &[RosterSheet], generated_at: NaiveDateTime) -> Result<RunOutput, JudgeError> {
        self.settings.mapping.validate()?;
        if self.settings.api_key.trim().is_empty() {
            return Err(JudgeError::MissingApiKey);
        }
        if sheets.is_empty() {
            return Err(JudgeError::NoSheetsSelected);
        }

        let mut output = RunOutput {
            sheets: Vec::new(),
            skipped: Vec::new(),
            diagnostics: Vec::new(),
            report: None,
        };

        for (index, sheet) in sheets.iter().enumerate() {
            let missing_columns = self.settings.mapping.missing_columns(&sheet.columns);
            if !missing_columns.is_empty() {
                warn!(
                    "Skipping sheet '{}': columns not found: {}",
                    sheet.name,
                    missing_columns.join(", ")
                );
                output.skipped.push(SkippedSheet {
                    sheet: sheet.name.clone(),
                    missing_columns,
                });
                continue;
            }

            info!("[{}/{}] Processing sheet '{}' ({} rows)", index + 1, sheets.len(), sheet.name, sheet.rows.len());
            let (sheet_output, diagnostics) = self.process_sheet(sheet).await?;
            output.sheets.push(sheet_output);
            output.diagnostics.extend(diagnostics);
        }

        if self.settings.include_report {
            output.report = Some(report::assemble(&output.diagnostics, generated_at));
        }

        Ok(output)
    }

    async fn process_sheet(&self, sheet: &RosterSheet) -> Result<(SheetOutput, Vec<Diagnostic>), JudgeError> {
        let mapping = &self.settings.mapping;

        // One batched lookup per sheet, before any row is classified
        let ids = collect_video_ids(&sheet.rows, mapping);
        let table = self.client.fetch(&self.settings.api_key, &ids).await;
        info!("Sheet '{}': {} unique videos, {} resolved", sheet.name, ids.len(), table.len());

        let mut rows = Vec::with_capacity(sheet.rows.len());
        let mut diagnostics = Vec::new();
        for row in &sheet.rows {
            let (enriched, diagnostic) = enrich(&sheet.name, row, mapping, &table);
            rows.push(enriched);
            diagnostics.extend(diagnostic);
        }

        let workbook = render_workbook(&rows, &self.settings.layout()).map_err(|e| JudgeError::Sheet {
            sheet: sheet.name.clone(),
            source: e.into(),
        })?;

        Ok((
            SheetOutput {
                sheet: sheet.name.clone(),
                file_name: sheet_output_filename(&self.settings.output_basename, &sheet.name),
                rows,
                workbook,
            },
            diagnostics,
        ))
    }
}
