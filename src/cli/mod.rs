use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use crate::config::{ColumnMapping, Config, Field};
use crate::core::report::preview_lines;
use crate::core::roster::default_sheets;
use crate::core::{JobSettings, JudgeError, Pipeline, RosterWorkbook};
use crate::extractors::YouTubeDataApi;
use crate::output::write_bundle;

/// Column value that explicitly leaves a field unmapped.
const UNMAPPED: &str = "none";

#[derive(Parser)]
#[command(name = "judging-sheets")]
#[command(about = "Build per-category judging sheets from a contest roster")]
#[command(version)]
pub struct Cli {
    /// Roster workbook (.xlsx)
    #[arg(value_name = "ROSTER")]
    pub roster: PathBuf,

    /// Sheet (category) to process; repeatable. Defaults to every non-bookkeeping sheet
    #[arg(short, long = "sheet", value_name = "NAME")]
    pub sheets: Vec<String>,

    /// List the roster's sheets and exit
    #[arg(long)]
    pub list_sheets: bool,

    /// Column holding the entry number
    #[arg(long, value_name = "COLUMN")]
    pub entry_number: Option<String>,

    /// Column holding the entrant name
    #[arg(long, value_name = "COLUMN")]
    pub entry_name: Option<String>,

    /// Column holding the instrument
    #[arg(long, value_name = "COLUMN")]
    pub instrument: Option<String>,

    /// Column holding the age or grade
    #[arg(long, value_name = "COLUMN")]
    pub age: Option<String>,

    /// Column holding the piece performed
    #[arg(long, value_name = "COLUMN")]
    pub song: Option<String>,

    /// Column holding the YouTube URL
    #[arg(long, value_name = "COLUMN")]
    pub video_url: Option<String>,

    /// Column holding a duration to show when no video is linked
    #[arg(long, value_name = "COLUMN")]
    pub duration: Option<String>,

    /// Column holding the contact email
    #[arg(long, value_name = "COLUMN")]
    pub email: Option<String>,

    /// YouTube Data API key (falls back to the config file, then YOUTUBE_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Base name for generated files
    #[arg(long)]
    pub basename: Option<String>,

    /// Minimum comment length enforced on the judging sheet (0 disables)
    #[arg(long, value_name = "N")]
    pub min_comment_chars: Option<u32>,

    /// Leave the playback check report out of the bundle
    #[arg(long)]
    pub no_report: bool,

    /// Leave the Video link column out of the judging sheets
    #[arg(long)]
    pub no_video_link: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let config = self.config()?;

        let mut workbook = RosterWorkbook::open(&self.roster)?;
        let names = workbook.sheet_names();
        let defaults = default_sheets(&names, &config.ignore_sheet_keywords);

        if self.list_sheets {
            for name in &names {
                let marker = if defaults.contains(name) { "*" } else { " " };
                println!("{} {}", marker, name);
            }
            return Ok(());
        }

        let selected = if self.sheets.is_empty() { defaults } else { self.sheets.clone() };
        if selected.is_empty() {
            return Err(JudgeError::NoSheetsSelected.into());
        }
        let api_key = config.resolve_api_key(self.api_key.as_deref())?;

        let sheets = workbook.read_sheets(&selected)?;
        let mapping = self.mapping(&config, &sheets[0].columns);
        mapping.validate()?;
        for field in Field::ALL {
            info!("{:>12} <- {}", field.name(), mapping.get(field).unwrap_or("(none)"));
        }

        println!("Processing {} sheet(s) from {}", sheets.len(), self.roster.display());

        let api = YouTubeDataApi::new(&config)?;
        let pipeline = Pipeline::new(api, JobSettings::new(&config, api_key, mapping));
        let output = pipeline.run(&sheets, chrono::Local::now().naive_local()).await?;

        let path = write_bundle(&output, &config.output_dir, &config.output_basename)?;

        for sheet in &output.sheets {
            println!("  {} ({} entries)", sheet.file_name, sheet.rows.len());
        }
        for skipped in &output.skipped {
            println!(
                "  skipped '{}': missing columns {}",
                skipped.sheet,
                skipped.missing_columns.join(", ")
            );
        }
        println!("Bundle: {}", path.display());

        if output.diagnostics.is_empty() {
            println!("All videos checked out.");
        } else {
            println!("{} video(s) need review:", output.diagnostics.len());
            for line in preview_lines(&output.diagnostics) {
                println!("  {}", line);
            }
        }

        Ok(())
    }

    /// Config file with command-line overrides applied.
    fn config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(basename) = &self.basename {
            config.output_basename = basename.clone();
        }
        if let Some(min) = self.min_comment_chars {
            config.min_comment_chars = min;
        }
        if self.no_report {
            config.include_report = false;
        }
        if self.no_video_link {
            config.video_link_column = false;
        }
        Ok(config)
    }

    fn flag(&self, field: Field) -> Option<&str> {
        match field {
            Field::EntryNumber => self.entry_number.as_deref(),
            Field::EntryName => self.entry_name.as_deref(),
            Field::Instrument => self.instrument.as_deref(),
            Field::Age => self.age.as_deref(),
            Field::Song => self.song.as_deref(),
            Field::VideoUrl => self.video_url.as_deref(),
            Field::Duration => self.duration.as_deref(),
            Field::Email => self.email.as_deref(),
        }
    }

    /// Flags first, then the config file, then a guess from the headers.
    /// `none` on the command line leaves a field unmapped.
    pub fn mapping(&self, config: &Config, columns: &[String]) -> ColumnMapping {
        let mut explicit = ColumnMapping::default();
        let mut unmapped = Vec::new();
        for field in Field::ALL {
            match self.flag(field) {
                Some(column) if column.eq_ignore_ascii_case(UNMAPPED) => unmapped.push(field),
                Some(column) => explicit.set(field, Some(column.to_string())),
                None => {}
            }
        }

        let mut mapping = explicit
            .or(&config.mapping)
            .or(&ColumnMapping::guess(columns));
        for field in unmapped {
            mapping.set(field, None);
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        ["出場番号", "氏名", "楽器", "曲目", "YouTube URL"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "judging-sheets",
            "roster.xlsx",
            "--sheet",
            "Piano",
            "-s",
            "Violin",
            "--song",
            "Piece",
            "--no-report",
        ])
        .unwrap();

        assert_eq!(cli.roster, PathBuf::from("roster.xlsx"));
        assert_eq!(cli.sheets, vec!["Piano", "Violin"]);
        assert_eq!(cli.song.as_deref(), Some("Piece"));
        assert!(cli.no_report);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_mapping_precedence() {
        let cli = Cli::try_parse_from(["judging-sheets", "roster.xlsx", "--song", "Piece", "--instrument", "NONE"]).unwrap();
        let mut config = Config::default();
        config.mapping.entry_name = Some("Performer".into());

        let mapping = cli.mapping(&config, &columns());

        assert_eq!(mapping.song.as_deref(), Some("Piece"));
        assert_eq!(mapping.entry_name.as_deref(), Some("Performer"));
        assert_eq!(mapping.entry_number.as_deref(), Some("出場番号"));
        assert_eq!(mapping.video_url.as_deref(), Some("YouTube URL"));
        assert_eq!(mapping.instrument, None);
    }

    #[test]
    fn test_config_overrides() {
        let cli = Cli::try_parse_from([
            "judging-sheets",
            "roster.xlsx",
            "-o",
            "out",
            "--basename",
            "spring",
            "--min-comment-chars",
            "0",
            "--no-video-link",
        ])
        .unwrap();

        let config = cli.config().unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.output_basename, "spring");
        assert_eq!(config.min_comment_chars, 0);
        assert!(!config.video_link_column);
        assert!(config.include_report);
    }
}
