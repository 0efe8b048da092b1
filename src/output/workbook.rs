use rust_xlsxwriter::utility::column_number_to_name;
use rust_xlsxwriter::{
    Color, ColNum, DataValidation, Format, FormatAlign, FormatBorder, FormatUnderline, Formula,
    RowNum, Url, Workbook, Worksheet, XlsxError,
};
use tracing::debug;

use crate::core::roster::CellValue;
use crate::core::EnrichedRow;
use crate::utils::fit_column_width;

pub const WORKSHEET_NAME: &str = "Judging";
pub const PLAY_TEXT: &str = "Play";

const HEADER_FILL: u32 = 0x4F81BD;
const LINK_COLOR: u32 = 0x0563C1;
const ALERT_COLOR: u32 = 0xFF0000;
const EMPTY_SHEET_WIDTH: f64 = 20.0;

/// Which optional columns a judging sheet carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub instrument: bool,
    pub video_link: bool,
    pub comment_header: String,
    pub min_comment_chars: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Department,
    Instrument,
    EntryNumber,
    EntryName,
    Age,
    Song,
    Video,
    VideoUrl,
    Duration,
    Score,
    Comment,
}

impl Column {
    pub fn header(self, layout: &SheetLayout) -> String {
        match self {
            Column::Department => "Department".to_string(),
            Column::Instrument => "Instrument".to_string(),
            Column::EntryNumber => "Entry No.".to_string(),
            Column::EntryName => "Entrant".to_string(),
            Column::Age => "Age".to_string(),
            Column::Song => "Song".to_string(),
            Column::Video => "Video".to_string(),
            Column::VideoUrl => "Video URL".to_string(),
            Column::Duration => "Duration".to_string(),
            Column::Score => "Score".to_string(),
            Column::Comment => layout.comment_header.clone(),
        }
    }

    fn value(self, row: &EnrichedRow) -> CellValue {
        let text = |s: &str| {
            if s.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.to_string())
            }
        };
        match self {
            Column::Department => text(&row.department),
            Column::Instrument => row.instrument.clone().unwrap_or(CellValue::Empty),
            Column::EntryNumber => row.entry_number.clone(),
            Column::EntryName => row.entry_name.clone(),
            Column::Age => row.age.clone(),
            Column::Song => row.song.clone(),
            Column::Video if row.playable => text(PLAY_TEXT),
            Column::Video => CellValue::Empty,
            Column::VideoUrl => text(&row.video_url),
            Column::Duration => text(&row.duration_text),
            Column::Score => text(&row.score),
            Column::Comment => text(&row.comment),
        }
    }

    fn centered(self) -> bool {
        matches!(self, Column::Age | Column::Video | Column::Score)
    }

    fn fixed_width(self) -> Option<f64> {
        match self {
            Column::EntryNumber => Some(12.0),
            Column::Age | Column::Video => Some(8.0),
            Column::Score => Some(10.0),
            Column::Comment => Some(50.0),
            _ => None,
        }
    }
}

impl SheetLayout {
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = vec![Column::Department];
        if self.instrument {
            columns.push(Column::Instrument);
        }
        columns.extend([Column::EntryNumber, Column::EntryName, Column::Age, Column::Song]);
        if self.video_link {
            columns.extend([Column::Video, Column::VideoUrl]);
        }
        columns.extend([Column::Duration, Column::Score, Column::Comment]);
        columns
    }
}

struct Formats {
    header: Format,
    left: Format,
    center: Format,
    link: Format,
    alert: Format,
}

impl Formats {
    fn new() -> Self {
        let bordered = Format::new()
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::Black)
            .set_align(FormatAlign::VerticalCenter);
        let left = bordered.clone().set_align(FormatAlign::Left).set_text_wrap();
        let center = bordered.clone().set_align(FormatAlign::Center).set_text_wrap();

        Self {
            header: bordered
                .set_align(FormatAlign::Left)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_FILL)),
            link: center
                .clone()
                .set_font_color(Color::RGB(LINK_COLOR))
                .set_underline(FormatUnderline::Single),
            alert: left.clone().set_font_color(Color::RGB(ALERT_COLOR)).set_bold(),
            left,
            center,
        }
    }
}

/// Renders one judging workbook and returns the `.xlsx` bytes.
pub fn render_workbook(rows: &[EnrichedRow], layout: &SheetLayout) -> Result<Vec<u8>, XlsxError> {
    let columns = layout.columns();
    let formats = Formats::new();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(WORKSHEET_NAME)?;

    for (col, column) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as ColNum, column.header(layout), &formats.header)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_num = index as RowNum + 1;
        let values: Vec<CellValue> = columns.iter().map(|c| c.value(row)).collect();

        let lines = values
            .iter()
            .map(|v| v.to_string().matches('\n').count() + 1)
            .max()
            .unwrap_or(1);
        worksheet.set_row_height(row_num, (lines as f64 * 15.0).max(30.0))?;

        for (col, (column, value)) in columns.iter().zip(&values).enumerate() {
            let col = col as ColNum;
            let format = if *column == Column::Duration && row.needs_review() {
                &formats.alert
            } else if column.centered() {
                &formats.center
            } else {
                &formats.left
            };

            if *column == Column::Video && row.playable {
                write_play_link(worksheet, row_num, col, &row.video_url, &formats)?;
            } else {
                write_cell(worksheet, row_num, col, value, format)?;
            }
        }
    }

    for (col, column) in columns.iter().enumerate() {
        let col = col as ColNum;
        if *column == Column::VideoUrl {
            worksheet.set_column_hidden(col)?;
            continue;
        }
        let width = match column.fixed_width() {
            Some(width) => width,
            None => {
                let values: Vec<String> = rows.iter().map(|r| column.value(r).to_string()).collect();
                fit_column_width(values.iter().map(String::as_str))
                    .map(|w| w as f64)
                    .unwrap_or(EMPTY_SHEET_WIDTH)
            }
        };
        worksheet.set_column_width(col, width)?;
    }

    if layout.min_comment_chars > 0 && !rows.is_empty() {
        if let Some(col) = columns.iter().position(|c| *c == Column::Comment) {
            let col = col as ColNum;
            let formula = format!("=LEN({}2)>={}", column_number_to_name(col), layout.min_comment_chars);
            let validation = DataValidation::new()
                .allow_custom(Formula::new(formula))
                .set_error_title("Comment too short")?
                .set_error_message(format!(
                    "Please enter at least {} characters of comment.",
                    layout.min_comment_chars
                ))?;
            worksheet.add_data_validation(1, col, rows.len() as RowNum, col, &validation)?;
        }
    }

    workbook.save_to_buffer()
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &CellValue,
    format: &Format,
) -> Result<(), XlsxError> {
    match value {
        CellValue::Empty => worksheet.write_blank(row, col, format)?,
        CellValue::Text(s) => worksheet.write_string_with_format(row, col, s, format)?,
        CellValue::Int(i) => worksheet.write_number_with_format(row, col, *i as f64, format)?,
        CellValue::Float(f) if f.is_nan() => worksheet.write_blank(row, col, format)?,
        CellValue::Float(f) => worksheet.write_number_with_format(row, col, *f, format)?,
        CellValue::Bool(b) => worksheet.write_boolean_with_format(row, col, *b, format)?,
    };
    Ok(())
}

/// Links "Play" to the raw URL; values Excel will not take as a link stay
/// plain text.
fn write_play_link(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    url: &str,
    formats: &Formats,
) -> Result<(), XlsxError> {
    let link = Url::new(url).set_text(PLAY_TEXT);
    if let Err(e) = worksheet.write_url_with_format(row, col, link, &formats.link) {
        debug!("Not linking '{}': {}", url, e);
        worksheet.write_string_with_format(row, col, PLAY_TEXT, &formats.center)?;
    }
    Ok(())
}
