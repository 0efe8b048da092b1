use lazy_static::lazy_static;
use regex::Regex;
use unicode_width::UnicodeWidthChar;

pub const MIN_COLUMN_WIDTH: usize = 10;
pub const MAX_COLUMN_WIDTH: usize = 80;

pub fn sanitize_filename(filename: &str) -> String {
    // Remove or replace characters that are invalid in filenames
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Name of the judging workbook written for one roster sheet.
pub fn sheet_output_filename(basename: &str, sheet: &str) -> String {
    format!("{}_{}.xlsx", sanitize_filename(basename), sanitize_filename(sheet))
}

/// Spreadsheet display width: wide, full-width and ambiguous East-Asian
/// characters take two cells, everything else one.
pub fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c.width_cjk() {
            Some(2) => 2,
            _ => 1,
        })
        .sum()
}

/// Width for a free-text column: widest value plus padding, clamped.
pub fn fit_column_width<'a, I>(values: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .map(display_width)
        .max()
        .map(|widest| (widest + 3).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH))
}

lazy_static! {
    static ref ISO_DURATION: Regex = Regex::new(
        r"^P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$"
    )
    .unwrap();
}

/// Total whole seconds in an ISO-8601 duration such as `PT4M13S` or `P1DT2H`.
pub fn parse_iso_duration(iso: &str) -> Option<u64> {
    let iso = iso.trim();
    let captures = ISO_DURATION.captures(iso)?;

    // "P", "PT" and "P1DT" carry no usable component
    if captures.iter().skip(1).all(|c| c.is_none()) || iso.ends_with('T') {
        return None;
    }

    let whole = |idx: usize| -> Option<u64> {
        match captures.get(idx) {
            Some(m) => m.as_str().parse::<u64>().ok(),
            None => Some(0),
        }
    };
    let seconds = match captures.get(5) {
        Some(m) => {
            let secs = m.as_str().parse::<f64>().ok()?.trunc();
            if secs >= u64::MAX as f64 {
                return None;
            }
            secs as u64
        }
        None => 0,
    };

    // oversized components are unusable rather than fatal
    [(1, 7 * 86_400), (2, 86_400), (3, 3_600), (4, 60)]
        .iter()
        .try_fold(seconds, |total, &(idx, unit)| {
            whole(idx)?.checked_mul(unit)?.checked_add(total)
        })
}

/// Renders a duration as `{minutes}分{seconds}秒`. Hours fold into minutes.
/// Unparsable input yields an empty string.
pub fn format_duration(iso: &str) -> String {
    match parse_iso_duration(iso) {
        Some(total) => format!("{}分{}秒", total / 60, total % 60),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("hello/world"), "hello-world");
        assert_eq!(sanitize_filename("test<>file"), "test__file");
        assert_eq!(sanitize_filename("ピアノ部門"), "ピアノ部門");
    }

    #[test]
    fn test_sheet_output_filename() {
        assert_eq!(
            sheet_output_filename("judging_sheet", "Piano/Junior"),
            "judging_sheet_Piano-Junior.xlsx"
        );
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("ピアノ"), 6);
        assert_eq!(display_width("Aあ"), 3);
        // ambiguous width counts as wide
        assert_eq!(display_width("○"), 2);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn test_fit_column_width() {
        assert_eq!(fit_column_width(["a", "bb"]), Some(10));
        assert_eq!(fit_column_width(["x".repeat(20).as_str()]), Some(23));
        assert_eq!(fit_column_width(["y".repeat(200).as_str()]), Some(80));
        assert_eq!(fit_column_width(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration("PT0S"), "0分0秒");
        assert_eq!(format_duration("PT4M13S"), "4分13秒");
        assert_eq!(format_duration("PT3M33S"), "3分33秒");
        assert_eq!(format_duration("PT1H2M3S"), "62分3秒");
        assert_eq!(format_duration("PT45S"), "0分45秒");
        assert_eq!(format_duration("P0D"), "0分0秒");
        assert_eq!(format_duration("P1DT1S"), "1440分1秒");
        assert_eq!(format_duration("PT10.9S"), "0分10秒");
    }

    #[test]
    fn test_format_duration_rejects_oversized() {
        assert_eq!(parse_iso_duration("P99999999999999999W"), None);
        assert_eq!(format_duration("P99999999999999999W"), "");
        assert_eq!(format_duration("PT18446744073709551615H"), "");
        assert_eq!(format_duration("P99999999999999999999D"), "");
        assert_eq!(format_duration("PT99999999999999999999S"), "");
    }

    #[test]
    fn test_format_duration_rejects_garbage() {
        assert_eq!(format_duration(""), "");
        assert_eq!(format_duration("P"), "");
        assert_eq!(format_duration("PT"), "");
        assert_eq!(format_duration("4:13"), "");
        assert_eq!(format_duration("PT4X"), "");
    }
}
