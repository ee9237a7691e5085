//! Score-table formatting and delivery.
//!
//! Builds the per-scan score table (Date, Time, one column per region, wait
//! statistics), renders it for the console, and delivers it to the clipboard
//! as TSV or appends it to a CSV file. Score and wait cells use the
//! decimal-comma convention of the spreadsheet the table is pasted into.

use anyhow::Result;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, warn};

use crate::regions::RegionTable;
use crate::scoring::RegionScore;
use crate::scoring::engine::ScanScores;

/// A rendered score table: header row plus one row of string cells per scan.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Formats a score with a decimal comma; integral scores drop the fraction.
pub fn fmt_score(score: RegionScore) -> String {
    score.to_string().replace('.', ",")
}

/// Formats a wait-hours value with one decimal and a decimal comma;
/// integral values drop the fraction (the 999 sentinel prints as `999`).
pub fn fmt_hours(h: f64) -> String {
    if h.fract() == 0.0 {
        format!("{}", h as i64)
    } else {
        format!("{h:.1}").replace('.', ",")
    }
}

/// Builds the score table for a list of scored scans, region columns in
/// table order.
pub fn score_table(scans: &[ScanScores], table: &RegionTable) -> ScoreTable {
    let mut header = vec!["Date".to_string(), "Time".to_string()];
    header.extend(table.regions().iter().map(|r| r.key.to_string()));
    header.push("min_wait_h".to_string());
    header.push("med_wait_h".to_string());

    let rows = scans
        .iter()
        .map(|scan| {
            let mut row = vec![
                scan.timestamp.format("%Y-%m-%d").to_string(),
                scan.timestamp.format("%H:%M").to_string(),
            ];
            row.extend(scan.scores.iter().map(|s| fmt_score(s.score)));
            row.push(fmt_hours(scan.min_wait_h));
            row.push(fmt_hours(scan.med_wait_h));
            row
        })
        .collect();

    ScoreTable { header, rows }
}

/// Renders the table with aligned fixed-width columns for the console.
pub fn render_console(table: &ScoreTable) -> String {
    let mut widths: Vec<usize> = table.header.iter().map(|h| h.len()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let fmt_row = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i < 2 {
                    format!("{:<width$}", cell, width = widths[i])
                } else {
                    format!("{:>width$}", cell, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = fmt_row(&table.header);
    for row in &table.rows {
        out.push('\n');
        out.push_str(&fmt_row(row));
    }
    out
}

/// Renders the table as tab-separated values for the clipboard.
///
/// With more than one row the header is included; with exactly one row only
/// the score and wait cells are emitted, for pasting into an existing
/// spreadsheet row.
pub fn to_clipboard_tsv(table: &ScoreTable) -> String {
    if table.rows.len() == 1 {
        return table.rows[0][2..].join("\t");
    }
    let mut lines = vec![table.header.join("\t")];
    lines.extend(table.rows.iter().map(|row| row.join("\t")));
    lines.join("\n")
}

/// Copies text to the system clipboard. Clipboard problems degrade to a
/// warning; the console output already carries the same table.
pub fn copy_to_clipboard(text: &str) -> bool {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => match clipboard.set_text(text.to_string()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "clipboard copy failed");
                false
            }
        },
        Err(e) => {
            warn!(error = %e, "clipboard unavailable");
            false
        }
    }
}

/// Appends the table's rows to a CSV file, writing the header only when the
/// file is newly created.
pub fn append_scores_csv(path: &Path, table: &ScoreTable) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "appending score rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if !file_exists {
        writer.write_record(&table.header)?;
    }
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_ts;
    use crate::regions::region_table;
    use crate::scoring::engine::PcScore;
    use std::fs;

    fn scan(ts: &str, score: f64) -> ScanScores {
        ScanScores {
            timestamp: parse_ts(ts).unwrap(),
            scores: region_table()
                .regions()
                .iter()
                .map(|r| PcScore {
                    pc4: r.key,
                    score: if r.key == 3511 {
                        RegionScore::Value(score)
                    } else {
                        RegionScore::Unknown
                    },
                })
                .collect(),
            min_wait_h: 2.5,
            med_wait_h: 999.0,
        }
    }

    #[test]
    fn test_fmt_score_decimal_comma() {
        assert_eq!(fmt_score(RegionScore::Value(6.3)), "6,3");
        assert_eq!(fmt_score(RegionScore::Value(4.0)), "4");
        assert_eq!(fmt_score(RegionScore::Unknown), "?");
    }

    #[test]
    fn test_fmt_hours() {
        assert_eq!(fmt_hours(2.5), "2,5");
        assert_eq!(fmt_hours(999.0), "999");
        assert_eq!(fmt_hours(26.0), "26");
    }

    #[test]
    fn test_score_table_layout() {
        let table = score_table(&[scan("2022-02-12 10:05:00", 6.3)], region_table());
        assert_eq!(table.header[0], "Date");
        assert_eq!(table.header[1], "Time");
        assert_eq!(table.header[2], "3511");
        assert_eq!(table.header[table.header.len() - 2], "min_wait_h");
        assert_eq!(table.header[table.header.len() - 1], "med_wait_h");
        let row = &table.rows[0];
        assert_eq!(row[0], "2022-02-12");
        assert_eq!(row[1], "10:05");
        assert_eq!(row[2], "6,3");
        assert_eq!(row[row.len() - 2], "2,5");
        assert_eq!(row[row.len() - 1], "999");
    }

    #[test]
    fn test_clipboard_tsv_single_row_drops_header_and_date() {
        let table = score_table(&[scan("2022-02-12 10:05:00", 4.0)], region_table());
        let tsv = to_clipboard_tsv(&table);
        assert!(!tsv.contains("Date"));
        assert!(!tsv.contains("2022-02-12"));
        assert!(tsv.starts_with("4\t"));
    }

    #[test]
    fn test_clipboard_tsv_multi_row_keeps_header() {
        let table = score_table(
            &[
                scan("2022-02-12 10:05:00", 4.0),
                scan("2022-02-12 14:05:00", 5.0),
            ],
            region_table(),
        );
        let tsv = to_clipboard_tsv(&table);
        let lines: Vec<_> = tsv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Date\tTime\t3511"));
    }

    #[test]
    fn test_render_console_aligns_columns() {
        let table = score_table(&[scan("2022-02-12 10:05:00", 4.0)], region_table());
        let text = render_console(&table);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), lines[1].len());
    }

    #[test]
    fn test_append_scores_csv_writes_header_once() {
        let path = std::env::temp_dir().join("scan_rater_test_scores.csv");
        let _ = fs::remove_file(&path);

        let table = score_table(&[scan("2022-02-12 10:05:00", 4.0)], region_table());
        append_scores_csv(&path, &table).unwrap();
        append_scores_csv(&path, &table).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("Date")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }
}
