//! Workbook assembly
//!
//! Builds the summary sheet plus one detail sheet per survey with
//! responses, and applies the Hebrew layout: right alignment, right-to-left
//! reading order, columns sized to their widest rendered value.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use std::collections::HashMap;
use std::path::Path;

use crate::commands::export::surveys::Survey;

const SUMMARY_SHEET_NAME: &str = "סקרים";
const SUMMARY_HEADERS: [&str; 5] = ["שם", "תיאור", "נוצר ב", "מספר שאלות", "מספר תגובות"];

/// One detail sheet: survey name, ordered headers, one row map per
/// response. Rows may be sparse; missing headers render as empty cells.
#[derive(Debug, Clone)]
pub struct SheetData {
    pub survey_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn rendered(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(number) => format!("{}", number),
        }
    }
}

/// Output file name for a run date: `<prefix>-YYYY-MM-DD.xlsx`. A second
/// run on the same day produces the same name and overwrites the file.
pub fn output_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.xlsx", prefix, date.format("%Y-%m-%d"))
}

/// Summary grid: fixed header row, one row per survey. The response count
/// counts sheet entries carrying the survey's name.
pub fn build_summary_grid(surveys: &[Survey], sheets: &[SheetData]) -> Vec<Vec<Cell>> {
    let mut grid = vec![
        SUMMARY_HEADERS
            .iter()
            .map(|h| Cell::Text(h.to_string()))
            .collect::<Vec<_>>(),
    ];

    for survey in surveys {
        let response_sheets = sheets
            .iter()
            .filter(|sheet| sheet.survey_name == survey.name)
            .count();
        grid.push(vec![
            Cell::Text(survey.name.clone()),
            Cell::Text(survey.description.clone()),
            Cell::Text(survey.created_at.clone()),
            Cell::Number(survey.questions.len() as f64),
            Cell::Number(response_sheets as f64),
        ]);
    }

    grid
}

/// Detail grid: header row, then every response row padded to the full
/// header list with empty strings. Always rectangular.
pub fn build_detail_grid(sheet: &SheetData) -> Vec<Vec<Cell>> {
    let mut grid = vec![
        sheet
            .headers
            .iter()
            .map(|h| Cell::Text(h.clone()))
            .collect::<Vec<_>>(),
    ];

    for row in &sheet.rows {
        grid.push(
            sheet
                .headers
                .iter()
                .map(|header| Cell::Text(row.get(header).cloned().unwrap_or_default()))
                .collect(),
        );
    }

    grid
}

/// Serialize summary + detail sheets to `path`.
pub fn write_workbook(surveys: &[Survey], sheets: &[SheetData], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    write_sheet(&mut workbook, SUMMARY_SHEET_NAME, &build_summary_grid(surveys, sheets))?;
    for sheet in sheets {
        write_sheet(&mut workbook, &sheet.survey_name, &build_detail_grid(sheet))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;
    Ok(())
}

fn write_sheet(workbook: &mut Workbook, name: &str, grid: &[Vec<Cell>]) -> Result<()> {
    debug!("Writing sheet '{}' with {} rows", name, grid.len());

    let cell_format = Format::new()
        .set_align(FormatAlign::Right)
        .set_align(FormatAlign::VerticalCenter)
        .set_reading_direction(2);

    let sheet = workbook.add_worksheet();
    sheet
        .set_name(name)
        .with_context(|| format!("Invalid sheet name: {}", name))?;

    let mut widths: Vec<usize> = Vec::new();
    for (row_index, row) in grid.iter().enumerate() {
        for (col_index, cell) in row.iter().enumerate() {
            if widths.len() <= col_index {
                widths.resize(col_index + 1, 0);
            }
            widths[col_index] = widths[col_index].max(cell.rendered().chars().count());

            match cell {
                Cell::Text(text) => {
                    sheet.write_string_with_format(
                        row_index as u32,
                        col_index as u16,
                        text,
                        &cell_format,
                    )?;
                }
                Cell::Number(number) => {
                    sheet.write_number_with_format(
                        row_index as u32,
                        col_index as u16,
                        *number,
                        &cell_format,
                    )?;
                }
            }
        }
    }

    for (col_index, max_length) in widths.iter().enumerate() {
        sheet.set_column_width(col_index as u16, (max_length + 2) as f64)?;
    }
    sheet.set_right_to_left(true);

    Ok(())
}
