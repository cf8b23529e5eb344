//! Placement spreadsheet parsing (XLSX or CSV) into validated rows.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use serde::Serialize;

use crate::errors::AppError;

/// Hard cap on data rows accepted from one upload.
pub const MAX_ROWS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementRecord {
    pub student_name: String,
    pub company: String,
    pub role: Option<String>,
    pub package_lpa: Option<f64>,
    pub placement_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based spreadsheet row, counting the header as row 1.
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ParsedSheet {
    pub records: Vec<PlacementRecord>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Student,
    Company,
    Role,
    Package,
    Year,
}

#[derive(Debug, Default)]
struct ColumnMap {
    student: Option<usize>,
    company: Option<usize>,
    role: Option<usize>,
    package: Option<usize>,
    year: Option<usize>,
}

fn classify_header(header: &str) -> Option<Column> {
    let lowered = header.to_lowercase();
    let h = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    match h.as_str() {
        "student" | "name" | "student_name" | "candidate" | "candidate_name" => Some(Column::Student),
        "company" | "employer" | "company_name" | "organization" | "recruiter" => Some(Column::Company),
        "role" | "position" | "designation" | "job_title" | "title" => Some(Column::Role),
        "package" | "ctc" | "package_lpa" | "ctc_lpa" | "salary_lpa" | "lpa" => Some(Column::Package),
        "year" | "placement_year" | "batch" | "passing_year" => Some(Column::Year),
        _ => None,
    }
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Result<Self, AppError> {
        let mut map = ColumnMap::default();
        for (idx, header) in headers.iter().enumerate() {
            let slot = match classify_header(header) {
                Some(Column::Student) => &mut map.student,
                Some(Column::Company) => &mut map.company,
                Some(Column::Role) => &mut map.role,
                Some(Column::Package) => &mut map.package,
                Some(Column::Year) => &mut map.year,
                None => continue,
            };
            // First matching column wins.
            slot.get_or_insert(idx);
        }
        if map.student.is_none() || map.company.is_none() {
            return Err(AppError::UnprocessableEntity(
                "Spreadsheet must have 'student' and 'company' columns".to_string(),
            ));
        }
        Ok(map)
    }
}

/// Parses an uploaded sheet. `extension` selects the format.
pub fn parse_placements(data: &[u8], extension: &str) -> Result<ParsedSheet, AppError> {
    let rows = match extension {
        "csv" => read_csv(data)?,
        "xlsx" => read_xlsx(data)?,
        other => {
            return Err(AppError::Validation(format!(
                "Unsupported spreadsheet type '.{other}', use .xlsx or .csv"
            )))
        }
    };
    parse_rows(rows)
}

/// A row of cell text tagged with its 1-based line in the source sheet.
type SheetRow = (usize, Vec<String>);

fn read_csv(data: &[u8]) -> Result<Vec<SheetRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| AppError::UnprocessableEntity(format!("Malformed CSV: {e}")))?;
        // The reader skips empty lines, so the record index alone undercounts.
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        rows.push((line, record.iter().map(str::to_string).collect()));
    }
    Ok(rows)
}

fn read_xlsx(data: &[u8]) -> Result<Vec<SheetRow>, AppError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
        .map_err(|e| AppError::UnprocessableEntity(format!("Malformed XLSX: {e}")))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::UnprocessableEntity("Workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| AppError::UnprocessableEntity(format!("Unreadable sheet '{sheet}': {e}")))?;
    // The range begins at the first used cell, not at A1.
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    Ok(range
        .rows()
        .enumerate()
        .map(|(idx, row)| (first_row + idx + 1, row.iter().map(cell_to_string).collect()))
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        _ => String::new(),
    }
}

fn parse_rows(rows: Vec<SheetRow>) -> Result<ParsedSheet, AppError> {
    let mut rows = rows.into_iter();
    let (_, headers) = rows
        .next()
        .ok_or_else(|| AppError::UnprocessableEntity("Spreadsheet is empty".to_string()))?;
    let map = ColumnMap::from_headers(&headers)?;

    let mut sheet = ParsedSheet::default();
    for (row_number, row) in rows {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        if sheet.records.len() + sheet.errors.len() >= MAX_ROWS {
            return Err(AppError::PayloadTooLarge(format!(
                "Spreadsheets are limited to {MAX_ROWS} rows"
            )));
        }
        match parse_record(&row, &map) {
            Ok(record) => sheet.records.push(record),
            Err(message) => sheet.errors.push(RowError {
                row: row_number,
                message,
            }),
        }
    }
    Ok(sheet)
}

fn cell<'a>(row: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| row.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn parse_record(row: &[String], map: &ColumnMap) -> Result<PlacementRecord, String> {
    let student_name = cell(row, map.student).ok_or("missing student name")?;
    let company = cell(row, map.company).ok_or("missing company")?;

    let package_lpa = cell(row, map.package)
        .map(parse_package)
        .transpose()?;
    let placement_year = cell(row, map.year)
        .map(|y| {
            y.parse::<i32>()
                .ok()
                .filter(|y| (1950..=2100).contains(y))
                .ok_or_else(|| format!("invalid year '{y}'"))
        })
        .transpose()?;

    Ok(PlacementRecord {
        student_name: student_name.to_string(),
        company: company.to_string(),
        role: cell(row, map.role).map(str::to_string),
        package_lpa,
        placement_year,
    })
}

/// Packages are expressed in lakhs per annum: "12", "12.5" or "12.5 LPA".
fn parse_package(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw
        .to_lowercase()
        .replace("lpa", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '₹' && *c != ',')
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v < 1_000.0 => Ok(v),
        _ => Err(format!("invalid package '{raw}' (expected lakhs per annum)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_with_aliases() {
        let csv = "Candidate Name,Employer,Designation,CTC (LPA),Batch\n\
                   Asha Rao,Infosys,SDE,6.5,2024\n\
                   Vikram N,TCS,,4 LPA,2024\n";
        let sheet = parse_placements(csv.as_bytes(), "csv").unwrap();
        assert!(sheet.errors.is_empty(), "{:?}", sheet.errors);
        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.records[0].company, "Infosys");
        assert_eq!(sheet.records[0].role.as_deref(), Some("SDE"));
        assert_eq!(sheet.records[1].package_lpa, Some(4.0));
        assert_eq!(sheet.records[1].role, None);
    }

    #[test]
    fn test_row_errors_use_spreadsheet_numbers() {
        let csv = "student,company,package\n\
                   Asha,Infosys,7\n\
                   ,Wipro,5\n\
                   ,,\n\
                   Ravi,Zoho,lots\n";
        let sheet = parse_placements(csv.as_bytes(), "csv").unwrap();
        assert_eq!(sheet.records.len(), 1);
        assert_eq!(
            sheet.errors,
            vec![
                RowError {
                    row: 3,
                    message: "missing student name".to_string()
                },
                RowError {
                    row: 5,
                    message: "invalid package 'lots' (expected lakhs per annum)".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_row_numbers_count_empty_lines() {
        let csv = "student,company\nAsha,Infosys\n\n,Wipro\n\n\nRavi,\n";
        let sheet = parse_placements(csv.as_bytes(), "csv").unwrap();
        assert_eq!(sheet.records.len(), 1);
        let rows: Vec<usize> = sheet.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![4, 7]);
    }

    #[test]
    fn test_rows_keep_sheet_line_numbers() {
        let rows = vec![
            (3, vec!["student".to_string(), "company".to_string()]),
            (4, vec!["Asha".to_string(), "Infosys".to_string()]),
            (9, vec!["".to_string(), "Wipro".to_string()]),
        ];
        let sheet = parse_rows(rows).unwrap();
        assert_eq!(sheet.errors[0].row, 9);
    }

    #[test]
    fn test_missing_required_columns() {
        let csv = "name,role\nAsha,SDE\n";
        assert!(matches!(
            parse_placements(csv.as_bytes(), "csv"),
            Err(AppError::UnprocessableEntity(_))
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            parse_placements(b"", "pdf"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_csv() {
        assert!(parse_placements(b"", "csv").is_err());
    }

    #[test]
    fn test_invalid_year() {
        let csv = "student,company,year\nAsha,Infosys,24\n";
        let sheet = parse_placements(csv.as_bytes(), "csv").unwrap();
        assert_eq!(sheet.errors[0].message, "invalid year '24'");
    }

    #[test]
    fn test_parse_package_variants() {
        assert_eq!(parse_package("12"), Ok(12.0));
        assert_eq!(parse_package("12.5 LPA"), Ok(12.5));
        assert!(parse_package("-3").is_err());
    }

    #[test]
    fn test_garbage_xlsx_rejected() {
        assert!(matches!(
            parse_placements(b"definitely not a zip", "xlsx"),
            Err(AppError::UnprocessableEntity(_))
        ));
    }

    #[test]
    fn test_float_cells_render_without_fraction() {
        assert_eq!(cell_to_string(&Data::Float(2024.0)), "2024");
        assert_eq!(cell_to_string(&Data::Float(6.5)), "6.5");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
