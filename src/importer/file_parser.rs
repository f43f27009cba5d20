// ==========================================
// 表面处理危险品数据引擎 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv) / Excel (.xlsx)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::finish_importer_trait::{FileParser, RawRow, RawTable};
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

const UTF8_BOM: char = '\u{feff}';

fn check_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn normalize_headers<I: IntoIterator<Item = String>>(raw: I) -> Vec<String> {
    raw.into_iter()
        .enumerate()
        .map(|(idx, h)| {
            let h = if idx == 0 { h.trim_start_matches(UTF8_BOM).to_string() } else { h };
            h.trim().to_string()
        })
        .collect()
}

/// 组装一行；全空白行返回 None
fn build_row<I: IntoIterator<Item = String>>(
    headers: &[String],
    cells: I,
    row_number: usize,
) -> Option<RawRow> {
    let mut values = HashMap::new();
    for (col_idx, value) in cells.into_iter().enumerate() {
        if let Some(header) = headers.get(col_idx) {
            values.insert(header.clone(), value.trim().to_string());
        }
    }

    // 跳过完全空白的行
    if values.values().all(|v| v.is_empty()) {
        return None;
    }
    Some(RawRow { row_number, values })
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers = normalize_headers(reader.headers()?.iter().map(str::to_string));

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(rows.len() + 2);
            if let Some(row) = build_row(&headers, record.iter().map(str::to_string), row_number) {
                rows.push(row);
            }
        }

        Ok(RawTable { headers, rows })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook: Xlsx<_> = open_workbook(file_path)
            .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // range 从首个非空单元格开始，行号需加上其在工作表中的起始偏移
        let header_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

        let mut sheet_rows = range.rows();
        let header_row = sheet_rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无表头".to_string()))?;
        let headers = normalize_headers(header_row.iter().map(|cell| cell.to_string()));

        let rows = sheet_rows
            .enumerate()
            .filter_map(|(idx, data_row)| {
                build_row(
                    &headers,
                    data_row.iter().map(|cell| cell.to_string()),
                    header_line + idx + 1,
                )
            })
            .collect();

        Ok(RawTable { headers, rows })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse_table(file_path),
            "xlsx" => ExcelParser.parse_table(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
