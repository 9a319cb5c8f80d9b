// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! CSV存储
//!
//! 固定列顺序、UTF-8编码，可选BOM。字段中含有逗号、引号或换行时加引号，
//! 引号本身写成两个引号。

use crate::domain::models::weather::{HourlyWeatherInfo, CSV_HEADER};
use crate::utils::errors::CsvError;
use chrono::NaiveDateTime;
use std::io::{self, Write};
use std::mem::take;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const BOM: &str = "\u{feff}";
const SEPARATOR: char = ',';

/// CSV写入选项
#[derive(Debug, Clone, Default)]
pub struct CsvOptions {
    /// 是否在文件开头写入UTF-8 BOM
    pub write_bom: bool,
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// 写入一行
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", SEPARATOR)?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// 将记录编码为CSV（含表头）
pub fn encode_records(records: &[HourlyWeatherInfo], options: &CsvOptions) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(128 * (records.len() + 1));
    if options.write_bom {
        buf.extend_from_slice(BOM.as_bytes());
    }
    write_row(&mut buf, &CSV_HEADER)?;
    for record in records {
        write_row(&mut buf, &record.to_fields())?;
    }
    Ok(buf)
}

/// 保存记录到CSV文件
///
/// 父目录不存在时自动创建，已存在的文件会被覆盖。
///
/// # 参数
///
/// * `records` - 记录列表，按原顺序写入
/// * `path` - 目标文件
/// * `options` - 写入选项
pub async fn save_to_csv(
    records: &[HourlyWeatherInfo],
    path: &Path,
    options: &CsvOptions,
) -> Result<(), CsvError> {
    let data = encode_records(records, options)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(path).await?;
    file.write_all(&data).await?;
    file.flush().await?;

    Ok(())
}

/// 解析CSV文本
///
/// 支持引号转义和CRLF，忽略开头的BOM和空行。
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some('"')) {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            c if c == SEPARATOR && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// 读取由 `save_to_csv` 写出的文件
pub async fn read_records(path: &Path) -> Result<Vec<HourlyWeatherInfo>, CsvError> {
    let text = fs::read_to_string(path).await?;
    let mut rows = parse_rows(&text).into_iter();

    match rows.next() {
        Some(header) if header == CSV_HEADER => {}
        _ => {
            return Err(CsvError::Malformed {
                line: 1,
                reason: "unexpected header".to_string(),
            })
        }
    }

    rows.enumerate()
        .map(|(i, row)| {
            HourlyWeatherInfo::from_fields(&row).map_err(|reason| CsvError::Malformed {
                line: i + 2,
                reason,
            })
        })
        .collect()
}

/// 输出文件名：`yyyy-MM-dd_HH-mm_<行数>.csv`
pub fn output_file_name(now: NaiveDateTime, rows: usize) -> String {
    format!("{}_{}.csv", now.format("%Y-%m-%d_%H-%M"), rows)
}

/// 输出文件路径；指定了文件名时直接使用，否则按时间和行数生成
pub fn output_path(
    directory: &Path,
    file_name: Option<&str>,
    now: NaiveDateTime,
    rows: usize,
) -> PathBuf {
    match file_name.filter(|name| !name.trim().is_empty()) {
        Some(name) => directory.join(name),
        None => directory.join(output_file_name(now, rows)),
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
