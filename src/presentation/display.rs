use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use humansize::{format_size, BINARY};

use crate::domain::scanner::{Finding, LengthUnit, ScanReport};

/// 格式化文件大小
pub fn format_file_size(size: u64) -> String {
    format_size(size, BINARY)
}

/// 格式化持续时间
pub fn format_duration(duration: std::time::Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}.{:03}s", secs, duration.subsec_millis())
    }
}

/// 截断过长的标题 (按字符边界)
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut truncated: String = title.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}

/// 报告显示选项
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub min_description_length: usize,
    pub length_unit: LengthUnit,
    pub max_title_length: usize,
    pub color: bool,
}

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

fn render_section(
    out: &mut String,
    heading: &str,
    findings: &[Finding],
    empty_message: &str,
    options: &DisplayOptions,
    with_length: bool,
) -> std::fmt::Result {
    let heading = format!("{} ({})", heading, findings.len());
    writeln!(out, "{}", paint(&heading, "1;32", options.color))?;

    let header = if with_length {
        format!("{:<10} {:<width$} {:<18} {}", "ID", "Product", "Description Length", "Action", width = options.max_title_length)
    } else {
        format!("{:<10} {:<width$} {}", "ID", "Product", "Action", width = options.max_title_length)
    };
    writeln!(out, "{}", paint(&header, "1;34", options.color))?;

    if findings.is_empty() {
        writeln!(out, "{}", paint(empty_message, "2;37", options.color))?;
    }

    for finding in findings {
        let title = truncate_title(&finding.title, options.max_title_length);
        let id = finding.id.to_string();
        if with_length {
            let length = format!(
                "{} {}",
                finding.description_length.unwrap_or(0),
                options.length_unit.as_str()
            );
            writeln!(
                out,
                "{:<10} {:<width$} {:<18} {}",
                id,
                title,
                length,
                finding.edit_link,
                width = options.max_title_length
            )?;
        } else {
            writeln!(
                out,
                "{:<10} {:<width$} {}",
                id,
                title,
                finding.edit_link,
                width = options.max_title_length
            )?;
        }
    }

    writeln!(out)
}

fn write_report(out: &mut String, report: &ScanReport, options: &DisplayOptions) -> std::fmt::Result {
    render_section(
        out,
        "Products with Placeholder Images",
        &report.image_issues,
        "No products with placeholder images found.",
        options,
        false,
    )?;
    render_section(
        out,
        "Products with Placeholder Text",
        &report.text_issues,
        "No products with placeholder text found.",
        options,
        false,
    )?;
    render_section(
        out,
        &format!("Products with Descriptions Below {} Characters", options.min_description_length),
        &report.short_description_issues,
        "No products with short descriptions found.",
        options,
        true,
    )
}

/// 将扫描报告渲染为三张表格
pub fn render_report(report: &ScanReport, options: &DisplayOptions) -> String {
    let mut out = String::new();
    // 写入 String 不会失败
    let _ = write_report(&mut out, report, options);
    out
}

/// 输出扫描报告
pub fn print_report(report: &ScanReport, options: &DisplayOptions) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{}", render_report(report, options))?;
    stdout.flush()?;
    Ok(())
}

/// 以 JSON 输出扫描报告
pub fn print_json(report: &ScanReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("无法序列化扫描报告")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}

/// 扫描摘要
pub struct ScanSummary {
    pub start_time: Instant,
    pub catalog_size: Option<u64>,
    pub skipped_records: usize,
}

impl ScanSummary {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            catalog_size: None,
            skipped_records: 0,
        }
    }

    pub fn render(&self, report: &ScanReport) -> String {
        let mut lines = vec![
            "扫描摘要:".to_string(),
            "----------------------------".to_string(),
            format!("总用时: {}", format_duration(self.start_time.elapsed())),
        ];
        if let Some(size) = self.catalog_size {
            lines.push(format!("目录大小: {}", format_file_size(size)));
        }
        lines.push(format!("扫描产品: {}", report.scanned_products));
        if self.skipped_records > 0 {
            lines.push(format!("跳过记录: {}", self.skipped_records));
        }
        lines.push(format!("占位图片: {}", report.image_issues.len()));
        lines.push(format!("占位文本: {}", report.text_issues.len()));
        lines.push(format!("描述过短: {}", report.short_description_issues.len()));
        lines.push(format!("问题总数: {}", report.total_issues()));
        lines.join("\n")
    }

    pub fn print(&self, report: &ScanReport) -> Result<()> {
        println!("{}", self.render(report));
        Ok(())
    }
}

impl Default for ScanSummary {
    fn default() -> Self {
        Self::new()
    }
}
