use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use chrono::Local;

use crate::domain::scanner::ScanError;
use crate::infrastructure::catalog::SkippedRecord;

/// 错误类型分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// 产品目录无法读取，扫描中止
    CatalogRead,
    /// 无法解码的产品记录，已跳过
    MalformedRecord,
    /// 配置无效
    Config,
}

impl ErrorType {
    /// 摘要中的输出顺序
    const ALL: [ErrorType; 3] = [ErrorType::Config, ErrorType::CatalogRead, ErrorType::MalformedRecord];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::CatalogRead => "目录读取",
            ErrorType::MalformedRecord => "记录格式",
            ErrorType::Config => "配置",
        }
    }
}

/// 扫描错误日志
///
/// 未启用文件时只计数，控制台摘要仍然可用。
pub struct ErrorLogger {
    error_file: Mutex<Option<File>>,
    error_path: PathBuf,
    enabled: bool,
    error_counts: Mutex<HashMap<ErrorType, usize>>,
}

impl ErrorLogger {
    /// 创建错误日志，文件写入当前目录
    pub fn new(enabled: bool) -> Result<Self> {
        Self::in_dir(enabled, Path::new("."))
    }

    pub fn in_dir(enabled: bool, dir: &Path) -> Result<Self> {
        if !enabled {
            return Ok(Self {
                error_file: Mutex::new(None),
                error_path: PathBuf::new(),
                enabled: false,
                error_counts: Mutex::new(HashMap::new()),
            });
        }

        let now = Local::now();
        let error_path = dir.join(format!("error_{}.log", now.format("%Y%m%d_%H%M%S")));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&error_path)?;

        file.write_all(&[0xEF, 0xBB, 0xBF])?; // UTF-8 BOM
        writeln!(file, "# PlaceholderCheck 错误日志")?;
        writeln!(file, "# 开始时间: {}", now.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "# ============================================")?;
        writeln!(file)?;

        Ok(Self {
            error_file: Mutex::new(Some(file)),
            error_path,
            enabled: true,
            error_counts: Mutex::new(HashMap::new()),
        })
    }

    /// 配置文件无效
    pub fn log_config_error(&self, config_path: &Path, err: &anyhow::Error) -> Result<()> {
        self.write_entry(
            ErrorType::Config,
            "配置无效",
            &[format!("配置文件: {}", config_path.display()), format!("原因: {:#}", err)],
        )
    }

    /// 目录读取失败，扫描没有产生任何结果
    pub fn log_scan_failure(&self, catalog: &Path, err: &ScanError) -> Result<()> {
        let mut lines = vec![format!("产品目录: {}", catalog.display())];
        let mut cause: Option<&dyn std::error::Error> = Some(err);
        while let Some(current) = cause {
            lines.push(format!("原因: {}", current));
            cause = current.source();
        }
        self.write_entry(ErrorType::CatalogRead, "扫描中止，未输出部分结果", &lines)
    }

    /// 被跳过的产品记录，每条记录一项
    pub fn log_skipped_records(&self, catalog: &Path, records: &[SkippedRecord]) -> Result<()> {
        for record in records {
            self.write_entry(
                ErrorType::MalformedRecord,
                &format!("跳过第 {} 条产品记录", record.index),
                &[format!("产品目录: {}", catalog.display()), format!("原因: {}", record.reason)],
            )?;
        }
        Ok(())
    }

    fn write_entry(&self, error_type: ErrorType, headline: &str, lines: &[String]) -> Result<()> {
        if let Ok(mut counts) = self.error_counts.lock() {
            *counts.entry(error_type).or_insert(0) += 1;
        }

        if !self.enabled {
            return Ok(());
        }

        if let Ok(mut file_guard) = self.error_file.lock() {
            if let Some(ref mut file) = *file_guard {
                let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                writeln!(file, "[{}] {} - {}", timestamp, error_type.as_str(), headline)?;
                for line in lines {
                    writeln!(file, "  {}", line)?;
                }
                writeln!(file)?;
                file.flush()?;
            }
        }

        Ok(())
    }

    pub fn count(&self, error_type: ErrorType) -> usize {
        self.error_counts
            .lock()
            .map(|counts| counts.get(&error_type).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn get_total_errors(&self) -> usize {
        ErrorType::ALL.iter().map(|t| self.count(*t)).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.get_total_errors() > 0
    }

    pub fn error_path(&self) -> &Path {
        &self.error_path
    }

    fn summary_lines(&self) -> Vec<String> {
        ErrorType::ALL
            .iter()
            .filter_map(|t| {
                let count = self.count(*t);
                (count > 0).then(|| match t {
                    ErrorType::MalformedRecord => format!("{}: {} 条记录已跳过", t.as_str(), count),
                    _ => format!("{}: {} 次", t.as_str(), count),
                })
            })
            .collect()
    }

    /// 写入结束时间和错误统计
    pub fn finalize(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if let Ok(mut file_guard) = self.error_file.lock() {
            if let Some(ref mut file) = *file_guard {
                writeln!(file, "# ============================================")?;
                writeln!(file, "# 结束时间: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;

                let summary = self.summary_lines();
                if summary.is_empty() {
                    writeln!(file, "# 无错误记录")?;
                } else {
                    writeln!(file, "# 错误统计:")?;
                    for line in &summary {
                        writeln!(file, "#   {}", line)?;
                    }
                    writeln!(file, "#   总计: {} 个错误", self.get_total_errors())?;
                }

                file.flush()?;
            }
        }

        Ok(())
    }

    /// 打印错误摘要到标准错误
    pub fn print_error_summary(&self) {
        if !self.has_errors() {
            return;
        }

        eprintln!("\n⚠️  扫描过程中发现错误:");
        eprintln!("----------------------------");
        for line in self.summary_lines() {
            eprintln!("  {}", line);
        }
        if self.enabled {
            eprintln!("  详细错误信息请查看: {}", self.error_path.display());
        }
    }
}
