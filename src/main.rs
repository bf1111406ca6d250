use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use placeholder_check::application::Config;
use placeholder_check::domain::{CatalogScanner, LengthUnit};
use placeholder_check::infrastructure::{ErrorLogger, JsonCatalogSource, Logger, LoggerTrait};
use placeholder_check::presentation::{print_json, print_report, DisplayOptions, ScanSummary};

/// 检测产品目录中的占位图片、占位文本和过短描述
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// 产品目录文件 (JSON)，默认使用配置中的 default_catalog_path
    catalog: Option<PathBuf>,

    /// 配置文件路径，默认为程序同级目录下的 config.toml
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// 占位图ID (覆盖配置文件)
    #[clap(short, long)]
    placeholder_image_id: Option<String>,

    /// 描述最短长度 (覆盖配置文件)
    #[clap(short, long)]
    min_length: Option<usize>,

    /// 按字节而不是字符计算描述长度
    #[clap(long)]
    bytes: bool,

    /// 以 JSON 输出扫描结果
    #[clap(long)]
    json: bool,

    /// 禁用彩色输出
    #[clap(long)]
    no_color: bool,

    /// 启用详细日志记录，日志文件保存到当前目录
    #[clap(long)]
    log: bool,

    /// 启用错误日志文件
    #[clap(long)]
    error_log: bool,
}

/// 命令行参数覆盖配置文件中的值
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(id) = &args.placeholder_image_id {
        config.scan.placeholder_image_id = id.clone();
    }
    if let Some(min_length) = args.min_length {
        config.scan.min_description_length = min_length;
    }
    if args.bytes {
        config.scan.length_unit = LengthUnit::Bytes;
    }
    if args.no_color {
        config.display.color = false;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let error_logger = ErrorLogger::new(args.error_log)?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };
    let mut config = Config::load_or_create(&config_path)?;
    apply_overrides(&mut config, &args);

    if let Err(err) = config.validate() {
        error_logger.log_config_error(&config_path, &err)?;
        error_logger.finalize()?;
        return Err(err.context(format!("配置无效: {}", config_path.display())));
    }

    let settings = config.scan_settings()?;
    let catalog_path = args
        .catalog
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.catalog.default_catalog_path));

    // 初始化日志记录器
    let logger = Arc::new(Logger::new(args.log)?);
    if logger.is_enabled() {
        logger.log_message(&format!("产品目录: {}", catalog_path.display()))?;
        logger.log_message(&format!("配置文件: {}", config_path.display()))?;
        logger.log_message(&format!(
            "占位图ID: {}",
            settings
                .placeholder_image_id
                .as_ref()
                .map_or_else(|| "(未配置)".to_string(), |id| id.to_string())
        ))?;
        logger.log_message(&format!(
            "最短描述长度: {} {}",
            settings.min_description_length,
            settings.length_unit.as_str()
        ))?;
        logger.log_message(&format!("占位短语: {}", config.text.placeholder_phrases.join(", ")))?;
    }

    let source = JsonCatalogSource::new(&catalog_path, &config.catalog.edit_link_template);
    let mut summary = ScanSummary::new();
    summary.catalog_size = source.catalog_size();

    let logger_trait: Arc<dyn LoggerTrait> = logger.clone();
    let scan_result = CatalogScanner::new(&source, &settings, logger_trait)
        .with_progress(!args.json)
        .scan();

    let report = match scan_result {
        Ok(report) => report,
        Err(err) => {
            error_logger.log_scan_failure(source.path(), &err)?;
            error_logger.finalize()?;
            return Err(anyhow::Error::from(err).context(format!("扫描失败: {}", source.path().display())));
        }
    };

    let skipped = source.skipped_records();
    error_logger.log_skipped_records(source.path(), &skipped)?;
    summary.skipped_records = skipped.len();

    if args.json {
        print_json(&report)?;
    } else {
        let options = DisplayOptions {
            min_description_length: settings.min_description_length,
            length_unit: settings.length_unit,
            max_title_length: config.display.max_title_length,
            color: config.display.color,
        };
        print_report(&report, &options)?;
        summary.print(&report)?;
    }

    error_logger.finalize().context("无法写入错误日志")?;
    error_logger.print_error_summary();

    if logger.is_enabled() {
        eprintln!("完整日志已保存到: {}", logger.log_path().display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_from([
            "placeholder-check",
            "catalog.json",
            "--placeholder-image-id",
            "42",
            "--min-length",
            "150",
            "--bytes",
            "--json",
        ])
        .unwrap();

        assert_eq!(args.catalog, Some(PathBuf::from("catalog.json")));
        assert_eq!(args.placeholder_image_id.as_deref(), Some("42"));
        assert_eq!(args.min_length, Some(150));
        assert!(args.bytes);
        assert!(args.json);
        assert!(!args.log);
    }

    #[test]
    fn test_apply_overrides() {
        let args = Args::try_parse_from(["placeholder-check", "-p", "img42", "-m", "120", "--no-color"]).unwrap();
        let mut config = Config::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.scan.placeholder_image_id, "img42");
        assert_eq!(config.scan.min_description_length, 120);
        assert_eq!(config.scan.length_unit, LengthUnit::Chars);
        assert!(!config.display.color);
    }

    #[test]
    fn test_overrides_keep_config_when_absent() {
        let args = Args::try_parse_from(["placeholder-check"]).unwrap();
        let mut config = Config::default();
        config.scan.placeholder_image_id = "7".to_string();
        apply_overrides(&mut config, &args);

        assert_eq!(config.scan.placeholder_image_id, "7");
        assert_eq!(config.scan.min_description_length, 200);
        assert!(config.display.color);
    }
}
