use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::{ImageRef, Product, ProductId};
use crate::infrastructure::LoggerTrait;

/// 默认的占位文本短语
pub const DEFAULT_PLACEHOLDER_PHRASES: [&str; 2] = ["lorem ipsum", "placeholder"];

/// 默认的最短描述长度
pub const DEFAULT_MIN_DESCRIPTION_LENGTH: usize = 200;

/// 产品数据源错误
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("无法读取产品目录 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析产品目录 {path}: {message}")]
    Parse { path: String, message: String },
}

/// 扫描错误
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("产品数据源不可用")]
    Source(#[from] SourceError),
}

/// 产品数据源
///
/// 只返回已发布的产品，并且在同一次扫描中保持稳定的顺序。
pub trait ProductSource {
    fn list_published_products(&self) -> Result<Vec<Product>, SourceError>;
}

/// 描述长度的计量单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// Unicode 字符数
    Chars,
    /// UTF-8 字节数
    Bytes,
}

impl LengthUnit {
    pub fn measure(&self, text: &str) -> usize {
        match self {
            LengthUnit::Chars => text.chars().count(),
            LengthUnit::Bytes => text.len(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthUnit::Chars => "字符",
            LengthUnit::Bytes => "字节",
        }
    }
}

/// 占位文本匹配器
#[derive(Debug, Clone)]
pub struct PlaceholderText {
    matcher: Option<Regex>,
}

impl PlaceholderText {
    /// 从短语列表创建匹配器，短语按字面匹配，忽略 ASCII 大小写
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Result<Self> {
        let alternatives: Vec<String> = phrases
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { matcher: None });
        }

        let matcher = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .unicode(false)
            .build()
            .context("无法创建占位文本匹配器")?;

        Ok(Self { matcher: Some(matcher) })
    }

    pub fn contains_phrase(&self, text: &str) -> bool {
        self.matcher.as_ref().map_or(false, |m| m.is_match(text))
    }
}

impl Default for PlaceholderText {
    fn default() -> Self {
        // 默认短语是固定的 ASCII 字面量，不会构建失败
        let pattern = DEFAULT_PLACEHOLDER_PHRASES
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        Self {
            matcher: RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .unicode(false)
                .build()
                .ok(),
        }
    }
}

/// 单次扫描的设置
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub placeholder_image_id: Option<ImageRef>,
    pub min_description_length: usize,
    pub length_unit: LengthUnit,
    pub placeholder_text: PlaceholderText,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            placeholder_image_id: None,
            min_description_length: DEFAULT_MIN_DESCRIPTION_LENGTH,
            length_unit: LengthUnit::Chars,
            placeholder_text: PlaceholderText::default(),
        }
    }
}

impl ScanSettings {
    /// 空的占位图ID (0 或空白) 视为未配置
    pub fn effective_placeholder_id(&self) -> Option<&ImageRef> {
        self.placeholder_image_id.as_ref().filter(|id| !id.is_empty())
    }
}

/// 缩略图缺失或使用了占位图
pub fn is_placeholder_image(thumbnail: Option<&ImageRef>, placeholder: Option<&ImageRef>) -> bool {
    match thumbnail {
        None => true,
        Some(image) if image.is_empty() => true,
        Some(image) => placeholder.map_or(false, |p| !p.is_empty() && image == p),
    }
}

/// 空描述 (包括商店用来表示"无内容"的 "0")
pub fn is_empty_description(description: &str) -> bool {
    description.is_empty() || description == "0"
}

/// 描述为空或包含占位短语
pub fn is_placeholder_text(description: &str, phrases: &PlaceholderText) -> bool {
    is_empty_description(description) || phrases.contains_phrase(description)
}

/// 非空且短于阈值的描述返回其长度
pub fn short_description_length(description: &str, min_length: usize, unit: LengthUnit) -> Option<usize> {
    if is_empty_description(description) {
        return None;
    }
    let length = unit.measure(description);
    (length < min_length).then_some(length)
}

/// 单个产品在某一类别下的检测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub id: ProductId,
    pub title: String,
    pub edit_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_length: Option<usize>,
}

impl Finding {
    fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            edit_link: product.edit_link.clone(),
            description_length: None,
        }
    }
}

/// 扫描报告
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub image_issues: Vec<Finding>,
    pub text_issues: Vec<Finding>,
    pub short_description_issues: Vec<Finding>,
    pub scanned_products: u64,
}

impl ScanReport {
    pub fn total_issues(&self) -> usize {
        self.image_issues.len() + self.text_issues.len() + self.short_description_issues.len()
    }
}

/// 产品目录扫描器
pub struct CatalogScanner<'a> {
    source: &'a dyn ProductSource,
    settings: &'a ScanSettings,
    logger: Arc<dyn LoggerTrait>,
    show_progress: bool,
}

impl<'a> CatalogScanner<'a> {
    pub fn new(source: &'a dyn ProductSource, settings: &'a ScanSettings, logger: Arc<dyn LoggerTrait>) -> Self {
        Self {
            source,
            settings,
            logger,
            show_progress: false,
        }
    }

    /// 扫描时显示进度
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// 读取全部已发布产品并分类
    pub fn scan(&self) -> Result<ScanReport, ScanError> {
        let start_time = Instant::now();
        let products = self.source.list_published_products()?;

        let progress = if self.show_progress {
            let bar = ProgressBar::new(products.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
            {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        let placeholder = self.settings.effective_placeholder_id();
        let mut report = ScanReport::default();

        for product in &products {
            progress.inc(1);

            // 数据源泄漏的非发布产品不进入任何列表
            if !product.status.is_published() {
                self.log_product(&product.id, &product.title, "已跳过(未发布)");
                continue;
            }
            report.scanned_products += 1;

            let mut flags = Vec::new();

            if is_placeholder_image(product.thumbnail.as_ref(), placeholder) {
                report.image_issues.push(Finding::from_product(product));
                flags.push("占位图片");
            }

            if is_placeholder_text(&product.description, &self.settings.placeholder_text) {
                report.text_issues.push(Finding::from_product(product));
                flags.push("占位文本");
            }

            if let Some(length) = short_description_length(
                &product.description,
                self.settings.min_description_length,
                self.settings.length_unit,
            ) {
                let mut finding = Finding::from_product(product);
                finding.description_length = Some(length);
                report.short_description_issues.push(finding);
                flags.push("描述过短");
            }

            let status = if flags.is_empty() { "正常".to_string() } else { flags.join(", ") };
            self.log_product(&product.id, &product.title, &status);
        }

        progress.finish_and_clear();

        if self.logger.is_enabled() {
            let _ = self.logger.finalize(&report, start_time.elapsed());
        }

        Ok(report)
    }

    fn log_product(&self, id: &ProductId, title: &str, status: &str) {
        if self.logger.is_enabled() {
            let _ = self.logger.log_product(id, title, status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::PublishStatus;
    use crate::infrastructure::Logger;

    struct VecSource(Vec<Product>);

    impl ProductSource for VecSource {
        fn list_published_products(&self) -> Result<Vec<Product>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl ProductSource for FailingSource {
        fn list_published_products(&self) -> Result<Vec<Product>, SourceError> {
            Err(SourceError::Parse {
                path: "catalog.json".to_string(),
                message: "unexpected end of input".to_string(),
            })
        }
    }

    fn disabled_logger() -> Arc<dyn LoggerTrait> {
        Arc::new(Logger::new(false).unwrap())
    }

    fn long_text() -> String {
        "A fully detailed product description. ".repeat(8)
    }

    fn ids(findings: &[Finding]) -> Vec<String> {
        findings.iter().map(|f| f.id.to_string()).collect()
    }

    #[test]
    fn test_placeholder_image_predicate() {
        let placeholder = ImageRef::from("img42");
        assert!(is_placeholder_image(None, Some(&placeholder)));
        assert!(is_placeholder_image(Some(&ImageRef::Numeric(0)), None));
        assert!(is_placeholder_image(Some(&ImageRef::from("img42")), Some(&placeholder)));
        assert!(!is_placeholder_image(Some(&ImageRef::from("img99")), Some(&placeholder)));
        assert!(!is_placeholder_image(Some(&ImageRef::from("img99")), None));
        // 数字与数字字符串
        assert!(is_placeholder_image(Some(&ImageRef::Numeric(42)), Some(&ImageRef::from("42"))));
    }

    #[test]
    fn test_placeholder_text_predicate() {
        let phrases = PlaceholderText::default();
        assert!(is_placeholder_text("", &phrases));
        assert!(is_placeholder_text("LOREM IPSUM dolor", &phrases));
        assert!(is_placeholder_text("This is a PlaceHolder.", &phrases));
        assert!(!is_placeholder_text("Lorem dolor ipsum", &phrases));
        assert!(!is_placeholder_text("Solid oak table", &phrases));
    }

    #[test]
    fn test_zero_description_counts_as_empty() {
        let phrases = PlaceholderText::default();
        assert!(is_empty_description("0"));
        assert!(!is_empty_description("00"));
        assert!(!is_empty_description(" 0"));
        assert!(is_placeholder_text("0", &phrases));
        assert_eq!(short_description_length("0", 200, LengthUnit::Chars), None);
        assert_eq!(short_description_length("00", 200, LengthUnit::Chars), Some(2));
    }

    #[test]
    fn test_placeholder_text_is_literal() {
        let phrases = PlaceholderText::new(&["t.b.d"]).unwrap();
        assert!(phrases.contains_phrase("price t.b.d"));
        assert!(!phrases.contains_phrase("price tabxd"));

        let none = PlaceholderText::new(&["  "]).unwrap();
        assert!(!none.contains_phrase("anything"));
        assert!(is_placeholder_text("", &none));
    }

    #[test]
    fn test_short_description_predicate() {
        assert_eq!(short_description_length("", 200, LengthUnit::Chars), None);
        assert_eq!(short_description_length("abc", 200, LengthUnit::Chars), Some(3));
        assert_eq!(short_description_length(&"x".repeat(199), 200, LengthUnit::Chars), Some(199));
        assert_eq!(short_description_length(&"x".repeat(200), 200, LengthUnit::Chars), None);
    }

    #[test]
    fn test_length_unit_multibyte() {
        let text = "café";
        assert_eq!(LengthUnit::Chars.measure(text), 4);
        assert_eq!(LengthUnit::Bytes.measure(text), 5);
        assert_eq!(short_description_length(text, 5, LengthUnit::Bytes), None);
        assert_eq!(short_description_length(text, 5, LengthUnit::Chars), Some(4));
    }

    #[test]
    fn test_scan_reference_examples() {
        let source = VecSource(vec![
            Product::new(1, "Chair", "Lorem Ipsum dolor sit").with_edit_link("/edit/1"),
            Product::new(2, "Table", &long_text()).with_thumbnail("img42"),
            Product::new(3, "Lamp", "").with_thumbnail("img99"),
            Product::new(4, "Draft", "").with_status(PublishStatus::Draft),
        ]);
        let settings = ScanSettings {
            placeholder_image_id: Some(ImageRef::from("img42")),
            ..ScanSettings::default()
        };

        let report = CatalogScanner::new(&source, &settings, disabled_logger())
            .scan()
            .unwrap();

        assert_eq!(ids(&report.image_issues), vec!["1", "2"]);
        assert_eq!(ids(&report.text_issues), vec!["1", "3"]);
        assert_eq!(ids(&report.short_description_issues), vec!["1"]);
        assert_eq!(report.short_description_issues[0].description_length, Some(21));
        assert_eq!(report.image_issues[0].edit_link, "/edit/1");
        assert_eq!(report.image_issues[1].description_length, None);
        assert_eq!(report.scanned_products, 3);
    }

    #[test]
    fn test_scan_empty_catalog() {
        let source = VecSource(vec![]);
        let settings = ScanSettings::default();
        let report = CatalogScanner::new(&source, &settings, disabled_logger())
            .scan()
            .unwrap();

        assert!(report.image_issues.is_empty());
        assert!(report.text_issues.is_empty());
        assert!(report.short_description_issues.is_empty());
        assert_eq!(report.total_issues(), 0);
    }

    #[test]
    fn test_scan_without_placeholder_config() {
        let source = VecSource(vec![
            Product::new(1, "A", &long_text()).with_thumbnail(0),
            Product::new(2, "B", &long_text()).with_thumbnail(42),
        ]);
        let settings = ScanSettings {
            placeholder_image_id: Some(ImageRef::from("0")),
            ..ScanSettings::default()
        };
        let report = CatalogScanner::new(&source, &settings, disabled_logger())
            .scan()
            .unwrap();

        assert_eq!(ids(&report.image_issues), vec!["1"]);
    }

    #[test]
    fn test_scan_preserves_source_order_and_is_idempotent() {
        let source = VecSource(vec![
            Product::new(9, "Z", ""),
            Product::new(3, "C", ""),
            Product::new(5, "E", ""),
        ]);
        let settings = ScanSettings::default();
        let scanner = CatalogScanner::new(&source, &settings, disabled_logger());

        let first = scanner.scan().unwrap();
        let second = scanner.scan().unwrap();

        assert_eq!(ids(&first.image_issues), vec!["9", "3", "5"]);
        assert_eq!(ids(&first.text_issues), vec!["9", "3", "5"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_scan_source_failure_is_fatal() {
        let settings = ScanSettings::default();
        let result = CatalogScanner::new(&FailingSource, &settings, disabled_logger()).scan();
        assert!(matches!(result, Err(ScanError::Source(_))));
    }

    #[test]
    fn test_finding_json_shape() {
        let finding = Finding {
            id: ProductId::Numeric(7),
            title: "Mug".to_string(),
            edit_link: "/edit/7".to_string(),
            description_length: None,
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["edit_link"], "/edit/7");
        assert!(json.get("description_length").is_none());
    }
}
