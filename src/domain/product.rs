use std::fmt;

use serde::{Deserialize, Serialize};

/// 产品标识 (数字或字符串)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Numeric(n) => write!(f, "{}", n),
            ProductId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        ProductId::Numeric(value)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        ProductId::Text(value.to_string())
    }
}

/// 图片引用 (缩略图ID或占位图ID)
///
/// 比较时数字与数字字符串视为相等: `Numeric(42) == Text("42")`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Numeric(u64),
    Text(String),
}

/// 规范化后的比较形式
#[derive(PartialEq, Eq)]
enum Canonical<'a> {
    Number(u64),
    Text(&'a str),
}

impl ImageRef {
    fn canonical(&self) -> Canonical<'_> {
        match self {
            ImageRef::Numeric(n) => Canonical::Number(*n),
            ImageRef::Text(s) => {
                let trimmed = s.trim();
                match trimmed.parse::<u64>() {
                    Ok(n) => Canonical::Number(n),
                    Err(_) => Canonical::Text(trimmed),
                }
            }
        }
    }

    /// 是否为空引用 (0、"0" 或空白字符串都表示没有图片)
    pub fn is_empty(&self) -> bool {
        match self.canonical() {
            Canonical::Number(n) => n == 0,
            Canonical::Text(s) => s.is_empty(),
        }
    }

    /// 从用户输入解析 (命令行或配置文件中的字符串)
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<u64>() {
            Ok(n) => ImageRef::Numeric(n),
            Err(_) => ImageRef::Text(input.trim().to_string()),
        }
    }
}

impl PartialEq for ImageRef {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for ImageRef {}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Numeric(n) => write!(f, "{}", n),
            ImageRef::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for ImageRef {
    fn from(value: u64) -> Self {
        ImageRef::Numeric(value)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        ImageRef::Text(value.to_string())
    }
}

/// 发布状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    Published,
    Draft,
    Pending,
    Private,
    Other(String),
}

impl PublishStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, PublishStatus::Published)
    }
}

impl From<&str> for PublishStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "publish" | "published" => PublishStatus::Published,
            "draft" => PublishStatus::Draft,
            "pending" => PublishStatus::Pending,
            "private" => PublishStatus::Private,
            other => PublishStatus::Other(other.to_string()),
        }
    }
}

impl Default for PublishStatus {
    fn default() -> Self {
        PublishStatus::Published
    }
}

/// 产品记录 (只读)
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<ImageRef>,
    pub status: PublishStatus,
    pub edit_link: String,
}

impl Product {
    /// 创建已发布、无缩略图的产品
    pub fn new(id: impl Into<ProductId>, title: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            description: description.to_string(),
            thumbnail: None,
            status: PublishStatus::Published,
            edit_link: String::new(),
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<ImageRef>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_status(mut self, status: PublishStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_edit_link(mut self, edit_link: &str) -> Self {
        self.edit_link = edit_link.to_string();
        self
    }
}
