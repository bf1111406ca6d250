use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::product::{ImageRef, Product, ProductId, PublishStatus};
use crate::domain::scanner::{ProductSource, SourceError};

/// 默认的编辑链接模板
pub const DEFAULT_EDIT_LINK_TEMPLATE: &str = "/wp-admin/post.php?post={id}&action=edit";

/// 目录文件中的原始产品记录
///
/// 只有 `id` 必须可解码，其余字段类型不对时按缺失处理。
#[derive(Debug, Deserialize)]
struct RawProduct {
    id: ProductId,
    #[serde(default, deserialize_with = "lenient_text")]
    title: Option<String>,
    #[serde(default, alias = "content", deserialize_with = "lenient_text")]
    description: Option<String>,
    #[serde(default, alias = "thumbnail", deserialize_with = "lenient_image_ref")]
    thumbnail_id: Option<ImageRef>,
    #[serde(default, deserialize_with = "lenient_status")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    edit_link: Option<String>,
}

/// 非字符串的文本字段视为缺失
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// 缩略图只接受非负整数或字符串，`false`、`null` 等都表示没有图片
fn lenient_image_ref<'de, D>(deserializer: D) -> Result<Option<ImageRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().map(ImageRef::Numeric),
        Value::String(s) => Some(ImageRef::Text(s)),
        _ => None,
    })
}

/// 缺失或 `null` 的状态默认为已发布；其他非字符串状态视为未知状态，不参与扫描
fn lenient_status<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl RawProduct {
    fn into_product(self, edit_link_template: &str) -> Product {
        let edit_link = match self.edit_link {
            Some(link) if !link.trim().is_empty() => link,
            _ => build_edit_link(edit_link_template, &self.id),
        };

        Product {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            thumbnail: self.thumbnail_id,
            status: self
                .status
                .as_deref()
                .map(PublishStatus::from)
                .unwrap_or_default(),
            edit_link,
            id: self.id,
        }
    }
}

/// 根据模板生成编辑链接，`{id}` 替换为产品ID
pub fn build_edit_link(template: &str, id: &ProductId) -> String {
    template.replace("{id}", &id.to_string())
}

/// 被跳过的记录
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// 记录在目录中的位置 (从0开始)
    pub index: usize,
    pub reason: String,
}

/// JSON 产品目录文件
///
/// 文件内容可以是产品数组，也可以是 `{ "products": [...] }`。
pub struct JsonCatalogSource {
    path: PathBuf,
    edit_link_template: String,
    skipped: RefCell<Vec<SkippedRecord>>,
}

impl JsonCatalogSource {
    pub fn new(path: &Path, edit_link_template: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            edit_link_template: edit_link_template.to_string(),
            skipped: RefCell::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 目录文件大小 (字节)
    pub fn catalog_size(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|m| m.len())
    }

    /// 最近一次读取时跳过的记录
    pub fn skipped_records(&self) -> Vec<SkippedRecord> {
        self.skipped.borrow().clone()
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }

    fn parse_records(&self, content: &str) -> Result<Vec<Value>, SourceError> {
        let document: Value = serde_json::from_str(content).map_err(|e| SourceError::Parse {
            path: self.path_str(),
            message: e.to_string(),
        })?;

        match document {
            Value::Array(records) => Ok(records),
            Value::Object(mut map) => match map.remove("products") {
                Some(Value::Array(records)) => Ok(records),
                _ => Err(SourceError::Parse {
                    path: self.path_str(),
                    message: "缺少 products 数组".to_string(),
                }),
            },
            _ => Err(SourceError::Parse {
                path: self.path_str(),
                message: "目录必须是数组或包含 products 数组的对象".to_string(),
            }),
        }
    }
}

impl ProductSource for JsonCatalogSource {
    fn list_published_products(&self) -> Result<Vec<Product>, SourceError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path_str(),
            source,
        })?;

        let records = self.parse_records(&content)?;
        let mut skipped = Vec::new();
        let mut products = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<RawProduct>(record) {
                Ok(raw) => {
                    let product = raw.into_product(&self.edit_link_template);
                    if product.status.is_published() {
                        products.push(product);
                    }
                }
                Err(err) => skipped.push(SkippedRecord {
                    index,
                    reason: err.to_string(),
                }),
            }
        }

        *self.skipped.borrow_mut() = skipped;
        Ok(products)
    }
}

/// 内存中的产品列表
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    products: Vec<Product>,
}

impl InMemorySource {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

impl ProductSource for InMemorySource {
    fn list_published_products(&self) -> Result<Vec<Product>, SourceError> {
        Ok(self
            .products
            .iter()
            .filter(|p| p.status.is_published())
            .cloned()
            .collect())
    }
}
