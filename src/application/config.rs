use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::product::ImageRef;
use crate::domain::scanner::{
    LengthUnit, PlaceholderText, ScanSettings, DEFAULT_MIN_DESCRIPTION_LENGTH, DEFAULT_PLACEHOLDER_PHRASES,
};
use crate::infrastructure::catalog::DEFAULT_EDIT_LINK_TEMPLATE;

/// 应用程序配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 扫描相关配置
    pub scan: ScanConfig,
    /// 占位文本配置
    pub text: TextConfig,
    /// 产品目录配置
    pub catalog: CatalogConfig,
    /// 显示相关配置
    pub display: DisplayConfig,
}

/// 扫描配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// 占位图ID，留空表示未配置
    #[serde(default)]
    pub placeholder_image_id: String,
    /// 描述最短长度，低于此值视为过短
    pub min_description_length: usize,
    /// 长度计量单位: "chars" 或 "bytes"
    pub length_unit: LengthUnit,
}

/// 占位文本配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// 视为占位文本的短语 (忽略大小写)
    pub placeholder_phrases: Vec<String>,
}

/// 产品目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// 默认的产品目录文件
    pub default_catalog_path: String,
    /// 编辑链接模板，`{id}` 替换为产品ID
    pub edit_link_template: String,
}

/// 显示配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// 标题最大显示长度
    pub max_title_length: usize,
    /// 是否使用彩色输出
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig {
                placeholder_image_id: String::new(),
                min_description_length: DEFAULT_MIN_DESCRIPTION_LENGTH,
                length_unit: LengthUnit::Chars,
            },
            text: TextConfig {
                placeholder_phrases: DEFAULT_PLACEHOLDER_PHRASES.iter().map(|p| p.to_string()).collect(),
            },
            catalog: CatalogConfig {
                default_catalog_path: "products.json".to_string(),
                edit_link_template: DEFAULT_EDIT_LINK_TEMPLATE.to_string(),
            },
            display: DisplayConfig {
                max_title_length: 60,
                color: true,
            },
        }
    }
}

impl Config {
    /// 从配置文件加载配置，如果文件不存在则创建默认配置文件
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load_from_file(config_path)
        } else {
            let config = Self::default();
            config.save_to_file(config_path)?;
            eprintln!("已创建默认配置文件: {}", config_path.display());
            Ok(config)
        }
    }

    /// 从文件加载配置
    pub fn load_from_file(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("无法读取配置文件: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", config_path.display()))?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("无法序列化配置")?;

        fs::write(config_path, content)
            .with_context(|| format!("无法写入配置文件: {}", config_path.display()))?;

        Ok(())
    }

    /// 获取配置文件的默认路径 (程序所在目录下的 config.toml)
    pub fn default_config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("无法获取程序路径")?;

        let exe_dir = exe_path.parent().context("无法获取程序目录")?;

        Ok(exe_dir.join("config.toml"))
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.scan.min_description_length == 0 || self.scan.min_description_length > 100_000 {
            anyhow::bail!("min_description_length 必须在 1-100000 之间");
        }

        if self.text.placeholder_phrases.iter().all(|p| p.trim().is_empty()) {
            anyhow::bail!("placeholder_phrases 至少需要一个非空短语");
        }

        if !self.catalog.edit_link_template.contains("{id}") {
            anyhow::bail!("edit_link_template 必须包含 {{id}}");
        }

        if self.display.max_title_length < 10 {
            anyhow::bail!("max_title_length 不能小于 10");
        }

        Ok(())
    }

    /// 配置的占位图ID，空值表示未配置
    pub fn placeholder_image_id(&self) -> Option<ImageRef> {
        let raw = self.scan.placeholder_image_id.trim();
        if raw.is_empty() {
            None
        } else {
            Some(ImageRef::parse(raw))
        }
    }

    /// 生成扫描设置
    pub fn scan_settings(&self) -> Result<ScanSettings> {
        Ok(ScanSettings {
            placeholder_image_id: self.placeholder_image_id(),
            min_description_length: self.scan.min_description_length,
            length_unit: self.scan.length_unit,
            placeholder_text: PlaceholderText::new(self.text.placeholder_phrases.as_slice())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.min_description_length, 200);
        assert_eq!(config.scan.length_unit, LengthUnit::Chars);
        assert!(config.placeholder_image_id().is_none());
        assert_eq!(config.text.placeholder_phrases, vec!["lorem ipsum", "placeholder"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.scan.length_unit = LengthUnit::Bytes;
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("length_unit = \"bytes\""));

        let deserialized: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.scan.length_unit, LengthUnit::Bytes);
        assert_eq!(config.catalog.edit_link_template, deserialized.catalog.edit_link_template);
    }

    #[test]
    fn test_config_file_operations() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let created = Config::load_or_create(&config_path).unwrap();
        assert!(config_path.exists());

        let mut modified = created.clone();
        modified.scan.placeholder_image_id = "42".to_string();
        modified.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.placeholder_image_id(), Some(ImageRef::Numeric(42)));
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[scan]\nmin_description_length = \"many\"\n").unwrap();

        assert!(Config::load_from_file(&config_path).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.scan.min_description_length = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.text.placeholder_phrases = vec![" ".to_string()];
        assert!(config.validate().is_err());

        config = Config::default();
        config.catalog.edit_link_template = "/edit".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.display.max_title_length = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scan_settings_from_config() {
        let mut config = Config::default();
        config.scan.placeholder_image_id = " img42 ".to_string();
        config.text.placeholder_phrases.push("coming soon".to_string());

        let settings = config.scan_settings().unwrap();
        assert_eq!(settings.placeholder_image_id, Some(ImageRef::from("img42")));
        assert!(settings.placeholder_text.contains_phrase("Coming Soon!"));
        assert!(settings.placeholder_text.contains_phrase("lorem IPSUM"));
    }
}
