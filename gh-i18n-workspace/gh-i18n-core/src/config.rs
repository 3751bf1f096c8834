use anyhow::{Context, Result};
use lexicon::{Policy, SUPPORTED_LOCALES};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub locale: LocaleConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

impl CoreConfig {
    /// Read `path`, or fall back to the defaults when it does not exist.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let mut cfg = if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str::<CoreConfig>(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            tracing::info!(
                "No config file found at {}. Using CoreConfig::default().",
                path.display()
            );
            CoreConfig::default()
        };
        if let Some(root) = path.parent() {
            cfg.resolve_paths(root);
        }
        Ok(cfg)
    }

    fn resolve_paths(&mut self, root: &Path) {
        if let Some(dir) = &self.locale.resources_dir {
            self.locale.resources_dir = Some(absolutize(root, dir));
        }
    }
}

fn absolutize(root: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Host language tag. Unset means "ask the operating system".
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "LocaleConfig::default_supported")]
    pub supported: Vec<String>,
    /// Directory of `<tag>.json` locale documents; embedded locales fill the gaps.
    #[serde(default)]
    pub resources_dir: Option<PathBuf>,
}

impl LocaleConfig {
    fn default_supported() -> Vec<String> {
        SUPPORTED_LOCALES.iter().map(|s| s.to_string()).collect()
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: None,
            supported: Self::default_supported(),
            resources_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Merge the lists below into the built-in blocklists instead of replacing them.
    #[serde(default = "PolicyConfig::default_extend")]
    pub extend: bool,
    #[serde(default)]
    pub blocked_tags: Vec<String>,
    #[serde(default)]
    pub blocked_ids: Vec<String>,
    #[serde(default)]
    pub blocked_classes: Vec<String>,
    #[serde(default)]
    pub blocked_itemprops: Vec<String>,
}

impl PolicyConfig {
    fn default_extend() -> bool {
        true
    }

    pub fn to_policy(&self) -> Policy {
        let listed = Policy {
            blocked_tags: self.blocked_tags.iter().cloned().collect(),
            blocked_ids: self.blocked_ids.iter().cloned().collect(),
            blocked_classes: self.blocked_classes.iter().cloned().collect(),
            blocked_itemprops: self.blocked_itemprops.iter().cloned().collect(),
        };
        if self.extend {
            let mut policy = Policy::default();
            policy.extend(listed);
            policy
        } else {
            listed
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            extend: Self::default_extend(),
            blocked_tags: vec![],
            blocked_ids: vec![],
            blocked_classes: vec![],
            blocked_itemprops: vec![],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "TranslatorConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "TranslatorConfig::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "TranslatorConfig::default_region_selector")]
    pub region_selector: String,
    #[serde(default = "TranslatorConfig::default_affordance_id")]
    pub affordance_id: String,
    #[serde(default = "TranslatorConfig::default_label")]
    pub label: String,
    #[serde(default = "TranslatorConfig::default_attribution_html")]
    pub attribution_html: String,
    #[serde(default = "TranslatorConfig::default_failure_message")]
    pub failure_message: String,
    #[serde(default = "TranslatorConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TranslatorConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_endpoint() -> String {
        "https://www.githubs.cn/translate".to_string()
    }
    fn default_region_selector() -> String {
        ".repository-content .f4".to_string()
    }
    fn default_affordance_id() -> String {
        "translate-me".to_string()
    }
    fn default_label() -> String {
        "翻译".to_string()
    }
    fn default_attribution_html() -> String {
        "<span style='font-size: small'>由 <a target='_blank' style='color:rgb(27, 149, 224);' href='https://www.githubs.cn'>GitHub中文社区</a> 翻译👇</span>".to_string()
    }
    fn default_failure_message() -> String {
        "翻译失败".to_string()
    }
    fn default_timeout_secs() -> u64 {
        10
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            endpoint: Self::default_endpoint(),
            region_selector: Self::default_region_selector(),
            affordance_id: Self::default_affordance_id(),
            label: Self::default_label(),
            attribution_html: Self::default_attribution_html(),
            failure_message: Self::default_failure_message(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Upper bound on mutation batches delivered per pump.
    #[serde(default = "WatchConfig::default_max_batches")]
    pub max_batches: usize,
}

impl WatchConfig {
    fn default_max_batches() -> usize {
        32
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            max_batches: Self::default_max_batches(),
        }
    }
}
