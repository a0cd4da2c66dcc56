//! 词表替换模块
//!
//! 此模块负责：
//! - 维护运营人员维护的英语→乌尔都语词条替换表（大小写不敏感）
//! - 将输入文本切分为"词 / 分隔符"交替序列并做逐词替换
//! - 每次变更后将整张表原子地重写到磁盘

// 标准库导入
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::OnceLock;

// 第三方crate导入
use regex::Regex;
use tracing::{debug, warn};

// 本地模块导入
use crate::error::Result;
use crate::translation_error;

static WORD_REGEX: OnceLock<Regex> = OnceLock::new();

/// 词token匹配（Unicode字母数字与下划线的连续运行）
fn word_regex() -> &'static Regex {
    WORD_REGEX.get_or_init(|| Regex::new(r"\w+").unwrap())
}

/// 切分结果token
///
/// 按原始顺序拼接所有token必须逐字符还原输入，分隔符绝不丢失或重复。
#[derive(Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// 词token（参与词表查找）
    Word(&'a str),
    /// 非词token（空白/标点，原样透传）
    Separator(&'a str),
}

/// 将文本切分为词与分隔符的交替序列
pub fn segment(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for mat in word_regex().find_iter(text) {
        if mat.start() > cursor {
            tokens.push(Token::Separator(&text[cursor..mat.start()]));
        }
        tokens.push(Token::Word(mat.as_str()));
        cursor = mat.end();
    }

    if cursor < text.len() {
        tokens.push(Token::Separator(&text[cursor..]));
    }

    tokens
}

/// 逐词替换的结果片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substituted {
    /// 词表命中，已替换为映射值（保留映射值原有大小写）
    Mapped(String),
    /// 词表未命中，需要转交回退翻译器逐词处理
    Unmapped(String),
    /// 非词片段，原样透传
    Passthrough(String),
}

/// 词表存储
///
/// 键始终以小写形式存储，查找前对探测键做同样的归一化。
/// 进程启动时从磁盘加载一次；每次add/delete同步重写整个文件。
#[derive(Debug)]
pub struct MappingStore {
    /// 存储文件路径；None表示纯内存表（测试用）
    path: Option<PathBuf>,
    entries: HashMap<String, String>,
}

impl MappingStore {
    /// 从磁盘加载词表
    ///
    /// 文件缺失或解析失败都不是致命错误：记录警告并使用空表。
    pub fn load<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(parsed) => {
                    // 归一化：历史文件中可能存在非小写键
                    let normalized: HashMap<String, String> = parsed
                        .into_iter()
                        .map(|(k, v)| (k.to_lowercase(), v))
                        .collect();
                    debug!("📖 词表加载完成: {} 项 ({})", normalized.len(), path.display());
                    normalized
                }
                Err(e) => {
                    warn!("⚠️  词表文件解析失败，使用空表: {}", e);
                    HashMap::new()
                }
            },
            Err(_) => {
                debug!("词表文件不存在，使用空表: {}", path.display());
                HashMap::new()
            }
        };

        Self {
            path: Some(path),
            entries,
        }
    }

    /// 创建纯内存词表（不持久化）
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: HashMap::new(),
        }
    }

    /// 查找词条（大小写不敏感）
    pub fn lookup(&self, term: &str) -> Option<&str> {
        self.entries.get(&term.to_lowercase()).map(|s| s.as_str())
    }

    /// 新增或更新词条，随后同步持久化整张表
    pub fn upsert(&mut self, term: &str, target: &str) -> Result<()> {
        self.entries
            .insert(term.to_lowercase(), target.to_string());
        self.persist()
    }

    /// 删除词条
    ///
    /// 词条存在时删除并持久化，返回true；不存在时返回false且表保持不变。
    pub fn remove(&mut self, term: &str) -> Result<bool> {
        if self.entries.remove(&term.to_lowercase()).is_some() {
            self.persist()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// 词条数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 获取整表快照（稳定排序，供HTTP层返回）
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// 对输入文本做逐词替换
    ///
    /// 词token按大小写不敏感规则查表：命中则替换为映射值；未命中标记为
    /// Unmapped，由调用方逐词转交回退翻译器。非词token原样透传。
    pub fn substitute(&self, text: &str) -> Vec<Substituted> {
        segment(text)
            .into_iter()
            .map(|token| match token {
                Token::Word(word) => match self.lookup(word) {
                    Some(mapped) => Substituted::Mapped(mapped.to_string()),
                    None => Substituted::Unmapped(word.to_string()),
                },
                Token::Separator(sep) => Substituted::Passthrough(sep.to_string()),
            })
            .collect()
    }

    /// 将整张表原子地重写到磁盘
    ///
    /// 先写入同目录下的临时文件再rename覆盖，避免半写状态。
    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let payload = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| translation_error!(mapping, path.display(), e))?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload.as_bytes())
            .map_err(|e| translation_error!(mapping, tmp_path.display(), e))?;
        std::fs::rename(&tmp_path, path)
            .map_err(|e| translation_error!(mapping, path.display(), e))?;

        debug!("💾 词表已持久化: {} 项", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(segments: &[Substituted]) -> String {
        segments
            .iter()
            .map(|s| match s {
                Substituted::Mapped(t) | Substituted::Unmapped(t) | Substituted::Passthrough(t) => {
                    t.as_str()
                }
            })
            .collect()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut store = MappingStore::in_memory();
        store.upsert("House", "گھر").unwrap();
        assert_eq!(store.lookup("HOUSE"), Some("گھر"));
        assert_eq!(store.lookup("house"), Some("گھر"));
        assert_eq!(store.lookup("House"), Some("گھر"));
    }

    #[test]
    fn test_remove_is_idempotent_in_effect() {
        let mut store = MappingStore::in_memory();
        store.upsert("street", "گلی").unwrap();

        // 删除不存在的键：报告缺失且表不变
        assert!(!store.remove("absent").unwrap());
        assert_eq!(store.len(), 1);

        // 删除存在的键，再次删除报告缺失
        assert!(store.remove("STREET").unwrap());
        assert!(!store.remove("street").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_segment_round_trip() {
        let inputs = [
            "Mohalla Aminabad, Near Masjid",
            "  leading and trailing  ",
            "no-punct",
            "،اردو متن؛ mixed!",
            "",
            "!!!",
        ];
        for input in inputs {
            let joined: String = segment(input)
                .into_iter()
                .map(|t| match t {
                    Token::Word(s) | Token::Separator(s) => s,
                })
                .collect();
            assert_eq!(joined, input, "分隔符不得丢失或重复");
        }
    }

    #[test]
    fn test_substitute_preserves_structure() {
        let mut store = MappingStore::in_memory();
        store.upsert("mohalla", "محلہ").unwrap();

        let segments = store.substitute("Mohalla Aminabad, Near Masjid");
        assert_eq!(
            segments[0],
            Substituted::Mapped("محلہ".to_string())
        );
        assert_eq!(
            segments[2],
            Substituted::Unmapped("Aminabad".to_string())
        );
        // 标点与空白原样保留
        assert_eq!(
            segments[3],
            Substituted::Passthrough(", ".to_string())
        );
        assert_eq!(reassemble(&segments), "محلہ Aminabad, Near Masjid");
    }

    #[test]
    fn test_substitute_all_mapped_needs_no_fallback() {
        let mut store = MappingStore::in_memory();
        store.upsert("near", "قریب").unwrap();
        store.upsert("masjid", "مسجد").unwrap();

        let segments = store.substitute("Near Masjid");
        assert!(segments
            .iter()
            .all(|s| !matches!(s, Substituted::Unmapped(_))));
    }

    #[test]
    fn test_mapped_value_casing_preserved() {
        let mut store = MappingStore::in_memory();
        store.upsert("uet", "UET Lahore").unwrap();
        let segments = store.substitute("uet");
        assert_eq!(segments[0], Substituted::Mapped("UET Lahore".to_string()));
    }

    #[test]
    fn test_load_missing_file_yields_empty_table() {
        let path = std::env::temp_dir().join("mapping_test_missing_12345.json");
        let _ = std::fs::remove_file(&path);
        let store = MappingStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn test_persist_and_reload() {
        let path = std::env::temp_dir().join("mapping_test_persist.json");
        let _ = std::fs::remove_file(&path);

        {
            let mut store = MappingStore::load(&path);
            store.upsert("Bazaar", "بازار").unwrap();
            store.upsert("road", "سڑک").unwrap();
        }

        let reloaded = MappingStore::load(&path);
        assert_eq!(reloaded.len(), 2);
        // 键以小写形式持久化
        assert_eq!(reloaded.lookup("bazaar"), Some("بازار"));

        // 临时文件不残留
        assert!(!path.with_extension("json.tmp").exists());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_corrupt_file_yields_empty_table() {
        let path = std::env::temp_dir().join("mapping_test_corrupt.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let store = MappingStore::load(&path);
        assert!(store.is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
