// i18n.rs — 运行时界面文本
//
// 文本表格式: { "<lang>": { "key": "value" } }
// - 内置表: assets/i18n.json (编译进二进制)
// - 覆盖表: <exe_dir>/assets/i18n.json 或 ./assets/i18n.json，存在时优先
// - 查找顺序: 当前语言 -> zh-Hans -> key 本身

use log::{debug, warn};
use once_cell::sync::OnceCell;
use pano_sphere::ViewMode;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const FALLBACK_LANG: &str = "zh-Hans";

/// Languages offered in the menu: (code, native name).
pub const LANGUAGES: [(&str, &str); 4] = [
    ("zh-Hans", "简体中文"),
    ("zh-Hant", "繁體中文"),
    ("en", "English"),
    ("ja", "日本語"),
];

const BUILTIN_TABLE: &str = include_str!("../assets/i18n.json");

type Table = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone, Default)]
struct I18n {
    map: HashMap<String, String>,
    fallback_map: HashMap<String, String>,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn parse_table(text: &str) -> Option<Table> {
    match serde_json::from_str(text) {
        Ok(t) => Some(t),
        Err(e) => {
            warn!("invalid i18n table: {e}");
            None
        }
    }
}

fn find_override_file() -> Option<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    exe_dir
        .into_iter()
        .chain(std::iter::once(PathBuf::new()))
        .map(|dir| dir.join("assets").join("i18n.json"))
        .find(|p| p.exists())
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    if let Some(path) = find_override_file() {
        let table = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| parse_table(&text));
        if let Some(map) = table.and_then(|mut t| t.remove(lang)) {
            debug!("i18n: {lang} from {}", path.display());
            return map;
        }
    }

    parse_table(BUILTIN_TABLE)
        .and_then(|mut t| t.remove(lang))
        .unwrap_or_else(|| {
            warn!("i18n: no strings for language '{lang}'");
            HashMap::new()
        })
}

/// Select the UI language. Later calls replace the active tables.
pub fn init(lang: &str) {
    let map = load_lang(lang);
    let fallback_map = if lang == FALLBACK_LANG {
        map.clone()
    } else {
        load_lang(FALLBACK_LANG)
    };
    let next = I18n { map, fallback_map };

    // 并发首次初始化时也只会有一份表，随后统一写入
    let lock = I18N.get_or_init(|| RwLock::new(I18n::default()));
    if let Ok(mut w) = lock.write() {
        *w = next;
    }
}

/// Localized text for `key`; the key itself when no table has it.
pub fn tr(key: &str) -> String {
    let Some(i) = I18N.get().and_then(|l| l.read().ok()) else {
        return key.to_string();
    };

    i.map
        .get(key)
        .or_else(|| i.fallback_map.get(key))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

pub fn mode_label(mode: ViewMode) -> String {
    tr(&format!("mode.{}", mode.name()))
}
