// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持西班牙语（目录写回默认）、英文、中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 目录写回默认语言
pub const DEFAULT_LOCALE: &str = "es";

/// 可用语言列表
pub fn available_locales() -> Vec<String> {
    rust_i18n::available_locales!()
        .into_iter()
        .map(|l| l.to_string())
        .collect()
}

/// 判断语言是否可用
pub fn is_supported(locale: &str) -> bool {
    available_locales().iter().any(|l| l == locale)
}

/// 按指定语言翻译消息（带参数）
///
/// 不修改全局 locale，调用方显式传入语言
///
/// # 示例
/// ```no_run
/// use excel_loader::i18n::t_in;
/// let msg = t_in("es", "error.empty_table", &[("file", "ventas.xlsx")]);
/// ```
pub fn t_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key, locale = locale).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
