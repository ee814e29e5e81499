//! 文档重写模块
//!
//! 把序列化文档中每条资源引用的字面出现替换为其本地相对路径。
//! 替换是纯文本子串替换：每条不同的引用只处理一次（替换它的全部
//! 出现），避免同一引用同时出现在 href/src 和内联数据中时被二次
//! 替换。
//!
//! 应用顺序对每次运行必须确定：长引用优先，长度相同时保持发现
//! 顺序。一个引用可能是另一个引用的前缀，先替换短的会破坏长的。

/// 重写文档引用
///
/// `substitutions` 按发现顺序给出 (原始引用, 本地相对路径) 对。
/// 返回新的文档文本，原文不被修改。
pub fn rewrite_document(html: &str, substitutions: &[(String, String)]) -> String {
    let mut ordered: Vec<&(String, String)> = substitutions.iter().collect();
    // 稳定排序：长度相同的引用保持发现顺序
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut output = html.to_string();
    for (original, replacement) in ordered {
        if original.is_empty() {
            continue;
        }
        output = output.replace(original.as_str(), replacement);
    }

    output
}
