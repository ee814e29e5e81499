//! 可翻译单元收集器
//!
//! 用单一的DOM访问者把文档的可翻译表面收集为带标签变体的单元
//! 序列，取代按内容类别各写一遍遍历的做法。三类单元：
//!
//! - **Meta**: `meta[name=description|keywords]` 的 `content` 属性
//! - **ImgAlt**: `img` 的非空 `alt` 属性
//! - **Text**: 可见文本节点（排除 script/style/head/meta 的后代）
//!
//! 返回顺序固定为 meta → alt → text，每类内部保持文档顺序。

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::get_node_attr;

/// 可翻译单元的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCategory {
    /// meta 元数据属性
    Meta,
    /// 图像替代文本
    ImgAlt,
    /// 可见文本节点
    Text,
}

impl UnitCategory {
    /// 传给翻译能力的内容类型提示
    pub fn content_type_hint(&self) -> &'static str {
        match self {
            UnitCategory::Meta => "meta",
            UnitCategory::ImgAlt => "img",
            UnitCategory::Text => "element",
        }
    }
}

/// 文档树中一个位置的稳定标识
///
/// 持有节点句柄本身（属性单元另带属性名），应用译文时按节点身份
/// 写回，两个节点文本相同也不会张冠李戴。
#[derive(Debug, Clone)]
pub struct NodeLocator {
    pub node: Handle,
    pub attr: Option<String>,
}

/// 一个独立提交翻译的内容单元
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub locator: NodeLocator,
    pub category: UnitCategory,
    /// 原文，保留原始空白；发送前由编排器裁剪
    pub source_text: String,
}

impl TranslationUnit {
    fn for_attr(node: &Handle, attr: &str, category: UnitCategory, text: String) -> Self {
        Self {
            locator: NodeLocator {
                node: node.clone(),
                attr: Some(attr.to_string()),
            },
            category,
            source_text: text,
        }
    }

    fn for_text(node: &Handle, text: String) -> Self {
        Self {
            locator: NodeLocator {
                node: node.clone(),
                attr: None,
            },
            category: UnitCategory::Text,
            source_text: text,
        }
    }

    /// 错误日志中的单元标识
    pub fn describe(&self) -> String {
        let preview = truncate_for_log(self.source_text.trim());
        match self.category {
            UnitCategory::Meta => format!("meta content \"{preview}\""),
            UnitCategory::ImgAlt => format!("img alt \"{preview}\""),
            UnitCategory::Text => format!("text node \"{preview}\""),
        }
    }
}

fn truncate_for_log(text: &str) -> String {
    const MAX_CHARS: usize = 40;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{head}…")
    }
}

/// 收集文档的全部可翻译单元
///
/// 单次遍历，固定类别顺序 meta → alt → text 输出。
pub fn collect_translation_units(document: &Handle) -> Vec<TranslationUnit> {
    let mut sink = UnitSink::default();
    visit(document, false, &mut sink);

    let UnitSink { meta, alt, text } = sink;
    meta.into_iter().chain(alt).chain(text).collect()
}

#[derive(Default)]
struct UnitSink {
    meta: Vec<TranslationUnit>,
    alt: Vec<TranslationUnit>,
    text: Vec<TranslationUnit>,
}

fn visit(node: &Handle, in_excluded_subtree: bool, sink: &mut UnitSink) {
    match node.data {
        NodeData::Element { ref name, .. } => {
            let tag = name.local.as_ref();

            match tag {
                "meta" => {
                    if is_translatable_meta(node) {
                        if let Some(content) = get_node_attr(node, "content") {
                            if !content.trim().is_empty() {
                                sink.meta.push(TranslationUnit::for_attr(
                                    node,
                                    "content",
                                    UnitCategory::Meta,
                                    content,
                                ));
                            }
                        }
                    }
                }
                "img" => {
                    // 空 alt 不产生翻译调用（无操作，不是错误）
                    if let Some(alt) = get_node_attr(node, "alt") {
                        if !alt.trim().is_empty() {
                            sink.alt.push(TranslationUnit::for_attr(
                                node,
                                "alt",
                                UnitCategory::ImgAlt,
                                alt,
                            ));
                        }
                    }
                }
                _ => {}
            }

            let excluded =
                in_excluded_subtree || matches!(tag, "script" | "style" | "head" | "meta");
            for child_node in node.children.borrow().iter() {
                visit(child_node, excluded, sink);
            }
        }
        NodeData::Text { ref contents } => {
            if !in_excluded_subtree {
                let text = contents.borrow().to_string();
                if !text.trim().is_empty() {
                    sink.text.push(TranslationUnit::for_text(node, text));
                }
            }
        }
        _ => {
            for child_node in node.children.borrow().iter() {
                visit(child_node, in_excluded_subtree, sink);
            }
        }
    }
}

fn is_translatable_meta(node: &Handle) -> bool {
    get_node_attr(node, "name")
        .map(|name| {
            let name = name.to_lowercase();
            name == "description" || name == "keywords"
        })
        .unwrap_or(false)
}
