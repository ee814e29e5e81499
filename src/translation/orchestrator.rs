//! 翻译编排器
//!
//! 对收集到的单元逐条调用翻译能力，再把译文写回文档树。两个阶段
//! 严格分离：纯文本的翻译请求有界并发执行（`buffered` 保持提交
//! 顺序），写回阶段按文档顺序串行进行，因此并发不可能让同一节点
//! 的写入交错。
//!
//! 单个单元失败时保留原文并记录错误，从不中止整个翻译过程。

use futures::stream::{self, StreamExt};
use markup5ever_rcdom::{NodeData, RcDom};
use tracing::info;

use crate::parsers::html::set_node_attr;
use crate::snapshot::ErrorLog;
use crate::translation::collector::{collect_translation_units, TranslationUnit};
use crate::translation::service::Translator;

/// 翻译编排器
pub struct TranslationOrchestrator<'a, T: Translator> {
    translator: &'a T,
    concurrency: usize,
}

impl<'a, T: Translator> TranslationOrchestrator<'a, T> {
    pub fn new(translator: &'a T, concurrency: usize) -> Self {
        Self {
            translator,
            concurrency: concurrency.max(1),
        }
    }

    /// 翻译整个文档树
    ///
    /// 输入被消费、输出是新值：失败的单元保留原文，文档结构不变。
    pub async fn translate_document(&self, dom: RcDom, error_log: &ErrorLog) -> RcDom {
        let units = collect_translation_units(&dom.document);
        if units.is_empty() {
            return dom;
        }

        // 阶段一：只携带 (序号, 裁剪后的原文, 提示) 进入并发区，
        // 节点句柄留在本线程
        let requests: Vec<(usize, String, &'static str)> = units
            .iter()
            .enumerate()
            .map(|(index, unit)| {
                (
                    index,
                    unit.source_text.trim().to_string(),
                    unit.category.content_type_hint(),
                )
            })
            .collect();

        let results: Vec<(usize, Result<String, _>)> = stream::iter(requests)
            .map(|(index, text, hint)| async move {
                let result = self.translator.translate(&text, Some(hint)).await;
                (index, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        // 阶段二：按文档顺序串行写回
        let mut translated_count = 0usize;
        let mut failed_count = 0usize;
        for (index, result) in results {
            let unit = &units[index];
            match result {
                Ok(translated) => {
                    apply_translation(unit, &translated);
                    translated_count += 1;
                }
                Err(error) => {
                    failed_count += 1;
                    error_log.record(unit.describe(), error.to_string()).await;
                }
            }
        }

        info!(
            translated = translated_count,
            failed = failed_count,
            "document translation finished"
        );

        dom
    }
}

/// 把一条译文写回其单元指向的节点
///
/// 属性单元整体替换属性值；文本单元只替换裁剪后的核心，保留原有
/// 的首尾空白（对布局有意义）。
fn apply_translation(unit: &TranslationUnit, translated: &str) {
    match &unit.locator.attr {
        Some(attr_name) => {
            set_node_attr(&unit.locator.node, attr_name, Some(translated.to_string()));
        }
        None => {
            if let NodeData::Text { ref contents } = unit.locator.node.data {
                let mut tendril = contents.borrow_mut();
                let replaced = replace_trimmed(&tendril.to_string(), translated);
                tendril.clear();
                tendril.push_slice(&replaced);
            }
        }
    }
}

fn replace_trimmed(original: &str, replacement: &str) -> String {
    let leading_len = original.len() - original.trim_start().len();
    let trailing_start = original.trim_end().len();
    format!(
        "{}{}{}",
        &original[..leading_len],
        replacement,
        &original[trailing_start..]
    )
}
