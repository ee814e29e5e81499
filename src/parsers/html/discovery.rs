//! 资源引用发现
//!
//! 按文档顺序收集页面引用的外部资源：样式表 link、带 src 的
//! script、img。选择器集合与浏览器端的发现脚本保持一致。去重
//! 以引用的原始字符串为准，保留首次出现的位置。

use std::collections::HashSet;

use markup5ever_rcdom::{Handle, NodeData};

use super::dom::get_node_attr;

/// 发现文档中的所有资源引用（文档顺序，按原始字符串去重）
pub fn discover_asset_references(document: &Handle) -> Vec<String> {
    let mut discovered: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    visit(document, &mut discovered, &mut seen);
    discovered
}

fn visit(node: &Handle, discovered: &mut Vec<String>, seen: &mut HashSet<String>) {
    if let NodeData::Element { ref name, .. } = node.data {
        let candidate = match name.local.as_ref() {
            "link" if is_stylesheet_link(node) => get_node_attr(node, "href"),
            "script" | "img" => get_node_attr(node, "src"),
            _ => None,
        };

        if let Some(reference) = candidate {
            if !reference.is_empty() && seen.insert(reference.clone()) {
                discovered.push(reference);
            }
        }
    }

    for child_node in node.children.borrow().iter() {
        visit(child_node, discovered, seen);
    }
}

fn is_stylesheet_link(node: &Handle) -> bool {
    get_node_attr(node, "rel")
        .map(|rel| {
            rel.split_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::html_to_dom;

    #[test]
    fn test_discovery_order_and_selector_set() {
        let html = br#"<html><head>
            <link rel="stylesheet" href="/css/site.css">
            <link rel="icon" href="/favicon.ico">
            <script src="/js/app.js"></script>
        </head><body>
            <img src="hero.png">
            <img src="data:image/gif;base64,R0lGODlhAQABAAAAACw=">
        </body></html>"#;
        let dom = html_to_dom(html, "utf-8".to_string());

        let references = discover_asset_references(&dom.document);
        assert_eq!(
            references,
            vec![
                "/css/site.css",
                "/js/app.js",
                "hero.png",
                "data:image/gif;base64,R0lGODlhAQABAAAAACw=",
            ]
        );
    }

    #[test]
    fn test_duplicate_references_reported_once() {
        let html = br#"<html><body>
            <img src="logo.png"><img src="logo.png">
        </body></html>"#;
        let dom = html_to_dom(html, "utf-8".to_string());

        let references = discover_asset_references(&dom.document);
        assert_eq!(references, vec!["logo.png"]);
    }

    #[test]
    fn test_inline_scripts_and_plain_links_are_ignored() {
        let html = br#"<html><head>
            <script>console.log("inline");</script>
            <link rel="preconnect" href="https://cdn.example.com">
        </head></html>"#;
        let dom = html_to_dom(html, "utf-8".to_string());

        assert!(discover_asset_references(&dom.document).is_empty());
    }
}
