//! 资源引用解析模块
//!
//! 把文档中出现的原始引用（绝对/相对 URL 或内联 data: 资源）映射为
//! 规范身份和稳定的本地文件名。解析是纯函数式的：除了格式错误检测
//! 之外没有失败模式，也没有任何 I/O。
//!
//! 去重身份是引用在文档中出现的原始字符串本身，因为重写阶段需要
//! 替换的正是这个字符串的每一次字面出现。

use std::collections::{HashMap, HashSet};

use base64::{prelude::BASE64_STANDARD, Engine};
use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::utils::url::{
    final_path_segment, is_data_url, payload_hash, resolve_url, url_hash, Url,
};

/// 单个资源解析或获取失败
///
/// 这些错误永远不会中止整个捕获运行：调用方把它们转换为错误日志
/// 记录，然后跳过对应的资源。
#[derive(Debug, Error)]
pub enum AssetError {
    /// 引用无法按相对 URL 规则解析
    #[error("malformed reference \"{reference}\": {source}")]
    MalformedReference {
        reference: String,
        source: url::ParseError,
    },

    /// data: 引用缺少逗号分隔符或媒体类型段损坏
    #[error("malformed data URL (missing comma separator)")]
    MalformedDataUrl,

    /// base64 载荷解码失败
    #[error("failed to decode inline payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// 网络资源获取失败（仅对该资源而言）
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

/// 内联 data: 资源的载荷编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineEncoding {
    Base64,
    Percent,
}

/// 从 data: 引用解析出的内联资源
#[derive(Debug, Clone)]
pub struct InlineDataAsset {
    pub media_type: String,
    pub encoding: InlineEncoding,
    pub payload: Vec<u8>,
}

impl InlineDataAsset {
    /// 解析一个 data: 引用
    ///
    /// 支持 base64 与百分号编码两种载荷形式。载荷先做百分号解码，
    /// base64 变体随后再解码一次。任何解码失败都只影响这一个资源。
    pub fn parse(reference: &str) -> Result<Self, AssetError> {
        let body = reference
            .trim_start()
            .strip_prefix("data:")
            .ok_or(AssetError::MalformedDataUrl)?;

        let (meta, raw_payload) = body.split_once(',').ok_or(AssetError::MalformedDataUrl)?;

        let mut media_type = String::new();
        let mut encoding = InlineEncoding::Percent;
        for (i, part) in meta.split(';').enumerate() {
            let part = part.trim();
            if i == 0 {
                media_type = part.to_lowercase();
            } else if part.eq_ignore_ascii_case("base64") {
                encoding = InlineEncoding::Base64;
            }
        }
        if media_type.is_empty() {
            // RFC 2397 default
            media_type = "text/plain".to_string();
        }

        let unescaped: Vec<u8> = percent_decode_str(raw_payload).collect();
        let payload = match encoding {
            InlineEncoding::Base64 => {
                let text = String::from_utf8_lossy(&unescaped);
                BASE64_STANDARD.decode(text.trim().as_bytes())?
            }
            InlineEncoding::Percent => unescaped,
        };

        Ok(InlineDataAsset {
            media_type,
            encoding,
            payload,
        })
    }

    /// 由载荷哈希和媒体类型推断出的本地文件名
    pub fn local_file_name(&self) -> String {
        format!(
            "inline_asset_{}.{}",
            payload_hash(&self.payload),
            file_extension_for_media_type(&self.media_type)
        )
    }
}

/// 资源引用的种类
#[derive(Debug, Clone)]
pub enum AssetKind {
    /// 网络资源，携带按基础 URL 解析后的规范绝对 URL
    NetworkUrl { resolved: Url },
    /// 内联 data: 资源，载荷已解码
    InlineData(InlineDataAsset),
}

/// 文档中发现的一条资源引用
///
/// `raw` 保留引用在文档里的原始写法，重写阶段按它做字面替换；
/// `local_file_name` 是该资源在 `assets/` 目录下的目标文件名。
#[derive(Debug, Clone)]
pub struct AssetReference {
    pub raw: String,
    pub kind: AssetKind,
    pub local_file_name: String,
}

/// 引用解析器
///
/// 在一次捕获运行内跟踪已分配的本地文件名，保证：
/// - 相同规范身份的引用复用同一个文件名（内容哈希去重）
/// - 路径末段为空或与已分配名字冲突时，退回到规范 URL 哈希派生的名字
#[derive(Debug, Default)]
pub struct AssetKeyResolver {
    used_names: HashSet<String>,
    by_identity: HashMap<String, String>,
}

impl AssetKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析一条原始引用
    ///
    /// 对相同的引用和基础 URL，结果是确定的：同一运行内重复调用
    /// 返回相同的文件名。
    pub fn resolve(&mut self, raw: &str, base_url: &Url) -> Result<AssetReference, AssetError> {
        if is_data_url(raw) {
            let inline = InlineDataAsset::parse(raw)?;
            let identity = format!("inline:{}", payload_hash(&inline.payload));
            let local_file_name = match self.by_identity.get(&identity) {
                // 哈希碰撞视为同一资源：复用文件名，不再重复写入
                Some(existing) => existing.clone(),
                None => {
                    let name = inline.local_file_name();
                    self.register(identity, name.clone());
                    name
                }
            };

            Ok(AssetReference {
                raw: raw.to_string(),
                kind: AssetKind::InlineData(inline),
                local_file_name,
            })
        } else {
            let resolved =
                resolve_url(base_url, raw).map_err(|source| AssetError::MalformedReference {
                    reference: raw.to_string(),
                    source,
                })?;
            let identity = resolved.as_str().to_string();
            let local_file_name = match self.by_identity.get(&identity) {
                Some(existing) => existing.clone(),
                None => {
                    let name = self.pick_network_name(&resolved);
                    self.register(identity, name.clone());
                    name
                }
            };

            Ok(AssetReference {
                raw: raw.to_string(),
                kind: AssetKind::NetworkUrl { resolved },
                local_file_name,
            })
        }
    }

    fn pick_network_name(&self, resolved: &Url) -> String {
        if let Some(segment) = final_path_segment(resolved) {
            if !self.used_names.contains(&segment) {
                return segment;
            }
            // 末段与先前分配的名字冲突：退回哈希名，保留扩展名
            let extension = segment
                .rsplit_once('.')
                .map(|(_, ext)| format!(".{ext}"))
                .unwrap_or_default();
            format!("asset_{}{}", url_hash(resolved.as_str()), extension)
        } else {
            format!("asset_{}", url_hash(resolved.as_str()))
        }
    }

    fn register(&mut self, identity: String, name: String) {
        self.used_names.insert(name.clone());
        self.by_identity.insert(identity, name);
    }
}

/// 由媒体类型推断文件扩展名
fn file_extension_for_media_type(media_type: &str) -> &'static str {
    match media_type {
        "text/css" => "css",
        "text/html" => "html",
        "text/plain" => "txt",
        "application/javascript" | "text/javascript" => "js",
        "application/json" => "json",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/x-icon" => "ico",
        "font/woff" => "woff",
        "font/woff2" => "woff2",
        "audio/mpeg" => "mp3",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_resolve_network_reference() {
        let mut resolver = AssetKeyResolver::new();
        let reference = resolver
            .resolve("https://example.com/style.css", &base())
            .unwrap();

        match &reference.kind {
            AssetKind::NetworkUrl { resolved } => {
                assert_eq!(resolved.as_str(), "https://example.com/style.css");
            }
            _ => panic!("expected network reference"),
        }
        assert_eq!(reference.local_file_name, "style.css");
    }

    #[test]
    fn test_resolver_is_idempotent() {
        let mut resolver = AssetKeyResolver::new();
        let first = resolver.resolve("/js/app.js", &base()).unwrap();
        let second = resolver.resolve("/js/app.js", &base()).unwrap();
        assert_eq!(first.local_file_name, second.local_file_name);
        assert_eq!(first.local_file_name, "app.js");
    }

    #[test]
    fn test_name_collision_falls_back_to_hash() {
        let mut resolver = AssetKeyResolver::new();
        let first = resolver.resolve("/a/style.css", &base()).unwrap();
        let second = resolver.resolve("/b/style.css", &base()).unwrap();

        assert_eq!(first.local_file_name, "style.css");
        assert!(second.local_file_name.starts_with("asset_"));
        assert!(second.local_file_name.ends_with(".css"));
        assert_ne!(first.local_file_name, second.local_file_name);
    }

    #[test]
    fn test_empty_path_segment_falls_back_to_hash() {
        let mut resolver = AssetKeyResolver::new();
        let reference = resolver.resolve("https://example.com/", &base()).unwrap();
        assert!(reference.local_file_name.starts_with("asset_"));
    }

    #[test]
    fn test_malformed_reference_is_an_error() {
        let mut resolver = AssetKeyResolver::new();
        assert!(resolver.resolve("https://[invalid", &base()).is_err());
    }

    #[test]
    fn test_inline_base64_round_trip() {
        let inline = InlineDataAsset::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(inline.media_type, "image/png");
        assert_eq!(inline.encoding, InlineEncoding::Base64);

        // Re-encoding the decoded payload must reproduce the original text
        let reencoded = BASE64_STANDARD.encode(&inline.payload);
        assert_eq!(reencoded, "iVBORw0KGgo=");
    }

    #[test]
    fn test_inline_file_name_shape() {
        let mut resolver = AssetKeyResolver::new();
        let reference = resolver
            .resolve("data:image/png;base64,iVBORw0KGgo=", &base())
            .unwrap();
        assert!(reference.local_file_name.starts_with("inline_asset_"));
        assert!(reference.local_file_name.ends_with(".png"));
    }

    #[test]
    fn test_inline_percent_encoded_payload() {
        let inline = InlineDataAsset::parse("data:text/plain,hello%20world").unwrap();
        assert_eq!(inline.encoding, InlineEncoding::Percent);
        assert_eq!(inline.payload, b"hello world");
    }

    #[test]
    fn test_inline_payload_dedup_by_content_hash() {
        let mut resolver = AssetKeyResolver::new();
        // 同一载荷通过不同引用出现：两者复用同一个文件名
        let a = resolver
            .resolve("data:image/png;base64,iVBORw0KGgo=", &base())
            .unwrap();
        let b = resolver
            .resolve("data:image/png;base64,iVBORw0KGgo%3D", &base())
            .unwrap();
        assert_eq!(a.local_file_name, b.local_file_name);
    }

    #[test]
    fn test_inline_without_comma_is_malformed() {
        assert!(InlineDataAsset::parse("data:image/png;base64").is_err());
    }

    #[test]
    fn test_inline_bad_base64_is_an_error() {
        assert!(InlineDataAsset::parse("data:image/png;base64,!!!not-base64!!!").is_err());
    }
}
