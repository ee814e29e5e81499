//! 资源获取模块
//!
//! 对每条已解析的引用取回原始字节：网络资源通过渲染驱动的 fetch
//! 能力获取，内联资源直接使用解析阶段解码好的载荷，不发起网络调用。
//!
//! 获取顺序没有内在依赖，可以并发执行；但所有获取（成功或记录为
//! 失败）必须在文档重写开始之前完成，重写是获取之后的硬屏障。

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::assets::resolver::{AssetError, AssetKind, AssetReference};
use crate::network::driver::RenderedPage;
use crate::snapshot::ErrorLog;

/// 获取完成的资源
///
/// 生命周期很短：由获取器创建，随即被快照写入器（落盘）和文档
/// 重写器（替换表条目）消费，运行结束后不再保留。
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub reference: AssetReference,
    pub bytes: Vec<u8>,
}

/// 资源获取器
///
/// 持有渲染好的页面会话，按发现顺序接收引用列表，并发取回字节。
/// 单个资源的失败只记录到错误日志，从不中止同级获取。
pub struct AssetFetcher<'a, P: RenderedPage> {
    page: &'a P,
    concurrency: usize,
}

impl<'a, P: RenderedPage> AssetFetcher<'a, P> {
    pub fn new(page: &'a P, concurrency: usize) -> Self {
        Self {
            page,
            concurrency: concurrency.max(1),
        }
    }

    /// 取回所有引用的字节
    ///
    /// 返回值保持发现顺序（重写阶段要求替换表顺序确定），内部
    /// 并发执行。函数返回即意味着屏障建立：每条引用要么成功，
    /// 要么已经记入错误日志。
    pub async fn fetch_all(
        &self,
        references: Vec<AssetReference>,
        error_log: &ErrorLog,
    ) -> Vec<FetchedAsset> {
        let mut indexed: Vec<(usize, FetchedAsset)> =
            stream::iter(references.into_iter().enumerate())
                .map(|(index, reference)| async move {
                    match self.fetch_one(&reference).await {
                        Ok(bytes) => {
                            debug!(
                                reference = %reference.raw,
                                file = %reference.local_file_name,
                                size = bytes.len(),
                                "asset fetched"
                            );
                            Some((index, FetchedAsset { reference, bytes }))
                        }
                        Err(error) => {
                            error_log
                                .record(reference.raw.clone(), error.to_string())
                                .await;
                            None
                        }
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect::<Vec<_>>()
                .await
                .into_iter()
                .flatten()
                .collect();

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, asset)| asset).collect()
    }

    /// 取回单条引用，至多尝试一次
    async fn fetch_one(&self, reference: &AssetReference) -> Result<Vec<u8>, AssetError> {
        match &reference.kind {
            AssetKind::InlineData(inline) => Ok(inline.payload.clone()),
            AssetKind::NetworkUrl { resolved } => {
                let fetch_error = |reason: String| AssetError::Fetch {
                    url: resolved.as_str().to_string(),
                    reason,
                };

                match self.page.fetch(resolved).await {
                    Ok(Some(response)) if response.is_success() => Ok(response.bytes),
                    Ok(Some(response)) => {
                        Err(fetch_error(format!("HTTP status {}", response.status)))
                    }
                    Ok(None) => Err(fetch_error("no response".to_string())),
                    Err(error) => Err(fetch_error(error.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::resolver::AssetKeyResolver;
    use crate::network::driver::{DriverError, FetchResponse};
    use crate::utils::url::Url;

    /// 由 (URL路径, 状态码, 字节) 表驱动的页面桩
    struct StubPage {
        responses: Vec<(&'static str, u16, Vec<u8>)>,
    }

    impl RenderedPage for StubPage {
        fn content(&self) -> &str {
            ""
        }

        fn discover_assets(&self) -> Vec<String> {
            Vec::new()
        }

        async fn fetch(&self, url: &Url) -> Result<Option<FetchResponse>, DriverError> {
            for (path, status, bytes) in &self.responses {
                if url.path() == *path {
                    return Ok(Some(FetchResponse {
                        status: *status,
                        bytes: bytes.clone(),
                    }));
                }
            }
            Ok(None)
        }
    }

    fn resolve_all(raw_references: &[&str]) -> Vec<AssetReference> {
        let base = Url::parse("https://example.com/").unwrap();
        let mut resolver = AssetKeyResolver::new();
        raw_references
            .iter()
            .map(|raw| resolver.resolve(raw, &base).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_discovery_order() {
        let page = StubPage {
            responses: vec![
                ("/a.css", 200, b"a".to_vec()),
                ("/b.js", 200, b"b".to_vec()),
                ("/c.png", 200, b"c".to_vec()),
            ],
        };
        let references = resolve_all(&["/a.css", "/b.js", "/c.png"]);
        let error_log = ErrorLog::new();

        let fetched = AssetFetcher::new(&page, 8)
            .fetch_all(references, &error_log)
            .await;

        let names: Vec<&str> = fetched
            .iter()
            .map(|asset| asset.reference.local_file_name.as_str())
            .collect();
        assert_eq!(names, vec!["a.css", "b.js", "c.png"]);
        assert_eq!(error_log.count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_and_error_responses_are_recorded_not_fatal() {
        let page = StubPage {
            responses: vec![
                ("/ok.css", 200, b"ok".to_vec()),
                ("/gone.js", 404, Vec::new()),
            ],
        };
        let references = resolve_all(&["/ok.css", "/gone.js", "/absent.png"]);
        let error_log = ErrorLog::new();

        let fetched = AssetFetcher::new(&page, 2)
            .fetch_all(references, &error_log)
            .await;

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].reference.local_file_name, "ok.css");
        assert_eq!(error_log.count().await, 2);
    }

    #[tokio::test]
    async fn test_inline_asset_needs_no_network() {
        let page = StubPage {
            responses: Vec::new(),
        };
        let references = resolve_all(&["data:text/plain,hello%20world"]);
        let error_log = ErrorLog::new();

        let fetched = AssetFetcher::new(&page, 1)
            .fetch_all(references, &error_log)
            .await;

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].bytes, b"hello world");
    }
}
