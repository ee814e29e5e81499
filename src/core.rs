use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assets::{AssetFetcher, AssetKeyResolver, AssetReference};
use crate::network::driver::{DriverError, RenderDriver, RenderedPage};
use crate::parsers::html::{html_to_dom, serialize_document};
use crate::parsers::rewriter::rewrite_document;
use crate::snapshot::{ErrorLog, SnapshotWriter, ASSETS_DIR_NAME};
use crate::translation::{TranslationOrchestrator, Translator};
use crate::utils::url::{directory_name_for_url, Url};

/// File name of the asset-rewritten original document
pub const ORIGINAL_DOCUMENT_FILE_NAME: &str = "webpage.html";
/// File name of the translated variant
pub const TRANSLATED_DOCUMENT_FILE_NAME: &str = "webpage_translated.html";

/// Represents errors fatal to a whole capture run
///
/// Only two conditions abort a run: the page never rendered, or the
/// destination directory could not be created. Every per-item failure
/// (asset fetch, translation unit, single file write) is absorbed into
/// the run's error log instead.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("page failed to render: {0}")]
    Render(#[from] DriverError),

    #[error("could not create destination directory {path:?}: {source}")]
    Destination { path: PathBuf, source: io::Error },
}

/// Configuration options for a capture run
#[derive(Clone, Debug)]
pub struct CaptureOptions {
    /// Maximum concurrent asset fetches within a run
    pub asset_concurrency: usize,
    /// Maximum concurrent translation requests within a run
    pub translation_concurrency: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            asset_concurrency: 8,
            translation_concurrency: 4,
        }
    }
}

/// States of a capture run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Rendering,
    AssetDiscovery,
    AssetFetching,
    Rewriting,
    PersistingOriginal,
    Translating,
    PersistingTranslated,
    Done,
    Failed,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CaptureState::Rendering => "rendering",
            CaptureState::AssetDiscovery => "asset-discovery",
            CaptureState::AssetFetching => "asset-fetching",
            CaptureState::Rewriting => "rewriting",
            CaptureState::PersistingOriginal => "persisting-original",
            CaptureState::Translating => "translating",
            CaptureState::PersistingTranslated => "persisting-translated",
            CaptureState::Done => "done",
            CaptureState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Result of a completed capture run
#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub original_path: PathBuf,
    pub translated_path: PathBuf,
    pub error_count: usize,
}

/// The page capture pipeline
///
/// Composes rendering, asset resolution, document rewriting, persistence
/// and translation into one run. The render driver and the translator are
/// passed in as capabilities so tests can substitute deterministic stubs.
pub struct PageCapturePipeline<'a, D: RenderDriver, T: Translator> {
    driver: &'a D,
    translator: &'a T,
    options: CaptureOptions,
    state: CaptureState,
}

impl<'a, D: RenderDriver, T: Translator> PageCapturePipeline<'a, D, T> {
    pub fn new(driver: &'a D, translator: &'a T, options: CaptureOptions) -> Self {
        Self {
            driver,
            translator,
            options,
            state: CaptureState::Rendering,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    fn advance(&mut self, next: CaptureState) {
        debug!(from = %self.state, to = %next, "capture state");
        self.state = next;
    }

    /// 执行一次完整的捕获运行
    pub async fn run(
        &mut self,
        page_url: &Url,
        destination_root: &Path,
    ) -> Result<CaptureReport, CaptureError> {
        let error_log = ErrorLog::new();
        let destination = destination_root.join(directory_name_for_url(page_url));

        // 1. 渲染页面（每次运行恰好一个渲染会话）
        let page = match self.driver.render(page_url).await {
            Ok(page) => page,
            Err(error) => {
                self.advance(CaptureState::Failed);
                flush_best_effort(&error_log, &destination).await;
                return Err(CaptureError::Render(error));
            }
        };
        info!(url = %page_url, "page rendered");

        // 2. 发现并解析资源引用（文档顺序，按原始字符串去重）
        self.advance(CaptureState::AssetDiscovery);
        let mut resolver = AssetKeyResolver::new();
        let mut references: Vec<AssetReference> = Vec::new();
        for raw in page.discover_assets() {
            match resolver.resolve(&raw, page_url) {
                Ok(reference) => references.push(reference),
                Err(error) => error_log.record(raw, error.to_string()).await,
            }
        }
        info!(count = references.len(), "asset references resolved");

        // 3. 并发获取全部资源；本调用返回即形成重写前的硬屏障
        self.advance(CaptureState::AssetFetching);
        let fetched = AssetFetcher::new(&page, self.options.asset_concurrency)
            .fetch_all(references, &error_log)
            .await;

        // 4. 把成功获取的引用重写为本地相对路径
        self.advance(CaptureState::Rewriting);
        let substitutions: Vec<(String, String)> = fetched
            .iter()
            .map(|asset| {
                (
                    asset.reference.raw.clone(),
                    format!("{ASSETS_DIR_NAME}/{}", asset.reference.local_file_name),
                )
            })
            .collect();
        let original_document = rewrite_document(page.content(), &substitutions);

        // 5. 持久化资源与重写后的原始文档
        self.advance(CaptureState::PersistingOriginal);
        let writer = match SnapshotWriter::prepare(&destination).await {
            Ok(writer) => writer,
            Err(source) => {
                self.advance(CaptureState::Failed);
                flush_best_effort(&error_log, &destination).await;
                return Err(CaptureError::Destination {
                    path: destination,
                    source,
                });
            }
        };
        writer.write_assets(&fetched, &error_log).await;

        let original_path = writer.root().join(ORIGINAL_DOCUMENT_FILE_NAME);
        if let Err(error) = writer
            .write_document(ORIGINAL_DOCUMENT_FILE_NAME, original_document.as_bytes())
            .await
        {
            error_log
                .record(
                    ORIGINAL_DOCUMENT_FILE_NAME,
                    format!("failed to write: {error}"),
                )
                .await;
        }

        // 6. 翻译重写后的文档（单元失败保留原文）
        self.advance(CaptureState::Translating);
        let dom = html_to_dom(original_document.as_bytes(), "utf-8".to_string());
        let translated_dom =
            TranslationOrchestrator::new(self.translator, self.options.translation_concurrency)
                .translate_document(dom, &error_log)
                .await;

        // 7. 持久化翻译变体
        self.advance(CaptureState::PersistingTranslated);
        let translated_document = serialize_document(translated_dom, "utf-8".to_string());
        let translated_path = writer.root().join(TRANSLATED_DOCUMENT_FILE_NAME);
        if let Err(error) = writer
            .write_document(TRANSLATED_DOCUMENT_FILE_NAME, &translated_document)
            .await
        {
            error_log
                .record(
                    TRANSLATED_DOCUMENT_FILE_NAME,
                    format!("failed to write: {error}"),
                )
                .await;
        }

        // 8. 刷出错误日志并完成
        flush_best_effort(&error_log, &destination).await;
        let error_count = error_log.count().await;
        self.advance(CaptureState::Done);
        info!(
            destination = %writer.root().display(),
            errors = error_count,
            "capture finished"
        );

        Ok(CaptureReport {
            original_path,
            translated_path,
            error_count,
        })
    }
}

async fn flush_best_effort(error_log: &ErrorLog, destination: &Path) {
    if let Err(error) = error_log.flush(destination).await {
        warn!(%error, "could not flush error log");
    }
}

/// Captures a single page into `destination_root`
///
/// This is the crate's entry operation: render the page, localize its
/// assets, persist the rewritten original, then persist the translated
/// variant. Returns the paths of both documents and the number of
/// non-fatal errors recorded along the way.
pub async fn capture_page<D: RenderDriver, T: Translator>(
    driver: &D,
    translator: &T,
    page_url: &Url,
    destination_root: &Path,
    options: CaptureOptions,
) -> Result<CaptureReport, CaptureError> {
    PageCapturePipeline::new(driver, translator, options)
        .run(page_url, destination_root)
        .await
}
