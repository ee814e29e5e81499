//! 翻译能力接口与HTTP实现
//!
//! `Translator` 是管线消费的能力接口：单条文本进、单条译文出。
//! 测试中用确定性桩替换；生产实现 `HttpTranslator` 调用 chat
//! completions 风格的远程服务。配置从环境变量读取。

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译能力
///
/// 一次调用翻译一个单元。失败以 `Err` 区别于合法的空串译文。
pub trait Translator {
    async fn translate(
        &self,
        text: &str,
        content_type_hint: Option<&str>,
    ) -> TranslationResult<String>;
}

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TARGET_LANGUAGE: &str = "Spanish";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = "You are a website copy translator. \
Provide only the translation. Do not ask for clarity or offer suggestions. \
If a word doesn't appear to have a translation leave it as is.";

/// HTTP翻译服务配置
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub target_language: String,
    pub request_timeout: Duration,
}

impl TranslatorConfig {
    /// 从环境变量加载配置
    ///
    /// `PAGELITH_TRANSLATION_API_KEY` 必填；`PAGELITH_TRANSLATION_API_URL`、
    /// `PAGELITH_TRANSLATION_MODEL`、`PAGELITH_TARGET_LANG` 有默认值。
    pub fn from_env() -> TranslationResult<Self> {
        let api_key = env::var("PAGELITH_TRANSLATION_API_KEY").map_err(|_| {
            TranslationError::Config("PAGELITH_TRANSLATION_API_KEY is not set".to_string())
        })?;

        Ok(Self {
            api_url: env::var("PAGELITH_TRANSLATION_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key,
            model: env::var("PAGELITH_TRANSLATION_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            target_language: env::var("PAGELITH_TARGET_LANG")
                .unwrap_or_else(|_| DEFAULT_TARGET_LANGUAGE.to_string()),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// 调用 chat completions 协议的翻译实现
pub struct HttpTranslator {
    client: reqwest::Client,
    config: TranslatorConfig,
}

impl HttpTranslator {
    pub fn new(config: TranslatorConfig) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| TranslationError::Config(error.to_string()))?;

        Ok(Self { client, config })
    }
}

impl Translator for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        content_type_hint: Option<&str>,
    ) -> TranslationResult<String> {
        debug!(
            content_type = content_type_hint.unwrap_or("unspecified"),
            chars = text.chars().count(),
            "translating unit"
        );

        let user_message = format!(
            "Translate the following text to {}: {}",
            self.config.target_language, text
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|error| TranslationError::Network(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(TranslationError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|error| TranslationError::InvalidResponse(error.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TranslationError::InvalidResponse("no choices in response".to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}
