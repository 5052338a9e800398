//! LLM 客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（Ollama、DeepSeek 等），通过 `base_url` 切换

use crate::config::LlmConfig;
use crate::error::AppError;
use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

/// 对话模型接口
///
/// 业务层只依赖这个接口，测试中可以替换为假模型。
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 发送单轮对话，返回去掉首尾空白的回复
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &LlmConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.model.clone(),
        }
    }

    /// 发送聊天请求
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容
    pub async fn chat(&self, user_message: &str, system_message: Option<&str>) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::llm(&self.model_name, "返回内容为空"))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.chat(prompt, None).await
    }
}
