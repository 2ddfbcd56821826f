//! 提问视图控制器
//!
//! 一次提问：问题 → SQL → 结果。维护本次会话内最近 5 条提问记录（不持久化）。

use crate::dashboard::api::ApiClient;
use crate::dashboard::error::ClientResult;
use crate::dashboard::session::ConnectionContext;
use crate::dashboard::types::{AskRequest, AskResponse};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 历史记录上限
pub const HISTORY_LIMIT: usize = 5;

/// 新提问记录的时间标签
pub const JUST_NOW_LABEL: &str = "Just now";

/// 推荐问题
pub const SUGGESTIONS: &[&str] = &[
    "Show revenue by month",
    "Top 5 products by sales",
    "Compare last 2 years",
    "Users with no orders",
    "Average order value",
];

/// 一次提问的结果
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub sql: String,
    pub cached: bool,
    pub data: Vec<Value>,
    pub execution_time: String,
    /// 后端暂不提供置信度
    pub confidence: Option<u8>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// 结果表的列名（取第一行）
    pub fn columns(&self) -> Vec<String> {
        self.data
            .first()
            .and_then(Value::as_object)
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// 会话内的提问记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHistoryEntry {
    pub id: String,
    pub question: String,
    pub timestamp_label: String,
    pub cached: bool,
}

pub struct AskView {
    api: Arc<ApiClient>,
    tenant_id: Option<String>,
    question: String,
    loading: bool,
    result: Option<QueryResult>,
    error: Option<String>,
    /// 进行中的提问
    pending_question: Option<String>,
    history: VecDeque<QueryHistoryEntry>,
}

impl AskView {
    /// 挂载视图：读取当前租户
    pub async fn mount(api: Arc<ApiClient>) -> Self {
        let tenant_id = ConnectionContext::tenant_id(api.store().as_ref()).await;
        if tenant_id.is_none() {
            warn!("[AskView] 未连接数据库，提问不可用");
        }
        Self {
            api,
            tenant_id,
            question: String::new(),
            loading: false,
            result: None,
            error: None,
            pending_question: None,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    /// 选择推荐问题
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        match SUGGESTIONS.get(index) {
            Some(s) => {
                self.question = s.to_string();
                true
            }
            None => false,
        }
    }

    /// 重新填入一条历史提问
    pub fn rerun(&mut self, entry_id: &str) -> bool {
        match self.history.iter().find(|e| e.id == entry_id) {
            Some(entry) => {
                self.question = entry.question.clone();
                true
            }
            None => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&QueryResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 最近的提问，最新的在前
    pub fn history(&self) -> impl Iterator<Item = &QueryHistoryEntry> {
        self.history.iter()
    }

    /// 提交按钮是否可用
    pub fn can_submit(&self) -> bool {
        !self.loading && self.tenant_id.is_some() && !self.question.trim().is_empty()
    }

    /// 开始一次提交：进入加载状态并返回要发送的请求。
    ///
    /// 不满足提交条件（加载中、未连接、问题为空）时返回 None。
    /// 调用方发出请求后必须用 [`AskView::complete`] 结束本次提交；
    /// 两者之间 `is_loading()` 为 true，`can_submit()` 为 false。
    pub fn begin_submit(&mut self) -> Option<AskRequest> {
        if !self.can_submit() {
            return None;
        }
        let tenant_id = self.tenant_id.clone()?;
        let question = self.question.trim().to_string();

        self.loading = true;
        self.error = None;
        self.pending_question = Some(question.clone());
        info!("[AskView] ❓ 提问: {}", question);
        Some(AskRequest {
            tenant_id,
            question,
        })
    }

    /// 结束提交，写入结果或错误。没有进行中的提交时忽略。
    ///
    /// 调用失败时错误写入 `error()`，上一次的结果保持不变。
    pub fn complete(&mut self, response: ClientResult<AskResponse>) {
        let Some(question) = self.pending_question.take() else {
            warn!("[AskView] 没有进行中的提问，忽略响应");
            return;
        };
        self.loading = false;

        match response {
            Ok(resp) => {
                let result = QueryResult {
                    sql: resp.sql.unwrap_or_default(),
                    cached: resp.cache_hit,
                    data: resp.answer,
                    execution_time: resp.execution_time,
                    confidence: None,
                };
                info!(
                    "[AskView] ✅ 返回 {} 行，缓存命中: {}，耗时: {}",
                    result.row_count(),
                    result.cached,
                    result.execution_time
                );
                self.push_history(question, result.cached);
                self.result = Some(result);
                // 后端报告的错误与部分结果一起展示
                if let Some(err) = resp.error.filter(|e| !e.is_empty()) {
                    warn!("[AskView] 后端返回错误: {}", err);
                    self.error = Some(err);
                }
            }
            Err(e) => {
                error!("[AskView] 提问失败: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    /// 提交当前问题并等待结果。不满足提交条件时不发请求，返回 false。
    pub async fn submit(&mut self) -> bool {
        let Some(request) = self.begin_submit() else {
            return false;
        };
        let response = self.api.ask_question(&request).await;
        self.complete(response);
        true
    }

    fn push_history(&mut self, question: String, cached: bool) {
        self.history.push_front(QueryHistoryEntry {
            id: Uuid::new_v4().to_string(),
            question,
            timestamp_label: JUST_NOW_LABEL.to_string(),
            cached,
        });
        self.history.truncate(HISTORY_LIMIT);
    }
}
