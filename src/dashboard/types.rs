//! 后端 REST 接口的请求/响应结构体
//!
//! 字段名与后端 JSON 一致（snake_case），后端可能缺省的字段一律给默认值。

use crate::dashboard::serialization::{deserialize_ordered_map, deserialize_string_or_number};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ========== 认证 ==========

/// 注册请求
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// 注册成功返回的账户信息
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

/// 登录请求（以表单编码发送，用户名即邮箱）
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 第三方登录请求
#[derive(Debug, Clone, Serialize)]
pub struct FederatedLoginRequest {
    pub token: String,
}

/// 登录/第三方登录返回的 token
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

// ========== 数据库连接 ==========

/// 连接数据库请求
#[derive(Clone, Serialize)]
pub struct ConnectRequest {
    pub db_type: String,
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// 连接数据库响应
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// 断开连接响应
#[derive(Debug, Clone, Deserialize)]
pub struct DisconnectResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

// ========== 提问 ==========

/// 自然语言提问请求
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    pub tenant_id: String,
    pub question: String,
}

/// 提问响应，后端可能只返回部分字段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Vec<Value>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub execution_time: String,
    #[serde(default)]
    pub cache_hit: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// ========== 健康检查与统计 ==========

/// 健康检查响应（全局或租户）
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
    /// 毫秒
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// 全局缓存统计
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CacheStats {
    #[serde(default)]
    pub hits: u64,
    #[serde(default)]
    pub misses: u64,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub hit_rate_percentage: f64,
    #[serde(default)]
    pub redis_available: bool,
    #[serde(default)]
    pub memory_cache_size: u64,
}

/// 租户统计
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TenantStats {
    #[serde(default)]
    pub hits: u64,
    #[serde(default)]
    pub misses: u64,
    #[serde(default)]
    pub total_queries: u64,
    #[serde(default)]
    pub hit_rate_percentage: f64,
    #[serde(default)]
    pub memory_cache_entries: u64,
    /// 后端暂未提供，存在时原样展示
    #[serde(default)]
    pub avg_latency: Option<String>,
}

/// 租户历史查询记录
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryItem {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub timestamp: String,
}

// ========== Schema 与图表 ==========

/// 列信息
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(default, rename = "type")]
    pub data_type: Option<String>,
}

/// 表结构
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

/// Schema 响应，`schema` 保持后端返回的表顺序
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaResponse {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub db_type: Option<String>,
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_ordered_map")]
    pub schema: Vec<(String, TableSchema)>,
}

/// 图表类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
}

/// 图表数据请求
#[derive(Debug, Clone, Serialize)]
pub struct ChartDataRequest {
    pub tenant_id: String,
    pub table_name: String,
    pub x_column: String,
    pub y_column: String,
    pub chart_type: ChartType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// 图表数据（x/y 两个序列）
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChartDataResponse {
    #[serde(default)]
    pub x: Vec<Value>,
    #[serde(default)]
    pub y: Vec<Value>,
}

/// 后端错误响应体
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// 提取 `detail` 文本；FastAPI 校验错误的 detail 是数组，原样转成 JSON 文本
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
