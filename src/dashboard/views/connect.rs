//! 数据库连接视图控制器

use crate::dashboard::api::ApiClient;
use crate::dashboard::error::{ClientError, ClientResult};
use crate::dashboard::session::ConnectionContext;
use crate::dashboard::types::ConnectRequest;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

/// 支持的数据库驱动
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DbType {
    #[default]
    PostgreSql,
    MySql,
    MongoDb,
}

impl DbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::PostgreSql => "postgresql",
            DbType::MySql => "mysql",
            DbType::MongoDb => "mongodb",
        }
    }

    pub fn default_port(&self) -> &'static str {
        match self {
            DbType::PostgreSql => "5432",
            DbType::MySql => "3306",
            DbType::MongoDb => "27017",
        }
    }

    /// MongoDB 允许无认证连接
    pub fn credentials_required(&self) -> bool {
        !matches!(self, DbType::MongoDb)
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(DbType::PostgreSql),
            "mysql" => Ok(DbType::MySql),
            "mongodb" | "mongo" => Ok(DbType::MongoDb),
            other => Err(ClientError::Validation(format!("不支持的数据库类型: {}", other))),
        }
    }
}

/// 连接表单
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectForm {
    db_type: DbType,
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ConnectForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectForm")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Default for ConnectForm {
    fn default() -> Self {
        Self::new(DbType::default())
    }
}

impl ConnectForm {
    pub fn new(db_type: DbType) -> Self {
        Self {
            db_type,
            host: String::new(),
            port: db_type.default_port().to_string(),
            database: String::new(),
            username: String::new(),
            password: String::new(),
        }
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }

    /// 切换驱动：端口重置为默认值，切到 MongoDB 时清空账号密码
    pub fn set_db_type(&mut self, db_type: DbType) {
        self.db_type = db_type;
        self.port = db_type.default_port().to_string();
        if db_type == DbType::MongoDb {
            self.username.clear();
            self.password.clear();
        }
    }

    /// 必填校验，失败时不会发请求
    pub fn validate(&self) -> ClientResult<()> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.port.trim().is_empty() {
            missing.push("port");
        }
        if self.database.trim().is_empty() {
            missing.push("database");
        }
        if self.db_type.credentials_required() {
            if self.username.trim().is_empty() {
                missing.push("username");
            }
            if self.password.is_empty() {
                missing.push("password");
            }
        }
        if !missing.is_empty() {
            return Err(ClientError::Validation(format!(
                "缺少必填字段: {}",
                missing.join(", ")
            )));
        }
        if self.port.trim().parse::<u16>().is_err() {
            return Err(ClientError::Validation(format!("端口无效: {}", self.port)));
        }
        Ok(())
    }

    fn to_request(&self) -> ConnectRequest {
        ConnectRequest {
            db_type: self.db_type.as_str().to_string(),
            host: self.host.trim().to_string(),
            port: self.port.trim().to_string(),
            database: self.database.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

pub struct ConnectView {
    api: Arc<ApiClient>,
}

impl ConnectView {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// 连接数据库，成功后持久化连接上下文
    pub async fn connect(&self, form: &ConnectForm) -> ClientResult<ConnectionContext> {
        form.validate()?;
        let request = form.to_request();
        info!(
            "[ConnectView] 🔌 连接 {} 数据库 {}:{}/{}",
            request.db_type, request.host, request.port, request.database
        );

        let response = self.api.connect_database(&request).await?;
        if response.tenant_id.is_empty() {
            error!("[ConnectView] 响应中没有 tenant_id: {:?}", response);
            let message = if response.message.is_empty() {
                "后端未返回 tenant_id".to_string()
            } else {
                response.message
            };
            return Err(ClientError::Request(message));
        }

        let ctx = ConnectionContext {
            tenant_id: response.tenant_id,
            db_type: request.db_type,
            host: request.host,
            port: request.port,
            database_name: request.database,
        };
        ctx.save(self.api.store().as_ref()).await?;
        info!(
            "[ConnectView] ✅ 已连接，tenant_id: {}，{}",
            ctx.tenant_id, response.message
        );
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::api::testing::{json_response, ScriptedTransport};
    use crate::dashboard::session::{keys, MemorySessionStore, SessionStore};
    use serde_json::json;

    fn filled_form() -> ConnectForm {
        let mut form = ConnectForm::default();
        form.host = "localhost".into();
        form.database = "shop".into();
        form.username = "postgres".into();
        form.password = "secret".into();
        form
    }

    #[test]
    fn switching_driver_resets_port_and_credentials() {
        let mut form = filled_form();
        assert_eq!(form.port, "5432");

        form.set_db_type(DbType::MySql);
        assert_eq!(form.port, "3306");
        assert_eq!(form.username, "postgres");

        form.set_db_type(DbType::MongoDb);
        assert_eq!(form.port, "27017");
        assert!(form.username.is_empty());
        assert!(form.password.is_empty());
        // MongoDB 不要求账号密码
        form.validate().unwrap();
    }

    #[test]
    fn validation_lists_missing_fields() {
        let form = ConnectForm::default();
        match form.validate() {
            Err(ClientError::Validation(msg)) => {
                assert!(msg.contains("host"));
                assert!(msg.contains("database"));
                assert!(msg.contains("username"));
            }
            other => panic!("unexpected: {:?}", other),
        }

        let mut form = filled_form();
        form.port = "abc".into();
        assert!(form.validate().is_err());
    }

    #[test]
    fn db_type_parsing() {
        assert_eq!("Postgres".parse::<DbType>().unwrap(), DbType::PostgreSql);
        assert_eq!("mongodb".parse::<DbType>().unwrap(), DbType::MongoDb);
        assert!("oracle".parse::<DbType>().is_err());
    }

    #[tokio::test]
    async fn connect_persists_context() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(
            "/connect-db",
            json_response(
                200,
                json!({"tenant_id": "t-123", "status": "connected", "message": "Connected"}),
            ),
        );
        let store = Arc::new(MemorySessionStore::new());
        let view = ConnectView::new(Arc::new(ApiClient::new(transport.clone(), store.clone())));

        let ctx = view.connect(&filled_form()).await.unwrap();
        assert_eq!(ctx.tenant_id, "t-123");
        assert_eq!(store.get(keys::TENANT_ID).await.as_deref(), Some("t-123"));
        assert_eq!(store.get(keys::DB_TYPE).await.as_deref(), Some("postgresql"));
        assert_eq!(store.get(keys::DB_PORT).await.as_deref(), Some("5432"));
        assert_eq!(store.get(keys::DB_NAME).await.as_deref(), Some("shop"));

        let body = match &transport.requests()[0].body {
            crate::dashboard::api::RequestBody::Json(v) => v.clone(),
            other => panic!("unexpected body: {:?}", other),
        };
        assert_eq!(body["db_type"], "postgresql");
        assert_eq!(body["database"], "shop");
    }

    #[tokio::test]
    async fn failed_connect_keeps_store_untouched() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(
            "/connect-db",
            json_response(
                400,
                json!({"detail": "Database connection failed. Check credentials and try again."}),
            ),
        );
        let store = Arc::new(MemorySessionStore::new());
        let view = ConnectView::new(Arc::new(ApiClient::new(transport, store.clone())));

        let err = view.connect(&filled_form()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Database connection failed. Check credentials and try again."
        );
        assert!(store.get(keys::TENANT_ID).await.is_none());
    }
}
