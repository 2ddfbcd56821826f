//! 数据洞察视图控制器
//!
//! 加载租户 schema，选择表和列，按图表类型拉取 x/y 序列。

use crate::dashboard::api::ApiClient;
use crate::dashboard::error::ClientResult;
use crate::dashboard::session::ConnectionContext;
use crate::dashboard::types::{ChartDataRequest, ChartDataResponse, ChartType, TableSchema};
use std::sync::Arc;
use tracing::{error, info};

pub struct InsightsView {
    api: Arc<ApiClient>,
    tenant_id: Option<String>,
    tables: Vec<(String, TableSchema)>,
    selected_table: Option<String>,
    x_column: Option<String>,
    y_column: Option<String>,
    chart_type: ChartType,
    color: Option<String>,
    error: Option<String>,
}

impl InsightsView {
    /// 挂载视图：读取租户并加载 schema，默认选中第一张表。
    ///
    /// 加载失败时视图照常挂载，表列表为空，错误写入 `error()`。
    pub async fn mount(api: Arc<ApiClient>) -> Self {
        let tenant_id = ConnectionContext::tenant_id(api.store().as_ref()).await;
        let mut view = Self {
            api,
            tenant_id,
            tables: Vec::new(),
            selected_table: None,
            x_column: None,
            y_column: None,
            chart_type: ChartType::default(),
            color: None,
            error: None,
        };
        view.reload_schema().await;
        view
    }

    /// 重新加载 schema；未连接或加载失败时清空
    pub async fn reload_schema(&mut self) {
        self.error = None;
        let schema = match self.tenant_id.clone() {
            Some(tenant_id) => self.api.get_schema(&tenant_id).await,
            None => {
                self.tables.clear();
                self.select_table(None);
                return;
            }
        };
        match schema {
            Ok(schema) => {
                info!("[InsightsView] 📊 加载 schema，共 {} 张表", schema.schema.len());
                self.tables = schema.schema;
            }
            Err(e) => {
                error!("[InsightsView] 加载 schema 失败: {}", e);
                self.tables.clear();
                self.error = Some(e.to_string());
            }
        }
        let first = self.tables.first().map(|(name, _)| name.clone());
        self.select_table(first);
    }

    /// 最近一次 schema 加载的错误
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 按后端顺序排列的表名
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// 当前表的列名
    pub fn columns(&self) -> Vec<&str> {
        self.selected_schema()
            .map(|t| t.columns.iter().map(|c| c.name.as_str()).collect())
            .unwrap_or_default()
    }

    fn selected_schema(&self) -> Option<&TableSchema> {
        let selected = self.selected_table.as_deref()?;
        self.tables
            .iter()
            .find(|(name, _)| name == selected)
            .map(|(_, schema)| schema)
    }

    /// 选择表：x 取第一列，y 取第二列（只有一列时同 x）
    pub fn select_table(&mut self, table: Option<String>) {
        self.selected_table = table.filter(|t| self.tables.iter().any(|(name, _)| name == t));
        let columns: Vec<String> = self.columns().into_iter().map(str::to_string).collect();
        self.x_column = columns.first().cloned();
        self.y_column = columns.get(1).or_else(|| columns.first()).cloned();
    }

    pub fn selected_table(&self) -> Option<&str> {
        self.selected_table.as_deref()
    }

    pub fn x_column(&self) -> Option<&str> {
        self.x_column.as_deref()
    }

    pub fn y_column(&self) -> Option<&str> {
        self.y_column.as_deref()
    }

    pub fn set_x_column(&mut self, column: Option<String>) {
        self.x_column = column;
    }

    pub fn set_y_column(&mut self, column: Option<String>) {
        self.y_column = column;
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        self.chart_type = chart_type;
    }

    pub fn set_color(&mut self, color: Option<String>) {
        self.color = color;
    }

    /// 组装图表请求；缺少租户、表或 x 列，或非饼图缺少 y 列时返回 None
    fn chart_request(&self) -> Option<ChartDataRequest> {
        let tenant_id = self.tenant_id.clone()?;
        let table_name = self.selected_table.clone()?;
        let x_column = self.x_column.clone()?;
        let y_column = match (&self.y_column, self.chart_type) {
            (Some(y), _) => y.clone(),
            (None, ChartType::Pie) => String::new(),
            (None, _) => return None,
        };
        Some(ChartDataRequest {
            tenant_id,
            table_name,
            x_column,
            y_column,
            chart_type: self.chart_type,
            color: self.color.clone(),
        })
    }

    /// 拉取图表数据；条件不满足时不发请求，返回 `Ok(None)`
    pub async fn fetch_chart(&self) -> ClientResult<Option<ChartDataResponse>> {
        let Some(request) = self.chart_request() else {
            return Ok(None);
        };
        let data = self.api.get_chart_data(&request).await?;
        info!(
            "[InsightsView] 📈 {}.{} 图表数据 {} 个点",
            request.table_name,
            request.x_column,
            data.x.len()
        );
        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::api::testing::{json_response, ScriptedTransport};
    use crate::dashboard::api::RequestBody;
    use crate::dashboard::session::{keys, MemorySessionStore, SessionStore};
    use serde_json::json;

    async fn mounted(transport: Arc<ScriptedTransport>) -> InsightsView {
        transport.push(
            "/schema/t1",
            json_response(
                200,
                json!({
                    "tenant_id": "t1",
                    "schema": {
                        "orders": {"columns": [
                            {"name": "month", "type": "text"},
                            {"name": "revenue", "type": "numeric"}
                        ]},
                        "customers": {"columns": [{"name": "id", "type": "int"}]}
                    }
                }),
            ),
        );
        let store = Arc::new(MemorySessionStore::new());
        store.set(keys::TENANT_ID, "t1").await.unwrap();
        InsightsView::mount(Arc::new(ApiClient::new(transport, store))).await
    }

    #[tokio::test]
    async fn first_table_and_columns_are_preselected() {
        let view = mounted(Arc::new(ScriptedTransport::new())).await;
        assert_eq!(view.table_names(), vec!["orders", "customers"]);
        assert_eq!(view.selected_table(), Some("orders"));
        assert_eq!(view.x_column(), Some("month"));
        assert_eq!(view.y_column(), Some("revenue"));
    }

    #[tokio::test]
    async fn single_column_table_uses_it_for_both_axes() {
        let mut view = mounted(Arc::new(ScriptedTransport::new())).await;
        view.select_table(Some("customers".into()));
        assert_eq!(view.x_column(), Some("id"));
        assert_eq!(view.y_column(), Some("id"));

        view.select_table(Some("missing".into()));
        assert!(view.selected_table().is_none());
        assert!(view.x_column().is_none());
    }

    #[tokio::test]
    async fn fetch_chart_sends_selection() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(
            "/insights/chart-data",
            json_response(200, json!({"x": ["Jan", "Feb"], "y": [10, 20]})),
        );
        let mut view = mounted(transport.clone()).await;
        view.set_chart_type(ChartType::Line);
        view.set_color(Some("#ff0000".into()));

        let data = view.fetch_chart().await.unwrap().unwrap();
        assert_eq!(data.y, vec![json!(10), json!(20)]);

        let request = transport
            .requests()
            .into_iter()
            .find(|r| r.path == "/insights/chart-data")
            .unwrap();
        assert_eq!(
            request.body,
            RequestBody::Json(json!({
                "tenant_id": "t1",
                "table_name": "orders",
                "x_column": "month",
                "y_column": "revenue",
                "chart_type": "line",
                "color": "#ff0000"
            }))
        );
    }

    #[tokio::test]
    async fn incomplete_selection_is_noop() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut view = mounted(transport.clone()).await;
        view.set_y_column(None);
        assert!(view.fetch_chart().await.unwrap().is_none());

        view.set_x_column(None);
        view.set_chart_type(ChartType::Pie);
        assert!(view.fetch_chart().await.unwrap().is_none());
        assert_eq!(transport.requests_to("/insights/chart-data"), 0);
    }

    #[tokio::test]
    async fn pie_chart_does_not_need_y() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("/insights/chart-data", json_response(200, json!({"x": [], "y": []})));
        let mut view = mounted(transport.clone()).await;
        view.set_chart_type(ChartType::Pie);
        view.set_y_column(None);

        assert!(view.fetch_chart().await.unwrap().is_some());
        assert_eq!(transport.requests_to("/insights/chart-data"), 1);
    }

    #[tokio::test]
    async fn without_tenant_nothing_is_loaded() {
        let transport = Arc::new(ScriptedTransport::new());
        let api = Arc::new(ApiClient::new(transport.clone(), Arc::new(MemorySessionStore::new())));
        let view = InsightsView::mount(api).await;
        assert!(view.table_names().is_empty());
        assert!(view.fetch_chart().await.unwrap().is_none());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn schema_failure_still_mounts_with_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("/schema/t1", json_response(500, json!({"detail": "schema failed"})));
        let store = Arc::new(MemorySessionStore::new());
        store.set(keys::TENANT_ID, "t1").await.unwrap();

        let view = InsightsView::mount(Arc::new(ApiClient::new(transport.clone(), store))).await;
        assert_eq!(view.error(), Some("schema failed"));
        assert!(view.table_names().is_empty());
        assert!(view.selected_table().is_none());
        assert!(view.fetch_chart().await.unwrap().is_none());
        assert_eq!(transport.requests_to("/insights/chart-data"), 0);
    }

    #[tokio::test]
    async fn reload_clears_previous_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("/schema/t1", json_response(503, json!({"detail": "busy"})));
        transport.push(
            "/schema/t1",
            json_response(200, json!({"schema": {"orders": {"columns": [{"name": "id"}]}}})),
        );
        let store = Arc::new(MemorySessionStore::new());
        store.set(keys::TENANT_ID, "t1").await.unwrap();

        let mut view = InsightsView::mount(Arc::new(ApiClient::new(transport, store))).await;
        assert_eq!(view.error(), Some("busy"));

        view.reload_schema().await;
        assert!(view.error().is_none());
        assert_eq!(view.table_names(), vec!["orders"]);
    }
}
