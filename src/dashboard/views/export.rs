//! 查询结果导出

use crate::dashboard::error::{ClientError, ClientResult};
use crate::dashboard::serialization::rows_to_csv;
use crate::dashboard::views::ask::QueryResult;
use std::path::{Path, PathBuf};
use tracing::info;

/// 默认导出文件名
pub const CSV_FILE_NAME: &str = "query_results.csv";

/// 结果转 CSV 文本；无数据时返回 None
pub fn export_csv(result: &QueryResult) -> Option<String> {
    rows_to_csv(&result.data)
}

/// 复制用的 SQL 文本
pub fn copy_sql(result: &QueryResult) -> &str {
    &result.sql
}

/// 把 CSV 写入 `dir/query_results.csv`，返回写入的文件路径
pub async fn write_csv(result: &QueryResult, dir: impl AsRef<Path>) -> ClientResult<PathBuf> {
    let csv = export_csv(result)
        .ok_or_else(|| ClientError::Validation("没有可导出的数据".to_string()))?;
    let path = dir.as_ref().join(CSV_FILE_NAME);
    tokio::fs::write(&path, csv)
        .await
        .map_err(|e| anyhow::anyhow!("写入 {} 失败: {}", path.display(), e))?;
    info!("[Export] 💾 已导出 {} 行到 {}", result.row_count(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(data: Vec<serde_json::Value>) -> QueryResult {
        QueryResult {
            sql: "SELECT a, b FROM t".to_string(),
            cached: false,
            data,
            execution_time: "0.02s".to_string(),
            confidence: None,
        }
    }

    #[test]
    fn csv_and_sql_text() {
        let r = result(vec![json!({"a": 1, "b": 2}), json!({"a": 3, "b": 4})]);
        assert_eq!(export_csv(&r).as_deref(), Some("a,b\n1,2\n3,4"));
        assert_eq!(copy_sql(&r), "SELECT a, b FROM t");
        assert!(export_csv(&result(vec![])).is_none());
    }

    #[tokio::test]
    async fn writes_file_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let r = result(vec![json!({"name": "Widget", "qty": 3})]);

        let path = write_csv(&r, dir.path()).await.unwrap();
        assert!(path.ends_with(CSV_FILE_NAME));
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "name,qty\n\"Widget\",3");

        let err = write_csv(&result(vec![]), dir.path()).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
