//! 测试用的脚本化传输层

use crate::dashboard::api::transport::{ApiRequest, RawResponse, Transport};
use crate::dashboard::error::ClientError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// 按路径预置响应；同一路径的响应按先进先出返回，最后一个会被重复使用。
/// 未预置的路径返回网络错误。
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<RawResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: &str, response: RawResponse) {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        let path = request.path.clone();
        self.requests.lock().unwrap().push(request);

        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(&path)
            .ok_or_else(|| ClientError::Network(format!("connection refused: {}", path)))?;
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or_else(|| ClientError::Network(format!("connection refused: {}", path)))
    }
}

pub fn json_response(status: u16, body: Value) -> RawResponse {
    RawResponse {
        status,
        status_text: String::new(),
        body: serde_json::to_vec(&body).unwrap(),
    }
}

pub fn status_response(status: u16, status_text: &str, body: &[u8]) -> RawResponse {
    RawResponse {
        status,
        status_text: status_text.to_string(),
        body: body.to_vec(),
    }
}
