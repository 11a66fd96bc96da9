//! 各类流的负载判别器

use serde_json::Value;

use super::reader::LineDecoder;
use crate::application::ports::StreamEvent;
use crate::infrastructure::http::dto::ProofreadResult;

/// 负载中的错误信息
///
/// 后端既会发 `"error": "..."`，也会发 `"error": true, "message": "..."`
fn error_message(payload: &Value) -> Option<String> {
    let error = payload.get("error")?;
    let message = payload.get("message").and_then(Value::as_str);
    match error {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) => Some(message.unwrap_or(text).to_string()),
        Value::Bool(true) => Some(message.unwrap_or("生成失败").to_string()),
        other => Some(message.map(str::to_string).unwrap_or_else(|| other.to_string())),
    }
}

fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

/// 章节生成流：`status: streaming|completed|error` 信封
///
/// `full_content` 携带的是累计文本而不是增量
#[derive(Debug, Default)]
pub struct ChapterEnvelopeDecoder {
    last: String,
}

impl ChapterEnvelopeDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineDecoder for ChapterEnvelopeDecoder {
    type Output = String;

    fn decode(&mut self, payload: &Value) -> Option<StreamEvent<String>> {
        if let Some(message) = error_message(payload) {
            return Some(StreamEvent::Error(message));
        }

        match str_field(payload, "status")? {
            "streaming" => {
                if let Some(full) = str_field(payload, "full_content") {
                    self.last = full.to_string();
                } else if let Some(delta) = str_field(payload, "chunk").or_else(|| str_field(payload, "content")) {
                    self.last.push_str(delta);
                } else {
                    return None;
                }
                Some(StreamEvent::Partial(self.last.clone()))
            }
            "completed" => {
                let text = str_field(payload, "content")
                    .or_else(|| str_field(payload, "full_content"))
                    .map(str::to_string)
                    .unwrap_or_else(|| std::mem::take(&mut self.last));
                Some(StreamEvent::Complete(text))
            }
            "error" => Some(StreamEvent::Error(
                str_field(payload, "message").unwrap_or("生成失败").to_string(),
            )),
            _ => None,
        }
    }
}

/// 增量 chunk 流（目录生成、项目正文生成）
///
/// 空 chunk 是心跳；`[DONE]` 时输出累计文本
#[derive(Debug, Default)]
pub struct ChunkDeltaDecoder {
    accumulated: String,
}

impl ChunkDeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineDecoder for ChunkDeltaDecoder {
    type Output = String;

    fn decode(&mut self, payload: &Value) -> Option<StreamEvent<String>> {
        if let Some(message) = error_message(payload) {
            return Some(StreamEvent::Error(message));
        }

        let chunk = str_field(payload, "chunk")?;
        if chunk.is_empty() {
            return None;
        }
        self.accumulated.push_str(chunk);
        Some(StreamEvent::Partial(self.accumulated.clone()))
    }

    fn on_done(&mut self) -> Option<StreamEvent<String>> {
        Some(StreamEvent::Complete(std::mem::take(&mut self.accumulated)))
    }
}

/// 校对流：`chunk` 增量，终止于 `done: true` + `result`
#[derive(Debug, Default)]
pub struct ProofreadDecoder {
    accumulated: String,
}

impl ProofreadDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineDecoder for ProofreadDecoder {
    type Output = ProofreadResult;

    fn decode(&mut self, payload: &Value) -> Option<StreamEvent<ProofreadResult>> {
        if let Some(message) = error_message(payload) {
            return Some(StreamEvent::Error(message));
        }

        if payload.get("done").and_then(Value::as_bool) == Some(true) {
            let Some(result) = payload.get("result") else {
                return Some(StreamEvent::Error("校对结果缺失".to_string()));
            };
            return Some(match serde_json::from_value::<ProofreadResult>(result.clone()) {
                Ok(parsed) => StreamEvent::Complete(parsed),
                Err(e) => StreamEvent::Error(format!("校对结果解析失败: {}", e)),
            });
        }

        let chunk = str_field(payload, "chunk")?;
        if chunk.is_empty() {
            return None;
        }
        self.accumulated.push_str(chunk);
        Some(StreamEvent::Partial(self.accumulated.clone()))
    }
}
