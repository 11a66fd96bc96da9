//! 按行解码的事件流读取器
//!
//! 响应体按 chunk 到达，chunk 边界可能落在一行中间，也可能落在多字节 UTF-8 字符中间。
//! 这里先按字节缓冲到换行符，再对完整的行做 UTF-8 解码。

use futures_util::stream::{self, BoxStream, Stream};
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::fmt::Display;

use crate::application::ports::{ApiError, StreamEvent};

pub const DATA_PREFIX: &str = "data:";
pub const DONE_SENTINEL: &str = "[DONE]";

/// 单行 JSON 负载的判别器
pub trait LineDecoder: Send {
    type Output: Send;

    /// 解析一行 JSON 负载，不产生事件时返回 None
    fn decode(&mut self, payload: &serde_json::Value) -> Option<StreamEvent<Self::Output>>;

    /// 收到 `[DONE]` 哨兵
    fn on_done(&mut self) -> Option<StreamEvent<Self::Output>> {
        None
    }
}

/// 行缓冲
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加字节，返回所有已完整的行（不含换行符和行尾 `\r`）
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(Self::decode_line(&raw[..raw.len() - 1]));
        }
        lines
    }

    /// 取出最后一行（没有换行符结尾）
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.pending);
        Some(Self::decode_line(&raw))
    }

    fn decode_line(raw: &[u8]) -> String {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        String::from_utf8_lossy(raw).into_owned()
    }
}

/// 事件解析器
///
/// 收到终止事件（Complete / Error）后停止解析，之后的输入全部忽略
pub struct EventParser<D: LineDecoder> {
    decoder: D,
    lines: LineBuffer,
    finished: bool,
    skipped: usize,
}

impl<D: LineDecoder> EventParser<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            lines: LineBuffer::new(),
            finished: false,
            skipped: 0,
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent<D::Output>> {
        if self.finished {
            return Vec::new();
        }
        let lines = self.lines.push(chunk);
        self.handle_lines(lines)
    }

    /// 输入结束，处理残留的最后一行
    pub fn finish(&mut self) -> Vec<StreamEvent<D::Output>> {
        if self.finished {
            return Vec::new();
        }
        let lines: Vec<String> = self.lines.finish().into_iter().collect();
        self.handle_lines(lines)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 因 JSON 解析失败被跳过的行数
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    fn handle_lines(&mut self, lines: Vec<String>) -> Vec<StreamEvent<D::Output>> {
        let mut events = Vec::new();
        for line in lines {
            if let Some(event) = self.handle_line(&line) {
                let terminal = event.is_terminal();
                events.push(event);
                if terminal {
                    self.finished = true;
                    break;
                }
            }
        }
        events
    }

    fn handle_line(&mut self, line: &str) -> Option<StreamEvent<D::Output>> {
        let data = line.strip_prefix(DATA_PREFIX)?.trim();
        if data.is_empty() {
            return None;
        }
        if data == DONE_SENTINEL {
            return self.decoder.on_done();
        }

        match serde_json::from_str::<serde_json::Value>(data) {
            Ok(payload) => self.decoder.decode(&payload),
            Err(e) => {
                self.skipped += 1;
                tracing::debug!(
                    error = %e,
                    skipped = self.skipped,
                    line_len = data.len(),
                    "Skipping malformed stream line"
                );
                None
            }
        }
    }
}

struct ReaderState<S, D: LineDecoder> {
    body: std::pin::Pin<Box<S>>,
    parser: EventParser<D>,
    queue: VecDeque<StreamEvent<D::Output>>,
    eof: bool,
}

/// 把字节流解码为事件流
///
/// - 读取错误作为流中的 `Err` 项出现，之后流结束
/// - 终止事件之后不再读取响应体
pub fn decode_event_stream<S, B, E, D>(
    body: S,
    decoder: D,
) -> BoxStream<'static, Result<StreamEvent<D::Output>, ApiError>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
    D: LineDecoder + 'static,
    D::Output: 'static,
{
    let state = ReaderState {
        body: Box::pin(body),
        parser: EventParser::new(decoder),
        queue: VecDeque::new(),
        eof: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.queue.pop_front() {
                return Some((Ok(event), st));
            }
            if st.eof || st.parser.is_finished() {
                if st.parser.skipped_lines() > 0 {
                    tracing::debug!(skipped = st.parser.skipped_lines(), "Stream closed with skipped lines");
                }
                return None;
            }

            match st.body.next().await {
                Some(Ok(chunk)) => {
                    let events = st.parser.feed(chunk.as_ref());
                    st.queue.extend(events);
                }
                Some(Err(e)) => {
                    st.eof = true;
                    return Some((Err(ApiError::Network(e.to_string())), st));
                }
                None => {
                    st.eof = true;
                    let events = st.parser.finish();
                    st.queue.extend(events);
                }
            }
        }
    })
    .boxed()
}

/// 读完整条流，只取终止结果
pub async fn collect_complete<T>(
    mut events: BoxStream<'static, Result<StreamEvent<T>, ApiError>>,
) -> Result<T, ApiError> {
    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::Partial(_) => {}
            StreamEvent::Complete(result) => return Ok(result),
            StreamEvent::Error(message) => return Err(ApiError::Generation(message)),
        }
    }
    Err(ApiError::Generation("Stream ended without result".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 把 `{"text": ...}` 作为 Partial，`{"end": ...}` 作为 Complete
    struct EchoDecoder;

    impl LineDecoder for EchoDecoder {
        type Output = String;

        fn decode(&mut self, payload: &serde_json::Value) -> Option<StreamEvent<String>> {
            if let Some(text) = payload.get("text").and_then(|v| v.as_str()) {
                return Some(StreamEvent::Partial(text.to_string()));
            }
            payload
                .get("end")
                .and_then(|v| v.as_str())
                .map(|text| StreamEvent::Complete(text.to_string()))
        }
    }

    #[test]
    fn test_line_buffer_split_across_chunks() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"data: {\"te").is_empty());
        let lines = buffer.push(b"xt\":1}\r\ndata: x\n");
        assert_eq!(lines, vec!["data: {\"text\":1}".to_string(), "data: x".to_string()]);
        assert!(buffer.finish().is_none());
    }

    #[test]
    fn test_line_buffer_multibyte_boundary() {
        let bytes = "data: 标书\n".as_bytes();
        let mut buffer = LineBuffer::new();
        // 在“标”字的第二个字节处切开
        assert!(buffer.push(&bytes[..7]).is_empty());
        assert_eq!(buffer.push(&bytes[7..]), vec!["data: 标书".to_string()]);
    }

    #[test]
    fn test_parser_skips_malformed_and_non_data_lines() {
        let mut parser = EventParser::new(EchoDecoder);
        let events = parser.feed(
            b": comment\nevent: x\ndata: {broken\ndata: {\"text\":\"ok\"}\ndata: [DONE]\n\n",
        );
        assert_eq!(events, vec![StreamEvent::Partial("ok".to_string())]);
        assert_eq!(parser.skipped_lines(), 1);
        assert!(!parser.is_finished());
    }

    #[test]
    fn test_parser_stops_after_terminal() {
        let mut parser = EventParser::new(EchoDecoder);
        let events = parser.feed(b"data: {\"end\":\"a\"}\ndata: {\"text\":\"late\"}\n");
        assert_eq!(events, vec![StreamEvent::Complete("a".to_string())]);
        assert!(parser.is_finished());
        assert!(parser.feed(b"data: {\"text\":\"later\"}\n").is_empty());
    }

    #[test]
    fn test_parser_flushes_trailing_line() {
        let mut parser = EventParser::new(EchoDecoder);
        assert!(parser.feed(b"data: {\"end\":\"tail\"}").is_empty());
        assert_eq!(parser.finish(), vec![StreamEvent::Complete("tail".to_string())]);
    }

    #[tokio::test]
    async fn test_decode_event_stream_propagates_read_error() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![
            Ok(b"data: {\"text\":\"a\"}\n".to_vec()),
            Err("connection reset".to_string()),
            Ok(b"data: {\"text\":\"never\"}\n".to_vec()),
        ];
        let events: Vec<_> = decode_event_stream(stream::iter(chunks), EchoDecoder)
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Ok(StreamEvent::Partial("a".to_string())));
        assert_eq!(
            events[1],
            Err(ApiError::Network("connection reset".to_string()))
        );
    }

    #[tokio::test]
    async fn test_collect_complete() {
        let ok: Vec<Result<&'static [u8], String>> =
            vec![Ok(&b"data: {\"text\":\"a\"}\ndata: {\"end\":\"ab\"}\n"[..])];
        let result = collect_complete(decode_event_stream(stream::iter(ok), EchoDecoder)).await;
        assert_eq!(result, Ok("ab".to_string()));

        let truncated: Vec<Result<&'static [u8], String>> = vec![Ok(&b"data: {\"text\":\"a\"}\n"[..])];
        let result = collect_complete(decode_event_stream(stream::iter(truncated), EchoDecoder)).await;
        assert!(matches!(result, Err(ApiError::Generation(_))));
    }

    #[tokio::test]
    async fn test_decode_event_stream_stops_reading_after_terminal() {
        let chunks: Vec<Result<&'static [u8], String>> = vec![
            Ok(&b"data: {\"end\":\"done\"}\n"[..]),
            Err("must not be read".to_string()),
        ];
        let events: Vec<_> = decode_event_stream(stream::iter(chunks), EchoDecoder)
            .collect()
            .await;
        assert_eq!(events, vec![Ok(StreamEvent::Complete("done".to_string()))]);
    }
}
