//! Stream Layer - 服务端推送事件（SSE over HTTP body）解码
//!
//! - reader: 通用的按行解码器（跨 chunk 拼接、`data:` 前缀、`[DONE]` 哨兵）
//! - decoders: 各类流的 JSON 判别器（章节生成、增量 chunk、校对）

mod decoders;
mod reader;

pub use decoders::{ChapterEnvelopeDecoder, ChunkDeltaDecoder, ProofreadDecoder};
pub use reader::{collect_complete, decode_event_stream, EventParser, LineBuffer, LineDecoder, DATA_PREFIX, DONE_SENTINEL};
