//! Event Publisher Implementation
//!
//! 基于 tokio broadcast 的客户端事件推送

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{ClientEvent, EventSinkPort};

const DEFAULT_CAPACITY: usize = 256;

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<ClientEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.channel.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSinkPort for EventPublisher {
    fn publish(&self, event: ClientEvent) {
        // 没有订阅者时发送失败，直接丢弃
        if self.channel.send(event).is_err() {
            tracing::trace!("No subscribers for client event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_to_subscribers() {
        let publisher = EventPublisher::new();
        let mut rx1 = publisher.subscribe();
        let mut rx2 = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 2);

        publisher.publish(ClientEvent::ChapterStarted {
            chapter_id: "1.1".to_string(),
        });

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                ClientEvent::ChapterStarted { chapter_id } => assert_eq!(chapter_id, "1.1"),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = EventPublisher::new();
        publisher.publish(ClientEvent::LoginRequired);
    }
}
