use crate::models::FeedbackEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// 发往某个工位的反馈事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationEvent {
    pub station: String,
    pub event: FeedbackEvent,
    pub invoice_id: Option<String>,
    pub code: Option<String>,
    pub at: DateTime<Utc>,
}

/// 反馈出口：核心只负责发出事件，不负责播放/渲染
pub trait FeedbackSink: Send + Sync {
    fn emit(&self, event: &StationEvent);
}

/// 写入日志
#[derive(Debug, Default)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn emit(&self, event: &StationEvent) {
        tracing::debug!(
            station = %event.station,
            invoice = ?event.invoice_id,
            code = ?event.code,
            "feedback {:?}",
            event.event
        );
    }
}

/// 广播给订阅者 (SSE)
#[derive(Debug, Clone)]
pub struct BroadcastFeedback {
    tx: broadcast::Sender<StationEvent>,
}

impl BroadcastFeedback {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StationEvent> {
        self.tx.subscribe()
    }
}

impl FeedbackSink for BroadcastFeedback {
    fn emit(&self, event: &StationEvent) {
        // 没有订阅者时 send 返回错误，忽略
        let _ = self.tx.send(event.clone());
    }
}

/// 组合多个出口
#[derive(Default, Clone)]
pub struct FanoutFeedback {
    sinks: Vec<Arc<dyn FeedbackSink>>,
}

impl FanoutFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn FeedbackSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl FeedbackSink for FanoutFeedback {
    fn emit(&self, event: &StationEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(station: &str, kind: FeedbackEvent) -> StationEvent {
        StationEvent {
            station: station.to_string(),
            event: kind,
            invoice_id: None,
            code: None,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let sink = BroadcastFeedback::new(8);
        let mut rx = sink.subscribe();
        sink.emit(&event("st-1", FeedbackEvent::ItemOk));
        let got = rx.recv().await.unwrap();
        assert_eq!(got.event, FeedbackEvent::ItemOk);
        assert_eq!(got.station, "st-1");
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        let sink = FanoutFeedback::new()
            .with(Arc::new(LogFeedback))
            .with(Arc::new(BroadcastFeedback::new(1)));
        sink.emit(&event("st-1", FeedbackEvent::ItemWrong));
    }
}
