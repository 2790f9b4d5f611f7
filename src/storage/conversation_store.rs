use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::conversation::Conversation;

/// 对话存储
///
/// 每个病人一份对话，外层包一把异步锁。一轮对话从检测到追加回复全程持锁，
/// 同一病人的并发发送会排队执行。
#[derive(Default)]
pub struct ConversationStore {
    conversations: DashMap<String, Arc<Mutex<Conversation>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取对话句柄，不存在时创建
    pub fn handle(&self, persona_id: &str) -> Arc<Mutex<Conversation>> {
        self.conversations
            .entry(persona_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new(persona_id))))
            .value()
            .clone()
    }

    /// 获取已存在的对话句柄
    pub fn get(&self, persona_id: &str) -> Option<Arc<Mutex<Conversation>>> {
        self.conversations
            .get(persona_id)
            .map(|entry| entry.value().clone())
    }

    /// 丢弃对话
    pub fn remove(&self, persona_id: &str) -> bool {
        self.conversations.remove(persona_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;

    #[tokio::test]
    async fn test_handle_is_shared() {
        let store = ConversationStore::new();
        let a = store.handle("p1");
        a.lock().await.push(Message::patient("hi"));

        let b = store.handle("p1");
        assert_eq!(b.lock().await.messages().len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = ConversationStore::new();
        store.handle("p1");
        assert!(store.get("p1").is_some());
        assert!(store.remove("p1"));
        assert!(store.get("p1").is_none());
        assert!(store.is_empty());
    }
}
