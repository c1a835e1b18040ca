//! Message source for platforms without SMS access
//!
//! Permission is always denied, there are never any messages, and
//! subscriptions receive nothing.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::result::Result;
use crate::domain::RawMessage;
use crate::ports::{
    MessageQuery, MessageSource, PermissionStatus, Subscription, SubscriptionHandle,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedMessageSource;

#[async_trait]
impl MessageSource for UnsupportedMessageSource {
    fn name(&self) -> &str {
        "unsupported"
    }

    async fn check_permission(&self) -> Result<PermissionStatus> {
        Ok(PermissionStatus::Denied)
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(PermissionStatus::Denied)
    }

    async fn get_messages(&self, _query: &MessageQuery) -> Result<Vec<RawMessage>> {
        Ok(Vec::new())
    }

    async fn subscribe(&self, _senders: &[String]) -> Result<Subscription> {
        // Sender dropped immediately: the receiver yields None at once
        let (_tx, receiver) = mpsc::channel(1);
        Ok(Subscription {
            handle: SubscriptionHandle::new(),
            receiver,
        })
    }

    async fn unsubscribe(&self, _handle: SubscriptionHandle) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_denied_and_empty() {
        let source = UnsupportedMessageSource;
        assert_eq!(source.check_permission().await.unwrap(), PermissionStatus::Denied);
        assert_eq!(source.request_permission().await.unwrap(), PermissionStatus::Denied);

        let query = MessageQuery {
            senders: vec!["MPESA".to_string()],
            limit: 10,
            since: None,
        };
        assert!(source.get_messages(&query).await.unwrap().is_empty());

        let mut sub = source.subscribe(&query.senders).await.unwrap();
        assert!(sub.receiver.recv().await.is_none());
    }
}
