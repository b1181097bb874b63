//! The relay engine: duplicates end-user inquiries into the admin channel
//! and routes admin answers back to the original sender.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    classify::AdminAction,
    correlation::CorrelationStore,
    domain::{MessageRef, UserId},
    errors::Error,
    extract::extract_user_id,
    formatting::{
        self, delivered_echo, delivery_failed_echo, render_header, target_set_notice,
        wrap_admin_reply,
    },
    messaging::{
        port::MessagingPort,
        types::{InboundMessage, Payload, ReplyTarget},
    },
    target::ActiveTargetStore,
    Result,
};

/// How a forward ended: both admin-channel messages delivered, or one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardOutcome {
    Full,
    /// Header or Copy failed; the inquiry is still answerable through the
    /// surviving correlation row.
    Degraded,
}

/// Owns the correlation table and the active-target session, and talks to
/// the transport only through the messaging port. One instance is shared
/// by all concurrently handled updates.
pub struct RelayService {
    admin: Option<UserId>,
    messenger: Arc<dyn MessagingPort>,
    correlation: CorrelationStore,
    targets: ActiveTargetStore,
}

impl RelayService {
    pub fn new(
        admin: Option<UserId>,
        messenger: Arc<dyn MessagingPort>,
        correlation_capacity: usize,
    ) -> Self {
        Self {
            admin,
            messenger,
            correlation: CorrelationStore::new(correlation_capacity),
            targets: ActiveTargetStore::default(),
        }
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin == Some(user)
    }

    pub async fn has_active_target(&self, admin: UserId) -> bool {
        self.targets.get(admin).await.is_some()
    }

    /// Duplicate an end-user inquiry into the admin channel: a Header
    /// carrying the identity tag, then a verbatim Copy. Both assigned ids
    /// are recorded so the admin can reply to either message.
    pub async fn forward_inquiry(&self, msg: &InboundMessage) -> Result<ForwardOutcome> {
        // Sender-facing notices go back into the conversation the inquiry
        // arrived in.
        let sender_chat = msg.chat_id;

        let Some(admin) = self.admin else {
            let _ = self
                .messenger
                .send_html(sender_chat, formatting::NOT_CONFIGURED_NOTICE)
                .await;
            return Err(Error::NotConfigured);
        };
        let admin_chat = admin.as_chat();

        let header = self
            .messenger
            .send_html(admin_chat, &render_header(&msg.sender))
            .await;
        let copy = self.messenger.copy_message(admin_chat, msg.origin).await;

        let outcome = match (&header, &copy) {
            (Err(h), Err(c)) => {
                warn!(
                    user = msg.sender.id.0,
                    "inquiry lost: header: {h}; copy: {c}"
                );
                let _ = self
                    .messenger
                    .send_html(sender_chat, formatting::FORWARD_FAILED_NOTICE)
                    .await;
                return Err(Error::Delivery(format!("header: {h}; copy: {c}")));
            }
            (Ok(_), Ok(_)) => ForwardOutcome::Full,
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => {
                warn!(user = msg.sender.id.0, "forward degraded: {e}");
                ForwardOutcome::Degraded
            }
        };

        for sent in [header.ok(), copy.ok()].into_iter().flatten() {
            self.correlation.put(sent.message_id, msg.sender.id).await;
        }

        info!(user = msg.sender.id.0, ?outcome, "inquiry forwarded");
        let _ = self
            .messenger
            .send_html(sender_chat, formatting::DELIVERED_NOTICE)
            .await;
        Ok(outcome)
    }

    /// Resolve an admin reply's destination — direct correlation lookup
    /// first, then the textual fallback rules over the replied-to message —
    /// and deliver. Unresolved replies mutate nothing and send nothing to
    /// any end user.
    pub async fn deliver_reply(
        &self,
        admin: UserId,
        target: &ReplyTarget,
        payload: &Payload,
        origin: MessageRef,
    ) -> Result<()> {
        let resolved = match self.correlation.get(target.message_id).await {
            Some(user) => Some(user),
            None => target.text.as_deref().and_then(extract_user_id),
        };

        let Some(user) = resolved else {
            let _ = self
                .messenger
                .send_html(admin.as_chat(), formatting::UNRESOLVED_NOTICE)
                .await;
            return Err(Error::UnresolvedRecipient);
        };

        self.deliver_payload(admin, user, payload, origin).await
    }

    /// Route a free-form admin message to the active target. The target is
    /// consumed up front: one relay attempt per activation, whatever the
    /// outcome.
    pub async fn send_to_target(
        &self,
        admin: UserId,
        payload: &Payload,
        origin: MessageRef,
    ) -> Result<()> {
        let Some(user) = self.targets.consume(admin).await else {
            let _ = self
                .messenger
                .send_html(admin.as_chat(), formatting::UNRESOLVED_NOTICE)
                .await;
            return Err(Error::UnresolvedRecipient);
        };

        self.deliver_payload(admin, user, payload, origin).await
    }

    /// Execute a parsed admin command.
    pub async fn handle_command(&self, admin: UserId, action: AdminAction) -> Result<()> {
        match action {
            AdminAction::DirectSend { user, text } => self.deliver_text(admin, user, &text).await,
            AdminAction::SetTarget { user } => {
                self.targets.activate(admin, user).await;
                let _ = self
                    .messenger
                    .send_html(admin.as_chat(), &target_set_notice(user))
                    .await;
                Ok(())
            }
            AdminAction::CancelTarget => {
                self.targets.cancel(admin).await;
                let _ = self
                    .messenger
                    .send_html(admin.as_chat(), formatting::TARGET_CLEARED_NOTICE)
                    .await;
                Ok(())
            }
        }
    }

    async fn deliver_payload(
        &self,
        admin: UserId,
        user: UserId,
        payload: &Payload,
        origin: MessageRef,
    ) -> Result<()> {
        match payload {
            Payload::Text(text) => self.deliver_text(admin, user, text).await,
            // Non-text content is duplicated as-is.
            Payload::Media { .. } => {
                let sent = self
                    .messenger
                    .copy_message(user.as_chat(), origin)
                    .await
                    .map(|_| ());
                self.report_delivery(admin, user, sent).await
            }
        }
    }

    async fn deliver_text(&self, admin: UserId, user: UserId, text: &str) -> Result<()> {
        let sent = self
            .messenger
            .send_html(user.as_chat(), &wrap_admin_reply(text))
            .await
            .map(|_| ());
        self.report_delivery(admin, user, sent).await
    }

    /// Echo every delivery outcome back to the admin; a transport
    /// rejection is reported, never swallowed. Correlation rows are left
    /// untouched so the admin can retry.
    async fn report_delivery(&self, admin: UserId, user: UserId, sent: Result<()>) -> Result<()> {
        match sent {
            Ok(()) => {
                info!(user = user.0, "reply delivered");
                let _ = self
                    .messenger
                    .send_html(admin.as_chat(), &delivered_echo(user))
                    .await;
                Ok(())
            }
            Err(e) => {
                warn!(user = user.0, "reply delivery failed: {e}");
                let _ = self
                    .messenger
                    .send_html(admin.as_chat(), &delivery_failed_echo(user, &e.to_string()))
                    .await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::{ChatId, EndUser, MessageId};
    use crate::messaging::types::ChatKind;

    const ADMIN: UserId = UserId(10);
    const ADMIN_CHAT: ChatId = ChatId(10);

    #[derive(Default)]
    struct FakeMessenger {
        next_id: Mutex<i32>,
        sends: Mutex<Vec<(MessageRef, String)>>,
        // (assigned ref, source ref)
        copies: Mutex<Vec<(MessageRef, MessageRef)>>,
        fail_sends_to: Mutex<Vec<i64>>,
        fail_copies_to: Mutex<Vec<i64>>,
    }

    impl FakeMessenger {
        fn alloc(&self, chat_id: ChatId) -> MessageRef {
            let mut guard = self.next_id.lock().unwrap();
            *guard += 1;
            MessageRef {
                chat_id,
                message_id: MessageId(*guard),
            }
        }

        fn sent(&self) -> Vec<(MessageRef, String)> {
            self.sends.lock().unwrap().clone()
        }

        fn sent_to(&self, chat: ChatId) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter(|(r, _)| r.chat_id == chat)
                .map(|(_, html)| html)
                .collect()
        }

        fn copied(&self) -> Vec<(MessageRef, MessageRef)> {
            self.copies.lock().unwrap().clone()
        }

        fn fail_sends_to(&self, chat: i64) {
            self.fail_sends_to.lock().unwrap().push(chat);
        }

        fn fail_copies_to(&self, chat: i64) {
            self.fail_copies_to.lock().unwrap().push(chat);
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
            if self.fail_sends_to.lock().unwrap().contains(&chat_id.0) {
                return Err(Error::Delivery("blocked".to_string()));
            }
            let sent = self.alloc(chat_id);
            self.sends.lock().unwrap().push((sent, html.to_string()));
            Ok(sent)
        }

        async fn copy_message(&self, to: ChatId, from: MessageRef) -> Result<MessageRef> {
            if self.fail_copies_to.lock().unwrap().contains(&to.0) {
                return Err(Error::Delivery("blocked".to_string()));
            }
            let sent = self.alloc(to);
            self.copies.lock().unwrap().push((sent, from));
            Ok(sent)
        }
    }

    fn service(messenger: Arc<FakeMessenger>) -> RelayService {
        RelayService::new(Some(ADMIN), messenger, 64)
    }

    fn inquiry(user: i64, text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: ChatId(user),
            chat_kind: ChatKind::Private,
            sender: EndUser {
                id: UserId(user),
                display_name: "Alex".to_string(),
                handle: Some("alex".to_string()),
            },
            reply_to: None,
            payload: Payload::Text(text.to_string()),
            origin: MessageRef {
                chat_id: ChatId(user),
                message_id: MessageId(1000),
            },
        }
    }

    fn some_origin(chat: i64) -> MessageRef {
        MessageRef {
            chat_id: ChatId(chat),
            message_id: MessageId(2000),
        }
    }

    fn admin_header(m: &FakeMessenger) -> (MessageRef, String) {
        m.sent()
            .into_iter()
            .find(|(r, html)| r.chat_id == ADMIN_CHAT && html.contains("UID:"))
            .expect("header sent to admin")
    }

    #[tokio::test]
    async fn forward_records_both_header_and_copy_ids() {
        let m = Arc::new(FakeMessenger::default());
        let svc = service(m.clone());

        let outcome = svc.forward_inquiry(&inquiry(555, "Hello")).await.unwrap();
        assert_eq!(outcome, ForwardOutcome::Full);

        let (header_ref, header_html) = admin_header(&m);
        assert!(header_html.contains("UID: 555"));
        assert!(header_html.contains("Alex (@alex)"));

        let (copy_ref, copy_src) = m.copied()[0];
        assert_eq!(copy_src.message_id, MessageId(1000));

        // Replying to either admin-channel message reaches user 555.
        assert_eq!(
            svc.correlation.get(header_ref.message_id).await,
            Some(UserId(555))
        );
        assert_eq!(
            svc.correlation.get(copy_ref.message_id).await,
            Some(UserId(555))
        );
        assert_eq!(svc.correlation.len().await, 2);

        // The sender got a delivery acknowledgement.
        assert!(m
            .sent_to(ChatId(555))
            .iter()
            .any(|html| html.contains("passed on")));
    }

    #[tokio::test]
    async fn admin_reply_to_the_copy_reaches_the_original_sender() {
        let m = Arc::new(FakeMessenger::default());
        let svc = service(m.clone());
        svc.forward_inquiry(&inquiry(555, "Hello")).await.unwrap();

        let (copy_ref, _) = m.copied()[0];
        svc.deliver_reply(
            ADMIN,
            &ReplyTarget {
                message_id: copy_ref.message_id,
                text: Some("Hello".to_string()),
            },
            &Payload::Text("Hi Alex".to_string()),
            some_origin(ADMIN.0),
        )
        .await
        .unwrap();

        let user_msgs = m.sent_to(ChatId(555));
        assert!(user_msgs
            .iter()
            .any(|html| html.contains("Reply from admin:") && html.contains("Hi Alex")));
        assert!(m
            .sent_to(ADMIN_CHAT)
            .iter()
            .any(|html| html.contains("Delivered to UID: 555")));
    }

    #[tokio::test]
    async fn reply_to_the_header_resolves_like_the_copy() {
        let m = Arc::new(FakeMessenger::default());
        let svc = service(m.clone());
        svc.forward_inquiry(&inquiry(555, "Hello")).await.unwrap();

        let (header_ref, _) = admin_header(&m);
        svc.deliver_reply(
            ADMIN,
            &ReplyTarget {
                message_id: header_ref.message_id,
                text: None,
            },
            &Payload::Text("Hi".to_string()),
            some_origin(ADMIN.0),
        )
        .await
        .unwrap();

        assert!(!m.sent_to(ChatId(555)).is_empty());
    }

    #[tokio::test]
    async fn reply_resolves_from_header_text_after_state_loss() {
        let m = Arc::new(FakeMessenger::default());
        let svc = service(m.clone());
        svc.forward_inquiry(&inquiry(555, "Hello")).await.unwrap();
        let (_, header_html) = admin_header(&m);

        // Fresh service: the correlation table a restart would have wiped.
        let fresh = service(m.clone());
        fresh
            .deliver_reply(
                ADMIN,
                &ReplyTarget {
                    message_id: MessageId(9999),
                    text: Some(header_html),
                },
                &Payload::Text("Hi again".to_string()),
                some_origin(ADMIN.0),
            )
            .await
            .unwrap();

        assert!(m
            .sent_to(ChatId(555))
            .iter()
            .any(|html| html.contains("Hi again")));
    }

    #[tokio::test]
    async fn unrelated_reply_gets_a_not_found_notice_and_no_send() {
        let m = Arc::new(FakeMessenger::default());
        let svc = service(m.clone());

        let err = svc
            .deliver_reply(
                ADMIN,
                &ReplyTarget {
                    message_id: MessageId(42),
                    text: Some("no tag anywhere".to_string()),
                },
                &Payload::Text("hi".to_string()),
                some_origin(ADMIN.0),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnresolvedRecipient));
        let sends = m.sent();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0.chat_id, ADMIN_CHAT);
        assert!(sends[0].1.contains("Recipient not found"));
        assert!(m.copied().is_empty());
    }

    #[tokio::test]
    async fn media_reply_is_duplicated_verbatim() {
        let m = Arc::new(FakeMessenger::default());
        let svc = service(m.clone());
        svc.forward_inquiry(&inquiry(555, "Hello")).await.unwrap();

        let (copy_ref, _) = m.copied()[0];
        let origin = some_origin(ADMIN.0);
        svc.deliver_reply(
            ADMIN,
            &ReplyTarget {
                message_id: copy_ref.message_id,
                text: None,
            },
            &Payload::Media { caption: None },
            origin,
        )
        .await
        .unwrap();

        assert!(m
            .copied()
            .iter()
            .any(|(sent, src)| sent.chat_id == ChatId(555) && *src == origin));
    }

    #[tokio::test]
    async fn degraded_forward_keeps_the_surviving_row() {
        let m = Arc::new(FakeMessenger::default());
        m.fail_copies_to(ADMIN_CHAT.0);
        let svc = service(m.clone());

        let outcome = svc.forward_inquiry(&inquiry(555, "Hello")).await.unwrap();
        assert_eq!(outcome, ForwardOutcome::Degraded);

        let (header_ref, _) = admin_header(&m);
        assert_eq!(
            svc.correlation.get(header_ref.message_id).await,
            Some(UserId(555))
        );
        assert_eq!(svc.correlation.len().await, 1);
    }

    #[tokio::test]
    async fn total_forward_failure_notifies_the_sender() {
        let m = Arc::new(FakeMessenger::default());
        m.fail_sends_to(ADMIN_CHAT.0);
        m.fail_copies_to(ADMIN_CHAT.0);
        let svc = service(m.clone());

        let err = svc.forward_inquiry(&inquiry(555, "Hello")).await.unwrap_err();
        assert!(matches!(err, Error::Delivery(_)));
        assert!(m
            .sent_to(ChatId(555))
            .iter()
            .any(|html| html.contains("could not be delivered")));
        assert_eq!(svc.correlation.len().await, 0);
    }

    #[tokio::test]
    async fn unconfigured_service_short_circuits_with_a_notice() {
        let m = Arc::new(FakeMessenger::default());
        let svc = RelayService::new(None, m.clone(), 64);

        let err = svc.forward_inquiry(&inquiry(555, "Hello")).await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured));
        assert!(m
            .sent_to(ChatId(555))
            .iter()
            .any(|html| html.contains("no operator configured")));
        assert_eq!(svc.correlation.len().await, 0);
        assert!(m.copied().is_empty());
    }

    #[tokio::test]
    async fn active_target_is_consumed_by_one_send() {
        let m = Arc::new(FakeMessenger::default());
        let svc = service(m.clone());

        svc.handle_command(ADMIN, AdminAction::SetTarget { user: UserId(77) })
            .await
            .unwrap();
        assert!(svc.has_active_target(ADMIN).await);

        svc.send_to_target(ADMIN, &Payload::Text("ping".to_string()), some_origin(ADMIN.0))
            .await
            .unwrap();
        assert!(!svc.has_active_target(ADMIN).await);
        assert!(m
            .sent_to(ChatId(77))
            .iter()
            .any(|html| html.contains("ping")));

        // No reactivation: the next free-form send has nowhere to go.
        let err = svc
            .send_to_target(ADMIN, &Payload::Text("again".to_string()), some_origin(ADMIN.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedRecipient));
    }

    #[tokio::test]
    async fn failed_target_send_still_consumes_the_session() {
        let m = Arc::new(FakeMessenger::default());
        m.fail_sends_to(77);
        let svc = service(m.clone());

        svc.handle_command(ADMIN, AdminAction::SetTarget { user: UserId(77) })
            .await
            .unwrap();
        let err = svc
            .send_to_target(ADMIN, &Payload::Text("ping".to_string()), some_origin(ADMIN.0))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Delivery(_)));
        assert!(!svc.has_active_target(ADMIN).await);
        assert!(m
            .sent_to(ADMIN_CHAT)
            .iter()
            .any(|html| html.contains("Could not deliver to UID: 77")));
    }

    #[tokio::test]
    async fn direct_send_bypasses_correlation() {
        let m = Arc::new(FakeMessenger::default());
        let svc = service(m.clone());

        svc.handle_command(
            ADMIN,
            AdminAction::DirectSend {
                user: UserId(321),
                text: "direct hello".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(m
            .sent_to(ChatId(321))
            .iter()
            .any(|html| html.contains("direct hello")));
        assert!(m
            .sent_to(ADMIN_CHAT)
            .iter()
            .any(|html| html.contains("Delivered to UID: 321")));
        assert_eq!(svc.correlation.len().await, 0);
    }

    #[tokio::test]
    async fn cancel_clears_the_target() {
        let m = Arc::new(FakeMessenger::default());
        let svc = service(m.clone());

        svc.handle_command(ADMIN, AdminAction::SetTarget { user: UserId(77) })
            .await
            .unwrap();
        svc.handle_command(ADMIN, AdminAction::CancelTarget)
            .await
            .unwrap();

        assert!(!svc.has_active_target(ADMIN).await);
        assert!(m
            .sent_to(ADMIN_CHAT)
            .iter()
            .any(|html| html.contains("Active target cleared")));
    }

    #[tokio::test]
    async fn delivery_failure_preserves_correlation_rows() {
        let m = Arc::new(FakeMessenger::default());
        let svc = service(m.clone());
        svc.forward_inquiry(&inquiry(555, "Hello")).await.unwrap();
        let (copy_ref, _) = m.copied()[0];

        m.fail_sends_to(555);
        let err = svc
            .deliver_reply(
                ADMIN,
                &ReplyTarget {
                    message_id: copy_ref.message_id,
                    text: None,
                },
                &Payload::Text("Hi".to_string()),
                some_origin(ADMIN.0),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Delivery(_)));
        // The row survives for a later retry.
        assert_eq!(
            svc.correlation.get(copy_ref.message_id).await,
            Some(UserId(555))
        );
        assert!(m
            .sent_to(ADMIN_CHAT)
            .iter()
            .any(|html| html.contains("Could not deliver to UID: 555")));
    }
}
