//! WhatsApp bridge adapter: an outward WebSocket client to an external
//! bridge process (this side never listens). Owns the reconnect loop, the
//! bridge's JSON frame protocol, and the ordered inbound-message checks
//! before anything reaches the agent loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{watch, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zapista_core::message::{InboundMessage, InboundMetadata, OutboundMessage};
use zapista_core::types::TraceId;
use zapista_bus::MessageBus;
use zapista_scheduler::SchedulerHandle;
use zapista_users::PendingStore;

use crate::channel::Channel;
use crate::deps::{AccessControl, AdminPipeline, IcsImporter, RestartExecutor, SpeechToText};
use crate::error::ChannelError;
use crate::sent_mapping::{PendingSends, SentAck, SentMapping};
use crate::types::{
    BridgeConnectionStatus, BridgeInboundFrame, BridgeSendFrame, ChannelStatus, ReactionClass,
};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const WHATSAPP_GROUP_SUFFIX: &str = "@g.us";
const VOICE_PLACEHOLDER: &str = "[Voice Message]";

/// Dependencies the bridge needs beyond the raw WebSocket, all injected by
/// the daemon at startup.
pub struct BridgeDeps {
    pub bus: Arc<MessageBus>,
    pub scheduler: Arc<SchedulerHandle>,
    pub access: Arc<dyn AccessControl>,
    pub admin: Arc<dyn AdminPipeline>,
    pub stt: Option<Arc<dyn SpeechToText>>,
    pub ics: Option<Arc<dyn IcsImporter>>,
    pub restart: Arc<dyn RestartExecutor>,
    /// Pending two-step confirmations (`/restart`, completion confirmations),
    /// keyed by `Owner::key()`.
    pub pending: Arc<PendingStore>,
}

type WsWriter = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    WsMessage,
>;

pub struct WhatsAppBridge {
    bridge_url: String,
    status: Mutex<ChannelStatus>,
    writer: Mutex<Option<WsWriter>>,
    pending_sends: PendingSends,
    sent_mapping: SentMapping,
    had_first_disconnect: AtomicBool,
}

impl WhatsAppBridge {
    pub fn new(bridge_url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            bridge_url: bridge_url.into(),
            status: Mutex::new(ChannelStatus::Disconnected),
            writer: Mutex::new(None),
            pending_sends: PendingSends::new(),
            sent_mapping: SentMapping::new(),
            had_first_disconnect: AtomicBool::new(false),
        })
    }

    fn is_connected(&self) -> bool {
        self.writer.try_lock().map(|w| w.is_some()).unwrap_or(false)
    }

    async fn set_status(&self, status: ChannelStatus) {
        *self.status.lock().await = status;
    }

    /// Runs forever: connect, read frames until EOF/error, sleep 5 s,
    /// reconnect. Exits only on shutdown.
    pub async fn run(self: Arc<Self>, deps: BridgeDeps, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }

            self.set_status(ChannelStatus::Connecting).await;
            match tokio_tungstenite::connect_async(&self.bridge_url).await {
                Ok((stream, _)) => {
                    self.set_status(ChannelStatus::Connected).await;
                    info!("whatsapp bridge connected");
                    let (write, mut read) = stream.split();
                    *self.writer.lock().await = Some(write);

                    loop {
                        tokio::select! {
                            biased;
                            _ = shutdown.changed() => {
                                if *shutdown.borrow() {
                                    *self.writer.lock().await = None;
                                    return;
                                }
                            }
                            frame = read.next() => {
                                match frame {
                                    Some(Ok(WsMessage::Text(text))) => {
                                        self.dispatch_frame(&text, &deps).await;
                                    }
                                    Some(Ok(WsMessage::Close(_))) | None => {
                                        warn!("whatsapp bridge closed the connection");
                                        break;
                                    }
                                    Some(Ok(_)) => {} // ignore binary/ping/pong frames
                                    Some(Err(e)) => {
                                        warn!("whatsapp bridge read error: {e}");
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("whatsapp bridge connect failed: {e}");
                }
            }

            *self.writer.lock().await = None;
            self.set_status(ChannelStatus::Disconnected).await;
            if !self.had_first_disconnect.swap(true, Ordering::SeqCst) {
                debug!(metric = "bridge_reconnect", "first reconnect after disconnect");
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn dispatch_frame(&self, raw: &str, deps: &BridgeDeps) {
        let frame: BridgeInboundFrame = match serde_json::from_str(raw) {
            Ok(f) => f,
            Err(e) => {
                warn!("malformed bridge frame, dropping: {e}");
                return;
            }
        };

        if matches!(frame, BridgeInboundFrame::Message { .. }) {
            self.handle_message(frame, deps).await;
            return;
        }

        match frame {
            BridgeInboundFrame::Message { .. } => unreachable!("handled above"),
            BridgeInboundFrame::Reaction {
                chat_id,
                message_id,
                emoji,
                from_me,
            } => {
                if from_me {
                    return;
                }
                self.handle_reaction(&chat_id, &message_id, &emoji, deps).await;
            }
            BridgeInboundFrame::Sent { request_id, id, job_id } => {
                self.pending_sends.resolve(
                    &request_id,
                    SentAck {
                        bridge_message_id: id,
                        job_id,
                    },
                );
            }
            BridgeInboundFrame::Status { status } => {
                let mapped = match status {
                    BridgeConnectionStatus::Connected => ChannelStatus::Connected,
                    BridgeConnectionStatus::Disconnected => ChannelStatus::Disconnected,
                };
                self.set_status(mapped).await;
            }
            BridgeInboundFrame::Qr => info!("whatsapp bridge requests QR pairing"),
            BridgeInboundFrame::Error { error } => warn!("whatsapp bridge reported error: {error}"),
        }
    }

    /// The ordered checks from the bridge spec: dedup, group filter, voice
    /// transcription, ICS import, admin pipeline, `/restart`, allow-list and
    /// mute, then publish.
    async fn handle_message(&self, frame: BridgeInboundFrame, deps: &BridgeDeps) {
        let BridgeInboundFrame::Message {
            id,
            sender,
            pn,
            content,
            timestamp,
            is_group,
            media_base64,
            attachment_ics,
            ..
        } = frame
        else {
            return;
        };

        // 1. Dedup by id (or content bucket if the bridge sent no id).
        let chat_id = sender.clone();
        let msg_id_opt = if id.is_empty() { None } else { Some(id.as_str()) };
        if deps.bus.is_duplicate_inbound(&chat_id, &content, msg_id_opt).await {
            debug!("dropping duplicate inbound message");
            return;
        }

        // 2. Reject groups.
        if is_group || chat_id.ends_with(WHATSAPP_GROUP_SUFFIX) {
            debug!("dropping group message");
            return;
        }

        let sender_id = pn.unwrap_or(sender.clone());
        let sender_id = sender_id.split('@').next().unwrap_or(&sender_id).to_string();

        // 3. Voice message: transcribe or bail with a localized error.
        let mut content = content;
        if content == VOICE_PLACEHOLDER {
            match (media_base64.as_deref(), &deps.stt) {
                (Some(audio), Some(stt)) => match stt.transcribe(audio).await {
                    Ok(text) => content = text,
                    Err(e) => {
                        warn!("speech-to-text failed: {e}");
                        self.send_reply(deps, &chat_id, "Não consegui entender o áudio. Tente digitar.").await;
                        return;
                    }
                },
                _ => {
                    self.send_reply(deps, &chat_id, "Não consegui processar essa mensagem de voz.").await;
                    return;
                }
            }
        }

        // 4. ICS attachment: import and stop.
        if let Some(ics) = attachment_ics {
            if let Some(importer) = &deps.ics {
                match importer.import("whatsapp", &chat_id, &ics).await {
                    Ok(summary) => self.send_reply(deps, &chat_id, &summary).await,
                    Err(e) => {
                        warn!("ics import failed: {e}");
                        self.send_reply(deps, &chat_id, "Não consegui importar esse calendário.").await;
                    }
                }
            }
            return;
        }

        // 5. Admin (God Mode) pipeline.
        if content.starts_with('#') {
            if let Some(reply) = deps.admin.handle(&chat_id, &content).await {
                self.send_reply(deps, &chat_id, &reply).await;
            }
            return;
        }

        // 6. `/restart` two-step confirmation, persisted per owner.
        let owner_key = format!("whatsapp:{chat_id}");
        if content.trim().eq_ignore_ascii_case("/restart") {
            deps.pending.set(&owner_key, "restart_confirm_1", serde_json::json!({}));
            self.send_reply(deps, &chat_id, "Confirma o reinício? (sim/não)").await;
            return;
        }
        if let Some(pending) = deps.pending.get(&owner_key) {
            if pending.action == "restart_confirm_1" || pending.action == "restart_confirm_2" {
                let affirmative = is_affirmative(&content);
                if !affirmative {
                    deps.pending.clear(&owner_key);
                    self.send_reply(deps, &chat_id, "Reinício cancelado.").await;
                    return;
                }
                if pending.action == "restart_confirm_1" {
                    deps.pending.set(&owner_key, "restart_confirm_2", serde_json::json!({}));
                    self.send_reply(deps, &chat_id, "Tem certeza? Essa ação reinicia o sistema.").await;
                } else {
                    deps.pending.clear(&owner_key);
                    deps.restart.restart().await;
                }
                return;
            }
        }

        // 7. Allow-list and mute.
        if !deps.access.is_allowed(&chat_id) {
            self.send_reply(deps, &chat_id, "Este número não está autorizado a usar o assistente.").await;
            return;
        }
        if deps.access.is_muted(&chat_id) {
            debug!("dropping message from muted chat");
            return;
        }

        // 8. Publish to the bus.
        let inbound = InboundMessage {
            channel: "whatsapp".into(),
            sender_id,
            chat_id,
            content,
            timestamp: chrono::DateTime::from_timestamp(timestamp, 0).unwrap_or_else(chrono::Utc::now),
            media: media_base64.into_iter().collect(),
            metadata: InboundMetadata {
                message_id: msg_id_opt.map(String::from),
                is_group,
                trace_id: TraceId::new(),
            },
        };
        deps.bus.publish_inbound(inbound);
    }

    async fn handle_reaction(&self, chat_id: &str, message_id: &str, emoji: &str, deps: &BridgeDeps) {
        let Some(job_id) = self.sent_mapping.take(chat_id, message_id) else {
            return;
        };
        let Some(class) = ReactionClass::classify(emoji) else {
            return;
        };
        let owner_key = format!("whatsapp:{chat_id}");

        match class {
            ReactionClass::Positive => {
                deps.pending.set(
                    &owner_key,
                    "completion_confirm",
                    serde_json::json!({ "job_id": job_id }),
                );
                self.send_reply(deps, chat_id, "Confirmas que concluiu? (sim/não)").await;
            }
            ReactionClass::Snooze => {
                let owner = zapista_core::types::Owner::new("whatsapp", chat_id);
                match deps.scheduler.snooze_job(&owner, &job_id) {
                    Ok(_) => self.send_reply(deps, chat_id, "Adiado por 5 minutos.").await,
                    Err(e) => {
                        warn!("snooze failed: {e}");
                        self.send_reply(deps, chat_id, "Já adiei isso o máximo de vezes possível.").await;
                    }
                }
            }
            ReactionClass::Negative => {
                let owner = zapista_core::types::Owner::new("whatsapp", chat_id);
                let _ = deps.scheduler.remove_job(&owner, &job_id);
                self.send_reply(deps, chat_id, "Removido. Me diga um novo horário.").await;
            }
        }
    }

    async fn send_reply(&self, deps: &BridgeDeps, chat_id: &str, text: &str) {
        let msg = OutboundMessage::new("whatsapp", chat_id, text);
        deps.bus.publish_outbound(msg).await;
    }

    async fn write_frame(&self, payload: String) -> Result<(), ChannelError> {
        let mut guard = self.writer.lock().await;
        match guard.as_mut() {
            Some(writer) => writer
                .send(WsMessage::Text(payload))
                .await
                .map_err(|e| ChannelError::SendFailed(e.to_string())),
            None => Err(ChannelError::ConnectionFailed("bridge not connected".into())),
        }
    }
}

fn is_affirmative(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "sim" | "s" | "yes" | "y" | "si"
    )
}

#[async_trait]
impl Channel for WhatsAppBridge {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn connect(&mut self) -> Result<(), ChannelError> {
        // Connection is driven entirely by `run`'s own loop; this exists to
        // satisfy the generic `Channel` interface.
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ChannelError> {
        *self.writer.lock().await = None;
        self.set_status(ChannelStatus::Disconnected).await;
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        if !self.is_connected() {
            warn!(metric = "whatsapp_skipped", chat_id = %msg.chat_id, "bridge disconnected, dropping send");
            return Err(ChannelError::ConnectionFailed("bridge not connected".into()));
        }

        let request_id = Uuid::new_v4().simple().to_string();
        let rx = self.pending_sends.register(&request_id);
        let frame = BridgeSendFrame::new(
            &msg.chat_id,
            &msg.content,
            &request_id,
            msg.metadata.job_id.as_deref(),
        );
        let payload = serde_json::to_string(&frame).map_err(ChannelError::MalformedFrame)?;
        self.write_frame(payload).await?;

        match tokio::time::timeout(crate::sent_mapping::PENDING_SEND_TIMEOUT, rx).await {
            Ok(Ok(ack)) => {
                if let Some(job_id) = ack.job_id {
                    self.sent_mapping.record(&msg.chat_id, &ack.bridge_message_id, job_id);
                }
                Ok(())
            }
            _ => {
                self.pending_sends.cancel(&request_id);
                Err(ChannelError::Timeout { ms: 10_000 })
            }
        }
    }

    fn status(&self) -> ChannelStatus {
        self.status
            .try_lock()
            .map(|s| s.clone())
            .unwrap_or(ChannelStatus::Connecting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmative_matches_common_forms() {
        assert!(is_affirmative("Sim"));
        assert!(is_affirmative(" s "));
        assert!(!is_affirmative("não"));
        assert!(!is_affirmative("talvez"));
    }
}
