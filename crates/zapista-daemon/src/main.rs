//! Process entry point: loads config, constructs every subsystem, and
//! wires them together. No HTTP surface, no CLI surface beyond config
//! loading — the only outward connection is the WhatsApp bridge's own
//! outbound WebSocket client.

mod delivery;

use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::watch;
use tracing::{info, warn};

use zapista_admin::{hash_password, AdminEngine, AdminEngineConfig};
use zapista_agent::AgentLoop;
use zapista_bus::MessageBus;
use zapista_channels::{BridgeDeps, Channel, WhatsAppBridge};
use zapista_core::config::ZapistaConfig;
use zapista_core::lists::ListStore;
use zapista_core::message::OutboundMessage;
use zapista_core::types::Owner;
use zapista_scheduler::SchedulerEngine;
use zapista_sessions::SessionManager;
use zapista_users::{PendingStore, ReminderHistoryStore, ResolvedUser, UserResolver};

use delivery::{ProcessRestartExecutor, ReminderDeliveryHandler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zapista_daemon=info".into()),
        )
        .init();

    // load config: explicit path > ZAPISTA_CONFIG env > ~/.zapista/zapista.toml
    let config_path = std::env::var("ZAPISTA_CONFIG").ok();
    let config = ZapistaConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("config load failed ({e}), using defaults");
        ZapistaConfig::default()
    });

    std::fs::create_dir_all(&config.database.data_dir)?;

    let users_conn = Connection::open(config.database.sqlite_path())?;
    zapista_users::db::init_db(&users_conn)?;
    let users = Arc::new(UserResolver::new(Arc::new(std::sync::Mutex::new(users_conn))));

    let sessions_conn = Connection::open(config.database.sqlite_path())?;
    zapista_sessions::db::init_db(&sessions_conn)?;
    let sessions = Arc::new(SessionManager::new(sessions_conn));

    let reminder_history_conn = Connection::open(config.database.sqlite_path())?;
    zapista_users::reminder_history::init_db(&reminder_history_conn)?;
    let reminder_history = Arc::new(ReminderHistoryStore::new(Arc::new(std::sync::Mutex::new(
        reminder_history_conn,
    ))));

    let lists = Arc::new(ListStore::load(config.database.lists_store_path())?);
    let pending = Arc::new(PendingStore::new());

    let admin = Arc::new(AdminEngine::load(AdminEngineConfig {
        god_mode_path: config.database.god_mode_path(),
        mute_path: config.database.mute_ledger_path(),
        password_hash: config.admin.password.as_deref().map(hash_password),
        max_attempts: config.admin.max_attempts,
        lockout_ms: config.admin.lockout_minutes * 60_000,
        static_allow_list: config.admin.allow_list.clone(),
    })?);

    let (scheduler_engine, scheduler) = SchedulerEngine::new(config.database.cron_store_path())?;

    let bus = match &config.bus.redis_url {
        Some(url) => match MessageBus::with_redis(url, &config.bus.namespace).await {
            Ok(redis_bus) => Arc::new(redis_bus),
            Err(e) => {
                warn!("redis bus init failed ({e}), falling back to in-memory bus");
                Arc::new(MessageBus::new())
            }
        },
        None => Arc::new(MessageBus::new()),
    };

    let agent = Arc::new(AgentLoop::new(
        scheduler.clone(),
        Arc::clone(&lists),
        Arc::clone(&pending),
        Arc::clone(&sessions),
        Arc::clone(&reminder_history),
        Arc::clone(&bus),
        None,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler_handler = Arc::new(ReminderDeliveryHandler::new(
        Arc::clone(&bus),
        Arc::clone(&agent),
        Arc::clone(&users),
        Arc::clone(&reminder_history),
    ));
    let scheduler_task = tokio::spawn(scheduler_engine.run(scheduler_handler, shutdown_rx.clone()));

    let bridge = WhatsAppBridge::new(config.whatsapp.bridge_url.clone());
    let bridge_deps = BridgeDeps {
        bus: Arc::clone(&bus),
        scheduler: Arc::new(scheduler.clone()),
        access: admin.clone(),
        admin: admin.clone(),
        stt: None,
        ics: None,
        restart: Arc::new(ProcessRestartExecutor),
        pending: Arc::clone(&pending),
    };
    let bridge_task = tokio::spawn(Arc::clone(&bridge).run(bridge_deps, shutdown_rx.clone()));

    let outbound_bridge = Arc::clone(&bridge);
    let outbound_bus = Arc::clone(&bus);
    let mut outbound_shutdown = shutdown_rx.clone();
    let outbound_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = outbound_shutdown.changed() => {
                    if *outbound_shutdown.borrow() {
                        return;
                    }
                }
                msg = outbound_bus.consume_outbound() => {
                    let Some(msg) = msg else { return; };
                    if msg.channel == "whatsapp" {
                        if let Err(e) = outbound_bridge.send(&msg).await {
                            warn!(error = %e, chat_id = %msg.chat_id, "outbound delivery failed");
                        }
                    } else {
                        warn!(channel = %msg.channel, "no adapter registered for outbound channel");
                    }
                }
            }
        }
    });

    let inbound_agent = Arc::clone(&agent);
    let inbound_bus = Arc::clone(&bus);
    let inbound_users = Arc::clone(&users);
    let mut inbound_shutdown = shutdown_rx.clone();
    let inbound_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = inbound_shutdown.changed() => {
                    if *inbound_shutdown.borrow() {
                        return;
                    }
                }
                msg = inbound_bus.consume_inbound() => {
                    let Some(msg) = msg else { return; };
                    let user = match inbound_users.resolve(&msg.sender_id) {
                        Ok(ResolvedUser::Known(u)) => u,
                        Ok(ResolvedUser::NewlyCreated { user, .. }) => user,
                        Err(e) => {
                            warn!(error = %e, "user resolution failed, dropping inbound message");
                            continue;
                        }
                    };
                    let owner = Owner::new(&msg.channel, &msg.chat_id);
                    let reply = inbound_agent.process_turn(owner.clone(), user, &msg.content).await;
                    inbound_bus
                        .publish_outbound(OutboundMessage::new(&owner.channel, &owner.chat_id, reply))
                        .await;
                }
            }
        }
    });

    info!("zapista daemon started");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = tokio::join!(scheduler_task, bridge_task, outbound_task, inbound_task);
    Ok(())
}
