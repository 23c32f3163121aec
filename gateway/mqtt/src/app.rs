//! The MQTT application loop.
//!
//! Subscribes to the PLC feed topics, hands data payloads to the
//! normalization handler, republishes every returned record at QoS 1.
//! After a successful startup the loop survives broker outages: poll
//! errors back off and retry, and subscriptions are reissued on every
//! reconnect.

use std::time::Duration;

use anyhow::{Context, Result};
use plcnormalization::MessageHandler;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;

pub const DATA_TOPIC: &str = "celima/data";
pub const ERROR_TOPIC: &str = "celima/error";
pub const JOIN_TOPIC: &str = "celima/join";
pub const ACK_TOPIC: &str = "celima/ACK";

const SUBSCRIPTIONS: &[&str] = &[DATA_TOPIC, ERROR_TOPIC, JOIN_TOPIC, ACK_TOPIC];

pub struct MqttApp {
    client: AsyncClient,
    eventloop: EventLoop,
    handler: MessageHandler,
}

impl MqttApp {
    pub fn new(cfg: &Config, handler: MessageHandler) -> Self {
        let mut opts = MqttOptions::new(&cfg.client_id, &cfg.broker_host, cfg.broker_port);
        opts.set_keep_alive(Duration::from_secs(30));
        opts.set_clean_session(false);

        let (client, eventloop) = AsyncClient::new(opts, 50);
        Self {
            client,
            eventloop,
            handler,
        }
    }

    /// Drive the event loop until the broker acknowledges the session.
    /// Startup is the one place where a connection error is fatal.
    pub async fn wait_until_connected(&mut self) -> Result<()> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("connected to broker");
                    return Ok(());
                }
                Ok(_) => continue,
                Err(e) => return Err(e).context("broker connection failed"),
            }
        }
    }

    async fn subscribe_topics(&self) -> Result<()> {
        for topic in SUBSCRIPTIONS {
            self.client
                .subscribe(*topic, QoS::AtLeastOnce)
                .await
                .with_context(|| format!("subscribe failed for '{topic}'"))?;
        }
        info!(topics = ?SUBSCRIPTIONS, "subscribed (QoS 1)");
        Ok(())
    }

    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        self.subscribe_topics().await?;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("shutdown requested, disconnecting");
                    let _ = self.client.disconnect().await;
                    return Ok(());
                }
                ev = self.eventloop.poll() => match ev {
                    Ok(Event::Incoming(Incoming::Publish(p))) => {
                        self.route(&p.topic, &p.payload).await;
                    }
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        info!("reconnected to broker");
                        self.subscribe_topics().await?;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT poll error: {e} (retrying)");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }

    async fn route(&self, topic: &str, payload: &[u8]) {
        let payload = String::from_utf8_lossy(payload);
        match topic {
            DATA_TOPIC => self.handle_data(&payload).await,
            ERROR_TOPIC => error!(%payload, "device error report"),
            JOIN_TOPIC => info!(%payload, "device joined"),
            ACK_TOPIC => info!(%payload, "device ack"),
            other => debug!(topic = other, "ignoring message on unexpected topic"),
        }
    }

    async fn handle_data(&self, payload: &str) {
        let pubs = match self.handler.handle(payload) {
            Ok(pubs) => pubs,
            Err(e) => {
                error!(%payload, "dropping message: {e}");
                return;
            }
        };

        // One failed publish must not starve the rest of the batch.
        for record in pubs {
            if let Err(e) = self
                .client
                .publish(record.topic.clone(), QoS::AtLeastOnce, false, record.payload)
                .await
            {
                error!(topic = %record.topic, "publish failed: {e}");
            }
        }
    }
}
