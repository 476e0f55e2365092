use std::env;
use std::sync::Arc;

use anyhow::Result;
use futures_util::StreamExt;
use lapin::{
    BasicProperties, Channel, ExchangeKind,
    message::Delivery,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
        ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
    },
    types::FieldTable,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod handler;

use common::broker::BrokerConfig;
use common::database::{DatabaseConfig, health_check, init_pool};
use users::repositories::{PgUserRepository, UserRepository};

const EXCHANGE: &str = "topic_logs";
const QUEUE: &str = "rpc.users.get";
const ROUTING_KEY: &str = "users.get";

/// Build the tracing filter: RUST_LOG wins; otherwise info-level, widened
/// to sqlx statement logging when SQL_ECHO=true
fn env_filter() -> EnvFilter {
    let sql_echo = env::var("SQL_ECHO")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let default_directives = if sql_echo { "info,sqlx=debug" } else { "info" };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();

    info!("Starting users RPC worker");

    // Initialize database connection pool (bounded retry, then abort)
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let repository: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool));

    // Connect to the broker (bounded retry, then abort)
    let broker_config = BrokerConfig::from_env()?;
    let connection = common::broker::connect(&broker_config).await?;
    let channel = connection.create_channel().await?;

    // Topic exchange, durable queue, bound under the lookup routing key
    channel
        .exchange_declare(
            EXCHANGE,
            ExchangeKind::Topic,
            ExchangeDeclareOptions::default(),
            FieldTable::default(),
        )
        .await?;
    channel
        .queue_declare(
            QUEUE,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;
    channel
        .queue_bind(
            QUEUE,
            EXCHANGE,
            ROUTING_KEY,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    let mut consumer = channel
        .basic_consume(
            QUEUE,
            "users-rpc",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await?;

    info!("Listening for {}", ROUTING_KEY);

    // One task per delivery; in-flight concurrency is bounded by the
    // broker's prefetch policy, not by the worker
    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let channel = channel.clone();
                let repository = Arc::clone(&repository);
                tokio::spawn(async move {
                    handle_delivery(channel, repository, delivery).await;
                });
            }
            Err(e) => {
                error!("Consumer stream error: {}", e);
            }
        }
    }

    Ok(())
}

/// Process one delivery: decode, look up, reply if addressed, settle.
///
/// Decode and publish failures are negatively acknowledged without requeue;
/// lookup failures are answered with `ok: false` and positively
/// acknowledged.
async fn handle_delivery(channel: Channel, repository: Arc<dyn UserRepository>, delivery: Delivery) {
    let request = match handler::decode_request(&delivery.data) {
        Ok(request) => request,
        Err(e) => {
            warn!("Dropping undecodable message: {}", e);
            nack(&delivery).await;
            return;
        }
    };

    info!(
        "Received {}: user_id={:?}",
        delivery.routing_key, request.user_id
    );

    let reply = handler::lookup(repository.as_ref(), request.user_id).await;

    // Reply only when the caller told us where and how to correlate
    let reply_to = delivery.properties.reply_to().clone();
    let correlation_id = delivery.properties.correlation_id().clone();
    if let (Some(reply_to), Some(correlation_id)) = (reply_to, correlation_id) {
        let payload = match serde_json::to_vec(&reply) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode reply: {}", e);
                nack(&delivery).await;
                return;
            }
        };

        // Default exchange: the reply queue name is the routing key
        let published = channel
            .basic_publish(
                "",
                reply_to.as_str(),
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_correlation_id(correlation_id),
            )
            .await;

        if let Err(e) = published {
            error!("Failed to publish reply to {}: {}", reply_to, e);
            nack(&delivery).await;
            return;
        }
    }

    if let Err(e) = delivery.acker.ack(BasicAckOptions::default()).await {
        error!("Failed to ack delivery: {}", e);
    }
}

async fn nack(delivery: &Delivery) {
    let options = BasicNackOptions {
        requeue: false,
        ..Default::default()
    };
    if let Err(e) = delivery.acker.nack(options).await {
        error!("Failed to nack delivery: {}", e);
    }
}
