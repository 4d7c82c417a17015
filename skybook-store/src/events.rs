use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use skybook_core::collaborators::NotificationDispatcher;
use skybook_core::effects::BookingConfirmation;
use skybook_core::{CoreError, CoreResult};
use std::time::Duration;
use tracing::{error, info};

pub const BOOKING_CONFIRMED_TOPIC: &str = "booking.confirmed";

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self
            .producer
            .send(record, Timeout::After(Duration::from_secs(0)))
            .await
        {
            Ok(delivery) => {
                info!(
                    topic,
                    key,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    "event published"
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!(topic, key, error = %e, "event publish failed");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl NotificationDispatcher for EventProducer {
    async fn dispatch_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> CoreResult<()> {
        let payload = serde_json::to_string(confirmation)
            .map_err(|e| CoreError::InternalError(e.to_string()))?;
        self.publish(
            BOOKING_CONFIRMED_TOPIC,
            &confirmation.booking_reference,
            &payload,
        )
        .await
        .map_err(|e| CoreError::DependencyUnavailable(e.to_string()))
    }
}
