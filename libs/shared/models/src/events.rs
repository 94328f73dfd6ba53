use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::appointment::AppointmentStatus;
use crate::patient::SessionAllowance;

/// Structured payloads handed to the external notification dispatcher.
/// Delivery (email/SMS) happens entirely outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClinicEvent {
    StatusChanged {
        patient_id: Uuid,
        appointment_id: Uuid,
        old_status: AppointmentStatus,
        new_status: AppointmentStatus,
    },
    SessionBalanceChanged {
        patient_id: Uuid,
        appointment_id: Uuid,
        allowance: SessionAllowance,
    },
}

/// Broadcast channel for "data changed" signals. Subscribers that fall
/// behind simply miss events; consumers are expected to re-read snapshots,
/// not to replay deltas.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClinicEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClinicEvent> {
        self.tx.subscribe()
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: ClinicEvent) {
        if self.tx.send(event).is_err() {
            debug!("event published with no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_status_changes() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(ClinicEvent::StatusChanged {
            patient_id: Uuid::new_v4(),
            appointment_id: Uuid::new_v4(),
            old_status: AppointmentStatus::Pending,
            new_status: AppointmentStatus::Completed,
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ClinicEvent::StatusChanged { .. }));
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(ClinicEvent::SessionBalanceChanged {
            patient_id: Uuid::new_v4(),
            appointment_id: Uuid::new_v4(),
            allowance: SessionAllowance::default(),
        });
    }
}
