//! Outbound notification port.
//!
//! The engine informs guardians after successful state changes (check-in,
//! block/unblock, payment). Delivery is somebody else's problem: the
//! gateway behind [`NotificationGateway`] may talk to a WhatsApp bridge, an
//! SMS provider, or nothing at all. Dispatch is fire-and-forget — a slow or
//! failing gateway must never delay or fail the state change that
//! triggered the message, so sends run on a spawned task and failures are
//! only logged.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Delivery failure reported by a gateway. Never converted into a domain
/// error; the triggering operation has already committed.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// Port implemented by the outbound message transport.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn notify(&self, contact: &str, message: &str) -> Result<(), NotificationError>;
}

/// Default in-process gateway: logs the message and reports success. Useful
/// for development and for deployments that run without a transport.
pub struct LoggingGateway;

#[async_trait]
impl NotificationGateway for LoggingGateway {
    async fn notify(&self, contact: &str, message: &str) -> Result<(), NotificationError> {
        debug!(contact = %contact, chars = message.len(), "notification (logging gateway)");
        Ok(())
    }
}

/// Fire-and-forget dispatcher shared by the services.
#[derive(Clone)]
pub struct NotificationDispatcher {
    gateway: Arc<dyn NotificationGateway>,
}

impl NotificationDispatcher {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self { gateway }
    }

    /// Send outside the critical path. Returns immediately; the outcome is
    /// logged on the spawned task.
    pub fn dispatch(&self, contact: String, message: String) {
        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            if let Err(err) = gateway.notify(&contact, &message).await {
                warn!(contact = %contact, error = %err, "notification delivery failed");
            }
        });
    }
}

/// Parent-facing message after a successful check-in.
pub fn check_in_message(student_name: &str, group_name: &str, date: &str) -> String {
    format!(
        "عزيزي ولي أمر الطالب {student_name},\n\
         -----------------------------\n\
         نود إعلامكم بأن الطالب قد تم تسجيل حضوره اليوم.\n\
         المجموعة: {group_name}\n\
         التاريخ: {date}\n\
         شكرًا لتعاونكم."
    )
}

/// Parent-facing message when a student is blocked.
pub fn block_message(student_name: &str, reason: &str, date: &str) -> String {
    format!(
        "عزيزي ولي أمر الطالب {student_name},\n\
         -----------------------------\n\
         نود إعلامكم بأن الطالب تم ايقافه من المركز مؤقتاً.\n\
         السبب: {reason}\n\
         التاريخ: {date}\n\
         يرجى التواصل مع إدارة المركز لحل المشكلة.\n\
         شكراً لتفهمكم."
    )
}

/// Parent-facing message when a block is lifted.
pub fn unblock_message(student_name: &str, date: &str) -> String {
    format!(
        "عزيزي ولي أمر الطالب {student_name},\n\
         -----------------------------\n\
         نود إعلامكم بأن الطالب تم إلغاء حظره من المركز.\n\
         يمكن للطالب الآن العودة للحضور بشكل طبيعي.\n\
         التاريخ: {date}\n\
         شكراً لتعاونكم."
    )
}

/// Parent-facing message after a recorded monthly payment.
pub fn payment_message(student_name: &str, date: &str) -> String {
    format!(
        "عزيزي ولي أمر الطالب {student_name},\n\
         -----------------------------\n\
         نود إعلامكم بأنه تم تسجيل دفع الرسوم الشهرية للطالب.\n\
         التاريخ: {date}\n\
         شكرًا لتعاونكم."
    )
}

#[cfg(test)]
pub mod testing {
    //! Gateways used by service tests.

    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every message it is asked to deliver.
    #[derive(Default)]
    pub struct RecordingGateway {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl NotificationGateway for RecordingGateway {
        async fn notify(&self, contact: &str, message: &str) -> Result<(), NotificationError> {
            self.sent
                .lock()
                .expect("gateway mutex")
                .push((contact.to_string(), message.to_string()));
            Ok(())
        }
    }

    /// Always fails; used to prove failures never reach the caller.
    pub struct FailingGateway;

    #[async_trait]
    impl NotificationGateway for FailingGateway {
        async fn notify(&self, _contact: &str, _message: &str) -> Result<(), NotificationError> {
            Err(NotificationError("gateway unreachable".into()))
        }
    }

    /// Wait for the spawned dispatch task to run.
    pub async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
