use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Domain events emitted by the services.
///
/// The channel carries observability fan-out only; domain side effects
/// (automation, loyalty) run synchronously in the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
    CustomerDeleted(Uuid),
    OrderPlaced(Uuid),
    OrderPaid(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        new_status: String,
    },
    TicketCreated(Uuid),
    FeedbackReceived(Uuid),
    DealStageChanged {
        deal_id: Uuid,
        new_stage: String,
    },
    PointsAwarded {
        customer_id: Uuid,
        points: i32,
    },
    PointsRedeemed {
        customer_id: Uuid,
        points: i32,
    },
    CampaignSent(Uuid),
    WorkflowExecuted {
        workflow_id: Uuid,
        trigger: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event. A full or closed channel is logged and ignored; event
    /// delivery is never allowed to fail a request.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            debug!("event channel closed, dropping event: {}", e);
        }
    }
}

/// Background consumer that logs every event.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "event");
    }
    debug!("event channel drained, processor exiting");
}

/// Creates a connected sender/processor pair with the given channel capacity.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}
