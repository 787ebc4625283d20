use crate::domain::objects::ObjectCreatedEvent;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 100;

#[derive(Debug)]
pub struct EventHub {
    sender: broadcast::Sender<ObjectCreatedEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Returns the number of listeners the event reached.
    pub fn publish(
        &self,
        event: ObjectCreatedEvent,
    ) -> Result<usize, broadcast::error::SendError<ObjectCreatedEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ObjectCreatedEvent> {
        self.sender.subscribe()
    }
}
