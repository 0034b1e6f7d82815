use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// A state-machine transition fanned out to in-process subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct StateTransition {
    pub topic: &'static str,
    pub workflow_id: String,
    pub from_state: String,
    pub to_state: String,
    pub occurred_at: DateTime<Utc>,
}

/// Broadcast publisher for lifecycle transitions.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<StateTransition>,
}

impl EventPublisher {
    /// Create a publisher with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Fan out a transition under the given topic. Runs publish
    /// unconditionally; with no subscribers the notification is dropped.
    pub fn publish_transition(
        &self,
        topic: &'static str,
        workflow_id: &str,
        from_state: impl ToString,
        to_state: impl ToString,
    ) {
        let transition = StateTransition {
            topic,
            workflow_id: workflow_id.to_string(),
            from_state: from_state.to_string(),
            to_state: to_state.to_string(),
            occurred_at: Utc::now(),
        };
        let _ = self.sender.send(transition);
    }

    /// Subscribe to transitions published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StateTransition> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
