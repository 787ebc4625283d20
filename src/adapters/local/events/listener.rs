use super::hub::EventHub;
use crate::application::dispatcher::DispatcherService;
use crate::ports::{jobs::TransformJobPort, storage::ObjectStorePort};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Spawns the task that feeds published events to the dispatcher.
///
/// Dispatch failures are logged and dropped; there is no redelivery.
pub fn start<S, J>(
    event_hub: Arc<EventHub>,
    dispatcher: Arc<DispatcherService<S, J>>,
) -> JoinHandle<()>
where
    S: ObjectStorePort + 'static,
    J: TransformJobPort + 'static,
{
    let mut rx = event_hub.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    tracing::debug!(bucket = %event.bucket, key = %event.key, "object created");
                    if let Err(e) = dispatcher.dispatch(&event).await {
                        tracing::error!(
                            error = %e,
                            bucket = %event.bucket,
                            key = %event.key,
                            "dispatch from notification failed"
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notification listener lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
