//! A minimal in-process message broker with at-least-once delivery.
//!
//! Each named queue is an unbounded channel with a single consumer. A message handed to a consumer is wrapped in a
//! [`Delivery`] that must be settled with [`Delivery::ack`] or [`Delivery::nack`]. A delivery that is dropped without
//! being settled (e.g. because the consumer task was cancelled mid-job) goes back onto the queue, just like an
//! unacknowledged message on a broker connection that died. When a [`Subscription`] is dropped, its end of the queue
//! is handed back to the broker, so redelivered and newly published messages wait for the next consumer.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
    },
};

use log::*;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

pub const DEFAULT_MAX_DELIVERIES: u32 = 5;

#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error("Queue '{0}' has not been declared")]
    UnknownQueue(String),
    #[error("Queue '{0}' already has a consumer")]
    AlreadyConsumed(String),
    #[error("Queue '{0}' is closed")]
    Closed(String),
    #[error("Could not serialize job. {0}")]
    Serialization(String),
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub payload: Vec<u8>,
    /// How many times this message has been handed to a consumer.
    pub deliveries: u32,
}

struct Channel {
    sender: mpsc::UnboundedSender<Message>,
    receiver: Option<mpsc::UnboundedReceiver<Message>>,
}

type Channels = Arc<Mutex<HashMap<String, Channel>>>;

#[derive(Clone)]
pub struct JobQueue {
    channels: Channels,
    next_id: Arc<AtomicU64>,
    max_deliveries: u32,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELIVERIES)
    }
}

impl JobQueue {
    /// Creates a new broker. Messages that are requeued after `max_deliveries` deliveries are dropped.
    pub fn new(max_deliveries: u32) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            max_deliveries: max_deliveries.max(1),
            shutdown: Arc::new(shutdown),
        }
    }

    /// Creates the queue if it does not exist yet.
    pub fn declare(&self, queue: &str) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.entry(queue.to_string()).or_insert_with(|| {
            debug!("📬️ Declared queue '{queue}'");
            let (sender, receiver) = mpsc::unbounded_channel();
            Channel { sender, receiver: Some(receiver) }
        });
    }

    pub fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<u64, QueueError> {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let channel = channels.get(queue).ok_or_else(|| QueueError::UnknownQueue(queue.to_string()))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        channel
            .sender
            .send(Message { id, payload, deliveries: 0 })
            .map_err(|_| QueueError::Closed(queue.to_string()))?;
        trace!("📬️ Message #{id} published to '{queue}'");
        Ok(id)
    }

    /// Attaches the single consumer of `queue`. Once that subscription is dropped, the queue can be consumed again.
    pub fn consume(&self, queue: &str) -> Result<Subscription, QueueError> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let channel = channels.get_mut(queue).ok_or_else(|| QueueError::UnknownQueue(queue.to_string()))?;
        let receiver = channel.receiver.take().ok_or_else(|| QueueError::AlreadyConsumed(queue.to_string()))?;
        Ok(Subscription {
            queue: queue.to_string(),
            receiver: Some(receiver),
            channels: Arc::clone(&self.channels),
            requeue: channel.sender.clone(),
            max_deliveries: self.max_deliveries,
            shutdown: self.shutdown.subscribe(),
        })
    }

    /// Tells every subscription to stop handing out messages.
    pub fn shutdown(&self) {
        info!("📬️ Shutting down job queues");
        self.shutdown.send_replace(true);
    }
}

pub struct Subscription {
    queue: String,
    receiver: Option<mpsc::UnboundedReceiver<Message>>,
    channels: Channels,
    requeue: mpsc::UnboundedSender<Message>,
    max_deliveries: u32,
    shutdown: watch::Receiver<bool>,
}

impl Subscription {
    pub fn queue(&self) -> &str {
        self.queue.as_str()
    }

    /// Waits for the next message. Returns `None` once the broker is shut down.
    pub async fn next(&mut self) -> Option<Delivery> {
        if *self.shutdown.borrow() {
            return None;
        }
        let receiver = self.receiver.as_mut()?;
        let mut message = tokio::select! {
            msg = receiver.recv() => msg?,
            _ = self.shutdown.changed() => return None,
        };
        message.deliveries += 1;
        Some(Delivery {
            message: Some(message),
            queue: self.queue.clone(),
            requeue: self.requeue.clone(),
            max_deliveries: self.max_deliveries,
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            return;
        };
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(channel) = channels.get_mut(&self.queue) {
            debug!("📬️ Consumer of '{}' detached. The queue is waiting for a new consumer.", self.queue);
            channel.receiver = Some(receiver);
        }
    }
}

/// A message on loan to a consumer.
pub struct Delivery {
    message: Option<Message>,
    queue: String,
    requeue: mpsc::UnboundedSender<Message>,
    max_deliveries: u32,
}

impl Delivery {
    pub fn id(&self) -> u64 {
        self.message.as_ref().map(|m| m.id).unwrap_or_default()
    }

    pub fn payload(&self) -> &[u8] {
        self.message.as_ref().map(|m| m.payload.as_slice()).unwrap_or_default()
    }

    pub fn deliveries(&self) -> u32 {
        self.message.as_ref().map(|m| m.deliveries).unwrap_or_default()
    }

    /// Confirms the message has been processed. It will not be delivered again.
    pub fn ack(mut self) {
        if let Some(message) = self.message.take() {
            trace!("📬️ Message #{} on '{}' acknowledged", message.id, self.queue);
        }
    }

    /// Rejects the message. If `requeue` is set, the message goes to the back of the queue, unless it has used up its
    /// deliveries. Returns `true` if the message was requeued.
    pub fn nack(mut self, requeue: bool) -> bool {
        match self.message.take() {
            Some(message) if requeue => self.redeliver(message),
            Some(message) => {
                debug!("📬️ Message #{} on '{}' rejected without requeue", message.id, self.queue);
                false
            },
            None => false,
        }
    }

    fn redeliver(&self, message: Message) -> bool {
        if message.deliveries >= self.max_deliveries {
            error!(
                "📬️ Message #{} on '{}' has been delivered {} times. Dropping it.",
                message.id, self.queue, message.deliveries
            );
            return false;
        }
        let id = message.id;
        match self.requeue.send(message) {
            Ok(()) => {
                debug!("📬️ Message #{id} requeued on '{}'", self.queue);
                true
            },
            Err(_) => {
                warn!("📬️ Could not requeue message #{id}. Queue '{}' is closed", self.queue);
                false
            },
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if let Some(message) = self.message.take() {
            warn!("📬️ Message #{} on '{}' was dropped without being settled", message.id, self.queue);
            self.redeliver(message);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn ack_removes_message() {
        let queue = JobQueue::default();
        queue.declare("q");
        queue.publish("q", b"hello".to_vec()).unwrap();
        let mut sub = queue.consume("q").unwrap();
        let delivery = sub.next().await.unwrap();
        assert_eq!(delivery.payload(), b"hello");
        assert_eq!(delivery.deliveries(), 1);
        delivery.ack();
        queue.shutdown();
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn nack_with_requeue_redelivers() {
        let queue = JobQueue::new(2);
        queue.declare("q");
        queue.publish("q", b"job".to_vec()).unwrap();
        let mut sub = queue.consume("q").unwrap();
        let first = sub.next().await.unwrap();
        assert!(first.nack(true));
        let second = sub.next().await.unwrap();
        assert_eq!(second.deliveries(), 2);
        // Out of deliveries
        assert!(!second.nack(true));
        queue.publish("q", b"next".to_vec()).unwrap();
        let next = sub.next().await.unwrap();
        assert_eq!(next.payload(), b"next");
        next.ack();
    }

    #[tokio::test]
    async fn unsettled_delivery_is_redelivered() {
        let queue = JobQueue::default();
        queue.declare("q");
        let id = queue.publish("q", b"job".to_vec()).unwrap();
        let mut sub = queue.consume("q").unwrap();
        {
            let _delivery = sub.next().await.unwrap();
        }
        let again = sub.next().await.unwrap();
        assert_eq!(again.id(), id);
        assert_eq!(again.deliveries(), 2);
        again.ack();
    }

    #[test]
    fn publish_to_unknown_queue_fails() {
        let queue = JobQueue::default();
        let err = queue.publish("nope", vec![]).unwrap_err();
        assert!(matches!(err, QueueError::UnknownQueue(q) if q == "nope"));
    }

    #[test]
    fn single_consumer_per_queue() {
        let queue = JobQueue::default();
        queue.declare("q");
        let _sub = queue.consume("q").unwrap();
        assert!(matches!(queue.consume("q"), Err(QueueError::AlreadyConsumed(_))));
    }

    #[test]
    fn queue_survives_its_consumer() {
        let queue = JobQueue::default();
        queue.declare("q");
        let sub = queue.consume("q").unwrap();
        drop(sub);
        assert!(queue.publish("q", vec![1]).is_ok());
        assert!(queue.consume("q").is_ok());
    }

    #[tokio::test]
    async fn consumer_dying_mid_job_loses_nothing() {
        let queue = JobQueue::default();
        queue.declare("q");
        let id = queue.publish("q", b"job".to_vec()).unwrap();
        let mut sub = queue.consume("q").unwrap();
        let delivery = sub.next().await.unwrap();
        // The task holding the delivery goes away before settling it
        let worker = tokio::spawn(async move {
            let _held = (sub, delivery);
            panic!("worker crashed");
        });
        assert!(worker.await.unwrap_err().is_panic());
        let next_id = queue.publish("q", b"next".to_vec()).unwrap();
        let mut sub = queue.consume("q").unwrap();
        let again = sub.next().await.unwrap();
        assert_eq!(again.id(), id);
        assert_eq!(again.deliveries(), 2);
        again.ack();
        let next = sub.next().await.unwrap();
        assert_eq!(next.id(), next_id);
        next.ack();
    }
}
