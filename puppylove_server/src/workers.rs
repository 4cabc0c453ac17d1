use std::path::Path;

use log::*;
use puppylove_engine::{
    jobs::{
        ApproveAllModerator,
        JobConsumer,
        JobPublisher,
        JobQueue,
        LogMailer,
        MailWorker,
        ModerationWorker,
        ProfileActionWorker,
    },
    SqliteDatabase,
};
use tokio::task::JoinHandle;

use crate::errors::ServerError;

/// Starts one consumer per queue: moderation, mail and profile actions. Do not await the returned JoinHandles, as they
/// run until the queue is shut down. A job whose handler panics is requeued, and its consumer keeps running.
pub fn start_workers(
    db: SqliteDatabase,
    queue: &JobQueue,
    publisher: JobPublisher,
    assets_dir: &Path,
) -> Result<Vec<JoinHandle<()>>, ServerError> {
    let names = publisher.names().clone();
    let subscribe = |name: &str| {
        queue
            .consume(name)
            .map_err(|e| ServerError::InitializeError(format!("Could not subscribe to the '{name}' queue. {e}")))
    };
    let moderation = ModerationWorker::new(db.clone(), ApproveAllModerator, publisher, assets_dir);
    let moderation = JobConsumer::new(moderation, subscribe(&names.moderation)?);
    let mail = JobConsumer::new(MailWorker::new(LogMailer), subscribe(&names.mail)?);
    let profile = JobConsumer::new(ProfileActionWorker::new(db), subscribe(&names.profile)?);
    let handles = vec![tokio::spawn(moderation.run()), tokio::spawn(mail.run()), tokio::spawn(profile.run())];
    info!("📬️ {} job workers started", handles.len());
    Ok(handles)
}
