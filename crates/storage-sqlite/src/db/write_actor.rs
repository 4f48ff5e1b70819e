use super::DbPool;
use crate::errors::StorageError;
use diesel::SqliteConnection;
use log::{debug, error};
use marketpulse_core::errors::{Error, Result};
use std::any::Any;
use tokio::sync::{mpsc, oneshot};

/// Jobs run against the writer's dedicated connection and return a core Result.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedReply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

/// Bound of the job queue.
const WRITER_QUEUE_SIZE: usize = 1024;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(Job<Box<dyn Any + Send + 'static>>, ErasedReply)>,
}

impl WriteHandle {
    /// Executes a database job on the writer actor's dedicated connection.
    ///
    /// Each job runs inside its own immediate transaction, so writes are
    /// serialized and a failing job leaves no partial state.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| {
                Error::from(StorageError::WriterUnavailable(
                    "writer actor stopped".to_string(),
                ))
            })?;

        let boxed = ret_rx.await.map_err(|_| {
            Error::from(StorageError::WriterUnavailable(
                "writer actor dropped the reply".to_string(),
            ))
        })??;

        boxed.downcast::<T>().map(|value| *value).map_err(|_| {
            Error::from(StorageError::WriterUnavailable(
                "unexpected writer result type".to_string(),
            ))
        })
    }
}

/// Spawns a background Tokio task that acts as the single writer to the database.
///
/// The actor owns one pooled connection for its lifetime and processes jobs
/// serially. If no connection can be acquired the actor exits and every
/// `exec` call reports the writer as unavailable.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) =
        mpsc::channel::<(Job<Box<dyn Any + Send + 'static>>, ErasedReply)>(WRITER_QUEUE_SIZE);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Writer actor could not acquire a connection: {}", e);
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            // Receiver may have been dropped by a cancelled caller
            let _ = reply_tx.send(result);
        }
        debug!("Writer actor shutting down");
    });

    WriteHandle { tx }
}
