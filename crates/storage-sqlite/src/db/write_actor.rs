use std::any::Any;

use diesel::SqliteConnection;
use tokio::sync::{mpsc, oneshot};

use creditflow_core::errors::{Error, Result};

use super::DbPool;
use crate::errors::StorageError;

// A write job: runs against the writer's dedicated connection. The boxed
// Any return value erases T so one channel can carry every job type.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

/// Handle for submitting write jobs to the single writer task.
///
/// SQLite allows one writer at a time; funneling every write through one
/// dedicated connection keeps pooled readers free of SQLITE_BUSY errors.
#[derive(Clone)]
pub struct WriteHandle {
    #[allow(clippy::type_complexity)]
    tx: mpsc::Sender<(
        Job<Box<dyn Any + Send + 'static>>,
        oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>,
    )>,
}

impl WriteHandle {
    /// Runs the job on the writer's connection inside an immediate
    /// transaction and returns its result.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |conn| job(conn).map(|value| Box::new(value) as Box<dyn Any + Send>)),
                reply_tx,
            ))
            .await
            .map_err(|_| Error::Unexpected("Database writer task stopped".to_string()))?;

        reply_rx
            .await
            .map_err(|_| Error::Unexpected("Database writer dropped the reply".to_string()))?
            .map(|boxed: Box<dyn Any + Send + 'static>| {
                *boxed
                    .downcast::<T>()
                    .unwrap_or_else(|_| panic!("writer job returned an unexpected type"))
            })
    }
}

/// Spawns the background task that owns the writer connection and
/// processes jobs serially.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(
        Job<Box<dyn Any + Send + 'static>>,
        oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>,
    )>(1024);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                log::error!("Database writer could not acquire a connection: {}", e);
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|conn| {
                    job(conn).map_err(StorageError::from)
                })
                .map_err(|e: StorageError| e.into());

            // The requester may have gone away; dropping the reply is fine.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
