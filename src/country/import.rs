//! Background country import.
//!
//! Batches are queued on an unbounded channel and stored one at a time by a single
//! worker task. Each submission hands back an [`ImportTicket`] so callers that care
//! about the outcome can await it; callers that don't simply drop the ticket.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::store::{CountryStore, NewCountry, StoreError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to store countries: {0}")]
    Store(#[from] StoreError),
    #[error("country import worker is not running")]
    WorkerStopped,
}

struct ImportJob {
    countries: Vec<NewCountry>,
    done: oneshot::Sender<Result<usize, ImportError>>,
}

/// Handle to the import worker. Cloning shares the same queue.
#[derive(Clone, Debug)]
pub struct CountryImporter {
    tx: mpsc::UnboundedSender<ImportJob>,
}

/// Completion handle for one submitted batch.
#[derive(Debug)]
pub struct ImportTicket {
    rx: oneshot::Receiver<Result<usize, ImportError>>,
}

impl ImportTicket {
    /// Wait for the batch to be stored.
    ///
    /// # Errors
    /// Returns the store error, or `WorkerStopped` if the worker exited first.
    pub async fn wait(self) -> Result<usize, ImportError> {
        self.rx.await.unwrap_or(Err(ImportError::WorkerStopped))
    }
}

impl CountryImporter {
    /// Start the worker on the current tokio runtime.
    ///
    /// The worker stops once every importer handle has been dropped.
    #[must_use]
    pub fn spawn<S>(store: Arc<S>) -> Self
    where
        S: CountryStore + ?Sized + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<ImportJob>();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let requested = job.countries.len();
                let result = store
                    .create_many(job.countries)
                    .await
                    .map_err(ImportError::from);

                match &result {
                    Ok(stored) => info!("Imported {stored} of {requested} countries"),
                    Err(err) => error!("Country import failed: {err}"),
                }

                // The submitter may have dropped its ticket.
                let _ = job.done.send(result);
            }

            debug!("Country import worker stopped");
        });

        Self { tx }
    }

    /// Queue a batch for storage.
    pub fn submit(&self, countries: Vec<NewCountry>) -> ImportTicket {
        let (done, rx) = oneshot::channel();

        if let Err(err) = self.tx.send(ImportJob { countries, done }) {
            error!("Country import worker is gone");
            let _ = err.0.done.send(Err(ImportError::WorkerStopped));
        }

        ImportTicket { rx }
    }
}
