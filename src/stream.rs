//! Async adapters feeding records through a [`Converter`].
//!
//! Both adapters keep output order equal to input order and pass per-record errors through
//! instead of stopping.

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::converter::{Converter, OutboundMessage};
use crate::error::Result;
use crate::record::Record;

const DEFAULT_CHANNEL_SIZE: usize = 100;

/// Maps a stream of records to a stream of conversion results, in order.
pub fn convert_stream<S>(
    converter: Converter,
    records: S,
) -> impl Stream<Item = Result<OutboundMessage>>
where
    S: Stream<Item = Record>,
{
    records.map(move |record| converter.convert(record))
}

/// Spawns a task that converts every record received on `records` and sends the results, in
/// order, on the returned stream.
///
/// The task ends when `records` is closed, when the returned stream is dropped, or when
/// `cancellation_token` is cancelled.
pub fn spawn_converter(
    converter: Converter,
    mut records: mpsc::Receiver<Record>,
    cancellation_token: CancellationToken,
) -> (ReceiverStream<Result<OutboundMessage>>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<Result<OutboundMessage>>(DEFAULT_CHANNEL_SIZE);

    let handle = tokio::spawn(async move {
        loop {
            let record = tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    tracing::info!("token cancelled!, stopping record conversion");
                    break;
                }
                _ = tx.closed() => {
                    tracing::debug!("output stream dropped");
                    break;
                }
                record = records.recv() => match record {
                    Some(record) => record,
                    None => {
                        tracing::debug!("record channel closed");
                        break;
                    }
                },
            };

            let result = converter.convert(record);
            if let Err(e) = &result {
                tracing::warn!(error = %e, "record conversion failed");
            }

            // a full output channel must not keep the task from seeing cancellation
            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    tracing::info!("token cancelled!, stopping record conversion");
                    break;
                }
                sent = tx.send(result) => {
                    if let Err(e) = sent {
                        tracing::error!("Failed to send converted message: {}", e);
                        break;
                    }
                }
            }
        }
    });

    (ReceiverStream::new(rx), handle)
}
