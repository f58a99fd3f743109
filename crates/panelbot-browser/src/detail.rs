//! Per-record detail expansion (modals, side panels, sub-tables).

use async_trait::async_trait;

use crate::error::BrowserError;

/// What happened when expanding one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome<D> {
    Extracted(D),
    /// The record has no detail view (e.g. no detail button).
    Skipped,
    /// Opening or reading the view failed; the reason is kept for logging.
    Failed(String),
}

impl<D> DetailOutcome<D> {
    pub fn into_extracted(self) -> Option<D> {
        match self {
            DetailOutcome::Extracted(detail) => Some(detail),
            DetailOutcome::Skipped | DetailOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expanded<R, D> {
    pub record: R,
    pub detail: DetailOutcome<D>,
}

/// A detail view that can be opened for one record at a time.
#[async_trait]
pub trait DetailView<R: Sync>: Send + Sync {
    type Detail: Send;

    /// Short label for logs (usually the record id).
    fn describe(&self, record: &R) -> String;

    async fn available(&self, _record: &R) -> Result<bool, BrowserError> {
        Ok(true)
    }

    /// Opens the view and waits until it can be read.
    async fn open(&self, record: &R) -> Result<(), BrowserError>;

    async fn extract(&self, record: &R) -> Result<Self::Detail, BrowserError>;

    /// Dismisses the view and waits for it to disappear.
    async fn close(&self, _record: &R) -> Result<(), BrowserError> {
        Ok(())
    }
}

async fn expand_one<R, V>(view: &V, record: &R) -> Result<Option<V::Detail>, BrowserError>
where
    R: Sync,
    V: DetailView<R> + ?Sized,
{
    if !view.available(record).await? {
        return Ok(None);
    }
    view.open(record).await?;
    let detail = view.extract(record).await?;
    view.close(record).await?;
    Ok(Some(detail))
}

/// Expands `records` one after another.
///
/// A failure on one record is logged, a best-effort close is attempted, and
/// the record is kept with [`DetailOutcome::Failed`]; the batch always
/// returns one entry per input record, in input order.
pub async fn expand_details<R, V>(view: &V, records: Vec<R>) -> Vec<Expanded<R, V::Detail>>
where
    R: Send + Sync,
    V: DetailView<R> + ?Sized,
{
    let total = records.len();
    let mut expanded = Vec::with_capacity(total);

    for (index, record) in records.into_iter().enumerate() {
        let label = view.describe(&record);
        let detail = match expand_one(view, &record).await {
            Ok(Some(detail)) => DetailOutcome::Extracted(detail),
            Ok(None) => {
                tracing::debug!(record = %label, "no detail view, skipping");
                DetailOutcome::Skipped
            }
            Err(err) => {
                tracing::warn!(record = %label, index, total, error = %err, "detail expansion failed");
                if let Err(close_err) = view.close(&record).await {
                    tracing::debug!(record = %label, error = %close_err, "best-effort close failed");
                }
                DetailOutcome::Failed(err.to_string())
            }
        };
        expanded.push(Expanded { record, detail });
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedView {
        failing: Vec<u32>,
        unavailable: Vec<u32>,
        closes: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl DetailView<u32> for ScriptedView {
        type Detail = String;

        fn describe(&self, record: &u32) -> String {
            record.to_string()
        }

        async fn available(&self, record: &u32) -> Result<bool, BrowserError> {
            Ok(!self.unavailable.contains(record))
        }

        async fn open(&self, record: &u32) -> Result<(), BrowserError> {
            if self.failing.contains(record) {
                return Err(BrowserError::Timeout {
                    selector: ".modal-content".to_owned(),
                    timeout_ms: 5000,
                });
            }
            Ok(())
        }

        async fn extract(&self, record: &u32) -> Result<String, BrowserError> {
            Ok(format!("detail-{record}"))
        }

        async fn close(&self, record: &u32) -> Result<(), BrowserError> {
            self.closes.lock().unwrap().push(*record);
            Ok(())
        }
    }

    #[tokio::test]
    async fn failure_on_one_record_does_not_stop_the_batch() {
        let view = ScriptedView {
            failing: vec![2],
            unavailable: vec![],
            closes: Mutex::new(vec![]),
        };
        let expanded = expand_details(&view, vec![1, 2, 3, 4]).await;

        assert_eq!(expanded.len(), 4);
        let records: Vec<u32> = expanded.iter().map(|e| e.record).collect();
        assert_eq!(records, vec![1, 2, 3, 4]);
        assert_eq!(
            expanded[0].detail,
            DetailOutcome::Extracted("detail-1".to_owned())
        );
        assert!(matches!(expanded[1].detail, DetailOutcome::Failed(_)));
        assert_eq!(
            expanded[3].detail,
            DetailOutcome::Extracted("detail-4".to_owned())
        );
        // Every record closed once, including the best-effort close for 2.
        assert_eq!(*view.closes.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn unavailable_records_are_skipped_without_opening() {
        let view = ScriptedView {
            failing: vec![],
            unavailable: vec![1],
            closes: Mutex::new(vec![]),
        };
        let expanded = expand_details(&view, vec![1, 2]).await;
        assert_eq!(expanded[0].detail, DetailOutcome::Skipped);
        assert_eq!(*view.closes.lock().unwrap(), vec![2]);
    }

    #[test]
    fn into_extracted_drops_non_extracted() {
        assert_eq!(DetailOutcome::Extracted(3).into_extracted(), Some(3));
        assert_eq!(DetailOutcome::<u8>::Skipped.into_extracted(), None);
        assert_eq!(
            DetailOutcome::<u8>::Failed("x".to_owned()).into_extracted(),
            None
        );
    }
}
