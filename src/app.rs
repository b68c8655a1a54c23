use std::time::{Duration, Instant};

use serde::Serialize;

use crate::aggregate::{FileEntry, FileListing, download_items, to_gigabytes, total_bytes};
use crate::batch::{Batch, pack};
use crate::config::Thresholds;
use crate::domain::{ExtractOptions, TaxonOid};
use crate::error::PortalError;
use crate::extract::{ExtractedRecord, extract};
use crate::jgi::PortalClient;
use crate::manifest::{ManifestRow, MetadataRow};

#[derive(Debug, Clone, Serialize)]
pub struct TaxonRecord {
    pub taxon_oid: TaxonOid,
    /// False when the search failed and `record` holds placeholders.
    pub available: bool,
    pub record: ExtractedRecord,
}

impl FileListing for TaxonRecord {
    fn file_entries(&self) -> Vec<FileEntry> {
        self.record.file_entries()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectResult {
    pub records: Vec<TaxonRecord>,
}

impl CollectResult {
    pub fn unavailable(&self) -> usize {
        self.records.iter().filter(|entry| !entry.available).count()
    }

    pub fn manifest_rows(&self) -> Vec<ManifestRow> {
        self.records
            .iter()
            .map(|entry| ManifestRow::from_record(&entry.taxon_oid, &entry.record))
            .collect()
    }

    pub fn metadata_rows(&self) -> Vec<MetadataRow> {
        self.records
            .iter()
            .map(|entry| MetadataRow::from_record(&entry.taxon_oid, &entry.record))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadPlan {
    pub total_bytes: u64,
    pub total_gb: f64,
    pub file_count: usize,
    /// True when the total exceeded the threshold and `batches` were packed.
    pub split: bool,
    pub batches: Vec<Batch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchStatus {
    Submitted { http_status: u16 },
    Declined,
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub index: usize,
    pub file_count: usize,
    pub bytes: u64,
    #[serde(flatten)]
    pub status: BatchStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResult {
    pub submitted_at: String,
    pub total_gb: f64,
    pub split: bool,
    pub batches: Vec<BatchOutcome>,
}

impl SubmitResult {
    pub fn submitted(&self) -> usize {
        self.batches
            .iter()
            .filter(|outcome| matches!(outcome.status, BatchStatus::Submitted { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.batches
            .iter()
            .filter(|outcome| matches!(outcome.status, BatchStatus::Failed { .. }))
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Yes/no questions asked before anything is requested from the portal.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> Result<bool, PortalError>;
}

/// Answers every prompt the same way; used for scripted runs.
#[derive(Debug, Clone, Copy)]
pub struct AutoAnswer(pub bool);

impl Confirm for AutoAnswer {
    fn confirm(&self, prompt: &str) -> Result<bool, PortalError> {
        tracing::debug!(prompt, answer = self.0, "auto-answering prompt");
        Ok(self.0)
    }
}

/// Packs requestable files into batches when the total exceeds the threshold.
pub fn plan<'a, R>(
    records: impl IntoIterator<Item = &'a R> + Clone,
    thresholds: &Thresholds,
) -> DownloadPlan
where
    R: FileListing + 'a,
{
    let total = total_bytes(records.clone());
    let total_gb = to_gigabytes(total);
    let items = download_items(records);
    let split = total_gb > thresholds.max_total_gb;

    let batches = if items.is_empty() {
        Vec::new()
    } else if split {
        pack(&items, thresholds.max_batch_bytes)
    } else {
        vec![Batch {
            ids: items.iter().map(|item| item.id.clone()).collect(),
            bytes: items.iter().fold(0u64, |sum, item| sum.saturating_add(item.size)),
        }]
    };

    DownloadPlan {
        total_bytes: total,
        total_gb,
        file_count: items.len(),
        split,
        batches,
    }
}

#[derive(Clone)]
pub struct App<C: PortalClient> {
    client: C,
}

impl<C: PortalClient> App<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Searches every taxon in order; a failed search yields placeholders.
    pub fn collect(
        &self,
        taxa: &[TaxonOid],
        options: &ExtractOptions,
        sink: &dyn ProgressSink,
    ) -> CollectResult {
        let mut records = Vec::with_capacity(taxa.len());
        for (index, taxon) in taxa.iter().enumerate() {
            sink.event(ProgressEvent {
                message: format!("phase=Fetch; taxon {} ({}/{})", taxon, index + 1, taxa.len()),
                elapsed: None,
            });
            let start = Instant::now();
            let entry = match self.client.search(taxon) {
                Ok(document) => {
                    let record = extract(&document, options);
                    tracing::debug!(
                        taxon = %taxon,
                        jamo_id = %record.jamo_id,
                        bins = record.bin_count(),
                        "extracted record"
                    );
                    TaxonRecord {
                        taxon_oid: taxon.clone(),
                        available: true,
                        record,
                    }
                }
                Err(err) => {
                    tracing::warn!(taxon = %taxon, error = %err, "no portal data for taxon");
                    TaxonRecord {
                        taxon_oid: taxon.clone(),
                        available: false,
                        record: ExtractedRecord::unavailable(),
                    }
                }
            };
            sink.event(ProgressEvent {
                message: format!("portal.search taxon={taxon} available={}", entry.available),
                elapsed: Some(start.elapsed()),
            });
            records.push(entry);
        }
        CollectResult { records }
    }

    /// Confirms and sends the restore requests described by `plan`.
    pub fn submit(
        &self,
        plan: &DownloadPlan,
        token: &str,
        send_mail: bool,
        confirm: &dyn Confirm,
        sink: &dyn ProgressSink,
    ) -> Result<SubmitResult, PortalError> {
        if token.trim().is_empty() {
            return Err(PortalError::MissingToken);
        }

        let mut result = SubmitResult {
            submitted_at: chrono::Utc::now().to_rfc3339(),
            total_gb: plan.total_gb,
            split: plan.split,
            batches: Vec::new(),
        };
        if plan.batches.is_empty() {
            tracing::info!("no requestable files in plan");
            return Ok(result);
        }

        let proceed = if plan.split {
            tracing::warn!(
                total_gb = plan.total_gb,
                batches = plan.batches.len(),
                "requested data set is very large"
            );
            confirm.confirm(&format!(
                "The requested data set is very large ({:.2} GB). Split it into {} requests?",
                plan.total_gb,
                plan.batches.len()
            ))?
        } else {
            confirm.confirm(&format!(
                "Submit {} files for restore? Estimated size: {:.2} GB",
                plan.file_count, plan.total_gb
            ))?
        };

        for (index, batch) in plan.batches.iter().enumerate() {
            let approved = if !proceed {
                false
            } else if plan.split {
                confirm.confirm(&format!(
                    "Request batch {}/{} with {} files ({:.2} GB)?",
                    index + 1,
                    plan.batches.len(),
                    batch.len(),
                    to_gigabytes(batch.bytes)
                ))?
            } else {
                true
            };

            let status = if approved {
                self.submit_batch(index, batch, token, send_mail, sink)
            } else {
                BatchStatus::Declined
            };
            result.batches.push(BatchOutcome {
                index,
                file_count: batch.len(),
                bytes: batch.bytes,
                status,
            });
        }
        Ok(result)
    }

    fn submit_batch(
        &self,
        index: usize,
        batch: &Batch,
        token: &str,
        send_mail: bool,
        sink: &dyn ProgressSink,
    ) -> BatchStatus {
        sink.event(ProgressEvent {
            message: format!("phase=Request; batch {} with {} files", index + 1, batch.len()),
            elapsed: None,
        });
        let start = Instant::now();
        let status = match self
            .client
            .request_archived_files(&batch.ids, token, send_mail)
        {
            Ok(receipt) => BatchStatus::Submitted {
                http_status: receipt.status,
            },
            Err(err) => {
                tracing::error!(batch = index + 1, error = %err, "restore request failed");
                BatchStatus::Failed {
                    message: err.to_string(),
                }
            }
        };
        sink.event(ProgressEvent {
            message: format!("portal.restore batch={}", index + 1),
            elapsed: Some(start.elapsed()),
        });
        status
    }
}
