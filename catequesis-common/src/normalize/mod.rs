//! Embedded-date normalizer
//!
//! Walks a collection one document at a time and rewrites embedded temporal
//! values into `YYYY-MM-DD` strings:
//!
//! - absent fields and values that are already strings are left alone, so a
//!   run can be repeated safely
//! - date-times keep only their calendar date (in UTC)
//! - arrays are rewritten per element, preserving order, and written back only
//!   when at least one element changed
//! - each modified document gets one update that sets only the changed
//!   top-level fields
//!
//! A document whose update fails is logged and skipped. The whole rewrite runs
//! inside a [`ValidationWindow`].

pub mod plan;
pub mod target;
pub mod window;

pub use plan::*;
pub use target::*;
pub use window::*;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{Collection, DocumentStore};
use crate::Result;

/// A collection and the embedded date fields to normalize in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPlan {
    pub collection: Collection,
    pub targets: Vec<FieldTarget>,
}

impl CollectionPlan {
    pub fn new(collection: Collection, targets: Vec<FieldTarget>) -> Self {
        Self {
            collection,
            targets,
        }
    }

    /// Validator paths of every target
    pub fn string_paths(&self) -> Vec<String> {
        self.targets.iter().map(FieldTarget::dotted_path).collect()
    }
}

/// Outcome of normalizing one collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub collection: String,
    /// Documents read and inspected
    pub scanned: u64,
    /// Documents written
    pub modified: u64,
    /// Documents whose write failed
    pub skipped: u64,
    /// Rows whose body could not be parsed as a document
    pub unreadable: u64,
    /// Validation window steps that failed
    pub window_failures: u64,
}

/// Normalize every document of one collection
pub async fn normalize_collection(store: &DocumentStore, plan: &CollectionPlan) -> Result<NormalizeReport> {
    let collection = plan.collection;
    info!("Normalizing {} ({})", collection, describe_targets(plan));

    let window = ValidationWindow::open(store, collection).await;
    let mut report = NormalizeReport {
        collection: collection.to_string(),
        ..Default::default()
    };
    let walked = rewrite_all(store, plan, &mut report).await;
    report.window_failures = window.close(store, &plan.string_paths()).await as u64;
    walked?;

    info!(
        "✓ {}: {} modified of {} scanned ({} skipped, {} unreadable)",
        collection, report.modified, report.scanned, report.skipped, report.unreadable
    );
    Ok(report)
}

async fn rewrite_all(store: &DocumentStore, plan: &CollectionPlan, report: &mut NormalizeReport) -> Result<()> {
    let collection = plan.collection;
    let mut cursor = store.cursor(collection);

    while let Some(stored) = cursor.next().await? {
        let document = match stored.parse() {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping unreadable {} {}: {}", collection, stored.id, e);
                report.unreadable += 1;
                continue;
            }
        };
        report.scanned += 1;

        let set = normalize_document(&document, &plan.targets);
        if set.is_empty() {
            continue;
        }

        let fields: Vec<&str> = set.keys().map(String::as_str).collect();
        debug!("Fixing {} {} ({})", collection, stored.id, fields.join(", "));
        match store.update_fields(collection, &stored.id, set).await {
            Ok(()) => report.modified += 1,
            Err(e) => {
                warn!("Error updating {} {}: {}", collection, stored.id, e);
                report.skipped += 1;
            }
        }
    }

    Ok(())
}

fn describe_targets(plan: &CollectionPlan) -> String {
    plan.targets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
