//! Scoped validation bypass around a rewrite
//!
//! Opening the window records the collection's validation level and switches
//! validation off. Closing it declares the migrated paths as `string` in the
//! collection validator and puts the recorded level back. Failures are logged
//! and never abort the run.

use tracing::{info, warn};

use crate::db::{BsonType, Collection, DocumentStore, ValidationLevel};

#[derive(Debug)]
pub struct ValidationWindow {
    collection: Collection,
    previous: Option<ValidationLevel>,
    /// Steps that already failed while opening
    failures: usize,
}

impl ValidationWindow {
    /// Record the current level and switch validation off
    pub async fn open(store: &DocumentStore, collection: Collection) -> Self {
        let mut failures = 0;
        let previous = match store.validation_level(collection).await {
            Ok(level) => Some(level),
            Err(e) => {
                warn!("Could not read validation level of {}: {}", collection, e);
                failures += 1;
                None
            }
        };

        match store
            .set_validation_level(collection, ValidationLevel::Off)
            .await
        {
            Ok(()) => info!("Validation disabled for {}", collection),
            Err(e) => {
                warn!("Could not disable validation for {}: {}", collection, e);
                failures += 1;
            }
        }

        Self {
            collection,
            previous,
            failures,
        }
    }

    /// Declare `string_paths` as strings, then restore the recorded level
    ///
    /// Returns the number of steps that failed, opening included.
    pub async fn close(self, store: &DocumentStore, string_paths: &[String]) -> usize {
        let mut failures = self.failures;

        for path in string_paths {
            if let Err(e) = store
                .set_field_type(self.collection, path, BsonType::String)
                .await
            {
                warn!(
                    "Could not declare {}.{} as string: {}",
                    self.collection, path, e
                );
                failures += 1;
            }
        }

        match self.previous {
            Some(level) => match store.set_validation_level(self.collection, level).await {
                Ok(()) => info!("Validation level of {} restored to {}", self.collection, level),
                Err(e) => {
                    warn!(
                        "Could not restore validation level {} for {}: {}",
                        level, self.collection, e
                    );
                    failures += 1;
                }
            },
            None => {
                warn!(
                    "Validation level of {} unknown before the run; left off",
                    self.collection
                );
                failures += 1;
            }
        }

        failures
    }
}
