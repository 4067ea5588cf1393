//! Pass results
//!
//! [`aggregate`] turns a [`MutationTracker`] into the sorted, human-readable
//! report attached to the ResourceList. Output order depends only on the
//! records, never on map iteration order.

use crate::tracker::MutationTracker;
use serde::{Deserialize, Serialize};
use setimg_resource::{FileRef, ResourceIdentifier};
use std::fmt::{self, Display, Formatter};

/// Message emitted when a pass changed nothing
pub const NO_CHANGES_MESSAGE: &str = "no images changed";

/// Result severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fails the function run
    Error,
    /// Worth a look
    Warning,
    /// Informational
    Info,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

/// Field touched by a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultField {
    /// Concrete field path
    pub path: String,
    /// Value before the pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    /// Value proposed by the pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_value: Option<String>,
}

/// One entry of the pass report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FnResult {
    /// Human-readable message
    pub message: String,

    /// Severity
    pub severity: Severity,

    /// Resource the result refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_ref: Option<ResourceIdentifier>,

    /// Field the result refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<ResultField>,

    /// File the resource came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileRef>,
}

impl FnResult {
    /// Informational result with no references
    #[inline]
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Info)
    }

    /// Error result with no references
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Error)
    }

    fn with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            resource_ref: None,
            field: None,
            file: None,
        }
    }

    /// With resource reference
    #[inline]
    #[must_use]
    pub fn with_resource_ref(mut self, resource: ResourceIdentifier) -> Self {
        self.resource_ref = Some(resource);
        self
    }

    /// With file reference
    #[inline]
    #[must_use]
    pub fn with_file(mut self, file: FileRef) -> Self {
        self.file = Some(file);
        self
    }

    /// With field reference
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field: ResultField) -> Self {
        self.field = Some(field);
        self
    }

    /// Check severity
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    fn sort_key(&self) -> impl Ord + '_ {
        let field = self.field.as_ref();
        (
            self.resource_ref.as_ref(),
            self.file.as_ref().map(|f| f.path.as_str()),
            self.file.as_ref().map(|f| f.index),
            field.map(|f| f.path.as_str()),
            field.and_then(|f| f.current_value.as_deref()),
            field.and_then(|f| f.proposed_value.as_deref()),
            self.message.as_str(),
            self.severity,
        )
    }
}

impl Display for FnResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(resource) = &self.resource_ref {
            write!(f, " ({resource}")?;
            if let Some(field) = &self.field {
                write!(f, " {}", field.path)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Sort results by resource, file path, file index, field path, then values
pub fn sort_results(results: &mut [FnResult]) {
    results.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Build the sorted report for a pass
///
/// An empty tracker yields the single informational
/// [`NO_CHANGES_MESSAGE`] result.
#[must_use]
pub fn aggregate(records: &MutationTracker) -> Vec<FnResult> {
    if records.is_empty() {
        return vec![FnResult::info(NO_CHANGES_MESSAGE)];
    }

    let mut results = Vec::with_capacity(records.len());
    for (key, changes) in records.iter() {
        for change in changes {
            results.push(
                FnResult::info(format!(
                    "set image from {} to {}",
                    change.current_value, change.updated_value
                ))
                .with_resource_ref(key.resource.clone())
                .with_file(FileRef {
                    path: key.file_path.clone(),
                    index: key.file_index,
                })
                .with_field(ResultField {
                    path: key.field_path.clone(),
                    current_value: Some(change.current_value.clone()),
                    proposed_value: Some(change.updated_value.clone()),
                }),
            );
        }
    }
    sort_results(&mut results);
    results
}
