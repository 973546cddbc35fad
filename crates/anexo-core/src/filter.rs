use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::document::DocumentType;
use crate::gde::GdeType;
use crate::submission::Submission;

/// List filter. Every criterion is optional; unset criteria match all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gde_type: Option<GdeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    /// Inclusive, by UTC day of `submittedAt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive, by UTC day of `submittedAt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring of the label, file name or id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl SubmissionFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, submission: &Submission) -> bool {
        if let Some(gde) = self.gde_type {
            if submission.gde_type() != Some(gde) {
                return false;
            }
        }
        if let Some(doc) = self.document_type {
            if submission.document_type() != Some(doc) {
                return false;
            }
        }
        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(day) = submission.submitted_at().map(|ts| ts.date_naive()) else {
                return false;
            };
            if self.start_date.is_some_and(|start| day < start) {
                return false;
            }
            if self.end_date.is_some_and(|end| day > end) {
                return false;
            }
        }
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let haystacks = [
                submission.document_type_label(),
                submission.file_name(),
                Some(submission.id.as_str()),
            ];
            if !haystacks
                .iter()
                .flatten()
                .any(|h| h.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }

    /// Keep matching submissions, newest `submittedAt` first. Records
    /// without a timestamp sort last, in their original order.
    pub fn apply(&self, submissions: Vec<Submission>) -> Vec<Submission> {
        let mut kept: Vec<Submission> = submissions
            .into_iter()
            .filter(|s| self.matches(s))
            .collect();
        kept.sort_by_key(|s| Reverse(s.submitted_at()));
        kept
    }
}
