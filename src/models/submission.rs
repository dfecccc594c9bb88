//! Submission model for candidate directory entries awaiting moderation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SiteEntry;
use crate::errors::AppError;

/// A pending or rejected candidate directory entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub name: String,
    pub url: String,
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub approvals: u32,
    #[serde(default)]
    pub rejected: bool,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Build a fresh record from a validated candidate.
    pub fn new(candidate: NewSubmission) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            name: candidate.name,
            url: candidate.url,
            description: candidate.description,
            tags: candidate.tags,
            approvals: 0,
            rejected: false,
            submitted_at: Utc::now(),
        }
    }

    /// The public fields that end up in the canonical index.
    pub fn to_site(&self) -> SiteEntry {
        SiteEntry {
            name: self.name.clone(),
            url: self.url.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Request body for submitting a new site.
///
/// Any `submitted_at` or `approvals` sent by the client are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub name: String,
    pub url: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A candidate that passed validation and is ready to be stored.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub name: String,
    pub url: String,
    pub description: String,
    pub tags: BTreeSet<String>,
}

impl TryFrom<SubmitRequest> for NewSubmission {
    type Error = AppError;

    fn try_from(request: SubmitRequest) -> Result<Self, Self::Error> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if request.url.trim().is_empty() {
            return Err(AppError::Validation("URL is required".to_string()));
        }
        if request.description.trim().is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }

        let tags = request
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            name: request.name,
            url: request.url,
            description: request.description,
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, url: &str, description: &str, tags: &[&str]) -> SubmitRequest {
        SubmitRequest {
            name: name.to_string(),
            url: url.to_string(),
            description: description.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_required_fields() {
        for req in [
            request("", "http://a.i2p", "d", &[]),
            request("Example", "  ", "d", &[]),
            request("Example", "http://a.i2p", "", &[]),
        ] {
            let err = NewSubmission::try_from(req).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn test_tags_are_normalized() {
        let candidate =
            NewSubmission::try_from(request("E", "u", "d", &[" privacy", "i2p", "", "i2p "]))
                .unwrap();
        let tags: Vec<_> = candidate.tags.into_iter().collect();
        assert_eq!(tags, vec!["i2p".to_string(), "privacy".to_string()]);
    }

    #[test]
    fn test_new_record_defaults() {
        let candidate = NewSubmission::try_from(request("E", "u", "d", &[])).unwrap();
        let a = Submission::new(candidate.clone());
        let b = Submission::new(candidate);
        assert_eq!(a.approvals, 0);
        assert!(!a.rejected);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_client_supplied_counters_are_ignored() {
        let req: SubmitRequest = serde_json::from_value(serde_json::json!({
            "name": "E",
            "url": "u",
            "description": "d",
            "approvals": 99,
            "submitted_at": "2001-01-01T00:00:00Z"
        }))
        .unwrap();
        let record = Submission::new(NewSubmission::try_from(req).unwrap());
        assert_eq!(record.approvals, 0);
        assert!(record.tags.is_empty());
    }
}
