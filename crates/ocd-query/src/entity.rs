//! Entity types served by the API and their OCD identifiers.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// One of the seven Open Civic Data record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Bill,
    Person,
    Organization,
    Event,
    Vote,
    Jurisdiction,
    Division,
}

impl EntityType {
    pub const ALL: [Self; 7] = [
        Self::Bill,
        Self::Person,
        Self::Organization,
        Self::Event,
        Self::Vote,
        Self::Jurisdiction,
        Self::Division,
    ];

    /// URL segment for the list endpoint (`/bills/`, `/people/`, ...).
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Bill => "bills",
            Self::Person => "people",
            Self::Organization => "organizations",
            Self::Event => "events",
            Self::Vote => "votes",
            Self::Jurisdiction => "jurisdictions",
            Self::Division => "divisions",
        }
    }

    #[must_use]
    pub fn from_plural(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.plural() == segment)
    }

    /// Prefix every identifier of this type starts with, e.g. `ocd-bill`.
    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Bill => "ocd-bill",
            Self::Person => "ocd-person",
            Self::Organization => "ocd-organization",
            Self::Event => "ocd-event",
            Self::Vote => "ocd-vote",
            Self::Jurisdiction => "ocd-jurisdiction",
            Self::Division => "ocd-division",
        }
    }

    /// Whether identifiers carry a UUID (as opposed to a `key:value` path).
    const fn uuid_ids(self) -> bool {
        !matches!(self, Self::Jurisdiction | Self::Division)
    }

    /// Check that `id` is a well-formed identifier for this entity type.
    ///
    /// `ocd-bill/<uuid>` style ids must carry a parseable UUID;
    /// jurisdiction and division ids must be a non-empty `key:value` path.
    #[must_use]
    pub fn accepts_id(self, id: &str) -> bool {
        let Some(rest) = id
            .strip_prefix(self.id_prefix())
            .and_then(|r| r.strip_prefix('/'))
        else {
            return false;
        };

        if self.uuid_ids() {
            return Uuid::parse_str(rest).is_ok();
        }

        rest.split('/').next().is_some_and(|first| first.contains(':'))
            && rest
                .split('/')
                .all(|segment| !segment.is_empty() && !segment.chars().any(char::is_whitespace))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}
