//! Associating loosely-linked records with a client.
//!
//! Workflows and documents reference their client inconsistently: sometimes by
//! client id, sometimes by the client's login account id, sometimes through an
//! embedded `{id, email}` object, sometimes only by email. Strategies are tried
//! in that order and the first one that matches anything wins, so a weaker
//! strategy never mixes in records when a stronger one already found some.

use casedesk_core::{Client, ClientId, Document, UserId, Workflow};

/// The ways a record can point at a client.
pub trait ClientLinked {
    fn linked_client_id(&self) -> Option<&ClientId>;
    fn linked_user_id(&self) -> Option<&UserId>;
    fn embedded_client_id(&self) -> Option<&ClientId> {
        None
    }
    fn linked_email(&self) -> Option<&str>;
}

impl ClientLinked for Workflow {
    fn linked_client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    fn linked_user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    fn embedded_client_id(&self) -> Option<&ClientId> {
        self.client.as_ref().and_then(|c| c.id.as_ref())
    }

    fn linked_email(&self) -> Option<&str> {
        self.client_email
            .as_deref()
            .or_else(|| self.client.as_ref().and_then(|c| c.email.as_deref()))
    }
}

impl ClientLinked for Document {
    fn linked_client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    fn linked_user_id(&self) -> Option<&UserId> {
        self.uploaded_by.as_ref()
    }

    fn linked_email(&self) -> Option<&str> {
        self.client_email.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    ClientId,
    UserId,
    EmbeddedClient,
    Email,
}

const STRATEGIES: [MatchStrategy; 4] = [
    MatchStrategy::ClientId,
    MatchStrategy::UserId,
    MatchStrategy::EmbeddedClient,
    MatchStrategy::Email,
];

fn is_match<T: ClientLinked>(strategy: MatchStrategy, client: &Client, record: &T) -> bool {
    match strategy {
        MatchStrategy::ClientId => client.id.is_some() && record.linked_client_id() == client.id.as_ref(),
        MatchStrategy::UserId => match &client.user_id {
            // Some endpoints put the account id in the `clientId` slot.
            Some(user_id) => {
                record.linked_user_id() == Some(user_id)
                    || record.linked_client_id().map(ClientId::as_str) == Some(user_id.as_str())
            }
            None => false,
        },
        MatchStrategy::EmbeddedClient => client.id.is_some() && record.embedded_client_id() == client.id.as_ref(),
        MatchStrategy::Email => {
            let email = client.email.trim();
            !email.is_empty()
                && record
                    .linked_email()
                    .is_some_and(|e| e.trim().eq_ignore_ascii_case(email))
        }
    }
}

/// Records belonging to `client`, plus the strategy that found them.
pub fn records_for_client<'a, T: ClientLinked>(
    client: &Client,
    records: &'a [T],
) -> (Vec<&'a T>, Option<MatchStrategy>) {
    for strategy in STRATEGIES {
        let found: Vec<&T> = records.iter().filter(|r| is_match(strategy, client, *r)).collect();
        if !found.is_empty() {
            tracing::debug!(?strategy, count = found.len(), "matched records to client");
            return (found, Some(strategy));
        }
    }
    (Vec::new(), None)
}

pub fn workflows_for_client<'a>(client: &Client, workflows: &'a [Workflow]) -> Vec<&'a Workflow> {
    records_for_client(client, workflows).0
}

pub fn documents_for_client<'a>(client: &Client, documents: &'a [Document]) -> Vec<&'a Document> {
    records_for_client(client, documents).0
}
