//! Connection matching for template instantiation
//!
//! A template declares the connections its charts were built against. Before
//! generating a dashboard we look through the user's existing connections for
//! ones that point at the same source, so the user can reuse them instead of
//! creating duplicates.

use crate::core::{Connection, ConnectionId, ConnectionKind, RecordId, Template};
use serde::Serialize;
use serde_json::Value;

/// The fields that identify the source behind a connection, per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionIdentity<'a> {
    Api {
        host: Option<&'a str>,
    },
    /// MongoDB, MySQL and Postgres.
    Database {
        connection_string: Option<&'a str>,
        db_name: Option<&'a str>,
    },
    /// Firestore and Realtime Database.
    Firebase {
        service_account: Option<&'a Value>,
    },
    GoogleAnalytics {
        oauth_id: Option<&'a RecordId>,
    },
    Unsupported,
}

impl<'a> ConnectionIdentity<'a> {
    pub fn of(connection: &'a Connection) -> Self {
        match &connection.kind {
            ConnectionKind::Api => Self::Api {
                host: connection.host.as_deref(),
            },
            ConnectionKind::MongoDb | ConnectionKind::MySql | ConnectionKind::Postgres => {
                Self::Database {
                    connection_string: connection.connection_string.as_deref(),
                    db_name: connection.db_name.as_deref(),
                }
            }
            ConnectionKind::Firestore | ConnectionKind::RealtimeDb => Self::Firebase {
                service_account: connection.firebase_service_account.as_ref(),
            },
            ConnectionKind::GoogleAnalytics => Self::GoogleAnalytics {
                oauth_id: connection.oauth_id.as_ref(),
            },
            ConnectionKind::Other(_) => Self::Unsupported,
        }
    }

    /// Whether two identities point at the same source.
    ///
    /// Database connections match on the connection string OR the database
    /// name, so two servers hosting a database with the same name match too.
    /// Absent fields compare equal to each other.
    pub fn is_compatible_with(&self, other: &ConnectionIdentity<'_>) -> bool {
        match (self, other) {
            (Self::Api { host: a }, ConnectionIdentity::Api { host: b }) => a == b,
            (
                Self::Database {
                    connection_string: cs_a,
                    db_name: db_a,
                },
                ConnectionIdentity::Database {
                    connection_string: cs_b,
                    db_name: db_b,
                },
            ) => cs_a == cs_b || db_a == db_b,
            (
                Self::Firebase { service_account: a },
                ConnectionIdentity::Firebase { service_account: b },
            ) => a == b,
            (
                Self::GoogleAnalytics { oauth_id: a },
                ConnectionIdentity::GoogleAnalytics { oauth_id: b },
            ) => a == b,
            _ => false,
        }
    }
}

impl Connection {
    pub fn identity(&self) -> ConnectionIdentity<'_> {
        ConnectionIdentity::of(self)
    }
}

/// Existing connections that can stand in for `candidate`.
///
/// Compatible connections keep the order of `existing`. A connection with the
/// candidate's own id is appended last, so callers can tell "this exact
/// connection still exists" apart from "a compatible one exists". An empty
/// result means a new connection must be created.
pub fn find_compatible<'a>(
    candidate: &Connection,
    existing: &'a [Connection],
) -> Vec<&'a Connection> {
    let wanted = candidate.identity();
    let mut found = Vec::new();
    let mut same = None;

    for connection in existing {
        if connection.id == candidate.id {
            same = Some(connection);
        } else if connection.kind == candidate.kind
            && wanted.is_compatible_with(&connection.identity())
        {
            found.push(connection);
        }
    }

    found.extend(same);
    found
}

/// Matching result for one template connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionCompatibility {
    pub template_connection: ConnectionId,
    pub name: String,
    pub kind: ConnectionKind,
    pub compatible: Vec<Connection>,
}

impl ConnectionCompatibility {
    pub fn has_existing(&self) -> bool {
        !self.compatible.is_empty()
    }

    /// Nothing to reuse, so "new connection" is the only option.
    pub fn must_create_new(&self) -> bool {
        self.compatible.is_empty()
    }

    /// The existing connection carrying the template connection's own id.
    pub fn same_connection(&self) -> Option<&Connection> {
        self.compatible
            .last()
            .filter(|c| c.id == self.template_connection)
    }
}

/// Matching results for every connection a template declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompatibilityReport {
    pub entries: Vec<ConnectionCompatibility>,
}

impl CompatibilityReport {
    pub fn build(template: &Template, existing: &[Connection]) -> Self {
        let entries = template
            .model
            .connections
            .iter()
            .map(|declared| ConnectionCompatibility {
                template_connection: declared.id.clone(),
                name: declared.name.clone(),
                kind: declared.kind.clone(),
                compatible: find_compatible(declared, existing)
                    .into_iter()
                    .cloned()
                    .collect(),
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, cid: &ConnectionId) -> Option<&ConnectionCompatibility> {
        self.entries.iter().find(|e| &e.template_connection == cid)
    }
}
