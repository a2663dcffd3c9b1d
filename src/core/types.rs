use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Identifier as the backend sends it.
///
/// Records may be keyed by integers or by strings depending on the source, so
/// the wire representation is kept and compared strictly: `1` and `"1"`
/// are different identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Numeric input becomes `Number`, anything else `Text`.
impl FromStr for RecordId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(s.to_string()),
        })
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub RecordId);

        impl $name {
            pub fn as_record(&self) -> &RecordId {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(RecordId::Number(value))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(RecordId::from(value))
            }
        }
    };
}

record_id!(
    /// Identifier of a connection, either a user's or one declared by a template
    ConnectionId
);
record_id!(
    /// Template-local chart identifier (`tid`)
    ChartTid
);
record_id!(TemplateId);
record_id!(ProjectId);
record_id!(TeamId);
record_id!(SavedQueryId);
record_id!(ChartId);
record_id!(DataRequestId);

/// Kind of data source behind a connection.
///
/// Unknown kinds are kept in `Other` so a template or connection list using a
/// newer source type still loads; such connections never match anything. A
/// missing type defaults to an empty `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionKind {
    Api,
    MongoDb,
    MySql,
    Postgres,
    Firestore,
    RealtimeDb,
    GoogleAnalytics,
    Other(String),
}

impl ConnectionKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Api => "api",
            Self::MongoDb => "mongodb",
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Firestore => "firestore",
            Self::RealtimeDb => "realtimedb",
            Self::GoogleAnalytics => "googleAnalytics",
            Self::Other(name) => name,
        }
    }
}

impl Default for ConnectionKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for ConnectionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "api" => Self::Api,
            "mongodb" => Self::MongoDb,
            "mysql" => Self::MySql,
            "postgres" => Self::Postgres,
            "firestore" => Self::Firestore,
            "realtimedb" => Self::RealtimeDb,
            "googleAnalytics" => Self::GoogleAnalytics,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ConnectionKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ConnectionKind> for String {
    fn from(value: ConnectionKind) -> Self {
        match value {
            ConnectionKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_keeps_wire_representation() {
        let numeric: RecordId = serde_json::from_str("42").unwrap();
        let textual: RecordId = serde_json::from_str("\"42\"").unwrap();

        assert_eq!(numeric, RecordId::Number(42));
        assert_eq!(textual, RecordId::Text("42".to_string()));
        assert_ne!(numeric, textual, "1 and \"1\" are distinct identifiers");
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "42");
        assert_eq!(serde_json::to_string(&textual).unwrap(), "\"42\"");
    }

    #[test]
    fn test_record_id_from_cli_input() {
        assert_eq!("17".parse::<ConnectionId>().unwrap(), ConnectionId::from(17));
        assert_eq!(
            "conn-a".parse::<ConnectionId>().unwrap(),
            ConnectionId::from("conn-a")
        );
    }

    #[test]
    fn test_connection_kind_conversion() {
        assert_eq!(ConnectionKind::from("googleAnalytics"), ConnectionKind::GoogleAnalytics);
        assert_eq!(ConnectionKind::Postgres.as_str(), "postgres");
        assert_eq!(
            ConnectionKind::from("googleSheets"),
            ConnectionKind::Other("googleSheets".to_string())
        );
    }

    #[test]
    fn test_connection_kind_serialization() {
        let kind: ConnectionKind = serde_json::from_str("\"realtimedb\"").unwrap();
        assert_eq!(kind, ConnectionKind::RealtimeDb);

        let unknown: ConnectionKind = serde_json::from_str("\"strapi\"").unwrap();
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"strapi\"");
    }
}
