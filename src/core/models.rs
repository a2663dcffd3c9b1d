use crate::core::types::{
    ChartId, ChartTid, ConnectionId, ConnectionKind, DataRequestId, RecordId, SavedQueryId, TeamId,
    TemplateId,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A configured link to an external data source.
///
/// Only the fields used to recognise the same source across projects are
/// modelled; everything else the backend returns is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: ConnectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firebase_service_account: Option<Value>,
    #[serde(rename = "oauth_id", default, skip_serializing_if = "Option::is_none")]
    pub oauth_id: Option<RecordId>,
}

impl Connection {
    pub fn new(id: impl Into<ConnectionId>, name: impl Into<String>, kind: ConnectionKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            host: None,
            connection_string: None,
            db_name: None,
            firebase_service_account: None,
            oauth_id: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    pub fn with_service_account(mut self, account: impl Into<Value>) -> Self {
        self.firebase_service_account = Some(account.into());
        self
    }

    pub fn with_oauth_id(mut self, oauth_id: impl Into<RecordId>) -> Self {
        self.oauth_id = Some(oauth_id.into());
        self
    }
}

/// A predefined bundle of connection requirements and chart definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: TemplateModel,
}

/// Declared connections and charts of a template, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateModel {
    #[serde(rename = "Connections", default, deserialize_with = "null_as_default")]
    pub connections: Vec<Connection>,
    #[serde(rename = "Charts", default, deserialize_with = "null_as_default")]
    pub charts: Vec<ChartDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDeclaration {
    pub tid: ChartTid,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "Datasets", default, deserialize_with = "null_as_default")]
    pub datasets: Vec<DatasetDeclaration>,
}

/// A chart's dependency on one template connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDeclaration {
    #[serde(rename = "Connection", default)]
    pub connection: Option<ConnectionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Per template connection choice sent with a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSelection {
    pub id: ConnectionId,
    pub name: String,
    pub active: bool,
    pub create_new: bool,
}

/// Payload of a dashboard generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub template_id: TemplateId,
    pub charts: Vec<ChartTid>,
    pub connections: BTreeMap<ConnectionId, ConnectionSelection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: SavedQueryId,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub summary: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSavedQuery {
    pub query: String,
    pub summary: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A chart data request. Fields this crate does not edit are carried through
/// untouched so saving never drops backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRequest {
    pub id: DataRequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_id: Option<ChartId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataRequest {
    pub fn new(id: impl Into<DataRequestId>) -> Self {
        Self {
            id: id.into(),
            chart_id: None,
            connection_id: None,
            query: None,
            extra: Map::new(),
        }
    }
}

/// Outcome of running a data request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataRequestResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Latest cached response for a data request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRequestResponse {
    pub id: DataRequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_connection_wire_names() {
        let json = r#"{
            "id": 4,
            "name": "Reporting",
            "type": "mongodb",
            "connectionString": "mongodb://db/app",
            "dbName": "app",
            "oauth_id": "abc",
            "project_id": 9
        }"#;
        let connection: Connection = serde_json::from_str(json).unwrap();

        assert_eq!(connection.id, ConnectionId::from(4));
        assert_eq!(connection.kind, ConnectionKind::MongoDb);
        assert_eq!(connection.connection_string.as_deref(), Some("mongodb://db/app"));
        assert_eq!(connection.db_name.as_deref(), Some("app"));
        assert_eq!(connection.oauth_id, Some(RecordId::from("abc")));
    }

    #[test]
    fn test_partial_template_deserializes_empty() {
        let bare: Template = serde_json::from_str(r#"{"id": 1, "name": "Bare"}"#).unwrap();
        assert!(bare.model.connections.is_empty());
        assert!(bare.model.charts.is_empty());

        let nulls: Template = serde_json::from_str(
            r#"{"id": 2, "model": {"Connections": null,
                "Charts": [{"tid": 1, "Datasets": null}]}}"#,
        )
        .unwrap();
        assert!(nulls.model.connections.is_empty());
        assert_eq!(nulls.model.charts.len(), 1);
        assert!(nulls.model.charts[0].datasets.is_empty());

        let null_model: Template = serde_json::from_str(r#"{"id": 3, "model": null}"#).unwrap();
        assert_eq!(null_model.model, TemplateModel::default());

        let untyped: Template = serde_json::from_str(
            r#"{"id": 4, "model": {
                "Connections": [{"id": 2, "name": "Mongo"}, {"id": 3, "type": null}],
                "Charts": [{"tid": 1, "Datasets": [{"Connection": 2}]}]}}"#,
        )
        .unwrap();
        assert_eq!(untyped.model.connections.len(), 2);
        assert_eq!(untyped.model.connections[0].kind, ConnectionKind::Other(String::new()));
        assert_eq!(untyped.model.connections[1].kind, ConnectionKind::default());
    }

    #[test]
    fn test_generation_request_shape() {
        let mut connections = BTreeMap::new();
        connections.insert(
            ConnectionId::from(2),
            ConnectionSelection {
                id: ConnectionId::from(2),
                name: "Mongo".to_string(),
                active: true,
                create_new: false,
            },
        );
        let request = GenerationRequest {
            template_id: TemplateId::from(12),
            charts: vec![ChartTid::from(1), ChartTid::from(3)],
            connections,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "template_id": 12,
                "charts": [1, 3],
                "connections": {
                    "2": { "id": 2, "name": "Mongo", "active": true, "createNew": false }
                }
            })
        );
    }

    #[test]
    fn test_data_request_keeps_unknown_fields() {
        let json = r#"{"id": 5, "query": "collection('a').find()", "useGlobalHeaders": true}"#;
        let request: DataRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.extra.get("useGlobalHeaders"), Some(&Value::Bool(true)));

        let back = serde_json::to_value(&request).unwrap();
        assert_eq!(back["useGlobalHeaders"], Value::Bool(true));
    }
}
