//! Selection state for instantiating a dashboard from a template
//!
//! Tracks which template connections are active, which of them should be
//! created fresh instead of reusing an existing connection, and which charts
//! are selected. A chart may never stay selected while one of the connections
//! it reads from is inactive; deactivating a connection deselects such charts
//! right away and reports which ones were dropped.

use crate::core::{
    ChartDeclaration, ChartTid, ConnectionId, ConnectionSelection, GenerationRequest, Template,
    TemplateId,
};
use derive_deref::{Deref, DerefMut};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Set of selected chart tids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct SelectedCharts(pub BTreeSet<ChartTid>);

/// Result of toggling a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartToggle {
    Selected,
    Deselected,
    /// The chart reads from an inactive connection and stays unselected.
    Blocked { dependency: String },
    /// The tid is not declared by the template.
    Unknown,
}

/// A chart that cannot be generated because a connection it needs is inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyWarning {
    pub tid: ChartTid,
    pub chart_name: String,
    pub connection_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSelection {
    template_id: TemplateId,
    charts: Vec<ChartDeclaration>,
    connections: BTreeMap<ConnectionId, ConnectionSelection>,
    selected_charts: SelectedCharts,
}

impl TemplateSelection {
    /// Fresh state for `template`: every connection active and reused, every
    /// chart selected.
    pub fn new(template: &Template) -> Self {
        let connections = template
            .model
            .connections
            .iter()
            .map(|c| {
                (
                    c.id.clone(),
                    ConnectionSelection {
                        id: c.id.clone(),
                        name: c.name.clone(),
                        active: true,
                        create_new: false,
                    },
                )
            })
            .collect();
        let selected_charts = SelectedCharts(
            template.model.charts.iter().map(|c| c.tid.clone()).collect(),
        );

        Self {
            template_id: template.id.clone(),
            charts: template.model.charts.clone(),
            connections,
            selected_charts,
        }
    }

    pub fn template_id(&self) -> &TemplateId {
        &self.template_id
    }

    pub fn charts(&self) -> &[ChartDeclaration] {
        &self.charts
    }

    pub fn connections(&self) -> &BTreeMap<ConnectionId, ConnectionSelection> {
        &self.connections
    }

    pub fn connection(&self, cid: &ConnectionId) -> Option<&ConnectionSelection> {
        self.connections.get(cid)
    }

    pub fn selected_charts(&self) -> &SelectedCharts {
        &self.selected_charts
    }

    pub fn is_chart_selected(&self, tid: &ChartTid) -> bool {
        self.selected_charts.contains(tid)
    }

    /// Flip `active` for a connection, then drop every selected chart that now
    /// depends on an inactive connection. Returns the dropped tids.
    pub fn toggle_connection_active(&mut self, cid: &ConnectionId) -> Vec<ChartTid> {
        let Some(entry) = self.connections.get_mut(cid) else {
            debug!("Ignoring active toggle for unknown connection {cid}");
            return Vec::new();
        };
        entry.active = !entry.active;
        debug!("Connection {cid} active={}", entry.active);

        self.deselect_blocked()
    }

    /// Flip `createNew` for a connection. Unknown ids are ignored.
    pub fn toggle_create_new(&mut self, cid: &ConnectionId) -> bool {
        match self.connections.get_mut(cid) {
            Some(entry) => {
                entry.create_new = !entry.create_new;
                true
            }
            None => {
                debug!("Ignoring create-new toggle for unknown connection {cid}");
                false
            }
        }
    }

    pub fn toggle_chart_selected(&mut self, tid: &ChartTid) -> ChartToggle {
        let Some(chart) = self.charts.iter().find(|c| &c.tid == tid) else {
            debug!("Ignoring toggle for unknown chart {tid}");
            return ChartToggle::Unknown;
        };

        if self.selected_charts.remove(tid) {
            return ChartToggle::Deselected;
        }
        if let Some(dependency) = self.dependency_for(chart) {
            return ChartToggle::Blocked {
                dependency: dependency.to_string(),
            };
        }
        self.selected_charts.insert(tid.clone());
        ChartToggle::Selected
    }

    /// Select every chart that is not blocked by an inactive connection.
    pub fn select_all(&mut self) {
        let selectable: BTreeSet<ChartTid> = self
            .charts
            .iter()
            .filter(|c| self.dependency_for(c).is_none())
            .map(|c| c.tid.clone())
            .collect();
        self.selected_charts = SelectedCharts(selectable);
    }

    pub fn deselect_all(&mut self) {
        self.selected_charts.clear();
    }

    /// Name of the first inactive connection `chart` reads from, in dataset
    /// order. Datasets pointing at undeclared connections are skipped.
    pub fn dependency_for(&self, chart: &ChartDeclaration) -> Option<&str> {
        chart
            .datasets
            .iter()
            .filter_map(|d| d.connection.as_ref())
            .filter_map(|cid| self.connections.get(cid))
            .find(|entry| !entry.active)
            .map(|entry| entry.name.as_str())
    }

    /// Dependency warnings for every declared chart, in declaration order.
    pub fn dependency_warnings(&self) -> Vec<DependencyWarning> {
        self.charts
            .iter()
            .filter_map(|chart| {
                self.dependency_for(chart).map(|name| DependencyWarning {
                    tid: chart.tid.clone(),
                    chart_name: chart.name.clone(),
                    connection_name: name.to_string(),
                })
            })
            .collect()
    }

    fn deselect_blocked(&mut self) -> Vec<ChartTid> {
        let mut seen = BTreeSet::new();
        let blocked: Vec<ChartTid> = self
            .charts
            .iter()
            .filter(|c| self.selected_charts.contains(&c.tid))
            .filter(|c| self.dependency_for(c).is_some())
            .filter(|c| seen.insert(c.tid.clone()))
            .map(|c| c.tid.clone())
            .collect();

        for tid in &blocked {
            self.selected_charts.remove(tid);
        }
        if !blocked.is_empty() {
            info!("Deselected {} chart(s) with inactive dependencies", blocked.len());
        }
        blocked
    }

    /// Snapshot for a generation request. Charts keep declaration order and a
    /// tid declared twice is sent once.
    pub fn to_request(&self) -> GenerationRequest {
        let mut emitted = BTreeSet::new();
        GenerationRequest {
            template_id: self.template_id.clone(),
            charts: self
                .charts
                .iter()
                .filter(|c| self.selected_charts.contains(&c.tid))
                .filter(|c| emitted.insert(c.tid.clone()))
                .map(|c| c.tid.clone())
                .collect(),
            connections: self.connections.clone(),
        }
    }
}
