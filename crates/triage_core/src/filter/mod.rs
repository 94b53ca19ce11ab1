use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{Incident, IncidentStatus};

/// One dropdown in the filter bar: either "all" or an exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum FilterValue<T> {
    #[default]
    All,
    Exact(T),
}

impl<T: PartialEq> FilterValue<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Exact(expected) => expected == value,
        }
    }
}

impl FilterValue<String> {
    /// Parse a dropdown value. `"all"` (any case) and blank strings mean no filter.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(v) if v.eq_ignore_ascii_case("all") => Self::All,
            Some(v) => Self::Exact(v.to_string()),
        }
    }
}

/// The combination of values narrowing the visible incident list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub project: FilterValue<String>,
    pub category: FilterValue<String>,
    pub status: FilterValue<IncidentStatus>,
    pub search: String,
}

impl Criteria {
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = FilterValue::Exact(project.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = FilterValue::Exact(category.into());
        self
    }

    pub fn with_status(mut self, status: IncidentStatus) -> Self {
        self.status = FilterValue::Exact(status);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.project == FilterValue::All
            && self.category == FilterValue::All
            && self.status == FilterValue::All
            && self.search.trim().is_empty()
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        self.matches_with_needle(incident, &self.search.trim().to_lowercase())
    }

    fn matches_with_needle(&self, incident: &Incident, needle: &str) -> bool {
        self.project.admits(&incident.project)
            && self.category.admits(&incident.category)
            && self.status.admits(&incident.status)
            && matches_search(incident, needle)
    }
}

/// `needle` must already be trimmed and lowercased.
fn matches_search(incident: &Incident, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [
        incident.description.as_str(),
        incident.full_description.as_str(),
        incident.project.as_str(),
        incident.category.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Stable filter: keeps the relative order of `incidents`.
pub fn filter_incidents(incidents: &[Incident], criteria: &Criteria) -> Vec<Incident> {
    if criteria.is_unrestricted() {
        return incidents.to_vec();
    }
    let needle = criteria.search.trim().to_lowercase();
    incidents
        .iter()
        .filter(|i| criteria.matches_with_needle(i, &needle))
        .cloned()
        .collect()
}

/// Option lists for the project and category dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub projects: Vec<String>,
    pub categories: Vec<String>,
}

pub fn facets(incidents: &[Incident]) -> Facets {
    let projects: BTreeSet<&str> = incidents.iter().map(|i| i.project.as_str()).collect();
    let categories: BTreeSet<&str> = incidents.iter().map(|i| i.category.as_str()).collect();
    Facets {
        projects: projects.into_iter().map(str::to_string).collect(),
        categories: categories.into_iter().map(str::to_string).collect(),
    }
}
