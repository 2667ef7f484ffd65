//! Process property engine.
//!
//! Properties are free-form name/value pairs attached to a process.
//! A `container` number above zero groups related properties so they
//! can be duplicated or edited as a unit; container zero holds
//! standalone properties.
//!
//! Property templates from the configuration contribute validation
//! rules (required flags and value patterns) and may be bound to
//! specific step titles.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::db::{property_repo, property_repo::PropertyRow, Database, DatabaseError};

/// A configured property template. Templates bound to step titles only
/// apply when editing from one of those steps.
#[derive(Debug, Clone)]
pub struct PropertyTemplate {
    pub name: String,
    pub required: bool,
    pub pattern: Option<Regex>,
    pub steps: Vec<String>,
}

impl PropertyTemplate {
    /// Whether this template applies when editing from the given step.
    /// Templates without a step binding always apply.
    pub fn applies_to(&self, step_title: Option<&str>) -> bool {
        if self.steps.is_empty() {
            return true;
        }
        match step_title {
            Some(title) => self.steps.iter().any(|s| s == title),
            None => false,
        }
    }
}

/// An editable process property, merged from a stored row and its
/// template (if one matches by name).
#[derive(Debug, Clone)]
pub struct ProcessProperty {
    pub id: Option<i64>,
    pub process_id: i64,
    pub name: String,
    pub value: String,
    pub container: i64,
    pub required: bool,
    pub pattern: Option<Regex>,
}

impl ProcessProperty {
    fn from_row(row: &PropertyRow, template: Option<&PropertyTemplate>) -> Self {
        Self {
            id: Some(row.id),
            process_id: row.process_id,
            name: row.title.clone().unwrap_or_default(),
            value: row.value.clone(),
            container: row.container,
            required: template.map(|t| t.required).unwrap_or(false),
            pattern: template.and_then(|t| t.pattern.clone()),
        }
    }

    fn from_template(process_id: i64, template: &PropertyTemplate) -> Self {
        Self {
            id: None,
            process_id,
            name: template.name.clone(),
            value: String::new(),
            container: 0,
            required: template.required,
            pattern: template.pattern.clone(),
        }
    }

    /// Checks the value against the required flag and the pattern.
    /// The pattern is only applied to non-empty values.
    pub fn is_valid(&self) -> bool {
        let trimmed = self.value.trim();
        if self.required && trimmed.is_empty() {
            return false;
        }
        if let Some(pattern) = &self.pattern {
            if !trimmed.is_empty() && !pattern.is_match(trimmed) {
                return false;
            }
        }
        true
    }

    /// Returns an unsaved copy of this property placed in another container.
    pub fn clone_to_container(&self, container: i64) -> Self {
        Self {
            id: None,
            container,
            ..self.clone()
        }
    }
}

/// The properties of one container, in stored order.
#[derive(Debug, Clone)]
pub struct PropertyGroup {
    pub container: i64,
    pub properties: Vec<ProcessProperty>,
}

/// Loads the properties of a process, merged with the templates that
/// apply for the given step. Templates without a stored row contribute
/// a fresh empty property.
pub fn load_process_properties(
    db: &Database,
    process_id: i64,
    templates: &[PropertyTemplate],
    step_title: Option<&str>,
) -> Result<Vec<ProcessProperty>, DatabaseError> {
    let applicable: Vec<&PropertyTemplate> = templates
        .iter()
        .filter(|t| t.applies_to(step_title))
        .collect();

    let rows = property_repo::list_for_process(db, process_id)?;
    let mut properties: Vec<ProcessProperty> = rows
        .iter()
        .map(|row| {
            let template = row
                .title
                .as_deref()
                .and_then(|title| applicable.iter().find(|t| t.name == title).copied());
            ProcessProperty::from_row(row, template)
        })
        .collect();

    for template in &applicable {
        let exists = properties.iter().any(|p| p.name == template.name);
        if !exists {
            properties.push(ProcessProperty::from_template(process_id, template));
        }
    }

    Ok(properties)
}

/// Groups properties by container. Container numbers that only exist on
/// other batch members appear as `None` placeholders so the caller
/// knows the container exists without having local properties for it.
pub fn build_containers(
    own: &[ProcessProperty],
    peer_containers: &[i64],
) -> BTreeMap<i64, Option<PropertyGroup>> {
    let mut map: BTreeMap<i64, Option<PropertyGroup>> = BTreeMap::new();

    for property in own {
        let entry = map.entry(property.container).or_insert_with(|| {
            Some(PropertyGroup {
                container: property.container,
                properties: Vec::new(),
            })
        });
        if let Some(group) = entry {
            group.properties.push(property.clone());
        }
    }

    for container in peer_containers {
        map.entry(*container).or_insert(None);
    }

    map
}

/// Picks the smallest container id >= 1 not present in `used`.
pub fn next_container_id(used: impl IntoIterator<Item = i64>) -> i64 {
    let used: BTreeSet<i64> = used.into_iter().collect();
    let mut candidate = 1;
    while used.contains(&candidate) {
        candidate += 1;
    }
    candidate
}
