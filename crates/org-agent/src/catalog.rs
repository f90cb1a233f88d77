//! Role → shift window and permitted resources.
//!
//! The catalog is loaded once at startup and shared read-only
//! (`Arc<RoleCatalog>`) by the gate, the behavior models and the runtime.
//!
//! # CSV permission format
//!
//! ```csv
//! role,resource
//! sales,sales_db
//! sales,inventory_db
//! hr,hr_db
//! ```
//!
//! A loaded permission file replaces the built-in resource lists; shift
//! windows keep their built-in values.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use org_core::{Role, WorkHours};

use crate::{AgentError, AgentResult};

/// Shift window used for a role with no catalog entry.
pub const DEFAULT_HOURS: WorkHours = WorkHours::new(9, 17);

/// Settings for one role.
#[derive(Clone, Debug, PartialEq)]
pub struct RoleSpec {
    pub hours:     WorkHours,
    pub resources: Vec<String>,
}

/// Static role configuration.
#[derive(Clone, Debug)]
pub struct RoleCatalog {
    specs:         BTreeMap<Role, RoleSpec>,
    high_value:    Vec<String>,
    all_resources: Vec<String>,
}

impl RoleCatalog {
    /// Build a catalog from explicit role specs.
    pub fn new(specs: BTreeMap<Role, RoleSpec>, high_value: Vec<String>) -> Self {
        let mut catalog = Self { specs, high_value, all_resources: Vec::new() };
        catalog.reindex();
        catalog
    }

    /// The default organization: six databases, one of them per department.
    pub fn builtin() -> Self {
        fn spec(start: u32, end: u32, resources: &[&str]) -> RoleSpec {
            RoleSpec {
                hours:     WorkHours::new(start, end),
                resources: resources.iter().map(|r| r.to_string()).collect(),
            }
        }

        let mut specs = BTreeMap::new();
        specs.insert(Role::Sales,       spec(8, 18, &["sales_db", "inventory_db"]));
        specs.insert(Role::Hr,          spec(8, 17, &["hr_db"]));
        specs.insert(Role::Finance,     spec(8, 18, &["finance_db", "sales_db"]));
        specs.insert(Role::Engineering, spec(9, 19, &["inventory_db", "support_db"]));
        specs.insert(Role::Support,     spec(8, 18, &["support_db", "sales_db"]));
        specs.insert(Role::Management,  spec(8, 18, &["sales_db", "finance_db", "hr_db"]));
        specs.insert(Role::ItAdmin,     spec(8, 17, &[
            "sales_db", "hr_db", "finance_db", "inventory_db", "support_db", "admin_db",
        ]));
        specs.insert(Role::Adversary,   spec(0, 24, &[
            "sales_db", "hr_db", "finance_db", "inventory_db", "support_db", "admin_db",
        ]));

        Self::new(specs, vec!["finance_db".to_string(), "hr_db".to_string()])
    }

    /// Replace the high-value resource subset.
    pub fn with_high_value(mut self, high_value: Vec<String>) -> Self {
        self.high_value = high_value;
        self
    }

    /// Replace the shift window for `role`.
    pub fn with_hours(mut self, role: Role, hours: WorkHours) -> Self {
        self.specs
            .entry(role)
            .or_insert_with(|| RoleSpec { hours, resources: Vec::new() })
            .hours = hours;
        self
    }

    pub fn spec(&self, role: Role) -> Option<&RoleSpec> {
        self.specs.get(&role)
    }

    /// Shift window for `role`, or [`DEFAULT_HOURS`] if the role is unknown.
    pub fn hours(&self, role: Role) -> WorkHours {
        self.specs.get(&role).map_or(DEFAULT_HOURS, |s| s.hours)
    }

    /// Resources `role` may touch (empty if the role is unknown).
    pub fn resources_for(&self, role: Role) -> &[String] {
        self.specs.get(&role).map_or(&[], |s| s.resources.as_slice())
    }

    /// Every resource named anywhere in the catalog, sorted and de-duplicated.
    pub fn all_resources(&self) -> &[String] {
        &self.all_resources
    }

    /// Resources reserved for the techniques that go after crown jewels.
    pub fn high_value_resources(&self) -> &[String] {
        &self.high_value
    }

    /// Check that every role in `roles` can reach at least one resource.
    pub fn validate_roles(&self, roles: impl IntoIterator<Item = Role>) -> AgentResult<()> {
        for role in roles {
            let empty = if role.is_adversarial() {
                self.all_resources.is_empty()
            } else {
                self.resources_for(role).is_empty()
            };
            if empty {
                return Err(AgentError::NoResources(role));
            }
        }
        Ok(())
    }

    fn reindex(&mut self) {
        let mut all: Vec<String> = self
            .specs
            .values()
            .flat_map(|s| s.resources.iter().cloned())
            .chain(self.high_value.iter().cloned())
            .collect();
        all.sort_unstable();
        all.dedup();
        self.all_resources = all;
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// ── CSV loading ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PermissionRecord {
    role:     String,
    resource: String,
}

/// Load role permissions from a CSV file.  See the module docs for the format.
pub fn load_permissions_csv(path: &Path) -> AgentResult<RoleCatalog> {
    let file = std::fs::File::open(path)?;
    load_permissions_reader(file)
}

/// Like [`load_permissions_csv`] but accepts any `Read` source.
pub fn load_permissions_reader<R: Read>(reader: R) -> AgentResult<RoleCatalog> {
    let builtin = RoleCatalog::builtin();
    let mut resources: BTreeMap<Role, Vec<String>> = BTreeMap::new();

    let mut csv_reader = csv::Reader::from_reader(reader);
    for result in csv_reader.deserialize::<PermissionRecord>() {
        let row = result.map_err(|e| AgentError::Parse(e.to_string()))?;
        let role: Role = row.role.parse()?;
        let resource = row.resource.trim();
        if resource.is_empty() {
            return Err(AgentError::Parse(format!("empty resource for role {role}")));
        }
        let list = resources.entry(role).or_default();
        if !list.iter().any(|r| r == resource) {
            list.push(resource.to_string());
        }
    }

    let specs = resources
        .into_iter()
        .map(|(role, resources)| (role, RoleSpec { hours: builtin.hours(role), resources }))
        .collect();

    Ok(RoleCatalog::new(specs, builtin.high_value_resources().to_vec()))
}
