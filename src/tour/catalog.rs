//! Step catalog: the static, ordered definition of tour groups.
//!
//! Each group is bound to exactly one dashboard route and holds the steps that
//! can be satisfied on that route. Global numbering ("step X of N") is derived
//! from the cumulative step counts of the groups before the current one.

use std::path::Path;

use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Errors raised by catalog access and validation.
///
/// The catalog is build-time data, so every variant points at a programming
/// or configuration defect rather than a runtime condition.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("group index {index} out of range (catalog has {len} groups)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("step index {index} out of range for group {group} ({len} steps)")]
    StepOutOfRange {
        group: usize,
        index: usize,
        len: usize,
    },

    #[error("tour catalog has no groups")]
    Empty,

    #[error("group {index} ({route}) has no steps")]
    EmptyGroup { index: usize, route: String },

    #[error("group {index} route '{route}' must start with '/'")]
    InvalidRoute { index: usize, route: String },

    #[error("step {step} of group {group} has an empty target selector")]
    EmptyTarget { group: usize, step: usize },

    #[error("failed to parse tour catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read tour catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the tooltip sits relative to its highlighted element
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, JsonSchema, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Placement {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    Center,
    Auto,
}

/// One highlighted element plus its tooltip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema, ToSchema)]
#[ts(export)]
pub struct TourStep {
    /// Selector of the element to highlight (e.g. `[data-tour="summary-cards"]`)
    pub target: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub placement: Placement,
    /// Show the tooltip immediately instead of pulsing a beacon first
    #[serde(default)]
    pub suppress_entry_animation: bool,
}

/// A contiguous run of steps bound to one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema, ToSchema)]
#[ts(export)]
pub struct TourGroup {
    pub route: String,
    pub steps: Vec<TourStep>,
}

/// Ordered sequence of tour groups, fixed for the life of the process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema, ToSchema)]
#[ts(export)]
pub struct StepCatalog {
    groups: Vec<TourGroup>,
}

impl StepCatalog {
    pub fn new(groups: Vec<TourGroup>) -> Self {
        Self { groups }
    }

    /// The built-in catalog covering the analytics dashboard
    pub fn dashboard() -> Self {
        DASHBOARD_CATALOG.clone()
    }

    /// Parse and validate a catalog from TOML (`[[groups]]` / `[[groups.steps]]`)
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let catalog: StepCatalog = toml::from_str(contents)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load and validate a catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn groups(&self) -> &[TourGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, index: usize) -> Result<&TourGroup, CatalogError> {
        self.groups.get(index).ok_or(CatalogError::IndexOutOfRange {
            index,
            len: self.groups.len(),
        })
    }

    pub fn step(&self, group: usize, index: usize) -> Result<&TourStep, CatalogError> {
        let steps = &self.group(group)?.steps;
        steps.get(index).ok_or(CatalogError::StepOutOfRange {
            group,
            index,
            len: steps.len(),
        })
    }

    /// Step count of a group, zero when the index is out of range
    pub fn group_len(&self, group: usize) -> usize {
        self.groups.get(group).map(|g| g.steps.len()).unwrap_or(0)
    }

    pub fn is_last_group(&self, group: usize) -> bool {
        group + 1 == self.groups.len()
    }

    pub fn total_steps(&self) -> usize {
        self.groups.iter().map(|g| g.steps.len()).sum()
    }

    /// Cumulative step count of all groups strictly before `group`
    pub fn offset(&self, group: usize) -> usize {
        self.groups.iter().take(group).map(|g| g.steps.len()).sum()
    }

    /// Check the structural invariants the tour relies on.
    ///
    /// Targets are only checked for being non-empty; whether they exist on
    /// the rendered page is the overlay's concern.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.groups.is_empty() {
            return Err(CatalogError::Empty);
        }

        for (index, group) in self.groups.iter().enumerate() {
            if !group.route.starts_with('/') {
                return Err(CatalogError::InvalidRoute {
                    index,
                    route: group.route.clone(),
                });
            }
            if group.steps.is_empty() {
                return Err(CatalogError::EmptyGroup {
                    index,
                    route: group.route.clone(),
                });
            }
            if let Some(step) = group.steps.iter().position(|s| s.target.trim().is_empty()) {
                return Err(CatalogError::EmptyTarget { group: index, step });
            }
        }

        Ok(())
    }
}

static DASHBOARD_CATALOG: Lazy<StepCatalog> = Lazy::new(build_dashboard_catalog);

fn build_dashboard_catalog() -> StepCatalog {
    fn step(target: &str, title: &str, content: &str, placement: Placement) -> TourStep {
        TourStep {
            target: format!("[data-tour=\"{target}\"]"),
            title: title.to_string(),
            content: content.to_string(),
            placement,
            suppress_entry_animation: true,
        }
    }

    fn group(route: &str, steps: Vec<TourStep>) -> TourGroup {
        TourGroup {
            route: route.to_string(),
            steps,
        }
    }

    let overview = vec![
        step(
            "summary-cards",
            "Your team at a glance",
            "Commit volume, review latency and deploy frequency for the selected period.",
            Placement::Center,
        ),
        step(
            "date-range",
            "Pick a time window",
            "Every chart on the dashboard follows this range.",
            Placement::Bottom,
        ),
        step(
            "team-filter",
            "Filter by team",
            "Narrow the metrics down to one or more teams.",
            Placement::Left,
        ),
        step(
            "activity-chart",
            "Activity over time",
            "Hover a bar to see the contributions behind it.",
            Placement::Top,
        ),
        step(
            "sidebar-nav",
            "Explore further",
            "Each section drills into a different part of your delivery pipeline.",
            Placement::Right,
        ),
    ];
    StepCatalog::new(vec![
        group("/", overview),
        group(
            "/repositories",
            vec![
                step(
                    "repo-table",
                    "Repositories",
                    "Every connected repository with its churn and open work.",
                    Placement::Top,
                ),
                step(
                    "repo-health",
                    "Health score",
                    "Combines test coverage, stale branches and review turnaround.",
                    Placement::Left,
                ),
            ],
        ),
        group(
            "/contributors",
            vec![
                step(
                    "contributor-list",
                    "Contributors",
                    "Who is shipping, reviewing and unblocking others.",
                    Placement::Top,
                ),
                step(
                    "contributor-heatmap",
                    "Working patterns",
                    "Spot after-hours work before it turns into burnout.",
                    Placement::Top,
                ),
            ],
        ),
        group(
            "/pull-requests",
            vec![
                step(
                    "pr-cycle-time",
                    "Cycle time",
                    "Time from first commit to merge, split by stage.",
                    Placement::Bottom,
                ),
                step(
                    "pr-review-queue",
                    "Review queue",
                    "Pull requests waiting longest for a reviewer.",
                    Placement::Left,
                ),
            ],
        ),
        group(
            "/deployments",
            vec![step(
                "deploy-timeline",
                "Deployments",
                "Release frequency and change failure rate per environment.",
                Placement::Top,
            )],
        ),
        group(
            "/settings",
            vec![
                step(
                    "integrations",
                    "Integrations",
                    "Connect more repositories and issue trackers here.",
                    Placement::Right,
                ),
                step(
                    "restart-tour",
                    "Need a refresher?",
                    "You can restart this tour from settings at any time.",
                    Placement::Left,
                ),
            ],
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with_counts(counts: &[usize]) -> StepCatalog {
        let groups = counts
            .iter()
            .enumerate()
            .map(|(g, &count)| TourGroup {
                route: format!("/page-{g}"),
                steps: (0..count)
                    .map(|s| TourStep {
                        target: format!("#g{g}-s{s}"),
                        title: format!("Step {s}"),
                        content: String::new(),
                        placement: Placement::default(),
                        suppress_entry_animation: false,
                    })
                    .collect(),
            })
            .collect();
        StepCatalog::new(groups)
    }

    #[test]
    fn test_total_steps_and_offsets() {
        let catalog = catalog_with_counts(&[5, 2, 2, 2, 1, 2]);
        assert_eq!(catalog.total_steps(), 14);
        assert_eq!(catalog.offset(0), 0);
        assert_eq!(catalog.offset(3), 9);
        assert_eq!(catalog.offset(6), 14);
    }

    #[test]
    fn test_offset_is_cumulative() {
        let catalog = catalog_with_counts(&[3, 1, 4, 1, 5]);
        for i in 1..catalog.len() {
            assert_eq!(
                catalog.offset(i),
                catalog.offset(i - 1) + catalog.group_len(i - 1)
            );
        }
    }

    #[test]
    fn test_group_out_of_range() {
        let catalog = catalog_with_counts(&[1, 1]);
        assert!(catalog.group(1).is_ok());
        let err = catalog.group(2).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::IndexOutOfRange { index: 2, len: 2 }
        ));
    }

    #[test]
    fn test_step_out_of_range() {
        let catalog = catalog_with_counts(&[2]);
        assert_eq!(catalog.step(0, 1).unwrap().target, "#g0-s1");
        assert!(matches!(
            catalog.step(0, 2),
            Err(CatalogError::StepOutOfRange {
                group: 0,
                index: 2,
                len: 2
            })
        ));
    }

    #[test]
    fn test_dashboard_catalog_shape() {
        let catalog = StepCatalog::dashboard();
        let counts: Vec<usize> = catalog.groups().iter().map(|g| g.steps.len()).collect();
        assert_eq!(counts, vec![5, 2, 2, 2, 1, 2]);
        assert_eq!(catalog.total_steps(), 14);
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.group(0).unwrap().route, "/");
        assert_eq!(catalog.step(0, 0).unwrap().placement, Placement::Center);
    }

    #[test]
    fn test_dashboard_routes_are_unique() {
        let catalog = StepCatalog::dashboard();
        let mut routes: Vec<&str> = catalog.groups().iter().map(|g| g.route.as_str()).collect();
        routes.sort_unstable();
        routes.dedup();
        assert_eq!(routes.len(), catalog.len());
    }

    #[test]
    fn test_validate_rejects_bad_catalogs() {
        assert!(matches!(
            StepCatalog::new(vec![]).validate(),
            Err(CatalogError::Empty)
        ));

        let mut catalog = catalog_with_counts(&[1, 0]);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::EmptyGroup { index: 1, .. })
        ));

        catalog = catalog_with_counts(&[1]);
        catalog.groups[0].route = "settings".to_string();
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidRoute { index: 0, .. })
        ));

        catalog = catalog_with_counts(&[2]);
        catalog.groups[0].steps[1].target = "  ".to_string();
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::EmptyTarget { group: 0, step: 1 })
        ));
    }

    #[test]
    fn test_from_toml_str() {
        let toml = r##"
            [[groups]]
            route = "/"

            [[groups.steps]]
            target = "#summary"
            title = "Summary"
            content = "Headline metrics"
            placement = "center"

            [[groups]]
            route = "/settings"

            [[groups.steps]]
            target = "#integrations"
            title = "Integrations"
            content = "Connect more sources"
        "##;

        let catalog = StepCatalog::from_toml_str(toml).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.step(0, 0).unwrap().placement, Placement::Center);
        assert_eq!(catalog.step(1, 0).unwrap().placement, Placement::Bottom);
        assert!(!catalog.step(1, 0).unwrap().suppress_entry_animation);
    }

    #[test]
    fn test_from_toml_str_validates() {
        let toml = r#"
            [[groups]]
            route = "/"
            steps = []
        "#;
        assert!(matches!(
            StepCatalog::from_toml_str(toml),
            Err(CatalogError::EmptyGroup { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = StepCatalog::load(Path::new("/nonexistent/tour.toml")).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
