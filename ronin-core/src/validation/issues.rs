//! Issue templates shared across profiles.

use super::IssueTemplate;

pub const REQUIRED_FIELD: &str = "REQ_FIELD";
pub const CONCEPT_MAP_LOOKUP: &str = "NOV_CONMAP_LOOKUP";
pub const INVALID_VALUE_SET: &str = "INV_VALUE_SET";
pub const PROFILE_NO_MATCH: &str = "PROFILE_NO_MATCH";
pub const PROFILE_AMBIGUOUS: &str = "PROFILE_AMBIGUOUS";

pub fn required_field(field: &str) -> IssueTemplate {
    IssueTemplate::error(REQUIRED_FIELD, format!("{} is a required element", field))
}

pub fn concept_map_lookup(data_element: &str, value: &str, tenant: &str) -> IssueTemplate {
    IssueTemplate::error(
        CONCEPT_MAP_LOOKUP,
        format!(
            "Tenant source value '{}' has no target defined in any {} concept map for tenant '{}'",
            value, data_element, tenant
        ),
    )
}

pub fn invalid_value_set(element: &str, value: &str) -> IssueTemplate {
    IssueTemplate::error(
        INVALID_VALUE_SET,
        format!("'{}' is outside of required value set for {}", value, element),
    )
}

pub fn profile_no_match(resource_type: &str) -> IssueTemplate {
    IssueTemplate::error(
        PROFILE_NO_MATCH,
        format!("No profiles qualified for this {}", resource_type),
    )
}

pub fn profile_ambiguous(resource_type: &str, profiles: &[&str]) -> IssueTemplate {
    IssueTemplate::error(
        PROFILE_AMBIGUOUS,
        format!(
            "Multiple profiles qualified for this {}: {}",
            resource_type,
            profiles.join(", ")
        ),
    )
}
