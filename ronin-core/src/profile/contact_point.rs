//! `ContactPoint` element profile shared by resources with a `telecom` list.
//!
//! Each item's `system` and `use` are mapped from tenant codes through the
//! registry. Items without a value or system are dropped with a warning; a
//! code the registry cannot map is an error on that item.

use super::TransformContext;
use crate::model::ronin::extension_url::{TENANT_SOURCE_TELECOM_SYSTEM, TENANT_SOURCE_TELECOM_USE};
use crate::model::ronin::system::tenant_code_system;
use crate::model::{
    CodedEnum, Coding, ContactPoint, ContactPointSystem, ContactPointUse, Extension,
    PrimitiveExtension,
};
use crate::validation::issues;
use crate::validation::{IssueTemplate, LocationPath, Validation};

fn system_required() -> IssueTemplate {
    IssueTemplate::error("RONIN_CNTCTPT_001", "A system is required for a contact point")
}

fn value_required() -> IssueTemplate {
    IssueTemplate::error("RONIN_CNTCTPT_002", "A value is required for a contact point")
}

fn extension_missing(element: &str) -> IssueTemplate {
    IssueTemplate::error(
        if element == "system" { "RONIN_CNTCTPT_003" } else { "RONIN_CNTCTPT_005" },
        format!("Tenant source telecom {} extension is missing or invalid", element),
    )
}

fn extension_wrong_url(element: &str) -> IssueTemplate {
    IssueTemplate::error(
        if element == "system" { "RONIN_CNTCTPT_004" } else { "RONIN_CNTCTPT_006" },
        format!("Tenant source telecom {} extension is defined without proper URL", element),
    )
}

fn dropped_missing_value() -> IssueTemplate {
    IssueTemplate::warning(
        "RONIN_CNTCTPT_007",
        "No value was provided, so this contact point was removed",
    )
}

fn dropped_missing_system() -> IssueTemplate {
    IssueTemplate::warning(
        "RONIN_CNTCTPT_008",
        "No system was provided, so this contact point was removed",
    )
}

#[derive(Debug, Clone)]
pub struct ContactPointProfile {
    /// Data element prefix, e.g. `Patient.telecom`.
    element: &'static str,
    profile_url: &'static str,
}

impl ContactPointProfile {
    pub fn new(element: &'static str, profile_url: &'static str) -> Self {
        Self {
            element,
            profile_url,
        }
    }

    pub fn validate_structural(
        &self,
        telecom: &ContactPoint,
        location: &LocationPath,
        validation: &mut Validation,
    ) {
        validation.check_not_null(telecom.system.as_ref(), system_required(), &location.field("system"));
        validation.check_not_null(telecom.value.as_ref(), value_required(), &location.field("value"));
    }

    /// Checks a transformed item: mapped codes are legal and carry provenance.
    pub fn validate_canonical_form(
        &self,
        telecom: &ContactPoint,
        location: &LocationPath,
        validation: &mut Validation,
    ) {
        if let Some(system) = telecom.system.as_deref() {
            let location = location.field("system");
            validation.check_true(
                ContactPointSystem::is_member(system),
                issues::invalid_value_set(&format!("{}.system", self.element), system),
                &location,
            );
            check_provenance(
                telecom.system_extension.as_ref(),
                TENANT_SOURCE_TELECOM_SYSTEM,
                "system",
                &location,
                validation,
            );
        }

        if let Some(use_) = telecom.use_.as_deref() {
            let location = location.field("use");
            validation.check_true(
                ContactPointUse::is_member(use_),
                issues::invalid_value_set(&format!("{}.use", self.element), use_),
                &location,
            );
            check_provenance(
                telecom.use_extension.as_ref(),
                TENANT_SOURCE_TELECOM_USE,
                "use",
                &location,
                validation,
            );
        }
    }

    /// Maps every item in `telecoms`. `location` points at the list itself.
    pub fn transform(
        &self,
        telecoms: &[ContactPoint],
        ctx: &TransformContext<'_>,
        location: &LocationPath,
    ) -> (Vec<ContactPoint>, Validation) {
        let mut validation = Validation::new();
        let mut transformed = Vec::with_capacity(telecoms.len());

        for (index, telecom) in telecoms.iter().enumerate() {
            let location = location.indexed(index);

            if telecom.value.is_none() {
                validation.add(dropped_missing_value(), &location.field("value"));
                tracing::debug!(tenant = %ctx.tenant, location = %location, "Dropping contact point without value");
                continue;
            }
            let Some(system) = telecom.system.as_deref() else {
                validation.add(dropped_missing_system(), &location.field("system"));
                tracing::debug!(tenant = %ctx.tenant, location = %location, "Dropping contact point without system");
                continue;
            };

            let mut item = telecom.clone();

            if let Some((code, extension)) = self.map_code::<ContactPointSystem>(
                system,
                "system",
                "ContactPointSystem",
                TENANT_SOURCE_TELECOM_SYSTEM,
                ctx,
                &location,
                &mut validation,
            ) {
                item.system = Some(code);
                item.system_extension = Some(with_provenance(telecom.system_extension.as_ref(), extension));
            }

            if let Some(use_) = telecom.use_.as_deref()
                && let Some((code, extension)) = self.map_code::<ContactPointUse>(
                    use_,
                    "use",
                    "ContactPointUse",
                    TENANT_SOURCE_TELECOM_USE,
                    ctx,
                    &location,
                    &mut validation,
                )
            {
                item.use_ = Some(code);
                item.use_extension = Some(with_provenance(telecom.use_extension.as_ref(), extension));
            }

            transformed.push(item);
        }

        (transformed, validation)
    }

    /// Resolves one tenant code. Records an error and returns `None` when the
    /// registry has no mapping or maps to a code outside `E`.
    #[allow(clippy::too_many_arguments)]
    fn map_code<E: CodedEnum>(
        &self,
        code: &str,
        field: &str,
        code_system_name: &str,
        extension_url: &str,
        ctx: &TransformContext<'_>,
        location: &LocationPath,
        validation: &mut Validation,
    ) -> Option<(String, Extension)> {
        let data_element = format!("{}.{}", self.element, field);
        let location = location.field(field);
        let coding = Coding::new(tenant_code_system(ctx.tenant.mnemonic(), code_system_name), code);

        let Some(result) = ctx.registry.resolve_concept_mapping_for_enum::<E>(
            ctx.tenant,
            &data_element,
            &coding,
            extension_url,
            Some(self.profile_url),
        ) else {
            validation.add(
                issues::concept_map_lookup(&data_element, code, ctx.tenant.mnemonic()),
                &location,
            );
            return None;
        };

        let mapped = result.coding.code.unwrap_or_default();
        if !E::is_member(&mapped) {
            validation.add(issues::invalid_value_set(&data_element, &mapped), &location);
            return None;
        }

        Some((mapped, result.extension))
    }
}

/// Existing primitive extensions with `extension` replacing any of the same URL.
fn with_provenance(existing: Option<&PrimitiveExtension>, extension: Extension) -> PrimitiveExtension {
    let mut primitive = existing.cloned().unwrap_or_default();
    primitive.extension.retain(|e| e.url != extension.url);
    primitive.extension.push(extension);
    primitive
}

fn check_provenance(
    primitive: Option<&PrimitiveExtension>,
    url: &str,
    element: &str,
    location: &LocationPath,
    validation: &mut Validation,
) {
    let extensions = primitive.map(|p| p.extension.as_slice()).unwrap_or_default();
    if extensions.iter().all(|e| e.value.is_none()) {
        validation.add(extension_missing(element), location);
    } else if !extensions.iter().any(|e| e.url.as_deref() == Some(url) && e.value.is_some()) {
        validation.add(extension_wrong_url(element), location);
    }
}
