//! Chooses one profile among several candidates for a resource type.

use super::{BaseProfile, TransformContext, TransformOutcome};
use crate::model::DomainResource;
use crate::validation::issues;
use crate::validation::{LocationPath, Validation};

pub struct ProfileSelector<T: DomainResource> {
    profiles: Vec<Box<dyn BaseProfile<T>>>,
}

impl<T: DomainResource> ProfileSelector<T> {
    pub fn new(profiles: Vec<Box<dyn BaseProfile<T>>>) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> impl Iterator<Item = &dyn BaseProfile<T>> {
        self.profiles.iter().map(|p| &**p)
    }

    pub fn qualifying(&self, resource: &T) -> Vec<&dyn BaseProfile<T>> {
        self.profiles().filter(|p| p.qualifies(resource)).collect()
    }

    /// The single qualifying profile. Zero or several candidates record an
    /// error and yield `None`.
    pub fn select(&self, resource: &T, validation: &mut Validation) -> Option<&dyn BaseProfile<T>> {
        let location = LocationPath::new(T::RESOURCE_TYPE);
        let mut qualifying = self.qualifying(resource);

        match qualifying.len() {
            0 => {
                validation.add(issues::profile_no_match(T::RESOURCE_TYPE), &location);
                None
            }
            1 => qualifying.pop(),
            _ => {
                let names: Vec<&str> = qualifying.iter().map(|p| p.name()).collect();
                validation.add(issues::profile_ambiguous(T::RESOURCE_TYPE, &names), &location);
                None
            }
        }
    }

    pub fn transform(&self, original: &T, ctx: &TransformContext<'_>) -> TransformOutcome<T> {
        let mut validation = Validation::new();
        let Some(profile) = self.select(original, &mut validation) else {
            tracing::warn!(
                tenant = %ctx.tenant,
                resource_type = T::RESOURCE_TYPE,
                id = original.id().unwrap_or("<none>"),
                "No single profile qualifies"
            );
            return TransformOutcome::rejected(validation);
        };

        tracing::debug!(resource_type = T::RESOURCE_TYPE, profile = profile.name(), "Profile selected");
        let outcome = profile.transform(original, ctx);
        validation.merge(outcome.validation);

        let Some(transformed) = outcome.resource else {
            return TransformOutcome::rejected(validation);
        };

        // The canonical resource must still select the same single profile.
        let requalified = self.qualifying(&transformed);
        if requalified.len() != 1 || requalified[0].name() != profile.name() {
            validation.add(
                issues::profile_no_match(T::RESOURCE_TYPE),
                &LocationPath::new(T::RESOURCE_TYPE),
            );
            return TransformOutcome::rejected(validation);
        }

        TransformOutcome::accepted(transformed, validation)
    }
}
