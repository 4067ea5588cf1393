//! Transform orchestration
//!
//! One pass over a document collection:
//!
//! 1. Every field spec is compiled before any document is touched
//! 2. Per document, every selector is resolved against the tree as it was
//!    at the start of the pass and the rule is applied to each location
//! 3. The planned edits are written and recorded
//!
//! A scalar reached by several specs is recorded once per spec with the
//! same before/after pair. Any error aborts the pass; the documents are
//! dropped with it, so callers never observe a partially rewritten set.

use crate::config::EngineConfig;
use crate::error::{TransformError, TransformResult};
use crate::result::{aggregate, FnResult};
use crate::rule::RewriteRule;
use crate::tracker::{MutationKey, MutationTracker};
use rayon::prelude::*;
use setimg_resource::{resolve, FieldPath, FieldSelector, FieldSpec, Resource};

/// Documents and provenance produced by a pass
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    /// Documents in input order
    pub resources: Vec<Resource>,
    /// Every change made
    pub mutations: MutationTracker,
}

impl TransformOutput {
    /// Sorted report for this pass
    #[inline]
    #[must_use]
    pub fn results(&self) -> Vec<FnResult> {
        aggregate(&self.mutations)
    }
}

#[derive(Debug)]
struct PlannedEdit {
    path: FieldPath,
    before: String,
    after: String,
}

/// Rewrites image references according to one rule
#[derive(Debug, Clone)]
pub struct ImageTransformer {
    rule: RewriteRule,
    selectors: Vec<FieldSelector>,
    config: EngineConfig,
}

impl ImageTransformer {
    /// Compile field specs into a transformer
    ///
    /// Specs are evaluated in the order given; duplicates are kept.
    ///
    /// # Errors
    /// Returns error if any field spec path is malformed
    pub fn new(rule: RewriteRule, specs: &[FieldSpec], config: EngineConfig) -> TransformResult<Self> {
        let selectors = specs
            .iter()
            .map(FieldSpec::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rule,
            selectors,
            config,
        })
    }

    /// Rule applied by this transformer
    #[inline]
    #[must_use]
    pub fn rule(&self) -> &RewriteRule {
        &self.rule
    }

    /// Compiled selectors in evaluation order
    #[inline]
    #[must_use]
    pub fn selectors(&self) -> &[FieldSelector] {
        &self.selectors
    }

    /// Run one pass
    ///
    /// # Errors
    /// Returns the first invalid image reference found, in document order
    pub fn transform(&self, mut resources: Vec<Resource>) -> TransformResult<TransformOutput> {
        if self.rule.is_empty() {
            tracing::info!(documents = resources.len(), "no image name configured; leaving documents unchanged");
            return Ok(TransformOutput {
                resources,
                mutations: MutationTracker::new(),
            });
        }

        let mutations = if self.config.parallel {
            self.transform_parallel(&mut resources)?
        } else {
            let mut tracker = MutationTracker::new();
            for resource in &mut resources {
                self.transform_resource(resource, &mut tracker)?;
            }
            tracker
        };

        tracing::info!(
            documents = resources.len(),
            field_specs = self.selectors.len(),
            mutations = mutations.len(),
            image = %self.rule.match_name,
            "image transform complete"
        );
        Ok(TransformOutput {
            resources,
            mutations,
        })
    }

    fn transform_parallel(&self, resources: &mut [Resource]) -> TransformResult<MutationTracker> {
        let outcomes: Vec<TransformResult<MutationTracker>> = resources
            .par_iter_mut()
            .map(|resource| {
                let mut local = MutationTracker::new();
                self.transform_resource(resource, &mut local)?;
                Ok(local)
            })
            .collect();

        let mut tracker = MutationTracker::new();
        for outcome in outcomes {
            tracker.merge(outcome?);
        }
        Ok(tracker)
    }

    fn transform_resource(&self, resource: &mut Resource, tracker: &mut MutationTracker) -> TransformResult<()> {
        if self.config.skips(&resource.id().kind) {
            tracing::debug!(resource = %resource.id(), "skipping denied kind");
            return Ok(());
        }

        let planned = self.plan(resource)?;
        for edit in planned {
            resource.set_scalar(&edit.path, edit.after.as_str());
            let field_path = edit.path.to_string();
            tracing::debug!(
                resource = %resource.id(),
                field = %field_path,
                from = %edit.before,
                to = %edit.after,
                "set image"
            );
            tracker.record(
                MutationKey::new(resource.id(), resource.file(), field_path),
                edit.before,
                edit.after,
            );
        }
        Ok(())
    }

    fn plan(&self, resource: &Resource) -> TransformResult<Vec<PlannedEdit>> {
        let mut planned = Vec::new();
        for selector in &self.selectors {
            for location in resolve(selector, resource) {
                let rewrite = self.rule.apply(location.value).map_err(|source| {
                    TransformError::invalid_image(resource.id(), location.path.to_string(), source)
                })?;
                if rewrite.changed {
                    planned.push(PlannedEdit {
                        before: location.value.to_string(),
                        after: rewrite.value,
                        path: location.path,
                    });
                }
            }
        }
        Ok(planned)
    }
}

/// Run one sequential pass with the default configuration
///
/// # Errors
/// Returns error if a field spec is malformed or a targeted value is not an
/// image reference
pub fn transform(
    rule: &RewriteRule,
    specs: &[FieldSpec],
    resources: Vec<Resource>,
) -> TransformResult<TransformOutput> {
    ImageTransformer::new(rule.clone(), specs, EngineConfig::default())?.transform(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageParseError;
    use crate::result::NO_CHANGES_MESSAGE;

    const DEPLOY: &str = r"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  template:
    spec:
      containers:
      - name: app
        image: nginx:1.20.2
      - name: cache
        image: redis:7
";

    fn specs() -> Vec<FieldSpec> {
        vec![FieldSpec::new("spec/template/spec/containers[]/image")]
    }

    fn image_at(res: &Resource, path: &str) -> String {
        res.get(&path.parse().unwrap())
            .and_then(serde_yaml::Value::as_str)
            .unwrap()
            .to_string()
    }

    #[test]
    fn rewrites_matching_image_only() {
        let rule = RewriteRule::matching("nginx").with_new_tag("1.21.6");
        let out = transform(&rule, &specs(), vec![Resource::from_yaml(DEPLOY).unwrap()]).unwrap();

        assert_eq!(image_at(&out.resources[0], "spec.template.spec.containers[0].image"), "nginx:1.21.6");
        assert_eq!(image_at(&out.resources[0], "spec.template.spec.containers[1].image"), "redis:7");
        assert_eq!(out.mutations.len(), 1);
    }

    #[test]
    fn empty_rule_is_noop_even_with_bad_values() {
        let bad = Resource::from_yaml("kind: Pod\nspec:\n  containers:\n  - image: ''\n").unwrap();
        let input = vec![Resource::from_yaml(DEPLOY).unwrap(), bad];
        let out = transform(&RewriteRule::default(), &[FieldSpec::new("spec/containers[]/image")], input.clone()).unwrap();

        assert_eq!(out.resources, input);
        assert!(out.mutations.is_empty());
        assert_eq!(out.results(), vec![FnResult::info(NO_CHANGES_MESSAGE)]);
    }

    #[test]
    fn invalid_field_spec_fails_before_pass() {
        let err = ImageTransformer::new(
            RewriteRule::matching("nginx"),
            &[FieldSpec::new("spec//image")],
            EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidFieldSpec(_)));
    }

    #[test]
    fn invalid_image_aborts_pass() {
        let bad = Resource::from_yaml(
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: bad\nspec:\n  template:\n    spec:\n      containers:\n      - image: ''\n",
        )
        .unwrap();
        let rule = RewriteRule::matching("nginx").with_new_tag("2");
        let err = transform(&rule, &specs(), vec![Resource::from_yaml(DEPLOY).unwrap(), bad]).unwrap_err();

        match err {
            TransformError::InvalidImage { resource, field_path, source } => {
                assert_eq!(resource.name, "bad");
                assert_eq!(field_path, "spec.template.spec.containers[0].image");
                assert_eq!(source, ImageParseError::Empty);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn overlapping_specs_record_each_match() {
        let rule = RewriteRule::matching("nginx").with_new_tag("1.21.6");
        let mut specs = specs();
        specs.push(FieldSpec::new("spec/template/spec/containers[]/image").with_kind("Deployment"));
        let out = transform(&rule, &specs, vec![Resource::from_yaml(DEPLOY).unwrap()]).unwrap();

        let results = out.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], results[1]);
        assert_eq!(results[0].message, "set image from nginx:1.20.2 to nginx:1.21.6");
    }

    #[test]
    fn crds_are_skipped_by_default() {
        let crd = Resource::from_yaml(
            "apiVersion: apiextensions.k8s.io/v1\nkind: CustomResourceDefinition\nspec:\n  containers:\n  - image: nginx\n",
        )
        .unwrap();
        let rule = RewriteRule::matching("nginx").with_new_tag("2");
        let spec = [FieldSpec::new("spec/containers[]/image")];

        let out = transform(&rule, &spec, vec![crd.clone()]).unwrap();
        assert_eq!(out.resources[0], crd);

        let t = ImageTransformer::new(rule, &spec, EngineConfig::new().without_skipped_kinds()).unwrap();
        assert_eq!(t.transform(vec![crd]).unwrap().mutations.len(), 1);
    }

    #[test]
    fn parallel_matches_sequential() {
        let rule = RewriteRule::matching("nginx").with_new_registry("mirror.local");
        let docs: Vec<_> = (0..16).map(|_| Resource::from_yaml(DEPLOY).unwrap()).collect();

        let seq = ImageTransformer::new(rule.clone(), &specs(), EngineConfig::new())
            .unwrap()
            .transform(docs.clone())
            .unwrap();
        let par = ImageTransformer::new(rule, &specs(), EngineConfig::new().with_parallel(true))
            .unwrap()
            .transform(docs)
            .unwrap();

        assert_eq!(seq.resources, par.resources);
        assert_eq!(seq.results(), par.results());
        assert_eq!(par.mutations.len(), 16);
    }
}
