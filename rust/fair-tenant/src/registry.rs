use std::collections::BTreeMap;

use crate::{ConfigurationError, JobType};

/// The set of job types known to the enqueue pipeline, keyed by name. Built
/// once at setup; job types that are not registered are never rerouted.
#[derive(Clone, Debug, Default)]
pub struct JobRegistry {
    job_types: BTreeMap<String, JobType>,
}

impl JobRegistry {
    pub fn new<I>(job_types: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = JobType>,
    {
        let mut registry = JobRegistry::default();
        for job_type in job_types {
            registry.register(job_type)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, job_type: JobType) -> Result<(), ConfigurationError> {
        if self.job_types.contains_key(job_type.name()) {
            return Err(ConfigurationError::DuplicateJobType(
                job_type.name().to_owned(),
            ));
        }

        trace!(
            "Registered {} on {} with {} tiers",
            job_type.name(),
            job_type.queue(),
            job_type.tiers().len()
        );
        self.job_types.insert(job_type.name().to_owned(), job_type);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&JobType> {
        self.job_types.get(name)
    }

    pub fn len(&self) -> usize {
        self.job_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.job_types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobType> {
        self.job_types.values()
    }
}

#[cfg(test)]
mod tests {
    use crate::{ConfigurationError, JobRegistry, JobType};

    #[test]
    fn it_rejects_duplicate_job_types() {
        let job_type = JobType::builder("SomeJob").queue("default").build().unwrap();
        let result = JobRegistry::new([job_type.clone(), job_type]);

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::DuplicateJobType("SomeJob".into())
        );
    }

    #[test]
    fn it_looks_up_job_types_by_name() {
        let registry = JobRegistry::new([
            JobType::builder("OneJob").queue("one").build().unwrap(),
            JobType::builder("OtherJob").queue("other").build().unwrap(),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("OtherJob").unwrap().queue(), "other");
        assert!(registry.get("MissingJob").is_none());
    }
}
