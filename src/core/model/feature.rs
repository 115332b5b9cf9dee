use indexmap::IndexMap;

/// A unit of work (typically tracker-backed) checked out across one or more
/// repositories of an environment.
#[derive(Debug, Clone)]
pub struct FeatureBranch {
    id: String,
    project: String,
    environment: String,
    summary: String,
    branches: IndexMap<String, String>,
}

impl FeatureBranch {
    pub fn new(
        id: String,
        project: String,
        environment: String,
        summary: String,
        branches: IndexMap<String, String>,
    ) -> Self {
        FeatureBranch { id, project, environment, summary, branches }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Name of the environment this feature branch belongs to.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// The branch to check out in the given repository, if the feature
    /// branch spans it.
    pub fn checkout_branch(&self, repository_id: &str) -> Option<&str> {
        self.branches.get(repository_id).map(String::as_str)
    }

    pub fn branches(&self) -> &IndexMap<String, String> {
        &self.branches
    }
}
