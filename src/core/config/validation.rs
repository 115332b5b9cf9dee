use super::ConfigData;
use crate::core::error::AppError;
use std::collections::HashSet;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate structural configuration rules before the domain model is
    /// built: unique ids, unique internal branch names per project, and no
    /// dangling repository references.
    pub fn validate(data: &ConfigData) -> Result<(), AppError> {
        let mut repository_ids = HashSet::new();
        for repository in &data.repositories {
            if repository.id.trim().is_empty() {
                return Err(AppError::validation("repository id cannot be empty"));
            }
            if repository.url.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "repository '{}' has no url",
                    repository.id
                )));
            }
            if repository.path.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "repository '{}' has no path",
                    repository.id
                )));
            }
            if !repository_ids.insert(repository.id.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate repository id '{}'",
                    repository.id
                )));
            }
        }

        let mut project_names = HashSet::new();
        for project in &data.projects {
            if project.name.trim().is_empty() {
                return Err(AppError::validation("project name cannot be empty"));
            }
            if project.branch_prefix.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "project '{}' has no branch_prefix",
                    project.name
                )));
            }
            if !project_names.insert(project.name.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate project name '{}'",
                    project.name
                )));
            }

            // Environment names double as internal branch suffixes, so
            // uniqueness here is uniqueness of internal branch names.
            let mut environment_names = HashSet::new();
            for environment in &project.environments {
                if environment.name.trim().is_empty() {
                    return Err(AppError::validation(format!(
                        "project '{}' has an environment without a name",
                        project.name
                    )));
                }
                if !environment_names.insert(environment.name.as_str()) {
                    return Err(AppError::validation(format!(
                        "duplicate environment '{}' in project '{}'",
                        environment.name, project.name
                    )));
                }
                for repository_id in environment.branches.keys() {
                    if !repository_ids.contains(repository_id.as_str()) {
                        return Err(AppError::validation(format!(
                            "environment '{}' of project '{}' references unknown repository '{}'",
                            environment.name, project.name, repository_id
                        )));
                    }
                }
            }

            for feature in &project.feature_branches {
                if !environment_names.contains(feature.environment.as_str()) {
                    return Err(AppError::validation(format!(
                        "feature branch '{}' references unknown environment '{}'",
                        feature.id, feature.environment
                    )));
                }
                for repository_id in feature.branches.keys() {
                    if !repository_ids.contains(repository_id.as_str()) {
                        return Err(AppError::validation(format!(
                            "feature branch '{}' references unknown repository '{}'",
                            feature.id, repository_id
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
