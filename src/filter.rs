//! Client-side filtering of the job collection.

use crate::job::{Job, JobStatus};

/// Filter criteria. A missing criterion matches every job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub search: Option<String>,
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Case-insensitive name substring. An empty string clears the criterion.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.is_empty() { None } else { Some(search) };
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.search.as_deref().is_none_or(str::is_empty)
    }

    pub fn matches(&self, job: &Job) -> bool {
        let status_ok = self.status.is_none_or(|status| job.status == status);
        let search_ok = match self.search.as_deref() {
            None | Some("") => true,
            Some(needle) => job.name.to_lowercase().contains(&needle.to_lowercase()),
        };
        status_ok && search_ok
    }
}

/// Keep the jobs matching `filter`, in their original order.
pub fn filter_jobs(jobs: &[Job], filter: &JobFilter) -> Vec<Job> {
    if filter.is_empty() {
        return jobs.to_vec();
    }
    jobs.iter().filter(|job| filter.matches(job)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_jobs() -> Vec<Job> {
        let statuses = [
            JobStatus::Pending,
            JobStatus::Failed,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
            JobStatus::Pending,
            JobStatus::Failed,
            JobStatus::Completed,
            JobStatus::Running,
            JobStatus::Pending,
            JobStatus::Completed,
        ];
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let name = if i % 3 == 0 {
                    format!("Send-Email-{}", i)
                } else {
                    format!("resize-image-{}", i)
                };
                Job::new(format!("job-{}", i), name).with_status(*status)
            })
            .collect()
    }

    fn is_ordered_subsequence(sub: &[Job], full: &[Job]) -> bool {
        let mut remaining = full.iter();
        sub.iter()
            .all(|wanted| remaining.any(|candidate| candidate.id == wanted.id))
    }

    #[test]
    fn test_no_criteria_is_identity() {
        let jobs = sample_jobs();
        let filtered = filter_jobs(&jobs, &JobFilter::default());
        assert_eq!(filtered, jobs);

        let blank_search = JobFilter::new().with_search("");
        assert!(blank_search.is_empty());
        assert_eq!(filter_jobs(&jobs, &blank_search), jobs);
    }

    #[test]
    fn test_status_filter_scenario() {
        let jobs = sample_jobs();
        let filtered = filter_jobs(&jobs, &JobFilter::new().with_status(JobStatus::Failed));

        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|job| job.status == JobStatus::Failed));
        assert!(is_ordered_subsequence(&filtered, &jobs));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let jobs = sample_jobs();
        let filtered = filter_jobs(&jobs, &JobFilter::new().with_search("EMAIL"));

        assert_eq!(filtered.len(), 4);
        assert!(filtered.iter().all(|job| job.name.starts_with("Send-Email")));
    }

    #[test]
    fn test_criteria_combine_with_and() {
        let jobs = sample_jobs();
        let filter = JobFilter::new()
            .with_status(JobStatus::Pending)
            .with_search("email");
        let filtered = filter_jobs(&jobs, &filter);

        let ids: Vec<_> = filtered.iter().map(|job| job.id.as_str()).collect();
        assert_eq!(ids, vec!["job-0", "job-6"]);
    }

    #[test]
    fn test_every_combination_is_an_ordered_subsequence() {
        let jobs = sample_jobs();
        let searches = [None, Some("image"), Some("E"), Some("nothing-matches")];
        let statuses = std::iter::once(None).chain(JobStatus::ALL.into_iter().map(Some));

        for status in statuses {
            for search in searches {
                let filter = JobFilter {
                    status,
                    search: search.map(str::to_string),
                };
                let filtered = filter_jobs(&jobs, &filter);
                assert!(is_ordered_subsequence(&filtered, &jobs));
                assert!(filtered.iter().all(|job| filter.matches(job)));
                let expected = jobs.iter().filter(|job| filter.matches(job)).count();
                assert_eq!(filtered.len(), expected);
            }
        }
    }
}
