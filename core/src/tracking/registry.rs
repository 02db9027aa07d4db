use crate::model::{Detection, File, Job};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// One consistent view of files, jobs and detections as of a committed refresh.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    files: Vec<File>,
    jobs: Vec<Job>,
    detections: Vec<Detection>,
    file_index: HashMap<String, usize>,
    job_index: HashMap<String, usize>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Builds a snapshot, keeping the service's listing order for display.
    ///
    /// A repeated id keeps the position of its first listing and the
    /// contents of its last.
    pub fn new(files: Vec<File>, jobs: Vec<Job>, detections: Vec<Detection>) -> Self {
        let (files, file_index) = index_by_id(files, |file| file.id.as_str());
        let jobs: Vec<Job> = jobs.into_iter().map(Job::normalized).collect();
        let (jobs, job_index) = index_by_id(jobs, |job| job.id.as_str());
        Self {
            files,
            jobs,
            detections,
            file_index,
            job_index,
            refreshed_at: Some(Utc::now()),
        }
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn job(&self, job_id: &str) -> Option<&Job> {
        self.job_index.get(job_id).map(|&idx| &self.jobs[idx])
    }

    pub fn file(&self, file_id: &str) -> Option<&File> {
        self.file_index.get(file_id).map(|&idx| &self.files[idx])
    }

    /// `None` until the first refresh cycle commits.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

fn index_by_id<T>(items: Vec<T>, id: impl Fn(&T) -> &str) -> (Vec<T>, HashMap<String, usize>) {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let existing = index.get(id(&item)).copied();
        match existing {
            Some(idx) => unique[idx] = item,
            None => {
                index.insert(id(&item).to_owned(), unique.len());
                unique.push(item);
            }
        }
    }
    (unique, index)
}

/// Last-known jobs and files, replaced wholesale on every committed refresh.
///
/// Readers get shared snapshots or a change subscription; only the polling
/// engine in this crate can write.
#[derive(Clone)]
pub struct JobRegistry {
    sender: Arc<watch::Sender<Arc<Snapshot>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.sender.subscribe()
    }

    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.sender.borrow().job(job_id).cloned()
    }

    pub fn file(&self, file_id: &str) -> Option<File> {
        self.sender.borrow().file(file_id).cloned()
    }

    pub(crate) fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.sender.send_replace(snapshot.clone());
        snapshot
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
