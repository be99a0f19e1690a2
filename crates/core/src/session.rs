use chrono::Utc;

use crate::{
    error::{ReelnoteError, Result},
    poller::PollOutcome,
    types::{FolderId, TaskId, UserRecord},
};

/// Who is signed in, as vouched for by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<String>,
}

impl Session {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_user(user_id: Option<String>) -> Self {
        Self {
            user_id: user_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// The signed-in user, or [`ReelnoteError::SignInRequired`].
    pub fn require_user(&self) -> Result<&str> {
        self.user_id().ok_or(ReelnoteError::SignInRequired)
    }

    pub fn user_record(&self, email: Option<String>, name: impl Into<String>) -> Result<UserRecord> {
        Ok(UserRecord {
            user_id: self.require_user()?.to_string(),
            email,
            name: name.into(),
            created_at: Utc::now(),
        })
    }
}

/// The job and folder the user is currently working with. Passed explicitly to
/// the upload flow and to everything that reads or writes a folder.
#[derive(Debug, Clone, Default)]
pub struct ReviewContext {
    pub session: Session,
    task_id: Option<TaskId>,
    folder_id: Option<FolderId>,
}

impl ReviewContext {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            task_id: None,
            folder_id: None,
        }
    }

    pub fn for_folder(session: Session, folder_id: FolderId) -> Self {
        Self {
            session,
            task_id: None,
            folder_id: Some(folder_id),
        }
    }

    /// A new job replaces any previous job and its result.
    pub fn track(&mut self, task_id: TaskId) {
        self.task_id = Some(task_id);
        self.folder_id = None;
    }

    /// Record how polling ended. A completed job's folder becomes current.
    pub fn settle(&mut self, outcome: &PollOutcome) -> Option<&FolderId> {
        if let PollOutcome::Completed(job) = outcome {
            self.folder_id = job.folder_id.clone();
        }
        self.folder_id.as_ref()
    }

    pub fn task(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    pub fn folder(&self) -> Result<&FolderId> {
        self.folder_id.as_ref().ok_or(ReelnoteError::NoFolderSelected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Job, JobStatus};

    #[test]
    fn anonymous_session_requires_sign_in() {
        assert!(matches!(
            Session::anonymous().require_user(),
            Err(ReelnoteError::SignInRequired)
        ));
        assert!(Session::from_user(Some("  ".into())).user_id().is_none());
        assert_eq!(Session::signed_in("u1").require_user().unwrap(), "u1");
    }

    #[test]
    fn completed_job_selects_its_folder() {
        let mut ctx = ReviewContext::new(Session::signed_in("u1"));
        ctx.track(TaskId::from("task_1"));
        assert!(ctx.folder().is_err());

        let job = Job::new(TaskId::from("task_1"), JobStatus::Completed, 1.0)
            .with_folder(Some(FolderId::parse("f9").unwrap()));
        ctx.settle(&PollOutcome::Completed(job));
        assert_eq!(ctx.folder().unwrap().as_str(), "f9");
    }

    #[test]
    fn failed_job_leaves_no_folder() {
        let mut ctx = ReviewContext::new(Session::anonymous());
        ctx.track(TaskId::from("task_2"));
        let job = Job::new(
            TaskId::from("task_2"),
            JobStatus::Error {
                message: "boom".into(),
            },
            1.0,
        );
        assert!(ctx.settle(&PollOutcome::Failed(job)).is_none());
        assert_eq!(ctx.task().unwrap().0, "task_2");
    }
}
