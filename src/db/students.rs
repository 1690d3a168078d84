use crate::core::config::SupabaseConfig;
use crate::core::rest_helper::eq;
use crate::core::{AppError, RestHelper};
use crate::db::StudentStore;
use crate::models::students::{Student, StudentDraft, StudentUpdate};

const STUDENTS: &str = "students";

/// `students` table over PostgREST, authenticated as one session.
#[derive(Clone)]
pub struct RemoteStudentStore {
    rest: RestHelper,
}

impl RemoteStudentStore {
    pub fn new(config: &SupabaseConfig, access_token: &str) -> Result<Self, AppError> {
        use secrecy::ExposeSecret;

        let rest = RestHelper::new(
            &config.rest_url(),
            config.anon_key.expose_secret(),
            config.request_timeout(),
        )?
        .with_bearer(access_token);
        Ok(Self { rest })
    }

    pub fn from_helper(rest: RestHelper) -> Self {
        Self { rest }
    }
}

impl StudentStore for RemoteStudentStore {
    #[tracing::instrument(name = "Fetch students", skip(self))]
    async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        let students: Vec<Student> = self
            .rest
            .get(
                STUDENTS,
                &[("select", "*".into()), ("order", "created_at.desc".into())],
            )
            .await?;
        Ok(students)
    }

    #[tracing::instrument(name = "Fetch student", skip(self))]
    async fn get_student(&self, id: &str) -> Result<Student, AppError> {
        let mut rows: Vec<Student> = self
            .rest
            .get(STUDENTS, &[("select", "*".into()), ("id", eq(id))])
            .await?;
        rows.pop()
            .ok_or_else(|| AppError::not_found(format!("Student {} was not found", id)))
    }

    #[tracing::instrument(name = "Insert student", skip(self, draft))]
    async fn insert_student(&self, draft: &StudentDraft) -> Result<Student, AppError> {
        let mut rows: Vec<Student> = self.rest.post(STUDENTS, &[], &[draft]).await?;
        rows.pop()
            .ok_or_else(|| AppError::remote_error("Insert returned no row"))
    }

    #[tracing::instrument(name = "Update student", skip(self, update))]
    async fn update_student(
        &self,
        id: &str,
        update: &StudentUpdate<'_>,
    ) -> Result<Student, AppError> {
        let mut rows: Vec<Student> = self.rest.patch(STUDENTS, &[("id", eq(id))], update).await?;
        rows.pop()
            .ok_or_else(|| AppError::not_found(format!("Student {} was not found", id)))
    }

    #[tracing::instrument(name = "Delete student", skip(self))]
    async fn delete_student(&self, id: &str) -> Result<(), AppError> {
        self.rest.delete(STUDENTS, &[("id", eq(id))]).await?;
        Ok(())
    }
}
