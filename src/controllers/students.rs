use chrono::Utc;
use validator::Validate;

use crate::controllers::session::{Action, SessionContext};
use crate::core::AppError;
use crate::db::StudentStore;
use crate::models::students::{Student, StudentDraft, StudentUpdate, ViewMode};

/// Proof that a deletion was requested through [`RecordController::request_delete`].
/// Consumed by [`RecordController::confirm_delete`].
#[derive(Debug, PartialEq, Eq)]
pub struct PendingDelete {
    id: String,
}

impl PendingDelete {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Asks the user to confirm an irreversible deletion.
pub trait ConfirmationPrompt {
    fn confirm_delete(&mut self, id: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> ConfirmationPrompt for F {
    fn confirm_delete(&mut self, id: &str) -> bool {
        self(id)
    }
}

/// Permission-gated CRUD over the student records of one session. Holds the
/// list every view renders from; the list is replaced by a fresh fetch after
/// each successful mutation.
pub struct RecordController<S: StudentStore> {
    store: S,
    session: SessionContext,
    records: Vec<Student>,
    loading: bool,
    selected_for_edit: Option<Student>,
    form_open: bool,
    pending_delete: Option<String>,
    search_term: String,
    view_mode: ViewMode,
}

impl<S: StudentStore> RecordController<S> {
    pub fn new(store: S, session: SessionContext) -> Self {
        Self {
            store,
            session,
            records: Vec::new(),
            loading: true,
            selected_for_edit: None,
            form_open: false,
            pending_delete: None,
            search_term: String::new(),
            view_mode: ViewMode::default(),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn records(&self) -> &[Student] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn selected_for_edit(&self) -> Option<&Student> {
        self.selected_for_edit.as_ref()
    }

    pub fn is_form_open(&self) -> bool {
        self.form_open
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.view_mode = view_mode;
    }

    #[tracing::instrument(name = "Refresh students", skip(self), fields(user_id = %self.session.user_id))]
    pub async fn refresh(&mut self) -> Result<(), AppError> {
        if !self.session.can_view() {
            self.loading = false;
            return Ok(());
        }

        self.loading = true;
        let result = self.store.list_students().await;
        self.loading = false;

        match result {
            Ok(students) => {
                self.records = students;
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e.message(),
                    "Failed to fetch students; keeping the previous list"
                );
                Err(e)
            }
        }
    }

    /// The mutation already succeeded, so a failed refresh only leaves the
    /// list stale.
    async fn refresh_after_mutation(&mut self) {
        if self.refresh().await.is_err() {
            tracing::warn!("student list is stale until the next successful refresh");
        }
    }

    #[tracing::instrument(name = "Open create form", skip(self))]
    pub fn open_create_form(&mut self) -> Result<(), AppError> {
        self.session.authorize(Action::Add)?;
        self.selected_for_edit = None;
        self.form_open = true;
        Ok(())
    }

    /// Opens the form on `student` and returns its fields as a draft.
    #[tracing::instrument(name = "Open edit form", skip(self, student), fields(student_id = %student.id))]
    pub fn open_edit_form(&mut self, student: &Student) -> Result<StudentDraft, AppError> {
        self.session.authorize(Action::Edit)?;
        self.selected_for_edit = Some(student.clone());
        self.form_open = true;
        Ok(StudentDraft::from(student))
    }

    pub fn close_form(&mut self) {
        self.form_open = false;
        self.selected_for_edit = None;
    }

    /// Creates or updates depending on whether the form was opened on an
    /// existing student.
    pub async fn submit_form(&mut self, draft: StudentDraft) -> Result<Student, AppError> {
        match self.selected_for_edit.as_ref().map(|s| s.id.clone()) {
            Some(id) => self.update(&id, draft).await,
            None => self.create(draft).await,
        }
    }

    #[tracing::instrument(name = "Create student", skip(self, draft), fields(user_id = %self.session.user_id))]
    pub async fn create(&mut self, draft: StudentDraft) -> Result<Student, AppError> {
        self.session.authorize(Action::Add)?;
        draft.validate()?;

        self.loading = true;
        let result = self.store.insert_student(&draft).await;
        self.loading = false;

        let created = result.map_err(|e| {
            tracing::error!(error.message = %e.message(), "Failed to create student");
            e
        })?;
        tracing::info!(student_id = %created.id, "student created");

        self.refresh_after_mutation().await;
        self.close_form();
        Ok(created)
    }

    #[tracing::instrument(name = "Update student", skip(self, draft), fields(user_id = %self.session.user_id))]
    pub async fn update(&mut self, id: &str, draft: StudentDraft) -> Result<Student, AppError> {
        self.session.authorize(Action::Edit)?;
        draft.validate()?;

        let update = StudentUpdate {
            draft: &draft,
            updated_at: Utc::now(),
        };

        self.loading = true;
        let result = self.store.update_student(id, &update).await;
        self.loading = false;

        let updated = result.map_err(|e| {
            tracing::error!(error.message = %e.message(), "Failed to update student");
            e
        })?;

        self.refresh_after_mutation().await;
        self.close_form();
        Ok(updated)
    }

    /// First step of a deletion: checks the permission and opens the
    /// confirmation. Nothing is sent to the store.
    #[tracing::instrument(name = "Request student deletion", skip(self))]
    pub fn request_delete(&mut self, id: &str) -> Result<PendingDelete, AppError> {
        self.session.authorize(Action::Delete)?;
        self.pending_delete = Some(id.to_string());
        Ok(PendingDelete { id: id.to_string() })
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    #[tracing::instrument(name = "Confirm student deletion", skip(self), fields(student_id = %pending.id))]
    pub async fn confirm_delete(&mut self, pending: PendingDelete) -> Result<(), AppError> {
        self.session.authorize(Action::Delete)?;
        if self.pending_delete.as_deref() != Some(pending.id.as_str()) {
            return Err(AppError::validation_error(
                "No deletion is awaiting confirmation for this student",
            ));
        }
        self.pending_delete = None;

        self.loading = true;
        let result = self.store.delete_student(&pending.id).await;
        self.loading = false;

        result.map_err(|e| {
            tracing::error!(error.message = %e.message(), "Failed to delete student");
            e
        })?;
        tracing::info!("student deleted");

        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Both deletion steps in one call. Returns `Ok(false)` when the prompt
    /// declined; the store is only contacted after a confirmation.
    pub async fn delete<P: ConfirmationPrompt>(
        &mut self,
        id: &str,
        prompt: &mut P,
    ) -> Result<bool, AppError> {
        let pending = self.request_delete(id)?;
        if !prompt.confirm_delete(id) {
            self.cancel_delete();
            return Ok(false);
        }
        self.confirm_delete(pending).await?;
        Ok(true)
    }

    #[tracing::instrument(name = "Load student details", skip(self))]
    pub async fn load_details(&self, id: &str) -> Result<Student, AppError> {
        self.session.authorize(Action::View)?;
        self.store.get_student(id).await
    }

    /// Case-insensitive name filter over the loaded records.
    pub fn search(&self, term: &str) -> Vec<&Student> {
        self.records
            .iter()
            .filter(|student| student.name_contains(term))
            .collect()
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// The records the list and table views show for the current search term.
    pub fn visible_records(&self) -> Vec<&Student> {
        self.search(&self.search_term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::students::FamilyStatus;
    use crate::models::users::{Permissions, Role, UserProfile};
    use chrono::{NaiveDate, TimeZone};
    use claim::{assert_err, assert_ok};
    use quickcheck_macros::quickcheck;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<Student>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn with(rows: Vec<Student>) -> Self {
            Self {
                rows: Mutex::new(rows),
                calls: Mutex::default(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl StudentStore for FakeStore {
        async fn list_students(&self) -> Result<Vec<Student>, AppError> {
            self.log("list".into());
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn get_student(&self, id: &str) -> Result<Student, AppError> {
            self.log(format!("get {}", id));
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or_else(|| AppError::not_found("missing"))
        }

        async fn insert_student(&self, draft: &StudentDraft) -> Result<Student, AppError> {
            self.log("insert".into());
            let mut rows = self.rows.lock().unwrap();
            let student = student(&format!("S{}", rows.len() + 1), &draft.student_name);
            rows.insert(0, student.clone());
            Ok(student)
        }

        async fn update_student(
            &self,
            id: &str,
            update: &StudentUpdate<'_>,
        ) -> Result<Student, AppError> {
            self.log(format!("update {}", id));
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| AppError::not_found("missing"))?;
            row.student_name = update.draft.student_name.clone();
            row.updated_at = update.updated_at;
            Ok(row.clone())
        }

        async fn delete_student(&self, id: &str) -> Result<(), AppError> {
            self.log(format!("delete {}", id));
            self.rows.lock().unwrap().retain(|s| s.id != id);
            Ok(())
        }
    }

    fn student(id: &str, name: &str) -> Student {
        let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        Student {
            id: id.into(),
            student_name: name.into(),
            birth_date: NaiveDate::from_ymd_opt(2005, 6, 1).unwrap(),
            residence: "Riyadh".into(),
            nationality: "Saudi".into(),
            guardian_name: String::new(),
            previous_courses: String::new(),
            quran_memorized: "2 juz".into(),
            computer_proficiency: false,
            certificate: String::new(),
            family_status: FamilyStatus::Single,
            books_read: String::new(),
            created_at: stamp,
            updated_at: stamp,
        }
    }

    fn draft(name: &str) -> StudentDraft {
        StudentDraft::from(&student("draft", name))
    }

    fn session(role: Role, permissions: Permissions) -> SessionContext {
        SessionContext::new(
            &UserProfile {
                id: "u1".into(),
                email: "u1@example.com".into(),
                full_name: "User One".into(),
                role,
                permissions,
                is_active: true,
                created_at: None,
            },
            "token",
        )
    }

    fn controller(permissions: Permissions, rows: Vec<Student>) -> RecordController<FakeStore> {
        RecordController::new(FakeStore::with(rows), session(Role::User, permissions))
    }

    #[tokio::test]
    async fn refresh_without_view_permission_skips_the_store() {
        let mut controller = controller(Permissions::default(), vec![student("S1", "Ali")]);
        assert_ok!(controller.refresh().await);
        assert!(controller.records().is_empty());
        assert!(!controller.loading());
        assert!(controller.store.calls().is_empty());
    }

    #[tokio::test]
    async fn create_without_add_permission_issues_no_call() {
        let mut controller = controller(Permissions::view_only(), vec![student("S1", "Ali")]);
        controller.refresh().await.unwrap();

        let error = controller.create(draft("Omar")).await.unwrap_err();

        assert!(error.is_permission_error());
        assert_eq!(controller.record_count(), 1);
        assert_eq!(controller.store.calls(), vec!["list".to_string()]);
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_store() {
        let mut controller = controller(Permissions::all(), vec![]);
        let mut bad = draft("Omar");
        bad.nationality = String::new();

        assert_err!(controller.create(bad).await);
        assert!(controller.store.calls().is_empty());
    }

    #[tokio::test]
    async fn create_refreshes_and_closes_the_form() {
        let mut controller = controller(Permissions::all(), vec![student("S1", "Ali")]);
        controller.open_create_form().unwrap();

        let created = controller.create(draft("Omar")).await.unwrap();

        assert_eq!(created.id, "S2");
        assert_eq!(controller.records()[0].student_name, "Omar");
        assert!(!controller.is_form_open());
        assert_eq!(
            controller.store.calls(),
            vec!["insert".to_string(), "list".to_string()]
        );
    }

    #[tokio::test]
    async fn submit_form_updates_the_selected_student() {
        let ali = student("S1", "Ali");
        let mut controller = controller(Permissions::all(), vec![ali.clone()]);
        let mut edited = controller.open_edit_form(&ali).unwrap();
        edited.student_name = "Ali Hassan".into();

        controller.submit_form(edited).await.unwrap();

        assert_eq!(controller.records()[0].student_name, "Ali Hassan");
        assert!(controller.records()[0].updated_at > ali.updated_at);
        assert!(controller.selected_for_edit().is_none());
    }

    #[test]
    fn edit_form_needs_edit_permission() {
        let mut controller = controller(Permissions::view_only(), vec![]);
        let error = controller
            .open_edit_form(&student("S1", "Ali"))
            .unwrap_err();
        assert!(error.is_permission_error());
        assert!(!controller.is_form_open());
    }

    #[tokio::test]
    async fn declined_confirmation_never_deletes() {
        let mut controller = controller(Permissions::all(), vec![student("S1", "Ali")]);
        controller.refresh().await.unwrap();

        let deleted = controller.delete("S1", &mut |_: &str| false).await.unwrap();

        assert!(!deleted);
        assert!(controller.pending_delete().is_none());
        assert_eq!(controller.record_count(), 1);
        assert!(!controller.store.calls().iter().any(|c| c.starts_with("delete")));
    }

    #[tokio::test]
    async fn cancelled_request_cannot_be_confirmed() {
        let mut controller = controller(Permissions::all(), vec![student("S1", "Ali")]);
        let pending = controller.request_delete("S1").unwrap();
        controller.cancel_delete();

        assert_err!(controller.confirm_delete(pending).await);
        assert!(controller.store.calls().is_empty());
    }

    #[tokio::test]
    async fn stale_token_leaves_the_live_confirmation_intact() {
        let mut controller = controller(
            Permissions::all(),
            vec![student("S2", "Sara"), student("S1", "Ali")],
        );

        let stale = controller.request_delete("S1").unwrap();
        let live = controller.request_delete("S2").unwrap();

        assert_err!(controller.confirm_delete(stale).await);
        assert_eq!(controller.pending_delete(), Some("S2"));

        assert_ok!(controller.confirm_delete(live).await);
        assert_eq!(
            controller.store.calls(),
            vec!["delete S2".to_string(), "list".to_string()]
        );
        let ids: Vec<_> = controller.records().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["S1"]);
    }

    #[tokio::test]
    async fn refresh_twice_yields_identical_records() {
        let mut controller = controller(
            Permissions::view_only(),
            vec![student("S2", "Sara"), student("S1", "Ali")],
        );
        controller.refresh().await.unwrap();
        let first = controller.records().to_vec();
        controller.refresh().await.unwrap();
        assert_eq!(first, controller.records());
    }

    #[test]
    fn visible_records_follow_the_search_term() {
        let mut controller = controller(Permissions::view_only(), vec![]);
        controller.records = vec![
            student("S1", "Ahmed Salim"),
            student("S2", "Khalid"),
            student("S3", "SALMA"),
        ];

        controller.set_search_term("sal");
        let names: Vec<_> = controller
            .visible_records()
            .iter()
            .map(|s| s.student_name.as_str())
            .collect();
        assert_eq!(names, vec!["Ahmed Salim", "SALMA"]);

        controller.set_search_term("");
        assert_eq!(controller.visible_records().len(), 3);
    }

    #[quickcheck]
    fn search_returns_matching_subset_without_mutating(names: Vec<String>, term: String) -> bool {
        let mut controller = controller(Permissions::view_only(), vec![]);
        controller.records = names
            .iter()
            .enumerate()
            .map(|(i, name)| student(&format!("S{}", i), name))
            .collect();
        let before = controller.records.clone();

        let found = controller.search(&term);
        let all_match = found.iter().all(|s| {
            s.student_name
                .to_lowercase()
                .contains(&term.to_lowercase())
        });
        let subset = found.len() <= before.len();
        let full_on_empty = !term.is_empty() || found.len() == before.len();

        all_match && subset && full_on_empty && controller.records == before
    }
}
