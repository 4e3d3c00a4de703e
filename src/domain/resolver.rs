//! Identity resolution.
//!
//! Staff and the fingerprint webhook both hand the engine a raw search
//! term: a student code, a phone number, or a fragment of a name. Numeric
//! terms resolve by exact match against code or phone; textual terms by
//! case-insensitive substring match on the name. A name fragment matching
//! more than one student is refused rather than guessed at — checking in
//! the wrong student silently is worse than asking the operator to retry
//! with a code.

use tracing::debug;

use crate::domain::models::{PaymentStatus, Student, StudentProfile};
use crate::error::{DomainError, DomainResult, Entity, SearchMatch};
use crate::storage::{GroupRepository, StudentRepository};

/// True when the term is digits only (a code or a phone number).
fn is_numeric(term: &str) -> bool {
    !term.is_empty() && term.chars().all(|c| c.is_ascii_digit())
}

#[derive(Clone)]
pub struct StudentResolver {
    students: StudentRepository,
    groups: GroupRepository,
}

impl StudentResolver {
    pub fn new(students: StudentRepository, groups: GroupRepository) -> Self {
        Self { students, groups }
    }

    /// Resolve a raw search term to exactly one student.
    pub async fn resolve(&self, term: &str) -> DomainResult<Student> {
        let term = term.trim();
        if term.is_empty() {
            return Err(DomainError::validation(
                "search_term",
                "يجب إدخال كود الطالب أو رقم الهاتف أو الاسم",
            ));
        }

        if is_numeric(term) {
            debug!(term, "resolving numeric search term");
            return self
                .students
                .find_by_code_or_phone(term)
                .await?
                .ok_or(DomainError::not_found(Entity::Student));
        }

        debug!(term, "resolving name fragment");
        let mut matches = self.students.search_by_name(term).await?;
        match matches.len() {
            0 => Err(DomainError::not_found(Entity::Student)),
            1 => Ok(matches.remove(0)),
            _ => Err(DomainError::AmbiguousSearch {
                matches: matches
                    .into_iter()
                    .map(|s| SearchMatch {
                        student_code: s.student_code,
                        student_name: s.student_name,
                    })
                    .collect(),
            }),
        }
    }

    /// Resolve and populate group references and the derived payment view.
    pub async fn resolve_profile(&self, term: &str) -> DomainResult<StudentProfile> {
        let student = self.resolve(term).await?;
        self.profile(student).await
    }

    /// Populate a student's group references and payment view. Every read
    /// site goes through here so the derived status cannot diverge between
    /// surfaces.
    pub async fn profile(&self, student: Student) -> DomainResult<StudentProfile> {
        let groups = self.groups.groups_of(&student.id).await?;
        let history = self.students.payment_history(&student.id).await?;
        let payment = PaymentStatus::derive(&student, &history);
        Ok(StudentProfile {
            student,
            groups,
            payment,
        })
    }

    /// All students matching the term, for list screens. Unlike
    /// [`resolve`](Self::resolve), multiple name matches are returned, not
    /// refused.
    pub async fn search(&self, term: &str) -> DomainResult<Vec<StudentProfile>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(DomainError::validation(
                "search_term",
                "يجب إدخال كود الطالب أو رقم الهاتف أو الاسم",
            ));
        }

        let students = if is_numeric(term) {
            self.students
                .find_by_code_or_phone(term)
                .await?
                .into_iter()
                .collect()
        } else {
            self.students.search_by_name(term).await?
        };

        let mut profiles = Vec::with_capacity(students.len());
        for student in students {
            profiles.push(self.profile(student).await?);
        }
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::context;
    use crate::error::ErrorKind;

    #[test]
    fn numeric_classification() {
        assert!(is_numeric("4821"));
        assert!(is_numeric("01012345678"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("ahmed"));
        assert!(!is_numeric("48a21"));
    }

    #[tokio::test]
    async fn resolves_by_exact_code() {
        let ctx = context().await;
        let student = ctx.seed_student("Ahmed Samir", "4821", "01011111111", &[]).await;

        let resolver = StudentResolver::new(ctx.students.clone(), ctx.groups.clone());
        let found = resolver.resolve("4821").await.expect("resolve");
        assert_eq!(found.id, student.id);
    }

    #[tokio::test]
    async fn resolves_by_exact_phone() {
        let ctx = context().await;
        let student = ctx.seed_student("Ahmed Samir", "4821", "01011111111", &[]).await;

        let resolver = StudentResolver::new(ctx.students.clone(), ctx.groups.clone());
        let found = resolver.resolve("01011111111").await.expect("resolve");
        assert_eq!(found.id, student.id);
    }

    #[tokio::test]
    async fn numeric_term_never_matches_names() {
        let ctx = context().await;
        ctx.seed_student("1234 weird name", "4821", "01011111111", &[]).await;

        let resolver = StudentResolver::new(ctx.students.clone(), ctx.groups.clone());
        let err = resolver.resolve("1234").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn resolves_single_name_fragment_case_insensitively() {
        let ctx = context().await;
        let student = ctx.seed_student("Ahmed Samir", "4821", "01011111111", &[]).await;
        ctx.seed_student("Mona Ali", "5732", "01022222222", &[]).await;

        let resolver = StudentResolver::new(ctx.students.clone(), ctx.groups.clone());
        let found = resolver.resolve("ahmed").await.expect("resolve");
        assert_eq!(found.id, student.id);
    }

    #[tokio::test]
    async fn ambiguous_fragment_is_refused_with_candidates() {
        let ctx = context().await;
        ctx.seed_student("Ahmed Samir", "4821", "01011111111", &[]).await;
        ctx.seed_student("Ahmed Tarek", "5732", "01022222222", &[]).await;

        let resolver = StudentResolver::new(ctx.students.clone(), ctx.groups.clone());
        match resolver.resolve("Ahmed").await.unwrap_err() {
            DomainError::AmbiguousSearch { matches } => {
                assert_eq!(matches.len(), 2);
                // code-ordered, deterministic
                assert_eq!(matches[0].student_code, "4821");
                assert_eq!(matches[1].student_code, "5732");
            }
            other => panic!("expected AmbiguousSearch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_term_is_not_found() {
        let ctx = context().await;
        let resolver = StudentResolver::new(ctx.students.clone(), ctx.groups.clone());
        let err = resolver.resolve("9999").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn profile_populates_groups_and_payment_view() {
        let ctx = context().await;
        let group = ctx.seed_group("Math-A").await;
        let student = ctx
            .seed_student("Ahmed Samir", "4821", "01011111111", &[group.id.clone()])
            .await;

        let resolver = StudentResolver::new(ctx.students.clone(), ctx.groups.clone());
        let profile = resolver.resolve_profile("4821").await.expect("profile");
        assert_eq!(profile.student.id, student.id);
        assert_eq!(profile.groups.len(), 1);
        assert_eq!(profile.groups[0].group_name, "Math-A");
        assert!(!profile.payment.effective_paid);
    }

    #[tokio::test]
    async fn search_returns_all_name_matches() {
        let ctx = context().await;
        ctx.seed_student("Ahmed Samir", "4821", "01011111111", &[]).await;
        ctx.seed_student("Ahmed Tarek", "5732", "01022222222", &[]).await;

        let resolver = StudentResolver::new(ctx.students.clone(), ctx.groups.clone());
        let profiles = resolver.search("ahmed").await.expect("search");
        assert_eq!(profiles.len(), 2);
    }

    #[tokio::test]
    async fn empty_term_is_a_validation_error() {
        let ctx = context().await;
        let resolver = StudentResolver::new(ctx.students.clone(), ctx.groups.clone());
        let err = resolver.resolve("   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
