//! Monthly billing lifecycle.
//!
//! Each student carries a paid flag for the current period plus a permanent
//! audit log of every recorded payment. An external scheduler fires
//! [`BillingService::reset_all_monthly`] once per calendar month; the reset
//! clears flags and never the log, and re-running it is harmless.

use chrono::Utc;
use tracing::info;

use crate::domain::calendar;
use crate::domain::commands::billing::{PayMonthlyCommand, PayMonthlyResult, ResetMonthlyResult};
use crate::domain::models::{PaymentRecord, StudentProfile};
use crate::domain::resolver::StudentResolver;
use crate::error::{DomainError, DomainResult, Entity};
use crate::notification::{self, NotificationDispatcher};
use crate::storage::StudentRepository;

#[derive(Clone)]
pub struct BillingService {
    students: StudentRepository,
    resolver: StudentResolver,
    notifier: NotificationDispatcher,
}

impl BillingService {
    pub fn new(
        students: StudentRepository,
        resolver: StudentResolver,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            students,
            resolver,
            notifier,
        }
    }

    /// Record a monthly payment. Deliberately not idempotent at the audit
    /// level: every call is a real cash event and appends its own history
    /// row. The derived read path keeps the paid status stable no matter
    /// how many rows a period accumulates.
    pub async fn pay_monthly(&self, command: PayMonthlyCommand) -> DomainResult<PayMonthlyResult> {
        let student = self
            .students
            .find_by_id(&command.student_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))?;

        let paid_at = Utc::now();
        let record = PaymentRecord {
            id: PaymentRecord::generate_id(),
            student_id: student.id.clone(),
            paid_at,
            paid_by: command.actor_id,
            amount: command.amount.unwrap_or(0.0),
        };
        self.students.record_payment(&record).await?;

        info!(student_code = %student.student_code, "recorded monthly payment");

        self.notifier.dispatch(
            student.parent_phone.clone(),
            notification::payment_message(&student.student_name, &calendar::today_key()),
        );

        Ok(PayMonthlyResult {
            student_name: student.student_name,
            paid_at,
        })
    }

    /// Bulk start-of-month reset, invoked by the external scheduler. Clears
    /// every student's paid flag, date and actor; the history log is never
    /// touched. Safe to re-run: a repeat finds nothing to clear and reports
    /// zero affected records.
    pub async fn reset_all_monthly(&self) -> DomainResult<ResetMonthlyResult> {
        let affected = self.students.reset_all_payments(Utc::now()).await?;
        info!(affected, "reset monthly payments");
        Ok(ResetMonthlyResult { affected })
    }

    /// Per-student payment view — same derived status as search and list.
    pub async fn payment_detail(&self, student_id: &str) -> DomainResult<StudentProfile> {
        let student = self
            .students
            .find_by_id(student_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))?;
        self.resolver.profile(student).await
    }

    /// Full audit log for one student, oldest first.
    pub async fn payment_history(&self, student_id: &str) -> DomainResult<Vec<PaymentRecord>> {
        self.students
            .find_by_id(student_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))?;
        Ok(self.students.payment_history(student_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{context, TestContext};
    use crate::error::ErrorKind;
    use crate::notification::testing::{settle, FailingGateway, RecordingGateway};
    use crate::notification::NotificationGateway;
    use std::sync::Arc;

    fn service_with(ctx: &TestContext, gateway: Arc<dyn NotificationGateway>) -> BillingService {
        BillingService::new(
            ctx.students.clone(),
            StudentResolver::new(ctx.students.clone(), ctx.groups.clone()),
            NotificationDispatcher::new(gateway),
        )
    }

    fn service(ctx: &TestContext) -> BillingService {
        service_with(ctx, Arc::new(RecordingGateway::default()))
    }

    // Scenario: pay, reset, and the audit trail survives the reset.
    #[tokio::test]
    async fn payment_then_reset_keeps_the_audit_trail() {
        let ctx = context().await;
        let actor = ctx.seed_employee("Mr. Hossam").await;
        let student = ctx.seed_student("Ahmed Samir", "4821", "01011111111", &[]).await;
        let service = service(&ctx);

        service
            .pay_monthly(PayMonthlyCommand {
                student_id: student.id.clone(),
                actor_id: actor.id.clone(),
                amount: Some(150.0),
            })
            .await
            .expect("pay");

        let detail = service.payment_detail(&student.id).await.expect("detail");
        assert!(detail.student.monthly_payment_paid);
        assert!(detail.payment.effective_paid);
        assert!(detail.payment.paid_this_period);
        assert_eq!(
            detail.payment.last_payment.as_ref().unwrap().paid_by.as_deref(),
            Some(actor.id.as_str())
        );
        assert_eq!(service.payment_history(&student.id).await.unwrap().len(), 1);

        let reset = service.reset_all_monthly().await.expect("reset");
        assert_eq!(reset.affected, 1);

        let detail = service.payment_detail(&student.id).await.expect("detail");
        assert!(!detail.student.monthly_payment_paid);
        assert!(detail.student.monthly_payment_date.is_none());
        assert!(detail.student.monthly_payment_paid_by.is_none());
        // Unpaid for the new period, but "has paid before" stays derivable
        assert!(!detail.payment.paid_this_period);
        assert!(detail.payment.effective_paid);
        assert_eq!(service.payment_history(&student.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn repeated_reset_is_idempotent_and_reports_zero() {
        let ctx = context().await;
        let actor = ctx.seed_employee("Mr. Hossam").await;
        let a = ctx.seed_student("Ahmed Samir", "4821", "01011111111", &[]).await;
        let b = ctx.seed_student("Mona Ali", "5732", "01022222222", &[]).await;
        let service = service(&ctx);

        for id in [&a.id, &b.id] {
            service
                .pay_monthly(PayMonthlyCommand {
                    student_id: id.clone(),
                    actor_id: actor.id.clone(),
                    amount: None,
                })
                .await
                .expect("pay");
        }

        let first = service.reset_all_monthly().await.expect("first reset");
        assert_eq!(first.affected, 2);
        let after_first = ctx.students.list_all().await.expect("list");

        let second = service.reset_all_monthly().await.expect("second reset");
        assert_eq!(second.affected, 0);
        let after_second = ctx.students.list_all().await.expect("list");

        // Identical end state both times, and no history lost
        assert_eq!(after_first, after_second);
        for id in [&a.id, &b.id] {
            assert_eq!(service.payment_history(id).await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn double_payment_appends_two_history_rows() {
        let ctx = context().await;
        let actor = ctx.seed_employee("Mr. Hossam").await;
        let student = ctx.seed_student("Ahmed Samir", "4821", "01011111111", &[]).await;
        let service = service(&ctx);

        for _ in 0..2 {
            service
                .pay_monthly(PayMonthlyCommand {
                    student_id: student.id.clone(),
                    actor_id: actor.id.clone(),
                    amount: Some(150.0),
                })
                .await
                .expect("pay");
        }

        let history = service.payment_history(&student.id).await.unwrap();
        assert_eq!(history.len(), 2);
        let detail = service.payment_detail(&student.id).await.expect("detail");
        assert!(detail.payment.effective_paid);
    }

    #[tokio::test]
    async fn effective_status_is_identical_across_read_sites() {
        let ctx = context().await;
        let actor = ctx.seed_employee("Mr. Hossam").await;
        let student = ctx.seed_student("Ahmed Samir", "4821", "01011111111", &[]).await;
        let service = service(&ctx);
        let resolver = StudentResolver::new(ctx.students.clone(), ctx.groups.clone());

        service
            .pay_monthly(PayMonthlyCommand {
                student_id: student.id.clone(),
                actor_id: actor.id.clone(),
                amount: None,
            })
            .await
            .expect("pay");
        service.reset_all_monthly().await.expect("reset");

        let via_detail = service.payment_detail(&student.id).await.unwrap().payment;
        let via_search = resolver.search("4821").await.unwrap().remove(0).payment;
        let via_resolve = resolver.resolve_profile("Ahmed").await.unwrap().payment;
        assert_eq!(via_detail, via_search);
        assert_eq!(via_detail, via_resolve);
        assert!(via_detail.effective_paid);
    }

    #[tokio::test]
    async fn unknown_student_is_not_found() {
        let ctx = context().await;
        let service = service(&ctx);
        let err = service
            .pay_monthly(PayMonthlyCommand {
                student_id: "student::missing".into(),
                actor_id: "employee::x".into(),
                amount: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn parent_is_notified_and_gateway_failure_is_swallowed() {
        let ctx = context().await;
        let actor = ctx.seed_employee("Mr. Hossam").await;
        let student = ctx.seed_student("Ahmed Samir", "4821", "01011111111", &[]).await;

        let gateway = Arc::new(RecordingGateway::default());
        let service = service_with(&ctx, gateway.clone());
        service
            .pay_monthly(PayMonthlyCommand {
                student_id: student.id.clone(),
                actor_id: actor.id.clone(),
                amount: None,
            })
            .await
            .expect("pay");
        settle().await;
        assert_eq!(gateway.sent.lock().unwrap().len(), 1);

        let failing = service_with(&ctx, Arc::new(FailingGateway));
        failing
            .pay_monthly(PayMonthlyCommand {
                student_id: student.id.clone(),
                actor_id: actor.id,
                amount: None,
            })
            .await
            .expect("pay despite gateway failure");
        settle().await;
        assert_eq!(service.payment_history(&student.id).await.unwrap().len(), 2);
    }
}
