mod common;

use common::{principal, TestContext, PASSWORD};
use nido_auth::error::AuthError;
use nido_auth::identity::CreateAccountRequest;
use nido_auth::model::{Child, Group, Role};
use nido_auth::store::Store;

#[tokio::test]
async fn creation_forest_enforced() {
    let ctx = TestContext::new();
    let admin = ctx.admin("admin@nido.test").await;
    let reception = ctx.reception(&admin, "desk@nido.test").await;

    // Reception cannot provision another reception
    let err = ctx
        .directory
        .create_account(
            CreateAccountRequest::Reception {
                email: "desk2@nido.test".into(),
                name: "Desk 2".into(),
                password: PASSWORD.into(),
            },
            Some(&principal(&reception)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidOwnership(_)));

    // Admin cannot provision a teacher; that is reception's edge
    let err = ctx
        .directory
        .create_account(
            CreateAccountRequest::Teacher {
                email: "t@nido.test".into(),
                name: "T".into(),
                password: PASSWORD.into(),
            },
            Some(&principal(&admin)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidOwnership(_)));

    // Parents cannot bootstrap
    let err = ctx
        .directory
        .create_account(
            CreateAccountRequest::Parent {
                email: "p@nido.test".into(),
                name: "P".into(),
                password: PASSWORD.into(),
                teacher_id: None,
                group_id: None,
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidOwnership(_)));

    // The happy path records the creator edge
    let teacher = ctx.teacher(&reception, "teacher@nido.test").await;
    assert_eq!(teacher.created_by, Some(reception.id));
    assert_eq!(teacher.role, Role::Teacher);
}

#[tokio::test]
async fn duplicate_email_is_case_insensitive() {
    let ctx = TestContext::new();
    let admin = ctx.admin("admin@nido.test").await;
    ctx.reception(&admin, "desk@nido.test").await;

    let err = ctx
        .directory
        .create_account(
            CreateAccountRequest::Reception {
                email: "Desk@Nido.Test".into(),
                name: "Desk".into(),
                password: PASSWORD.into(),
            },
            Some(&principal(&admin)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateEmail(_)));
}

#[tokio::test]
async fn reception_starts_dormant_other_roles_start_active() {
    let ctx = TestContext::new();
    let admin = ctx.admin("admin@nido.test").await;
    assert!(admin.is_active);

    let reception = ctx.reception(&admin, "desk@nido.test").await;
    assert!(!reception.is_active);
    assert!(!reception.documents_approved);
    assert!(!reception.is_verified);

    let teacher = ctx.teacher(&reception, "teacher@nido.test").await;
    assert!(teacher.is_active);
}

#[tokio::test]
async fn parent_group_must_belong_to_referenced_teacher() {
    let ctx = TestContext::new();
    let admin = ctx.admin("admin@nido.test").await;
    let reception = ctx.reception(&admin, "desk@nido.test").await;
    let teacher_a = ctx.teacher(&reception, "ta@nido.test").await;
    let teacher_b = ctx.teacher(&reception, "tb@nido.test").await;

    let group_b = Group::new("Sunflowers", teacher_b.id, reception.id, 12);
    ctx.store.insert_group(group_b.clone()).await.unwrap();

    // Group owned by teacher B, caseload assigned to teacher A: rejected
    let err = ctx
        .directory
        .create_account(
            CreateAccountRequest::Parent {
                email: "p@nido.test".into(),
                name: "P".into(),
                password: PASSWORD.into(),
                teacher_id: Some(teacher_a.id),
                group_id: Some(group_b.id),
            },
            Some(&principal(&reception)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidOwnership(_)));

    // Consistent pairing is accepted
    let parent = ctx
        .directory
        .create_account(
            CreateAccountRequest::Parent {
                email: "p@nido.test".into(),
                name: "P".into(),
                password: PASSWORD.into(),
                teacher_id: Some(teacher_b.id),
                group_id: Some(group_b.id),
            },
            Some(&principal(&reception)),
        )
        .await
        .unwrap();
    assert_eq!(parent.teacher_id, Some(teacher_b.id));
}

#[tokio::test]
async fn set_password_rotates_credentials() {
    let ctx = TestContext::new();
    let admin = ctx.admin("admin@nido.test").await;

    ctx.directory
        .set_password(admin.id, "new-password-9")
        .await
        .unwrap();

    let current = ctx.account(&admin).await;
    assert!(ctx.directory.verify_password(&current, "new-password-9").unwrap());
    assert!(!ctx.directory.verify_password(&current, PASSWORD).unwrap());
}

#[tokio::test]
async fn hard_delete_cascades_and_respects_scope() {
    let ctx = TestContext::new();
    let admin = ctx.admin("admin@nido.test").await;
    let reception = ctx.reception(&admin, "desk@nido.test").await;
    let teacher = ctx.teacher(&reception, "teacher@nido.test").await;
    let parent = ctx.parent(&reception, Some(&teacher), "parent@nido.test").await;

    let child = Child::new(
        parent.id,
        "Mina",
        chrono::NaiveDate::from_ymd_opt(2021, 3, 14).unwrap(),
    );
    let child_id = child.id;
    ctx.store.insert_child(child).await.unwrap();

    // A teacher is not an administrative role and cannot hard-delete
    let err = ctx
        .directory
        .delete_account(&principal(&teacher), parent.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden));

    // Admins are read-only on parent accounts, even inside their subtree
    let stranger = ctx.admin("admin2@nido.test").await;
    let err = ctx
        .directory
        .delete_account(&principal(&stranger), parent.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden));

    // The creating reception may delete, cascading the child rows
    ctx.directory
        .delete_account(&principal(&reception), parent.id)
        .await
        .unwrap();
    assert!(ctx.store.account(parent.id).await.unwrap().is_none());
    assert!(ctx.store.child(child_id).await.unwrap().is_none());
}
