use forge_core::prelude::*;
use forge_core::{ErrorCode, ForgeConfig};
use forge_model::{EntityStatus, Lifecycle};
use forge_store::{Fault, RequestFilter, Store};
use forge_test_utils::{sample_request, Harness};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[tokio::test]
async fn test_create_request_starts_requested_with_audit_entry() {
    let h = Harness::new();
    let cast = h.cast().await;

    let request = h.request(&cast.client).await;
    assert_eq!(request.status, RequestStatus::Requested);
    assert_eq!(request.user_id, cast.client.id);
    assert_eq!(request.budget.as_deref(), Some("10k-20k"));

    let log = h
        .services
        .audit()
        .list(EntityRef::Request(request.id), &cast.client)
        .await
        .unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].old_status, None);
    assert_eq!(log[0].new_status, EntityStatus::Request(RequestStatus::Requested));
    assert!(log[0].is_client_visible);
}

#[tokio::test]
async fn test_create_request_rejects_blank_fields() {
    let h = Harness::new();
    let cast = h.cast().await;

    let err = h
        .services
        .requests()
        .create_project_request(NewProjectRequest::new("Site", " ", "web"), &cast.client)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Validation);
    assert_eq!(h.store.status_update_count(), 0);
}

#[tokio::test]
async fn test_worked_example_review_then_approve() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request(&cast.client).await;

    let reviewed = h
        .services
        .requests()
        .update_project_request_status(request.id, RequestStatus::InReview, &cast.admin)
        .await
        .unwrap();
    assert_eq!(reviewed.status, RequestStatus::InReview);

    let log = h.store.find_status_updates(EntityRef::Request(request.id)).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].old_status, Some(EntityStatus::Request(RequestStatus::Requested)));
    assert_eq!(log[1].new_status, EntityStatus::Request(RequestStatus::InReview));

    let project = h
        .services
        .requests()
        .approve_project_request(request.id, &cast.admin)
        .await
        .unwrap();
    assert_eq!(project.request_id, Some(request.id));
    assert_eq!(project.client_id, request.user_id);
    assert_eq!(project.status, ProjectStatus::Approved);
    assert_eq!(project.developer_id, None);
    assert_eq!(project.project_name, request.project_name);

    let approved = h.store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert!(approved.reviewed_at.is_some());

    let log = h.store.find_status_updates(EntityRef::Request(request.id)).await.unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(log[2].new_status, EntityStatus::Request(RequestStatus::Approved));
    assert_eq!(h.store.project_count(), 1);
}

#[tokio::test]
async fn test_generic_update_never_approves() {
    let h = Harness::new();
    let cast = h.cast().await;

    for actor in [cast.client, cast.admin, cast.super_admin] {
        let request = h.request_in_review(&cast.client, &cast.admin).await;
        let err = h
            .services
            .requests()
            .update_project_request_status(request.id, RequestStatus::Approved, &actor)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStatus);

        let stored = h.store.find_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::InReview);
    }
    assert_eq!(h.store.project_count(), 0);
}

#[tokio::test]
async fn test_approve_requires_in_review() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request(&cast.client).await;

    let err = h
        .services
        .requests()
        .approve_project_request(request.id, &cast.admin)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidStatus);
    assert_eq!(h.store.project_count(), 0);
}

#[tokio::test]
async fn test_approve_twice_creates_one_project() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request_in_review(&cast.client, &cast.admin).await;

    h.services
        .requests()
        .approve_project_request(request.id, &cast.super_admin)
        .await
        .unwrap();
    let err = h
        .services
        .requests()
        .approve_project_request(request.id, &cast.admin)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidStatus);
    assert_eq!(h.store.project_count(), 1);
}

#[tokio::test]
async fn test_approve_requires_admin() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request_in_review(&cast.client, &cast.admin).await;

    for actor in [cast.client, cast.developer] {
        let err = h
            .services
            .requests()
            .approve_project_request(request.id, &actor)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}

#[tokio::test]
async fn test_approve_missing_request_is_not_found() {
    let h = Harness::new();
    let cast = h.cast().await;

    let err = h
        .services
        .requests()
        .approve_project_request(RequestId::new(), &cast.admin)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_failed_project_insert_rolls_back_approval() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request_in_review(&cast.client, &cast.admin).await;
    let entries_before = h.store.status_update_count();

    h.store.inject_fault(Fault::InsertProject);
    let err = h
        .services
        .requests()
        .approve_project_request(request.id, &cast.admin)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Store);
    assert!(err.is_retryable());
    let stored = h.store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::InReview);
    assert_eq!(stored.reviewed_at, None);
    assert_eq!(h.store.project_count(), 0);
    assert_eq!(h.store.status_update_count(), entries_before);

    // Retrying the whole operation succeeds
    let project = h
        .services
        .requests()
        .approve_project_request(request.id, &cast.admin)
        .await
        .unwrap();
    assert_eq!(project.request_id, Some(request.id));
}

#[tokio::test]
async fn test_failed_audit_append_rolls_back_approval() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request_in_review(&cast.client, &cast.admin).await;

    h.store.inject_fault(Fault::InsertStatusUpdate);
    h.services
        .requests()
        .approve_project_request(request.id, &cast.admin)
        .await
        .unwrap_err();

    let stored = h.store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::InReview);
    assert_eq!(h.store.project_count(), 0);
}

#[tokio::test]
async fn test_reject_cancels_and_stamps_review() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request(&cast.client).await;

    let rejected = h
        .services
        .requests()
        .reject_project_request(request.id, &cast.admin)
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Cancelled);
    assert!(rejected.reviewed_at.is_some());

    let err = h
        .services
        .requests()
        .reject_project_request(request.id, &cast.admin)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidStatus);
}

#[tokio::test]
async fn test_reject_requires_admin() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request(&cast.client).await;

    let err = h
        .services
        .requests()
        .reject_project_request(request.id, &cast.client)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn test_owner_may_cancel_own_request() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request(&cast.client).await;

    let cancelled = h
        .services
        .requests()
        .update_project_request_status(request.id, RequestStatus::Cancelled, &cast.client)
        .await
        .unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
}

#[tokio::test]
async fn test_non_owner_client_is_forbidden() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request(&cast.client).await;

    let read = h
        .services
        .requests()
        .get_project_request(request.id, &cast.other_client)
        .await
        .unwrap_err();
    let update = h
        .services
        .requests()
        .update_project_request_status(request.id, RequestStatus::Cancelled, &cast.other_client)
        .await
        .unwrap_err();
    let audit = h
        .services
        .audit()
        .list(EntityRef::Request(request.id), &cast.other_client)
        .await
        .unwrap_err();

    assert_eq!(read.code(), ErrorCode::Forbidden);
    assert_eq!(update.code(), ErrorCode::Forbidden);
    assert_eq!(audit.code(), ErrorCode::Forbidden);

    let stored = h.store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Requested);
}

#[tokio::test]
async fn test_illegal_transition_is_invalid_status() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request(&cast.client).await;

    let err = h
        .services
        .requests()
        .update_project_request_status(request.id, RequestStatus::Requested, &cast.admin)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidStatus);
}

#[tokio::test]
async fn test_list_requests_is_role_scoped() {
    let h = Harness::new();
    let cast = h.cast().await;
    h.request(&cast.client).await;
    h.request(&cast.client).await;
    h.request(&cast.other_client).await;

    let own = h.services.requests().list_project_requests(&cast.client).await.unwrap();
    let all = h.services.requests().list_project_requests(&cast.admin).await.unwrap();

    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|r| r.user_id == cast.client.id));
    assert_eq!(all.len(), 3);
    assert_eq!(
        all,
        h.store.find_requests(&RequestFilter::all()).await.unwrap()
    );
}

#[tokio::test]
async fn test_hidden_request_updates_follow_config() {
    let h = Harness::with_config(ForgeConfig::new().with_request_updates_client_visible(false));
    let cast = h.cast().await;
    let request = h.request_in_review(&cast.client, &cast.admin).await;

    let client_view = h
        .services
        .audit()
        .list(EntityRef::Request(request.id), &cast.client)
        .await
        .unwrap();
    let admin_view = h
        .services
        .audit()
        .list(EntityRef::Request(request.id), &cast.admin)
        .await
        .unwrap();

    assert_eq!(client_view.len(), 1);
    assert_eq!(admin_view.len(), 2);
}

#[tokio::test]
async fn test_concurrent_request_updates_one_goes_stale() {
    let h = Harness::new();
    let cast = h.cast().await;
    let request = h.request(&cast.client).await;
    let requests = h.services.requests();
    let entries_before = h.store.status_update_count();

    let (review, cancel) = tokio::join!(
        requests.update_project_request_status(request.id, RequestStatus::InReview, &cast.admin),
        requests.update_project_request_status(request.id, RequestStatus::Cancelled, &cast.client),
    );

    let (winner, err) = match (review, cancel) {
        (Ok(updated), Err(err)) | (Err(err), Ok(updated)) => (updated, err),
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    assert_eq!(err.code(), ErrorCode::InvalidStatus);
    assert_eq!(h.store.status_update_count(), entries_before + 1);

    let stored = h.store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, winner.status);
}

#[tokio::test]
async fn test_hidden_rejection_follows_config() {
    let h = Harness::with_config(ForgeConfig::new().with_request_updates_client_visible(false));
    let cast = h.cast().await;
    let request = h.request(&cast.client).await;

    h.services
        .requests()
        .reject_project_request(request.id, &cast.admin)
        .await
        .unwrap();

    let client_view = h
        .services
        .audit()
        .list(EntityRef::Request(request.id), &cast.client)
        .await
        .unwrap();
    assert_eq!(client_view.len(), 1);
    assert_eq!(client_view[0].new_status, EntityStatus::Request(RequestStatus::Requested));
}

fn request_status() -> impl Strategy<Value = RequestStatus> {
    prop_oneof![
        Just(RequestStatus::Requested),
        Just(RequestStatus::InReview),
        Just(RequestStatus::Approved),
        Just(RequestStatus::Cancelled),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_generic_updates_never_reach_approved(
        steps in prop::collection::vec(request_status(), 1..8)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let h = Harness::new();
            let cast = h.cast().await;
            let request = h
                .services
                .requests()
                .create_project_request(sample_request(), &cast.client)
                .await
                .unwrap();

            let mut expected = RequestStatus::Requested;
            let mut applied = 0;
            for to in steps {
                let result = h
                    .services
                    .requests()
                    .update_project_request_status(request.id, to, &cast.admin)
                    .await;
                if to != RequestStatus::Approved && expected.can_transition_to(to) {
                    assert_eq!(result.unwrap().status, to);
                    expected = to;
                    applied += 1;
                } else {
                    assert_eq!(result.unwrap_err().code(), ErrorCode::InvalidStatus);
                }
            }

            let stored = h.store.find_request(request.id).await.unwrap().unwrap();
            assert_eq!(stored.status, expected);
            assert_ne!(stored.status, RequestStatus::Approved);

            // One creation entry plus one per applied transition
            let log = h.store.find_status_updates(EntityRef::Request(request.id)).await.unwrap();
            assert_eq!(log.len(), applied + 1);
        });
    }
}
