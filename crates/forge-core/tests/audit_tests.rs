use async_trait::async_trait;
use forge_core::prelude::*;
use forge_model::{EntityStatus, EntityType, ProjectCollaborator, User};
use forge_store::{
    CollaboratorFilter, ProjectFilter, RequestFilter, Store, StoreError, Transaction,
};
use forge_test_utils::Harness;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Request submitted, reviewed, approved, claimed, then a hidden and a
/// visible project update
async fn delivered(h: &Harness, cast: &forge_test_utils::Cast) -> Project {
    let project = h
        .assigned_project(&cast.client, &cast.admin, &cast.developer)
        .await;
    let progress = h.services.progress();
    progress
        .update_project_status(
            project.id,
            ProjectStatusInput::new(ProjectStatus::InProgress, "internal refactor")
                .with_progress(30)
                .internal(),
            &cast.developer,
        )
        .await
        .unwrap();
    progress
        .update_project_status(
            project.id,
            ProjectStatusInput::new(ProjectStatus::InTesting, "ready for QA").with_progress(80),
            &cast.developer,
        )
        .await
        .unwrap();
    project
}

#[tokio::test]
async fn test_history_stitches_request_then_project() {
    let h = Harness::new();
    let cast = h.cast().await;
    let project = delivered(&h, &cast).await;

    let history = h
        .services
        .audit()
        .get_complete_project_history(project.id, &cast.admin)
        .await
        .unwrap();

    let kinds: Vec<EntityType> = history.iter().map(|e| e.entity.entity_type()).collect();
    assert_eq!(
        kinds,
        vec![
            EntityType::ProjectRequest,
            EntityType::ProjectRequest,
            EntityType::ProjectRequest,
            EntityType::Project,
            EntityType::Project,
            EntityType::Project,
        ]
    );
    let statuses: Vec<EntityStatus> = history.iter().map(|e| e.new_status).collect();
    assert_eq!(
        statuses,
        vec![
            EntityStatus::Request(RequestStatus::Requested),
            EntityStatus::Request(RequestStatus::InReview),
            EntityStatus::Request(RequestStatus::Approved),
            EntityStatus::Project(ProjectStatus::InProgress),
            EntityStatus::Project(ProjectStatus::InProgress),
            EntityStatus::Project(ProjectStatus::InTesting),
        ]
    );
    assert!(history
        .windows(2)
        .all(|w| w[0].chronology() < w[1].chronology()));
}

#[tokio::test]
async fn test_history_is_filtered_for_clients() {
    let h = Harness::new();
    let cast = h.cast().await;
    let project = delivered(&h, &cast).await;

    let admin = h
        .services
        .audit()
        .get_complete_project_history(project.id, &cast.admin)
        .await
        .unwrap();
    let client = h
        .services
        .audit()
        .get_complete_project_history(project.id, &cast.client)
        .await
        .unwrap();

    let expected: Vec<_> = admin.iter().filter(|e| e.is_client_visible).cloned().collect();
    assert_eq!(client, expected);
    assert_eq!(client.len(), admin.len() - 1);
}

#[tokio::test]
async fn test_list_for_non_admin_is_visible_subset() {
    let h = Harness::new();
    let cast = h.cast().await;
    let project = delivered(&h, &cast).await;
    let entity = EntityRef::Project(project.id);

    let admin = h.services.audit().list(entity, &cast.super_admin).await.unwrap();
    for actor in [cast.client, cast.developer] {
        let seen = h.services.audit().list(entity, &actor).await.unwrap();
        assert!(seen.len() <= admin.len());
        assert!(seen.iter().all(|e| admin.contains(e)));
        let hidden: Vec<_> = admin.iter().filter(|e| !seen.contains(e)).collect();
        assert!(hidden.iter().all(|e| !e.is_client_visible));
        assert_eq!(hidden.len(), 1);
    }
}

#[tokio::test]
async fn test_project_created_without_request_has_own_history_only() {
    let h = Harness::new();
    let cast = h.cast().await;

    let project = h
        .services
        .progress()
        .create_project(
            NewProject {
                client_id: cast.client.id,
                project_name: "Migration".into(),
                description: "Move to the new platform".into(),
                project_type: "internal".into(),
                budget: None,
                requirements: None,
                tech_stack: vec!["rust".into()],
            },
            &cast.admin,
        )
        .await
        .unwrap();

    let history = h
        .services
        .audit()
        .get_complete_project_history(project.id, &cast.client)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_status, None);
    assert_eq!(history[0].new_status, EntityStatus::Project(ProjectStatus::Approved));
}

#[tokio::test]
async fn test_outsiders_cannot_read_history() {
    let h = Harness::new();
    let cast = h.cast().await;
    let project = h.approved_project(&cast.client, &cast.admin).await;

    for actor in [cast.other_client, cast.developer] {
        let err = h
            .services
            .audit()
            .get_complete_project_history(project.id, &actor)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}

#[tokio::test]
async fn test_collaborators_can_read_history() {
    let h = Harness::new();
    let cast = h.cast().await;
    let project = h.approved_project(&cast.client, &cast.admin).await;

    h.services
        .progress()
        .add_collaborator(
            project.id,
            cast.other_client.id,
            CollaboratorRole::Viewer,
            &cast.client,
        )
        .await
        .unwrap();

    let history = h
        .services
        .audit()
        .get_complete_project_history(project.id, &cast.other_client)
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
    assert!(h
        .services
        .progress()
        .get_project(project.id, &cast.other_client)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_missing_project_history_is_not_found() {
    let h = Harness::new();
    let cast = h.cast().await;

    let err = h
        .services
        .audit()
        .get_complete_project_history(ProjectId::new(), &cast.admin)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

/// Holds the next `begin()` back so a later writer can commit first
#[derive(Debug)]
struct StalledBegin {
    inner: forge_store::MemoryStore,
    stall_next: Arc<AtomicBool>,
}

#[async_trait]
impl Store for StalledBegin {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.find_user(id).await
    }

    async fn find_request(&self, id: RequestId) -> Result<Option<ProjectRequest>, StoreError> {
        self.inner.find_request(id).await
    }

    async fn find_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<ProjectRequest>, StoreError> {
        self.inner.find_requests(filter).await
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        self.inner.find_project(id).await
    }

    async fn find_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError> {
        self.inner.find_projects(filter).await
    }

    async fn find_status_updates(
        &self,
        entity: EntityRef,
    ) -> Result<Vec<StatusUpdate>, StoreError> {
        self.inner.find_status_updates(entity).await
    }

    async fn find_collaborators(
        &self,
        filter: &CollaboratorFilter,
    ) -> Result<Vec<ProjectCollaborator>, StoreError> {
        self.inner.find_collaborators(filter).await
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        if self.stall_next.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(80)).await;
        }
        self.inner.begin().await
    }
}

#[tokio::test]
async fn test_latest_entry_matches_committed_progress() {
    let stall_next = Arc::new(AtomicBool::new(false));
    let h = Harness::with_layer(ForgeConfig::default(), {
        let stall_next = Arc::clone(&stall_next);
        move |inner| Arc::new(StalledBegin { inner, stall_next }) as Arc<dyn Store>
    });
    let cast = h.cast().await;
    let project = h
        .assigned_project(&cast.client, &cast.admin, &cast.developer)
        .await;
    let progress = h.services.progress();

    // The first note stalls before its transaction opens; the second
    // starts later but commits first
    stall_next.store(true, Ordering::SeqCst);
    let slow = progress.update_project_status(
        project.id,
        ProjectStatusInput::new(ProjectStatus::InProgress, "schema migrated").with_progress(40),
        &cast.developer,
    );
    let fast = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        progress
            .update_project_status(
                project.id,
                ProjectStatusInput::new(ProjectStatus::InProgress, "API done").with_progress(60),
                &cast.developer,
            )
            .await
    };
    let (slow, fast) = tokio::join!(slow, fast);
    let (slow, fast) = (slow.unwrap(), fast.unwrap());
    assert!(slow.sequence > fast.sequence);
    assert!(slow.created_at >= fast.created_at);

    let stored = h.store.find_project(project.id).await.unwrap().unwrap();
    assert_eq!(stored.progress_percentage, Some(40));

    let newest_first = h
        .services
        .audit()
        .list(EntityRef::Project(project.id), &cast.admin)
        .await
        .unwrap();
    assert_eq!(newest_first[0].id, slow.id);
    assert_eq!(newest_first[1].id, fast.id);

    let history = h
        .services
        .audit()
        .get_complete_project_history(project.id, &cast.admin)
        .await
        .unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.id, slow.id);
    assert_eq!(last.progress_percentage, stored.progress_percentage);

    let project_part: Vec<_> = history
        .iter()
        .filter(|e| e.entity == EntityRef::Project(project.id))
        .map(|e| e.id)
        .collect();
    let mut listed: Vec<_> = newest_first.iter().map(|e| e.id).collect();
    listed.reverse();
    assert_eq!(project_part, listed);
}
