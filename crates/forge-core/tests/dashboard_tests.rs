use forge_core::prelude::*;
use forge_core::ForgeConfig;
use forge_test_utils::Harness;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_client_dashboard() {
    let h = Harness::new();
    let cast = h.cast().await;
    h.request(&cast.client).await;
    h.request_in_review(&cast.client, &cast.admin).await;
    let project = h.approved_project(&cast.client, &cast.admin).await;
    h.approved_project(&cast.other_client, &cast.admin).await;

    let dashboard = h.services.dashboard().my_dashboard(&cast.client).await.unwrap();

    assert_eq!(dashboard.projects.len(), 1);
    assert_eq!(dashboard.projects[0].id, project.id);
    assert_eq!(dashboard.project_requests.len(), 3);
    assert_eq!(dashboard.available_projects, None);
    assert_eq!(dashboard.assigned_projects, None);
    assert_eq!(
        dashboard.summary,
        DashboardSummary {
            total_projects: 1,
            active_projects: 1,
            completed_projects: 0,
            total_requests: 3,
            pending_review_requests: 1,
            in_review_requests: 1,
        }
    );
}

#[tokio::test]
async fn test_developer_dashboard() {
    let h = Harness::new();
    let cast = h.cast().await;
    let open = h.approved_project(&cast.client, &cast.admin).await;
    let mine = h
        .assigned_project(&cast.client, &cast.admin, &cast.developer)
        .await;
    h.assigned_project(&cast.client, &cast.admin, &cast.other_developer)
        .await;

    let dashboard = h.services.dashboard().my_dashboard(&cast.developer).await.unwrap();

    assert!(dashboard.projects.is_empty());
    assert!(dashboard.project_requests.is_empty());
    let available: Vec<ProjectId> = dashboard
        .available_projects
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(available, vec![open.id]);
    let assigned: Vec<ProjectId> = dashboard
        .assigned_projects
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(assigned, vec![mine.id]);
    assert_eq!(dashboard.summary.total_projects, 1);
    assert_eq!(dashboard.summary.active_projects, 1);
}

#[tokio::test]
async fn test_collaborations_appear_unless_primary_developer() {
    let h = Harness::new();
    let cast = h.cast().await;
    let shared = h.approved_project(&cast.other_client, &cast.admin).await;
    let own_work = h
        .assigned_project(&cast.other_client, &cast.admin, &cast.developer)
        .await;

    let progress = h.services.progress();
    for project in [shared.id, own_work.id] {
        progress
            .add_collaborator(project, cast.developer.id, CollaboratorRole::Contributor, &cast.admin)
            .await
            .unwrap();
    }

    let dashboard = h.services.dashboard().my_dashboard(&cast.developer).await.unwrap();
    let projects: Vec<ProjectId> = dashboard.projects.iter().map(|p| p.id).collect();
    assert_eq!(projects, vec![shared.id]);
    // Summary covers projects and assigned projects without double counting
    assert_eq!(dashboard.summary.total_projects, 2);
}

#[tokio::test]
async fn test_admin_dashboard_sees_everything() {
    let h = Harness::new();
    let cast = h.cast().await;
    h.request(&cast.client).await;
    h.approved_project(&cast.client, &cast.admin).await;
    h.assigned_project(&cast.other_client, &cast.admin, &cast.developer)
        .await;

    for actor in [cast.admin, cast.super_admin] {
        let dashboard = h.services.dashboard().my_dashboard(&actor).await.unwrap();
        assert_eq!(dashboard.projects.len(), 2);
        assert_eq!(dashboard.project_requests.len(), 3);
        assert_eq!(dashboard.summary.total_requests, 3);
        assert_eq!(dashboard.summary.pending_review_requests, 1);
        assert_eq!(dashboard.summary.active_projects, 2);
    }
}

#[tokio::test]
async fn test_cancelled_projects_can_be_hidden() {
    let h = Harness::with_config(ForgeConfig::new().with_cancelled_projects(false));
    let cast = h.cast().await;
    let project = h.approved_project(&cast.client, &cast.admin).await;
    h.approved_project(&cast.client, &cast.admin).await;

    h.services
        .progress()
        .update_project_status(
            project.id,
            ProjectStatusInput::new(ProjectStatus::Cancelled, "client withdrew"),
            &cast.admin,
        )
        .await
        .unwrap();

    let dashboard = h.services.dashboard().my_dashboard(&cast.client).await.unwrap();
    assert_eq!(dashboard.projects.len(), 1);
    assert!(dashboard.projects.iter().all(|p| p.id != project.id));
}

#[tokio::test]
async fn test_dashboard_serializes_camel_case() {
    let h = Harness::new();
    let cast = h.cast().await;
    h.request(&cast.client).await;

    let dashboard = h.services.dashboard().my_dashboard(&cast.client).await.unwrap();
    let json = serde_json::to_value(&dashboard).unwrap();

    assert_eq!(json["summary"]["totalRequests"], 1);
    assert!(json.get("availableProjects").is_none());
    assert_eq!(json["projectRequests"][0]["status"], "requested");
}
