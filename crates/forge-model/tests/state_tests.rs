use forge_model::state_machine::{allowed_transitions, validate_transition};
use forge_model::{Lifecycle, ProjectStatus, RequestStatus};
use proptest::prelude::*;

#[test]
fn test_request_transitions() {
    assert!(validate_transition(RequestStatus::Requested, RequestStatus::InReview).is_ok());
    assert!(validate_transition(RequestStatus::InReview, RequestStatus::Approved).is_ok());

    // Invalid
    assert!(validate_transition(RequestStatus::InReview, RequestStatus::Requested).is_err());
    assert!(validate_transition(RequestStatus::Cancelled, RequestStatus::InReview).is_err());
    assert!(validate_transition(RequestStatus::Approved, RequestStatus::Cancelled).is_err());
}

#[test]
fn test_on_hold_resumes() {
    assert!(validate_transition(ProjectStatus::OnHold, ProjectStatus::InProgress).is_ok());
    assert!(validate_transition(ProjectStatus::OnHold, ProjectStatus::Approved).is_ok());

    assert!(validate_transition(ProjectStatus::OnHold, ProjectStatus::Completed).is_err());
}

#[test]
fn test_transition_error_names_states() {
    let err = validate_transition(ProjectStatus::Completed, ProjectStatus::InProgress).unwrap_err();
    assert_eq!(err.from, "completed");
    assert_eq!(err.to, "in_progress");
}

fn any_request_status() -> impl Strategy<Value = RequestStatus> {
    prop_oneof![
        Just(RequestStatus::Requested),
        Just(RequestStatus::InReview),
        Just(RequestStatus::Approved),
        Just(RequestStatus::Cancelled),
    ]
}

fn any_project_status() -> impl Strategy<Value = ProjectStatus> {
    prop_oneof![
        Just(ProjectStatus::Requested),
        Just(ProjectStatus::Approved),
        Just(ProjectStatus::InProgress),
        Just(ProjectStatus::InTesting),
        Just(ProjectStatus::ReadyForLaunch),
        Just(ProjectStatus::Completed),
        Just(ProjectStatus::OnHold),
        Just(ProjectStatus::Cancelled),
    ]
}

proptest! {
    #[test]
    fn prop_request_transitions_match_table(from in any_request_status(), to in any_request_status()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        prop_assert_eq!(res.is_ok(), allowed.contains(&to));
    }

    #[test]
    fn prop_project_transitions_match_table(from in any_project_status(), to in any_project_status()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        prop_assert_eq!(res.is_ok(), allowed.contains(&to));
    }

    #[test]
    fn prop_no_self_loops(from in any_project_status()) {
        prop_assert!(!from.can_transition_to(from));
    }

    #[test]
    fn prop_terminal_request_states_are_final(from in any_request_status(), to in any_request_status()) {
        if from.is_terminal() {
            prop_assert!(validate_transition(from, to).is_err());
        }
    }

    #[test]
    fn prop_only_review_leads_to_approval(from in any_request_status()) {
        let res = validate_transition(from, RequestStatus::Approved);
        prop_assert_eq!(res.is_ok(), from == RequestStatus::InReview);
    }
}
