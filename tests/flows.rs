//! User-initiated task flows against a scripted backend

mod support;

use serde_json::json;
use std::time::Duration;
use steamlord_taskman::api::RpcError;
use steamlord_taskman::api::client::INSTALL_PATH_MISSING;
use steamlord_taskman::api::constants::methods;
use steamlord_taskman::tasks::license::ACTIVATION_REQUIRED;
use steamlord_taskman::tasks::presenter::{RenderBody, SUPPORT_URL};
use steamlord_taskman::tasks::{TaskCategory, Visibility};
use steamlord_taskman::ui::{ModalAction, ModalId, SurfaceEvent};
use support::{done, downloading, failed, failure, harness, ok, unlicensed_harness};
use tokio::time::{Instant, sleep};

async fn advance(millis: u64) {
    sleep(Duration::from_millis(millis)).await;
}

#[tokio::test(start_paused = true)]
async fn test_game_download_end_to_end() {
    let h = harness();
    let modal = ModalId::new(TaskCategory::Game, 42);
    h.backend.respond(methods::ADD_GAME, ok());
    h.backend.status(methods::ADD_GAME_STATUS, downloading(300_000, 1_000_000));

    assert!(h.manager.add_game(42, "Portal 2").await);
    assert!(h.surface.is_open(modal));

    // Second subject in the same category is refused with a notice
    assert!(!h.manager.add_game(7, "Half-Life").await);
    assert_eq!(h.surface.notices(), vec![TaskCategory::Game.busy_notice()]);
    assert_eq!(h.backend.call_count(methods::ADD_GAME), 1);

    advance(1100).await;
    assert_eq!(h.surface.last_instruction(modal).unwrap().percent(), Some(30));

    h.manager.handle_action(modal, ModalAction::Hide).await;
    assert!(!h.surface.is_open(modal));
    assert_eq!(h.manager.visibility_of(TaskCategory::Game, 42), Some(Visibility::Minimized));
    assert!(h.surface.last_dock().unwrap().item(TaskCategory::Game).is_some());

    h.backend.status(methods::ADD_GAME_STATUS, done());
    advance(1000).await;

    assert!(h.surface.is_open(modal));
    let shown = h.surface.last_instruction(modal).unwrap();
    assert!(shown.terminal);
    assert!(shown.offers(ModalAction::RestartNow));
    assert!(shown.offers(ModalAction::RestartLater));

    assert!(h.manager.is_idle(TaskCategory::Game));
    assert!(!h.surface.last_dock().unwrap().is_visible());
    assert!(h.surface.events().contains(&SurfaceEvent::Injected));

    // No polls after the terminal state
    let polls = h.backend.call_count(methods::ADD_GAME_STATUS);
    advance(3000).await;
    assert_eq!(h.backend.call_count(methods::ADD_GAME_STATUS), polls);
    assert!(!h.manager.is_polling(TaskCategory::Game));
}

#[tokio::test(start_paused = true)]
async fn test_failed_state_releases_slot() {
    let h = harness();
    let modal = ModalId::new(TaskCategory::Bypass, 70);
    h.backend.respond(methods::GAME_INSTALL_PATH, json!({ "success": true, "installPath": "D:/Games/Hades" }));
    h.backend.respond(methods::APPLY_BYPASS, ok());
    h.backend.status(methods::APPLY_BYPASS_STATUS, failed("Premium plan required"));

    assert!(h.manager.apply_bypass(70, "Hades").await);
    advance(1100).await;

    assert!(h.manager.is_idle(TaskCategory::Bypass));
    assert!(h.manager.should_ignore(TaskCategory::Bypass, 70));
    let shown = h.surface.last_instruction(modal).unwrap();
    assert_eq!(
        shown.body,
        RenderBody::Upsell {
            message: "Failed: Premium plan required".to_string(),
            url: SUPPORT_URL,
        }
    );
    assert_eq!(shown.actions, vec![ModalAction::Close]);

    // Nothing is polled after the terminal state
    assert!(!h.manager.is_polling(TaskCategory::Bypass));
    let polls = h.backend.call_count(methods::APPLY_BYPASS_STATUS);
    advance(5000).await;
    assert_eq!(h.backend.call_count(methods::APPLY_BYPASS_STATUS), polls);
}

#[tokio::test(start_paused = true)]
async fn test_start_failure_rolls_back_reservation() {
    let h = harness();
    h.backend.respond(methods::ADD_GAME, failure("Invalid appid"));

    assert!(!h.manager.add_game(42, "Portal 2").await);

    assert!(h.manager.is_idle(TaskCategory::Game));
    assert!(h.manager.should_ignore(TaskCategory::Game, 42));
    assert_eq!(h.surface.alerts(), vec!["Invalid appid".to_string()]);
    assert!(h.surface.open_modals().is_empty());
    assert!(!h.manager.is_polling(TaskCategory::Game));
}

#[tokio::test(start_paused = true)]
async fn test_start_transport_error_uses_generic_message() {
    let h = harness();
    h.backend.fail(methods::ADD_GAME, RpcError::Transport("connection refused".into()));

    assert!(!h.manager.add_game(42, "Portal 2").await);
    assert!(h.manager.is_idle(TaskCategory::Game));
    assert_eq!(h.surface.alerts(), vec!["Failed to add game".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_install_path_alerts() {
    let h = harness();
    h.backend.respond(methods::GAME_INSTALL_PATH, json!({ "success": true, "installPath": "" }));
    h.backend.respond(methods::APPLY_FIX, ok());

    assert!(!h.manager.apply_fix(620, "Portal 2").await);

    assert_eq!(h.surface.alerts(), vec![INSTALL_PATH_MISSING.to_string()]);
    assert_eq!(h.backend.call_count(methods::APPLY_FIX), 0);
    assert!(h.manager.is_idle(TaskCategory::Fix));
}

#[tokio::test(start_paused = true)]
async fn test_fix_request_carries_install_path() {
    let h = harness();
    h.backend.respond(methods::GAME_INSTALL_PATH, json!({ "success": true, "installPath": "C:/Games/Portal 2" }));
    h.backend.respond(methods::APPLY_FIX, ok());
    h.backend.status(methods::APPLY_FIX_STATUS, downloading(0, 0));

    assert!(h.manager.apply_fix(620, "Portal 2").await);

    let params = &h.backend.calls(methods::APPLY_FIX)[0];
    assert_eq!(params["appid"], 620);
    assert_eq!(params["installPath"], "C:/Games/Portal 2");
    assert_eq!(params["gameName"], "Portal 2");
    assert_eq!(params["fixType"], "LordFix");
    assert_eq!(params["contentScriptQuery"], "");

    // Fix application polls twice as often as the other flows
    advance(1100).await;
    assert_eq!(h.backend.call_count(methods::APPLY_FIX_STATUS), 2);
    h.manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_removal_opens_validation_after_delay() {
    let h = harness();
    h.backend.respond(methods::GAME_INSTALL_PATH, json!({ "success": true, "installPath": "C:/Games/Portal 2" }));
    h.backend.respond(methods::REMOVE_FIX, ok());
    h.backend.status(methods::REMOVE_FIX_STATUS, done());

    assert!(h.manager.remove_fix(620, "Portal 2").await);

    advance(1500).await;
    assert!(h.manager.is_idle(TaskCategory::Fix));
    let url = SurfaceEvent::OpenUrl("steam://validate/620".to_string());
    assert!(!h.surface.events().contains(&url));

    advance(600).await;
    assert!(h.surface.events().contains(&url));
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_skips_one_poll() {
    let h = harness();
    h.backend.respond(methods::ADD_GAME, ok());
    h.backend.push(methods::ADD_GAME_STATUS, Err(RpcError::Transport("timed out".into())));
    h.backend.status(methods::ADD_GAME_STATUS, done());

    assert!(h.manager.add_game(42, "Portal 2").await);

    advance(1100).await;
    assert!(!h.manager.is_idle(TaskCategory::Game));
    assert!(h.surface.alerts().is_empty());

    advance(1000).await;
    assert!(h.manager.is_idle(TaskCategory::Game));
    assert_eq!(h.backend.call_count(methods::ADD_GAME_STATUS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_same_subject_brings_minimized_task_back() {
    let h = harness();
    let modal = ModalId::new(TaskCategory::Game, 42);
    h.backend.respond(methods::ADD_GAME, ok());
    h.backend.status(methods::ADD_GAME_STATUS, downloading(10, 0));

    assert!(h.manager.add_game(42, "Portal 2").await);
    h.manager.handle_action(modal, ModalAction::Hide).await;
    assert!(!h.surface.is_open(modal));

    assert!(h.manager.add_game(42, "Portal 2").await);

    assert_eq!(h.backend.call_count(methods::ADD_GAME), 1);
    assert!(h.surface.is_open(modal));
    assert_eq!(h.manager.visibility_of(TaskCategory::Game, 42), Some(Visibility::Visible));
    assert!(!h.surface.last_dock().unwrap().is_visible());
    assert!(h.manager.is_polling(TaskCategory::Game));
    h.manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_dismissed_modal_still_shows_outcome() {
    let h = harness();
    let modal = ModalId::new(TaskCategory::Fix, 620);
    h.backend.respond(methods::GAME_INSTALL_PATH, json!({ "success": true, "installPath": "C:/Games/Portal 2" }));
    h.backend.respond(methods::APPLY_FIX, ok());
    h.backend.status(methods::APPLY_FIX_STATUS, downloading(1, 1_000_000));

    assert!(h.manager.apply_fix(620, "Portal 2").await);
    h.manager.handle_action(modal, ModalAction::Close).await;
    assert!(!h.surface.is_open(modal));

    // Running updates do not reopen a closed modal
    advance(600).await;
    assert!(!h.surface.is_open(modal));

    h.backend.status(methods::APPLY_FIX_STATUS, done());
    advance(500).await;
    assert!(h.surface.is_open(modal));
    assert!(h.surface.last_instruction(modal).unwrap().terminal);
    assert!(h.manager.is_idle(TaskCategory::Fix));
}

#[tokio::test(start_paused = true)]
async fn test_restart_later_persists_flag_once() {
    let h = harness();
    let modal = ModalId::new(TaskCategory::Game, 42);
    h.backend.respond(methods::SET_RESTART_REQUIRED, ok());

    h.manager.handle_action(modal, ModalAction::RestartLater).await;
    h.manager.handle_action(modal, ModalAction::RestartLater).await;

    assert!(h.manager.restart_banner_raised());
    assert_eq!(h.backend.call_count(methods::SET_RESTART_REQUIRED), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_now_calls_backend() {
    let h = harness();
    h.backend.respond(methods::RESTART_STEAM, ok());

    h.manager
        .handle_action(ModalId::new(TaskCategory::Game, 42), ModalAction::RestartNow)
        .await;
    assert_eq!(h.backend.call_count(methods::RESTART_STEAM), 1);
}

#[tokio::test(start_paused = true)]
async fn test_banner_click_restarts_steam() {
    let h = harness();
    h.backend.respond(methods::SET_RESTART_REQUIRED, ok());
    h.backend.respond(methods::RESTART_STEAM, ok());

    assert!(!h.manager.click_restart_banner().await);
    assert_eq!(h.backend.call_count(methods::RESTART_STEAM), 0);

    let modal = ModalId::new(TaskCategory::Game, 42);
    h.manager.handle_action(modal, ModalAction::RestartLater).await;
    assert!(h.manager.click_restart_banner().await);
    assert_eq!(h.backend.call_count(methods::RESTART_STEAM), 1);
}

#[tokio::test(start_paused = true)]
async fn test_remove_game_failure_alerts() {
    let h = harness();
    h.backend.respond(methods::DELETE_GAME, failure("not installed"));

    assert!(!h.manager.remove_game(42).await);
    assert_eq!(h.surface.alerts(), vec!["Failed to remove game.".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_license_refuses_action() {
    let h = harness();
    h.manager.license().complete(false);
    h.backend.respond(methods::ADD_GAME, ok());

    assert!(!h.manager.add_game(42, "Portal 2").await);
    assert_eq!(h.backend.call_count(methods::ADD_GAME), 0);
    assert_eq!(h.surface.alerts(), vec![ACTIVATION_REQUIRED.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_pending_license_proceeds_after_wait() {
    let h = unlicensed_harness();
    h.backend.respond(methods::ADD_GAME, ok());
    h.backend.status(methods::ADD_GAME_STATUS, downloading(0, 0));

    let started = Instant::now();
    assert!(h.manager.add_game(42, "Portal 2").await);
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(h.backend.call_count(methods::ADD_GAME), 1);
    h.manager.shutdown();
}
