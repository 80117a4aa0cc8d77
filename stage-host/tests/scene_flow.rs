//! 宿主的端到端流程：加载界面切换场景、设置持久化

use stage_host::{App, AppConfig, HostError, LoadingPhase, set_field};
use stage_runtime::scene::LoadPhase;
use tempfile::TempDir;

fn config(dir: &TempDir) -> AppConfig {
    AppConfig {
        settings_path: dir.path().join("saves").join("settings.json"),
        ..AppConfig::default()
    }
}

#[test]
fn test_play_through_loading_scene() {
    let dir = TempDir::new().unwrap();
    let mut app = App::new(config(&dir)).unwrap();
    assert_eq!(app.scenes().active_scene_name().as_deref(), Some("MainMenu"));

    app.play("Gameplay").unwrap();
    assert_eq!(app.scenes().active_scene_name().as_deref(), Some("Loading"));
    assert!(!app.scenes().is_scene_loaded("MainMenu"));
    assert!(app.loading().is_active());

    let frames = app.run_until_idle(1000);
    assert!(frames < 1000);

    assert_eq!(app.scenes().active_scene_name().as_deref(), Some("Gameplay"));
    assert!(!app.scenes().is_scene_loaded("Loading"));
    assert_eq!(app.scenes().phase(), LoadPhase::Idle);
    assert_eq!(app.loading().phase(), LoadingPhase::Done);
    // 加载界面至少显示了配置的最短时间
    assert!(app.loading().elapsed() >= app.config().loading.minimum_display_time);
}

#[test]
fn test_second_play_is_rejected_while_loading() {
    let dir = TempDir::new().unwrap();
    let mut app = App::new(config(&dir)).unwrap();
    app.play("Gameplay").unwrap();

    let err = app.play("MainMenu").unwrap_err();
    assert!(matches!(err, HostError::Scene(_)));
}

#[test]
fn test_settings_survive_restart() {
    let dir = TempDir::new().unwrap();

    let mut app = App::new(config(&dir)).unwrap();
    set_field(app.settings_mut(), "master_volume", "0.3").unwrap();
    set_field(app.settings_mut(), "shadow_quality", "high").unwrap();
    assert!(app.settings().is_dirty());
    app.shutdown();
    drop(app);

    assert!(dir.path().join("saves").join("settings.json").exists());

    let app = App::new(config(&dir)).unwrap();
    assert_eq!(app.settings().master_volume(), 0.3);
    assert_eq!(
        app.environment().applied().master_volume,
        Some(0.3),
        "启动时应把已保存的主音量推送到运行环境"
    );
    assert_eq!(
        app.environment().applied().shadows.map(|s| s.distance),
        Some(80.0)
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        start_scene: "Nowhere".to_string(),
        ..config(&dir)
    };
    assert!(matches!(App::new(config), Err(HostError::Config(_))));
}
