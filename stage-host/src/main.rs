//! # Stage
//!
//! 无头宿主命令行。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p stage-host -- scenes
//! cargo run -p stage-host -- run --target Gameplay
//! cargo run -p stage-host -- settings show
//! cargo run -p stage-host -- settings set music_volume 0.5
//! cargo run -p stage-host -- settings reset --scope sound
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stage_host::{App, AppConfig, HostResult, SETTING_FIELDS, set_field};
use stage_runtime::settings::ResetScope;
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "stage")]
#[command(about = "场景切换与设置生命周期的无头宿主")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（默认：config.json）
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// 日志级别，覆盖配置文件中的设置
    #[arg(short, long, global = true)]
    log_level: Option<Level>,
}

#[derive(Subcommand)]
enum Commands {
    /// 经由加载场景切换到目标场景
    Run {
        /// 目标场景名称
        #[arg(short, long)]
        target: String,

        /// 最多运行的帧数
        #[arg(short, long, default_value = "3600")]
        frames: u64,
    },

    /// 查看或修改设置
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// 列出构建列表
    Scenes,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// 显示当前设置
    Show,

    /// 恢复默认值
    Reset {
        #[arg(short, long, value_enum, default_value = "all")]
        scope: Scope,
    },

    /// 修改一个设置项
    Set {
        /// 设置项名称
        field: String,

        /// 新的值
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Scope {
    All,
    Sound,
    Graphics,
}

fn main() {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config);
    let level = cli
        .log_level
        .or_else(|| config.log_level().ok())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    if let Err(e) = run(cli.command, config) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: AppConfig) -> HostResult<()> {
    match command {
        Commands::Scenes => {
            for (index, scene) in config.scenes.iter().enumerate() {
                let mut marks = Vec::new();
                if scene.name == config.start_scene {
                    marks.push("启动");
                }
                if scene.name == config.loading.scene_name {
                    marks.push("加载");
                }
                println!(
                    "{:>3}  {:<16} {:>5.2}s  {}",
                    index,
                    scene.name,
                    scene.load_seconds,
                    marks.join(" ")
                );
            }
            Ok(())
        }
        Commands::Run { target, frames } => {
            let mut app = App::new(config)?;
            app.play(target.as_str())?;
            let used = app.run_until_idle(frames);
            let active = app.scenes().active_scene_name().unwrap_or_default();
            info!(frames = used, scene = %active, "运行结束");
            println!("✅ 当前场景: {} ({} 帧)", active, used);
            app.shutdown();
            Ok(())
        }
        Commands::Settings { action } => {
            let mut app = App::new(config)?;
            match action {
                SettingsAction::Show => {}
                SettingsAction::Reset { scope } => {
                    let settings = app.settings_mut();
                    match scope {
                        Scope::All => settings.reset_to_defaults(),
                        Scope::Sound => settings.reset_sound_to_defaults(),
                        Scope::Graphics => settings.reset_graphics_to_defaults(),
                    }
                    println!("✅ 已恢复默认值: {:?}", ResetScope::from(scope));
                }
                SettingsAction::Set { field, value } => {
                    set_field(app.settings_mut(), &field, &value).inspect_err(|_| {
                        eprintln!("可用的设置项: {}", SETTING_FIELDS.join(", "));
                    })?;
                    app.settings_mut().save_settings()?;
                }
            }
            print_settings(&app);
            app.shutdown();
            Ok(())
        }
    }
}

impl From<Scope> for ResetScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::All => ResetScope::All,
            Scope::Sound => ResetScope::Sound,
            Scope::Graphics => ResetScope::Graphics,
        }
    }
}

fn print_settings(app: &App) {
    let settings = app.settings();
    match serde_json::to_string_pretty(settings.record()) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("❌ 无法序列化设置: {}", e),
    }
    if let Some(resolution) = settings.current_resolution() {
        println!("分辨率: {}", resolution);
    }
}
