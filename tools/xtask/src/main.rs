//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 stage-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `settings-check`: 检查设置文件（键名、值类型、取值范围）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use stage_runtime::settings::{SettingsRecord, StoreSnapshot, keys};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    match cmd!(sh, "cargo llvm-cov --version").quiet().ignore_stdout().run() {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());
    let sh = Shell::new()?;

    match sub.as_str() {
        "check-all" => {
            cmd!(sh, "cargo fmt --all -- --check").run()?;
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;
            cmd!(sh, "cargo test --workspace").run()?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available(&sh)?;
            cmd!(sh, "cargo llvm-cov -p stage-runtime --all-features --html").run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available(&sh)?;

            // 排除 xtask，以免稀释信号
            cmd!(
                sh,
                "cargo llvm-cov --workspace --exclude xtask --all-features --html"
            )
            .run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "settings-check" => {
            let path = args.next();
            settings_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all        运行 fmt、clippy、test 门禁检查
  cov-runtime      运行 stage-runtime 覆盖率报告
  cov-workspace    运行 workspace 覆盖率报告
  settings-check   检查设置文件

SETTINGS-CHECK:
  cargo xtask settings-check [path]

  不带参数：检查 saves/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - JSON 格式与值类型
    - 未知的键名
    - 超出范围的值（读取时会被钳制）
"#
    );
}

//=============================================================================
// settings-check 命令实现
//=============================================================================

const DEFAULT_SAVES_DIR: &str = "saves";

/// 单个文件的检查结果
#[derive(Default)]
struct FileReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn settings_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(DEFAULT_SAVES_DIR));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定设置文件路径",
            root.display()
        );
    }

    let files = collect_settings_files(&root);
    if files.is_empty() {
        eprintln!("未找到设置文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个设置文件...\n", files.len());

    let mut error_count = 0;
    let mut warn_count = 0;
    for file in &files {
        let report = check_settings_file(file);
        for e in &report.errors {
            eprintln!("[ERROR] {}: {}", file.display(), e);
        }
        for w in &report.warnings {
            eprintln!("[WARN] {}: {}", file.display(), w);
        }
        error_count += report.errors.len();
        warn_count += report.warnings.len();
    }

    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个文件", files.len());
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
        anyhow::bail!("设置检查发现错误");
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
    Ok(())
}

fn collect_settings_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

fn check_settings_file(file: &Path) -> FileReport {
    let mut report = FileReport::default();

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("无法读取文件 - {}", e));
            return report;
        }
    };

    match parse_snapshot(&content) {
        Ok(snapshot) => check_snapshot(&snapshot, &mut report),
        Err(e) => report.errors.push(e.to_string()),
    }
    report
}

/// 接受宿主的设置文件（`{ saved_at, values }`）或裸键值表
fn parse_snapshot(content: &str) -> anyhow::Result<StoreSnapshot> {
    let mut value: serde_json::Value = serde_json::from_str(content)?;
    if let Some(values) = value.get_mut("values") {
        value = values.take();
    }
    Ok(serde_json::from_value(value)?)
}

fn check_snapshot(snapshot: &StoreSnapshot, report: &mut FileReport) {
    for (key, _) in snapshot.iter() {
        if !keys::ALL.contains(&key) {
            report.warnings.push(format!("未知的键: {}", key));
        }
    }

    // 阴影质量在读取时按索引钳制，这里检查原始值
    if let Some(index) = snapshot.get_i32(keys::SHADOW_QUALITY)
        && !(0..=4).contains(&index)
    {
        report.warnings.push(format!(
            "{} = {} 超出范围 0 - 4（读取时会被钳制）",
            keys::SHADOW_QUALITY,
            index
        ));
    }

    let record = SettingsRecord::from_snapshot(snapshot, &SettingsRecord::default());
    for e in record.problems() {
        report.warnings.push(format!("{}（读取时会被钳制）", e));
    }
}
