//! DrDebug CLI - コマンドラインインターフェース
//!
//! PinPlay/SDEで計装したアプリケーションを起動し、GDBを接続する

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use drdebug_core::{
    DebugSession, Gdb, ScriptCommand, ScriptDirResolver, SessionOptions,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// 下位のロギングスクリプト
const RECORD_SCRIPT: &str = "record";

/// 下位のリプレイスクリプト
const REPLAY_SCRIPT: &str = "replay";

/// DrDebug - debug applications running under PinPlay/SDE with GDB
#[derive(Parser)]
#[command(name = "drdebug")]
#[command(version)]
#[command(about = "Attach GDB to an application running under PinPlay or SDE", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    action: Action,
}

#[derive(Args)]
struct GlobalArgs {
    /// Print out command line used for running scripts and diagnostic information
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print out the command(s), but do not execute
    #[arg(short = 'd', long = "dry_run", global = true)]
    dry_run: bool,

    /// Pintool to run instead of the default one
    #[arg(long, global = true)]
    pintool: Option<PathBuf>,

    /// Additional knobs passed to Pin/SDE
    #[arg(long = "pin_options", global = true, allow_hyphen_values = true)]
    pin_options: Option<String>,

    /// Attach to the process with this PID
    #[arg(long, global = true)]
    pid: Option<i32>,

    /// Command to debug (binary and arguments)
    #[arg(long = "command", global = true)]
    target_command: Option<String>,

    /// Base name of the output pinball
    #[arg(short = 'l', long = "log_file", global = true)]
    log_file: Option<PathBuf>,

    /// PinPlay kit home directory to use instead of the detected one
    #[arg(long, global = true)]
    pinplayhome: Option<PathBuf>,

    /// SDE kit home directory to use instead of the detected one
    #[arg(long, global = true)]
    sdehome: Option<PathBuf>,

    /// Seconds to wait for the application to reach the GDB attach point
    #[arg(
        long = "handshake_timeout",
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(1..),
        global = true
    )]
    handshake_timeout: u32,

    /// Do not check the GDB version
    #[arg(long = "no_version_check", global = true)]
    no_version_check: bool,
}

#[derive(Subcommand)]
enum Action {
    /// Record a pinball while debugging the application with GDB
    GdbRecord,

    /// Replay a pinball under GDB
    GdbReplay {
        /// Pinball to replay
        pinball: PathBuf,
    },

    /// Record a pinball without GDB
    Record,

    /// Print the pintool help message
    PintoolHelp,
}

impl GlobalArgs {
    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            verbose: self.verbose,
            debug: self.dry_run,
            pintool: self.pintool.clone(),
            pin_options: self.pin_options.clone(),
            pid: self.pid,
            command: self.target_command.clone(),
            log_file: self.log_file.clone(),
            pinplay_home: self.pinplayhome.clone(),
            sde_home: self.sdehome.clone(),
            handshake_timeout: self.handshake_timeout,
            check_version: !self.no_version_check,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let options = cli.global.session_options();
    let resolver = ScriptDirResolver::from_current_exe()?;
    let mut session = DebugSession::new(options, &resolver)?;

    let status = match cli.action {
        Action::GdbRecord => gdb_record(&mut session)?,
        Action::GdbReplay { pinball } => gdb_replay(&mut session, &pinball)?,
        Action::Record => record(&mut session)?,
        Action::PintoolHelp => pintool_help(&mut session)?,
    };

    std::process::exit(status);
}

/// ログ出力を初期化する（RUST_LOGが優先）
fn init_logging(verbose: bool) {
    let default = if verbose {
        "drdebug_cli=debug,drdebug_core=debug,drdebug_target=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// 計装対象のアプリケーションを指定する引数
fn target_args(options: &SessionOptions) -> Result<String> {
    if let Some(pid) = options.pid {
        return Ok(format!(" --pid {}", pid));
    }
    match options.command.as_deref() {
        Some(command) if !command.is_empty() => Ok(format!(" -- {}", command)),
        _ => Err(anyhow::anyhow!("Either --command or --pid must be given")),
    }
}

/// ログファイル指定の引数
fn log_file_arg(options: &SessionOptions) -> String {
    options
        .log_file
        .as_ref()
        .map(|f| format!(" --log_file {}", f.display()))
        .unwrap_or_default()
}

/// GDBを初期化し、バックグラウンドで起動したスクリプトにGDBを接続する
fn attach_gdb(session: &mut DebugSession, script: ScriptCommand) -> Result<i32> {
    debug!("script command: {}", script.command);
    let result = session.run_script_back(&script.command);
    if result != 0 {
        return Ok(result);
    }
    Ok(session.finalize_gdb(&script.script_dir)?)
}

/// gdb-recordコマンドを処理する
fn gdb_record(session: &mut DebugSession) -> Result<i32> {
    if session.options().command.is_none() {
        return Err(anyhow::anyhow!("gdb-record requires --command"));
    }
    let gdb = Gdb::locate()?;
    session.initialize_gdb(&gdb)?;

    let knobs = format!(
        "{}{}",
        session.base_log_options()?,
        session.debugger_pin_knobs()
    );
    let script = session.script_command(RECORD_SCRIPT, &knobs)?;
    let command = script
        .command
        .with_suffix(&log_file_arg(session.options()))
        .with_suffix(&target_args(session.options())?);

    attach_gdb(session, ScriptCommand { command, ..script })
}

/// gdb-replayコマンドを処理する
fn gdb_replay(session: &mut DebugSession, pinball: &std::path::Path) -> Result<i32> {
    if session.options().command.is_none() {
        return Err(anyhow::anyhow!("gdb-replay requires --command"));
    }
    let gdb = Gdb::locate()?;
    session.initialize_gdb(&gdb)?;

    let handshake = session
        .handshake()
        .map(|h| h.path().display().to_string())
        .unwrap_or_default();
    let knobs = format!("{} -gdb:cmd_file {}", session.debugger_pin_knobs(), handshake);
    let script = session.script_command(REPLAY_SCRIPT, &knobs)?;
    let command = script
        .command
        .with_suffix(&format!(" {}", pinball.display()));

    attach_gdb(session, ScriptCommand { command, ..script })
}

/// recordコマンドを処理する（GDBなし）
fn record(session: &mut DebugSession) -> Result<i32> {
    let script = session.script_command(RECORD_SCRIPT, "")?;
    let command = script
        .command
        .with_suffix(&log_file_arg(session.options()))
        .with_suffix(&target_args(session.options())?);

    let result = if session.options().pid.is_some() {
        // アタッチの場合はスクリプトはすぐに戻るので、プロセスの終了を待つ
        let result = session.run_script_back(&command);
        if result == 0 {
            session.finalize_no_gdb();
        }
        result
    } else {
        let result = session.run_script_fore(&command);
        session.finalize_no_gdb();
        result
    };
    Ok(result)
}

/// pintool-helpコマンドを処理する
fn pintool_help(session: &mut DebugSession) -> Result<i32> {
    let script = session.script_command(RECORD_SCRIPT, "")?;
    Ok(session.pintool_help(&script.command))
}
