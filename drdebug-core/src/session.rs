//! デバッグセッションのメインロジック

use crate::clock::{Sleeper, ThreadSleeper};
use crate::command::{self, CommandBuilder, ScriptCommand};
use crate::gdb::{ensure_host_cores, Gdb};
use crate::handshake::{HandshakeFile, HandshakeSynchronizer};
use crate::kit::{Kit, KitResolver};
use crate::launcher::DebuggerLauncher;
use crate::options::SessionOptions;
use crate::runner::{SessionRunner, PID_POLL_INTERVAL};
use crate::{Result, SessionError};
use drdebug_target::{CommandLine, Executor, LivenessProbe, RunMode, ShellExecutor, SystemProbe};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// ハンドシェイク前後に待つ時間
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// 既定の出力pinball名
pub const DEFAULT_PINBALL: &str = "pinball/log";

/// デバッグセッション
///
/// キットの判定結果とデバッガの情報を保持し、計装対象の起動から
/// GDBの起動までを順番に実行します。
pub struct DebugSession {
    /// コマンドラインオプション
    options: SessionOptions,
    /// 判定済みのキット
    kit: Kit,
    /// コマンド実行
    runner: SessionRunner,
    /// ポーリングの待機
    sleeper: Box<dyn Sleeper>,
    /// GDBとのハンドシェイクファイル
    handshake: Option<HandshakeFile>,
    /// デバッガ起動
    launcher: Option<DebuggerLauncher>,
}

impl DebugSession {
    /// キットを判定してセッションを作成する
    pub fn new(options: SessionOptions, resolver: &dyn KitResolver) -> Result<Self> {
        Ok(Self::with_parts(
            options,
            resolver.resolve()?,
            Box::new(ShellExecutor::new()),
            Box::new(SystemProbe),
            Box::new(ThreadSleeper),
        ))
    }

    /// 各部品を指定してセッションを作成する
    pub fn with_parts(
        options: SessionOptions,
        kit: Kit,
        executor: Box<dyn Executor>,
        probe: Box<dyn LivenessProbe>,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        Self {
            options,
            kit,
            runner: SessionRunner::new(executor, probe),
            sleeper,
            handshake: None,
            launcher: None,
        }
    }

    /// オプションを取得する
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// キットを取得する
    pub fn kit(&self) -> &Kit {
        &self.kit
    }

    /// ハンドシェイクファイルを取得する
    pub fn handshake(&self) -> Option<&HandshakeFile> {
        self.handshake.as_ref()
    }

    /// GDBを使えるように初期化する
    ///
    /// GDBの互換性を確認し（問題は警告のみ）、カレントディレクトリに
    /// ハンドシェイクファイルを作成し、コア数を確認する。
    pub fn initialize_gdb(&mut self, gdb: &Gdb) -> Result<()> {
        for warning in gdb.check(self.options.check_version)? {
            println!("\n{}\n", warning);
        }
        self.prepare_debugger(gdb.path(), HandshakeFile::create_in_current_dir()?);
        ensure_host_cores()?;
        Ok(())
    }

    /// デバッガのパスとハンドシェイクファイルを設定する
    pub fn prepare_debugger(&mut self, debugger: &Path, handshake: HandshakeFile) {
        self.launcher = Some(DebuggerLauncher::new(debugger));
        self.handshake = Some(handshake);
    }

    fn require_handshake(&self) -> Result<&HandshakeFile> {
        self.handshake.as_ref().ok_or(SessionError::NotInitialized)
    }

    /// 下位スクリプトのコマンドラインを組み立てる
    pub fn script_command(&self, script: &str, pin_knobs: &str) -> Result<ScriptCommand> {
        CommandBuilder::new(&self.kit).build(script, pin_knobs, &self.options)
    }

    /// GDBと組み合わせてロギングする際のノブ
    pub fn base_log_options(&self) -> Result<String> {
        Ok(command::base_log_options(
            self.kit.kind,
            self.require_handshake()?,
        ))
    }

    /// GDBと組み合わせる際に追加するPinノブ
    pub fn debugger_pin_knobs(&self) -> &'static str {
        command::debugger_pin_knobs(self.kit.kind)
    }

    /// スクリプトをフォアグラウンドで実行する
    pub fn run_script_fore(&mut self, command: &CommandLine) -> i32 {
        self.runner.run(command, &self.options, RunMode::Foreground)
    }

    /// スクリプトをバックグラウンドで起動する
    ///
    /// 戻り値は起動の成否で、スクリプトの実行結果ではない。
    pub fn run_script_back(&mut self, command: &CommandLine) -> i32 {
        self.runner.run(command, &self.options, RunMode::Background)
    }

    /// pintoolのヘルプを表示する
    pub fn pintool_help(&mut self, command: &CommandLine) -> i32 {
        let help = command::pintool_help_command(command);
        self.runner.run(&help, &self.options, RunMode::Foreground)
    }

    /// GDBを使う場合の最終処理
    ///
    /// ハンドシェイクファイルに `target remote` が書き込まれるのを待ち、
    /// GDB用のコマンドを追記してからGDBを起動する。
    ///
    /// # Returns
    /// GDBの終了ステータス
    pub fn finalize_gdb(&mut self, script_dir: &Path) -> Result<i32> {
        let handshake = self.handshake.as_ref().ok_or(SessionError::NotInitialized)?;
        let launcher = self.launcher.as_ref().ok_or(SessionError::NotInitialized)?;

        if self.options.debug {
            // ドライランでは計装対象を起動していないので待たない
            info!("dry run: not waiting for {}", handshake.path().display());
        } else {
            let sync = HandshakeSynchronizer::new(self.options.handshake_timeout);
            sync.wait_for_attach_point(handshake, self.sleeper.as_mut())?;
            self.sleeper.sleep(SETTLE_DELAY);

            if self.options.verbose {
                println!("Target cmd:  {}", handshake.read_to_string()?);
            }

            sync.append_bootstrap_commands(handshake, script_dir)?;
            self.sleeper.sleep(SETTLE_DELAY);
        }

        Ok(launcher.launch(&mut self.runner, handshake, script_dir, &self.options))
    }

    /// GDBを使わない場合の最終処理
    ///
    /// PIDが指定されていればそのプロセスが終了するまで待つ。
    pub fn finalize_no_gdb(&mut self) {
        if let Some(pid) = self.options.pid {
            println!("Waiting for process to exit, PID: {}", pid);
            self.runner.wait_for_exit(
                pid,
                self.sleeper.as_mut(),
                PID_POLL_INTERVAL,
                self.options.verbose,
            );
            if self.options.verbose {
                println!();
            }
            println!("Process has exited");
        }

        if self.options.verbose {
            match &self.options.log_file {
                Some(log_file) => println!("Output pinball: {}", log_file.display()),
                None => println!("Output pinball: default file name ({})", DEFAULT_PINBALL),
            }
        }
    }
}
