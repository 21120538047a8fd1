//! デバッガの起動

use crate::handshake::HandshakeFile;
use crate::options::SessionOptions;
use crate::runner::SessionRunner;
use drdebug_target::{CommandLine, RunMode};
use std::path::{Path, PathBuf};
use tracing::debug;

/// ブートストラップスクリプトの場所をGDBに伝える環境変数
pub const SCRIPT_PATH_ENV: &str = "PYTHONPATH";

/// ハンドシェイク完了後にデバッガを起動する
#[derive(Debug, Clone)]
pub struct DebuggerLauncher {
    debugger: PathBuf,
}

impl DebuggerLauncher {
    /// デバッガのパスを指定して作成する
    pub fn new(debugger: impl Into<PathBuf>) -> Self {
        Self {
            debugger: debugger.into(),
        }
    }

    /// デバッガの起動コマンドを作る
    pub fn command_line(&self, handshake: &HandshakeFile, options: &SessionOptions) -> CommandLine {
        let mut cmd = format!(
            "{} --command={}",
            self.debugger.display(),
            handshake.path().display()
        );
        if let Some(command) = options.command.as_deref().filter(|c| !c.is_empty()) {
            cmd.push(' ');
            cmd.push_str(command);
        }
        CommandLine::new(cmd)
    }

    /// デバッガを起動し、終了まで待つ
    ///
    /// ハンドシェイクが完了し、ブートストラップコマンドが追記された後に呼ぶこと。
    pub fn launch(
        &self,
        runner: &mut SessionRunner,
        handshake: &HandshakeFile,
        script_dir: &Path,
        options: &SessionOptions,
    ) -> i32 {
        let cmd = self.command_line(handshake, options);
        debug!("{}", cmd);
        let envs = vec![(
            SCRIPT_PATH_ENV.to_string(),
            script_dir.display().to_string(),
        )];
        runner.run_with_env(&cmd, options, RunMode::Foreground, envs)
    }
}
