//! シェルコマンド実行機能

use crate::Result;
use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::Instant;
use tracing::debug;

/// 実行モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 終了まで待機する
    Foreground,
    /// 起動だけ行い、終了を待たない
    ///
    /// 起動したプロセスは回収しないので、終了後もこのプロセスが終わるまでゾンビとして残る。
    Background,
}

/// シェルに渡す完成済みのコマンドライン
///
/// 組み立て後は中身を解釈せず、1つの文字列として `sh -c` に渡します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine(String);

impl CommandLine {
    /// コマンド文字列からコマンドラインを作成する
    pub fn new(line: impl Into<String>) -> Self {
        Self(line.into())
    }

    /// コマンド文字列を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 末尾に文字列を追加した新しいコマンドラインを返す
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{}", self.0, suffix))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 実行時オプション
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// 実行前にコマンドを表示する
    pub print_cmd: bool,
    /// フォアグラウンド実行の所要時間を表示する
    pub print_time: bool,
    /// 子プロセスに追加する環境変数
    pub envs: Vec<(String, String)>,
}

/// コマンド実行のインターフェース
pub trait Executor {
    /// コマンドを実行し、終了ステータスを返す
    ///
    /// バックグラウンド実行では起動に成功した時点で0を返します。
    fn execute(&mut self, command: &CommandLine, mode: RunMode, options: &ExecOptions)
        -> Result<i32>;
}

/// `/bin/sh -c` でコマンドを実行するエグゼキュータ
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: PathBuf,
}

impl ShellExecutor {
    /// 標準のシェルを使うエグゼキュータを作成する
    pub fn new() -> Self {
        Self {
            shell: PathBuf::from("/bin/sh"),
        }
    }

    /// シェルを指定してエグゼキュータを作成する
    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    fn build(&self, command: &CommandLine, options: &ExecOptions) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command.as_str());
        cmd.envs(options.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ShellExecutor {
    fn execute(
        &mut self,
        command: &CommandLine,
        mode: RunMode,
        options: &ExecOptions,
    ) -> Result<i32> {
        if options.print_cmd {
            println!("{}", command);
        }

        let mut cmd = self.build(command, options);
        match mode {
            RunMode::Foreground => {
                let start = Instant::now();
                let status = cmd
                    .status()
                    .map_err(|e| anyhow::anyhow!("Failed to run '{}': {}", command, e))?;
                if options.print_time {
                    println!("Execution time: {:.2?}", start.elapsed());
                }
                Ok(exit_code(status))
            }
            RunMode::Background => {
                // 子プロセスは監視も回収もしない。ハンドルを捨てても実行は継続する
                let child = cmd
                    .spawn()
                    .map_err(|e| anyhow::anyhow!("Failed to start '{}': {}", command, e))?;
                debug!("started background command pid={}: {}", child.id(), command);
                Ok(0)
            }
        }
    }
}

/// 終了ステータスを整数に変換する（シグナル終了は 128 + シグナル番号）
fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreground_returns_exit_code() {
        let mut exec = ShellExecutor::new();
        let opts = ExecOptions::default();
        assert_eq!(
            exec.execute(&CommandLine::new("true"), RunMode::Foreground, &opts)
                .unwrap(),
            0
        );
        assert_eq!(
            exec.execute(&CommandLine::new("exit 3"), RunMode::Foreground, &opts)
                .unwrap(),
            3
        );
    }

    #[test]
    fn test_foreground_with_elapsed_time() {
        let mut exec = ShellExecutor::new();
        let opts = ExecOptions {
            print_cmd: true,
            print_time: true,
            ..Default::default()
        };
        let code = exec
            .execute(&CommandLine::new("exit 4"), RunMode::Foreground, &opts)
            .unwrap();
        assert_eq!(code, 4);

        // バックグラウンドでは所要時間を測らない
        let code = exec
            .execute(&CommandLine::new("true"), RunMode::Background, &opts)
            .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_missing_command_is_nonzero() {
        let mut exec = ShellExecutor::new();
        let code = exec
            .execute(
                &CommandLine::new("/nonexistent/drdebug-missing-binary"),
                RunMode::Foreground,
                &ExecOptions::default(),
            )
            .unwrap();
        assert_ne!(code, 0);
    }

    #[test]
    fn test_envs_are_passed_to_child() {
        let mut exec = ShellExecutor::new();
        let opts = ExecOptions {
            envs: vec![("DRDEBUG_TEST_VAR".to_string(), "42".to_string())],
            ..Default::default()
        };
        let code = exec
            .execute(
                &CommandLine::new("test \"$DRDEBUG_TEST_VAR\" = 42"),
                RunMode::Foreground,
                &opts,
            )
            .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_background_does_not_wait() {
        let mut exec = ShellExecutor::new();
        let start = Instant::now();
        let code = exec
            .execute(
                &CommandLine::new("sleep 5"),
                RunMode::Background,
                &ExecOptions::default(),
            )
            .unwrap();
        assert_eq!(code, 0);
        assert!(start.elapsed().as_secs() < 5);
    }

    #[test]
    fn test_unstartable_shell_is_error() {
        let mut exec = ShellExecutor::with_shell("/nonexistent/sh");
        let result = exec.execute(
            &CommandLine::new("true"),
            RunMode::Foreground,
            &ExecOptions::default(),
        );
        assert!(result.is_err());
    }
}
