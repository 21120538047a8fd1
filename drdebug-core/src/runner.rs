//! コマンドの実行とプロセス終了待ち

use crate::clock::Sleeper;
use crate::options::SessionOptions;
use drdebug_target::{CommandLine, ExecOptions, Executor, LivenessProbe, RunMode};
use std::io::Write as _;
use std::time::Duration;
use tracing::{debug, warn};

/// PIDの生存確認の間隔
pub const PID_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// コマンドを起動できなかった場合に返すステータス
pub const LAUNCH_FAILURE_STATUS: i32 = 127;

/// セッション中のコマンド実行を担う
pub struct SessionRunner {
    executor: Box<dyn Executor>,
    probe: Box<dyn LivenessProbe>,
}

impl SessionRunner {
    /// エグゼキュータと生存確認プローブを指定して作成する
    pub fn new(executor: Box<dyn Executor>, probe: Box<dyn LivenessProbe>) -> Self {
        Self { executor, probe }
    }

    /// コマンドを実行する
    ///
    /// フォアグラウンドでは終了ステータス、バックグラウンドでは起動の成否を返す。
    /// ドライランでは何も実行せず0を返す。
    pub fn run(&mut self, command: &CommandLine, options: &SessionOptions, mode: RunMode) -> i32 {
        self.run_with_env(command, options, mode, Vec::new())
    }

    /// 環境変数を追加してコマンドを実行する
    pub fn run_with_env(
        &mut self,
        command: &CommandLine,
        options: &SessionOptions,
        mode: RunMode,
        envs: Vec<(String, String)>,
    ) -> i32 {
        if options.debug {
            // ドライラン: 表示だけ
            println!("{}", command);
            return 0;
        }

        let exec_options = ExecOptions {
            print_cmd: options.print_cmd(),
            print_time: false,
            envs,
        };
        debug!("running ({:?}): {}", mode, command);
        match self.executor.execute(command, mode, &exec_options) {
            Ok(status) => status,
            Err(e) => {
                warn!("launch failed: {:#}", e);
                eprintln!("{}", e);
                LAUNCH_FAILURE_STATUS
            }
        }
    }

    /// プロセスが終了するまで待つ
    ///
    /// 上限はなく、プロセスが存在しなくなるまで `interval` ごとに確認する。
    pub fn wait_for_exit(
        &self,
        pid: i32,
        sleeper: &mut dyn Sleeper,
        interval: Duration,
        verbose: bool,
    ) {
        while self.probe.is_alive(pid) {
            if verbose {
                print!(".");
                let _ = std::io::stdout().flush();
            }
            sleeper.sleep(interval);
        }
    }
}
