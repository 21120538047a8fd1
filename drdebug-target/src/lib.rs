//! DrDebug ターゲットプロセス制御
//!
//! このクレートは、計装ツール配下で動くプロセスを扱うための低レベル機能を提供します。
//! シェルコマンドの実行（フォアグラウンド／バックグラウンド）と、PIDによるプロセスの生存確認を行います。

pub mod process;
pub mod shell;

pub use process::{LivenessProbe, Process, SystemProbe};
pub use shell::{CommandLine, ExecOptions, Executor, RunMode, ShellExecutor};

/// ターゲット制御の結果型
pub type Result<T> = anyhow::Result<T>;
