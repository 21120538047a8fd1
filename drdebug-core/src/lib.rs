//! DrDebug セッションのコア機能
//!
//! このクレートは、計装ツール（PinPlay/SDE）配下で動くアプリケーションにGDBを接続するための
//! 中核となるロジックを提供します。キットの判定、下位スクリプトのコマンド組み立て、
//! GDBとのハンドシェイク、コマンドの実行とプロセス終了待ちを統合します。

pub mod clock;
pub mod command;
pub mod errors;
pub mod gdb;
pub mod handshake;
pub mod kit;
pub mod launcher;
pub mod options;
pub mod parse;
pub mod runner;
pub mod session;

pub use clock::{Sleeper, ThreadSleeper};
pub use command::{CommandBuilder, ScriptCommand};
pub use errors::SessionError;
pub use gdb::{Gdb, GdbWarning};
pub use handshake::{HandshakeFile, HandshakeSynchronizer};
pub use kit::{Kit, KitResolver, KitType, ScriptDirResolver};
pub use launcher::DebuggerLauncher;
pub use options::SessionOptions;
pub use runner::SessionRunner;
pub use session::DebugSession;

// 他のクレートから使用するために再エクスポート
pub use drdebug_target::{CommandLine, RunMode};

/// セッション処理の結果型
pub type Result<T> = std::result::Result<T, SessionError>;
