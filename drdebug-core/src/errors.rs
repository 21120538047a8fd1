//! セッションのエラー定義

use std::path::PathBuf;
use thiserror::Error;

/// セッション処理で発生するエラー
///
/// どれも致命的なエラーで、CLIはメッセージを表示して終了します。
#[derive(Debug, Error)]
pub enum SessionError {
    /// スクリプトの場所からキットの種類を判定できない
    #[error("Unable to determine the kit type from script location: {}", .dir.display())]
    UnknownKit { dir: PathBuf },

    /// ハンドシェイクファイルの作成・読み書きに失敗した
    #[error("Unable to access gdb command file {}: {source}", .path.display())]
    HandshakeFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// 制限時間内にセンチネル文字列が現れなかった
    #[error("Unable to find GDB string '{sentinel}' in file {} after {attempts} attempts", .path.display())]
    HandshakeTimeout {
        sentinel: String,
        path: PathBuf,
        attempts: u32,
    },

    /// PATH上にデバッガが見つからない
    #[error("gdb not found in PATH")]
    DebuggerNotFound,

    /// デバッガの起動・問い合わせに失敗した
    #[error("Unable to run debugger {}: {source}", .path.display())]
    Debugger {
        path: PathBuf,
        source: std::io::Error,
    },

    /// バックグラウンド実行に必要なコア数が足りない
    #[error(
        "Unable to use GDB version of DrDebug scripts on systems with only {found} core(s). \
         If running on a VM with only one core, please reconfigure to provide at least 2 cores."
    )]
    InsufficientCores { found: usize },

    /// デバッガの初期化前にデバッガを必要とする処理が呼ばれた
    #[error("Debugger session is not initialized")]
    NotInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_sentinel_and_file() {
        let err = SessionError::HandshakeTimeout {
            sentinel: "target remote".to_string(),
            path: PathBuf::from(".gdb.cmd.alice"),
            attempts: 30,
        };
        let msg = err.to_string();
        assert!(msg.contains("'target remote'"));
        assert!(msg.contains(".gdb.cmd.alice"));
    }
}
