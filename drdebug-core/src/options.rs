//! セッションオプション

use crate::handshake::DEFAULT_TIMEOUT_SECS;
use crate::kit::KitType;
use std::path::{Path, PathBuf};

/// コマンドラインで指定されたオプション
///
/// 構築後は読み取り専用で、各コンポーネントには参照で渡します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// 詳細表示
    pub verbose: bool,
    /// ドライラン（コマンドを表示するだけで実行しない）
    pub debug: bool,
    /// 使用するpintool
    pub pintool: Option<PathBuf>,
    /// ユーザー指定のPinオプション
    pub pin_options: Option<String>,
    /// アタッチ対象のPID
    pub pid: Option<i32>,
    /// デバッガに渡すコマンド（通常はアプリケーションのバイナリ）
    pub command: Option<String>,
    /// 出力pinballのファイル名
    pub log_file: Option<PathBuf>,
    /// PinPlayキットのホームディレクトリ指定
    pub pinplay_home: Option<PathBuf>,
    /// SDEキットのホームディレクトリ指定
    pub sde_home: Option<PathBuf>,
    /// ハンドシェイク待ちの秒数
    pub handshake_timeout: u32,
    /// GDBのバージョンを確認する
    pub check_version: bool,
}

impl SessionOptions {
    /// 実行前にコマンドを表示するか
    pub fn print_cmd(&self) -> bool {
        self.verbose || self.debug
    }

    /// キット種別に対応するホームディレクトリ指定
    pub fn kit_home(&self, kind: KitType) -> Option<&Path> {
        match kind {
            KitType::PinPlay => self.pinplay_home.as_deref(),
            KitType::Sde => self.sde_home.as_deref(),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            debug: false,
            pintool: None,
            pin_options: None,
            pid: None,
            command: None,
            log_file: None,
            pinplay_home: None,
            sde_home: None,
            handshake_timeout: DEFAULT_TIMEOUT_SECS,
            check_version: true,
        }
    }
}
