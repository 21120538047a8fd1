//! GDBとのハンドシェイク
//!
//! Pin側がGDBの接続先（`target remote ...`）をコマンドファイルに書き込むのを待ち、
//! 書き込まれたらGDBの起動に必要なコマンドを同じファイルに追記します。
//! ファイルにはロックをかけない。Pin側は接続先を書いた後は書き込まない前提です。

use crate::clock::Sleeper;
use crate::{Result, SessionError};
use nix::unistd::{getuid, User};
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// ハンドシェイクファイル名のプレフィックス
pub const HANDSHAKE_FILE_PREFIX: &str = ".gdb.cmd.";

/// 接続準備ができたことを示す文字列
pub const SENTINEL: &str = "target remote";

/// センチネルを待つ既定の秒数
pub const DEFAULT_TIMEOUT_SECS: u32 = 30;

/// ポーリング間隔
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// GDBのリモートタイムアウト設定
pub const REMOTE_TIMEOUT_DIRECTIVE: &str = "set remotetimeout 30000";

/// GDBに読み込ませるPythonスクリプト
pub const BOOTSTRAP_SCRIPT: &str = "pin.py";

/// ハンドシェイクファイル
///
/// ファイル名はユーザー名から決まるため、異なるユーザー同士は衝突しないが、
/// 同じユーザーが同じディレクトリで2つのセッションを同時に動かすと同じファイルを共有する。
/// セッション終了後も削除しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeFile {
    path: PathBuf,
}

impl HandshakeFile {
    /// ユーザー名からファイル名を作る
    pub fn file_name(user: &str) -> String {
        format!("{}{}", HANDSHAKE_FILE_PREFIX, user)
    }

    /// 指定ディレクトリにファイルを作成する（既にあれば空にする）
    pub fn create(dir: &Path, user: &str) -> Result<Self> {
        let path = dir.join(Self::file_name(user));
        File::create(&path).map_err(|source| SessionError::HandshakeFile {
            path: path.clone(),
            source,
        })?;
        debug!("created gdb command file {}", path.display());
        Ok(Self { path })
    }

    /// カレントディレクトリに現在のユーザー用のファイルを作成する
    pub fn create_in_current_dir() -> Result<Self> {
        Self::create(Path::new(""), &current_user())
    }

    /// ファイルのパス
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ファイル全体をバイト列で読み込む
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| self.io_error(e))
    }

    /// ファイル全体を読み込む（UTF-8でないバイトは置き換える）
    pub fn read_to_string(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.read_bytes()?).into_owned())
    }

    /// 文字列を含むか確認する
    ///
    /// Pin側が書く内容はUTF-8とは限らないため、バイト列のまま探す。
    pub fn contains(&self, needle: &str) -> Result<bool> {
        let needle = needle.as_bytes();
        if needle.is_empty() {
            return Ok(true);
        }
        Ok(self
            .read_bytes()?
            .windows(needle.len())
            .any(|window| window == needle))
    }

    /// 末尾に追記する
    ///
    /// 既存の内容が改行で終わっていない場合は改行を補ってから書く。
    pub fn append(&self, text: &str) -> Result<()> {
        let needs_newline = {
            let current = self.read_bytes()?;
            !current.is_empty() && !current.ends_with(b"\n")
        };

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        if needs_newline {
            file.write_all(b"\n").map_err(|e| self.io_error(e))?;
        }
        file.write_all(text.as_bytes())
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::HandshakeFile {
            path: self.path.clone(),
            source,
        }
    }
}

/// 現在のユーザー名を取得する
///
/// 環境変数 LOGNAME, USER, LNAME, USERNAME の順に調べ、
/// どれもなければパスワードデータベースを引く。
pub fn current_user() -> String {
    for var in ["LOGNAME", "USER", "LNAME", "USERNAME"] {
        if let Ok(name) = std::env::var(var) {
            if !name.is_empty() {
                return name;
            }
        }
    }

    let uid = getuid();
    match User::from_uid(uid) {
        Ok(Some(user)) => user.name,
        _ => uid.to_string(),
    }
}

/// センチネルの出現を待ち、GDB用のコマンドを追記する
#[derive(Debug, Clone)]
pub struct HandshakeSynchronizer {
    sentinel: String,
    timeout_secs: u32,
    poll_interval: Duration,
}

impl HandshakeSynchronizer {
    /// 制限時間（秒）を指定して作成する
    pub fn new(timeout_secs: u32) -> Self {
        Self {
            sentinel: SENTINEL.to_string(),
            timeout_secs,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// 待つ文字列を変更する
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// 待つ文字列
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// GDBの接続先が書き込まれるまで待つ
    ///
    /// ファイル全体を読んでセンチネルを探し、なければ1秒待って再試行する。
    /// `timeout_secs` 回読んでも見つからなければ `HandshakeTimeout` を返す。
    /// 最初の読み込みで見つかった場合は待機しない。
    pub fn wait_for_attach_point(
        &self,
        file: &HandshakeFile,
        sleeper: &mut dyn Sleeper,
    ) -> Result<()> {
        for attempt in 1..=self.timeout_secs {
            if file.contains(&self.sentinel)? {
                debug!("found \"{}\" after {} read(s)", self.sentinel, attempt);
                return Ok(());
            }
            sleeper.sleep(self.poll_interval);
            debug!("Waiting for \"{}\"", self.sentinel);
        }

        Err(SessionError::HandshakeTimeout {
            sentinel: self.sentinel.clone(),
            path: file.path().to_path_buf(),
            attempts: self.timeout_secs,
        })
    }

    /// リモートタイムアウトの設定とブートストラップスクリプトの読み込みを追記する
    ///
    /// # Returns
    /// 読み込ませるブートストラップスクリプトのパス
    pub fn append_bootstrap_commands(
        &self,
        file: &HandshakeFile,
        script_dir: &Path,
    ) -> Result<PathBuf> {
        let bootstrap = script_dir.join(BOOTSTRAP_SCRIPT);
        file.append(&format!(
            "{}\nsource {}\n",
            REMOTE_TIMEOUT_DIRECTIVE,
            bootstrap.display()
        ))?;
        Ok(bootstrap)
    }
}

impl Default for HandshakeSynchronizer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}
