//! GDBの検出と環境確認

use crate::parse::{parse_gdb_version, GdbVersion};
use crate::{Result, SessionError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, warn};

/// DrDebugの全機能を使うのに必要なGDBのバージョン
///
/// PinADXが共有ライブラリのロード位置を伝えるリモートコマンドは7.4以降で使える。
pub const GDB_BASE_VERSION: GdbVersion = GdbVersion::new(7, 4);

/// バックグラウンド実行に必要なコア数
pub const MIN_CORES: usize = 2;

const NO_PYTHON_ERROR: &str = "Python scripting is not supported in this copy of GDB";

/// GDBの互換性についての警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GdbWarning {
    /// Pythonサポートがない
    NoPython { path: PathBuf },
    /// バージョンが古い
    OldVersion { version: GdbVersion },
}

impl fmt::Display for GdbWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GdbWarning::NoPython { path } => write!(
                f,
                "WARNING: This version of gdb ({}) does not support Python.\n\
                 As a result, 'pin' commands will not work.  Try 'monitor' versions\n\
                 of the commands instead.",
                path.display()
            ),
            GdbWarning::OldVersion { version } => write!(
                f,
                "WARNING: This version of gdb is: {}  When using versions of gdb < {}\n\
                 the script will run, but with reduced functionality.",
                version, GDB_BASE_VERSION
            ),
        }
    }
}

/// デバッガ（GDB）のバイナリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gdb {
    path: PathBuf,
}

impl Gdb {
    /// PATHからgdbを探す
    pub fn locate() -> Result<Self> {
        let path = which::which("gdb").map_err(|_| SessionError::DebuggerNotFound)?;
        debug!("using gdb at {}", path.display());
        Ok(Self { path })
    }

    /// パスを指定して作成する
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// バイナリのパス
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        Command::new(&self.path)
            .args(args)
            .output()
            .map_err(|source| SessionError::Debugger {
                path: self.path.clone(),
                source,
            })
    }

    /// Pythonスクリプトをサポートしているか
    pub fn has_python_support(&self) -> Result<bool> {
        let out = self.output(&["--batch", "-ex", "python print(\"hello\")"])?;
        Ok(!String::from_utf8_lossy(&out.stderr).contains(NO_PYTHON_ERROR))
    }

    /// バージョンを取得する。解析できなければ None
    pub fn version(&self) -> Result<Option<GdbVersion>> {
        let out = self.output(&["--version"])?;
        match parse_gdb_version(&String::from_utf8_lossy(&out.stdout)) {
            Ok(version) => Ok(Some(version)),
            Err(e) => {
                warn!("could not determine gdb version: {}", e);
                Ok(None)
            }
        }
    }

    /// DrDebugで使えるか確認する
    ///
    /// 問題があっても実行は続けられるので、警告の一覧を返す。
    pub fn check(&self, check_version: bool) -> Result<Vec<GdbWarning>> {
        let mut warnings = Vec::new();
        if !self.has_python_support()? {
            warnings.push(GdbWarning::NoPython {
                path: self.path.clone(),
            });
        }

        if check_version {
            if let Some(version) = self.version()? {
                if version < GDB_BASE_VERSION {
                    warnings.push(GdbWarning::OldVersion { version });
                }
            }
        }
        Ok(warnings)
    }
}

/// ホストのコア数を確認する
pub fn ensure_host_cores() -> Result<usize> {
    let found = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    ensure_cores(found)
}

/// コア数が足りているか確認する
pub fn ensure_cores(found: usize) -> Result<usize> {
    if found < MIN_CORES {
        return Err(SessionError::InsufficientCores { found });
    }
    Ok(found)
}
