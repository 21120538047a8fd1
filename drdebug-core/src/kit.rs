//! キット種別の判定

use crate::{Result, SessionError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// PinPlayキットでスクリプトが置かれる場所
pub const PINPLAY_SCRIPT_PATH: &str = "extras/pinplay/scripts";

/// SDEキットでスクリプトが置かれる場所
pub const SDE_SCRIPT_PATH: &str = "pinplay-scripts";

/// 計装フレームワークのキット種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KitType {
    /// PinPlayキット
    PinPlay,
    /// SDEキット
    Sde,
}

impl KitType {
    /// 表示用の名前
    pub fn name(&self) -> &'static str {
        match self {
            KitType::PinPlay => "PinPlay",
            KitType::Sde => "SDE",
        }
    }

    /// 下位スクリプト名に付けるプレフィックス
    pub fn script_prefix(&self) -> &'static str {
        match self {
            KitType::PinPlay => "",
            KitType::Sde => "sde_",
        }
    }

    /// キットのホームディレクトリを渡すオプション名
    pub fn home_option(&self) -> &'static str {
        match self {
            KitType::PinPlay => "--pinplayhome",
            KitType::Sde => "--sdehome",
        }
    }

    /// ベースディレクトリからスクリプトディレクトリへの相対パス
    pub fn script_subpath(&self) -> &'static str {
        match self {
            KitType::PinPlay => PINPLAY_SCRIPT_PATH,
            KitType::Sde => SDE_SCRIPT_PATH,
        }
    }

    /// 必ず付けるPin/SDEのオプション
    pub fn framework_flags(&self) -> &'static str {
        match self {
            KitType::PinPlay => "-follow_execv",
            KitType::Sde => "-p -follow_execv",
        }
    }

    /// GDBと一緒に動かす場合のPinノブ
    pub fn debugger_knobs(&self) -> &'static str {
        match self {
            KitType::PinPlay => " -appdebug",
            KitType::Sde => " -p -appdebug",
        }
    }

    /// ロギング開始を制御するノブ
    ///
    /// SDEではGDBと使う場合にpintoolを明示する必要がある。
    pub fn controller_knobs(&self) -> &'static str {
        match self {
            KitType::PinPlay => " -log:controller_default_start 0",
            KitType::Sde => " -t sde-pinplay-driver.so  -controller_default_start 0",
        }
    }
}

/// 判定済みのキット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kit {
    pub kind: KitType,
    pub base_dir: PathBuf,
}

impl Kit {
    /// キットを作成する
    pub fn new(kind: KitType, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            base_dir: base_dir.into(),
        }
    }

    /// キット内のスクリプトディレクトリ
    pub fn script_dir(&self) -> PathBuf {
        self.base_dir.join(self.kind.script_subpath())
    }
}

/// キット種別とベースディレクトリを求めるインターフェース
pub trait KitResolver {
    /// キットを判定する。判定できない場合は致命的エラー
    fn resolve(&self) -> Result<Kit>;
}

/// 判定済みのキットはそのまま自分を返す
impl KitResolver for Kit {
    fn resolve(&self) -> Result<Kit> {
        Ok(self.clone())
    }
}

/// 実行ファイルが置かれたディレクトリからキットを判定する
#[derive(Debug, Clone)]
pub struct ScriptDirResolver {
    script_dir: PathBuf,
}

impl ScriptDirResolver {
    /// スクリプトのディレクトリを指定して作成する
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
        }
    }

    /// 現在の実行ファイルの場所から作成する
    pub fn from_current_exe() -> Result<Self> {
        let exe = std::env::current_exe().map_err(|_| SessionError::UnknownKit {
            dir: PathBuf::from("."),
        })?;
        let dir = exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::new(dir))
    }

    /// 1つのディレクトリがキットのスクリプトディレクトリか調べる
    fn match_dir(dir: &Path) -> Option<Kit> {
        if dir.ends_with(PINPLAY_SCRIPT_PATH) {
            let base = dir.ancestors().nth(3)?;
            return Some(Kit::new(KitType::PinPlay, base));
        }
        if dir.ends_with(SDE_SCRIPT_PATH) {
            let base = dir.parent()?;
            return Some(Kit::new(KitType::Sde, base));
        }
        None
    }
}

impl KitResolver for ScriptDirResolver {
    fn resolve(&self) -> Result<Kit> {
        // bin/ などのサブディレクトリに置かれている場合もあるので祖先も調べる
        let kit = self
            .script_dir
            .ancestors()
            .find_map(Self::match_dir)
            .ok_or_else(|| SessionError::UnknownKit {
                dir: self.script_dir.clone(),
            })?;

        debug!(
            "kit type {} detected at {}",
            kit.kind.name(),
            kit.base_dir.display()
        );
        Ok(kit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_pinplay_kit() {
        let resolver = ScriptDirResolver::new("/opt/kit/extras/pinplay/scripts");
        let kit = resolver.resolve().unwrap();
        assert_eq!(kit.kind, KitType::PinPlay);
        assert_eq!(kit.base_dir, PathBuf::from("/opt/kit"));
        assert_eq!(
            kit.script_dir(),
            PathBuf::from("/opt/kit/extras/pinplay/scripts")
        );
    }

    #[test]
    fn test_resolve_sde_kit() {
        let resolver = ScriptDirResolver::new("/opt/sde/pinplay-scripts");
        let kit = resolver.resolve().unwrap();
        assert_eq!(kit.kind, KitType::Sde);
        assert_eq!(kit.base_dir, PathBuf::from("/opt/sde"));
    }

    #[test]
    fn test_resolve_from_subdirectory() {
        let resolver = ScriptDirResolver::new("/opt/sde/pinplay-scripts/bin");
        let kit = resolver.resolve().unwrap();
        assert_eq!(kit.kind, KitType::Sde);
        assert_eq!(kit.base_dir, PathBuf::from("/opt/sde"));
    }

    #[test]
    fn test_unknown_kit_is_error() {
        let resolver = ScriptDirResolver::new("/usr/local/bin");
        assert!(matches!(
            resolver.resolve(),
            Err(SessionError::UnknownKit { .. })
        ));
    }

    #[test]
    fn test_variant_knobs() {
        assert_eq!(KitType::PinPlay.script_prefix(), "");
        assert_eq!(KitType::Sde.script_prefix(), "sde_");
        assert_eq!(KitType::PinPlay.home_option(), "--pinplayhome");
        assert_eq!(KitType::Sde.home_option(), "--sdehome");
        assert_eq!(KitType::Sde.debugger_knobs(), " -p -appdebug");
    }
}
