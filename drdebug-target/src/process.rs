//! プロセス生存確認機能

use crate::Result;
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

/// PIDの生存確認を行うプローブ
pub trait LivenessProbe {
    /// 指定したPIDのプロセスがまだ存在するかを返す
    fn is_alive(&self, pid: i32) -> bool;
}

/// 監視対象のプロセス
///
/// 自分で起動したプロセスとは限らないため、waitpidではなく
/// シグナル0の送信で存在確認を行います。
pub struct Process {
    pid: Pid,
}

impl Process {
    /// 既存のPIDから監視対象を作成する
    pub fn from_pid(pid: i32) -> Result<Self> {
        // 0以下はプロセスグループへの送信になってしまう
        if pid <= 0 {
            return Err(anyhow::anyhow!("Invalid process id: {}", pid));
        }
        Ok(Self {
            pid: Pid::from_raw(pid),
        })
    }

    /// プロセスIDを取得する
    pub fn pid(&self) -> i32 {
        self.pid.as_raw()
    }

    /// プロセスがまだ存在するか確認する
    ///
    /// 権限がなくシグナルを送れない場合(EPERM)も、プロセス自体は存在するとみなします。
    pub fn is_running(&self) -> Result<bool> {
        match kill(self.pid, None) {
            Ok(()) => Ok(true),
            Err(Errno::EPERM) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to probe process {}: {}",
                self.pid,
                e
            )),
        }
    }
}

/// `kill(pid, 0)` を使う実システム向けのプローブ
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl LivenessProbe for SystemProbe {
    fn is_alive(&self, pid: i32) -> bool {
        Process::from_pid(pid)
            .and_then(|process| process.is_running())
            .unwrap_or(false)
    }
}
