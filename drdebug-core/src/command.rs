//! 下位スクリプトのコマンドライン組み立て

use crate::handshake::HandshakeFile;
use crate::kit::{Kit, KitResolver, KitType};
use crate::options::SessionOptions;
use crate::Result;
use drdebug_target::CommandLine;
use std::path::PathBuf;
use tracing::debug;

/// DrDebugでロギングする際の基本ノブ
pub const DRDEBUG_BASE_LOG_OPTIONS: &str = "-log -log:syminfo -log:pid";

/// 組み立て済みのスクリプト呼び出し
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    /// シェルに渡すコマンドライン
    pub command: CommandLine,
    /// キット内のスクリプトディレクトリ
    pub script_dir: PathBuf,
}

/// 下位スクリプトのコマンドラインを組み立てる
pub struct CommandBuilder<'a> {
    resolver: &'a dyn KitResolver,
}

impl<'a> CommandBuilder<'a> {
    /// キット判定器を指定して作成する
    pub fn new(resolver: &'a dyn KitResolver) -> Self {
        Self { resolver }
    }

    /// スクリプトのコマンドラインを組み立てる
    ///
    /// # Arguments
    /// * `script` - 下位スクリプトのベース名（SDEでは `sde_` が付く）
    /// * `pin_knobs` - pintool以外のPinノブ
    /// * `options` - コマンドラインオプション
    ///
    /// # Returns
    /// 実行するコマンドと、キット内のスクリプトディレクトリ
    pub fn build(
        &self,
        script: &str,
        pin_knobs: &str,
        options: &SessionOptions,
    ) -> Result<ScriptCommand> {
        let kit = self.resolver.resolve()?;
        Ok(build_script_command(&kit, script, pin_knobs, options))
    }
}

/// 判定済みのキットからスクリプトのコマンドラインを組み立てる
pub fn build_script_command(
    kit: &Kit,
    script: &str,
    pin_knobs: &str,
    options: &SessionOptions,
) -> ScriptCommand {
    // ユーザーがホームディレクトリを指定していればそちらを優先する
    let home = options
        .kit_home(kit.kind)
        .unwrap_or(kit.base_dir.as_path());
    let kit_knob = format!(" {} {}", kit.kind.home_option(), home.display());
    debug!("Kit knob actually used:{}", kit_knob);

    let mut cmd = format!("{}{}", kit.kind.script_prefix(), script);

    let mut popts = kit.kind.framework_flags().to_string();
    popts.push_str(pin_knobs);
    if let Some(user_opts) = options.pin_options.as_deref().filter(|o| !o.is_empty()) {
        popts.push(' ');
        popts.push_str(user_opts);
    }
    cmd.push_str(&format!(" --pin_options \"{}\"", popts));

    if let Some(pintool) = &options.pintool {
        cmd.push_str(&format!(" --pintool {}", pintool.display()));
    }
    cmd.push_str(&kit_knob);

    ScriptCommand {
        command: CommandLine::new(cmd),
        script_dir: kit.script_dir(),
    }
}

/// GDBと組み合わせてロギングする際のノブ
pub fn base_log_options(kind: KitType, handshake: &HandshakeFile) -> String {
    format!(
        " {}{} -gdb:cmd_file {}",
        DRDEBUG_BASE_LOG_OPTIONS,
        kind.controller_knobs(),
        handshake.path().display()
    )
}

/// GDBと組み合わせる際に追加するPinノブ
pub fn debugger_pin_knobs(kind: KitType) -> &'static str {
    kind.debugger_knobs()
}

/// pintoolのヘルプを表示するコマンド
pub fn pintool_help_command(command: &CommandLine) -> CommandLine {
    command.with_suffix(" --pintool_help")
}
