//! セッション全体の流れのテスト

use drdebug_core::command::base_log_options;
use drdebug_core::{
    CommandLine, DebugSession, HandshakeFile, Kit, KitType, RunMode, SessionError,
    SessionOptions, Sleeper,
};
use drdebug_target::{ExecOptions, Executor, LivenessProbe};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Call {
    command: String,
    mode: RunMode,
    envs: Vec<(String, String)>,
}

/// バックグラウンドで起動されたらPinの代わりに接続先を書き込む
struct FakePin {
    handshake: Option<PathBuf>,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl Executor for FakePin {
    fn execute(
        &mut self,
        command: &CommandLine,
        mode: RunMode,
        options: &ExecOptions,
    ) -> drdebug_target::Result<i32> {
        if mode == RunMode::Background {
            if let Some(path) = &self.handshake {
                std::fs::write(path, "target remote :1234\n")?;
            }
        }
        self.calls.borrow_mut().push(Call {
            command: command.to_string(),
            mode,
            envs: options.envs.clone(),
        });
        Ok(0)
    }
}

struct AliveForever;

impl LivenessProbe for AliveForever {
    fn is_alive(&self, _pid: i32) -> bool {
        true
    }
}

#[derive(Clone, Default)]
struct SharedSleeper {
    calls: Rc<RefCell<Vec<Duration>>>,
}

impl Sleeper for SharedSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.calls.borrow_mut().push(duration);
    }
}

fn setup(
    dir: &Path,
    writes_sentinel: bool,
    options: SessionOptions,
) -> (DebugSession, Rc<RefCell<Vec<Call>>>, SharedSleeper) {
    let handshake = HandshakeFile::create(dir, "tester").unwrap();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sleeper = SharedSleeper::default();
    let pin = FakePin {
        handshake: writes_sentinel.then(|| handshake.path().to_path_buf()),
        calls: calls.clone(),
    };

    let mut session = DebugSession::with_parts(
        options,
        Kit::new(KitType::PinPlay, "/opt/kit"),
        Box::new(pin),
        Box::new(AliveForever),
        Box::new(sleeper.clone()),
    );
    session.prepare_debugger(Path::new("/usr/bin/gdb"), handshake);
    (session, calls, sleeper)
}

#[test]
fn test_gdb_record_flow() {
    let dir = tempfile::tempdir().unwrap();
    let options = SessionOptions {
        command: Some("./app".to_string()),
        ..Default::default()
    };
    let (mut session, calls, sleeper) = setup(dir.path(), true, options);

    let knobs = format!(
        "{}{}",
        session.base_log_options().unwrap(),
        session.debugger_pin_knobs()
    );
    let script = session.script_command("record", &knobs).unwrap();
    assert!(script
        .command
        .as_str()
        .starts_with("record --pin_options \"-follow_execv -log -log:syminfo -log:pid"));
    assert!(script.command.as_str().contains("-gdb:cmd_file"));
    assert!(script.command.as_str().contains(" -appdebug\""));
    assert!(script.command.as_str().ends_with("--pinplayhome /opt/kit"));

    assert_eq!(session.run_script_back(&script.command), 0);
    let status = session.finalize_gdb(&script.script_dir).unwrap();
    assert_eq!(status, 0);

    let calls = calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].mode, RunMode::Background);

    let gdb = &calls[1];
    assert_eq!(gdb.mode, RunMode::Foreground);
    let handshake = session.handshake().unwrap();
    assert_eq!(
        gdb.command,
        format!("/usr/bin/gdb --command={} ./app", handshake.path().display())
    );
    assert_eq!(
        gdb.envs,
        vec![(
            "PYTHONPATH".to_string(),
            "/opt/kit/extras/pinplay/scripts".to_string()
        )]
    );

    assert_eq!(
        handshake.read_to_string().unwrap(),
        "target remote :1234\n\
         set remotetimeout 30000\n\
         source /opt/kit/extras/pinplay/scripts/pin.py\n"
    );

    // センチネルは最初の読み込みで見つかるので、待機は前後の2回だけ
    assert_eq!(sleeper.calls.borrow().len(), 2);
}

#[test]
fn test_handshake_timeout_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let options = SessionOptions {
        handshake_timeout: 3,
        ..Default::default()
    };
    let (mut session, calls, sleeper) = setup(dir.path(), false, options);

    let script = session.script_command("record", "").unwrap();
    session.run_script_back(&script.command);
    let result = session.finalize_gdb(&script.script_dir);

    match result {
        Err(SessionError::HandshakeTimeout { attempts, path, .. }) => {
            assert_eq!(attempts, 3);
            assert_eq!(path, session.handshake().unwrap().path());
        }
        other => panic!("expected timeout, got {:?}", other.map(|_| ())),
    }
    assert_eq!(*sleeper.calls.borrow(), vec![Duration::from_secs(1); 3]);
    // GDBは起動されない
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(session.handshake().unwrap().read_to_string().unwrap(), "");
}

#[test]
fn test_base_log_options_per_kit() {
    let dir = tempfile::tempdir().unwrap();
    let handshake = HandshakeFile::create(dir.path(), "tester").unwrap();

    let pinplay = base_log_options(KitType::PinPlay, &handshake);
    assert!(pinplay.contains("-log:controller_default_start 0"));
    assert!(pinplay.ends_with(&format!("-gdb:cmd_file {}", handshake.path().display())));

    let sde = base_log_options(KitType::Sde, &handshake);
    assert!(sde.contains("-t sde-pinplay-driver.so"));
}
