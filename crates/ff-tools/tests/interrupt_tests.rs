//! Ctrl-C at the terminal must not reach a tool that is still writing evidence.
#![cfg(unix)]

use std::thread;
use std::time::Duration;

use ff_tools::{run_bounded, Invocation, InvocationStatus};

#[test]
fn terminal_interrupt_does_not_kill_running_tool() {
    // Own process group, so the group-wide signal below stays inside this test binary.
    assert_eq!(unsafe { libc::setpgid(0, 0) }, 0);
    ctrlc::set_handler(|| {}).unwrap();

    let worker = thread::spawn(|| {
        let inv = Invocation::new("sleep", "sleep", vec!["1".into()], Duration::from_secs(10));
        run_bounded(&inv)
    });
    thread::sleep(Duration::from_millis(300));
    // What the terminal does on Ctrl-C: SIGINT to every process in the foreground group.
    assert_eq!(unsafe { libc::kill(0, libc::SIGINT) }, 0);

    let rec = worker.join().unwrap();
    assert_eq!(rec.status, InvocationStatus::Succeeded, "{}", rec.summary());
    assert_eq!(rec.exit_code, Some(0));
    assert!(rec.duration_ms >= 900);
}
