use std::{cell::RefCell, ffi::OsStr};

#[derive(Clone, Copy)]
struct Env {
    echo_input: bool,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

/// Read configuration from the process environment. Call once, before any getter.
///
/// `ASMPLAY_NO_ECHO=1` covers the bare `asmplay [PATH]` and stdin forms, which
/// take no flags. `run --no-echo` overrides per invocation; the binary ANDs both.
pub fn init() {
    let value = Env {
        echo_input: !var_is("ASMPLAY_NO_ECHO", "1"),
    };
    set_env(value);
}

/// Whether keys read by `INT 0x16` are echoed to the terminal.
pub fn is_echo_enabled() -> bool {
    with_env(|env| env.echo_input)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
