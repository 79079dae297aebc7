mod attendance;
mod config;
mod dashboard;
mod db;
mod error;
mod grades;
mod ipc;
mod model;
mod normalize;
mod roster;
mod snapshot;
mod validate;

use std::io::{self, BufRead, Write};

use config::Config;

fn init_logging(cfg: &Config) {
    // stdout carries the protocol; diagnostics go to stderr only.
    env_logger::Builder::new()
        .parse_filters(&cfg.log_filter)
        .target(env_logger::Target::Stderr)
        .init();
}

fn open_startup_workspace(state: &mut ipc::AppState, cfg: &Config) {
    let Some(path) = cfg.workspace.as_ref() else {
        return;
    };
    match state.open_workspace(path) {
        Ok(()) => log::info!("event=startup_workspace status=ok path={}", path.display()),
        Err(e) => log::error!(
            "event=startup_workspace status=failed path={} error={e:#}",
            path.display()
        ),
    }
}

fn write_line(stdout: &mut io::Stdout, resp: &serde_json::Value) {
    let line = serde_json::to_string(resp).unwrap_or_else(|_| "{\"ok\":false}".to_string());
    let _ = writeln!(stdout, "{}", line);
    let _ = stdout.flush();
}

fn main() {
    let cfg = Config::from_env();
    init_logging(&cfg);
    log::info!("event=startup version={}", env!("CARGO_PKG_VERSION"));

    let mut state = ipc::AppState::default();
    open_startup_workspace(&mut state, &cfg);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                log::error!("event=stdin_read status=failed error={}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                log::warn!("event=request status=bad_json error={}", e);
                write_line(
                    &mut stdout,
                    &serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    }),
                );
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        write_line(&mut stdout, &resp);
    }
    log::info!("event=shutdown");
}
