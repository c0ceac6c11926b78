//! Install procedure backed by an external helper program.
//!
//! The helper receives the plan as one JSON document on stdin and reports
//! back with JSON lines on stdout:
//!
//! ```text
//! {"progress": 0.25, "message": "Creating boot pool"}
//! {"error": "Failed to partition sda"}
//! ```
//!
//! Anything else on stdout is logged and ignored. A non-zero exit is an
//! install failure; the last reported error (or stderr) becomes its message.

use super::InstallProcedure;
use crate::{HalError, InstallError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tn_core::plan::{InstallationPlan, SerialConsole};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Wire form of an [`InstallationPlan`].
#[derive(Debug, Serialize)]
pub struct InstallRequest<'a> {
    pub disks: Vec<&'a str>,
    pub wipe_disks: Vec<&'a str>,
    pub set_pmbr: bool,
    /// `None` defers authentication setup to the web UI.
    pub authentication: Option<Credentials<'a>>,
    pub serial: Option<&'a SerialConsole>,
}

impl<'a> InstallRequest<'a> {
    pub fn from_plan(plan: &'a InstallationPlan) -> Self {
        let authentication = plan
            .authentication
            .username()
            .zip(plan.authentication.password())
            .map(|(username, password)| Credentials { username, password });
        Self {
            disks: plan.destinations.iter().map(|d| d.name.as_str()).collect(),
            wipe_disks: plan.wipe.iter().map(|d| d.name.as_str()).collect(),
            set_pmbr: plan.allow_efi,
            authentication,
            serial: plan.serial.as_ref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HelperEvent {
    Progress { progress: f64, message: String },
    Error { error: String },
}

/// Tracks reported progress so callers only ever see it move forward.
#[derive(Debug, Default)]
struct ProgressClamp {
    last: f64,
}

impl ProgressClamp {
    fn next(&mut self, value: f64) -> f64 {
        let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { self.last };
        self.last = self.last.max(value);
        self.last
    }
}

#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: PathBuf,
}

impl CommandInstaller {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl InstallProcedure for CommandInstaller {
    async fn install(
        &self,
        plan: &InstallationPlan,
        progress: &(dyn Fn(f64, &str) + Sync),
    ) -> Result<(), InstallError> {
        let program = self.program.display().to_string();
        let payload = serde_json::to_vec(&InstallRequest::from_plan(plan))
            .map_err(|e| InstallError::new(format!("Failed to encode install request: {}", e)))?;

        log::info!(
            "Starting {} for {:?} (wipe {:?})",
            program,
            plan.destination_names(),
            plan.wipe_names()
        );
        let mut child = tokio::process::Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    InstallError::from(HalError::CommandNotFound(program.clone()))
                } else {
                    InstallError::from(HalError::Io(e))
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(&payload).await {
                abandon(&mut child, &program).await;
                return Err(InstallError::from(HalError::Io(e)));
            }
            // Dropping stdin closes the pipe so the helper sees EOF.
        }

        // Drain stderr concurrently so a chatty helper cannot block on a full pipe.
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        let mut reported_error = None;
        let mut clamp = ProgressClamp::default();
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        abandon(&mut child, &program).await;
                        return Err(InstallError::from(HalError::Io(e)));
                    }
                };
                match serde_json::from_str::<HelperEvent>(&line) {
                    Ok(HelperEvent::Progress { progress: value, message }) => {
                        progress(clamp.next(value), &message);
                    }
                    Ok(HelperEvent::Error { error }) => {
                        log::error!("{} reported: {}", program, error);
                        reported_error = Some(error);
                    }
                    Err(_) => log::info!("{}: {}", program, line),
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| InstallError::from(HalError::Io(e)))?;
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() && reported_error.is_none() {
            log::info!("{} finished successfully", program);
            return Ok(());
        }

        let message = reported_error
            .or_else(|| Some(stderr.trim().to_string()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| format!("{} exited with {}", program, status));
        Err(InstallError::new(message))
    }
}

/// Kill and reap a helper whose pipes broke.
async fn abandon(child: &mut tokio::process::Child, program: &str) {
    log::warn!("Stopping {} after a pipe error", program);
    if let Err(e) = child.kill().await {
        log::warn!("Failed to stop {}: {}", program, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tn_core::disk::Disk;
    use tn_core::plan::AuthenticationMethod;

    fn plan(authentication: AuthenticationMethod) -> InstallationPlan {
        InstallationPlan {
            destinations: vec![Disk::new("sda", "m", 1), Disk::new("sdb", "m", 1)],
            wipe: vec![Disk::new("sdc", "m", 1).with_pool("boot-pool")],
            allow_efi: true,
            authentication,
            serial: Some(SerialConsole {
                port: "ttyS0".into(),
                speed: 115200,
            }),
        }
    }

    #[test]
    fn request_carries_credentials_for_admin() {
        let plan = plan(AuthenticationMethod::AdminUser {
            password: "pw".into(),
        });
        let json = serde_json::to_value(InstallRequest::from_plan(&plan)).unwrap();
        assert_eq!(json["disks"], serde_json::json!(["sda", "sdb"]));
        assert_eq!(json["wipe_disks"], serde_json::json!(["sdc"]));
        assert_eq!(json["set_pmbr"], serde_json::json!(true));
        assert_eq!(json["authentication"]["username"], "truenas_admin");
        assert_eq!(json["authentication"]["password"], "pw");
        assert_eq!(json["serial"]["port"], "ttyS0");
    }

    #[test]
    fn request_defers_authentication_to_web_ui() {
        let plan = plan(AuthenticationMethod::WebUiDeferred);
        let json = serde_json::to_value(InstallRequest::from_plan(&plan)).unwrap();
        assert!(json["authentication"].is_null());
    }

    #[test]
    fn progress_never_goes_backwards() {
        let mut clamp = ProgressClamp::default();
        assert_eq!(clamp.next(0.5), 0.5);
        assert_eq!(clamp.next(0.2), 0.5);
        assert_eq!(clamp.next(7.0), 1.0);
        assert_eq!(clamp.next(f64::NAN), 1.0);
    }

    #[test]
    fn helper_events_parse() {
        assert!(matches!(
            serde_json::from_str::<HelperEvent>(r#"{"progress": 0.1, "message": "x"}"#),
            Ok(HelperEvent::Progress { .. })
        ));
        assert!(matches!(
            serde_json::from_str::<HelperEvent>(r#"{"error": "boom"}"#),
            Ok(HelperEvent::Error { .. })
        ));
        assert!(serde_json::from_str::<HelperEvent>("plain text").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_helper_is_install_error() {
        let installer = CommandInstaller::new("/nonexistent/truenas-install");
        let plan = plan(AuthenticationMethod::WebUiDeferred);
        let err = installer.install(&plan, &|_, _| {}).await.unwrap_err();
        assert!(err.message.contains("not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn helper_progress_and_failure_are_reported() {
        use std::os::unix::fs::PermissionsExt;
        use std::sync::Mutex;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("install.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\ncat >/dev/null\n\
             echo '{\"progress\": 0.5, \"message\": \"Partitioning\"}'\n\
             echo 'noise'\n\
             echo '{\"error\": \"disk vanished\"}'\n\
             exit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let seen = Mutex::new(Vec::new());
        let installer = CommandInstaller::new(&script);
        let plan = plan(AuthenticationMethod::WebUiDeferred);
        let err = installer
            .install(&plan, &|p, m| seen.lock().unwrap().push((p, m.to_string())))
            .await
            .unwrap_err();

        assert_eq!(err.message, "disk vanished");
        assert_eq!(*seen.lock().unwrap(), vec![(0.5, "Partitioning".to_string())]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn helper_is_reaped_when_its_output_breaks() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = dir.path().join("install.sh");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\ncat >/dev/null\necho $$ > {}\nprintf '\\377\\n'\nexec sleep 30\n",
                pid_file.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let started = Instant::now();
        let installer = CommandInstaller::new(&script);
        let plan = plan(AuthenticationMethod::WebUiDeferred);
        assert!(installer.install(&plan, &|_, _| {}).await.is_err());
        assert!(started.elapsed() < Duration::from_secs(20));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        assert!(!std::path::Path::new("/proc").join(pid.trim()).exists());
    }
}
