use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults::DeploySettings;
use crate::error::{Error, Result, StepFailedDetails};
use crate::executor::Invocation;

// === Toolchain invocations ===

/// `rustup target add <target>`. A no-op when the target is already installed.
pub fn target_add(settings: &DeploySettings) -> Invocation {
    Invocation::new("rustup")
        .args(["target", "add"])
        .arg(&settings.target)
}

/// Release build for the configured target, run from the manifest directory.
pub fn cargo_build(settings: &DeploySettings) -> Invocation {
    let mut inv = Invocation::new("cargo")
        .args(["build", "--release", "--target"])
        .arg(&settings.target)
        .current_dir(&settings.manifest_dir);

    if let Some(bin) = &settings.bin {
        inv = inv.arg("--bin").arg(bin);
    }

    inv
}

// === Staging ===

/// Copy the build output to its bootstrap name, creating the staging
/// directory as needed. The staged file is made executable on Unix.
pub fn stage_artifact(source: &Path, dest: &Path) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(Error::deploy_step_failed(StepFailedDetails {
            step: "stage".to_string(),
            command: stage_display(source, dest),
            exit_code: 1,
            stderr: format!("build output not found: {}", source.display()),
        })
        .with_hint("Check that the binary name matches the 'bin' setting"));
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
        })?;
    }

    fs::copy(source, dest).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("copy {} to {}", source.display(), dest.display())),
        )
    })?;

    make_executable(dest)?;

    Ok(dest.to_path_buf())
}

/// Trace line for the staging step.
pub fn stage_display(source: &Path, dest: &Path) -> String {
    Invocation::new("cp")
        .arg(source.display().to_string())
        .arg(dest.display().to_string())
        .display()
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("chmod {}", path.display())))
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn target_add_names_the_target() {
        let inv = target_add(&DeploySettings::default());
        assert_eq!(inv.display(), "rustup target add x86_64-unknown-linux-musl");
    }

    #[test]
    fn cargo_build_scopes_to_configured_binary() {
        let settings = DeploySettings {
            bin: Some("bot".to_string()),
            ..DeploySettings::default()
        };
        let inv = cargo_build(&settings);
        assert_eq!(
            inv.args,
            vec![
                "build",
                "--release",
                "--target",
                "x86_64-unknown-linux-musl",
                "--bin",
                "bot"
            ]
        );
        assert_eq!(inv.current_dir, Some(PathBuf::from(".")));
    }

    #[test]
    fn cargo_build_without_bin_builds_default_target() {
        let inv = cargo_build(&DeploySettings::default());
        assert!(!inv.has_arg("--bin"));
    }

    #[test]
    fn stage_artifact_copies_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("bot");
        fs::write(&source, b"\x7fELF").unwrap();
        let dest = dir.path().join("dist").join("bootstrap");

        let staged = stage_artifact(&source, &dest).unwrap();

        assert_eq!(staged, dest);
        assert_eq!(fs::read(&dest).unwrap(), b"\x7fELF");
    }

    #[cfg(unix)]
    #[test]
    fn stage_artifact_marks_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("bot");
        fs::write(&source, b"bin").unwrap();
        let dest = dir.path().join("bootstrap");

        stage_artifact(&source, &dest).unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn stage_artifact_fails_without_build_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = stage_artifact(&dir.path().join("missing"), &dir.path().join("bootstrap"))
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DeployStepFailed);
        assert_eq!(err.details["step"], "stage");
        assert!(!dir.path().join("bootstrap").exists());
    }
}
