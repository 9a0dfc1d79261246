use crate::{
    BackendLauncher, CommandSource, ENV_ENTRY_POINT, ENV_UNBUFFERED, LaunchCommand, LaunchPaths,
    effective_environment,
};

use std::collections::BTreeMap;
use std::env::consts::EXE_SUFFIX;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use md_config::{LauncherConfig, RunMode};
use tempfile::TempDir;

fn paths(project: &Path, resources: &Path) -> LaunchPaths {
    LaunchPaths {
        project_dir: project.to_path_buf(),
        resources_dir: resources.to_path_buf(),
    }
}

fn venv_python(project: &Path) -> PathBuf {
    if cfg!(windows) {
        project.join(".venv").join("Scripts").join("python.exe")
    } else {
        project.join(".venv").join("bin").join("python")
    }
}

#[test]
fn given_development_with_venv_when_resolve_then_venv_interpreter_runs_entry_script() {
    // Given
    let project = TempDir::new().unwrap();
    let interpreter = venv_python(project.path());
    std::fs::create_dir_all(interpreter.parent().unwrap()).unwrap();
    std::fs::write(&interpreter, b"").unwrap();
    let launcher = BackendLauncher::new(
        RunMode::Development,
        paths(project.path(), Path::new("/unused")),
        LauncherConfig::default(),
    );

    // When
    let command = launcher.resolve();

    // Then
    assert_eq!(command.program, interpreter);
    assert_eq!(command.args, vec![String::from("app.py")]);
    assert_eq!(command.working_dir, project.path());
}

#[test]
fn given_development_without_venv_when_resolve_then_system_interpreter() {
    // Given
    let project = TempDir::new().unwrap();
    let launcher = BackendLauncher::new(
        RunMode::Development,
        paths(project.path(), Path::new("/unused")),
        LauncherConfig::default(),
    );

    // When
    let command = launcher.resolve();

    // Then
    assert_eq!(command.program, PathBuf::from("python"));
    assert_eq!(command.args, vec![String::from("app.py")]);
    assert_eq!(command.working_dir, project.path());
}

#[test]
fn given_custom_interpreter_when_no_venv_then_configured_fallback_used() {
    let project = TempDir::new().unwrap();
    let config = LauncherConfig {
        system_interpreter: String::from("python3"),
        entry_script: String::from("server.py"),
        ..LauncherConfig::default()
    };
    let launcher = BackendLauncher::new(
        RunMode::Development,
        paths(project.path(), Path::new("/unused")),
        config,
    );

    let command = launcher.resolve();

    assert_eq!(command.program, PathBuf::from("python3"));
    assert_eq!(command.args, vec![String::from("server.py")]);
    assert_eq!(command.env.get(ENV_ENTRY_POINT), Some(&String::from("server.py")));
}

#[test]
fn given_packaged_when_resolve_then_bundled_server_without_args() {
    // Given
    let resources = PathBuf::from("/Applications/MeaDocs.app/Contents/Resources");
    let launcher = BackendLauncher::new(
        RunMode::Packaged,
        paths(Path::new("/unused"), &resources),
        LauncherConfig::default(),
    );

    // When
    let command = launcher.resolve();

    // Then
    let server_dir = resources.join("meadoc_server");
    assert_eq!(
        command.program,
        server_dir.join(format!("meadoc_server{EXE_SUFFIX}"))
    );
    assert!(command.args.is_empty());
    assert_eq!(command.working_dir, server_dir);
}

#[test]
fn given_any_mode_when_resolve_then_backend_variables_set() {
    for mode in [RunMode::Development, RunMode::Packaged] {
        let launcher = BackendLauncher::new(
            mode,
            paths(Path::new("/project"), Path::new("/resources")),
            LauncherConfig::default(),
        );

        let command = launcher.resolve();

        assert_eq!(command.env.get(ENV_UNBUFFERED), Some(&String::from("1")));
        assert_eq!(command.env.get(ENV_ENTRY_POINT), Some(&String::from("app.py")));
        assert_eq!(command.env.len(), 2);
    }
}

#[test]
fn given_venv_appears_between_resolves_then_fresh_resolution_picks_it_up() {
    // Given
    let project = TempDir::new().unwrap();
    let launcher = BackendLauncher::new(
        RunMode::Development,
        paths(project.path(), Path::new("/unused")),
        LauncherConfig::default(),
    );
    let before = launcher.resolve();

    // When
    let interpreter = venv_python(project.path());
    std::fs::create_dir_all(interpreter.parent().unwrap()).unwrap();
    std::fs::write(&interpreter, b"").unwrap();
    let after = launcher.resolve();

    // Then
    assert_eq!(before.program, PathBuf::from("python"));
    assert_eq!(after.program, interpreter);
}

#[test]
fn given_closure_when_used_as_command_source_then_resolves() {
    let expected = LaunchCommand {
        program: PathBuf::from("/bin/true"),
        args: Vec::new(),
        working_dir: PathBuf::from("/"),
        env: BTreeMap::new(),
    };
    let source = {
        let expected = expected.clone();
        move || expected.clone()
    };

    assert_eq!(CommandSource::resolve(&source), expected);
}

// =========================================================================
// Environment layering
// =========================================================================

fn os_pair(key: &str, value: &str) -> (OsString, OsString) {
    (OsString::from(key), OsString::from(value))
}

#[test]
fn given_inherited_and_backend_vars_when_layered_then_backend_wins() {
    // Given
    let inherited = vec![
        os_pair("PATH", "/usr/bin"),
        os_pair("FLASK_APP", "other.py"),
        os_pair("PYTHONUNBUFFERED", "0"),
    ];
    let overrides = BTreeMap::from([
        (String::from("PYTHONUNBUFFERED"), String::from("1")),
        (String::from("FLASK_APP"), String::from("app.py")),
    ]);

    // When
    let env = effective_environment(inherited, &overrides);

    // Then
    assert_eq!(
        env,
        BTreeMap::from([
            os_pair("FLASK_APP", "app.py"),
            os_pair("PATH", "/usr/bin"),
            os_pair("PYTHONUNBUFFERED", "1"),
        ])
    );
}

#[test]
fn given_empty_inherited_when_layered_then_only_backend_vars() {
    let overrides = BTreeMap::from([(String::from("PYTHONUNBUFFERED"), String::from("1"))]);

    let env = effective_environment(Vec::new(), &overrides);

    assert_eq!(env, BTreeMap::from([os_pair("PYTHONUNBUFFERED", "1")]));
}

#[cfg(unix)]
#[test]
fn given_non_unicode_inherited_value_when_layered_then_kept_verbatim() {
    use std::os::unix::ffi::OsStringExt;

    // Given
    let raw = OsString::from_vec(b"f\xffo".to_vec());
    let inherited = vec![(OsString::from("MD_RAW_BYTES"), raw.clone())];

    // When
    let env = effective_environment(inherited, &BTreeMap::new());

    // Then
    assert_eq!(env.get(&OsString::from("MD_RAW_BYTES")), Some(&raw));
}
