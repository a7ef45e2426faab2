// ─── Forge Processors ───
// Sequential execution of the modern installer's post-download steps.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::core::downloader::{sha1_hex, Downloader};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::MavenArtifact;
use crate::core::vars::replace_vars;

use super::profile::{InstallLibrary, ProcessorStep};

const CLASSPATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// A fully resolved runtime invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Runs processor steps against one install library manifest.
pub struct ProcessorRunner<'a> {
    java_bin: &'a Path,
    libs_dir: &'a Path,
    libraries: &'a BTreeMap<String, InstallLibrary>,
    vars: HashMap<String, String>,
    timeout: Duration,
}

impl<'a> ProcessorRunner<'a> {
    pub fn new(
        java_bin: &'a Path,
        libs_dir: &'a Path,
        libraries: &'a BTreeMap<String, InstallLibrary>,
    ) -> Self {
        Self {
            java_bin,
            libs_dir,
            libraries,
            vars: HashMap::new(),
            timeout: Duration::from_secs(900),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register install data values.
    ///
    /// `[coord]` values become library paths and `'text'` values lose their
    /// quotes, anything else is kept as is.
    pub fn with_data(mut self, data: &HashMap<String, String>) -> Self {
        for (key, value) in data {
            let resolved = if let Some(name) = bracketed(value) {
                self.library_path(name).to_string_lossy().to_string()
            } else if let Some(literal) = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
            {
                literal.to_string()
            } else {
                value.clone()
            };
            self.vars.insert(key.clone(), resolved);
        }
        self
    }

    /// Register variables that are not part of the profile data. They take
    /// precedence over data values of the same name.
    pub fn with_builtins<I, K, V>(mut self, builtins: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars
            .extend(builtins.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Path of a library declared by the install profile.
    fn resolve_library(&self, name: &str) -> LauncherResult<&Path> {
        self.libraries
            .get(name)
            .map(|lib| lib.path.as_path())
            .ok_or_else(|| LauncherError::UnknownInstallLibrary(name.to_string()))
    }

    /// Path of any library: the manifest first, the maven layout otherwise.
    fn library_path(&self, name: &str) -> PathBuf {
        if let Ok(path) = self.resolve_library(name) {
            return path.to_path_buf();
        }
        match MavenArtifact::parse(name) {
            Ok(artifact) => self.libs_dir.join(artifact.local_path()),
            Err(_) => self.libs_dir.join(name),
        }
    }

    /// Substitute one argument template.
    pub fn substitute_arg(&self, template: &str) -> String {
        match bracketed(template) {
            Some(name) => self.library_path(name).to_string_lossy().to_string(),
            None => replace_vars(template, &self.vars),
        }
    }

    /// Build the runtime invocation for `step`.
    pub fn command(&self, step: &ProcessorStep) -> LauncherResult<ProcessorCommand> {
        let jar = self.resolve_library(&step.jar)?;

        let mut classpath = vec![jar.to_string_lossy().to_string()];
        for name in &step.classpath {
            classpath.push(self.resolve_library(name)?.to_string_lossy().to_string());
        }

        let main_class = read_main_class_from_jar(jar)?;

        let mut args = vec![
            "-cp".to_string(),
            classpath.join(CLASSPATH_SEPARATOR),
            main_class,
        ];
        args.extend(step.args.iter().map(|arg| self.substitute_arg(arg)));

        Ok(ProcessorCommand {
            program: self.java_bin.to_path_buf(),
            args,
        })
    }

    /// Run every client step in order, stopping at the first failure.
    pub async fn run_all(&self, steps: &[ProcessorStep]) -> LauncherResult<()> {
        for (index, step) in steps.iter().enumerate() {
            if !step.runs_on_client() {
                debug!("Skipping server-only processor #{} ({})", index, step.jar);
                continue;
            }
            self.run(step).await?;
        }
        Ok(())
    }

    #[instrument(skip(self, step), fields(jar = %step.jar))]
    async fn run(&self, step: &ProcessorStep) -> LauncherResult<()> {
        let outputs = self.outputs(step);
        if !outputs.is_empty() && self.outputs_valid(&outputs).await {
            debug!("Processor outputs already present, skipping");
            return Ok(());
        }

        let command = self.command(step)?;
        info!("Running forge processor {}", step.jar);
        debug!("{:?} {:?}", command.program, command.args);

        let child = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .current_dir(self.libs_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                LauncherError::JavaExecution(format!("{}: {}", command.program.display(), e))
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| LauncherError::ProcessorTimeout {
                jar: step.jar.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| LauncherError::JavaExecution(e.to_string()))?;

        if !output.status.success() {
            return Err(LauncherError::ProcessorFailed {
                jar: step.jar.clone(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        for (path, expected) in &outputs {
            let actual = tokio::fs::read(path)
                .await
                .map(|bytes| sha1_hex(&bytes))
                .map_err(|source| LauncherError::Io {
                    path: path.clone(),
                    source,
                })?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LauncherError::Sha1Mismatch {
                    path: path.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        Ok(())
    }

    fn outputs(&self, step: &ProcessorStep) -> Vec<(PathBuf, String)> {
        step.outputs
            .iter()
            .map(|(path, sha1)| {
                (
                    PathBuf::from(self.substitute_arg(path)),
                    self.substitute_arg(sha1),
                )
            })
            .collect()
    }

    async fn outputs_valid(&self, outputs: &[(PathBuf, String)]) -> bool {
        for (path, expected) in outputs {
            if !path.is_file() {
                return false;
            }
            match Downloader::validate_sha1(path, expected).await {
                Ok(true) => {}
                _ => return false,
            }
        }
        true
    }
}

/// `name` when `template` is exactly `[name]`.
fn bracketed(template: &str) -> Option<&str> {
    template.strip_prefix('[')?.strip_suffix(']')
}

/// Read `Main-Class` from a jar manifest, following continuation lines.
pub fn read_main_class_from_jar(path: &Path) -> LauncherResult<String> {
    let file = std::fs::File::open(path).map_err(|e| LauncherError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut manifest = archive
        .by_name("META-INF/MANIFEST.MF")
        .map_err(|_| LauncherError::ArchiveEntryNotFound("META-INF/MANIFEST.MF".to_string()))?;

    let mut text = String::new();
    manifest.read_to_string(&mut text)?;

    let mut main_class: Option<String> = None;
    let mut current_key: Option<String> = None;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(' ') {
            if current_key.as_deref() == Some("Main-Class") {
                if let Some(value) = &mut main_class {
                    value.push_str(rest.trim_end());
                }
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key == "Main-Class" {
                main_class = Some(value.trim().to_string());
            }
            current_key = Some(key.to_string());
        }
    }

    main_class.ok_or_else(|| {
        LauncherError::JavaExecution(format!(
            "Main-Class missing in processor jar {}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    fn lib(name: &str, path: impl Into<PathBuf>) -> (String, InstallLibrary) {
        (
            name.to_string(),
            InstallLibrary {
                name: name.to_string(),
                path: path.into(),
                download: None,
            },
        )
    }

    fn step(jar: &str, args: &[&str]) -> ProcessorStep {
        ProcessorStep {
            jar: jar.to_string(),
            classpath: Vec::new(),
            args: args.iter().map(|a| a.to_string()).collect(),
            sides: None,
            outputs: BTreeMap::new(),
        }
    }

    fn write_jar(path: &Path, manifest: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(manifest.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn bracketed_name_maps_to_library_path() {
        let libraries = BTreeMap::from([lib("foo", "/libs/foo.jar")]);
        let runner = ProcessorRunner::new(Path::new("java"), Path::new("/libs"), &libraries);
        assert_eq!(runner.substitute_arg("[foo]"), "/libs/foo.jar");
    }

    #[test]
    fn other_templates_use_install_data() {
        let libraries = BTreeMap::new();
        let data = HashMap::from([
            ("MC_SLIM_SHA".to_string(), "'abc'".to_string()),
            ("MAPPINGS".to_string(), "[de.oceanlabs.mcp:mcp_config:1.20.1@zip]".to_string()),
            ("PATCHED".to_string(), "/tmp/patched.jar".to_string()),
        ]);
        let runner = ProcessorRunner::new(Path::new("java"), Path::new("/libs"), &libraries)
            .with_data(&data)
            .with_builtins([("SIDE", "client")]);

        assert_eq!(runner.substitute_arg("{MC_SLIM_SHA}"), "abc");
        assert_eq!(runner.substitute_arg("--side={SIDE}"), "--side=client");
        assert_eq!(runner.substitute_arg("{PATCHED}"), "/tmp/patched.jar");
        assert_eq!(
            PathBuf::from(runner.substitute_arg("{MAPPINGS}")),
            Path::new("/libs").join(
                MavenArtifact::parse("de.oceanlabs.mcp:mcp_config:1.20.1@zip")
                    .unwrap()
                    .local_path()
            )
        );
        assert_eq!(runner.substitute_arg("{UNKNOWN}"), "{UNKNOWN}");
    }

    #[test]
    fn command_uses_classpath_and_main_class() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("tools.jar");
        let dep = dir.path().join("dep.jar");
        write_jar(
            &jar,
            "Manifest-Version: 1.0\r\nMain-Class: net.minecraftforge.installertools.Con\r\n sole\r\n",
        );

        let libraries = BTreeMap::from([lib("tools", &jar), lib("dep", &dep)]);
        let runner = ProcessorRunner::new(Path::new("/opt/java/bin/java"), dir.path(), &libraries)
            .with_builtins([("SIDE", "client")]);

        let mut step = step("tools", &["--side", "{SIDE}", "[dep]"]);
        step.classpath = vec!["dep".to_string()];

        let command = runner.command(&step).unwrap();
        assert_eq!(command.program, PathBuf::from("/opt/java/bin/java"));
        assert_eq!(
            command.args,
            vec![
                "-cp".to_string(),
                format!("{}{}{}", jar.display(), CLASSPATH_SEPARATOR, dep.display()),
                "net.minecraftforge.installertools.Console".to_string(),
                "--side".to_string(),
                "client".to_string(),
                dep.to_string_lossy().to_string(),
            ]
        );
    }

    #[test]
    fn unknown_processor_jar_is_an_error() {
        let libraries = BTreeMap::new();
        let runner = ProcessorRunner::new(Path::new("java"), Path::new("/libs"), &libraries);
        let err = runner.command(&step("missing:jar:1.0", &[])).unwrap_err();
        assert!(matches!(err, LauncherError::UnknownInstallLibrary(ref n) if n == "missing:jar:1.0"));
    }

    #[tokio::test]
    async fn server_steps_and_valid_outputs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("client-srg.jar");
        std::fs::write(&out, b"patched").unwrap();
        let sha1 = sha1_hex(b"patched");

        let libraries = BTreeMap::new();
        let runner = ProcessorRunner::new(Path::new("/nonexistent/java"), dir.path(), &libraries)
            .with_builtins([("OUT", out.to_string_lossy().to_string())]);

        let mut server = step("unknown", &[]);
        server.sides = Some(vec!["server".to_string()]);
        let mut done = step("unknown", &[]);
        done.outputs = BTreeMap::from([("{OUT}".to_string(), sha1)]);

        runner.run_all(&[server, done]).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_fails_the_install() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("tools.jar");
        write_jar(&jar, "Main-Class: Tool\n");
        let libraries = BTreeMap::from([lib("tools", &jar)]);

        let ok = ProcessorRunner::new(Path::new("true"), dir.path(), &libraries);
        ok.run_all(&[step("tools", &[])]).await.unwrap();

        let failing = ProcessorRunner::new(Path::new("false"), dir.path(), &libraries);
        let err = failing.run_all(&[step("tools", &[])]).await.unwrap_err();
        assert!(matches!(err, LauncherError::ProcessorFailed { code: Some(1), .. }));
    }

    /// Runtime stand-in that appends the main class to `log` and fails for
    /// `Fail`.
    #[cfg(unix)]
    fn logging_runtime(dir: &Path, log: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("java.sh");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$3\" >> '{}'\n[ \"$3\" != Fail ]\n",
                log.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn steps_run_in_order_and_stop_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("runs.log");
        let java = logging_runtime(dir.path(), &log);

        let mut libraries = BTreeMap::new();
        for main_class in ["Fail", "Ok", "Second"] {
            let jar = dir.path().join(format!("{}.jar", main_class));
            write_jar(&jar, &format!("Main-Class: {}\n", main_class));
            libraries.extend([lib(main_class, jar)]);
        }
        let runner = ProcessorRunner::new(&java, dir.path(), &libraries);

        runner
            .run_all(&[step("Ok", &[]), step("Second", &[])])
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "Ok\nSecond\n");

        std::fs::remove_file(&log).unwrap();
        let err = runner
            .run_all(&[step("Fail", &[]), step("Ok", &[])])
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::ProcessorFailed { ref jar, .. } if jar == "Fail"));
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "Fail\n");
    }
}
