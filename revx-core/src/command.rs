//! Patch-engine invocation model
//!
//! All process execution goes through [`Invocation`] to ensure argv-style
//! launching: arguments cross the process boundary as discrete elements,
//! never as a shell string. [`PatchCommand`] is the domain-level builder
//! that produces the engine invocation from the user's resolved inputs.

use std::ffi::OsString;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A fully resolved command: executable, ordered argument list, and an
/// optional working directory.
///
/// This is what the runner actually launches. On success the runner reports
/// `output` (if any) as the artifact produced by the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    /// The program to execute
    pub program: PathBuf,
    /// Arguments as discrete elements, in order
    pub args: Vec<OsString>,
    /// Optional working directory for the child process
    pub working_dir: Option<PathBuf>,
    /// Artifact path reported to the consumer when the process exits zero
    pub output: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            output: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Shell-quoted rendering of the command for echoing to the log
    pub fn display_line(&self) -> String {
        let mut parts = vec![shell_quote(&self.program.to_string_lossy())];
        parts.extend(
            self.args
                .iter()
                .map(|a| shell_quote(&a.to_string_lossy())),
        );
        parts.join(" ")
    }
}

/// The engine invocation the front-end assembles from user inputs:
/// `<java> -jar <engine> patch -a <input> -o <output> -b <patches> [--auto]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchCommand {
    /// Java runtime used to launch the engine jar
    pub java: PathBuf,
    /// The patch engine (revanced-cli style jar)
    pub engine: PathBuf,
    /// The patch bundle file
    pub patches: PathBuf,
    /// The application package to patch
    pub input: PathBuf,
    /// Resolved, de-duplicated artifact path
    pub output: PathBuf,
    /// Let the engine apply its default patch selection (`--auto`)
    pub auto_select: bool,
    /// Optional working directory for the engine process
    pub working_dir: Option<PathBuf>,
}

impl PatchCommand {
    pub fn new(
        engine: impl Into<PathBuf>,
        patches: impl Into<PathBuf>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            java: PathBuf::from("java"),
            engine: engine.into(),
            patches: patches.into(),
            input: input.into(),
            output: output.into(),
            auto_select: true,
            working_dir: None,
        }
    }

    #[must_use]
    pub fn java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    #[must_use]
    pub fn auto_select(mut self, auto: bool) -> Self {
        self.auto_select = auto;
        self
    }

    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Builds the resolved invocation the runner will launch.
    ///
    /// The flag choice for default selection (`--auto`) is a collaborator
    /// contract of the engine; it is isolated here so correcting it touches
    /// one line.
    pub fn invocation(&self) -> Invocation {
        let mut invocation = Invocation::new(&self.java)
            .arg("-jar")
            .arg(&self.engine)
            .arg("patch")
            .arg("-a")
            .arg(&self.input)
            .arg("-o")
            .arg(&self.output)
            .arg("-b")
            .arg(&self.patches)
            .output(&self.output);
        if self.auto_select {
            invocation = invocation.arg("--auto");
        }
        if let Some(dir) = &self.working_dir {
            invocation = invocation.working_dir(dir);
        }
        invocation
    }
}

/// Quotes a single argument for display the way a POSIX shell would accept it
fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PatchCommand {
        PatchCommand::new(
            "/opt/revanced/cli.jar",
            "/opt/revanced/patches.rvp",
            "/home/u/app.apk",
            "/home/u/out/app-revanced.apk",
        )
    }

    #[test]
    fn test_invocation_argument_order() {
        let invocation = sample().invocation();
        assert_eq!(invocation.program, PathBuf::from("java"));
        let args: Vec<String> = invocation
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-jar",
                "/opt/revanced/cli.jar",
                "patch",
                "-a",
                "/home/u/app.apk",
                "-o",
                "/home/u/out/app-revanced.apk",
                "-b",
                "/opt/revanced/patches.rvp",
                "--auto",
            ]
        );
    }

    #[test]
    fn test_manual_selection_omits_auto() {
        let invocation = sample().auto_select(false).invocation();
        let last = invocation.args.last().unwrap().to_string_lossy().into_owned();
        assert_eq!(last, "/opt/revanced/patches.rvp");
    }

    #[test]
    fn test_invocation_reports_output_artifact() {
        let invocation = sample().invocation();
        assert_eq!(
            invocation.output,
            Some(PathBuf::from("/home/u/out/app-revanced.apk"))
        );
    }

    #[test]
    fn test_custom_java_and_working_dir() {
        let invocation = sample()
            .java("/usr/lib/jvm/bin/java")
            .working_dir("/tmp/work")
            .invocation();
        assert_eq!(invocation.program, PathBuf::from("/usr/lib/jvm/bin/java"));
        assert_eq!(invocation.working_dir, Some(PathBuf::from("/tmp/work")));
    }

    #[test]
    fn test_display_line_quotes_spaces() {
        let line = Invocation::new("java")
            .arg("-jar")
            .arg("/opt/My Tools/cli.jar")
            .display_line();
        assert_eq!(line, "java -jar '/opt/My Tools/cli.jar'");
    }

    #[test]
    fn test_display_line_escapes_single_quotes() {
        let line = Invocation::new("echo").arg("it's").display_line();
        assert_eq!(line, r"echo 'it'\''s'");
    }
}
