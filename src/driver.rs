//! One invocation of the compiler: options in, files out.
//!
//! [`DriverOptions`] is the unchecked form of the command line. Turning it
//! into a [`Driver`] applies every rule about how options combine, so by the
//! time [`Driver::run`] starts, the only failures left are those of the
//! targets themselves. Targets are processed in order and the first failure
//! ends the run.

use std::io::Write;
use std::path::PathBuf;

use crate::base::FqName;
use crate::codegen::{FormatRegistry, GenerationContext, OutputHandler, OutputMode};
use crate::error::{CompileError, Result};
use crate::hir::ResolutionPolicy;
use crate::project::{Coordinator, PackageRootTable};

/// Name the tool is installed as; used in generated build rules.
pub const TOOL_NAME: &str = "hal-gen";

/// Format that accepts `-t`.
const TEST_FLAG_FORMAT: &str = "androidbp";

#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    /// `-L`
    pub format: String,
    /// `-o`
    pub output_path: Option<PathBuf>,
    /// `-p`; the current directory when absent.
    pub root_path: Option<PathBuf>,
    /// `-r prefix:path`, in command-line order.
    pub package_roots: Vec<String>,
    /// `-t`
    pub for_test: bool,
    /// `--strict-imports`
    pub strict_imports: bool,
    /// Positional targets.
    pub targets: Vec<String>,
}

impl DriverOptions {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            ..Self::default()
        }
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn root_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_path = Some(path.into());
        self
    }

    pub fn package_root(mut self, root: impl Into<String>) -> Self {
        self.package_roots.push(root.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn for_test(mut self, for_test: bool) -> Self {
        self.for_test = for_test;
        self
    }

    pub fn strict_imports(mut self, strict: bool) -> Self {
        self.strict_imports = strict;
        self
    }
}

/// A validated invocation.
#[derive(Debug)]
pub struct Driver {
    handler: OutputHandler,
    coordinator: Coordinator,
    output_path: PathBuf,
    for_test: bool,
    targets: Vec<FqName>,
}

impl Driver {
    pub fn new(options: DriverOptions) -> Result<Self> {
        let registry = FormatRegistry::new();
        let handler = registry
            .lookup(&options.format)
            .cloned()
            .ok_or_else(|| CompileError::UnknownFormat(options.format.clone()))?;

        if options.for_test && handler.name != TEST_FLAG_FORMAT {
            return Err(CompileError::usage(format!(
                "-t only applies to -L{TEST_FLAG_FORMAT}"
            )));
        }

        let root_path = match options.root_path {
            Some(path) => path,
            None => std::env::current_dir().map_err(|e| CompileError::io(".", e))?,
        };

        let output_path = match handler.mode {
            OutputMode::NeedsDirectory | OutputMode::NeedsSingleFile => options
                .output_path
                .filter(|path| !path.as_os_str().is_empty())
                .ok_or_else(|| {
                    CompileError::usage(format!("-L{} requires an output path (-o)", handler.name))
                })?,
            OutputMode::NeedsSourceTreeRoot => options.output_path.unwrap_or_else(|| root_path.clone()),
            OutputMode::NotNeeded => PathBuf::new(),
        };

        if options.targets.is_empty() {
            return Err(CompileError::usage("no target packages or interfaces given"));
        }
        let targets = options
            .targets
            .iter()
            .map(|target| FqName::parse(target).map_err(CompileError::from))
            .collect::<Result<Vec<_>>>()?;

        let mut roots = PackageRootTable::new(root_path);
        for root in &options.package_roots {
            let (prefix, path) = root.split_once(':').ok_or_else(|| {
                CompileError::usage(format!("-r expects <package>:<path>, got '{root}'"))
            })?;
            roots.add(prefix, path)?;
        }
        roots.add_defaults();

        let policy = if options.strict_imports {
            ResolutionPolicy::RejectAmbiguous
        } else {
            ResolutionPolicy::FirstMatch
        };

        tracing::debug!(
            format = handler.name,
            output = %output_path.display(),
            targets = targets.len(),
            "driver ready"
        );
        Ok(Self {
            handler,
            coordinator: Coordinator::new(roots).with_policy(policy),
            output_path,
            for_test: options.for_test,
            targets,
        })
    }

    pub fn handler(&self) -> &OutputHandler {
        &self.handler
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }

    pub fn targets(&self) -> &[FqName] {
        &self.targets
    }

    /// Validate and generate each target in turn. `stdout` receives output
    /// of formats that print rather than write files.
    pub fn run(&mut self, stdout: &mut dyn Write) -> Result<()> {
        for target in &self.targets {
            self.handler.validate(target)?;
            let mut context = GenerationContext::new(&mut self.coordinator, stdout)
                .with_output_path(self.output_path.clone())
                .with_tool_name(TOOL_NAME)
                .for_test(self.for_test);
            self.handler.generate(target, &mut context)?;
        }
        Ok(())
    }
}
