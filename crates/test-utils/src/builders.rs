#![allow(dead_code)]

use std::path::PathBuf;

use sitedag::config::{ConfigFile, RawConfigFile, ToolSpec};
use sitedag::types::AssetClass;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn pattern(mut self, class: AssetClass, pattern: &str) -> Self {
        let paths = &mut self.config.paths;
        let slot = match class {
            AssetClass::Styles => &mut paths.styles,
            AssetClass::Fonts => &mut paths.fonts,
            AssetClass::Scripts => &mut paths.scripts,
            AssetClass::Images => &mut paths.images,
        };
        *slot = pattern.to_string();
        self
    }

    pub fn output(mut self, class: AssetClass, dir: &str) -> Self {
        let output = &mut self.config.output;
        let slot = match class {
            AssetClass::Styles => &mut output.styles,
            AssetClass::Fonts => &mut output.fonts,
            AssetClass::Scripts => &mut output.scripts,
            AssetClass::Images => &mut output.images,
        };
        *slot = PathBuf::from(dir);
        self
    }

    pub fn templates(mut self, patterns: &[&str]) -> Self {
        self.config.paths.templates = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn style_compilers(mut self, tools: Vec<ToolSpec>) -> Self {
        self.config.styles.compilers = tools;
        self
    }

    pub fn script_minifiers(mut self, tools: Vec<ToolSpec>) -> Self {
        self.config.scripts.minifiers = tools;
        self
    }

    pub fn bundle(mut self, name: &str) -> Self {
        self.config.scripts.bundle = name.to_string();
        self
    }

    pub fn image_optimizer(mut self, ext: &str, tools: Vec<ToolSpec>) -> Self {
        self.config.images.optimizers.insert(ext.to_string(), tools);
        self
    }

    pub fn no_image_optimizers(mut self) -> Self {
        self.config.images.optimizers.clear();
        self
    }

    pub fn generator(mut self, program: &str, args: &[&str]) -> Self {
        self.config.generator.program = program.to_string();
        self.config.generator.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn serve(mut self, host: &str, port: u16) -> Self {
        self.config.serve.host = host.to_string();
        self.config.serve.port = port;
        self
    }

    /// The unvalidated config, for tests that exercise validation errors.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A project whose transforms only need POSIX `cat` and whose generator is
/// `sh`, so tests can run real subprocesses without the real toolchain.
///
/// Styles are passed through `cat {input}`, scripts through `cat` on stdin,
/// images are copied and the generator copies `index.html` into `_site`.
pub fn posix_project_config() -> ConfigFileBuilder {
    ConfigFileBuilder::new()
        .style_compilers(vec![ToolSpec::new("cat", &["{input}"])])
        .script_minifiers(vec![ToolSpec::new("cat", &[])])
        .no_image_optimizers()
        .generator(
            "sh",
            &["-c", "mkdir -p _site && cp index.html _site/index.html"],
        )
}
