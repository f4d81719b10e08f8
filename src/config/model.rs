// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::AssetClass;

/// Top-level configuration as read from `Sitedag.toml`.
///
/// Every section is optional; the defaults describe a Jekyll project with
/// sources under `src/` and assets under `assets/`:
///
/// ```toml
/// [paths]
/// styles = "src/styles/**/*.scss"
///
/// [output]
/// styles = "assets/css"
///
/// [styles]
/// compilers = [{ program = "sass", args = ["--style=compressed", "{input}"] }]
///
/// [generator]
/// program = "bundle"
/// args = ["exec", "jekyll", "build"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub styles: StylesSection,
    #[serde(default)]
    pub scripts: ScriptsSection,
    #[serde(default)]
    pub images: ImagesSection,
    #[serde(default)]
    pub generator: GeneratorSection,
    #[serde(default)]
    pub serve: ServeSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// `Default`, so holders can rely on globs compiling and output directories
/// being disjoint.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    paths: PathsSection,
    output: OutputSection,
    styles: StylesSection,
    scripts: ScriptsSection,
    images: ImagesSection,
    generator: GeneratorSection,
    serve: ServeSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            output: raw.output,
            styles: raw.styles,
            scripts: raw.scripts,
            images: raw.images,
            generator: raw.generator,
            serve: raw.serve,
        }
    }

    pub fn paths(&self) -> &PathsSection {
        &self.paths
    }

    pub fn output(&self) -> &OutputSection {
        &self.output
    }

    pub fn styles(&self) -> &StylesSection {
        &self.styles
    }

    pub fn scripts(&self) -> &ScriptsSection {
        &self.scripts
    }

    pub fn images(&self) -> &ImagesSection {
        &self.images
    }

    pub fn generator(&self) -> &GeneratorSection {
        &self.generator
    }

    pub fn serve(&self) -> &ServeSection {
        &self.serve
    }

    /// Override the preview port (from `dev --port`).
    pub fn with_serve_port(mut self, port: u16) -> Self {
        self.serve.port = port;
        self
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// An external tool invocation.
///
/// `{input}` in `args` is replaced with the input file path. A spec without
/// an `{input}` argument gets the input on stdin. The tool's stdout is the
/// transform result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolSpec {
    pub const INPUT_PLACEHOLDER: &'static str = "{input}";

    pub fn new<P: Into<String>>(program: P, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether the input is passed as a path argument (otherwise stdin).
    pub fn takes_input_arg(&self) -> bool {
        self.args.iter().any(|a| a.contains(Self::INPUT_PLACEHOLDER))
    }
}

/// `[paths]`: one source glob per asset class, plus generator templates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub styles: String,
    pub fonts: String,
    pub scripts: String,
    pub images: String,
    pub templates: Vec<String>,
}

impl PathsSection {
    pub fn pattern(&self, class: AssetClass) -> &str {
        match class {
            AssetClass::Styles => &self.styles,
            AssetClass::Fonts => &self.fonts,
            AssetClass::Scripts => &self.scripts,
            AssetClass::Images => &self.images,
        }
    }
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            styles: "src/styles/**/*.scss".to_string(),
            fonts: "src/fonts/**/*.{ttf,woff,woff2}".to_string(),
            scripts: "src/js/**/*.js".to_string(),
            images: "src/img/**/*.{jpg,png,gif}".to_string(),
            templates: vec![
                "*.html".to_string(),
                "_layouts/*.html".to_string(),
                "_includes/*.html".to_string(),
            ],
        }
    }
}

/// `[output]`: destination directories, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub styles: PathBuf,
    pub fonts: PathBuf,
    pub scripts: PathBuf,
    pub images: PathBuf,
    /// Directory the generator writes and the preview server serves.
    pub site: PathBuf,
}

impl OutputSection {
    pub fn dir(&self, class: AssetClass) -> &Path {
        match class {
            AssetClass::Styles => &self.styles,
            AssetClass::Fonts => &self.fonts,
            AssetClass::Scripts => &self.scripts,
            AssetClass::Images => &self.images,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            styles: PathBuf::from("assets/css"),
            fonts: PathBuf::from("assets/fonts"),
            scripts: PathBuf::from("assets/js"),
            images: PathBuf::from("assets/img"),
            site: PathBuf::from("_site"),
        }
    }
}

/// `[styles]`: compiler candidates in preference order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StylesSection {
    pub compilers: Vec<ToolSpec>,
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            compilers: vec![
                ToolSpec::new("sass", &["--no-source-map", "--style=compressed", "{input}"]),
                ToolSpec::new("sassc", &["--style", "compressed", "{input}"]),
            ],
        }
    }
}

/// `[scripts]`: bundle file name and minifier candidates.
///
/// An empty `minifiers` list turns minification off.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScriptsSection {
    pub bundle: String,
    pub minifiers: Vec<ToolSpec>,
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            bundle: "main.js".to_string(),
            minifiers: vec![
                ToolSpec::new("uglifyjs", &["--compress", "--mangle"]),
                ToolSpec::new("terser", &["--compress", "--mangle"]),
            ],
        }
    }
}

/// `[images]`: optimizer candidates per lowercase file extension.
///
/// Extensions without an entry are copied verbatim.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImagesSection {
    pub optimizers: BTreeMap<String, Vec<ToolSpec>>,
}

impl Default for ImagesSection {
    fn default() -> Self {
        let mut optimizers = BTreeMap::new();
        optimizers.insert(
            "jpg".to_string(),
            vec![ToolSpec::new(
                "jpegtran",
                &["-copy", "none", "-optimize", "-progressive", "{input}"],
            )],
        );
        optimizers.insert(
            "png".to_string(),
            vec![ToolSpec::new("oxipng", &["-o", "3", "--stdout", "{input}"])],
        );
        optimizers.insert(
            "gif".to_string(),
            vec![ToolSpec::new(
                "gifsicle",
                &["--optimize=3", "--interlace", "{input}"],
            )],
        );
        Self { optimizers }
    }
}

/// `[generator]`: the external site generator command.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                program: "jekyll.bat".to_string(),
                args: vec!["build".to_string()],
            }
        } else {
            Self {
                program: "bundle".to_string(),
                args: vec!["exec".to_string(), "jekyll".to_string(), "build".to_string()],
            }
        }
    }
}

/// `[serve]`: preview server address. Port 0 picks a free port.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeSection {
    pub host: String,
    pub port: u16,
}

impl ServeSection {
    pub fn addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}
